//! Per-entity load policy and explicit field lists
//!
//! Conversations accumulate history, so they load under a declared schema
//! and append. Users and queues are current-state snapshots: the warehouse
//! infers their columns and each load replaces the table.

use ccsync_common::EntityKind;
use serde::Serialize;

use crate::warehouse::TableRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaPolicy {
    ExplicitSchema,
    AutoDetect,
}

impl SchemaPolicy {
    /// Explicit schemas append, inferred schemas replace.
    pub fn write_disposition(self) -> WriteDisposition {
        match self {
            SchemaPolicy::ExplicitSchema => WriteDisposition::Append,
            SchemaPolicy::AutoDetect => WriteDisposition::Truncate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDisposition {
    Append,
    Truncate,
}

impl WriteDisposition {
    pub fn as_str(self) -> &'static str {
        match self {
            WriteDisposition::Append => "WRITE_APPEND",
            WriteDisposition::Truncate => "WRITE_TRUNCATE",
        }
    }
}

/// Load settings for one entity kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityConfig {
    pub entity: EntityKind,
    pub table: TableRef,
    pub schema_policy: SchemaPolicy,
    pub write_disposition: WriteDisposition,
}

impl EntityConfig {
    pub fn for_entity(entity: EntityKind, table: TableRef) -> Self {
        let schema_policy = match entity {
            EntityKind::Conversation => SchemaPolicy::ExplicitSchema,
            EntityKind::User | EntityKind::Queue => SchemaPolicy::AutoDetect,
        };

        Self {
            entity,
            table,
            schema_policy,
            write_disposition: schema_policy.write_disposition(),
        }
    }

    /// Field list attached to the load job, if the policy declares one.
    pub fn schema(&self) -> Option<TableSchema> {
        match self.schema_policy {
            SchemaPolicy::ExplicitSchema => explicit_schema(self.entity),
            SchemaPolicy::AutoDetect => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub fields: Vec<FieldSchema>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    Nullable,
    Required,
    Repeated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub mode: FieldMode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSchema>,
}

impl FieldSchema {
    fn new(name: &str, field_type: FieldType, mode: FieldMode) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            mode,
            fields: Vec::new(),
        }
    }

    pub fn nullable(name: &str, field_type: FieldType) -> Self {
        Self::new(name, field_type, FieldMode::Nullable)
    }

    pub fn required(name: &str, field_type: FieldType) -> Self {
        Self::new(name, field_type, FieldMode::Required)
    }

    pub fn repeated(name: &str, field_type: FieldType) -> Self {
        Self::new(name, field_type, FieldMode::Repeated)
    }

    pub fn record(name: &str, mode: FieldMode, fields: Vec<FieldSchema>) -> Self {
        Self {
            fields,
            ..Self::new(name, FieldType::Record, mode)
        }
    }
}

/// Declared field list for entity kinds loaded under [`SchemaPolicy::ExplicitSchema`].
pub fn explicit_schema(entity: EntityKind) -> Option<TableSchema> {
    match entity {
        EntityKind::Conversation => Some(conversation_schema()),
        EntityKind::User | EntityKind::Queue => None,
    }
}

/// Conversation detail records: participants, their sessions, and each
/// session's metrics and segments.
pub fn conversation_schema() -> TableSchema {
    use FieldType::*;

    let metrics = FieldSchema::record(
        "metrics",
        FieldMode::Repeated,
        vec![
            FieldSchema::nullable("name", String),
            FieldSchema::nullable("value", Integer),
            FieldSchema::nullable("emitDate", Timestamp),
        ],
    );

    let segments = FieldSchema::record(
        "segments",
        FieldMode::Repeated,
        vec![
            FieldSchema::nullable("segmentStart", Timestamp),
            FieldSchema::nullable("segmentEnd", Timestamp),
            FieldSchema::nullable("segmentType", String),
            FieldSchema::nullable("queueId", String),
            FieldSchema::nullable("disconnectType", String),
            FieldSchema::nullable("wrapUpCode", String),
            FieldSchema::nullable("wrapUpNote", String),
            FieldSchema::nullable("conference", Boolean),
        ],
    );

    let sessions = FieldSchema::record(
        "sessions",
        FieldMode::Repeated,
        vec![
            FieldSchema::nullable("sessionId", String),
            FieldSchema::nullable("mediaType", String),
            FieldSchema::nullable("direction", String),
            FieldSchema::nullable("ani", String),
            FieldSchema::nullable("dnis", String),
            FieldSchema::nullable("edgeId", String),
            metrics,
            segments,
        ],
    );

    let participants = FieldSchema::record(
        "participants",
        FieldMode::Repeated,
        vec![
            FieldSchema::nullable("participantId", String),
            FieldSchema::nullable("participantName", String),
            FieldSchema::nullable("purpose", String),
            FieldSchema::nullable("userId", String),
            FieldSchema::nullable("externalContactId", String),
            sessions,
        ],
    );

    TableSchema {
        fields: vec![
            FieldSchema::required("conversationId", String),
            FieldSchema::nullable("conversationStart", Timestamp),
            FieldSchema::nullable("conversationEnd", Timestamp),
            FieldSchema::nullable("originatingDirection", String),
            FieldSchema::repeated("divisionIds", String),
            FieldSchema::nullable("mediaStatsMinConversationMos", Float),
            FieldSchema::nullable("mediaStatsMinConversationRFactor", Float),
            FieldSchema::nullable("externalTag", String),
            participants,
        ],
    }
}
