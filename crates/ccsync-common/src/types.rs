//! Entity kinds and the staged object naming convention
//!
//! Every staged page is written as `{YYYY-MM-DD}_{token}_{index}.json`, where
//! `token` identifies the entity kind and `index` is the zero-based page
//! counter within one extraction run. The same name is later used by the
//! load trigger to pick the destination table.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{CommonError, Result};

/// Date format used in object names.
pub const OBJECT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Extension of every staged object.
pub const OBJECT_EXTENSION: &str = "json";

static OBJECT_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^(\d{4}-\d{2}-\d{2})_([a-z]+)_(0|[1-9]\d*)\.json$")
        .expect("object name pattern is valid")
});

/// Record category synced from the analytics API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Conversation,
    User,
    Queue,
}

impl EntityKind {
    /// Order in which one extraction run processes entities.
    pub const EXTRACTION_ORDER: [EntityKind; 3] =
        [EntityKind::Conversation, EntityKind::Queue, EntityKind::User];

    /// Priority in which an untyped object path is matched against tokens.
    pub const ROUTING_ORDER: [EntityKind; 3] =
        [EntityKind::Conversation, EntityKind::User, EntityKind::Queue];

    /// Token embedded in staged object names
    pub fn token(self) -> &'static str {
        match self {
            EntityKind::Conversation => "conversation",
            EntityKind::User => "users",
            EntityKind::Queue => "queues",
        }
    }

    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "conversation" => Ok(EntityKind::Conversation),
            "users" => Ok(EntityKind::User),
            "queues" => Ok(EntityKind::Queue),
            other => Err(CommonError::UnknownEntityToken(other.to_string())),
        }
    }

    /// Whether fetches for this kind are bounded by a time window.
    pub fn is_windowed(self) -> bool {
        matches!(self, EntityKind::Conversation)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = CommonError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_token(s)
    }
}

/// Name of one staged page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectName {
    date: NaiveDate,
    entity: EntityKind,
    index: u32,
}

impl ObjectName {
    pub fn new(date: NaiveDate, entity: EntityKind, index: u32) -> Self {
        Self {
            date,
            entity,
            index,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Strictly parse a name produced by [`ObjectName`]'s `Display`.
    ///
    /// Unlike the substring routing used at the load trigger boundary, this
    /// rejects anything that does not match the full convention.
    pub fn parse(name: &str) -> Result<Self> {
        let captures = OBJECT_NAME_PATTERN.captures(name).ok_or_else(|| {
            CommonError::invalid_object_name(name, "expected {YYYY-MM-DD}_{token}_{index}.json")
        })?;

        let date = NaiveDate::parse_from_str(&captures[1], OBJECT_DATE_FORMAT)
            .map_err(|e| CommonError::invalid_object_name(name, e.to_string()))?;
        let entity = EntityKind::from_token(&captures[2])?;
        let index = captures[3]
            .parse()
            .map_err(|e: std::num::ParseIntError| CommonError::invalid_object_name(name, e.to_string()))?;

        Ok(Self::new(date, entity, index))
    }
}

impl std::fmt::Display for ObjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}.{}",
            self.date.format(OBJECT_DATE_FORMAT),
            self.entity.token(),
            self.index,
            OBJECT_EXTENSION
        )
    }
}
