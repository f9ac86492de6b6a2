//! Request and response bodies of the analytics API
//!
//! Only the paging envelope is typed; records stay opaque JSON values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Conversation details query
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationQuery {
    /// `{start}/{end}` in RFC 3339
    pub interval: String,
    pub order_by: String,
    pub paging: PagingSpec,
    pub conversation_filters: Vec<QueryFilter>,
}

impl ConversationQuery {
    /// Conversations in `interval` that have talk time, oldest first.
    pub fn with_talk_time(interval: String, page_number: u32, page_size: u32) -> Self {
        Self {
            interval,
            order_by: "conversationStart".to_string(),
            paging: PagingSpec {
                page_size,
                page_number,
            },
            conversation_filters: vec![QueryFilter {
                filter_type: "and".to_string(),
                predicates: vec![QueryPredicate {
                    predicate_type: "metric".to_string(),
                    metric: "tTalk".to_string(),
                    operator: "exists".to_string(),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingSpec {
    pub page_size: u32,
    pub page_number: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryFilter {
    #[serde(rename = "type")]
    pub filter_type: String,
    pub predicates: Vec<QueryPredicate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryPredicate {
    #[serde(rename = "type")]
    pub predicate_type: String,
    pub metric: String,
    pub operator: String,
}

/// Conversation details query response. The API omits `conversations`
/// when nothing matched.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationQueryResponse {
    #[serde(default)]
    pub conversations: Vec<Value>,
    #[serde(default)]
    pub total_hits: u64,
}

/// Paged listing returned by the users and routing queues endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityListing {
    #[serde(default)]
    pub entities: Vec<Value>,
    #[serde(default)]
    pub total: u64,
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
    pub page_count: Option<u32>,
}

/// OAuth client-credentials grant response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conversation_query_body() {
        let query = ConversationQuery::with_talk_time(
            "2024-01-01T00:00:00.000Z/2024-01-02T00:00:00.000Z".to_string(),
            3,
            100,
        );

        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "interval": "2024-01-01T00:00:00.000Z/2024-01-02T00:00:00.000Z",
                "orderBy": "conversationStart",
                "paging": { "pageSize": 100, "pageNumber": 3 },
                "conversationFilters": [{
                    "type": "and",
                    "predicates": [{ "type": "metric", "metric": "tTalk", "operator": "exists" }]
                }]
            })
        );
    }

    #[test]
    fn test_empty_conversation_response() {
        let response: ConversationQueryResponse =
            serde_json::from_value(json!({ "totalHits": 0 })).unwrap();
        assert!(response.conversations.is_empty());
        assert_eq!(response.total_hits, 0);
    }

    #[test]
    fn test_entity_listing() {
        let listing: EntityListing = serde_json::from_value(json!({
            "entities": [{ "id": "q1" }, { "id": "q2" }],
            "pageSize": 2,
            "pageNumber": 1,
            "total": 7,
            "pageCount": 4
        }))
        .unwrap();

        assert_eq!(listing.entities.len(), 2);
        assert_eq!(listing.total, 7);
        assert_eq!(listing.page_count, Some(4));
    }
}
