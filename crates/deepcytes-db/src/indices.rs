//! Index definitions and startup provisioning.

use serde_json::{json, Value};
use tracing::{info, warn};

use deepcytes_core::defaults::{AUTH_USERS_INDEX, SEARCH_HISTORY_INDEX, USERS_INDEX};
use deepcytes_core::Result;

use crate::elastic::{ElasticClient, IndexCreation};

/// An index and the body used to create it.
#[derive(Debug, Clone)]
pub struct IndexSpec {
    pub name: &'static str,
    pub definition: Value,
}

/// Every index the backend writes to.
///
/// The directory index relies on dynamic mapping, which gives `email` a
/// `text` field with a `keyword` sub-field.
pub fn index_specs() -> Vec<IndexSpec> {
    vec![
        IndexSpec {
            name: AUTH_USERS_INDEX,
            definition: json!({
                "mappings": {
                    "properties": {
                        "email": { "type": "keyword" },
                        "password": { "type": "keyword" },
                        "name": { "type": "text" }
                    }
                }
            }),
        },
        IndexSpec {
            name: SEARCH_HISTORY_INDEX,
            definition: json!({
                "mappings": {
                    "properties": {
                        "userId": { "type": "keyword" },
                        "query": { "type": "text" },
                        "timestamp": { "type": "date" },
                        "resultsCount": { "type": "integer" }
                    }
                }
            }),
        },
        IndexSpec {
            name: USERS_INDEX,
            definition: json!({}),
        },
    ]
}

/// Create any missing index. Returns the names that were created.
pub async fn provision_indices(client: &ElasticClient) -> Result<Vec<&'static str>> {
    let mut created = Vec::new();
    for spec in index_specs() {
        if client.index_exists(spec.name).await? {
            continue;
        }
        match client.create_index(spec.name, &spec.definition).await? {
            IndexCreation::Created => {
                info!(index = spec.name, "Created index");
                created.push(spec.name);
            }
            IndexCreation::AlreadyExists => {
                warn!(index = spec.name, "Index appeared while provisioning");
            }
        }
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specs_cover_all_indices() {
        let names: Vec<_> = index_specs().iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["auth_users", "search_history", "users"]);
    }

    #[test]
    fn test_auth_email_is_keyword() {
        let specs = index_specs();
        let auth = &specs[0];
        assert_eq!(
            auth.definition["mappings"]["properties"]["email"]["type"],
            "keyword"
        );
    }

    #[test]
    fn test_history_mapping_types() {
        let specs = index_specs();
        let props = &specs[1].definition["mappings"]["properties"];
        assert_eq!(props["userId"]["type"], "keyword");
        assert_eq!(props["query"]["type"], "text");
        assert_eq!(props["timestamp"]["type"], "date");
        assert_eq!(props["resultsCount"]["type"], "integer");
    }
}
