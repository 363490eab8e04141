//! Registered accounts in the `auth_users` index.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use deepcytes_core::defaults::AUTH_USERS_INDEX;
use deepcytes_core::{AuthUser, AuthUserRepository, Error, NewAuthUser, Result};

use crate::elastic::{ElasticClient, Hit};

#[derive(Debug, Serialize, Deserialize)]
struct AuthUserSource {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    name: Option<String>,
}

fn to_auth_user(hit: &Hit) -> Result<AuthUser> {
    let source: AuthUserSource = hit.source_as()?;
    Ok(AuthUser {
        id: hit.id.clone(),
        email: source.email,
        password: source.password,
        name: source.name.unwrap_or_default(),
    })
}

/// Elasticsearch-backed account repository.
pub struct EsAuthUserRepository {
    client: Arc<ElasticClient>,
}

impl EsAuthUserRepository {
    pub fn new(client: Arc<ElasticClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthUserRepository for EsAuthUserRepository {
    #[instrument(skip(self), fields(subsystem = "db", component = "auth_users", op = "find_by_email"))]
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>> {
        let request = json!({
            "query": { "term": { "email": email } },
            "size": 1
        });
        let hits = self.client.search(AUTH_USERS_INDEX, &request).await?;
        hits.hits.first().map(to_auth_user).transpose()
    }

    #[instrument(skip(self, user), fields(subsystem = "db", component = "auth_users", op = "create_if_absent"))]
    async fn create_if_absent(&self, user: NewAuthUser) -> Result<Option<String>> {
        if self.find_by_email(&user.email).await?.is_some() {
            debug!("Account already registered");
            return Ok(None);
        }
        let source = AuthUserSource {
            email: user.email,
            password: user.password,
            name: Some(user.name),
        };
        let id = self
            .client
            .index_document(AUTH_USERS_INDEX, &serde_json::to_value(&source)?)
            .await?;
        self.client.refresh(AUTH_USERS_INDEX).await?;
        Ok(Some(id))
    }

    #[instrument(skip(self, password), fields(subsystem = "db", component = "auth_users", op = "update_password"))]
    async fn update_password(&self, id: &str, password: &str) -> Result<()> {
        self.client
            .update_document(AUTH_USERS_INDEX, id, &json!({ "password": password }))
            .await?;
        self.client.refresh(AUTH_USERS_INDEX).await
    }

    #[instrument(skip(self), fields(subsystem = "db", component = "auth_users", op = "update_name"))]
    async fn update_name(&self, id: &str, name: &str) -> Result<AuthUser> {
        self.client
            .update_document(AUTH_USERS_INDEX, id, &json!({ "name": name }))
            .await?;
        self.client.refresh(AUTH_USERS_INDEX).await?;
        let hit = self
            .client
            .get_document(AUTH_USERS_INDEX, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("account {}", id)))?;
        to_auth_user(&hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(source: serde_json::Value) -> Hit {
        serde_json::from_value(json!({ "_id": "u1", "_score": 1.0, "_source": source })).unwrap()
    }

    #[test]
    fn test_to_auth_user() {
        let user = to_auth_user(&hit(json!({
            "email": "ann@example.com", "password": "secret1", "name": "Ann"
        })))
        .unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.email, "ann@example.com");
        assert_eq!(user.name, "Ann");
    }

    #[test]
    fn test_missing_or_null_name_is_empty() {
        let user = to_auth_user(&hit(json!({ "email": "a@b.co", "password": "x" }))).unwrap();
        assert_eq!(user.name, "");
        let user = to_auth_user(&hit(json!({ "email": "a@b.co", "password": "x", "name": null })))
            .unwrap();
        assert_eq!(user.name, "");
    }
}
