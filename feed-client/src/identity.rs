// feed-client/src/identity.rs
use async_trait::async_trait;
use common::TwitchConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("user lookup request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("user lookup returned an unreadable body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to fetch user ID")]
    NoUserRecord,
}

/// Resolves the Twitch user id that owns an access token
#[async_trait]
pub trait IdentityResolver {
    async fn resolve_user_id(&self, token: &str) -> Result<String, IdentityError>;
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    #[serde(default)]
    data: Vec<UserRecord>,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: String,
}

/// Extract the first user's id from a Helix `/users` body
pub fn parse_user_id(body: &str) -> Result<String, IdentityError> {
    let response: UsersResponse = serde_json::from_str(body)?;
    response
        .data
        .into_iter()
        .next()
        .map(|user| user.id)
        .ok_or(IdentityError::NoUserRecord)
}

/// Helix `/users` lookup. One request, no retry.
#[derive(Debug, Clone)]
pub struct HelixIdentityResolver {
    http: reqwest::Client,
    users_url: String,
    client_id: String,
}

impl HelixIdentityResolver {
    pub fn new(config: &TwitchConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            users_url: config.users_url.clone(),
            client_id: config.client_id.clone(),
        }
    }
}

#[async_trait]
impl IdentityResolver for HelixIdentityResolver {
    async fn resolve_user_id(&self, token: &str) -> Result<String, IdentityError> {
        // Error statuses still carry a JSON body without `data`, which maps to NoUserRecord
        let body = self
            .http
            .get(&self.users_url)
            .bearer_auth(token)
            .header("Client-ID", &self.client_id)
            .send()
            .await?
            .text()
            .await?;

        let user_id = parse_user_id(&body)?;
        tracing::info!("Resolved Twitch user id {}", user_id);
        Ok(user_id)
    }
}
