// common/src/models/session.rs
use chrono::{DateTime, Duration, TimeZone, Utc};

/// How long an implicit-flow access token is trusted after it was issued
pub const TOKEN_TTL_MILLIS: i64 = 3_600_000;

/// Authenticated Twitch session
///
/// Values are replaced wholesale rather than mutated; resolving the user id
/// produces a new session via [`Session::with_user_id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// OAuth access token from the redirect fragment
    pub access_token: String,
    /// When the token was stored
    pub issued_at: DateTime<Utc>,
    /// Twitch user id, once resolved
    pub user_id: Option<String>,
}

impl Session {
    pub fn new(access_token: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            issued_at,
            user_id: None,
        }
    }

    pub fn with_user_id(self, user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..self
        }
    }

    /// Check if the token is at least `ttl` old at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.issued_at) >= ttl
    }

    /// Check expiry against the current time and the default one hour window
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now(), Duration::milliseconds(TOKEN_TTL_MILLIS))
    }
}

/// Parse a stored millisecond timestamp
pub fn timestamp_from_millis(raw: &str) -> Option<DateTime<Utc>> {
    let millis = raw.trim().parse::<i64>().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}
