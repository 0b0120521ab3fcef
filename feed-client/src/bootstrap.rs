// feed-client/src/bootstrap.rs
use actix::{Addr, Recipient};
use chrono::{DateTime, Duration, Utc};
use common::Session;
use thiserror::Error;

use crate::auth::RedirectLocation;
use crate::identity::{IdentityError, IdentityResolver};
use crate::realtime::{Credentials, RealtimeClient, Start, Stop};
use crate::store::{KeyValueStore, StoreError, TokenStore};
use crate::view::ViewUpdate;

pub const LOGIN_OVERLAY: &str = "Successfully logged in!";
pub const STATUS_TOKEN_SAVED: &str = "Token saved!";
pub const STATUS_TOKEN_FOUND: &str = "Valid token found!";
pub const STATUS_LOGGED_OUT: &str = "Logged out";

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What start-up should do, decided from the redirect and storage alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    FreshLogin { token: String },
    Resume(Session),
    LoggedOut,
}

pub fn decide(
    fragment_token: Option<String>,
    stored: Option<Session>,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Decision {
    if let Some(token) = fragment_token {
        return Decision::FreshLogin { token };
    }

    match stored {
        Some(session) if !session.is_expired_at(now, ttl) => Decision::Resume(session),
        Some(_) => {
            tracing::info!("Stored token expired");
            Decision::LoggedOut
        },
        None => Decision::LoggedOut,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Authenticated(Session),
    LoggedOut,
}

/// Start-up and logout flow tying storage, identity, realtime and view together
pub struct SessionBootstrap<S, R> {
    tokens: TokenStore<S>,
    resolver: R,
    view: Recipient<ViewUpdate>,
    realtime: Addr<RealtimeClient>,
    ttl: Duration,
}

impl<S: KeyValueStore, R: IdentityResolver> SessionBootstrap<S, R> {
    pub fn new(
        tokens: TokenStore<S>,
        resolver: R,
        view: Recipient<ViewUpdate>,
        realtime: Addr<RealtimeClient>,
        ttl: Duration,
    ) -> Self {
        Self {
            tokens,
            resolver,
            view,
            realtime,
            ttl,
        }
    }

    pub fn token_store(&self) -> &TokenStore<S> {
        &self.tokens
    }

    /// Run once at start. An identity failure halts the flow and is returned as is.
    pub async fn run(&mut self, location: Option<&mut RedirectLocation>) -> Result<Outcome, BootstrapError> {
        let fragment_token = location.as_ref().and_then(|l| l.access_token());
        let now = Utc::now();

        match decide(fragment_token, self.tokens.load(), now, self.ttl) {
            Decision::FreshLogin { token } => {
                tracing::info!("Access token received from login redirect");
                self.tokens.save(&token, now)?;
                if let Some(location) = location {
                    location.clear_fragment();
                }
                self.view.do_send(ViewUpdate::Overlay(LOGIN_OVERLAY.to_string()));

                let session = Session::new(token, now);
                self.authenticate(session, STATUS_TOKEN_SAVED).await
            },
            Decision::Resume(session) => {
                tracing::info!("Resuming stored session issued at {}", session.issued_at);
                self.authenticate(session, STATUS_TOKEN_FOUND).await
            },
            Decision::LoggedOut => {
                self.view.do_send(ViewUpdate::LoggedOut);
                Ok(Outcome::LoggedOut)
            },
        }
    }

    async fn authenticate(&mut self, session: Session, status: &str) -> Result<Outcome, BootstrapError> {
        let user_id = self.resolver.resolve_user_id(&session.access_token).await?;
        self.tokens.save_user_id(&user_id)?;
        let session = session.with_user_id(user_id.clone());

        self.view.do_send(ViewUpdate::Status(status.to_string()));
        self.view.do_send(ViewUpdate::Authenticated);
        self.realtime.do_send(Start {
            credentials: Credentials {
                token: session.access_token.clone(),
                user_id,
            },
        });

        Ok(Outcome::Authenticated(session))
    }

    /// Forget the session and stop the realtime connection
    pub fn logout(&mut self) -> Result<(), BootstrapError> {
        tracing::info!("Logging out");
        self.realtime.do_send(Stop);
        self.tokens.clear()?;

        self.view.do_send(ViewUpdate::Status(STATUS_LOGGED_OUT.to_string()));
        self.view.do_send(ViewUpdate::LoggedOut);
        self.view.do_send(ViewUpdate::ClearFeed);
        Ok(())
    }
}
