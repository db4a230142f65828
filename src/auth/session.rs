//! What a session carries between requests: the account's identity key,
//! optionally wrapped in a signed token.

use std::time::Duration;

use anyhow::Context;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::auth::repo_types::Account;
use crate::auth::services;
use crate::config::SessionConfig;

/// Anything a session can remember by a single stable string.
pub trait SessionIdentity {
    fn identity_key(&self) -> String;
}

impl SessionIdentity for Account {
    fn identity_key(&self) -> String {
        self.id.to_string()
    }
}

pub fn identity_key(account: &Account) -> String {
    account.identity_key()
}

/// Inverse of [`identity_key`]. `None` means the session no longer maps to an
/// account and the caller must re-authenticate.
#[instrument(skip(db))]
pub async fn resolve(db: &PgPool, key: &str) -> Option<Account> {
    let Ok(id) = Uuid::parse_str(key) else {
        warn!("malformed identity key");
        return None;
    };
    let account = services::get_by_id(db, id).await;
    if account.is_none() {
        debug!(user_id = %id, "identity key no longer resolves");
    }
    account
}

/// Signing material for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl SessionKeys {
    pub fn from_config(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64).saturating_mul(60)),
        }
    }

    pub fn issue<I: SessionIdentity>(&self, identity: &I) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
            .context("session lifetime out of range")?;
        let claims = Claims {
            sub: identity.identity_key(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(sub = %claims.sub, "session token issued");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    /// Verify the token and load the account it names.
    #[instrument(skip_all)]
    pub async fn restore(&self, db: &PgPool, token: &str) -> Option<Account> {
        match self.verify(token) {
            Ok(claims) => resolve(db, &claims.sub).await,
            Err(e) => {
                warn!(error = %e, "invalid or expired session token");
                None
            }
        }
    }
}
