//! Sign-in proxy and bearer-session authentication. Credentials are never
//! verified locally: the LOS identity provider does that, and the session we
//! issue embeds the access token it hands back.

use crate::los::LosClient;
use crate::store::{ChatStore, Session, User};
use crate::{Error, Result};
use axum::http::HeaderMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

/// The identity provider expects the password pre-hashed, never raw.
pub fn hash_password(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    format!("{:x}", digest)
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolves the request's bearer token to a stored session.
pub async fn authenticate(store: &ChatStore, headers: &HeaderMap) -> Result<Session> {
    let token =
        bearer_token(headers).ok_or_else(|| Error::unauthenticated("missing bearer token"))?;

    store
        .get_session(token)
        .await?
        .ok_or_else(|| Error::unauthenticated("unknown session token"))
}

pub struct SignedIn {
    pub session: Session,
    pub user: User,
    pub name: String,
}

/// Proxies the credentials to the LOS identity provider, finds or creates
/// the local user record, and issues a session embedding the provider's
/// access token.
pub async fn sign_in(
    store: &ChatStore,
    los: &dyn LosClient,
    email: &str,
    password: &str,
) -> Result<SignedIn> {
    let hashed = hash_password(password);
    let signed_in = los.sign_in(email, &hashed).await?;

    let user = match store.get_user_by_email(email).await? {
        Some(user) => user,
        None => store.create_user(email).await?,
    };

    // The upstream id is only informative; sessions are keyed by the local
    // user id. Non-string upstream ids get replaced, matching the provider's
    // own looseness here.
    let upstream_id = match &signed_in.user.id {
        Value::String(s) => s.clone(),
        _ => Uuid::new_v4().to_string(),
    };
    debug!(user_id = %user.id, upstream_id, "signed in against LOS");

    let session = store
        .create_session(&user.id, &signed_in.access_token)
        .await?;

    Ok(SignedIn {
        session,
        user,
        name: signed_in.user.name,
    })
}
