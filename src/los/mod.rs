mod client;

pub use client::HttpLosClient;

use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Identity returned by the loan-origination system's sign-in endpoint. The
/// upstream id is not always a string, so it is kept raw until the auth layer
/// normalizes it.
#[derive(Debug, Clone)]
pub struct LosUser {
    pub id: Value,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct SignIn {
    pub user: LosUser,
    pub access_token: String,
}

/// The three operations of the external loan-origination system. Only the
/// detail fetch is authenticated.
#[async_trait]
pub trait LosClient: Send + Sync {
    /// Searches application summaries by national identity number. Zero
    /// matches is a success with an empty list.
    async fn search_by_nic(&self, nic: &str) -> Result<Value>;

    /// Fetches the raw `applicantDetails` payload for one application.
    async fn application_detail(&self, application_id: &str, access_token: &str) -> Result<Value>;

    /// Exchanges pre-hashed credentials for an identity and an access token.
    async fn sign_in(&self, username: &str, hashed_password: &str) -> Result<SignIn>;
}
