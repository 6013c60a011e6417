/*
[INPUT]:  Wallet secrets, derived PPIDs and scope lists
[OUTPUT]: Cached application credentials and scope decisions
[POS]:    Auth layer - credential lifecycle and issuance
[UPDATE]: When credential format or issuance endpoint changes
*/

use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::{Result, SurvError};
use crate::types::models::serde_helpers;

/// Credential cached under `lemma_credentials`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedCredential {
    pub ppid: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub issued_at: DateTime<Utc>,
}

impl CachedCredential {
    pub fn new(ppid: impl Into<String>, scopes: Vec<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            ppid: ppid.into(),
            scopes,
            expires_at,
            issued_at: Utc::now(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn allows(&self, resource: &str, action: &str) -> bool {
        scope_allows(&self.scopes, resource, action)
    }
}

/// True iff `scopes` holds `*`, `{resource}:*` or `{resource}:{action}`
pub fn scope_allows(scopes: &[String], resource: &str, action: &str) -> bool {
    let wildcard = format!("{resource}:*");
    let exact = format!("{resource}:{action}");
    scopes
        .iter()
        .any(|scope| scope == "*" || *scope == wildcard || *scope == exact)
}

/// User record cached under `lemma_user`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LemmaUser {
    pub ppid: String,
    pub signed_in_at: DateTime<Utc>,
}

/// Response of the credential issuance endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IssuedCredential {
    pub ppid: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_utc_opt")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<IssuedCredential> for CachedCredential {
    fn from(issued: IssuedCredential) -> Self {
        CachedCredential::new(issued.ppid, issued.scopes, issued.expires_at)
    }
}

#[derive(Debug, Serialize)]
struct IssueRequest<'a> {
    site_id: &'a str,
    wallet_secret: &'a str,
}

/// Exchanges a wallet secret for an application credential
#[derive(Debug, Clone)]
pub struct CredentialIssuer {
    http_client: Client,
    url: Url,
}

impl CredentialIssuer {
    pub fn new(http_client: Client, url: &str) -> Result<Self> {
        Ok(Self {
            http_client,
            url: Url::parse(url)?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// POST {issue_url} with `{ site_id, wallet_secret }`
    pub async fn issue(&self, site_id: &str, wallet_secret: &str) -> Result<IssuedCredential> {
        debug!(url = %self.url, site_id, "requesting wallet credential");
        let response = self
            .http_client
            .post(self.url.clone())
            .json(&IssueRequest {
                site_id,
                wallet_secret,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SurvError::api_error(
                status,
                crate::http::error::extract_detail(&body),
            ));
        }

        serde_json::from_str(&body)
            .map_err(|err| SurvError::InvalidResponse(format!("credential issuance: {err}")))
    }
}
