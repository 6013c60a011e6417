/*
[INPUT]:  Lemma site configuration
[OUTPUT]: Wallet SDK capability traits and the values they exchange
[POS]:    Auth layer - seam between the adapter and a concrete wallet SDK
[UPDATE]: When the SDK surface used by the adapter changes
*/

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::http::Result;

pub const DEFAULT_WALLET_HOST: &str = "wallet.lemma.id";
pub const DEFAULT_ISSUE_URL: &str = "https://lemma.id/api/wallet-auth/issue";
pub const DEFAULT_REDIRECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-site SDK configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LemmaConfig {
    pub site_id: String,
    /// Host the wallet redirect flow returns from
    pub wallet_host: String,
    /// Credential issuance endpoint for wallet secrets
    pub issue_url: String,
    /// Upper bound on waiting for the SDK after a redirect return
    pub redirect_timeout: Duration,
    pub debug: bool,
}

impl LemmaConfig {
    pub fn new(site_id: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            wallet_host: DEFAULT_WALLET_HOST.to_string(),
            issue_url: DEFAULT_ISSUE_URL.to_string(),
            redirect_timeout: DEFAULT_REDIRECT_TIMEOUT,
            debug: false,
        }
    }

    pub fn with_wallet_host(mut self, host: impl Into<String>) -> Self {
        self.wallet_host = host.into();
        self
    }

    pub fn with_issue_url(mut self, url: impl Into<String>) -> Self {
        self.issue_url = url.into();
        self
    }

    pub fn with_redirect_timeout(mut self, timeout: Duration) -> Self {
        self.redirect_timeout = timeout;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletState {
    NoWallet,
    Locked,
    Unlocked,
}

/// Result of an unlock attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// The wallet is unlocked and control stayed here
    Unlocked,
    /// Control left for the wallet host; the flow resumes on return
    Redirected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Expired,
    Locked,
}

/// PPID derived locally by the SDK, with the scopes it holds for the site
#[derive(Debug, Clone, PartialEq)]
pub struct PpidCredential {
    pub ppid: String,
    pub scopes: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Surface of the external wallet/passkey SDK.
///
/// Methods report SDK failures as `SurvError::Sdk`; "nothing there" is an
/// `Ok(None)`.
#[async_trait]
pub trait WalletSdk: Send + Sync {
    async fn wallet_state(&self) -> Result<WalletState>;

    /// Create a wallet protected by a new passkey
    async fn register_passkey(&self) -> Result<()>;

    /// Unlock in place with the existing passkey
    async fn unlock(&self) -> Result<()>;

    /// Unlock via the wallet host, returning to `return_to` afterwards
    async fn unlock_with_redirect(&self, return_to: &str) -> Result<UnlockOutcome>;

    /// Opaque secret exchangeable for an application credential
    async fn wallet_secret(&self) -> Result<Option<String>>;

    async fn derive_ppid(&self, site_id: &str) -> Result<Option<PpidCredential>>;

    /// Resolves once the SDK has finished processing a redirect return
    async fn redirect_complete(&self) -> Result<()>;

    async fn is_session_valid(&self) -> Result<bool>;

    fn subscribe_session_events(&self) -> broadcast::Receiver<SessionEvent>;

    /// Forget any credential the SDK holds for this site
    async fn clear_credential(&self) -> Result<()>;
}

/// Constructs the SDK for a site
#[async_trait]
pub trait SdkLoader: Send + Sync {
    async fn load(&self, config: &LemmaConfig) -> Result<Arc<dyn WalletSdk>>;
}

/// How the current page was reached, used to detect a redirect return
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectContext {
    pub referrer: Option<String>,
}

impl RedirectContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_referrer(referrer: impl Into<String>) -> Self {
        Self {
            referrer: Some(referrer.into()),
        }
    }

    /// True when the referrer's host is `wallet_host`
    pub fn came_from(&self, wallet_host: &str) -> bool {
        self.referrer
            .as_deref()
            .and_then(|referrer| url::Url::parse(referrer).ok())
            .and_then(|url| url.host_str().map(|host| host.eq_ignore_ascii_case(wallet_host)))
            .unwrap_or(false)
    }
}
