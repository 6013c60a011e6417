/*
[INPUT]:  Wallet SDK loader, local store, Lemma site configuration
[OUTPUT]: Wallet state, PPIDs, cached credentials, access decisions, expiry events
[POS]:    Auth layer - adapter between the application and the Lemma wallet SDK
[UPDATE]: When the wallet flow, credential caching or redirect handling changes
*/

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use tokio::sync::OnceCell;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::credential::{CachedCredential, CredentialIssuer, LemmaUser};
use super::sdk::{
    LemmaConfig, RedirectContext, SdkLoader, SessionEvent, UnlockOutcome, WalletSdk, WalletState,
};
use crate::http::{Result, SurvError};
use crate::store::{LEMMA_CREDENTIALS, LEMMA_REDIRECT_PENDING, LEMMA_USER, LocalStore};

const LEMMA_KEY_PREFIX: &str = "lemma_";

/// Next step the login screen should offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestedAction {
    CreatePasskey,
    Unlock,
    SignIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthState {
    pub wallet_exists: bool,
    pub unlocked: bool,
    pub suggested_action: SuggestedAction,
}

impl From<WalletState> for AuthState {
    fn from(state: WalletState) -> Self {
        match state {
            WalletState::NoWallet => Self {
                wallet_exists: false,
                unlocked: false,
                suggested_action: SuggestedAction::CreatePasskey,
            },
            WalletState::Locked => Self {
                wallet_exists: true,
                unlocked: false,
                suggested_action: SuggestedAction::Unlock,
            },
            WalletState::Unlocked => Self {
                wallet_exists: true,
                unlocked: true,
                suggested_action: SuggestedAction::SignIn,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoAuthResult {
    pub authenticated: bool,
    pub ppid: Option<String>,
    pub wallet_secret: Option<String>,
    pub state: AuthState,
}

impl AutoAuthResult {
    fn not_authenticated(state: AuthState) -> Self {
        Self {
            authenticated: false,
            ppid: None,
            wallet_secret: None,
            state,
        }
    }
}

/// Listener for session expiry. Dropping it stops the listener.
#[derive(Debug)]
pub struct SessionSubscription {
    handle: JoinHandle<()>,
}

impl SessionSubscription {
    pub fn cancel(self) {
        self.handle.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct LoadedSdk {
    sdk: Arc<dyn WalletSdk>,
    config: LemmaConfig,
}

/// Lemma wallet authentication.
///
/// Construct once and share as `Arc<LemmaAuth>`. The SDK is loaded on the
/// first `initialize` and never again for this instance.
pub struct LemmaAuth {
    loader: Arc<dyn SdkLoader>,
    storage: LocalStore,
    http_client: Client,
    loaded: OnceCell<LoadedSdk>,
    ready: OnceCell<()>,
}

impl fmt::Debug for LemmaAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LemmaAuth")
            .field("site_id", &self.config().map(|config| config.site_id.as_str()))
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl LemmaAuth {
    pub fn new(loader: Arc<dyn SdkLoader>, storage: LocalStore) -> Self {
        Self::with_http_client(loader, storage, Client::new())
    }

    /// Use `http_client` for credential issuance
    pub fn with_http_client(loader: Arc<dyn SdkLoader>, storage: LocalStore, http_client: Client) -> Self {
        Self {
            loader,
            storage,
            http_client,
            loaded: OnceCell::new(),
            ready: OnceCell::new(),
        }
    }

    pub fn storage(&self) -> &LocalStore {
        &self.storage
    }

    pub fn config(&self) -> Option<&LemmaConfig> {
        self.loaded.get().map(|loaded| &loaded.config)
    }

    pub fn is_initialized(&self) -> bool {
        self.ready.initialized()
    }

    /// Load the SDK and, on a return from the wallet host, wait for it to
    /// finish processing the redirect.
    ///
    /// Concurrent and repeated calls share one load. A failed redirect wait
    /// leaves the SDK loaded and can be retried.
    pub async fn initialize(&self, config: LemmaConfig, redirect: &RedirectContext) -> Result<()> {
        if config.site_id.trim().is_empty() {
            return Err(SurvError::Config("Lemma site id is empty".to_string()));
        }

        let loaded = self
            .loaded
            .get_or_try_init(|| self.load_sdk(&config))
            .await?;

        if loaded.config.site_id != config.site_id {
            warn!(
                loaded = %loaded.config.site_id,
                requested = %config.site_id,
                "Lemma SDK already initialized for another site"
            );
        }

        self.ready
            .get_or_try_init(|| self.finish_redirect(loaded, redirect))
            .await?;
        Ok(())
    }

    async fn load_sdk(&self, config: &LemmaConfig) -> Result<LoadedSdk> {
        info!(site_id = %config.site_id, "loading Lemma SDK");
        let sdk = self.loader.load(config).await?;
        Ok(LoadedSdk {
            sdk,
            config: config.clone(),
        })
    }

    async fn finish_redirect(&self, loaded: &LoadedSdk, redirect: &RedirectContext) -> Result<()> {
        let pending = self.storage.contains(LEMMA_REDIRECT_PENDING);
        if !pending && !redirect.came_from(&loaded.config.wallet_host) {
            return Ok(());
        }

        let timeout = loaded.config.redirect_timeout;
        info!(pending, timeout_ms = timeout.as_millis() as u64, "returning from wallet redirect");
        let outcome = tokio::time::timeout(timeout, loaded.sdk.redirect_complete()).await;

        if let Err(err) = self.storage.remove_item(LEMMA_REDIRECT_PENDING) {
            warn!(error = %err, "failed to clear redirect flag");
        }

        match outcome {
            Ok(result) => result,
            Err(_) => Err(SurvError::Timeout {
                what: "wallet redirect completion".to_string(),
                duration_ms: timeout.as_millis() as u64,
            }),
        }
    }

    fn loaded(&self) -> Result<&LoadedSdk> {
        if !self.is_initialized() {
            return Err(SurvError::NotInitialized);
        }
        self.loaded.get().ok_or(SurvError::NotInitialized)
    }

    pub async fn get_auth_state(&self) -> Result<AuthState> {
        let state = self.loaded()?.sdk.wallet_state().await?;
        debug!(?state, "wallet state");
        Ok(AuthState::from(state))
    }

    /// Silent sign-in: succeeds only for an already unlocked wallet that
    /// yields a PPID for this site.
    pub async fn auto_authenticate(&self) -> Result<AutoAuthResult> {
        let loaded = self.loaded()?;
        let state = self.get_auth_state().await?;
        if !state.unlocked {
            return Ok(AutoAuthResult::not_authenticated(state));
        }

        let Some(derived) = loaded.sdk.derive_ppid(&loaded.config.site_id).await? else {
            return Ok(AutoAuthResult::not_authenticated(state));
        };
        let wallet_secret = loaded.sdk.wallet_secret().await?;

        let credential = CachedCredential::new(derived.ppid, derived.scopes, derived.expires_at);
        self.cache_credential(&credential)?;
        info!("auto-authenticated with unlocked wallet");

        Ok(AutoAuthResult {
            authenticated: true,
            ppid: Some(credential.ppid),
            wallet_secret,
            state,
        })
    }

    pub async fn register_passkey(&self) -> Result<UnlockOutcome> {
        self.loaded()?.sdk.register_passkey().await?;
        info!("passkey registered");
        Ok(UnlockOutcome::Unlocked)
    }

    pub async fn unlock_wallet(&self) -> Result<UnlockOutcome> {
        self.loaded()?.sdk.unlock().await?;
        info!("wallet unlocked");
        Ok(UnlockOutcome::Unlocked)
    }

    /// Register, unlock or do nothing, depending on the wallet state
    pub async fn smart_unlock(&self) -> Result<UnlockOutcome> {
        match self.get_auth_state().await?.suggested_action {
            SuggestedAction::CreatePasskey => self.register_passkey().await,
            SuggestedAction::Unlock => self.unlock_wallet().await,
            SuggestedAction::SignIn => Ok(UnlockOutcome::Unlocked),
        }
    }

    /// Unlock through the wallet host.
    ///
    /// On `Redirected` the pending flag stays set so the next `initialize`
    /// waits for the SDK.
    pub async fn unlock_with_redirect(&self, return_to: &str) -> Result<UnlockOutcome> {
        let loaded = self.loaded()?;
        self.storage.set_item(LEMMA_REDIRECT_PENDING, "true")?;

        let outcome = loaded.sdk.unlock_with_redirect(return_to).await;
        if !matches!(outcome, Ok(UnlockOutcome::Redirected)) {
            self.storage.remove_item(LEMMA_REDIRECT_PENDING)?;
        }

        match &outcome {
            Ok(UnlockOutcome::Redirected) => info!(return_to, "leaving for wallet host"),
            Ok(UnlockOutcome::Unlocked) => info!("wallet unlocked without redirect"),
            Err(err) => warn!(error = %err, "redirect unlock failed"),
        }
        outcome
    }

    /// Exchange a wallet secret for a credential at the issuance endpoint
    pub async fn sign_in_with_wallet_secret(&self, wallet_secret: &str) -> Result<CachedCredential> {
        let loaded = self.loaded()?;
        let issuer = CredentialIssuer::new(self.http_client.clone(), &loaded.config.issue_url)?;
        let issued = issuer.issue(&loaded.config.site_id, wallet_secret).await?;

        let credential = CachedCredential::from(issued);
        self.cache_credential(&credential)?;
        info!(scopes = credential.scopes.len(), "signed in with wallet secret");
        Ok(credential)
    }

    /// PPID for this site, derived locally by the SDK
    pub async fn get_authenticated_ppid(&self) -> Result<Option<String>> {
        let loaded = self.loaded()?;
        let Some(derived) = loaded.sdk.derive_ppid(&loaded.config.site_id).await? else {
            return Ok(None);
        };

        let credential = CachedCredential::new(derived.ppid, derived.scopes, derived.expires_at);
        self.cache_credential(&credential)?;
        Ok(Some(credential.ppid))
    }

    pub fn cached_credential(&self) -> Option<CachedCredential> {
        self.storage.get_json(LEMMA_CREDENTIALS)
    }

    /// Local scope check against the cached credential
    pub fn verify_access(&self, resource: &str, action: &str) -> bool {
        let allowed = self
            .cached_credential()
            .is_some_and(|credential| credential.allows(resource, action));
        debug!(resource, action, allowed, "verify access");
        allowed
    }

    pub fn is_authenticated(&self) -> bool {
        self.cached_credential()
            .is_some_and(|credential| !credential.is_expired())
    }

    pub async fn is_session_valid(&self) -> bool {
        let Ok(loaded) = self.loaded() else {
            return false;
        };
        match loaded.sdk.is_session_valid().await {
            Ok(valid) => valid,
            Err(err) => {
                warn!(error = %err, "session check failed");
                false
            }
        }
    }

    /// Run `callback` on every expiry event the SDK reports
    pub fn on_session_expired<F, Fut>(&self, callback: F) -> Result<SessionSubscription>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut events = self.loaded()?.sdk.subscribe_session_events();
        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::Expired) => {
                        info!("Lemma session expired");
                        callback().await;
                    }
                    Ok(event) => debug!(?event, "session event"),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "session events lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        Ok(SessionSubscription { handle })
    }

    /// Drop every `lemma_*` key and the SDK credential. Never fails.
    pub async fn sign_out(&self) {
        let keys: Vec<String> = self
            .storage
            .keys()
            .into_iter()
            .filter(|key| key.starts_with(LEMMA_KEY_PREFIX))
            .collect();
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        if let Err(err) = self.storage.remove_items(&keys) {
            warn!(error = %err, "failed to clear Lemma storage");
        }

        if let Some(loaded) = self.loaded.get() {
            if let Err(err) = loaded.sdk.clear_credential().await {
                warn!(error = %err, "SDK failed to clear credential");
            }
        }
        info!("signed out of Lemma");
    }

    fn cache_credential(&self, credential: &CachedCredential) -> Result<()> {
        self.storage.set_json(LEMMA_CREDENTIALS, credential)?;
        self.storage.set_json(
            LEMMA_USER,
            &LemmaUser {
                ppid: credential.ppid.clone(),
                signed_in_at: Utc::now(),
            },
        )
    }
}
