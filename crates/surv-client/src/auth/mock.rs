/*
[INPUT]:  Scripted wallet state and SDK responses
[OUTPUT]: In-memory WalletSdk and SdkLoader implementations
[POS]:    Auth layer - test doubles for the wallet SDK seam
[UPDATE]: When the WalletSdk trait gains methods
*/

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::sdk::{
    LemmaConfig, PpidCredential, SdkLoader, SessionEvent, UnlockOutcome, WalletSdk, WalletState,
};
use crate::http::{Result, SurvError};

/// Scriptable wallet SDK for tests
#[derive(Debug)]
pub struct MockWalletSdk {
    state: Mutex<WalletState>,
    credential: Mutex<Option<PpidCredential>>,
    wallet_secret: Mutex<Option<String>>,
    redirect_outcome: Mutex<UnlockOutcome>,
    hang_on_redirect: AtomicBool,
    unlock_error: Mutex<Option<String>>,
    session_valid: AtomicBool,
    events: broadcast::Sender<SessionEvent>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl MockWalletSdk {
    pub fn new(state: WalletState) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(state),
            credential: Mutex::new(Some(PpidCredential {
                ppid: "ppid-mock-0000000000000001".to_string(),
                scopes: Vec::new(),
                expires_at: None,
            })),
            wallet_secret: Mutex::new(None),
            redirect_outcome: Mutex::new(UnlockOutcome::Redirected),
            hang_on_redirect: AtomicBool::new(false),
            unlock_error: Mutex::new(None),
            session_valid: AtomicBool::new(true),
            events,
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_ppid(self, ppid: &str, scopes: &[&str]) -> Self {
        *lock(&self.credential) = Some(PpidCredential {
            ppid: ppid.to_string(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            expires_at: None,
        });
        self
    }

    pub fn without_ppid(self) -> Self {
        *lock(&self.credential) = None;
        self
    }

    pub fn with_wallet_secret(self, secret: &str) -> Self {
        *lock(&self.wallet_secret) = Some(secret.to_string());
        self
    }

    pub fn with_redirect_outcome(self, outcome: UnlockOutcome) -> Self {
        *lock(&self.redirect_outcome) = outcome;
        self
    }

    /// `redirect_complete` never resolves
    pub fn hanging_redirect(self) -> Self {
        self.hang_on_redirect.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_unlock(self, message: &str) -> Self {
        *lock(&self.unlock_error) = Some(message.to_string());
        self
    }

    pub fn set_state(&self, state: WalletState) {
        *lock(&self.state) = state;
    }

    pub fn set_session_valid(&self, valid: bool) {
        self.session_valid.store(valid, Ordering::SeqCst);
    }

    /// Broadcast an expiry to every subscriber
    pub fn expire_session(&self) {
        self.session_valid.store(false, Ordering::SeqCst);
        let _ = self.events.send(SessionEvent::Expired);
    }

    pub fn calls(&self, method: &str) -> usize {
        lock(&self.calls).get(method).copied().unwrap_or(0)
    }

    fn record(&self, method: &'static str) {
        *lock(&self.calls).entry(method).or_insert(0) += 1;
    }

    fn unlock_result(&self) -> Result<()> {
        match lock(&self.unlock_error).clone() {
            Some(message) => Err(SurvError::Sdk(message)),
            None => {
                self.set_state(WalletState::Unlocked);
                Ok(())
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl WalletSdk for MockWalletSdk {
    async fn wallet_state(&self) -> Result<WalletState> {
        self.record("wallet_state");
        Ok(*lock(&self.state))
    }

    async fn register_passkey(&self) -> Result<()> {
        self.record("register_passkey");
        self.set_state(WalletState::Unlocked);
        Ok(())
    }

    async fn unlock(&self) -> Result<()> {
        self.record("unlock");
        self.unlock_result()
    }

    async fn unlock_with_redirect(&self, _return_to: &str) -> Result<UnlockOutcome> {
        self.record("unlock_with_redirect");
        let outcome = *lock(&self.redirect_outcome);
        if outcome == UnlockOutcome::Unlocked {
            self.unlock_result()?;
        }
        Ok(outcome)
    }

    async fn wallet_secret(&self) -> Result<Option<String>> {
        self.record("wallet_secret");
        Ok(lock(&self.wallet_secret).clone())
    }

    async fn derive_ppid(&self, _site_id: &str) -> Result<Option<PpidCredential>> {
        self.record("derive_ppid");
        if *lock(&self.state) != WalletState::Unlocked {
            return Ok(None);
        }
        Ok(lock(&self.credential).clone())
    }

    async fn redirect_complete(&self) -> Result<()> {
        self.record("redirect_complete");
        if self.hang_on_redirect.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn is_session_valid(&self) -> Result<bool> {
        self.record("is_session_valid");
        Ok(self.session_valid.load(Ordering::SeqCst))
    }

    fn subscribe_session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn clear_credential(&self) -> Result<()> {
        self.record("clear_credential");
        self.set_state(WalletState::Locked);
        Ok(())
    }
}

/// Loader handing out one shared [`MockWalletSdk`], counting loads
#[derive(Debug)]
pub struct MockSdkLoader {
    sdk: Arc<MockWalletSdk>,
    loads: AtomicUsize,
}

impl MockSdkLoader {
    pub fn new(sdk: Arc<MockWalletSdk>) -> Self {
        Self {
            sdk,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SdkLoader for MockSdkLoader {
    async fn load(&self, _config: &LemmaConfig) -> Result<Arc<dyn WalletSdk>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(self.sdk.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_unlock_and_derive() {
        let sdk = MockWalletSdk::new(WalletState::Locked).with_ppid("ppid-1", &["*"]);
        assert_eq!(sdk.derive_ppid("site").await.unwrap(), None);

        sdk.unlock().await.unwrap();
        let credential = sdk.derive_ppid("site").await.unwrap().unwrap();
        assert_eq!(credential.ppid, "ppid-1");
        assert_eq!(sdk.calls("derive_ppid"), 2);
    }

    #[tokio::test]
    async fn test_mock_failing_unlock() {
        let sdk = MockWalletSdk::new(WalletState::Locked).failing_unlock("user cancelled");
        let err = sdk.unlock().await.unwrap_err();
        assert!(matches!(err, SurvError::Sdk(ref msg) if msg == "user cancelled"));
        assert_eq!(sdk.wallet_state().await.unwrap(), WalletState::Locked);
    }
}
