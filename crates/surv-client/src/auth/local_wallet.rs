/*
[INPUT]:  Wallet directory on disk and the Lemma site id
[OUTPUT]: A file-backed Ed25519 wallet implementing the WalletSdk seam
[POS]:    Auth layer - local wallet for terminals without a browser passkey
[UPDATE]: When key storage format or PPID derivation changes
*/

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use super::sdk::{
    LemmaConfig, PpidCredential, SdkLoader, SessionEvent, UnlockOutcome, WalletSdk, WalletState,
};
use crate::http::{Result, SurvError};

const KEY_FILE: &str = "wallet_ed25519.key";
const SECRET_CONTEXT: &[u8] = b"surv-wallet-secret:";

/// Ed25519 wallet key
#[derive(Debug)]
pub struct WalletKey {
    signing_key: SigningKey,
}

impl WalletKey {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_secret_key(bytes: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.signing_key
            .verifying_key()
            .verify(message, signature)
            .is_ok()
    }

    pub fn public_key_base58(&self) -> String {
        bs58::encode(self.signing_key.verifying_key().as_bytes()).into_string()
    }

    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Pseudonymous per-site id: `ppid_` + first 32 hex chars of
    /// SHA-256(site_id || public key)
    pub fn ppid_for(&self, site_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(site_id.as_bytes());
        hasher.update(self.signing_key.verifying_key().as_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("ppid_{}", &digest[..32])
    }

    /// Stable per-site secret: base58 of the signature over the site id
    pub fn wallet_secret_for(&self, site_id: &str) -> String {
        let mut message = SECRET_CONTEXT.to_vec();
        message.extend_from_slice(site_id.as_bytes());
        bs58::encode(self.sign(&message).to_bytes()).into_string()
    }
}

/// Key file location and persistence
#[derive(Debug, Clone)]
pub struct WalletKeyFile {
    dir: PathBuf,
}

impl WalletKeyFile {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(KEY_FILE)
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    pub fn load(&self) -> io::Result<Option<WalletKey>> {
        let content = match fs::read_to_string(self.path()) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };

        let bytes = STANDARD
            .decode(content.trim())
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        let key_bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "wallet key must be 32 bytes")
        })?;
        Ok(Some(WalletKey::from_secret_key(&key_bytes)))
    }

    /// Write with 0600 permissions via a temp file and rename
    pub fn save(&self, key: &WalletKey) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path();
        let tmp = path.with_extension("key.tmp");
        fs::write(&tmp, STANDARD.encode(key.secret_key_bytes()))?;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        fs::rename(&tmp, &path)
    }
}

struct Unlocked {
    key: WalletKey,
    at: Instant,
    generation: u64,
    expiry: Option<AbortHandle>,
}

/// Unlocked key plus the event channel, shared with the expiry timer
struct WalletSession {
    unlocked: Mutex<Option<Unlocked>>,
    generation: AtomicU64,
    events: broadcast::Sender<SessionEvent>,
}

impl WalletSession {
    fn state(&self) -> MutexGuard<'_, Option<Unlocked>> {
        self.unlocked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self, event: SessionEvent) {
        let taken = self.state().take();
        if let Some(unlocked) = taken {
            if let Some(expiry) = unlocked.expiry {
                expiry.abort();
            }
            info!(?event, "local wallet locked");
            let _ = self.events.send(event);
        }
    }

    /// Timer path: only the unlock that armed the timer may expire
    fn expire(&self, generation: u64) {
        let taken = {
            let mut state = self.state();
            if state.as_ref().is_some_and(|unlocked| unlocked.generation == generation) {
                state.take()
            } else {
                None
            }
        };
        if taken.is_some() {
            info!("local wallet session expired");
            let _ = self.events.send(SessionEvent::Expired);
        }
    }
}

/// Wallet SDK backed by a key file.
///
/// Registering creates the key; unlocking loads it into memory. There is no
/// wallet host, so redirect unlocks complete in place.
pub struct LocalWalletSdk {
    key_file: WalletKeyFile,
    site_id: String,
    scopes: Vec<String>,
    session_ttl: Option<Duration>,
    session: Arc<WalletSession>,
}

impl std::fmt::Debug for LocalWalletSdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWalletSdk")
            .field("key_file", &self.key_file.path())
            .field("site_id", &self.site_id)
            .field("unlocked", &self.session.state().is_some())
            .finish()
    }
}

impl LocalWalletSdk {
    pub fn new(dir: impl AsRef<Path>, site_id: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            key_file: WalletKeyFile::new(dir),
            site_id: site_id.into(),
            scopes: Vec::new(),
            session_ttl: None,
            session: Arc::new(WalletSession {
                unlocked: Mutex::new(None),
                generation: AtomicU64::new(0),
                events,
            }),
        }
    }

    /// Scopes reported with derived PPIDs
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Unlocked sessions expire after `ttl`, announced with
    /// [`SessionEvent::Expired`] whether or not anyone queries the wallet
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }

    pub fn key_file(&self) -> &WalletKeyFile {
        &self.key_file
    }

    /// Forget the in-memory key and notify listeners
    pub fn lock(&self, event: SessionEvent) {
        self.session.lock(event);
    }

    fn expired(&self, unlocked: &Unlocked) -> bool {
        self.session_ttl
            .is_some_and(|ttl| unlocked.at.elapsed() >= ttl)
    }

    /// Apply `f` to the unlocked key; an expired session locks first
    fn with_key<T>(&self, f: impl FnOnce(&WalletKey) -> T) -> Option<T> {
        {
            let guard = self.session.state();
            match guard.as_ref() {
                None => return None,
                Some(unlocked) if !self.expired(unlocked) => return Some(f(&unlocked.key)),
                Some(_) => {}
            }
        }
        self.lock(SessionEvent::Expired);
        None
    }

    fn set_unlocked(&self, key: WalletKey) {
        let generation = self.session.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let expiry = self.session_ttl.map(|ttl| {
            let session: Weak<WalletSession> = Arc::downgrade(&self.session);
            tokio::spawn(async move {
                tokio::time::sleep(ttl).await;
                if let Some(session) = session.upgrade() {
                    session.expire(generation);
                }
            })
            .abort_handle()
        });

        let previous = self.session.state().replace(Unlocked {
            key,
            at: Instant::now(),
            generation,
            expiry,
        });
        if let Some(expiry) = previous.and_then(|unlocked| unlocked.expiry) {
            expiry.abort();
        }
    }
}

#[async_trait]
impl WalletSdk for LocalWalletSdk {
    async fn wallet_state(&self) -> Result<WalletState> {
        if self.with_key(|_| ()).is_some() {
            return Ok(WalletState::Unlocked);
        }
        Ok(if self.key_file.exists() {
            WalletState::Locked
        } else {
            WalletState::NoWallet
        })
    }

    async fn register_passkey(&self) -> Result<()> {
        if self.key_file.exists() {
            return Err(SurvError::sdk(format_args!(
                "a wallet already exists at {}",
                self.key_file.path().display()
            )));
        }
        let key = WalletKey::generate();
        self.key_file.save(&key)?;
        info!(public_key = %key.public_key_base58(), "local wallet created");
        self.set_unlocked(key);
        Ok(())
    }

    async fn unlock(&self) -> Result<()> {
        let key = self
            .key_file
            .load()?
            .ok_or_else(|| SurvError::sdk("no wallet found, create a passkey first"))?;
        debug!(public_key = %key.public_key_base58(), "local wallet unlocked");
        self.set_unlocked(key);
        Ok(())
    }

    async fn unlock_with_redirect(&self, _return_to: &str) -> Result<UnlockOutcome> {
        self.unlock().await?;
        Ok(UnlockOutcome::Unlocked)
    }

    async fn wallet_secret(&self) -> Result<Option<String>> {
        Ok(self.with_key(|key| key.wallet_secret_for(&self.site_id)))
    }

    async fn derive_ppid(&self, site_id: &str) -> Result<Option<PpidCredential>> {
        Ok(self.with_key(|key| PpidCredential {
            ppid: key.ppid_for(site_id),
            scopes: self.scopes.clone(),
            expires_at: None,
        }))
    }

    async fn redirect_complete(&self) -> Result<()> {
        Ok(())
    }

    async fn is_session_valid(&self) -> Result<bool> {
        Ok(self.with_key(|_| ()).is_some())
    }

    fn subscribe_session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.events.subscribe()
    }

    async fn clear_credential(&self) -> Result<()> {
        self.lock(SessionEvent::Locked);
        Ok(())
    }
}

/// Loads a [`LocalWalletSdk`] from a directory
#[derive(Debug, Clone)]
pub struct LocalWalletLoader {
    dir: PathBuf,
    scopes: Vec<String>,
    session_ttl: Option<Duration>,
}

impl LocalWalletLoader {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            scopes: Vec::new(),
            session_ttl: None,
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.session_ttl = ttl;
        self
    }
}

#[async_trait]
impl SdkLoader for LocalWalletLoader {
    async fn load(&self, config: &LemmaConfig) -> Result<Arc<dyn WalletSdk>> {
        let mut sdk = LocalWalletSdk::new(&self.dir, &config.site_id).with_scopes(self.scopes.clone());
        if let Some(ttl) = self.session_ttl {
            sdk = sdk.with_session_ttl(ttl);
        }
        Ok(Arc::new(sdk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        let mut path = env::temp_dir();
        path.push(format!("surv-wallet-test-{}", Uuid::new_v4()));
        path
    }

    #[test]
    fn test_sign_and_verify() {
        let key = WalletKey::generate();
        let signature = key.sign(b"test message");
        assert!(key.verify(b"test message", &signature));
        assert!(!key.verify(b"other message", &signature));
    }

    #[test]
    fn test_ppid_is_per_site_and_stable() {
        let key = WalletKey::from_secret_key(&[7u8; 32]);
        let a = key.ppid_for("site-a");
        assert_eq!(a, key.ppid_for("site-a"));
        assert_ne!(a, key.ppid_for("site-b"));
        assert!(a.starts_with("ppid_"));
        assert_eq!(a.len(), "ppid_".len() + 32);

        let other = WalletKey::from_secret_key(&[8u8; 32]);
        assert_ne!(a, other.ppid_for("site-a"));
    }

    #[test]
    fn test_key_file_roundtrip_and_permissions() {
        let dir = temp_dir();
        let file = WalletKeyFile::new(&dir);
        assert!(file.load().unwrap().is_none());

        let key = WalletKey::generate();
        file.save(&key).unwrap();
        let loaded = file.load().unwrap().expect("saved key");
        assert_eq!(loaded.public_key_base58(), key.public_key_base58());

        let mode = fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_local_wallet_lifecycle() {
        let dir = temp_dir();
        let sdk = LocalWalletSdk::new(&dir, "site-1").with_scopes(vec!["jobs:*".to_string()]);

        assert_eq!(sdk.wallet_state().await.unwrap(), WalletState::NoWallet);
        assert!(sdk.derive_ppid("site-1").await.unwrap().is_none());

        sdk.register_passkey().await.unwrap();
        assert_eq!(sdk.wallet_state().await.unwrap(), WalletState::Unlocked);
        let first = sdk.derive_ppid("site-1").await.unwrap().unwrap();
        assert_eq!(first.scopes, vec!["jobs:*".to_string()]);
        assert!(sdk.wallet_secret().await.unwrap().is_some());

        let mut events = sdk.subscribe_session_events();
        sdk.clear_credential().await.unwrap();
        assert_eq!(events.recv().await.unwrap(), SessionEvent::Locked);
        assert_eq!(sdk.wallet_state().await.unwrap(), WalletState::Locked);

        sdk.unlock().await.unwrap();
        let again = sdk.derive_ppid("site-1").await.unwrap().unwrap();
        assert_eq!(again.ppid, first.ppid);

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_session_ttl_expires() {
        let dir = temp_dir();
        let sdk = LocalWalletSdk::new(&dir, "site-1").with_session_ttl(Duration::from_millis(20));
        let mut events = sdk.subscribe_session_events();

        sdk.register_passkey().await.unwrap();
        assert!(sdk.is_session_valid().await.unwrap());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!sdk.is_session_valid().await.unwrap());
        assert_eq!(events.recv().await.unwrap(), SessionEvent::Expired);
        assert_eq!(sdk.wallet_state().await.unwrap(), WalletState::Locked);

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_session_ttl_announces_expiry_unprompted() {
        let dir = temp_dir();
        let sdk = LocalWalletSdk::new(&dir, "site-1").with_session_ttl(Duration::from_millis(30));
        let mut events = sdk.subscribe_session_events();

        sdk.register_passkey().await.unwrap();
        let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("expiry was not announced")
            .unwrap();
        assert_eq!(event, SessionEvent::Expired);
        assert!(sdk.session.state().is_none());

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_unlock_again_rearms_expiry_timer() {
        let dir = temp_dir();
        let sdk = LocalWalletSdk::new(&dir, "site-1").with_session_ttl(Duration::from_millis(150));
        let mut events = sdk.subscribe_session_events();

        sdk.register_passkey().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        sdk.unlock().await.unwrap();

        // The first timer would have fired here
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(events.try_recv().is_err());
        assert!(sdk.is_session_valid().await.unwrap());

        let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("expiry was not announced")
            .unwrap();
        assert_eq!(event, SessionEvent::Expired);

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_lock_cancels_expiry_timer() {
        let dir = temp_dir();
        let sdk = LocalWalletSdk::new(&dir, "site-1").with_session_ttl(Duration::from_millis(30));
        let mut events = sdk.subscribe_session_events();

        sdk.register_passkey().await.unwrap();
        sdk.clear_credential().await.unwrap();
        assert_eq!(events.recv().await.unwrap(), SessionEvent::Locked);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(events.try_recv().is_err());

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_register_twice_fails() {
        let dir = temp_dir();
        let sdk = LocalWalletSdk::new(&dir, "site-1");
        sdk.register_passkey().await.unwrap();
        assert!(matches!(sdk.register_passkey().await, Err(SurvError::Sdk(_))));
        fs::remove_dir_all(dir).unwrap();
    }
}
