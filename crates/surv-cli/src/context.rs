/*
[INPUT]:  Validated SurvConfig
[OUTPUT]: Wired storage, backend client, Lemma adapter and notifier
[POS]:    Application wiring - one instance per process
[UPDATE]: When components or their construction change
*/

use std::sync::Arc;

use anyhow::{Context, Result};
use surv_client::{
    AuthStore, LemmaAuth, LemmaConfig, LocalStore, LocalWalletLoader, LoginFlow, Navigator,
    RedirectContext, SessionManager, SurvClient,
};
use tracing::debug;

use crate::config::SurvConfig;
use crate::notify::ConsoleNotifier;

/// Everything a command needs
#[derive(Debug)]
pub struct AppContext {
    pub config: SurvConfig,
    pub storage: LocalStore,
    pub client: SurvClient,
    pub lemma: Arc<LemmaAuth>,
    pub notifier: Arc<ConsoleNotifier>,
}

impl AppContext {
    pub fn new(config: SurvConfig) -> Result<Self> {
        let storage_path = config.storage_path()?;
        let storage = LocalStore::open(&storage_path)
            .with_context(|| format!("open local storage at {}", storage_path.display()))?;

        let client = SurvClient::new(
            &config.api_base_url,
            AuthStore::new(storage.clone()),
            Navigator::default(),
        )
        .context("build backend client")?;

        let loader = LocalWalletLoader::new(config.wallet_dir()?)
            .with_scopes(config.lemma.scopes.clone())
            .with_session_ttl(config.lemma.session_ttl());
        let lemma = Arc::new(LemmaAuth::with_http_client(
            Arc::new(loader),
            storage.clone(),
            client.http().clone(),
        ));

        debug!(storage = %storage_path.display(), api = %config.api_base_url, "context ready");
        Ok(Self {
            config,
            storage,
            client,
            lemma,
            notifier: Arc::new(ConsoleNotifier),
        })
    }

    pub fn login_flow(&self) -> LoginFlow {
        LoginFlow::new(self.client.clone(), self.lemma.clone(), self.notifier.clone())
            .with_lemma_defaults(self.config.lemma_defaults())
    }

    pub fn session_manager(&self) -> SessionManager {
        SessionManager::new(self.client.clone(), self.lemma.clone(), self.notifier.clone())
            .with_lemma_defaults(self.config.lemma_defaults())
    }

    /// Initialize the adapter for the backend's site. `false` when the
    /// backend has no Lemma site configured.
    pub async fn ensure_lemma(&self) -> Result<bool> {
        if self.lemma.is_initialized() {
            return Ok(true);
        }

        let remote = self.client.lemma_config().await.context("fetch Lemma config")?;
        let Some(site_id) = remote.site_id() else {
            return Ok(false);
        };

        let config = LemmaConfig {
            site_id: site_id.to_string(),
            ..self.config.lemma_defaults()
        };
        self.lemma
            .initialize(config, &RedirectContext::none())
            .await
            .context("initialize Lemma adapter")?;
        Ok(true)
    }
}
