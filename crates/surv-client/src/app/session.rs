/*
[INPUT]:  Current route, auth store, Lemma adapter
[OUTPUT]: Session expiry monitoring and forced sign-out
[POS]:    App layer - keeps the backend session tied to the wallet session
[UPDATE]: When expiry detection or sign-out steps change
*/

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::navigator::LOGIN_ROUTE;
use super::notify::{Notifier, ToastLevel};
use crate::auth::{LemmaAuth, LemmaConfig, RedirectContext, SessionSubscription};
use crate::http::{Result, SurvClient};

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// Live expiry listener for an authenticated route.
///
/// Dropping the monitor stops listening.
#[derive(Debug)]
pub struct SessionMonitor {
    subscription: SessionSubscription,
}

impl SessionMonitor {
    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    pub fn stop(self) {
        self.subscription.cancel();
    }
}

#[derive(Clone)]
pub struct SessionManager {
    client: SurvClient,
    lemma: Arc<LemmaAuth>,
    notifier: Arc<dyn Notifier>,
    lemma_defaults: LemmaConfig,
}

impl SessionManager {
    pub fn new(client: SurvClient, lemma: Arc<LemmaAuth>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            lemma,
            notifier,
            lemma_defaults: LemmaConfig::new(""),
        }
    }

    /// Wallet host, issuance URL and timeouts used when initializing the
    /// adapter; the site id always comes from the backend.
    pub fn with_lemma_defaults(mut self, defaults: LemmaConfig) -> Self {
        self.lemma_defaults = defaults;
        self
    }

    /// Start monitoring for `route`.
    ///
    /// Returns `None` when there is nothing to monitor: not signed in, on
    /// the login page, Lemma not configured, or the session already expired
    /// (in which case the user has been signed out).
    pub async fn activate(&self, route: &str) -> Result<Option<SessionMonitor>> {
        if route == LOGIN_ROUTE || !self.client.auth_store().is_authenticated() {
            return Ok(None);
        }

        let config = self.client.lemma_config().await?;
        let Some(site_id) = config.site_id() else {
            debug!("Lemma not configured, session monitor idle");
            return Ok(None);
        };

        if !self.lemma.is_initialized() {
            let lemma_config = LemmaConfig {
                site_id: site_id.to_string(),
                ..self.lemma_defaults.clone()
            };
            self.lemma
                .initialize(lemma_config, &RedirectContext::none())
                .await?;
        }

        if !self.lemma.is_session_valid().await {
            self.handle_expired().await;
            return Ok(None);
        }

        let manager = self.clone();
        let subscription = self.lemma.on_session_expired(move || {
            let manager = manager.clone();
            async move { manager.handle_expired().await }
        })?;
        debug!(route, "session monitor active");
        Ok(Some(SessionMonitor { subscription }))
    }

    /// Sign out of Lemma and the backend, tell the user, go to `/login`
    pub async fn handle_expired(&self) {
        info!("session expired, signing out");
        self.lemma.sign_out().await;
        if let Err(err) = self.client.auth_store().logout() {
            warn!(error = %err, "failed to clear auth state");
        }
        self.notifier.notify(ToastLevel::Warning, SESSION_EXPIRED_MESSAGE);
        self.client.navigator().navigate(LOGIN_ROUTE);
    }
}
