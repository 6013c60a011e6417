/*
[INPUT]:  Lemma adapter, backend client, redirect context
[OUTPUT]: Login state transitions and the established backend session
[POS]:    App layer - login page state machine
[UPDATE]: When login steps or backend verification change
*/

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::navigator::HOME_ROUTE;
use super::notify::{Notifier, ToastLevel};
use crate::auth::{
    AutoAuthResult, LemmaAuth, LemmaConfig, RedirectContext, SuggestedAction, UnlockOutcome,
};
use crate::http::{SurvClient, SurvError};
use crate::types::{LemmaVerifyRequest, User, VerificationMethod};

pub const WELCOME_MESSAGE: &str = "Welcome to Surv!";
pub const CANCELLED_MESSAGE: &str = "Authentication cancelled or failed";

/// What the login screen offers while waiting for the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    SignIn,
    CreatePasskey,
    Unlock,
    NotConfigured,
}

impl From<SuggestedAction> for Affordance {
    fn from(action: SuggestedAction) -> Self {
        match action {
            SuggestedAction::SignIn => Affordance::SignIn,
            SuggestedAction::CreatePasskey => Affordance::CreatePasskey,
            SuggestedAction::Unlock => Affordance::Unlock,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    Initializing,
    AutoAuth,
    Ready(Affordance),
    Authenticating,
    Verifying,
    CreatingAccount,
    Authenticated,
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Authenticated(Box<User>),
    /// Waiting for the user in `Ready`
    NeedsInteraction(Affordance),
    /// Control left for the wallet host
    Redirected,
    Failed(String),
}

/// Login page flow.
///
/// `Initializing -> AutoAuth -> (Verifying | Ready)`,
/// `Ready -> Authenticating -> Verifying [-> CreatingAccount] -> Authenticated`,
/// any failure lands in `Error`, and `try_again` returns to `Ready`.
pub struct LoginFlow {
    client: SurvClient,
    lemma: Arc<LemmaAuth>,
    notifier: Arc<dyn Notifier>,
    lemma_defaults: LemmaConfig,
    redirect: RedirectContext,
    state: watch::Sender<LoginState>,
    affordance: Mutex<Affordance>,
    site_config: Mutex<Option<LemmaConfig>>,
}

impl LoginFlow {
    pub fn new(client: SurvClient, lemma: Arc<LemmaAuth>, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(LoginState::Initializing);
        Self {
            client,
            lemma,
            notifier,
            lemma_defaults: LemmaConfig::new(""),
            redirect: RedirectContext::none(),
            state,
            affordance: Mutex::new(Affordance::SignIn),
            site_config: Mutex::new(None),
        }
    }

    pub fn with_lemma_defaults(mut self, defaults: LemmaConfig) -> Self {
        self.lemma_defaults = defaults;
        self
    }

    /// How the login page was reached
    pub fn with_redirect(mut self, redirect: RedirectContext) -> Self {
        self.redirect = redirect;
        self
    }

    pub fn state(&self) -> LoginState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoginState> {
        self.state.subscribe()
    }

    /// Load configuration, initialize the adapter and try a silent sign-in
    pub async fn start(&self) -> LoginOutcome {
        self.set(LoginState::Initializing);

        let lemma_config = match self.fetch_site_config().await {
            Ok(Some(config)) => config,
            Ok(None) => {
                info!("Lemma not configured on the backend");
                return self.ready(Affordance::NotConfigured);
            }
            Err(err) => return self.fail(&err),
        };
        if let Err(err) = self.lemma.initialize(lemma_config, &self.redirect).await {
            return self.fail(&err);
        }

        self.set(LoginState::AutoAuth);
        match self.lemma.auto_authenticate().await {
            Ok(AutoAuthResult {
                ppid: Some(ppid), ..
            }) => self.verify(&ppid).await,
            Ok(result) => self.ready(result.state.suggested_action.into()),
            Err(err) => {
                warn!(error = %err, "silent sign-in failed");
                self.ready(Affordance::SignIn)
            }
        }
    }

    /// Interactive sign-in: create, unlock or reuse the wallet, then verify
    pub async fn sign_in(&self) -> LoginOutcome {
        if let Some(outcome) = self.begin().await {
            return outcome;
        }

        if let Err(err) = self.lemma.smart_unlock().await {
            return self.fail(&err);
        }
        self.verify_current_ppid().await
    }

    /// As `sign_in`, but unlocking through the wallet host
    pub async fn sign_in_with_redirect(&self, return_to: &str) -> LoginOutcome {
        if let Some(outcome) = self.begin().await {
            return outcome;
        }

        match self.lemma.unlock_with_redirect(return_to).await {
            Ok(UnlockOutcome::Redirected) => LoginOutcome::Redirected,
            Ok(UnlockOutcome::Unlocked) => self.verify_current_ppid().await,
            Err(err) => self.fail(&err),
        }
    }

    /// `Error -> Ready`
    pub fn try_again(&self) -> LoginState {
        if matches!(self.state(), LoginState::Error(_)) {
            let affordance = *self.affordance.lock().unwrap_or_else(PoisonError::into_inner);
            self.set(LoginState::Ready(affordance));
        }
        self.state()
    }

    async fn begin(&self) -> Option<LoginOutcome> {
        match self.state() {
            LoginState::Ready(Affordance::NotConfigured) => {
                Some(LoginOutcome::Failed(SurvError::NotConfigured.to_string()))
            }
            LoginState::Ready(_) => {
                self.set(LoginState::Authenticating);
                self.client.auth_store().login_start();
                self.ensure_adapter().await.err().map(|err| self.fail(&err))
            }
            other => {
                debug!(state = ?other, "sign-in ignored outside Ready");
                Some(LoginOutcome::Failed(format!("cannot sign in while {other:?}")))
            }
        }
    }

    /// Backend Lemma settings merged over the defaults; `None` when the
    /// backend has no site configured
    async fn fetch_site_config(&self) -> Result<Option<LemmaConfig>, SurvError> {
        let response = self.client.lemma_config().await?;
        let config = response.site_id().map(|site_id| LemmaConfig {
            site_id: site_id.to_string(),
            ..self.lemma_defaults.clone()
        });
        *self.site_config.lock().unwrap_or_else(PoisonError::into_inner) = config.clone();
        Ok(config)
    }

    /// Initialize the adapter if `start` failed before finishing it. No
    /// redirect wait on this path.
    async fn ensure_adapter(&self) -> Result<(), SurvError> {
        if self.lemma.is_initialized() {
            return Ok(());
        }

        let known = self
            .site_config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let config = match known {
            Some(config) => config,
            None => self
                .fetch_site_config()
                .await?
                .ok_or(SurvError::NotConfigured)?,
        };
        info!(site_id = %config.site_id, "retrying Lemma initialization");
        self.lemma.initialize(config, &RedirectContext::none()).await
    }

    async fn verify_current_ppid(&self) -> LoginOutcome {
        match self.lemma.get_authenticated_ppid().await {
            Ok(Some(ppid)) => self.verify(&ppid).await,
            Ok(None) => self.fail_with(CANCELLED_MESSAGE.to_string()),
            Err(err) => self.fail(&err),
        }
    }

    /// Exchange the PPID for a backend session, creating the account on 404
    async fn verify(&self, ppid: &str) -> LoginOutcome {
        self.set(LoginState::Verifying);

        let permissions = self
            .lemma
            .cached_credential()
            .map(|credential| credential.scopes)
            .unwrap_or_default();
        let mut request = LemmaVerifyRequest::for_ppid(ppid, permissions, Vec::new());

        let result = match self.client.lemma_verify(&request).await {
            Err(err) if err.is_not_found() => {
                info!("no account for this wallet, creating one");
                self.set(LoginState::CreatingAccount);
                request.create_account = true;
                self.client.lemma_verify(&request).await
            }
            other => other,
        };

        let token = match result {
            Ok(token) => token,
            Err(err) => return self.fail(&err),
        };

        if let Err(err) = self.client.auth_store().login_success(
            token.user.clone(),
            token.access_token,
            Some(VerificationMethod::Lemma),
        ) {
            return self.fail(&err);
        }

        self.notifier.notify(ToastLevel::Success, WELCOME_MESSAGE);
        self.client.navigator().navigate(HOME_ROUTE);
        self.set(LoginState::Authenticated);
        LoginOutcome::Authenticated(Box::new(token.user))
    }

    fn ready(&self, affordance: Affordance) -> LoginOutcome {
        *self.affordance.lock().unwrap_or_else(PoisonError::into_inner) = affordance;
        self.set(LoginState::Ready(affordance));
        LoginOutcome::NeedsInteraction(affordance)
    }

    fn fail(&self, err: &SurvError) -> LoginOutcome {
        let message = err
            .detail()
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        self.fail_with(message)
    }

    fn fail_with(&self, message: String) -> LoginOutcome {
        warn!(%message, "login failed");
        self.client.auth_store().login_failure();
        self.set(LoginState::Error(message.clone()));
        LoginOutcome::Failed(message)
    }

    fn set(&self, state: LoginState) {
        debug!(?state, "login state");
        self.state.send_replace(state);
    }
}
