/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Surv client crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod app;
pub mod auth;
pub mod http;
pub mod store;
pub mod types;

// Re-export commonly used types from app
pub use app::{
    Affordance,
    LoginFlow,
    LoginOutcome,
    LoginState,
    Navigator,
    Notifier,
    RecordingNotifier,
    SessionManager,
    SessionMonitor,
    ToastLevel,
    TracingNotifier,
};

// Re-export commonly used types from auth
pub use auth::{
    AccessGuard,
    AuthState,
    CachedCredential,
    LemmaAuth,
    LemmaConfig,
    LocalWalletLoader,
    MockSdkLoader,
    MockWalletSdk,
    RedirectContext,
    SdkLoader,
    SessionSubscription,
    SuggestedAction,
    SurvResource,
    UnlockOutcome,
    WalletSdk,
    WalletState,
};

// Re-export commonly used types from http
pub use http::{ClientConfig, DEFAULT_BASE_URL, Result, SurvClient, SurvError, filter_customers};

// Re-export commonly used types from store
pub use store::{AuthSnapshot, AuthStore, LocalStore};

// Re-export all types
pub use types::*;
