/*
[INPUT]:  Lemma configuration, wallet SDK, local store
[OUTPUT]: Wallet state, PPIDs, cached credentials, access decisions
[POS]:    Auth layer - Lemma wallet authentication
[UPDATE]: When auth flow or credential handling changes
*/

pub mod credential;
pub mod lemma;
pub mod local_wallet;
pub mod mock;
pub mod permissions;
pub mod sdk;

pub use credential::{CachedCredential, CredentialIssuer, IssuedCredential, LemmaUser, scope_allows};
pub use lemma::{AuthState, AutoAuthResult, LemmaAuth, SessionSubscription, SuggestedAction};
pub use local_wallet::{LocalWalletLoader, LocalWalletSdk, WalletKey, WalletKeyFile};
pub use mock::{MockSdkLoader, MockWalletSdk};
pub use permissions::{
    AccessGuard, PERMISSION_ADMIN, PERMISSION_MANAGER, PERMISSION_TECHNICIAN, SurvResource,
    has_role_access, role_from_permissions, role_to_permission,
};
pub use sdk::{
    DEFAULT_ISSUE_URL, DEFAULT_REDIRECT_TIMEOUT, DEFAULT_WALLET_HOST, LemmaConfig, PpidCredential,
    RedirectContext, SdkLoader, SessionEvent, UnlockOutcome, WalletSdk, WalletState,
};
