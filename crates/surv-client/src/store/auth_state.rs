/*
[INPUT]:  Login/logout actions and the local store
[OUTPUT]: Current auth snapshot (user, token, flags) kept in sync with storage
[POS]:    Store layer - application auth state
[UPDATE]: When auth actions or persisted keys change
*/

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use super::local::{ACCESS_TOKEN, LEMMA_CREDENTIALS, LocalStore, USER};
use crate::http::Result;
use crate::types::{User, UserRole, VerificationMethod};

/// Point-in-time view of the auth state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthSnapshot {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub verification_method: Option<VerificationMethod>,
}

impl AuthSnapshot {
    pub fn role(&self) -> Option<UserRole> {
        self.user.as_ref().map(|user| user.role)
    }
}

/// Partial user update, applied field by field
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub lemma_did: Option<String>,
}

/// Thread-safe auth state that writes through to [`LocalStore`]
#[derive(Debug, Clone)]
pub struct AuthStore {
    storage: LocalStore,
    state: Arc<RwLock<AuthSnapshot>>,
}

impl AuthStore {
    /// Build the initial state from storage: authenticated iff a token is stored
    pub fn new(storage: LocalStore) -> Self {
        let state = load_stored_auth(&storage);
        Self {
            storage,
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub fn storage(&self) -> &LocalStore {
        &self.storage
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_authenticated
    }

    pub fn user(&self) -> Option<User> {
        self.snapshot().user
    }

    /// Token as currently persisted; read on every request
    pub fn stored_token(&self) -> Option<String> {
        self.storage.get_item(ACCESS_TOKEN).filter(|token| !token.is_empty())
    }

    pub fn login_start(&self) {
        self.update(|state| state.loading = true);
    }

    pub fn login_success(
        &self,
        user: User,
        token: String,
        method: Option<VerificationMethod>,
    ) -> Result<()> {
        self.storage.set_item(ACCESS_TOKEN, token.clone())?;
        self.storage.set_json(USER, &user)?;

        info!(user_id = %user.id, role = %user.role, "login succeeded");
        self.update(|state| {
            state.user = Some(user);
            state.token = Some(token);
            state.is_authenticated = true;
            state.loading = false;
            state.verification_method = Some(method.unwrap_or(VerificationMethod::Password));
        });
        Ok(())
    }

    pub fn login_failure(&self) {
        self.update(|state| state.loading = false);
    }

    /// Reset state and remove token, user and cached Lemma credentials
    pub fn logout(&self) -> Result<()> {
        self.update(|state| *state = AuthSnapshot::default());
        self.storage.remove_items(&[ACCESS_TOKEN, USER, LEMMA_CREDENTIALS])?;
        info!("logged out");
        Ok(())
    }

    /// Drop token and user after the backend rejected them (401).
    ///
    /// Leaves `lemma_credentials` alone, as the HTTP layer always has.
    pub fn clear_session(&self) -> Result<()> {
        self.update(|state| *state = AuthSnapshot::default());
        self.storage.remove_items(&[ACCESS_TOKEN, USER])?;
        debug!("session cleared after 401");
        Ok(())
    }

    pub fn update_user(&self, patch: UserPatch) -> Result<()> {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let Some(user) = guard.user.as_mut() else {
            return Ok(());
        };

        if let Some(first_name) = patch.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = patch.last_name {
            user.last_name = Some(last_name);
        }
        if let Some(phone) = patch.phone {
            user.phone = Some(phone);
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(lemma_did) = patch.lemma_did {
            user.lemma_did = Some(lemma_did);
        }

        self.storage.set_json(USER, &*user)
    }

    pub fn set_verification_method(&self, method: VerificationMethod) {
        self.update(|state| state.verification_method = Some(method));
    }

    fn update(&self, f: impl FnOnce(&mut AuthSnapshot)) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}

fn load_stored_auth(storage: &LocalStore) -> AuthSnapshot {
    let token = storage.get_item(ACCESS_TOKEN).filter(|token| !token.is_empty());
    let user = storage.get_json::<User>(USER);
    AuthSnapshot {
        is_authenticated: token.is_some(),
        user,
        token,
        loading: false,
        verification_method: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LEMMA_USER;

    fn user(role: &str) -> User {
        serde_json::from_value(serde_json::json!({
            "id": "u-1",
            "email": "tech@surv.com",
            "role": role,
            "created_at": "2024-01-01T00:00:00"
        }))
        .unwrap()
    }

    #[test]
    fn test_initial_state_from_storage() {
        let storage = LocalStore::in_memory();
        assert!(!AuthStore::new(storage.clone()).is_authenticated());

        storage.set_item(ACCESS_TOKEN, "tok").unwrap();
        storage.set_json(USER, &user("manager")).unwrap();
        let store = AuthStore::new(storage);
        let snapshot = store.snapshot();
        assert!(snapshot.is_authenticated);
        assert_eq!(snapshot.role(), Some(UserRole::Manager));
    }

    #[test]
    fn test_login_success_persists() {
        let storage = LocalStore::in_memory();
        let store = AuthStore::new(storage.clone());

        store.login_start();
        assert!(store.snapshot().loading);

        store
            .login_success(user("admin"), "tok".to_string(), Some(VerificationMethod::Lemma))
            .unwrap();

        let snapshot = store.snapshot();
        assert!(snapshot.is_authenticated);
        assert!(!snapshot.loading);
        assert_eq!(snapshot.verification_method, Some(VerificationMethod::Lemma));
        assert_eq!(storage.get_item(ACCESS_TOKEN).as_deref(), Some("tok"));
        assert!(storage.get_json::<User>(USER).is_some());
    }

    #[test]
    fn test_login_success_defaults_to_password() {
        let store = AuthStore::new(LocalStore::in_memory());
        store
            .login_success(user("admin"), "tok".to_string(), None)
            .unwrap();
        assert_eq!(
            store.snapshot().verification_method,
            Some(VerificationMethod::Password)
        );
    }

    #[test]
    fn test_logout_clears_keys() {
        let storage = LocalStore::in_memory();
        let store = AuthStore::new(storage.clone());
        store
            .login_success(user("admin"), "tok".to_string(), None)
            .unwrap();
        storage.set_item(LEMMA_CREDENTIALS, "{}").unwrap();
        storage.set_item(LEMMA_USER, "{}").unwrap();

        store.logout().unwrap();

        assert!(!store.is_authenticated());
        assert!(storage.get_item(ACCESS_TOKEN).is_none());
        assert!(storage.get_item(USER).is_none());
        assert!(storage.get_item(LEMMA_CREDENTIALS).is_none());
        // lemma_user belongs to the adapter's sign-out
        assert!(storage.get_item(LEMMA_USER).is_some());
    }

    #[test]
    fn test_update_user_persists_patch() {
        let storage = LocalStore::in_memory();
        let store = AuthStore::new(storage.clone());
        store
            .login_success(user("technician"), "tok".to_string(), None)
            .unwrap();

        store
            .update_user(UserPatch {
                phone: Some("+15550100".to_string()),
                ..UserPatch::default()
            })
            .unwrap();

        let persisted: User = storage.get_json(USER).unwrap();
        assert_eq!(persisted.phone.as_deref(), Some("+15550100"));
        assert_eq!(store.user().unwrap().phone.as_deref(), Some("+15550100"));
    }
}
