/*
[INPUT]:  Auth actions and key-value writes
[OUTPUT]: Persisted local storage and auth state
[POS]:    Store layer - client-side persistence
[UPDATE]: When storage keys or auth actions change
*/

pub mod auth_state;
pub mod local;

pub use auth_state::{AuthSnapshot, AuthStore, UserPatch};
pub use local::{
    ACCESS_TOKEN, LEMMA_CREDENTIALS, LEMMA_REDIRECT_PENDING, LEMMA_USER, LocalStore, USER,
};
