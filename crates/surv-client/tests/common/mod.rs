/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for surv-client tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use surv_client::{
    AuthStore, LemmaAuth, LemmaConfig, LocalStore, MockSdkLoader, MockWalletSdk, Navigator,
    RecordingNotifier, SurvClient, WalletState,
};
use surv_client::store::{ACCESS_TOKEN, USER};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SITE_ID: &str = "site-test-1";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Everything a flow needs, wired to one mock backend and one mock SDK
pub struct Harness {
    pub server: MockServer,
    pub storage: LocalStore,
    pub client: SurvClient,
    pub sdk: Arc<MockWalletSdk>,
    pub loader: Arc<MockSdkLoader>,
    pub lemma: Arc<LemmaAuth>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub async fn new(sdk: MockWalletSdk) -> Self {
        Self::with_storage(sdk, LocalStore::in_memory()).await
    }

    pub async fn signed_in(sdk: MockWalletSdk) -> Self {
        let storage = LocalStore::in_memory();
        storage.set_item(ACCESS_TOKEN, "backend-jwt").expect("seed token");
        storage
            .set_item(USER, user_json("u-1", "admin").to_string())
            .expect("seed user");
        Self::with_storage(sdk, storage).await
    }

    async fn with_storage(sdk: MockWalletSdk, storage: LocalStore) -> Self {
        let server = setup_mock_server().await;
        let sdk = Arc::new(sdk);
        let loader = Arc::new(MockSdkLoader::new(sdk.clone()));
        let client = SurvClient::new(
            &server.uri(),
            AuthStore::new(storage.clone()),
            Navigator::new("/jobs"),
        )
        .expect("client init");
        let lemma = Arc::new(LemmaAuth::new(loader.clone(), storage.clone()));

        Self {
            server,
            storage,
            client,
            sdk,
            loader,
            lemma,
            notifier: Arc::new(RecordingNotifier::new()),
        }
    }

    pub fn lemma_defaults(&self) -> LemmaConfig {
        LemmaConfig::new("").with_redirect_timeout(Duration::from_millis(200))
    }

    pub async fn mount_lemma_config(&self, site_id: Option<&str>) {
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/lemma-config"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "configured": site_id.is_some(),
                "site_id": site_id
            })))
            .mount(&self.server)
            .await;
    }
}

pub fn unlocked_sdk() -> MockWalletSdk {
    MockWalletSdk::new(WalletState::Unlocked).with_ppid("ppid-abcdefgh12345678", &["*"])
}

pub fn user_json(id: &str, role: &str) -> Value {
    json!({
        "id": id,
        "email": format!("{id}@surv.com"),
        "first_name": "Sam",
        "last_name": "Field",
        "role": role,
        "is_active": true,
        "email_verified": true,
        "created_at": "2024-01-01T00:00:00"
    })
}

pub fn token_json(role: &str) -> Value {
    json!({
        "access_token": "issued-jwt",
        "token_type": "bearer",
        "user": user_json("u-7", role),
        "verification_method": "lemma"
    })
}
