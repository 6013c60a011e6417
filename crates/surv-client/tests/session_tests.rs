/*
[INPUT]:  Signed-in harness and scripted wallet session
[OUTPUT]: Test results for session expiry monitoring
[POS]:    Integration tests - session manager
[UPDATE]: When expiry handling or sign-out steps change
*/

mod common;

use std::time::Duration;

use common::{Harness, SITE_ID, unlocked_sdk};
use surv_client::app::SESSION_EXPIRED_MESSAGE;
use surv_client::store::{ACCESS_TOKEN, LEMMA_CREDENTIALS, USER};
use surv_client::{SessionManager, ToastLevel};
use tokio_test::assert_ok;

fn manager(harness: &Harness) -> SessionManager {
    SessionManager::new(
        harness.client.clone(),
        harness.lemma.clone(),
        harness.notifier.clone(),
    )
    .with_lemma_defaults(harness.lemma_defaults())
}

fn assert_signed_out(harness: &Harness) {
    assert!(!harness.client.auth_store().is_authenticated());
    assert!(harness.storage.get_item(ACCESS_TOKEN).is_none());
    assert!(harness.storage.get_item(USER).is_none());
    assert!(!harness.storage.contains(LEMMA_CREDENTIALS));
    assert_eq!(
        harness.notifier.last(),
        Some((ToastLevel::Warning, SESSION_EXPIRED_MESSAGE.to_string()))
    );
    assert_eq!(harness.client.navigator().current(), "/login");
}

/// Wait for the background listener to react to an expiry event
async fn wait_for_login_route(harness: &Harness) {
    let mut route = harness.client.navigator().subscribe();
    tokio::time::timeout(Duration::from_secs(1), async {
        while *route.borrow_and_update() != "/login" {
            if route.changed().await.is_err() {
                break;
            }
        }
    })
    .await
    .expect("never navigated to /login");
}

#[tokio::test]
async fn test_login_route_is_not_monitored() {
    let harness = Harness::signed_in(unlocked_sdk()).await;
    harness.mount_lemma_config(Some(SITE_ID)).await;

    let monitor = assert_ok!(manager(&harness).activate("/login").await);

    assert!(monitor.is_none());
    assert_eq!(harness.loader.load_count(), 0);
}

#[tokio::test]
async fn test_signed_out_user_is_not_monitored() {
    let harness = Harness::new(unlocked_sdk()).await;
    harness.mount_lemma_config(Some(SITE_ID)).await;

    let monitor = assert_ok!(manager(&harness).activate("/jobs").await);

    assert!(monitor.is_none());
    assert_eq!(harness.loader.load_count(), 0);
}

#[tokio::test]
async fn test_unconfigured_lemma_is_not_monitored() {
    let harness = Harness::signed_in(unlocked_sdk()).await;
    harness.mount_lemma_config(None).await;

    let monitor = assert_ok!(manager(&harness).activate("/jobs").await);

    assert!(monitor.is_none());
    assert!(harness.client.auth_store().is_authenticated());
}

#[tokio::test]
async fn test_invalid_session_signs_out_immediately() {
    let harness = Harness::signed_in(unlocked_sdk()).await;
    harness.mount_lemma_config(Some(SITE_ID)).await;
    harness.sdk.set_session_valid(false);

    let monitor = assert_ok!(manager(&harness).activate("/jobs").await);

    assert!(monitor.is_none());
    assert_signed_out(&harness);
    assert_eq!(harness.sdk.calls("clear_credential"), 1);
}

#[tokio::test]
async fn test_expiry_event_signs_out() {
    let harness = Harness::signed_in(unlocked_sdk()).await;
    harness.mount_lemma_config(Some(SITE_ID)).await;

    let monitor = assert_ok!(manager(&harness).activate("/customers").await)
        .expect("monitor should be active");
    assert!(monitor.is_active());
    assert!(harness.client.auth_store().is_authenticated());

    harness.sdk.expire_session();
    wait_for_login_route(&harness).await;

    assert_signed_out(&harness);
}

#[tokio::test]
async fn test_stopped_monitor_ignores_expiry() {
    let harness = Harness::signed_in(unlocked_sdk()).await;
    harness.mount_lemma_config(Some(SITE_ID)).await;

    let monitor = assert_ok!(manager(&harness).activate("/jobs").await)
        .expect("monitor should be active");
    monitor.stop();
    tokio::task::yield_now().await;

    harness.sdk.expire_session();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(harness.client.auth_store().is_authenticated());
    assert_eq!(harness.client.navigator().current(), "/jobs");
    assert!(harness.notifier.toasts().is_empty());
}

#[tokio::test]
async fn test_reactivation_reuses_loaded_sdk() {
    let harness = Harness::signed_in(unlocked_sdk()).await;
    harness.mount_lemma_config(Some(SITE_ID)).await;
    let manager = manager(&harness);

    let first = assert_ok!(manager.activate("/jobs").await);
    drop(first);
    let second = assert_ok!(manager.activate("/invoices").await);

    assert!(second.is_some());
    assert_eq!(harness.loader.load_count(), 1);
}
