//! Strategy selection and the connect lifecycle.

mod common;

use std::sync::atomic::Ordering;

use common::{FakeEnv, Harness, identity};
use sphere_connect::{PermissionScope, Strategy, Transport};

#[tokio::test]
async fn iframe_takes_priority_over_extension() {
    let env = FakeEnv::framed();
    env.extension.store(true, Ordering::SeqCst);
    let h = Harness::new(env);
    let wallet = h.build();

    let state = wallet.connect().await;

    assert!(state.is_connected);
    assert_eq!(state.strategy, Some(Strategy::Iframe));
    assert_eq!(h.transports.last().unwrap().strategy, Strategy::Iframe);
    assert_eq!(h.env.open_count(), 0);
}

#[tokio::test]
async fn cross_origin_parent_counts_as_framed() {
    let env = FakeEnv::top_level();
    env.frame_error.store(true, Ordering::SeqCst);
    let h = Harness::new(env);

    let state = h.build().connect().await;
    assert_eq!(state.strategy, Some(Strategy::Iframe));
}

#[tokio::test]
async fn extension_chosen_when_top_level() {
    let h = Harness::new(FakeEnv::with_extension());
    let state = h.build().connect().await;

    assert!(state.is_connected);
    assert_eq!(state.strategy, Some(Strategy::Extension));
    assert_eq!(h.env.open_count(), 0);
}

#[tokio::test]
async fn popup_is_the_fallback() {
    let h = Harness::new(FakeEnv::top_level());
    let state = h.build().connect().await;

    assert!(state.is_connected);
    assert_eq!(state.strategy, Some(Strategy::Popup));
    assert_eq!(h.env.open_count(), 1);
}

#[tokio::test]
async fn connected_state_carries_identity_and_permissions() {
    let h = Harness::new(FakeEnv::framed());
    let wallet = h.build();

    let state = wallet.connect().await;

    assert!(state.is_connected);
    assert!(!state.is_connecting);
    assert_eq!(state.identity, Some(identity()));
    assert!(state.has_permission(PermissionScope::BALANCE_READ));
    assert!(state.error.is_none());
    assert!(!state.should_offer_connect());
    assert_eq!(wallet.state(), state);
    assert_eq!(wallet.session_id().unwrap().as_str(), "session-1");
}

#[tokio::test]
async fn client_gets_dapp_metadata_and_fresh_transport() {
    let h = Harness::new(FakeEnv::framed());
    h.build().connect().await;

    let options = h.clients.last_options().unwrap();
    assert_eq!(options.dapp_name, "Connect Demo");
    assert_eq!(options.transport, h.transports.last().unwrap().id);
    assert!(!options.silent);
    assert!(options.resume_session_id.is_none());
}

#[tokio::test]
async fn rejected_handshake_lands_in_error() {
    let h = Harness::new(FakeEnv::with_extension());
    h.wallet().reject_with("User rejected");
    let wallet = h.build();

    let state = wallet.connect().await;

    assert!(!state.is_connected);
    assert!(!state.is_connecting);
    assert!(state.identity.is_none());
    assert_eq!(state.error.as_deref(), Some("User rejected"));
    assert_eq!(h.transports.live_count(), 0);
    assert!(state.should_offer_connect());
}

#[tokio::test]
async fn retry_after_failure_clears_error() {
    let h = Harness::new(FakeEnv::with_extension());
    h.wallet().reject_with("User rejected");
    let wallet = h.build();
    wallet.connect().await;

    *h.wallet().handshake.lock() = common::Handshake::Approve;
    let state = wallet.connect().await;

    assert!(state.is_connected);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn reconnect_leaves_one_live_transport() {
    let h = Harness::new(FakeEnv::framed());
    let wallet = h.build();

    wallet.connect().await;
    wallet.connect().await;
    wallet.connect().await;

    assert_eq!(h.transports.created_count(), 3);
    assert_eq!(h.transports.live_count(), 1);
    assert_eq!(h.clients.created_count(), 3);
    assert!(!h.transports.last().unwrap().is_destroyed());
}

#[tokio::test]
async fn failed_reconnect_destroys_previous_transport() {
    let h = Harness::new(FakeEnv::framed());
    let wallet = h.build();
    wallet.connect().await;

    h.wallet().reject_with("Wallet locked");
    let state = wallet.connect().await;

    assert!(!state.is_connected);
    assert_eq!(state.error.as_deref(), Some("Wallet locked"));
    assert_eq!(h.transports.live_count(), 0);
}

#[tokio::test]
async fn second_connect_while_connecting_is_ignored() {
    let h = Harness::new(FakeEnv::framed());
    let gate = h.wallet().hold_handshakes();
    let wallet = h.build();

    let first = tokio::spawn({
        let wallet = wallet.clone();
        async move { wallet.connect().await }
    });

    let mut states = wallet.watch();
    states.wait_for(|s| s.is_connecting).await.unwrap();
    tokio::task::yield_now().await;

    let snapshot = wallet.connect_via_popup().await;
    assert!(snapshot.is_connecting);
    assert_eq!(snapshot.strategy, Some(Strategy::Iframe));
    assert_eq!(h.env.open_count(), 0);

    gate.notify_one();
    let state = first.await.unwrap();

    assert!(state.is_connected);
    assert_eq!(h.transports.created_count(), 1);
    assert_eq!(h.clients.created_count(), 1);
}

#[tokio::test]
async fn watch_sees_connecting_then_connected() {
    let h = Harness::new(FakeEnv::framed());
    let gate = h.wallet().hold_handshakes();
    let wallet = h.build();
    let mut states = wallet.watch();

    let task = tokio::spawn({
        let wallet = wallet.clone();
        async move { wallet.connect().await }
    });

    let connecting = states.wait_for(|s| s.is_connecting).await.unwrap().clone();
    assert!(!connecting.is_connected);
    assert_eq!(connecting.strategy, Some(Strategy::Iframe));

    gate.notify_one();
    let connected = states.wait_for(|s| s.is_connected).await.unwrap().clone();
    assert!(!connected.is_connecting);

    task.await.unwrap();
}
