//! Integration tests for wide-column activation.
//!
//! These use an unroutable contact point so no cluster is required.

#![cfg(feature = "cassandra")]

use std::time::Duration;

use givemedata::prelude::*;
use givemedata::ConfigSource;

fn events_tree() -> ProviderNode {
    let source = ConfigSource::from_yaml_str("events: cassandra://u:p@127.0.0.1:1/ks").unwrap();
    build_provider_from_config(&source).unwrap()
}

fn quick() -> ClusterOptions {
    ClusterOptions::default().connect_timeout(Duration::from_millis(200))
}

/// A failed activation leaves the leaf inactive and can be retried
#[tokio::test]
async fn test_failed_activation_is_retryable() {
    let root = events_tree();
    let events = root.get("events").and_then(ProviderNode::as_wide_column).unwrap();

    let first = events.activate_cluster(&quick()).await;
    assert!(matches!(first, Err(GivemedataError::Driver { family: "cassandra", .. })));
    assert!(!events.is_active());

    let second = events.activate_cluster(&quick()).await;
    assert!(second.is_err());
    assert!(!events.engine().is_active());
}

/// Concurrent activations on one leaf all observe the same outcome
#[tokio::test]
async fn test_concurrent_activation_shares_outcome() {
    let root = events_tree();
    let events = root.get("events").and_then(ProviderNode::as_wide_column).unwrap();
    let options = quick();

    let (a, b) = tokio::join!(
        events.activate_cluster(&options),
        events.activate_cluster(&options)
    );
    assert!(a.is_err());
    assert!(b.is_err());
    assert!(!events.is_active());
}

/// Queries activate on demand and report driver failures unchanged
#[tokio::test]
async fn test_query_activates_on_demand() {
    let root = events_tree();
    let events = root.get("events").and_then(ProviderNode::as_wide_column).unwrap();

    let err = events.run_cql("SELECT * FROM clicks", &quick()).await.unwrap_err();
    assert!(err.driver_error::<givemedata::cassandra::CassandraError>().is_some());
}
