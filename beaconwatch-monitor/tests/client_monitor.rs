mod common;

use beaconwatch_monitor::ClientMetricMonitor;
use common::{node, Outcome, ScriptedQuery};

#[tokio::test]
async fn test_all_healthy_first_round_stops_retrying() {
    let query = ScriptedQuery::new(vec![
        ("a", vec![Outcome::Value(7)]),
        ("b", vec![Outcome::Value(7)]),
    ]);
    let nodes = vec![node("a"), node("b")];

    let monitor = ClientMetricMonitor::new(query, 3);
    let snapshot = monitor.collect(&nodes).await;

    assert_eq!(snapshot.results.len(), 2);
    assert!(snapshot.all_healthy());
    assert_eq!(monitor.query().calls_for("a"), 1);
    assert_eq!(monitor.query().calls_for("b"), 1);
}

#[tokio::test]
async fn test_recovering_node_ends_in_results() {
    let query = ScriptedQuery::new(vec![
        ("a", vec![Outcome::Value(7)]),
        (
            "b",
            vec![Outcome::ConnectionError, Outcome::Value(7)],
        ),
    ]);
    let nodes = vec![node("a"), node("b")];

    let monitor = ClientMetricMonitor::new(query, 3);
    let snapshot = monitor.collect(&nodes).await;

    assert_eq!(snapshot.value_for("b"), Some(&7));
    assert!(snapshot.connection_error_nodes.is_empty());
    assert!(snapshot.all_healthy());
    // round 1 failed, round 2 succeeded, no third round
    assert_eq!(monitor.query().calls_for("a"), 2);
}

#[tokio::test]
async fn test_persistent_failure_lands_in_exactly_one_bucket() {
    let query = ScriptedQuery::new(vec![
        ("a", vec![Outcome::Value(7)]),
        ("b", vec![Outcome::Timeout]),
    ]);
    let nodes = vec![node("a"), node("b")];

    let monitor = ClientMetricMonitor::new(query, 3);
    let snapshot = monitor.collect(&nodes).await;

    assert_eq!(snapshot.value_for("b"), None);
    assert_eq!(snapshot.timeout_nodes, vec!["b".to_string()]);
    assert!(snapshot.connection_error_nodes.is_empty());
    assert!(snapshot.unknown_error_nodes.is_empty());
    assert!(snapshot.invalid_response_nodes.is_empty());
    // the whole round is retried, healthy nodes included
    assert_eq!(monitor.query().calls_for("a"), 3);
    assert_eq!(monitor.query().calls_for("b"), 3);
}

#[tokio::test]
async fn test_invalid_response_classified_separately() {
    let query = ScriptedQuery::new(vec![
        ("a", vec![Outcome::Invalid]),
        ("b", vec![Outcome::UnknownError]),
    ]);
    let nodes = vec![node("a"), node("b")];

    let monitor = ClientMetricMonitor::new(query, 2);
    let snapshot = monitor.collect(&nodes).await;

    assert_eq!(snapshot.invalid_response_nodes, vec!["a".to_string()]);
    assert_eq!(snapshot.unknown_error_nodes, vec!["b".to_string()]);
    assert!(snapshot.results.is_empty());
}

#[tokio::test]
async fn test_snapshot_overwritten_not_merged_across_rounds() {
    // b fails differently per round; only the last round's bucket survives
    let query = ScriptedQuery::new(vec![
        ("a", vec![Outcome::Value(7)]),
        (
            "b",
            vec![Outcome::ConnectionError, Outcome::Timeout, Outcome::Timeout],
        ),
    ]);
    let nodes = vec![node("a"), node("b")];

    let monitor = ClientMetricMonitor::new(query, 3);
    let snapshot = monitor.collect(&nodes).await;

    assert!(snapshot.connection_error_nodes.is_empty());
    assert_eq!(snapshot.timeout_nodes, vec!["b".to_string()]);
    assert_eq!(snapshot.results.len(), 1);
}
