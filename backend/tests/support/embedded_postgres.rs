//! Embedded PostgreSQL databases for adapter integration tests.
//!
//! Each call hands out a fresh database on a cluster shared by the whole test
//! binary. When the cluster cannot start (no binaries, no network) the suite
//! prints a skip marker; set `REQUIRE_TEST_CLUSTER=1` to turn that into a
//! failure in CI.

use pg_embedded_setup_unpriv::TemporaryDatabase;
use pg_embedded_setup_unpriv::test_support::shared_cluster_handle;

fn cluster_required() -> bool {
    std::env::var("REQUIRE_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if cluster_required() {
        panic!("Test cluster setup failed: {reason}");
    }
    eprintln!("SKIP-TEST-CLUSTER: {reason}");
    None
}

/// A new, empty database, or `None` when the cluster is unavailable.
///
/// Must be called outside a Tokio runtime.
pub fn temporary_database() -> Option<TemporaryDatabase> {
    let cluster = match shared_cluster_handle() {
        Ok(cluster) => cluster,
        Err(err) => return handle_cluster_setup_failure(format!("{err:?}")),
    };
    match cluster.temporary_database(format!("test_{}", uuid::Uuid::new_v4())) {
        Ok(database) => Some(database),
        Err(err) => handle_cluster_setup_failure(format!("{err:?}")),
    }
}
