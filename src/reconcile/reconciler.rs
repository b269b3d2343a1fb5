//! Applying one failover event to the routing table and the proxy.

use std::path::{Path, PathBuf};

use crate::error::AgentError;
use crate::monitor::FailoverEvent;
use crate::observability::metrics;
use crate::proxy::ProxyReloader;
use crate::routing::{RoutingError, RoutingTable};

/// What a reconcile did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The member already had the address; nothing written, no reload.
    Unchanged,
    /// The routing file was rewritten and the proxy reloaded.
    Applied,
}

/// Owns the routing table of one pool and the means to reload the proxy.
pub struct Reconciler<R> {
    pool: String,
    path: PathBuf,
    table: RoutingTable,
    reloader: R,
}

impl<R: ProxyReloader> Reconciler<R> {
    /// Fails with `UnknownPool` when `table` has no pool named `pool`.
    pub fn new(
        pool: impl Into<String>,
        path: impl Into<PathBuf>,
        table: RoutingTable,
        reloader: R,
    ) -> Result<Self, RoutingError> {
        let pool = pool.into();
        if table.pool(&pool).is_none() {
            return Err(RoutingError::UnknownPool(pool));
        }
        Ok(Self {
            pool,
            path: path.into(),
            table,
            reloader,
        })
    }

    /// Load the routing file at `path` and manage `pool` in it.
    pub fn load(pool: impl Into<String>, path: &Path, reloader: R) -> Result<Self, RoutingError> {
        let table = RoutingTable::load(path)?;
        Self::new(pool, path, table, reloader)
    }

    pub fn pool(&self) -> &str {
        &self.pool
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn reloader(&self) -> &R {
        &self.reloader
    }

    /// Names of the pool's members, in file order.
    pub fn member_names(&self) -> Vec<String> {
        self.table
            .pool(&self.pool)
            .map(|p| p.member_names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Make the routing table and the proxy agree with `event`.
    ///
    /// A changed member is persisted before the reload runs. If the reload
    /// fails the error is returned, but the file keeps the new address.
    pub async fn apply(&mut self, event: &FailoverEvent) -> Result<Reconciliation, AgentError> {
        let changed = self.table.update_member(
            &self.pool,
            &event.name,
            &event.new.host,
            event.new.port,
        )?;
        if !changed {
            metrics::record_reconcile(&self.pool, "unchanged");
            return Ok(Reconciliation::Unchanged);
        }

        self.table.save(&self.path)?;
        tracing::info!(
            pool = %self.pool,
            member = %event.name,
            address = %event.new,
            path = %self.path.display(),
            "Routing file updated"
        );

        let reloaded = self.reloader.reload().await;
        metrics::record_reload(reloaded.is_ok());
        match reloaded {
            Ok(()) => {
                metrics::record_reconcile(&self.pool, "applied");
                Ok(Reconciliation::Applied)
            }
            Err(e) => {
                metrics::record_reconcile(&self.pool, "reload_failed");
                Err(e.into())
            }
        }
    }
}

impl<R> std::fmt::Debug for Reconciler<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("pool", &self.pool)
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{Endpoint, PrimaryInfo};
    use crate::proxy::{CommandReloader, ReloadError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TABLE: &str = "# managed by hand\nalpha:\n  listen: 127.0.0.1:22121\n  redis: true\n  servers:\n  - 10.0.0.1:6379:1 mymaster\n  - 10.0.0.3:6379:1 othermaster\n";

    #[derive(Default)]
    struct CountingReloader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProxyReloader for CountingReloader {
        async fn reload(&self) -> Result<(), ReloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn write_table(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("nutcracker.yml");
        std::fs::write(&path, TABLE).unwrap();
        path
    }

    fn switch(payload: &str) -> FailoverEvent {
        FailoverEvent::from_payload(payload).unwrap()
    }

    #[tokio::test]
    async fn test_notification_updates_member_and_reloads_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(&dir);
        let mut reconciler = Reconciler::load("alpha", &path, CountingReloader::default()).unwrap();

        let outcome = reconciler
            .apply(&switch("mymaster 10.0.0.1 6379 10.0.0.2 6380"))
            .await
            .unwrap();
        assert_eq!(outcome, Reconciliation::Applied);
        assert_eq!(reconciler.reloader().calls.load(Ordering::SeqCst), 1);

        let saved = RoutingTable::load(&path).unwrap();
        let alpha = saved.pool("alpha").unwrap();
        assert_eq!(alpha.servers[0].to_string(), "10.0.0.2:6380:1 mymaster");
        assert_eq!(alpha.servers[1].to_string(), "10.0.0.3:6379:1 othermaster");
    }

    #[tokio::test]
    async fn test_replayed_notification_does_not_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(&dir);
        let mut reconciler = Reconciler::load("alpha", &path, CountingReloader::default()).unwrap();

        let event = switch("mymaster 10.0.0.1 6379 10.0.0.2 6380");
        reconciler.apply(&event).await.unwrap();
        let outcome = reconciler.apply(&event).await.unwrap();

        assert_eq!(outcome, Reconciliation::Unchanged);
        assert_eq!(reconciler.reloader().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_current_primary_matching_table_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(&dir);
        let mut reconciler = Reconciler::load("alpha", &path, CountingReloader::default()).unwrap();

        let event = FailoverEvent::current(PrimaryInfo {
            name: "mymaster".into(),
            address: "10.0.0.1".into(),
            port: 6379,
        });
        assert_eq!(event.new, Endpoint::new("10.0.0.1", 6379));

        let outcome = reconciler.apply(&event).await.unwrap();
        assert_eq!(outcome, Reconciliation::Unchanged);
        assert_eq!(reconciler.reloader().calls.load(Ordering::SeqCst), 0);
        // The hand-written comment would be gone after any save.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), TABLE);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_new_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(&dir);
        let reloader = CommandReloader::new("false", "", None);
        let mut reconciler = Reconciler::load("alpha", &path, reloader).unwrap();

        let err = reconciler
            .apply(&switch("mymaster 10.0.0.1 6379 10.0.0.2 6380"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Reload(ReloadError::Failed { .. })));
        assert!(!err.is_fatal());

        let saved = RoutingTable::load(&path).unwrap();
        assert_eq!(saved.pool("alpha").unwrap().servers[0].endpoint(), "10.0.0.2:6380");
        assert_eq!(reconciler.table(), &saved);
    }

    #[tokio::test]
    async fn test_unknown_member_is_fatal_and_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(&dir);
        let mut reconciler = Reconciler::load("alpha", &path, CountingReloader::default()).unwrap();

        let err = reconciler
            .apply(&switch("ghost 10.0.0.1 6379 10.0.0.2 6380"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Routing(RoutingError::UnknownMember { .. })));
        assert!(err.is_fatal());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), TABLE);
    }

    #[test]
    fn test_unknown_pool_is_rejected() {
        let table = RoutingTable::from_yaml(TABLE).unwrap();
        let err = Reconciler::new("beta", "unused.yml", table, CountingReloader::default()).unwrap_err();
        assert!(matches!(err, RoutingError::UnknownPool(_)));
    }

    #[test]
    fn test_member_names_in_file_order() {
        let table = RoutingTable::from_yaml(TABLE).unwrap();
        let reconciler = Reconciler::new("alpha", "unused.yml", table, CountingReloader::default()).unwrap();
        assert_eq!(reconciler.member_names(), vec!["mymaster", "othermaster"]);
    }
}
