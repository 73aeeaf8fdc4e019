//! Connection pool for MySQL.

use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, Pool, PoolConstraints, PoolOpts};
use tracing::{debug, info};

use crate::config::MysqlConfig;
use crate::error::MysqlResult;

/// A connection pool for MySQL, sized from [`MysqlConfig`].
#[derive(Clone)]
pub struct MysqlPool {
    inner: Pool,
}

impl MysqlPool {
    /// Create a new connection pool. Connections are established lazily on
    /// first use.
    pub fn new(config: &MysqlConfig) -> Self {
        let constraints =
            PoolConstraints::new(1, config.max_connections).unwrap_or_default();
        let opts = config
            .to_opts_builder()
            .pool_opts(PoolOpts::new().with_constraints(constraints));

        let pool = Pool::new(Opts::from(opts));

        info!(
            host = %config.host,
            port = %config.port,
            database = %config.database,
            user = %config.username,
            "MySQL connection pool created"
        );

        Self { inner: pool }
    }

    /// Get a connection from the pool.
    pub async fn get(&self) -> MysqlResult<Conn> {
        debug!("acquiring connection from pool");
        Ok(self.inner.get_conn().await?)
    }

    /// Check pool health by running a trivial query.
    pub async fn is_healthy(&self) -> bool {
        match self.inner.get_conn().await {
            Ok(mut conn) => conn.query_drop("SELECT 1").await.is_ok(),
            Err(_) => false,
        }
    }

    /// Disconnect all connections and close the pool.
    pub async fn disconnect(self) -> MysqlResult<()> {
        self.inner.disconnect().await?;
        info!("MySQL connection pool closed");
        Ok(())
    }
}
