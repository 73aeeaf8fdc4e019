//! MySQL collaborator for Rollgate.
//!
//! Provides the pooled [`Database`] value the orchestrator is given, with
//! explicit credential modes: ordinary operation runs under the standard
//! application identity, migrations under an elevated one.
//!
//! # Example
//!
//! ```rust,ignore
//! use rollgate_mysql::{ConnectionMode, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut db = Database::connect(ConnectionMode::Standard).await?;
//!     db.set_migration_mode(true).await?;
//!
//!     // ... apply change-sets ...
//!
//!     db.close().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod pool;

pub use config::{ConnectionMode, MysqlConfig};
pub use database::Database;
pub use error::{MysqlError, MysqlResult};
pub use pool::MysqlPool;
