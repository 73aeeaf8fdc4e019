//! MySQL configuration and credential modes.
//!
//! The same database is reachable under two credential sets: the standard
//! application identity, and an elevated migration identity that may run
//! DDL. Which set backs the pool is selected by [`ConnectionMode`] and read
//! from the environment.

use mysql_async::OptsBuilder;

use crate::error::{MysqlError, MysqlResult};

/// Which credential set backs the active connection pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Ordinary application credentials.
    #[default]
    Standard,
    /// Elevated credentials used only while applying schema changes.
    Migration,
}

impl ConnectionMode {
    /// Environment variable names for this mode's user/password pair.
    pub fn credential_vars(&self) -> (&'static str, &'static str) {
        match self {
            ConnectionMode::Standard => ("DB_USER", "DB_PASS"),
            ConnectionMode::Migration => ("DB_MIGRATION_USER", "DB_MIGRATION_PASS"),
        }
    }
}

impl std::fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionMode::Standard => write!(f, "standard"),
            ConnectionMode::Migration => write!(f, "migration"),
        }
    }
}

/// MySQL database configuration.
#[derive(Debug, Clone)]
pub struct MysqlConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Username for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: String,
    /// Maximum number of pooled connections.
    pub max_connections: usize,
}

impl MysqlConfig {
    /// Build the configuration for `mode` from the process environment.
    ///
    /// All of `DB_HOST`, `DB_PORT`, `DB_NAME` and the mode's user/password
    /// pair must be set; a missing variable is a startup-time configuration
    /// error, not a recoverable one.
    pub fn from_env(mode: ConnectionMode) -> MysqlResult<Self> {
        Self::from_lookup(mode, |key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), with an injectable variable lookup.
    pub fn from_lookup<F>(mode: ConnectionMode, lookup: F) -> MysqlResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| MysqlError::missing_credentials(key))
        };

        let host = require("DB_HOST")?;
        let port = require("DB_PORT")?
            .parse::<u16>()
            .map_err(|_| MysqlError::config("DB_PORT is not a valid port number"))?;
        let database = require("DB_NAME")?;

        let (user_var, pass_var) = mode.credential_vars();
        let username = require(user_var)?;
        let password = require(pass_var)?;

        Ok(Self {
            host,
            port,
            database,
            username,
            password,
            max_connections: 10,
        })
    }

    /// Convert to mysql_async connection options.
    pub fn to_opts_builder(&self) -> OptsBuilder {
        OptsBuilder::default()
            .ip_or_hostname(&self.host)
            .tcp_port(self.port)
            .db_name(Some(&self.database))
            .user(Some(&self.username))
            .pass(Some(&self.password))
    }

    /// Set the maximum pool size.
    pub fn max_connections(mut self, n: usize) -> Self {
        self.max_connections = n;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base_env() -> HashMap<String, String> {
        env(&[
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "3307"),
            ("DB_NAME", "botdb"),
            ("DB_USER", "bot"),
            ("DB_PASS", "hunter2"),
        ])
    }

    #[test]
    fn test_standard_mode_from_lookup() {
        let vars = base_env();
        let config =
            MysqlConfig::from_lookup(ConnectionMode::Standard, |k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 3307);
        assert_eq!(config.database, "botdb");
        assert_eq!(config.username, "bot");
        assert_eq!(config.max_connections, 10);
    }

    #[test]
    fn test_migration_mode_uses_elevated_pair() {
        let mut vars = base_env();
        vars.insert("DB_MIGRATION_USER".into(), "migrator".into());
        vars.insert("DB_MIGRATION_PASS".into(), "sekrit".into());

        let config =
            MysqlConfig::from_lookup(ConnectionMode::Migration, |k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.username, "migrator");
        assert_eq!(config.password, "sekrit");
    }

    #[test]
    fn test_migration_mode_without_elevated_credentials() {
        // Standard credentials alone must not satisfy migration mode.
        let vars = base_env();
        let err = MysqlConfig::from_lookup(ConnectionMode::Migration, |k| vars.get(k).cloned())
            .unwrap_err();
        assert!(matches!(
            &err,
            MysqlError::MissingCredentials(var) if var == "DB_MIGRATION_USER"
        ));
    }

    #[test]
    fn test_missing_host() {
        let mut vars = base_env();
        vars.remove("DB_HOST");
        let err =
            MysqlConfig::from_lookup(ConnectionMode::Standard, |k| vars.get(k).cloned())
                .unwrap_err();
        assert!(err.to_string().contains("DB_HOST"));
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = base_env();
        vars.insert("DB_PORT".into(), "not-a-port".into());
        let err =
            MysqlConfig::from_lookup(ConnectionMode::Standard, |k| vars.get(k).cloned())
                .unwrap_err();
        assert!(matches!(err, MysqlError::Config(_)));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut vars = base_env();
        vars.insert("DB_PASS".into(), "".into());
        let err =
            MysqlConfig::from_lookup(ConnectionMode::Standard, |k| vars.get(k).cloned())
                .unwrap_err();
        assert!(matches!(err, MysqlError::MissingCredentials(_)));
    }

    #[test]
    fn test_credential_vars_per_mode() {
        assert_eq!(
            ConnectionMode::Standard.credential_vars(),
            ("DB_USER", "DB_PASS")
        );
        assert_eq!(
            ConnectionMode::Migration.credential_vars(),
            ("DB_MIGRATION_USER", "DB_MIGRATION_PASS")
        );
    }
}
