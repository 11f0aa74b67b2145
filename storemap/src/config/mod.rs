//! Configuration de la connexion PostgreSQL
//!
//! Trois couches, de la plus faible à la plus forte : fichier JSON
//! (`--db-config`), variables `PG*` (éventuellement issues du `.env`),
//! options de la ligne de commande. Sans nom de base ni utilisateur, la
//! configuration est refusée.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::pool::{DatabaseConfig, SslMode};

/// Erreurs de configuration (toujours fatales)
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Paramètre obligatoire absent de toutes les couches
    #[error("Missing database setting '{0}' (use --db-config, {1} or --{0})")]
    Missing(&'static str, &'static str),

    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("{0}")]
    InvalidSslMode(String),
}

/// Paramètres partiels, fusionnés couche par couche
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DatabaseSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Accepte aussi la clé `database` (format psycopg2)
    #[serde(alias = "database")]
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub pool_size: Option<usize>,
    #[serde(alias = "sslmode")]
    pub ssl_mode: Option<String>,
}

impl DatabaseSettings {
    /// Charge un fichier de configuration JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Lit les variables d'environnement `PG*`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Lit les paramètres depuis une fonction de recherche (testable)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PGPORT") {
            Some(p) => Some(p.parse().map_err(|_| ConfigError::InvalidPort(p))?),
            None => None,
        };

        Ok(Self {
            host: lookup("PGHOST"),
            port,
            dbname: lookup("PGDATABASE"),
            user: lookup("PGUSER"),
            password: lookup("PGPASSWORD"),
            pool_size: lookup("POOL_SIZE").and_then(|s| s.parse().ok()),
            ssl_mode: lookup("PGSSLMODE"),
        })
    }

    /// Superpose `other` : ses valeurs définies remplacent les nôtres
    pub fn merge(self, other: Self) -> Self {
        Self {
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            dbname: other.dbname.or(self.dbname),
            user: other.user.or(self.user),
            password: other.password.or(self.password),
            pool_size: other.pool_size.or(self.pool_size),
            ssl_mode: other.ssl_mode.or(self.ssl_mode),
        }
    }

    /// Valide et produit la configuration finale
    pub fn into_config(self) -> Result<DatabaseConfig, ConfigError> {
        let defaults = DatabaseConfig::default();

        let ssl_mode = match self.ssl_mode {
            Some(s) => s.parse::<SslMode>().map_err(ConfigError::InvalidSslMode)?,
            None => defaults.ssl_mode,
        };

        Ok(DatabaseConfig {
            host: self.host.unwrap_or(defaults.host),
            port: self.port.unwrap_or(defaults.port),
            dbname: self
                .dbname
                .ok_or(ConfigError::Missing("database", "PGDATABASE"))?,
            user: self.user.ok_or(ConfigError::Missing("user", "PGUSER"))?,
            password: self.password,
            pool_size: self.pool_size.unwrap_or(defaults.pool_size),
            ssl_mode,
        })
    }
}

/// Résout la configuration complète : fichier, environnement, puis surcharges CLI
pub fn resolve(config_file: Option<&Path>, overrides: DatabaseSettings) -> Result<DatabaseConfig> {
    let base = match config_file {
        Some(path) => DatabaseSettings::load(path)?,
        None => DatabaseSettings::default(),
    };

    let settings = base.merge(DatabaseSettings::from_env()?).merge(overrides);
    Ok(settings.into_config()?)
}
