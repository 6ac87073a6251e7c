//! # Configuration Resolver
//!
//! Gathers the connection parameters once at startup and freezes them into a
//! [`ConnectionConfig`]. Nothing downstream reads the environment again.
//!
//! ## Sources
//!
//! | Variable | Purpose |
//! |---|---|
//! | `MONGOHOST` | database host, optionally `host:port` |
//! | `MONGOUSER` | auth username |
//! | `MONGOPASSWORD` | auth password, falls back to [`DEFAULT_PASSWORD_FILE`] |
//! | `MONGOPOOL_LIMIT` | pool size override (default [`DEFAULT_POOL_LIMIT`]) |
//!
//! ## Backend Variants
//!
//! The host decides the [`Backend`]: anything under `docdb.amazonaws.com` is
//! Amazon DocumentDB, which requires TLS and an explicit port. Everything else is
//! treated as a plain MongoDB deployment.
//!
//! Resolution goes through an injectable lookup so tests can feed a `HashMap`
//! instead of mutating the process environment:
//!
//! ```rust
//! use order_intake::config::{Backend, ConnectionConfig};
//! use std::collections::HashMap;
//!
//! let env: HashMap<&str, &str> = [
//!     ("MONGOHOST", "orders.cluster-abc.docdb.amazonaws.com"),
//!     ("MONGOUSER", "svc"),
//!     ("MONGOPASSWORD", "hunter2"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let config = ConnectionConfig::from_lookup(
//!     |name| env.get(name).map(|v| v.to_string()),
//!     "/nonexistent",
//! )
//! .unwrap();
//! assert_eq!(config.backend, Backend::DocumentDb);
//! assert!(config.tls());
//! assert_eq!(config.port, Some(27017));
//! ```

pub mod error;

pub use error::*;

use crate::store::Namespace;
use mongodb::options::ServerAddress;
use std::fmt;
use std::net::Ipv6Addr;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const HOST_VAR: &str = "MONGOHOST";
pub const USERNAME_VAR: &str = "MONGOUSER";
pub const PASSWORD_VAR: &str = "MONGOPASSWORD";
pub const POOL_LIMIT_VAR: &str = "MONGOPOOL_LIMIT";

/// Secret mount read when `MONGOPASSWORD` is absent.
pub const DEFAULT_PASSWORD_FILE: &str = "/kvmnt/mongo-password";

pub const DEFAULT_POOL_LIMIT: u32 = 25;
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(10);

pub const DATABASE_NAME: &str = "hellomongo";
pub const COLLECTION_NAME: &str = "orders";
pub const SHARD_KEY: &str = "_id";
pub const APP_NAME: &str = "order-intake";

const DOCUMENTDB_DOMAIN: &str = "docdb.amazonaws.com";
const DOCUMENTDB_PORT: u16 = 27017;

/// The kind of managed document database behind `MONGOHOST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Self-hosted or Cosmos-style MongoDB endpoint, dialed in plaintext.
    MongoDb,
    /// Amazon DocumentDB: TLS with default trust roots on port 27017.
    DocumentDb,
}

impl Backend {
    pub fn detect(host: &str) -> Self {
        if host.contains(DOCUMENTDB_DOMAIN) {
            Backend::DocumentDb
        } else {
            Backend::MongoDb
        }
    }

    pub fn requires_tls(self) -> bool {
        matches!(self, Backend::DocumentDb)
    }

    /// Port used when the host does not carry one. `None` leaves it to the driver.
    pub fn default_port(self) -> Option<u16> {
        match self {
            Backend::MongoDb => None,
            Backend::DocumentDb => Some(DOCUMENTDB_PORT),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::MongoDb => write!(f, "MongoDB"),
            Backend::DocumentDb => write!(f, "DocumentDB"),
        }
    }
}

/// Credential material. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Process-wide connection parameters, resolved once and immutable afterwards.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: Option<u16>,
    pub username: String,
    pub password: Password,
    pub backend: Backend,
    pub pool_limit: u32,
    pub dial_timeout: Duration,
    pub database: String,
    pub collection: String,
    pub shard_key: String,
    pub app_name: String,
}

impl ConnectionConfig {
    /// Builds a configuration for `host`, detecting the backend and its port.
    ///
    /// `host` is a single server address: `name`, `name:port`, an IPv6
    /// literal or `[ipv6]:port`. An explicit port wins over the backend default.
    pub fn new(
        host: &str,
        username: impl Into<String>,
        password: Password,
    ) -> Result<Self, ConfigError> {
        let backend = Backend::detect(host);
        let (host, port) = parse_host(host)?;
        let port = port.or(backend.default_port());

        Ok(Self {
            host,
            port,
            username: username.into(),
            password,
            backend,
            pool_limit: DEFAULT_POOL_LIMIT,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            database: DATABASE_NAME.to_string(),
            collection: COLLECTION_NAME.to_string(),
            shard_key: SHARD_KEY.to_string(),
            app_name: APP_NAME.to_string(),
        })
    }

    /// Resolves the configuration from the process environment and the default
    /// secret mount.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok(), DEFAULT_PASSWORD_FILE)
    }

    /// Resolves the configuration from an arbitrary variable lookup.
    ///
    /// Missing credentials fail fast instead of dialing with empty values.
    pub fn from_lookup<F>(lookup: F, password_file: impl AsRef<Path>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| lookup(name).filter(|value| !value.is_empty());

        let password = read(PASSWORD_VAR).or_else(|| read_password_file(password_file.as_ref()));

        let host = require(HOST_VAR, read(HOST_VAR))?;
        let username = require(USERNAME_VAR, read(USERNAME_VAR))?;
        let password = require(PASSWORD_VAR, password)?;

        let mut config = Self::new(&host, username, Password::new(password))?;

        match read(POOL_LIMIT_VAR).map(|raw| raw.trim().parse::<u32>()) {
            Some(Ok(limit)) if limit > 0 => config.pool_limit = limit,
            Some(_) => debug!(variable = POOL_LIMIT_VAR, "Ignoring invalid pool limit"),
            None => {}
        }
        info!(
            pool_limit = config.pool_limit,
            "MongoDB pool limit set. Override with the {} environment variable", POOL_LIMIT_VAR
        );

        Ok(config)
    }

    pub fn with_pool_limit(mut self, pool_limit: u32) -> Self {
        self.pool_limit = pool_limit;
        self
    }

    pub fn with_dial_timeout(mut self, dial_timeout: Duration) -> Self {
        self.dial_timeout = dial_timeout;
        self
    }

    pub fn tls(&self) -> bool {
        self.backend.requires_tls()
    }

    /// `host[:port]` as dialed, for logs and error messages.
    pub fn address(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        match self.port {
            Some(port) => format!("{}:{}", host, port),
            None => host,
        }
    }

    pub fn namespace(&self) -> Namespace {
        Namespace::new(&self.database, &self.collection)
    }
}

/// Splits `MONGOHOST` into host and port using the driver's address rules.
/// A bare IPv6 literal carries no port.
fn parse_host(value: &str) -> Result<(String, Option<u16>), ConfigError> {
    if let Ok(ip) = value.parse::<Ipv6Addr>() {
        return Ok((ip.to_string(), None));
    }

    let invalid = |reason: String| ConfigError::InvalidHost {
        variable: HOST_VAR,
        host: value.to_string(),
        reason,
    };
    match ServerAddress::parse(value) {
        Ok(ServerAddress::Tcp { host, port }) => Ok((host, port)),
        Ok(_) => Err(invalid("not a TCP address".to_string())),
        Err(e) => Err(invalid(e.to_string())),
    }
}

fn require(variable: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(value) => {
            info!(variable, "Environment variable is set");
            Ok(value)
        }
        None => {
            warn!(variable, "Environment variable has not been set");
            Err(ConfigError::Missing { variable })
        }
    }
}

/// Reads the mounted password secret. Trailing newlines from the mount are dropped.
fn read_password_file(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(secret) => {
            let secret = secret.trim_end_matches(&['\r', '\n'][..]).to_string();
            debug!(path = %path.display(), "Read password from secret file");
            Some(secret).filter(|s| !s.is_empty())
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Password secret file not readable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let env: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |name: &str| env.get(name).map(|v| v.to_string())
    }

    const NO_FILE: &str = "/nonexistent/mongo-password";

    #[test]
    fn test_plain_mongodb_host() {
        let config = ConnectionConfig::from_lookup(
            lookup(&[("MONGOHOST", "mongo.internal"), ("MONGOUSER", "svc"), ("MONGOPASSWORD", "pw")]),
            NO_FILE,
        )
        .unwrap();

        assert_eq!(config.backend, Backend::MongoDb);
        assert!(!config.tls());
        assert_eq!(config.port, None);
        assert_eq!(config.address(), "mongo.internal");
        assert_eq!(config.pool_limit, DEFAULT_POOL_LIMIT);
        assert_eq!(config.dial_timeout, Duration::from_secs(10));
        assert_eq!(config.namespace().to_string(), "hellomongo.orders");
        assert_eq!(config.shard_key, "_id");
    }

    #[test]
    fn test_documentdb_host_requires_tls_and_port() {
        let config = ConnectionConfig::from_lookup(
            lookup(&[
                ("MONGOHOST", "orders.cluster-xyz.us-east-1.docdb.amazonaws.com"),
                ("MONGOUSER", "svc"),
                ("MONGOPASSWORD", "pw"),
            ]),
            NO_FILE,
        )
        .unwrap();

        assert_eq!(config.backend, Backend::DocumentDb);
        assert!(config.tls());
        assert_eq!(config.port, Some(27017));
        assert_eq!(
            config.address(),
            "orders.cluster-xyz.us-east-1.docdb.amazonaws.com:27017"
        );
    }

    #[test]
    fn test_explicit_port_is_kept() {
        let config = ConnectionConfig::new("localhost:27018", "svc", Password::new("pw")).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, Some(27018));

        let err = ConnectionConfig::new("localhost:abc", "svc", Password::new("pw")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidHost { variable: "MONGOHOST", ref host, .. } if host == "localhost:abc"
        ));
    }

    #[test]
    fn test_ipv6_hosts() {
        let config = ConnectionConfig::new("[::1]:27017", "svc", Password::new("pw")).unwrap();
        assert_eq!(config.host, "::1");
        assert_eq!(config.port, Some(27017));
        assert_eq!(config.address(), "[::1]:27017");

        let config = ConnectionConfig::new("::1", "svc", Password::new("pw")).unwrap();
        assert_eq!(config.host, "::1");
        assert_eq!(config.port, None);
        assert_eq!(config.address(), "[::1]");
    }

    #[test]
    fn test_host_list_is_rejected() {
        let err = ConnectionConfig::new("h1:27017,h2:27017", "svc", Password::new("pw")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHost { variable: "MONGOHOST", .. }));
    }

    #[test]
    fn test_pool_limit_override() {
        let base = [("MONGOHOST", "h"), ("MONGOUSER", "u"), ("MONGOPASSWORD", "p")];

        let with = |limit: &'static str| {
            let mut pairs = base.to_vec();
            pairs.push(("MONGOPOOL_LIMIT", limit));
            ConnectionConfig::from_lookup(lookup(&pairs), NO_FILE).unwrap().pool_limit
        };

        assert_eq!(with("50"), 50);
        assert_eq!(with(" 7 "), 7);
        assert_eq!(with("0"), DEFAULT_POOL_LIMIT);
        assert_eq!(with("-3"), DEFAULT_POOL_LIMIT);
        assert_eq!(with("lots"), DEFAULT_POOL_LIMIT);
    }

    #[test]
    fn test_password_falls_back_to_secret_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "from-the-mount").unwrap();

        let config = ConnectionConfig::from_lookup(
            lookup(&[("MONGOHOST", "h"), ("MONGOUSER", "u")]),
            file.path(),
        )
        .unwrap();
        assert_eq!(config.password.expose(), "from-the-mount");

        // The variable wins over the file.
        let config = ConnectionConfig::from_lookup(
            lookup(&[("MONGOHOST", "h"), ("MONGOUSER", "u"), ("MONGOPASSWORD", "env")]),
            file.path(),
        )
        .unwrap();
        assert_eq!(config.password.expose(), "env");
    }

    #[test]
    fn test_missing_values_fail_fast() {
        let err = ConnectionConfig::from_lookup(
            lookup(&[("MONGOUSER", "u"), ("MONGOPASSWORD", "p")]),
            NO_FILE,
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing { variable: "MONGOHOST" });

        let err = ConnectionConfig::from_lookup(
            lookup(&[("MONGOHOST", "h"), ("MONGOUSER", ""), ("MONGOPASSWORD", "p")]),
            NO_FILE,
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing { variable: "MONGOUSER" });

        let err = ConnectionConfig::from_lookup(lookup(&[("MONGOHOST", "h"), ("MONGOUSER", "u")]), NO_FILE)
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing { variable: "MONGOPASSWORD" });
    }

    #[test]
    fn test_debug_output_redacts_password() {
        let config = ConnectionConfig::new("h", "u", Password::new("s3cr3t-value")).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("s3cr3t-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
