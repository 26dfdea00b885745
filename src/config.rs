use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PgWrapError;
use crate::transaction::AutoTxPolicy;

/// How the transport holds on to its physical connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum Persistence {
    /// A private connection, closed with the facade.
    #[default]
    #[value(name = "plain")]
    Plain,
    /// Reuse a live connection to the same server/user/database, shared process-wide.
    #[value(name = "persistent")]
    Persistent,
    /// Open a fresh connection and make it the shared one.
    #[value(name = "persistent-force-new")]
    PersistentForceNew,
}

impl Persistence {
    /// Numeric code used in configuration files: 0, 1 or 2.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Persistence::Plain => 0,
            Persistence::Persistent => 1,
            Persistence::PersistentForceNew => 2,
        }
    }

    /// # Errors
    /// Returns `PgWrapError::ConfigError` for codes other than 0, 1 and 2.
    pub fn from_code(code: u64) -> Result<Self, PgWrapError> {
        match code {
            0 => Ok(Persistence::Plain),
            1 => Ok(Persistence::Persistent),
            2 => Ok(Persistence::PersistentForceNew),
            other => Err(PgWrapError::ConfigError(format!(
                "unknown persistence mode {other} (expected 0, 1 or 2)"
            ))),
        }
    }
}

impl fmt::Display for Persistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Persistence::Plain => "plain",
            Persistence::Persistent => "persistent",
            Persistence::PersistentForceNew => "persistent-force-new",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Persistence {
    type Err = PgWrapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u64>() {
            return Persistence::from_code(code);
        }
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "plain" => Ok(Persistence::Plain),
            "persistent" => Ok(Persistence::Persistent),
            "persistent-force-new" => Ok(Persistence::PersistentForceNew),
            _ => Err(PgWrapError::ConfigError(format!(
                "unknown persistence mode {s:?}"
            ))),
        }
    }
}

impl Serialize for Persistence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CodeOrName {
    Code(u64),
    Name(String),
}

impl<'de> Deserialize<'de> for Persistence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parsed = match CodeOrName::deserialize(deserializer)? {
            CodeOrName::Code(code) => Persistence::from_code(code),
            CodeOrName::Name(name) => name.parse(),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

fn port_from_number_or_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    match CodeOrName::deserialize(deserializer)? {
        CodeOrName::Code(code) => u16::try_from(code).map_err(serde::de::Error::custom),
        CodeOrName::Name(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

/// Where and as whom to connect.
///
/// Deserializes from both the short key names (`user`, `password`, `dbname`) and the long ones
/// (`user_name`, `user_password`, `db_name`). `port` may be a number or a numeric string.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(
        default = "default_port",
        deserialize_with = "port_from_number_or_text"
    )]
    pub port: u16,
    #[serde(alias = "user_name", default)]
    pub user: String,
    #[serde(alias = "user_password", default)]
    pub password: String,
    #[serde(alias = "db_name", default)]
    pub dbname: String,
    #[serde(default)]
    pub persistence: Persistence,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .field("persistence", &self.persistence)
            .finish()
    }
}

impl ConnectionParams {
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        dbname: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            dbname: dbname.into(),
            persistence: Persistence::Plain,
        }
    }

    #[must_use]
    pub fn with_persistence(mut self, persistence: Persistence) -> Self {
        self.persistence = persistence;
        self
    }

    /// # Errors
    /// Returns `PgWrapError::ConfigError` if the document is not valid JSON of the expected
    /// shape or fails [`ConnectionParams::validate`].
    pub fn from_json_str(json: &str) -> Result<Self, PgWrapError> {
        let params: ConnectionParams = serde_json::from_str(json)
            .map_err(|e| PgWrapError::ConfigError(format!("invalid connection JSON: {e}")))?;
        params.validate()?;
        Ok(params)
    }

    /// # Errors
    /// Returns `PgWrapError::ConfigError` if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PgWrapError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            PgWrapError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// Read `{prefix}_HOST`, `{prefix}_PORT`, `{prefix}_USER_NAME`, `{prefix}_PASSWORD`,
    /// `{prefix}_DB_NAME` and `{prefix}_PERSISTENCE`.
    ///
    /// Host defaults to `localhost`, port to 5432 and persistence to plain.
    ///
    /// # Errors
    /// Returns `PgWrapError::ConfigError` for unparsable values or when a required variable is
    /// missing.
    pub fn from_env(prefix: &str) -> Result<Self, PgWrapError> {
        let var = |name: &str| std::env::var(format!("{prefix}_{name}")).ok();

        let port = match var("PORT") {
            Some(port) => port.trim().parse().map_err(|e| {
                PgWrapError::ConfigError(format!("{prefix}_PORT is not a valid port: {e}"))
            })?,
            None => default_port(),
        };
        let persistence = match var("PERSISTENCE") {
            Some(value) => value.parse()?,
            None => Persistence::default(),
        };
        let params = ConnectionParams {
            host: var("HOST").unwrap_or_else(default_host),
            port,
            user: var("USER_NAME").unwrap_or_default(),
            password: var("PASSWORD").unwrap_or_default(),
            dbname: var("DB_NAME").unwrap_or_default(),
            persistence,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check that every field needed to connect is present.
    ///
    /// An empty password is accepted for servers using trust or peer authentication.
    ///
    /// # Errors
    /// Returns `PgWrapError::ConfigError` naming the first missing field.
    pub fn validate(&self) -> Result<(), PgWrapError> {
        if self.host.trim().is_empty() {
            return Err(PgWrapError::ConfigError("host is required".to_string()));
        }
        if self.port == 0 {
            return Err(PgWrapError::ConfigError("port is required".to_string()));
        }
        if self.user.trim().is_empty() {
            return Err(PgWrapError::ConfigError("user is required".to_string()));
        }
        if self.dbname.trim().is_empty() {
            return Err(PgWrapError::ConfigError("dbname is required".to_string()));
        }
        Ok(())
    }

    /// Identity of the server session: connections with equal keys are interchangeable.
    #[must_use]
    pub fn session_key(&self) -> String {
        format!("{}:{}:{}:{}", self.host, self.port, self.user, self.dbname)
    }
}

/// Behavior switches for a [`Database`](crate::Database).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverOptions {
    /// Fail when markers and arguments do not pair up exactly.
    pub strict_markers: bool,
    /// What `query_auto` does inside an open transaction.
    pub auto_tx: AutoTxPolicy,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            strict_markers: true,
            auto_tx: AutoTxPolicy::Join,
        }
    }
}

impl DriverOptions {
    #[must_use]
    pub fn with_strict_markers(mut self, strict: bool) -> Self {
        self.strict_markers = strict;
        self
    }

    #[must_use]
    pub fn with_auto_tx(mut self, policy: AutoTxPolicy) -> Self {
        self.auto_tx = policy;
        self
    }
}
