//! Error types for config discovery, tree construction and provider access.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Boxed error used to carry driver failures without naming the driver crate.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for givemedata operations.
pub type GivemedataResult<T> = Result<T, GivemedataError>;

/// Errors that can occur while resolving configuration, building the
/// provider tree, or talking to a provider.
#[derive(Error, Debug, Diagnostic)]
pub enum GivemedataError {
    /// The host platform has no known configuration locations.
    #[error("unsupported platform: {platform}")]
    #[diagnostic(
        code(givemedata::unsupported_platform),
        help("supported platforms are windows, macos and linux; set the config directory variable or pass a configuration explicitly")
    )]
    UnsupportedPlatform { platform: String },

    /// A candidate config file exists but could not be read.
    #[error("failed to read config file: {}", path.display())]
    #[diagnostic(code(givemedata::config::io_error))]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config file exists but is not valid YAML mapping data.
    #[error("failed to parse config from {origin}")]
    #[diagnostic(code(givemedata::config::parse_error))]
    ConfigParse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A config entry is structurally wrong (bad key, empty group, non-string leaf).
    #[error("invalid config entry `{path}`: {message}")]
    #[diagnostic(code(givemedata::config::invalid_entry))]
    InvalidConfig { path: String, message: String },

    /// A connection string does not follow its scheme's grammar.
    #[error("malformed connection string `{connection_string}`, expected `{expected}`")]
    #[diagnostic(code(givemedata::malformed_connection_string))]
    MalformedConnectionString {
        connection_string: String,
        expected: &'static str,
    },

    /// No provider is registered for the connection string's scheme.
    #[error("unknown scheme `{scheme}`, registered schemes: {}", registered.join(", "))]
    #[diagnostic(code(givemedata::unknown_scheme))]
    UnknownScheme {
        scheme: String,
        registered: Vec<String>,
    },

    /// The driver refused to set up a provider.
    #[error("failed to construct provider `{name}`: {source}")]
    #[diagnostic(code(givemedata::provider_construction))]
    ProviderConstruction {
        name: String,
        #[source]
        source: BoxError,
    },

    /// A wide-column operation was invoked without the driver compiled in.
    #[error("`{feature}` support is not available in this build")]
    #[diagnostic(
        code(givemedata::missing_optional_dependency),
        help("enable the `{feature}` cargo feature of givemedata")
    )]
    MissingOptionalDependency { feature: &'static str },

    /// A table was addressed by a name or index that does not exist.
    #[error("no table `{table}`")]
    #[diagnostic(code(givemedata::table_not_found))]
    TableNotFound { table: String },

    /// Reading or writing a persistent result cache failed.
    #[error("persistent cache {}: {source}", path.display())]
    #[diagnostic(code(givemedata::cache))]
    Cache {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// Query-phase failure reported by an underlying driver.
    #[error("{family} error: {source}")]
    #[diagnostic(code(givemedata::driver))]
    Driver {
        family: &'static str,
        #[source]
        source: BoxError,
    },
}

impl GivemedataError {
    /// Create an invalid config entry error.
    pub fn invalid_config(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a malformed connection string error.
    pub fn malformed(connection_string: impl Into<String>, expected: &'static str) -> Self {
        Self::MalformedConnectionString {
            connection_string: connection_string.into(),
            expected,
        }
    }

    /// Create an unknown scheme error.
    pub fn unknown_scheme<I, S>(scheme: impl Into<String>, registered: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::UnknownScheme {
            scheme: scheme.into(),
            registered: registered.into_iter().map(Into::into).collect(),
        }
    }

    /// Wrap a driver failure that happened while constructing provider `name`.
    pub fn construction(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::ProviderConstruction {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Wrap a query-phase driver failure.
    pub fn driver(family: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Driver {
            family,
            source: source.into(),
        }
    }

    /// Check if this error came out of config discovery or parsing.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigRead { .. } | Self::ConfigParse { .. } | Self::InvalidConfig { .. }
        )
    }

    /// Borrow the underlying driver error, if it is of type `E`.
    pub fn driver_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Driver { source, .. } | Self::ProviderConstruction { source, .. } => {
                source.downcast_ref::<E>()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(unused_assignments)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_scheme_display() {
        let err = GivemedataError::unknown_scheme("mysql", ["postgresql", "cassandra"]);
        let display = err.to_string();
        assert!(display.contains("mysql"));
        assert!(display.contains("postgresql, cassandra"));
    }

    #[test]
    fn test_malformed_display() {
        let err = GivemedataError::malformed("cassandra://nope", "cassandra://<user>");
        let display = err.to_string();
        assert!(display.contains("cassandra://nope"));
        assert!(display.contains("cassandra://<user>"));
    }

    #[test]
    fn test_driver_error_downcast() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = GivemedataError::driver("postgres", io);

        let inner = err.driver_error::<std::io::Error>().unwrap();
        assert_eq!(inner.kind(), std::io::ErrorKind::ConnectionRefused);
        assert!(err.driver_error::<std::fmt::Error>().is_none());
    }

    #[test]
    fn test_is_config_error() {
        assert!(GivemedataError::invalid_config("a.b", "empty group").is_config_error());
        assert!(!GivemedataError::TableNotFound { table: "t".into() }.is_config_error());
    }

    #[test]
    fn test_missing_dependency_display() {
        let err = GivemedataError::MissingOptionalDependency {
            feature: "cassandra",
        };
        assert!(err.to_string().contains("cassandra"));
    }
}
