//! Connection string parsing.
//!
//! A connection string is tagged with a scheme: the text before the first
//! colon. The scheme selects the database family and therefore the grammar:
//!
//! - relational strings (`postgresql://...`) are kept opaque and validated
//!   later by the driver;
//! - wide-column strings follow a strict grammar with a `--` separated host
//!   list:
//!
//! ```text
//! cassandra://<user>:<password>@<host1>[--<host2>...]/<keyspace>
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{GivemedataError, GivemedataResult};

/// Grammar reported when a wide-column connection string is malformed.
pub const CASSANDRA_GRAMMAR: &str =
    "cassandra://<user>:<password>@<host1>[--<host2>...]/<keyspace>";

/// Separator between hosts in a wide-column host list.
pub const HOST_DELIMITER: &str = "--";

/// Scheme tag that selects the wide-column family.
pub const CASSANDRA_SCHEME: &str = "cassandra";

/// Every recognized scheme tag and the family it selects, in the order
/// reported by unknown-scheme errors.
pub const SCHEMES: &[(&str, Family)] = &[
    ("postgresql", Family::Relational),
    ("postgres", Family::Relational),
    (CASSANDRA_SCHEME, Family::WideColumn),
];

/// Recognized scheme tags in table order.
pub fn schemes() -> impl Iterator<Item = &'static str> {
    SCHEMES.iter().map(|&(scheme, _)| scheme)
}

/// Return the scheme tag of a connection string.
///
/// The tag is everything before the first colon; a string without a colon
/// is its own tag.
pub fn scheme_of(connection_string: &str) -> &str {
    connection_string
        .split_once(':')
        .map_or(connection_string, |(scheme, _)| scheme)
}

/// Database family a scheme belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// SQL databases reached through a pooled driver.
    Relational,
    /// CQL clusters reached through a lazily opened session.
    WideColumn,
}

impl Family {
    /// Family selected by a scheme tag, if the tag is recognized.
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        SCHEMES
            .iter()
            .find(|&&(tag, _)| tag == scheme)
            .map(|&(_, family)| family)
    }

    /// Short name used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relational => "relational",
            Self::WideColumn => "wide-column",
        }
    }
}

/// Parsed form of a connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionDescriptor {
    /// Opaque relational connection string.
    Relational(RelationalDescriptor),
    /// Structured wide-column connection string.
    WideColumn(CassandraDescriptor),
}

impl ConnectionDescriptor {
    /// Parse a connection string, picking the sub-parser from its scheme tag.
    pub fn parse(connection_string: &str) -> GivemedataResult<Self> {
        let scheme = scheme_of(connection_string);
        let family = Family::from_scheme(scheme)
            .ok_or_else(|| GivemedataError::unknown_scheme(scheme, schemes()))?;
        Self::parse_as(family, connection_string)
    }

    /// Parse a connection string with the grammar of `family`.
    pub fn parse_as(family: Family, connection_string: &str) -> GivemedataResult<Self> {
        match family {
            Family::Relational => Ok(Self::Relational(RelationalDescriptor::parse(
                connection_string,
            )?)),
            Family::WideColumn => Ok(Self::WideColumn(CassandraDescriptor::parse(
                connection_string,
            )?)),
        }
    }

    /// Scheme tag this descriptor was parsed from.
    pub fn scheme(&self) -> &str {
        match self {
            Self::Relational(d) => d.scheme(),
            Self::WideColumn(_) => CASSANDRA_SCHEME,
        }
    }

    /// Database family of this descriptor.
    pub fn family(&self) -> Family {
        match self {
            Self::Relational(_) => Family::Relational,
            Self::WideColumn(_) => Family::WideColumn,
        }
    }

    /// Connection string with the password masked, for display and logs.
    pub fn redacted(&self) -> String {
        match self {
            Self::Relational(d) => d.redacted(),
            Self::WideColumn(d) => d.redacted(),
        }
    }
}

/// A relational connection string, passed to the driver unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalDescriptor {
    url: String,
}

impl RelationalDescriptor {
    /// Wrap a relational connection string.
    ///
    /// Only the scheme tag is checked here; everything else is the driver's
    /// business.
    pub fn parse(connection_string: &str) -> GivemedataResult<Self> {
        if Family::from_scheme(scheme_of(connection_string)) != Some(Family::Relational) {
            return Err(GivemedataError::malformed(
                connection_string,
                "postgresql://<user>:<password>@<host>[:<port>]/<database>",
            ));
        }
        Ok(Self {
            url: connection_string.to_string(),
        })
    }

    /// The scheme tag.
    pub fn scheme(&self) -> &str {
        scheme_of(&self.url)
    }

    /// The full connection string.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connection string with the password (if any) replaced by `***`.
    pub fn redacted(&self) -> String {
        let Some((prefix, rest)) = self.url.split_once("://") else {
            return self.url.clone();
        };
        let Some((credentials, host)) = rest.rsplit_once('@') else {
            return self.url.clone();
        };
        match credentials.split_once(':') {
            Some((user, _)) => format!("{prefix}://{user}:***@{host}"),
            None => self.url.clone(),
        }
    }
}

/// Structured wide-column connection string.
#[derive(Clone, PartialEq, Eq)]
pub struct CassandraDescriptor {
    /// Contact points, in the order they were written.
    pub hosts: Vec<String>,
    /// Keyspace used as the session default.
    pub keyspace: String,
    /// Plain-text auth username.
    pub username: String,
    /// Plain-text auth password.
    pub password: String,
}

impl CassandraDescriptor {
    /// Parse `cassandra://<user>:<password>@<host1>[--<host2>...]/<keyspace>`.
    ///
    /// Any split that does not produce the expected number of parts fails
    /// with [`GivemedataError::MalformedConnectionString`]; no partial
    /// descriptor is ever returned.
    pub fn parse(connection_string: &str) -> GivemedataResult<Self> {
        let malformed = || GivemedataError::malformed(connection_string, CASSANDRA_GRAMMAR);

        let rest = connection_string
            .strip_prefix(CASSANDRA_SCHEME)
            .and_then(|r| r.strip_prefix("://"))
            .ok_or_else(malformed)?;

        let mut at_split = rest.split('@');
        let (credentials, location) = match (at_split.next(), at_split.next(), at_split.next()) {
            (Some(credentials), Some(location), None) => (credentials, location),
            _ => return Err(malformed()),
        };

        let (username, password) = credentials.split_once(':').ok_or_else(malformed)?;
        if username.is_empty() {
            return Err(malformed());
        }

        if location.matches('/').count() != 1 {
            return Err(malformed());
        }
        let (host_list, keyspace) = location.rsplit_once('/').ok_or_else(malformed)?;
        if keyspace.is_empty() {
            return Err(malformed());
        }

        let hosts: Vec<String> = host_list.split(HOST_DELIMITER).map(String::from).collect();
        if hosts.iter().any(String::is_empty) {
            return Err(malformed());
        }

        Ok(Self {
            hosts,
            keyspace: keyspace.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Rebuild the connection string this descriptor was parsed from.
    pub fn to_connection_string(&self) -> String {
        format!(
            "{CASSANDRA_SCHEME}://{}:{}@{}/{}",
            self.username,
            self.password,
            self.hosts.join(HOST_DELIMITER),
            self.keyspace
        )
    }

    /// Connection string with the password replaced by `***`.
    pub fn redacted(&self) -> String {
        format!(
            "{CASSANDRA_SCHEME}://{}:***@{}/{}",
            self.username,
            self.hosts.join(HOST_DELIMITER),
            self.keyspace
        )
    }
}

impl FromStr for CassandraDescriptor {
    type Err = GivemedataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for CassandraDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CassandraDescriptor")
            .field("hosts", &self.hosts)
            .field("keyspace", &self.keyspace)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
