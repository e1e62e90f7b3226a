//! # givemedata-core
//!
//! Driver-free building blocks shared by the givemedata provider crates.
//!
//! This crate provides:
//! - Configuration discovery over a platform search path ([`ConfigResolver`])
//! - The parsed configuration mapping ([`ConfigSource`])
//! - Connection-string parsing, including the multi-host Cassandra grammar
//! - The error taxonomy used across the workspace
//! - Result shapes returned by every provider ([`RowSet`], [`TableList`], [`ColumnList`])
//! - TLS setup from a certificate file, shared by the drivers
//!
//! ## Example
//!
//! ```rust,ignore
//! use givemedata_core::{ConfigResolver, ConnectionDescriptor};
//!
//! let resolver = ConfigResolver::from_env()?;
//! if let Some(source) = resolver.resolve()? {
//!     println!("{} entries", source.entries().len());
//! }
//!
//! let descriptor = ConnectionDescriptor::parse("cassandra://u:p@10.0.0.1--10.0.0.2/ks")?;
//! assert_eq!(descriptor.scheme(), "cassandra");
//! ```

pub mod cluster;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod persistent;
pub mod resolver;
pub mod rowset;
pub mod sql;
pub mod tls;

pub use cluster::ClusterOptions;
pub use config::{ConfigEntry, ConfigMap, ConfigSource, expand_env_vars};
pub use descriptor::{
    CassandraDescriptor, ConnectionDescriptor, Family, RelationalDescriptor, scheme_of,
};
pub use error::{BoxError, GivemedataError, GivemedataResult};
pub use resolver::{APP_NAME, ConfigResolver, Platform, SearchPaths};
pub use rowset::{ColumnInfo, ColumnList, RowSet, TableList, TableRef, TableScope};
pub use tls::{TlsError, TlsResult};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::cluster::ClusterOptions;
    pub use crate::config::{ConfigEntry, ConfigSource};
    pub use crate::descriptor::{CassandraDescriptor, ConnectionDescriptor, Family};
    pub use crate::error::{GivemedataError, GivemedataResult};
    pub use crate::resolver::ConfigResolver;
    pub use crate::rowset::{ColumnList, RowSet, TableList, TableRef, TableScope};
}
