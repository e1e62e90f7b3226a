//! # givemedata-cassandra
//!
//! Cassandra and ScyllaDB provider for givemedata.
//!
//! This crate provides:
//! - Session configuration derived from a multi-host `cassandra://` descriptor
//! - At-most-once session activation shared by concurrent callers
//! - Optional TLS verification against a certificate file
//! - Paged CQL execution with conversion of every CQL type into JSON cells
//! - Table and column listing through `system_schema`
//!
//! ## Example
//!
//! ```rust,ignore
//! use givemedata_cassandra::{CassandraConfig, CassandraEngine, ClusterOptions};
//! use givemedata_core::CassandraDescriptor;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let descriptor = CassandraDescriptor::parse("cassandra://u:p@10.0.0.1--10.0.0.2/events")?;
//!     let engine = CassandraEngine::new(CassandraConfig::from_descriptor(&descriptor));
//!
//!     // Opens the session; later calls reuse it
//!     engine.activate(&ClusterOptions::default().page_size(500)).await?;
//!     let rows = engine.run_cql("SELECT * FROM clicks LIMIT 10", &ClusterOptions::default()).await?;
//!     println!("{rows}");
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod row;
pub mod session;

pub use config::{CassandraConfig, ClusterOptions, DEFAULT_PORT};
pub use engine::CassandraEngine;
pub use error::{CassandraError, CassandraResult};
pub use session::{Activation, CassandraSession};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{CassandraConfig, ClusterOptions};
    pub use crate::engine::CassandraEngine;
    pub use crate::error::{CassandraError, CassandraResult};
}
