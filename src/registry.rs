//! Family to provider dispatch.
//!
//! Which family a scheme tag selects is decided by the scheme table in
//! [`givemedata_core::descriptor::SCHEMES`]. This table maps each family to
//! the provider that builds its leaves. A new scheme for an existing family
//! only needs a row there; a new family needs a driver integration and a row
//! here.

use std::path::PathBuf;

use givemedata_core::descriptor;
use givemedata_core::{ConnectionDescriptor, Family, GivemedataError, GivemedataResult};

use crate::node::{NodeInfo, ProviderNode};
use crate::relational::RelationalProvider;
use crate::wide_column::WideColumnProvider;

/// Everything a provider constructor receives for one leaf.
#[derive(Debug, Clone)]
pub struct LeafContext {
    /// Name, depth and ancestry of the leaf.
    pub info: NodeInfo,
    /// Parsed connection string.
    pub descriptor: ConnectionDescriptor,
    /// Certificate file found next to the configuration, if any.
    pub certificate: Option<PathBuf>,
}

/// Builds a leaf node from its context.
pub type ProviderConstructor = fn(LeafContext) -> GivemedataResult<ProviderNode>;

/// One row of the dispatch table.
#[derive(Debug, Clone, Copy)]
pub struct Registration {
    /// Family handled by this row.
    pub family: Family,
    constructor: ProviderConstructor,
}

impl Registration {
    /// Parse a connection string with this row's family grammar.
    pub fn parse(&self, connection_string: &str) -> GivemedataResult<ConnectionDescriptor> {
        ConnectionDescriptor::parse_as(self.family, connection_string)
    }

    /// Build a leaf with this row's constructor.
    pub fn construct(&self, leaf: LeafContext) -> GivemedataResult<ProviderNode> {
        (self.constructor)(leaf)
    }
}

static REGISTRY: [Registration; 2] = [
    Registration {
        family: Family::Relational,
        constructor: RelationalProvider::construct,
    },
    Registration {
        family: Family::WideColumn,
        constructor: WideColumnProvider::construct,
    },
];

/// Registered scheme tags in table order.
pub fn schemes() -> impl Iterator<Item = &'static str> {
    descriptor::schemes()
}

/// Find the row responsible for `scheme`.
pub fn lookup(scheme: &str) -> GivemedataResult<&'static Registration> {
    Family::from_scheme(scheme)
        .and_then(|family| REGISTRY.iter().find(|r| r.family == family))
        .ok_or_else(|| GivemedataError::unknown_scheme(scheme, schemes()))
}
