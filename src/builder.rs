//! Building the provider tree from a configuration source.
//!
//! The configuration mapping is walked top-down in file order. Mappings
//! become groups, strings become leaves dispatched through the registry.
//! The build is all-or-nothing: the first bad entry aborts it.
//!
//! Building is synchronous and opens no connection. With
//! [`TreeBuilder::connect_eagerly`], [`TreeBuilder::build_checked`] also
//! connects every relational leaf and discards the tree if one fails.

use givemedata_core::{
    ConfigEntry, ConfigMap, ConfigSource, GivemedataError, GivemedataResult, scheme_of,
};
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::node::{NodeInfo, ProviderGroup, ProviderNode};
use crate::registry::{self, LeafContext};
use crate::transport::find_certificate;

/// Name of the root group when the caller does not pick one.
pub const ROOT_NAME: &str = "GIVEMEDATA";

/// Builds a [`ProviderNode`] tree from a [`ConfigSource`].
#[derive(Debug)]
pub struct TreeBuilder<'a> {
    source: &'a ConfigSource,
    root_name: String,
    eager: bool,
}

impl<'a> TreeBuilder<'a> {
    /// Create a builder over `source` with the default root name.
    pub fn new(source: &'a ConfigSource) -> Self {
        Self {
            source,
            root_name: ROOT_NAME.to_string(),
            eager: false,
        }
    }

    /// Use a different name for the root group.
    #[must_use]
    pub fn root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    /// Connect every relational leaf in [`build_checked`](Self::build_checked).
    #[must_use]
    pub fn connect_eagerly(mut self, eager: bool) -> Self {
        self.eager = eager;
        self
    }

    /// Build the tree, then connect it if [`connect_eagerly`](Self::connect_eagerly)
    /// was set.
    ///
    /// A relational leaf that cannot connect fails the whole build with
    /// [`GivemedataError::ProviderConstruction`] naming the leaf; the
    /// partially connected tree is dropped.
    pub async fn build_checked(&self) -> GivemedataResult<ProviderNode> {
        let node = self.build()?;
        if self.eager {
            node.check_connections().await?;
            info!(root = %self.root_name, "Provider tree connected");
        }
        Ok(node)
    }

    /// Build the tree without opening any connection.
    ///
    /// The root is always a group, even for a single top-level entry.
    pub fn build(&self) -> GivemedataResult<ProviderNode> {
        let root = NodeInfo::root(&self.root_name);
        let node = self.build_group(root, self.source.entries())?;

        let leaves = node.leaves().count();
        info!(
            root = %self.root_name,
            leaves,
            config = ?self.source.path(),
            "Provider tree built"
        );
        Ok(node)
    }

    fn build_group(&self, info: NodeInfo, entries: &ConfigMap) -> GivemedataResult<ProviderNode> {
        if entries.is_empty() {
            let path = if info.depth() == 0 {
                info.name().to_string()
            } else {
                info.dotted_path()
            };
            return Err(GivemedataError::invalid_config(path, "group has no entries"));
        }

        let mut children = IndexMap::with_capacity(entries.len());
        for (key, entry) in entries {
            let child = info.child(key.as_str());
            if !is_identifier(key) {
                return Err(GivemedataError::invalid_config(
                    child.dotted_path(),
                    "names must start with a letter or `_` and contain only letters, digits and `_`",
                ));
            }

            let node = match entry {
                ConfigEntry::Group(nested) => self.build_group(child, nested)?,
                ConfigEntry::Connection(connection_string) => {
                    self.build_leaf(child, connection_string)?
                }
                other => {
                    return Err(GivemedataError::invalid_config(
                        child.dotted_path(),
                        format!(
                            "expected a mapping or a connection string, found {}",
                            other.kind()
                        ),
                    ));
                }
            };
            children.insert(key.clone(), node);
        }

        debug!(
            group = %info.name(),
            depth = info.depth(),
            children = children.len(),
            "Built group"
        );
        Ok(ProviderNode::Group(ProviderGroup::new(info, children)))
    }

    fn build_leaf(
        &self,
        info: NodeInfo,
        connection_string: &str,
    ) -> GivemedataResult<ProviderNode> {
        let scheme = scheme_of(connection_string);
        let registration = registry::lookup(scheme)?;
        let descriptor = registration.parse(connection_string)?;
        let certificate = find_certificate(self.source.config_dir(), &info);

        debug!(
            node = %info.dotted_path(),
            scheme = %scheme,
            family = registration.family.as_str(),
            "Building leaf"
        );
        registration.construct(LeafContext {
            info,
            descriptor,
            certificate,
        })
    }
}

/// Build the provider tree for `source` with the default root name.
///
/// No connection is opened, so an unreachable database only shows up when
/// an operation on its leaf runs. Use
/// [`build_connected_provider_from_config`] or
/// [`TreeBuilder::connect_eagerly`] to fail the build instead.
pub fn build_provider_from_config(source: &ConfigSource) -> GivemedataResult<ProviderNode> {
    TreeBuilder::new(source).build()
}

/// Build the provider tree for `source` and connect every relational leaf.
///
/// Fails with [`GivemedataError::ProviderConstruction`] if any of them
/// cannot connect. Wide-column leaves still open their sessions on
/// activation.
pub async fn build_connected_provider_from_config(
    source: &ConfigSource,
) -> GivemedataResult<ProviderNode> {
    TreeBuilder::new(source)
        .connect_eagerly(true)
        .build_checked()
        .await
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
