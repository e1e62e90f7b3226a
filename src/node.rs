//! The provider tree.
//!
//! A [`ProviderNode`] is either a namespace [`ProviderGroup`] or a leaf
//! owning one database handle. Groups keep their children in configuration
//! order and are navigated by name instead of by attribute.

use std::fmt;

use futures::future::join_all;
use givemedata_core::{BoxError, ConnectionDescriptor, GivemedataError, GivemedataResult};
use indexmap::IndexMap;
use tracing::debug;

use crate::relational::RelationalProvider;
use crate::wide_column::WideColumnProvider;

/// Fields shared by every node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    name: String,
    depth: usize,
    ancestors: Vec<String>,
}

impl NodeInfo {
    /// Create the info of a root node.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depth: 0,
            ancestors: Vec::new(),
        }
    }

    /// Create the info of a node nested under `self`.
    ///
    /// The root's name is not part of any descendant's path.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut ancestors = self.ancestors.clone();
        if self.depth > 0 {
            ancestors.push(self.name.clone());
        }
        Self {
            name: name.into(),
            depth: self.depth + 1,
            ancestors,
        }
    }

    /// Key of this node in its parent.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Distance from the root; the root is at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Names of the ancestors below the root, outermost first.
    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    /// Ancestor names joined with `_`; empty for top-level nodes.
    pub fn full_path(&self) -> String {
        self.ancestors.join("_")
    }

    /// Ancestor names and the node name joined with `.`, as accepted by
    /// [`ProviderNode::lookup`].
    pub fn dotted_path(&self) -> String {
        self.ancestors
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.name.as_str()))
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Namespace grouping other nodes.
    Group,
    /// Relational database leaf.
    Relational,
    /// Wide-column database leaf.
    WideColumn,
}

impl NodeKind {
    /// Check if nodes of this kind own a database handle.
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Self::Group)
    }
}

/// A namespace node with at least one child.
#[derive(Debug)]
pub struct ProviderGroup {
    info: NodeInfo,
    children: IndexMap<String, ProviderNode>,
}

impl ProviderGroup {
    pub(crate) fn new(info: NodeInfo, children: IndexMap<String, ProviderNode>) -> Self {
        Self { info, children }
    }

    /// Shared node fields.
    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    /// Child by name.
    pub fn get(&self, name: &str) -> Option<&ProviderNode> {
        self.children.get(name)
    }

    /// Children in configuration order.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = &ProviderNode> + ExactSizeIterator {
        self.children.values()
    }

    /// Child names in configuration order.
    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Check if the group has no children; never true for a built tree.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A node of the provider tree.
#[derive(Debug)]
pub enum ProviderNode {
    /// Namespace grouping.
    Group(ProviderGroup),
    /// PostgreSQL leaf.
    Relational(RelationalProvider),
    /// Cassandra leaf.
    WideColumn(WideColumnProvider),
}

impl ProviderNode {
    /// Shared node fields.
    pub fn info(&self) -> &NodeInfo {
        match self {
            Self::Group(g) => g.info(),
            Self::Relational(p) => p.info(),
            Self::WideColumn(p) => p.info(),
        }
    }

    /// Kind of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Group(_) => NodeKind::Group,
            Self::Relational(_) => NodeKind::Relational,
            Self::WideColumn(_) => NodeKind::WideColumn,
        }
    }

    /// Key of this node in its parent.
    pub fn name(&self) -> &str {
        self.info().name()
    }

    /// Distance from the root.
    pub fn depth(&self) -> usize {
        self.info().depth()
    }

    /// Ancestor names joined with `_`.
    pub fn full_path(&self) -> String {
        self.info().full_path()
    }

    /// Check if this node is a namespace group.
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// Parsed connection string of a leaf; `None` for groups.
    pub fn descriptor(&self) -> Option<ConnectionDescriptor> {
        match self {
            Self::Group(_) => None,
            Self::Relational(p) => {
                Some(ConnectionDescriptor::Relational(p.descriptor().clone()))
            }
            Self::WideColumn(p) => {
                Some(ConnectionDescriptor::WideColumn(p.descriptor().clone()))
            }
        }
    }

    /// Group view of this node.
    pub fn as_group(&self) -> Option<&ProviderGroup> {
        match self {
            Self::Group(g) => Some(g),
            _ => None,
        }
    }

    /// Relational leaf view of this node.
    pub fn as_relational(&self) -> Option<&RelationalProvider> {
        match self {
            Self::Relational(p) => Some(p),
            _ => None,
        }
    }

    /// Wide-column leaf view of this node.
    pub fn as_wide_column(&self) -> Option<&WideColumnProvider> {
        match self {
            Self::WideColumn(p) => Some(p),
            _ => None,
        }
    }

    /// Direct child by name; leaves have no children.
    pub fn get(&self, name: &str) -> Option<&ProviderNode> {
        self.as_group().and_then(|g| g.get(name))
    }

    /// Descendant addressed by a dotted path such as `analytics.warehouse`.
    pub fn lookup(&self, path: &str) -> Option<&ProviderNode> {
        path.split('.').try_fold(self, |node, name| node.get(name))
    }

    /// Direct children in configuration order; empty for leaves.
    pub fn children(&self) -> Vec<&ProviderNode> {
        match self {
            Self::Group(g) => g.children().collect(),
            _ => Vec::new(),
        }
    }

    /// Every leaf below this node, depth-first in configuration order.
    ///
    /// A leaf yields itself.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves { stack: vec![self] }
    }

    /// Open a connection on every relational leaf and run a trivial query.
    ///
    /// Wide-column leaves are skipped because their sessions open on
    /// activation. The first failure is reported as a construction error
    /// naming the leaf by its dotted path.
    pub async fn check_connections(&self) -> GivemedataResult<()> {
        let relational: Vec<&RelationalProvider> =
            self.leaves().filter_map(ProviderNode::as_relational).collect();
        debug!(count = relational.len(), "Checking relational connections");

        let results = join_all(relational.iter().map(|p| p.ping())).await;
        for (provider, result) in relational.iter().zip(results) {
            if let Err(err) = result {
                let source: BoxError = match err {
                    GivemedataError::Driver { source, .. } => source,
                    other => Box::new(other),
                };
                return Err(GivemedataError::construction(
                    provider.info().dotted_path(),
                    source,
                ));
            }
        }
        Ok(())
    }

    /// Close the pool of every relational leaf below this node.
    ///
    /// Later operations on those leaves fail. Wide-column sessions close when
    /// the tree is dropped.
    pub fn close(&self) {
        for provider in self.leaves().filter_map(ProviderNode::as_relational) {
            provider.close();
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = " ".repeat(self.depth() * 4);
        match self {
            Self::Group(g) => {
                write!(f, "{indent}{}", g.info().name())?;
                for child in g.children() {
                    writeln!(f)?;
                    child.fmt_indented(f)?;
                }
                Ok(())
            }
            Self::Relational(p) => {
                write!(f, "{indent}{} => {}", p.info().name(), p.descriptor().redacted())
            }
            Self::WideColumn(p) => {
                write!(f, "{indent}{} => {}", p.info().name(), p.descriptor().redacted())
            }
        }
    }
}

impl fmt::Display for ProviderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f)
    }
}

/// Depth-first iterator over the leaves of a tree.
pub struct Leaves<'a> {
    stack: Vec<&'a ProviderNode>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a ProviderNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                ProviderNode::Group(g) => self.stack.extend(g.children().rev()),
                leaf => return Some(leaf),
            }
        }
        None
    }
}
