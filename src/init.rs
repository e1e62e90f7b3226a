//! Process-wide provider initialization.
//!
//! Nothing here runs on its own: the embedding application calls
//! [`resolve_default_provider`] (or [`connect_default_provider`]) once and
//! keeps the tree in its own state.

use givemedata_core::{ConfigResolver, ConfigSource, GivemedataResult};
use tracing::info;

use crate::builder::{build_connected_provider_from_config, build_provider_from_config};
use crate::node::ProviderNode;

/// Discover the configuration on the platform search path and build the
/// provider tree from it.
///
/// Returns `Ok(None)` when no configuration file exists or the file has no
/// entries; callers can still build a tree from an explicit
/// [`ConfigSource`](givemedata_core::ConfigSource).
pub fn resolve_default_provider() -> GivemedataResult<Option<ProviderNode>> {
    resolve_provider(&ConfigResolver::from_env()?)
}

/// Like [`resolve_default_provider`], over an explicit resolver.
pub fn resolve_provider(resolver: &ConfigResolver) -> GivemedataResult<Option<ProviderNode>> {
    match resolve_source(resolver)? {
        Some(source) => build_provider_from_config(&source).map(Some),
        None => Ok(None),
    }
}

/// Like [`resolve_default_provider`], but every relational leaf is connected
/// before the tree is returned.
///
/// An unreachable database fails the call with
/// [`GivemedataError::ProviderConstruction`](givemedata_core::GivemedataError::ProviderConstruction).
pub async fn connect_default_provider() -> GivemedataResult<Option<ProviderNode>> {
    connect_provider(&ConfigResolver::from_env()?).await
}

/// Like [`connect_default_provider`], over an explicit resolver.
pub async fn connect_provider(resolver: &ConfigResolver) -> GivemedataResult<Option<ProviderNode>> {
    match resolve_source(resolver)? {
        Some(source) => build_connected_provider_from_config(&source).await.map(Some),
        None => Ok(None),
    }
}

fn resolve_source(resolver: &ConfigResolver) -> GivemedataResult<Option<ConfigSource>> {
    let Some(source) = resolver.resolve()? else {
        info!(
            searched = ?resolver.search_paths().dirs(),
            "Could not configure data provider: no config file found"
        );
        return Ok(None);
    };

    if source.is_empty() {
        info!(
            path = ?source.path(),
            "Could not configure data provider: config file has no entries"
        );
        return Ok(None);
    }

    Ok(Some(source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use givemedata_core::{APP_NAME, GivemedataError, SearchPaths};

    #[test]
    fn test_nothing_found_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ConfigResolver::new(SearchPaths::with_dirs(APP_NAME, [dir.path()]));

        assert!(resolve_provider(&resolver).unwrap().is_none());
    }

    #[test]
    fn test_empty_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".givemedata.yaml"), "").unwrap();
        let resolver = ConfigResolver::new(SearchPaths::with_dirs(APP_NAME, [dir.path()]));

        assert!(resolve_provider(&resolver).unwrap().is_none());
    }

    #[test]
    fn test_found_config_is_built() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("givemedata.yml"),
            "events: cassandra://u:p@10.0.0.1/ks\n",
        )
        .unwrap();
        let resolver = ConfigResolver::new(SearchPaths::with_dirs(APP_NAME, [dir.path()]));

        let root = resolve_provider(&resolver).unwrap().unwrap();
        assert!(root.get("events").is_some());
    }

    #[tokio::test]
    async fn test_connect_provider_reports_unreachable_leaf() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("givemedata.yml"),
            "warehouse: postgresql://u:p@127.0.0.1:1/db?connect_timeout=1\n",
        )
        .unwrap();
        let resolver = ConfigResolver::new(SearchPaths::with_dirs(APP_NAME, [dir.path()]));

        assert!(resolve_provider(&resolver).unwrap().is_some());
        let err = connect_provider(&resolver).await.unwrap_err();
        assert!(matches!(
            err,
            GivemedataError::ProviderConstruction { ref name, .. } if name == "warehouse"
        ));
    }

    #[tokio::test]
    async fn test_connect_provider_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ConfigResolver::new(SearchPaths::with_dirs(APP_NAME, [dir.path()]));

        assert!(connect_provider(&resolver).await.unwrap().is_none());
    }
}
