//! Certificate lookup for leaves that need a verified transport.
//!
//! A leaf's certificate lives next to the configuration file and is named
//! after the leaf's position in the tree:
//!
//! ```text
//! <config dir>/<ancestor>_..._<name>.givemedata.cer
//! ```
//!
//! Lookup only checks that the file exists. Its contents are read when the
//! leaf opens a connection, so a broken certificate never fails the build.

use std::path::{Path, PathBuf};

use givemedata_core::APP_NAME;
use tracing::debug;

use crate::node::NodeInfo;

/// File name of the certificate for the node described by `info`.
pub fn certificate_file_name(info: &NodeInfo) -> String {
    let stem = info
        .ancestors()
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(info.name()))
        .collect::<Vec<_>>()
        .join("_");
    format!("{stem}.{APP_NAME}.cer")
}

/// Path of the node's certificate in `config_dir`, if the file exists.
///
/// Configurations without a backing file have no directory to look in.
pub fn find_certificate(config_dir: Option<&Path>, info: &NodeInfo) -> Option<PathBuf> {
    let candidate = config_dir?.join(certificate_file_name(info));
    if candidate.is_file() {
        debug!(node = %info.dotted_path(), cert = %candidate.display(), "Found certificate");
        Some(candidate)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_certificate_file_name() {
        let root = NodeInfo::root("GIVEMEDATA");
        let top = root.child("events");
        let nested = root.child("prod").child("eu").child("events");

        assert_eq!(certificate_file_name(&top), "events.givemedata.cer");
        assert_eq!(certificate_file_name(&nested), "prod_eu_events.givemedata.cer");
    }

    #[test]
    fn test_find_certificate() {
        let dir = tempfile::tempdir().unwrap();
        let info = NodeInfo::root("GIVEMEDATA").child("prod").child("events");

        assert_eq!(find_certificate(Some(dir.path()), &info), None);
        assert_eq!(find_certificate(None, &info), None);

        let path = dir.path().join("prod_events.givemedata.cer");
        std::fs::write(&path, "not checked here").unwrap();
        assert_eq!(find_certificate(Some(dir.path()), &info), Some(path));
    }

    #[test]
    fn test_directory_with_certificate_name_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let info = NodeInfo::root("GIVEMEDATA").child("events");
        std::fs::create_dir(dir.path().join("events.givemedata.cer")).unwrap();

        assert_eq!(find_certificate(Some(dir.path()), &info), None);
    }
}
