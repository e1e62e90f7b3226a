//! Configuration discovery.
//!
//! Candidate directories are tried in priority order, and inside each
//! directory four file names are tried in order:
//!
//! 1. `.givemedata.yaml`
//! 2. `.givemedata.yml`
//! 3. `givemedata.yaml`
//! 4. `givemedata.yml`
//!
//! The directory named by `GIVEMEDATA_CONFIG_DIR` always comes first. The
//! remaining directories depend on the platform:
//!
//! | Platform | Directories |
//! |---|---|
//! | Windows | `%HOME%`, `%APPDATA%`, `%PROGRAMDATA%` (each only if set) |
//! | macOS | `$HOME`, `$HOME/Library/givemedata`, `/Library/givemedata` |
//! | Linux | `$HOME`, `/etc/givemedata` |

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::ConfigSource;
use crate::error::{GivemedataError, GivemedataResult};

/// Application name used for file names and the override variable.
pub const APP_NAME: &str = "givemedata";

/// Host platform families with known configuration locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Windows-like: home plus per-user and system application data.
    Windows,
    /// Unix-like desktop: home plus `Library` directories.
    MacOs,
    /// Unix-like server: home plus `/etc`.
    Linux,
}

impl Platform {
    /// Detect the platform this binary was built for.
    pub fn current() -> GivemedataResult<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS name as reported by `std::env::consts::OS`.
    pub fn from_os(os: &str) -> GivemedataResult<Self> {
        match os {
            "windows" => Ok(Self::Windows),
            "macos" => Ok(Self::MacOs),
            "linux" => Ok(Self::Linux),
            other => Err(GivemedataError::UnsupportedPlatform {
                platform: other.to_string(),
            }),
        }
    }
}

/// Name of the environment variable that overrides the search path for `app`.
pub fn override_env_var(app: &str) -> String {
    format!("{}_CONFIG_DIR", app.to_uppercase())
}

/// Candidate file names for `app`, in the order they are tried.
pub fn candidate_file_names(app: &str) -> [String; 4] {
    [
        format!(".{app}.yaml"),
        format!(".{app}.yml"),
        format!("{app}.yaml"),
        format!("{app}.yml"),
    ]
}

/// Priority-ordered list of directories to search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPaths {
    app: String,
    dirs: Vec<PathBuf>,
}

impl SearchPaths {
    /// Build the search path for `platform`, reading variables through `lookup`.
    ///
    /// Variables that are unset or empty are skipped.
    pub fn for_platform(
        app: &str,
        platform: Platform,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty()).map(PathBuf::from);
        let mut dirs = Vec::new();

        match platform {
            Platform::Windows => {
                dirs.extend(["HOME", "APPDATA", "PROGRAMDATA"].into_iter().filter_map(var));
            }
            Platform::MacOs => {
                if let Some(home) = var("HOME") {
                    dirs.push(home.join("Library").join(app));
                    dirs.insert(0, home);
                }
                dirs.push(Path::new("/Library").join(app));
            }
            Platform::Linux => {
                if let Some(home) = var("HOME") {
                    dirs.push(home);
                }
                dirs.push(Path::new("/etc").join(app));
            }
        }

        if let Some(custom) = var(&override_env_var(app)) {
            dirs.insert(0, custom);
        }

        Self {
            app: app.to_string(),
            dirs,
        }
    }

    /// Build the search path for the current platform and process environment.
    pub fn from_env(app: &str) -> GivemedataResult<Self> {
        let platform = Platform::current()?;
        Ok(Self::for_platform(app, platform, |name| std::env::var(name).ok()))
    }

    /// Use an explicit list of directories.
    pub fn with_dirs<I, P>(app: &str, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            app: app.to_string(),
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Directories in priority order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Every candidate file in the order it will be tried.
    pub fn candidates(&self) -> impl Iterator<Item = PathBuf> + '_ {
        let names = candidate_file_names(&self.app);
        self.dirs
            .iter()
            .flat_map(move |dir| names.clone().into_iter().map(move |name| dir.join(name)))
    }
}

/// Finds and loads the first configuration file on the search path.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    paths: SearchPaths,
}

impl ConfigResolver {
    /// Create a resolver over explicit search paths.
    pub fn new(paths: SearchPaths) -> Self {
        Self { paths }
    }

    /// Create a resolver for the current platform and environment.
    pub fn from_env() -> GivemedataResult<Self> {
        Ok(Self::new(SearchPaths::from_env(APP_NAME)?))
    }

    /// The search paths this resolver walks.
    pub fn search_paths(&self) -> &SearchPaths {
        &self.paths
    }

    /// Return the first candidate that exists, parsed.
    ///
    /// `Ok(None)` means no candidate exists, which is a normal outcome. A
    /// candidate that exists but fails to parse stops the search with an
    /// error instead of falling through to the next candidate.
    pub fn resolve(&self) -> GivemedataResult<Option<ConfigSource>> {
        for candidate in self.paths.candidates() {
            match std::fs::read_to_string(&candidate) {
                Ok(content) => {
                    info!(path = %candidate.display(), "Using config file");
                    return ConfigSource::from_content(&content, Some(&candidate)).map(Some);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(path = %candidate.display(), "Config candidate not found");
                }
                Err(source) => {
                    return Err(GivemedataError::ConfigRead {
                        path: candidate,
                        source,
                    });
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_linux_dirs() {
        let paths = SearchPaths::for_platform(APP_NAME, Platform::Linux, env(&[("HOME", "/home/me")]));
        assert_eq!(
            paths.dirs(),
            &[PathBuf::from("/home/me"), PathBuf::from("/etc/givemedata")]
        );
    }

    #[test]
    fn test_macos_dirs() {
        let paths = SearchPaths::for_platform(APP_NAME, Platform::MacOs, env(&[("HOME", "/Users/me")]));
        assert_eq!(
            paths.dirs(),
            &[
                PathBuf::from("/Users/me"),
                PathBuf::from("/Users/me/Library/givemedata"),
                PathBuf::from("/Library/givemedata"),
            ]
        );
    }

    #[test]
    fn test_windows_dirs_skip_unset() {
        let paths = SearchPaths::for_platform(
            APP_NAME,
            Platform::Windows,
            env(&[("APPDATA", r"C:\Users\me\AppData\Roaming"), ("HOME", "")]),
        );
        assert_eq!(paths.dirs(), &[PathBuf::from(r"C:\Users\me\AppData\Roaming")]);
    }

    #[test]
    fn test_override_dir_comes_first_on_every_platform() {
        for platform in [Platform::Windows, Platform::MacOs, Platform::Linux] {
            let paths = SearchPaths::for_platform(
                APP_NAME,
                platform,
                env(&[("HOME", "/home/me"), ("GIVEMEDATA_CONFIG_DIR", "/srv/conf")]),
            );
            assert_eq!(paths.dirs()[0], PathBuf::from("/srv/conf"));
        }
    }

    #[test]
    fn test_candidate_order() {
        let paths = SearchPaths::with_dirs(APP_NAME, ["/a", "/b"]);
        let candidates: Vec<PathBuf> = paths.candidates().collect();
        assert_eq!(candidates.len(), 8);
        assert_eq!(candidates[0], PathBuf::from("/a/.givemedata.yaml"));
        assert_eq!(candidates[3], PathBuf::from("/a/givemedata.yml"));
        assert_eq!(candidates[4], PathBuf::from("/b/.givemedata.yaml"));
    }

    #[test]
    fn test_unsupported_platform() {
        let err = Platform::from_os("freebsd").unwrap_err();
        assert!(matches!(err, GivemedataError::UnsupportedPlatform { platform } if platform == "freebsd"));
    }

    #[test]
    fn test_resolve_none_when_nothing_exists() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ConfigResolver::new(SearchPaths::with_dirs(APP_NAME, [dir.path()]));
        assert!(resolver.resolve().unwrap().is_none());
    }

    #[test]
    fn test_resolve_prefers_earlier_dir_and_name() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(first.path().join("givemedata.yml"), "a: postgresql://u:p@h/one\n").unwrap();
        std::fs::write(first.path().join(".givemedata.yml"), "b: postgresql://u:p@h/two\n").unwrap();
        std::fs::write(second.path().join(".givemedata.yaml"), "c: postgresql://u:p@h/three\n").unwrap();

        let resolver = ConfigResolver::new(SearchPaths::with_dirs(
            APP_NAME,
            [first.path(), second.path()],
        ));
        let source = resolver.resolve().unwrap().unwrap();

        assert!(source.entries().contains_key("b"));
        assert_eq!(
            source.path().unwrap().file_name().unwrap(),
            ".givemedata.yml"
        );
    }

    #[test]
    fn test_parse_error_does_not_fall_through() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(first.path().join("givemedata.yaml"), "a: [broken").unwrap();
        std::fs::write(second.path().join("givemedata.yaml"), "b: postgresql://u:p@h/db\n").unwrap();

        let resolver = ConfigResolver::new(SearchPaths::with_dirs(
            APP_NAME,
            [first.path(), second.path()],
        ));
        let err = resolver.resolve().unwrap_err();
        assert!(matches!(err, GivemedataError::ConfigParse { .. }));
    }
}
