//! Environment handed to external tools

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Variable the cite2* tools read their papers directory from
pub const PAPERS_DIR_ENV: &str = "PAPERS_DIR";

/// The exact set of variables a spawned tool receives
///
/// Built once and passed to the bridge, so two bridges never share or leak
/// overrides through the process-wide environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolEnvironment {
    vars: BTreeMap<OsString, OsString>,
}

impl ToolEnvironment {
    /// Snapshot the current process environment
    pub fn capture() -> Self {
        std::env::vars_os().collect()
    }

    /// An environment with no variables at all
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Override `PAPERS_DIR`
    pub fn with_papers_dir(self, dir: impl AsRef<Path>) -> Self {
        self.with_var(PAPERS_DIR_ENV, dir.as_ref().as_os_str())
    }

    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.vars.get(key.as_ref()).map(OsString::as_os_str)
    }

    pub fn papers_dir(&self) -> Option<&Path> {
        self.get(PAPERS_DIR_ENV).map(Path::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsString, &OsString)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ToolEnvironment
where
    K: Into<OsString>,
    V: Into<OsString>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
