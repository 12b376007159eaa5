//! `OWNERS` and `OWNERS_ALIASES` file shapes.
//!
//! ```yaml
//! # OWNERS
//! approvers:
//!   - sig-node-approvers
//!   - alice
//! reviewers:
//!   - sig-node-reviewers
//! required_reviewers:
//!   - bob
//! ```
//!
//! ```yaml
//! # OWNERS_ALIASES
//! aliases:
//!   sig-node-approvers:
//!     - alice
//!     - carol
//! ```

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Deserializer};
use tracing::{debug, info, warn};

use crate::errors::OwnersError;

/// Treat an explicit YAML `null` (e.g. `reviewers:` with no items) like an
/// absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Per-file-pattern overrides inside an `OWNERS` file. Parsed, not counted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub approvers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reviewers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub required_reviewers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirOptions {
    #[serde(default)]
    pub no_parent_owners: bool,
}

/// Parsed contents of one `OWNERS` file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnersFile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub approvers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reviewers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub required_reviewers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub emeritus_approvers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub emeritus_reviewers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filters: HashMap<String, FilterInfo>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: DirOptions,
}

impl OwnersFile {
    pub fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, OwnersError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| OwnersError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents).map_err(|e| OwnersError::ParseError {
            path: path.display().to_string(),
            detail: e.to_string(),
        })
    }

    /// `reviewers` ∪ `required_reviewers`, deduplicated and sorted.
    pub fn counted_reviewers(&self) -> Vec<String> {
        self.reviewers
            .iter()
            .chain(&self.required_reviewers)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
struct AliasesFile {
    #[serde(default, deserialize_with = "null_as_default")]
    aliases: HashMap<String, Option<Vec<String>>>,
}

/// Alias name → entity names it expands to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: HashMap<String, Vec<String>>,
}

impl AliasTable {
    pub fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let file: AliasesFile = serde_yaml::from_str(contents)?;
        Ok(Self {
            aliases: file
                .aliases
                .into_iter()
                .map(|(name, members)| (name, members.unwrap_or_default()))
                .collect(),
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, OwnersError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| OwnersError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::parse(&contents).map_err(|e| OwnersError::ParseError {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        debug!(path = %path.display(), count = table.len(), "loaded alias table");
        Ok(table)
    }

    /// Load `path` if given and readable; anything else yields an empty
    /// table.
    pub fn load_or_empty(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            info!("no alias file, using empty alias table");
            return Self::default();
        };
        match Self::load(path) {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, "alias file unusable, using empty alias table");
                Self::default()
            }
        }
    }

    pub fn get(&self, alias: &str) -> Option<&[String]> {
        self.aliases.get(alias).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl<K, V, S> FromIterator<(K, V)> for AliasTable
where
    K: Into<String>,
    V: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            aliases: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_owners_file() {
        let owners = OwnersFile::parse(
            r#"
# See the OWNERS docs
options:
  no_parent_owners: true
approvers:
  - sig-node-approvers
  - alice
reviewers:
  - sig-node-reviewers
  - bob
required_reviewers:
  - bob
  - carol
emeritus_approvers:
  - zed
labels:
  - sig/node
filters:
  ".*_test\\.go$":
    approvers:
      - tester
"#,
        )
        .unwrap();
        assert_eq!(owners.approvers, vec!["sig-node-approvers", "alice"]);
        assert!(owners.options.no_parent_owners);
        assert_eq!(owners.filters.len(), 1);
        assert_eq!(
            owners.counted_reviewers(),
            vec!["bob", "carol", "sig-node-reviewers"]
        );
    }

    #[test]
    fn test_null_and_empty_lists() {
        let owners = OwnersFile::parse("approvers:\nreviewers: []\n").unwrap();
        assert!(owners.approvers.is_empty());
        assert!(owners.counted_reviewers().is_empty());

        let empty = OwnersFile::parse("").unwrap();
        assert!(empty.approvers.is_empty());
    }

    #[test]
    fn test_malformed_owners_file() {
        assert!(OwnersFile::parse("approvers: {alice").is_err());
        assert!(OwnersFile::parse("approvers: 42").is_err());
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("OWNERS");
        std::fs::write(&path, "approvers: [unterminated").unwrap();
        match OwnersFile::load(&path) {
            Err(OwnersError::ParseError { path: p, .. }) => assert!(p.ends_with("OWNERS")),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(matches!(
            OwnersFile::load(dir.path().join("missing")),
            Err(OwnersError::Unreadable { .. })
        ));
    }

    #[test]
    fn test_parse_alias_table() {
        let table = AliasTable::parse(
            r#"
aliases:
  sig-node-approvers:
    - alice
    - carol
  retired-team:
"#,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("sig-node-approvers").unwrap(), ["alice", "carol"]);
        assert_eq!(table.get("retired-team").unwrap().len(), 0);
        assert!(table.get("alice").is_none());
    }

    #[test]
    fn test_load_or_empty_degrades() {
        assert!(AliasTable::load_or_empty(None).is_empty());

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("OWNERS_ALIASES");
        assert!(AliasTable::load_or_empty(Some(&missing)).is_empty());

        std::fs::write(&missing, "aliases: [not, a, map]").unwrap();
        assert!(AliasTable::load_or_empty(Some(&missing)).is_empty());

        std::fs::write(&missing, "aliases:\n  team:\n    - alice\n").unwrap();
        assert_eq!(AliasTable::load_or_empty(Some(&missing)).len(), 1);
    }

    #[test]
    fn test_from_iter() {
        let table: AliasTable = [("team-a", vec!["alice", "bob"])].into_iter().collect();
        assert_eq!(table.get("team-a").unwrap(), ["alice", "bob"]);
    }
}
