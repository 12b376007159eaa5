//! Group registry (`sigs.yaml`) reader.
//!
//! The registry lists every SIG, working group, user group and committee of
//! the project. Each group owns subprojects, and each subproject names the
//! `OWNERS` files (as raw GitHub URLs) that root its code. Only the fields
//! needed to find those roots are modelled; everything else is ignored.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::RegistryError;

/// Prefixes a group directory name may carry.
const GROUP_PREFIXES: &[&str] = &["sig-", "wg-", "committee-"];

/// A subproject owned by a group.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Subproject {
    #[serde(default)]
    pub name: String,
    /// URLs of the `OWNERS` files rooting this subproject.
    #[serde(default)]
    pub owners: Vec<String>,
}

/// A SIG, working group, user group or committee.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Group {
    /// Directory name, e.g. `sig-node`.
    #[serde(default)]
    pub dir: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subprojects: Vec<Subproject>,
}

/// Parsed contents of `sigs.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub sigs: Vec<Group>,
    #[serde(default)]
    pub workinggroups: Vec<Group>,
    #[serde(default)]
    pub usergroups: Vec<Group>,
    #[serde(default)]
    pub committees: Vec<Group>,
}

impl Registry {
    /// Load the registry from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading group registry");
        let contents = std::fs::read_to_string(path).map_err(|source| RegistryError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse registry YAML.
    pub fn parse(contents: &str) -> Result<Self, RegistryError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let registry: Registry = serde_yaml::from_str(contents)?;
        debug!(
            sigs = registry.sigs.len(),
            workinggroups = registry.workinggroups.len(),
            usergroups = registry.usergroups.len(),
            committees = registry.committees.len(),
            "parsed group registry"
        );
        Ok(registry)
    }

    fn groups(&self) -> impl Iterator<Item = &Group> {
        self.sigs
            .iter()
            .chain(&self.workinggroups)
            .chain(&self.usergroups)
            .chain(&self.committees)
    }

    /// All `OWNERS` URLs declared by the subprojects of `group`, in registry
    /// order.
    pub fn owners_roots(&self, group: &str) -> Result<Vec<String>, RegistryError> {
        let mut found = false;
        let mut roots = Vec::new();
        for g in self.groups().filter(|g| g.dir == group) {
            found = true;
            for subproject in &g.subprojects {
                roots.extend(subproject.owners.iter().cloned());
            }
        }
        if !found {
            return Err(RegistryError::GroupNotFound(group.to_string()));
        }
        debug!(group, count = roots.len(), "collected owners roots");
        Ok(roots)
    }
}

/// Check that a group name carries one of the recognized prefixes.
pub fn validate_group_name(group: &str) -> Result<(), RegistryError> {
    if GROUP_PREFIXES.iter().any(|p| group.starts_with(p)) {
        Ok(())
    } else {
        Err(RegistryError::InvalidGroupName(group.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
sigs:
  - dir: sig-node
    name: Node
    mission_statement: >
      Node things.
    subprojects:
      - name: kubelet
        owners:
          - https://raw.githubusercontent.com/kubernetes/kubernetes/master/pkg/kubelet/OWNERS
      - name: node-problem-detector
        owners:
          - https://raw.githubusercontent.com/kubernetes/node-problem-detector/master/OWNERS
  - dir: sig-docs
    name: Docs
workinggroups:
  - dir: wg-batch
    name: Batch
    subprojects:
      - name: kueue
        owners:
          - https://raw.githubusercontent.com/kubernetes-sigs/kueue/main/OWNERS
committees:
  - dir: committee-steering
    name: Steering
"#;

    #[test]
    fn test_owners_roots_for_sig() {
        let registry = Registry::parse(SAMPLE).unwrap();
        let roots = registry.owners_roots("sig-node").unwrap();
        assert_eq!(roots.len(), 2);
        assert!(roots[0].ends_with("pkg/kubelet/OWNERS"));
    }

    #[test]
    fn test_owners_roots_for_working_group() {
        let registry = Registry::parse(SAMPLE).unwrap();
        let roots = registry.owners_roots("wg-batch").unwrap();
        assert_eq!(roots.len(), 1);
    }

    #[test]
    fn test_group_without_subprojects_is_empty() {
        let registry = Registry::parse(SAMPLE).unwrap();
        assert!(registry.owners_roots("committee-steering").unwrap().is_empty());
        assert!(registry.owners_roots("sig-docs").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_group() {
        let registry = Registry::parse(SAMPLE).unwrap();
        assert!(matches!(
            registry.owners_roots("sig-nope"),
            Err(RegistryError::GroupNotFound(_))
        ));
    }

    #[test]
    fn test_malformed_registry() {
        let result = Registry::parse("sigs: [ this is: not: valid");
        assert!(matches!(result, Err(RegistryError::Malformed(_))));
    }

    #[test]
    fn test_validate_group_name() {
        assert!(validate_group_name("sig-node").is_ok());
        assert!(validate_group_name("wg-batch").is_ok());
        assert!(validate_group_name("committee-steering").is_ok());
        assert!(matches!(
            validate_group_name("node"),
            Err(RegistryError::InvalidGroupName(_))
        ));
        assert!(validate_group_name("ug-big-data").is_err());
    }
}
