//! Folding ownership declarations into the run's reviewer and approver sets.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::resolver::{AliasResolver, Resolution};
use crate::identity::{IdentityValidator, UserLookup, UserStatus};
use crate::owners::OwnersFile;

/// The list an entity appeared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Reviewer,
    Approver,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reviewer => write!(f, "reviewer"),
            Self::Approver => write!(f, "approver"),
        }
    }
}

/// An entity that matched no alias and failed identity validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedEntity {
    pub entity: String,
    /// Role of the first sighting.
    pub role: Role,
    pub reason: String,
}

/// Deduplicated reviewer and approver accounts, plus diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Membership {
    pub reviewers: BTreeSet<String>,
    pub approvers: BTreeSet<String>,
    pub unresolved: Vec<UnresolvedEntity>,
}

impl Membership {
    pub fn reviewer_count(&self) -> usize {
        self.reviewers.len()
    }

    pub fn approver_count(&self) -> usize {
        self.approvers.len()
    }
}

/// Running membership sets for one run. Feeding the same declaration twice
/// leaves the sets unchanged.
#[derive(Debug, Default)]
pub struct MembershipAggregator {
    membership: Membership,
}

impl MembershipAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve and fold every declaration using one repository's alias
    /// tables.
    pub async fn aggregate<L: UserLookup>(
        &mut self,
        declarations: &[OwnersFile],
        resolver: &AliasResolver<'_>,
        validator: &mut IdentityValidator<L>,
    ) {
        for declaration in declarations {
            self.add_declaration(declaration, resolver, validator).await;
        }
    }

    /// Resolve and fold a single declaration.
    pub async fn add_declaration<L: UserLookup>(
        &mut self,
        declaration: &OwnersFile,
        resolver: &AliasResolver<'_>,
        validator: &mut IdentityValidator<L>,
    ) {
        for entity in declaration.counted_reviewers() {
            let resolution = resolver.resolve(&entity, validator).await;
            self.record(&entity, Role::Reviewer, resolution);
        }
        for entity in &declaration.approvers {
            let resolution = resolver.resolve(entity, validator).await;
            self.record(entity, Role::Approver, resolution);
        }
        debug!(
            reviewers = self.membership.reviewers.len(),
            approvers = self.membership.approvers.len(),
            "folded declaration"
        );
    }

    fn record(&mut self, entity: &str, role: Role, resolution: Resolution) {
        if let Resolution::Unresolved(status) = &resolution {
            self.note_unresolved(entity, role, status);
            return;
        }
        let set = match role {
            Role::Reviewer => &mut self.membership.reviewers,
            Role::Approver => &mut self.membership.approvers,
        };
        set.extend(resolution.names().iter().cloned());
    }

    fn note_unresolved(&mut self, entity: &str, role: Role, status: &UserStatus) {
        if self.membership.unresolved.iter().any(|u| u.entity == entity) {
            return;
        }
        let reason = match status {
            UserStatus::CheckFailed(detail) => format!("identity check failed: {}", detail),
            _ => "no alias and no such account".to_string(),
        };
        self.membership.unresolved.push(UnresolvedEntity {
            entity: entity.to_string(),
            role,
            reason,
        });
    }

    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    pub fn into_membership(self) -> Membership {
        self.membership
    }
}
