//! Alias resolution for a single entity name.
//!
//! Lookup order, first match wins:
//! 1. the repository's own alias table (`local`)
//! 2. the canonical repository's alias table (`fallback`)
//! 3. the name itself as a literal account, if it passes identity validation
//!
//! Alias tables always win over literal interpretation, and the external
//! identity check is only reached once both tables have missed.

use tracing::{debug, warn};

use crate::identity::{IdentityValidator, UserLookup, UserStatus};
use crate::owners::AliasTable;

/// Which alias table an entity was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasSource {
    Local,
    Fallback,
}

/// Result of resolving one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Expanded through an alias table. `members` may be empty.
    Alias {
        source: AliasSource,
        members: Vec<String>,
    },
    /// Not an alias; a validated account name.
    Literal(String),
    /// Neither an alias nor a valid account.
    Unresolved(UserStatus),
}

impl Resolution {
    /// Concrete account names this entity stands for.
    pub fn names(&self) -> &[String] {
        match self {
            Self::Alias { members, .. } => members,
            Self::Literal(name) => std::slice::from_ref(name),
            Self::Unresolved(_) => &[],
        }
    }

    pub fn matched_as_alias(&self) -> bool {
        matches!(self, Self::Alias { .. })
    }
}

/// The pair of alias tables in force for one repository.
#[derive(Debug, Clone, Copy)]
pub struct AliasResolver<'a> {
    local: &'a AliasTable,
    fallback: Option<&'a AliasTable>,
}

impl<'a> AliasResolver<'a> {
    pub fn new(local: &'a AliasTable, fallback: Option<&'a AliasTable>) -> Self {
        Self { local, fallback }
    }

    /// Resolve `entity`, consulting `validator` only when no alias matches.
    pub async fn resolve<L: UserLookup>(
        &self,
        entity: &str,
        validator: &mut IdentityValidator<L>,
    ) -> Resolution {
        if let Some(members) = self.local.get(entity) {
            debug!(entity, count = members.len(), "resolved via local aliases");
            return Resolution::Alias {
                source: AliasSource::Local,
                members: members.to_vec(),
            };
        }

        if let Some(members) = self.fallback.and_then(|table| table.get(entity)) {
            debug!(entity, count = members.len(), "resolved via fallback aliases");
            return Resolution::Alias {
                source: AliasSource::Fallback,
                members: members.to_vec(),
            };
        }

        match validator.status(entity).await {
            UserStatus::Exists => Resolution::Literal(entity.to_string()),
            status => {
                warn!(entity, ?status, "invalid entity");
                Resolution::Unresolved(status)
            }
        }
    }
}
