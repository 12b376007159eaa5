//! ownerscount core library.
//!
//! Counts the distinct reviewers and approvers of a project group (SIG,
//! working group or committee) by walking the `OWNERS` files under the
//! group's registered roots, expanding `OWNERS_ALIASES` entries, and
//! validating literal names against the GitHub users API.

pub mod config;
pub mod counter;
pub mod errors;
pub mod git;
pub mod identity;
pub mod owners;
pub mod registry;
pub mod resolve;

// Re-exports for convenience.
pub use config::AppConfig;
pub use errors::CoreError;
pub use counter::{CountReport, OwnersCounter};
pub use identity::IdentityValidator;
pub use registry::Registry;
pub use resolve::{AliasResolver, Membership, MembershipAggregator};
