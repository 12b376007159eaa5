//! The membership-counting engine: alias resolution for single entities and
//! the aggregation of whole declarations into reviewer/approver sets.

pub mod aggregator;
pub mod resolver;

pub use aggregator::{Membership, MembershipAggregator, Role, UnresolvedEntity};
pub use resolver::{AliasResolver, AliasSource, Resolution};
