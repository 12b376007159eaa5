//! Ownership declarations (`OWNERS`) and alias tables (`OWNERS_ALIASES`):
//! their file shapes and where to find them in a checkout.

pub mod discovery;
pub mod files;

pub use discovery::{find_local_aliases, find_owners_files};
pub use files::{AliasTable, OwnersFile};
