//! Repository access: owners URL parsing, local checkouts, and the GitHub
//! users API.

pub mod client;
pub mod github;
pub mod remote_url;
pub mod workspace;

pub use client::GitClient;
pub use github::GitHubClient;
pub use remote_url::{OwnersUrl, RepoRef};
pub use workspace::Workspace;
