//! Error types for the ownerscount core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.
//!
//! Only configuration and registry errors are fatal to a run. Everything
//! else is contained by the counter to the repository, file or entity it
//! affects and reported through `tracing`.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Owners(#[from] OwnersError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error("required environment variable '{var}' is not set (referenced by config field '{field}')")]
    EnvVarMissing { var: String, field: String },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

/// Errors from reading the group registry (`sigs.yaml`).
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry file could not be read.
    #[error("cannot read group registry '{path}': {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The registry is not valid YAML for the expected shape.
    #[error("malformed group registry: {0}")]
    Malformed(#[from] serde_yaml::Error),

    /// The group name does not carry a recognized prefix.
    #[error("invalid group name '{0}': expected a sig-, wg- or committee- prefix (e.g. sig-xy-z)")]
    InvalidGroupName(String),

    /// No group with the given directory name exists in the registry.
    #[error("group '{0}' not found in registry")]
    GroupNotFound(String),
}

// ---------------------------------------------------------------------------
// GitHub API errors
// ---------------------------------------------------------------------------

/// Errors from GitHub REST API interactions.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("GitHub HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("GitHub API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    /// Authentication token is missing or invalid.
    #[error("GitHub authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit exceeded.
    #[error("GitHub rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    /// The configured API URL cannot carry request paths.
    #[error("invalid GitHub API URL '{url}': {detail}")]
    InvalidApiUrl { url: String, detail: String },
}

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from cloning and locating repository checkouts.
#[derive(Debug, Error)]
pub enum GitError {
    /// A `git2` library error.
    #[error("git2 error: {0}")]
    Git2Error(#[from] git2::Error),

    /// The owners URL does not point into a GitHub repository.
    #[error("unrecognized owners URL: {0}")]
    UnrecognizedUrl(String),

    /// The workspace holds no checkout of the repository.
    #[error("no checkout of {0}")]
    CheckoutMissing(String),

    /// A clone into the workspace failed.
    #[error("failed to clone '{url}': {detail}")]
    CloneFailed { url: String, detail: String },

    /// Generic I/O wrapper.
    #[error("git I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// OWNERS / OWNERS_ALIASES errors
// ---------------------------------------------------------------------------

/// Errors from discovering and parsing ownership and alias files.
#[derive(Debug, Error)]
pub enum OwnersError {
    /// The file could not be read.
    #[error("cannot read '{path}': {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML for the expected shape.
    #[error("cannot parse '{path}': {detail}")]
    ParseError { path: String, detail: String },

    /// The declared root directory does not exist inside the checkout.
    #[error("declared root '{0}' not found")]
    RootNotFound(String),

    /// An entry beneath the declared root could not be read; the walk
    /// skips it.
    #[error("directory walk failed under '{path}': {detail}")]
    WalkFailed { path: String, detail: String },
}
