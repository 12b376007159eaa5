//! TOML-based configuration for ownerscount.
//!
//! Every section has defaults, so a run without a config file behaves like
//! the stock Kubernetes setup. The GitHub token is stored as a `token_env`
//! field naming an environment variable; the secret itself is resolved at
//! runtime via [`AppConfig::resolve_env_vars`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;
use crate::git::RepoRef;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// GitHub API and clone settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Location of the group registry.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Repository handling (canonical repo, clone depth).
    #[serde(default)]
    pub repos: ReposConfig,

    /// OWNERS discovery settings.
    #[serde(default)]
    pub owners: OwnersConfig,

    /// Output / logging settings.
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

/// GitHub API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API base URL (default `https://api.github.com`).
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Explicit base URL for clones. Derived from `api_url` when unset.
    #[serde(default)]
    pub git_base_url: Option<String>,

    /// Environment variable holding the GitHub personal access token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Per-request timeout for identity checks.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Resolved token (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub token: Option<String>,
}

fn default_github_api_url() -> String {
    "https://api.github.com".into()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            git_base_url: None,
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
            token: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Group registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Path to `sigs.yaml`.
    #[serde(default = "default_registry_path")]
    pub path: PathBuf,
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("sigs.yaml")
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
        }
    }
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

/// Repository handling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReposConfig {
    /// Repository (`org/repo`) whose `OWNERS_ALIASES` is the fallback alias
    /// table for every other repository.
    #[serde(default = "default_canonical")]
    pub canonical: String,

    /// Clone the canonical repository even when the group owns nothing in
    /// it, so its aliases are available as a fallback.
    #[serde(default = "default_true")]
    pub fetch_canonical: bool,

    /// History depth for clones.
    #[serde(default = "default_clone_depth")]
    pub clone_depth: u32,
}

fn default_canonical() -> String {
    "kubernetes/kubernetes".into()
}
fn default_true() -> bool {
    true
}
fn default_clone_depth() -> u32 {
    1
}

impl Default for ReposConfig {
    fn default() -> Self {
        Self {
            canonical: default_canonical(),
            fetch_canonical: true,
            clone_depth: default_clone_depth(),
        }
    }
}

// ---------------------------------------------------------------------------
// OWNERS discovery
// ---------------------------------------------------------------------------

/// OWNERS discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnersConfig {
    /// File name of ownership declarations.
    #[serde(default = "default_owners_file")]
    pub owners_file: String,

    /// File name of alias tables.
    #[serde(default = "default_aliases_file")]
    pub aliases_file: String,

    /// Glob patterns (relative to the repository root) excluded from the walk.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

fn default_owners_file() -> String {
    "OWNERS".into()
}
fn default_aliases_file() -> String {
    "OWNERS_ALIASES".into()
}
fn default_exclude() -> Vec<String> {
    vec!["vendor/**".into(), "**/vendor/**".into()]
}

impl Default for OwnersConfig {
    fn default() -> Self {
        Self {
            owners_file: default_owners_file(),
            aliases_file: default_aliases_file(),
            exclude: default_exclude(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_file(path)
        } else {
            debug!(path = %path.display(), "no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Resolve `token_env` from the environment. A missing variable is only
    /// logged here; use [`require_token`](Self::require_token) where the
    /// token is mandatory.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        self.github.token = resolve_optional_env(&self.github.token_env, "github.token_env");
        Ok(())
    }

    /// Return the resolved GitHub token, or fail if it is absent.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.github
            .token
            .as_deref()
            .ok_or_else(|| ConfigError::EnvVarMissing {
                var: self.github.token_env.clone(),
                field: "github.token_env".into(),
            })
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.github.api_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "github.api_url".into(),
                detail: "API URL must not be empty".into(),
            });
        }
        if self.github.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "github.timeout_secs".into(),
                detail: "timeout must be > 0".into(),
            });
        }
        if RepoRef::from_slug(&self.repos.canonical).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "repos.canonical".into(),
                detail: "canonical repo must be in 'org/repo' format".into(),
            });
        }
        if self.repos.clone_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "repos.clone_depth".into(),
                detail: "clone depth must be > 0".into(),
            });
        }
        if self.owners.owners_file.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "owners.owners_file".into(),
                detail: "file name must not be empty".into(),
            });
        }
        if self.owners.aliases_file.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "owners.aliases_file".into(),
                detail: "file name must not be empty".into(),
            });
        }

        Ok(())
    }

    /// Convenience: load (or default), resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_or_default(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
