//! Identity validation: deciding whether a literal name in an `OWNERS` file
//! is a real GitHub account.
//!
//! The lookup order mirrors the rest of the crate: the per-run cache first,
//! then the external [`UserLookup`] (normally [`crate::git::GitHubClient`]).

pub mod validator;

pub use validator::{IdentityValidator, UserLookup, UserStatus};

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::UserLookup;
    use crate::errors::GitHubError;

    /// In-memory lookup with a fixed set of existing accounts.
    #[derive(Default)]
    pub struct StaticLookup {
        existing: HashSet<String>,
        failing: HashSet<String>,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl StaticLookup {
        pub fn new<I, S>(existing: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                existing: existing.into_iter().map(Into::into).collect(),
                ..Default::default()
            }
        }

        /// Names whose check errors out instead of answering.
        pub fn failing<I, S>(mut self, names: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.failing = names.into_iter().map(Into::into).collect();
            self
        }

        pub fn calls(&self, login: &str) -> usize {
            self.calls.lock().unwrap().get(login).copied().unwrap_or(0)
        }

        pub fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().values().sum()
        }
    }

    #[async_trait]
    impl UserLookup for StaticLookup {
        async fn user_exists(&self, login: &str) -> Result<bool, GitHubError> {
            *self.calls.lock().unwrap().entry(login.to_string()).or_default() += 1;
            if self.failing.contains(login) {
                return Err(GitHubError::ApiError {
                    status: 503,
                    body: "HTTP 503".into(),
                });
            }
            Ok(self.existing.contains(login))
        }
    }
}
