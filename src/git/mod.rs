//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the porcelain git
//! operations branchflow needs, allowing for multiple implementations
//! including real repositories and a scripted mock for testing.
//!
//! The primary abstraction is the [GitOps] trait. Concrete implementations:
//!
//! - [repository::Git2Repository]: the real implementation using `git2`
//! - [mock::MockGit]: a scripted in-memory implementation for tests
//!
//! Workflow code should depend on the trait rather than a concrete
//! implementation. All operations are synchronous and strictly sequential;
//! the tool assumes exclusive interactive use of one working directory, so
//! no implementor needs internal locking.

pub mod mock;
pub mod repository;

pub use mock::MockGit;
pub use repository::Git2Repository;

use crate::error::Result;

/// A configured remote and where it fetches from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteInfo {
    pub name: String,
    pub fetch_url: Option<String>,
}

/// Porcelain git operations consumed by the workflows.
///
/// Implementations are constructed once per command invocation with the
/// remote they talk to; operations that touch the remote (`fetch_prune`,
/// `push`, `pull`) use that remote implicitly.
pub trait GitOps {
    /// Whether the working tree has no uncommitted or untracked changes.
    fn is_clean(&self) -> Result<bool>;

    /// Look up a git configuration value; `None` when the key is unset.
    fn config_value(&self, key: &str) -> Result<Option<String>>;

    /// Fetch all branch heads from the remote, pruning deleted refs.
    fn fetch_prune(&self) -> Result<()>;

    /// The branch HEAD currently points at.
    fn current_branch(&self) -> Result<String>;

    /// Check out an existing local branch.
    fn checkout(&self, branch: &str) -> Result<()>;

    /// Create a local branch and check it out. With a start ref the branch
    /// begins there (tracking it when the ref is remote); without one it
    /// begins at the current HEAD.
    fn checkout_new(&self, branch: &str, start_ref: Option<&str>) -> Result<()>;

    /// Merge `source` into the currently checked-out branch. Fails with a
    /// conflict error naming both branches when the merge cannot complete;
    /// the conflicted state is left in place for manual resolution.
    fn merge(&self, source: &str) -> Result<()>;

    /// Push a local branch to the remote and set its upstream.
    fn push(&self, branch: &str) -> Result<()>;

    /// Pull the remote counterpart of `branch` into the current checkout.
    /// Fails with a remote-absence error when the branch has no remote
    /// counterpart.
    fn pull(&self, branch: &str) -> Result<()>;

    /// All branch names, local and remote-tracking (`<remote>/<name>` form).
    fn list_all_branches(&self) -> Result<Vec<String>>;

    /// Number of commits reachable from `tip` but not from `base`
    /// (`base..tip`).
    fn rev_list_count(&self, base: &str, tip: &str) -> Result<usize>;

    /// All configured remotes with their fetch URLs.
    fn list_remotes(&self) -> Result<Vec<RemoteInfo>>;
}

/// Derive the deduplicated branch set used by selection queries: every
/// local and remote-tracking name with the `<remote>/` prefix stripped.
/// First-occurrence order is preserved.
pub fn branch_set(names: &[String], remote: &str) -> Vec<String> {
    let prefix = format!("{}/", remote);
    let mut seen = std::collections::HashSet::new();
    let mut set = Vec::new();
    for name in names {
        let stripped = name.strip_prefix(&prefix).unwrap_or(name);
        if seen.insert(stripped.to_string()) {
            set.push(stripped.to_string());
        }
    }
    set
}
