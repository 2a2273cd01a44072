//! Merge-synchronization planning.
//!
//! Before a feature branch is merged into its target, the target and the
//! feature are each brought up to date with the release baseline they
//! descend from. Folding the base forward first keeps the final
//! feature→target merge free of conflicts that would only reflect stale
//! ancestry rather than real code divergence.

use crate::domain::BranchDescriptor;
use crate::error::{FlowError, Result};
use crate::git::GitOps;
use crate::ui::logger;

/// Decides merge order and direction for a target branch, its release
/// base, and the originating feature branch.
pub struct SyncPlanner<'a, G: GitOps> {
    git: &'a G,
    remote: &'a str,
}

impl<'a, G: GitOps> SyncPlanner<'a, G> {
    pub fn new(git: &'a G, remote: &'a str) -> Self {
        SyncPlanner { git, remote }
    }

    /// Bring the local copy of `branch` up to date with its remote
    /// counterpart. A branch that exists only remotely is checked out as
    /// a new local tracking branch; one that exists in neither place is a
    /// remote-absence error.
    pub fn pull_branch(&self, branch: &str) -> Result<()> {
        let all = self.git.list_all_branches()?;
        let tracking = format!("{}/{}", self.remote, branch);

        if all.iter().any(|b| b == branch) {
            logger::dim(&format!("Updating local branch {}...", branch));
            self.git.checkout(branch)?;
            self.git.pull(branch)
        } else if all.iter().any(|b| b == &tracking) {
            logger::dim(&format!("Checking out {} from the remote...", branch));
            self.git.checkout_new(branch, Some(&tracking))
        } else {
            Err(FlowError::remote_missing(branch))
        }
    }

    /// Whether `branch` is behind `other`: `other` has commits `branch`
    /// does not.
    pub fn is_behind(&self, branch: &str, other: &str) -> Result<bool> {
        Ok(self.git.rev_list_count(branch, other)? > 0)
    }

    /// Pull the involved branches, then fold the base forward into the
    /// target and the feature wherever they lag behind it. The final
    /// feature→target merge is left to the caller. A failing merge aborts
    /// immediately; nothing is rolled back.
    pub fn prepare(
        &self,
        target: &BranchDescriptor,
        base: Option<&BranchDescriptor>,
        feature: &str,
    ) -> Result<()> {
        logger::step("Syncing remote state...");
        self.pull_branch(&target.name)?;
        if let Some(base) = base {
            self.pull_branch(&base.name)?;
            self.pull_branch(feature)?;
        }
        logger::done();

        let base = match base {
            Some(base) => base,
            None => return Ok(()),
        };

        if self.is_behind(&target.name, &base.name)? {
            logger::step(&format!(
                "Syncing base {} -> {}...",
                base.name, target.name
            ));
            self.git.checkout(&target.name)?;
            self.git.merge(&base.name)?;
            self.git.push(&target.name)?;
            logger::done();
        } else {
            logger::dim(&format!(
                "{} already contains every commit of {}, skipping",
                target.name, base.name
            ));
        }

        if self.is_behind(feature, &base.name)? {
            logger::step(&format!(
                "{} is behind {}, syncing...",
                feature, base.name
            ));
            self.git.checkout(feature)?;
            self.git.merge(&base.name)?;
            self.git.push(feature)?;
            logger::done();
        }

        Ok(())
    }
}
