//! Merge the latest release baseline into the current feature branch.

use crate::commands::ensure_clean;
use crate::config::Config;
use crate::domain::branch::{parse_branch, BranchKind};
use crate::domain::selector;
use crate::error::{FlowError, Result};
use crate::git::{branch_set, GitOps};
use crate::planner::SyncPlanner;
use crate::ui::logger;

fn execute<G: GitOps>(git: &G, config: &Config, current: &str) -> Result<()> {
    ensure_clean(git)?;
    logger::header("Sync base branch");
    logger::step("Fetching the latest branch list...");
    git.fetch_prune()?;
    logger::done();

    if !matches!(
        parse_branch(current).map(|b| b.kind),
        Some(BranchKind::Feature)
    ) {
        return Err(FlowError::precondition(
            "Forbidden: switch to a feature branch before syncing.",
        ));
    }
    logger::info(&format!("Current branch: {}", current));

    let names = branch_set(&git.list_all_branches()?, &config.remote);
    let base = selector::latest_of_kind(&names, BranchKind::Release)
        .ok_or_else(|| FlowError::resolution("No release base branch found."))?;
    logger::info(&format!("Base branch: {}", base.name));

    let planner = SyncPlanner::new(git, &config.remote);
    logger::step("Pulling remote changes...");
    planner.pull_branch(&base.name)?;
    planner.pull_branch(current)?;
    logger::done();

    if !planner.is_behind(current, &base.name)? {
        logger::success(&format!(
            "{} already contains every commit of {}; nothing to sync.",
            current, base.name
        ));
        return Ok(());
    }

    logger::step(&format!("Merging {} -> {}...", base.name, current));
    git.checkout(current)?;
    git.merge(&base.name)?;
    logger::done();

    logger::step("Pushing to the remote...");
    git.push(current)?;
    logger::done();

    logger::success(&format!(
        "Done! {} is merged into {} and pushed to {}.",
        base.name, current, config.remote
    ));
    Ok(())
}

/// Run the sync workflow for the currently checked-out feature branch.
pub fn run<G: GitOps>(git: &G, config: &Config) {
    let current = match git.current_branch() {
        Ok(branch) => branch,
        Err(err) => {
            logger::error(&err.to_string());
            return;
        }
    };

    if let Err(err) = execute(git, config, &current) {
        logger::error(&err.to_string());
        if let Ok(now) = git.current_branch() {
            if now != current {
                logger::warn(&format!(
                    "The flow stopped midway. Resolve the problem manually, then switch back to {}.",
                    current
                ));
            }
        }
    }
    logger::footer();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::branch::compact_date;
    use crate::git::MockGit;
    use chrono::Local;

    fn feature_name() -> String {
        let today = compact_date(Local::now().date_naive());
        format!("feat/alice-{}-QZ-1234", today)
    }

    fn setup_with_release() -> (MockGit, String, String) {
        let git = MockGit::new();
        let feature = feature_name();
        let release = "myProject-RELEASE-20990101".to_string();
        git.set_branches(&[
            "main",
            "origin/main",
            &feature,
            &format!("origin/{}", feature),
            &release,
            &format!("origin/{}", release),
        ]);
        git.set_current(&feature);
        (git, feature, release)
    }

    #[test]
    fn test_sync_refuses_non_feature_branch() {
        let git = MockGit::new();
        run(&git, &Config::default());
        assert!(git.mutating_calls().is_empty());
    }

    #[test]
    fn test_sync_requires_a_release_base() {
        let git = MockGit::new();
        let feature = feature_name();
        git.set_branches(&["main", "origin/main", &feature, &format!("origin/{}", feature)]);
        git.set_current(&feature);

        run(&git, &Config::default());

        assert!(!git.calls().iter().any(|c| c.starts_with("merge")));
    }

    #[test]
    fn test_sync_merges_and_pushes_when_behind() {
        let (git, feature, release) = setup_with_release();
        git.set_behind(&feature, &release, 3);

        run(&git, &Config::default());

        let calls = git.calls();
        assert!(calls.contains(&format!("merge {}", release)));
        assert!(calls.contains(&format!("push {}", feature)));
    }

    #[test]
    fn test_sync_is_idempotent_when_up_to_date() {
        let (git, feature, release) = setup_with_release();
        git.set_behind(&feature, &release, 1);

        run(&git, &Config::default());
        let first_mutations = git.mutating_calls().len();

        run(&git, &Config::default());
        let second = git.mutating_calls();
        // the second run only pulls (checkout during pull); no merge/push
        assert!(second.len() > first_mutations);
        assert!(!second[first_mutations..]
            .iter()
            .any(|c| c.starts_with("merge") || c.starts_with("push")));
    }
}
