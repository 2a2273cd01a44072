//! Merge the current feature branch into the nearest dev or release
//! branch, pre-syncing lagging ancestors first.

use chrono::Local;

use crate::commands::{create, ensure_clean};
use crate::config::Config;
use crate::domain::branch::{parse_branch, BranchDescriptor, BranchKind};
use crate::domain::selector;
use crate::error::{FlowError, Result};
use crate::git::{branch_set, GitOps};
use crate::planner::SyncPlanner;
use crate::ui::{logger, Prompt};

fn resolve_target_kind(arg: &str) -> Result<BranchKind> {
    match arg {
        "dev" => Ok(BranchKind::Dev),
        "release" => Ok(BranchKind::Release),
        _ => Err(FlowError::resolution(
            "Invalid argument: specify the merge target (dev or release).",
        )),
    }
}

/// Locate the closest upcoming target branch, offering to create one when
/// none exists yet.
fn ensure_target<G: GitOps, P: Prompt>(
    git: &G,
    prompt: &P,
    config: &Config,
    kind: BranchKind,
) -> Result<BranchDescriptor> {
    git.fetch_prune()?;
    let today = Local::now().date_naive();
    let names = branch_set(&git.list_all_branches()?, &config.remote);
    let mut target = selector::closest_upcoming(&names, kind, today);

    if target.is_none() {
        logger::warn(&format!(
            "No usable {} branch found (it must be dated today or later).",
            kind.marker()
        ));
        let should_create =
            prompt.confirm(&format!("Create a new {} branch now?", kind.marker()), true)?;

        if should_create {
            create::run(git, prompt, config, Some(kind));
            git.fetch_prune()?;
            let names = branch_set(&git.list_all_branches()?, &config.remote);
            target = selector::closest_upcoming(&names, kind, today);
        }
    }

    target.ok_or_else(|| {
        FlowError::resolution(format!(
            "Aborting: no valid {} target branch could be located.",
            kind.marker()
        ))
    })
}

fn execute<G: GitOps, P: Prompt>(
    git: &G,
    prompt: &P,
    config: &Config,
    target_arg: &str,
    original: &str,
) -> Result<()> {
    ensure_clean(git)?;
    logger::header("Merge branch");
    logger::step("Fetching the latest branch list...");
    git.fetch_prune()?;
    logger::done();

    if !matches!(
        parse_branch(original).map(|b| b.kind),
        Some(BranchKind::Feature)
    ) {
        return Err(FlowError::precondition(
            "Forbidden: switch to a feature branch before merging.",
        ));
    }

    let target_kind = resolve_target_kind(target_arg)?;
    logger::info(&format!("Current branch: {}", original));

    let target = ensure_target(git, prompt, config, target_kind)?;
    let names = branch_set(&git.list_all_branches()?, &config.remote);
    let base = match target_kind {
        BranchKind::Dev => selector::latest_of_kind(&names, BranchKind::Release),
        _ => selector::previous_of_kind(&names, BranchKind::Release),
    };

    match &base {
        Some(base) => logger::info(&format!("Target: {} (base: {})", target.name, base.name)),
        None => logger::info(&format!("Target: {}", target.name)),
    }

    if target_kind == BranchKind::Release {
        let confirmed = prompt.confirm(
            &format!(
                "Really merge this feature branch into production {}?",
                target.name
            ),
            false,
        )?;
        if !confirmed {
            logger::dim("Operation cancelled.");
            return Ok(());
        }
    }

    let planner = SyncPlanner::new(git, &config.remote);
    planner.prepare(&target, base.as_ref(), original)?;

    logger::step(&format!("Merging the feature into {}...", target.name));
    git.checkout(&target.name)?;
    git.merge(original)?;
    logger::done();

    logger::step("Pushing to the remote...");
    git.push(&target.name)?;
    logger::done();

    git.checkout(original)?;
    logger::success(&format!(
        "Done! The feature branch is merged into {} and pushed to {}.",
        target.name, config.remote
    ));
    logger::dim(&format!("Switched back to {}", original));

    Ok(())
}

/// Run the merge workflow against the target named by the CLI argument.
pub fn run<G: GitOps, P: Prompt>(git: &G, prompt: &P, config: &Config, target_arg: &str) {
    let original = match git.current_branch() {
        Ok(branch) => branch,
        Err(err) => {
            logger::error(&err.to_string());
            return;
        }
    };

    if let Err(err) = execute(git, prompt, config, target_arg, &original) {
        logger::error(&err.to_string());
        if let Ok(now) = git.current_branch() {
            if now != original {
                logger::warn(&format!(
                    "The flow stopped midway. Resolve the problem manually, then switch back to {}.",
                    original
                ));
            }
        }
    }
    logger::footer();
}
