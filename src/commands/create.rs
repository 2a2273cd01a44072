//! Create a correctly named branch from the right base and push it.

use chrono::Local;

use crate::commands::ensure_clean;
use crate::config::Config;
use crate::domain::branch::{compact_date, is_valid_req_no, BranchKind};
use crate::domain::selector;
use crate::error::{FlowError, Result};
use crate::git::{branch_set, GitOps};
use crate::ui::{logger, Prompt};

struct CreatePlan {
    kind: BranchKind,
    base_branch: String,
    project: String,
    date: String,
    req_no: Option<String>,
}

fn resolve_plan<G: GitOps, P: Prompt>(
    git: &G,
    prompt: &P,
    config: &Config,
    forced_kind: Option<BranchKind>,
) -> Result<CreatePlan> {
    let original = git.current_branch()?;
    let names = branch_set(&git.list_all_branches()?, &config.remote);
    let latest_release = selector::latest_of_kind(&names, BranchKind::Release);
    let base_branch = latest_release
        .as_ref()
        .map(|release| release.name.clone())
        .unwrap_or_else(|| original.clone());

    logger::info(&format!("Current branch: {}", original));
    match &latest_release {
        Some(release) => logger::info(&format!("Base branch: {}", release.name)),
        None => logger::warn("No release branch found; the current branch will be used as base"),
    }

    let kind = match forced_kind {
        Some(kind) => kind,
        None => {
            let choices = [
                "Feature (feature work)",
                "Dev (test environment)",
                "Release (production)",
            ];
            match prompt.select_one("Branch type to create:", &choices)? {
                0 => BranchKind::Feature,
                1 => BranchKind::Dev,
                _ => BranchKind::Release,
            }
        }
    };

    let today = compact_date(Local::now().date_naive());
    let date = prompt.text_input(
        &format!("Date (YYYYMMDD, default {}):", today),
        Some(&today),
        &|value| {
            if value.len() != 8 || !value.chars().all(|c| c.is_ascii_digit()) {
                return Err("enter an 8-digit date".to_string());
            }
            if value < today.as_str() {
                return Err(format!("the date must be on or after {}", today));
            }
            Ok(())
        },
    )?;

    let mut project = latest_release
        .and_then(|release| release.project)
        .unwrap_or_default();
    if kind != BranchKind::Feature && project.is_empty() {
        project = prompt.text_input("Project name:", None, &|value| {
            if value.trim().is_empty() {
                Err("the project name must not be empty".to_string())
            } else {
                Ok(())
            }
        })?;
    }

    let req_no = if kind == BranchKind::Feature {
        Some(prompt.text_input(
            "Requirement number (e.g. QZ-8848):",
            None,
            &|value| {
                if is_valid_req_no(value) {
                    Ok(())
                } else {
                    Err("the requirement number must be QZ followed by 4-8 digits (e.g. QZ-8848)"
                        .to_string())
                }
            },
        )?)
    } else {
        None
    };

    Ok(CreatePlan {
        kind,
        base_branch,
        project,
        date,
        req_no,
    })
}

fn execute<G: GitOps, P: Prompt>(
    git: &G,
    prompt: &P,
    config: &Config,
    forced_kind: Option<BranchKind>,
) -> Result<()> {
    ensure_clean(git)?;
    logger::step("Fetching the latest branch list...");
    git.fetch_prune()?;
    logger::done();

    let original = git.current_branch()?;
    let plan = resolve_plan(git, prompt, config, forced_kind)?;

    let branch_name = match plan.kind {
        BranchKind::Feature => {
            let user = git.config_value("user.name")?.ok_or_else(|| {
                FlowError::precondition(
                    "No git user name available. Run `git config user.name` first.",
                )
            })?;
            format!(
                "feat/{}-{}-{}",
                user,
                plan.date,
                plan.req_no.as_deref().unwrap_or_default()
            )
        }
        kind => format!("{}-{}-{}", plan.project, kind.marker(), plan.date),
    };

    logger::step(&format!(
        "Creating {} from {}...",
        branch_name, plan.base_branch
    ));
    git.checkout_new(&branch_name, Some(&plan.base_branch))?;
    git.push(&branch_name)?;
    logger::done();

    if plan.kind == BranchKind::Feature {
        logger::success(&format!(
            "Branch {} created, pushed to the remote, and checked out",
            branch_name
        ));
    } else {
        logger::success(&format!(
            "Branch {} created and pushed to the remote",
            branch_name
        ));
        if original != git.current_branch()? {
            logger::dim(&format!("Switching back to {}...", original));
            git.checkout(&original)?;
        }
    }

    Ok(())
}

/// Run the create workflow. A forced kind skips the type selection; the
/// merge workflow uses this to create its missing target.
pub fn run<G: GitOps, P: Prompt>(
    git: &G,
    prompt: &P,
    config: &Config,
    forced_kind: Option<BranchKind>,
) {
    logger::header("Create branch");
    if let Err(err) = execute(git, prompt, config, forced_kind) {
        logger::error(&err.to_string());
    }
    logger::footer();
}
