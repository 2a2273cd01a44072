// tests/integration_test.rs
//
// End-to-end tests against throwaway repositories: a bare "remote" plus a
// local working clone, driven through the real Git2Repository and
// scripted prompts.

use std::env;
use std::path::Path;
use std::process::Command;

use chrono::{Duration, Local};
use git2::{BranchType, Repository};
use serial_test::serial;
use tempfile::TempDir;

use branchflow::commands;
use branchflow::config::Config;
use branchflow::domain::branch::compact_date;
use branchflow::git::{Git2Repository, GitOps};
use branchflow::planner::SyncPlanner;
use branchflow::ui::ScriptedPrompt;

struct TestRepos {
    remote_dir: TempDir,
    local_dir: TempDir,
    git: Git2Repository,
}

fn setup() -> TestRepos {
    let remote_dir = TempDir::new().expect("Could not create remote dir");
    let local_dir = TempDir::new().expect("Could not create local dir");

    Repository::init_bare(remote_dir.path()).expect("Could not init bare remote");
    let repo = Repository::init(local_dir.path()).expect("Could not init local repo");

    {
        let mut config = repo.config().expect("Could not get config");
        config.set_str("user.name", "alice").unwrap();
        config.set_str("user.email", "alice@example.com").unwrap();
    }

    repo.remote("origin", remote_dir.path().to_str().unwrap())
        .expect("Could not add remote");

    // Initial commit, pinned to a branch literally named "main" regardless
    // of the init default.
    {
        let signature = repo.signature().unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        repo.commit(Some("HEAD"), &signature, &signature, "init", &tree, &[])
            .unwrap();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        if repo.find_branch("main", BranchType::Local).is_err() {
            repo.branch("main", &head, false).unwrap();
        }
        repo.set_head("refs/heads/main").unwrap();
    }
    drop(repo);

    let git = Git2Repository::open_at(local_dir.path(), "origin").unwrap();
    git.push("main").unwrap();

    TestRepos {
        remote_dir,
        local_dir,
        git,
    }
}

fn commit_file(repo_path: &Path, name: &str, content: &str, message: &str) {
    let repo = Repository::open(repo_path).unwrap();
    std::fs::write(repo_path.join(name), content).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let signature = repo.signature().unwrap();
    let parent = repo.head().unwrap().peel_to_commit().unwrap();
    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &[&parent])
        .unwrap();
}

/// Feature branch off main with one commit, pushed, left checked out.
fn create_feature_branch(t: &TestRepos) -> String {
    let today = compact_date(Local::now().date_naive());
    let name = format!("feat/alice-{}-QZ-3306", today);
    t.git.checkout_new(&name, Some("main")).unwrap();
    t.git.push(&name).unwrap();
    commit_file(
        t.local_dir.path(),
        "a.txt",
        "test file",
        "feat: create test file",
    );
    t.git.push(&name).unwrap();
    name
}

/// Dev branch off main, dated two days out, with one commit, pushed;
/// leaves the checkout back on main.
fn create_dev_branch(t: &TestRepos) -> String {
    let date = compact_date(Local::now().date_naive() + Duration::days(2));
    let name = format!("myProject-DEV-{}", date);
    t.git.checkout_new(&name, Some("main")).unwrap();
    t.git.push(&name).unwrap();
    commit_file(
        t.local_dir.path(),
        "b.txt",
        "test file b",
        "feat: add test file b",
    );
    t.git.push(&name).unwrap();
    t.git.checkout("main").unwrap();
    name
}

/// Release branch off main, dated two days out, with one commit, pushed;
/// leaves the checkout back on main.
fn create_release_branch(t: &TestRepos) -> String {
    let date = compact_date(Local::now().date_naive() + Duration::days(2));
    let name = format!("myProject-RELEASE-{}", date);
    t.git.checkout_new(&name, Some("main")).unwrap();
    t.git.push(&name).unwrap();
    commit_file(
        t.local_dir.path(),
        "c.txt",
        "release file",
        "feat: add release file",
    );
    t.git.push(&name).unwrap();
    t.git.checkout("main").unwrap();
    name
}

fn tip_oid(repo_path: &Path, rev: &str) -> git2::Oid {
    let repo = Repository::open(repo_path).unwrap();
    let id = repo
        .revparse_single(rev)
        .unwrap()
        .peel_to_commit()
        .unwrap()
        .id();
    id
}

/// `ancestor` is contained in `tip`'s history (or is `tip` itself).
fn contains(repo_path: &Path, tip: &str, ancestor: &str) -> bool {
    let repo = Repository::open(repo_path).unwrap();
    let tip_id = tip_oid(repo_path, tip);
    let ancestor_id = tip_oid(repo_path, ancestor);
    repo.merge_base(tip_id, ancestor_id).unwrap() == ancestor_id
}

fn remote_branch_names(t: &TestRepos) -> Vec<String> {
    let repo = Repository::open(t.remote_dir.path()).unwrap();
    let mut names: Vec<String> = repo
        .branches(Some(BranchType::Local))
        .unwrap()
        .map(|entry| entry.unwrap().0.name().unwrap().unwrap().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_merge_to_dev_creates_missing_dev_branch() {
    let t = setup();
    let feature = create_feature_branch(&t);
    let dev_date = compact_date(Local::now().date_naive() + Duration::days(2));
    let dev_name = format!("myProject-DEV-{}", dev_date);

    let prompt = ScriptedPrompt::new();
    prompt.push_confirm(true); // create the missing dev branch
    prompt.push_input(dev_date.as_str()); // date for the new branch
    prompt.push_input("myProject"); // no release to inherit a project from

    commands::merge::run(&t.git, &prompt, &Config::default(), "dev");

    // the dev branch exists on the remote
    assert!(remote_branch_names(&t).contains(&dev_name));
    // and contains the feature branch's commit in its ancestry
    assert!(contains(t.local_dir.path(), &dev_name, &feature));
    // the flow returned to the feature branch
    assert_eq!(t.git.current_branch().unwrap(), feature);
}

#[test]
fn test_merge_to_existing_dev_branch() {
    let t = setup();
    let dev = create_dev_branch(&t);
    let feature = create_feature_branch(&t);

    let prompt = ScriptedPrompt::new();
    commands::merge::run(&t.git, &prompt, &Config::default(), "dev");

    assert!(contains(t.local_dir.path(), &dev, &feature));
    assert_eq!(t.git.current_branch().unwrap(), feature);
    // the merged result was pushed
    let repo = Repository::open(t.remote_dir.path()).unwrap();
    let remote_tip = repo
        .revparse_single(&dev)
        .unwrap()
        .peel_to_commit()
        .unwrap()
        .id();
    assert_eq!(remote_tip, tip_oid(t.local_dir.path(), &dev));
}

#[test]
fn test_merge_to_release_declined_leaves_remote_unchanged() {
    let t = setup();
    create_release_branch(&t);
    let feature = create_feature_branch(&t);
    let before = remote_branch_names(&t);

    let prompt = ScriptedPrompt::new();
    prompt.push_confirm(false); // decline the production merge

    commands::merge::run(&t.git, &prompt, &Config::default(), "release");

    assert_eq!(remote_branch_names(&t), before);
    assert_eq!(t.git.current_branch().unwrap(), feature);
}

#[test]
fn test_sync_is_idempotent() {
    let t = setup();
    let release = create_release_branch(&t);
    let feature = create_feature_branch(&t);

    commands::sync::run(&t.git, &Config::default());

    // the feature branch now contains the release baseline
    assert!(contains(t.local_dir.path(), &feature, &release));
    let tip_after_first = tip_oid(t.local_dir.path(), &feature);

    commands::sync::run(&t.git, &Config::default());

    // the second run reported up to date and created nothing
    assert_eq!(tip_oid(t.local_dir.path(), &feature), tip_after_first);
}

#[test]
fn test_behind_check_flips_after_merge() {
    let t = setup();
    t.git.checkout_new("topic", Some("main")).unwrap();
    t.git.checkout("main").unwrap();
    commit_file(t.local_dir.path(), "m.txt", "x", "feat: commit on main");

    let planner = SyncPlanner::new(&t.git, "origin");
    assert!(planner.is_behind("topic", "main").unwrap());

    t.git.checkout("topic").unwrap();
    t.git.merge("main").unwrap();
    assert!(!planner.is_behind("topic", "main").unwrap());
}

#[test]
fn test_create_feature_branch_end_to_end() {
    let t = setup();
    let today = compact_date(Local::now().date_naive());

    let prompt = ScriptedPrompt::new();
    prompt.push_selection(0); // Feature
    prompt.push_input(today.as_str());
    prompt.push_input("QZ-1314");

    commands::create::run(&t.git, &prompt, &Config::default(), None);

    let name = format!("feat/alice-{}-QZ-1314", today);
    let repo = Repository::open(t.local_dir.path()).unwrap();
    assert!(repo.find_branch(&name, BranchType::Local).is_ok());
    assert!(remote_branch_names(&t).contains(&name));
    // feature creation leaves the new branch checked out
    assert_eq!(t.git.current_branch().unwrap(), name);
}

#[test]
fn test_create_dev_branch_switches_back() {
    let t = setup();
    let today = compact_date(Local::now().date_naive());

    let prompt = ScriptedPrompt::new();
    prompt.push_selection(1); // Dev
    prompt.push_input(today.as_str());
    prompt.push_input("myProject");

    commands::create::run(&t.git, &prompt, &Config::default(), None);

    let name = format!("myProject-DEV-{}", today);
    assert!(remote_branch_names(&t).contains(&name));
    assert_eq!(t.git.current_branch().unwrap(), "main");
}

#[test]
fn test_list_runs_against_real_repository() {
    let t = setup();
    create_release_branch(&t);
    create_dev_branch(&t);

    commands::list::run(&t.git, &Config::default(), Some(2));
}

#[test]
#[serial]
fn test_discover_in_repository() {
    let t = setup();
    let original_dir = env::current_dir().unwrap();

    env::set_current_dir(t.local_dir.path()).unwrap();
    let discovered = Git2Repository::discover("origin");
    env::set_current_dir(original_dir).unwrap();

    assert!(discovered.is_ok());
}

#[test]
fn test_branchflow_help() {
    let output = Command::new("cargo")
        .args(["run", "--bin", "branchflow", "--", "--help"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("branchflow"));
    assert!(stdout.contains("merge"));
}
