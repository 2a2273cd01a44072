use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::{FlowError, Result};
use crate::git::{GitOps, RemoteInfo};

/// Scripted in-memory [GitOps] implementation for testing workflows
/// without a real repository. Records every operation so tests can assert
/// on call order; the remote name is fixed to `origin`.
pub struct MockGit {
    state: RefCell<State>,
}

struct State {
    clean: bool,
    current: String,
    config: HashMap<String, String>,
    branches: Vec<String>,
    behind: HashMap<(String, String), usize>,
    conflict_source: Option<String>,
    calls: Vec<String>,
}

impl MockGit {
    /// Create a mock on a clean `main` checkout with only `main` and its
    /// remote counterpart known.
    pub fn new() -> Self {
        MockGit {
            state: RefCell::new(State {
                clean: true,
                current: "main".to_string(),
                config: HashMap::new(),
                branches: vec!["main".to_string(), "origin/main".to_string()],
                behind: HashMap::new(),
                conflict_source: None,
                calls: Vec::new(),
            }),
        }
    }

    pub fn set_clean(&self, clean: bool) {
        self.state.borrow_mut().clean = clean;
    }

    pub fn set_current(&self, branch: impl Into<String>) {
        self.state.borrow_mut().current = branch.into();
    }

    pub fn set_config(&self, key: impl Into<String>, value: impl Into<String>) {
        self.state.borrow_mut().config.insert(key.into(), value.into());
    }

    /// Replace the known branch list (local and `origin/`-prefixed names).
    pub fn set_branches(&self, branches: &[&str]) {
        self.state.borrow_mut().branches = branches.iter().map(|b| b.to_string()).collect();
    }

    /// Script `rev_list_count(base, tip)` to return `count`.
    pub fn set_behind(&self, base: impl Into<String>, tip: impl Into<String>, count: usize) {
        self.state
            .borrow_mut()
            .behind
            .insert((base.into(), tip.into()), count);
    }

    /// Make the next merge of `source` fail with a conflict.
    pub fn fail_merge_from(&self, source: impl Into<String>) {
        self.state.borrow_mut().conflict_source = Some(source.into());
    }

    /// Every recorded operation, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    /// Recorded operations that change repository state.
    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| {
                c.starts_with("checkout") || c.starts_with("merge") || c.starts_with("push")
            })
            .collect()
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl Default for MockGit {
    fn default() -> Self {
        Self::new()
    }
}

impl GitOps for MockGit {
    fn is_clean(&self) -> Result<bool> {
        Ok(self.state.borrow().clean)
    }

    fn config_value(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.borrow().config.get(key).cloned())
    }

    fn fetch_prune(&self) -> Result<()> {
        self.record("fetch --prune".to_string());
        Ok(())
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self.state.borrow().current.clone())
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        self.record(format!("checkout {}", branch));
        self.state.borrow_mut().current = branch.to_string();
        Ok(())
    }

    fn checkout_new(&self, branch: &str, start_ref: Option<&str>) -> Result<()> {
        self.record(format!(
            "checkout-new {} {}",
            branch,
            start_ref.unwrap_or("HEAD")
        ));
        let mut state = self.state.borrow_mut();
        state.branches.push(branch.to_string());
        state.current = branch.to_string();
        Ok(())
    }

    fn merge(&self, source: &str) -> Result<()> {
        self.record(format!("merge {}", source));
        let mut state = self.state.borrow_mut();
        let current = state.current.clone();
        if state.conflict_source.as_deref() == Some(source) {
            return Err(FlowError::merge_conflict(source, current));
        }
        // The current branch now contains everything in `source`.
        state.behind.insert((current, source.to_string()), 0);
        Ok(())
    }

    fn push(&self, branch: &str) -> Result<()> {
        self.record(format!("push {}", branch));
        let mut state = self.state.borrow_mut();
        let tracking = format!("origin/{}", branch);
        if !state.branches.contains(&tracking) {
            state.branches.push(tracking);
        }
        Ok(())
    }

    fn pull(&self, branch: &str) -> Result<()> {
        self.record(format!("pull {}", branch));
        let state = self.state.borrow();
        if !state.branches.contains(&format!("origin/{}", branch)) {
            return Err(FlowError::remote_missing(branch));
        }
        Ok(())
    }

    fn list_all_branches(&self) -> Result<Vec<String>> {
        Ok(self.state.borrow().branches.clone())
    }

    fn rev_list_count(&self, base: &str, tip: &str) -> Result<usize> {
        Ok(self
            .state
            .borrow()
            .behind
            .get(&(base.to_string(), tip.to_string()))
            .copied()
            .unwrap_or(0))
    }

    fn list_remotes(&self) -> Result<Vec<RemoteInfo>> {
        Ok(vec![RemoteInfo {
            name: "origin".to_string(),
            fetch_url: Some("mock://origin".to_string()),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_records_calls_in_order() {
        let git = MockGit::new();
        git.checkout("main").unwrap();
        git.fetch_prune().unwrap();
        git.push("main").unwrap();
        assert_eq!(git.calls(), vec!["checkout main", "fetch --prune", "push main"]);
    }

    #[test]
    fn test_mock_checkout_moves_current_branch() {
        let git = MockGit::new();
        git.set_branches(&["main", "topic"]);
        git.checkout("topic").unwrap();
        assert_eq!(git.current_branch().unwrap(), "topic");
    }

    #[test]
    fn test_mock_push_creates_remote_counterpart() {
        let git = MockGit::new();
        git.checkout_new("topic", Some("main")).unwrap();
        assert!(git.pull("topic").is_err());
        git.push("topic").unwrap();
        assert!(git.pull("topic").is_ok());
    }

    #[test]
    fn test_mock_merge_clears_behind_count() {
        let git = MockGit::new();
        git.set_current("topic");
        git.set_behind("topic", "base", 3);
        assert_eq!(git.rev_list_count("topic", "base").unwrap(), 3);
        git.merge("base").unwrap();
        assert_eq!(git.rev_list_count("topic", "base").unwrap(), 0);
    }

    #[test]
    fn test_mock_scripted_conflict() {
        let git = MockGit::new();
        git.set_current("proj-DEV-20250101");
        git.fail_merge_from("feat/a-20250101-QZ-1234");
        let err = git.merge("feat/a-20250101-QZ-1234").unwrap_err();
        assert!(matches!(err, FlowError::MergeConflict { .. }));
    }
}
