use std::path::Path;

use git2::build::CheckoutBuilder;
use git2::{BranchType, ErrorCode, FetchOptions, FetchPrune, PushOptions, Repository};

use crate::error::{FlowError, Result};
use crate::git::{GitOps, RemoteInfo};

/// Real [GitOps] implementation backed by `git2`.
///
/// Constructed once per command invocation with the remote it talks to.
pub struct Git2Repository {
    repo: Repository,
    remote: String,
}

impl Git2Repository {
    /// Discover the repository containing the current working directory.
    pub fn discover(remote: impl Into<String>) -> Result<Self> {
        let repo = Repository::discover(".")
            .map_err(|e| FlowError::precondition(format!("Not in a git repository: {}", e)))?;
        Ok(Git2Repository {
            repo,
            remote: remote.into(),
        })
    }

    /// Open the repository at a known path. Used by tests to avoid
    /// depending on the process working directory.
    pub fn open_at(path: &Path, remote: impl Into<String>) -> Result<Self> {
        let repo = Repository::open(path)?;
        Ok(Git2Repository {
            repo,
            remote: remote.into(),
        })
    }

    /// Credential callbacks for remote operations.
    ///
    /// Tries SSH keys from ~/.ssh/ in order of preference, then the SSH
    /// agent, then default credentials (sufficient for local-path remotes).
    fn callbacks() -> git2::RemoteCallbacks<'static> {
        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|_url, username_from_url, allowed_types| {
            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                let key_paths = vec![
                    format!("{}/.ssh/id_ed25519", home),
                    format!("{}/.ssh/id_rsa", home),
                    format!("{}/.ssh/id_ecdsa", home),
                ];

                for key_path in key_paths {
                    let path = std::path::Path::new(&key_path);
                    if path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(
                            username_from_url.unwrap_or("git"),
                            None,
                            path,
                            None,
                        ) {
                            return Ok(cred);
                        }
                    }
                }

                if let Ok(cred) = git2::Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
                {
                    return Ok(cred);
                }
            }

            git2::Cred::default()
        });
        callbacks
    }

    fn fetch_options() -> FetchOptions<'static> {
        let mut options = FetchOptions::new();
        options.remote_callbacks(Self::callbacks());
        options
    }

    /// Merge `source_ref` into the current HEAD: no-op when already up to
    /// date, fast-forward when possible, otherwise a real merge commit.
    /// On conflict the merge state is left in place and a conflict error
    /// naming both branches is returned.
    fn merge_into_head(&self, source_ref: &str) -> Result<()> {
        let target = self.current_branch()?;
        let source_commit = self.repo.revparse_single(source_ref)?.peel_to_commit()?;
        let annotated = self.repo.find_annotated_commit(source_commit.id())?;
        let (analysis, _) = self.repo.merge_analysis(&[&annotated])?;

        if analysis.is_up_to_date() {
            return Ok(());
        }

        if analysis.is_fast_forward() {
            let mut head_ref = self.repo.head()?;
            head_ref.set_target(
                source_commit.id(),
                &format!("fast-forward to {}", source_ref),
            )?;
            self.repo
                .checkout_head(Some(CheckoutBuilder::new().force()))?;
            return Ok(());
        }

        let mut checkout = CheckoutBuilder::new();
        checkout.allow_conflicts(true).conflict_style_merge(true);
        self.repo.merge(&[&annotated], None, Some(&mut checkout))?;

        let mut index = self.repo.index()?;
        if index.has_conflicts() {
            // MERGE_HEAD and the conflicted index stay behind so the user
            // can resolve and commit by hand.
            return Err(FlowError::merge_conflict(source_ref, target));
        }

        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.repo.signature()?;
        let head_commit = self.repo.head()?.peel_to_commit()?;
        let message = format!("Merge branch '{}' into {}", source_ref, target);
        self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            &message,
            &tree,
            &[&head_commit, &source_commit],
        )?;
        self.repo.cleanup_state()?;
        Ok(())
    }
}

impl GitOps for Git2Repository {
    fn is_clean(&self) -> Result<bool> {
        let mut options = git2::StatusOptions::new();
        options.include_untracked(true).include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses.is_empty())
    }

    fn config_value(&self, key: &str) -> Result<Option<String>> {
        let config = self.repo.config()?;
        match config.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn fetch_prune(&self) -> Result<()> {
        let mut remote = self.repo.find_remote(&self.remote).map_err(|_| {
            FlowError::config(format!("Remote '{}' not found", self.remote))
        })?;

        let mut options = Self::fetch_options();
        options.prune(FetchPrune::On);

        let refspec = format!("+refs/heads/*:refs/remotes/{}/*", self.remote);
        remote
            .fetch(&[refspec.as_str()], Some(&mut options), None)
            .map_err(|e| {
                FlowError::config(format!(
                    "Failed to fetch from remote '{}': {}",
                    self.remote, e
                ))
            })?;
        Ok(())
    }

    fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| FlowError::precondition("HEAD is detached or invalid"))
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        let refname = format!("refs/heads/{}", branch);
        let object = self.repo.revparse_single(&refname)?;
        self.repo
            .checkout_tree(&object, Some(CheckoutBuilder::new().safe()))?;
        self.repo.set_head(&refname)?;
        Ok(())
    }

    fn checkout_new(&self, branch: &str, start_ref: Option<&str>) -> Result<()> {
        match start_ref {
            Some(start) => {
                let commit = self.repo.revparse_single(start)?.peel_to_commit()?;
                let mut created = self.repo.branch(branch, &commit, false)?;
                if start.starts_with(&format!("{}/", self.remote)) {
                    created.set_upstream(Some(start))?;
                }
            }
            None => {
                let commit = self.repo.head()?.peel_to_commit()?;
                self.repo.branch(branch, &commit, false)?;
            }
        }
        self.checkout(branch)
    }

    fn merge(&self, source: &str) -> Result<()> {
        self.merge_into_head(source)
    }

    fn push(&self, branch: &str) -> Result<()> {
        let mut remote = self.repo.find_remote(&self.remote).map_err(|_| {
            FlowError::config(format!("Remote '{}' not found", self.remote))
        })?;

        let mut callbacks = Self::callbacks();
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                Err(git2::Error::from_str(&format!(
                    "push failed for {}: {}",
                    refname, status
                )))
            } else {
                Ok(())
            }
        });
        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);

        let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);
        remote.push(&[refspec.as_str()], Some(&mut options))?;

        // Keep the local view consistent with what was just pushed.
        let oid = self
            .repo
            .revparse_single(&format!("refs/heads/{}", branch))?
            .id();
        self.repo.reference(
            &format!("refs/remotes/{}/{}", self.remote, branch),
            oid,
            true,
            &format!("push {}", branch),
        )?;
        let mut local = self.repo.find_branch(branch, BranchType::Local)?;
        local.set_upstream(Some(&format!("{}/{}", self.remote, branch)))?;
        Ok(())
    }

    fn pull(&self, branch: &str) -> Result<()> {
        // Refresh this branch's remote-tracking ref. The branch may not
        // exist on the remote at all; that case is decided below.
        if let Ok(mut remote) = self.repo.find_remote(&self.remote) {
            let refspec = format!(
                "+refs/heads/{0}:refs/remotes/{1}/{0}",
                branch, self.remote
            );
            let mut options = Self::fetch_options();
            let _ = remote.fetch(&[refspec.as_str()], Some(&mut options), None);
        }

        let tracking = format!("{}/{}", self.remote, branch);
        if self.repo.revparse_single(&tracking).is_err() {
            return Err(FlowError::remote_missing(branch));
        }
        self.merge_into_head(&tracking)
    }

    fn list_all_branches(&self) -> Result<Vec<String>> {
        let head_alias = format!("{}/HEAD", self.remote);
        let mut names = Vec::new();
        for entry in self.repo.branches(None)? {
            let (branch, _) = entry?;
            if let Some(name) = branch.name()? {
                if name == head_alias {
                    continue;
                }
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn rev_list_count(&self, base: &str, tip: &str) -> Result<usize> {
        let base_oid = self.repo.revparse_single(base)?.peel_to_commit()?.id();
        let tip_oid = self.repo.revparse_single(tip)?.peel_to_commit()?.id();
        let (ahead, _behind) = self.repo.graph_ahead_behind(tip_oid, base_oid)?;
        Ok(ahead)
    }

    fn list_remotes(&self) -> Result<Vec<RemoteInfo>> {
        let names = self.repo.remotes()?;
        let mut remotes = Vec::new();
        for name in names.iter().flatten() {
            let fetch_url = self
                .repo
                .find_remote(name)
                .ok()
                .and_then(|r| r.url().map(str::to_string));
            remotes.push(RemoteInfo {
                name: name.to_string(),
                fetch_url,
            });
        }

        // "origin" first, then alphabetical, for consistent display.
        remotes.sort_by(|a, b| {
            if a.name == "origin" {
                std::cmp::Ordering::Less
            } else if b.name == "origin" {
                std::cmp::Ordering::Greater
            } else {
                a.name.cmp(&b.name)
            }
        });
        Ok(remotes)
    }
}
