//! User-facing workflows.
//!
//! Every `run` entry point catches errors at its own boundary, logs them,
//! and returns normally; failures end the invocation but never crash the
//! process. Workflows that move between branches record the original
//! branch at entry and warn when an error leaves the repository elsewhere.

pub mod create;
pub mod list;
pub mod merge;
pub mod sync;

use crate::error::{FlowError, Result};
use crate::git::GitOps;

fn ensure_clean<G: GitOps>(git: &G) -> Result<()> {
    if git.is_clean()? {
        Ok(())
    } else {
        Err(FlowError::precondition(
            "The working tree has uncommitted changes. Commit or stash them first.",
        ))
    }
}
