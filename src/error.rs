use thiserror::Error;

/// Unified error type for branchflow operations
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Precondition(String),

    #[error("{0}")]
    Resolution(String),

    #[error("Merge conflict: merging '{from_branch}' into '{target}' failed.\nResolve the conflicted files manually, commit, then switch back to your branch.")]
    MergeConflict { from_branch: String, target: String },

    #[error("Remote branch '{0}' does not exist")]
    RemoteMissing(String),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in branchflow
pub type Result<T> = std::result::Result<T, FlowError>;

impl FlowError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        FlowError::Config(msg.into())
    }

    /// Create a precondition error with context
    pub fn precondition(msg: impl Into<String>) -> Self {
        FlowError::Precondition(msg.into())
    }

    /// Create a resolution error with context
    pub fn resolution(msg: impl Into<String>) -> Self {
        FlowError::Resolution(msg.into())
    }

    /// Create a merge-conflict error naming both branches
    pub fn merge_conflict(source: impl Into<String>, target: impl Into<String>) -> Self {
        FlowError::MergeConflict {
            from_branch: source.into(),
            target: target.into(),
        }
    }

    /// Create a remote-absence error for a branch
    pub fn remote_missing(branch: impl Into<String>) -> Self {
        FlowError::RemoteMissing(branch.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FlowError::config("test config issue");
        assert_eq!(err.to_string(), "Configuration error: test config issue");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FlowError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_merge_conflict_names_both_branches() {
        let err = FlowError::merge_conflict("feat/alice-20250101-QZ-1234", "myProject-DEV-20250103");
        let msg = err.to_string();
        assert!(msg.contains("feat/alice-20250101-QZ-1234"));
        assert!(msg.contains("myProject-DEV-20250103"));
        assert!(msg.contains("manually"));
    }

    #[test]
    fn test_remote_missing_is_distinct() {
        let err = FlowError::remote_missing("myProject-DEV-20250103");
        assert_eq!(
            err.to_string(),
            "Remote branch 'myProject-DEV-20250103' does not exist"
        );
    }

    #[test]
    fn test_precondition_and_resolution_pass_message_through() {
        assert_eq!(
            FlowError::precondition("working tree is dirty").to_string(),
            "working tree is dirty"
        );
        assert_eq!(
            FlowError::resolution("no release branch found").to_string(),
            "no release branch found"
        );
    }
}
