//! User interface module - interactive prompts and progress output.
//!
//! The [Prompt] trait is the interactive collaborator consumed by the
//! workflows; [DialoguerPrompt] is the real terminal implementation and
//! [ScriptedPrompt] replays queued answers for tests. Progress output
//! lives in [logger].

pub mod logger;

use std::cell::RefCell;
use std::collections::VecDeque;

use dialoguer::{Confirm, Input, Select};

use crate::error::{FlowError, Result};

/// Input validator: `Ok(())` accepts, `Err(message)` rejects with a
/// user-facing message.
pub type Validator<'a> = &'a dyn Fn(&str) -> std::result::Result<(), String>;

/// Interactive prompt collaborator. Calls are strictly sequential; the
/// workflows never issue two prompts concurrently.
pub trait Prompt {
    /// Pick one of `choices`; returns the chosen index.
    fn select_one(&self, message: &str, choices: &[&str]) -> Result<usize>;

    /// Free-text input with an optional default and a validator.
    fn text_input(
        &self,
        message: &str,
        default: Option<&str>,
        validate: Validator<'_>,
    ) -> Result<String>;

    /// Yes/no confirmation with a default answer.
    fn confirm(&self, message: &str, default: bool) -> Result<bool>;
}

/// Terminal prompts backed by `dialoguer`.
pub struct DialoguerPrompt;

impl Prompt for DialoguerPrompt {
    fn select_one(&self, message: &str, choices: &[&str]) -> Result<usize> {
        let index = Select::new()
            .with_prompt(message)
            .items(choices)
            .default(0)
            .interact()?;
        Ok(index)
    }

    fn text_input(
        &self,
        message: &str,
        default: Option<&str>,
        validate: Validator<'_>,
    ) -> Result<String> {
        let mut input = Input::<String>::new().with_prompt(message);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        let value = input
            .validate_with(|value: &String| validate(value))
            .interact_text()?;
        Ok(value)
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        let confirmed = Confirm::new()
            .with_prompt(message)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }
}

/// Replays queued answers in order. Text inputs fall back to the prompt's
/// default when the queue is empty (the scripted equivalent of pressing
/// Enter), and confirmations fall back to their default answer; selections
/// must always be scripted. Validators still run against scripted input.
#[derive(Default)]
pub struct ScriptedPrompt {
    selections: RefCell<VecDeque<usize>>,
    inputs: RefCell<VecDeque<String>>,
    confirms: RefCell<VecDeque<bool>>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_selection(&self, index: usize) {
        self.selections.borrow_mut().push_back(index);
    }

    pub fn push_input(&self, value: impl Into<String>) {
        self.inputs.borrow_mut().push_back(value.into());
    }

    pub fn push_confirm(&self, value: bool) {
        self.confirms.borrow_mut().push_back(value);
    }
}

impl Prompt for ScriptedPrompt {
    fn select_one(&self, message: &str, _choices: &[&str]) -> Result<usize> {
        self.selections.borrow_mut().pop_front().ok_or_else(|| {
            FlowError::config(format!("no scripted selection for prompt '{}'", message))
        })
    }

    fn text_input(
        &self,
        message: &str,
        default: Option<&str>,
        validate: Validator<'_>,
    ) -> Result<String> {
        let value = match self.inputs.borrow_mut().pop_front() {
            Some(value) => value,
            None => default
                .map(str::to_string)
                .ok_or_else(|| {
                    FlowError::config(format!("no scripted input for prompt '{}'", message))
                })?,
        };
        validate(&value).map_err(|reason| {
            FlowError::config(format!(
                "scripted input '{}' rejected for prompt '{}': {}",
                value, message, reason
            ))
        })?;
        Ok(value)
    }

    fn confirm(&self, _message: &str, default: bool) -> Result<bool> {
        Ok(self.confirms.borrow_mut().pop_front().unwrap_or(default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accept(_: &str) -> std::result::Result<(), String> {
        Ok(())
    }

    #[test]
    fn test_scripted_prompt_replays_in_order() {
        let prompt = ScriptedPrompt::new();
        prompt.push_input("first");
        prompt.push_input("second");
        assert_eq!(prompt.text_input("a", None, &accept).unwrap(), "first");
        assert_eq!(prompt.text_input("b", None, &accept).unwrap(), "second");
    }

    #[test]
    fn test_scripted_prompt_uses_defaults_when_exhausted() {
        let prompt = ScriptedPrompt::new();
        assert_eq!(
            prompt.text_input("date", Some("20250101"), &accept).unwrap(),
            "20250101"
        );
        assert!(prompt.confirm("go ahead?", true).unwrap());
        assert!(!prompt.confirm("danger?", false).unwrap());
    }

    #[test]
    fn test_scripted_prompt_runs_validators() {
        let prompt = ScriptedPrompt::new();
        prompt.push_input("bad");
        let reject = |value: &str| -> std::result::Result<(), String> {
            if value == "bad" {
                Err("rejected".to_string())
            } else {
                Ok(())
            }
        };
        assert!(prompt.text_input("x", None, &reject).is_err());
    }

    #[test]
    fn test_scripted_prompt_selection_must_be_scripted() {
        let prompt = ScriptedPrompt::new();
        assert!(prompt.select_one("kind", &["a", "b"]).is_err());
        prompt.push_selection(1);
        assert_eq!(prompt.select_one("kind", &["a", "b"]).unwrap(), 1);
    }
}
