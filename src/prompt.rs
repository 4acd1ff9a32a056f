use std::io;

use dialoguer::Select;
use dialoguer::console::Term;
use dialoguer::theme::ColorfulTheme;
use thiserror::Error;

pub const MANIFEST_PROMPT: &str = "Which package.json scripts do you want to run?";
pub const SCRIPT_PROMPT: &str = "Which script do you want to execute?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice<T> {
    pub label: String,
    pub value: T,
}

impl<T> Choice<T> {
    pub fn new(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("selection cancelled")]
    Cancelled,
    #[error("no choices to select from")]
    NoChoices,
    #[error("selection index {index} is out of range for {len} choices")]
    OutOfRange { index: usize, len: usize },
    #[error("terminal interaction failed")]
    Terminal(#[source] io::Error),
}

/// A single-choice list prompt. Returns the index of the committed label.
pub trait Prompter {
    fn select(&mut self, message: &str, labels: &[String]) -> Result<usize, PromptError>;
}

/// Interactive prompt on the controlling terminal. The first item starts highlighted.
#[derive(Default)]
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Prompter for TerminalPrompter {
    fn select(&mut self, message: &str, labels: &[String]) -> Result<usize, PromptError> {
        let selection = Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(labels)
            .default(0)
            .interact_opt();

        match selection {
            Ok(Some(index)) => Ok(index),
            Ok(None) => Err(PromptError::Cancelled),
            Err(dialoguer::Error::IO(err)) if err.kind() == io::ErrorKind::Interrupted => {
                // Ctrl-C arrives as a key read while the cursor is hidden.
                let _ = Term::stderr().show_cursor();
                Err(PromptError::Cancelled)
            }
            Err(dialoguer::Error::IO(err)) => Err(PromptError::Terminal(err)),
        }
    }
}

/// Presents `choices` and yields the value the operator committed.
/// Never shows an empty list.
pub fn choose<T, P>(
    prompter: &mut P,
    message: &str,
    choices: Vec<Choice<T>>,
) -> Result<T, PromptError>
where
    P: Prompter + ?Sized,
{
    if choices.is_empty() {
        return Err(PromptError::NoChoices);
    }

    let labels: Vec<String> = choices.iter().map(|choice| choice.label.clone()).collect();
    let index = prompter.select(message, &labels)?;
    let len = choices.len();

    choices
        .into_iter()
        .nth(index)
        .map(|choice| choice.value)
        .ok_or(PromptError::OutOfRange { index, len })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use super::{Choice, PromptError, Prompter, choose};

    /// Answers prompts from a queue and records what it was shown.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedPrompter {
        answers: VecDeque<Result<usize, PromptError>>,
        pub(crate) shown: Vec<(String, Vec<String>)>,
    }

    impl ScriptedPrompter {
        pub(crate) fn answering(answers: Vec<Result<usize, PromptError>>) -> Self {
            Self {
                answers: answers.into(),
                shown: Vec::new(),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn select(&mut self, message: &str, labels: &[String]) -> Result<usize, PromptError> {
            self.shown.push((message.to_string(), labels.to_vec()));
            self.answers
                .pop_front()
                .unwrap_or(Err(PromptError::Cancelled))
        }
    }

    #[test]
    fn returns_value_of_selected_label() {
        let mut prompter = ScriptedPrompter::answering(vec![Ok(1)]);
        let picked = choose(
            &mut prompter,
            "pick",
            vec![Choice::new("a - 1", "a"), Choice::new("b - 2", "b")],
        )
        .expect("selection should succeed");

        assert_eq!(picked, "b");
        assert_eq!(
            prompter.shown,
            vec![("pick".to_string(), vec!["a - 1".to_string(), "b - 2".to_string()])]
        );
    }

    #[test]
    fn empty_choices_never_reach_the_prompter() {
        let mut prompter = ScriptedPrompter::answering(vec![Ok(0)]);
        let err = choose::<&str, _>(&mut prompter, "pick", Vec::new()).expect_err("should refuse");

        assert!(matches!(err, PromptError::NoChoices));
        assert!(prompter.shown.is_empty());
    }

    #[test]
    fn cancellation_propagates() {
        let mut prompter = ScriptedPrompter::answering(vec![Err(PromptError::Cancelled)]);
        let err = choose(&mut prompter, "pick", vec![Choice::new("a", 1)]).expect_err("cancelled");
        assert!(matches!(err, PromptError::Cancelled));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut prompter = ScriptedPrompter::answering(vec![Ok(5)]);
        let err = choose(&mut prompter, "pick", vec![Choice::new("a", 1)]).expect_err("invalid");
        assert!(matches!(err, PromptError::OutOfRange { index: 5, len: 1 }));
    }
}
