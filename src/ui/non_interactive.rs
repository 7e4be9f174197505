//! Non-interactive UI for CI/headless environments.
//!
//! Prompts are answered from `READYCHECK_PROMPT_<KEY>` environment
//! variables, then from the prompt's default. A prompt with neither is an
//! error rather than a hang.

use std::collections::HashMap;

use crate::error::{ReadyError, Result};

use super::{
    parse_bool_answer, OutputMode, Prompt, PromptResult, PromptType, SpinnerHandle,
    UserInterface,
};

/// Prefix of environment variables that answer prompts.
pub const PROMPT_ENV_PREFIX: &str = "READYCHECK_PROMPT_";

/// UI implementation for non-interactive mode.
pub struct NonInteractiveUI {
    mode: OutputMode,
    env_overrides: HashMap<String, String>,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI reading overrides from the environment.
    pub fn new(mode: OutputMode) -> Self {
        let env_overrides = std::env::vars()
            .filter(|(k, _)| k.starts_with(PROMPT_ENV_PREFIX))
            .collect();

        Self {
            mode,
            env_overrides,
        }
    }

    /// Create with explicit overrides (for testing).
    pub fn with_overrides(mode: OutputMode, overrides: HashMap<String, String>) -> Self {
        Self {
            mode,
            env_overrides: overrides,
        }
    }

    /// Environment variable consulted for a prompt key.
    pub fn env_key(prompt_key: &str) -> String {
        let normalized: String = prompt_key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}{}", PROMPT_ENV_PREFIX, normalized)
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("⚠ {}", msg);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn show_hint(&mut self, hint: &str) {
        if self.mode.shows_status() {
            println!("  → {}", hint);
        }
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        let answer = self
            .env_overrides
            .get(&Self::env_key(&prompt.key))
            .or(prompt.default.as_ref())
            .cloned()
            .ok_or_else(|| ReadyError::PromptUnavailable {
                key: prompt.key.clone(),
            })?;

        if self.mode.shows_status() {
            let shown = match prompt.prompt_type {
                PromptType::Password => "********",
                _ => answer.as_str(),
            };
            println!("{} {}", prompt.question, shown);
        }

        match prompt.prompt_type {
            PromptType::Confirm => Ok(PromptResult::Bool(parse_bool_answer(&answer))),
            _ => Ok(PromptResult::String(answer)),
        }
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            println!("  {}", message);
        }
        Box::new(LineSpinner { mode: self.mode })
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            println!("\n{}\n", title);
        }
    }

    fn show_progress(&mut self, current: usize, total: usize) {
        if self.mode.shows_status() {
            println!("[{}/{}]", current, total);
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner stand-in that prints its final line only.
struct LineSpinner {
    mode: OutputMode,
}

impl SpinnerHandle for LineSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("  ✓ {}", msg);
        }
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("  ✗ {}", msg);
    }

    fn finish_clear(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui_with(pairs: &[(&str, &str)]) -> NonInteractiveUI {
        let overrides = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NonInteractiveUI::with_overrides(OutputMode::Silent, overrides)
    }

    #[test]
    fn env_key_is_normalized() {
        assert_eq!(
            NonInteractiveUI::env_key("choice_mysql"),
            "READYCHECK_PROMPT_CHOICE_MYSQL"
        );
        assert_eq!(
            NonInteractiveUI::env_key("mysql.password"),
            "READYCHECK_PROMPT_MYSQL_PASSWORD"
        );
    }

    #[test]
    fn override_answers_prompt() {
        let mut ui = ui_with(&[("READYCHECK_PROMPT_CHOICE_MYSQL", "a")]);
        let result = ui
            .prompt(&Prompt::input("choice_mysql", "Choose", Some("s")))
            .unwrap();
        assert_eq!(result.as_string(), "a");
    }

    #[test]
    fn default_used_without_override() {
        let mut ui = ui_with(&[]);
        let result = ui
            .prompt(&Prompt::input("choice_node", "Choose", Some("s")))
            .unwrap();
        assert_eq!(result.as_string(), "s");
    }

    #[test]
    fn confirm_override_is_parsed() {
        let mut ui = ui_with(&[("READYCHECK_PROMPT_RETRY", "y")]);
        let result = ui
            .prompt(&Prompt::confirm("retry", "Retry?", false))
            .unwrap();
        assert_eq!(result.as_bool(), Some(true));
    }

    #[test]
    fn missing_answer_is_an_error() {
        let mut ui = ui_with(&[]);
        let err = ui
            .prompt(&Prompt::password("db_password", "Password"))
            .unwrap_err();
        assert!(matches!(err, ReadyError::PromptUnavailable { key } if key == "db_password"));
    }

    #[test]
    fn is_never_interactive() {
        assert!(!ui_with(&[]).is_interactive());
    }
}
