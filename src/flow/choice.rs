//! The remediation menu.
//!
//! Component remedies get letters from `a` upward, skipping the letters of
//! the universal entries: `s` Skip, `c` Continue anyway, `x` Exit.

use super::diagnose::Diagnosis;
use crate::error::Result;
use crate::host::RemedySpec;
use crate::ui::{Prompt, PromptOption, UserInterface};
use tracing::{debug, warn};

const SKIP: &str = "s";
const CONTINUE: &str = "c";
const EXIT: &str = "x";

/// Consecutive unrecognized answers tolerated before the flow skips.
/// Scripted answers that never match would otherwise loop forever.
pub const MAX_INVALID_ANSWERS: usize = 10;

/// What the user picked.
#[derive(Debug, Clone, Copy)]
pub enum Choice {
    Remedy(&'static RemedySpec),
    Skip,
    Continue,
    Exit,
}

/// Menu letters for `count` remedies.
pub fn remedy_letters(count: usize) -> Vec<String> {
    ('a'..='z')
        .map(String::from)
        .filter(|l| ![SKIP, CONTINUE, EXIT].contains(&l.as_str()))
        .take(count)
        .collect()
}

/// Menu entries as `(letter, label)`.
pub fn menu(diagnosis: &Diagnosis) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = remedy_letters(diagnosis.remedies.len())
        .into_iter()
        .zip(&diagnosis.remedies)
        .map(|(letter, remedy)| (letter, remedy.label.to_string()))
        .collect();
    entries.push((SKIP.to_string(), "Skip this component".to_string()));
    entries.push((
        CONTINUE.to_string(),
        "Continue anyway (treat as OK)".to_string(),
    ));
    entries.push((EXIT.to_string(), "Exit setup".to_string()));
    entries
}

/// Interpret an answer. `None` for anything not on the menu.
pub fn parse_choice(answer: &str, diagnosis: &Diagnosis) -> Option<Choice> {
    let answer = answer.trim().to_lowercase();
    match answer.as_str() {
        SKIP => return Some(Choice::Skip),
        CONTINUE => return Some(Choice::Continue),
        EXIT => return Some(Choice::Exit),
        _ => {}
    }
    remedy_letters(diagnosis.remedies.len())
        .iter()
        .position(|l| *l == answer)
        .map(|i| Choice::Remedy(diagnosis.remedies[i]))
}

/// Ask until the answer is on the menu.
pub fn prompt_choice(
    ui: &mut dyn UserInterface,
    component: &str,
    diagnosis: &Diagnosis,
) -> Result<Choice> {
    let options: Vec<PromptOption> = menu(diagnosis)
        .into_iter()
        .map(|(letter, label)| PromptOption::new(format!("{}) {}", letter, label), letter))
        .collect();
    let prompt = Prompt::select(
        &format!("choice_{}", component),
        "What would you like to do?",
        options,
        Some(SKIP),
    );

    for _ in 0..MAX_INVALID_ANSWERS {
        let answer = ui.prompt(&prompt)?.as_string();
        if let Some(choice) = parse_choice(&answer, diagnosis) {
            debug!(component, answer = %answer.trim(), "choice");
            return Ok(choice);
        }
        ui.warning(&format!(
            "'{}' is not an option; pick one of the letters shown",
            answer.trim()
        ));
    }

    warn!(component, "too many invalid answers, skipping");
    Ok(Choice::Skip)
}
