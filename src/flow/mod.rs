//! The per-component setup state machine.
//!
//! One generic engine drives every component from its declarative
//! [`ComponentSpec`]:
//!
//! ```text
//! InitialCheck ──ok──▶ Done(Success)
//!      │ fail
//!      ▼
//!  Diagnose ──▶ Choice ──remedy──▶ Remediate ──▶ Verify ──ok──▶ Done(Success)
//!      ▲          │ s / c / x                      │ fail
//!      │          ▼                                │
//!      │   Done(Skipped | ForcedOk | Exited)       │
//!      └───────────────────────────────────────────┘
//! ```
//!
//! A failed remediation is reported and shown again as a note at the next
//! menu. The engine runs headless under [`MockUI`](crate::ui::MockUI).

pub mod choice;
pub mod diagnose;

pub use choice::Choice;
pub use diagnose::{diagnose, Diagnosis};

use crate::checker::{self, ComponentOutcome};
use crate::components::ComponentSpec;
use crate::error::Result;
use crate::host::{Host, RemedySpec};
use crate::ui::UserInterface;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Remediation rounds per component before the flow gives up and skips.
pub const MAX_REMEDIATIONS: u32 = 100;

/// How a component's flow ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowOutcome {
    /// The component passes.
    Success,
    /// The user skipped the component.
    Skipped,
    /// The user chose to continue despite the failure.
    ForcedOk,
    /// The user ended the whole session.
    Exited,
}

impl fmt::Display for FlowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "ready",
            Self::Skipped => "skipped",
            Self::ForcedOk => "continued anyway",
            Self::Exited => "exited",
        };
        f.write_str(s)
    }
}

/// Flow states.
#[derive(Debug)]
pub enum FlowState {
    InitialCheck,
    Diagnose(ComponentOutcome),
    Choice(Diagnosis),
    Remediate(&'static RemedySpec),
    Verify,
    Done(FlowOutcome),
}

impl FlowState {
    fn name(&self) -> &'static str {
        match self {
            Self::InitialCheck => "initial_check",
            Self::Diagnose(_) => "diagnose",
            Self::Choice(_) => "choice",
            Self::Remediate(_) => "remediate",
            Self::Verify => "verify",
            Self::Done(_) => "done",
        }
    }
}

fn show_diagnosis(ui: &mut dyn UserInterface, diagnosis: &Diagnosis, note: Option<&str>) {
    ui.warning(diagnosis.message.summary);
    ui.message(&format!("  {}: {}", diagnosis.label, diagnosis.failure));
    for step in diagnosis.message.instructions {
        ui.show_hint(step);
    }
    if let Some(hint) = diagnosis.hint {
        ui.show_hint(hint);
    }
    if let Some(note) = note {
        ui.message(&format!("  Last attempt: {}", note));
    }
}

/// Run one component's flow to completion.
///
/// Errors only come from the terminal (a prompt that cannot be answered);
/// probe and remediation failures are part of the flow.
pub fn run_flow(
    component: &ComponentSpec,
    host: &mut dyn Host,
    ui: &mut dyn UserInterface,
) -> Result<FlowOutcome> {
    let mut state = FlowState::InitialCheck;
    let mut note: Option<String> = None;
    let mut remediations = 0u32;

    loop {
        debug!(component = component.name, state = state.name(), "flow");
        state = match state {
            FlowState::InitialCheck => {
                let outcome = checker::check_verbose(component, &*host, ui);
                if outcome.overall_ok {
                    FlowState::Done(FlowOutcome::Success)
                } else {
                    FlowState::Diagnose(outcome)
                }
            }
            FlowState::Diagnose(outcome) => match diagnose(component, &outcome) {
                Some(diagnosis) => FlowState::Choice(diagnosis),
                None => FlowState::Done(FlowOutcome::Success),
            },
            FlowState::Choice(diagnosis) => {
                show_diagnosis(ui, &diagnosis, note.take().as_deref());
                match choice::prompt_choice(ui, component.name, &diagnosis)? {
                    Choice::Remedy(remedy) => FlowState::Remediate(remedy),
                    Choice::Skip => FlowState::Done(FlowOutcome::Skipped),
                    Choice::Continue => FlowState::Done(FlowOutcome::ForcedOk),
                    Choice::Exit => FlowState::Done(FlowOutcome::Exited),
                }
            }
            FlowState::Remediate(remedy) => {
                remediations += 1;
                let result = host.remediate(remedy, ui);
                if result.ok {
                    ui.success(&result.message);
                } else {
                    ui.error(&format!("{} failed: {}", remedy.label, result.message));
                    note = Some(format!("{} failed: {}", remedy.label, result.message));
                }
                FlowState::Verify
            }
            FlowState::Verify => {
                let outcome = checker::check_verbose(component, &*host, ui);
                if outcome.overall_ok {
                    FlowState::Done(FlowOutcome::Success)
                } else if remediations >= MAX_REMEDIATIONS {
                    warn!(component = component.name, "giving up after repeated remediations");
                    ui.warning(&format!(
                        "Giving up on {} after {} attempts",
                        component.title, remediations
                    ));
                    FlowState::Done(FlowOutcome::Skipped)
                } else {
                    FlowState::Diagnose(outcome)
                }
            }
            FlowState::Done(outcome) => {
                debug!(component = component.name, %outcome, "flow finished");
                return Ok(outcome);
            }
        };
    }
}
