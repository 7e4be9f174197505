//! Read-only check of every component and the overall verdict.

use crate::checker::{self, render, ComponentOutcome};
use crate::components::ComponentSpec;
use crate::host::Host;
use crate::ui::UserInterface;
use serde::Serialize;
use std::fmt;

/// Overall readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Every component passes.
    Ready,
    /// At least the threshold fraction passes.
    Partial,
    /// Fewer than the threshold fraction passes.
    Broken,
}

impl Verdict {
    /// `Ready` iff `ready == total`, `Partial` iff `total * threshold <= ready`.
    pub fn from_counts(ready: usize, total: usize, threshold: f64) -> Self {
        if ready >= total {
            Self::Ready
        } else if ready as f64 >= total as f64 * threshold {
            Self::Partial
        } else {
            Self::Broken
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            Self::Ready => 0,
            Self::Partial | Self::Broken => 1,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Ready => "ready to play",
            Self::Partial => "mostly ready",
            Self::Broken => "mostly broken",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Outcomes of every component plus the verdict.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub components: Vec<ComponentOutcome>,
    pub ready: usize,
    pub total: usize,
    pub verdict: Verdict,
}

impl Summary {
    pub fn from_outcomes(components: Vec<ComponentOutcome>, threshold: f64) -> Self {
        let ready = components.iter().filter(|c| c.overall_ok).count();
        let total = components.len();
        Self {
            verdict: Verdict::from_counts(ready, total, threshold),
            components,
            ready,
            total,
        }
    }

    /// Names of failing components, in registry order.
    pub fn failing(&self) -> Vec<&str> {
        self.components
            .iter()
            .filter(|c| !c.overall_ok)
            .map(|c| c.component.as_str())
            .collect()
    }

    pub fn exit_code(&self) -> i32 {
        self.verdict.exit_code()
    }
}

/// Check every component without prompting.
pub fn check_all(components: &[ComponentSpec], host: &dyn Host, threshold: f64) -> Summary {
    let outcomes = components
        .iter()
        .map(|component| checker::check(component, host))
        .collect();
    Summary::from_outcomes(outcomes, threshold)
}

/// Print one line per component and the verdict.
pub fn show_summary(ui: &mut dyn UserInterface, summary: &Summary) {
    ui.show_header("Summary");
    for outcome in &summary.components {
        if outcome.overall_ok {
            ui.success(&render::summary_line(outcome));
        } else {
            ui.error(&render::summary_line(outcome));
        }
    }

    let line = format!(
        "{}/{} components ready: {}",
        summary.ready, summary.total, summary.verdict
    );
    match summary.verdict {
        Verdict::Ready => ui.success(&line),
        Verdict::Partial => ui.warning(&line),
        Verdict::Broken => ui.error(&line),
    }
    if summary.verdict != Verdict::Ready {
        ui.show_hint(&format!(
            "Run `readycheck component <name> setup` to fix: {}",
            summary.failing().join(", ")
        ));
    }
}
