//! Pure rendering of component outcomes.

use super::ComponentOutcome;
use crate::ui::theme::{FAIL_ICON, PASS_ICON};
use crate::ui::Table;

/// Status table: one row per probe.
pub fn status_table(outcome: &ComponentOutcome) -> String {
    let mut table = Table::new(vec!["", outcome.title.as_str(), "Status"]);
    for report in &outcome.results {
        let icon = if report.result.ok { PASS_ICON } else { FAIL_ICON };
        let status = report
            .result
            .message
            .lines()
            .next()
            .unwrap_or_default();
        table.add_row(&[icon, report.label.as_str(), status]);
    }
    table.render()
}

/// Full messages of failing probes, `label: message`.
pub fn details(outcome: &ComponentOutcome) -> Vec<String> {
    outcome
        .results
        .iter()
        .filter(|r| !r.result.ok)
        .map(|r| format!("{}: {}", r.label, r.result.message))
        .collect()
}

/// One line per component for the overall summary.
pub fn summary_line(outcome: &ComponentOutcome) -> String {
    let icon = if outcome.overall_ok { PASS_ICON } else { FAIL_ICON };
    let passed = outcome.results.iter().filter(|r| r.result.ok).count();
    format!(
        "{} {} ({}/{})",
        icon,
        outcome.title,
        passed,
        outcome.results.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::ProbeReport;
    use crate::host::CheckResult;

    fn outcome() -> ComponentOutcome {
        ComponentOutcome {
            component: "node".to_string(),
            title: "Node.js".to_string(),
            results: vec![
                ProbeReport {
                    id: "node.runtime".to_string(),
                    label: "Node.js runtime".to_string(),
                    result: CheckResult::pass("Node.js v20.11.0"),
                },
                ProbeReport {
                    id: "node.npm".to_string(),
                    label: "npm".to_string(),
                    result: CheckResult::fail("npm not found on PATH\nsecond line"),
                },
            ],
            overall_ok: false,
        }
    }

    #[test]
    fn table_has_a_row_per_probe() {
        let table = status_table(&outcome());
        assert!(table.contains("✓ │ Node.js runtime"));
        assert!(table.contains("✗ │ npm"));
        assert!(table.contains("npm not found on PATH"));
        assert!(!table.contains("second line"));
    }

    #[test]
    fn details_only_failures() {
        assert_eq!(
            details(&outcome()),
            vec!["npm: npm not found on PATH\nsecond line".to_string()]
        );
    }

    #[test]
    fn summary_counts_passes() {
        assert_eq!(summary_line(&outcome()), "✗ Node.js (1/2)");
    }
}
