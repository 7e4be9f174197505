//! Mapping a failed check to a diagnosis.

use crate::checker::ComponentOutcome;
use crate::components::{message as catalog, ComponentSpec, Message, GENERIC_FAILURE};
use crate::host::RemedySpec;
use regex::RegexBuilder;
use tracing::{debug, warn};

/// What went wrong and what can be done about it.
#[derive(Debug, Clone)]
pub struct Diagnosis {
    /// Failing probe id.
    pub probe: String,
    /// Failing probe label.
    pub label: String,
    /// The probe's failure message.
    pub failure: String,
    pub message_key: &'static str,
    pub message: Message,
    /// Install hint shown for generic diagnoses.
    pub hint: Option<&'static str>,
    /// Remedies offered, in menu order.
    pub remedies: Vec<&'static RemedySpec>,
}

impl Diagnosis {
    pub fn is_generic(&self) -> bool {
        self.message_key == GENERIC_FAILURE
    }
}

fn rule_matches(pattern: Option<&str>, failure: &str) -> bool {
    let Some(pattern) = pattern else {
        return true;
    };
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => re.is_match(failure),
        Err(e) => {
            warn!(pattern, error = %e, "invalid diagnosis pattern");
            false
        }
    }
}

/// Diagnose the first failing probe, or `None` when everything passes.
///
/// The first rule for that probe whose pattern matches wins; rules without
/// a pattern match anything. Without a matching rule the diagnosis is
/// generic and points at the component's install hint.
pub fn diagnose(component: &ComponentSpec, outcome: &ComponentOutcome) -> Option<Diagnosis> {
    let failed = outcome.first_failure()?;

    let rule = component
        .diagnoses
        .iter()
        .filter(|rule| rule.probe == failed.id)
        .find(|rule| rule_matches(rule.pattern, &failed.result.message));

    let (message_key, remedies) = match rule {
        Some(rule) => {
            let remedies: Vec<&'static RemedySpec> = rule
                .remedies
                .iter()
                .filter_map(|tag| component.remedy(tag))
                .collect();
            (rule.message_key, remedies)
        }
        None => (GENERIC_FAILURE, Vec::new()),
    };

    let (message_key, message) = match catalog(message_key) {
        Some(m) => (message_key, *m),
        None => {
            warn!(key = message_key, "missing catalog message");
            (GENERIC_FAILURE, *generic_message())
        }
    };

    debug!(
        component = component.name,
        probe = %failed.id,
        message_key,
        "diagnosed"
    );
    Some(Diagnosis {
        probe: failed.id.clone(),
        label: failed.label.clone(),
        failure: failed.result.message.clone(),
        message_key,
        message,
        hint: (message_key == GENERIC_FAILURE).then_some(component.install_hint),
        remedies,
    })
}

fn generic_message() -> &'static Message {
    const FALLBACK: Message = Message {
        summary: "This check failed.",
        instructions: &[],
    };
    catalog(GENERIC_FAILURE).unwrap_or(&FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{self, ProbeReport};
    use crate::components::{self, DiagnosisRule};
    use crate::error::Result;
    use crate::host::{CheckResult, HostContext, ProbeSpec, ScenarioHost, ScenarioTable};

    fn outcome_for(
        name: &str,
        selections: &[(&str, usize)],
    ) -> (&'static ComponentSpec, ComponentOutcome) {
        let component = components::find(name).unwrap();
        let mut host = ScenarioHost::new(ScenarioTable::builtin());
        for (probe, index) in selections {
            host.select(probe, *index).unwrap();
        }
        let outcome = checker::check(component, &host);
        (component, outcome)
    }

    fn tags(d: &Diagnosis) -> Vec<&str> {
        d.remedies.iter().map(|r| r.tag).collect()
    }

    #[test]
    fn passing_component_has_no_diagnosis() {
        let (component, outcome) = outcome_for("node", &[]);
        assert!(diagnose(component, &outcome).is_none());
    }

    #[test]
    fn access_denied_offers_password_update() {
        let (component, outcome) = outcome_for("mysql", &[("mysql.credentials", 1)]);
        let d = diagnose(component, &outcome).unwrap();
        assert_eq!(d.probe, "mysql.credentials");
        assert_eq!(d.message_key, "mysql.access_denied");
        assert_eq!(tags(&d)[0], "update_password");
    }

    #[test]
    fn stopped_service_offers_start() {
        let (component, outcome) = outcome_for("mysql", &[("mysql.service", 1)]);
        let d = diagnose(component, &outcome).unwrap();
        assert_eq!(d.message_key, "mysql.service_stopped");
        assert_eq!(tags(&d), vec!["start_service"]);
    }

    #[test]
    fn first_failing_probe_wins() {
        let (component, outcome) = outcome_for(
            "mysql",
            &[("mysql.database", 1), ("mysql.client", 1)],
        );
        let d = diagnose(component, &outcome).unwrap();
        assert_eq!(d.probe, "mysql.client");
    }

    #[test]
    fn patterns_are_case_insensitive() {
        assert!(rule_matches(Some("access denied"), "ERROR 1045: Access Denied"));
        assert!(rule_matches(None, "anything"));
        assert!(!rule_matches(Some("stopped"), "running"));
    }

    #[test]
    fn outdated_node_is_distinguished() {
        let (component, outcome) = outcome_for("node", &[("node.runtime", 2)]);
        assert_eq!(diagnose(component, &outcome).unwrap().message_key, "node.outdated");
        let (component, outcome) = outcome_for("node", &[("node.runtime", 1)]);
        assert_eq!(diagnose(component, &outcome).unwrap().message_key, "node.missing");
    }

    fn unused(_: &HostContext) -> Result<CheckResult> {
        Ok(CheckResult::pass("unused"))
    }

    const BARE: ComponentSpec = ComponentSpec {
        name: "bare",
        title: "Bare",
        description: "component without rules",
        probes: &[ProbeSpec {
            id: "bare.thing",
            label: "Thing",
            run: unused,
        }],
        diagnoses: &[DiagnosisRule {
            probe: "bare.thing",
            pattern: Some("never matches this"),
            message_key: "node.missing",
            remedies: &[],
        }],
        remedies: &[],
        install_hint: "Install the thing",
    };

    #[test]
    fn unmatched_failure_is_generic() {
        let outcome = ComponentOutcome {
            component: "bare".to_string(),
            title: "Bare".to_string(),
            results: vec![ProbeReport {
                id: "bare.thing".to_string(),
                label: "Thing".to_string(),
                result: CheckResult::fail("exploded"),
            }],
            overall_ok: false,
        };
        let d = diagnose(&BARE, &outcome).unwrap();
        assert!(d.is_generic());
        assert_eq!(d.hint, Some("Install the thing"));
        assert!(d.remedies.is_empty());
        assert_eq!(d.failure, "exploded");
    }
}
