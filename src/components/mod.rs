//! Component definitions.
//!
//! A component is a named bundle of probes, diagnosis rules and
//! remediations for one external prerequisite. Components are plain data;
//! the generic [`flow`](crate::flow) engine interprets them. The registry
//! order is the order the setup driver walks them in: foundations first.

pub mod backend;
pub mod gpu;
pub mod llm;
pub mod messages;
pub mod mysql;
pub mod node;
pub mod toolchain;
pub mod version;

use crate::error::{ReadyError, Result};
use crate::host::{CheckResult, ProbeSpec, RemedyContext, RemedySpec};
use crate::shell::{display_command, CommandOptions};
use std::collections::BTreeSet;

pub use messages::{lookup as message, Message, GENERIC_FAILURE};

/// Static description of one prerequisite.
#[derive(Debug, Clone, Copy)]
pub struct ComponentSpec {
    /// CLI name, e.g. `mysql`.
    pub name: &'static str,
    /// Display title, e.g. `MySQL database`.
    pub title: &'static str,
    pub description: &'static str,
    /// Probes in diagnostic priority order.
    pub probes: &'static [ProbeSpec],
    pub diagnoses: &'static [DiagnosisRule],
    pub remedies: &'static [RemedySpec],
    /// Shown when no rule matches a failure.
    pub install_hint: &'static str,
}

/// Maps a failure signature to a message and the remedies offered for it.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosisRule {
    /// Probe id this rule applies to.
    pub probe: &'static str,
    /// Case-insensitive regex over the failure message. `None` matches any.
    pub pattern: Option<&'static str>,
    /// Message catalog key.
    pub message_key: &'static str,
    /// Remedy tags offered, in menu order.
    pub remedies: &'static [&'static str],
}

impl ComponentSpec {
    pub fn probe(&self, id: &str) -> Option<&'static ProbeSpec> {
        self.probes.iter().find(|p| p.id == id)
    }

    pub fn remedy(&self, tag: &str) -> Option<&'static RemedySpec> {
        self.remedies.iter().find(|r| r.tag == tag)
    }

    /// Every message key this component can show.
    pub fn message_keys(&self) -> BTreeSet<&'static str> {
        self.diagnoses
            .iter()
            .map(|d| d.message_key)
            .chain(std::iter::once(GENERIC_FAILURE))
            .collect()
    }
}

static REGISTRY: [ComponentSpec; 6] = [
    node::SPEC,
    backend::SPEC,
    mysql::SPEC,
    gpu::SPEC,
    toolchain::SPEC,
    llm::SPEC,
];

/// All components in setup order.
pub fn registry() -> &'static [ComponentSpec] {
    &REGISTRY
}

/// Look up a component by name.
pub fn find(name: &str) -> Result<&'static ComponentSpec> {
    registry()
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| ReadyError::UnknownComponent {
            name: name.to_string(),
            available: names().join(", "),
        })
}

/// Component names in setup order.
pub fn names() -> Vec<&'static str> {
    registry().iter().map(|c| c.name).collect()
}

/// Run a long install command behind a spinner.
///
/// A non-zero exit becomes a failing result carrying the tail of the tool's
/// output; a spawn error or timeout propagates.
pub(crate) fn run_install(
    rc: &mut RemedyContext<'_>,
    label: &str,
    program: &str,
    args: &[&str],
    mut options: CommandOptions,
) -> Result<CheckResult> {
    options.timeout = Some(rc.host.settings.timeouts.install());
    if options.cwd.is_none() {
        options.cwd = Some(rc.host.project_root.clone());
    }
    let command = display_command(program, args);

    let mut spinner = rc.ui.start_spinner(label);
    match rc.host.run_with(program, args, &options) {
        Ok(out) if out.success => {
            spinner.finish_success(label);
            Ok(CheckResult::pass(format!("{} succeeded", command)))
        }
        Ok(out) => {
            spinner.finish_error(label);
            Ok(CheckResult::fail(format!(
                "{} failed:\n{}",
                command,
                out.output_tail(5)
            )))
        }
        Err(e) => {
            spinner.finish_error(label);
            Err(e)
        }
    }
}

/// Whether GPU acceleration was turned off with `LLM_USE_GPU`.
pub(crate) fn gpu_disabled(env: &crate::config::EnvFile) -> bool {
    env.get("LLM_USE_GPU")
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no" | "off"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ScenarioTable;
    use regex::Regex;

    #[test]
    fn registry_order() {
        assert_eq!(
            names(),
            vec!["node", "backend", "mysql", "gpu", "toolchain", "llm"]
        );
    }

    #[test]
    fn find_is_case_insensitive() {
        assert_eq!(find("MySQL").unwrap().name, "mysql");
    }

    #[test]
    fn find_unknown_lists_available() {
        let err = find("redis").unwrap_err();
        assert!(err.to_string().contains("node, backend, mysql"));
    }

    #[test]
    fn probe_ids_are_unique_and_prefixed() {
        let mut seen = BTreeSet::new();
        for component in registry() {
            assert!(!component.probes.is_empty(), "{} has no probes", component.name);
            for probe in component.probes {
                assert!(seen.insert(probe.id), "duplicate probe {}", probe.id);
                assert!(
                    probe.id.starts_with(&format!("{}.", component.name)),
                    "{} not under {}",
                    probe.id,
                    component.name
                );
            }
        }
    }

    #[test]
    fn rules_reference_known_probes_and_remedies() {
        for component in registry() {
            for rule in component.diagnoses {
                assert!(
                    component.probe(rule.probe).is_some(),
                    "{}: unknown probe {}",
                    component.name,
                    rule.probe
                );
                for tag in rule.remedies {
                    assert!(
                        component.remedy(tag).is_some(),
                        "{}: unknown remedy {}",
                        component.name,
                        tag
                    );
                }
                if let Some(pattern) = rule.pattern {
                    assert!(Regex::new(pattern).is_ok(), "bad pattern {}", pattern);
                }
            }
        }
    }

    #[test]
    fn remedies_fix_own_probes() {
        for component in registry() {
            for remedy in component.remedies {
                for id in remedy.fixes {
                    assert!(component.probe(id).is_some(), "{} fixes unknown {}", remedy.tag, id);
                }
            }
        }
    }

    #[test]
    fn every_message_key_is_in_catalog() {
        for component in registry() {
            for key in component.message_keys() {
                assert!(message(key).is_some(), "missing message {}", key);
            }
        }
    }

    #[test]
    fn every_probe_has_builtin_scenarios() {
        let table = ScenarioTable::builtin();
        for component in registry() {
            for probe in component.probes {
                let alternatives = table
                    .alternatives(probe.id)
                    .unwrap_or_else(|| panic!("no scenarios for {}", probe.id));
                assert!(alternatives[0].ok);
                assert!(alternatives.len() >= 2, "{} has no failing scenario", probe.id);
            }
        }
    }

    #[test]
    fn gpu_disabled_values() {
        use crate::config::EnvFile;
        assert!(gpu_disabled(&EnvFile::parse("LLM_USE_GPU=false\n")));
        assert!(gpu_disabled(&EnvFile::parse("LLM_USE_GPU=0\n")));
        assert!(!gpu_disabled(&EnvFile::parse("LLM_USE_GPU=true\n")));
        assert!(!gpu_disabled(&EnvFile::parse("")));
    }
}
