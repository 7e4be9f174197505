//! Node.js runtime and npm.

use super::version::parse_version;
use super::{run_install, ComponentSpec, DiagnosisRule};
use crate::error::Result;
use crate::host::{CheckResult, HostContext, ProbeSpec, RemedyContext, RemedySpec};
use crate::shell::{CommandOptions, Platform};

pub const SPEC: ComponentSpec = ComponentSpec {
    name: "node",
    title: "Node.js",
    description: "Node.js runtime and npm for the web backend",
    probes: &[
        ProbeSpec {
            id: "node.runtime",
            label: "Node.js runtime",
            run: check_runtime,
        },
        ProbeSpec {
            id: "node.npm",
            label: "npm",
            run: check_npm,
        },
    ],
    diagnoses: &[
        DiagnosisRule {
            probe: "node.runtime",
            pattern: Some(r"older than"),
            message_key: "node.outdated",
            remedies: &["install_node"],
        },
        DiagnosisRule {
            probe: "node.runtime",
            pattern: None,
            message_key: "node.missing",
            remedies: &["install_node"],
        },
        DiagnosisRule {
            probe: "node.npm",
            pattern: None,
            message_key: "npm.missing",
            remedies: &["install_node"],
        },
    ],
    remedies: &[RemedySpec {
        tag: "install_node",
        label: "Install Node.js LTS",
        fixes: &["node.runtime", "node.npm"],
        run: install_node,
    }],
    install_hint: "Install Node.js LTS from https://nodejs.org/",
};

fn check_runtime(ctx: &HostContext) -> Result<CheckResult> {
    let out = ctx.run("node", &["--version"], ctx.settings.timeouts.probe())?;
    if !out.success {
        return Ok(CheckResult::fail(format!(
            "node --version failed: {}",
            out.error_summary()
        )));
    }

    let reported = out.first_line();
    let Some(version) = parse_version(reported) else {
        return Ok(CheckResult::fail(format!(
            "unrecognized node version: {}",
            reported
        )));
    };

    let required = ctx.settings.versions.node_major;
    if version.major < required {
        return Ok(CheckResult::fail(format!(
            "Node.js {} is older than the required {}.x",
            reported, required
        )));
    }
    Ok(CheckResult::pass(format!("Node.js {}", reported)))
}

fn check_npm(ctx: &HostContext) -> Result<CheckResult> {
    let out = ctx.run("npm", &["--version"], ctx.settings.timeouts.probe())?;
    if out.success {
        Ok(CheckResult::pass(format!("npm {}", out.first_line())))
    } else {
        Ok(CheckResult::fail(format!(
            "npm --version failed: {}",
            out.error_summary()
        )))
    }
}

fn install_node(rc: &mut RemedyContext<'_>) -> Result<CheckResult> {
    let result = match Platform::current() {
        Platform::Windows => run_install(
            rc,
            "Installing Node.js LTS with winget",
            "winget",
            &[
                "install",
                "-e",
                "--id",
                "OpenJS.NodeJS.LTS",
                "--accept-package-agreements",
                "--accept-source-agreements",
            ],
            CommandOptions::default(),
        )?,
        Platform::MacOS => run_install(
            rc,
            "Installing Node.js with Homebrew",
            "brew",
            &["install", "node"],
            CommandOptions::default(),
        )?,
        Platform::Linux => {
            return Ok(CheckResult::fail(
                "automatic install is not available on Linux; install Node.js with your package manager or nvm",
            ))
        }
    };

    if result.ok {
        rc.ui
            .show_hint("Open a new terminal if node is still not found; PATH changes need a fresh shell");
    }
    Ok(result)
}
