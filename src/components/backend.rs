//! The web backend's npm dependencies.

use super::{run_install, ComponentSpec, DiagnosisRule};
use crate::error::Result;
use crate::host::{CheckResult, HostContext, ProbeSpec, RemedyContext, RemedySpec};
use crate::shell::CommandOptions;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const SPEC: ComponentSpec = ComponentSpec {
    name: "backend",
    title: "Backend dependencies",
    description: "package.json and installed node_modules for the web backend",
    probes: &[
        ProbeSpec {
            id: "backend.package_json",
            label: "package.json",
            run: check_package_json,
        },
        ProbeSpec {
            id: "backend.node_modules",
            label: "node_modules",
            run: check_node_modules,
        },
    ],
    diagnoses: &[
        DiagnosisRule {
            probe: "backend.package_json",
            pattern: None,
            message_key: "backend.no_package_json",
            remedies: &[],
        },
        DiagnosisRule {
            probe: "backend.node_modules",
            pattern: None,
            message_key: "backend.deps_missing",
            remedies: &["npm_install"],
        },
    ],
    remedies: &[RemedySpec {
        tag: "npm_install",
        label: "Run npm install in the backend directory",
        fixes: &["backend.node_modules"],
        run: npm_install,
    }],
    install_hint: "Run `npm install` in the backend directory",
};

#[derive(Debug, Default, Deserialize)]
struct PackageJson {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
}

fn read_package_json(path: &Path) -> std::result::Result<PackageJson, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&content).map_err(|e| format!("invalid package.json: {}", e))
}

fn check_package_json(ctx: &HostContext) -> Result<CheckResult> {
    let dir = ctx.backend_dir();
    let path = dir.join("package.json");
    if !path.is_file() {
        return Ok(CheckResult::fail(format!(
            "no package.json in {}",
            ctx.settings.backend_dir.display()
        )));
    }
    match read_package_json(&path) {
        Ok(_) => Ok(CheckResult::pass(format!(
            "{} found",
            ctx.settings.backend_dir.join("package.json").display()
        ))),
        Err(e) => Ok(CheckResult::fail(e)),
    }
}

fn check_node_modules(ctx: &HostContext) -> Result<CheckResult> {
    let dir = ctx.backend_dir();
    let modules = dir.join("node_modules");
    if !modules.is_dir() {
        return Ok(CheckResult::fail(format!(
            "node_modules not found in {}",
            ctx.settings.backend_dir.display()
        )));
    }

    let package = read_package_json(&dir.join("package.json")).unwrap_or_default();
    let missing: Vec<&str> = package
        .dependencies
        .keys()
        .filter(|name| !modules.join(name.as_str()).join("package.json").is_file())
        .map(String::as_str)
        .collect();

    if missing.is_empty() {
        Ok(CheckResult::pass(format!(
            "{} dependencies installed",
            package.dependencies.len()
        )))
    } else {
        Ok(CheckResult::fail(format!(
            "{} dependencies missing: {}",
            missing.len(),
            missing.join(", ")
        )))
    }
}

fn npm_install(rc: &mut RemedyContext<'_>) -> Result<CheckResult> {
    let dir = rc.host.backend_dir();
    if !dir.join("package.json").is_file() {
        return Ok(CheckResult::fail(format!(
            "cannot run npm install: no package.json in {}",
            dir.display()
        )));
    }
    let options = CommandOptions {
        cwd: Some(dir),
        ..Default::default()
    };
    run_install(
        rc,
        "Installing backend dependencies",
        "npm",
        &["install"],
        options,
    )
}
