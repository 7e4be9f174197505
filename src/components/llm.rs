//! Python, the llama_cpp bindings and the GGUF model file.

use super::version::{meets_minimum, parse_version};
use super::{gpu_disabled, run_install, ComponentSpec, DiagnosisRule};
use crate::config::is_placeholder;
use crate::error::Result;
use crate::host::{CheckResult, HostContext, ProbeSpec, RemedyContext, RemedySpec};
use crate::shell::{CommandOptions, Platform};
use crate::ui::{Prompt, PromptOption};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

pub const SPEC: ComponentSpec = ComponentSpec {
    name: "llm",
    title: "Local LLM",
    description: "Python, llama-cpp-python and a GGUF model file",
    probes: &[
        ProbeSpec {
            id: "llm.python",
            label: "Python",
            run: check_python,
        },
        ProbeSpec {
            id: "llm.library",
            label: "llama_cpp",
            run: check_library,
        },
        ProbeSpec {
            id: "llm.model",
            label: "Model file",
            run: check_model,
        },
    ],
    diagnoses: &[
        DiagnosisRule {
            probe: "llm.python",
            pattern: Some(r"older than"),
            message_key: "llm.python_outdated",
            remedies: &["install_python"],
        },
        DiagnosisRule {
            probe: "llm.python",
            pattern: None,
            message_key: "llm.python_missing",
            remedies: &["install_python"],
        },
        DiagnosisRule {
            probe: "llm.library",
            pattern: Some(r"no usable python"),
            message_key: "llm.python_missing",
            remedies: &["install_python"],
        },
        DiagnosisRule {
            probe: "llm.library",
            pattern: Some(r"^no module named 'llama_cpp'$"),
            message_key: "llm.library_missing",
            remedies: &["install_library"],
        },
        DiagnosisRule {
            probe: "llm.library",
            pattern: None,
            message_key: "llm.library_broken",
            remedies: &["reinstall_library", "install_library"],
        },
        DiagnosisRule {
            probe: "llm.model",
            pattern: Some(r"is not set"),
            message_key: "llm.model_unset",
            remedies: &["find_model", "set_model_path"],
        },
        DiagnosisRule {
            probe: "llm.model",
            pattern: Some(r"placeholder"),
            message_key: "llm.model_placeholder",
            remedies: &["find_model", "set_model_path"],
        },
        DiagnosisRule {
            probe: "llm.model",
            pattern: Some(r"not found"),
            message_key: "llm.model_not_found",
            remedies: &["find_model", "set_model_path"],
        },
        DiagnosisRule {
            probe: "llm.model",
            pattern: None,
            message_key: "llm.model_invalid",
            remedies: &["find_model", "set_model_path"],
        },
    ],
    remedies: &[
        RemedySpec {
            tag: "install_python",
            label: "Install Python 3",
            fixes: &["llm.python"],
            run: install_python,
        },
        RemedySpec {
            tag: "install_library",
            label: "Install llama-cpp-python with pip",
            fixes: &["llm.library"],
            run: install_library,
        },
        RemedySpec {
            tag: "reinstall_library",
            label: "Rebuild llama-cpp-python from scratch",
            fixes: &["llm.library"],
            run: reinstall_library,
        },
        RemedySpec {
            tag: "find_model",
            label: "Search the project for .gguf models",
            fixes: &["llm.model"],
            run: find_model,
        },
        RemedySpec {
            tag: "set_model_path",
            label: "Enter the model path manually",
            fixes: &["llm.model"],
            run: set_model_path,
        },
    ],
    install_hint: "Install Python 3, run `pip install llama-cpp-python` and set MODEL_PATH in .env",
};

const GGUF_MAGIC: &[u8; 4] = b"GGUF";
const IMPORT_SNIPPET: &str = "import llama_cpp; print(llama_cpp.__version__)";

/// One interpreter and what it reported.
#[derive(Debug)]
struct Interpreter {
    command: String,
    version: String,
    usable: bool,
}

/// Try each configured interpreter in order.
///
/// Older Pythons print `--version` to stderr, so both streams are read.
fn find_interpreters(ctx: &HostContext) -> Vec<Interpreter> {
    let minimum = &ctx.settings.versions.python;
    ctx.settings
        .llm
        .python_commands
        .iter()
        .filter_map(|command| {
            let out = ctx
                .run(command, &["--version"], ctx.settings.timeouts.probe())
                .ok()?;
            if !out.success {
                return None;
            }
            let text = format!("{}\n{}", out.stdout, out.stderr);
            let version = parse_version(&text)?;
            Some(Interpreter {
                command: command.clone(),
                version: version.to_string(),
                usable: meets_minimum(version, minimum),
            })
        })
        .collect()
}

fn usable_python(ctx: &HostContext) -> Option<Interpreter> {
    find_interpreters(ctx).into_iter().find(|i| i.usable)
}

fn check_python(ctx: &HostContext) -> Result<CheckResult> {
    let found = find_interpreters(ctx);
    if let Some(python) = found.iter().find(|i| i.usable) {
        return Ok(CheckResult::pass(format!(
            "Python {} ({})",
            python.version, python.command
        )));
    }
    match found.first() {
        Some(old) => Ok(CheckResult::fail(format!(
            "Python {} is older than the required {}",
            old.version, ctx.settings.versions.python
        ))),
        None => Ok(CheckResult::fail(format!(
            "no Python interpreter found (tried {})",
            ctx.settings.llm.python_commands.join(", ")
        ))),
    }
}

const MISSING_LIBRARY: &str = "No module named 'llama_cpp'";

fn check_library(ctx: &HostContext) -> Result<CheckResult> {
    let Some(python) = usable_python(ctx) else {
        return Ok(CheckResult::fail(
            "no usable Python interpreter to import llama_cpp with",
        ));
    };

    let out = ctx.run(
        &python.command,
        &["-c", IMPORT_SNIPPET],
        ctx.settings.timeouts.probe(),
    )?;
    if out.success {
        return Ok(CheckResult::pass(format!("llama_cpp {}", out.first_line())));
    }

    let summary = out.error_summary();
    if summary.ends_with(MISSING_LIBRARY) {
        Ok(CheckResult::fail(MISSING_LIBRARY))
    } else {
        Ok(CheckResult::fail(format!(
            "llama_cpp failed to import: {}",
            summary
        )))
    }
}

/// Human-readable file size.
fn format_size(bytes: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    const GB: f64 = MB * 1024.0;
    let b = bytes as f64;
    if b >= GB {
        format!("{:.1} GB", b / GB)
    } else {
        format!("{:.1} MB", b / MB)
    }
}

/// Validate a model file, returning its size on success and the failure
/// message otherwise. `shown` is the path as the user wrote it.
fn inspect_model(
    path: &Path,
    shown: &str,
    extension: &str,
    min_bytes: u64,
) -> std::result::Result<u64, String> {
    if !path.is_file() {
        return Err(format!("model file not found: {}", shown));
    }
    let has_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension));
    if !has_extension {
        return Err(format!("not a GGUF file: {}", shown));
    }

    let size = fs::metadata(path).map_err(|e| e.to_string())?.len();
    if size < min_bytes {
        return Err(format!(
            "model file is truncated ({} bytes): {}",
            size, shown
        ));
    }

    let mut magic = [0u8; 4];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .map_err(|e| format!("cannot read {}: {}", shown, e))?;
    if &magic != GGUF_MAGIC {
        return Err(format!("not a GGUF file (bad header): {}", shown));
    }
    Ok(size)
}

fn check_model(ctx: &HostContext) -> Result<CheckResult> {
    let env = ctx.env()?;
    let value = env.get("MODEL_PATH").unwrap_or_default();
    let value = value.trim();
    if value.is_empty() {
        return Ok(CheckResult::fail("MODEL_PATH is not set"));
    }
    if is_placeholder(value) {
        return Ok(CheckResult::fail(format!(
            "MODEL_PATH is a placeholder: {}",
            value
        )));
    }

    let llm = &ctx.settings.llm;
    match inspect_model(
        &ctx.resolve(value),
        value,
        &llm.model_extension,
        llm.min_model_bytes,
    ) {
        Ok(size) => Ok(CheckResult::pass(format!(
            "{} ({})",
            value,
            format_size(size)
        ))),
        Err(message) => Ok(CheckResult::fail(message)),
    }
}

fn install_python(rc: &mut RemedyContext<'_>) -> Result<CheckResult> {
    let result = match Platform::current() {
        Platform::Windows => run_install(
            rc,
            "Installing Python 3 with winget",
            "winget",
            &[
                "install",
                "-e",
                "--id",
                "Python.Python.3.11",
                "--accept-package-agreements",
                "--accept-source-agreements",
            ],
            CommandOptions::default(),
        )?,
        Platform::MacOS => run_install(
            rc,
            "Installing Python 3 with Homebrew",
            "brew",
            &["install", "python@3.11"],
            CommandOptions::default(),
        )?,
        Platform::Linux => {
            return Ok(CheckResult::fail(
                "automatic install is not available on Linux; install python3 and python3-pip with your package manager",
            ))
        }
    };

    if result.ok {
        rc.ui
            .show_hint("Open a new terminal if python is still not found; PATH changes need a fresh shell");
    }
    Ok(result)
}

fn pip_install(rc: &mut RemedyContext<'_>, label: &str, extra: &[&str]) -> Result<CheckResult> {
    let Some(python) = usable_python(rc.host) else {
        return Ok(CheckResult::fail(
            "no usable Python interpreter; install Python first",
        ));
    };

    let mut options = CommandOptions::default();
    let gpu = !gpu_disabled(&rc.host.env()?);
    if gpu {
        options
            .env
            .insert("CMAKE_ARGS".to_string(), "-DGGML_CUDA=on".to_string());
    }

    let mut args = vec!["-m", "pip", "install"];
    args.extend_from_slice(extra);
    args.push("llama-cpp-python");

    rc.ui.message(if gpu {
        "Building llama-cpp-python with CUDA support; this can take several minutes."
    } else {
        "Building llama-cpp-python for CPU inference; this can take several minutes."
    });
    run_install(rc, label, &python.command, &args, options)
}

fn install_library(rc: &mut RemedyContext<'_>) -> Result<CheckResult> {
    pip_install(rc, "Installing llama-cpp-python", &[])
}

fn reinstall_library(rc: &mut RemedyContext<'_>) -> Result<CheckResult> {
    pip_install(
        rc,
        "Reinstalling llama-cpp-python",
        &["--force-reinstall", "--no-cache-dir"],
    )
}

/// Model files under the search directories, one level of nesting deep.
fn discover_models(ctx: &HostContext) -> Vec<PathBuf> {
    let extension = &ctx.settings.llm.model_extension;
    let matches = |p: &Path| {
        p.is_file()
            && p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension))
    };

    let mut found = Vec::new();
    for dir in &ctx.settings.llm.model_search_dirs {
        let Ok(entries) = fs::read_dir(ctx.resolve(dir)) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                if let Ok(nested) = fs::read_dir(&path) {
                    found.extend(nested.flatten().map(|e| e.path()).filter(|p| matches(p)));
                }
            } else if matches(&path) {
                found.push(path);
            }
        }
    }
    found.sort();
    found.dedup();
    found
}

/// The path to store in `.env`: relative to the project when inside it.
fn env_path_for(ctx: &HostContext, path: &Path) -> String {
    path.strip_prefix(&ctx.project_root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn save_model_path(rc: &mut RemedyContext<'_>, value: &str) -> Result<CheckResult> {
    let llm = &rc.host.settings.llm;
    if let Err(message) = inspect_model(
        &rc.host.resolve(value),
        value,
        &llm.model_extension,
        llm.min_model_bytes,
    ) {
        return Ok(CheckResult::fail(message));
    }

    let mut env = rc.host.env()?;
    env.set("MODEL_PATH", value);
    env.save()?;
    Ok(CheckResult::pass(format!("MODEL_PATH set to {}", value)))
}

fn find_model(rc: &mut RemedyContext<'_>) -> Result<CheckResult> {
    let models = discover_models(rc.host);
    if models.is_empty() {
        let dirs: Vec<String> = rc
            .host
            .settings
            .llm
            .model_search_dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect();
        return Ok(CheckResult::fail(format!(
            "no .{} files found in {}",
            rc.host.settings.llm.model_extension,
            dirs.join(", ")
        )));
    }

    let options: Vec<PromptOption> = models
        .iter()
        .map(|path| {
            let value = env_path_for(rc.host, path);
            let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
            PromptOption::new(format!("{} ({})", value, format_size(size)), value)
        })
        .collect();
    let default = options[0].value.clone();

    let choice = rc
        .ui
        .prompt(&Prompt::select(
            "model_path_choice",
            "Which model should the game use?",
            options,
            Some(&default),
        ))?
        .as_string();
    save_model_path(rc, choice.trim())
}

fn set_model_path(rc: &mut RemedyContext<'_>) -> Result<CheckResult> {
    let current = rc
        .host
        .env()?
        .get("MODEL_PATH")
        .filter(|v| !v.trim().is_empty() && !is_placeholder(v));
    let value = rc
        .ui
        .prompt(&Prompt::input(
            "model_path",
            "Path to the .gguf model file",
            current.as_deref(),
        ))?
        .as_string();
    let value = value.trim();
    if value.is_empty() {
        return Ok(CheckResult::fail("no model path entered"));
    }
    save_model_path(rc, value)
}
