//! NVIDIA driver and CUDA toolkit.
//!
//! Both probes pass as waived when `.env` sets `LLM_USE_GPU=false`: the
//! model then runs on the CPU and no GPU stack is needed.

use super::{gpu_disabled, ComponentSpec, DiagnosisRule};
use crate::config::EnvFile;
use crate::error::Result;
use crate::host::{CheckResult, HostContext, ProbeSpec, RemedyContext, RemedySpec};
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

pub const SPEC: ComponentSpec = ComponentSpec {
    name: "gpu",
    title: "GPU acceleration",
    description: "NVIDIA driver and CUDA toolkit for GPU inference",
    probes: &[
        ProbeSpec {
            id: "gpu.driver",
            label: "NVIDIA driver",
            run: check_driver,
        },
        ProbeSpec {
            id: "gpu.cuda",
            label: "CUDA toolkit",
            run: check_cuda,
        },
    ],
    diagnoses: &[
        DiagnosisRule {
            probe: "gpu.driver",
            pattern: Some(r"not found on path"),
            message_key: "gpu.driver_missing",
            remedies: &["use_cpu"],
        },
        DiagnosisRule {
            probe: "gpu.driver",
            pattern: None,
            message_key: "gpu.driver_broken",
            remedies: &["use_cpu"],
        },
        DiagnosisRule {
            probe: "gpu.cuda",
            pattern: None,
            message_key: "gpu.cuda_missing",
            remedies: &["use_cpu"],
        },
    ],
    remedies: &[RemedySpec {
        tag: "use_cpu",
        label: "Run the model on the CPU instead (sets LLM_USE_GPU=false)",
        fixes: &["gpu.driver", "gpu.cuda"],
        run: use_cpu,
    }],
    install_hint: "Install the NVIDIA driver and CUDA toolkit, or set LLM_USE_GPU=false",
};

const WAIVED: &str = "skipped: LLM_USE_GPU=false (CPU inference)";

static CUDA_RELEASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"release (\d+\.\d+)").unwrap());

fn waived(ctx: &HostContext) -> Result<bool> {
    Ok(gpu_disabled(&ctx.env()?))
}

fn check_driver(ctx: &HostContext) -> Result<CheckResult> {
    if waived(ctx)? {
        return Ok(CheckResult::pass(WAIVED));
    }

    let out = ctx.run(
        "nvidia-smi",
        &[
            "--query-gpu=name,driver_version",
            "--format=csv,noheader",
        ],
        ctx.settings.timeouts.probe(),
    )?;
    if !out.success {
        return Ok(CheckResult::fail(out.error_summary()));
    }

    let line = out.first_line();
    match line.split_once(',') {
        Some((name, driver)) => Ok(CheckResult::pass(format!(
            "{}, driver {}",
            name.trim(),
            driver.trim()
        ))),
        None if line.is_empty() => Ok(CheckResult::fail("nvidia-smi reported no GPUs")),
        None => Ok(CheckResult::pass(line)),
    }
}

fn cuda_path_nvcc() -> Option<PathBuf> {
    let root = std::env::var_os("CUDA_PATH")?;
    let exe = if cfg!(windows) { "nvcc.exe" } else { "nvcc" };
    let nvcc = PathBuf::from(root).join("bin").join(exe);
    nvcc.is_file().then_some(nvcc)
}

fn check_cuda(ctx: &HostContext) -> Result<CheckResult> {
    if waived(ctx)? {
        return Ok(CheckResult::pass(WAIVED));
    }

    let out = match ctx.run("nvcc", &["--version"], ctx.settings.timeouts.probe()) {
        Ok(out) => out,
        Err(e) => {
            if let Some(nvcc) = cuda_path_nvcc() {
                return Ok(CheckResult::fail(format!(
                    "nvcc not found on PATH (but {} exists; add its directory to PATH)",
                    nvcc.display()
                )));
            }
            return Err(e);
        }
    };
    if !out.success {
        return Ok(CheckResult::fail(format!(
            "nvcc --version failed: {}",
            out.error_summary()
        )));
    }

    match CUDA_RELEASE_RE.captures(&out.stdout) {
        Some(caps) => Ok(CheckResult::pass(format!("CUDA {}", &caps[1]))),
        None => Ok(CheckResult::pass(out.first_line())),
    }
}

fn use_cpu(rc: &mut RemedyContext<'_>) -> Result<CheckResult> {
    let mut env: EnvFile = rc.host.env()?;
    env.set("LLM_USE_GPU", "false");
    env.save()?;
    rc.ui
        .show_hint("The model will run on the CPU. Set LLM_USE_GPU=true later to switch back.");
    Ok(CheckResult::pass("set LLM_USE_GPU=false in .env"))
}
