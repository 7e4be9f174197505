//! Native build toolchain for compiling llama-cpp-python.

use super::{run_install, ComponentSpec, DiagnosisRule};
use crate::error::Result;
use crate::host::{CheckResult, HostContext, ProbeSpec, RemedyContext, RemedySpec};
use crate::shell::{CommandOptions, Platform};
use std::path::PathBuf;

pub const SPEC: ComponentSpec = ComponentSpec {
    name: "toolchain",
    title: "Build toolchain",
    description: "C/C++ compiler and CMake for building llama-cpp-python",
    probes: &[
        ProbeSpec {
            id: "toolchain.compiler",
            label: "C/C++ compiler",
            run: check_compiler,
        },
        ProbeSpec {
            id: "toolchain.cmake",
            label: "CMake",
            run: check_cmake,
        },
    ],
    diagnoses: &[
        DiagnosisRule {
            probe: "toolchain.compiler",
            pattern: None,
            message_key: "toolchain.compiler_missing",
            remedies: &["install_compiler"],
        },
        DiagnosisRule {
            probe: "toolchain.cmake",
            pattern: None,
            message_key: "toolchain.cmake_missing",
            remedies: &["install_cmake"],
        },
    ],
    remedies: &[
        RemedySpec {
            tag: "install_compiler",
            label: "Install a C/C++ compiler",
            fixes: &["toolchain.compiler"],
            run: install_compiler,
        },
        RemedySpec {
            tag: "install_cmake",
            label: "Install CMake with pip",
            fixes: &["toolchain.cmake"],
            run: install_cmake,
        },
    ],
    install_hint: "Install a C/C++ compiler and CMake",
};

const UNIX_COMPILERS: &[&str] = &["cc", "gcc", "clang"];

fn vswhere_path() -> PathBuf {
    let program_files = std::env::var_os("ProgramFiles(x86)")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\Program Files (x86)"));
    program_files
        .join("Microsoft Visual Studio")
        .join("Installer")
        .join("vswhere.exe")
}

fn check_compiler(ctx: &HostContext) -> Result<CheckResult> {
    let timeout = ctx.settings.timeouts.probe();

    if Platform::current() == Platform::Windows {
        let vswhere = vswhere_path();
        if vswhere.is_file() {
            let out = ctx.run(
                &vswhere.to_string_lossy(),
                &[
                    "-latest",
                    "-products",
                    "*",
                    "-requires",
                    "Microsoft.VisualStudio.Component.VC.Tools.x86.x64",
                    "-property",
                    "displayName",
                ],
                timeout,
            )?;
            if out.success && !out.first_line().is_empty() {
                return Ok(CheckResult::pass(out.first_line()));
            }
        }
        return Ok(CheckResult::fail(
            "no C/C++ compiler found (Visual Studio C++ build tools not installed)",
        ));
    }

    for compiler in UNIX_COMPILERS {
        if let Ok(out) = ctx.run(compiler, &["--version"], timeout) {
            if out.success {
                return Ok(CheckResult::pass(out.first_line()));
            }
        }
    }
    Ok(CheckResult::fail(format!(
        "no C/C++ compiler found (tried {})",
        UNIX_COMPILERS.join(", ")
    )))
}

fn check_cmake(ctx: &HostContext) -> Result<CheckResult> {
    let out = ctx.run("cmake", &["--version"], ctx.settings.timeouts.probe())?;
    if out.success {
        Ok(CheckResult::pass(out.first_line()))
    } else {
        Ok(CheckResult::fail(format!(
            "cmake --version failed: {}",
            out.error_summary()
        )))
    }
}

fn install_compiler(rc: &mut RemedyContext<'_>) -> Result<CheckResult> {
    match Platform::current() {
        Platform::Windows => run_install(
            rc,
            "Installing Visual Studio Build Tools with winget",
            "winget",
            &[
                "install",
                "-e",
                "--id",
                "Microsoft.VisualStudio.2022.BuildTools",
                "--override",
                "--quiet --wait --add Microsoft.VisualStudio.Workload.VCTools --includeRecommended",
                "--accept-package-agreements",
                "--accept-source-agreements",
            ],
            CommandOptions::default(),
        ),
        Platform::MacOS => run_install(
            rc,
            "Installing Xcode command line tools",
            "xcode-select",
            &["--install"],
            CommandOptions::default(),
        ),
        Platform::Linux => Ok(CheckResult::fail(
            "automatic install is not available on Linux; install build-essential (Debian/Ubuntu) or gcc-c++ (Fedora)",
        )),
    }
}

/// Install CMake into the Python environment that will build llama-cpp.
fn install_cmake(rc: &mut RemedyContext<'_>) -> Result<CheckResult> {
    let python = rc
        .host
        .settings
        .llm
        .python_commands
        .first()
        .cloned()
        .unwrap_or_else(|| "python3".to_string());
    run_install(
        rc,
        "Installing CMake",
        &python,
        &["-m", "pip", "install", "cmake"],
        CommandOptions::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::{context, FakeRunner};
    use crate::ui::MockUI;
    use tempfile::TempDir;

    #[test]
    fn cmake_version_reported() {
        let temp = TempDir::new().unwrap();
        let runner = FakeRunner::new().ok(
            "cmake --version",
            "cmake version 3.28.1\n\nCMake suite maintained and supported by Kitware\n",
        );
        let ctx = context(temp.path(), runner);
        assert_eq!(
            check_cmake(&ctx).unwrap(),
            CheckResult::pass("cmake version 3.28.1")
        );
    }

    #[test]
    fn missing_cmake_errors_for_the_host() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path(), FakeRunner::new());
        assert!(check_cmake(&ctx).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn first_working_compiler_wins() {
        let temp = TempDir::new().unwrap();
        let runner = FakeRunner::new().ok("gcc --version", "gcc (GCC) 13.2.0\n");
        let calls = runner.calls();
        let ctx = context(temp.path(), runner);

        assert_eq!(
            check_compiler(&ctx).unwrap(),
            CheckResult::pass("gcc (GCC) 13.2.0")
        );
        assert_eq!(
            calls.borrow().as_slice(),
            ["cc --version".to_string(), "gcc --version".to_string()]
        );
    }

    #[cfg(unix)]
    #[test]
    fn no_compiler_lists_candidates() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path(), FakeRunner::new());
        assert_eq!(
            check_compiler(&ctx).unwrap(),
            CheckResult::fail("no C/C++ compiler found (tried cc, gcc, clang)")
        );
    }

    #[test]
    fn install_cmake_uses_configured_python() {
        let temp = TempDir::new().unwrap();
        let python = crate::config::LlmSettings::default().python_commands[0].clone();
        let runner = FakeRunner::new().ok(&format!("{} -m pip install cmake", python), "ok");
        let ctx = context(temp.path(), runner);
        let mut ui = MockUI::new();

        let result = install_cmake(&mut RemedyContext {
            host: &ctx,
            ui: &mut ui,
        })
        .unwrap();
        assert!(result.ok);
    }
}
