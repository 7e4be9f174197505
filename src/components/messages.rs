//! Diagnosis message catalog.
//!
//! Every failure the flow can diagnose is paired with a short explanation
//! and concrete next steps, so nothing is ever reported without guidance.

/// Key used when no diagnosis rule matches.
pub const GENERIC_FAILURE: &str = "generic.failure";

/// A diagnosis shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub summary: &'static str,
    pub instructions: &'static [&'static str],
}

const fn msg(summary: &'static str, instructions: &'static [&'static str]) -> Message {
    Message {
        summary,
        instructions,
    }
}

const CATALOG: &[(&str, Message)] = &[
    (
        "node.missing",
        msg(
            "Node.js is not installed or not on PATH.",
            &[
                "Install the LTS release from https://nodejs.org/",
                "Open a new terminal afterwards so PATH is refreshed",
            ],
        ),
    ),
    (
        "node.outdated",
        msg(
            "Node.js is installed but too old for the backend.",
            &["Install the current LTS release from https://nodejs.org/"],
        ),
    ),
    (
        "npm.missing",
        msg(
            "npm is missing. It normally ships with Node.js.",
            &["Reinstall Node.js from https://nodejs.org/ with npm included"],
        ),
    ),
    (
        "backend.no_package_json",
        msg(
            "The backend directory has no package.json.",
            &[
                "Run readycheck from the game's root folder, or pass --project",
                "Set backend_dir in readycheck.yml if the backend lives elsewhere",
            ],
        ),
    ),
    (
        "backend.deps_missing",
        msg(
            "Backend dependencies are not installed.",
            &["Run `npm install` inside the backend directory"],
        ),
    ),
    (
        "mysql.env_missing",
        msg(
            "Database settings are missing from .env.",
            &["Add DB_HOST, DB_USER, DB_PASSWORD and DB_NAME to .env"],
        ),
    ),
    (
        "mysql.env_placeholder",
        msg(
            "Database settings in .env still hold template values.",
            &["Replace the placeholder values with your real MySQL credentials"],
        ),
    ),
    (
        "mysql.client_missing",
        msg(
            "The mysql command-line client is not on PATH.",
            &[
                "Install MySQL Community Server from https://dev.mysql.com/downloads/",
                "Add the MySQL bin directory to PATH",
            ],
        ),
    ),
    (
        "mysql.service_absent",
        msg(
            "No MySQL server is installed as a service.",
            &[
                "Install MySQL Community Server from https://dev.mysql.com/downloads/",
                "Choose to run it as a service during installation",
            ],
        ),
    ),
    (
        "mysql.service_stopped",
        msg(
            "The MySQL service is installed but not running.",
            &["Start the service (may need administrator rights)"],
        ),
    ),
    (
        "mysql.access_denied",
        msg(
            "MySQL rejected the username or password in .env.",
            &[
                "Enter the correct password for the configured user",
                "Or reconfigure the connection settings",
            ],
        ),
    ),
    (
        "mysql.unreachable",
        msg(
            "Could not reach the MySQL server.",
            &[
                "Check that the service is running",
                "Check DB_HOST and DB_PORT in .env",
            ],
        ),
    ),
    (
        "mysql.database_missing",
        msg(
            "The game database does not exist yet.",
            &["Create it, or point DB_NAME at an existing database"],
        ),
    ),
    (
        "gpu.driver_missing",
        msg(
            "No NVIDIA driver was found.",
            &[
                "Install the latest driver from https://www.nvidia.com/drivers",
                "Or run the model on the CPU (slower)",
            ],
        ),
    ),
    (
        "gpu.driver_broken",
        msg(
            "The NVIDIA driver is installed but not responding.",
            &[
                "Reboot, then reinstall the driver if the problem persists",
                "Or run the model on the CPU (slower)",
            ],
        ),
    ),
    (
        "gpu.cuda_missing",
        msg(
            "The CUDA toolkit (nvcc) is not available.",
            &[
                "Install CUDA from https://developer.nvidia.com/cuda-downloads",
                "Add the CUDA bin directory to PATH",
                "Or run the model on the CPU (slower)",
            ],
        ),
    ),
    (
        "toolchain.compiler_missing",
        msg(
            "No C/C++ compiler was found. One is needed to build llama-cpp-python.",
            &[
                "Windows: install Visual Studio Build Tools with the C++ workload",
                "macOS: run `xcode-select --install`",
                "Linux: install build-essential (or gcc and g++)",
            ],
        ),
    ),
    (
        "toolchain.cmake_missing",
        msg(
            "CMake is not installed.",
            &["Install it from https://cmake.org/download/ or with `pip install cmake`"],
        ),
    ),
    (
        "llm.python_missing",
        msg(
            "No Python interpreter was found.",
            &["Install Python 3 from https://www.python.org/downloads/ and add it to PATH"],
        ),
    ),
    (
        "llm.python_outdated",
        msg(
            "Python is too old for llama-cpp-python.",
            &["Install a newer Python 3 from https://www.python.org/downloads/"],
        ),
    ),
    (
        "llm.library_missing",
        msg(
            "The llama_cpp Python package is not installed.",
            &["Install it with `pip install llama-cpp-python`"],
        ),
    ),
    (
        "llm.library_broken",
        msg(
            "llama_cpp is installed but fails to load.",
            &["Reinstall it with `pip install --force-reinstall --no-cache-dir llama-cpp-python`"],
        ),
    ),
    (
        "llm.model_unset",
        msg(
            "MODEL_PATH is not set in .env.",
            &["Download a .gguf model and set MODEL_PATH to its location"],
        ),
    ),
    (
        "llm.model_placeholder",
        msg(
            "MODEL_PATH in .env still holds the template value.",
            &["Set MODEL_PATH to the .gguf model you downloaded"],
        ),
    ),
    (
        "llm.model_not_found",
        msg(
            "The model file in MODEL_PATH does not exist.",
            &["Check the path, or move the model into the models folder"],
        ),
    ),
    (
        "llm.model_invalid",
        msg(
            "The file in MODEL_PATH is not a usable GGUF model.",
            &["Download the model again; the file may be incomplete or the wrong format"],
        ),
    ),
    (
        GENERIC_FAILURE,
        msg("This check failed.", &["Follow the install instructions below"]),
    ),
];

/// Look up a message by key.
pub fn lookup(key: &str) -> Option<&'static Message> {
    CATALOG.iter().find(|(k, _)| *k == key).map(|(_, m)| m)
}
