//! Dry-run host backed by canned probe results.
//!
//! Every probe id maps to an ordered list of alternatives; index 0 is the
//! passing one. A run picks one alternative per probe (default 0), so a
//! walkthrough like "MySQL installed but stopped" is just
//! `--scenario mysql.service=1`. Remediations are announced, not run, and
//! reset the probes they fix back to index 0.

use super::{CheckResult, Host, ProbeSpec, RemedySpec};
use crate::error::{ReadyError, Result};
use crate::ui::UserInterface;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::debug;

type Alternatives = &'static [(bool, &'static str)];

const BUILTIN: &[(&str, Alternatives)] = &[
    (
        "node.runtime",
        &[
            (true, "Node.js v20.11.0"),
            (false, "node not found on PATH"),
            (false, "Node.js v16.20.2 is older than the required 18.x"),
        ],
    ),
    (
        "node.npm",
        &[(true, "npm 10.2.4"), (false, "npm not found on PATH")],
    ),
    (
        "backend.package_json",
        &[
            (true, "backend/package.json found"),
            (false, "no package.json in backend"),
        ],
    ),
    (
        "backend.node_modules",
        &[
            (true, "12 dependencies installed"),
            (false, "node_modules not found in backend"),
            (false, "2 dependencies missing: mysql2, dotenv"),
        ],
    ),
    (
        "mysql.config",
        &[
            (true, "DB_USER, DB_PASSWORD and DB_NAME are set"),
            (false, "not configured: DB_PASSWORD"),
            (false, "placeholder values: DB_PASSWORD"),
        ],
    ),
    (
        "mysql.client",
        &[
            (true, "mysql  Ver 8.0.36 for Win64 on x86_64"),
            (false, "mysql not found on PATH"),
        ],
    ),
    (
        "mysql.service",
        &[
            (true, "MySQL80 is running"),
            (false, "MySQL80 is stopped"),
            (false, "no MySQL service found (tried MySQL80, MySQL, mysql, mysqld, mariadb)"),
        ],
    ),
    (
        "mysql.credentials",
        &[
            (true, "connected as root@localhost"),
            (
                false,
                "ERROR 1045 (28000): Access denied for user 'root'@'localhost' (using password: YES)",
            ),
            (
                false,
                "ERROR 2003 (HY000): Can't connect to MySQL server on 'localhost:3306'",
            ),
        ],
    ),
    (
        "mysql.database",
        &[
            (true, "database 'game' exists"),
            (false, "database 'game' does not exist"),
        ],
    ),
    (
        "gpu.driver",
        &[
            (true, "NVIDIA GeForce RTX 3080, driver 551.23"),
            (false, "nvidia-smi not found on PATH"),
            (
                false,
                "NVIDIA-SMI has failed because it couldn't communicate with the NVIDIA driver",
            ),
        ],
    ),
    (
        "gpu.cuda",
        &[(true, "CUDA 12.4"), (false, "nvcc not found on PATH")],
    ),
    (
        "toolchain.compiler",
        &[
            (true, "Visual Studio Build Tools 2022"),
            (false, "no C/C++ compiler found"),
        ],
    ),
    (
        "toolchain.cmake",
        &[
            (true, "cmake version 3.28.1"),
            (false, "cmake not found on PATH"),
        ],
    ),
    (
        "llm.python",
        &[
            (true, "Python 3.11.7 (python)"),
            (false, "no Python interpreter found (tried python, py, python3)"),
            (false, "Python 3.7.9 is older than the required 3.8"),
        ],
    ),
    (
        "llm.library",
        &[
            (true, "llama_cpp 0.2.56"),
            (false, "No module named 'llama_cpp'"),
            (
                false,
                "llama_cpp failed to import: OSError: could not load llama.dll",
            ),
        ],
    ),
    (
        "llm.model",
        &[
            (true, "models/llama-3-8b.Q4_K_M.gguf (4.9 GB)"),
            (false, "MODEL_PATH is not set"),
            (false, "MODEL_PATH is a placeholder: /path/to/model.gguf"),
            (false, "model file not found: models/missing.gguf"),
            (false, "not a GGUF file: models/model.bin"),
        ],
    ),
];

/// Probe id to ordered canned results.
#[derive(Debug, Clone, Default)]
pub struct ScenarioTable {
    entries: BTreeMap<String, Vec<CheckResult>>,
}

impl ScenarioTable {
    /// The table shipped with the binary, covering every registered probe.
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(id, alternatives)| {
                let results = alternatives
                    .iter()
                    .map(|&(ok, message)| CheckResult {
                        ok,
                        message: message.to_string(),
                    })
                    .collect();
                (id.to_string(), results)
            })
            .collect();
        Self { entries }
    }

    /// Parse a YAML mapping of probe id to a list of `{ok, message}`.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let entries: BTreeMap<String, Vec<CheckResult>> =
            serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        if let Some((id, _)) = entries.iter().find(|(_, alts)| alts.is_empty()) {
            return Err(format!("probe '{}' has no alternatives", id));
        }
        Ok(Self { entries })
    }

    /// Load a scenario file and lay it over this table.
    ///
    /// Probes named in the file replace their builtin alternatives.
    pub fn extend_from_file(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(ReadyError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        let other = Self::parse(&content).map_err(|message| ReadyError::ConfigParseError {
            path: path.to_path_buf(),
            message,
        })?;
        debug!(path = %path.display(), probes = other.entries.len(), "loaded scenarios");
        self.entries.extend(other.entries);
        Ok(())
    }

    /// All alternatives for a probe.
    pub fn alternatives(&self, probe: &str) -> Option<&[CheckResult]> {
        self.entries.get(probe).map(Vec::as_slice)
    }

    /// The alternative at `index` for a probe.
    pub fn get(&self, probe: &str, index: usize) -> Result<&CheckResult> {
        let alternatives = self.entries.get(probe).map(Vec::as_slice).unwrap_or(&[]);
        alternatives
            .get(index)
            .ok_or_else(|| ReadyError::UnknownScenario {
                probe: probe.to_string(),
                index,
                available: alternatives.len(),
            })
    }

    /// Probe ids in the table, sorted.
    pub fn probes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Answers probes from a [`ScenarioTable`] without touching the machine.
#[derive(Debug, Clone)]
pub struct ScenarioHost {
    table: ScenarioTable,
    selection: HashMap<String, usize>,
}

impl ScenarioHost {
    pub fn new(table: ScenarioTable) -> Self {
        Self {
            table,
            selection: HashMap::new(),
        }
    }

    /// Pick which alternative a probe answers with.
    pub fn select(&mut self, probe: &str, index: usize) -> Result<()> {
        self.table.get(probe, index)?;
        self.selection.insert(probe.to_string(), index);
        Ok(())
    }

    /// Currently selected index for a probe.
    pub fn selected(&self, probe: &str) -> usize {
        self.selection.get(probe).copied().unwrap_or(0)
    }

    pub fn table(&self) -> &ScenarioTable {
        &self.table
    }
}

impl Host for ScenarioHost {
    fn probe(&self, probe: &ProbeSpec) -> CheckResult {
        let index = self.selected(probe.id);
        match self.table.get(probe.id, index) {
            Ok(result) => result.clone(),
            Err(_) => CheckResult::pass(format!("[dry-run] no scenario for {}", probe.id)),
        }
    }

    fn remediate(&mut self, remedy: &RemedySpec, ui: &mut dyn UserInterface) -> CheckResult {
        ui.message(&format!("[dry-run] would run: {}", remedy.label));
        for id in remedy.fixes {
            self.selection.insert(id.to_string(), 0);
        }
        debug!(remedy = remedy.tag, fixes = ?remedy.fixes, "simulated remediation");
        CheckResult::pass(format!("[dry-run] {}", remedy.label))
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
