//! .env file reading and line-preserving rewrites.
//!
//! The game backend reads its database credentials and model path from a
//! plain `KEY=value` file. Remediation actions update single keys in that
//! file, so the document keeps every original line (comments, blank lines,
//! unrelated keys, line endings) and only touches the line it changes.

use crate::error::Result;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A `.env` document.
///
/// # Supported Formats
///
/// - Simple: `KEY=value`
/// - Quoted: `KEY="value with spaces"` or `KEY='single quoted'`
/// - Empty: `KEY=`
/// - Comments: `# This is a comment`
/// - Whitespace around equals: `KEY = value`
/// - Values with equals signs: `URL=https://example.com?foo=bar`
///
/// When a key appears more than once, the last occurrence wins.
///
/// # Example
///
/// ```
/// use readycheck::config::EnvFile;
///
/// let mut env = EnvFile::parse("# Database\nDB_USER=root\nDB_PASSWORD=\"old pass\"\n");
/// assert_eq!(env.get("DB_PASSWORD").as_deref(), Some("old pass"));
///
/// env.set("DB_PASSWORD", "secret");
/// env.set("MODEL_PATH", "models/llama.gguf");
/// assert_eq!(
///     env.render(),
///     "# Database\nDB_USER=root\nDB_PASSWORD=secret\n\nMODEL_PATH=models/llama.gguf\n"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    path: Option<PathBuf>,
    /// Raw lines including their terminators.
    lines: Vec<String>,
}

impl EnvFile {
    /// Parse env file content.
    pub fn parse(content: &str) -> Self {
        Self {
            path: None,
            lines: content.split_inclusive('\n').map(str::to_string).collect(),
        }
    }

    /// Load an env file, returning an empty document bound to `path` if it
    /// doesn't exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        let mut env = if path.exists() {
            Self::parse(&fs::read_to_string(path)?)
        } else {
            Self::default()
        };
        env.path = Some(path.to_path_buf());
        Ok(env)
    }

    /// Path this document was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Look up a key's value with surrounding quotes removed.
    pub fn get(&self, key: &str) -> Option<String> {
        self.lines
            .iter()
            .rev()
            .filter_map(|l| parse_line(l))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| unquote(v).to_string())
    }

    /// Check whether a key is present (even with an empty value).
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// All key/value pairs, last occurrence winning.
    pub fn vars(&self) -> BTreeMap<String, String> {
        self.lines
            .iter()
            .filter_map(|l| parse_line(l))
            .map(|(k, v)| (k.to_string(), unquote(v).to_string()))
            .collect()
    }

    /// Set a key.
    ///
    /// An existing key has its effective (last) line rewritten in place,
    /// keeping that line's terminator. A new key is appended after a blank
    /// separator line. Returns `false` when the value was already current.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        if self.get(key).as_deref() == Some(value) {
            return false;
        }

        let formatted = format!("{}={}", key, quote_if_needed(value));

        let existing = self
            .lines
            .iter()
            .rposition(|l| parse_line(l).is_some_and(|(k, _)| k == key));

        match existing {
            Some(idx) => {
                let terminator = line_terminator(&self.lines[idx]);
                self.lines[idx] = format!("{}{}", formatted, terminator);
            }
            None => {
                if let Some(last) = self.lines.last_mut() {
                    if !last.ends_with('\n') {
                        last.push('\n');
                    }
                    if !last.trim().is_empty() {
                        self.lines.push("\n".to_string());
                    }
                }
                self.lines.push(format!("{}\n", formatted));
            }
        }

        true
    }

    /// Render the document back to text.
    pub fn render(&self) -> String {
        self.lines.concat()
    }

    /// Write the document back to the path it was loaded from.
    ///
    /// The content goes to a temporary file in the same directory first and
    /// is then renamed over the target, so an interrupted write leaves the
    /// previous file intact.
    pub fn save(&self) -> Result<()> {
        let path = self.path.as_deref().ok_or_else(|| {
            anyhow::anyhow!("env document has no backing file; use save_to instead")
        })?;
        self.save_to(path)
    }

    /// Write the document to an explicit path (atomically).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
        temp.write_all(self.render().as_bytes())?;
        temp.flush()?;
        temp.persist(path).map_err(|e| e.error)?;

        debug!(path = %path.display(), "wrote env file");
        Ok(())
    }
}

/// Load the env file at `path`, set one key and save it back.
pub fn update_env_value(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut env = EnvFile::load(path)?;
    if env.set(key, value) {
        env.save()?;
    }
    Ok(())
}

/// Split a raw line into key and raw value, skipping comments and blanks.
fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();

    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, line[eq_pos + 1..].trim()))
}

/// Remove surrounding matching quotes from a value.
fn unquote(value: &str) -> &str {
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Quote values the parser would otherwise alter.
fn quote_if_needed(value: &str) -> String {
    let needs_quotes = value != value.trim()
        || value.contains('#')
        || value.starts_with('"')
        || value.starts_with('\'');

    if !needs_quotes {
        value.to_string()
    } else if value.contains('"') {
        format!("'{}'", value)
    } else {
        format!("\"{}\"", value)
    }
}

fn line_terminator(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}
