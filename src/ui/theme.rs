//! Visual theme and styling.

use console::Style;

/// Status glyphs shared by every output surface.
pub const PASS_ICON: &str = "✓";
pub const FAIL_ICON: &str = "✗";
pub const WARN_ICON: &str = "⚠";
pub const SKIP_ICON: &str = "○";

/// Terminal styling for check results and flow output.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Passing checks (green).
    pub success: Style,
    /// Warnings and partial verdicts (yellow).
    pub warning: Style,
    /// Failing checks (red bold).
    pub error: Style,
    /// Secondary text such as probe details (dim).
    pub dim: Style,
    /// Component titles and headers (bold cyan).
    pub header: Style,
    /// Important values (bold).
    pub highlight: Style,
    /// Instructions for the user (cyan).
    pub hint: Style,
    /// Remedy letters in the choice menu (bold).
    pub key: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

impl Theme {
    /// Create the colored theme.
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
            dim: Style::new().dim(),
            header: Style::new().cyan().bold(),
            highlight: Style::new().bold(),
            hint: Style::new().cyan(),
            key: Style::new().bold(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            dim: Style::new(),
            header: Style::new(),
            highlight: Style::new(),
            hint: Style::new(),
            key: Style::new(),
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("{} {}", PASS_ICON, msg)))
    }

    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("{} {}", WARN_ICON, msg)))
    }

    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("{} {}", FAIL_ICON, msg)))
    }

    pub fn format_skipped(&self, msg: &str) -> String {
        format!("{}", self.dim.apply_to(format!("{} {}", SKIP_ICON, msg)))
    }

    pub fn format_hint(&self, hint: &str) -> String {
        format!("  {}", self.hint.apply_to(format!("→ {}", hint)))
    }

    /// Format a component header banner.
    pub fn format_header(&self, title: &str) -> String {
        format!(
            "{} {}",
            self.header.apply_to("▸"),
            self.highlight.apply_to(title)
        )
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }

    console::colors_enabled() && console::Term::stdout().is_term()
}
