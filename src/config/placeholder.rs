//! Detection of template placeholder values.
//!
//! A `.env` copied from `.env.example` often still carries values like
//! `your_password_here`. Those are reported separately from missing keys so
//! the user is told to replace the value rather than add it.

const PLACEHOLDERS: &[&str] = &[
    "changeme",
    "change_me",
    "change-me",
    "password",
    "yourpassword",
    "placeholder",
    "todo",
    "xxx",
    "xxxx",
    "none",
    "null",
    "path/to/model.gguf",
    "/path/to/model.gguf",
];

/// Check whether a configured value is a leftover template placeholder.
///
/// # Example
///
/// ```
/// use readycheck::config::is_placeholder;
///
/// assert!(is_placeholder("your_password_here"));
/// assert!(is_placeholder("<db password>"));
/// assert!(!is_placeholder("s3cr3t!"));
/// ```
pub fn is_placeholder(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    if v.is_empty() {
        return false;
    }

    PLACEHOLDERS.contains(&v.as_str())
        || v.starts_with("your_")
        || v.starts_with("your-")
        || (v.starts_with('<') && v.ends_with('>'))
        || (v.starts_with("${") && v.ends_with('}'))
}
