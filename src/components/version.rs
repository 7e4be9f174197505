//! Version extraction from tool output.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// A dotted numeric version. Missing parts compare as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").unwrap());

/// Find the first version number in free-form text such as
/// `v20.11.0`, `Python 3.11.7` or `cmake version 3.28.1`.
pub fn parse_version(text: &str) -> Option<Version> {
    let caps = VERSION_RE.captures(text)?;
    let part = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };
    Some(Version {
        major: caps.get(1)?.as_str().parse().ok()?,
        minor: part(2),
        patch: part(3),
    })
}

/// Whether `found` is at least `minimum` (itself parsed leniently).
pub fn meets_minimum(found: Version, minimum: &str) -> bool {
    parse_version(minimum).is_none_or(|min| found >= min)
}
