//! Tolerant `major.minor.patch` extraction from tool version banners.
//!
//! Banners vary wildly (`uv 0.7.1 (abcdef 2024-01-01)`, `v20.11.0`,
//! `fnm 1.38.1`), so parsing looks for the first dotted numeric run anywhere
//! in the text and ignores whatever surrounds it. Pre-release and build
//! suffixes are never part of the match and never affect ordering.

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("valid regex"))
}

impl SemVer {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Extract the first version number from arbitrary text.
    ///
    /// A missing patch component defaults to 0. A component too large to
    /// fit in a `u64` is treated as 0 for that position only.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = version_pattern().captures(text)?;
        let component = |idx: usize| {
            caps.get(idx)
                .map(|m| m.as_str().parse::<u64>().unwrap_or(0))
                .unwrap_or(0)
        };
        Some(Self::new(component(1), component(2), component(3)))
    }

    pub fn compare(&self, other: &SemVer) -> Ordering {
        self.cmp(other)
    }

    /// Inclusive floor check: `self >= floor`.
    pub fn at_least(&self, floor: &SemVer) -> bool {
        self.compare(floor) != Ordering::Less
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

// -------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------
