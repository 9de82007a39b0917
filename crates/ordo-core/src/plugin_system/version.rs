use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use semver::{BuildMetadata, Prerelease, Version, VersionReq};
use thiserror::Error;

use crate::kernel::constants::WILDCARD;

/// Error type for version parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Invalid version format: '{0}'")]
    InvalidFormat(String),
    #[error("Version parse error: {0}")]
    ParseError(String),
}

/// Parses a plugin version leniently.
///
/// Strict semver is tried first. Otherwise missing minor and patch
/// components default to zero (`"1.2"` becomes `1.2.0`) and anything after
/// the first `-` is kept as the pre-release tag (`"1.0-SNAPSHOT"`).
pub fn parse_version(version: &str) -> Result<Version, VersionError> {
    let trimmed = version.trim();
    if trimmed.is_empty() {
        return Err(VersionError::InvalidFormat(version.to_string()));
    }
    if let Ok(v) = Version::parse(trimmed) {
        return Ok(v);
    }

    let (without_build, build) = match trimmed.split_once('+') {
        Some((rest, build)) => (rest, Some(build)),
        None => (trimmed, None),
    };
    let (core, pre) = match without_build.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (without_build, None),
    };

    let mut numbers = [0u64; 3];
    for (index, part) in core.split('.').enumerate() {
        if index >= numbers.len() {
            return Err(VersionError::InvalidFormat(version.to_string()));
        }
        numbers[index] = part
            .parse::<u64>()
            .map_err(|e| VersionError::ParseError(format!("component '{}' of '{}': {}", part, version, e)))?;
    }

    let mut parsed = Version::new(numbers[0], numbers[1], numbers[2]);
    if let Some(pre) = pre {
        parsed.pre = Prerelease::new(pre)
            .map_err(|e| VersionError::ParseError(format!("pre-release '{}' of '{}': {}", pre, version, e)))?;
    }
    if let Some(build) = build {
        parsed.build = BuildMetadata::new(build)
            .map_err(|e| VersionError::ParseError(format!("build metadata '{}' of '{}': {}", build, version, e)))?;
    }
    Ok(parsed)
}

#[derive(Debug, Clone, PartialEq)]
enum Constraint {
    /// `*`, accepts every version
    Any,
    /// A bare version, matched exactly after normalisation
    Exact(Version),
    /// `lower > upper`, inclusive, either side may be `*`
    Between {
        lower: Option<Version>,
        upper: Option<Version>,
    },
    /// Everything else is handed to semver
    Req(VersionReq),
}

/// Represents a version requirement declared by a plugin for one of its
/// dependencies.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRange {
    /// The original constraint string (e.g., "1.0", "1.0 > *", ">=2.0")
    constraint: String,
    kind: Constraint,
}

impl VersionRange {
    /// A range accepting any version.
    pub fn any() -> Self {
        Self {
            constraint: WILDCARD.to_string(),
            kind: Constraint::Any,
        }
    }

    /// Creates a new version range from a constraint string.
    pub fn from_constraint(constraint: &str) -> Result<Self, VersionError> {
        let trimmed = constraint.trim();
        if trimmed.is_empty() || trimmed == WILDCARD {
            return Ok(Self::any());
        }

        if let Some((lower, upper)) = trimmed.split_once('>') {
            if let (Some(lower), Some(upper)) = (parse_bound(lower), parse_bound(upper)) {
                return Ok(Self {
                    constraint: trimmed.to_string(),
                    kind: Constraint::Between { lower, upper },
                });
            }
        }

        if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
            if let Ok(exact) = parse_version(trimmed) {
                return Ok(Self {
                    constraint: trimmed.to_string(),
                    kind: Constraint::Exact(exact),
                });
            }
        }

        let req = VersionReq::parse(trimmed)
            .map_err(|e| VersionError::ParseError(format!("Invalid version constraint '{}': {}", constraint, e)))?;
        Ok(Self {
            constraint: trimmed.to_string(),
            kind: Constraint::Req(req),
        })
    }

    /// Whether this range accepts every version.
    pub fn is_wildcard(&self) -> bool {
        matches!(self.kind, Constraint::Any)
    }

    /// Checks if a specific `semver::Version` satisfies this range.
    pub fn includes(&self, version: &Version) -> bool {
        match &self.kind {
            Constraint::Any => true,
            Constraint::Exact(expected) => version.cmp_precedence(expected) == Ordering::Equal,
            Constraint::Between { lower, upper } => {
                let above = lower
                    .as_ref()
                    .is_none_or(|l| version.cmp_precedence(l) != Ordering::Less);
                let below = upper
                    .as_ref()
                    .is_none_or(|u| version.cmp_precedence(u) != Ordering::Greater);
                above && below
            }
            Constraint::Req(req) => req.matches(version),
        }
    }

    /// Checks a raw plugin version string. Unparsable versions only satisfy
    /// the wildcard.
    pub fn matches_str(&self, version: &str) -> bool {
        if self.is_wildcard() {
            return true;
        }
        match parse_version(version) {
            Ok(v) => self.includes(&v),
            Err(e) => {
                log::debug!("Version '{}' cannot be checked against '{}': {}", version, self.constraint, e);
                false
            }
        }
    }

    /// Returns the original constraint string.
    pub fn constraint_string(&self) -> &str {
        &self.constraint
    }
}

fn parse_bound(bound: &str) -> Option<Option<Version>> {
    let bound = bound.trim();
    if bound == WILDCARD {
        return Some(None);
    }
    if !bound.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    parse_version(bound).ok().map(Some)
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::any()
    }
}

/// Implement Display to show the original constraint string.
impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.constraint)
    }
}

/// Allow parsing directly from a string slice.
impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionRange::from_constraint(s)
    }
}
