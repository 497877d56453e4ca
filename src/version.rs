//! Remote framework version handling
//!
//! The in-database test framework reports its version as
//! `major.minor.bugfix` with an optional build segment
//! (e.g. "3.1.7" or "3.1.7.3085"). The version drives the
//! output-buffer protocol selection in `buffer`.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Version of the remote test framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub bugfix: u32,
    pub build: Option<u32>,
}

/// Version parse errors
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("Invalid version string '{0}': expected major.minor.bugfix[.build]")]
    Invalid(String),
}

impl Version {
    pub const fn new(major: u32, minor: u32, bugfix: u32) -> Self {
        Version {
            major,
            minor,
            bugfix,
            build: None,
        }
    }

    /// True if this version is strictly older than `other`.
    ///
    /// Only the major/minor/bugfix segments participate; the build
    /// segment is compared when both sides carry one.
    pub fn is_older_than(&self, other: &Version) -> bool {
        let lhs = (self.major, self.minor, self.bugfix);
        let rhs = (other.major, other.minor, other.bugfix);
        if lhs != rhs {
            return lhs < rhs;
        }
        match (self.build, other.build) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        }
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() < 3 || parts.len() > 4 {
            return Err(VersionError::Invalid(s.to_string()));
        }

        let parse = |p: &str| p.parse::<u32>().map_err(|_| VersionError::Invalid(s.to_string()));

        Ok(Version {
            major: parse(parts[0])?,
            minor: parse(parts[1])?,
            bugfix: parse(parts[2])?,
            build: match parts.get(3) {
                Some(p) => Some(parse(p)?),
                None => None,
            },
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.bugfix)?;
        if let Some(build) = self.build {
            write!(f, ".{}", build)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_segment_version() {
        let v: Version = "3.1.7".parse().unwrap();
        assert_eq!(v, Version::new(3, 1, 7));
    }

    #[test]
    fn parses_build_segment() {
        let v: Version = "3.1.7.3085".parse().unwrap();
        assert_eq!(v.build, Some(3085));
        assert_eq!(v.to_string(), "3.1.7.3085");
    }

    #[test]
    fn rejects_malformed_versions() {
        assert!("3.1".parse::<Version>().is_err());
        assert!("3.1.x".parse::<Version>().is_err());
        assert!("3.1.7.0.9".parse::<Version>().is_err());
    }

    #[test]
    fn ordering_ignores_missing_build_segment() {
        let bare: Version = "3.1.7".parse().unwrap();
        let with_build: Version = "3.1.7.3085".parse().unwrap();
        assert!(!bare.is_older_than(&with_build));
        assert!(!with_build.is_older_than(&bare));
        assert!(Version::new(3, 0, 9).is_older_than(&Version::new(3, 1, 0)));
        assert!(!Version::new(3, 1, 0).is_older_than(&Version::new(3, 1, 0)));
    }
}
