//! The plain-text `VERSION` counter.
use std::{fmt, path::Path, str::FromStr};

use crate::error::{AutoshipError, Result};

/// Default location of the version counter relative to the build context.
pub const DEFAULT_VERSION_FILE: &str = "VERSION";

/// A `major.minor.patch` triple. Only the patch component is ever bumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Bump the patch component by one. Fails instead of wrapping when the
    /// patch is already `u64::MAX`.
    pub fn increment(&self) -> Result<Self> {
        let patch = self.patch.checked_add(1).ok_or_else(|| {
            AutoshipError::parse(format!(
                "version {self} cannot be incremented: patch overflows"
            ))
        })?;
        Ok(Self { patch, ..*self })
    }

    /// Read and parse the version file. Surrounding whitespace (the trailing
    /// newline) is ignored.
    pub async fn read(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|err| {
            AutoshipError::environment(format!(
                "unable to read version file {}: {err}",
                path.display()
            ))
        })?;
        content.trim().parse()
    }

    /// Replace the version file with this version on a single line.
    pub async fn write(&self, path: &Path) -> Result<()> {
        tokio::fs::write(path, format!("{self}\n")).await?;
        Ok(())
    }
}

impl FromStr for Version {
    type Err = AutoshipError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            AutoshipError::parse(format!("invalid version \"{s}\": {reason}"))
        };

        let parts = s.split('.').collect::<Vec<_>>();
        let &[major, minor, patch] = parts.as_slice() else {
            return Err(invalid("expected exactly major.minor.patch"));
        };

        let component = |part: &str| -> Result<u64> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("components must be non-negative integers"));
            }
            part.parse::<u64>().map_err(|err| invalid(&err.to_string()))
        };

        Ok(Self::new(
            component(major)?,
            component(minor)?,
            component(patch)?,
        ))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
