//! Optional components compiled into this build

use std::fmt;

use crate::cog::CogProfile;
use crate::errors::{MosaicError, MosaicResult};

/// Which feature-gated backends are present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Components {
    pub reprojection: bool,
    pub zstd: bool,
}

impl Components {
    pub fn detect() -> Self {
        Components {
            reprojection: cfg!(feature = "reproject"),
            zstd: cfg!(feature = "zstd"),
        }
    }

    pub fn require_reprojection(&self) -> MosaicResult<()> {
        if self.reprojection {
            Ok(())
        } else {
            Err(MosaicError::MissingOptionalComponent(
                "reprojection (rebuild with the `reproject` feature)".to_string()))
        }
    }

    /// Resolve a COG profile this build can encode
    pub fn require_cog_profile(&self, name: &str) -> MosaicResult<CogProfile> {
        let profile = CogProfile::from_name(name)?;
        if profile == CogProfile::Zstd && !self.zstd {
            return Err(MosaicError::MissingOptionalComponent(
                "zstd codec (rebuild with the `zstd` feature)".to_string()));
        }
        Ok(profile)
    }
}

impl fmt::Display for Components {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |present: bool| if present { "yes" } else { "no" };
        write!(f, "reprojection: {}, zstd: {}", mark(self.reprojection), mark(self.zstd))
    }
}
