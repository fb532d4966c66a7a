use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Acceleration backends QEMU can be asked for with `-accel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccelMode {
    Kvm,
    Xen,
    Hax,
    Hvf,
    Nvmm,
    Whpx,
    Tcg,
}

impl AccelMode {
    /// Token accepted by the `-accel` flag.
    pub fn as_flag(&self) -> &'static str {
        match self {
            AccelMode::Kvm => "kvm",
            AccelMode::Xen => "xen",
            AccelMode::Hax => "hax",
            AccelMode::Hvf => "hvf",
            AccelMode::Nvmm => "nvmm",
            AccelMode::Whpx => "whpx",
            AccelMode::Tcg => "tcg",
        }
    }
}

impl Display for AccelMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_flag())
    }
}

#[derive(Error, Debug)]
#[error("unknown acceleration mode: {value}")]
pub struct ParseAccelModeError {
    value: String,
}

impl FromStr for AccelMode {
    type Err = ParseAccelModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kvm" => Ok(AccelMode::Kvm),
            "xen" => Ok(AccelMode::Xen),
            "hax" => Ok(AccelMode::Hax),
            "hvf" => Ok(AccelMode::Hvf),
            "nvmm" => Ok(AccelMode::Nvmm),
            "whpx" => Ok(AccelMode::Whpx),
            "tcg" => Ok(AccelMode::Tcg),
            _ => Err(ParseAccelModeError {
                value: s.to_string(),
            }),
        }
    }
}
