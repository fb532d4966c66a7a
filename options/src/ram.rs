use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RamUnit {
    Megabytes,
    Gigabytes,
}

impl RamUnit {
    /// Unit suffix understood by the `-m` flag.
    pub fn suffix(&self) -> &'static str {
        match self {
            RamUnit::Megabytes => "M",
            RamUnit::Gigabytes => "G",
        }
    }
}

/// Guest RAM size as passed to `-m`, e.g. `4096M` or `4G`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RamSize {
    amount: u64,
    unit: RamUnit,
}

impl RamSize {
    pub fn megabytes(amount: u64) -> Self {
        Self {
            amount,
            unit: RamUnit::Megabytes,
        }
    }

    pub fn gigabytes(amount: u64) -> Self {
        Self {
            amount,
            unit: RamUnit::Gigabytes,
        }
    }
}

impl Display for RamSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}
