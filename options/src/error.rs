use thiserror::Error;

use crate::DriveId;

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("drive path must not be empty")]
    EmptyDrivePath,

    #[error("cpu model must not be empty")]
    EmptyCpuModel,

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: i64 },

    #[error("unknown drive id: {id}")]
    UnknownDrive { id: DriveId },
}
