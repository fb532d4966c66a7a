use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Handle for a drive attached to a [`QemuOptions`](crate::QemuOptions).
///
/// Issued by `add_cdrom`/`add_hard_drive` and only meaningful for the
/// instance that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DriveId(u32);

impl DriveId {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Drive id token used in the rendered arguments, e.g. `drive0`.
    pub fn token(&self) -> String {
        format!("drive{}", self.0)
    }
}

impl Display for DriveId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Cdrom,
    Disk,
}

impl MediaKind {
    /// Token for the `media=` drive property.
    pub fn media(&self) -> &'static str {
        match self {
            MediaKind::Cdrom => "cdrom",
            MediaKind::Disk => "disk",
        }
    }

    /// IDE device model paired with a drive of this kind.
    pub fn device_model(&self) -> &'static str {
        match self {
            MediaKind::Cdrom => "ide-cd",
            MediaKind::Disk => "ide-hd",
        }
    }
}

/// A drive attachment. Immutable once added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drive {
    id: DriveId,
    kind: MediaKind,
    path: String,
}

impl Drive {
    pub(crate) fn new(id: DriveId, kind: MediaKind, path: String) -> Self {
        Self { id, kind, path }
    }

    pub fn id(&self) -> DriveId {
        self.id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_id_token() {
        assert_eq!(DriveId::new(0).token(), "drive0");
        assert_eq!(DriveId::new(7).token(), "drive7");
    }

    #[test]
    fn media_tokens() {
        assert_eq!(MediaKind::Cdrom.media(), "cdrom");
        assert_eq!(MediaKind::Disk.media(), "disk");
    }

    #[test]
    fn device_models() {
        assert_eq!(MediaKind::Cdrom.device_model(), "ide-cd");
        assert_eq!(MediaKind::Disk.device_model(), "ide-hd");
    }
}
