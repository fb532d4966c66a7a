use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use skiff_cmd::Command;
use tracing::{debug, info};

use crate::catalog::DeviceCatalog;
use crate::error::CatalogError;
use crate::listing::parse_device_listing;

/// Default path for [`generate_devices_file`].
pub const DEFAULT_DEVICES_FILE: &str = "qemu-devices.txt";

/// Ask the hypervisor for its device listing and parse it.
///
/// Runs `<program> -device help`. `timeout` bounds the run; `None` waits
/// indefinitely. A missing program, non-zero exit or expired timeout
/// surfaces as [`CatalogError::Command`].
pub async fn introspect_devices(
    program: impl AsRef<OsStr>,
    timeout: Option<Duration>,
) -> Result<DeviceCatalog, CatalogError> {
    let mut command = Command::new(program);
    command.args(["-device", "help"]);
    if let Some(limit) = timeout {
        command.timeout(limit);
    }

    let output = command.run().await?;
    let listing = String::from_utf8_lossy(&output.stdout);
    let catalog = parse_device_listing(&listing)?;
    debug!(
        "hypervisor listed {} devices in {} classes",
        catalog.device_count(),
        catalog.class_count()
    );
    Ok(catalog)
}

/// Introspect the hypervisor and persist its device catalog.
///
/// Writes the catalog to `output` (or [`DEFAULT_DEVICES_FILE`] when `None`),
/// replacing any existing file. Nothing is written unless the whole listing
/// parsed. Returns the catalog so callers can query it without re-reading
/// the file.
pub async fn generate_devices_file(
    program: impl AsRef<OsStr>,
    output: Option<&Path>,
    timeout: Option<Duration>,
) -> Result<DeviceCatalog, CatalogError> {
    let path = output.unwrap_or(Path::new(DEFAULT_DEVICES_FILE));
    let catalog = introspect_devices(program, timeout).await?;

    tokio::fs::write(path, catalog.to_artifact_string())
        .await
        .map_err(|source| CatalogError::WriteCatalog {
            path: path.to_path_buf(),
            source,
        })?;
    info!("wrote device catalog to {}", path.display());
    Ok(catalog)
}

/// Read a catalog previously written by [`generate_devices_file`].
pub async fn load_devices_file(path: impl AsRef<Path>) -> Result<DeviceCatalog, CatalogError> {
    let path = path.as_ref();
    let artifact =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CatalogError::ReadCatalog {
                path: path.to_path_buf(),
                source,
            })?;
    Ok(DeviceCatalog::from_artifact_str(&artifact)?)
}
