use std::path::{PathBuf, MAIN_SEPARATOR};
use std::str::FromStr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use skiff_devices::{generate_devices_file, introspect_devices, CatalogError};
use skiff_options::{AccelMode, OptionsError, QemuOptions};
use thiserror::Error;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "skiff", version, about = "QEMU launch options and device catalog tooling")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long = "log", global = true, default_value = "info", env = "SKIFF_LOG")]
    pub log: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a QEMU command line from launch options
    Render(RenderArgs),

    /// Generate the device catalog file from a hypervisor
    Devices(DevicesArgs),
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// QEMU program token, emitted as-is
    #[arg(long = "qemu")]
    pub qemu: String,

    /// Attach a CD-ROM image; repeatable
    #[arg(long = "cdrom")]
    pub cdroms: Vec<String>,

    /// Attach a hard drive image; repeatable, after all CD-ROMs
    #[arg(long = "disk")]
    pub disks: Vec<String>,

    /// Boot priority as DRIVE=PRIORITY, DRIVE counting attachments from 0
    #[arg(long = "boot")]
    pub boots: Vec<BootOrderArg>,

    /// Guest RAM in megabytes
    #[arg(long = "ram-mb", conflicts_with = "ram_gb")]
    pub ram_mb: Option<i64>,

    /// Guest RAM in gigabytes
    #[arg(long = "ram-gb")]
    pub ram_gb: Option<i64>,

    /// Acceleration mode (kvm, xen, hax, hvf, nvmm, whpx, tcg)
    #[arg(long = "accel")]
    pub accel: Option<AccelMode>,

    /// Number of guest CPUs
    #[arg(long = "smp")]
    pub smp: Option<i64>,

    /// Guest CPU model, e.g. host
    #[arg(long = "cpu")]
    pub cpu: Option<String>,
}

#[derive(Args, Debug)]
pub struct DevicesArgs {
    /// Hypervisor program; bare names are resolved on PATH
    #[arg(long = "qemu")]
    pub qemu: String,

    /// Where to write the catalog
    #[arg(long = "output", default_value = skiff_devices::DEFAULT_DEVICES_FILE)]
    pub output: PathBuf,

    /// Give up if the hypervisor takes longer than this many seconds
    #[arg(long = "timeout-secs")]
    pub timeout_secs: Option<u64>,

    /// Print the catalog as JSON to stdout instead of writing the file
    #[arg(long = "json")]
    pub json: bool,
}

/// `DRIVE=PRIORITY` value for `--boot`.
#[derive(Debug, Clone, Copy)]
pub struct BootOrderArg {
    pub drive_index: u32,
    pub priority: u32,
}

#[derive(Error, Debug)]
#[error("expected DRIVE=PRIORITY, got: {value}")]
pub struct ParseBootOrderError {
    value: String,
}

impl FromStr for BootOrderArg {
    type Err = ParseBootOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseBootOrderError {
            value: s.to_string(),
        };
        let (index, priority) = s.split_once('=').ok_or_else(error)?;
        Ok(Self {
            drive_index: index.parse().map_err(|_| error())?,
            priority: priority.parse().map_err(|_| error())?,
        })
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("no drive {index}: only {count} drives attached")]
    DriveIndexOutOfRange { index: u32, count: usize },

    #[error("program not found on PATH: {program}")]
    ProgramNotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    #[error("failed to encode catalog as json")]
    EncodeJson(#[source] serde_json::Error),
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Render(args) => cmd_render(args).await,
        Command::Devices(args) => cmd_devices(args).await,
    }
}

async fn cmd_render(args: RenderArgs) -> Result<(), AppError> {
    let options = build_options(args)?;
    println!("{}", options.to_command_line());
    Ok(())
}

/// Apply render flags in a fixed order: CD-ROMs, then hard drives, then
/// everything else, so `--boot` indexes are stable.
fn build_options(args: RenderArgs) -> Result<QemuOptions, AppError> {
    let mut options = QemuOptions::new(args.qemu);

    let mut ids = Vec::new();
    for path in args.cdroms {
        ids.push(options.add_cdrom(path)?);
    }
    for path in args.disks {
        ids.push(options.add_hard_drive(path)?);
    }
    for boot in args.boots {
        let id = ids
            .get(boot.drive_index as usize)
            .copied()
            .ok_or(AppError::DriveIndexOutOfRange {
                index: boot.drive_index,
                count: ids.len(),
            })?;
        options.set_boot_order(id, boot.priority)?;
    }

    if let Some(megabytes) = args.ram_mb {
        options.set_ram_megabytes(megabytes)?;
    }
    if let Some(gigabytes) = args.ram_gb {
        options.set_ram_gigabytes(gigabytes)?;
    }
    if let Some(mode) = args.accel {
        options.set_acceleration_mode(mode);
    }
    if let Some(count) = args.smp {
        options.set_cpu_count(count)?;
    }
    if let Some(model) = args.cpu {
        options.set_cpu_model(model)?;
    }

    Ok(options)
}

async fn cmd_devices(args: DevicesArgs) -> Result<(), AppError> {
    let program = resolve_program(&args.qemu)?;
    let timeout = args.timeout_secs.map(Duration::from_secs);

    if args.json {
        let catalog = introspect_devices(&program, timeout).await?;
        let json = serde_json::to_string_pretty(&catalog).map_err(AppError::EncodeJson)?;
        println!("{json}");
    } else {
        let catalog = generate_devices_file(&program, Some(args.output.as_path()), timeout).await?;
        info!(
            "cataloged {} devices in {} classes at {}",
            catalog.device_count(),
            catalog.class_count(),
            args.output.display()
        );
    }
    Ok(())
}

fn resolve_program(qemu: &str) -> Result<PathBuf, AppError> {
    if qemu.contains(MAIN_SEPARATOR) {
        return Ok(PathBuf::from(qemu));
    }
    which::which_global(qemu).map_err(|source| AppError::ProgramNotFound {
        program: qemu.to_string(),
        source,
    })
}
