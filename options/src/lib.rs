use indexmap::IndexMap;

mod accel;
mod drive;
mod error;
mod ram;

pub use crate::accel::*;
pub use crate::drive::*;
pub use crate::error::*;
pub use crate::ram::*;

/// Accumulates launch options for one QEMU invocation and renders them into
/// an argument list.
///
/// Mutations validate their arguments and fail fast; rendering is pure and
/// never fails.
#[derive(Debug, Clone)]
pub struct QemuOptions {
    program: String,
    drives: Vec<Drive>,
    boot_order: IndexMap<DriveId, u32>,
    ram: Option<RamSize>,
    accel: Option<AccelMode>,
    cpu_count: Option<u64>,
    cpu_model: Option<String>,
}

impl QemuOptions {
    /// `program` is the QEMU program token emitted first on the command
    /// line, stored verbatim.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            drives: Vec::new(),
            boot_order: IndexMap::new(),
            ram: None,
            accel: None,
            cpu_count: None,
            cpu_model: None,
        }
    }

    /// Attach a CD-ROM backed by `path` and return its id.
    pub fn add_cdrom(&mut self, path: impl Into<String>) -> Result<DriveId, OptionsError> {
        self.add_drive(MediaKind::Cdrom, path.into())
    }

    /// Attach a hard drive backed by `path` and return its id.
    pub fn add_hard_drive(&mut self, path: impl Into<String>) -> Result<DriveId, OptionsError> {
        self.add_drive(MediaKind::Disk, path.into())
    }

    fn add_drive(&mut self, kind: MediaKind, path: String) -> Result<DriveId, OptionsError> {
        if path.is_empty() {
            return Err(OptionsError::EmptyDrivePath);
        }
        let id = DriveId::new(self.drives.len() as u32);
        self.drives.push(Drive::new(id, kind, path));
        Ok(id)
    }

    /// Give `id` a boot priority; lower priorities boot first. Setting a
    /// priority again overwrites the previous one.
    pub fn set_boot_order(&mut self, id: DriveId, priority: u32) -> Result<(), OptionsError> {
        if !self.drives.iter().any(|drive| drive.id() == id) {
            return Err(OptionsError::UnknownDrive { id });
        }
        self.boot_order.insert(id, priority);
        Ok(())
    }

    /// Last call wins.
    pub fn set_acceleration_mode(&mut self, mode: AccelMode) {
        self.accel = Some(mode);
    }

    pub fn set_ram_megabytes(&mut self, megabytes: i64) -> Result<(), OptionsError> {
        self.ram = Some(RamSize::megabytes(positive(megabytes, "ram megabytes")?));
        Ok(())
    }

    pub fn set_ram_gigabytes(&mut self, gigabytes: i64) -> Result<(), OptionsError> {
        self.ram = Some(RamSize::gigabytes(positive(gigabytes, "ram gigabytes")?));
        Ok(())
    }

    pub fn set_cpu_count(&mut self, count: i64) -> Result<(), OptionsError> {
        self.cpu_count = Some(positive(count, "cpu count")?);
        Ok(())
    }

    pub fn set_cpu_model(&mut self, model: impl Into<String>) -> Result<(), OptionsError> {
        let model = model.into();
        if model.is_empty() {
            return Err(OptionsError::EmptyCpuModel);
        }
        self.cpu_model = Some(model);
        Ok(())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Drives in the order they were added.
    pub fn drives(&self) -> &[Drive] {
        &self.drives
    }

    pub fn boot_priority(&self, id: DriveId) -> Option<u32> {
        self.boot_order.get(&id).copied()
    }

    /// Render the arguments that follow the program token.
    ///
    /// Unset options are omitted entirely so the hypervisor applies its own
    /// defaults. Drives with a boot priority come first, ascending, then the
    /// rest in insertion order.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(model) = &self.cpu_model {
            args.push("-cpu".to_string());
            args.push(model.clone());
        }
        if let Some(count) = self.cpu_count {
            args.push("-smp".to_string());
            args.push(count.to_string());
        }
        if let Some(ram) = self.ram {
            args.push("-m".to_string());
            args.push(ram.to_string());
        }
        if let Some(accel) = self.accel {
            args.push("-accel".to_string());
            args.push(accel.as_flag().to_string());
        }
        for drive in self.ordered_drives() {
            let id = drive.id().token();
            args.push("-drive".to_string());
            args.push(format!(
                "file={},id={},media={},if=none",
                drive.path(),
                id,
                drive.kind().media()
            ));
            args.push("-device".to_string());
            let mut device = format!("{},drive={}", drive.kind().device_model(), id);
            if let Some(priority) = self.boot_priority(drive.id()) {
                device.push_str(&format!(",bootindex={priority}"));
            }
            args.push(device);
        }
        args
    }

    /// Render the full invocation as a single space-joined string.
    ///
    /// Values are passed through verbatim: no quoting or shell escaping is
    /// applied, so a drive path containing spaces, commas or quotes corrupts
    /// the rendered string.
    pub fn to_command_line(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.to_args());
        parts.join(" ")
    }

    fn ordered_drives(&self) -> Vec<&Drive> {
        let (mut ordered, rest): (Vec<&Drive>, Vec<&Drive>) = self
            .drives
            .iter()
            .partition(|drive| self.boot_order.contains_key(&drive.id()));
        ordered.sort_by_key(|drive| (self.boot_priority(drive.id()), drive.id()));
        ordered.extend(rest);
        ordered
    }
}

fn positive(value: i64, field: &'static str) -> Result<u64, OptionsError> {
    if value > 0 {
        Ok(value as u64)
    } else {
        Err(OptionsError::NotPositive { field, value })
    }
}
