use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One device from the hypervisor's listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) bus: Option<String>,
    pub(crate) alias: Option<String>,
}

impl DeviceEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn bus(&self) -> Option<&str> {
        self.bus.as_deref()
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

/// Devices grouped by class, both in the order the hypervisor listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceCatalog {
    pub(crate) sections: IndexMap<String, Vec<DeviceEntry>>,
}

impl DeviceCatalog {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn class_count(&self) -> usize {
        self.sections.len()
    }

    pub fn device_count(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }

    /// Class names in first-seen order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn devices(&self, class: &str) -> Option<&[DeviceEntry]> {
        self.sections.get(class).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DeviceEntry])> {
        self.sections
            .iter()
            .map(|(class, devices)| (class.as_str(), devices.as_slice()))
    }

    /// First device with the given name, searching classes in order.
    pub fn find_device(&self, name: &str) -> Option<&DeviceEntry> {
        self.sections
            .values()
            .flatten()
            .find(|device| device.name == name)
    }

    /// Sorted distinct bus names across all devices.
    pub fn buses(&self) -> Vec<&str> {
        let mut buses: Vec<&str> = self
            .sections
            .values()
            .flatten()
            .filter_map(|device| device.bus())
            .collect();
        buses.sort_unstable();
        buses.dedup();
        buses
    }

    pub(crate) fn insert_class(&mut self, class: impl Into<String>) {
        self.sections.entry(class.into()).or_default();
    }

    pub(crate) fn push_device(&mut self, class: impl Into<String>, device: DeviceEntry) {
        self.sections.entry(class.into()).or_default().push(device);
    }
}
