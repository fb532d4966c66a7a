//! The persisted catalog format.
//!
//! One class per section: the class name in square brackets on its own
//! line, then one line per device. A device line is the device name
//! followed by any present optional fields as `key=value`, tab-separated,
//! in the fixed order `desc`, `bus`, `alias`:
//!
//! ```text
//! [USB devices]
//! qemu-xhci\tdesc=Basic USB xHCI controller\tbus=PCI\talias=xhci
//! usb-host\tbus=usb-bus
//! ```
//!
//! Tabs and newlines are reserved and never appear in a rendered value;
//! the writer replaces them with spaces. Sections are separated by one
//! blank line; blank lines are otherwise ignored. A repeated class header
//! continues the earlier class.

use crate::catalog::{DeviceCatalog, DeviceEntry};
use crate::error::ArtifactError;

impl DeviceCatalog {
    /// Render the catalog in the persisted format. Classes and devices keep
    /// their catalog order, so rendering is deterministic.
    pub fn to_artifact_string(&self) -> String {
        let mut out = String::new();
        for (index, (class, devices)) in self.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push('[');
            out.push_str(class);
            out.push_str("]\n");
            for device in devices {
                out.push_str(&clean(&device.name));
                if let Some(description) = &device.description {
                    out.push_str("\tdesc=");
                    out.push_str(&clean(description));
                }
                if let Some(bus) = &device.bus {
                    out.push_str("\tbus=");
                    out.push_str(&clean(bus));
                }
                if let Some(alias) = &device.alias {
                    out.push_str("\talias=");
                    out.push_str(&clean(alias));
                }
                out.push('\n');
            }
        }
        out
    }

    /// Parse text in the persisted format back into a catalog.
    ///
    /// Unlike the hypervisor listing parser this is strict: the format is
    /// ours, so a device line outside any class or with a field that is not
    /// `key=value` is an error, not something to skip.
    pub fn from_artifact_str(input: &str) -> Result<DeviceCatalog, ArtifactError> {
        let mut catalog = DeviceCatalog::default();
        let mut current_class: Option<String> = None;

        for (index, line) in input.lines().enumerate() {
            let number = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            if let Some(class) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
                current_class = Some(class.to_string());
                catalog.insert_class(class);
                continue;
            }

            let Some(class) = &current_class else {
                return Err(ArtifactError::EntryBeforeClass { line: number });
            };

            let mut fields = line.split('\t');
            let name = fields.next().unwrap_or_default();
            if name.is_empty() {
                return Err(ArtifactError::MissingName { line: number });
            }

            let mut device = DeviceEntry {
                name: name.to_string(),
                description: None,
                bus: None,
                alias: None,
            };
            for field in fields {
                match field.split_once('=') {
                    Some(("desc", value)) => device.description = Some(value.to_string()),
                    Some(("bus", value)) => device.bus = Some(value.to_string()),
                    Some(("alias", value)) => device.alias = Some(value.to_string()),
                    _ => {
                        return Err(ArtifactError::MalformedField {
                            line: number,
                            field: field.to_string(),
                        });
                    }
                }
            }
            catalog.push_device(class.clone(), device);
        }

        Ok(catalog)
    }
}

// the format reserves tab and newline
fn clean(value: &str) -> String {
    value.replace(['\t', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::parse_device_listing;

    const LISTING: &str = "\
Storage devices:
name \"ide-hd\", bus IDE, desc \"virtual IDE disk\"
name \"ide-cd\", bus IDE, desc \"virtual IDE CD-ROM\"

USB devices:
name \"qemu-xhci\", bus PCI, desc \"Basic USB xHCI controller\", alias \"xhci\"
";

    #[test]
    fn renders_expected_shape() {
        let catalog = parse_device_listing(LISTING).unwrap();
        assert_eq!(
            catalog.to_artifact_string(),
            "[Storage devices]\n\
             ide-hd\tdesc=virtual IDE disk\tbus=IDE\n\
             ide-cd\tdesc=virtual IDE CD-ROM\tbus=IDE\n\
             \n\
             [USB devices]\n\
             qemu-xhci\tdesc=Basic USB xHCI controller\tbus=PCI\talias=xhci\n"
        );
    }

    #[test]
    fn roundtrips_two_classes_three_devices() {
        let catalog = parse_device_listing(LISTING).unwrap();
        assert_eq!(catalog.class_count(), 2);
        assert_eq!(catalog.device_count(), 3);

        let rendered = catalog.to_artifact_string();
        let reread = DeviceCatalog::from_artifact_str(&rendered).unwrap();
        assert_eq!(reread, catalog);
    }

    #[test]
    fn roundtrips_empty_classes() {
        let mut catalog = DeviceCatalog::default();
        catalog.insert_class("Uncategorized devices");
        let reread = DeviceCatalog::from_artifact_str(&catalog.to_artifact_string()).unwrap();
        assert_eq!(reread, catalog);
    }

    #[test]
    fn device_before_class_is_an_error() {
        let err = DeviceCatalog::from_artifact_str("usb-host\tbus=usb-bus\n").unwrap_err();
        assert!(matches!(err, ArtifactError::EntryBeforeClass { line: 1 }));
    }

    #[test]
    fn malformed_field_is_an_error() {
        let input = "[USB devices]\nusb-host\tbus\n";
        let err = DeviceCatalog::from_artifact_str(input).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::MalformedField { line: 2, .. }
        ));
    }

    #[test]
    fn missing_name_is_an_error() {
        let input = "[USB devices]\n\tbus=usb-bus\n";
        let err = DeviceCatalog::from_artifact_str(input).unwrap_err();
        assert!(matches!(err, ArtifactError::MissingName { line: 2 }));
    }

    #[test]
    fn extra_blank_lines_are_tolerated() {
        let input = "\n[USB devices]\n\n\nusb-host\tbus=usb-bus\n\n";
        let catalog = DeviceCatalog::from_artifact_str(input).unwrap();
        assert_eq!(catalog.device_count(), 1);
    }

    #[test]
    fn reserved_characters_render_as_spaces() {
        let listing = "USB devices:\nname \"usb-host\", desc \"tab\there\"\n";
        let catalog = parse_device_listing(listing).unwrap();

        let rendered = catalog.to_artifact_string();
        assert!(rendered.contains("desc=tab here"));

        let reread = DeviceCatalog::from_artifact_str(&rendered).unwrap();
        assert_eq!(
            reread.find_device("usb-host").unwrap().description(),
            Some("tab here")
        );
    }
}
