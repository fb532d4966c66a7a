use tracing::warn;

use crate::catalog::{DeviceCatalog, DeviceEntry};
use crate::error::ParseError;

/// Parse the text a hypervisor prints for `-device help`.
///
/// The listing is a sequence of sections: a class header line (unindented,
/// ending in `:`), then one `name ...` entry line per device. Blank lines
/// are ignored and do not end a section. Lines that fit neither shape are
/// skipped with a warning, so listings from unfamiliar hypervisor builds
/// still parse; a listing without any class header is an error.
pub fn parse_device_listing(listing: &str) -> Result<DeviceCatalog, ParseError> {
    let mut catalog = DeviceCatalog::default();
    let mut current_class: Option<String> = None;

    for line in listing.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if !trimmed.starts_with("name ") {
            match header_class(line) {
                Some(class) => {
                    current_class = Some(class.to_string());
                    catalog.insert_class(class);
                }
                None => warn!("skipping unrecognized listing line: {line}"),
            }
            continue;
        }

        let Some(class) = &current_class else {
            warn!("skipping device entry before any class header: {line}");
            continue;
        };

        match entry_from_line(trimmed) {
            Some(device) => catalog.push_device(class.clone(), device),
            None => warn!("skipping unrecognized device entry: {line}"),
        }
    }

    if catalog.is_empty() {
        return Err(ParseError::NoSections);
    }
    Ok(catalog)
}

fn header_class(line: &str) -> Option<&str> {
    if line.starts_with(|c: char| c.is_whitespace()) {
        return None;
    }
    line.trim_end().strip_suffix(':')
}

/// Fold an entry line's property pairs into a [`DeviceEntry`]. `None` means
/// the line is unusable: a bad property pair or no device name.
fn entry_from_line(line: &str) -> Option<DeviceEntry> {
    let mut name = String::new();
    let mut description = None;
    let mut bus = None;
    let mut alias = None;

    for (key, value) in extract_properties(line)? {
        if key.starts_with("name") {
            name = value;
        } else if key.starts_with("desc") {
            description = Some(value);
        } else if key.starts_with("bus") {
            bus = Some(value);
        } else if key.starts_with("alias") {
            alias = Some(value);
        } else {
            return None;
        }
    }

    if name.is_empty() {
        return None;
    }
    Some(DeviceEntry {
        name,
        description,
        bus,
        alias,
    })
}

#[derive(Clone, Copy)]
enum ExtractState {
    /// Skipping spaces before the next key.
    KeySearch,
    Key { start: usize },
    Value { start: usize },
    /// Inside a double-quoted value; `start` is the byte after the quote.
    QuotedValue { start: usize },
    /// Quoted value finished, waiting for the comma.
    PostValue,
}

/// Split one entry line into `key value` pairs.
///
/// Pairs are comma-terminated; values may be double-quoted to carry commas.
/// The pairs come back in line order, so a repeated key resolves to its last
/// value when folded. A quote still open at end of line makes the whole
/// line unusable.
fn extract_properties(line: &str) -> Option<Vec<(String, String)>> {
    let mut state = ExtractState::Key { start: 0 };
    let mut key: Option<&str> = None;
    let mut pairs: Vec<(String, String)> = Vec::new();

    for (index, character) in line.char_indices() {
        match state {
            ExtractState::Key { start } => {
                if character == ' ' {
                    key = Some(&line[start..index]);
                    state = ExtractState::Value { start: index + 1 };
                }
            }
            ExtractState::Value { start } => {
                if character == ',' {
                    push_pair(&mut pairs, &mut key, &line[start..index]);
                    state = ExtractState::KeySearch;
                } else if character == '"' {
                    state = ExtractState::QuotedValue { start: index + 1 };
                }
            }
            ExtractState::QuotedValue { start } => {
                if character == '"' {
                    push_pair(&mut pairs, &mut key, &line[start..index]);
                    state = ExtractState::PostValue;
                }
            }
            ExtractState::PostValue => {
                if character == ',' {
                    state = ExtractState::KeySearch;
                }
            }
            ExtractState::KeySearch => {
                if character != ' ' {
                    state = ExtractState::Key { start: index };
                }
            }
        }
    }

    match state {
        // an unquoted value may run to the end of the line
        ExtractState::Value { start } => {
            let value = &line[start..];
            if !value.is_empty() {
                push_pair(&mut pairs, &mut key, value);
            }
        }
        ExtractState::QuotedValue { .. } => return None,
        _ => {}
    }

    Some(pairs)
}

fn push_pair(pairs: &mut Vec<(String, String)>, key: &mut Option<&str>, value: &str) {
    if let Some(key) = key.take() {
        pairs.push((key.to_string(), value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
Controller/Bridge/Hub devices:
name \"i82801b11-bridge\", bus PCI
name \"igd-passthrough-isa-bridge\", bus ISA, desc \"ISA bridge faked to support IGD PT\"

USB devices:
name \"qemu-xhci\", bus PCI, desc \"Basic USB xHCI controller\", alias \"xhci\"
name \"usb-tablet\", bus usb-bus, desc \"QEMU USB Tablet, absolute pointer\"
";

    #[test]
    fn parses_sections_in_order() {
        let catalog = parse_device_listing(LISTING).unwrap();
        let classes: Vec<&str> = catalog.classes().collect();
        assert_eq!(classes, ["Controller/Bridge/Hub devices", "USB devices"]);
        assert_eq!(catalog.device_count(), 4);
    }

    #[test]
    fn parses_entry_fields() {
        let catalog = parse_device_listing(LISTING).unwrap();
        let usb = catalog.devices("USB devices").unwrap();
        assert_eq!(usb[0].name(), "qemu-xhci");
        assert_eq!(usb[0].bus(), Some("PCI"));
        assert_eq!(usb[0].description(), Some("Basic USB xHCI controller"));
        assert_eq!(usb[0].alias(), Some("xhci"));
        assert_eq!(usb[1].alias(), None);
    }

    #[test]
    fn quoted_description_keeps_comma() {
        let catalog = parse_device_listing(LISTING).unwrap();
        let usb = catalog.devices("USB devices").unwrap();
        assert_eq!(
            usb[1].description(),
            Some("QEMU USB Tablet, absolute pointer")
        );
    }

    #[test]
    fn blank_lines_do_not_end_a_section() {
        let listing = "Storage devices:\n\nname \"ide-hd\", bus IDE\n";
        let catalog = parse_device_listing(listing).unwrap();
        assert_eq!(catalog.devices("Storage devices").unwrap().len(), 1);
    }

    #[test]
    fn entry_before_any_header_is_skipped() {
        let listing = "name \"orphan\", bus PCI\nUSB devices:\nname \"usb-host\", bus usb-bus\n";
        let catalog = parse_device_listing(listing).unwrap();
        assert_eq!(catalog.device_count(), 1);
        assert!(catalog.find_device("orphan").is_none());
    }

    #[test]
    fn unrecognized_lines_are_skipped() {
        let listing = "random preamble\nUSB devices:\nname \"usb-host\", bus usb-bus\nwat 7\n";
        let catalog = parse_device_listing(listing).unwrap();
        assert_eq!(catalog.class_count(), 1);
        assert_eq!(catalog.device_count(), 1);
    }

    #[test]
    fn entry_with_unknown_key_is_skipped() {
        let listing = "USB devices:\nname \"usb-host\", slots 4\n";
        let catalog = parse_device_listing(listing).unwrap();
        assert!(catalog.devices("USB devices").unwrap().is_empty());
    }

    #[test]
    fn listing_without_headers_fails() {
        let listing = "name \"usb-host\", bus usb-bus\n";
        assert!(matches!(
            parse_device_listing(listing),
            Err(ParseError::NoSections)
        ));
    }

    #[test]
    fn empty_listing_fails() {
        assert!(matches!(
            parse_device_listing(""),
            Err(ParseError::NoSections)
        ));
    }

    #[test]
    fn parse_is_deterministic() {
        let first = parse_device_listing(LISTING).unwrap();
        let second = parse_device_listing(LISTING).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn extracts_quoted_and_bare_values() {
        let pairs = extract_properties("name \"e1000\", bus PCI, desc \"Intel Gigabit Ethernet\"")
            .unwrap();
        assert_eq!(
            pairs,
            [
                ("name".to_string(), "e1000".to_string()),
                ("bus".to_string(), "PCI".to_string()),
                ("desc".to_string(), "Intel Gigabit Ethernet".to_string()),
            ]
        );
    }

    #[test]
    fn trailing_bare_value_is_captured() {
        let pairs = extract_properties("name \"usb-mouse\", bus usb-bus").unwrap();
        assert_eq!(pairs[1], ("bus".to_string(), "usb-bus".to_string()));
    }

    #[test]
    fn unterminated_quote_rejects_the_line() {
        assert!(extract_properties("name \"usb-mouse\", desc \"oops").is_none());
    }

    #[test]
    fn unterminated_quote_skips_the_entry() {
        let listing = "USB devices:\nname \"usb-mouse\", desc \"oops\n";
        let catalog = parse_device_listing(listing).unwrap();
        assert!(catalog.devices("USB devices").unwrap().is_empty());
        assert!(catalog.find_device("usb-mouse").is_none());
    }

    #[test]
    fn repeated_key_folds_to_last_value() {
        let listing = "USB devices:\nname \"usb-host\", bus A, bus B\n";
        let catalog = parse_device_listing(listing).unwrap();
        let device = catalog.find_device("usb-host").unwrap();
        assert_eq!(device.bus(), Some("B"));
    }
}
