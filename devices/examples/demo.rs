use skiff_devices::parse_device_listing;

const LISTING: &str = "\
Storage devices:
name \"ide-hd\", bus IDE, desc \"virtual IDE disk\"
name \"ide-cd\", bus IDE, desc \"virtual IDE CD-ROM\"

USB devices:
name \"qemu-xhci\", bus PCI, desc \"Basic USB xHCI controller\", alias \"xhci\"
name \"usb-tablet\", bus usb-bus, desc \"QEMU USB Tablet, absolute pointer\"
";

fn main() {
    let catalog = parse_device_listing(LISTING).unwrap();
    println!("buses: {:?}", catalog.buses());
    print!("{}", catalog.to_artifact_string());
}
