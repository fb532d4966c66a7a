use skiff_options::{AccelMode, QemuOptions};

fn main() {
    let mut options = QemuOptions::new("qemu-system-x86_64");
    let cdrom = options.add_cdrom("install.iso").unwrap();
    let disk = options.add_hard_drive("root.img").unwrap();
    options.set_boot_order(cdrom, 0).unwrap();
    options.set_boot_order(disk, 1).unwrap();
    options.set_acceleration_mode(AccelMode::Kvm);
    options.set_ram_gigabytes(4).unwrap();
    options.set_cpu_count(2).unwrap();

    println!("{}", options.to_command_line());
}
