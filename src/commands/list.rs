//! List command implementation

use snand_core::chip::{ChipDatabase, NandChip};

/// List all chips in the database
pub fn list_chips(db: &ChipDatabase, vendor_filter: Option<&str>) {
    println!("Supported NAND chips:");
    println!();
    println!(
        "{:<12} {:<16} {:>10} {:>12} {:>10}",
        "Vendor", "Name", "Size", "Page", "ID"
    );
    println!("{}", "-".repeat(64));

    let chips: Vec<&NandChip> = match vendor_filter {
        Some(vendor) => db.find_by_vendor(vendor),
        None => db.iter().collect(),
    };
    if chips.is_empty() {
        println!("(no chips)");
    }

    for chip in chips {
        let page = format!("{}+{}", chip.page_size, chip.oob_size);
        let id = format!("{:02X} {:04X}", chip.manufacturer_id, chip.device_id);

        println!(
            "{:<12} {:<16} {:>10} {:>12} {:>10}",
            chip.vendor,
            chip.name,
            format_size(chip.total_size()),
            page,
            id
        );
    }
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 * 1024 {
        format!("{} GiB", bytes / (1024 * 1024 * 1024))
    } else if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}
