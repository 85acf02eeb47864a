//! snand - Serial NAND translation-layer tool
//!
//! Drives an emulated SPI NAND device through the same NFTL API a storage
//! stack would use. The device array lives in a raw image file, so state
//! (data, bad-block markers) persists across invocations.
//!
//! # Architecture
//!
//! Every command goes through [`snand_core::nftl::Nftl`]: requests are
//! validated, serialized and routed to physical or super-page operations
//! as selected by the configuration. Only the transport differs from real
//! hardware: [`snand_dummy::DummyNand`] stands in for the SPI bus.

mod cli;
mod commands;
mod device;

use clap::Parser;
use cli::{Cli, Commands};
use device::Device;
use snand_core::chip::ChipDatabase;

use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    // Load chip database
    let db = match load_chip_database(cli.chip_db.as_deref()) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to load chip database: {}", e);
            std::process::exit(1);
        }
    };

    log::debug!("Loaded {} chip definitions", db.len());

    match &cli.command {
        Commands::List { vendor } => {
            commands::list_chips(&db, vendor.as_deref());
            Ok(())
        }
        command => {
            let config = device::load_config(cli.config.as_deref())?;
            let nftl = device::open(&db, cli.chip.as_deref(), &cli.image, config)?;
            let result = run_on_device(&nftl, command);

            // A failed mutation may still have changed the array
            if command.mutates() {
                device::save(&nftl, &cli.image)?;
            }
            result
        }
    }
}

fn run_on_device(nftl: &Device, command: &Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Info => {
            commands::print_info(nftl);
            Ok(())
        }
        Commands::Read { pos, output, oob } => {
            commands::run_read(nftl, pos, output, oob.as_deref())
        }
        Commands::Write {
            pos,
            input,
            oob_file,
        } => commands::run_write(nftl, pos, input, oob_file.as_deref()),
        Commands::Erase { pos } => commands::run_erase(nftl, pos),
        Commands::Scan => commands::run_scan(nftl),
        Commands::MarkBad { pos } => commands::run_mark_bad(nftl, pos),
        Commands::Locate { addr } => commands::run_locate(nftl, *addr),
        Commands::Copy { die, from, to } => commands::run_copy(nftl, *die, *from, *to),
        Commands::List { .. } => Ok(()),
    }
}

/// Load the built-in chips plus the definitions at `path`, if any
fn load_chip_database(path: Option<&Path>) -> Result<ChipDatabase, Box<dyn std::error::Error>> {
    let mut db = ChipDatabase::with_builtin();

    if let Some(path) = path {
        let count = if path.is_dir() {
            db.load_dir(path)?
        } else if path.is_file() {
            db.load_file(path)?
        } else {
            return Err(format!("Chip database path not found: {}", path.display()).into());
        };
        log::debug!("Loaded {} chips from {}", count, path.display());
    }

    Ok(db)
}
