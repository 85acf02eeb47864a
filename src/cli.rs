//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else if let Some(bin) = s.strip_prefix("0b") {
        u32::from_str_radix(bin, 2).map_err(|e| format!("Invalid binary value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a string as a hex or decimal u64
fn parse_hex_u64(s: &str) -> Result<u64, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u64>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "snand")]
#[command(author, version, about = "Serial NAND translation-layer tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Raw image backing the emulated device (created erased if missing)
    #[arg(long, global = true, default_value = "snand.img")]
    pub image: PathBuf,

    /// Chip name from the database (defaults to the first built-in chip)
    #[arg(short, long, global = true)]
    pub chip: Option<String>,

    /// Path to extra chip definitions (a .ron file or a directory of them)
    #[arg(long, global = true)]
    pub chip_db: Option<PathBuf>,

    /// Translation-layer configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Page position shared by the page commands
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Die index
    #[arg(long, default_value_t = 0)]
    pub die: u32,

    /// Block index inside the die
    #[arg(long, value_parser = parse_hex_u32)]
    pub block: u32,

    /// Page index inside the block
    #[arg(long, value_parser = parse_hex_u32)]
    pub page: u32,

    /// Sector bitmap (defaults to the whole page)
    #[arg(long, value_parser = parse_hex_u32)]
    pub sectors: Option<u32>,
}

/// Block position shared by the block commands
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct BlockArgs {
    /// Die index
    #[arg(long, default_value_t = 0)]
    pub die: u32,

    /// Block index inside the die
    #[arg(long, value_parser = parse_hex_u32)]
    pub block: u32,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show chip, geometry and size information
    Info,

    /// Read one page to a file
    Read {
        #[command(flatten)]
        pos: PageArgs,

        /// Output file for the selected data
        #[arg(short, long)]
        output: PathBuf,

        /// Also read the spare area into this file
        #[arg(long)]
        oob: Option<PathBuf>,
    },

    /// Program one page from a file
    Write {
        #[command(flatten)]
        pos: PageArgs,

        /// Input file with the data of the selected sectors
        #[arg(short, long)]
        input: PathBuf,

        /// Spare area bytes to program
        #[arg(long)]
        oob_file: Option<PathBuf>,
    },

    /// Erase one block
    Erase {
        #[command(flatten)]
        pos: BlockArgs,
    },

    /// Scan every block for bad-block markers
    Scan,

    /// Retire a block
    MarkBad {
        #[command(flatten)]
        pos: BlockArgs,
    },

    /// Translate a flat byte address
    Locate {
        /// Byte address (hex or decimal)
        #[arg(value_parser = parse_hex_u64)]
        addr: u64,
    },

    /// Copy a block to another block of the same die
    Copy {
        /// Die index
        #[arg(long, default_value_t = 0)]
        die: u32,

        /// Source block
        #[arg(long, value_parser = parse_hex_u32)]
        from: u32,

        /// Destination block
        #[arg(long, value_parser = parse_hex_u32)]
        to: u32,
    },

    /// List supported chips
    List {
        /// Filter by vendor
        #[arg(long)]
        vendor: Option<String>,
    },
}

impl Commands {
    /// Whether the command changes the array, so the image must be saved
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            Commands::Write { .. } | Commands::Erase { .. } | Commands::MarkBad { .. } | Commands::Copy { .. }
        )
    }
}
