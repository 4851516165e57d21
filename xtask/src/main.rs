// Licensed under the Apache-2.0 license

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod flag_page;
mod memory_map;

use flag_page::FlagPageCommands;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Xtask {
    #[command(subcommand)]
    xtask: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or inspect flag page images
    FlagPage {
        #[command(subcommand)]
        subcommand: FlagPageCommands,
    },
    /// Print the CRC-32 of an image file
    ImageCrc {
        /// Path to the image file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the default Apollo2 memory map
    MemoryMap,
}

fn main() {
    let cli = Xtask::parse();
    let result = match &cli.xtask {
        Commands::FlagPage { subcommand } => flag_page::run(subcommand),
        Commands::ImageCrc { file } => flag_page::image_crc(file).map(|(len, crc)| {
            println!("{}: {} bytes, CRC-32 0x{:08x}", file.display(), len, crc);
        }),
        Commands::MemoryMap => {
            memory_map::print();
            Ok(())
        }
    };
    result.unwrap_or_else(|e| {
        eprintln!("Error: {:#}", e);
        std::process::exit(-1);
    });
}
