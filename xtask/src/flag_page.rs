// Licensed under the Apache-2.0 license

use anyhow::{anyhow, bail, Result};
use clap::{Subcommand, ValueEnum};
use clap_num::maybe_hex;
use crc32fast::Hasher;
use flash_image::{
    BootOptions, FlagPageRecord, ImageDescriptor, FLAG_PAGE_RECORD_SIZE, NO_OVERRIDE,
    NO_STORAGE_ADDRESS,
};
use std::fs;
use std::path::{Path, PathBuf};
use zerocopy::FromBytes;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Storage {
    Internal,
    External,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum PolarityArg {
    Low,
    High,
}

#[derive(Subcommand)]
pub(crate) enum FlagPageCommands {
    /// Create a flag page announcing a staged image
    Create(CreateArgs),
    /// Decode and print a flag page
    Show {
        /// Path to the flag page file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(clap::Args, Clone, Debug)]
pub(crate) struct CreateArgs {
    /// Image that will be staged; its length and CRC-32 go into the record
    #[arg(long, value_name = "IMAGE")]
    pub image: PathBuf,

    /// Execution address of the image in internal flash
    #[arg(long, value_parser = maybe_hex::<u32>)]
    pub link_address: u32,

    /// Where the staged copy lives
    #[arg(long, value_parser = maybe_hex::<u32>)]
    pub storage_address: u32,

    #[arg(long, value_enum)]
    pub storage: Storage,

    /// The image is encrypted; stack pointer and reset vector must be given
    #[arg(long, default_value_t = false)]
    pub encrypted: bool,

    #[arg(long, value_parser = maybe_hex::<u32>)]
    pub stack_pointer: Option<u32>,

    #[arg(long, value_parser = maybe_hex::<u32>)]
    pub reset_vector: Option<u32>,

    /// GPIO that forces the resident image to boot
    #[arg(long, requires = "override_polarity")]
    pub override_gpio: Option<u32>,

    #[arg(long, value_enum, requires = "override_gpio")]
    pub override_polarity: Option<PolarityArg>,

    /// Flash page size; the output is padded to one page
    #[arg(long, value_parser = maybe_hex::<u32>, default_value = "0x2000")]
    pub page_size: u32,

    /// Output file
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: PathBuf,
}

pub(crate) fn run(command: &FlagPageCommands) -> Result<()> {
    match command {
        FlagPageCommands::Create(args) => {
            let page = create(args)?;
            fs::write(&args.output, page)
                .map_err(|e| anyhow!("Unable to write '{}': {}", args.output.display(), e))?;
            println!("Wrote {}", args.output.display());
            Ok(())
        }
        FlagPageCommands::Show { file } => {
            let descriptor = decode(&load_file(file)?)?;
            print!("{}", describe(&descriptor));
            Ok(())
        }
    }
}

fn load_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| anyhow!("Cannot read file '{}': {}", path.display(), e))
}

pub(crate) fn calculate_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

pub(crate) fn image_crc(path: &Path) -> Result<(usize, u32)> {
    let image = load_file(path)?;
    Ok((image.len(), calculate_checksum(&image)))
}

fn le_word(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

/// Builds the flag page bytes: the record followed by erased flash up to
/// the page size.
pub(crate) fn create(args: &CreateArgs) -> Result<Vec<u8>> {
    let image = load_file(&args.image)?;
    if image.len() % 4 != 0 {
        bail!(
            "Image length {} is not a multiple of 4; pad the image before staging it",
            image.len()
        );
    }
    if image.len() < 8 {
        bail!("Image is too small to hold a vector table");
    }
    if !args.page_size.is_power_of_two() {
        bail!("Page size 0x{:x} is not a power of two", args.page_size);
    }
    if (args.page_size as usize) < FLAG_PAGE_RECORD_SIZE {
        bail!("Page size 0x{:x} cannot hold the record", args.page_size);
    }
    if args.link_address % args.page_size != 0 {
        bail!("Link address 0x{:x} is not page aligned", args.link_address);
    }

    let (stack_pointer, reset_vector) = if args.encrypted {
        match (args.stack_pointer, args.reset_vector) {
            (Some(sp), Some(rv)) => (sp, rv),
            _ => bail!("Encrypted images need --stack-pointer and --reset-vector"),
        }
    } else {
        (le_word(&image, 0), le_word(&image, 4))
    };

    let (override_gpio, override_polarity) = match (args.override_gpio, args.override_polarity) {
        (Some(gpio), Some(PolarityArg::High)) => (gpio, 1),
        (Some(gpio), Some(PolarityArg::Low)) => (gpio, 0),
        _ => (NO_OVERRIDE, NO_OVERRIDE),
    };

    let descriptor = ImageDescriptor {
        link_address: args.link_address,
        num_bytes: u32::try_from(image.len())?,
        crc32: calculate_checksum(&image),
        override_gpio,
        override_polarity,
        stack_pointer,
        reset_vector,
        encrypted: args.encrypted,
        options: match args.storage {
            Storage::Internal => BootOptions::NewImageInternalFlash,
            Storage::External => BootOptions::NewImageExternalFlash,
        },
        storage_address: args.storage_address,
    };

    let mut page = vec![0xffu8; args.page_size as usize];
    page[..FLAG_PAGE_RECORD_SIZE].copy_from_slice(&descriptor.encode());
    Ok(page)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<ImageDescriptor> {
    let (record, _) = FlagPageRecord::read_from_prefix(bytes)
        .map_err(|_| anyhow!("File is too small to hold a flag page record"))?;
    Ok(ImageDescriptor::from(&record))
}

fn hex_or_unset(value: u32, unset: u32) -> String {
    if value == unset {
        "unset".to_string()
    } else {
        format!("0x{:08x}", value)
    }
}

pub(crate) fn describe(descriptor: &ImageDescriptor) -> String {
    let options = match descriptor.options {
        BootOptions::NoNewImage => "no new image",
        BootOptions::NewImageInternalFlash => "new image in internal flash",
        BootOptions::NewImageExternalFlash => "new image in external flash",
    };
    let mut out = String::new();
    out += &format!("link address:     0x{:08x}\n", descriptor.link_address);
    out += &format!("length:           {} bytes\n", descriptor.num_bytes);
    out += &format!("crc32:            0x{:08x}\n", descriptor.crc32);
    out += &format!("options:          {}\n", options);
    out += &format!(
        "storage address:  {}\n",
        hex_or_unset(descriptor.storage_address, NO_STORAGE_ADDRESS)
    );
    out += &format!("encrypted:        {}\n", descriptor.encrypted);
    out += &format!("stack pointer:    0x{:08x}\n", descriptor.stack_pointer);
    out += &format!("reset vector:     0x{:08x}\n", descriptor.reset_vector);
    match descriptor.override_pin() {
        Some(pin) => out += &format!("override:         GPIO{} {:?}\n", pin.gpio, pin.polarity),
        None => out += "override:         none\n",
    }
    out
}
