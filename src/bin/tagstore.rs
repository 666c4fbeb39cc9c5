//! Tag store image tool
//!
//! Inspects and prepares EEPROM images of the credential log on the host.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tagstore::bus::SIMULATED_SIZE;
use tagstore::storage::INTERNAL_EEPROM_SIZE;
use tagstore::{hash_key_list, Backend, ImageFile, StoreConfig, TagStore};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "tagstore")]
#[command(about = "Inspect and edit door-lock credential EEPROM images")]
struct Args {
    /// Path to the EEPROM image (created erased if missing)
    #[arg(short = 'i', long)]
    image: PathBuf,

    /// Store layout (TOML); defaults to the internal 1 KiB layout
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the format version, resetting the log if it does not match
    Init,
    /// Declare the log empty
    Reset,
    /// Append a credential
    Add {
        /// 8 hex digit tag identifier
        id: String,
        /// PIN
        pin: String,
    },
    /// Print the PIN stored for a tag
    Find { id: String },
    /// List every record in log order
    List {
        #[arg(long)]
        json: bool,
    },
    /// Print the integrity hash and free space
    Hash,
    /// Fail if the log holds a corrupt record
    Check,
    /// Compare the log against a key list (one "IIIIIIII PIN" entry per line)
    Verify { keys: PathBuf },
}

#[derive(Serialize)]
struct Row {
    id: String,
    pin: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StoreConfig::internal(),
    };
    let size = match config.backend {
        Backend::Internal => INTERNAL_EEPROM_SIZE,
        Backend::External => SIMULATED_SIZE,
    };

    let image = ImageFile::open_or_create(&args.image, size)
        .with_context(|| format!("opening image {}", args.image.display()))?;
    info!("Image {:?} ({} bytes)", args.image, size);

    let mut store = TagStore::open(image, config)?;

    match args.command {
        Command::Init => {
            println!("ok");
        }
        Command::Reset => {
            store.reset_all();
            println!("ok");
        }
        Command::Add { id, pin } => {
            let entry = format!("{} {}", id, pin);
            let next = store.append(entry.as_bytes())?;
            println!("appended, next free offset {}", next);
        }
        Command::Find { id } => match store.find(&id) {
            Ok(pin) => println!("{}", pin),
            Err(e) => bail!("{}: {}", id, e),
        },
        Command::List { json } => {
            let rows: Vec<Row> = store
                .scan()
                .map(|record| Row {
                    id: record.id.to_string(),
                    pin: record.pin.to_string(),
                })
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in &rows {
                    println!("{} {}", row.id, row.pin);
                }
            }
        }
        Command::Hash => {
            let report = store.integrity_report();
            println!("{:04X}", report.hash);
            println!("{} records, {} bytes free", report.records, report.free_bytes);
        }
        Command::Check => {
            let records = store.check()?;
            println!("{} records, log intact", records);
        }
        Command::Verify { keys } => {
            let text = std::fs::read_to_string(&keys)
                .with_context(|| format!("reading key list {}", keys.display()))?;
            let expected = hash_key_list(&text);
            let actual = store.integrity_hash();
            if expected != actual {
                bail!("hash mismatch: device {:04X}, key list {:04X}", actual, expected);
            }
            println!("{:04X} in sync", actual);
        }
    }

    store.into_inner().sync()?;
    Ok(())
}
