//! asdmstman Inspect Binary
//!
//! Opens a table directory and prints what the storage manager sees.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use asdmstman::table::ColumnKind;
use asdmstman::{Config, StorageManager};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// ASDM storage manager inspector
#[derive(Parser, Debug)]
#[command(name = "asdmstman-inspect")]
#[command(about = "Inspect ASDM storage manager index and data")]
#[command(version)]
struct Args {
    /// Table directory containing the index sidecar
    #[arg(short, long, default_value = ".")]
    table_dir: PathBuf,

    /// Index file name inside the table directory
    #[arg(short, long, default_value = "table.asdmindex")]
    index: String,

    /// Directory to resolve relative BDF names against
    #[arg(short, long)]
    bdf_dir: Option<PathBuf>,

    /// Skip the index checksum
    #[arg(long)]
    no_verify: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print index header and entries
    Summary,

    /// Print the shape of a row's cell
    Shape {
        /// Row number
        row: u64,

        /// Column name
        #[arg(short, long, default_value = "DATA")]
        column: String,
    },

    /// Print a row's decoded cell
    Dump {
        /// Row number
        row: u64,

        /// Column name
        #[arg(short, long, default_value = "DATA")]
        column: String,
    },

    /// Print BDF references, or re-point them at a new ASDM location
    Relocate {
        /// New parent directory; each file keeps its binary directory and name
        dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,asdmstman=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = Config::builder()
        .table_dir(&args.table_dir)
        .index_file_name(&args.index)
        .verify_index_checksum(!args.no_verify);
    if let Some(dir) = &args.bdf_dir {
        builder = builder.bdf_dir(dir);
    }

    let mut manager = StorageManager::new(builder.build());
    if let Err(e) = manager.open() {
        tracing::error!("Failed to open table: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&mut manager, &args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(manager: &mut StorageManager, command: &Commands) -> asdmstman::Result<()> {
    match command {
        Commands::Summary => {
            let index = manager.index()?;
            println!("index:      {}", index.path().display());
            println!("version:    {}", index.version());
            println!("big endian: {}", index.big_endian());
            println!("rows:       {}", index.total_rows());
            println!("blocks:     {}", index.distinct_blocks());
            for (i, name) in index.file_names().iter().enumerate() {
                println!("file {:>4}:  {}", i, name);
            }
            for entry in index.entries() {
                println!(
                    "rows {:>8}..{:<8} {:?} file={} offset={} bl={} spw={} chan={} pol={}",
                    entry.row_start,
                    entry.row_end(),
                    entry.data_type,
                    entry.file_index,
                    entry.file_offset,
                    entry.n_bl,
                    entry.n_spw,
                    entry.n_chan,
                    entry.n_pol
                );
            }
        }
        Commands::Shape { row, column } => {
            let kind: ColumnKind = column.parse()?;
            println!("{:?}", manager.column_shape(kind, *row)?);
        }
        Commands::Dump { row, column } => {
            let kind: ColumnKind = column.parse()?;
            println!("{:?}", manager.cell(kind, *row)?);
        }
        Commands::Relocate { dir } => {
            if let Some(dir) = dir {
                let names = manager
                    .bdf_names()?
                    .iter()
                    .map(|name| relocated(dir, Path::new(name)))
                    .collect();
                manager.set_bdf_names(names)?;
                manager.write_index()?;
            }
            for name in manager.bdf_names()? {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

/// `<dir>/<binary dir>/<file>` for a BDF reference
fn relocated(dir: &Path, old: &Path) -> String {
    let mut new = dir.to_path_buf();
    if let Some(binary_dir) = old.parent().and_then(Path::file_name) {
        new.push(binary_dir);
    }
    if let Some(file) = old.file_name() {
        new.push(file);
    }
    new.to_string_lossy().into_owned()
}
