//! sectorfs shell
//!
//! Interactive shell over an in-memory sector filesystem

use anyhow::{bail, Context};
use clap::Parser;
use sectorfs::shell::{Flow, Shell};
use sectorfs::{FileSystemBuilder, FsConfig, MAX_TOTAL_SECTORS};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sectorfs")]
#[command(about = "Interactive shell over a simulated sector filesystem")]
struct Args {
    /// Disk capacity in sectors (prompted for when not given)
    #[arg(short = 's', long)]
    sectors: Option<u64>,

    /// Bytes per sector
    #[arg(long)]
    sector_size: Option<usize>,

    /// TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Directory `get` exports files into
    #[arg(short = 'o', long, default_value = ".")]
    export_dir: PathBuf,
}

/// Ask for a positive sector count until one is given
fn prompt_capacity<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> anyhow::Result<u64> {
    let mut line = String::new();
    loop {
        write!(out, "Enter disk size (number of sectors): ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            bail!("no disk size given");
        }
        match line.trim().parse::<u64>() {
            Ok(sectors) if sectors > 0 && sectors <= MAX_TOTAL_SECTORS => return Ok(sectors),
            _ => writeln!(
                out,
                "Invalid size. Please enter a number from 1 to {}.",
                MAX_TOTAL_SECTORS
            )?,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stderr = io::stderr();
    let mut errors = stderr.lock();

    let mut builder = FileSystemBuilder::new();
    if let Some(path) = &args.config {
        let config = FsConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;
        builder = builder.config(config);
    }
    if let Some(sector_size) = args.sector_size {
        builder = builder.sector_size(sector_size);
    }
    builder = match args.sectors {
        Some(sectors) => builder.total_sectors(sectors),
        None if args.config.is_some() => builder,
        None => builder.total_sectors(prompt_capacity(&mut input, &mut out)?),
    };

    let fs = builder.build().context("failed to create filesystem")?;
    let stats = fs.stats();
    info!(
        "Filesystem ready: {} sectors of {} bytes",
        stats.total_sectors, stats.sector_size
    );
    writeln!(
        out,
        "Filesystem created with {} sectors ({} bytes each)",
        stats.total_sectors, stats.sector_size
    )?;
    writeln!(out, "Type 'help' for available commands")?;

    let mut shell = Shell::new(fs).with_export_dir(args.export_dir);
    let mut line = String::new();
    loop {
        write!(out, "fs:$ ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }
        if shell.run_line(&line, &mut out, &mut errors)? == Flow::Exit {
            break;
        }
    }
    Ok(())
}
