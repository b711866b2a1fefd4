//! Command-line interface for `fvek-scan`.

#![forbid(unsafe_code)]

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use aes_core::{expand_key, AesKey};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fvek_scan::report::{collect_findings, render_json, render_text};
use fvek_scan::{
    OsVersion, PoolLayout, PoolTag, RawImage, ScanConfig, Scanner, DEFAULT_HEADER_SKIP,
    DEFAULT_MAX_MATCHES, DEFAULT_MIN_POOL_SIZE,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// BitLocker FVEK recovery from memory images.
#[derive(Parser)]
#[command(
    name = "fvek",
    version,
    author,
    about = "Recover BitLocker FVEK and tweak keys from a memory image"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan BitLocker pool allocations of a raw memory image for AES keys.
    Scan {
        /// Raw memory image.
        #[arg(long, value_name = "FILE")]
        image: PathBuf,
        /// Windows version of the image as MAJOR.MINOR (e.g. 6.1, 10.0).
        #[arg(long, value_name = "VERSION")]
        profile: OsVersion,
        /// Pool tag to search instead of the one implied by the profile.
        #[arg(long, value_name = "TAG")]
        tag: Option<PoolTag>,
        /// Pool header layout of the target kernel.
        #[arg(long, value_enum, default_value_t = Layout::X64)]
        layout: Layout,
        /// Directory in which to dump recovered keys.
        #[arg(long, value_name = "DIR")]
        dump_dir: Option<PathBuf>,
        /// Bytes skipped at the start of each allocation.
        #[arg(long, default_value_t = DEFAULT_HEADER_SKIP)]
        header_skip: usize,
        /// Allocations of at most this many bytes are ignored.
        #[arg(long, default_value_t = DEFAULT_MIN_POOL_SIZE)]
        min_pool_size: usize,
        /// Allocations with more candidate keys than this are discarded.
        #[arg(long, default_value_t = DEFAULT_MAX_MATCHES)]
        max_matches: usize,
        /// Emit JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the round keys of an AES-128 or AES-256 key.
    Expand {
        /// Key as 32 or 64 hex characters.
        #[arg(long, value_name = "HEX")]
        key_hex: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Layout {
    X64,
    X86,
}

impl From<Layout> for PoolLayout {
    fn from(value: Layout) -> Self {
        match value {
            Layout::X64 => PoolLayout::X64,
            Layout::X86 => PoolLayout::X86,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    match cli.command {
        Commands::Scan {
            image,
            profile,
            tag,
            layout,
            dump_dir,
            header_skip,
            min_pool_size,
            max_matches,
            json,
        } => {
            let config = ScanConfig {
                header_skip,
                min_pool_size,
                max_matches,
            };
            cmd_scan(
                &image,
                profile,
                tag,
                layout.into(),
                dump_dir.as_deref(),
                config,
                json,
            )
        }
        Commands::Expand { key_hex } => cmd_expand(&key_hex),
    }
}

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing subscriber: {e}"))
}

fn cmd_scan(
    image_path: &Path,
    profile: OsVersion,
    tag: Option<PoolTag>,
    layout: PoolLayout,
    dump_dir: Option<&Path>,
    config: ScanConfig,
    json: bool,
) -> Result<()> {
    let profile = profile.ensure_supported()?;
    let tag = tag.unwrap_or_else(|| profile.pool_tag());
    if let Some(dir) = dump_dir {
        if !dir.is_dir() {
            bail!("dump directory {} does not exist", dir.display());
        }
    }

    let image = RawImage::open(image_path, layout)?;
    info!(%profile, %tag, bytes = image.len(), "scanning image");
    let reports = Scanner::with_config(config)
        .scan_source(&image, tag)
        .with_context(|| format!("scan {}", image_path.display()))?;

    let findings = collect_findings(reports, dump_dir);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        render_json(&mut out, &findings).context("write JSON report")?;
    } else {
        render_text(&mut out, &findings).context("write report")?;
    }
    out.flush().context("flush report")?;

    let failed = findings
        .iter()
        .filter(|f| matches!(f.dump, Some(Err(_))))
        .count();
    if failed > 0 {
        bail!("{failed} of {} key dump(s) failed", findings.len());
    }
    Ok(())
}

fn cmd_expand(key_hex: &str) -> Result<()> {
    let key = parse_key_hex(key_hex)?;
    let schedule = expand_key(&key);
    println!("cipher: {}", key.size());
    for (round, round_key) in schedule.round_keys().enumerate() {
        println!("round {round:2}: {}", hex::encode(round_key));
    }
    Ok(())
}

fn parse_key_hex(hex_str: &str) -> Result<AesKey> {
    let bytes = hex::decode(hex_str.trim()).context("decode key hex")?;
    AesKey::try_from(bytes.as_slice()).context("parse AES key")
}
