use anyhow::{anyhow, bail, Context, Result};
use bloom_core::{BloomFilter, FilterManifest, MappedBits, Sizing};
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bloom", about = "Persistent Bloom filter CLI")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Create a bit file and its manifest.
    Create {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        capacity: u64,
        #[arg(long)]
        error_rate: Option<f64>,
        #[arg(long)]
        k: Option<u32>,
        /// Explicit sizing; requires --k and excludes --error-rate
        #[arg(long, requires = "k", conflicts_with = "error_rate")]
        bits_per_element: Option<u32>,
    },

    Insert {
        #[arg(long)]
        path: PathBuf,
        keys: Vec<String>,
        /// Also read keys from stdin, one per line
        #[arg(long, default_value_t = false)]
        stdin: bool,
    },

    Query {
        #[arg(long)]
        path: PathBuf,
        keys: Vec<String>,
        #[arg(long, default_value_t = false)]
        stdin: bool,
    },

    Info {
        #[arg(long)]
        path: PathBuf,
    },
}

fn sizing_from_flags(error_rate: Option<f64>, k: Option<u32>, bits_per_element: Option<u32>) -> Result<Sizing> {
    match (error_rate, k, bits_per_element) {
        (None, Some(k), Some(bits_per_element)) => Ok(Sizing::Explicit { bits_per_element, k }),
        (Some(error_rate), Some(k), None) => Ok(Sizing::ErrorRateWithK { error_rate, k }),
        (Some(error_rate), None, None) => Ok(Sizing::OptimalK { error_rate }),
        _ => bail!("pass --error-rate [--k] or --bits-per-element --k"),
    }
}

fn collect_keys(mut keys: Vec<String>, stdin: bool) -> Result<Vec<String>> {
    if stdin {
        for line in std::io::stdin().lock().lines() {
            let line = line.context("reading keys from stdin")?;
            if !line.is_empty() {
                keys.push(line);
            }
        }
    }
    Ok(keys)
}

fn open_filter(path: &Path) -> Result<BloomFilter<MappedBits>> {
    let man = FilterManifest::load(path)?
        .ok_or_else(|| anyhow!("no manifest for {}; run `bloom create` first", path.display()))?;
    if man.hasher != "xxh3" {
        bail!("filter {} uses unsupported hasher {}", path.display(), man.hasher);
    }
    BloomFilter::open_params(path, man.params).with_context(|| format!("opening {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Create { path, capacity, error_rate, k, bits_per_element } => {
            if FilterManifest::path_for(&path).exists() {
                bail!("filter already exists at {}", path.display());
            }
            if path.exists() {
                bail!("bit file {} already exists without a manifest; remove it first", path.display());
            }
            let params = sizing_from_flags(error_rate, k, bits_per_element)?
                .resolve(capacity)
                .context("sizing filter (table sizing supports k <= 12; use --bits-per-element otherwise)")?;
            let f = BloomFilter::open_params(&path, params)
                .with_context(|| format!("creating {}", path.display()))?;
            FilterManifest::new(params, f.stats().hasher).save_atomic(&path)?;
            info!(path = %path.display(), n_bits = params.n_bits, k = params.k, "created filter");
            println!("{}", serde_json::to_string_pretty(&f.stats())?);
        }
        Cmd::Insert { path, keys, stdin } => {
            let keys = collect_keys(keys, stdin)?;
            let mut f = open_filter(&path)?;
            f.insert_all(&keys);
            f.flush()?;
            println!("inserted: {}", keys.len());
        }
        Cmd::Query { path, keys, stdin } => {
            let keys = collect_keys(keys, stdin)?;
            let f = open_filter(&path)?;
            for (key, hit) in keys.iter().zip(f.query_all(&keys)) {
                println!("{key}\t{hit}");
            }
        }
        Cmd::Info { path } => {
            let f = open_filter(&path)?;
            println!("{}", serde_json::to_string_pretty(&f.stats())?);
        }
    }
    Ok(())
}
