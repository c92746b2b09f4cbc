//! Command-line front end for hub-compress.
//!
//! ```text
//! hub [--config FILE] [--json] compress   <input> [output]
//! hub [--config FILE] [--json] decompress <input> [output]
//! hub [--config FILE] [--json] info       <input>
//! ```

use anyhow::{bail, Context, Result};
use hub_compress::config::CompressionConfig;
use hub_compress::Compressor;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "usage: hub [--config FILE] [--json] <compress|decompress|info> <input> [output]";

struct Args {
    command: String,
    input: PathBuf,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    json: bool,
}

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut config = None;
    let mut json = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a file path")?;
                config = Some(PathBuf::from(path));
            }
            "--json" => json = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let (Some(command), Some(input)) = (positional.next(), positional.next()) else {
        bail!("{USAGE}");
    };
    let output = positional.next().map(PathBuf::from);
    if positional.next().is_some() {
        bail!("too many arguments\n{USAGE}");
    }

    Ok(Args {
        command,
        input: PathBuf::from(input),
        output,
        config,
        json,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => CompressionConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CompressionConfig::default(),
    };
    let compressor = Compressor::new(config);

    match args.command.as_str() {
        "compress" => {
            let report = compressor
                .compress_file(&args.input, args.output.as_deref())
                .with_context(|| format!("compressing {}", args.input.display()))?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("compressed {} -> {}", report.input.display(), report.output.display());
                println!("{}", report.stats);
            }
        }
        "decompress" => {
            let report = compressor
                .decompress_file(&args.input, args.output.as_deref())
                .with_context(|| format!("decompressing {}", args.input.display()))?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("decompressed {} -> {}", report.input.display(), report.output.display());
                println!("bytes written:    {}", report.bytes_written);
                if !report.integrity.is_ok() {
                    println!("warning: {:?}", report.integrity);
                }
            }
        }
        "info" => {
            let summary = compressor
                .inspect(&args.input)
                .with_context(|| format!("reading {}", args.input.display()))?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("original length:  {} bytes", summary.original_len);
                println!("container length: {} bytes", summary.container_len);
                println!("symbols:          {}", summary.symbol_count);
                println!(
                    "payload:          {} bits in {} bytes",
                    summary.total_bits, summary.payload_bytes
                );
                println!("entropy:          {:.3} bits/byte", summary.entropy_bits);
                for entry in &summary.symbols {
                    println!("  {:#04x}  {:>12}  {}", entry.symbol, entry.frequency, entry.code);
                }
            }
        }
        other => bail!("unknown command {other:?}\n{USAGE}"),
    }

    Ok(())
}
