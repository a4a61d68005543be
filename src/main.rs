mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

use cli::{Cli, Report};
use dimsniff::{FormatRegistry, Size};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let options = cli.decode_options();
    debug!(?options, "decode options");
    let registry = FormatRegistry::with_options(&options);

    let mut failed = 0usize;
    for path in &cli.paths {
        let shown = path.display().to_string();
        match inspect(&registry, path) {
            Ok((size, format)) => {
                if cli.json {
                    println!("{}", serde_json::to_string(&Report::ok(shown, size, format))?);
                } else {
                    println!("{shown}: {size} ({format})");
                }
            }
            Err(err) => {
                failed += 1;
                warn!(path = %shown, "{err:#}");
                if cli.json {
                    let report = Report::failed(shown, format!("{err:#}"));
                    println!("{}", serde_json::to_string(&report)?);
                }
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} files could not be read", cli.paths.len());
    }
    Ok(())
}

fn inspect<'r>(registry: &'r FormatRegistry, path: &Path) -> Result<(Size, &'r str)> {
    let reader: Box<dyn Read> = if path.as_os_str() == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        Box::new(BufReader::new(file))
    };
    let (size, format) = registry
        .decode_size(reader)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok((size, format))
}
