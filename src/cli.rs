use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use dimsniff::{DecodeOptions, Size};

#[derive(Parser)]
#[command(name = "dimsniff")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Print the format and pixel dimensions of image files", long_about = None)]
pub struct Cli {
    /// Files to inspect, `-` for standard input
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Print one JSON object per file
    #[arg(long)]
    pub json: bool,

    /// Enable debug output
    #[arg(short, long)]
    pub verbose: bool,

    /// Decode and check the WebP alpha plane before reporting the size
    #[arg(long)]
    pub verify_alpha: bool,

    /// Largest single buffer allocated from a length field in the file
    #[arg(long, default_value_t = dimsniff::options::DEFAULT_MAX_CHUNK_SIZE)]
    pub max_chunk_size: usize,
}

impl Cli {
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions::new()
            .with_max_chunk_size(self.max_chunk_size)
            .with_verify_alpha(self.verify_alpha)
    }
}

/// One line of `--json` output
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<&'a str>,
    #[serde(flatten)]
    pub size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> Report<'a> {
    pub fn ok(path: String, size: Size, format: &'a str) -> Self {
        Self {
            path,
            format: Some(format),
            size: Some(size),
            error: None,
        }
    }

    pub fn failed(path: String, error: String) -> Self {
        Self {
            path,
            format: None,
            size: None,
            error: Some(error),
        }
    }
}
