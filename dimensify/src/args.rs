use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// Dimensify media generation server
#[derive(Debug, Parser)]
#[command(name = "dimensify", about = "Image and video generation behind one HTTP API")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "dimensify.toml", env = "DIMENSIFY_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "DIMENSIFY_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter used when neither `RUST_LOG` nor the config sets one
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
