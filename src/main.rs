// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uwdepth::constants::app_info;

mod cli;

#[derive(Parser)]
#[command(name = "uwdepth")]
#[command(about = "Depth correction for ToF cameras in underwater housings")]
#[command(version = app_info::version())]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the correction pipeline over a raw depth capture
    Process {
        /// Raw little-endian 16-bit depth file
        input: PathBuf,

        /// Frame width in pixels
        #[arg(short = 'W', long, default_value = "512")]
        width: u32,

        /// Frame height in pixels
        #[arg(short = 'H', long, default_value = "424")]
        height: u32,

        /// Pipeline configuration JSON (default: all stages disabled)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file path (default: corrected_TIMESTAMP.bin next to input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write a PNG visualization of the corrected frame
        #[arg(long)]
        png: Option<PathBuf>,
    },

    /// Undistort a color image
    Undistort {
        /// Input image (PNG or anything the image crate decodes)
        input: PathBuf,

        /// Correction strength in [-1, 1]; negative for pincushion
        #[arg(short, long, default_value = "0.33")]
        factor: f64,

        /// Crop the result to the warped content before rescaling
        #[arg(long)]
        autocrop: bool,

        /// Background fill as packed BGRA hex
        #[arg(long, default_value = "FF000000")]
        background: String,

        /// Output file path (default: undistorted_TIMESTAMP.png next to input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a raw depth capture to PNG
    Visualize {
        /// Raw little-endian 16-bit depth file
        input: PathBuf,

        /// Frame width in pixels
        #[arg(short = 'W', long, default_value = "512")]
        width: u32,

        /// Frame height in pixels
        #[arg(short = 'H', long, default_value = "424")]
        height: u32,

        /// Grayscale with auto-detected range instead of the colormap
        #[arg(long)]
        grayscale: bool,

        /// Output file path (default: depth_TIMESTAMP.png next to input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the default pipeline configuration as JSON
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=uwdepth=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            width,
            height,
            config,
            output,
            png,
        } => cli::process_frame(input, width, height, config, output, png),
        Commands::Undistort {
            input,
            factor,
            autocrop,
            background,
            output,
        } => cli::undistort_image(input, factor, autocrop, background, output),
        Commands::Visualize {
            input,
            width,
            height,
            grayscale,
            output,
        } => cli::visualize_frame(input, width, height, grayscale, output),
        Commands::Config => cli::print_default_config(),
    }
}
