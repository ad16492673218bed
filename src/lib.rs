//! Spikeslice - chunked random access and clip extraction for extracellular recordings.
//!
//! The core is [`signal::RangeReader`], which serves `[t_start, t_end)` x
//! channel queries over dense or chunked stores with zero-fill outside the
//! recording, and [`clipper::ClipExtractor`], which cuts fixed-length
//! windows around event times through it.

#![warn(missing_docs)]

pub mod cli;
pub mod clipper;
pub mod config;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod mda;
pub mod output;
pub mod signal;

use clap::Parser;
use cli::{ChunkArgs, Cli, Command, ConfigAction, DatasetArgs, GlobalArgs, RangeArgs};
use config::{
    Config, StoreKind, config_file_path, load_config_file, load_default_config, save_config,
};
use constants::dataset::{FIRINGS_MDA, RAW_CHUNKS};
use dataset::{Firings, Recording};
use output::{RangeOutput, create_block_progress, create_writer, finish_progress, inc_progress};
use signal::store::chunks_needed;
use signal::ChunkedStore;
use std::path::PathBuf;
use tracing::{info, warn};

pub use error::{Error, Result};

/// Main entry point for the spikeslice CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet);

    let config = match &cli.global.config {
        Some(path) => load_config_file(path)?,
        None => load_default_config()?,
    };

    handle_command(cli.command, &config, &cli.global)
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter_str = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    // stdout carries command output
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_command(command: Command, config: &Config, global: &GlobalArgs) -> Result<()> {
    match command {
        Command::Info(args) => handle_info_command(&args),
        Command::Range(args) => handle_range_command(&args, config, global),
        Command::Clips(args) => clipper::command::execute(&args, config, global),
        Command::Chunk(args) => handle_chunk_command(&args, config, global),
        Command::Config { action } => handle_config_command(action, global),
    }
}

fn handle_info_command(args: &DatasetArgs) -> Result<()> {
    let recording = Recording::open(&args.dataset, args.backend)?;
    let meta = recording.metadata();

    println!("Dataset:      {}", recording.root().display());
    println!("Backend:      {}", recording.backend_name());
    println!("Channels:     {}", recording.num_channels());
    println!("Frames:       {}", recording.num_frames());
    println!("Sample rate:  {} Hz", recording.sample_rate());
    println!("Duration:     {:.3} s", meta.duration_seconds());
    if recording.backend_name() == "chunked" {
        println!(
            "Chunks:       {} x {} samples (+{} padding)",
            meta.num_chunks, meta.chunk_size, meta.padding
        );
    }
    println!(
        "Geometry:     {}",
        if recording.has_geometry() {
            "geom.csv"
        } else {
            "none (default layout)"
        }
    );

    let firings_path = recording.root().join(FIRINGS_MDA);
    if firings_path.exists() {
        match Firings::load(&firings_path) {
            Ok(firings) => println!(
                "Firings:      {} events, {} units",
                firings.num_events(),
                firings.unit_ids().len()
            ),
            Err(e) => warn!("Could not read {}: {e}", firings_path.display()),
        }
    }

    Ok(())
}

fn handle_range_command(args: &RangeArgs, config: &Config, global: &GlobalArgs) -> Result<()> {
    let parallel = global.parallel || config.reader.parallel;
    let recording =
        Recording::open(&args.dataset.dataset, args.dataset.backend)?.with_parallel(parallel);

    if args.end <= args.start {
        warn!(
            "Empty range [{}, {}): writing no samples",
            args.start, args.end
        );
    }

    let channels = args
        .channels
        .clone()
        .unwrap_or_else(|| recording.reader().all_channels());
    let matrix = recording.reader().get_range(args.start, args.end, &channels)?;

    let format = args.format.unwrap_or(config.output.format);
    let mut writer = create_writer(format, args.output.as_deref())?;
    writer.write_range(&RangeOutput {
        t_start: args.start,
        sample_rate: recording.sample_rate(),
        channels: &channels,
        matrix: &matrix,
    })?;
    writer.finalize()?;

    info!(
        "Read {} channels x {} frames from {}",
        matrix.num_channels(),
        matrix.num_timepoints(),
        recording.backend_name()
    );
    Ok(())
}

fn handle_chunk_command(args: &ChunkArgs, config: &Config, global: &GlobalArgs) -> Result<()> {
    let chunk_size = args.chunk_size.unwrap_or(config.extraction.chunk_size);
    let padding = args.padding.unwrap_or(config.extraction.padding);
    if chunk_size == 0 {
        return Err(Error::ConfigValidation {
            message: "chunk_size must be at least 1".to_string(),
        });
    }

    // The dense source must be readable before an existing store is touched.
    let recording = Recording::open(&args.dataset, StoreKind::Dense)?;
    let target = args.dataset.join(RAW_CHUNKS);
    let replacing = target.exists();
    if replacing && !args.force {
        return Err(Error::StoreExists { path: target });
    }

    let meta = recording.metadata();
    let total_blocks = meta.num_channels * chunks_needed(meta.num_timepoints, chunk_size);
    info!(
        "Writing {} channels x {} frames as {} blocks of {chunk_size} (+{padding} padding)",
        meta.num_channels, meta.num_timepoints, total_blocks
    );

    let pb = create_block_progress(total_blocks, !global.quiet && !global.no_progress);
    let on_block = || inc_progress(pb.as_ref());
    let store = if replacing {
        warn!("Replacing existing chunked store {}", target.display());
        ChunkedStore::replace(&target, recording.reader(), chunk_size, padding, on_block)?
    } else {
        ChunkedStore::create(&target, recording.reader(), chunk_size, padding, on_block)?
    };
    finish_progress(pb, "done");

    info!("Created chunked store {}", store.root().display());
    store.close();
    Ok(())
}

fn config_target(global: &GlobalArgs) -> Result<PathBuf> {
    global
        .config
        .clone()
        .map_or_else(config_file_path, Ok)
}

fn handle_config_command(action: ConfigAction, global: &GlobalArgs) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = config_target(global)?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                save_config(&Config::default(), &path)?;
                println!("Created configuration file: {}", path.display());
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config_file(&config_target(global)?)?;
            let contents =
                toml::to_string_pretty(&config).map_err(|e| Error::ConfigSerialize { source: e })?;
            print!("{contents}");
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", config_target(global)?.display());
            Ok(())
        }
    }
}
