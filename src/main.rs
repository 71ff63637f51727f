//! audiograph - hear graphs of mathematical functions

use anyhow::{bail, Context, Result};
use audiograph::config::{self, AudiographConfig, EXAMPLE_CONFIG};
use audiograph::engine::Sonifier;
use audiograph::expr::Expression;
use audiograph::shell::{DeviceOutput, Shell};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

mod cli;

use cli::{Cli, Commands, GraphArgs, DEFAULT_CONFIG};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Shell { graph } => {
            let cfg = load(cli.config.as_deref(), &graph)?;
            let mut shell = Shell::new(cfg, Box::new(DeviceOutput));
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            shell.run(stdin.lock(), &mut stdout)?;
        }

        Commands::Play { equation, graph } => {
            let cfg = load(cli.config.as_deref(), &graph)?;
            let mut sonifier = sonifier(&equation, &cfg)?;

            let interrupted = Arc::new(AtomicBool::new(false));
            let flag = interrupted.clone();
            ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
                .context("failed to install Ctrl-C handler")?;

            println!("Playing {} for {} seconds...", equation, cfg.graph.duration);
            sonifier.to_device()?;
            while !sonifier.is_finished() && !interrupted.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(20));
            }
            sonifier.shutdown();
            if interrupted.load(Ordering::SeqCst) {
                info!("interrupted");
            }
        }

        Commands::Render { equation, output, graph } => {
            let cfg = load(cli.config.as_deref(), &graph)?;
            let mut sonifier = sonifier(&equation, &cfg)?;
            println!("Rendering {} to {:?}...", equation, output);
            sonifier.to_file(&output)?;
            println!("Done.");
        }

        Commands::Check => {
            let path = cli.config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
            println!("Checking configuration at {:?}...", path);

            match config::load_config(&path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
                    println!("  Block size: {} frames", cfg.audio.block_size);
                    println!("  x range: {} to {}", cfg.graph.min_x, cfg.graph.max_x);
                    println!("  y range: {} to {}", cfg.graph.min_y, cfg.graph.max_y);
                    println!("  Duration: {} s", cfg.graph.duration);
                    println!("  Positioning: {:?}", cfg.graph.spatial_mode);
                    println!("  Start frequency: {} Hz", cfg.voice.start_frequency);
                }
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let path = cli.config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
            if path.exists() {
                println!("{} already exists. Not overwriting.", path.display());
            } else {
                std::fs::write(&path, EXAMPLE_CONFIG)
                    .with_context(|| format!("failed to write {:?}", path))?;
                println!("Created {} with example configuration.", path.display());
            }
        }
    }

    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the configuration and apply command-line overrides
fn load(path: Option<&Path>, overrides: &GraphArgs) -> Result<AudiographConfig> {
    let mut cfg = match path {
        Some(path) => config::load_config(path)?,
        None => config::load_or_default(Path::new(DEFAULT_CONFIG))?,
    };
    overrides.apply(&mut cfg.graph);
    cfg.validate()?;
    Ok(cfg)
}

fn sonifier(equation: &str, cfg: &AudiographConfig) -> Result<Sonifier> {
    let expression = Expression::parse(equation)?;
    let g = &cfg.graph;
    let coverage = expression.coverage(g.min_x, g.max_x, 512);
    if coverage == 0.0 {
        bail!("{} is undefined everywhere on {} to {}", expression, g.min_x, g.max_x);
    }
    let mapping = g.mapping()?;
    let sonifier = Sonifier::new(
        Box::new(move |x| expression.eval(x)),
        mapping,
        &cfg.voice,
        &cfg.audio,
    )?;
    Ok(sonifier)
}
