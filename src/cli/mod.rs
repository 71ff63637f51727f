//! CLI interface for audiograph

use audiograph::config::{GraphSettings, SpatialMode};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Default configuration file, used when present
pub const DEFAULT_CONFIG: &str = "audiograph.yaml";

/// Hear graphs of mathematical functions
#[derive(Parser, Debug)]
#[command(name = "audiograph")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file path [default: audiograph.yaml if it exists]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Type equations and hear them graphed
    Shell {
        #[command(flatten)]
        graph: GraphArgs,
    },

    /// Play one equation on the sound card
    Play {
        /// The equation, for example "x^2/10" or "y = sin x"
        #[arg(allow_hyphen_values = true)]
        equation: String,

        #[command(flatten)]
        graph: GraphArgs,
    },

    /// Render one equation to a WAV file
    Render {
        #[arg(allow_hyphen_values = true)]
        equation: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        graph: GraphArgs,
    },

    /// Validate a configuration file
    Check,

    /// Generate an example configuration file
    Init,
}

/// Graph settings that override the configuration file
#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct GraphArgs {
    /// Range of the x axis
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], allow_hyphen_values = true)]
    pub x_range: Option<Vec<f64>>,

    /// Range of the y axis; the tone is silent outside it
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], allow_hyphen_values = true)]
    pub y_range: Option<Vec<f64>>,

    /// Seconds per sweep (at least 1)
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Tick on every multiple of this x interval
    #[arg(long)]
    pub x_ticks: Option<f64>,

    /// Tick on every multiple of this y interval
    #[arg(long)]
    pub y_ticks: Option<f64>,

    /// Tick when the graph crosses zero
    #[arg(long)]
    pub zero_ticks: bool,

    /// 3-D headphone positioning instead of stereo panning
    #[arg(long)]
    pub hrtf: bool,
}

impl GraphArgs {
    /// Overlay the flags that were given onto `graph`
    pub fn apply(&self, graph: &mut GraphSettings) {
        if let Some(range) = &self.x_range {
            graph.min_x = range[0];
            graph.max_x = range[1];
        }
        if let Some(range) = &self.y_range {
            graph.min_y = range[0];
            graph.max_y = range[1];
        }
        if let Some(duration) = self.duration {
            graph.duration = duration;
        }
        if self.x_ticks.is_some() {
            graph.x_ticks = self.x_ticks;
        }
        if self.y_ticks.is_some() {
            graph.y_ticks = self.y_ticks;
        }
        if self.zero_ticks {
            graph.zero_ticks = true;
        }
        if self.hrtf {
            graph.spatial_mode = SpatialMode::Spatial3D;
        }
    }
}
