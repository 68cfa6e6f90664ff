// Command-line interface
// One subcommand per pipeline stage; every subcommand works on session folders

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Go/no-go lick task analysis
#[derive(Parser, Debug)]
#[command(name = "gonogo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Derive probe, frame, puff and lick timestamps and contrast labels
    Extract {
        /// Session folder
        session: PathBuf,
    },

    /// Store saccade classifier output (JSON) for a session
    ImportSaccades {
        /// Session folder
        session: PathBuf,

        /// Classifier output file
        file: PathBuf,
    },

    /// Write the corrected trial set
    Filter {
        /// Session folder
        session: PathBuf,

        #[command(flatten)]
        mode: FilterMode,
    },

    /// Classify trials and print response counts per partition and contrast
    Analyze {
        /// Session folder
        session: PathBuf,

        /// Use the corrected trial set
        #[arg(short, long)]
        filtered: bool,

        /// Also draw the psychometric curve and partition raster into this folder
        #[arg(long)]
        plots: Option<PathBuf>,
    },

    /// Pool response counts across sessions
    Pool {
        /// Session folders
        #[arg(required = true)]
        sessions: Vec<PathBuf>,

        /// Use each session's corrected trial set
        #[arg(short, long)]
        filtered: bool,

        /// Draw the pooled psychometric curve to this SVG file
        #[arg(long)]
        plot: Option<PathBuf>,
    },

    /// Draw lick, contrast, saccade-aligned rasters and the peri-saccadic histogram
    Rasters {
        /// Session folder
        session: PathBuf,

        /// Output folder for SVG files
        out_dir: PathBuf,

        /// Use the corrected trial set
        #[arg(short, long)]
        filtered: bool,
    },

    /// Draw peri-stimulus pupil dilation and traces
    Pupil {
        /// Session folder
        session: PathBuf,

        /// Output folder for SVG files
        out_dir: PathBuf,
    },

    /// List the session's derived series and recorded raw inputs
    Status {
        /// Session folder
        session: PathBuf,
    },

    /// Print the resolved configuration as TOML
    Config,
}

/// Exactly one filter must be chosen
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct FilterMode {
    /// Keep trials where the animal was engaged
    #[arg(long)]
    pub engaged: bool,

    /// Keep trials START..END (zero-based, end exclusive)
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    pub range: Option<Vec<usize>>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
