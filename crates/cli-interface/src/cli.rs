//! Argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Model lifecycle control plane
#[derive(Debug, Parser)]
#[command(name = "model-orchestrator")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CFG_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Owner id to act as; defaults to the configured owner
    #[arg(long, env = "CFG_OWNER")]
    pub owner: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Upload a model repository directory as a new model version
    Create {
        /// Model name
        name: String,

        /// Directory holding one sub-directory per artifact
        path: PathBuf,

        /// CLASSIFICATION, DETECTION or UNSPECIFIED
        #[arg(short, long, default_value = "UNSPECIFIED")]
        task: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Bring the new version ONLINE after upload
        #[arg(long)]
        online: bool,
    },

    /// List models of the owner
    List,

    /// Show a model with its versions
    Get { name: String },

    /// Change status or description of a version
    Update {
        name: String,

        /// Version number; the latest if omitted
        #[arg(short, long)]
        version: Option<u32>,

        /// ONLINE or OFFLINE
        #[arg(short, long)]
        status: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a model and all its versions
    Delete { name: String },

    /// Delete one version of a model
    DeleteVersion { name: String, version: u32 },

    /// Run a prediction on one or more input files
    Predict {
        name: String,

        /// Version number; the latest if omitted
        #[arg(short, long)]
        version: Option<u32>,

        /// Input files, one batch item each
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}
