// cli.rs - Command-line interface configuration
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "prompt-world")]
#[command(about = "Arrange images as planes in a pseudo-3D scene", long_about = None)]
pub struct Cli {
    /// Directory holding one JSON document per scene
    #[arg(long, env = "PROMPT_WORLD_STORE", default_value = "./prompt-world-data")]
    pub store: PathBuf,

    /// Editor config file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create an empty scene
    New { name: String },

    /// List stored scenes, oldest first
    List,

    /// Print camera and planes of a scene
    Show { scene: String },

    /// Add image files to a scene as new planes
    ImportImage {
        scene: String,
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// Replay a gesture script against a scene
    Replay { scene: String, script: PathBuf },

    /// Fill descriptions from a JSON map of plane id to text
    Describe {
        scene: String,
        descriptions: PathBuf,
        /// Only these planes (full or short id); all planes when omitted
        #[arg(long = "plane")]
        planes: Vec<String>,
    },

    /// Replace one plane's description
    SetDescription {
        scene: String,
        plane: String,
        text: String,
    },

    /// Print the scene context, or the full assistant prompt for a query
    Context { scene: String, query: Option<String> },

    /// Ask a question about a scene, answered from a JSON map of query to answer
    Ask {
        scene: String,
        answers: PathBuf,
        query: String,
    },

    /// Write a scene to a portable document
    Export {
        scene: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Read a scene document into the store under a new id
    Import { file: PathBuf },

    /// Remove a scene from the store
    Delete { scene: String },
}
