use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "linkdeck",
    about = "Search and navigation engine for categorized link portals"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        long,
        global = true,
        help = "Config file (default: ./linkdeck.toml when present)"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Validate a catalog and print its size")]
    Check {
        #[arg(help = "Catalog document (default: from config)")]
        catalog: Option<PathBuf>,
    },
    #[command(about = "Filter the catalog by name and description")]
    Search {
        #[arg(help = "Search text (case-insensitive substring)")]
        query: String,
        #[arg(long, short, help = "Catalog document (default: from config)")]
        catalog: Option<PathBuf>,
        #[arg(long, help = "Print the result as JSON")]
        json: bool,
    },
    #[command(about = "Print the sidebar tree with expansion and active markers")]
    Outline {
        #[arg(long, short, help = "Catalog document (default: from config)")]
        catalog: Option<PathBuf>,
        #[arg(long, short, help = "Apply a search before printing")]
        query: Option<String>,
        #[arg(long, short, help = "Anchor to activate (e.g., tools or tools-2)")]
        active: Option<String>,
    },
    #[command(about = "Run a scripted session and print the notifications")]
    Replay {
        #[arg(help = "Script of steps (YAML or JSON)")]
        script: PathBuf,
        #[arg(long, short, help = "Catalog document (default: from config)")]
        catalog: Option<PathBuf>,
        #[arg(long, help = "Print the records as JSON")]
        json: bool,
    },
    #[command(about = "Convert a browser bookmark export into a catalog")]
    Import {
        #[arg(help = "Bookmark HTML file exported from Chrome or Edge")]
        input: PathBuf,
        #[arg(long, short, default_value = "websites.yaml", help = "Output YAML file")]
        output: PathBuf,
    },
}
