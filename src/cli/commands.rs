//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Rate-governed Notion API client
#[derive(Parser, Debug)]
#[command(name = "notion-pacer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (YAML); NOTION_* environment variables override it
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the available tool definitions
    Tools,

    /// Retrieve a page by id
    RetrievePage {
        /// Page id, with or without dashes
        page_id: String,
    },

    /// Create a page under a parent page
    CreatePage {
        /// Parent page id
        #[arg(long)]
        parent_id: String,

        /// Title of the new page
        #[arg(long)]
        title: String,

        /// Additional page properties as a JSON object
        #[arg(long)]
        properties_json: Option<String>,
    },

    /// Invoke a tool by name
    Call {
        /// Tool name (see `tools`)
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        arguments_json: String,
    },

    /// Start HTTP server mode
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}
