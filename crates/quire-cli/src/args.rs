//! Command-line argument definitions for the Quire CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Global options select the configuration file, the
//! content directory and logging verbosity; the [`Command`] picks what to
//! do with the site.

use clap::{Parser, Subcommand};

/// Command-line arguments for the Quire documentation tool
#[derive(Parser, Debug)]
#[command(name = "quire", author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Content directory, overriding the configuration
    #[arg(long, global = true, value_name = "DIR")]
    pub content: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write the whole site as static files
    Build {
        /// Output directory, overriding the configuration
        #[arg(short, long, value_name = "DIR")]
        out: Option<String>,
    },

    /// Render one docs page; no segments renders the docs root
    Page {
        /// Slug segments, e.g. `guide setup` for /docs/guide/setup
        segments: Vec<String>,

        /// Write the page to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List every docs page URL
    List,

    /// Render a single diagram definition to SVG
    Diagram {
        /// Path to the diagram definition
        input: String,

        /// Path to the output SVG file
        #[arg(short, long, default_value = "out.svg")]
        output: String,
    },
}
