//! Configuration management for ISBN Atlas.
//!
//! Configuration comes from command-line arguments via clap, with every
//! option also settable through an environment variable with the
//! `ISBN_ATLAS_` prefix.
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use isbn_atlas::config::{Cli, Command};
//!
//! match Cli::parse().into_command() {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     Command::Check(config) => println!("Checking {}", config.sources.datasets.display()),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `ISBN_ATLAS_HOST` - Server bind address (default: 0.0.0.0)
//! - `ISBN_ATLAS_PORT` - Server port (default: 5000)
//! - `ISBN_ATLAS_DATASETS` - Directory of `*.bin` datasets (default: ./datasets)
//! - `ISBN_ATLAS_COUNTRIES` - Registration-group table (default: ./data/countries.json)
//! - `ISBN_ATLAS_PUBLISHERS` - Publisher-range table (default: ./data/publishers.json)
//! - `ISBN_ATLAS_CACHE_DIR` - Tile cache directory (default: ./static/tiles)
//! - `ISBN_ATLAS_NO_CACHE` - Regenerate tiles even when cached
//! - `ISBN_ATLAS_TILE_FORMAT` - `webp` (lossless) or `jpeg`
//! - `ISBN_ATLAS_JPEG_QUALITY` - JPEG quality (default: 90)
//! - `ISBN_ATLAS_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `ISBN_ATLAS_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::server::DEFAULT_CACHE_MAX_AGE;
use crate::tile::{
    is_valid_quality, TileFormat, DEFAULT_CACHE_DIR, DEFAULT_JPEG_QUALITY, MAX_JPEG_QUALITY,
    MIN_JPEG_QUALITY,
};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default dataset directory.
pub const DEFAULT_DATASET_DIR: &str = "./datasets";

/// Default registration-group table.
pub const DEFAULT_COUNTRY_TABLE: &str = "./data/countries.json";

/// Default publisher-range table.
pub const DEFAULT_PUBLISHER_TABLE: &str = "./data/publishers.json";

// =============================================================================
// CLI Arguments
// =============================================================================

/// ISBN Atlas - renders the ISBN identifier space as a zoomable map.
#[derive(Parser, Debug, Clone)]
#[command(name = "isbn-atlas")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Consume the parsed arguments and return the selected subcommand.
    pub fn into_command(self) -> Command {
        self.command
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the tile server.
    Serve(ServeConfig),

    /// Load datasets and classification tables, then report what was found.
    Check(CheckConfig),
}

/// Options shared by every subcommand that loads data.
#[derive(Args, Debug, Clone)]
pub struct DataSources {
    /// Directory containing `<name>.bin` datasets.
    #[arg(long, default_value = DEFAULT_DATASET_DIR, env = "ISBN_ATLAS_DATASETS")]
    pub datasets: PathBuf,

    /// JSON table of registration-group prefixes.
    #[arg(long, default_value = DEFAULT_COUNTRY_TABLE, env = "ISBN_ATLAS_COUNTRIES")]
    pub countries: PathBuf,

    /// JSON table of publisher prefixes and ranges.
    #[arg(long, default_value = DEFAULT_PUBLISHER_TABLE, env = "ISBN_ATLAS_PUBLISHERS")]
    pub publishers: PathBuf,
}

/// Arguments for `serve`.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "ISBN_ATLAS_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "ISBN_ATLAS_PORT")]
    pub port: u16,

    // =========================================================================
    // Data Sources
    // =========================================================================
    #[command(flatten)]
    pub sources: DataSources,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Directory where rendered tiles are persisted.
    #[arg(long, default_value = DEFAULT_CACHE_DIR, env = "ISBN_ATLAS_CACHE_DIR")]
    pub cache_dir: PathBuf,

    /// Regenerate every requested tile, overwriting any cached file.
    #[arg(long, default_value_t = false, env = "ISBN_ATLAS_NO_CACHE")]
    pub no_cache: bool,

    // =========================================================================
    // Tile Configuration
    // =========================================================================
    /// Encoding for rendered tiles.
    #[arg(long, value_enum, default_value_t = TileFormat::WebP, env = "ISBN_ATLAS_TILE_FORMAT")]
    pub tile_format: TileFormat,

    /// JPEG quality (1-100); ignored for WebP.
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "ISBN_ATLAS_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "ISBN_ATLAS_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "ISBN_ATLAS_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("host must not be empty".to_string());
        }

        if !is_valid_quality(self.jpeg_quality) {
            return Err(format!(
                "jpeg_quality must be between {} and {}",
                MIN_JPEG_QUALITY, MAX_JPEG_QUALITY
            ));
        }

        if self.cache_dir.as_os_str().is_empty() {
            return Err(
                "Tile cache directory is empty. Set --cache-dir or ISBN_ATLAS_CACHE_DIR"
                    .to_string(),
            );
        }

        if let Some(ref origins) = self.cors_origins {
            if let Some(bad) = origins.iter().find(|o| o.parse::<http::HeaderValue>().is_err()) {
                return Err(format!("Invalid CORS origin: '{}'", bad));
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Arguments for `check`.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    #[command(flatten)]
    pub sources: DataSources,

    /// List every loaded dataset with its point count.
    #[arg(long, default_value_t = false)]
    pub list_datasets: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
