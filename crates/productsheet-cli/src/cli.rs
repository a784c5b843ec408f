//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Productsheet: offline HTML product sheets for GeoPackage datasets
#[derive(Parser)]
#[command(name = "productsheet")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a product sheet for every GeoPackage in a directory
    Generate(GenerateArgs),

    /// Show the field catalog of one GeoPackage
    Inspect {
        /// Path to the GeoPackage
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Longest value that can belong to an inferred value list
        #[arg(long, default_value = "60")]
        max_value_len: usize,

        /// Fewest distinct values for an inferred value list
        #[arg(long, default_value = "2")]
        min_distinct: usize,

        /// Most distinct values for an inferred value list
        #[arg(long, default_value = "16")]
        max_distinct: usize,
    },
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Directory with GeoPackages and the metadata spreadsheet
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Directory for product sheets (default: the input directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Metadata spreadsheet or CSV, instead of discovering one
    #[arg(short, long)]
    pub metadata: Option<PathBuf>,

    /// Jinja template for the product sheet
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// Base map GeoJSON (default: <dir>/assets/countries.geojson)
    #[arg(long)]
    pub basemap: Option<PathBuf>,

    /// Map features shared by all layers of a dataset
    #[arg(long, default_value = "2500")]
    pub max_features: usize,

    /// Simplification tolerance for map features, in degrees
    #[arg(long, default_value = "0.001")]
    pub simplify_tolerance: f64,

    /// Simplification tolerance for the base map, in degrees
    #[arg(long, default_value = "0.01")]
    pub basemap_tolerance: f64,

    /// Worksheet holding the metadata
    #[arg(long, default_value = "metadata")]
    pub sheet: String,

    /// Metadata column matched against dataset file names
    #[arg(long, default_value = "dataset")]
    pub key_column: String,

    /// Metadata column holding the dataset title
    #[arg(long, default_value = "title")]
    pub title_column: String,

    /// Appended to every title
    #[arg(long, default_value = " (NOR) - Product Sheet", allow_hyphen_values = true)]
    pub title_suffix: String,

    /// Longest value that can belong to an inferred value list
    #[arg(long, default_value = "60")]
    pub max_value_len: usize,

    /// Fewest distinct values for an inferred value list
    #[arg(long, default_value = "2")]
    pub min_distinct: usize,

    /// Most distinct values for an inferred value list
    #[arg(long, default_value = "16")]
    pub max_distinct: usize,

    /// Print the batch report as JSON
    #[arg(long)]
    pub json: bool,
}
