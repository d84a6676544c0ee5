use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "idcard-export")]
#[command(about = "Export ID cards with high-quality images", long_about = None)]
pub struct Cli {
    /// Output directory for the Excel file and images
    #[arg(long, default_value = "./output")]
    pub output: PathBuf,

    /// Starting serial number for admission numbers
    #[arg(long, default_value_t = 115601)]
    pub start_serial: u32,

    /// Filter by class ID
    #[arg(long)]
    pub class_id: Option<String>,

    /// Search term for filtering
    #[arg(long)]
    pub search: Option<String>,
}
