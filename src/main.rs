use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use dotenv::dotenv;
use tracing::{error, info};

use idcard_export::cli::Cli;
use idcard_export::client::StoreClient;
use idcard_export::download::HttpImageSource;
use idcard_export::{logging, ExportEngine, ExportOptions, StoreConfig};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    if let Err(err) = run(args) {
        error!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(args: Cli) -> anyhow::Result<()> {
    // Credentials must resolve before any network or disk I/O happens.
    let config = StoreConfig::from_env()?;
    info!("Connecting to store at {}...", config.endpoint);

    let client = StoreClient::new(&config)?;
    let source = HttpImageSource::new()?;
    let engine = ExportEngine::new(client, source);

    let opts = ExportOptions {
        output_dir: args.output,
        start_serial: args.start_serial,
        class_id: args.class_id,
        search: args.search,
    };

    let result = engine.run(&opts).context("export failed")?;

    match &result.workbook_path {
        None => println!("No ID cards found with the specified criteria."),
        Some(path) => {
            println!("\n{}", "Export completed successfully!".green());
            println!("Excel file saved to: {}", path.display());
            println!(
                "Downloaded {} images to: {}",
                result.images.len(),
                result.images_dir.display()
            );
            println!("Total ID cards processed: {}", result.record_count);
        }
    }

    Ok(())
}
