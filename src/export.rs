use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::client::RecordStore;
use crate::download::{Downloader, ImageSource};
use crate::error::Result;
use crate::report;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub start_serial: u32,
    pub class_id: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug)]
pub struct ExportResult {
    /// `None` when the query matched no records and nothing was written.
    pub workbook_path: Option<PathBuf>,
    pub images: Vec<PathBuf>,
    pub images_dir: PathBuf,
    pub record_count: usize,
    pub fetch_duration: Duration,
    pub build_duration: Duration,
}

/// The export pipeline: fetch class lookup, fetch filtered records, format
/// rows and download images, write the workbook. Constructed from an
/// explicit client and image source; holds no global state.
pub struct ExportEngine<C: RecordStore, S: ImageSource> {
    client: C,
    source: S,
}

impl<C: RecordStore, S: ImageSource> ExportEngine<C, S> {
    pub fn new(client: C, source: S) -> Self {
        ExportEngine { client, source }
    }

    pub fn run(&self, opts: &ExportOptions) -> Result<ExportResult> {
        let images_dir = opts.output_dir.join("images");
        fs::create_dir_all(&images_dir)?;

        info!("Fetching class information...");
        let fetch_start = Instant::now();
        let class_map = self.client.list_classes();

        info!("Fetching ID card data...");
        let records = self
            .client
            .list_id_cards(opts.class_id.as_deref(), opts.search.as_deref());
        let fetch_duration = fetch_start.elapsed();
        debug!(
            "Fetch completed in {:.2}s — {} classes, {} records",
            fetch_duration.as_secs_f64(),
            class_map.len(),
            records.len(),
        );

        if records.is_empty() {
            return Ok(ExportResult {
                workbook_path: None,
                images: Vec::new(),
                images_dir,
                record_count: 0,
                fetch_duration,
                build_duration: Duration::ZERO,
            });
        }

        info!("Found {} ID cards. Processing...", records.len());
        info!("Creating Excel file and downloading images...");
        let build_start = Instant::now();
        let downloader = Downloader::new(&self.source, &images_dir);
        let row_set = report::build_rows(&records, &class_map, &downloader, opts.start_serial);
        let workbook_path = report::write_workbook(&row_set.rows, &opts.output_dir)?;
        let build_duration = build_start.elapsed();
        debug!(
            "Report build completed in {:.2}s — {} images downloaded",
            build_duration.as_secs_f64(),
            row_set.images.len(),
        );

        Ok(ExportResult {
            workbook_path: Some(workbook_path),
            images: row_set.images,
            images_dir,
            record_count: records.len(),
            fetch_duration,
            build_duration,
        })
    }
}
