use std::fs;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::warn;

use crate::error::{Error, Result};

const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const MAX_FILENAME_LEN: usize = 50;

/// Make a name field safe for use in an image filename: filesystem-hostile
/// characters become underscores, surrounding whitespace is dropped, and the
/// result is capped at 50 characters. An empty field becomes "unknown".
pub fn sanitize_filename(name: &str) -> String {
    if name.is_empty() {
        return "unknown".to_string();
    }

    let cleaned: String = name
        .chars()
        .map(|c| {
            if INVALID_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    cleaned.trim().chars().take(MAX_FILENAME_LEN).collect()
}

/// The three fixed image filenames for one record. Deterministic per serial,
/// so re-runs with matching numbering overwrite earlier image files.
#[derive(Debug, Clone)]
pub struct ImageFileNames {
    pub student: String,
    pub father: String,
    pub mother: String,
}

pub fn image_file_names(serial: u64, student: &str, father: &str, mother: &str) -> ImageFileNames {
    let student = sanitize_filename(student);
    let father = sanitize_filename(father);
    let mother = sanitize_filename(mother);

    ImageFileNames {
        student: format!("{serial}_{student}_student.jpg"),
        father: format!("{serial}_{student}_{father}_father.jpg"),
        mother: format!("{serial}_{student}_{mother}_mother.jpg"),
    }
}

/// Seam between the downloader and the network, so the report pipeline can
/// be exercised without a live image host.
pub trait ImageSource: Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpImageSource {
    http: Client,
}

impl HttpImageSource {
    pub fn new() -> Result<Self> {
        let http = Client::builder().user_agent("idcard-export").build()?;
        Ok(HttpImageSource { http })
    }
}

impl ImageSource for HttpImageSource {
    /// Only a 200 yields bytes; any other status is an error the downloader
    /// turns into an absent image.
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send()?;
        if response.status() != StatusCode::OK {
            return Err(Error::DownloadStatus(response.status().as_u16()));
        }
        Ok(response.bytes()?.to_vec())
    }
}

/// Best-effort image downloader writing into a fixed images directory.
pub struct Downloader<'a, S: ImageSource> {
    source: &'a S,
    images_dir: &'a Path,
}

impl<'a, S: ImageSource> Downloader<'a, S> {
    pub fn new(source: &'a S, images_dir: &'a Path) -> Self {
        Downloader { source, images_dir }
    }

    /// Fetch `url` and persist it under `file_name`. `None` is the normal
    /// failure path here: blank URLs, bad statuses, transport faults and
    /// write failures all land there, with a warning logged for everything
    /// except the blank URL (which skips the network entirely).
    pub fn download(&self, url: Option<&str>, file_name: &str) -> Option<PathBuf> {
        let url = url?.trim();
        if url.is_empty() {
            return None;
        }

        let dest = self.images_dir.join(file_name);
        match self.source.fetch(url) {
            Ok(bytes) => match fs::write(&dest, bytes) {
                Ok(()) => Some(dest),
                Err(err) => {
                    warn!("Failed to save image {}: {err}", dest.display());
                    None
                }
            },
            Err(err) => {
                warn!("Error downloading image {url}: {err}");
                None
            }
        }
    }
}
