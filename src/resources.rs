// ABOUTME: Resource handling for the bibslide application
// ABOUTME: Resolves background images given as data URIs, remote URLs or local paths

use crate::errors::{Result, SlideError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use log::info;
use reqwest::blocking::Client;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Where a background image comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    DataUri(String),
    Remote(String),
    Local(String),
}

impl ImageSource {
    /// Classify a background image reference
    pub fn new(reference: &str) -> Self {
        let reference = reference.trim();
        if reference.starts_with("data:") {
            ImageSource::DataUri(reference.to_string())
        } else if reference.starts_with("http://") || reference.starts_with("https://") {
            ImageSource::Remote(reference.to_string())
        } else {
            ImageSource::Local(reference.to_string())
        }
    }

    /// Raw bytes of the image
    pub fn bytes(&self) -> Result<Vec<u8>> {
        match self {
            ImageSource::DataUri(uri) => decode_data_uri(uri),
            ImageSource::Remote(url) => fetch_remote_bytes(url),
            ImageSource::Local(path) => {
                info!("Reading local background image: {}", path);
                if !Path::new(path).exists() {
                    return Err(SlideError::PathNotFoundError(Path::new(path).to_path_buf()));
                }
                Ok(fs::read(path)?)
            }
        }
    }
}

/// A decoded background image ready to be embedded by any renderer
#[derive(Debug, Clone)]
pub struct BackgroundImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl BackgroundImage {
    /// Load and sniff the image format. Only PNG and JPEG can be embedded as-is
    /// in every output format, anything else is re-encoded as PNG.
    pub fn load(reference: &str) -> Result<Self> {
        let bytes = ImageSource::new(reference).bytes()?;
        let format = image::guess_format(&bytes)?;

        match format {
            ImageFormat::Png | ImageFormat::Jpeg => Ok(Self { bytes, format }),
            other => {
                info!("Re-encoding {:?} background image as PNG", other);
                let decoded = image::load_from_memory_with_format(&bytes, other)?;
                let mut png = Vec::new();
                decoded.write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)?;
                Ok(Self {
                    bytes: png,
                    format: ImageFormat::Png,
                })
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self.format {
            ImageFormat::Jpeg => "jpeg",
            _ => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self.format {
            ImageFormat::Jpeg => "image/jpeg",
            _ => "image/png",
        }
    }

    pub fn decode(&self) -> Result<DynamicImage> {
        Ok(image::load_from_memory_with_format(&self.bytes, self.format)?)
    }

    /// Inline form usable in CSS `url(...)`
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(&self.bytes))
    }
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| SlideError::InvalidResourcePath("Malformed data URI".to_string()))?;

    if !header.ends_with(";base64") {
        return Err(SlideError::InvalidResourcePath(format!(
            "Only base64 data URIs are supported: {}",
            header
        )));
    }

    STANDARD
        .decode(payload.trim())
        .map_err(|e| SlideError::InvalidResourcePath(format!("Invalid base64 payload: {}", e)))
}

/// Fetch a remote resource with retry and exponential backoff
fn fetch_remote_bytes(url: &str) -> Result<Vec<u8>> {
    info!("Fetching remote background image: {}", url);

    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(SlideError::FetchError)?;

    let mut retry_delay = 1000;
    let mut last_error = None;

    for attempt in 1..=3 {
        match client.get(url).send() {
            Ok(response) => {
                if response.status().is_success() {
                    return Ok(response.bytes().map_err(SlideError::FetchError)?.to_vec());
                }
                last_error = Some(SlideError::ValidationError(format!(
                    "HTTP error: {}",
                    response.status()
                )));
            }
            Err(e) => {
                last_error = Some(SlideError::FetchError(e));
            }
        }

        if attempt < 3 {
            info!(
                "Fetch attempt {} failed, retrying in {} ms",
                attempt, retry_delay
            );
            std::thread::sleep(Duration::from_millis(retry_delay));
            retry_delay *= 2;
        }
    }

    Err(last_error.unwrap_or_else(|| {
        SlideError::ValidationError("Unknown error fetching resource".to_string())
    }))
}
