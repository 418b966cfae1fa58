use std::fs;
use std::path::PathBuf;

use image::RgbaImage;
use reqwest::blocking::Client;
use reqwest::Url;
use tracing::debug;

use crate::palette::PaletteError;
use crate::slide::UploadError;

/// Failure of a single asset somewhere between fetch and upload.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("invalid asset locator '{locator}': {reason}")]
    Locator { locator: String, reason: String },
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to decode {locator}")]
    Decode {
        locator: String,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot derive slide colors for {locator}")]
    Palette {
        locator: String,
        #[source]
        source: PaletteError,
    },
    #[error("failed to upload texture for {locator}")]
    Upload {
        locator: String,
        #[source]
        source: UploadError,
    },
}

/// Where an asset locator points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLocation {
    Remote(Url),
    Local(PathBuf),
}

impl AssetLocation {
    /// `http(s)://` is fetched remotely, `file://` and bare strings are paths.
    pub fn parse(locator: &str) -> Result<Self, AssetError> {
        let trimmed = locator.trim();
        if trimmed.is_empty() {
            return Err(AssetError::Locator {
                locator: locator.to_string(),
                reason: "locator is empty".into(),
            });
        }

        let lowered = trimmed.to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            let url = Url::parse(trimmed).map_err(|err| AssetError::Locator {
                locator: locator.to_string(),
                reason: err.to_string(),
            })?;
            return Ok(Self::Remote(url));
        }

        if lowered.starts_with("file://") {
            let url = Url::parse(trimmed).map_err(|err| AssetError::Locator {
                locator: locator.to_string(),
                reason: err.to_string(),
            })?;
            let path = url.to_file_path().map_err(|_| AssetError::Locator {
                locator: locator.to_string(),
                reason: "file URL does not map to a local path".into(),
            })?;
            return Ok(Self::Local(path));
        }

        Ok(Self::Local(PathBuf::from(trimmed)))
    }
}

/// Pixels decoded from one asset, ready for palette extraction and upload.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub locator: String,
    pub pixels: RgbaImage,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Fetches raw asset bytes and decodes them into RGBA8.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    http: Client,
}

impl ImageDecoder {
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = Client::builder().build()?;
        Ok(Self { http })
    }

    pub fn fetch(&self, locator: &str) -> Result<Vec<u8>, AssetError> {
        match AssetLocation::parse(locator)? {
            AssetLocation::Local(path) => {
                fs::read(&path).map_err(|source| AssetError::Read { path, source })
            }
            AssetLocation::Remote(url) => {
                let fetch_error = |source| AssetError::Fetch {
                    url: url.to_string(),
                    source,
                };
                let response = self
                    .http
                    .get(url.clone())
                    .send()
                    .and_then(|response| response.error_for_status())
                    .map_err(fetch_error)?;
                let bytes = response.bytes().map_err(fetch_error)?;
                Ok(bytes.to_vec())
            }
        }
    }

    pub fn decode(&self, locator: &str) -> Result<DecodedImage, AssetError> {
        let bytes = self.fetch(locator)?;
        let image = image::load_from_memory(&bytes).map_err(|source| AssetError::Decode {
            locator: locator.to_string(),
            source,
        })?;
        let pixels = image.to_rgba8();
        debug!(
            locator,
            width = pixels.width(),
            height = pixels.height(),
            "decoded asset"
        );
        Ok(DecodedImage {
            locator: locator.to_string(),
            pixels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use tempfile::TempDir;

    #[test]
    fn parses_locator_kinds() {
        assert!(matches!(
            AssetLocation::parse("https://example.com/a.png").unwrap(),
            AssetLocation::Remote(_)
        ));
        assert_eq!(
            AssetLocation::parse("assets/slide.jpg").unwrap(),
            AssetLocation::Local(PathBuf::from("assets/slide.jpg"))
        );
        assert_eq!(
            AssetLocation::parse("file:///tmp/noise.png").unwrap(),
            AssetLocation::Local(PathBuf::from("/tmp/noise.png"))
        );
        assert!(matches!(
            AssetLocation::parse("   "),
            Err(AssetError::Locator { .. })
        ));
    }

    #[test]
    fn decodes_local_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pixel.png");
        RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let decoder = ImageDecoder::new().unwrap();
        let decoded = decoder.decode(path.to_str().unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
        assert_eq!(decoded.pixels.get_pixel(2, 1).0, [1, 2, 3, 255]);
    }

    #[test]
    fn missing_file_reports_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.png");
        let decoder = ImageDecoder::new().unwrap();
        let err = decoder.decode(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, AssetError::Read { .. }));
    }

    #[test]
    fn garbage_bytes_report_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"definitely not an image").unwrap();
        let decoder = ImageDecoder::new().unwrap();
        let err = decoder.decode(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }
}
