//! All-or-nothing asset loading.
//!
//! Loading runs in two phases. Every slide is fetched, decoded and reduced to a
//! palette on its own scoped worker thread; results are fanned back in over a
//! channel and joined. Only when every slide succeeded are the textures
//! uploaded (in manifest order) and the noise texture loaded last. Nothing is
//! returned until both phases are complete, so callers never observe a partial
//! carousel.

use std::fmt;
use std::thread;
use std::time::Instant;

use crossbeam_channel::unbounded;
use tracing::{debug, info};

use crate::decode::{AssetError, DecodedImage, ImageDecoder};
use crate::palette::{extract_palette, pick_colors, ColorPair, Rgb, PALETTE_SIZE};
use crate::slide::{Slide, TextureHandle, TextureSink, TextureWrap};
use crate::state::MIN_SLIDES;

/// One manifest entry: where the image lives plus its caption text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideSource {
    pub locator: String,
    pub title: Option<String>,
    pub body: Option<String>,
}

impl SlideSource {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            title: None,
            body: None,
        }
    }
}

/// A slide that has been decoded and colored but not uploaded yet.
#[derive(Debug, Clone)]
pub struct PreparedSlide {
    pub index: usize,
    pub source: SlideSource,
    pub image: DecodedImage,
    pub palette: Vec<Rgb>,
    pub colors: ColorPair,
}

#[derive(Debug)]
pub struct LoadedAssets {
    pub slides: Vec<Slide>,
    pub noise: TextureHandle,
}

/// Per-slide failure inside an aggregate [`LoadError::Slides`].
#[derive(Debug)]
pub struct SlideFailure {
    pub index: usize,
    pub error: AssetError,
}

impl fmt::Display for SlideFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slide {}: {}", self.index, self.error)?;
        let mut source = std::error::Error::source(&self.error);
        while let Some(cause) = source {
            write!(f, ": {cause}")?;
            source = cause.source();
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("manifest lists {0} slides; at least {min} are required", min = MIN_SLIDES)]
    TooFewSlides(usize),
    #[error("failed to initialise the asset fetcher")]
    Client(#[source] reqwest::Error),
    #[error("{} of {total} slides failed to load ({})", failures.len(), summarize(failures))]
    Slides {
        failures: Vec<SlideFailure>,
        total: usize,
    },
    #[error("noise texture failed to load")]
    Noise(#[source] AssetError),
}

fn summarize(failures: &[SlideFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub struct ResourceLoader {
    decoder: ImageDecoder,
}

impl ResourceLoader {
    pub fn new() -> Result<Self, LoadError> {
        let decoder = ImageDecoder::new().map_err(LoadError::Client)?;
        Ok(Self { decoder })
    }

    /// Decodes every slide and extracts its palette, in parallel.
    ///
    /// Fails with every per-slide error collected if any slide fails.
    pub fn prepare(&self, manifest: &[SlideSource]) -> Result<Vec<PreparedSlide>, LoadError> {
        if manifest.len() < MIN_SLIDES {
            return Err(LoadError::TooFewSlides(manifest.len()));
        }

        let (tx, rx) = unbounded();
        thread::scope(|scope| {
            for (index, source) in manifest.iter().enumerate() {
                let tx = tx.clone();
                let decoder = &self.decoder;
                scope.spawn(move || {
                    let result = prepare_slide(decoder, index, source);
                    let _ = tx.send((index, result));
                });
            }
        });
        drop(tx);

        let mut prepared: Vec<Option<PreparedSlide>> = manifest.iter().map(|_| None).collect();
        let mut failures = Vec::new();
        for (index, result) in rx.iter() {
            match result {
                Ok(slide) => prepared[index] = Some(slide),
                Err(error) => failures.push(SlideFailure { index, error }),
            }
        }

        if !failures.is_empty() {
            failures.sort_by_key(|failure| failure.index);
            return Err(LoadError::Slides {
                failures,
                total: manifest.len(),
            });
        }

        Ok(prepared.into_iter().flatten().collect())
    }

    /// Fetches and decodes the noise texture without uploading it.
    pub fn decode_noise(&self, locator: &str) -> Result<DecodedImage, LoadError> {
        self.decoder.decode(locator).map_err(LoadError::Noise)
    }

    /// Loads slides and the noise texture, uploading through `sink`.
    ///
    /// Uploading stops at the first slide the sink rejects.
    pub fn load<S: TextureSink>(
        &self,
        manifest: &[SlideSource],
        noise_locator: &str,
        sink: &mut S,
    ) -> Result<LoadedAssets, LoadError> {
        let started = Instant::now();
        let prepared = self.prepare(manifest)?;

        let mut slides = Vec::with_capacity(prepared.len());
        for entry in prepared {
            let label = format!("slide #{}", entry.index);
            let texture = upload(sink, &label, &entry.image, TextureWrap::Clamp).map_err(|error| {
                LoadError::Slides {
                    failures: vec![SlideFailure {
                        index: entry.index,
                        error,
                    }],
                    total: manifest.len(),
                }
            })?;
            slides.push(Slide {
                index: entry.index,
                texture,
                primary: entry.colors.primary,
                secondary: entry.colors.secondary,
                title: entry.source.title,
                body: entry.source.body,
            });
        }

        let noise = self.decode_noise(noise_locator)?;
        let noise = upload(sink, "noise", &noise, TextureWrap::Repeat).map_err(LoadError::Noise)?;

        info!(
            slides = slides.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "carousel assets ready"
        );
        Ok(LoadedAssets { slides, noise })
    }
}

fn prepare_slide(
    decoder: &ImageDecoder,
    index: usize,
    source: &SlideSource,
) -> Result<PreparedSlide, AssetError> {
    let started = Instant::now();
    let image = decoder.decode(&source.locator)?;
    let palette = extract_palette(&image.pixels, PALETTE_SIZE);
    let colors = pick_colors(&palette).map_err(|source_err| AssetError::Palette {
        locator: source.locator.clone(),
        source: source_err,
    })?;
    debug!(
        slide = index,
        locator = %source.locator,
        primary = %colors.primary.hex(),
        secondary = %colors.secondary.hex(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "prepared slide"
    );
    Ok(PreparedSlide {
        index,
        source: source.clone(),
        image,
        palette,
        colors,
    })
}

fn upload<S: TextureSink>(
    sink: &mut S,
    label: &str,
    image: &DecodedImage,
    wrap: TextureWrap,
) -> Result<TextureHandle, AssetError> {
    let id = sink
        .upload(label, &image.pixels, wrap)
        .map_err(|source| AssetError::Upload {
            locator: image.locator.clone(),
            source,
        })?;
    Ok(TextureHandle {
        id,
        width: image.width(),
        height: image.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slide::{TextureId, UploadError};
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::fs;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::path::Path;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingSink {
        uploads: Vec<(String, (u32, u32), TextureWrap)>,
        reject_wider_than: Option<u32>,
    }

    impl TextureSink for RecordingSink {
        fn upload(
            &mut self,
            label: &str,
            image: &RgbaImage,
            wrap: TextureWrap,
        ) -> Result<TextureId, UploadError> {
            if let Some(limit) = self.reject_wider_than {
                if image.width() > limit {
                    return Err(UploadError::new(format!(
                        "{} exceeds {limit} pixels",
                        image.width()
                    )));
                }
            }
            let id = TextureId(self.uploads.len() as u32);
            self.uploads
                .push((label.to_string(), image.dimensions(), wrap));
            Ok(id)
        }
    }

    /// Four horizontal bands with decreasing height so the palette is stable.
    fn write_slide(dir: &Path, name: &str, width: u32, tint: u8) -> String {
        let colors = [
            [tint, 20, 20],
            [20, tint, 20],
            [20, 20, tint],
            [tint / 2, tint / 2, 200],
        ];
        let rows = [8, 6, 4, 2];
        let mut image = RgbaImage::new(width, rows.iter().sum());
        let mut y = 0;
        for (color, count) in colors.iter().zip(rows) {
            for row in y..y + count {
                for x in 0..width {
                    image.put_pixel(x, row, Rgba([color[0], color[1], color[2], 255]));
                }
            }
            y += count;
        }
        let path = dir.join(name);
        image.save_with_format(&path, ImageFormat::Png).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn write_noise(dir: &Path) -> String {
        let path = dir.join("noise.png");
        RgbaImage::from_fn(8, 8, |x, y| Rgba([(x * 30) as u8, (y * 30) as u8, 0, 255]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn loads_slides_in_manifest_order_then_noise() {
        let dir = TempDir::new().unwrap();
        let manifest: Vec<_> = [(6, 240), (5, 180), (4, 120)]
            .iter()
            .enumerate()
            .map(|(i, (width, tint))| {
                SlideSource::new(write_slide(dir.path(), &format!("{i}.png"), *width, *tint))
            })
            .collect();
        let noise = write_noise(dir.path());

        let loader = ResourceLoader::new().unwrap();
        let mut sink = RecordingSink::default();
        let assets = loader.load(&manifest, &noise, &mut sink).unwrap();

        assert_eq!(assets.slides.len(), 3);
        for (position, slide) in assets.slides.iter().enumerate() {
            assert_eq!(slide.index, position);
            assert_eq!(slide.texture.id, TextureId(position as u32));
        }
        assert_eq!(assets.slides[0].texture.width, 6);
        assert_eq!(assets.slides[2].texture.width, 4);
        assert_eq!(assets.slides[0].primary, Rgb::new(240, 20, 20));
        assert_eq!(assets.slides[0].secondary, Rgb::new(120, 120, 200));

        assert_eq!(assets.noise.id, TextureId(3));
        let last = sink.uploads.last().unwrap();
        assert_eq!(last.0, "noise");
        assert_eq!(last.2, TextureWrap::Repeat);
        assert!(sink.uploads[..3]
            .iter()
            .all(|(_, _, wrap)| *wrap == TextureWrap::Clamp));
    }

    #[test]
    fn any_missing_slide_rejects_the_whole_load() {
        let dir = TempDir::new().unwrap();
        let manifest = vec![
            SlideSource::new(write_slide(dir.path(), "a.png", 4, 200)),
            SlideSource::new(dir.path().join("404.png").to_string_lossy().into_owned()),
            SlideSource::new(write_slide(dir.path(), "c.png", 4, 160)),
        ];
        let noise = write_noise(dir.path());

        let loader = ResourceLoader::new().unwrap();
        let mut sink = RecordingSink::default();
        let err = loader.load(&manifest, &noise, &mut sink).unwrap_err();

        match err {
            LoadError::Slides { failures, total } => {
                assert_eq!(total, 3);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].index, 1);
                assert!(matches!(failures[0].error, AssetError::Read { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(sink.uploads.is_empty(), "nothing may be uploaded");
    }

    #[test]
    fn flat_image_fails_palette_requirement() {
        let dir = TempDir::new().unwrap();
        let flat = dir.path().join("flat.png");
        RgbaImage::from_pixel(4, 4, Rgba([10, 10, 10, 255]))
            .save_with_format(&flat, ImageFormat::Png)
            .unwrap();
        let manifest = vec![
            SlideSource::new(write_slide(dir.path(), "ok.png", 4, 200)),
            SlideSource::new(flat.to_string_lossy().into_owned()),
        ];

        let loader = ResourceLoader::new().unwrap();
        let err = loader.prepare(&manifest).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("1 of 2 slides failed"), "{message}");
        assert!(message.contains("palette has 1 colors"), "{message}");
    }

    #[test]
    fn missing_noise_fails_after_slides() {
        let dir = TempDir::new().unwrap();
        let manifest = vec![
            SlideSource::new(write_slide(dir.path(), "a.png", 4, 200)),
            SlideSource::new(write_slide(dir.path(), "b.png", 4, 150)),
        ];
        let noise = dir.path().join("nope.png").to_string_lossy().into_owned();

        let loader = ResourceLoader::new().unwrap();
        let mut sink = RecordingSink::default();
        let err = loader.load(&manifest, &noise, &mut sink).unwrap_err();
        assert!(matches!(err, LoadError::Noise(AssetError::Read { .. })));
    }

    #[test]
    fn upload_stops_at_first_rejected_slide() {
        let dir = TempDir::new().unwrap();
        let manifest = vec![
            SlideSource::new(write_slide(dir.path(), "small.png", 4, 200)),
            SlideSource::new(write_slide(dir.path(), "wide.png", 64, 150)),
            SlideSource::new(write_slide(dir.path(), "after.png", 4, 100)),
        ];
        let noise = write_noise(dir.path());

        let loader = ResourceLoader::new().unwrap();
        let mut sink = RecordingSink {
            reject_wider_than: Some(32),
            ..Default::default()
        };
        let err = loader.load(&manifest, &noise, &mut sink).unwrap_err();
        match err {
            LoadError::Slides { failures, total } => {
                assert_eq!(total, 3);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].index, 1);
                assert!(matches!(failures[0].error, AssetError::Upload { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(sink.uploads.len(), 1, "nothing is uploaded after a rejection");
        assert_eq!(sink.uploads[0].0, "slide #0");
    }

    /// Serves files from `dir` over HTTP/1.1; unknown paths answer 404.
    fn serve_dir(dir: &Path) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let root = dir.to_path_buf();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let root = root.clone();
                thread::spawn(move || {
                    let mut reader = BufReader::new(stream.try_clone().unwrap());
                    let mut request = String::new();
                    if reader.read_line(&mut request).is_err() {
                        return;
                    }
                    let mut header = String::new();
                    while reader.read_line(&mut header).map(|n| n > 2).unwrap_or(false) {
                        header.clear();
                    }
                    let path = request.split_whitespace().nth(1).unwrap_or("/");
                    let (status, body) = match fs::read(root.join(path.trim_start_matches('/'))) {
                        Ok(bytes) => ("200 OK", bytes),
                        Err(_) => ("404 Not Found", b"not found".to_vec()),
                    };
                    let head = format!(
                        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        body.len()
                    );
                    let _ = stream.write_all(head.as_bytes());
                    let _ = stream.write_all(&body);
                });
            }
        });
        format!("http://{address}")
    }

    #[test]
    fn remote_manifest_loads_in_order() {
        let dir = TempDir::new().unwrap();
        for (i, tint) in [240, 180, 120].into_iter().enumerate() {
            write_slide(dir.path(), &format!("{i}.png"), 4 + i as u32, tint);
        }
        write_noise(dir.path());
        let base = serve_dir(dir.path());

        let manifest: Vec<_> = (0..3)
            .map(|i| SlideSource::new(format!("{base}/{i}.png")))
            .collect();
        let loader = ResourceLoader::new().unwrap();
        let mut sink = RecordingSink::default();
        let assets = loader
            .load(&manifest, &format!("{base}/noise.png"), &mut sink)
            .unwrap();

        assert_eq!(assets.slides.len(), 3);
        for (position, slide) in assets.slides.iter().enumerate() {
            assert_eq!(slide.index, position);
            assert_eq!(slide.texture.width, 4 + position as u32);
        }
        assert_eq!(assets.noise.id, TextureId(3));
        assert_eq!((assets.noise.width, assets.noise.height), (8, 8));
    }

    #[test]
    fn remote_404_rejects_the_whole_load() {
        let dir = TempDir::new().unwrap();
        write_slide(dir.path(), "0.png", 4, 240);
        write_slide(dir.path(), "2.png", 4, 120);
        write_noise(dir.path());
        let base = serve_dir(dir.path());

        let manifest = vec![
            SlideSource::new(format!("{base}/0.png")),
            SlideSource::new(format!("{base}/missing.png")),
            SlideSource::new(format!("{base}/2.png")),
        ];
        let loader = ResourceLoader::new().unwrap();
        let mut sink = RecordingSink::default();
        let err = loader
            .load(&manifest, &format!("{base}/noise.png"), &mut sink)
            .unwrap_err();

        match err {
            LoadError::Slides { failures, total } => {
                assert_eq!(total, 3);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].index, 1);
                assert!(matches!(failures[0].error, AssetError::Fetch { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(sink.uploads.is_empty());
    }

    #[test]
    fn decode_noise_reports_noise_error() {
        let dir = TempDir::new().unwrap();
        let loader = ResourceLoader::new().unwrap();
        let missing = dir.path().join("noise.png").to_string_lossy().into_owned();
        assert!(matches!(
            loader.decode_noise(&missing),
            Err(LoadError::Noise(AssetError::Read { .. }))
        ));
        let present = write_noise(dir.path());
        assert_eq!(loader.decode_noise(&present).unwrap().width(), 8);
    }

    #[test]
    fn single_slide_manifest_is_rejected() {
        let loader = ResourceLoader::new().unwrap();
        let err = loader.prepare(&[SlideSource::new("only.png")]).unwrap_err();
        assert!(matches!(err, LoadError::TooFewSlides(1)));
    }
}
