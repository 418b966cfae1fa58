//! Frequency-ranked palette extraction.
//!
//! Pixels are bucketed on a 5-bit-per-channel grid; each bucket reports the
//! average of the pixels that landed in it, and buckets are ranked by how many
//! sampled pixels they hold. The slide's primary color is the top entry and its
//! secondary (accent) color is the entry at [`SECONDARY_RANK`].

use std::collections::HashMap;

use image::RgbaImage;
use serde::Serialize;

/// Number of palette entries kept when ranking an image.
pub const PALETTE_SIZE: usize = 10;

/// Zero-based rank of the accent color inside the palette.
pub const SECONDARY_RANK: usize = 3;

/// Upper bound on sampled pixels; larger images are strided.
pub const MAX_SAMPLES: usize = 100_000;

/// Pixels with alpha below this threshold do not contribute.
const ALPHA_CUTOFF: u8 = 125;

const QUANT_SHIFT: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Normalised `[0, 1]` channels, padded to a vec4 for uniform upload.
    pub fn to_vec4(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            1.0,
        ]
    }

    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Primary + accent color of a slide, bound as `uBackground0`/`uBackground1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorPair {
    pub primary: Rgb,
    pub secondary: Rgb,
}

impl ColorPair {
    pub fn to_uniform(self) -> [[f32; 4]; 2] {
        [self.primary.to_vec4(), self.secondary.to_vec4()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("palette has {found} colors; at least {required} are needed for an accent color")]
pub struct PaletteError {
    pub found: usize,
    pub required: usize,
}

#[derive(Default)]
struct Bucket {
    count: u64,
    sum: [u64; 3],
}

/// Returns at most `max_colors` representative colors, most frequent first.
///
/// Ties are broken by bucket position so the result is deterministic.
pub fn extract_palette(image: &RgbaImage, max_colors: usize) -> Vec<Rgb> {
    let total = image.width() as usize * image.height() as usize;
    let stride = (total / MAX_SAMPLES).max(1);

    let mut buckets: HashMap<(u8, u8, u8), Bucket> = HashMap::new();
    for pixel in image.pixels().step_by(stride) {
        let [r, g, b, a] = pixel.0;
        if a < ALPHA_CUTOFF {
            continue;
        }
        let key = (r >> QUANT_SHIFT, g >> QUANT_SHIFT, b >> QUANT_SHIFT);
        let bucket = buckets.entry(key).or_default();
        bucket.count += 1;
        bucket.sum[0] += u64::from(r);
        bucket.sum[1] += u64::from(g);
        bucket.sum[2] += u64::from(b);
    }

    let mut ranked: Vec<_> = buckets.into_iter().collect();
    ranked.sort_by(|(key_a, a), (key_b, b)| b.count.cmp(&a.count).then(key_a.cmp(key_b)));
    ranked
        .into_iter()
        .take(max_colors)
        .map(|(_, bucket)| {
            let average = |sum: u64| (sum / bucket.count) as u8;
            Rgb::new(
                average(bucket.sum[0]),
                average(bucket.sum[1]),
                average(bucket.sum[2]),
            )
        })
        .collect()
}

/// Picks the primary and accent colors out of a ranked palette.
pub fn pick_colors(palette: &[Rgb]) -> Result<ColorPair, PaletteError> {
    match (palette.first(), palette.get(SECONDARY_RANK)) {
        (Some(&primary), Some(&secondary)) => Ok(ColorPair { primary, secondary }),
        _ => Err(PaletteError {
            found: palette.len(),
            required: SECONDARY_RANK + 1,
        }),
    }
}

pub fn extract_colors(image: &RgbaImage) -> Result<ColorPair, PaletteError> {
    pick_colors(&extract_palette(image, PALETTE_SIZE))
}
