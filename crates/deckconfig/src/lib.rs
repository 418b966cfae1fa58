use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeckConfig {
    pub version: u32,
    pub noise: String,
    #[serde(
        default = "default_clear_color",
        deserialize_with = "deserialize_color"
    )]
    pub clear_color: [f32; 4],
    #[serde(default = "default_time_step")]
    pub time_step: f32,
    #[serde(default = "default_grid_size")]
    pub grid_size: [u32; 2],
    #[serde(default)]
    pub window: WindowSection,
    #[serde(default)]
    pub slides: Vec<SlideEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowSection {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SlideEntry {
    pub image: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

fn default_clear_color() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

fn default_time_step() -> f32 {
    0.01
}

fn default_grid_size() -> [u32; 2] {
    [12, 8]
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_title() -> String {
    "gridwarp".into()
}

/// Accepts `[r, g, b, a]` in `[0, 1]` or a `#rrggbb` / `#rrggbbaa` string.
fn deserialize_color<'de, D>(deserializer: D) -> Result<[f32; 4], D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Hex(String),
        Rgba([f32; 4]),
        Rgb([f32; 3]),
    }

    match Helper::deserialize(deserializer)? {
        Helper::Rgba(rgba) => Ok(rgba),
        Helper::Rgb([r, g, b]) => Ok([r, g, b, 1.0]),
        Helper::Hex(raw) => parse_hex_color(&raw).map_err(de::Error::custom),
    }
}

fn parse_hex_color(raw: &str) -> Result<[f32; 4], String> {
    let digits = raw.trim().trim_start_matches('#');
    if !matches!(digits.len(), 6 | 8) || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(format!("invalid color '{raw}'; expected #rrggbb or #rrggbbaa"));
    }
    let mut color = [1.0; 4];
    for (slot, chunk) in color.iter_mut().zip(digits.as_bytes().chunks(2)) {
        let text = std::str::from_utf8(chunk).map_err(|err| err.to_string())?;
        let value = u8::from_str_radix(text, 16).map_err(|err| err.to_string())?;
        *slot = f32::from(value) / 255.0;
    }
    Ok(color)
}

fn is_remote(locator: &str) -> bool {
    let lowered = locator.trim().to_ascii_lowercase();
    ["http://", "https://", "file://"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
}

fn resolve_locator(locator: &str, base: &Path) -> String {
    if is_remote(locator) {
        return locator.to_string();
    }
    let path = Path::new(locator.trim());
    if path.is_absolute() {
        locator.to_string()
    } else {
        base.join(path).to_string_lossy().into_owned()
    }
}

impl DeckConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: DeckConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reads and validates `path`, resolving relative asset paths against its
    /// directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&contents)?;
        if let Some(base) = path.parent() {
            config.resolve_relative(base);
        }
        Ok(config)
    }

    pub fn resolve_relative(&mut self, base: &Path) {
        self.noise = resolve_locator(&self.noise, base);
        for slide in &mut self.slides {
            slide.image = resolve_locator(&slide.image, base);
        }
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.window.width, self.window.height)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.slides.len() < 2 {
            return Err(ConfigError::Invalid(format!(
                "config must list at least two slides, found {}",
                self.slides.len()
            )));
        }

        for (index, slide) in self.slides.iter().enumerate() {
            if slide.image.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "slide {index} has an empty image locator"
                )));
            }
        }

        if self.noise.trim().is_empty() {
            return Err(ConfigError::Invalid("noise locator may not be empty".into()));
        }

        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "time_step must be greater than zero, got {}",
                self.time_step
            )));
        }

        if self.grid_size.iter().any(|&cells| cells == 0) {
            return Err(ConfigError::Invalid(
                "grid_size must have at least one cell per axis".into(),
            ));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero",
                self.window.width, self.window.height
            )));
        }

        if self
            .clear_color
            .iter()
            .any(|channel| !(0.0..=1.0).contains(channel))
        {
            return Err(ConfigError::Invalid(
                "clear_color components must be within [0, 1]".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r##"
version = 1
noise = "textures/noise.png"
clear_color = "#202020"
grid_size = [16, 9]

[window]
width = 1920
height = 1080
title = "Gallery"

[[slides]]
image = "slides/one.jpg"
title = "Dunes"
body = "Late afternoon light"

[[slides]]
image = "https://example.com/two.jpg"
title = "Harbour"

[[slides]]
image = "/srv/images/three.png"
"##;

    #[test]
    fn parses_sample_config() {
        let config = DeckConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.version, 1);
        assert_eq!(config.slides.len(), 3);
        assert_eq!(config.slides[0].title.as_deref(), Some("Dunes"));
        assert_eq!(config.slides[1].body, None);
        assert_eq!(config.grid_size, [16, 9]);
        assert_eq!(config.surface_size(), (1920, 1080));
        assert_eq!(config.window.title, "Gallery");
        let grey = 32.0 / 255.0;
        assert_eq!(config.clear_color, [grey, grey, grey, 1.0]);
        assert_eq!(config.time_step, 0.01);
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let config = DeckConfig::from_toml_str(
            r#"
version = 1
noise = "noise.png"

[[slides]]
image = "a.png"

[[slides]]
image = "b.png"
"#,
        )
        .unwrap();
        assert_eq!(config.clear_color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(config.grid_size, [12, 8]);
        assert_eq!(config.surface_size(), (1280, 720));
        assert_eq!(config.window.title, "gridwarp");
    }

    #[test]
    fn rejects_single_slide() {
        let err = DeckConfig::from_toml_str(
            r#"
version = 1
noise = "noise.png"

[[slides]]
image = "a.png"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let base = r#"
noise = "noise.png"

[[slides]]
image = "a.png"

[[slides]]
image = "b.png"
"#;
        for header in [
            "version = 2",
            "version = 1\ntime_step = 0.0",
            "version = 1\ngrid_size = [0, 4]",
            "version = 1\nclear_color = [1.5, 0.0, 0.0, 1.0]",
        ] {
            let err = DeckConfig::from_toml_str(&format!("{header}\n{base}")).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{header}");
        }
    }

    #[test]
    fn rejects_malformed_color() {
        let err = DeckConfig::from_toml_str(
            r##"
version = 1
noise = "noise.png"
clear_color = "#12"

[[slides]]
image = "a.png"

[[slides]]
image = "b.png"
"##,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_resolves_paths_against_config_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("carousel.toml");
        fs::write(&path, SAMPLE).unwrap();

        let config = DeckConfig::load(&path).unwrap();
        assert_eq!(
            PathBuf::from(&config.noise),
            dir.path().join("textures/noise.png")
        );
        assert_eq!(
            PathBuf::from(&config.slides[0].image),
            dir.path().join("slides/one.jpg")
        );
        assert_eq!(config.slides[1].image, "https://example.com/two.jpg");
        assert_eq!(config.slides[2].image, "/srv/images/three.png");
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = DeckConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
