// Configuration loading and defaults.
// Visual: nothing on screen; decides picture, colours and how strong the water looks.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::types::pack_argb;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "ripple-window.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub effect: EffectConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Picture to distort
    #[serde(default = "default_image")]
    pub image: PathBuf,

    /// Fill behind (and around) the picture, `#rgb` or `#rrggbb`
    #[serde(default = "default_background")]
    pub background_color: String,

    /// Internal buffer size relative to the window, in (0, 1]
    #[serde(default = "default_resolution")]
    pub resolution: f32,

    /// false = draw one clean frame and never animate
    #[serde(default = "default_true")]
    pub animated: bool,

    #[serde(default = "default_width")]
    pub width: usize,

    #[serde(default = "default_height")]
    pub height: usize,

    #[serde(default = "default_title")]
    pub title: String,

    /// Target frames per second for the window loop
    #[serde(default = "default_frame_rate")]
    pub frame_rate: usize,
}

/// What happens to live ripples when the window changes size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizePolicy {
    /// Move ripple centres and the cursor by the resize ratio
    #[default]
    Rescale,
    /// Drop every ripple and forget the cursor
    Clear,
}

/// Effect tuning. Distances and speeds are given at resolution 1.0
/// and scaled by `display.resolution` at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct EffectConfig {
    #[serde(default = "default_lens_radius")]
    pub lens_radius: f32,

    #[serde(default = "default_lens_power")]
    pub lens_power: f32,

    /// Radius growth per frame
    #[serde(default = "default_ripple_speed")]
    pub ripple_speed: f32,

    /// Power lost per frame
    #[serde(default = "default_ripple_decay")]
    pub ripple_decay: f32,

    /// Half-width of a ripple ring
    #[serde(default = "default_ripple_thickness")]
    pub ripple_thickness: f32,

    /// Pointer travel needed before a new ripple is dropped
    #[serde(default = "default_spawn_distance")]
    pub spawn_distance: f32,

    #[serde(default = "default_ripple_power")]
    pub ripple_power: f32,

    #[serde(default = "default_max_ripples")]
    pub max_ripples: usize,

    /// Picture size relative to its native size (on top of `resolution`)
    #[serde(default = "default_image_scale")]
    pub image_scale: f32,

    #[serde(default)]
    pub resize_policy: ResizePolicy,
}

// Default value functions
fn default_image() -> PathBuf {
    PathBuf::from("img/3.jpg")
}
fn default_background() -> String {
    "#0a0c12".to_string()
}
fn default_resolution() -> f32 {
    0.4
}
fn default_true() -> bool {
    true
}
fn default_width() -> usize {
    1280
}
fn default_height() -> usize {
    720
}
fn default_title() -> String {
    "Ripple Window".to_string()
}
fn default_frame_rate() -> usize {
    60
}
fn default_lens_radius() -> f32 {
    60.0
}
fn default_lens_power() -> f32 {
    5.0
}
fn default_ripple_speed() -> f32 {
    4.0
}
fn default_ripple_decay() -> f32 {
    0.5
}
fn default_ripple_thickness() -> f32 {
    40.0
}
fn default_spawn_distance() -> f32 {
    5.0
}
fn default_ripple_power() -> f32 {
    10.0
}
fn default_max_ripples() -> usize {
    100
}
fn default_image_scale() -> f32 {
    0.7
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            image: default_image(),
            background_color: default_background(),
            resolution: default_resolution(),
            animated: true,
            width: default_width(),
            height: default_height(),
            title: default_title(),
            frame_rate: default_frame_rate(),
        }
    }
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            lens_radius: default_lens_radius(),
            lens_power: default_lens_power(),
            ripple_speed: default_ripple_speed(),
            ripple_decay: default_ripple_decay(),
            ripple_thickness: default_ripple_thickness(),
            spawn_distance: default_spawn_distance(),
            ripple_power: default_ripple_power(),
            max_ripples: default_max_ripples(),
            image_scale: default_image_scale(),
            resize_policy: ResizePolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file, or use defaults.
    /// An explicit path must exist; the implicit one is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)
            .map_err(|source| Error::ConfigRead { path: path.clone(), source })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let d = &self.display;
        if !(d.resolution > 0.0 && d.resolution <= 1.0) {
            return Err(Error::ConfigInvalid(format!(
                "resolution must be in (0, 1], got {}",
                d.resolution
            )));
        }
        if d.width == 0 || d.height == 0 {
            return Err(Error::ConfigInvalid("window size must be non-zero".into()));
        }
        parse_hex_color(&d.background_color)?;

        let e = &self.effect;
        if e.lens_radius <= 0.0 {
            return Err(Error::ConfigInvalid("lens_radius must be positive".into()));
        }
        if e.ripple_thickness <= 0.0 {
            return Err(Error::ConfigInvalid("ripple_thickness must be positive".into()));
        }
        if e.max_ripples == 0 {
            return Err(Error::ConfigInvalid("max_ripples must be at least 1".into()));
        }
        if e.image_scale <= 0.0 {
            return Err(Error::ConfigInvalid("image_scale must be positive".into()));
        }
        Ok(())
    }

    /// Background as a packed opaque pixel.
    pub fn background(&self) -> Result<u32, Error> {
        parse_hex_color(&self.display.background_color)
    }
}

/// Parse `#rgb` / `#rrggbb` (leading `#` optional) into an opaque 0xAARRGGBB.
pub fn parse_hex_color(s: &str) -> Result<u32, Error> {
    let hex = s.trim().trim_start_matches('#');
    let bad = || Error::ConfigInvalid(format!("not a hex colour: {s:?}"));
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(bad());
    }
    let channel = |h: &str| u8::from_str_radix(h, 16).map_err(|_| bad());

    let (r, g, b) = match hex.len() {
        3 => {
            // #abc == #aabbcc
            let r = channel(&hex[0..1])?;
            let g = channel(&hex[1..2])?;
            let b = channel(&hex[2..3])?;
            (r * 17, g * 17, b * 17)
        }
        6 => (channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?),
        _ => return Err(bad()),
    };
    Ok(pack_argb(r, g, b, 255))
}
