use crate::error::{ForgeError, ForgeResult};

/// Immutable descriptor of a meme base image.
///
/// Loaded once from a catalog and never mutated; `width`/`height` are the
/// native pixel dimensions every render pass targets.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    /// Image reference (file path or URL); resolution is the caller's job.
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub category: String,
    /// Seed texts; one layer per entry is created on activation.
    pub default_texts: Vec<String>,
}

impl Template {
    pub fn validate(&self) -> ForgeResult<()> {
        if self.id.trim().is_empty() {
            return Err(ForgeError::validation("template id must be non-empty"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ForgeError::validation("template width/height must be > 0"));
        }
        Ok(())
    }
}

/// Horizontal text alignment. Closed set; both the interactive overlay and
/// the compositor resolve anchors through [`crate::layout::resolved_anchor_pct`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Straight (non-premultiplied) RGBA color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Rgba8 = Rgba8::new(255, 255, 255, 255);
    pub const BLACK: Rgba8 = Rgba8::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(s: &str) -> ForgeResult<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.is_ascii() {
            return Err(ForgeError::validation(format!("invalid hex color '{s}'")));
        }
        let parse = |i: usize| -> ForgeResult<u8> {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| ForgeError::validation(format!("invalid hex color '{s}'")))
        };
        match hex.len() {
            6 => Ok(Self::new(parse(0)?, parse(2)?, parse(4)?, 255)),
            8 => Ok(Self::new(parse(0)?, parse(2)?, parse(4)?, parse(6)?)),
            _ => Err(ForgeError::validation(format!(
                "invalid hex color '{s}' (expected 6 or 8 digits)"
            ))),
        }
    }
}

/// One positioned, styled text block overlaid on the template.
///
/// `x`/`y` are percentages of the template dimensions measured from the
/// top-left corner, so the same layer data renders correctly at any display
/// scale. `uppercase` is a display transform; the stored `text` is untouched.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextLayer {
    pub id: String,
    /// May contain embedded `\n` line breaks.
    pub text: String,
    pub x: f64,
    pub y: f64,
    /// Font size in native pixels, independent of display scale.
    pub font_size: f32,
    pub font_family: String,
    pub fill: Rgba8,
    pub stroke: Rgba8,
    /// `0` means no stroke. Never negative.
    pub stroke_width: f32,
    pub align: HAlign,
    pub uppercase: bool,
}

/// Partial update applied through [`crate::layers::LayerSet::update_layer`].
///
/// All fields optional so form controls and CLI callers can express sparse
/// edits as plain data.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayerPatch {
    pub text: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub font_size: Option<f32>,
    pub font_family: Option<String>,
    pub fill: Option<Rgba8>,
    pub stroke: Option<Rgba8>,
    pub stroke_width: Option<f32>,
    pub align: Option<HAlign>,
    pub uppercase: Option<bool>,
}
