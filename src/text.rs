//! Parley-based text shaping plus the font registry mapping layer font
//! families (e.g. "Impact") to registered font bytes.

use std::{collections::HashMap, sync::Arc};

use crate::{
    error::{ForgeError, ForgeResult},
    model::Rgba8,
};

/// A font family registered under a caller-chosen alias.
#[derive(Clone)]
pub struct RegisteredFamily {
    /// Primary family name as detected from the font data; this is what the
    /// shaping font stack references.
    pub resolved: String,
    /// Original font bytes, kept for building rasterizer glyph outlines.
    pub bytes: Arc<Vec<u8>>,
}

impl std::fmt::Debug for RegisteredFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredFamily")
            .field("resolved", &self.resolved)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

/// Stateful helper for shaping single lines of layer text.
///
/// Explicit line breaks are split upstream by the compositor; each call here
/// lays out exactly one line with no wrapping, so the layout's full width is
/// the line advance used for alignment offsets.
pub struct TextShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Rgba8>,
    families: HashMap<String, RegisteredFamily>,
    default_alias: Option<String>,
}

impl Default for TextShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl TextShaper {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
            default_alias: None,
        }
    }

    /// Register font bytes under `alias`. The first registered family becomes
    /// the fallback for unknown layer families.
    pub fn register_font(&mut self, alias: &str, bytes: Vec<u8>) -> ForgeResult<()> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ForgeError::validation("no font families registered from font bytes")
        })?;
        let resolved = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ForgeError::validation("registered font family has no name"))?
            .to_string();

        self.families.insert(
            alias.to_string(),
            RegisteredFamily {
                resolved,
                bytes: Arc::new(bytes),
            },
        );
        if self.default_alias.is_none() {
            self.default_alias = Some(alias.to_string());
        }
        Ok(())
    }

    /// Look up a layer's font family: exact alias first, then the default
    /// fallback. `None` when nothing is registered at all.
    pub fn resolve(&self, family: &str) -> Option<&RegisteredFamily> {
        if let Some(found) = self.families.get(family) {
            return Some(found);
        }
        self.default_alias
            .as_ref()
            .and_then(|alias| self.families.get(alias))
    }

    pub fn has_fonts(&self) -> bool {
        !self.families.is_empty()
    }

    /// Shape one line of display text at `size_px` using a resolved family
    /// name from [`Self::resolve`].
    pub fn shape_line(
        &mut self,
        text: &str,
        resolved_family: &str,
        size_px: f32,
        brush: Rgba8,
    ) -> ForgeResult<parley::Layout<Rgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ForgeError::validation("font size must be finite and > 0"));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(
                resolved_family.to_string(),
            )),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<Rgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}
