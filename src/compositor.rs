//! Deterministic CPU rasterizer: background image plus ordered text layers,
//! composited at the template's native resolution.
//!
//! A render pass is synchronous and all-or-nothing: on success the new frame
//! replaces the previous one; on any failure (or when the background image is
//! not ready) the previous completed frame stays untouched, so callers never
//! observe half-drawn output.

use std::{collections::HashMap, sync::Arc};

use tracing::{debug, trace, warn};

use crate::{
    assets::{BackgroundSlot, PreparedImage},
    error::{ForgeError, ForgeResult},
    layout,
    model::{HAlign, Rgba8, Template, TextLayer},
    text::{RegisteredFamily, TextShaper},
};

/// One completed render: tightly packed RGBA8 at native template size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// Result of a render pass. `NotReady` is a deferral, not an error: the
/// background image has not finished loading yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered,
    NotReady,
}

pub struct Compositor {
    shaper: TextShaper,
    font_cache: HashMap<String, vello_cpu::peniko::FontData>,
    background_cache: Option<BackgroundCache>,
    frame: Option<FrameRgba>,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self {
            shaper: TextShaper::new(),
            font_cache: HashMap::new(),
            background_cache: None,
            frame: None,
        }
    }

    /// Register font bytes for a layer font family (see
    /// [`TextShaper::register_font`]).
    pub fn register_font(&mut self, alias: &str, bytes: Vec<u8>) -> ForgeResult<()> {
        self.shaper.register_font(alias, bytes)
    }

    pub fn has_fonts(&self) -> bool {
        self.shaper.has_fonts()
    }

    /// The most recent completed frame, if any pass has succeeded yet.
    pub fn frame(&self) -> Option<&FrameRgba> {
        self.frame.as_ref()
    }

    /// Composite the background and every layer, in list order, onto a fresh
    /// surface at exactly `template.width x template.height`.
    pub fn render(
        &mut self,
        template: &Template,
        background: &BackgroundSlot,
        layers: &[TextLayer],
    ) -> ForgeResult<RenderOutcome> {
        let Some((generation, image)) = background.ready() else {
            trace!(template = %template.id, "background not ready; deferring render");
            return Ok(RenderOutcome::NotReady);
        };

        let width_u16: u16 = template
            .width
            .try_into()
            .map_err(|_| ForgeError::render("template width exceeds u16"))?;
        let height_u16: u16 = template
            .height
            .try_into()
            .map_err(|_| ForgeError::render("template height exceeds u16"))?;

        let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);

        self.draw_background(&mut ctx, template, generation, image)?;
        for layer in layers {
            self.draw_layer(&mut ctx, template, layer)?;
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(width_u16, height_u16);
        ctx.render_to_pixmap(&mut pixmap);

        self.frame = Some(FrameRgba {
            width: template.width,
            height: template.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        });
        debug!(
            template = %template.id,
            layers = layers.len(),
            "render pass complete"
        );
        Ok(RenderOutcome::Rendered)
    }

    /// Background scaled to fill the full native rect. Aspect distortion is
    /// accepted by design; no letterboxing.
    fn draw_background(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        template: &Template,
        generation: u64,
        image: &PreparedImage,
    ) -> ForgeResult<()> {
        let paint = self.background_paint(generation, image)?;

        let sx = f64::from(template.width) / f64::from(image.width);
        let sy = f64::from(template.height) / f64::from(image.height);

        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::scale_non_uniform(sx, sy));
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(image.width),
            f64::from(image.height),
        ));
        Ok(())
    }

    fn draw_layer(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        template: &Template,
        layer: &TextLayer,
    ) -> ForgeResult<()> {
        let Some(family) = self.shaper.resolve(&layer.font_family).cloned() else {
            warn!(
                layer = %layer.id,
                family = %layer.font_family,
                "no registered font for layer family; skipping glyphs"
            );
            return Ok(());
        };
        let font = self.font_data_for(&family);

        let anchor_y = layout::to_native(layer.x, layer.y, template).y;
        let anchor_x = layout::resolved_anchor_pct(layer.align, layer.x) / 100.0
            * f64::from(template.width);

        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        for (i, raw_line) in layer.text.split('\n').enumerate() {
            // An empty line still occupies its slot in the vertical rhythm.
            if raw_line.is_empty() {
                continue;
            }
            let display_line = if layer.uppercase {
                raw_line.to_uppercase()
            } else {
                raw_line.to_string()
            };

            let shaped = self.shaper.shape_line(
                &display_line,
                &family.resolved,
                layer.font_size,
                layer.fill,
            )?;

            let advance = f64::from(shaped.full_width());
            let line_x = match layer.align {
                HAlign::Left => anchor_x,
                HAlign::Center => anchor_x - advance / 2.0,
                HAlign::Right => anchor_x - advance,
            };
            let line_y =
                anchor_y + i as f64 * f64::from(layer.font_size) * layout::LINE_HEIGHT_FACTOR;

            ctx.set_transform(vello_cpu::kurbo::Affine::translate((line_x, line_y)));

            // Stroke first, fill second; the outline must never paint over
            // the filled glyphs.
            if layer.stroke_width > 0.0 {
                ctx.set_stroke(
                    vello_cpu::kurbo::Stroke::new(f64::from(layer.stroke_width))
                        .with_join(vello_cpu::kurbo::Join::Round),
                );
                ctx.set_paint(color_to_cpu(layer.stroke));
                draw_glyphs(ctx, &shaped, &font, GlyphPaint::Stroke);
            }

            ctx.set_paint(color_to_cpu(layer.fill));
            draw_glyphs(ctx, &shaped, &font, GlyphPaint::Fill);
        }
        Ok(())
    }

    /// Cached by generation *and* pixel identity; a completion carrying the
    /// same generation but fresh pixels must not reuse the old paint.
    fn background_paint(
        &mut self,
        generation: u64,
        image: &PreparedImage,
    ) -> ForgeResult<vello_cpu::Image> {
        if let Some(cached) = &self.background_cache
            && cached.generation == generation
            && Arc::ptr_eq(&cached.pixels, &image.rgba8_premul)
        {
            return Ok(cached.paint.clone());
        }

        let pixmap =
            image_premul_bytes_to_pixmap(image.rgba8_premul.as_slice(), image.width, image.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.background_cache = Some(BackgroundCache {
            generation,
            pixels: image.rgba8_premul.clone(),
            paint: paint.clone(),
        });
        Ok(paint)
    }

    fn font_data_for(&mut self, family: &RegisteredFamily) -> vello_cpu::peniko::FontData {
        if let Some(font) = self.font_cache.get(&family.resolved) {
            return font.clone();
        }
        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(family.bytes.as_ref().clone()),
            0,
        );
        self.font_cache.insert(family.resolved.clone(), font.clone());
        font
    }
}

struct BackgroundCache {
    generation: u64,
    pixels: Arc<Vec<u8>>,
    paint: vello_cpu::Image,
}

#[derive(Clone, Copy)]
enum GlyphPaint {
    Fill,
    Stroke,
}

fn draw_glyphs(
    ctx: &mut vello_cpu::RenderContext,
    shaped: &parley::Layout<Rgba8>,
    font: &vello_cpu::peniko::FontData,
    paint: GlyphPaint,
) {
    for line in shaped.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            let builder = ctx.glyph_run(font).font_size(run.run().font_size());
            match paint {
                GlyphPaint::Fill => builder.fill_glyphs(glyphs),
                GlyphPaint::Stroke => builder.stroke_glyphs(glyphs),
            }
        }
    }
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> ForgeResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ForgeError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ForgeError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(ForgeError::render("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}
