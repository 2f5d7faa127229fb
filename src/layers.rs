//! CRUD over the active text-layer list with template-driven defaults.
//!
//! List order is paint order (later entries draw on top) and must match the
//! UI stacking order, so nothing here ever reorders the list.

use tracing::debug;

use crate::model::{HAlign, LayerPatch, Rgba8, Template, TextLayer};

const DEFAULT_FONT_SIZE: f32 = 32.0;
const DEFAULT_FONT_FAMILY: &str = "Impact";
const DEFAULT_STROKE_WIDTH: f32 = 2.0;

/// The ordered set of text layers for the active template.
///
/// Ids are minted from a monotonic counter so they stay unique for the whole
/// session, including across template switches and remove/add cycles.
#[derive(Debug, Default)]
pub struct LayerSet {
    layers: Vec<TextLayer>,
    next_id: u64,
}

impl LayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers(&self) -> &[TextLayer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TextLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Replace the whole set with one default layer per template seed text,
    /// vertically staggered. Seed `y` values intentionally stay unclamped;
    /// downstream clamping in the drag path keeps geometry in range.
    pub fn reset_for_template(&mut self, template: &Template) {
        let mut layers = Vec::with_capacity(template.default_texts.len());
        for (i, text) in template.default_texts.iter().enumerate() {
            let id = self.mint_id();
            layers.push(default_layer(id, text.clone(), 50.0, 10.0 + i as f64 * 30.0));
        }
        self.layers = layers;
        debug!(
            template = %template.id,
            layers = self.layers.len(),
            "reset layers for template"
        );
    }

    /// Drop every layer. Used when the active template is cleared.
    pub fn clear(&mut self) {
        self.layers.clear();
    }

    /// Append one layer with fixed defaults; returns the fresh unique id.
    pub fn add_layer(&mut self) -> String {
        let id = self.mint_id();
        self.layers
            .push(default_layer(id.clone(), "New Text".to_string(), 50.0, 50.0));
        debug!(layers = self.layers.len(), "added layer");
        id
    }

    /// Merge a partial update into the matching layer. Returns `false` when
    /// the id is unknown (no-op). Geometry is not re-validated here — the
    /// interactive path clamps before calling — but `stroke_width` can never
    /// go negative.
    pub fn update_layer(&mut self, id: &str, patch: LayerPatch) -> bool {
        let Some(layer) = self.layers.iter_mut().find(|l| l.id == id) else {
            return false;
        };
        if let Some(text) = patch.text {
            layer.text = text;
        }
        if let Some(x) = patch.x {
            layer.x = x;
        }
        if let Some(y) = patch.y {
            layer.y = y;
        }
        if let Some(size) = patch.font_size {
            layer.font_size = size;
        }
        if let Some(family) = patch.font_family {
            layer.font_family = family;
        }
        if let Some(fill) = patch.fill {
            layer.fill = fill;
        }
        if let Some(stroke) = patch.stroke {
            layer.stroke = stroke;
        }
        if let Some(w) = patch.stroke_width {
            layer.stroke_width = w.max(0.0);
        }
        if let Some(align) = patch.align {
            layer.align = align;
        }
        if let Some(upper) = patch.uppercase {
            layer.uppercase = upper;
        }
        true
    }

    /// Set a layer's position directly. The drag path lands here after
    /// [`crate::layout::screen_to_logical`] has already clamped.
    pub fn set_position(&mut self, id: &str, x: f64, y: f64) -> bool {
        let Some(layer) = self.layers.iter_mut().find(|l| l.id == id) else {
            return false;
        };
        layer.x = x;
        layer.y = y;
        true
    }

    /// Remove the matching layer. Returns `false` when the id is unknown.
    pub fn remove_layer(&mut self, id: &str) -> bool {
        let before = self.layers.len();
        self.layers.retain(|l| l.id != id);
        self.layers.len() != before
    }

    fn mint_id(&mut self) -> String {
        let id = format!("text-{}", self.next_id);
        self.next_id += 1;
        id
    }
}

fn default_layer(id: String, text: String, x: f64, y: f64) -> TextLayer {
    TextLayer {
        id,
        text,
        x,
        y,
        font_size: DEFAULT_FONT_SIZE,
        font_family: DEFAULT_FONT_FAMILY.to_string(),
        fill: Rgba8::WHITE,
        stroke: Rgba8::BLACK,
        stroke_width: DEFAULT_STROKE_WIDTH,
        align: HAlign::Center,
        uppercase: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_with_texts(texts: &[&str]) -> Template {
        Template {
            id: "t".to_string(),
            name: "t".to_string(),
            source: "t.png".to_string(),
            width: 640,
            height: 480,
            category: "test".to_string(),
            default_texts: texts.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn reset_seeds_one_layer_per_default_text() {
        let mut set = LayerSet::new();
        set.reset_for_template(&template_with_texts(&["TOP", "BOTTOM"]));

        let layers = set.layers();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].text, "TOP");
        assert_eq!(layers[1].text, "BOTTOM");
        assert_eq!(layers[0].y, 10.0);
        assert_eq!(layers[1].y, 40.0);
        for l in layers {
            assert_eq!(l.x, 50.0);
            assert_eq!(l.align, HAlign::Center);
            assert!(l.uppercase);
            assert_eq!(l.font_size, 32.0);
            assert_eq!(l.fill, Rgba8::WHITE);
            assert_eq!(l.stroke, Rgba8::BLACK);
            assert_eq!(l.stroke_width, 2.0);
        }
    }

    #[test]
    fn reset_replaces_previous_layers() {
        let mut set = LayerSet::new();
        set.reset_for_template(&template_with_texts(&["A", "B", "C"]));
        set.add_layer();
        set.reset_for_template(&template_with_texts(&["X"]));
        assert_eq!(set.len(), 1);
        assert_eq!(set.layers()[0].text, "X");
    }

    #[test]
    fn add_layer_appends_with_fixed_defaults() {
        let mut set = LayerSet::new();
        set.reset_for_template(&template_with_texts(&["TOP"]));
        let id = set.add_layer();

        let layer = set.get(&id).unwrap();
        assert_eq!(layer.text, "New Text");
        assert_eq!((layer.x, layer.y), (50.0, 50.0));
        assert_eq!(set.layers().last().unwrap().id, id);
    }

    #[test]
    fn ids_stay_unique_across_remove_add_cycles() {
        let mut set = LayerSet::new();
        set.reset_for_template(&template_with_texts(&["A", "B"]));
        let first = set.add_layer();
        assert!(set.remove_layer(&first));
        let second = set.add_layer();
        assert_ne!(first, second);

        let mut ids: Vec<_> = set.layers().iter().map(|l| l.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), set.len());
    }

    #[test]
    fn update_merges_without_reordering() {
        let mut set = LayerSet::new();
        set.reset_for_template(&template_with_texts(&["A", "B", "C"]));
        let ids: Vec<_> = set.layers().iter().map(|l| l.id.clone()).collect();

        let ok = set.update_layer(
            &ids[0],
            LayerPatch {
                text: Some("edited".to_string()),
                align: Some(HAlign::Right),
                ..LayerPatch::default()
            },
        );
        assert!(ok);

        let after: Vec<_> = set.layers().iter().map(|l| l.id.clone()).collect();
        assert_eq!(ids, after);
        assert_eq!(set.layers()[0].text, "edited");
        assert_eq!(set.layers()[0].align, HAlign::Right);
        assert_eq!(set.layers()[1].text, "B");
    }

    #[test]
    fn update_clamps_negative_stroke_width() {
        let mut set = LayerSet::new();
        set.reset_for_template(&template_with_texts(&["A"]));
        let id = set.layers()[0].id.clone();
        set.update_layer(
            &id,
            LayerPatch {
                stroke_width: Some(-3.0),
                ..LayerPatch::default()
            },
        );
        assert_eq!(set.layers()[0].stroke_width, 0.0);
    }

    #[test]
    fn unknown_id_is_a_noop() {
        let mut set = LayerSet::new();
        set.reset_for_template(&template_with_texts(&["A"]));
        assert!(!set.update_layer("nope", LayerPatch::default()));
        assert!(!set.remove_layer("nope"));
        assert!(!set.set_position("nope", 1.0, 1.0));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn clear_empties_the_set() {
        let mut set = LayerSet::new();
        set.reset_for_template(&template_with_texts(&["A", "B"]));
        set.clear();
        assert!(set.is_empty());
    }
}
