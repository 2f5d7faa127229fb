//! The editing session: one explicit state object owning the active
//! template, its layer set, the background image slot, and the compositor.
//!
//! Single-threaded and event-driven. Every mutation happens on a discrete
//! user-input event and triggers a synchronous re-render before control
//! returns to the caller. The one asynchronous boundary is background image
//! loading, guarded by a generation counter so a stale completion can never
//! overwrite a newer template's render.

use tracing::{debug, warn};

use crate::{
    assets::{self, BackgroundSlot, ImageLoadRequest, PreparedImage},
    compositor::{Compositor, FrameRgba, RenderOutcome},
    error::{ForgeError, ForgeResult},
    export::{self, MemeSnapshot},
    layers::LayerSet,
    layout::{self, DisplayRect, DragAnchor, OverlayPlacement, ScreenPoint},
    model::{LayerPatch, Template, TextLayer},
};

/// Pointer-drag session: captured once at pointer-down, dropped on
/// pointer-up or pointer-leave. Only one layer drags at a time.
#[derive(Clone, Debug)]
struct DragState {
    layer_id: String,
    anchor: DragAnchor,
}

pub struct EditorSession {
    active: Option<Template>,
    background: BackgroundSlot,
    layers: LayerSet,
    compositor: Compositor,
    drag: Option<DragState>,
    generation: u64,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    pub fn new() -> Self {
        Self {
            active: None,
            background: BackgroundSlot::Empty,
            layers: LayerSet::new(),
            compositor: Compositor::new(),
            drag: None,
            generation: 0,
        }
    }

    /// Register font bytes for a layer font family.
    pub fn register_font(&mut self, alias: &str, bytes: Vec<u8>) -> ForgeResult<()> {
        self.compositor.register_font(alias, bytes)
    }

    pub fn active_template(&self) -> Option<&Template> {
        self.active.as_ref()
    }

    pub fn layers(&self) -> &[TextLayer] {
        self.layers.layers()
    }

    /// The most recent completed frame.
    pub fn frame(&self) -> Option<&FrameRgba> {
        self.compositor.frame()
    }

    /// Make `template` the active one: reseed layers, invalidate the old
    /// background, and hand back the load request for the new image. The
    /// caller resolves `source` to bytes and reports back through
    /// [`Self::complete_image_load`].
    pub fn activate_template(&mut self, template: Template) -> ForgeResult<ImageLoadRequest> {
        template.validate()?;
        self.generation += 1;
        self.drag = None;
        self.layers.reset_for_template(&template);
        self.background = BackgroundSlot::Pending {
            generation: self.generation,
        };
        let request = ImageLoadRequest {
            generation: self.generation,
            source: template.source.clone(),
        };
        debug!(template = %template.id, generation = self.generation, "template activated");
        self.active = Some(template);
        self.redraw();
        Ok(request)
    }

    /// Drop the active template and all layer state. The last completed
    /// frame remains available for export until the next activation renders.
    pub fn clear_template(&mut self) {
        self.active = None;
        self.background = BackgroundSlot::Empty;
        self.layers.clear();
        self.drag = None;
    }

    /// Install a finished background load. Returns `false` and ignores the
    /// image when `generation` no longer matches the current activation —
    /// the template changed while the load was in flight.
    pub fn complete_image_load(&mut self, generation: u64, image: PreparedImage) -> bool {
        if generation != self.generation {
            warn!(
                stale = generation,
                current = self.generation,
                "ignoring stale background image completion"
            );
            return false;
        }
        self.background = BackgroundSlot::Ready { generation, image };
        self.redraw();
        true
    }

    /// Record a failed background load. The slot stays pending; the user can
    /// retry by re-activating the template.
    pub fn fail_image_load(&mut self, generation: u64, error: &ForgeError) {
        let stale = generation != self.generation;
        warn!(generation, stale, %error, "background image load failed");
    }

    /// Blocking load for file-backed template sources (CLI, tests).
    pub fn load_background_from_path(&mut self, request: &ImageLoadRequest) -> ForgeResult<bool> {
        let image = assets::load_image_from_path(std::path::Path::new(&request.source))?;
        Ok(self.complete_image_load(request.generation, image))
    }

    pub fn add_layer(&mut self) -> String {
        let id = self.layers.add_layer();
        self.redraw();
        id
    }

    pub fn update_layer(&mut self, id: &str, patch: LayerPatch) -> bool {
        let changed = self.layers.update_layer(id, patch);
        if changed {
            self.redraw();
        }
        changed
    }

    pub fn remove_layer(&mut self, id: &str) -> bool {
        let removed = self.layers.remove_layer(id);
        if removed {
            if self.drag.as_ref().is_some_and(|d| d.layer_id == id) {
                self.drag = None;
            }
            self.redraw();
        }
        removed
    }

    /// Begin dragging `layer_id`. `pointer` and `element_origin` are in
    /// screen coordinates; their difference becomes the drag anchor held for
    /// the whole gesture. Refused while another drag is live or when the id
    /// is unknown.
    pub fn pointer_down(
        &mut self,
        layer_id: &str,
        pointer: ScreenPoint,
        element_origin: ScreenPoint,
    ) -> bool {
        if self.drag.is_some() || self.layers.get(layer_id).is_none() {
            return false;
        }
        self.drag = Some(DragState {
            layer_id: layer_id.to_string(),
            anchor: DragAnchor::capture(pointer, element_origin),
        });
        true
    }

    /// Move the dragged layer. `canvas_rect` is the canvas's on-screen box
    /// captured for *this* event, so mid-drag resizes stay correct. No-op
    /// when no drag is active.
    pub fn pointer_move(&mut self, pointer: ScreenPoint, canvas_rect: DisplayRect) -> bool {
        let Some(drag) = self.drag.clone() else {
            return false;
        };
        let (x, y) = layout::screen_to_logical(pointer, canvas_rect, drag.anchor);
        if self.layers.set_position(&drag.layer_id, x, y) {
            self.redraw();
            true
        } else {
            false
        }
    }

    /// End the drag session.
    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    /// Leaving the drawing surface while pressed ends the drag exactly like
    /// pointer-up; the layer must not stay stuck to a phantom gesture.
    pub fn pointer_leave(&mut self) {
        self.drag = None;
    }

    pub fn dragging_layer(&self) -> Option<&str> {
        self.drag.as_ref().map(|d| d.layer_id.as_str())
    }

    /// Overlay scale for the current template (see
    /// [`layout::display_scale`]).
    pub fn display_scale(&self, container_width: f64) -> f64 {
        match &self.active {
            Some(template) => layout::display_scale(container_width, template),
            None => 1.0,
        }
    }

    /// Overlay placement for one layer, through the shared anchor math.
    pub fn overlay_placement(&self, layer_id: &str) -> Option<OverlayPlacement> {
        self.layers.get(layer_id).map(layout::overlay_placement)
    }

    /// Re-render with the current state. `NotReady` when the background has
    /// not loaded; errors leave the previous frame intact.
    pub fn render_now(&mut self) -> ForgeResult<RenderOutcome> {
        let Some(template) = &self.active else {
            return Ok(RenderOutcome::NotReady);
        };
        self.compositor
            .render(template, &self.background, self.layers.layers())
    }

    /// Encode the most recent completed frame as PNG.
    pub fn export_png(&self) -> ForgeResult<Vec<u8>> {
        let frame = self
            .compositor
            .frame()
            .ok_or_else(|| ForgeError::render("no completed render to export"))?;
        export::encode_png(frame)
    }

    /// Bundle the data a persistence collaborator needs to save this meme.
    pub fn snapshot(&self) -> ForgeResult<MemeSnapshot> {
        let template = self
            .active
            .as_ref()
            .ok_or_else(|| ForgeError::validation("no active template to snapshot"))?;
        Ok(MemeSnapshot {
            template_id: template.id.clone(),
            layers: self.layers.layers().to_vec(),
            png: self.export_png()?,
        })
    }

    fn redraw(&mut self) {
        match self.render_now() {
            Ok(_) => {}
            Err(error) => warn!(%error, "render pass failed; keeping previous frame"),
        }
    }
}
