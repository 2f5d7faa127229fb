#![forbid(unsafe_code)]

//! Deterministic meme compositing: pick an image template, overlay styled
//! draggable text layers, and rasterize the composite to pixels.
//!
//! The crate is built around three pieces: a scale-independent layout model
//! ([`layout`]), a CPU compositor that renders the template image plus text
//! layers at native resolution ([`compositor`]), and an [`session::EditorSession`]
//! that wires layer CRUD, pointer drags, and background image loading into a
//! single-threaded event-driven surface.

pub mod assets;
pub mod catalog;
pub mod compositor;
pub mod error;
pub mod export;
pub mod layers;
pub mod layout;
pub mod model;
pub mod session;
pub mod text;

pub use assets::{BackgroundSlot, ImageLoadRequest, PreparedImage, decode_image};
pub use catalog::Catalog;
pub use compositor::{Compositor, FrameRgba, RenderOutcome};
pub use error::{ForgeError, ForgeResult};
pub use export::{MemeSnapshot, encode_png};
pub use layers::LayerSet;
pub use layout::{
    DisplayRect, DragAnchor, LINE_HEIGHT_FACTOR, OverlayPlacement, ScreenPoint, display_scale,
    overlay_placement, resolved_anchor_pct, screen_to_logical, to_logical, to_native,
};
pub use model::{HAlign, LayerPatch, Rgba8, Template, TextLayer};
pub use session::EditorSession;
