//! Background image decoding and the two-state async image resource.
//!
//! Image fetch is fire-and-forget from the compositor's perspective: the
//! session hands out an [`ImageLoadRequest`] carrying a generation number,
//! and a completion arriving with a stale generation is ignored so an old
//! template's image can never overwrite a newer template's render.

use std::sync::Arc;

use anyhow::Context;

use crate::error::{ForgeError, ForgeResult};

/// Decoded background image: premultiplied RGBA8, row-major, tightly packed.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Wrap already-premultiplied RGBA8 pixels. Length must be
    /// `width * height * 4` and dimensions non-zero.
    pub fn from_rgba8_premul(width: u32, height: u32, data: Vec<u8>) -> ForgeResult<Self> {
        if width == 0 || height == 0 {
            return Err(ForgeError::validation("image dimensions must be > 0"));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| ForgeError::validation("image byte length overflow"))?;
        if data.len() != expected {
            return Err(ForgeError::validation(
                "image byte length does not match width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(data),
        })
    }
}

/// Decode an encoded image (PNG, JPEG, ...) into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> ForgeResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    PreparedImage::from_rgba8_premul(width, height, rgba8_premul)
}

/// Read and decode an image from disk. Blocking convenience for file-backed
/// template sources (CLI, tests).
pub fn load_image_from_path(path: &std::path::Path) -> ForgeResult<PreparedImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes)
}

/// Lifecycle of the active template's background image.
///
/// `Pending -> Ready` is the only transition; render readiness is a guard
/// condition, not an error. The generation number identifies which template
/// activation a completion belongs to.
#[derive(Clone, Debug, Default)]
pub enum BackgroundSlot {
    #[default]
    Empty,
    Pending {
        generation: u64,
    },
    Ready {
        generation: u64,
        image: PreparedImage,
    },
}

impl BackgroundSlot {
    pub fn generation(&self) -> Option<u64> {
        match self {
            BackgroundSlot::Empty => None,
            BackgroundSlot::Pending { generation } | BackgroundSlot::Ready { generation, .. } => {
                Some(*generation)
            }
        }
    }

    /// The decoded image plus its generation, when loading has completed.
    pub fn ready(&self) -> Option<(u64, &PreparedImage)> {
        match self {
            BackgroundSlot::Ready { generation, image } => Some((*generation, image)),
            _ => None,
        }
    }
}

/// Handle for an in-flight background load; the loader passes `generation`
/// back through [`crate::session::EditorSession::complete_image_load`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageLoadRequest {
    pub generation: u64,
    pub source: String,
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn decode_image_png_dimensions_and_premul() {
        let src_rgba = vec![100u8, 50u8, 200u8, 128u8];
        let img = image::RgbaImage::from_raw(1, 1, src_rgba).unwrap();

        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();

        let prepared = decode_image(&buf).unwrap();
        assert_eq!(prepared.width, 1);
        assert_eq!(prepared.height, 1);
        assert_eq!(
            prepared.rgba8_premul.as_slice(),
            &[
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128u8
            ]
        );
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_image(b"not an image").is_err());
    }

    #[test]
    fn from_rgba8_premul_checks_length() {
        assert!(PreparedImage::from_rgba8_premul(2, 2, vec![0u8; 16]).is_ok());
        assert!(PreparedImage::from_rgba8_premul(2, 2, vec![0u8; 15]).is_err());
        assert!(PreparedImage::from_rgba8_premul(0, 2, vec![]).is_err());
    }

    #[test]
    fn slot_ready_reports_generation() {
        let img = PreparedImage::from_rgba8_premul(1, 1, vec![0, 0, 0, 0]).unwrap();
        let slot = BackgroundSlot::Ready {
            generation: 7,
            image: img,
        };
        assert_eq!(slot.generation(), Some(7));
        assert_eq!(slot.ready().map(|(g, _)| g), Some(7));
        assert!(BackgroundSlot::Pending { generation: 3 }.ready().is_none());
        assert_eq!(BackgroundSlot::Empty.generation(), None);
    }
}
