//! Export boundary: turn the last completed frame into a portable PNG and
//! bundle the save-time snapshot handed to the persistence collaborator.

use anyhow::Context;

use crate::{
    compositor::FrameRgba,
    error::{ForgeError, ForgeResult},
    model::TextLayer,
};

/// Everything a gallery/persistence collaborator needs to store one saved
/// meme. The core never reads this back; ids and timestamps are the
/// collaborator's concern.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct MemeSnapshot {
    pub template_id: String,
    pub layers: Vec<TextLayer>,
    /// Encoded PNG of the most recent completed render pass.
    pub png: Vec<u8>,
}

/// Encode a rendered frame as PNG. Synchronous; reflects exactly the pixels
/// of the pass that produced `frame`.
pub fn encode_png(frame: &FrameRgba) -> ForgeResult<Vec<u8>> {
    let expected = (frame.width as usize)
        .checked_mul(frame.height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| ForgeError::encode("frame byte length overflow"))?;
    if frame.data.len() != expected {
        return Err(ForgeError::encode(
            "frame byte length does not match width*height*4",
        ));
    }

    let data = if frame.premultiplied {
        unpremultiply_rgba8(&frame.data)
    } else {
        frame.data.clone()
    };

    let mut out = Vec::new();
    image::write_buffer_with_format(
        &mut std::io::Cursor::new(&mut out),
        &data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .context("encode frame as png")?;
    Ok(out)
}

fn unpremultiply_rgba8(premul: &[u8]) -> Vec<u8> {
    let mut out = premul.to_vec();
    for px in out.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = (((px[0] as u16) * 255 + a / 2) / a).min(255) as u8;
        px[1] = (((px[1] as u16) * 255 + a / 2) / a).min(255) as u8;
        px[2] = (((px[2] as u16) * 255 + a / 2) / a).min(255) as u8;
    }
    out
}
