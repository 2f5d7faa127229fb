//! Glyph-level rendering tests. These need a real TTF; they probe a few
//! common system font locations and skip quietly when none is present.

use memeforge::{
    EditorSession, HAlign, LayerPatch, PreparedImage, Rgba8, RenderOutcome, Template,
};

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

fn system_font_bytes() -> Option<Vec<u8>> {
    FONT_CANDIDATES
        .iter()
        .find_map(|p| std::fs::read(p).ok())
}

fn template(width: u32, height: u32) -> Template {
    Template {
        id: "t".to_string(),
        name: "t".to_string(),
        source: "t.png".to_string(),
        width,
        height,
        category: "test".to_string(),
        default_texts: vec![],
    }
}

fn gray_image(w: u32, h: u32) -> PreparedImage {
    PreparedImage::from_rgba8_premul(w, h, [128, 128, 128, 255].repeat((w * h) as usize)).unwrap()
}

/// Session with a loaded mid-gray background and one font registered as
/// "Impact" (the layer default family).
fn ready_session(width: u32, height: u32, font: Vec<u8>) -> EditorSession {
    let mut session = EditorSession::new();
    session.register_font("Impact", font).unwrap();
    let request = session.activate_template(template(width, height)).unwrap();
    assert!(session.complete_image_load(request.generation, gray_image(4, 4)));
    session
}

fn patch(f: impl FnOnce(&mut LayerPatch)) -> LayerPatch {
    let mut p = LayerPatch::default();
    f(&mut p);
    p
}

#[test]
fn glyphs_change_pixels() {
    let Some(font) = system_font_bytes() else {
        eprintln!("no system font found; skipping");
        return;
    };

    let mut session = ready_session(200, 100, font);
    let background_only = session.frame().unwrap().clone();

    let id = session.add_layer();
    session.update_layer(
        &id,
        patch(|p| {
            p.text = Some("MEME".to_string());
            p.x = Some(50.0);
            p.y = Some(20.0);
        }),
    );
    assert_eq!(session.render_now().unwrap(), RenderOutcome::Rendered);
    assert_ne!(session.frame().unwrap().data, background_only.data);
}

#[test]
fn later_layers_occlude_earlier_ones() {
    let Some(font) = system_font_bytes() else {
        eprintln!("no system font found; skipping");
        return;
    };

    let style = |p: &mut LayerPatch, fill: Rgba8| {
        p.text = Some("X".to_string());
        p.x = Some(50.0);
        p.y = Some(20.0);
        p.font_size = Some(48.0);
        p.fill = Some(fill);
        p.stroke_width = Some(0.0);
    };

    // B alone, pure green fill.
    let mut b_only = ready_session(120, 120, font.clone());
    let b = b_only.add_layer();
    b_only.update_layer(&b, patch(|p| style(p, Rgba8::new(0, 255, 0, 255))));
    let b_frame = b_only.frame().unwrap().clone();

    // A (red) below B (green) at the same spot.
    let mut both = ready_session(120, 120, font);
    let a = both.add_layer();
    both.update_layer(&a, patch(|p| style(p, Rgba8::new(255, 0, 0, 255))));
    let b2 = both.add_layer();
    both.update_layer(&b2, patch(|p| style(p, Rgba8::new(0, 255, 0, 255))));
    let both_frame = both.frame().unwrap().clone();

    // Wherever B alone painted a fully covered green pixel, the stacked
    // render must show B, not A.
    let mut covered = 0usize;
    for (b_px, s_px) in b_frame.data.chunks_exact(4).zip(both_frame.data.chunks_exact(4)) {
        if b_px == [0, 255, 0, 255] {
            covered += 1;
            assert_eq!(s_px, [0, 255, 0, 255], "A bled through B");
        }
    }
    assert!(covered > 0, "expected at least one fully covered glyph pixel");
}

#[test]
fn uppercase_is_a_display_transform_only() {
    let Some(font) = system_font_bytes() else {
        eprintln!("no system font found; skipping");
        return;
    };

    let mut upper = ready_session(200, 80, font.clone());
    let id = upper.add_layer();
    upper.update_layer(
        &id,
        patch(|p| {
            p.text = Some("hello".to_string());
            p.uppercase = Some(true);
        }),
    );
    // Stored text keeps its case.
    assert_eq!(upper.layers()[0].text, "hello");

    let mut literal = ready_session(200, 80, font);
    let id2 = literal.add_layer();
    literal.update_layer(
        &id2,
        patch(|p| {
            p.text = Some("HELLO".to_string());
            p.uppercase = Some(false);
        }),
    );

    assert_eq!(
        upper.frame().unwrap().data,
        literal.frame().unwrap().data,
        "uppercase flag must render like literal uppercase text"
    );
}

#[test]
fn stroke_paints_beneath_fill() {
    let Some(font) = system_font_bytes() else {
        eprintln!("no system font found; skipping");
        return;
    };

    let base = |p: &mut LayerPatch| {
        p.text = Some("O".to_string());
        p.x = Some(50.0);
        p.y = Some(25.0);
        p.font_size = Some(40.0);
        p.fill = Some(Rgba8::WHITE);
        p.stroke = Some(Rgba8::BLACK);
    };

    let mut without = ready_session(120, 120, font.clone());
    let id = without.add_layer();
    without.update_layer(&id, patch(|p| { base(p); p.stroke_width = Some(0.0); }));
    let plain = without.frame().unwrap().clone();

    let mut with = ready_session(120, 120, font);
    let id2 = with.add_layer();
    with.update_layer(&id2, patch(|p| { base(p); p.stroke_width = Some(6.0); }));
    let stroked = with.frame().unwrap().clone();

    assert_ne!(plain.data, stroked.data, "stroke must add an outline");

    // Fill stays on top: every fully white pixel of the plain render is
    // still white once the stroke is added underneath.
    let mut white = 0usize;
    for (p_px, s_px) in plain.data.chunks_exact(4).zip(stroked.data.chunks_exact(4)) {
        if p_px == [255, 255, 255, 255] {
            white += 1;
            assert_eq!(s_px, [255, 255, 255, 255], "stroke painted over fill");
        }
    }
    assert!(white > 0, "expected at least one solid fill pixel");
}

#[test]
fn multiline_text_staggers_lines_downward() {
    let Some(font) = system_font_bytes() else {
        eprintln!("no system font found; skipping");
        return;
    };

    let mut one = ready_session(160, 200, font.clone());
    let id = one.add_layer();
    one.update_layer(
        &id,
        patch(|p| {
            p.text = Some("AA".to_string());
            p.y = Some(10.0);
        }),
    );
    let single = one.frame().unwrap().clone();

    let mut two = ready_session(160, 200, font);
    let id2 = two.add_layer();
    two.update_layer(
        &id2,
        patch(|p| {
            p.text = Some("AA\nAA".to_string());
            p.y = Some(10.0);
        }),
    );
    let double = two.frame().unwrap().clone();

    assert_ne!(single.data, double.data);

    // The top rows (above the second line's band) match: line 0 is drawn
    // identically, line 1 lands 1.2 * font_size lower.
    let row_bytes = 160 * 4;
    let top_band = &single.data[..row_bytes * 30];
    assert_eq!(top_band, &double.data[..row_bytes * 30]);
}
