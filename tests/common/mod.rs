#![allow(dead_code)]

use std::io::Cursor;

use prompt_world::{Editor, EditorConfig, ImagePayload, MemorySceneStore, PlaneId};

/// Solid-colour PNG of the given size
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 120, 40, 255]));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .expect("encode png fixture");
    out
}

pub fn png_payload() -> ImagePayload {
    ImagePayload::new("image/png", png_bytes(200, 150))
}

/// Editor on a memory store holding one scene named "Demo"
pub fn demo_editor(config: EditorConfig) -> Editor<MemorySceneStore> {
    Editor::create("Demo", MemorySceneStore::new(), config)
}

/// Demo editor with one imported image
pub fn demo_with_plane(config: EditorConfig) -> (Editor<MemorySceneStore>, PlaneId) {
    let mut editor = demo_editor(config);
    let id = editor.import_image(png_payload());
    (editor, id)
}
