//! Textures generated at startup, so the demo ships no image files.

use kestrel_engine::backend::GraphicsDevice;
use kestrel_engine::coords::Rect;
use kestrel_engine::items::TextureRef;

/// Checkerboard of `cells`×`cells` squares, `cell` pixels each.
pub fn checkerboard(device: &dyn GraphicsDevice, cells: u32, cell: u32) -> TextureRef {
    let size = cells * cell;
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let light = ((x / cell) + (y / cell)) % 2 == 0;
            pixels.extend_from_slice(if light { &[236, 226, 198, 255] } else { &[52, 84, 122, 255] });
        }
    }
    device.create_texture_rgba8("studio checkerboard", size, size, &pixels)
}

const GLYPH_COLS: usize = 5;
const GLYPH_ROWS: usize = 7;
/// Atlas pixels per font pixel.
const SCALE: usize = 4;
/// Cell edge in the atlas, font pixels plus one pixel of padding per side.
const CELL: usize = (GLYPH_ROWS + 2) * SCALE;

const FONT: [(char, [&str; GLYPH_ROWS]); 6] = [
    ('K', ["#...#", "#..#.", "#.#..", "##...", "#.#..", "#..#.", "#...#"]),
    ('E', ["#####", "#....", "#....", "####.", "#....", "#....", "#####"]),
    ('S', [".####", "#....", "#....", ".###.", "....#", "....#", "####."]),
    ('T', ["#####", "..#..", "..#..", "..#..", "..#..", "..#..", "..#.."]),
    ('R', ["####.", "#...#", "#...#", "####.", "#.#..", "#..#.", "#...#"]),
    ('L', ["#....", "#....", "#....", "#....", "#....", "#....", "#####"]),
];

/// A tiny bitmap font baked into a one-row atlas.
pub struct GlyphAtlas {
    pub texture: TextureRef,
}

impl GlyphAtlas {
    pub fn generate(device: &dyn GraphicsDevice) -> Self {
        let width = CELL * FONT.len();
        let mut pixels = vec![0u8; width * CELL * 4];

        for (i, (_, rows)) in FONT.iter().enumerate() {
            for (gy, row) in rows.iter().enumerate() {
                for (gx, bit) in row.bytes().enumerate().take(GLYPH_COLS) {
                    if bit != b'#' {
                        continue;
                    }
                    let x0 = i * CELL + (gx + 1) * SCALE;
                    let y0 = (gy + 1) * SCALE;
                    for y in y0..y0 + SCALE {
                        for x in x0..x0 + SCALE {
                            let at = (y * width + x) * 4;
                            pixels[at..at + 4].copy_from_slice(&[255; 4]);
                        }
                    }
                }
            }
        }

        let texture = device.create_texture_rgba8("studio glyph atlas", width as u32, CELL as u32, &pixels);
        Self { texture }
    }

    /// Atlas cell of `glyph`, if the font has it.
    pub fn cell(&self, glyph: char) -> Option<Rect> {
        FONT.iter().position(|(c, _)| *c == glyph).map(|i| {
            Rect::new((i * CELL) as f32, 0.0, CELL as f32, CELL as f32)
        })
    }
}
