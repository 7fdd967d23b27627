//! Built-in 5x7 bitmap font, the last resort when no font file loads.

use shortsmith_processing_core::GlyphMetrics;

const GLYPH_COLS: u32 = 5;
const GLYPH_ROWS: u32 = 7;
/// Cell size in font units, including one unit of spacing.
const CELL_WIDTH: u32 = GLYPH_COLS + 1;
const CELL_HEIGHT: u32 = GLYPH_ROWS + 1;

/// Rows for `' '..='Z'`; bit 4 is the leftmost column.
#[rustfmt::skip]
const GLYPHS: [[u8; 7]; 59] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04], // !
    [0x0A, 0x0A, 0x0A, 0x00, 0x00, 0x00, 0x00], // "
    [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A], // #
    [0x04, 0x0F, 0x14, 0x0E, 0x05, 0x1E, 0x04], // $
    [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03], // %
    [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D], // &
    [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00], // '
    [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02], // (
    [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08], // )
    [0x00, 0x04, 0x15, 0x0E, 0x15, 0x04, 0x00], // *
    [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00], // +
    [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08], // ,
    [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00], // -
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C], // .
    [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00], // /
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E], // 0
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E], // 1
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F], // 2
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E], // 3
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02], // 4
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E], // 5
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E], // 6
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08], // 7
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E], // 8
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C], // 9
    [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00], // :
    [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x04, 0x08], // ;
    [0x02, 0x04, 0x08, 0x10, 0x08, 0x04, 0x02], // <
    [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00], // =
    [0x08, 0x04, 0x02, 0x01, 0x02, 0x04, 0x08], // >
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04], // ?
    [0x0E, 0x11, 0x01, 0x0D, 0x15, 0x15, 0x0E], // @
    [0x0E, 0x11, 0x11, 0x11, 0x1F, 0x11, 0x11], // A
    [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E], // B
    [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E], // C
    [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C], // D
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F], // E
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10], // F
    [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F], // G
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // H
    [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // I
    [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C], // J
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11], // K
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F], // L
    [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11], // M
    [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11], // N
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // O
    [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10], // P
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D], // Q
    [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11], // R
    [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E], // S
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // T
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // U
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04], // V
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A], // W
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11], // X
    [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04], // Y
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F], // Z
];

/// Drawn for characters outside the table.
const UNKNOWN: [u8; 7] = [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F];

/// The bitmap font at an integer pixel scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapFont {
    /// Screen pixels per font unit.
    pub scale: u32,
}

impl BitmapFont {
    /// Pick the scale whose cell height best matches `font_size`.
    pub fn for_size(font_size: f64) -> Self {
        let scale = (font_size / CELL_HEIGHT as f64).round().max(1.0) as u32;
        Self { scale }
    }

    /// Glyph rows for `ch`; lowercase letters use their uppercase form.
    pub fn rows(ch: char) -> &'static [u8; 7] {
        let upper = ch.to_ascii_uppercase();
        match upper {
            ' '..='Z' => &GLYPHS[upper as usize - ' ' as usize],
            _ => &UNKNOWN,
        }
    }

    /// Call `plot(x, y)` for every lit pixel of `ch` drawn with its cell's
    /// top-left at `(x0, y0)`.
    pub fn draw_glyph(&self, ch: char, x0: i64, y0: i64, mut plot: impl FnMut(i64, i64)) {
        let rows = Self::rows(ch);
        let s = self.scale as i64;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_COLS {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                let px = x0 + col as i64 * s;
                let py = y0 + row as i64 * s;
                for dy in 0..s {
                    for dx in 0..s {
                        plot(px + dx, py + dy);
                    }
                }
            }
        }
    }
}

impl GlyphMetrics for BitmapFont {
    fn advance(&self, _ch: char) -> f32 {
        (CELL_WIDTH * self.scale) as f32
    }

    fn line_height(&self) -> f32 {
        (CELL_HEIGHT * self.scale) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_tracks_font_size() {
        assert_eq!(BitmapFont::for_size(60.0).scale, 8);
        assert_eq!(BitmapFont::for_size(2.0).scale, 1);
        assert_eq!(BitmapFont::for_size(60.0).line_height(), 64.0);
        assert_eq!(BitmapFont::for_size(60.0).advance('W'), 48.0);
    }

    #[test]
    fn test_lowercase_maps_to_uppercase() {
        assert_eq!(BitmapFont::rows('a'), BitmapFont::rows('A'));
        assert_eq!(BitmapFont::rows('z'), BitmapFont::rows('Z'));
        assert_eq!(BitmapFont::rows('~'), &UNKNOWN);
        assert_eq!(BitmapFont::rows('é'), &UNKNOWN);
    }

    #[test]
    fn test_draw_glyph_plots_scaled_pixels() {
        let font = BitmapFont { scale: 2 };
        let mut lit = Vec::new();
        font.draw_glyph('I', 0, 0, |x, y| lit.push((x, y)));
        // 'I' has 3 + 5 + 3 = 11 lit units, 4 pixels each.
        assert_eq!(lit.len(), 44);
        assert!(lit.iter().all(|&(x, y)| (0..10).contains(&x) && (0..14).contains(&y)));

        lit.clear();
        font.draw_glyph(' ', 0, 0, |x, y| lit.push((x, y)));
        assert!(lit.is_empty());
    }
}
