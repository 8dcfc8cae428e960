use super::{Glyph, GlyphSource};

pub const CELL_W: usize = 5;
pub const CELL_H: usize = 7;
/// columns between two cells
const GAP: usize = 1;

/// The built-in 5×7 face. It covers digits, latin capitals and the punctuation that shows up in
/// counts and prices. Lowercase letters are drawn with the capital glyphs.
/// Each row is 5 bits, bit 4 is the left-most pixel. Row 6 sits on the baseline.
const GLYPHS: &[(char, [u8; CELL_H])] = &[
    ('0', [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
    ('1', [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('2', [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111]),
    ('3', [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110]),
    ('4', [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
    ('5', [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110]),
    ('6', [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
    ('7', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
    ('8', [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
    ('9', [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100]),
    ('A', [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    ('B', [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110]),
    ('C', [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
    ('D', [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100]),
    ('E', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111]),
    ('F', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('G', [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111]),
    ('H', [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    ('I', [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('J', [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100]),
    ('K', [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001]),
    ('L', [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
    ('M', [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001]),
    ('N', [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001]),
    ('O', [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('P', [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('Q', [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101]),
    ('R', [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001]),
    ('S', [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
    ('T', [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
    ('U', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('V', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100]),
    ('W', [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010]),
    ('X', [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001]),
    ('Y', [0b10001, 0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100]),
    ('Z', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111]),
    ('$', [0b00100, 0b01111, 0b10100, 0b01110, 0b00101, 0b11110, 0b00100]),
    ('.', [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100]),
    (',', [0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b00100, 0b01000]),
    ('+', [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000]),
    ('-', [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000]),
    ('%', [0b11000, 0b11001, 0b00010, 0b00100, 0b01000, 0b10011, 0b00011]),
    ('/', [0b00000, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b00000]),
    (':', [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000]),
    ('(', [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010]),
    (')', [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000]),
    ('#', [0b01010, 0b01010, 0b11111, 0b01010, 0b11111, 0b01010, 0b01010]),
    ('*', [0b00000, 0b00100, 0b10101, 0b01110, 0b10101, 0b00100, 0b00000]),
    (' ', [0; CELL_H]),
];

/// rows that these glyphs hang below the baseline
fn descent_rows(ch: char) -> usize {
    match ch {
        ',' => 2,
        _ => 0,
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BitmapFace;

impl BitmapFace {
    /// pixels per cell pixel at `px`. The cell plus its line gap is roughly 8 cell pixels tall.
    pub fn scale(px: f32) -> usize {
        ((px / 8.0).round() as usize).max(1)
    }

    fn rows(ch: char) -> Option<&'static [u8; CELL_H]> {
        let ch = ch.to_ascii_uppercase();
        GLYPHS.iter().find(|(c, _)| *c == ch).map(|(_, rows)| rows)
    }
}

impl GlyphSource for BitmapFace {
    fn rasterize(&self, ch: char, px: f32) -> Option<Glyph> {
        let rows = Self::rows(ch)?;
        let scale = Self::scale(px);
        let advance = ((CELL_W + GAP) * scale) as f32;
        let lit = |row: usize, col: usize| rows[row] & (1 << (CELL_W - 1 - col)) != 0;

        // tight ink box in cell coordinates
        let mut ink: Option<(usize, usize, usize, usize)> = None;
        for row in 0..CELL_H {
            for col in 0..CELL_W {
                if lit(row, col) {
                    let (c0, r0, c1, r1) = ink.unwrap_or((col, row, col, row));
                    ink = Some((c0.min(col), r0.min(row), c1.max(col), r1.max(row)));
                }
            }
        }
        let Some((c0, r0, c1, r1)) = ink else {
            return Some(Glyph {
                width: 0,
                height: 0,
                xmin: 0,
                ymin: 0,
                advance,
                coverage: vec![],
            });
        };

        let width = (c1 - c0 + 1) * scale;
        let height = (r1 - r0 + 1) * scale;
        let mut coverage = vec![0u8; width * height];
        for y in 0..height {
            for x in 0..width {
                if lit(r0 + y / scale, c0 + x / scale) {
                    coverage[y * width + x] = 255;
                }
            }
        }
        let above_baseline = CELL_H as i32 - 1 - r1 as i32 - descent_rows(ch) as i32;
        Some(Glyph {
            width,
            height,
            xmin: (c0 * scale) as i32,
            ymin: above_baseline * scale as i32,
            advance,
            coverage,
        })
    }
}
