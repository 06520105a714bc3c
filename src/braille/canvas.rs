/// Braille Unicode canvas for terminal graphics.
/// Each character cell is a 2x4 dot grid, so the pixel resolution is
/// `width * 2` by `height * 4`. Glyphs live at U+2800..=U+28FF.
pub struct BrailleCanvas {
    width: usize,  // cells
    height: usize, // cells
    cells: Vec<u8>,
}

/// Dot bit for (x % 2, y % 4).
const DOT_BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

impl BrailleCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    /// Set the dot at pixel (x, y); out-of-range pixels are ignored.
    pub fn set(&mut self, x: i32, y: i32) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return;
        }
        self.cells[cy * self.width + cx] |= DOT_BITS[x % 2][y % 4];
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&b| b == 0)
    }

    /// Glyph at cell (col, row), `None` when no dot is set there.
    pub fn glyph(&self, col: usize, row: usize) -> Option<char> {
        if col >= self.width || row >= self.height {
            return None;
        }
        match self.cells[row * self.width + col] {
            0 => None,
            bits => char::from_u32(0x2800 + bits as u32),
        }
    }

    /// All rows as strings of Braille glyphs (blank cells are U+2800).
    #[cfg(test)]
    pub(crate) fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.cells.chunks(self.width.max(1)).take(self.height).map(|row| {
            row.iter()
                .map(|&b| char::from_u32(0x2800 + b as u32).unwrap_or(' '))
                .collect()
        })
    }
}
