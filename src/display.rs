use log::trace;

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

/// 64x32 one-bit display. Only `draw_sprite` and `clear` change it.
#[derive(Clone)]
pub struct FrameBuffer {
    bit_buffer: [[bool; WIDTH]; HEIGHT],
    dirty: bool,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            bit_buffer: [[false; WIDTH]; HEIGHT],
            dirty: false,
        }
    }

    pub fn clear_buffer(&mut self) {
        self.bit_buffer = [[false; WIDTH]; HEIGHT];
        // always present after a clear, even an already blank screen
        self.dirty = true;
    }

    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.bit_buffer[y % HEIGHT][x % WIDTH]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool; WIDTH]> {
        self.bit_buffer.iter()
    }

    /// Checks and clears the changed-since-last-read flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// XOR `sprite` rows onto the screen with its top left corner at (x, y),
    /// wrapping on both axes. Returns true when any set sprite bit landed on
    /// a pixel that was already on.
    pub fn paint(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        trace!("painting sprite at ({x}, {y}): {sprite:02x?}");
        let mut collision = false;
        for (i, row) in sprite.iter().enumerate() {
            let ny = (y as usize + i) % HEIGHT;
            for j in 0..8 {
                if (row >> (7 - j)) & 1 == 0 {
                    continue;
                }
                let nx = (x as usize + j) % WIDTH;
                let cell = &mut self.bit_buffer[ny][nx];
                collision |= *cell;
                *cell = !*cell;
                self.dirty = true;
            }
        }
        collision
    }
}
