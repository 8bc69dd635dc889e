use log::debug;
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::{
    display::{FrameBuffer, HEIGHT, WIDTH},
    driver::Host,
    errors::{EmuError, Result},
    keyboard::{keymap, KeyUpdate},
};

pub const DEFAULT_SCALE: u32 = 10;
const TITLE: &str = "chipvm - ESC to exit";

/// minifb window showing each cell as a `scale` x `scale` block.
pub struct Screen {
    window: Window,
    pixel_buffer: Vec<u32>,
    scale: usize,
    pending_frame: bool,
}

impl Screen {
    pub fn new(scale: usize) -> Result<Self> {
        let mut window = Window::new(
            TITLE,
            WIDTH * scale,
            HEIGHT * scale,
            WindowOptions::default(),
        )
        .map_err(|err| EmuError::Window(err.to_string()))?;
        window.set_position(500, 300);
        Ok(Self {
            window,
            pixel_buffer: vec![OFF; WIDTH * HEIGHT * scale * scale],
            scale,
            pending_frame: true,
        })
    }

    fn paint_cells(&mut self, frame: &FrameBuffer) {
        let line = WIDTH * self.scale;
        for (y, row) in frame.rows().enumerate() {
            for (x, set) in row.iter().enumerate() {
                let colour = if *set { ON } else { OFF };
                for dy in 0..self.scale {
                    let start = (y * self.scale + dy) * line + x * self.scale;
                    self.pixel_buffer[start..start + self.scale].fill(colour);
                }
            }
        }
    }
}

const fn from_u16_rgb(r: u16, g: u16, b: u16) -> u32 {
    let (r, g, b) = (r as u32, g as u32, b as u32);
    (r << 16) | (g << 8) | b
}

const ON: u32 = from_u16_rgb(0, 127, 255);
const OFF: u32 = from_u16_rgb(0, 0, 0);

impl Host for Screen {
    fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    // Pumping window events also pushes out the last presented frame, so the
    // window is only updated here, once per cycle.
    fn poll_input(&mut self) -> Vec<KeyUpdate> {
        let updated = if self.pending_frame {
            self.pending_frame = false;
            self.window
                .update_with_buffer(&self.pixel_buffer, WIDTH * self.scale, HEIGHT * self.scale)
                .map_err(|err| debug!("dropped frame: {err}"))
                .is_ok()
        } else {
            self.window.update();
            true
        };
        if !updated {
            return vec![];
        }

        let pressed = self
            .window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .filter_map(keymap)
            .map(KeyUpdate::Pressed);
        let released = self
            .window
            .get_keys_released()
            .into_iter()
            .filter_map(keymap)
            .map(KeyUpdate::Released);
        pressed.chain(released).collect()
    }

    fn present(&mut self, frame: &FrameBuffer) -> Result<()> {
        self.paint_cells(frame);
        self.pending_frame = true;
        Ok(())
    }

    fn signal_sound(&mut self, active: bool) {
        if active {
            self.window.set_title(&format!("{TITLE} [beep]"));
        } else {
            self.window.set_title(TITLE);
        }
    }
}
