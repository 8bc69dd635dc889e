use minifb::Key;

pub const KEY_COUNT: usize = 16;

/// A change in one logical key, as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyUpdate {
    Pressed(u8),
    Released(u8),
}

#[derive(Debug, Default, Clone)]
pub struct Keypad {
    keys: [bool; KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indices past 0xF are never pressed.
    pub fn is_pressed(&self, index: u8) -> bool {
        self.keys.get(index as usize).copied().unwrap_or(false)
    }

    /// Returns true when this is a key-down transition.
    pub fn set_pressed(&mut self, index: u8, pressed: bool) -> bool {
        match self.keys.get_mut(index as usize) {
            Some(key) => {
                let was_pressed = std::mem::replace(key, pressed);
                pressed && !was_pressed
            }
            None => false,
        }
    }

    /// Applies `update`, returning the key index if it just went down.
    pub fn apply(&mut self, update: KeyUpdate) -> Option<u8> {
        match update {
            KeyUpdate::Pressed(index) => self.set_pressed(index, true).then_some(index),
            KeyUpdate::Released(index) => {
                self.set_pressed(index, false);
                None
            }
        }
    }
}

/// Hex keypad mapped onto the left block of a QWERTY keyboard.
/// ```text
/// |1|2|3|C|      |1|2|3|4|
/// |4|5|6|D|  ->  |Q|W|E|R|
/// |7|8|9|E|  ->  |A|S|D|F|
/// |A|0|B|F|      |Z|X|C|V|
/// ```
pub fn keymap(key: Key) -> Option<u8> {
    match key {
        Key::Key1 => Some(0x1),
        Key::Key2 => Some(0x2),
        Key::Key3 => Some(0x3),
        Key::Key4 => Some(0xC),
        Key::Q => Some(0x4),
        Key::W => Some(0x5),
        Key::E => Some(0x6),
        Key::R => Some(0xD),
        Key::A => Some(0x7),
        Key::S => Some(0x8),
        Key::D => Some(0x9),
        Key::F => Some(0xE),
        Key::Z => Some(0xA),
        Key::X => Some(0x0),
        Key::C => Some(0xB),
        Key::V => Some(0xF),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_transitions() {
        let mut keypad = Keypad::new();
        assert_eq!(keypad.apply(KeyUpdate::Pressed(0xA)), Some(0xA));
        assert!(keypad.is_pressed(0xA));
        // held, not a new press
        assert_eq!(keypad.apply(KeyUpdate::Pressed(0xA)), None);
        assert_eq!(keypad.apply(KeyUpdate::Released(0xA)), None);
        assert!(!keypad.is_pressed(0xA));
        assert_eq!(keypad.apply(KeyUpdate::Pressed(0xA)), Some(0xA));
    }

    #[test]
    fn out_of_range_keys_are_ignored() {
        let mut keypad = Keypad::new();
        assert_eq!(keypad.apply(KeyUpdate::Pressed(0x10)), None);
        assert!(!keypad.is_pressed(0x10));
        assert!(!keypad.is_pressed(0xFF));
    }

    #[test]
    fn layout_covers_every_key_once() {
        #[rustfmt::skip]
        let hosts = [
            Key::Key1, Key::Key2, Key::Key3, Key::Key4,
            Key::Q, Key::W, Key::E, Key::R,
            Key::A, Key::S, Key::D, Key::F,
            Key::Z, Key::X, Key::C, Key::V,
        ];
        let mut seen = [false; KEY_COUNT];
        for key in hosts {
            let index = keymap(key).unwrap() as usize;
            assert!(!seen[index]);
            seen[index] = true;
        }
        assert!(seen.iter().all(|s| *s));
        assert_eq!(keymap(Key::Escape), None);
        assert_eq!(keymap(Key::Key4), Some(0xC));
        assert_eq!(keymap(Key::X), Some(0x0));
    }
}
