//! Keyboard translation from iced events to raw key presses

use std::collections::HashMap;

use iced::keyboard::key::Physical;
use modhost_core::input::{KeyStateQuery, RawKeyPress};
use modhost_core::KeyCode;

/// Raw codes live above the Unicode range so they never alias a character
const RAW_KEY_BASE: u32 = 0x0011_0000;

/// Raw codes handed out to physical keys, one per key for the process lifetime
///
/// Codes are assigned in order of first sight, so two distinct keys never
/// share a code.
#[derive(Debug, Default)]
pub struct KeyCodes {
    codes: HashMap<Physical, u32>,
}

impl KeyCodes {
    pub fn code_for(&mut self, physical: &Physical) -> u32 {
        if let Some(code) = self.codes.get(physical) {
            return *code;
        }
        let code = RAW_KEY_BASE + self.codes.len() as u32;
        self.codes.insert(physical.clone(), code);
        code
    }

    /// Build the raw press the normalizer expects from an iced key event
    pub fn raw_press(&mut self, physical: &Physical, text: Option<&str>) -> RawKeyPress {
        RawKeyPress {
            key_code: self.code_for(physical),
            text: text.and_then(|t| t.chars().next()),
        }
    }
}

/// Keys currently held down, keyed by physical key
///
/// A key pressed with shift and released without it still maps back to the
/// code it was pressed with.
#[derive(Debug, Default)]
pub struct HeldKeys {
    down: HashMap<Physical, KeyCode>,
}

impl HeldKeys {
    pub fn press(&mut self, physical: Physical, code: KeyCode) {
        self.down.entry(physical).or_insert(code);
    }

    pub fn release(&mut self, physical: &Physical) {
        self.down.remove(physical);
    }
}

impl KeyStateQuery for HeldKeys {
    fn is_key_down(&self, code: KeyCode) -> bool {
        self.down.values().any(|held| *held == code)
    }
}
