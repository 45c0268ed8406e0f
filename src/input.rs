use crossterm::event::{poll, read, Event, KeyCode};
use crossterm::terminal;
use log::warn;
use std::collections::HashMap;
use std::io;
use std::time::Duration;

use crate::machine::{Machine, NUM_KEYS};

/// keypad mapping onto the left-hand side of a qwerty keyboard, where the
/// physical 4x4 block 1234/qwer/asdf/zxcv mirrors the hex keypad layout
const CONVENTIONAL_KEYMAP: [(char, u8); NUM_KEYS] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// terminals report key-downs but never key-ups, so a pressed key is held
/// down for this many polls and then released
const KEY_HOLD_POLLS: u8 = 6;

/// Feeds key events into the machine. The machine never reads a device;
/// its sixteen key slots are written from outside, once per loop pass.
pub trait Input {
    /// pump pending events into the machine's key slots; true means the
    /// user asked to quit
    fn poll(&mut self, machine: &mut Machine) -> Result<bool, io::Error>;
}

/// reads the real keyboard through crossterm, in raw mode
pub struct TermInput {
    keymap: HashMap<char, u8>,
    held: [u8; NUM_KEYS],
}

impl TermInput {
    pub fn new() -> Self {
        terminal::enable_raw_mode().unwrap();
        TermInput {
            keymap: HashMap::from(CONVENTIONAL_KEYMAP),
            held: [0; NUM_KEYS],
        }
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        terminal::disable_raw_mode().unwrap();
    }
}

impl Input for TermInput {
    fn poll(&mut self, machine: &mut Machine) -> Result<bool, io::Error> {
        // walk previously pressed keys toward release
        for (key, hold) in self.held.iter_mut().enumerate() {
            if *hold > 0 {
                *hold -= 1;
                if *hold == 0 {
                    machine.key_up(key as u8);
                }
            }
        }

        while poll(Duration::from_millis(0))? {
            match read()? {
                Event::Key(evt) => match evt.code {
                    KeyCode::Esc => return Ok(true),
                    KeyCode::Char(key) => match self.keymap.get(&key) {
                        Some(mapped) => {
                            machine.key_down(*mapped);
                            self.held[*mapped as usize] = KEY_HOLD_POLLS;
                        }
                        None => {
                            warn!("can't map {:?} to a keypad key", key);
                        }
                    },
                    _ => {
                        warn!("unhandled key event");
                    }
                },
                _ => {}
            }
        }
        Ok(false)
    }
}

/// dummy Input for testing: presses one scripted key per poll, releasing
/// the previous one, and asks to quit when the script runs out
pub struct DummyInput {
    keys: Vec<u8>,
    last: Option<u8>,
}

impl DummyInput {
    pub fn new(keys: &[u8]) -> Self {
        DummyInput {
            keys: Vec::from(keys),
            last: None,
        }
    }
}

impl Input for DummyInput {
    fn poll(&mut self, machine: &mut Machine) -> Result<bool, io::Error> {
        if let Some(last) = self.last.take() {
            machine.key_up(last);
        }
        if self.keys.is_empty() {
            return Ok(true);
        }
        let key = self.keys.remove(0);
        machine.key_down(key);
        self.last = Some(key);
        Ok(false)
    }
}
