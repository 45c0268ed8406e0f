use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::memory::{Memory, PROGRAM_ADDR};
use crate::Chip8Error;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;
const NUM_PIXELS: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT;

/// nesting depth of the call stack
pub const STACK_DEPTH: usize = 16;

pub const NUM_REGISTERS: usize = 16;
pub const NUM_KEYS: usize = 16;

/// VF doubles as the carry/borrow/collision flag
pub(crate) const FLAG_REGISTER: usize = 0xF;

/// The 64x32 one-bit display surface, row-major. Only the clear-screen and
/// draw-sprite instructions touch it; renderers read it.
#[derive(Clone)]
pub struct FrameBuffer {
    pixels: [bool; NUM_PIXELS],
}

impl FrameBuffer {
    pub fn is_lit(&self, x: usize, y: usize) -> bool {
        self.pixels[y * DISPLAY_WIDTH + x]
    }

    pub(crate) fn clear(&mut self) {
        self.pixels = [false; NUM_PIXELS];
    }

    /// XOR one pixel; true means a lit pixel just went dark (a collision)
    pub(crate) fn flip(&mut self, x: usize, y: usize) -> bool {
        let px = &mut self.pixels[y * DISPLAY_WIDTH + x];
        *px = !*px;
        !*px
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|p| **p).count()
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        FrameBuffer {
            pixels: [false; NUM_PIXELS],
        }
    }
}

/// Whether the machine is executing instructions or parked on FX0A waiting
/// for a key. Waiting is a state, not a blocked thread: `step()` is a no-op
/// until `key_down` delivers a key, which lands in register `dest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Running,
    AwaitingKey { dest: u8 },
}

/// What a call to `step()` did, so the embedder's loop can tell an executed
/// instruction from a machine that is waiting on the keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Executed,
    AwaitingKey,
}

/// The whole machine: RAM, registers, call stack, timers, keypad, display
/// surface and the two notification flags. One aggregate, one owner.
pub struct Machine {
    pub(crate) memory: Memory,
    pub(crate) v: [u8; NUM_REGISTERS],
    pub(crate) i: u16,
    pub(crate) pc: u16,
    pub(crate) stack: [u16; STACK_DEPTH],
    pub(crate) sp: u8,
    pub(crate) delay_timer: u8,
    pub(crate) sound_timer: u8,
    pub(crate) keys: [bool; NUM_KEYS],
    pub(crate) frame: FrameBuffer,
    pub(crate) mode: Mode,
    pub(crate) draw_flag: bool,
    pub(crate) sound_flag: bool,
    pub(crate) rng: StdRng,
}

impl Machine {
    /// a reset machine with a per-process random seed
    pub fn new() -> Self {
        Machine::with_rng(StdRng::from_entropy())
    }

    /// a reset machine with a fixed seed, so CXNN is deterministic in tests
    pub fn with_seed(seed: u64) -> Self {
        Machine::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut m = Machine {
            memory: Memory::new(),
            v: [0; NUM_REGISTERS],
            i: 0,
            pc: 0,
            stack: [0; STACK_DEPTH],
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            keys: [false; NUM_KEYS],
            frame: FrameBuffer::default(),
            mode: Mode::Running,
            draw_flag: false,
            sound_flag: false,
            rng,
        };
        m.reset();
        m
    }

    /// back to the canonical power-on state: everything zeroed, glyph table
    /// reloaded, program counter at the program base
    pub fn reset(&mut self) {
        self.memory.reset();
        self.v = [0; NUM_REGISTERS];
        self.i = 0;
        self.pc = PROGRAM_ADDR;
        self.stack = [0; STACK_DEPTH];
        self.sp = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.keys = [false; NUM_KEYS];
        self.frame.clear();
        self.mode = Mode::Running;
        self.draw_flag = false;
        self.sound_flag = false;
    }

    /// place a program image at 0x200; the rest of the machine is untouched
    pub fn load_program(&mut self, image: &[u8]) -> Result<(), Chip8Error> {
        self.memory.load_program(image)
    }

    /// 60Hz heartbeat: count both timers down and raise the sound
    /// notification on the sound timer's 1 -> 0 edge
    pub fn tick(&mut self) {
        if self.delay_timer > 0 {
            self.delay_timer -= 1;
        }
        if self.sound_timer > 0 {
            self.sound_timer -= 1;
            if self.sound_timer == 0 {
                self.sound_flag = true;
            }
        }
    }

    /// a key went down. Completes a pending FX0A wait, if any.
    pub fn key_down(&mut self, key: u8) {
        self.keys[(key & 0x0F) as usize] = true;
        if let Mode::AwaitingKey { dest } = self.mode {
            self.set_v(dest, key & 0x0F);
            self.mode = Mode::Running;
        }
    }

    pub fn key_up(&mut self, key: u8) {
        self.keys[(key & 0x0F) as usize] = false;
    }

    pub(crate) fn is_key_down(&self, key: u8) -> bool {
        self.keys[(key & 0x0F) as usize]
    }

    /// the display surface, for renderers
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// drain the "display changed" mailbox. Several changes between drains
    /// coalesce into one; redrawing is idempotent so that is fine.
    pub fn take_draw_flag(&mut self) -> bool {
        std::mem::take(&mut self.draw_flag)
    }

    /// drain the "sound timer ran out" mailbox
    pub fn take_sound_flag(&mut self) -> bool {
        std::mem::take(&mut self.sound_flag)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub(crate) fn v(&self, r: u8) -> u8 {
        self.v[r as usize]
    }

    pub(crate) fn set_v(&mut self, r: u8, value: u8) {
        self.v[r as usize] = value;
    }

    pub(crate) fn set_flag(&mut self, flag: bool) {
        self.v[FLAG_REGISTER] = flag as u8;
    }
}

impl Default for Machine {
    fn default() -> Self {
        Machine::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_state() {
        let m = Machine::with_seed(0);
        assert_eq!(m.pc, 0x200);
        assert_eq!(m.sp, 0);
        assert_eq!(m.v, [0; NUM_REGISTERS]);
        assert_eq!(m.frame.lit_count(), 0);
        assert_eq!(m.mode, Mode::Running);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut m = Machine::with_seed(0);
        m.set_v(3, 0x42);
        m.i = 0x123;
        m.delay_timer = 7;
        m.key_down(0xa);
        m.reset();
        let once: Vec<u8> = (0..4096).map(|a| m.memory.read(a)).collect();
        m.reset();
        let twice: Vec<u8> = (0..4096).map(|a| m.memory.read(a)).collect();
        assert_eq!(once, twice);
        assert_eq!(m.v, [0; NUM_REGISTERS]);
        assert_eq!(m.delay_timer, 0);
        assert_eq!(m.keys, [false; NUM_KEYS]);
        // glyph table occupies exactly 0..=79
        assert_ne!(m.memory.read(0), 0);
        assert_ne!(m.memory.read(79), 0);
        assert_eq!(m.memory.read(80), 0);
    }

    #[test]
    fn test_tick_counts_down_and_stops_at_zero() {
        let mut m = Machine::with_seed(0);
        m.delay_timer = 2;
        m.tick();
        m.tick();
        m.tick();
        assert_eq!(m.delay_timer, 0);
    }

    #[test]
    fn test_sound_edge_fires_exactly_once() {
        let mut m = Machine::with_seed(0);
        m.sound_timer = 1;
        m.tick();
        assert_eq!(m.sound_timer, 0);
        assert!(m.take_sound_flag());
        m.tick();
        assert!(!m.take_sound_flag());
    }

    #[test]
    fn test_sound_edge_only_on_transition() {
        let mut m = Machine::with_seed(0);
        m.sound_timer = 3;
        m.tick();
        m.tick();
        assert!(!m.take_sound_flag());
        m.tick();
        assert!(m.take_sound_flag());
    }

    #[test]
    fn test_draw_flag_drains() {
        let mut m = Machine::with_seed(0);
        m.draw_flag = true;
        assert!(m.take_draw_flag());
        assert!(!m.take_draw_flag());
    }

    #[test]
    fn test_key_down_completes_pending_wait() {
        let mut m = Machine::with_seed(0);
        m.mode = Mode::AwaitingKey { dest: 6 };
        m.key_down(0xb);
        assert_eq!(m.mode, Mode::Running);
        assert_eq!(m.v(6), 0xb);
        assert!(m.is_key_down(0xb));
    }

    #[test]
    fn test_key_indexes_mask_to_keypad_range() {
        let mut m = Machine::with_seed(0);
        m.key_down(0x13);
        assert!(m.is_key_down(0x3));
        m.key_up(0x13);
        assert!(!m.is_key_down(0x3));
    }

    #[test]
    fn test_frame_flip_reports_collision() {
        let mut f = FrameBuffer::default();
        assert!(!f.flip(10, 20)); // dark -> lit, no collision
        assert!(f.is_lit(10, 20));
        assert!(f.flip(10, 20)); // lit -> dark, collision
        assert!(!f.is_lit(10, 20));
    }
}
