///
/// ## Design
///
/// * the machine is one mutable aggregate (`machine::Machine`), owned by
///   whoever drives the loop; no globals, no shared state
/// * `step()` runs exactly one fetch/decode/execute cycle; `tick()` is the
///   60Hz timer heartbeat; the two cadences are the embedder's problem
/// * instruction words are decoded once into `opcode::Opcode` and then
///   executed, instead of re-masking the raw word in every arm
/// * the FX0A "wait for a key" instruction must not block: the machine
///   parks itself in `Mode::AwaitingKey` and the next key-down completes
///   the pending register write
/// * display, input and sound sit behind traits so the core never learns
///   how the terminal works; collaborators talk to the machine through
///   the key slots, the frame buffer and two edge-triggered flags
/// * effective addresses wrap modulo the 4K RAM; a program that runs its
///   pointers off the end reads its own low memory instead of corrupting
///   the host
///
/// Model
///
/// main loop
///  |-- input.poll(machine)      // key events in, quit request out
///  |-- machine.step()           // ~500Hz
///  |-- machine.tick()           // 60Hz
///  |-- machine.take_draw_flag() -> display.draw(machine.frame())
///  `-- machine.take_sound_flag() -> sound.beep()
mod interpreter;
pub mod display;
pub mod input;
pub mod machine;
pub mod memory;
pub mod opcode;
pub mod sound;

use thiserror::Error;

/// Everything that can go wrong inside the core. Loading a too-big image is
/// recoverable (refuse to start); the rest mean the running program is
/// broken and the embedder should halt or reset.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chip8Error {
    #[error("program image is {size} bytes; at most {max} fit above 0x200")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("unknown instruction {word:#06x}")]
    UnknownInstruction { word: u16 },

    #[error("call stack overflow")]
    StackOverflow,

    #[error("return with an empty call stack")]
    StackUnderflow,
}
