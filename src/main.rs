use std::env;
use std::error::Error;
use std::fs;
use std::process;
use std::time::{Duration, Instant};

use log::info;

use vip8::display::{Display, MonoTermDisplay};
use vip8::input::{Input, TermInput};
use vip8::machine::Machine;
use vip8::sound::{SimpleBeep, Sound};

/// instruction cadence; contemporary machines got through roughly this many
/// instructions per second
const STEPS_PER_SECOND: u32 = 500;

/// timer cadence is fixed by the hardware
const TICKS_PER_SECOND: u32 = 60;

/// how long the timer-expiry beep lasts
const BEEP_DURATION: Duration = Duration::from_millis(150);

/// fires at a fixed rate against the wall clock, no matter how fast the
/// loop spins
struct Cadence {
    interval: Duration,
    next: Instant,
}

impl Cadence {
    fn new(per_second: u32) -> Self {
        let interval = Duration::from_secs(1) / per_second;
        Cadence {
            interval,
            next: Instant::now() + interval,
        }
    }

    fn due(&mut self) -> bool {
        if Instant::now() >= self.next {
            self.next += self.interval;
            true
        } else {
            false
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let rom_path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: vip8 <rom>");
            process::exit(2);
        }
    };

    let mut machine = Machine::new();
    let image = fs::read(&rom_path)?;
    machine.load_program(&image)?;
    info!("loaded {} ({} bytes)", rom_path, image.len());

    let mut display = MonoTermDisplay::new()?;
    let mut input = TermInput::new();
    let mut sound = SimpleBeep::new();

    let result = run(&mut machine, &mut display, &mut input, &mut sound);

    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..12 {
        println!();
    }
    result
}

/// the embedder's loop: instructions at one cadence, timers at another,
/// notifications drained into the collaborators as they appear
fn run(
    machine: &mut Machine,
    display: &mut impl Display,
    input: &mut impl Input,
    sound: &mut impl Sound,
) -> Result<(), Box<dyn Error>> {
    let step_period = Duration::from_secs(1) / STEPS_PER_SECOND;
    let mut ticker = Cadence::new(TICKS_PER_SECOND);
    let mut beep_until: Option<Instant> = None;

    display.draw(machine.frame())?;

    loop {
        if input.poll(machine)? {
            return Ok(());
        }

        machine.step()?;

        if ticker.due() {
            machine.tick();
            if machine.take_draw_flag() {
                display.draw(machine.frame())?;
            }
            if machine.take_sound_flag() {
                sound.beep()?;
                beep_until = Some(Instant::now() + BEEP_DURATION);
            }
        }

        if let Some(until) = beep_until {
            if Instant::now() >= until {
                sound.stop()?;
                beep_until = None;
            }
        }

        spin_sleep::sleep(step_period);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vip8::display::DummyDisplay;
    use vip8::input::DummyInput;
    use vip8::sound::Mute;

    #[test]
    fn test_run_stops_when_input_asks_to_quit() {
        let mut machine = Machine::with_seed(0);
        // 0x200: jump 0x200, spins forever until input quits
        machine.load_program(&[0x12, 0x00]).unwrap();
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[0x1, 0x2]);
        let mut sound = Mute::new();

        run(&mut machine, &mut display, &mut input, &mut sound).unwrap();
        // the initial frame was rendered before the loop
        assert!(display.frames_drawn >= 1);
    }

    #[test]
    fn test_run_surfaces_step_errors() {
        let mut machine = Machine::with_seed(0);
        // 0x200: return with an empty stack
        machine.load_program(&[0x00, 0xEE]).unwrap();
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[0x1, 0x2, 0x3]);
        let mut sound = Mute::new();

        assert!(run(&mut machine, &mut display, &mut input, &mut sound).is_err());
    }
}
