use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

use crate::machine::{FrameBuffer, DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// Display is what the driving loop renders on. It should abstract the
/// implementation details, so a variety of kinds of screen would work; the
/// machine itself only ever exposes its frame buffer and a dirty flag.
pub trait Display {
    /// render the whole frame. Called whenever the draw flag drains; frames
    /// the embedder never drains are coalesced, which is fine because a
    /// redraw is idempotent.
    fn draw(&mut self, frame: &FrameBuffer) -> Result<(), io::Error>;
}

/// split a frame into canvas coordinates for one bitplane. TUI wants y
/// growing upward, the frame stores rows downward, hence the negation.
fn coords(frame: &FrameBuffer, lit: bool) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    for y in 0..DISPLAY_HEIGHT {
        for x in 0..DISPLAY_WIDTH {
            if frame.is_lit(x, y) == lit {
                points.push((x as f64, -(y as f64)));
            }
        }
    }
    points
}

/// monochrome display in a terminal, rendered using TUI over crossterm at a
/// 1:1 ratio between chip-8 pixels and terminal cells
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl MonoTermDisplay {
    pub fn new() -> Result<MonoTermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        Ok(MonoTermDisplay { terminal })
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, frame: &FrameBuffer) -> Result<(), io::Error> {
        let unlit = coords(frame, false);
        let lit = coords(frame, true);
        self.terminal.draw(|f| {
            let size = Rect::new(
                0,
                0,
                2 + DISPLAY_WIDTH as u16,
                2 + DISPLAY_HEIGHT as u16,
            );

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("vip8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds([0.0, (DISPLAY_WIDTH - 1) as f64])
                .y_bounds([-1.0 * (DISPLAY_HEIGHT - 1) as f64, 0.0])
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &unlit,
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &lit,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines
pub struct DummyDisplay {
    pub frames_drawn: usize,
}

impl DummyDisplay {
    pub fn new() -> Self {
        DummyDisplay { frames_drawn: 0 }
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, _frame: &FrameBuffer) -> Result<(), io::Error> {
        self.frames_drawn += 1;
        Ok(())
    }
}

/// a border and a diagonal, handy for eyeballing a renderer by hand
pub fn test_frame() -> FrameBuffer {
    let mut frame = FrameBuffer::default();
    for x in 0..DISPLAY_WIDTH {
        frame.flip(x, 0);
        frame.flip(x, DISPLAY_HEIGHT - 1);
    }
    for y in 1..DISPLAY_HEIGHT - 1 {
        frame.flip(0, y);
        frame.flip(DISPLAY_WIDTH - 1, y);
        frame.flip(y * 2, y);
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coords_cover_every_pixel_once() {
        let frame = test_frame();
        let lit = coords(&frame, true);
        let unlit = coords(&frame, false);
        assert_eq!(lit.len() + unlit.len(), DISPLAY_WIDTH * DISPLAY_HEIGHT);
        assert_eq!(lit.len(), frame.lit_count());
    }

    #[test]
    fn test_test_frame_has_a_border() {
        let frame = test_frame();
        assert!(frame.is_lit(0, 0));
        assert!(frame.is_lit(DISPLAY_WIDTH - 1, DISPLAY_HEIGHT - 1));
        assert!(!frame.is_lit(1, 2));
    }

    #[test]
    fn test_dummy_display_counts_draws() {
        let mut d = DummyDisplay::new();
        d.draw(&FrameBuffer::default()).unwrap();
        d.draw(&FrameBuffer::default()).unwrap();
        assert_eq!(d.frames_drawn, 2);
    }
}
