use std::io::{self, Stdout, Write};

use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::graphics::{Frame, Rgb};

/// Upper half block: foreground paints the top pixel, background the bottom
const HALF_BLOCK: char = '\u{2580}';

/// Where finished frames go
pub trait Surface {
    fn present(&mut self, frame: &Frame, overlay: &[String]) -> io::Result<()>;
}

/// Logical pixel size of a terminal of `cols` x `rows` cells
pub fn pixels_for_cells(cols: u16, rows: u16) -> (usize, usize) {
    (cols as usize, rows as usize * 2)
}

/// Current terminal size in cells, falling back to 80x24 when unknown
pub fn viewport_cells() -> (u16, u16) {
    match termsize::get() {
        Some(size) if size.cols > 0 && size.rows > 0 => (size.cols, size.rows),
        _ => terminal::size().unwrap_or((80, 24)),
    }
}

/// Full-screen terminal drawn with half blocks in 24-bit colour.
///
/// Raw mode, the alternate screen and mouse capture are restored on drop.
pub struct TerminalSurface {
    out: Stdout,
}

impl TerminalSurface {
    pub fn new() -> io::Result<Self> {
        let mut out = io::stdout();
        enter(&mut out)?;
        Ok(TerminalSurface { out })
    }
}

/// Switches to raw mode and the alternate screen; raw mode is undone if the
/// screen setup fails
fn enter<W: Write>(out: &mut W) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    if let Err(err) = execute!(out, EnterAlternateScreen, EnableMouseCapture, cursor::Hide) {
        let _ = terminal::disable_raw_mode();
        return Err(err);
    }
    Ok(())
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let _ = execute!(
            self.out,
            ResetColor,
            cursor::Show,
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb[0],
        g: rgb[1],
        b: rgb[2],
    }
}

impl Surface for TerminalSurface {
    fn present(&mut self, frame: &Frame, overlay: &[String]) -> io::Result<()> {
        let rows = frame.height.div_ceil(2);
        for row in 0..rows {
            queue!(self.out, cursor::MoveTo(0, row as u16))?;
            let mut last: Option<(Rgb, Rgb)> = None;
            for x in 0..frame.width {
                let top = frame.pixel(x, row * 2);
                let bottom = frame.pixel(x, row * 2 + 1);
                if last != Some((top, bottom)) {
                    queue!(
                        self.out,
                        SetForegroundColor(color(top)),
                        SetBackgroundColor(color(bottom))
                    )?;
                    last = Some((top, bottom));
                }
                queue!(self.out, Print(HALF_BLOCK))?;
            }
        }

        queue!(
            self.out,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Color::Black)
        )?;
        for (i, line) in overlay.iter().enumerate().take(rows) {
            let line: String = line.chars().take(frame.width.saturating_sub(1)).collect();
            queue!(self.out, cursor::MoveTo(1, i as u16), Print(line))?;
        }
        queue!(self.out, ResetColor)?;
        self.out.flush()
    }
}
