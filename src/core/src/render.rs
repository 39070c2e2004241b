//! Terminal rendering of build events.
//!
//! Cursor movement sits behind the [`Terminal`] trait so that the row
//! arithmetic in [`ProgressLedger`] can be exercised against a recording
//! terminal instead of a real device.

use std::io::{self, Stdout, Write};

use crossterm::cursor::{MoveDown, MoveToColumn, MoveUp};
use crossterm::terminal::{Clear, ClearType};
use crossterm::tty::IsTty;
use crossterm::queue;

use crate::error::Result;
use crate::event::BuildEvent;
use crate::ledger::{Placement, ProgressLedger};

/// Output device with optional cursor control.
pub trait Terminal {
    /// Write text at the cursor, verbatim.
    fn write_text(&mut self, text: &str) -> io::Result<()>;

    /// Move the cursor up `rows` lines, to column 0.
    ///
    /// Fails with [`io::ErrorKind::Unsupported`] when the device has no
    /// cursor control or the target row is out of reach.
    fn move_up(&mut self, rows: usize) -> io::Result<()>;

    /// Clear the line under the cursor.
    fn erase_line(&mut self) -> io::Result<()>;

    /// Return the cursor to where it was before the last `move_up`.
    fn reset_position(&mut self) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

fn unsupported(reason: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, reason.to_string())
}

/// Whether a row `rows` lines above the cursor is still visible.
fn row_on_screen(rows: u16, height: Option<u16>) -> bool {
    height.map_or(true, |height| rows < height)
}

/// ANSI terminal driven through crossterm.
pub struct AnsiTerminal<W: Write> {
    out: W,
    cursor_control: bool,
    query_height: bool,
    lifted: u16,
}

impl AnsiTerminal<Stdout> {
    /// Terminal on stdout; cursor control only when stdout is a TTY.
    pub fn stdout() -> Self {
        let out = io::stdout();
        let cursor_control = out.is_tty();
        Self {
            out,
            cursor_control,
            query_height: cursor_control,
            lifted: 0,
        }
    }
}

impl<W: Write> AnsiTerminal<W> {
    pub fn new(out: W, cursor_control: bool) -> Self {
        Self {
            out,
            cursor_control,
            query_height: false,
            lifted: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Terminal for AnsiTerminal<W> {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())
    }

    fn move_up(&mut self, rows: usize) -> io::Result<()> {
        if !self.cursor_control {
            return Err(unsupported("output is not a terminal"));
        }
        let rows = u16::try_from(rows).map_err(|_| unsupported("row out of range"))?;
        // The window may have been resized since the last call.
        let height = if self.query_height {
            crossterm::terminal::size().ok().map(|(_, rows)| rows)
        } else {
            None
        };
        if !row_on_screen(rows, height) {
            return Err(unsupported("row scrolled off screen"));
        }
        queue!(self.out, MoveUp(rows), MoveToColumn(0))?;
        self.lifted = rows;
        Ok(())
    }

    fn erase_line(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::CurrentLine))
    }

    fn reset_position(&mut self) -> io::Result<()> {
        if self.lifted > 0 {
            queue!(self.out, MoveDown(self.lifted), MoveToColumn(0))?;
            self.lifted = 0;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// One call made against a [`RecordingTerminal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalOp {
    Text(String),
    MoveUp(usize),
    EraseLine,
    ResetPosition,
}

/// In-memory terminal that records calls and keeps a simple screen model.
#[derive(Debug, Clone)]
pub struct RecordingTerminal {
    cursor_control: bool,
    ops: Vec<TerminalOp>,
    rows: Vec<String>,
    row: usize,
    saved_row: Option<usize>,
}

impl RecordingTerminal {
    pub fn new(cursor_control: bool) -> Self {
        Self {
            cursor_control,
            ops: Vec::new(),
            rows: vec![String::new()],
            row: 0,
            saved_row: None,
        }
    }

    pub fn ops(&self) -> &[TerminalOp] {
        &self.ops
    }

    /// Completed screen lines (the trailing cursor line is left out when empty).
    pub fn screen(&self) -> Vec<String> {
        let mut rows = self.rows.clone();
        if rows.last().is_some_and(|r| r.is_empty()) {
            rows.pop();
        }
        rows
    }

    /// Row index of the cursor.
    pub fn cursor_row(&self) -> usize {
        self.row
    }
}

impl Terminal for RecordingTerminal {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.ops.push(TerminalOp::Text(text.to_string()));
        for ch in text.chars() {
            if ch == '\n' {
                self.row += 1;
                if self.row == self.rows.len() {
                    self.rows.push(String::new());
                }
            } else {
                self.rows[self.row].push(ch);
            }
        }
        Ok(())
    }

    fn move_up(&mut self, rows: usize) -> io::Result<()> {
        if !self.cursor_control {
            return Err(unsupported("recording without cursor control"));
        }
        if rows > self.row {
            return Err(unsupported("row scrolled off screen"));
        }
        self.ops.push(TerminalOp::MoveUp(rows));
        self.saved_row.get_or_insert(self.row);
        self.row -= rows;
        Ok(())
    }

    fn erase_line(&mut self) -> io::Result<()> {
        self.ops.push(TerminalOp::EraseLine);
        self.rows[self.row].clear();
        Ok(())
    }

    fn reset_position(&mut self) -> io::Result<()> {
        self.ops.push(TerminalOp::ResetPosition);
        if let Some(row) = self.saved_row.take() {
            self.row = row;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Draws build events, keeping per-stage progress lines updated in place.
///
/// After the first failed cursor operation the renderer stays in
/// append-only mode for the rest of the run.
pub struct ProgressRenderer<T: Terminal> {
    terminal: T,
    ledger: ProgressLedger,
    degraded: bool,
}

impl<T: Terminal> ProgressRenderer<T> {
    pub fn new(terminal: T) -> Self {
        Self {
            terminal,
            ledger: ProgressLedger::new(),
            degraded: false,
        }
    }

    pub fn ledger(&self) -> &ProgressLedger {
        &self.ledger
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn into_terminal(self) -> T {
        self.terminal
    }

    /// Whether in-place updates have been given up for this run.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Draw one event. Failures and ignored events draw nothing.
    pub fn render(&mut self, event: &BuildEvent) -> Result<()> {
        match event {
            BuildEvent::Stream { text, finished } => self.raw(text, *finished)?,
            BuildEvent::Status { text } => self.status(text)?,
            BuildEvent::Progress {
                id,
                status,
                progress,
            } => self.progress(id, status, progress)?,
            BuildEvent::Failed { .. } | BuildEvent::Ignored => return Ok(()),
        }
        self.terminal.flush()?;
        Ok(())
    }

    /// Print raw output verbatim. A finished marker starts a new phase.
    pub fn raw(&mut self, text: &str, finished: bool) -> Result<()> {
        self.terminal.write_text(text)?;
        if finished {
            tracing::debug!(stages = self.ledger.len(), "Build phase finished");
            self.ledger.reset();
        }
        Ok(())
    }

    /// Print a status line that belongs to no stage.
    pub fn status(&mut self, text: &str) -> Result<()> {
        self.terminal.write_text(&format!("{text}\n"))?;
        Ok(())
    }

    /// Print or redraw the progress line of one stage.
    pub fn progress(&mut self, id: &str, status: &str, progress: &str) -> Result<()> {
        let line = format!("{id}: {status} {progress}");
        match self.ledger.place(id) {
            Placement::Append => self.append(&line),
            Placement::Redraw { rows_above } => self.redraw(&line, rows_above),
        }
    }

    fn append(&mut self, line: &str) -> Result<()> {
        self.terminal.write_text(line)?;
        self.terminal.write_text("\n")?;
        Ok(())
    }

    fn redraw(&mut self, line: &str, rows_above: usize) -> Result<()> {
        if self.degraded {
            return self.append(line);
        }

        if let Err(e) = self.terminal.move_up(rows_above) {
            tracing::warn!(error = %e, "Cursor control unavailable, appending progress lines");
            self.degraded = true;
            return self.append(line);
        }

        self.terminal.erase_line()?;
        self.terminal.write_text(line)?;
        self.terminal.reset_position()?;
        Ok(())
    }
}
