use std::io::{self, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::terminal::ClearType;

use crate::board::{Board, Entity};
use crate::game::Frontend;
use crate::snake::MoveError;

const SNAKE_BODY_CHAR: char = '█';
const FOOD_CHAR: char = 'O';
const EMPTY_CHAR: char = '·';

// Score line plus a blank line above the board
const HEADER_ROWS: u16 = 2;

/// Owns the terminal for the duration of a session. Dropping it restores cooked mode.
pub struct TermManager<W: Write = io::Stdout> {
    out: W,
    started: Instant,
    rows_drawn: u16,
    active: bool,
}

impl TermManager<io::Stdout> {
    pub fn new() -> Self {
        TermManager::with_writer(io::stdout())
    }
}

impl<W: Write> TermManager<W> {
    pub fn with_writer(out: W) -> Self {
        TermManager { out, started: Instant::now(), rows_drawn: 0, active: false }
    }

    pub fn setup(&mut self) -> Result<()> {
        terminal::enable_raw_mode().context("Error enabling raw mode")?;
        self.active = true;
        execute!(self.out, cursor::Hide, terminal::Clear(ClearType::All))
            .context("Error preparing the screen")?;
        self.started = Instant::now();
        Ok(())
    }

    pub fn restore(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        execute!(self.out, cursor::MoveTo(0, self.rows_drawn + 1), cursor::Show)
            .context("Error showing the cursor")?;
        terminal::disable_raw_mode().context("Error disabling raw mode")?;
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W
    where
        W: Default,
    {
        let mut this = self;
        std::mem::take(&mut this.out)
    }

    ///////////////////////////////////////////////////////////////////////////

    fn print_line(&mut self, row: u16, line: &str) -> io::Result<()> {
        queue!(
            self.out,
            cursor::MoveTo(0, row),
            terminal::Clear(ClearType::CurrentLine),
            style::Print(line)
        )
    }
}

impl<W: Write> Frontend for TermManager<W> {
    fn render(&mut self, board: &Board, score: u32) -> Result<()> {
        let elapsed = self.started.elapsed().as_secs();
        self.print_line(0, &format!("Score: {}    Time: {}s", score, elapsed))?;

        let mut row = HEADER_ROWS;
        for cells in board.rows() {
            let mut line = String::with_capacity(board.width() * 3);
            for cell in cells {
                line.push(' ');
                line.push(entity_char(*cell));
                line.push(' ');
            }
            self.print_line(row, &line)?;
            row += 1;
        }

        self.rows_drawn = row;
        self.out.flush().context("Error flushing the frame")?;
        Ok(())
    }

    fn game_over(&mut self, outcome: MoveError, score: u32) -> Result<()> {
        let msg = final_message(outcome);
        self.print_line(self.rows_drawn + 1, &format!("{} (score {})", msg, score))?;
        self.rows_drawn += 2;
        self.out.flush().context("Error flushing the final message")?;
        Ok(())
    }
}

impl<W: Write> Drop for TermManager<W> {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

pub fn entity_char(entity: Entity) -> char {
    match entity {
        Entity::Empty => EMPTY_CHAR,
        Entity::SnakeBody => SNAKE_BODY_CHAR,
        Entity::Food => FOOD_CHAR,
    }
}

pub fn final_message(outcome: MoveError) -> String {
    if outcome.is_victory() {
        "Game is completed".to_string()
    } else {
        format!("Game over: {}", outcome)
    }
}
