use std::io;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};

use crate::board::Board;
use crate::keyboard::Button;
use crate::snake::{Direction, MoveError, Snake};

/// Whatever shows the game to the player.
pub trait Frontend {
    fn render(&mut self, board: &Board, score: u32) -> Result<()>;
    fn game_over(&mut self, outcome: MoveError, score: u32) -> Result<()>;
}

/// How long a tick lasts: shrinks by `speed_up` per point, never below `min_frame`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TickTiming {
    pub frame: Duration,
    pub speed_up: Duration,
    pub min_frame: Duration,
}

impl TickTiming {
    pub fn interval(&self, score: u32) -> Duration {
        self.frame
            .checked_sub(self.speed_up.saturating_mul(score))
            .unwrap_or(Duration::ZERO)
            .max(self.min_frame)
            .max(Duration::from_millis(1))
    }
}

impl Default for TickTiming {
    fn default() -> Self {
        TickTiming {
            frame: Duration::from_millis(150),
            speed_up: Duration::from_millis(1),
            min_frame: Duration::from_millis(30),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Quit,
    Finished(MoveError),
}

/// The only place the snake is mutated: merges keyboard events with the tick.
pub struct SnakeGame<F> {
    snake: Snake,
    frontend: F,
    events: Receiver<io::Result<Button>>,
    timing: TickTiming,
    pending: Option<Direction>,
}

impl<F: Frontend> SnakeGame<F> {
    pub fn new(
        snake: Snake,
        frontend: F,
        events: Receiver<io::Result<Button>>,
        timing: TickTiming,
    ) -> Self {
        SnakeGame { snake, frontend, events, timing, pending: None }
    }

    pub fn play(&mut self) -> Result<Outcome> {
        self.frontend.render(self.snake.grid(), self.snake.score())?;
        let mut next_tick = Instant::now() + self.timing.interval(self.snake.score());

        loop {
            let timeout = next_tick.saturating_duration_since(Instant::now());

            // One turn per tick: later keys stay in the channel until the next one
            if self.pending.is_some() {
                thread::sleep(timeout);
            } else {
                match self.events.recv_timeout(timeout) {
                    Ok(event) => {
                        let button = event.context("keyboard input failed")?;
                        if button.is_quit() {
                            info!("quit requested with score {}", self.snake.score());
                            return Ok(Outcome::Quit);
                        }
                        self.queue_direction(button);
                        continue;
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        return Err(anyhow!("keyboard reader stopped"));
                    }
                }
            }

            if let Some(outcome) = self.tick()? {
                return Ok(Outcome::Finished(outcome));
            }
            next_tick = Instant::now() + self.timing.interval(self.snake.score());
        }
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    #[cfg(test)]
    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    ///////////////////////////////////////////////////////////////////////////

    fn queue_direction(&mut self, button: Button) {
        if let Some(dir) = button.direction() {
            if self.snake.can_move(dir) {
                self.pending = Some(dir);
            } else {
                debug!("ignoring reversal to {:?}", dir);
            }
        }
    }

    fn tick(&mut self) -> Result<Option<MoveError>> {
        let dir = self.pending.take().unwrap_or_else(|| self.snake.direction());
        let res = self.snake.move_step(dir);
        self.frontend.render(self.snake.grid(), self.snake.score())?;

        match res {
            Ok(_) => Ok(None),
            Err(e) if e.is_terminal() => {
                info!("game over: {} (score {})", e, self.snake.score());
                self.frontend.game_over(e, self.snake.score())?;
                Ok(Some(e))
            }
            Err(e) => {
                warn!("move {:?} rejected: {}", dir, e);
                Ok(None)
            }
        }
    }
}
