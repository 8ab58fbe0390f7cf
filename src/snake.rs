use std::collections::VecDeque;

use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use thiserror::Error;

use crate::board::{Board, BoardError, Coords, Entity};
use Direction::*;

const ORIGIN: Coords = (0, 0);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

impl Direction {
    /// Whether a snake heading `self` may turn to `to`: anything but a reversal.
    pub fn can_apply(self, to: Direction) -> bool {
        self == to || self.is_horizontal() != to.is_horizontal()
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Left | Right)
    }

    fn offset(self) -> (isize, isize) {
        match self {
            Up => (0, -1),
            Down => (0, 1),
            Left => (-1, 0),
            Right => (1, 0),
        }
    }
}

#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("the given direction is unacceptable")]
    UnacceptableDirection,
    #[error("snake has crossed the border")]
    BoundaryCross,
    #[error("snake has bitten its body")]
    SelfEating,
    #[error("game is completed")]
    GameCompleted,
}

impl MoveError {
    /// Every kind except a rejected direction ends the session.
    pub fn is_terminal(self) -> bool {
        self != MoveError::UnacceptableDirection
    }

    pub fn is_victory(self) -> bool {
        self == MoveError::GameCompleted
    }
}

/// The updated score, or why the snake could not move.
pub type MoveResult = Result<u32, MoveError>;

/// Game state for one session: the board, the body (tail first), the food and the score.
pub struct Snake<R = StdRng> {
    board: Board,
    body: VecDeque<Coords>,
    direction: Direction,
    food: Option<Coords>,
    score: u32,
    rng: R,
}

impl Snake<StdRng> {
    pub fn seeded(width: usize, height: usize, seed: u64) -> Result<Self, BoardError> {
        Snake::new(width, height, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Snake<R> {
    pub fn new(width: usize, height: usize, rng: R) -> Result<Self, BoardError> {
        let mut board = Board::new(width, height)?;
        board.set_cell(ORIGIN, Entity::SnakeBody);

        let mut snake = Snake {
            board,
            body: VecDeque::from(vec![ORIGIN]),
            direction: Right,
            food: None,
            score: 0,
            rng,
        };

        if snake.board.cell_count() > snake.body.len() {
            snake.generate_food();
        }

        Ok(snake)
    }

    pub fn can_move(&self, direction: Direction) -> bool {
        self.direction.can_apply(direction)
    }

    pub fn move_step(&mut self, direction: Direction) -> MoveResult {
        if !self.can_move(direction) {
            return Err(MoveError::UnacceptableDirection);
        }

        self.direction = direction;

        let next = self.next_head(direction).ok_or(MoveError::BoundaryCross)?;
        let grows = self.food == Some(next);

        if grows {
            self.score += 1;

            if self.body.len() + 1 == self.board.cell_count() {
                self.food = None;
                self.body.push_back(next);
                self.board.set_cell(next, Entity::SnakeBody);
                return Err(MoveError::GameCompleted);
            }

            self.generate_food();
        } else if let Some(tail) = self.body.pop_front() {
            self.board.set_cell(tail, Entity::Empty);
        }

        // Checked after the tail slides so chasing the tail stays legal
        if self.board.cell_at(next) == Entity::SnakeBody {
            return Err(MoveError::SelfEating);
        }

        self.body.push_back(next);
        self.board.set_cell(next, Entity::SnakeBody);

        Ok(self.score)
    }

    pub fn grid(&self) -> &Board {
        &self.board
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn food(&self) -> Option<Coords> {
        self.food
    }

    pub fn body(&self) -> &VecDeque<Coords> {
        &self.body
    }

    pub fn head(&self) -> Coords {
        self.body[self.body.len() - 1]
    }

    ///////////////////////////////////////////////////////////////////////////

    fn next_head(&self, direction: Direction) -> Option<Coords> {
        let (x, y) = self.head();
        let (dx, dy) = direction.offset();
        let next = (x.checked_add_signed(dx)?, y.checked_add_signed(dy)?);

        if self.board.contains(next) {
            Some(next)
        } else {
            None
        }
    }

    // Rejection sampling; only called while at least one cell is empty.
    fn generate_food(&mut self) {
        let cells = self.board.cell_count();

        loop {
            let pos = self.board.coords_of(self.rng.gen_range(0..cells));

            if self.board.cell_at(pos) == Entity::Empty {
                self.board.set_cell(pos, Entity::Food);
                self.food = Some(pos);
                debug!("food placed at {:?}", pos);
                return;
            }
        }
    }
}
