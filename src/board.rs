use thiserror::Error;

/// Board position as `(x, y)`, with `(0, 0)` in the top-left corner.
pub type Coords = (usize, usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Entity {
    Empty,
    SnakeBody,
    Food,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("board dimensions must be positive, got {width}x{height}")]
    EmptyDimension { width: usize, height: usize },
    #[error("board of {width}x{height} cells is too large")]
    TooLarge { width: usize, height: usize },
}

/// Row-major `height x width` grid of entities.
#[derive(Clone, Debug)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Entity>,
}

impl Board {
    pub fn new(width: usize, height: usize) -> Result<Self, BoardError> {
        if width == 0 || height == 0 {
            return Err(BoardError::EmptyDimension { width, height });
        }

        let cells = width
            .checked_mul(height)
            .ok_or(BoardError::TooLarge { width, height })?;

        Ok(Board { width, height, cells: vec![Entity::Empty; cells] })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, pos: Coords) -> bool {
        pos.0 < self.width && pos.1 < self.height
    }

    /// Panics if `pos` is outside the board; callers check bounds first.
    pub fn cell_at(&self, pos: Coords) -> Entity {
        self.cells[self.index(pos)]
    }

    /// Panics if `pos` is outside the board; callers check bounds first.
    pub fn set_cell(&mut self, pos: Coords, entity: Entity) {
        let idx = self.index(pos);
        self.cells[idx] = entity;
    }

    /// Converts a linear cell index into coordinates.
    pub fn coords_of(&self, index: usize) -> Coords {
        (index % self.width, index / self.width)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Entity]> {
        self.cells.chunks(self.width)
    }

    #[cfg(test)]
    pub fn count(&self, entity: Entity) -> usize {
        self.cells.iter().filter(|&&cell| cell == entity).count()
    }

    ///////////////////////////////////////////////////////////////////////////

    fn index(&self, pos: Coords) -> usize {
        assert!(
            self.contains(pos),
            "cell {:?} is outside the {}x{} board",
            pos,
            self.width,
            self.height
        );
        pos.1 * self.width + pos.0
    }
}
