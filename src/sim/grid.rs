//! Board geometry and cell storage
//!
//! Positions are signed so entering enemies can sit one cell outside an edge.

use serde::{Deserialize, Serialize};

/// A cell coordinate. On-grid only when inside the board bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// The neighbouring position one step in `dir`, without clamping
    pub fn offset(self, dir: Direction) -> Self {
        let (dr, dc) = dir.delta();
        Self::new(self.row + dr, self.col + dc)
    }

    /// Manhattan distance
    pub fn distance(self, other: Position) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

/// Orthogonal movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Fixed probe order used wherever neighbours are scanned
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// (row, col) delta
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

/// Arithmetic operator shown inside an equation cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Sub,
}

impl Operator {
    pub fn apply(self, lhs: i32, rhs: i32) -> i32 {
        match self {
            Operator::Add => lhs + rhs,
            Operator::Sub => lhs - rhs,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
        }
    }
}

/// What a cell displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellContent {
    Equation { lhs: i32, op: Operator, rhs: i32 },
    Number(i32),
}

impl CellContent {
    /// The value the cell is judged by
    pub fn value(&self) -> i32 {
        match *self {
            CellContent::Equation { lhs, op, rhs } => op.apply(lhs, rhs),
            CellContent::Number(n) => n,
        }
    }

    pub fn label(&self) -> String {
        match *self {
            CellContent::Equation { lhs, op, rhs } => format!("{} {} {}", lhs, op.symbol(), rhs),
            CellContent::Number(n) => n.to_string(),
        }
    }
}

/// A board cell. Correctness is fixed at construction; `eaten` only goes false -> true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    content: CellContent,
    correct: bool,
    eaten: bool,
}

impl Cell {
    pub fn new(content: CellContent, correct: bool) -> Self {
        Self {
            content,
            correct,
            eaten: false,
        }
    }

    pub fn content(&self) -> &CellContent {
        &self.content
    }

    pub fn is_correct(&self) -> bool {
        self.correct
    }

    pub fn is_eaten(&self) -> bool {
        self.eaten
    }

    /// Mark eaten. Returns false if it already was.
    pub fn mark_eaten(&mut self) -> bool {
        if self.eaten {
            return false;
        }
        self.eaten = true;
        true
    }
}

/// Row-major `height x width` board
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a grid by calling `fill` for every position in row-major order
    pub fn from_fn(width: usize, height: usize, mut fill: impl FnMut(Position) -> Cell) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                cells.push(fill(Position::new(row as i32, col as i32)));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row >= 0
            && pos.col >= 0
            && (pos.row as usize) < self.height
            && (pos.col as usize) < self.width
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.contains(pos)
            .then(|| pos.row as usize * self.width + pos.col as usize)
    }

    pub fn get(&self, pos: Position) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        self.index(pos).map(move |i| &mut self.cells[i])
    }

    /// Replace the cell at `pos`, returning the old one
    pub fn replace(&mut self, pos: Position, cell: Cell) -> Option<Cell> {
        let slot = self.get_mut(pos)?;
        Some(std::mem::replace(slot, cell))
    }

    pub fn position_of(&self, index: usize) -> Position {
        Position::new((index / self.width) as i32, (index % self.width) as i32)
    }

    /// Cells with their positions, row-major
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, cell)| (self.position_of(i), cell))
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.cells.len()).map(|i| self.position_of(i))
    }

    pub fn correct_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_correct()).count()
    }

    /// Clamp any coordinate onto the nearest on-grid cell
    pub fn clamp(&self, pos: Position) -> Position {
        let max_row = self.height.saturating_sub(1) as i32;
        let max_col = self.width.saturating_sub(1) as i32;
        Position::new(pos.row.clamp(0, max_row), pos.col.clamp(0, max_col))
    }

    /// One step in `dir`, clamped at the edges
    pub fn step(&self, pos: Position, dir: Direction) -> Position {
        self.clamp(pos.offset(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(width: usize, height: usize) -> Grid {
        Grid::from_fn(width, height, |p| {
            Cell::new(CellContent::Number(p.row * 10 + p.col), false)
        })
    }

    #[test]
    fn test_row_major_layout() {
        let grid = numbers(6, 5);
        assert_eq!(grid.len(), 30);
        let cell = grid.get(Position::new(2, 3)).unwrap();
        assert_eq!(cell.content().value(), 23);
        assert_eq!(grid.position_of(13), Position::new(2, 1));
        assert!(grid.get(Position::new(5, 0)).is_none());
        assert!(grid.get(Position::new(0, -1)).is_none());
    }

    #[test]
    fn test_step_clamps_at_edges() {
        let grid = numbers(6, 5);
        let corner = Position::new(0, 0);
        assert_eq!(grid.step(corner, Direction::Up), corner);
        assert_eq!(grid.step(corner, Direction::Left), corner);
        assert_eq!(grid.step(corner, Direction::Down), Position::new(1, 0));
        let far = Position::new(4, 5);
        assert_eq!(grid.step(far, Direction::Right), far);
        assert_eq!(grid.step(far, Direction::Down), far);
    }

    #[test]
    fn test_clamp_pulls_off_grid_onto_edge() {
        let grid = numbers(6, 5);
        assert_eq!(grid.clamp(Position::new(-1, 3)), Position::new(0, 3));
        assert_eq!(grid.clamp(Position::new(2, 6)), Position::new(2, 5));
        assert_eq!(grid.clamp(Position::new(5, -1)), Position::new(4, 0));
    }

    #[test]
    fn test_eaten_is_monotonic() {
        let mut cell = Cell::new(
            CellContent::Equation {
                lhs: 4,
                op: Operator::Add,
                rhs: 6,
            },
            true,
        );
        assert!(cell.mark_eaten());
        assert!(!cell.mark_eaten());
        assert!(cell.is_eaten());
        assert!(cell.is_correct());
        assert_eq!(cell.content().label(), "4 + 6");
    }
}
