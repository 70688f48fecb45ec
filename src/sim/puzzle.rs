//! Puzzle content generation
//!
//! Every cell is drawn as either correct or incorrect for the round's target,
//! then the grid is topped up until enough correct cells exist. Negative
//! examples are produced by reject-and-resample; every validated target has
//! both satisfying and violating values in range, so the loops terminate.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::{Cell, CellContent, Grid, Operator};
use crate::error::ConfigError;

/// Correctness predicate family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Equals,
    Multiples,
    Factors,
    Inequality,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Equals, Mode::Multiples, Mode::Factors, Mode::Inequality];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Equals => "equals",
            Mode::Multiples => "multiples",
            Mode::Factors => "factors",
            Mode::Inequality => "inequality",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "equals" | "eq" => Some(Mode::Equals),
            "multiples" | "mul" => Some(Mode::Multiples),
            "factors" | "fac" => Some(Mode::Factors),
            "inequality" | "ineq" => Some(Mode::Inequality),
            _ => None,
        }
    }

    /// Smallest target this mode can build a fair board for
    pub fn minimum_target(&self) -> i32 {
        match self {
            // `+` needs lhs in [1, target-1]
            Mode::Equals => 2,
            Mode::Multiples => 2,
            // target 2 has no non-divisor in [1, 2]
            Mode::Factors => 3,
            Mode::Inequality => 1,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inequality direction for the round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Less,
}

impl Comparison {
    pub fn holds(self, value: i32, target: i32) -> bool {
        match self {
            Comparison::Greater => value > target,
            Comparison::Less => value < target,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Greater => ">",
            Comparison::Less => "<",
        }
    }
}

/// Target and rule for one level's board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    target: i32,
    mode: Mode,
    comparison: Option<Comparison>,
}

impl Puzzle {
    pub fn new(target: i32, mode: Mode, comparison: Option<Comparison>) -> Result<Self, ConfigError> {
        let minimum = mode.minimum_target();
        if target < minimum {
            return Err(ConfigError::DegenerateTarget {
                target,
                mode,
                minimum,
            });
        }
        if mode == Mode::Inequality && comparison.is_none() {
            return Err(ConfigError::MissingOperator);
        }
        Ok(Self {
            target,
            mode,
            comparison: if mode == Mode::Inequality { comparison } else { None },
        })
    }

    pub fn target(&self) -> i32 {
        self.target
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn comparison(&self) -> Option<Comparison> {
        self.comparison
    }

    /// Judge a value against the round's rule
    pub fn accepts(&self, value: i32) -> bool {
        let target = self.target;
        match self.mode {
            Mode::Equals => value == target,
            Mode::Multiples => value > 0 && value % target == 0,
            Mode::Factors => value > 0 && target % value == 0,
            Mode::Inequality => self
                .comparison
                .is_some_and(|cmp| cmp.holds(value, target)),
        }
    }

    /// Heading shown above the board
    pub fn prompt(&self) -> String {
        match self.mode {
            Mode::Equals => format!("Find equations that equal: {}", self.target),
            Mode::Multiples => format!("Find multiples of: {}", self.target),
            Mode::Factors => format!("Find factors of: {}", self.target),
            Mode::Inequality => {
                let op = self.comparison.map(Comparison::symbol).unwrap_or("?");
                format!("Find numbers {} {}", op, self.target)
            }
        }
    }

    /// Feedback for eating a cell that does not satisfy the rule
    pub fn mismatch_message(&self, content: &CellContent) -> String {
        let value = content.value();
        match self.mode {
            Mode::Multiples => format!("Oops! {} is not a multiple of {}", value, self.target),
            Mode::Factors => format!("Oops! {} is not a factor of {}", value, self.target),
            Mode::Inequality => {
                let op = self.comparison.map(Comparison::symbol).unwrap_or("?");
                format!(
                    "Oops! {} = {}, not {} {}",
                    content.label(),
                    value,
                    op,
                    self.target
                )
            }
            Mode::Equals => format!("Oops! {} = {}", content.label(), value),
        }
    }
}

/// Generate one cell, aiming for `want_correct`. The stored correctness is
/// always recomputed from the final content.
pub fn generate_cell<R: Rng>(puzzle: &Puzzle, want_correct: bool, rng: &mut R) -> Cell {
    let content = match puzzle.mode {
        Mode::Equals => equation_for(puzzle.target, want_correct, rng),
        Mode::Multiples => CellContent::Number(multiple_for(puzzle.target, want_correct, rng)),
        Mode::Factors => CellContent::Number(factor_for(puzzle.target, want_correct, rng)),
        Mode::Inequality => {
            let cmp = puzzle.comparison.unwrap_or(Comparison::Greater);
            inequality_for(puzzle.target, cmp, want_correct, rng)
        }
    };
    Cell::new(content, puzzle.accepts(content.value()))
}

/// Fill a `height x width` grid, each cell correct with probability `correct_chance`
pub fn generate_grid<R: Rng>(
    puzzle: &Puzzle,
    width: usize,
    height: usize,
    correct_chance: f64,
    rng: &mut R,
) -> Grid {
    let chance = correct_chance.clamp(0.0, 1.0);
    Grid::from_fn(width, height, |_| {
        let want_correct = rng.random_bool(chance);
        generate_cell(puzzle, want_correct, rng)
    })
}

/// Regenerate random incorrect cells into correct ones until `minimum` correct
/// cells exist (or every cell is correct). Returns the final correct count.
pub fn ensure_minimum_correct<R: Rng>(
    grid: &mut Grid,
    puzzle: &Puzzle,
    minimum: usize,
    rng: &mut R,
) -> usize {
    let goal = minimum.min(grid.len());
    let mut correct = grid.correct_count();
    while correct < goal {
        let pos = grid.position_of(rng.random_range(0..grid.len()));
        if grid.get(pos).is_some_and(|c| !c.is_correct()) {
            let cell = generate_cell(puzzle, true, rng);
            if cell.is_correct() {
                grid.replace(pos, cell);
                correct += 1;
            }
        }
    }
    correct
}

fn random_op<R: Rng>(rng: &mut R) -> Operator {
    if rng.random_bool(0.5) {
        Operator::Add
    } else {
        Operator::Sub
    }
}

/// Two operands in [1, 15]; for subtraction the larger goes first
fn free_equation<R: Rng>(op: Operator, rng: &mut R) -> (i32, i32) {
    let a = rng.random_range(1..=15);
    let b = rng.random_range(1..=15);
    match op {
        Operator::Sub if a < b => (b, a),
        _ => (a, b),
    }
}

fn equation_for<R: Rng>(target: i32, want_correct: bool, rng: &mut R) -> CellContent {
    let op = random_op(rng);
    let (lhs, rhs) = if want_correct {
        match op {
            Operator::Add => {
                let lhs = rng.random_range(1..target);
                (lhs, target - lhs)
            }
            Operator::Sub => {
                let lhs = target + rng.random_range(1..=10);
                (lhs, lhs - target)
            }
        }
    } else {
        let (lhs, rhs) = free_equation(op, rng);
        if op.apply(lhs, rhs) == target {
            let nudged = if rng.random_bool(0.5) { target + 1 } else { target - 1 };
            match op {
                Operator::Add => (lhs, nudged - lhs),
                Operator::Sub => (lhs, lhs - nudged),
            }
        } else {
            (lhs, rhs)
        }
    };
    CellContent::Equation { lhs, op, rhs }
}

fn multiple_for<R: Rng>(target: i32, want_correct: bool, rng: &mut R) -> i32 {
    if want_correct {
        return target * rng.random_range(1..=10);
    }
    loop {
        let n = rng.random_range(1..=target * 10);
        if n % target != 0 {
            return n;
        }
    }
}

fn divisors(target: i32) -> Vec<i32> {
    (1..=target).filter(|d| target % d == 0).collect()
}

fn factor_for<R: Rng>(target: i32, want_correct: bool, rng: &mut R) -> i32 {
    if want_correct {
        let divs = divisors(target);
        return divs[rng.random_range(0..divs.len())];
    }
    loop {
        let n = rng.random_range(1..=target);
        if target % n != 0 {
            return n;
        }
    }
}

/// Operands producing exactly `result` with `op`; falls back to subtraction
/// when `result` is too small to be a sum of two positive operands.
fn equation_with_result<R: Rng>(op: Operator, result: i32, rng: &mut R) -> CellContent {
    match op {
        Operator::Add if result >= 2 => {
            let lhs = rng.random_range(1..result);
            CellContent::Equation {
                lhs,
                op,
                rhs: result - lhs,
            }
        }
        _ => {
            let rhs = rng.random_range(1..=10);
            CellContent::Equation {
                lhs: result + rhs,
                op: Operator::Sub,
                rhs,
            }
        }
    }
}

fn inequality_for<R: Rng>(
    target: i32,
    cmp: Comparison,
    want_correct: bool,
    rng: &mut R,
) -> CellContent {
    let op = random_op(rng);
    let (lhs, rhs) = free_equation(op, rng);
    if cmp.holds(op.apply(lhs, rhs), target) == want_correct {
        return CellContent::Equation { lhs, op, rhs };
    }

    // Rebuild around a result on the wanted side. Results stay non-negative.
    let result = match (cmp, want_correct) {
        (Comparison::Greater, true) => target + rng.random_range(1..=10),
        (Comparison::Greater, false) => rng.random_range((target - 10).max(0)..=target),
        (Comparison::Less, true) => rng.random_range((target - 10).max(0)..target),
        (Comparison::Less, false) => target + rng.random_range(0..=10),
    };
    equation_with_result(op, result, rng)
}
