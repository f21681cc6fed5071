//! Hilbert curve traversal.
//!
//! The curve of order `level` covers the square `[0, 2^level)²` starting at
//! `(0, 0)`. It is produced by the usual four-orientation rewrite system:
//! a curve "facing" one direction expands into four sub-curves of the next
//! lower order joined by three unit moves. Order 1 is just the three moves.
//!
//! Expansion runs on an explicit work stack instead of recursing, so the
//! memory used is proportional to `level` and the iterators are lazy.

/// Unit movement of the cursor. Also names the orientation of a sub-curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Stay in place. Terminates the walk.
    None,
    /// Towards smaller `y`.
    Up,
    /// Towards larger `y`.
    Down,
    Left,
    Right,
}

impl Direction {
    /// Cursor displacement for one step.
    #[inline]
    pub const fn delta(self) -> (i64, i64) {
        match self {
            Direction::None => (0, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

use Direction::{Down, Left, Right, Up};

/// Production for one orientation: four sub-curve orientations interleaved
/// with three unit moves (`sub[0] mv[0] sub[1] mv[1] sub[2] mv[2] sub[3]`).
struct Production {
    sub: [Direction; 4],
    mv: [Direction; 3],
}

const fn production(orientation: Direction) -> Option<Production> {
    let p = match orientation {
        Left => Production {
            sub: [Up, Left, Left, Down],
            mv: [Right, Down, Left],
        },
        Right => Production {
            sub: [Down, Right, Right, Up],
            mv: [Left, Up, Right],
        },
        Up => Production {
            sub: [Left, Up, Up, Right],
            mv: [Down, Right, Up],
        },
        Down => Production {
            sub: [Right, Down, Down, Left],
            mv: [Up, Left, Down],
        },
        Direction::None => return None,
    };
    Some(p)
}

/// Smallest `level` with `2^level >= side`. Zero for `side <= 1`.
#[inline]
pub fn level_for(side: usize) -> u32 {
    if side <= 1 {
        0
    } else {
        usize::BITS - (side - 1).leading_zeros()
    }
}

#[derive(Debug, Clone, Copy)]
enum Task {
    Curve(Direction, u32),
    Move(Direction),
}

/// Lazily yields the unit moves of a Hilbert curve.
///
/// For order `level` this produces `4^level - 1` moves followed by one final
/// [`Direction::None`], i.e. exactly one item per visited cell.
#[derive(Debug, Clone)]
pub struct HilbertMoves {
    stack: Vec<Task>,
    remaining: u64,
}

impl HilbertMoves {
    /// Curve of order `level` in the canonical `Up` orientation.
    ///
    /// # Panics
    /// Panics if `level > 31`; the cell count would not fit in 64 bits.
    pub fn new(level: u32) -> Self {
        Self::with_orientation(level, Up)
    }

    /// Curve of order `level` facing `orientation`.
    ///
    /// # Panics
    /// Panics if `level > 31` or `orientation` is [`Direction::None`].
    pub fn with_orientation(level: u32, orientation: Direction) -> Self {
        assert!(level <= 31, "hilbert level {level} is too large");
        assert!(orientation != Direction::None, "a curve needs an orientation");
        let mut stack = Vec::with_capacity(6 * level as usize + 1);
        if level > 0 {
            stack.push(Task::Curve(orientation, level));
        }
        Self {
            stack,
            remaining: 1u64 << (2 * level),
        }
    }

    fn expand(&mut self, orientation: Direction, level: u32) {
        let Some(p) = production(orientation) else {
            return;
        };
        if level == 1 {
            for &mv in p.mv.iter().rev() {
                self.stack.push(Task::Move(mv));
            }
            return;
        }
        let next = level - 1;
        self.stack.push(Task::Curve(p.sub[3], next));
        for i in (0..3).rev() {
            self.stack.push(Task::Move(p.mv[i]));
            self.stack.push(Task::Curve(p.sub[i], next));
        }
    }
}

impl Iterator for HilbertMoves {
    type Item = Direction;

    fn next(&mut self) -> Option<Direction> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            match self.stack.pop() {
                Some(Task::Move(dir)) => {
                    self.remaining -= 1;
                    return Some(dir);
                }
                Some(Task::Curve(orientation, level)) => self.expand(orientation, level),
                None => {
                    self.remaining = 0;
                    return Some(Direction::None);
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl std::iter::FusedIterator for HilbertMoves {}

/// Lazily yields the cells of a Hilbert curve in visiting order.
///
/// Each cell is reported before the move that leaves it, so the final cell is
/// the one the last move lands on.
#[derive(Debug, Clone)]
pub struct HilbertPoints {
    moves: HilbertMoves,
    x: i64,
    y: i64,
}

impl HilbertPoints {
    pub fn new(level: u32) -> Self {
        Self {
            moves: HilbertMoves::new(level),
            x: 0,
            y: 0,
        }
    }
}

impl Iterator for HilbertPoints {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<(i64, i64)> {
        let dir = self.moves.next()?;
        let here = (self.x, self.y);
        let (dx, dy) = dir.delta();
        self.x += dx;
        self.y += dy;
        Some(here)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.moves.size_hint()
    }
}

impl std::iter::FusedIterator for HilbertPoints {}

/// Calls `visit` for every cell of the order-`level` curve, in curve order.
pub fn traverse<F>(level: u32, mut visit: F)
where
    F: FnMut(i64, i64),
{
    for (x, y) in HilbertPoints::new(level) {
        visit(x, y);
    }
}
