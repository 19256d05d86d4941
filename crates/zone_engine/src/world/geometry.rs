use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// One grid step toward `target`, closing the x gap before the y gap.
    pub fn step_toward(self, target: Position) -> Position {
        match self.x.cmp(&target.x) {
            Ordering::Less => return Position::new(self.x + 1, self.y),
            Ordering::Greater => return Position::new(self.x - 1, self.y),
            Ordering::Equal => {}
        }
        match self.y.cmp(&target.y) {
            Ordering::Less => Position::new(self.x, self.y + 1),
            Ordering::Greater => Position::new(self.x, self.y - 1),
            Ordering::Equal => self,
        }
    }

    pub fn manhattan_distance(self, other: Position) -> u32 {
        self.x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    width: u32,
    height: u32,
}

impl Bounds {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && (position.x as u32) < self.width
            && (position.y as u32) < self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_toward_moves_one_unit_x_first() {
        let from = Position::new(0, 0);
        assert_eq!(from.step_toward(Position::new(3, 2)), Position::new(1, 0));
        assert_eq!(
            Position::new(3, 0).step_toward(Position::new(3, 2)),
            Position::new(3, 1)
        );
        assert_eq!(from.step_toward(from), from);
    }

    #[test]
    fn bounds_reject_zero_size_and_negative_positions() {
        assert!(Bounds::new(0, 4).is_none());
        let bounds = Bounds::new(4, 3).expect("bounds");
        assert!(bounds.contains(Position::new(3, 2)));
        assert!(!bounds.contains(Position::new(4, 2)));
        assert!(!bounds.contains(Position::new(-1, 0)));
    }
}
