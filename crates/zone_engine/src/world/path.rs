use super::geometry::Position;

/// Ordered waypoints. A looping path is patrolled back and forth; a non-looping
/// path is walked once and then exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedPath {
    waypoints: Vec<Position>,
    looping: bool,
}

impl FixedPath {
    pub fn new(waypoints: Vec<Position>, looping: bool) -> Self {
        Self { waypoints, looping }
    }

    pub fn waypoints(&self) -> &[Position] {
        &self.waypoints
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TraversalDirection {
    Forward,
    Backward,
}

/// Traversal state over one [`FixedPath`]. Replacing the path means building a
/// new follower, so no state carries over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFollower {
    path: FixedPath,
    next_waypoint_index: usize,
    direction: TraversalDirection,
    exhausted: bool,
}

impl PathFollower {
    pub fn new(path: FixedPath) -> Self {
        let exhausted = path.is_empty();
        Self {
            path,
            next_waypoint_index: 0,
            direction: TraversalDirection::Forward,
            exhausted,
        }
    }

    pub fn path(&self) -> &FixedPath {
        &self.path
    }

    pub fn current_waypoint(&self) -> Option<Position> {
        if self.exhausted {
            return None;
        }
        self.path.waypoints.get(self.next_waypoint_index).copied()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Returns the position one step further along the path from `from`, or
    /// `None` when there is nowhere left to go. Waypoints already reached are
    /// consumed; the caller decides whether the proposed step is committed.
    pub fn propose_step(&mut self, from: Position) -> Option<Position> {
        // Bounded so a looping path whose waypoints all coincide cannot spin.
        let max_advances = self.path.len().saturating_mul(2).max(1);
        for _ in 0..=max_advances {
            let target = self.current_waypoint()?;
            if target != from {
                return Some(from.step_toward(target));
            }
            self.advance_waypoint();
        }
        None
    }

    fn advance_waypoint(&mut self) {
        let last = self.path.len().saturating_sub(1);
        match self.direction {
            TraversalDirection::Forward if self.next_waypoint_index < last => {
                self.next_waypoint_index += 1;
            }
            TraversalDirection::Backward if self.next_waypoint_index > 0 => {
                self.next_waypoint_index -= 1;
            }
            _ if !self.path.looping || last == 0 => {
                self.exhausted = true;
            }
            TraversalDirection::Forward => {
                self.direction = TraversalDirection::Backward;
                self.next_waypoint_index = last - 1;
            }
            TraversalDirection::Backward => {
                self.direction = TraversalDirection::Forward;
                self.next_waypoint_index = 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(follower: &mut PathFollower, start: Position, turns: usize) -> Vec<Position> {
        let mut position = start;
        let mut visited = Vec::new();
        for _ in 0..turns {
            if let Some(next) = follower.propose_step(position) {
                position = next;
            }
            visited.push(position);
        }
        visited
    }

    #[test]
    fn looping_path_ping_pongs_instead_of_jumping_back() {
        let path = FixedPath::new(vec![Position::new(0, 0), Position::new(2, 0)], true);
        let mut follower = PathFollower::new(path);

        let visited = walk(&mut follower, Position::new(0, 0), 6);

        assert_eq!(
            visited,
            vec![
                Position::new(1, 0),
                Position::new(2, 0),
                Position::new(1, 0),
                Position::new(0, 0),
                Position::new(1, 0),
                Position::new(2, 0),
            ]
        );
        for pair in visited.windows(2) {
            assert!(pair[0].manhattan_distance(pair[1]) <= 1);
        }
        assert!(!follower.is_exhausted());
    }

    #[test]
    fn non_looping_path_stops_at_final_waypoint() {
        let path = FixedPath::new(vec![Position::new(0, 0), Position::new(3, 0)], false);
        let mut follower = PathFollower::new(path);

        let visited = walk(&mut follower, Position::new(0, 0), 8);

        assert_eq!(&visited[..3], &[
            Position::new(1, 0),
            Position::new(2, 0),
            Position::new(3, 0),
        ]);
        assert!(visited[3..].iter().all(|p| *p == Position::new(3, 0)));
        assert!(follower.is_exhausted());
        assert_eq!(follower.propose_step(Position::new(3, 0)), None);
    }

    #[test]
    fn multi_segment_patrol_reverses_through_every_waypoint() {
        let path = FixedPath::new(
            vec![Position::new(0, 0), Position::new(1, 0), Position::new(1, 1)],
            true,
        );
        let mut follower = PathFollower::new(path);

        let visited = walk(&mut follower, Position::new(0, 0), 4);

        assert_eq!(
            visited,
            vec![
                Position::new(1, 0),
                Position::new(1, 1),
                Position::new(1, 0),
                Position::new(0, 0),
            ]
        );
    }

    #[test]
    fn entity_off_path_walks_to_first_waypoint() {
        let path = FixedPath::new(vec![Position::new(2, 0), Position::new(2, 2)], false);
        let mut follower = PathFollower::new(path);

        let visited = walk(&mut follower, Position::new(0, 0), 4);

        assert_eq!(
            visited,
            vec![
                Position::new(1, 0),
                Position::new(2, 0),
                Position::new(2, 1),
                Position::new(2, 2),
            ]
        );
    }

    #[test]
    fn degenerate_paths_do_not_spin() {
        let mut empty = PathFollower::new(FixedPath::new(Vec::new(), true));
        assert!(empty.is_exhausted());
        assert_eq!(empty.propose_step(Position::new(0, 0)), None);

        let mut single = PathFollower::new(FixedPath::new(vec![Position::new(1, 1)], true));
        assert_eq!(single.propose_step(Position::new(1, 1)), None);
        assert!(single.is_exhausted());

        let mut same = PathFollower::new(FixedPath::new(
            vec![Position::new(1, 1), Position::new(1, 1)],
            true,
        ));
        assert_eq!(same.propose_step(Position::new(1, 1)), None);
    }
}
