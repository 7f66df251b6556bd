use arrayvec::ArrayVec;

use crate::level::{ALL_DIRECTIONS, Direction, Level};

/// What the player does when heading in one direction from one cell. Which
/// variant applies is fixed by the layout; whether a box actually sits in the
/// way is only known at run time and ends up in the generated guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Only the neighbour is reachable: walk there when it is free.
    Move { from: usize, to: usize },
    /// The neighbour and the cell behind it are reachable: walk onto the
    /// neighbour, shoving a box that stands there one cell further.
    Push { from: usize, to: usize, beyond: usize },
}

/// The two outcomes a [`Step::Push`] can have at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// Walk onto a free cell.
    Walk { to: usize },
    /// Walk onto an occupied cell, moving its box to the free cell behind.
    Shove { to: usize, beyond: usize },
}

impl Step {
    pub fn from(&self) -> usize {
        match *self {
            Step::Move { from, .. } | Step::Push { from, .. } => from,
        }
    }

    pub fn motions(&self) -> ArrayVec<Motion, 2> {
        let mut motions = ArrayVec::new();
        match *self {
            Step::Move { to, .. } => motions.push(Motion::Walk { to }),
            Step::Push { to, beyond, .. } => {
                motions.push(Motion::Walk { to });
                motions.push(Motion::Shove { to, beyond });
            }
        }
        motions
    }
}

/// Numeric range of start cells `c` for which every `c + k * offset`,
/// `k` in `1..=reach`, stays inside the board, clipped to the reachable
/// span. A negative offset tightens the lower bound, a positive one the upper.
fn move_bounds(level: &Level, offset: isize, reach: usize) -> (usize, usize) {
    let span = offset.unsigned_abs() * reach;
    if offset < 0 {
        (span.max(level.first_pos()), level.last_pos() + 1)
    } else {
        (
            level.first_pos(),
            level.size().saturating_sub(span).min(level.last_pos() + 1),
        )
    }
}

/// Start cells from which the `reach` cells ahead in direction `dir` are all
/// reachable.
///
/// This is the intersection of the numeric bounds above with reachability of
/// the start cell and of every cell ahead. Horizontal runs must additionally
/// stay inside the start cell's row.
pub fn valid_starts(level: &Level, dir: Direction, reach: usize) -> Vec<usize> {
    let offset = dir.offset(level.columns());
    let (start, end) = move_bounds(level, offset, reach);
    let reachable = level.reachable_tiles();
    let (dx, _) = dir.delta();

    (start..end)
        .filter(|&cell| {
            let column = (cell % level.columns()) as isize;
            (0..=reach).all(|k| {
                let ahead = cell as isize + offset * k as isize;
                let ahead_column = column + dx * k as isize;
                ahead_column >= 0
                    && ahead_column < level.columns() as isize
                    && reachable.contains(ahead as usize)
            })
        })
        .collect()
}

/// Every step in one direction, ascending by start cell.
pub fn steps(level: &Level, dir: Direction) -> Vec<Step> {
    let offset = dir.offset(level.columns());
    let pushes = valid_starts(level, dir, 2);
    let mut pushes = pushes.iter().peekable();

    valid_starts(level, dir, 1)
        .into_iter()
        .map(|from| {
            let to = (from as isize + offset) as usize;
            // Push starts are a subset of move starts, both ascending.
            if pushes.next_if(|&&p| p == from).is_some() {
                let beyond = (to as isize + offset) as usize;
                Step::Push { from, to, beyond }
            } else {
                Step::Move { from, to }
            }
        })
        .collect()
}

/// Steps grouped by start cell: for every reachable cell, in ascending order,
/// the step in each direction that has one.
pub fn step_table(level: &Level) -> Vec<(usize, ArrayVec<(Direction, Step), 4>)> {
    let by_direction: Vec<(Direction, Vec<Step>)> = ALL_DIRECTIONS
        .iter()
        .map(|&dir| (dir, steps(level, dir)))
        .collect();
    let mut cursors = [0usize; 4];

    level
        .reachable_tiles()
        .iter()
        .map(|cell| {
            let mut row = ArrayVec::new();
            for (idx, (dir, steps)) in by_direction.iter().enumerate() {
                if let Some(step) = steps.get(cursors[idx]) {
                    if step.from() == cell {
                        row.push((*dir, *step));
                        cursors[idx] += 1;
                    }
                }
            }
            (cell, row)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeSet;

    use crate::level::Tile;
    use crate::levels::parse_levels;

    fn level(text: &str) -> Level {
        parse_levels(text).unwrap().remove(0)
    }

    const SMALL: &str = "#####\n#p  #\n# b.#\n#####";

    #[test]
    fn test_move_bounds() {
        let level = level(SMALL);
        // Reachable span is 6..=13 on a 4x5 board.
        assert_eq!(move_bounds(&level, -5, 1), (6, 14));
        assert_eq!(move_bounds(&level, -5, 2), (10, 14));
        assert_eq!(move_bounds(&level, 5, 2), (6, 10));
        assert_eq!(move_bounds(&level, 1, 1), (6, 14));
    }

    #[test]
    fn test_valid_starts_right() {
        let level = level(SMALL);
        assert_eq!(valid_starts(&level, Direction::Right, 1), vec![6, 7, 11, 12]);
        assert_eq!(valid_starts(&level, Direction::Right, 2), vec![6, 11]);
    }

    #[test]
    fn test_valid_starts_vertical() {
        let level = level(SMALL);
        assert_eq!(valid_starts(&level, Direction::Down, 1), vec![6, 7, 8]);
        assert_eq!(valid_starts(&level, Direction::Down, 2), Vec::<usize>::new());
        assert_eq!(valid_starts(&level, Direction::Up, 1), vec![11, 12, 13]);
    }

    #[test]
    fn test_steps_right() {
        let level = level(SMALL);
        assert_eq!(
            steps(&level, Direction::Right),
            vec![
                Step::Push { from: 6, to: 7, beyond: 8 },
                Step::Move { from: 7, to: 8 },
                Step::Push { from: 11, to: 12, beyond: 13 },
                Step::Move { from: 12, to: 13 },
            ]
        );
    }

    #[test]
    fn test_steps_left() {
        let level = level(SMALL);
        assert_eq!(
            steps(&level, Direction::Left),
            vec![
                Step::Move { from: 7, to: 6 },
                Step::Push { from: 8, to: 7, beyond: 6 },
                Step::Move { from: 12, to: 11 },
                Step::Push { from: 13, to: 12, beyond: 11 },
            ]
        );
    }

    #[test]
    fn test_steps_do_not_wrap_rows() {
        // Row 0 is open on the right and row 1 open on the left; cells 2 and
        // 3 are numerically adjacent but not neighbours.
        #[rustfmt::skip]
        let board = vec![
            Tile::Wall, Tile::Floor, Tile::Floor,
            Tile::Floor, Tile::Floor, Tile::Wall,
            Tile::Wall, Tile::Wall, Tile::Wall,
        ];
        let level = Level::new(board, 1, BTreeSet::new(), 3, 3).unwrap();
        assert_eq!(level.reachable_tiles().len(), 4);
        assert_eq!(
            steps(&level, Direction::Right),
            vec![Step::Move { from: 1, to: 2 }, Step::Move { from: 3, to: 4 }]
        );
        assert_eq!(
            steps(&level, Direction::Left),
            vec![Step::Move { from: 2, to: 1 }, Step::Move { from: 4, to: 3 }]
        );
    }

    #[test]
    fn test_step_table() {
        let level = level(SMALL);
        let table = step_table(&level);
        assert_eq!(table.len(), 6);

        let (cell, row) = &table[3];
        assert_eq!(*cell, 11);
        assert_eq!(
            row.as_slice(),
            &[
                (Direction::Up, Step::Move { from: 11, to: 6 }),
                (Direction::Right, Step::Push { from: 11, to: 12, beyond: 13 }),
            ]
        );
    }

    #[test]
    fn test_push_motions() {
        let push = Step::Push { from: 11, to: 12, beyond: 13 };
        assert_eq!(
            push.motions().as_slice(),
            &[Motion::Walk { to: 12 }, Motion::Shove { to: 12, beyond: 13 }]
        );
        let walk = Step::Move { from: 7, to: 8 };
        assert_eq!(walk.motions().as_slice(), &[Motion::Walk { to: 8 }]);
    }
}
