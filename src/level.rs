use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use crate::bits::CellSet;
use crate::error::LevelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Floor,
    Box,
    Wall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

impl Direction {
    pub fn delta(&self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Offset between a cell and its neighbour in a row-major grid.
    pub fn offset(&self, columns: usize) -> isize {
        let (dx, dy) = self.delta();
        dx + dy * columns as isize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One parsed Sokoban board.
///
/// The layout is immutable; reachability, position bounds and the box list
/// are derived on first use and cached.
#[derive(Debug, Clone)]
pub struct Level {
    board: Vec<Tile>,
    player: usize,
    goals: BTreeSet<usize>,
    rows: usize,
    columns: usize,
    reachable: OnceLock<CellSet>,
    boxes: OnceLock<Vec<usize>>,
}

impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool {
        self.board == other.board
            && self.player == other.player
            && self.goals == other.goals
            && self.rows == other.rows
            && self.columns == other.columns
    }
}

impl Eq for Level {}

impl Level {
    /// Fails if the board does not hold `rows * columns` tiles or the player
    /// does not stand on floor.
    pub fn new(
        board: Vec<Tile>,
        player: usize,
        goals: BTreeSet<usize>,
        rows: usize,
        columns: usize,
    ) -> Result<Self, LevelError> {
        if board.len() != rows * columns {
            return Err(LevelError::SizeMismatch {
                rows,
                columns,
                tiles: board.len(),
            });
        }
        if board.get(player) != Some(&Tile::Floor) {
            return Err(LevelError::PlayerNotOnFloor { player });
        }
        Ok(Level {
            board,
            player,
            goals,
            rows,
            columns,
            reachable: OnceLock::new(),
            boxes: OnceLock::new(),
        })
    }

    pub fn board(&self) -> &[Tile] {
        &self.board
    }

    pub fn player(&self) -> usize {
        self.player
    }

    pub fn goals(&self) -> &BTreeSet<usize> {
        &self.goals
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn size(&self) -> usize {
        self.rows * self.columns
    }

    pub fn tile(&self, cell: usize) -> Tile {
        self.board[cell]
    }

    pub fn is_wall(&self, cell: usize) -> bool {
        self.board[cell] == Tile::Wall
    }

    /// Cells reachable from the player through non-wall cells. Boxes do not
    /// block reachability since they can be pushed out of the way.
    pub fn reachable_tiles(&self) -> &CellSet {
        self.reachable.get_or_init(|| self.flood_fill())
    }

    pub fn first_pos(&self) -> usize {
        self.reachable_tiles().first().unwrap_or(self.player)
    }

    pub fn last_pos(&self) -> usize {
        self.reachable_tiles().last().unwrap_or(self.player)
    }

    /// Ascending indices of every box on the board.
    pub fn boxes(&self) -> &[usize] {
        self.boxes.get_or_init(|| {
            self.board
                .iter()
                .enumerate()
                .filter(|(_, tile)| **tile == Tile::Box)
                .map(|(cell, _)| cell)
                .collect()
        })
    }

    /// The neighbour of `cell` in direction `dir`, if it lies on the grid.
    pub fn neighbor(&self, cell: usize, dir: Direction) -> Option<usize> {
        let (dx, dy) = dir.delta();
        let x = (cell % self.columns) as isize + dx;
        let y = (cell / self.columns) as isize + dy;

        if x >= 0 && y >= 0 && x < self.columns as isize && y < self.rows as isize {
            Some(y as usize * self.columns + x as usize)
        } else {
            None
        }
    }

    fn flood_fill(&self) -> CellSet {
        let mut reachable = CellSet::with_capacity(self.size());
        let mut stack = vec![self.player];
        reachable.add(self.player);

        while let Some(cell) = stack.pop() {
            for dir in ALL_DIRECTIONS {
                if let Some(next) = self.neighbor(cell, dir) {
                    if !self.is_wall(next) && reachable.add(next) {
                        stack.push(next);
                    }
                }
            }
        }

        reachable
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            let mut line = String::with_capacity(self.columns);
            for col in 0..self.columns {
                let cell = row * self.columns + col;
                let is_goal = self.goals.contains(&cell);

                let ch = match self.board[cell] {
                    Tile::Wall => '#',
                    Tile::Box if is_goal => 'B',
                    Tile::Box => 'b',
                    Tile::Floor if cell == self.player && is_goal => 'P',
                    Tile::Floor if cell == self.player => 'p',
                    Tile::Floor if is_goal => '.',
                    Tile::Floor => '-',
                };
                line.push(ch);
            }
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::levels::parse_levels;

    fn level(text: &str) -> Level {
        parse_levels(text).unwrap().remove(0)
    }

    #[test]
    fn test_reachable_contains_player() {
        let level = level("#####\n#p  #\n# b.#\n#####");
        assert!(level.reachable_tiles().contains(level.player()));
    }

    #[test]
    fn test_boxes_do_not_block_reachability() {
        // The box seals the corridor, but the cell behind it still counts.
        let level = level("######\n#pb .#\n######");
        let cells: Vec<usize> = level.reachable_tiles().iter().collect();
        assert_eq!(cells, vec![7, 8, 9, 10]);
    }

    #[test]
    fn test_reachable_excludes_walled_off_area() {
        let level = level("#####\n#p  #\n#####\n# b.#\n#####");
        assert!(level.reachable_tiles().contains(7));
        assert!(!level.reachable_tiles().contains(16));
        assert!(!level.reachable_tiles().contains(17));
    }

    #[test]
    fn test_reachable_does_not_wrap_rows() {
        // Open right edge on row 1 must not leak into row 2's left edge.
        #[rustfmt::skip]
        let board = vec![
            Tile::Wall, Tile::Wall, Tile::Wall,
            Tile::Wall, Tile::Floor, Tile::Floor,
            Tile::Floor, Tile::Wall, Tile::Wall,
        ];
        let level = Level::new(board, 4, BTreeSet::new(), 3, 3).unwrap();
        let cells: Vec<usize> = level.reachable_tiles().iter().collect();
        assert_eq!(cells, vec![4, 5]);
    }

    #[test]
    fn test_new_rejects_bad_layout() {
        assert_eq!(
            Level::new(vec![Tile::Floor; 5], 0, BTreeSet::new(), 2, 3),
            Err(LevelError::SizeMismatch { rows: 2, columns: 3, tiles: 5 })
        );
        assert_eq!(
            Level::new(vec![Tile::Wall, Tile::Floor], 0, BTreeSet::new(), 1, 2),
            Err(LevelError::PlayerNotOnFloor { player: 0 })
        );
        assert_eq!(
            Level::new(vec![Tile::Floor], 3, BTreeSet::new(), 1, 1),
            Err(LevelError::PlayerNotOnFloor { player: 3 })
        );
    }

    #[test]
    fn test_position_bounds() {
        let level = level("#####\n#p  #\n# b.#\n#####");
        assert_eq!(level.first_pos(), 6);
        assert_eq!(level.last_pos(), 13);
    }

    #[test]
    fn test_boxes_ascending() {
        let level = level("######\n#pb..#\n#  b #\n######");
        assert_eq!(level.boxes(), &[8, 15]);
    }

    #[test]
    fn test_neighbor_bounds() {
        let level = level("####\n#p.#\n#b #\n####");
        assert_eq!(level.neighbor(5, Direction::Right), Some(6));
        assert_eq!(level.neighbor(5, Direction::Down), Some(9));
        assert_eq!(level.neighbor(3, Direction::Right), None);
        assert_eq!(level.neighbor(4, Direction::Left), None);
        assert_eq!(level.neighbor(1, Direction::Up), None);
    }

    #[test]
    fn test_display() {
        let input = "#####\n#p  #\n# b.#\n#####";
        let level = level(input);
        assert_eq!(level.to_string(), "#####\n#p--#\n#-b.#\n#####\n");
    }

    #[test]
    fn test_display_markers_on_goal() {
        let level = level("#####\n#+*$#\n#   #\n#####");
        assert_eq!(level.to_string(), "#####\n#PBb#\n#---#\n#####\n");
    }
}
