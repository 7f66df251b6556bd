use crate::expr::{Expr, and, eq, ite, or, var};
use crate::level::{Level, Tile};
use crate::model::{Assignment, Variable};

pub const POSITION: &str = "position";

/// How box occupancy is represented in the generated state space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingKind {
    /// One boolean per reachable cell.
    Tile,
    /// One bounded position variable per movable box.
    Box,
}

/// Answers "is there a box at X" and "move the box from X to Y" for one
/// state representation.
pub trait Encoding {
    /// Box state variables; the player position is declared separately.
    fn variables(&self) -> Vec<Variable>;

    /// Holds iff a box stands on `cell`.
    fn occupied(&self, cell: usize) -> Expr;

    /// Moves the box on `to`, if there is one, to `beyond`. Leaves the state
    /// untouched when `to` is empty.
    fn shove(&self, to: usize, beyond: usize) -> Vec<Assignment>;

    /// Ways of sliding one box from `from` to `to`: a condition picking the
    /// box that stands on `from` and the updates that move it.
    fn slides(&self, from: usize, to: usize) -> Vec<(Expr, Vec<Assignment>)>;

    /// Holds iff every goal is covered by a box.
    fn goal(&self) -> Expr;
}

fn static_box(level: &Level, cell: usize) -> Expr {
    Expr::Bool(level.tile(cell) == Tile::Box)
}

pub struct TileEncoding<'a> {
    level: &'a Level,
}

impl<'a> TileEncoding<'a> {
    pub fn new(level: &'a Level) -> Self {
        TileEncoding { level }
    }

    fn name(cell: usize) -> String {
        format!("box_{}", cell)
    }
}

impl Encoding for TileEncoding<'_> {
    fn variables(&self) -> Vec<Variable> {
        self.level
            .reachable_tiles()
            .iter()
            .map(|cell| Variable::boolean(Self::name(cell), self.level.tile(cell) == Tile::Box))
            .collect()
    }

    fn occupied(&self, cell: usize) -> Expr {
        if self.level.reachable_tiles().contains(cell) {
            var(Self::name(cell))
        } else {
            static_box(self.level, cell)
        }
    }

    fn shove(&self, to: usize, beyond: usize) -> Vec<Assignment> {
        vec![
            Assignment::new(Self::name(to), false),
            Assignment::new(
                Self::name(beyond),
                or([self.occupied(to), self.occupied(beyond)]),
            ),
        ]
    }

    fn slides(&self, from: usize, to: usize) -> Vec<(Expr, Vec<Assignment>)> {
        vec![(
            self.occupied(from),
            vec![
                Assignment::new(Self::name(from), false),
                Assignment::new(Self::name(to), true),
            ],
        )]
    }

    fn goal(&self) -> Expr {
        and(self.level.goals().iter().map(|&goal| self.occupied(goal)))
    }
}

/// Boxes outside the reachable region never move and get no variable.
pub struct BoxEncoding<'a> {
    level: &'a Level,
    movable: Vec<usize>,
}

impl<'a> BoxEncoding<'a> {
    pub fn new(level: &'a Level) -> Self {
        let reachable = level.reachable_tiles();
        let movable = level
            .boxes()
            .iter()
            .copied()
            .filter(|&cell| reachable.contains(cell))
            .collect();
        BoxEncoding { level, movable }
    }

    fn name(index: usize) -> String {
        format!("box_{}", index)
    }

    fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        0..self.movable.len()
    }
}

impl Encoding for BoxEncoding<'_> {
    fn variables(&self) -> Vec<Variable> {
        self.movable
            .iter()
            .enumerate()
            .map(|(i, &cell)| {
                Variable::bounded(
                    Self::name(i),
                    self.level.first_pos(),
                    self.level.last_pos(),
                    cell,
                )
            })
            .collect()
    }

    fn occupied(&self, cell: usize) -> Expr {
        if self.level.reachable_tiles().contains(cell) {
            or(self.indices().map(|i| eq(var(Self::name(i)), cell)))
        } else {
            static_box(self.level, cell)
        }
    }

    fn shove(&self, to: usize, beyond: usize) -> Vec<Assignment> {
        self.indices()
            .map(|i| {
                let name = Self::name(i);
                Assignment::new(name.clone(), ite(eq(var(name.clone()), to), beyond, var(name)))
            })
            .collect()
    }

    fn slides(&self, from: usize, to: usize) -> Vec<(Expr, Vec<Assignment>)> {
        self.indices()
            .map(|i| {
                (
                    eq(var(Self::name(i)), from),
                    vec![Assignment::new(Self::name(i), to)],
                )
            })
            .collect()
    }

    /// Boxes are interchangeable, so the goal holds when some choice of
    /// distinct movable boxes covers every goal not already covered by a
    /// static box. Surplus boxes may stand anywhere. This is factorial in
    /// the box count.
    fn goal(&self) -> Expr {
        let reachable = self.level.reachable_tiles();
        let open: Vec<usize> = self
            .level
            .goals()
            .iter()
            .copied()
            .filter(|&goal| self.level.tile(goal) != Tile::Box || reachable.contains(goal))
            .collect();

        if open.len() > self.movable.len() || open.iter().any(|&goal| !reachable.contains(goal))
        {
            return Expr::Bool(false);
        }

        let boxes: Vec<usize> = self.indices().collect();
        or(arrangements(&boxes, open.len()).into_iter().map(|chosen| {
            let mut pairs: Vec<(usize, usize)> =
                chosen.into_iter().zip(open.iter().copied()).collect();
            pairs.sort_unstable();
            and(pairs.into_iter().map(|(i, goal)| eq(var(Self::name(i)), goal)))
        }))
    }
}

/// Every ordered choice of `k` distinct elements of `items`, in
/// lexicographic order of positions. With `k == items.len()` these are the
/// permutations.
fn arrangements(items: &[usize], k: usize) -> Vec<Vec<usize>> {
    if k == 0 {
        return vec![Vec::new()];
    }

    let mut result = Vec::new();
    for (idx, &head) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(idx);
        for mut tail in arrangements(&rest, k - 1) {
            tail.insert(0, head);
            result.push(tail);
        }
    }
    result
}

/// Wraps every update so it only takes effect when `cond` holds.
pub fn conditional(cond: &Expr, assignments: Vec<Assignment>) -> Vec<Assignment> {
    assignments
        .into_iter()
        .map(|a| {
            let current = var(a.var.clone());
            Assignment {
                value: ite(cond.clone(), a.value, current),
                var: a.var,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::expr::not;
    use crate::levels::parse_levels;

    fn level(text: &str) -> Level {
        parse_levels(text).unwrap().remove(0)
    }

    const TWO_BOXES: &str = "######\n#pb..#\n#  b #\n######";

    #[test]
    fn test_tile_variables() {
        let level = level("#####\n#p  #\n# b.#\n#####");
        let encoding = TileEncoding::new(&level);
        let vars = encoding.variables();
        assert_eq!(vars.len(), 6);
        assert_eq!(vars[4], Variable::boolean("box_12", true));
        assert_eq!(vars[0], Variable::boolean("box_6", false));
    }

    #[test]
    fn test_tile_goal_is_conjunction() {
        let level = level(TWO_BOXES);
        let encoding = TileEncoding::new(&level);
        assert_eq!(encoding.goal(), and([var("box_9"), var("box_10")]));
    }

    #[test]
    fn test_tile_shove() {
        let level = level("#####\n#p  #\n# b.#\n#####");
        let encoding = TileEncoding::new(&level);
        assert_eq!(
            encoding.shove(12, 13),
            vec![
                Assignment::new("box_12", false),
                Assignment::new("box_13", or([var("box_12"), var("box_13")])),
            ]
        );
    }

    #[test]
    fn test_box_variables() {
        let level = level(TWO_BOXES);
        let encoding = BoxEncoding::new(&level);
        assert_eq!(
            encoding.variables(),
            vec![
                Variable::bounded("box_0", 7, 16, 8),
                Variable::bounded("box_1", 7, 16, 15),
            ]
        );
    }

    #[test]
    fn test_box_occupied_tests_every_box() {
        let level = level(TWO_BOXES);
        let encoding = BoxEncoding::new(&level);
        assert_eq!(
            encoding.occupied(9),
            or([eq(var("box_0"), 9usize), eq(var("box_1"), 9usize)])
        );
    }

    #[test]
    fn test_box_goal_accepts_either_assignment() {
        let level = level(TWO_BOXES);
        let encoding = BoxEncoding::new(&level);
        let expected = or([
            and([eq(var("box_0"), 9usize), eq(var("box_1"), 10usize)]),
            and([eq(var("box_0"), 10usize), eq(var("box_1"), 9usize)]),
        ]);
        assert_eq!(encoding.goal(), expected);
    }

    #[test]
    fn test_box_shove_identifies_box() {
        let level = level(TWO_BOXES);
        let encoding = BoxEncoding::new(&level);
        let shoved = encoding.shove(9, 10);
        assert_eq!(
            shoved[1],
            Assignment::new("box_1", ite(eq(var("box_1"), 9usize), 10usize, var("box_1")))
        );
    }

    #[test]
    fn test_static_boxes_and_goals() {
        // The lower chamber is sealed off: its box on a goal never moves.
        let level = level("#####\n#pb.#\n#####\n#*  #\n#####");
        let box_encoding = BoxEncoding::new(&level);
        assert_eq!(box_encoding.variables().len(), 1);
        assert_eq!(box_encoding.goal(), eq(var("box_0"), 8usize));

        let tile_encoding = TileEncoding::new(&level);
        assert_eq!(tile_encoding.goal(), var("box_8"));
    }

    #[test]
    fn test_unreachable_goal_is_unsatisfiable() {
        let level = level("#####\n#pb.#\n#####\n#b. #\n#####");
        assert_eq!(BoxEncoding::new(&level).goal(), Expr::Bool(false));
        assert_eq!(TileEncoding::new(&level).goal(), Expr::Bool(false));
    }

    #[test]
    fn test_arrangements() {
        assert_eq!(arrangements(&[], 0), vec![Vec::<usize>::new()]);
        assert_eq!(
            arrangements(&[1, 2, 3], 3),
            vec![
                vec![1, 2, 3],
                vec![1, 3, 2],
                vec![2, 1, 3],
                vec![2, 3, 1],
                vec![3, 1, 2],
                vec![3, 2, 1],
            ]
        );
        assert_eq!(arrangements(&[0, 1, 2], 1), vec![vec![0], vec![1], vec![2]]);
        assert!(arrangements(&[0], 2).is_empty());
    }

    #[test]
    fn test_surplus_boxes_can_reach_goal() {
        let level = level("#######\n#pb b.#\n#######");
        assert_eq!(
            BoxEncoding::new(&level).goal(),
            or([eq(var("box_0"), 12usize), eq(var("box_1"), 12usize)])
        );
        assert_eq!(TileEncoding::new(&level).goal(), var("box_12"));
    }

    #[test]
    fn test_missing_boxes_cannot_reach_goal() {
        let level = level("######\n#pb..#\n######");
        assert_eq!(BoxEncoding::new(&level).goal(), Expr::Bool(false));
    }

    #[test]
    fn test_conditional_updates() {
        let cond = not(var("box_7"));
        let wrapped = conditional(&cond, vec![Assignment::new("position", 7usize)]);
        assert_eq!(
            wrapped,
            vec![Assignment::new(
                "position",
                ite(not(var("box_7")), 7usize, var("position"))
            )]
        );
    }
}
