use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::error::ParseError;
use crate::level::{Level, Tile};
use crate::rle;

/// Lines starting with this marker are comments and removed before scanning.
const COMMENT_PREFIX: &str = "::";

/// Separates several board rows written on one line.
const ROW_SEPARATOR: char = '|';

fn is_filler(ch: char) -> bool {
    matches!(ch, ' ' | '-' | '_')
}

fn is_board_char(ch: char) -> bool {
    matches!(
        ch,
        '#' | '@' | 'p' | '+' | 'P' | '$' | 'b' | '*' | 'B' | '.' | '(' | ')' | ROW_SEPARATOR
    ) || is_filler(ch)
        || ch.is_ascii_digit()
}

/// Rows must start and end with a wall or a box on a goal once the filler
/// around them is trimmed. This separates board rows from surrounding prose;
/// it is an approximation and rejects boards whose outer rows are ragged in
/// other ways.
fn is_board_row(row: &str) -> bool {
    let trimmed = row.trim_matches(is_filler);
    let edge = |ch: Option<char>| matches!(ch, Some('#' | '*' | 'B'));
    edge(trimmed.chars().next()) && edge(trimmed.chars().last())
}

/// Decode one input line into board rows, or `None` if it is not part of a
/// board.
fn board_rows(line: &str, line_num: usize) -> Result<Option<Vec<String>>, ParseError> {
    if line.trim().is_empty() || !line.chars().all(is_board_char) {
        return Ok(None);
    }

    let decoded = rle::decode(line).map_err(|source| ParseError::Rle {
        line: line_num,
        source,
    })?;
    if decoded.is_empty() {
        return Ok(None);
    }

    let mut rows: Vec<String> = decoded.split(ROW_SEPARATOR).map(str::to_string).collect();
    // `#-#|` and `2(#-#|)` end in a separator with nothing after it.
    if rows.len() > 1 && rows.last().is_some_and(|row| row.is_empty()) {
        rows.pop();
    }
    if rows.iter().all(|row| is_board_row(row)) {
        Ok(Some(rows))
    } else {
        Ok(None)
    }
}

/// Parse every level in a document of Sokoban boards.
///
/// Characters:
/// - `#` = Wall
/// - ` `, `-`, `_` = Floor
/// - `.` = Goal
/// - `$`, `b` = Box
/// - `*`, `B` = Box on goal
/// - `@`, `p` = Player
/// - `+`, `P` = Player on goal
///
/// Rows may be run-length encoded and several rows may share a line when
/// separated by `|`. Titles and other prose between boards are skipped.
///
/// A board without exactly one player is skipped with a warning. Box and
/// goal counts need not match.
pub fn parse_levels(text: &str) -> Result<Vec<Level>, ParseError> {
    let mut levels = Vec::new();
    let mut blocks = 0;
    let mut current: Vec<String> = Vec::new();

    let mut finish = |rows: &mut Vec<String>, levels: &mut Vec<Level>| {
        blocks += 1;
        match build_level(rows, blocks) {
            Ok(level) => levels.push(level),
            Err(err) => warn!("skipping board: {}", err),
        }
        rows.clear();
    };

    for (idx, line) in text.lines().enumerate() {
        // Skip comment lines
        if line.trim_start().starts_with(COMMENT_PREFIX) {
            continue;
        }

        match board_rows(line, idx + 1)? {
            Some(rows) => current.extend(rows),
            None => {
                if !current.is_empty() {
                    finish(&mut current, &mut levels);
                }
            }
        }
    }

    // Don't forget the last level if the text doesn't end with a separator
    if !current.is_empty() {
        finish(&mut current, &mut levels);
    }

    if levels.is_empty() {
        return Err(ParseError::NoLevels);
    }

    debug!(count = levels.len(), boards = blocks, "parsed levels");
    Ok(levels)
}

fn build_level(rows: &[String], level_num: usize) -> Result<Level, ParseError> {
    let invalid = |reason: String| ParseError::InvalidLevel {
        level: level_num,
        reason,
    };

    let height = rows.len();
    let width = rows
        .iter()
        .map(|row| row.trim_end_matches(is_filler).chars().count())
        .max()
        .unwrap_or(0);

    let mut board = vec![Tile::Floor; width * height];
    let mut player = None;
    let mut goals = BTreeSet::new();

    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.trim_end_matches(is_filler).chars().enumerate() {
            let cell = y * width + x;
            match ch {
                '#' => board[cell] = Tile::Wall,
                ' ' | '-' | '_' => board[cell] = Tile::Floor,
                '.' => {
                    goals.insert(cell);
                }
                '$' | 'b' => {
                    board[cell] = Tile::Box;
                }
                '*' | 'B' => {
                    board[cell] = Tile::Box;
                    goals.insert(cell);
                }
                '@' | 'p' | '+' | 'P' => {
                    if player.is_some() {
                        return Err(invalid("multiple players found".to_string()));
                    }
                    player = Some(cell);
                    if ch == '+' || ch == 'P' {
                        goals.insert(cell);
                    }
                }
                _ => {
                    return Err(invalid(format!(
                        "invalid character '{}' at position ({}, {})",
                        ch, x, y
                    )));
                }
            }
        }
    }

    let player = player.ok_or_else(|| invalid("no player found on board".to_string()))?;

    Level::new(board, player, goals, height, width).map_err(|err| invalid(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_level() {
        let levels = parse_levels("#####\n#p  #\n# b.#\n#####").unwrap();
        assert_eq!(levels.len(), 1);

        let level = &levels[0];
        assert_eq!(level.rows(), 4);
        assert_eq!(level.columns(), 5);
        assert_eq!(level.player(), 6);
        assert_eq!(level.boxes(), &[12]);
        assert_eq!(level.goals().iter().copied().collect::<Vec<_>>(), vec![13]);
    }

    #[test]
    fn test_parse_multiple_levels_with_prose() {
        let text = "Microban\n\
                    \n\
                    Level 1\n\
                    ####\n\
                    #p.#\n\
                    #b #\n\
                    ####\n\
                    Author: someone\n\
                    \n\
                    Level 2\n\
                    ######\n\
                    #@$ .#\n\
                    ######\n";

        let levels = parse_levels(text).unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].columns(), 4);
        assert_eq!(levels[1].rows(), 3);
        assert_eq!(levels[1].player(), 7);
        assert_eq!(levels[1].boxes(), &[8]);
    }

    #[test]
    fn test_parse_strips_comments() {
        let text = ":: generated by hand\n####\n:: mid-board note\n#p.#\n#b #\n####";
        let levels = parse_levels(text).unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].rows(), 4);
    }

    #[test]
    fn test_parse_pads_ragged_rows() {
        let text = "  ####\n###  ####\n#     $ #\n# #  #$ #\n# . .#@ #\n#########";
        let levels = parse_levels(text).unwrap();
        let level = &levels[0];
        assert_eq!(level.columns(), 9);
        assert_eq!(level.rows(), 6);
        assert_eq!(level.board().len(), 54);
        // Leading indentation and right padding are floor.
        assert_eq!(level.tile(0), Tile::Floor);
        assert_eq!(level.tile(8), Tile::Floor);
    }

    #[test]
    fn test_parse_run_length_encoded() {
        let plain = parse_levels("#####\n#p  #\n# b.#\n#####").unwrap();
        let encoded = parse_levels("5#\n#p2-#\n#-b.#\n5#").unwrap();
        assert_eq!(plain, encoded);
    }

    #[test]
    fn test_parse_row_separator() {
        let plain = parse_levels("#####\n#p  #\n# b.#\n#####").unwrap();
        let packed = parse_levels("5#|#p2-#|#-b.#|5#").unwrap();
        assert_eq!(plain, packed);
    }

    #[test]
    fn test_parse_grouped_rows() {
        let plain = parse_levels("#####\n#p  #\n#   #\n#   #\n# b.#\n#####").unwrap();
        let grouped = parse_levels("5#|#p2-#|2(#3-#|)#-b.#|5#").unwrap();
        assert_eq!(plain, grouped);
    }

    #[test]
    fn test_parse_box_on_goal_edges() {
        let levels = parse_levels("*###\n#p #\n####").unwrap();
        assert_eq!(levels[0].boxes(), &[0]);
        assert!(levels[0].goals().contains(&0));
    }

    #[test]
    fn test_parse_player_on_goal() {
        let levels = parse_levels("#####\n#+b #\n#####").unwrap();
        assert_eq!(levels[0].player(), 6);
        assert!(levels[0].goals().contains(&6));
        assert_eq!(levels[0].tile(6), Tile::Floor);
    }

    #[test]
    fn test_parse_unbalanced_group() {
        let result = parse_levels("5#\n#p2(-#\n#-b.#\n5#");
        assert!(matches!(
            result,
            Err(ParseError::Rle {
                line: 2,
                source: crate::error::RleError::UnbalancedGroup { .. }
            })
        ));
    }

    #[test]
    fn test_parse_unbalanced_group_without_board() {
        assert!(parse_levels("3(ab").is_err());
    }

    #[test]
    fn test_parse_no_levels() {
        assert_eq!(parse_levels(""), Err(ParseError::NoLevels));
        assert_eq!(
            parse_levels("just some words\nand more"),
            Err(ParseError::NoLevels)
        );
    }

    #[test]
    fn test_parse_no_player() {
        assert_eq!(parse_levels("####\n#b.#\n####"), Err(ParseError::NoLevels));
        assert_eq!(
            build_level(&["####".into(), "#b.#".into(), "####".into()], 4),
            Err(ParseError::InvalidLevel {
                level: 4,
                reason: "no player found on board".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_skips_invalid_board() {
        let text = "#####\n#pb.#\n#####\n\n#####\n#pp #\n#####\n\n####\n#p #\n####";
        let levels = parse_levels(text).unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[1].columns(), 4);
    }

    #[test]
    fn test_parse_keeps_unequal_box_and_goal_counts() {
        let text = "#####\n#pb.#\n#####\n\n#####\n#p..#\n# b #\n#####\n\n#####\n#pbb#\n# . #\n#####";
        let levels = parse_levels(text).unwrap();
        assert_eq!(levels.len(), 3);
        assert_eq!((levels[1].boxes().len(), levels[1].goals().len()), (1, 2));
        assert_eq!((levels[2].boxes().len(), levels[2].goals().len()), (2, 1));
    }

    #[test]
    fn test_parse_trailing_row_separator() {
        let plain = parse_levels("#####\n#pb.#\n#####").unwrap();
        assert_eq!(parse_levels("5#|#pb.#|5#|").unwrap(), plain);
        assert_eq!(parse_levels("5#|#pb.#|\n5#").unwrap(), plain);
    }

    #[test]
    fn test_parse_line_ending_in_grouped_rows() {
        let plain = parse_levels("######\n#p b.#\n#----#\n#----#\n######").unwrap();
        let grouped = parse_levels("6#|#p-b.#|2(#4-#|)\n6#").unwrap();
        assert_eq!(grouped, plain);
    }

    #[test]
    fn test_parse_huge_count_is_an_error() {
        assert_eq!(
            parse_levels("#p.b#\n99999999999999999999999(#)\n"),
            Err(ParseError::Rle {
                line: 2,
                source: crate::error::RleError::CountTooLarge { column: 0 },
            })
        );
    }

    #[test]
    fn test_board_row_heuristic() {
        assert!(is_board_row("  #  #"));
        assert!(is_board_row("*--#"));
        assert!(is_board_row("#"));
        assert!(!is_board_row("--p#"));
        assert!(!is_board_row("   "));
        assert!(!is_board_row(""));
    }
}
