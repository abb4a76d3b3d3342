//! Static maze geometry parsed from the classic text layout format.

use super::direction::Direction;
use super::position::Position;
use core::fmt;

/// Immutable maze description. Row zero of the source text is the northern edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    width: usize,
    height: usize,
    walls: Vec<bool>,
    legal_positions: Vec<Position>,
    pacman_start: Position,
    ghost_starts: Vec<Position>,
}

impl Layout {
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let rows: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .collect();
        if rows.is_empty() {
            return Err(LayoutError::Empty);
        }

        let width = rows[0].chars().count();
        let height = rows.len();
        let mut walls = vec![false; width * height];
        let mut pacman_start = None;
        let mut ghost_starts = Vec::new();

        for (row_index, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(LayoutError::RaggedRow {
                    row: row_index,
                    expected: width,
                    found,
                });
            }

            let y = (height - 1 - row_index) as i32;
            for (x, glyph) in row.chars().enumerate() {
                let pos = Position::new(x as i32, y);
                match glyph {
                    '%' => walls[y as usize * width + x] = true,
                    'P' => {
                        if pacman_start.replace(pos).is_some() {
                            return Err(LayoutError::DuplicatePacman { at: pos });
                        }
                    }
                    'G' => ghost_starts.push(pos),
                    '.' | 'o' | ' ' => {}
                    other => {
                        return Err(LayoutError::UnknownGlyph {
                            glyph: other,
                            at: pos,
                        });
                    }
                }
            }
        }

        let pacman_start = pacman_start.ok_or(LayoutError::MissingPacman)?;
        ghost_starts.sort();

        let mut legal_positions = Vec::new();
        for x in 0..width {
            for y in 0..height {
                if !walls[y * width + x] {
                    legal_positions.push(Position::new(x as i32, y as i32));
                }
            }
        }

        Ok(Self {
            width,
            height,
            walls,
            legal_positions,
            pacman_start,
            ghost_starts,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    /// Off-grid cells count as walls.
    pub fn is_wall(&self, pos: Position) -> bool {
        match self.index_of(pos) {
            Some(index) => self.walls[index],
            None => true,
        }
    }

    /// Every non-wall cell, in ascending `Position` order.
    pub fn legal_positions(&self) -> &[Position] {
        &self.legal_positions
    }

    pub fn pacman_start(&self) -> Position {
        self.pacman_start
    }

    pub fn ghost_starts(&self) -> &[Position] {
        &self.ghost_starts
    }

    pub fn num_ghosts(&self) -> usize {
        self.ghost_starts.len()
    }

    /// Cardinal moves into open cells, followed by `Stop`.
    pub fn legal_actions(&self, pos: Position) -> Vec<Direction> {
        let mut actions: Vec<Direction> = Direction::CARDINAL
            .into_iter()
            .filter(|direction| !self.is_wall(pos.step(*direction)))
            .collect();
        actions.push(Direction::Stop);
        actions
    }

    pub(crate) fn index_of(&self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some(pos.y as usize * self.width + pos.x as usize)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    Empty,
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    UnknownGlyph {
        glyph: char,
        at: Position,
    },
    MissingPacman,
    DuplicatePacman {
        at: Position,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::Empty => f.write_str("layout contains no rows"),
            LayoutError::RaggedRow {
                row,
                expected,
                found,
            } => write!(f, "layout row {row} has {found} cells, expected {expected}"),
            LayoutError::UnknownGlyph { glyph, at } => {
                write!(f, "unknown layout glyph '{glyph}' at {at}")
            }
            LayoutError::MissingPacman => f.write_str("layout has no pacman start ('P')"),
            LayoutError::DuplicatePacman { at } => {
                write!(f, "second pacman start found at {at}")
            }
        }
    }
}

impl std::error::Error for LayoutError {}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "\
%%%%%
%P. %
% %G%
%%%%%
";

    #[test]
    fn parses_dimensions_and_starts() {
        let layout = Layout::parse(SMALL).expect("valid layout");
        assert_eq!(layout.width(), 5);
        assert_eq!(layout.height(), 4);
        assert_eq!(layout.pacman_start(), Position::new(1, 2));
        assert_eq!(layout.ghost_starts(), &[Position::new(3, 1)]);
    }

    #[test]
    fn legal_positions_exclude_walls_and_are_sorted() {
        let layout = Layout::parse(SMALL).expect("valid layout");
        let legal = layout.legal_positions();
        assert_eq!(
            legal,
            &[
                Position::new(1, 1),
                Position::new(1, 2),
                Position::new(2, 2),
                Position::new(3, 1),
                Position::new(3, 2),
            ]
        );
        assert!(legal.iter().all(|pos| !layout.is_wall(*pos)));
    }

    #[test]
    fn legal_actions_always_allow_stop() {
        let layout = Layout::parse(SMALL).expect("valid layout");
        let actions = layout.legal_actions(Position::new(1, 2));
        assert_eq!(
            actions,
            vec![Direction::South, Direction::East, Direction::Stop]
        );
    }

    #[test]
    fn off_grid_is_wall() {
        let layout = Layout::parse(SMALL).expect("valid layout");
        assert!(layout.is_wall(Position::new(-1, 0)));
        assert!(layout.is_wall(Position::new(0, 10)));
    }

    #[test]
    fn rejects_malformed_text() {
        assert_eq!(Layout::parse("\n\n"), Err(LayoutError::Empty));
        assert!(matches!(
            Layout::parse("%%%\n%P\n%%%"),
            Err(LayoutError::RaggedRow { row: 1, .. })
        ));
        assert!(matches!(
            Layout::parse("%%%\n%X%\n%%%"),
            Err(LayoutError::UnknownGlyph { glyph: 'X', .. })
        ));
        assert_eq!(
            Layout::parse("%%%\n%G%\n%%%"),
            Err(LayoutError::MissingPacman)
        );
        assert!(matches!(
            Layout::parse("%%%%\n%PP%\n%%%%"),
            Err(LayoutError::DuplicatePacman { .. })
        ));
    }

    #[test]
    fn all_open_rows_are_kept() {
        let layout = Layout::parse("%P G%\r\n     \r\n%%%%%\r\n").expect("valid layout");
        assert_eq!(layout.height(), 3);
        assert_eq!(layout.width(), 5);
        assert_eq!(layout.pacman_start(), Position::new(1, 2));
        assert!(!layout.is_wall(Position::new(0, 1)));
        assert!(!layout.is_wall(Position::new(4, 1)));
        assert_eq!(layout.legal_positions().len(), 8);
    }
}
