use super::direction::Direction;
use super::layout::Layout;
use super::position::Position;

/// Per-turn snapshot handed to an agent. Adversary positions are never exposed.
#[derive(Debug, Clone, Copy)]
pub struct GameView<'a> {
    pub layout: &'a Layout,
    pub pacman_position: Position,
    pub pacman_direction: Direction,
    pub legal_actions: &'a [Direction],
    /// Liveness per adversary, indexed from zero.
    pub living_ghosts: &'a [bool],
    /// Noisy sonar reading per adversary; `None` when captured or unobservable.
    pub noisy_distances: &'a [Option<u32>],
    /// True maze distance per adversary; `None` when captured or unobservable.
    pub ghost_distances: &'a [Option<u32>],
}

impl<'a> GameView<'a> {
    pub fn num_ghosts(&self) -> usize {
        self.living_ghosts.len()
    }

    pub fn is_legal(&self, action: Direction) -> bool {
        self.legal_actions.contains(&action)
    }

    pub fn noisy_distance(&self, ghost_index: usize) -> Option<u32> {
        self.noisy_distances.get(ghost_index).copied().flatten()
    }

    pub fn is_ghost_alive(&self, ghost_index: usize) -> bool {
        self.living_ghosts.get(ghost_index).copied().unwrap_or(false)
    }

    /// Legal cardinal moves in `Direction::CARDINAL` order.
    pub fn legal_cardinals(&self) -> Vec<Direction> {
        Direction::CARDINAL
            .into_iter()
            .filter(|direction| self.is_legal(*direction))
            .collect()
    }
}
