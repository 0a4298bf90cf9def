use crate::grid::Position;
use crate::ids::EntityId;

/// Accumulates `count` clicked tiles, optionally refusing repeats.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListTargeter {
    count: usize,
    unique: bool,
    points: Vec<Position>,
    creatures: Vec<EntityId>,
}

impl ListTargeter {
    pub fn new(count: usize, unique: bool) -> Self {
        Self {
            count,
            unique,
            points: Vec::with_capacity(count),
            creatures: Vec::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn points(&self) -> &[Position] {
        &self.points
    }

    /// Creatures standing on the chosen points when they were chosen.
    pub fn creatures(&self) -> &[EntityId] {
        &self.creatures
    }

    pub fn is_complete(&self) -> bool {
        self.points.len() >= self.count
    }

    pub(crate) fn add_point(&mut self, point: Position, creature: Option<EntityId>) -> bool {
        if self.is_complete() || (self.unique && self.points.contains(&point)) {
            return false;
        }
        self.points.push(point);
        self.creatures.extend(creature);
        true
    }
}
