use std::fmt::Debug;

use crate::grid::{AreaDimensions, Position};
use crate::ids::EntityId;
use crate::world::{Relationship, World};

/// Geometry of an area targeter.
pub trait AreaShape: Send + Debug {
    /// Tiles covered when `origin` aims at `mouse`. Out-of-bounds tiles are
    /// dropped by the caller; shapes only use `bounds` to limit their reach.
    fn compute(
        &self,
        origin: Position,
        mouse: Position,
        screen: (f32, f32),
        tile_size: f32,
        bounds: AreaDimensions,
    ) -> Vec<Position>;

    /// Shapes that depend on the exact screen point recompute on every move,
    /// not only when the hovered tile changes.
    fn updates_on_every_mouse_move(&self) -> bool {
        false
    }
}

/// Just the hovered tile.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointShape;

impl AreaShape for PointShape {
    fn compute(
        &self,
        _origin: Position,
        mouse: Position,
        _screen: (f32, f32),
        _tile_size: f32,
        _bounds: AreaDimensions,
    ) -> Vec<Position> {
        vec![mouse]
    }
}

/// Selects every tile and creature under a shape.
#[derive(Debug)]
pub struct AreaTargeter {
    shape: Box<dyn AreaShape>,
    relationship: Option<Relationship>,
    allow_friendly_fire: bool,
    affected_points: Vec<Position>,
    affected_creatures: Vec<EntityId>,
    selected: bool,
}

impl AreaTargeter {
    pub fn new(shape: impl AreaShape + 'static) -> Self {
        Self {
            shape: Box::new(shape),
            relationship: None,
            allow_friendly_fire: false,
            affected_points: Vec::new(),
            affected_creatures: Vec::new(),
            selected: false,
        }
    }

    /// Only creatures standing in `relationship` to the parent are affected.
    pub fn set_relationship(&mut self, relationship: Option<Relationship>) {
        self.relationship = relationship;
    }

    pub fn set_allow_friendly_fire(&mut self, allow: bool) {
        self.allow_friendly_fire = allow;
    }

    pub fn affected_points(&self) -> &[Position] {
        &self.affected_points
    }

    pub fn affected_creatures(&self) -> &[EntityId] {
        &self.affected_creatures
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn select(&mut self) {
        self.selected = true;
    }

    pub(crate) fn updates_on_every_mouse_move(&self) -> bool {
        self.shape.updates_on_every_mouse_move()
    }

    pub(crate) fn clear(&mut self) {
        self.affected_points.clear();
        self.affected_creatures.clear();
    }

    pub(crate) fn compute(
        &mut self,
        world: &World,
        parent: EntityId,
        origin: Position,
        mouse: Position,
        screen: (f32, f32),
    ) {
        let area = world.area();
        self.affected_points = self
            .shape
            .compute(origin, mouse, screen, world.config().tile_size, area.dimensions())
            .into_iter()
            .filter(|p| area.contains(*p))
            .collect();

        let Some(parent) = world.creature(parent) else {
            self.affected_creatures.clear();
            return;
        };
        let factions = world.factions();
        let player_faction = world.config().player_faction.as_str();
        self.affected_creatures = self
            .affected_points
            .iter()
            .filter_map(|p| world.creature_at(*p))
            .filter(|target| {
                let relationship = factions.relationship(parent.faction(), target.faction());
                match self.relationship {
                    Some(wanted) => relationship == wanted,
                    None => {
                        self.allow_friendly_fire
                            || target.faction() != player_faction
                            || relationship != Relationship::Friendly
                    }
                }
            })
            .map(|c| c.id())
            .collect();
    }
}
