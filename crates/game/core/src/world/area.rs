use std::collections::BTreeMap;

use crate::effect::{EffectTarget, EntityEffectSet};
use crate::grid::{AreaDimensions, Position};
use crate::ids::EffectId;

/// Tile flags of the current area plus its own effects and aura bookkeeping.
#[derive(Clone, Debug)]
pub struct Area {
    dimensions: AreaDimensions,
    passable: Vec<bool>,
    opaque: Vec<bool>,
    explored: Vec<bool>,
    effects: EntityEffectSet,
    auras: BTreeMap<EffectId, Vec<Position>>,
}

impl Area {
    /// Open area: every tile passable, transparent and unexplored.
    pub fn new(dimensions: AreaDimensions) -> Self {
        let len = dimensions.len();
        Self {
            dimensions,
            passable: vec![true; len],
            opaque: vec![false; len],
            explored: vec![false; len],
            effects: EntityEffectSet::new(),
            auras: BTreeMap::new(),
        }
    }

    pub fn dimensions(&self) -> AreaDimensions {
        self.dimensions
    }

    pub fn contains(&self, position: Position) -> bool {
        self.dimensions.contains(position)
    }

    fn flag(flags: &[bool], dimensions: AreaDimensions, position: Position) -> bool {
        dimensions
            .index(position)
            .and_then(|i| flags.get(i).copied())
            .unwrap_or(false)
    }

    fn set_flag(flags: &mut [bool], dimensions: AreaDimensions, position: Position, value: bool) {
        if let Some(flag) = dimensions.index(position).and_then(|i| flags.get_mut(i)) {
            *flag = value;
        }
    }

    pub fn is_passable(&self, position: Position) -> bool {
        Self::flag(&self.passable, self.dimensions, position)
    }

    pub fn set_passable(&mut self, position: Position, passable: bool) {
        Self::set_flag(&mut self.passable, self.dimensions, position, passable);
    }

    pub fn is_opaque(&self, position: Position) -> bool {
        Self::flag(&self.opaque, self.dimensions, position)
    }

    pub fn set_opaque(&mut self, position: Position, opaque: bool) {
        Self::set_flag(&mut self.opaque, self.dimensions, position, opaque);
    }

    pub fn is_explored(&self, position: Position) -> bool {
        Self::flag(&self.explored, self.dimensions, position)
    }

    pub fn set_explored(&mut self, position: Position, explored: bool) {
        Self::set_flag(&mut self.explored, self.dimensions, position, explored);
    }

    pub fn explore_all(&mut self) {
        self.explored.fill(true);
    }

    /// Line of sight: within `sight_radius` and no opaque tile strictly
    /// between the two points.
    pub fn is_visible(&self, from: Position, to: Position, sight_radius: u32) -> bool {
        if !self.contains(to) || from.distance(to) > sight_radius {
            return false;
        }
        let line = from.line_to(to);
        let interior = line.len().saturating_sub(1);
        line.iter()
            .take(interior)
            .skip(1)
            .all(|p| !self.is_opaque(*p))
    }

    // ===== aura bookkeeping =====

    /// Records the points an aura currently covers, replacing earlier ones.
    pub(crate) fn register_aura(&mut self, aura: EffectId, points: Vec<Position>) -> Vec<Position> {
        self.auras.insert(aura, points).unwrap_or_default()
    }

    pub(crate) fn deregister_aura(&mut self, aura: EffectId) -> Option<Vec<Position>> {
        self.auras.remove(&aura)
    }

    pub fn aura_points(&self, aura: EffectId) -> Option<&[Position]> {
        self.auras.get(&aura).map(Vec::as_slice)
    }

    /// Registered auras covering `position`.
    pub fn auras_at(&self, position: Position) -> Vec<EffectId> {
        self.auras
            .iter()
            .filter(|(_, points)| points.contains(&position))
            .map(|(id, _)| *id)
            .collect()
    }

    pub(crate) fn registered_auras(&self) -> impl Iterator<Item = (EffectId, &[Position])> {
        self.auras.iter().map(|(id, points)| (*id, points.as_slice()))
    }
}

impl EffectTarget for Area {
    fn effects(&self) -> &EntityEffectSet {
        &self.effects
    }

    fn effects_mut(&mut self) -> &mut EntityEffectSet {
        &mut self.effects
    }

    fn position(&self) -> Option<Position> {
        None
    }

    fn is_valid_effect_target(&self) -> bool {
        true
    }
}
