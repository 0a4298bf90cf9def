//! Interactive target selection.
//!
//! A [`Targeter`] follows the mouse over the grid, tracks whether the hovered
//! tile is a legal target and accumulates a selection. Targeters are handed
//! to the world's [`TargeterManager`], which promotes at most one at a time
//! and fires the owning script's select or cancel callback once the targeter
//! resolves.

mod area;
mod circle;
mod line;
mod list;
mod manager;

pub use area::{AreaShape, AreaTargeter, PointShape};
pub use circle::CircleShape;
pub use line::LineShape;
pub use list::ListTargeter;
pub use manager::{PollOutcome, TargeterHandle, TargeterManager};

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::grid::{FractionalHex, Position};
use crate::ids::{EntityId, SlotId, TargeterId};
use crate::script::{ScriptFunction, ScriptValue, Scriptable, TargetSelection};
use crate::world::World;

/// What a click would do over the current tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum MouseActionCondition {
    TargetSelect,
    Cancel,
    NoAction,
}

#[derive(Debug)]
pub enum TargeterKind {
    Area(AreaTargeter),
    List(ListTargeter),
}

#[derive(Debug)]
pub struct Targeter {
    pub(crate) id: TargeterId,
    parent: EntityId,
    slot: Option<SlotId>,
    script: Option<Arc<Scriptable>>,
    cancelable: bool,
    min_range: u32,
    max_range: u32,
    allowed: Option<BTreeSet<Position>>,
    mouse_screen: Option<(f32, f32)>,
    mouse_grid: Option<Position>,
    mouse_hover_valid: bool,
    select_callback: String,
    cancel_callback: String,
    extra_args: Vec<ScriptValue>,
    canceled: Arc<AtomicBool>,
    kind: TargeterKind,
}

impl Targeter {
    pub fn new(parent: EntityId, kind: TargeterKind) -> Self {
        Self {
            id: TargeterId(0),
            parent,
            slot: None,
            script: None,
            cancelable: true,
            min_range: 0,
            max_range: u32::MAX,
            allowed: None,
            mouse_screen: None,
            mouse_grid: None,
            mouse_hover_valid: false,
            select_callback: ScriptFunction::OnTargetSelect.name().to_string(),
            cancel_callback: ScriptFunction::OnTargetCancel.name().to_string(),
            extra_args: Vec::new(),
            canceled: Arc::new(AtomicBool::new(false)),
            kind,
        }
    }

    /// Single-tile area targeter.
    pub fn point(parent: EntityId) -> Self {
        Self::area(parent, PointShape)
    }

    pub fn area(parent: EntityId, shape: impl AreaShape + 'static) -> Self {
        Self::new(parent, TargeterKind::Area(AreaTargeter::new(shape)))
    }

    pub fn circle(parent: EntityId, radius: u32) -> Self {
        Self::area(parent, CircleShape::new(radius))
    }

    pub fn line(parent: EntityId, length: u32) -> Self {
        Self::area(parent, LineShape::new(length))
    }

    pub fn list(parent: EntityId, count: usize, unique: bool) -> Self {
        Self::new(parent, TargeterKind::List(ListTargeter::new(count, unique)))
    }

    // ===== builder =====

    pub fn with_slot(mut self, slot: SlotId) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn with_script(mut self, script: Arc<Scriptable>) -> Self {
        self.script = Some(script);
        self
    }

    pub fn cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    pub fn with_range(mut self, min: u32, max: u32) -> Self {
        self.min_range = min;
        self.max_range = max;
        self
    }

    /// Renames the functions run on selection and cancellation.
    pub fn with_callbacks(mut self, select: impl Into<String>, cancel: impl Into<String>) -> Self {
        self.select_callback = select.into();
        self.cancel_callback = cancel.into();
        self
    }

    /// Arguments appended after the selection when callbacks run.
    pub fn with_extra_args(mut self, args: Vec<ScriptValue>) -> Self {
        self.extra_args = args;
        self
    }

    /// Restricts targets to `points`. An empty list allows nothing.
    pub fn with_allowed_points(mut self, points: impl IntoIterator<Item = Position>) -> Self {
        self.allowed = Some(points.into_iter().collect());
        self
    }

    pub fn add_allowed_point(&mut self, point: Position) {
        self.allowed.get_or_insert_with(BTreeSet::new).insert(point);
    }

    // ===== accessors =====

    pub fn id(&self) -> TargeterId {
        self.id
    }

    pub fn parent(&self) -> EntityId {
        self.parent
    }

    pub fn slot(&self) -> Option<SlotId> {
        self.slot
    }

    pub fn script(&self) -> Option<&Arc<Scriptable>> {
        self.script.as_ref()
    }

    pub fn is_cancelable(&self) -> bool {
        self.cancelable
    }

    pub fn mouse_grid(&self) -> Option<Position> {
        self.mouse_grid
    }

    pub fn mouse_hover_valid(&self) -> bool {
        self.mouse_hover_valid
    }

    pub fn kind(&self) -> &TargeterKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut TargeterKind {
        &mut self.kind
    }

    pub(crate) fn select_callback(&self) -> &str {
        &self.select_callback
    }

    pub(crate) fn cancel_callback(&self) -> &str {
        &self.cancel_callback
    }

    pub(crate) fn extra_args(&self) -> &[ScriptValue] {
        &self.extra_args
    }

    pub(crate) fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.canceled)
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    pub(crate) fn request_cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    // ===== mouse =====

    /// Whether `point` is a legal target for this targeter's parent.
    pub fn is_valid_point(&self, world: &World, point: Position) -> bool {
        let Some(parent) = world.creature(self.parent) else {
            return false;
        };
        let area = world.area();
        if !area.is_passable(point) {
            return false;
        }
        if !area.is_visible(parent.position(), point, world.config().sight_radius) {
            return false;
        }
        if parent.is_player_controlled() && !area.is_explored(point) {
            return false;
        }
        let distance = parent.position().distance(point);
        if distance < self.min_range || distance > self.max_range {
            return false;
        }
        self.allowed
            .as_ref()
            .is_none_or(|allowed| allowed.contains(&point))
    }

    /// Moves the mouse to a screen-space point.
    ///
    /// Recomputes hover validity and, for area targeters, the affected set.
    /// Returns whether the hovered grid cell changed.
    pub fn set_mouse_position(&mut self, world: &World, x: f32, y: f32) -> bool {
        let grid = FractionalHex::from_screen(x, y, world.config().tile_size).round();
        let changed = self.mouse_grid != Some(grid);
        self.mouse_screen = Some((x, y));
        self.mouse_grid = Some(grid);
        self.mouse_hover_valid = self.is_valid_point(world, grid);

        if let TargeterKind::Area(area) = &mut self.kind {
            if changed || area.updates_on_every_mouse_move() {
                let origin = world.creature(self.parent).map(|c| c.position());
                match (origin, self.mouse_hover_valid) {
                    (Some(origin), true) => area.compute(world, self.parent, origin, grid, (x, y)),
                    _ => area.clear(),
                }
            }
        }
        changed
    }

    /// Moves the mouse to the center of a tile.
    pub fn hover(&mut self, world: &World, point: Position) -> bool {
        let (x, y) = point.screen_center(world.config().tile_size);
        self.set_mouse_position(world, x, y)
    }

    pub fn mouse_action_condition(&self) -> MouseActionCondition {
        if self.mouse_grid.is_some() && self.mouse_hover_valid {
            MouseActionCondition::TargetSelect
        } else if self.cancelable {
            MouseActionCondition::Cancel
        } else {
            MouseActionCondition::NoAction
        }
    }

    /// Performs the current mouse action.
    pub fn click(&mut self, world: &World) -> MouseActionCondition {
        let condition = self.mouse_action_condition();
        match condition {
            MouseActionCondition::TargetSelect => {
                if let Some(point) = self.mouse_grid {
                    match &mut self.kind {
                        TargeterKind::Area(area) => area.select(),
                        TargeterKind::List(list) => {
                            list.add_point(point, world.creature_at(point).map(|c| c.id()));
                        }
                    }
                }
            }
            MouseActionCondition::Cancel => self.request_cancel(),
            MouseActionCondition::NoAction => {}
        }
        condition
    }

    pub fn has_selected_targets(&self) -> bool {
        match &self.kind {
            TargeterKind::Area(area) => area.is_selected(),
            TargeterKind::List(list) => list.is_complete(),
        }
    }

    /// Snapshot handed to the select and cancel callbacks.
    pub fn selection(&self) -> TargetSelection {
        let (points, creatures) = match &self.kind {
            TargeterKind::Area(area) => (
                area.affected_points().to_vec(),
                area.affected_creatures().to_vec(),
            ),
            TargeterKind::List(list) => (list.points().to_vec(), list.creatures().to_vec()),
        };
        TargetSelection {
            targeter: Some(self.id),
            parent: Some(self.parent),
            slot: self.slot,
            points,
            creatures,
            mouse: self.mouse_grid,
        }
    }
}
