use super::area::AreaShape;
use crate::grid::{AreaDimensions, Position};

/// Filled hex disc centered on the hovered tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CircleShape {
    radius: u32,
}

impl CircleShape {
    pub fn new(radius: u32) -> Self {
        Self { radius }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }
}

impl AreaShape for CircleShape {
    fn compute(
        &self,
        _origin: Position,
        mouse: Position,
        _screen: (f32, f32),
        _tile_size: f32,
        bounds: AreaDimensions,
    ) -> Vec<Position> {
        mouse.rings(0, self.radius.min(bounds.diagonal()))
    }
}
