use super::area::AreaShape;
use crate::grid::{AreaDimensions, FractionalHex, Position};

/// Straight line of `length` tiles from the parent toward the exact mouse
/// point, extending past it if needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineShape {
    length: u32,
}

impl LineShape {
    pub fn new(length: u32) -> Self {
        Self { length }
    }

    pub fn length(&self) -> u32 {
        self.length
    }
}

impl AreaShape for LineShape {
    fn compute(
        &self,
        origin: Position,
        _mouse: Position,
        screen: (f32, f32),
        tile_size: f32,
        bounds: AreaDimensions,
    ) -> Vec<Position> {
        let start = FractionalHex::from_position(origin);
        let end = FractionalHex::from_screen(screen.0, screen.1, tile_size);
        let span = start.distance(end);
        // Aiming inside the origin tile gives no usable direction.
        if span < 0.5 {
            return Vec::new();
        }

        // Past the diagonal every tile is out of bounds anyway.
        let length = self.length.min(bounds.diagonal()) as usize;
        let mut points: Vec<Position> = Vec::with_capacity(length);
        let mut step = 1;
        while points.len() < length {
            let point = start.lerp(end, step as f32 / span).round();
            step += 1;
            if point != origin && points.last() != Some(&point) {
                points.push(point);
            }
        }
        points
    }

    fn updates_on_every_mouse_move(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: AreaDimensions = AreaDimensions::new(10, 10);

    #[test]
    fn line_extends_past_the_mouse() {
        let origin = Position::new(3, 1);
        let target = Position::new(3, 4);
        let (x, y) = target.screen_center(36.0);

        let short = LineShape::new(3).compute(origin, target, (x, y), 36.0, BOUNDS);
        assert_eq!(short, vec![Position::new(3, 2), Position::new(3, 3), target]);

        let long = LineShape::new(5).compute(origin, target, (x, y), 36.0, BOUNDS);
        assert_eq!(long.len(), 5);
        assert_eq!(long[4], Position::new(3, 6));
    }

    #[test]
    fn length_is_limited_by_the_area() {
        let origin = Position::new(3, 1);
        let (x, y) = Position::new(3, 4).screen_center(36.0);

        let points = LineShape::new(u32::MAX).compute(origin, origin, (x, y), 36.0, BOUNDS);
        assert_eq!(points.len(), BOUNDS.diagonal() as usize);
        assert!(points.iter().any(|p| !BOUNDS.contains(*p)));
    }

    #[test]
    fn aiming_at_yourself_selects_nothing() {
        let origin = Position::new(2, 2);
        let (x, y) = origin.screen_center(36.0);
        assert!(LineShape::new(4).compute(origin, origin, (x, y), 36.0, BOUNDS).is_empty());
    }
}
