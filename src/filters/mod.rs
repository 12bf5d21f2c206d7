//! Pixel reconstruction filters.

// spica
use crate::core::base::Float;
use crate::core::geometry::Point2f;

#[derive(Debug, Copy, Clone)]
pub enum Filter {
    BoxFilter(BoxFilter),
    Triangle(TriangleFilter),
}

impl Filter {
    pub fn radius(&self) -> Float {
        match self {
            Filter::BoxFilter(f) => f.radius,
            Filter::Triangle(f) => f.radius,
        }
    }
    /// Filter weight at offset `p` from the filter center.
    pub fn evaluate(&self, p: &Point2f) -> Float {
        match self {
            Filter::BoxFilter(_) => 1.0 as Float,
            Filter::Triangle(f) => {
                (f.radius - p.x.abs()).max(0.0 as Float)
                    * (f.radius - p.y.abs()).max(0.0 as Float)
            }
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::BoxFilter(BoxFilter { radius: 0.5 })
    }
}

#[derive(Debug, Copy, Clone)]
pub struct BoxFilter {
    pub radius: Float,
}

#[derive(Debug, Copy, Clone)]
pub struct TriangleFilter {
    pub radius: Float,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_falls_off_to_zero() {
        let f = Filter::Triangle(TriangleFilter { radius: 1.0 });
        assert!(f.evaluate(&Point2f { x: 0.0, y: 0.0 }) > 0.99);
        assert_eq!(f.evaluate(&Point2f { x: 1.0, y: 0.0 }), 0.0);
        assert_eq!(f.evaluate(&Point2f { x: 2.0, y: 0.5 }), 0.0);
    }
}
