//! Geometry APIs
//!
//! DOMRect used for element boxes and viewport bounds.

/// DOMRect - rectangle geometry
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DOMRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DOMRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn top(&self) -> f32 { self.y }
    pub fn left(&self) -> f32 { self.x }
    pub fn right(&self) -> f32 { self.x + self.width }
    pub fn bottom(&self) -> f32 { self.y + self.height }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Calculate intersection with another rect.
    ///
    /// Edge-adjacent rects intersect with a zero-sized result, matching how
    /// browsers report a zero-area target sitting on the root's edge.
    pub fn intersect(&self, other: &DOMRect) -> Option<DOMRect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right >= x && bottom >= y {
            Some(DOMRect {
                x,
                y,
                width: right - x,
                height: bottom - y,
            })
        } else {
            None
        }
    }

    /// Grow each edge outwards by the given amounts (negative shrinks)
    pub fn expand(&self, top: f32, right: f32, bottom: f32, left: f32) -> DOMRect {
        DOMRect {
            x: self.x - left,
            y: self.y - top,
            width: (self.width + left + right).max(0.0),
            height: (self.height + top + bottom).max(0.0),
        }
    }
}
