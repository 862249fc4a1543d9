use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Axis aligned box expressed in a rotated reference frame.
///
/// `min` and `max` are coordinates in the frame described by `frame`; a frame
/// of [`Quat::IDENTITY`] means world space. Boxes computed by the framer use
/// the camera orientation so that the box always lines up with what the
/// camera sees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
    pub frame: Quat,
}

impl BoundingBox {
    /// Zero sized box centered on a world-space point.
    pub fn degenerate(center: Vec3, frame: Quat) -> Self {
        let local = frame.inverse() * center;
        Self {
            min: local,
            max: local,
            frame,
        }
    }

    /// Builds a box in `frame` around the given world-space points.
    ///
    /// Returns `None` when the iterator yields nothing.
    pub fn from_points<I>(points: I, frame: Quat) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let to_local = frame.inverse();
        let mut points = points.into_iter();
        let first = to_local * points.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
            frame,
        };
        for point in points {
            bounds.expand_local(to_local * point);
        }
        Some(bounds)
    }

    /// Grows the box to include a point already expressed in the box frame.
    pub fn expand_local(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Extent along each frame axis.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn is_degenerate(&self) -> bool {
        self.size() == Vec3::ZERO
    }

    /// Center of the box in world space.
    pub fn center(&self) -> Vec3 {
        self.frame * ((self.min + self.max) * 0.5)
    }

    /// World-space position of the `min` corner.
    pub fn world_min(&self) -> Vec3 {
        self.frame * self.min
    }

    /// World-space position of the `max` corner.
    pub fn world_max(&self) -> Vec3 {
        self.frame * self.max
    }
}
