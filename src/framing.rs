//! Orthographic camera framing.
//!
//! Framing is split in two steps. [`compute_bounds`] measures the target in
//! the camera's own frame, so the box depends on the viewing direction and not
//! on how the object happens to be rotated. [`compute_placement`] then turns
//! that box into a camera position and orthographic size.

use glam::{EulerRot, Quat, Vec3};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::bounds::BoundingBox;
use crate::error::FramingError;
use crate::scene::GeometrySource;

/// Extra distance kept between the camera and the front of the bounds.
pub const CLEARANCE: f32 = 10.0;
/// Camera never sits closer to the bounds center than this.
pub const MIN_DISTANCE: f32 = 1.0;
/// Upper clamp for the padding fraction.
pub const MAX_PADDING: f32 = 0.999;
/// Smallest orthographic half-height handed to a renderer.
pub const MIN_HALF_HEIGHT: f32 = 1e-4;

/// Converts authoring Euler angles (degrees) into a rotation.
///
/// Angles follow the left-handed, Y-up convention of the authoring tools
/// (applied Z, then X, then Y) and are mirrored into this crate's
/// right-handed world where cameras look down -Z.
pub fn rotation_from_euler(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        -degrees.y.to_radians(),
        -degrees.x.to_radians(),
        degrees.z.to_radians(),
    )
}

/// Requested view of a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewpointSpec {
    /// Euler angles in degrees.
    #[serde(default = "default_rotation")]
    pub rotation: Vec3,
    /// Fraction of the frame kept empty around the target.
    #[serde(default = "default_padding")]
    pub padding: f32,
}

impl Default for ViewpointSpec {
    fn default() -> Self {
        Self {
            rotation: default_rotation(),
            padding: default_padding(),
        }
    }
}

impl ViewpointSpec {
    pub fn orientation(&self) -> Quat {
        rotation_from_euler(self.rotation)
    }

    /// Padding clamped into `[0, MAX_PADDING]`; NaN counts as no padding.
    pub fn clamped_padding(&self) -> f32 {
        if self.padding.is_nan() {
            0.0
        } else {
            self.padding.clamp(0.0, MAX_PADDING)
        }
    }
}

fn default_rotation() -> Vec3 {
    Vec3::new(45.0, -45.0, 0.0)
}

fn default_padding() -> f32 {
    0.1
}

/// Where an orthographic camera sits and how much it sees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPlacement {
    pub position: Vec3,
    pub orientation: Quat,
    /// Orthographic half-height ("orthographic size").
    pub half_height: f32,
    /// Distance from `position` to the framed center.
    pub distance: f32,
}

impl Default for CameraPlacement {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            half_height: 1.0,
            distance: MIN_DISTANCE,
        }
    }
}

impl CameraPlacement {
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    /// World point in camera space: +X right, +Y up, -Z in front.
    pub fn to_view(&self, point: Vec3) -> Vec3 {
        self.orientation.inverse() * (point - self.position)
    }

    pub fn is_valid(&self) -> bool {
        self.position.is_finite()
            && self.orientation.is_finite()
            && self.half_height.is_finite()
            && self.half_height > 0.0
    }
}

/// Bounds of `vertices` measured along the axes of a camera with `orientation`.
///
/// An empty vertex set yields a degenerate box at `fallback`, which callers
/// treat as "nothing to frame".
pub fn compute_bounds<I>(vertices: I, orientation: Quat, fallback: Vec3) -> BoundingBox
where
    I: IntoIterator<Item = Vec3>,
{
    BoundingBox::from_points(vertices, orientation)
        .unwrap_or_else(|| BoundingBox::degenerate(fallback, orientation))
}

/// Camera placement that fits `bounds` into the frame for `viewpoint`.
pub fn compute_placement(bounds: &BoundingBox, viewpoint: &ViewpointSpec) -> CameraPlacement {
    let orientation = viewpoint.orientation();
    let to_camera = orientation.inverse();
    let min = to_camera * bounds.world_min();
    let max = to_camera * bounds.world_max();
    let extent = (max - min).abs();

    let distance = (extent.z * 0.5 + CLEARANCE).max(MIN_DISTANCE);
    let center = bounds.center();
    let position = center - orientation * Vec3::NEG_Z * distance;

    let padding = viewpoint.clamped_padding();
    let largest = extent.x.max(extent.y);
    let half_height = (largest / (2.0 * (1.0 - padding))).max(MIN_HALF_HEIGHT);

    debug!(
        "framed bounds extent=({:.3}, {:.3}, {:.3}) distance={distance:.3} half_height={half_height:.4}",
        extent.x, extent.y, extent.z
    );

    CameraPlacement {
        position,
        orientation,
        half_height,
        distance,
    }
}

/// Owns the framing camera and fits it to one target at a time.
#[derive(Debug, Clone)]
pub struct ViewFramer {
    camera: Option<CameraPlacement>,
}

impl Default for ViewFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewFramer {
    /// Framer with a camera resting at the origin.
    pub fn new() -> Self {
        Self {
            camera: Some(CameraPlacement::default()),
        }
    }

    /// Framer without a camera; every framing call fails until one is attached.
    pub fn detached() -> Self {
        Self { camera: None }
    }

    pub fn attach_camera(&mut self, camera: CameraPlacement) {
        self.camera = Some(camera);
    }

    pub fn camera(&self) -> Option<&CameraPlacement> {
        self.camera.as_ref()
    }

    /// Measures `target` from `viewpoint` and moves the camera to frame it.
    pub fn frame<G>(
        &mut self,
        target: &G,
        viewpoint: &ViewpointSpec,
    ) -> Result<CameraPlacement, FramingError>
    where
        G: GeometrySource + ?Sized,
    {
        let camera = self.camera.ok_or(FramingError::CameraNotFound)?;
        if !target.has_visible_geometry() {
            return Err(FramingError::EmptyGeometry(target.name().to_string()));
        }
        if !viewpoint.rotation.is_finite() {
            return Err(FramingError::NonFinite("camera rotation"));
        }

        let vertices = target.world_vertices();
        if vertices.iter().any(|vertex| !vertex.is_finite()) {
            return Err(FramingError::NonFinite("target vertices"));
        }

        let bounds = compute_bounds(vertices, viewpoint.orientation(), camera.position);
        let placement = compute_placement(&bounds, viewpoint);
        self.camera = Some(placement);
        Ok(placement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_vertices(center: Vec3, half: Vec3) -> Vec<Vec3> {
        let mut out = Vec::new();
        for x in [-1.0, 1.0] {
            for y in [-1.0, 1.0] {
                for z in [-1.0, 1.0] {
                    out.push(center + half * Vec3::new(x, y, z));
                }
            }
        }
        out
    }

    fn projected_half_extent(vertices: &[Vec3], placement: &CameraPlacement) -> f32 {
        let mut lo = Vec3::splat(f32::INFINITY);
        let mut hi = Vec3::splat(f32::NEG_INFINITY);
        for vertex in vertices {
            let local = placement.to_view(*vertex);
            lo = lo.min(local);
            hi = hi.max(local);
        }
        let extent = hi - lo;
        extent.x.max(extent.y) * 0.5
    }

    #[test]
    fn default_view_looks_down_at_the_target() {
        let forward = rotation_from_euler(Vec3::new(45.0, -45.0, 0.0)) * Vec3::NEG_Z;
        assert!(forward.y < -0.5);
        assert!(forward.x < 0.0 && forward.z < 0.0);
    }

    #[test]
    fn bounds_are_ordered_for_any_orientation() {
        let vertices = vec![
            Vec3::new(3.0, -1.0, 2.0),
            Vec3::new(-4.0, 0.5, 7.0),
            Vec3::new(0.1, 9.0, -3.0),
            Vec3::new(1.0, 1.0, 1.0),
        ];
        for step in 0..24 {
            let angle = step as f32 * 15.0;
            let rotation = Vec3::new(angle, angle * 0.5 - 90.0, angle * 0.25);
            let bounds = compute_bounds(vertices.clone(), rotation_from_euler(rotation), Vec3::ZERO);
            assert!(bounds.min.cmple(bounds.max).all(), "rotation {rotation:?}");
        }
    }

    #[test]
    fn empty_vertices_give_degenerate_bounds_at_fallback() {
        let fallback = Vec3::new(1.0, 2.0, 3.0);
        let bounds = compute_bounds(Vec::new(), Quat::from_rotation_y(0.3), fallback);
        assert!(bounds.is_degenerate());
        assert!(bounds.center().abs_diff_eq(fallback, 1e-5));
    }

    #[test]
    fn placement_fits_with_requested_padding() {
        let vertices = cube_vertices(Vec3::new(2.0, 1.0, -3.0), Vec3::new(1.0, 0.5, 2.0));
        for padding in [0.0, 0.1, 0.25, 0.45] {
            let viewpoint = ViewpointSpec {
                rotation: Vec3::new(30.0, 60.0, 10.0),
                padding,
            };
            let bounds = compute_bounds(vertices.clone(), viewpoint.orientation(), Vec3::ZERO);
            let placement = compute_placement(&bounds, &viewpoint);
            let half_extent = projected_half_extent(&vertices, &placement);
            assert!(half_extent <= placement.half_height + 1e-4);
            assert!(half_extent >= placement.half_height * (1.0 - padding - 1e-3));
        }
    }

    #[test]
    fn zero_padding_fits_edge_to_edge() {
        let vertices = cube_vertices(Vec3::ZERO, Vec3::new(2.0, 1.0, 0.5));
        let viewpoint = ViewpointSpec {
            rotation: Vec3::ZERO,
            padding: 0.0,
        };
        let bounds = compute_bounds(vertices, viewpoint.orientation(), Vec3::ZERO);
        let placement = compute_placement(&bounds, &viewpoint);
        assert!((placement.half_height - 2.0).abs() < 1e-5);
    }

    #[test]
    fn flat_target_respects_distance_floor() {
        let vertices = vec![
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let viewpoint = ViewpointSpec {
            rotation: Vec3::ZERO,
            padding: 0.1,
        };
        let bounds = compute_bounds(vertices, viewpoint.orientation(), Vec3::ZERO);
        let placement = compute_placement(&bounds, &viewpoint);
        assert!(placement.distance >= MIN_DISTANCE);
        assert!((placement.position - bounds.center()).length() >= MIN_DISTANCE);
        // Camera looks down -Z, so it sits on the +Z side of the target.
        assert!(placement.position.z > 0.0);
    }

    #[test]
    fn degenerate_bounds_get_positive_size() {
        let bounds = BoundingBox::degenerate(Vec3::ONE, Quat::IDENTITY);
        let placement = compute_placement(&bounds, &ViewpointSpec::default());
        assert!(placement.half_height >= MIN_HALF_HEIGHT);
        assert!(placement.is_valid());
    }

    #[test]
    fn frame_reports_missing_camera_and_empty_targets() {
        use std::sync::Arc;

        use crate::obj::Mesh;
        use crate::scene::{MeshInstance, Target};

        let cube = Target::new("Cube").with_mesh(MeshInstance::new(Arc::new(Mesh::cube())));
        let viewpoint = ViewpointSpec::default();

        let mut framer = ViewFramer::detached();
        assert_eq!(
            framer.frame(&cube, &viewpoint),
            Err(FramingError::CameraNotFound)
        );

        framer.attach_camera(CameraPlacement::default());
        assert_eq!(
            framer.frame(&Target::new("Empty"), &viewpoint),
            Err(FramingError::EmptyGeometry("Empty".to_string()))
        );
        let placement = framer.frame(&cube, &viewpoint).unwrap();
        assert_eq!(framer.camera(), Some(&placement));
    }

    #[test]
    fn padding_is_clamped() {
        let spec = ViewpointSpec {
            rotation: Vec3::ZERO,
            padding: 3.0,
        };
        assert_eq!(spec.clamped_padding(), MAX_PADDING);
        let spec = ViewpointSpec {
            rotation: Vec3::ZERO,
            padding: -0.5,
        };
        assert_eq!(spec.clamped_padding(), 0.0);
    }
}
