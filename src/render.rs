use glam::{Vec2, Vec3};
use image::Rgba;

use crate::bitmap::Bitmap;
use crate::error::RenderError;
use crate::framing::CameraPlacement;
use crate::lighting::LightingSpec;
use crate::scene::GeometrySource;

/// Largest square output a renderer accepts.
pub const MAX_TEXTURE_SIZE: u32 = 8192;

/// Produces a square, transparent-background image of one render set.
pub trait Renderer {
    fn render(
        &mut self,
        set: &dyn GeometrySource,
        placement: &CameraPlacement,
        lighting: &LightingSpec,
        size: u32,
    ) -> Result<Bitmap, RenderError>;
}

/// CPU rasterizer with a depth buffer and flat per-face shading.
#[derive(Debug, Default)]
pub struct SoftwareRenderer {
    depth: Vec<f32>,
}

impl SoftwareRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for SoftwareRenderer {
    fn render(
        &mut self,
        set: &dyn GeometrySource,
        placement: &CameraPlacement,
        lighting: &LightingSpec,
        size: u32,
    ) -> Result<Bitmap, RenderError> {
        if size == 0 || size > MAX_TEXTURE_SIZE {
            return Err(RenderError::InvalidSize(size));
        }
        if !placement.is_valid() {
            return Err(RenderError::InvalidPlacement(format!(
                "position {:?}, half-height {}",
                placement.position, placement.half_height
            )));
        }
        let triangles = set.world_triangles();
        if triangles.is_empty() {
            return Err(RenderError::EmptyRenderSet);
        }

        let pixels = size as usize * size as usize;
        self.depth.clear();
        self.depth.resize(pixels, f32::INFINITY);
        let mut image = Bitmap::new(size, size);

        let half_height = placement.half_height;
        let scale = size as f32 / (2.0 * half_height);
        let forward = placement.forward();
        let origin = placement.position + forward * placement.distance;

        for triangle in &triangles {
            let [a, b, c] = triangle.vertices;
            let mut normal = (b - a).cross(c - a).normalize_or_zero();
            if normal == Vec3::ZERO {
                continue;
            }
            if normal.dot(forward) > 0.0 {
                normal = -normal;
            }
            let centroid = (a + b + c) / 3.0;
            let light = lighting.shade(centroid, normal, origin);
            let color = (triangle.color * light).clamp(Vec3::ZERO, Vec3::ONE);
            let pixel = Rgba([color.x, color.y, color.z, 1.0]);

            let screen = triangle.vertices.map(|vertex| {
                let view = placement.to_view(vertex);
                Vec3::new(
                    (view.x + half_height) * scale,
                    (half_height - view.y) * scale,
                    -view.z,
                )
            });
            self.rasterize(&mut image, screen, pixel);
        }

        Ok(image)
    }
}

impl SoftwareRenderer {
    fn rasterize(&mut self, image: &mut Bitmap, screen: [Vec3; 3], pixel: Rgba<f32>) {
        let size = image.width();
        let [a, b, c] = screen;
        let area = edge(a.truncate(), b.truncate(), c.truncate());
        if area.abs() <= f32::EPSILON {
            return;
        }

        let lo = a.min(b).min(c);
        let hi = a.max(b).max(c);
        let max_index = (size - 1) as f32;
        if hi.x < 0.0 || hi.y < 0.0 || lo.x > max_index + 1.0 || lo.y > max_index + 1.0 {
            return;
        }
        let x0 = lo.x.floor().clamp(0.0, max_index) as u32;
        let x1 = hi.x.ceil().clamp(0.0, max_index) as u32;
        let y0 = lo.y.floor().clamp(0.0, max_index) as u32;
        let y1 = hi.y.ceil().clamp(0.0, max_index) as u32;

        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(b.truncate(), c.truncate(), p) / area;
                let w1 = edge(c.truncate(), a.truncate(), p) / area;
                let w2 = edge(a.truncate(), b.truncate(), p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let depth = w0 * a.z + w1 * b.z + w2 * c.z;
                if depth < 0.0 {
                    continue;
                }
                let index = y as usize * size as usize + x as usize;
                if depth < self.depth[index] {
                    self.depth[index] = depth;
                    image.put_pixel(x, y, pixel);
                }
            }
        }
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b - a).perp_dot(p - a)
}
