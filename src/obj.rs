use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Triangle mesh in model space.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    /// Three indices per triangle into `positions`.
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Unit cube centered on the origin.
    pub fn cube() -> Self {
        let positions = vec![
            Vec3::new(-0.5, -0.5, -0.5),
            Vec3::new(0.5, -0.5, -0.5),
            Vec3::new(0.5, 0.5, -0.5),
            Vec3::new(-0.5, 0.5, -0.5),
            Vec3::new(-0.5, -0.5, 0.5),
            Vec3::new(0.5, -0.5, 0.5),
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(-0.5, 0.5, 0.5),
        ];
        let indices = vec![
            4, 5, 6, 4, 6, 7, // front
            1, 0, 3, 1, 3, 2, // back
            0, 4, 7, 0, 7, 3, // left
            5, 1, 2, 5, 2, 6, // right
            0, 1, 5, 0, 5, 4, // bottom
            7, 6, 2, 7, 2, 3, // top
        ];
        Self { positions, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterates triangles as position triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ]
        })
    }
}

/// Parses an OBJ file from memory.
///
/// Only positions and faces are read; polygons are fan triangulated.
pub fn load_obj_from_str(data: &str) -> Result<Mesh> {
    let mut positions = Vec::new();
    let mut polygons: Vec<Vec<i32>> = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        match tag {
            "v" => positions.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid vertex on line {}", line_no + 1))?,
            ),
            "f" => polygons.push(
                parse_face(parts)
                    .with_context(|| format!("invalid face on line {}", line_no + 1))?,
            ),
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(anyhow!("OBJ file does not define any vertices"));
    }

    let mut indices = Vec::new();
    for polygon in &polygons {
        let resolved = polygon
            .iter()
            .map(|&index| {
                fix_index(index, positions.len())
                    .map(|i| i as u32)
                    .ok_or_else(|| anyhow!("vertex index {index} is out of range"))
            })
            .collect::<Result<Vec<u32>>>()?;
        for i in 1..(resolved.len() - 1) {
            indices.extend_from_slice(&[resolved[0], resolved[i], resolved[i + 1]]);
        }
    }

    Ok(Mesh { positions, indices })
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let mut next = || -> Result<f32> {
        Ok(parts
            .next()
            .ok_or_else(|| anyhow!("missing vector component"))?
            .parse::<f32>()?)
    };
    let x = next()?;
    let y = next()?;
    let z = next()?;
    Ok(Vec3::new(x, y, z))
}

/// Reads the position index of every `v`, `v/vt`, `v//vn` or `v/vt/vn` entry.
fn parse_face<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<i32>> {
    let mut indices = Vec::new();
    for part in parts {
        let position = part
            .split('/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("missing vertex index"))?
            .parse::<i32>()?;
        indices.push(position);
    }
    if indices.len() < 3 {
        return Err(anyhow!("faces must reference at least 3 vertices"));
    }
    Ok(indices)
}

fn fix_index(index: i32, len: usize) -> Option<usize> {
    if index > 0 {
        let zero_based = index as usize - 1;
        (zero_based < len).then_some(zero_based)
    } else if index < 0 {
        let abs = index.unsigned_abs() as usize;
        (abs <= len).then_some(len - abs)
    } else {
        None
    }
}
