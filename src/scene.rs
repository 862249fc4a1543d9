use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::{Affine3A, Vec3};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::error::FramingError;
use crate::framing::rotation_from_euler;
use crate::obj::{load_obj_from_str, Mesh};

/// Supplies world-space geometry for one render set.
pub trait GeometrySource {
    fn name(&self) -> &str;

    /// Every vertex of every mesh, in world space.
    fn world_vertices(&self) -> Vec<Vec3>;

    /// Every triangle with the base color of the mesh it belongs to.
    fn world_triangles(&self) -> Vec<ColoredTriangle>;

    /// Whether at least one mesh has a triangle to draw.
    fn has_visible_geometry(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColoredTriangle {
    pub vertices: [Vec3; 3],
    pub color: Vec3,
}

/// Placement of a mesh relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default)]
    pub position: Vec3,
    /// Euler angles in degrees.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: default_scale(),
        }
    }
}

impl Transform {
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(
            self.scale,
            rotation_from_euler(self.rotation),
            self.position,
        )
    }
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

fn default_color() -> Vec3 {
    Vec3::ONE
}

/// A shared mesh placed into a target.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInstance {
    pub mesh: Arc<Mesh>,
    pub transform: Transform,
    pub color: Vec3,
}

impl MeshInstance {
    pub fn new(mesh: Arc<Mesh>) -> Self {
        Self {
            mesh,
            transform: Transform::default(),
            color: default_color(),
        }
    }
}

/// One icon subject: a named set of meshes rendered in isolation.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub name: String,
    pub meshes: Vec<MeshInstance>,
}

impl Target {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meshes: Vec::new(),
        }
    }

    pub fn with_mesh(mut self, mesh: MeshInstance) -> Self {
        self.meshes.push(mesh);
        self
    }

    /// Loads a single OBJ file as a target named after the file stem.
    pub fn from_obj_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("unable to read {}", path.display()))?;
        let mesh =
            load_obj_from_str(&data).with_context(|| format!("invalid OBJ {}", path.display()))?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "icon".to_string());
        Ok(Self::new(name).with_mesh(MeshInstance::new(Arc::new(mesh))))
    }
}

impl GeometrySource for Target {
    fn name(&self) -> &str {
        &self.name
    }

    fn world_vertices(&self) -> Vec<Vec3> {
        self.meshes
            .iter()
            .flat_map(|instance| {
                let affine = instance.transform.to_affine();
                instance
                    .mesh
                    .positions
                    .iter()
                    .map(move |&position| affine.transform_point3(position))
            })
            .collect()
    }

    fn world_triangles(&self) -> Vec<ColoredTriangle> {
        self.meshes
            .iter()
            .flat_map(|instance| {
                let affine = instance.transform.to_affine();
                let color = instance.color;
                instance.mesh.triangles().map(move |tri| ColoredTriangle {
                    vertices: tri.map(|v| affine.transform_point3(v)),
                    color,
                })
            })
            .collect()
    }

    fn has_visible_geometry(&self) -> bool {
        self.meshes
            .iter()
            .any(|instance| instance.mesh.triangle_count() > 0)
    }
}

/// Batch description: which targets to bake and how their meshes are placed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Manifest {
    pub targets: Vec<Target>,
}

impl Manifest {
    /// Reads a manifest file; mesh paths resolve against its directory.
    pub fn open(path: &Path) -> Result<Self> {
        let xml = fs::read_to_string(path)
            .with_context(|| format!("unable to read manifest {}", path.display()))?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_xml(&xml, |mesh_path| {
            let resolved = base.join(mesh_path);
            let data = fs::read_to_string(&resolved)
                .with_context(|| format!("unable to read mesh {}", resolved.display()))?;
            load_obj_from_str(&data).with_context(|| format!("invalid OBJ {}", resolved.display()))
        })
    }

    /// Parses manifest XML, loading meshes through `load_mesh`.
    ///
    /// ```xml
    /// <icons>
    ///   <target>
    ///     <name>Crate</name>
    ///     <mesh>
    ///       <path>crate.obj</path>
    ///       <position>0 0 0</position>
    ///       <rotation>0 45 0</rotation>
    ///       <scale>1 1 1</scale>
    ///       <color>200 150 90</color>
    ///     </mesh>
    ///   </target>
    /// </icons>
    /// ```
    pub fn from_xml<F>(xml: &str, mut load_mesh: F) -> Result<Self>
    where
        F: FnMut(&Path) -> Result<Mesh>,
    {
        let document = Document::parse(xml).context("invalid manifest XML")?;
        let mut targets = Vec::new();
        let mut cache: Vec<(PathBuf, Arc<Mesh>)> = Vec::new();

        for node in document.descendants().filter(|n| n.has_tag_name("target")) {
            let mut target = Target::new(required_text(&node, "name")?);
            for mesh_node in node.children().filter(|n| n.has_tag_name("mesh")) {
                let path = PathBuf::from(required_text(&mesh_node, "path")?);
                let mesh = match cache.iter().find(|(cached, _)| *cached == path) {
                    Some((_, mesh)) => Arc::clone(mesh),
                    None => {
                        let mesh = Arc::new(load_mesh(path.as_path())?);
                        cache.push((path, Arc::clone(&mesh)));
                        mesh
                    }
                };
                let transform = Transform {
                    position: parse_vec3(optional_text(&mesh_node, "position"), Vec3::ZERO)?,
                    rotation: parse_vec3(optional_text(&mesh_node, "rotation"), Vec3::ZERO)?,
                    scale: parse_vec3(optional_text(&mesh_node, "scale"), default_scale())?,
                };
                let color = parse_color(optional_text(&mesh_node, "color"), default_color())?;
                target.meshes.push(MeshInstance {
                    mesh,
                    transform,
                    color,
                });
            }
            targets.push(target);
        }

        Ok(Self { targets })
    }

    /// Looks a target up by name.
    pub fn find(&self, name: &str) -> Result<&Target, FramingError> {
        self.targets
            .iter()
            .find(|target| target.name == name)
            .ok_or_else(|| FramingError::TargetNotFound(name.to_string()))
    }
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_components(value: &str, what: &str) -> Result<Vec3> {
    let numbers = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("invalid {what} component {component:?}: {err}"))
        })
        .collect::<Result<Vec<f32>>>()?;
    match numbers.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!("{what} needs 3 components, got {}", numbers.len())),
    }
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    match value {
        Some(value) => parse_components(&value, "vector"),
        None => Ok(default),
    }
}

fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    match value {
        Some(value) => Ok(parse_components(&value, "color")? / 255.0),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <icons>
        <target>
            <name>Crate</name>
            <mesh>
                <path>cube.obj</path>
                <position>1 0 0</position>
                <scale>2 2 2</scale>
                <color>255 128 0</color>
            </mesh>
            <mesh>
                <path>cube.obj</path>
                <position>-1 0 0</position>
            </mesh>
        </target>
        <target>
            <name>Empty</name>
        </target>
    </icons>
    "#;

    fn load_cube(_: &Path) -> Result<Mesh> {
        Ok(Mesh::cube())
    }

    #[test]
    fn parse_manifest_populates_targets() {
        let manifest = Manifest::from_xml(SAMPLE, load_cube).unwrap();
        assert_eq!(manifest.targets.len(), 2);
        let crate_target = &manifest.targets[0];
        assert_eq!(crate_target.name, "Crate");
        assert_eq!(crate_target.meshes.len(), 2);
        let first = &crate_target.meshes[0];
        assert_eq!(first.transform.position, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(first.transform.scale, Vec3::splat(2.0));
        assert_eq!(first.color, Vec3::new(1.0, 128.0 / 255.0, 0.0));
        assert!(Arc::ptr_eq(&first.mesh, &crate_target.meshes[1].mesh));
        assert!(!manifest.targets[1].has_visible_geometry());
    }

    #[test]
    fn missing_name_is_an_error() {
        let bad = "<icons><target><mesh><path>a.obj</path></mesh></target></icons>";
        assert!(Manifest::from_xml(bad, load_cube).is_err());
    }

    #[test]
    fn short_vector_is_an_error() {
        let bad = "<icons><target><name>A</name><mesh><path>a.obj</path><position>1 2</position></mesh></target></icons>";
        assert!(Manifest::from_xml(bad, load_cube).is_err());
    }

    #[test]
    fn find_reports_unknown_targets() {
        let manifest = Manifest::from_xml(SAMPLE, load_cube).unwrap();
        assert_eq!(manifest.find("Crate").unwrap().name, "Crate");
        assert_eq!(
            manifest.find("Barrel"),
            Err(FramingError::TargetNotFound("Barrel".to_string()))
        );
    }

    #[test]
    fn world_vertices_apply_transform() {
        let mut instance = MeshInstance::new(Arc::new(Mesh::cube()));
        instance.transform = Transform {
            position: Vec3::new(10.0, 0.0, 0.0),
            rotation: Vec3::ZERO,
            scale: Vec3::splat(2.0),
        };
        let target = Target::new("Moved").with_mesh(instance);
        let vertices = target.world_vertices();
        assert_eq!(vertices.len(), 8);
        for vertex in vertices {
            assert!((vertex.x - 10.0).abs() <= 1.0 + 1e-5);
            assert!(vertex.y.abs() <= 1.0 + 1e-5);
        }
        assert_eq!(target.world_triangles().len(), 12);
    }
}
