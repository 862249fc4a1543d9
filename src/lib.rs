//! Bakes 3D models into 2D icon images.
//!
//! The crate frames an orthographic camera around a render set, rasterizes
//! it, optionally composites a drop shadow and hands the result to an asset
//! sink. Rendering, geometry and storage sit behind small traits so hosts can
//! swap in their own implementations; the bundled ones are headless and easy
//! to test.

pub mod bitmap;
pub mod bounds;
pub mod compositor;
pub mod error;
pub mod framing;
pub mod lighting;
pub mod obj;
pub mod pipeline;
pub mod presets;
pub mod render;
pub mod scene;
pub mod settings;
pub mod sink;

pub use bitmap::Bitmap;
pub use bounds::BoundingBox;
pub use compositor::{apply_shadow, apply_shadow_or_passthrough, ShadowSpec};
pub use error::{
    CompositingError, FramingError, IconError, PresetError, RenderError, SinkError,
};
pub use framing::{CameraPlacement, ViewFramer, ViewpointSpec};
pub use lighting::{LightKind, LightingSpec, PointLight};
pub use obj::{load_obj_from_str, Mesh};
pub use pipeline::{BatchReport, CancelHandle, GenerationStatus, IconPipeline, Progress};
pub use presets::PresetStore;
pub use render::{Renderer, SoftwareRenderer};
pub use scene::{GeometrySource, Manifest, MeshInstance, Target, Transform};
pub use settings::IconSettings;
pub use sink::{AssetSink, PngDirectorySink};
