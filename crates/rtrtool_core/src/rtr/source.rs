use crate::rtr::{MaterialSource, MeshSource};

/// Column-major 4x4 identity matrix.
pub const IDENTITY: [[f32; 4]; 4] = [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0], [0.0, 0.0, 0.0, 1.0]];

/// Plain in-memory scene description consumed by the converter.
///
/// Indices between tables are plain positions; the converter checks them.
#[derive(Debug, Clone, Default)]
pub struct SceneSource {
	/// One entry per renderable primitive.
	pub meshes: Vec<MeshSource>,
	/// Materials referenced by node instances.
	pub materials: Vec<MaterialSource>,
	/// Node forest; children are indices into this table.
	pub nodes: Vec<SourceNode>,
	/// Top-level node indices of each scene.
	pub scenes: Vec<Vec<usize>>,
}

/// One source node with its local transform and attachments.
#[derive(Debug, Clone)]
pub struct SourceNode {
	/// Optional display name.
	pub name: Option<String>,
	/// Local transform, column-major.
	pub transform: [[f32; 4]; 4],
	/// Child node indices in source order.
	pub children: Vec<usize>,
	/// Mesh/material pairs drawn at this node.
	pub instances: Vec<InstanceSource>,
	/// Attached camera.
	pub camera: Option<CameraSource>,
	/// Attached light.
	pub light: Option<LightSource>,
}

impl Default for SourceNode {
	fn default() -> Self {
		Self {
			name: None,
			transform: IDENTITY,
			children: Vec::new(),
			instances: Vec::new(),
			camera: None,
			light: None,
		}
	}
}

/// Mesh drawn with a material at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceSource {
	/// Index into [`SceneSource::meshes`].
	pub mesh: usize,
	/// Index into [`SceneSource::materials`].
	pub material: usize,
}

/// Perspective camera attached to a node.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSource {
	/// Camera name, stored alongside the camera table.
	pub name: String,
	/// Vertical field of view in radians.
	pub yfov: f32,
	/// Near clip distance.
	pub znear: f32,
	/// Far clip distance; `None` means infinite.
	pub zfar: Option<f32>,
}

/// Punctual light attached to a node.
#[derive(Debug, Clone, PartialEq)]
pub struct LightSource {
	/// Linear RGB colour.
	pub color: [f32; 3],
	/// Scalar intensity multiplied into the colour.
	pub intensity: f32,
	/// Light shape.
	pub kind: LightKind,
}

/// Light shape and its shape-specific parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
	/// Infinitely distant light along the node's -Z axis.
	Directional,
	/// Omnidirectional light.
	Point,
	/// Cone light along the node's -Z axis.
	Spot {
		/// Attenuation cutoff; `None` means infinite.
		range: Option<f32>,
		/// Full-intensity cone half angle in radians.
		inner_cone_angle: f32,
		/// Zero-intensity cone half angle in radians.
		outer_cone_angle: f32,
	},
}

impl LightSource {
	/// Colour scaled by intensity.
	pub fn radiance(&self) -> [f32; 3] {
		self.color.map(|channel| channel * self.intensity)
	}
}
