use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};
use cgmath::Matrix4;
use log::{debug, warn};

use crate::rtr::relref::position_in;
use crate::rtr::{ArenaWriter, ArrayRef, FlattenedNodes, HeaderTag, LightKind, Node, Ref, Result, SceneSource, Slot, SourceNode, SubHeader, flatten_scenes, root_of, world_transform};

/// Sub-header holding the flattened node array and everything attached to it.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SceneHeader {
	/// Pre-order node array.
	pub nodes: ArrayRef<Node>,
	/// One reference per scene to its root entry in `nodes`.
	pub scenes: ArrayRef<Ref<Node>>,
	/// Mesh/material pairs placed at nodes.
	pub instances: ArrayRef<Instance>,
	/// Perspective cameras.
	pub cameras: ArrayRef<Camera>,
	/// UTF-8 camera names, parallel to `cameras`.
	pub camera_names: ArrayRef<ArrayRef<u8>>,
	/// Directional lights.
	pub directional_lights: ArrayRef<DirectionalLight>,
	/// Point lights.
	pub point_lights: ArrayRef<PointLight>,
	/// Spot lights.
	pub spot_lights: ArrayRef<SpotLight>,
}

impl SubHeader for SceneHeader {
	const TAG: HeaderTag = HeaderTag::Scene;
}

/// Mesh drawn with a material at a node.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct Instance {
	/// Node slot.
	pub node: u32,
	/// Mesh table index.
	pub mesh: u32,
	/// Material table index.
	pub material: u32,
}

/// Perspective camera looking down the node's -Z axis.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Camera {
	/// Node slot.
	pub node: u32,
	/// Vertical field of view in radians.
	pub yfov: f32,
	/// Near clip distance.
	pub znear: f32,
	/// Far clip distance, `+inf` when unbounded.
	pub zfar: f32,
}

/// Light along the node's -Z axis with no position.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DirectionalLight {
	/// Node slot.
	pub node: u32,
	/// Colour times intensity.
	pub color: [f32; 3],
}

/// Omnidirectional light at the node's origin.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLight {
	/// Node slot.
	pub node: u32,
	/// Colour times intensity.
	pub color: [f32; 3],
}

/// Cone light along the node's -Z axis.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpotLight {
	/// Node slot.
	pub node: u32,
	/// Colour times intensity.
	pub color: [f32; 3],
	/// Attenuation cutoff, `+inf` when unbounded.
	pub range: f32,
	/// Full-intensity cone half angle.
	pub inner_cone_angle: f32,
	/// Zero-intensity cone half angle.
	pub outer_cone_angle: f32,
}

const _: () = assert!(size_of::<SpotLight>() == 28);

/// Attachments gathered while flattening, keyed by final node slot.
#[derive(Debug, Clone, Default)]
pub struct SceneAttachments {
	/// Instances in emission order.
	pub instances: Vec<Instance>,
	/// Cameras in emission order.
	pub cameras: Vec<Camera>,
	/// Camera names, parallel to `cameras`.
	pub camera_names: Vec<String>,
	/// Directional lights.
	pub directional_lights: Vec<DirectionalLight>,
	/// Point lights.
	pub point_lights: Vec<PointLight>,
	/// Spot lights.
	pub spot_lights: Vec<SpotLight>,
}

/// Flatten the node forest and collect attachments at their final slots.
///
/// Mesh and material indices are copied through; the caller checks them.
pub fn build_scene(source: &SceneSource) -> Result<(FlattenedNodes, SceneAttachments)> {
	let mut out = SceneAttachments::default();
	let flattened = flatten_scenes(&source.nodes, &source.scenes, |index, slot| {
		let node = &source.nodes[index];
		for instance in &node.instances {
			out.instances.push(Instance {
				node: slot,
				mesh: instance.mesh as u32,
				material: instance.material as u32,
			});
		}
		if let Some(camera) = &node.camera {
			out.cameras.push(Camera {
				node: slot,
				yfov: camera.yfov,
				znear: camera.znear,
				zfar: camera.zfar.unwrap_or(f32::INFINITY),
			});
			out.camera_names.push(camera.name.clone());
		}
		if let Some(light) = &node.light {
			let color = light.radiance();
			match light.kind {
				LightKind::Directional => out.directional_lights.push(DirectionalLight { node: slot, color }),
				LightKind::Point => out.point_lights.push(PointLight { node: slot, color }),
				LightKind::Spot {
					range,
					inner_cone_angle,
					outer_cone_angle,
				} => out.spot_lights.push(SpotLight {
					node: slot,
					color,
					range: range.unwrap_or(f32::INFINITY),
					inner_cone_angle,
					outer_cone_angle,
				}),
			}
		}
		Ok(())
	})?;

	let reachable = reachable_nodes(&source.nodes, &source.scenes);
	let orphans = source.nodes.iter().enumerate().filter(|(index, node)| !reachable[*index] && !node.instances.is_empty()).count();
	if orphans > 0 {
		warn!("{orphans} node(s) with instances are not part of any scene and were dropped");
	}

	Ok((flattened, out))
}

fn reachable_nodes(nodes: &[SourceNode], scenes: &[Vec<usize>]) -> Vec<bool> {
	let mut seen = vec![false; nodes.len()];
	let mut stack: Vec<usize> = scenes.iter().flatten().copied().collect();
	while let Some(index) = stack.pop() {
		match seen.get_mut(index) {
			Some(flag) if !*flag => {
				*flag = true;
				stack.extend(nodes[index].children.iter().copied());
			}
			_ => {}
		}
	}
	seen
}

/// Lay out the flattened nodes and attachments as one scene sub-header.
pub fn write_scene(arena: &mut ArenaWriter, flattened: &FlattenedNodes, attachments: &SceneAttachments) -> Result<Slot<SceneHeader>> {
	let header = arena.alloc(&SceneHeader::zeroed())?;
	let at = |field: usize| header.pos() + field;

	let nodes = arena.alloc_array(&flattened.nodes)?;
	let scenes = arena.alloc_zeroed_array::<Ref<Node>>(flattened.scene_roots.len())?;
	for (index, &root) in flattened.scene_roots.iter().enumerate() {
		*arena.get_mut(scenes.element(index)) = nodes.element(root as usize).ref_from(scenes.element_pos(index));
	}
	let instances = arena.alloc_array(&attachments.instances)?;
	let cameras = arena.alloc_array(&attachments.cameras)?;
	let camera_names = arena.alloc_zeroed_array::<ArrayRef<u8>>(attachments.camera_names.len())?;
	for (index, name) in attachments.camera_names.iter().enumerate() {
		let bytes = arena.alloc_array(name.as_bytes())?;
		*arena.get_mut(camera_names.element(index)) = bytes.array_ref_from(camera_names.element_pos(index));
	}
	let directional_lights = arena.alloc_array(&attachments.directional_lights)?;
	let point_lights = arena.alloc_array(&attachments.point_lights)?;
	let spot_lights = arena.alloc_array(&attachments.spot_lights)?;

	*arena.get_mut(header) = SceneHeader {
		nodes: nodes.array_ref_from(at(offset_of!(SceneHeader, nodes))),
		scenes: scenes.array_ref_from(at(offset_of!(SceneHeader, scenes))),
		instances: instances.array_ref_from(at(offset_of!(SceneHeader, instances))),
		cameras: cameras.array_ref_from(at(offset_of!(SceneHeader, cameras))),
		camera_names: camera_names.array_ref_from(at(offset_of!(SceneHeader, camera_names))),
		directional_lights: directional_lights.array_ref_from(at(offset_of!(SceneHeader, directional_lights))),
		point_lights: point_lights.array_ref_from(at(offset_of!(SceneHeader, point_lights))),
		spot_lights: spot_lights.array_ref_from(at(offset_of!(SceneHeader, spot_lights))),
	};

	debug!(
		"wrote {} node(s), {} scene(s), {} instance(s), {} camera(s)",
		flattened.nodes.len(),
		flattened.scene_roots.len(),
		attachments.instances.len(),
		attachments.cameras.len()
	);
	Ok(header)
}

/// Instance with its world transform resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedInstance {
	/// Stored record.
	pub instance: Instance,
	/// Root-to-node transform product.
	pub world: Matrix4<f32>,
}

impl SceneHeader {
	/// Node array.
	pub fn nodes<'a>(&'a self, base: &'a [u8]) -> &'a [Node] {
		self.nodes.resolve(base).unwrap_or_default()
	}

	/// Number of scenes.
	pub fn scene_count(&self) -> usize {
		self.scenes.len()
	}

	/// Node slot of scene `scene`'s root.
	///
	/// `None` when the scene does not exist or its reference does not land on
	/// a node entry.
	pub fn scene_root(&self, base: &[u8], scene: usize) -> Option<usize> {
		let root = self.scenes.resolve(base)?.get(scene)?;
		let target = root.target(position_in(root, base)?)?;
		let start = self.nodes.target(position_in(&self.nodes, base)?)?;
		let delta = target.checked_sub(start)?;
		let slot = delta / size_of::<Node>();
		(delta % size_of::<Node>() == 0 && slot < self.nodes.len()).then_some(slot)
	}

	/// Instance records.
	pub fn instances<'a>(&'a self, base: &'a [u8]) -> &'a [Instance] {
		self.instances.resolve(base).unwrap_or_default()
	}

	/// Camera records.
	pub fn cameras<'a>(&'a self, base: &'a [u8]) -> &'a [Camera] {
		self.cameras.resolve(base).unwrap_or_default()
	}

	/// Name of camera `index`; empty when absent or not UTF-8.
	pub fn camera_name<'a>(&'a self, base: &'a [u8], index: usize) -> &'a str {
		self.camera_names
			.resolve(base)
			.and_then(|names| names.get(index))
			.and_then(|name| name.resolve_str(base))
			.unwrap_or_default()
	}

	/// Directional light records.
	pub fn directional_lights<'a>(&'a self, base: &'a [u8]) -> &'a [DirectionalLight] {
		self.directional_lights.resolve(base).unwrap_or_default()
	}

	/// Point light records.
	pub fn point_lights<'a>(&'a self, base: &'a [u8]) -> &'a [PointLight] {
		self.point_lights.resolve(base).unwrap_or_default()
	}

	/// Spot light records.
	pub fn spot_lights<'a>(&'a self, base: &'a [u8]) -> &'a [SpotLight] {
		self.spot_lights.resolve(base).unwrap_or_default()
	}

	/// Instances whose node descends from scene `scene`'s root, with world
	/// transforms.
	///
	/// Walks every instance up to its root; cost is instances times depth.
	pub fn instances_in_scene(&self, base: &[u8], scene: usize) -> Vec<ResolvedInstance> {
		let Some(root) = self.scene_root(base, scene) else {
			return Vec::new();
		};
		let nodes = self.nodes(base);
		self.instances(base)
			.iter()
			.filter(|instance| root_of(nodes, instance.node as usize) == Some(root))
			.filter_map(|instance| {
				Some(ResolvedInstance {
					instance: *instance,
					world: world_transform(nodes, instance.node as usize)?,
				})
			})
			.collect()
	}
}
