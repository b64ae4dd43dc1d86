use rtrtool::rtr::{ColorSpace, Container, MaterialHeader, MeshHeader, Result, RtrError, SceneHeader, descendants, tag_label};

use crate::cmd::util::{emit_json, float_or_inf, translation_of};

/// Everything `rtrtool` reports about one container.
#[derive(serde::Serialize)]
pub(crate) struct Summary {
	path: String,
	bytes: usize,
	sub_headers: Vec<SubHeaderJson>,
	meshes: Vec<MeshJson>,
	materials: Vec<MaterialJson>,
	textures: Vec<TextureJson>,
	scenes: Vec<SceneJson>,
	cameras: Vec<CameraJson>,
	lights: LightsJson,
}

#[derive(serde::Serialize)]
struct SubHeaderJson {
	tag: &'static str,
	version: u32,
	size: u64,
}

#[derive(serde::Serialize)]
struct MeshJson {
	name: String,
	vertices: usize,
	triangles: usize,
}

#[derive(serde::Serialize)]
struct MaterialJson {
	color: [f32; 4],
	metallic: f32,
	roughness: f32,
	color_texture: Option<u32>,
	metallic_texture: Option<u32>,
	roughness_texture: Option<u32>,
	normal_texture: Option<u32>,
}

#[derive(serde::Serialize)]
struct TextureJson {
	width: u32,
	height: u32,
	channels: u32,
	color_space: &'static str,
	bytes: usize,
}

#[derive(serde::Serialize)]
struct SceneJson {
	index: usize,
	root: usize,
	nodes: usize,
	instances: Vec<InstanceJson>,
}

#[derive(serde::Serialize)]
struct InstanceJson {
	node: u32,
	mesh: u32,
	material: u32,
	translation: [f32; 3],
}

#[derive(serde::Serialize)]
struct CameraJson {
	name: String,
	node: u32,
	yfov: f32,
	znear: f32,
	zfar: Option<f32>,
}

#[derive(serde::Serialize)]
struct LightsJson {
	directional: usize,
	point: usize,
	spot: usize,
}

impl Summary {
	/// Collect the summary; `scene` limits the scene listing to one entry.
	pub(crate) fn collect(path: &str, container: &Container, scene: Option<usize>) -> Result<Self> {
		let bytes = container.bytes();

		let sub_headers = container
			.sub_headers()
			.iter()
			.map(|entry| SubHeaderJson {
				tag: tag_label(entry.tag),
				version: entry.version,
				size: entry.size,
			})
			.collect();

		let meshes = container
			.find::<MeshHeader>()
			.map(|header| {
				header
					.iter(bytes)
					.map(|mesh| MeshJson {
						name: mesh.name().to_owned(),
						vertices: mesh.positions().len(),
						triangles: mesh.triangles().len(),
					})
					.collect()
			})
			.unwrap_or_default();

		let (materials, textures) = match container.find::<MaterialHeader>() {
			Some(header) => (
				header
					.materials(bytes)
					.iter()
					.map(|material| MaterialJson {
						color: material.factors.color,
						metallic: material.factors.metallic,
						roughness: material.factors.roughness,
						color_texture: material.textures.color.get(),
						metallic_texture: material.textures.metallic.get(),
						roughness_texture: material.textures.roughness.get(),
						normal_texture: material.textures.normal.get(),
					})
					.collect(),
				header
					.textures(bytes)
					.iter()
					.map(|texture| TextureJson {
						width: texture.width,
						height: texture.height,
						channels: texture.channels,
						color_space: ColorSpace::from_u32(texture.color_space).map_or("unknown", ColorSpace::as_str),
						bytes: texture.blob(bytes).len(),
					})
					.collect(),
			),
			None => (Vec::new(), Vec::new()),
		};

		let mut summary = Self {
			path: path.to_owned(),
			bytes: container.len(),
			sub_headers,
			meshes,
			materials,
			textures,
			scenes: Vec::new(),
			cameras: Vec::new(),
			lights: LightsJson {
				directional: 0,
				point: 0,
				spot: 0,
			},
		};

		let Some(header) = container.find::<SceneHeader>() else {
			if let Some(scene) = scene {
				return Err(scene_out_of_range(scene, 0));
			}
			return Ok(summary);
		};

		let selected = match scene {
			Some(scene) if scene >= header.scene_count() => return Err(scene_out_of_range(scene, header.scene_count())),
			Some(scene) => scene..scene + 1,
			None => 0..header.scene_count(),
		};
		let nodes = header.nodes(bytes);
		for index in selected {
			let Some(root) = header.scene_root(bytes, index) else {
				continue;
			};
			let instances = header
				.instances_in_scene(bytes, index)
				.into_iter()
				.map(|resolved| InstanceJson {
					node: resolved.instance.node,
					mesh: resolved.instance.mesh,
					material: resolved.instance.material,
					translation: translation_of(resolved.world.into()),
				})
				.collect();
			summary.scenes.push(SceneJson {
				index,
				root,
				nodes: descendants(nodes, root).len() + 1,
				instances,
			});
		}

		summary.cameras = header
			.cameras(bytes)
			.iter()
			.enumerate()
			.map(|(index, camera)| CameraJson {
				name: header.camera_name(bytes, index).to_owned(),
				node: camera.node,
				yfov: camera.yfov,
				znear: camera.znear,
				zfar: camera.zfar.is_finite().then_some(camera.zfar),
			})
			.collect();
		summary.lights = LightsJson {
			directional: header.directional_lights(bytes).len(),
			point: header.point_lights(bytes).len(),
			spot: header.spot_lights(bytes).len(),
		};
		Ok(summary)
	}

	/// Print as JSON or as `key: value` lines.
	pub(crate) fn emit(&self, json: bool) -> Result<()> {
		if json {
			return emit_json(self);
		}

		println!("path: {}", self.path);
		println!("bytes: {}", self.bytes);
		println!("sub_headers:");
		for entry in &self.sub_headers {
			println!("  {} v{}: {} bytes", entry.tag, entry.version, entry.size);
		}
		println!("meshes: {}", self.meshes.len());
		for mesh in &self.meshes {
			println!("  {}: {} vertices, {} triangles", mesh.name, mesh.vertices, mesh.triangles);
		}
		println!("materials: {}", self.materials.len());
		println!("textures: {}", self.textures.len());
		for (index, texture) in self.textures.iter().enumerate() {
			println!(
				"  {index}: {}x{} x{} {} ({} bytes)",
				texture.width, texture.height, texture.channels, texture.color_space, texture.bytes
			);
		}
		println!("scenes: {}", self.scenes.len());
		for scene in &self.scenes {
			println!("  scene {}: root {}, {} nodes, {} instances", scene.index, scene.root, scene.nodes, scene.instances.len());
			for instance in &scene.instances {
				let [x, y, z] = instance.translation;
				println!("    node {} mesh {} material {} at ({x}, {y}, {z})", instance.node, instance.mesh, instance.material);
			}
		}
		println!("cameras: {}", self.cameras.len());
		for camera in &self.cameras {
			println!(
				"  {:?}: node {}, yfov {}, znear {}, zfar {}",
				camera.name,
				camera.node,
				camera.yfov,
				camera.znear,
				float_or_inf(camera.zfar)
			);
		}
		println!("lights: {} directional, {} point, {} spot", self.lights.directional, self.lights.point, self.lights.spot);
		Ok(())
	}
}

fn scene_out_of_range(scene: usize, count: usize) -> RtrError {
	RtrError::Usage {
		message: format!("scene {scene} out of range (container has {count})"),
	}
}

#[cfg(test)]
mod tests;
