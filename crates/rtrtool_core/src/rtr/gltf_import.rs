use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use gltf::camera::Projection;
use gltf::image::Source;
use gltf::khr_lights_punctual::Kind;
use gltf::mesh::Mode;
use log::{debug, info, warn};

use crate::rtr::{
	CameraSource, ConversionError, InstanceSource, LightKind, LightSource, MaterialSource, MeshSource, Result, RtrError, SceneSource, SourceNode, TextureData, TextureSource,
};

/// Read a `.gltf` or `.glb` file into plain scene arrays.
///
/// Buffers come from the GLB binary chunk, external files, or base64 data
/// URIs. Every primitive becomes one mesh; materials are numbered in order of
/// first use, with a default entry for primitives that have none.
pub fn import_gltf(path: impl AsRef<Path>) -> Result<SceneSource> {
	let path = path.as_ref();
	fs::metadata(path).map_err(|source| RtrError::Resource {
		path: path.to_path_buf(),
		source,
	})?;

	let mut gltf = gltf::Gltf::open(path).map_err(ConversionError::from)?;
	let base = path.parent().unwrap_or_else(|| Path::new("."));
	let buffers = gltf::import_buffers(&gltf.document, Some(base), gltf.blob.take()).map_err(ConversionError::from)?;
	let document = &gltf.document;
	debug!("{}: {} buffer(s), {} mesh(es), {} node(s)", path.display(), buffers.len(), document.meshes().len(), document.nodes().len());

	let mut importer = Importer {
		base,
		buffers: buffers.iter().map(|data| &data.0[..]).collect(),
		materials: Vec::new(),
		material_slots: HashMap::new(),
	};

	let mut meshes = Vec::new();
	let mut primitives_of = Vec::with_capacity(document.meshes().len());
	for mesh in document.meshes() {
		let mut instances = Vec::new();
		let count = mesh.primitives().len();
		for primitive in mesh.primitives() {
			let name = match (mesh.name(), count) {
				(Some(name), 1) => name.to_owned(),
				(Some(name), _) => format!("{name}{}", primitive.index()),
				(None, _) => format!("mesh{}_{}", mesh.index(), primitive.index()),
			};
			let material = importer.material(primitive.material())?;
			meshes.push(importer.primitive(name, &primitive)?);
			instances.push(InstanceSource {
				mesh: meshes.len() - 1,
				material,
			});
		}
		primitives_of.push(instances);
	}

	let nodes = document
		.nodes()
		.map(|node| SourceNode {
			name: node.name().map(str::to_owned),
			transform: node.transform().matrix(),
			children: node.children().map(|child| child.index()).collect(),
			instances: node.mesh().map(|mesh| primitives_of[mesh.index()].clone()).unwrap_or_default(),
			camera: node.camera().and_then(|camera| camera_source(&camera, node.name())),
			light: node.light().map(|light| light_source(&light)),
		})
		.collect::<Vec<_>>();

	let mut scenes = document.scenes().map(|scene| scene.nodes().map(|node| node.index()).collect::<Vec<_>>()).collect::<Vec<_>>();
	if scenes.is_empty() {
		scenes.push(parentless(&nodes));
	}

	info!(
		"imported {}: {} mesh(es), {} material(s), {} node(s), {} scene(s)",
		path.display(),
		meshes.len(),
		importer.materials.len(),
		nodes.len(),
		scenes.len()
	);
	Ok(SceneSource {
		meshes,
		materials: importer.materials,
		nodes,
		scenes,
	})
}

struct Importer<'a> {
	base: &'a Path,
	buffers: Vec<&'a [u8]>,
	materials: Vec<MaterialSource>,
	material_slots: HashMap<Option<usize>, usize>,
}

impl Importer<'_> {
	fn primitive(&self, name: String, primitive: &gltf::Primitive<'_>) -> std::result::Result<MeshSource, ConversionError> {
		if primitive.mode() != Mode::Triangles {
			return Err(ConversionError::UnsupportedPrimitive {
				mesh: name,
				mode: format!("{:?}", primitive.mode()),
			});
		}

		let reader = primitive.reader(|buffer| self.buffers.get(buffer.index()).copied());
		Ok(MeshSource {
			positions: reader.read_positions().map(Iterator::collect),
			indices: reader.read_indices().map(|indices| indices.into_u32().collect()),
			normals: reader.read_normals().map(Iterator::collect),
			tex_coords0: reader.read_tex_coords(0).map(|coords| coords.into_f32().collect()),
			tangents: reader.read_tangents().map(Iterator::collect),
			name,
		})
	}

	fn material(&mut self, material: gltf::Material<'_>) -> std::result::Result<usize, ConversionError> {
		if let Some(&slot) = self.material_slots.get(&material.index()) {
			return Ok(slot);
		}

		let source = match material.index() {
			None => MaterialSource::default(),
			Some(index) => {
				let pbr = material.pbr_metallic_roughness();
				MaterialSource {
					name: material.name().map_or_else(|| format!("material{index}"), str::to_owned),
					base_color: pbr.base_color_factor(),
					metallic: pbr.metallic_factor(),
					roughness: pbr.roughness_factor(),
					color_texture: self.texture(pbr.base_color_texture().map(|info| info.texture()))?,
					metallic_roughness_texture: self.texture(pbr.metallic_roughness_texture().map(|info| info.texture()))?,
					normal_texture: self.texture(material.normal_texture().map(|normal| normal.texture()))?,
				}
			}
		};

		let slot = self.materials.len();
		self.materials.push(source);
		self.material_slots.insert(material.index(), slot);
		Ok(slot)
	}

	fn texture(&self, texture: Option<gltf::Texture<'_>>) -> std::result::Result<Option<TextureSource>, ConversionError> {
		let Some(texture) = texture else {
			return Ok(None);
		};
		match texture.source().source() {
			Source::Uri { uri, .. } if uri.starts_with("data:") => Err(ConversionError::UnsupportedUri {
				uri: uri.chars().take(32).collect(),
			}),
			Source::Uri { uri, .. } => Ok(Some(TextureSource {
				id: uri.to_owned(),
				data: TextureData::File(self.base.join(uri)),
			})),
			Source::View { view, .. } => {
				let start = view.offset();
				let bytes = self
					.buffers
					.get(view.buffer().index())
					.and_then(|buffer| buffer.get(start..start + view.length()))
					.ok_or(ConversionError::SourceIndexOutOfRange {
						what: "image buffer view",
						index: view.index(),
						len: self.buffers.len(),
					})?;
				Ok(Some(TextureSource {
					id: format!("buffer-view:{}", view.index()),
					data: TextureData::Embedded(Arc::from(bytes)),
				}))
			}
		}
	}
}

fn camera_source(camera: &gltf::Camera<'_>, node_name: Option<&str>) -> Option<CameraSource> {
	match camera.projection() {
		Projection::Perspective(perspective) => Some(CameraSource {
			name: camera.name().or(node_name).unwrap_or_default().to_owned(),
			yfov: perspective.yfov(),
			znear: perspective.znear(),
			zfar: perspective.zfar(),
		}),
		Projection::Orthographic(_) => {
			warn!("skipping orthographic camera {}", camera.index());
			None
		}
	}
}

fn light_source(light: &gltf::khr_lights_punctual::Light<'_>) -> LightSource {
	let kind = match light.kind() {
		Kind::Directional => LightKind::Directional,
		Kind::Point => LightKind::Point,
		Kind::Spot {
			inner_cone_angle,
			outer_cone_angle,
		} => LightKind::Spot {
			range: light.range(),
			inner_cone_angle,
			outer_cone_angle,
		},
	};
	LightSource {
		color: light.color(),
		intensity: light.intensity(),
		kind,
	}
}

fn parentless(nodes: &[SourceNode]) -> Vec<usize> {
	let mut is_child = vec![false; nodes.len()];
	for child in nodes.iter().flat_map(|node| node.children.iter()) {
		if let Some(flag) = is_child.get_mut(*child) {
			*flag = true;
		}
	}
	(0..nodes.len()).filter(|&index| !is_child[index]).collect()
}
