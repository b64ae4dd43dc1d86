use std::path::Path;

use log::info;

use crate::rtr::arena::DEFAULT_CAPACITY;
use crate::rtr::{
	ArenaWriter, Container, ConversionError, HeaderTable, Material, PreparedMesh, Result, SceneSource, TextureCache, TextureEncoder, build_scene, prepare_mesh, resolve_material,
	write_materials, write_meshes, write_scene,
};

/// Runtime limits for one conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
	/// Arena reservation in bytes; exceeding it fails the conversion.
	pub capacity: usize,
}

impl Default for ConvertOptions {
	fn default() -> Self {
		Self {
			capacity: DEFAULT_CAPACITY,
		}
	}
}

/// Per-conversion state shared by the builders.
pub struct ConversionContext<'e> {
	/// Content-addressed texture cache.
	pub textures: TextureCache,
	encoder: &'e mut dyn TextureEncoder,
}

impl<'e> ConversionContext<'e> {
	/// Fresh context encoding textures with `encoder`.
	pub fn new(encoder: &'e mut dyn TextureEncoder) -> Self {
		Self {
			textures: TextureCache::new(),
			encoder,
		}
	}

	/// Resolve every source material, encoding textures on first use.
	pub fn materials(&mut self, source: &SceneSource) -> std::result::Result<Vec<Material>, ConversionError> {
		source.materials.iter().map(|material| resolve_material(material, &mut self.textures, &mut *self.encoder)).collect()
	}
}

/// Counts reported after a successful conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConversionStats {
	/// Meshes written.
	pub meshes: usize,
	/// Materials written.
	pub materials: usize,
	/// Distinct textures written.
	pub textures: usize,
	/// Node slots written, scene roots included.
	pub nodes: usize,
	/// Instances written.
	pub instances: usize,
	/// Bytes used by the container.
	pub bytes: usize,
}

/// Build a complete container for `source` inside `arena`.
///
/// Everything that can fail on bad input (mesh attribute policy, texture
/// decoding, node graph shape) runs before the root record is allocated.
pub fn convert_scene(source: &SceneSource, context: &mut ConversionContext<'_>, arena: &mut ArenaWriter) -> Result<ConversionStats> {
	check_instances(source)?;
	let meshes = source.meshes.iter().map(prepare_mesh).collect::<std::result::Result<Vec<PreparedMesh>, _>>()?;
	let materials = context.materials(source)?;
	let (flattened, attachments) = build_scene(source)?;

	let mut table = HeaderTable::begin(arena)?;
	let mesh_header = write_meshes(arena, &meshes)?;
	table.register(mesh_header);
	let material_header = write_materials(arena, &materials, context.textures.textures())?;
	table.register(material_header);
	let scene_header = write_scene(arena, &flattened, &attachments)?;
	table.register(scene_header);
	table.finalize(arena)?;

	let stats = ConversionStats {
		meshes: meshes.len(),
		materials: materials.len(),
		textures: context.textures.len(),
		nodes: flattened.nodes.len(),
		instances: attachments.instances.len(),
		bytes: arena.used(),
	};
	info!(
		"converted {} mesh(es), {} material(s), {} texture(s), {} node(s), {} instance(s) into {} bytes",
		stats.meshes, stats.materials, stats.textures, stats.nodes, stats.instances, stats.bytes
	);
	Ok(stats)
}

fn check_instances(source: &SceneSource) -> std::result::Result<(), ConversionError> {
	for node in &source.nodes {
		for instance in &node.instances {
			if instance.mesh >= source.meshes.len() {
				return Err(ConversionError::SourceIndexOutOfRange {
					what: "instance mesh",
					index: instance.mesh,
					len: source.meshes.len(),
				});
			}
			if instance.material >= source.materials.len() {
				return Err(ConversionError::SourceIndexOutOfRange {
					what: "instance material",
					index: instance.material,
					len: source.materials.len(),
				});
			}
		}
	}
	Ok(())
}

/// Convert into an anonymous mapping and open the result.
pub fn convert_to_memory(source: &SceneSource, options: &ConvertOptions, encoder: &mut dyn TextureEncoder) -> Result<Container> {
	let mut arena = ArenaWriter::in_memory(options.capacity)?;
	convert_scene(source, &mut ConversionContext::new(encoder), &mut arena)?;
	Ok(Container::open(arena.finish()?)?)
}

/// Convert into `output` and open the written file.
///
/// Nothing appears at `output` unless the conversion succeeds.
pub fn convert_to_file(source: &SceneSource, output: impl AsRef<Path>, options: &ConvertOptions, encoder: &mut dyn TextureEncoder) -> Result<Container> {
	let mut arena = ArenaWriter::create_file(output, options.capacity)?;
	convert_scene(source, &mut ConversionContext::new(encoder), &mut arena)?;
	Ok(Container::open(arena.finish()?)?)
}
