use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};
use log::debug;

use crate::rtr::{ArenaWriter, ArrayRef, ColorSpace, ConversionError, EncodedTexture, HeaderTag, OptionalIndex, Result, Slot, SubHeader, Swizzle, Texture, TextureCache, TextureEncoder, TextureSource};

/// Sub-header holding materials and the textures they index.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaterialHeader {
	/// Material table.
	pub materials: ArrayRef<Material>,
	/// Texture table indexed by [`MaterialTextures`].
	pub textures: ArrayRef<Texture>,
}

impl SubHeader for MaterialHeader {
	const TAG: HeaderTag = HeaderTag::Material;
}

/// Metallic-roughness material.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Material {
	/// Scalar factors.
	pub factors: MaterialFactors,
	/// Texture table indices.
	pub textures: MaterialTextures,
}

/// Factors multiplied into the texture samples.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialFactors {
	/// Linear RGBA base colour.
	pub color: [f32; 4],
	/// Metalness.
	pub metallic: f32,
	/// Perceptual roughness.
	pub roughness: f32,
}

/// Optional texture indices.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct MaterialTextures {
	/// sRGB base colour.
	pub color: OptionalIndex,
	/// Single-channel linear metalness.
	pub metallic: OptionalIndex,
	/// Single-channel linear roughness.
	pub roughness: OptionalIndex,
	/// Linear tangent-space normal map.
	pub normal: OptionalIndex,
}

const _: () = assert!(size_of::<Material>() == 40);

impl MaterialTextures {
	/// All four slots with their labels, in field order.
	pub fn slots(&self) -> [(&'static str, OptionalIndex); 4] {
		[("color", self.color), ("metallic", self.metallic), ("roughness", self.roughness), ("normal", self.normal)]
	}
}

/// Source material as supplied by an importer.
#[derive(Debug, Clone)]
pub struct MaterialSource {
	/// Display name.
	pub name: String,
	/// Linear RGBA base colour factor.
	pub base_color: [f32; 4],
	/// Metalness factor.
	pub metallic: f32,
	/// Roughness factor.
	pub roughness: f32,
	/// Base colour image.
	pub color_texture: Option<TextureSource>,
	/// Packed image with roughness in `g` and metalness in `b`.
	pub metallic_roughness_texture: Option<TextureSource>,
	/// Tangent-space normal map.
	pub normal_texture: Option<TextureSource>,
}

impl Default for MaterialSource {
	fn default() -> Self {
		Self {
			name: String::from("default"),
			base_color: [1.0; 4],
			metallic: 1.0,
			roughness: 1.0,
			color_texture: None,
			metallic_roughness_texture: None,
			normal_texture: None,
		}
	}
}

/// Resolve a source material's textures through `cache`.
pub fn resolve_material(source: &MaterialSource, cache: &mut TextureCache, encoder: &mut dyn TextureEncoder) -> std::result::Result<Material, ConversionError> {
	let mut texture = |image: &Option<TextureSource>, swizzle: &str, color_space: ColorSpace| -> std::result::Result<OptionalIndex, ConversionError> {
		match image {
			Some(image) => Ok(OptionalIndex::some(cache.resolve(image, &Swizzle::parse(swizzle)?, color_space, &mut *encoder)?)),
			None => Ok(OptionalIndex::NONE),
		}
	};

	let textures = MaterialTextures {
		color: texture(&source.color_texture, "", ColorSpace::Srgb)?,
		metallic: texture(&source.metallic_roughness_texture, "b", ColorSpace::Linear)?,
		roughness: texture(&source.metallic_roughness_texture, "g", ColorSpace::Linear)?,
		normal: texture(&source.normal_texture, "", ColorSpace::Linear)?,
	};

	Ok(Material {
		factors: MaterialFactors {
			color: source.base_color,
			metallic: source.metallic,
			roughness: source.roughness,
		},
		textures,
	})
}

/// Lay out materials and encoded textures as one material sub-header.
pub fn write_materials(arena: &mut ArenaWriter, materials: &[Material], textures: &[EncodedTexture]) -> Result<Slot<MaterialHeader>> {
	let header = arena.alloc(&MaterialHeader::zeroed())?;
	let material_table = arena.alloc_array(materials)?;
	let texture_table = arena.alloc_zeroed_array::<Texture>(textures.len())?;
	*arena.get_mut(header) = MaterialHeader {
		materials: material_table.array_ref_from(header.pos() + offset_of!(MaterialHeader, materials)),
		textures: texture_table.array_ref_from(header.pos() + offset_of!(MaterialHeader, textures)),
	};

	for (index, texture) in textures.iter().enumerate() {
		let blob = arena.alloc_array(&texture.blob)?;
		let at = texture_table.element_pos(index);
		*arena.get_mut(texture_table.element(index)) = Texture {
			blob: blob.array_ref_from(at + offset_of!(Texture, blob)),
			width: texture.width,
			height: texture.height,
			channels: u32::from(texture.channels),
			color_space: texture.color_space as u32,
		};
	}

	debug!("wrote {} material(s), {} texture(s)", materials.len(), textures.len());
	Ok(header)
}

impl MaterialHeader {
	/// Material records.
	pub fn materials<'a>(&'a self, base: &'a [u8]) -> &'a [Material] {
		self.materials.resolve(base).unwrap_or_default()
	}

	/// Texture records.
	pub fn textures<'a>(&'a self, base: &'a [u8]) -> &'a [Texture] {
		self.textures.resolve(base).unwrap_or_default()
	}
}

impl Texture {
	/// Encoded bytes of this texture.
	pub fn blob<'a>(&'a self, base: &'a [u8]) -> &'a [u8] {
		self.blob.resolve(base).unwrap_or_default()
	}
}
