use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::Cursor;
use std::mem::size_of;
use std::path::PathBuf;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use image::{ExtendedColorType, ImageEncoder};
use log::{debug, info, warn};

use crate::rtr::{ArrayRef, ConversionError};

type ConvResult<T> = std::result::Result<T, ConversionError>;

/// Stored texture: an encoded image blob plus its decoded shape.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Texture {
	/// Encoded image bytes.
	pub blob: ArrayRef<u8>,
	/// Width in pixels.
	pub width: u32,
	/// Height in pixels.
	pub height: u32,
	/// Channel count, 1 to 4.
	pub channels: u32,
	/// Raw [`ColorSpace`] value.
	pub color_space: u32,
}

const _: () = assert!(size_of::<Texture>() == 32);

/// How stored colour values are to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ColorSpace {
	/// sRGB-encoded colour.
	Srgb = 1,
	/// Linear data such as normals, metallic, or roughness.
	Linear = 2,
}

impl ColorSpace {
	/// Decode a stored value.
	pub fn from_u32(raw: u32) -> Option<Self> {
		match raw {
			1 => Some(Self::Srgb),
			2 => Some(Self::Linear),
			_ => None,
		}
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Srgb => "srgb",
			Self::Linear => "linear",
		}
	}
}

/// Where a source image's bytes live.
#[derive(Clone)]
pub enum TextureData {
	/// Image file on disk.
	File(PathBuf),
	/// Encoded image bytes already in memory.
	Embedded(Arc<[u8]>),
}

impl fmt::Debug for TextureData {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::File(path) => f.debug_tuple("File").field(path).finish(),
			Self::Embedded(bytes) => write!(f, "Embedded({} bytes)", bytes.len()),
		}
	}
}

/// Source image with a stable identity used as the cache key.
#[derive(Debug, Clone)]
pub struct TextureSource {
	/// Stable identifier, such as the image URI.
	pub id: String,
	/// Image bytes.
	pub data: TextureData,
}

/// Channel selector string over `r`, `g`, `b`, `a`, `0`, and `1`.
///
/// Its length is the output channel count; empty keeps the source channels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Swizzle(String);

impl Swizzle {
	/// Keep the source channels unchanged.
	pub fn identity() -> Self {
		Self::default()
	}

	/// Validate a selector string.
	pub fn parse(text: &str) -> ConvResult<Self> {
		let valid = text.len() <= 4 && text.bytes().all(|c| matches!(c, b'r' | b'g' | b'b' | b'a' | b'0' | b'1'));
		if !valid {
			return Err(ConversionError::InvalidSwizzle { swizzle: text.to_owned() });
		}
		Ok(Self(text.to_owned()))
	}

	/// Selector string.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Whether the swizzle keeps the source channels.
	pub fn is_identity(&self) -> bool {
		self.0.is_empty()
	}

	/// Rearrange channels of `pixels`.
	pub fn apply(&self, pixels: PixelBuffer) -> PixelBuffer {
		if self.is_identity() {
			return pixels;
		}

		let src = usize::from(pixels.channels);
		let selectors = self.0.as_bytes();
		let mut data = Vec::with_capacity(pixels.data.len() / src.max(1) * selectors.len());
		for px in pixels.data.chunks_exact(src) {
			data.extend(selectors.iter().map(|&sel| select_channel(px, sel)));
		}

		PixelBuffer {
			width: pixels.width,
			height: pixels.height,
			channels: selectors.len() as u8,
			data,
		}
	}
}

fn select_channel(px: &[u8], selector: u8) -> u8 {
	let gray = px.len() <= 2;
	match selector {
		b'r' => px[0],
		b'g' if gray => px[0],
		b'g' => px[1],
		b'b' if gray => px[0],
		b'b' => px[2],
		b'a' if px.len() == 2 => px[1],
		b'a' if px.len() == 4 => px[3],
		b'0' => 0,
		_ => u8::MAX,
	}
}

/// Decoded 8-bit pixels, row-major, interleaved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
	/// Width in pixels.
	pub width: u32,
	/// Height in pixels.
	pub height: u32,
	/// Interleaved channel count, 1 to 4.
	pub channels: u8,
	/// Pixel bytes, `width * height * channels` long.
	pub data: Vec<u8>,
}

/// Re-encoded texture ready to be embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTexture {
	/// Encoded bytes.
	pub blob: Vec<u8>,
	/// Width in pixels.
	pub width: u32,
	/// Height in pixels.
	pub height: u32,
	/// Channel count.
	pub channels: u8,
	/// Interpretation of the colour values.
	pub color_space: ColorSpace,
}

/// Turns decoded pixels into an embeddable blob.
pub trait TextureEncoder {
	/// Encode `pixels` tagged with `color_space`.
	fn encode(&mut self, pixels: &PixelBuffer, color_space: ColorSpace) -> ConvResult<EncodedTexture>;
}

/// Lossless PNG re-encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngEncoder;

impl TextureEncoder for PngEncoder {
	fn encode(&mut self, pixels: &PixelBuffer, color_space: ColorSpace) -> ConvResult<EncodedTexture> {
		let color_type = match pixels.channels {
			1 => ExtendedColorType::L8,
			2 => ExtendedColorType::La8,
			3 => ExtendedColorType::Rgb8,
			4 => ExtendedColorType::Rgba8,
			other => {
				return Err(ConversionError::Texture {
					source_id: String::new(),
					message: format!("cannot encode {other} channels"),
				});
			}
		};

		let mut blob = Vec::new();
		image::codecs::png::PngEncoder::new(Cursor::new(&mut blob))
			.write_image(&pixels.data, pixels.width, pixels.height, color_type)
			.map_err(|err| ConversionError::Texture {
				source_id: String::new(),
				message: err.to_string(),
			})?;

		Ok(EncodedTexture {
			blob,
			width: pixels.width,
			height: pixels.height,
			channels: pixels.channels,
			color_space,
		})
	}
}

/// Decode a source image into 8-bit pixels, keeping its channel count.
pub fn load_pixels(source: &TextureSource) -> ConvResult<PixelBuffer> {
	let texture_err = |message: String| ConversionError::Texture {
		source_id: source.id.clone(),
		message,
	};

	let owned;
	let bytes: &[u8] = match &source.data {
		TextureData::File(path) => {
			owned = fs::read(path).map_err(|err| texture_err(format!("{}: {err}", path.display())))?;
			&owned
		}
		TextureData::Embedded(bytes) => bytes.as_ref(),
	};

	let image = image::load_from_memory(bytes).map_err(|err| texture_err(err.to_string()))?;
	let (width, height) = (image.width(), image.height());
	let (channels, data) = match image.color().channel_count() {
		1 => (1, image.into_luma8().into_raw()),
		2 => (2, image.into_luma_alpha8().into_raw()),
		3 => (3, image.into_rgb8().into_raw()),
		_ => (4, image.into_rgba8().into_raw()),
	};

	Ok(PixelBuffer {
		width,
		height,
		channels,
		data,
	})
}

/// Content-addressed cache of re-encoded textures.
///
/// Keyed by `(source id, swizzle)`. The first request for a key loads,
/// swizzles, and encodes the image; later requests return the same index.
/// The colour space is not part of the key: an image shared between an sRGB
/// and a linear slot keeps the colour space of its first request, and the
/// later mismatch is logged.
#[derive(Debug, Default)]
pub struct TextureCache {
	index: HashMap<(String, Swizzle), u32>,
	textures: Vec<EncodedTexture>,
}

impl TextureCache {
	/// Create an empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Index of the texture for `(source, swizzle)`, encoding it on first use.
	pub fn resolve(&mut self, source: &TextureSource, swizzle: &Swizzle, color_space: ColorSpace, encoder: &mut dyn TextureEncoder) -> ConvResult<u32> {
		let key = (source.id.clone(), swizzle.clone());
		if let Some(&index) = self.index.get(&key) {
			debug!("texture {}:{} reused as {index}", source.id, swizzle.as_str());
			if let Some(cached) = self.textures.get(index as usize)
				&& cached.color_space != color_space
			{
				warn!(
					"texture {}:{} requested as {} but cached as {}",
					source.id,
					swizzle.as_str(),
					color_space.as_str(),
					cached.color_space.as_str()
				);
			}
			return Ok(index);
		}

		let pixels = swizzle.apply(load_pixels(source)?);
		let encoded = encoder.encode(&pixels, color_space).map_err(|err| match err {
			ConversionError::Texture { source_id, message } if source_id.is_empty() => ConversionError::Texture {
				source_id: source.id.clone(),
				message,
			},
			other => other,
		})?;

		let index = u32::try_from(self.textures.len()).map_err(|_| ConversionError::SourceIndexOutOfRange {
			what: "texture",
			index: self.textures.len(),
			len: u32::MAX as usize,
		})?;
		info!("encoded texture {}:{} ({}x{}, {} bytes)", source.id, swizzle.as_str(), encoded.width, encoded.height, encoded.blob.len());
		self.textures.push(encoded);
		self.index.insert(key, index);
		Ok(index)
	}

	/// Encoded textures in index order.
	pub fn textures(&self) -> &[EncodedTexture] {
		&self.textures
	}

	/// Number of distinct textures.
	pub fn len(&self) -> usize {
		self.textures.len()
	}

	/// Whether nothing has been encoded.
	pub fn is_empty(&self) -> bool {
		self.textures.is_empty()
	}
}
