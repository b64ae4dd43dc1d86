mod arena;
mod container;
mod convert;
mod error;
#[cfg(test)]
mod fixtures;
mod flatten;
mod geometry;
mod gltf_import;
mod header;
mod material;
mod mesh;
pub(crate) mod relref;
mod scene;
mod source;
mod storage;
mod texture;
mod validate;

/// Sequential arena writer and its typed slots.
pub use arena::{ArenaWriter, ArraySlot, DEFAULT_CAPACITY, Slot, partial_path};
/// Validated container and typed sub-header lookup.
pub use container::Container;
/// Conversion entry points and options.
pub use convert::{ConversionContext, ConversionStats, ConvertOptions, convert_scene, convert_to_file, convert_to_memory};
/// Error and result aliases.
pub use error::{ConversionError, Result, RtrError, ValidationError};
/// Node-tree flattening and parent-chain helpers.
pub use flatten::{Children, FlattenedNodes, Node, children, descendants, flatten_scenes, root_of, world_transform};
/// Normal and tangent generation.
pub use geometry::{compute_normals, compute_tangents};
/// glTF reader producing plain scene arrays.
pub use gltf_import::import_gltf;
/// Root record, sub-header table, and header registry.
pub use header::{HeaderTable, HeaderTag, MAGIC, RootRecord, SubHeader, SubHeaderRef, VERSION, tag_label};
/// Material sub-header and builder.
pub use material::{Material, MaterialFactors, MaterialHeader, MaterialSource, MaterialTextures, resolve_material, write_materials};
/// Mesh sub-header, attribute policy, and builder.
pub use mesh::{Mesh, MeshHeader, MeshSource, MeshView, PreparedMesh, prepare_mesh, write_meshes};
/// Relative reference primitives.
pub use relref::{ArrayRef, OptionalIndex, Ref};
/// Scene sub-header, attachment records, and builder.
pub use scene::{Camera, DirectionalLight, Instance, PointLight, ResolvedInstance, SceneAttachments, SceneHeader, SpotLight, build_scene, write_scene};
/// Plain source scene description.
pub use source::{CameraSource, IDENTITY, InstanceSource, LightKind, LightSource, SceneSource, SourceNode};
/// Read-only container bytes.
pub use storage::Storage;
/// Textures, swizzles, encoders, and the texture cache.
pub use texture::{ColorSpace, EncodedTexture, PixelBuffer, PngEncoder, Swizzle, Texture, TextureCache, TextureData, TextureEncoder, TextureSource, load_pixels};
/// Structural validation.
pub use validate::validate;
