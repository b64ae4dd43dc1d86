use std::path::PathBuf;

use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, RtrError>;

/// Top-level error for opening, converting, and writing `.rtr` containers.
#[derive(Debug, Error)]
pub enum RtrError {
	/// Filesystem or mapping failure after the input was located.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Input file is missing or unreadable.
	#[error("cannot read {path}: {source}")]
	Resource {
		/// Offending path.
		path: PathBuf,
		/// Underlying IO failure.
		source: std::io::Error,
	},
	/// Container failed structural validation.
	#[error("validation failed: {0}")]
	Validation(#[from] ValidationError),
	/// Scene conversion failed.
	#[error("conversion failed: {0}")]
	Conversion(#[from] ConversionError),
	/// Invalid combination of caller inputs.
	#[error("usage: {message}")]
	Usage {
		/// Human-readable explanation.
		message: String,
	},
}

/// Errors produced while validating container bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
	/// Buffer cannot hold the fixed-size root record.
	#[error("buffer too small: {size} bytes, root record needs {need}")]
	Truncated {
		/// Buffer length.
		size: usize,
		/// Minimum required length.
		need: usize,
	},
	/// Leading signature does not identify an `.rtr` container.
	#[error("bad signature {got:?} (expected {expected:?})")]
	BadSignature {
		/// Expected magic bytes.
		expected: [u8; 8],
		/// Observed magic bytes.
		got: [u8; 8],
	},
	/// Container version is not understood by this reader.
	#[error("unsupported container version {version} (expected {expected})")]
	UnsupportedVersion {
		/// Parsed version.
		version: u32,
		/// Supported version.
		expected: u32,
	},
	/// Root record claims more bytes than the buffer holds.
	#[error("declared size {declared} exceeds buffer size {size}")]
	DeclaredSizeMismatch {
		/// Size stored in the root record.
		declared: u64,
		/// Actual buffer length.
		size: usize,
	},
	/// Relative reference resolves outside the container.
	#[error("{what}: reference at {at} (offset {offset}, {len} bytes) escapes container of {size} bytes")]
	OutOfBounds {
		/// Field being resolved.
		what: &'static str,
		/// Position of the reference itself.
		at: usize,
		/// Stored relative offset.
		offset: i64,
		/// Byte length of the referenced range.
		len: u64,
		/// Validated container size.
		size: usize,
	},
	/// Relative reference target is not aligned for its element type.
	#[error("{what}: target {target} is not {align}-byte aligned")]
	Misaligned {
		/// Field being resolved.
		what: &'static str,
		/// Absolute target position.
		target: usize,
		/// Required alignment.
		align: usize,
	},
	/// Two sub-header regions overlap or the table is unsorted.
	#[error("sub-header {index} at {start} overlaps previous region ending at {prev_end}")]
	OverlappingSubHeaders {
		/// Table position of the offending entry.
		index: usize,
		/// Start of the offending region.
		start: usize,
		/// End of the previous region.
		prev_end: usize,
	},
	/// Sub-header region is smaller than its declared record type.
	#[error("sub-header {tag} declares {size} bytes, record needs {need}")]
	SubHeaderTooSmall {
		/// Tag label.
		tag: &'static str,
		/// Declared size.
		size: u64,
		/// Record size for the tag.
		need: usize,
	},
	/// Node parent link points before the first node.
	#[error("node {node}: parent offset {parent_offset} escapes node array")]
	BadParentOffset {
		/// Node slot.
		node: usize,
		/// Stored parent offset.
		parent_offset: u32,
	},
	/// Node subtree extends past the node array.
	#[error("node {node}: descendant count {descendant_count} exceeds node array of {len}")]
	BadDescendantCount {
		/// Node slot.
		node: usize,
		/// Stored descendant count.
		descendant_count: u32,
		/// Node array length.
		len: usize,
	},
	/// Node parent link does not name the innermost subtree enclosing it.
	#[error("node {node}: parent offset {parent_offset} does not name its enclosing node")]
	MisplacedNode {
		/// Node slot.
		node: usize,
		/// Stored parent offset.
		parent_offset: u32,
	},
	/// Scene root reference does not land on a root node entry.
	#[error("scene {scene}: root reference does not name a root node entry")]
	BadSceneRoot {
		/// Scene index.
		scene: usize,
	},
	/// Index field is out of range of its target table.
	#[error("{what}[{at}] = {index} out of range (table has {len})")]
	IndexOutOfRange {
		/// Field description.
		what: &'static str,
		/// Element position holding the index.
		at: usize,
		/// Stored index.
		index: u32,
		/// Target table length.
		len: usize,
	},
	/// Parallel arrays disagree on length.
	#[error("{what}: length {len} does not match expected {expected}")]
	LengthMismatch {
		/// Array description.
		what: &'static str,
		/// Observed length.
		len: u64,
		/// Expected length.
		expected: u64,
	},
}

/// Errors produced while building a container from source scene data.
#[derive(Debug, Error)]
pub enum ConversionError {
	/// A required vertex attribute is absent.
	#[error("mesh {mesh:?}: missing required attribute {attribute}")]
	MissingAttribute {
		/// Mesh name.
		mesh: String,
		/// Attribute label.
		attribute: &'static str,
	},
	/// Mesh arrays are inconsistent.
	#[error("mesh {mesh:?}: {reason}")]
	InvalidMesh {
		/// Mesh name.
		mesh: String,
		/// Description of the inconsistency.
		reason: String,
	},
	/// Source primitive topology is not triangles.
	#[error("mesh {mesh:?}: unsupported primitive mode {mode}")]
	UnsupportedPrimitive {
		/// Mesh name.
		mesh: String,
		/// Source mode label.
		mode: String,
	},
	/// Source resource reference cannot be followed.
	#[error("unsupported resource reference {uri}")]
	UnsupportedUri {
		/// Offending URI.
		uri: String,
	},
	/// Swizzle string is malformed.
	#[error("invalid swizzle {swizzle:?}")]
	InvalidSwizzle {
		/// Offending swizzle.
		swizzle: String,
	},
	/// Source image could not be decoded or re-encoded.
	#[error("texture {source_id}: {message}")]
	Texture {
		/// Texture source identifier.
		source_id: String,
		/// Codec message.
		message: String,
	},
	/// Node hierarchy contains a cycle.
	#[error("node {node} is its own ancestor")]
	NodeCycle {
		/// Source node index where the cycle closed.
		node: usize,
	},
	/// Node or attachment references a missing source entry.
	#[error("{what} index {index} out of range (have {len})")]
	SourceIndexOutOfRange {
		/// Reference description.
		what: &'static str,
		/// Offending index.
		index: usize,
		/// Table length.
		len: usize,
	},
	/// Arena reservation exhausted.
	#[error("arena out of space: need {requested} bytes at {used}, capacity {capacity}")]
	OutOfSpace {
		/// Requested allocation size.
		requested: usize,
		/// Bytes already used.
		used: usize,
		/// Reserved capacity.
		capacity: usize,
	},
	/// Interchange file could not be parsed.
	#[error("gltf: {0}")]
	Gltf(#[from] gltf::Error),
}
