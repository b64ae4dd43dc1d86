use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use cgmath::Matrix4;
use log::debug;

use crate::rtr::{ConversionError, IDENTITY, Result, SourceNode};

/// One entry of the flattened, pre-order node array.
///
/// A node's subtree is the `descendant_count` entries that follow it. The
/// parent sits `parent_offset` slots earlier; zero marks a root.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Node {
	/// Local transform, column-major.
	pub transform: [[f32; 4]; 4],
	/// Slot distance back to the parent, zero for roots.
	pub parent_offset: u32,
	/// Number of slots in this node's subtree, excluding itself.
	pub descendant_count: u32,
}

const _: () = assert!(std::mem::size_of::<Node>() == 72);

impl Node {
	/// Whether this node is a root.
	pub fn is_root(&self) -> bool {
		self.parent_offset == 0
	}
}

/// Output of [`flatten_scenes`].
#[derive(Debug, Clone, Default)]
pub struct FlattenedNodes {
	/// Pre-order node array, sized to the emitted count.
	pub nodes: Vec<Node>,
	/// Slot of each scene's synthetic root, in scene order.
	pub scene_roots: Vec<u32>,
}

/// Flatten every scene of a node forest into one pre-order array.
///
/// Each scene gets a synthetic identity root whose children are the scene's
/// top-level nodes. `visit(source, slot)` runs once per emitted source node
/// after its subtree has been written. Nodes reachable more than once are
/// emitted once per occurrence.
pub fn flatten_scenes<F>(nodes: &[SourceNode], scenes: &[Vec<usize>], visit: F) -> Result<FlattenedNodes>
where
	F: FnMut(usize, u32) -> Result<()>,
{
	let mut flattener = Flattener {
		nodes,
		out: Vec::new(),
		on_path: vec![false; nodes.len()],
		visit,
	};

	let mut scene_roots = Vec::with_capacity(scenes.len());
	for top_level in scenes {
		let root = flattener.push(IDENTITY, None)?;
		for &child in top_level {
			flattener.emit(child, root)?;
		}
		flattener.close(root)?;
		scene_roots.push(slot_u32(root)?);
	}

	let mut out = flattener.out;
	out.shrink_to_fit();
	debug!("flattened {} scene(s) into {} node slots", scene_roots.len(), out.len());
	Ok(FlattenedNodes { nodes: out, scene_roots })
}

struct Flattener<'a, F> {
	nodes: &'a [SourceNode],
	out: Vec<Node>,
	on_path: Vec<bool>,
	visit: F,
}

/// Source node whose children are still being emitted.
#[derive(Clone, Copy)]
struct Frame {
	source: usize,
	slot: usize,
	next: usize,
}

impl<F> Flattener<'_, F>
where
	F: FnMut(usize, u32) -> Result<()>,
{
	fn emit(&mut self, source: usize, parent: usize) -> Result<()> {
		let nodes = self.nodes;
		let mut stack = vec![self.enter(source, parent)?];
		while let Some(frame) = stack.last_mut() {
			match nodes[frame.source].children.get(frame.next) {
				Some(&child) => {
					frame.next += 1;
					let slot = frame.slot;
					stack.push(self.enter(child, slot)?);
				}
				None => {
					let Frame { source, slot, .. } = *frame;
					stack.pop();
					self.close(slot)?;
					self.on_path[source] = false;
					(self.visit)(source, slot_u32(slot)?)?;
				}
			}
		}
		Ok(())
	}

	fn enter(&mut self, source: usize, parent: usize) -> Result<Frame> {
		let nodes = self.nodes;
		let node = nodes.get(source).ok_or(ConversionError::SourceIndexOutOfRange {
			what: "node",
			index: source,
			len: nodes.len(),
		})?;
		if self.on_path[source] {
			return Err(ConversionError::NodeCycle { node: source }.into());
		}
		self.on_path[source] = true;
		let slot = self.push(node.transform, Some(parent))?;
		Ok(Frame { source, slot, next: 0 })
	}

	fn push(&mut self, transform: [[f32; 4]; 4], parent: Option<usize>) -> Result<usize> {
		let slot = self.out.len();
		let parent_offset = parent.map_or(Ok(0), |parent| slot_u32(slot - parent))?;
		self.out.push(Node {
			transform,
			parent_offset,
			descendant_count: 0,
		});
		Ok(slot)
	}

	fn close(&mut self, slot: usize) -> Result<()> {
		self.out[slot].descendant_count = slot_u32(self.out.len() - slot - 1)?;
		Ok(())
	}
}

fn slot_u32(value: usize) -> Result<u32> {
	u32::try_from(value).map_err(|_| {
		ConversionError::SourceIndexOutOfRange {
			what: "node slot",
			index: value,
			len: u32::MAX as usize,
		}
		.into()
	})
}

/// Slot of the root reached by following parent links from `slot`.
///
/// Takes at most depth steps. `None` when a link escapes the array.
pub fn root_of(nodes: &[Node], slot: usize) -> Option<usize> {
	let mut current = slot;
	loop {
		let node = nodes.get(current)?;
		if node.is_root() {
			return Some(current);
		}
		current = current.checked_sub(node.parent_offset as usize)?;
	}
}

/// Accumulated transform from the root down to `slot`, as `root * ... * local`.
///
/// Recomputed on every call; nothing is cached per node.
pub fn world_transform(nodes: &[Node], slot: usize) -> Option<Matrix4<f32>> {
	let mut current = slot;
	let mut acc = Matrix4::from(nodes.get(current)?.transform);
	loop {
		let node = nodes.get(current)?;
		if node.is_root() {
			return Some(acc);
		}
		current = current.checked_sub(node.parent_offset as usize)?;
		acc = Matrix4::from(nodes.get(current)?.transform) * acc;
	}
}

/// Slots of the subtree below `slot`, excluding `slot` itself.
pub fn descendants(nodes: &[Node], slot: usize) -> Range<usize> {
	match nodes.get(slot) {
		Some(node) => {
			let end = (slot + 1).saturating_add(node.descendant_count as usize).min(nodes.len());
			slot + 1..end
		}
		None => 0..0,
	}
}

/// Direct children of `slot` in source order.
pub fn children(nodes: &[Node], slot: usize) -> Children<'_> {
	Children {
		nodes,
		next: descendants(nodes, slot),
	}
}

/// Iterator over direct children; skips each child's subtree.
pub struct Children<'a> {
	nodes: &'a [Node],
	next: Range<usize>,
}

impl Iterator for Children<'_> {
	type Item = usize;

	fn next(&mut self) -> Option<Self::Item> {
		if self.next.is_empty() {
			return None;
		}
		let child = self.next.start;
		let skip = self.nodes.get(child)?.descendant_count as usize;
		self.next.start = child.saturating_add(skip + 1).min(self.next.end);
		Some(child)
	}
}
