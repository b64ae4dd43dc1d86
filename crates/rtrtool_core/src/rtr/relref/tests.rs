use std::mem::size_of;

use crate::rtr::{ArrayRef, OptionalIndex, Ref};

fn write_pod<T: bytemuck::Pod>(bytes: &mut [u8], at: usize, value: &T) {
	bytes[at..at + size_of::<T>()].copy_from_slice(bytemuck::bytes_of(value));
}

#[test]
fn forward_and_backward_refs_resolve() {
	let mut words = vec![0_u64; 8];
	let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut words);
	write_pod(bytes, 0, &Ref::<u32>::between(0, 40));
	write_pod(bytes, 40, &7_u32);
	write_pod(bytes, 48, &Ref::<u32>::between(48, 40));

	let bytes: &[u8] = bytes;
	let forward: &Ref<u32> = bytemuck::from_bytes(&bytes[0..8]);
	let backward: &Ref<u32> = bytemuck::from_bytes(&bytes[48..56]);
	assert_eq!(forward.offset(), 40);
	assert_eq!(backward.offset(), -8);
	assert_eq!(forward.resolve(bytes), Some(&7));
	assert_eq!(backward.resolve(bytes), Some(&7));
}

#[test]
fn resolution_is_independent_of_base_address() {
	let mut first = vec![0_u64; 4];
	let mut second = vec![0_u64; 4];
	for words in [&mut first, &mut second] {
		let bytes: &mut [u8] = bytemuck::cast_slice_mut(words.as_mut_slice());
		write_pod(bytes, 0, &ArrayRef::<u32>::between(0, 16, 3));
		write_pod(bytes, 16, &[1_u32, 2, 3]);
	}

	for words in [&first, &second] {
		let bytes: &[u8] = bytemuck::cast_slice(words.as_slice());
		let array: &ArrayRef<u32> = bytemuck::from_bytes(&bytes[0..16]);
		assert_eq!(array.resolve(bytes), Some(&[1_u32, 2, 3][..]));
	}
}

#[test]
fn out_of_bounds_targets_resolve_to_none() {
	let mut words = vec![0_u64; 4];
	let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut words);
	write_pod(bytes, 0, &ArrayRef::<u32>::between(0, 16, 5));
	write_pod(bytes, 16, &Ref::<u64>::between(16, 4096));
	write_pod(bytes, 24, &Ref::<u64>::between(24, 0).cast::<u64>());

	let bytes: &[u8] = bytes;
	let array: &ArrayRef<u32> = bytemuck::from_bytes(&bytes[0..16]);
	let far: &Ref<u64> = bytemuck::from_bytes(&bytes[16..24]);
	assert!(array.resolve(bytes).is_none(), "20 bytes from 16 escapes a 32-byte buffer");
	assert!(far.resolve(bytes).is_none());
}

#[test]
fn misaligned_targets_resolve_to_none() {
	let mut words = vec![0_u64; 4];
	let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut words);
	write_pod(bytes, 0, &Ref::<u64>::between(0, 12));

	let bytes: &[u8] = bytes;
	let item: &Ref<u64> = bytemuck::from_bytes(&bytes[0..8]);
	assert!(item.resolve(bytes).is_none());
}

#[test]
fn references_outside_base_do_not_resolve() {
	let words = vec![0_u64; 4];
	let bytes: &[u8] = bytemuck::cast_slice(&words);
	let detached = Ref::<u32>::between(0, 8);
	assert!(detached.resolve(bytes).is_none());
}

#[test]
fn empty_arrays_resolve_without_touching_memory() {
	let words = vec![0_u64; 2];
	let bytes: &[u8] = bytemuck::cast_slice(&words);
	let empty: &ArrayRef<[f32; 3]> = bytemuck::from_bytes(&bytes[0..16]);
	assert_eq!(*empty, ArrayRef::EMPTY);
	assert_eq!(empty.resolve(bytes).map(<[_]>::len), Some(0));
	assert_eq!(ArrayRef::<u8>::between(0, 64, 0), ArrayRef::EMPTY);
}

#[test]
fn optional_index_round_trips_none() {
	assert_eq!(OptionalIndex::default().get(), None);
	assert_eq!(OptionalIndex::from(Some(3)).get(), Some(3));
	assert_eq!(OptionalIndex::from(None), OptionalIndex::NONE);
	assert_eq!(format!("{:?}", OptionalIndex::some(5)), "Some(5)");
}
