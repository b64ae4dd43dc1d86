use crate::rtr::{ArenaWriter, ConversionError, RtrError, partial_path};

#[test]
fn allocations_are_aligned_and_zeroed() {
	let mut arena = ArenaWriter::in_memory(4096).expect("arena reserves");
	let byte = arena.allocate_bytes(3, 1).expect("byte allocation");
	let word = arena.alloc_zeroed_array::<u64>(4).expect("word allocation");
	assert_eq!(byte, 0);
	assert_eq!(word.pos() % 8, 0);
	assert_eq!(word.pos(), 8);
	assert!(arena.bytes()[word.pos()..].iter().all(|&b| b == 0));
	assert_eq!(arena.used(), 8 + 32);
}

#[test]
fn earlier_positions_keep_their_contents() {
	let mut arena = ArenaWriter::in_memory(1 << 20).expect("arena reserves");
	let first = arena.alloc(&0xdead_beef_u32).expect("first value");
	for chunk in 0..64_u32 {
		arena.alloc_array(&[chunk; 256]).expect("filler");
	}
	assert_eq!(*arena.get_mut(first), 0xdead_beef);
}

#[test]
fn exceeding_capacity_is_out_of_space() {
	let mut arena = ArenaWriter::in_memory(64).expect("arena reserves");
	arena.allocate_bytes(60, 1).expect("fits");
	let err = arena.allocate_bytes(8, 8).expect_err("no room left");
	assert!(matches!(
		err,
		RtrError::Conversion(ConversionError::OutOfSpace {
			requested: 8,
			used: 60,
			capacity: 64
		})
	));
	assert_eq!(arena.used(), 60, "failed allocation leaves the arena unchanged");
}

#[test]
fn memory_finish_trims_to_used_length() {
	let mut arena = ArenaWriter::in_memory(4096).expect("arena reserves");
	arena.alloc_array(&[1_u16, 2, 3]).expect("values");
	let storage = arena.finish().expect("finish");
	assert_eq!(storage.len(), 6);
	assert_eq!(storage.bytes(), &[1, 0, 2, 0, 3, 0]);
	assert_eq!(storage.bytes().as_ptr() as usize % 4096, 0, "storage is page aligned");
}

#[test]
fn file_finish_renames_partial_output() {
	let dir = tempfile::tempdir().expect("temp dir");
	let output = dir.path().join("scene.rtr");
	let mut arena = ArenaWriter::create_file(&output, 1 << 16).expect("file arena");
	assert!(partial_path(&output).exists());
	assert!(!output.exists());

	arena.alloc_array(b"RTRFILE\0").expect("bytes");
	arena.alloc_zeroed_array::<u64>(4).expect("padding");
	let storage = arena.finish().expect("finish");
	assert_eq!(storage.len(), 40);
	assert!(output.exists());
	assert!(!partial_path(&output).exists());
	assert_eq!(std::fs::metadata(&output).expect("metadata").len(), 40);
}

#[test]
fn dropped_file_writer_leaves_nothing_behind() {
	let dir = tempfile::tempdir().expect("temp dir");
	let output = dir.path().join("scene.rtr");
	{
		let mut arena = ArenaWriter::create_file(&output, 1 << 16).expect("file arena");
		arena.alloc(&7_u64).expect("value");
	}
	assert!(!output.exists());
	assert!(!partial_path(&output).exists());
}

#[test]
fn partial_path_appends_suffix() {
	let path = std::path::Path::new("out/scene.rtr");
	assert_eq!(partial_path(path), std::path::Path::new("out/scene.rtr.partial"));
}
