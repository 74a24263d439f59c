//! Property-based tests using proptest.
//!
//! These tests verify the size arithmetic and chunking invariants of the
//! tarstream library using randomly generated inputs.

mod common;

use proptest::prelude::*;
use tarstream::block::{BLOCK_SIZE, entry_footprint, padding, round_up};
use tarstream::header::split_name;
use tarstream::{ArchivePath, StreamConfig, TarStream};

use common::{collect_chunks, read_archive};

/// Strategy for generating valid archive path strings.
///
/// - 1-6 path components separated by '/'
/// - Each component is 1-40 alphanumeric characters with optional underscores/dots/dashes
/// - Excludes "." and ".." segments
fn valid_path_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-zA-Z0-9][a-zA-Z0-9_.-]{0,39}", 1..6)
        .prop_map(|parts| parts.join("/"))
        .prop_filter("must not contain invalid segments", |s| {
            !s.split('/').any(|seg| seg == "." || seg == "..")
        })
}

proptest! {
    /// Content plus padding is always the next block boundary.
    #[test]
    fn padding_reaches_block_boundary(size in 0u64..(1 << 40), block in 1u64..8192) {
        let pad = padding(size, block);
        prop_assert!(pad < block);
        prop_assert_eq!((size + pad) % block, 0);
        if size % block == 0 {
            prop_assert_eq!(pad, 0);
        }
    }

    /// Every entry occupies a whole number of blocks, at least one.
    #[test]
    fn footprint_is_block_aligned(size in 0u64..(1 << 40), regular in any::<bool>()) {
        let footprint = entry_footprint(regular, size);
        prop_assert_eq!(footprint % BLOCK_SIZE, 0);
        prop_assert!(footprint >= BLOCK_SIZE);
        if regular {
            prop_assert_eq!(footprint, BLOCK_SIZE + round_up(size));
        } else {
            prop_assert_eq!(footprint, BLOCK_SIZE);
        }
    }

    /// Valid paths should always parse and keep their spelling.
    #[test]
    fn valid_paths_parse_successfully(path in valid_path_strategy()) {
        let parsed = ArchivePath::new(&path);
        prop_assert!(parsed.is_ok(), "Valid path '{}' failed to parse: {:?}", path, parsed);
        let parsed = parsed.unwrap();
        prop_assert_eq!(parsed.as_str(), path.as_str());
    }

    /// A successful name split always fits the header fields and loses nothing.
    #[test]
    fn split_name_fits_fields(path in valid_path_strategy(), is_dir in any::<bool>()) {
        let full = if is_dir { format!("{}/", path) } else { path.clone() };
        let archive_path = ArchivePath::new(&path).unwrap();
        match split_name(&archive_path, is_dir) {
            Ok((prefix, name)) => {
                prop_assert!(prefix.len() <= 155);
                prop_assert!(name.len() <= 100);
                prop_assert!(!name.is_empty());
                if prefix.is_empty() {
                    prop_assert_eq!(name, full);
                } else {
                    prop_assert_eq!(format!("{}/{}", prefix, name), full);
                }
            }
            Err(_) => prop_assert!(full.len() > 100),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// The announced size matches the bytes produced, for any files and chunk size.
    #[test]
    fn stream_size_matches_announcement(
        sizes in proptest::collection::vec(0usize..3000, 0..6),
        buffer in 1usize..2048,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("tree");
        std::fs::create_dir(&root).unwrap();
        for (i, size) in sizes.iter().enumerate() {
            std::fs::write(root.join(format!("f{:02}", i)), vec![i as u8; *size]).unwrap();
        }

        let mut stream =
            TarStream::from_path(&root, StreamConfig::new().buffer_size(buffer)).unwrap();
        let file_sizes: Vec<u64> = sizes.iter().map(|&s| s as u64).collect();
        let expected = common::expected_size(sizes.len() as u64 + 1, &file_sizes);
        prop_assert_eq!(stream.tell(), expected);

        let chunks = collect_chunks(&mut stream);
        let (last, body) = chunks.split_last().unwrap();
        prop_assert!(last.is_empty());
        for (i, chunk) in body.iter().enumerate() {
            if i + 1 < body.len() {
                prop_assert_eq!(chunk.len(), buffer);
            } else {
                prop_assert!(!chunk.is_empty() && chunk.len() <= buffer);
            }
        }

        let bytes = chunks.concat();
        prop_assert_eq!(bytes.len() as u64, expected);

        let entries = read_archive(&bytes);
        prop_assert_eq!(entries.len(), sizes.len() + 1);
        for (i, size) in sizes.iter().enumerate() {
            prop_assert_eq!(&entries[i + 1].data, &vec![i as u8; *size]);
        }
    }
}
