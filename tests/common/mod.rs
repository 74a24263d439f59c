//! Shared test utilities for integration tests.
//!
//! Fixture trees are built in temporary directories, and produced archives
//! are read back with the `tar` crate so every check goes through an
//! independent reader.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Read};

use tarstream::TarStream;
use tempfile::TempDir;

/// One node of a fixture tree: a directory, or a file with its content.
pub enum Node<'a> {
    Dir(&'a str),
    File(&'a str, &'a [u8]),
}

/// Creates a temporary directory holding the given nodes.
///
/// Paths are relative to the temporary directory; parent directories are
/// created as needed.
pub fn build_tree(nodes: &[Node<'_>]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for node in nodes {
        match node {
            Node::Dir(path) => {
                fs::create_dir_all(dir.path().join(path)).expect("Failed to create dir");
            }
            Node::File(path, data) => {
                let full = dir.path().join(path);
                if let Some(parent) = full.parent() {
                    fs::create_dir_all(parent).expect("Failed to create parent");
                }
                fs::write(full, data).expect("Failed to write file");
            }
        }
    }
    dir
}

/// Creates the `data/` tree with one 10-byte file used across tests.
pub fn data_tree() -> TempDir {
    build_tree(&[Node::Dir("data"), Node::File("data/file1.txt", b"0123456789")])
}

/// Pulls every chunk, including the terminal empty one.
pub fn collect_chunks(stream: &mut TarStream) -> Vec<Vec<u8>> {
    let mut chunks = Vec::new();
    loop {
        let chunk = stream.next_chunk().expect("Failed to pull chunk");
        let done = chunk.is_empty();
        chunks.push(chunk);
        if done {
            break;
        }
    }
    chunks
}

/// Pulls the whole archive into one buffer.
pub fn collect_bytes(stream: &mut TarStream) -> Vec<u8> {
    collect_chunks(stream).concat()
}

/// An entry as seen by the `tar` crate.
#[derive(Debug)]
pub struct ReadEntry {
    pub path: String,
    pub entry_type: tar::EntryType,
    pub size: u64,
    pub mode: u32,
    pub mtime: u64,
    pub link_name: Option<String>,
    pub data: Vec<u8>,
}

impl ReadEntry {
    pub fn is_dir(&self) -> bool {
        self.entry_type.is_dir()
    }

    pub fn is_file(&self) -> bool {
        self.entry_type.is_file()
    }
}

/// Parses an archive with the `tar` crate.
pub fn read_archive(bytes: &[u8]) -> Vec<ReadEntry> {
    let mut archive = tar::Archive::new(Cursor::new(bytes));
    let mut result = Vec::new();
    for entry in archive.entries().expect("Failed to list entries") {
        let mut entry = entry.expect("Failed to read entry");
        let header = entry.header();
        let entry_type = header.entry_type();
        let size = header.size().expect("Bad size field");
        let mode = header.mode().expect("Bad mode field");
        let mtime = header.mtime().expect("Bad mtime field");
        let path = entry
            .path()
            .expect("Bad path")
            .to_string_lossy()
            .trim_end_matches('/')
            .to_string();
        let link_name = entry
            .link_name()
            .expect("Bad link name")
            .map(|l| l.to_string_lossy().into_owned());

        let mut data = Vec::new();
        entry.read_to_end(&mut data).expect("Failed to read content");
        result.push(ReadEntry {
            path,
            entry_type,
            size,
            mode,
            mtime,
            link_name,
            data,
        });
    }
    result
}

/// Returns the archive names in order.
pub fn entry_names(entries: &[ReadEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.path.as_str()).collect()
}

/// Size a tree must stream to: headers, rounded content, terminator.
pub fn expected_size(entry_count: u64, file_sizes: &[u64]) -> u64 {
    512 * entry_count
        + file_sizes
            .iter()
            .map(|&s| tarstream::block::round_up(s))
            .sum::<u64>()
        + 1024
}
