//! Fuzz target for archive name validation and USTAR name splitting.
//!
//! Arbitrary strings go through ArchivePath::new; every accepted name is then
//! split into prefix and name fields as a directory and as a file.
//!
//! Run with: cargo +nightly fuzz run archive_path
//!
//! Properties checked:
//! - No `..` or `.` segment, no absolute path and no NUL byte is accepted
//! - A successful split fits the 155/100 byte fields and rejoins to the input
//! - Names of 100 bytes or less never fail to split

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(path_str) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(path) = tarstream::ArchivePath::new(path_str) else {
        return;
    };
    let name = path.as_str();

    assert!(
        !name.split('/').any(|seg| seg == ".." || seg == "."),
        "Relative segment accepted: {:?}",
        name
    );
    assert!(!name.starts_with('/'), "Absolute path accepted: {:?}", name);
    assert!(!name.contains('\0'), "NUL byte accepted: {:?}", name);

    for is_dir in [false, true] {
        let full = if is_dir {
            format!("{}/", name)
        } else {
            name.to_string()
        };
        match tarstream::header::split_name(&path, is_dir) {
            Ok((prefix, rest)) => {
                assert!(prefix.len() <= 155 && rest.len() <= 100);
                let rejoined = if prefix.is_empty() {
                    rest
                } else {
                    format!("{}/{}", prefix, rest)
                };
                assert_eq!(rejoined, full);
            }
            Err(_) => assert!(full.len() > 100, "Short name rejected: {:?}", full),
        }
    }
});
