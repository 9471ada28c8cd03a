//! Reads a corpus of files into a concatenated byte buffer and a byte
//! frequency histogram, skipping unreadable files with a diagnostic rather
//! than aborting the whole read.

use std::collections::HashMap;
use std::path::Path;

/// Reads `paths` in order, accumulating bytes (up to `max_bytes`, if given)
/// and a frequency histogram over them.
///
/// A missing or unreadable file is logged at `warn` level, naming the path
/// and the I/O error, and reading continues with the remaining files —
/// this crate has no notion of a "corrupt corpus" error, only individually
/// skippable inputs.
pub fn read_files<P: AsRef<Path>>(
    paths: &[P],
    max_bytes: Option<usize>,
) -> (HashMap<u8, u64>, Vec<u8>) {
    let mut histogram = HashMap::new();
    let mut bytes = Vec::new();

    'files: for path in paths {
        let path = path.as_ref();
        if let Some(cap) = max_bytes {
            if bytes.len() >= cap {
                break;
            }
        }
        match std::fs::read(path) {
            Ok(data) => {
                for byte in data {
                    if let Some(cap) = max_bytes {
                        if bytes.len() >= cap {
                            continue 'files;
                        }
                    }
                    *histogram.entry(byte).or_insert(0) += 1;
                    bytes.push(byte);
                }
            }
            Err(error) => {
                log::warn!("skipping unreadable corpus file {}: {}", path.display(), error);
            }
        }
    }

    (histogram, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_file(name: &str, contents: &[u8]) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("corpus-test-{}-{}", std::process::id(), name));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[test]
    fn reads_and_concatenates_existing_files() {
        let a = write_temp_file("a", b"aab");
        let b = write_temp_file("b", b"c");

        let (histogram, bytes) = read_files(&[a.clone(), b.clone()], None);
        assert_eq!(bytes, b"aabc");
        assert_eq!(histogram[&b'a'], 2);
        assert_eq!(histogram[&b'b'], 1);
        assert_eq!(histogram[&b'c'], 1);

        std::fs::remove_file(a).unwrap();
        std::fs::remove_file(b).unwrap();
    }

    #[test]
    fn missing_file_is_skipped_not_fatal() {
        let present = write_temp_file("present", b"xy");
        let missing = std::env::temp_dir().join("corpus-test-definitely-missing-file-xyz");

        let (_, bytes) = read_files(&[missing, present.clone()], None);
        assert_eq!(bytes, b"xy");

        std::fs::remove_file(present).unwrap();
    }

    #[test]
    fn stops_once_byte_cap_is_reached() {
        let a = write_temp_file("cap-a", b"abcdef");
        let (_, bytes) = read_files(&[a.clone()], Some(3));
        assert_eq!(bytes, b"abc");
        std::fs::remove_file(a).unwrap();
    }
}
