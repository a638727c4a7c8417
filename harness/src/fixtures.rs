//! Fixture preparation for the server-under-test
//!
//! The server role materializes the files the benchmark scenarios request:
//! two synthetic payloads of known size and one reference document shipped
//! with the harness. The generated bytes are kept in memory so the health
//! check can verify exact content without re-reading from disk.

use std::fs;
use std::io;
use std::path::Path;

use tracing::info;

/// Repeating pattern used for synthetic payloads
const PATTERN: &[u8] = b"0123456789ABCDEF";

/// Size of the `small` fixture
pub const SMALL_SIZE: usize = 1024;

/// Size of the `large` fixture, roughly the combined weight of an
/// average web page
pub const LARGE_SIZE: usize = 2250 * 1024;

/// Filename of the externally supplied reference document, looked up
/// under `<assets>/res/`
pub const REFERENCE_DOC: &str = "www.cs.vt.edu-20160222.html";

/// Fixture content as written to the server root.
#[derive(Debug, Clone)]
pub struct Fixtures {
    pub small: Vec<u8>,
    pub large: Vec<u8>,
    pub reference: Vec<u8>,
}

/// Deterministic synthetic payload of the given size.
///
/// Sizes are expected to be multiples of the 16-byte pattern; any
/// remainder is simply dropped, matching the served file sizes.
pub fn synthetic_content(size: usize) -> Vec<u8> {
    PATTERN.repeat(size / PATTERN.len())
}

/// Write all fixture files under `root`, creating the directory if absent.
///
/// The reference document is copied byte-for-byte from
/// `<assets_dir>/res/`, so the health check's exact-content probe also
/// verifies the server does not mangle real-world HTML.
pub fn prepare(root: &Path, assets_dir: &Path) -> io::Result<Fixtures> {
    if !root.is_dir() {
        fs::create_dir_all(root)?;
    }
    info!("using {:?} to store fixture files", root);

    let fixtures = Fixtures {
        small: synthetic_content(SMALL_SIZE),
        large: synthetic_content(LARGE_SIZE),
        reference: fs::read(assets_dir.join("res").join(REFERENCE_DOC))?,
    };

    fs::write(root.join("small"), &fixtures.small)?;
    fs::write(root.join("large"), &fixtures.large)?;
    fs::write(root.join(REFERENCE_DOC), &fixtures.reference)?;

    Ok(fixtures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_content_repeats_pattern() {
        let content = synthetic_content(64);
        assert_eq!(content.len(), 64);
        assert_eq!(&content[..16], b"0123456789ABCDEF");
        assert_eq!(&content[48..], b"0123456789ABCDEF");
    }

    #[test]
    fn test_fixture_sizes() {
        assert_eq!(synthetic_content(SMALL_SIZE).len(), 1024);
        assert_eq!(synthetic_content(LARGE_SIZE).len(), 2_304_000);
    }

    #[test]
    fn test_prepare_creates_root_and_files() {
        let assets = tempfile::tempdir().unwrap();
        std::fs::create_dir(assets.path().join("res")).unwrap();
        std::fs::write(assets.path().join("res").join(REFERENCE_DOC), b"<html>hi</html>")
            .unwrap();

        let scratch = tempfile::tempdir().unwrap();
        let root = scratch.path().join("serverroot");
        let fixtures = prepare(&root, assets.path()).unwrap();

        assert_eq!(std::fs::read(root.join("small")).unwrap(), fixtures.small);
        assert_eq!(std::fs::read(root.join("large")).unwrap(), fixtures.large);
        assert_eq!(
            std::fs::read(root.join(REFERENCE_DOC)).unwrap(),
            b"<html>hi</html>"
        );
    }

    #[test]
    fn test_prepare_fails_without_reference_doc() {
        let assets = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        assert!(prepare(&scratch.path().join("root"), assets.path()).is_err());
    }
}
