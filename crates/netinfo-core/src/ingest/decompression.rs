//! Streaming access to dump files
//!
//! Dumps run to several gigabytes uncompressed, so they are never read into
//! memory. `.gz` files are wrapped in a [`MultiGzDecoder`] (registries
//! concatenate gzip members); anything else is read as plain text.

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::debug;

const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Open a dump file as a buffered line reader
pub fn open_dump(path: &Path) -> io::Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)?;
    let compressed = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
    debug!(file = %path.display(), compressed, "Opening dump");

    if compressed {
        let decoder = MultiGzDecoder::new(BufReader::with_capacity(READ_BUFFER_SIZE, file));
        Ok(Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, decoder)))
    } else {
        Ok(Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Read, Write};

    #[test]
    fn test_open_gzip_dump() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ripe.db.inetnum.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"inetnum: 10.0.0.0/8\n").unwrap();
        encoder.finish().unwrap();

        let mut content = String::new();
        open_dump(&path).unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "inetnum: 10.0.0.0/8\n");
    }

    #[test]
    fn test_open_plain_dump() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arin.db");
        std::fs::write(&path, "route: 8.8.8.0/24\n").unwrap();

        let mut content = String::new();
        open_dump(&path).unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "route: 8.8.8.0/24\n");
    }

    #[test]
    fn test_corrupt_gzip_fails_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lacnic.db.gz");
        std::fs::write(&path, b"definitely not gzip").unwrap();

        let mut content = Vec::new();
        assert!(open_dump(&path).unwrap().read_to_end(&mut content).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = open_dump(Path::new("/nonexistent/afrinic.db.gz")).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
