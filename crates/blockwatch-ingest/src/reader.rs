use std::io;
use std::path::Path;

/// Synchronous whole-file read used by the ingestion loop.
pub trait ContentReader {
    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads straight from the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsReader;

impl ContentReader for FsReader {
    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

impl<F> ContentReader for F
where
    F: Fn(&Path) -> io::Result<Vec<u8>>,
{
    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>> {
        self(path)
    }
}
