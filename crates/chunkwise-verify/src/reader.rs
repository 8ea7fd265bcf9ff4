use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::{Checksum, Hasher, Result, Sha256Hasher, VerificationError};

/// Buffer size used when hashing a stream.
pub const BUF_SIZE: usize = 64 * 1024;

/// Streaming reader that hashes data as it passes through.
pub struct VerifiedReader<R, H = Sha256Hasher> {
    reader:     R,
    hasher:     H,
    bytes_read: u64,
}

impl<R> VerifiedReader<R> {
    pub fn sha256(reader: R) -> Self { Self::new(reader, Sha256Hasher::new()) }
}

impl<R, H> VerifiedReader<R, H> {
    pub fn new(reader: R, hasher: H) -> Self {
        Self {
            reader,
            hasher,
            bytes_read: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 { self.bytes_read }
}

impl<R: Read, H: Hasher> Read for VerifiedReader<R, H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
            self.bytes_read += n as u64;
        }
        Ok(n)
    }
}

impl<R: Read, H: Hasher> VerifiedReader<R, H> {
    /// Finalize verification against the expected checksum.
    pub fn finish(self, expected: &Checksum) -> Result<Checksum> {
        let actual = self.hasher.finalize();
        if actual == *expected {
            Ok(actual)
        } else {
            Err(VerificationError::Mismatch {
                expected: *expected,
                actual,
            })
        }
    }
}

/// Tee writer: hashes every byte that is successfully written to the inner sink.
pub struct HashingWriter<W, H = Sha256Hasher> {
    inner:         W,
    hasher:        H,
    bytes_written: u64,
}

impl<W> HashingWriter<W> {
    pub fn sha256(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256Hasher::new(),
            bytes_written: 0,
        }
    }
}

impl<W, H: Hasher> HashingWriter<W, H> {
    pub fn bytes_written(&self) -> u64 { self.bytes_written }

    /// Returns the sink, the checksum of everything written, and the byte count.
    pub fn finish(self) -> (W, Checksum, u64) {
        (self.inner, self.hasher.finalize(), self.bytes_written)
    }
}

impl<W: Write, H: Hasher> Write for HashingWriter<W, H> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> { self.inner.flush() }
}

/// Compute the SHA-256 of a stream with bounded memory.
pub fn digest<R: Read>(mut reader: R) -> io::Result<Checksum> {
    let mut hasher = Sha256Hasher::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

pub fn digest_file(path: impl AsRef<Path>) -> io::Result<Checksum> {
    digest(File::open(path)?)
}

/// Hash a file and compare against `expected`.
pub fn verify_file(path: impl AsRef<Path>, expected: &Checksum) -> Result<Checksum> {
    let actual = digest_file(path)?;
    if actual == *expected {
        Ok(actual)
    } else {
        Err(VerificationError::Mismatch {
            expected: *expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_verified_reader_success() {
        let data = b"test data for verification";
        let expected = Sha256Hasher::digest(data);

        let mut verified = VerifiedReader::sha256(Cursor::new(data));
        let mut sink = Vec::new();
        io::copy(&mut verified, &mut sink).unwrap();

        assert_eq!(verified.bytes_read(), data.len() as u64);
        verified.finish(&expected).unwrap();
        assert_eq!(sink, data);
    }

    #[test]
    fn test_verified_reader_hash_mismatch() {
        let mut verified = VerifiedReader::sha256(Cursor::new(b"test data"));
        io::copy(&mut verified, &mut io::sink()).unwrap();

        let wrong = Checksum::from_bytes([0; 32]);
        match verified.finish(&wrong) {
            Err(VerificationError::Mismatch { expected, actual }) => {
                assert_eq!(expected, wrong);
                assert_ne!(actual, wrong);
            }
            other => panic!("expected Mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_hashing_writer_tees() {
        let mut writer = HashingWriter::sha256(Vec::new());
        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"world").unwrap();
        let (sink, checksum, n) = writer.finish();
        assert_eq!(sink, b"hello world");
        assert_eq!(n, 11);
        assert_eq!(checksum, Sha256Hasher::digest(b"hello world"));
    }

    #[test]
    fn test_digest_spans_multiple_buffers() {
        let data: Vec<u8> = (0..BUF_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        assert_eq!(digest(Cursor::new(&data)).unwrap(), Sha256Hasher::digest(&data));
    }

    #[test]
    fn test_digest_file_empty() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(
            digest_file(file.path()).unwrap().to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_verify_file_mismatch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello\n").unwrap();
        file.flush().unwrap();
        let wrong = Sha256Hasher::digest(b"hello");
        assert!(matches!(
            verify_file(file.path(), &wrong),
            Err(VerificationError::Mismatch { .. })
        ));
    }
}
