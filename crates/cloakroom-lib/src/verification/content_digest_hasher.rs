use super::Sha256Digest;
use digest::Digest;
use sha2::Sha256;
use std::path::Path;
use tokio::io::AsyncReadExt;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Result of comparing content against an expected digest.
///
/// A mismatch is an ordinary answer, not an error: the caller decides whether
/// it warrants a retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Match,
    Mismatch {
        expected: Sha256Digest,
        actual: Sha256Digest,
    },
}

impl Verification {
    pub fn is_match(&self) -> bool {
        matches!(self, Verification::Match)
    }
}

pub struct ContentDigestVerifier {
    hasher: Sha256,
    expected_digest: Sha256Digest,
}

impl ContentDigestVerifier {
    #[inline]
    pub fn new(expected_digest: Sha256Digest) -> Self {
        Self {
            hasher: Sha256::new(),
            expected_digest,
        }
    }

    #[inline]
    pub fn update(&mut self, data: impl AsRef<[u8]>) {
        Digest::update(&mut self.hasher, data.as_ref());
    }

    pub fn verify(self) -> Verification {
        let actual = Sha256Digest::from_bytes(self.hasher.finalize().into());

        if actual == self.expected_digest {
            Verification::Match
        } else {
            Verification::Mismatch {
                expected: self.expected_digest,
                actual,
            }
        }
    }
}

/// Hashes the file at `path` in fixed-size chunks and compares the result
/// with `expected`.
pub async fn verify_file(path: &Path, expected: &Sha256Digest) -> std::io::Result<Verification> {
    let file = tokio::fs::File::open(path).await?;
    let mut reader = tokio::io::BufReader::new(file);
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    let mut verifier = ContentDigestVerifier::new(*expected);

    loop {
        let bytes_read = reader.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        verifier.update(&buffer[..bytes_read]);
    }

    Ok(verifier.verify())
}
