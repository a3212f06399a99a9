mod content_digest_hasher;
mod sha256;

pub use content_digest_hasher::{ContentDigestVerifier, Verification, verify_file};
pub use sha256::{DigestParseError, Sha256Digest};
