//! SHA-256 hashing for entry encodings and document content.

use std::io::{self, Read};

use sha2::{Digest, Sha256};

use tradechain_contracts::hash::Sha256Hash;

/// Digest `bytes` with SHA-256.
pub fn sha256(bytes: &[u8]) -> Sha256Hash {
    Sha256Hash(Sha256::digest(bytes).into())
}

/// Digest everything `reader` yields until EOF.
///
/// Reads in fixed-size chunks so large documents are never buffered whole.
/// Any read error aborts the hash; a partial digest is never returned.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<Sha256Hash> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(Sha256Hash(hasher.finalize().into()))
}
