// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SHA-256 checksumming of conversion/validation artifacts.

use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of the file at `path`. Reads the file in fixed
/// chunks rather than loading it whole — NWB files are HDF5-backed and can be
/// large.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn checksum_is_stable_across_calls() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello nwb").unwrap();
        let a = sha256_file(f.path()).unwrap();
        let b = sha256_file(f.path()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn different_content_yields_different_checksum() {
        let mut f1 = tempfile::NamedTempFile::new().unwrap();
        f1.write_all(b"one").unwrap();
        let mut f2 = tempfile::NamedTempFile::new().unwrap();
        f2.write_all(b"two").unwrap();
        assert_ne!(sha256_file(f1.path()).unwrap(), sha256_file(f2.path()).unwrap());
    }
}
