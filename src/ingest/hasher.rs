use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use sha2::{Digest, Sha256};
use crate::error::{IndexError, Result};

const CHUNK_SIZE: usize = 8192;

/// Hex SHA-256 of a file's bytes, read in fixed-size chunks.
pub fn calculate_hash(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| IndexError::io(path, e))?;
    hash_reader(BufReader::new(file)).map_err(|e| IndexError::io(path, e))
}

pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0; CHUNK_SIZE];
    loop {
        let count = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..count]);
    }

    let result = hasher.finalize();
    Ok(hex::encode(result))
}
