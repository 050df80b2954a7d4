//! Atomic chunk I/O: every write goes through a temp file, fsync, then
//! rename, so a partial write never becomes visible.

use objectio_common::{hash::blake2b256, Checksum, Error, Result};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

/// Writes `data` to `path` atomically: `<path>.tmp.<pid>` → fsync →
/// rename. Creates missing parent directories (mode 0755 on unix).
pub fn write_chunk(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o755);
            let _ = fs::set_permissions(parent, perms);
        }
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(format!(".tmp.{}", std::process::id()));
    let tmp_path = path.with_file_name(tmp_name);
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Reads the full contents of a chunk file.
pub fn read_chunk(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::not_found(format!("chunk not found: {}", path.display()))
        } else {
            Error::Io(e)
        }
    })?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Deletes a chunk file; tolerates it already being absent.
pub fn delete_chunk(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Io(e)),
    }
}

#[must_use]
pub fn exists(path: &Path) -> bool {
    path.is_file()
}

/// Recomputes the BLAKE2b-256 digest of `data` and compares it against
/// `checksum` in constant time.
#[must_use]
pub fn verify(data: &[u8], checksum: &Checksum) -> bool {
    checksum.verify(data)
}

/// Computes the checksum a freshly written chunk should carry.
#[must_use]
pub fn compute_checksum(data: &[u8]) -> Checksum {
    Checksum::of(data)
}

#[must_use]
pub fn blake2b256_digest(data: &[u8]) -> [u8; 32] {
    blake2b256(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hh").join("16hex").join("part.1");
        write_chunk(&path, b"hello shard").unwrap();
        assert!(exists(&path));
        let data = read_chunk(&path).unwrap();
        assert_eq!(data, b"hello shard");
    }

    #[test]
    fn write_leaves_no_tmp_file_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("part.1");
        write_chunk(&path, b"data").unwrap();
        let siblings: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(siblings.len(), 1);
    }

    #[test]
    fn read_missing_chunk_is_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing");
        let err = read_chunk(&path).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x").join("part.1");
        write_chunk(&path, b"data").unwrap();
        delete_chunk(&path).unwrap();
        delete_chunk(&path).unwrap();
        assert!(!exists(&path));
    }

    #[test]
    fn verify_detects_corruption() {
        let checksum = compute_checksum(b"original data");
        assert!(verify(b"original data", &checksum));
        assert!(!verify(b"tampered data!", &checksum));
    }
}
