//! Knowledge index snapshot files
//!
//! A snapshot is a bincode-encoded header followed by the bincode-encoded
//! entries. The header records the encoder identity, dimension, entry count,
//! an encoder fingerprint and a sha256 checksum of the entry bytes. Files are
//! written through a temporary file and renamed into place.
//!
//! The fingerprint is the sha256 of a fixed reference text's embedding. Two
//! encoders that share an id but disagree on a single bucket produce
//! different fingerprints, which [`load_index_for`] refuses at startup.

use anyhow::{anyhow, bail, Context, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;
use tailor_core::{validate_encoder, Encoder, KnowledgeEntry, KnowledgeIndex};

/// Current snapshot layout version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 2;

const FINGERPRINT_TEXT: &str = "Tailor encoder fingerprint: a red linen summer dress, size M.";

/// sha256 over the little-endian embedding of a fixed text
pub fn encoder_fingerprint(encoder: &dyn Encoder) -> String {
    let mut hasher = Sha256::new();
    hasher.update(encoder.id().as_bytes());
    for component in encoder.encode(FINGERPRINT_TEXT).as_slice() {
        hasher.update(component.to_le_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Metadata stored ahead of the entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub format_version: u32,
    pub encoder_id: String,
    pub dim: usize,
    pub count: usize,
    pub encoder_fingerprint: String,
    pub checksum: String,
}

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    header: SnapshotHeader,
    body: Vec<u8>,
}

/// Write an index snapshot, replacing any existing file atomically.
///
/// `encoder` must be the one that embedded the index.
pub fn save_index(
    path: impl AsRef<Path>,
    index: &KnowledgeIndex,
    encoder: &dyn Encoder,
) -> Result<SnapshotHeader> {
    let path = path.as_ref();
    validate_encoder(encoder, index).context("Index was not built with this encoder")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let body = bincode::serialize(index.entries())
        .map_err(|e| anyhow!("Serialization error: {}", e))?;
    let header = SnapshotHeader {
        format_version: SNAPSHOT_FORMAT_VERSION,
        encoder_id: index.encoder_id().to_string(),
        dim: index.dim(),
        count: index.len(),
        encoder_fingerprint: encoder_fingerprint(encoder),
        checksum: format!("{:x}", Sha256::digest(&body)),
    };
    let file = SnapshotFile {
        header: header.clone(),
        body,
    };
    let data = bincode::serialize(&file).map_err(|e| anyhow!("Serialization error: {}", e))?;

    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(&data))
        .map_err(|e| anyhow!("Failed to write snapshot {}: {}", path.display(), e))?;

    tracing::info!(
        path = %path.display(),
        entries = header.count,
        dim = header.dim,
        encoder = %header.encoder_id,
        "Knowledge snapshot saved"
    );
    Ok(header)
}

/// Read only the header of a snapshot
pub fn read_header(path: impl AsRef<Path>) -> Result<SnapshotHeader> {
    Ok(read_file(path.as_ref())?.header)
}

/// Load and verify an index snapshot
pub fn load_index(path: impl AsRef<Path>) -> Result<KnowledgeIndex> {
    Ok(load_verified(path.as_ref())?.1)
}

/// Load a snapshot for querying with `encoder`.
///
/// Fails when the encoder id, dimension or fingerprint differ from the ones
/// recorded when the snapshot was built.
pub fn load_index_for(path: impl AsRef<Path>, encoder: &dyn Encoder) -> Result<KnowledgeIndex> {
    let path = path.as_ref();
    let (header, index) = load_verified(path)?;

    validate_encoder(encoder, &index)
        .with_context(|| format!("Snapshot {} was built with a different encoder", path.display()))?;

    let fingerprint = encoder_fingerprint(encoder);
    if fingerprint != header.encoder_fingerprint {
        bail!(
            "Encoder fingerprint mismatch in snapshot {}: built with {}, running {}",
            path.display(),
            header.encoder_fingerprint,
            fingerprint
        );
    }
    Ok(index)
}

fn load_verified(path: &Path) -> Result<(SnapshotHeader, KnowledgeIndex)> {
    let SnapshotFile { header, body } = read_file(path)?;

    if header.format_version != SNAPSHOT_FORMAT_VERSION {
        bail!(
            "Unsupported snapshot version {} in {} (expected {})",
            header.format_version,
            path.display(),
            SNAPSHOT_FORMAT_VERSION
        );
    }

    let checksum = format!("{:x}", Sha256::digest(&body));
    if checksum != header.checksum {
        bail!("Checksum mismatch in snapshot {}", path.display());
    }

    let entries: Vec<KnowledgeEntry> =
        bincode::deserialize(&body).map_err(|e| anyhow!("Deserialization error: {}", e))?;
    if entries.len() != header.count {
        bail!(
            "Snapshot {} declares {} entries but holds {}",
            path.display(),
            header.count,
            entries.len()
        );
    }

    let index = KnowledgeIndex::from_entries(header.dim, header.encoder_id.clone(), entries)
        .with_context(|| format!("Invalid entries in snapshot {}", path.display()))?;
    tracing::info!(path = %path.display(), entries = index.len(), dim = index.dim(), "Knowledge snapshot loaded");
    Ok((header, index))
}

fn read_file(path: &Path) -> Result<SnapshotFile> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    bincode::deserialize(&data).map_err(|e| anyhow!("Corrupt snapshot {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tailor_core::{HashingEncoder, Vector};

    fn encoder() -> HashingEncoder {
        HashingEncoder::new(3).unwrap()
    }

    fn sample_index() -> KnowledgeIndex {
        let entries = vec![
            KnowledgeEntry::new(Vector::new(vec![0.0, 1.0, 0.0]))
                .with_colors(["red"])
                .with_styles(["a-line dress"])
                .with_source_text("red a-line dress for a summer wedding"),
            KnowledgeEntry::new(Vector::new(vec![1.0, 0.0, 0.0]))
                .with_materials(["wool"])
                .with_source_text("wool coat for winter commutes"),
        ];
        KnowledgeIndex::from_entries(3, encoder().id(), entries).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge").join("index.bin");
        let index = sample_index();

        let header = save_index(&path, &index, &encoder()).unwrap();
        assert_eq!(header.count, 2);
        assert_eq!(header.encoder_fingerprint, encoder_fingerprint(&encoder()));
        assert_eq!(read_header(&path).unwrap(), header);

        let loaded = load_index_for(&path, &encoder()).unwrap();
        assert_eq!(loaded.dim(), 3);
        assert_eq!(loaded.encoder_id(), encoder().id());
        assert_eq!(loaded.entries(), index.entries());
    }

    #[test]
    fn test_overwrite_existing_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin");

        save_index(&path, &sample_index(), &encoder()).unwrap();
        save_index(&path, &KnowledgeIndex::new(3, encoder().id()), &encoder()).unwrap();

        assert!(load_index(&path).unwrap().is_empty());
    }

    #[test]
    fn test_corrupted_body_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin");
        save_index(&path, &sample_index(), &encoder()).unwrap();

        let mut file: SnapshotFile = bincode::deserialize(&std::fs::read(&path).unwrap()).unwrap();
        let last = file.body.len() - 1;
        file.body[last] ^= 0xff;
        std::fs::write(&path, bincode::serialize(&file).unwrap()).unwrap();

        let err = load_index(&path).unwrap_err();
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn test_tampered_fingerprint_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin");
        save_index(&path, &sample_index(), &encoder()).unwrap();

        let mut file: SnapshotFile = bincode::deserialize(&std::fs::read(&path).unwrap()).unwrap();
        file.header.encoder_fingerprint = "0".repeat(64);
        std::fs::write(&path, bincode::serialize(&file).unwrap()).unwrap();

        // The plain loader does not know which encoder will query the index
        assert!(load_index(&path).is_ok());
        let err = load_index_for(&path, &encoder()).unwrap_err();
        assert!(err.to_string().contains("fingerprint mismatch"));
    }

    #[test]
    fn test_foreign_encoder_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin");
        save_index(&path, &sample_index(), &encoder()).unwrap();

        let other = HashingEncoder::new(4).unwrap();
        assert!(load_index_for(&path, &other).is_err());
        assert!(save_index(&path, &sample_index(), &other).is_err());
    }

    #[test]
    fn test_fingerprint_tracks_encoder() {
        assert_eq!(encoder_fingerprint(&encoder()), encoder_fingerprint(&encoder()));
        assert_ne!(
            encoder_fingerprint(&encoder()),
            encoder_fingerprint(&HashingEncoder::new(4).unwrap())
        );
    }

    #[test]
    fn test_garbage_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin");
        std::fs::write(&path, b"not a snapshot").unwrap();

        assert!(load_index(&path).is_err());
    }

    #[test]
    fn test_missing_snapshot() {
        let err = load_index("/nonexistent/index.bin").unwrap_err();
        assert!(err.to_string().contains("Failed to read snapshot"));
    }
}
