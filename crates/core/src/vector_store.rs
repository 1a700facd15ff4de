use crate::{KnowledgeBaseMetadata, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::warn;

pub const METADATA_FILE: &str = "metadata.json";

/// A vector store counts as populated when its directory exists and holds at
/// least one entry. Its contents are otherwise opaque.
pub fn is_populated(dir: &Path) -> Result<bool> {
    match fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_some()),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
        Err(error) => Err(error.into()),
    }
}

/// Builder metadata, if present and readable.
pub fn read_metadata(dir: &Path) -> Option<KnowledgeBaseMetadata> {
    let path = dir.join(METADATA_FILE);
    let raw = fs::read_to_string(&path).ok()?;

    match serde_json::from_str(&raw) {
        Ok(metadata) => Some(metadata),
        Err(error) => {
            warn!(path = %path.display(), %error, "ignoring unreadable knowledge base metadata");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absent_and_empty_are_unpopulated() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let store = dir.path().join("chroma_db");
        assert!(!is_populated(&store)?);

        fs::create_dir(&store)?;
        assert!(!is_populated(&store)?);

        fs::write(store.join("chroma.sqlite3"), b"")?;
        assert!(is_populated(&store)?);
        Ok(())
    }

    #[test]
    fn malformed_metadata_is_ignored() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        assert!(read_metadata(dir.path()).is_none());

        fs::write(dir.path().join(METADATA_FILE), "{not json")?;
        assert!(read_metadata(dir.path()).is_none());

        fs::write(
            dir.path().join(METADATA_FILE),
            r#"{"created_at": "2024-05-01T08:00:00", "document_count": 2}"#,
        )?;
        let metadata = read_metadata(dir.path()).ok_or("metadata missing")?;
        assert_eq!(metadata.document_count, 2);
        assert!(metadata.documents.is_empty());
        Ok(())
    }
}
