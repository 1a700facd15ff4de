use crate::{DocumentInfo, DocumentKind, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

pub const SAMPLE_DOCUMENT_NAME: &str = "sample_plans.txt";

const SAMPLE_DOCUMENT: &str = "\
எனது திட்டங்கள்

இந்த வாரம்:
1. திங்கள்: காலை 9 மணிக்கு அலுவலக கூட்டம்
2. செவ்வாய்: மருத்துவரை சந்திக்க வேண்டும்
3. புதன்: வங்கிக்குச் சென்று கணக்கை புதுப்பிக்க வேண்டும்
4. வெள்ளி: குடும்பத்துடன் கோயிலுக்குச் செல்லுதல்

இந்த மாதம்:
- புதிய புத்தகம் ஒன்றை படித்து முடிக்க வேண்டும்
- வீட்டு மின் கட்டணம் செலுத்த வேண்டும்
- தமிழ் இலக்கண வகுப்பில் சேர வேண்டும்

குறிப்புகள்:
உங்கள் சொந்த ஆவணங்களை data/documents கோப்புறையில் சேர்க்கவும்.
.txt, .pdf, .docx கோப்புகள் ஆதரிக்கப்படுகின்றன.
";

/// Files directly inside `folder` whose name matches `*.txt`, `*.pdf` or
/// `*.docx`. Sorted by path.
pub fn discover_documents(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        // a shell glob follows symlinks, so check the target rather than the entry
        if !entry.path().is_file() {
            continue;
        }

        if document_kind(entry.path()).is_some() {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn count_documents(folder: &Path) -> usize {
    discover_documents(folder).len()
}

/// Document inventory, newest first.
pub fn list_documents(folder: &Path) -> Result<Vec<DocumentInfo>> {
    let mut documents = Vec::new();

    for path in discover_documents(folder) {
        let Some(kind) = document_kind(&path) else {
            continue;
        };
        let metadata = fs::metadata(&path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        documents.push(DocumentInfo {
            name,
            size_bytes: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            kind,
            path,
        });
    }

    documents.sort_by(|left, right| right.modified.cmp(&left.modified));
    Ok(documents)
}

/// Writes the sample plan document unless a file with that name is already
/// present. Returns the path when a file was written.
pub fn seed_sample_document(folder: &Path) -> Result<Option<PathBuf>> {
    let target = folder.join(SAMPLE_DOCUMENT_NAME);
    if target.exists() {
        return Ok(None);
    }

    fs::create_dir_all(folder)?;
    fs::write(&target, SAMPLE_DOCUMENT)?;
    info!(path = %target.display(), "sample document written");
    Ok(Some(target))
}

fn document_kind(path: &Path) -> Option<DocumentKind> {
    let name = path.file_name()?.to_str()?;
    // `*` never matches a leading dot
    if name.starts_with('.') {
        return None;
    }
    let extension = path.extension()?.to_str()?;
    DocumentKind::from_extension(extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn counts_only_matching_top_level_files() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let base = dir.path();
        let nested = base.join("archive");
        fs::create_dir(&nested)?;

        for name in ["a.txt", "b.pdf", "c.docx", "notes.md", "scan.PDF", ".hidden.txt", "d.doc"] {
            File::create(base.join(name)).and_then(|mut file| file.write_all(b"x"))?;
        }
        File::create(nested.join("old.txt")).and_then(|mut file| file.write_all(b"x"))?;
        fs::create_dir(base.join("folder.txt"))?;

        let files = discover_documents(base);
        let names: Vec<_> = files
            .iter()
            .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
            .collect();

        assert_eq!(names, vec!["a.txt", "b.pdf", "c.docx"]);
        assert_eq!(count_documents(base), 3);
        Ok(())
    }

    #[test]
    fn missing_folder_counts_zero() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        assert_eq!(count_documents(&dir.path().join("absent")), 0);
        Ok(())
    }

    #[test]
    fn sample_document_is_not_overwritten() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let written = seed_sample_document(dir.path())?;
        assert!(written.is_some());

        let target = dir.path().join(SAMPLE_DOCUMENT_NAME);
        fs::write(&target, "என் குறிப்புகள்")?;

        assert_eq!(seed_sample_document(dir.path())?, None);
        assert_eq!(fs::read_to_string(&target)?, "என் குறிப்புகள்");
        assert_eq!(count_documents(dir.path()), 1);
        Ok(())
    }

    #[test]
    fn list_reports_kind_and_size() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("plan.txt"), "திட்டம்")?;
        fs::write(dir.path().join("ignored.md"), "# no")?;

        let documents = list_documents(dir.path())?;
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].name, "plan.txt");
        assert_eq!(documents[0].kind, DocumentKind::Txt);
        assert_eq!(documents[0].size_bytes, "திட்டம்".len() as u64);
        Ok(())
    }
}
