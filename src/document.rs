use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use thiserror::Error;

/// Upload cap advertised on the upload screen: 20 MiB.
pub const MAX_DOCUMENT_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Jpeg,
    Png,
}

impl DocumentKind {
    /// Infer the document kind from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "jpg" | "jpeg" => Some(DocumentKind::Jpeg),
            "png" => Some(DocumentKind::Png),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Jpeg => "image/jpeg",
            DocumentKind::Png => "image/png",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "PDF",
            DocumentKind::Jpeg => "JPG",
            DocumentKind::Png => "PNG",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("Please upload a PDF, JPG, or PNG file.")]
    InvalidType,
    #[error("Please upload a file smaller than 20MB.")]
    TooLarge,
}

/// Client-side validation of a candidate file. Pure; never touches the disk.
pub fn validate(path: &Path, size_bytes: u64) -> Result<DocumentKind, UploadError> {
    let kind = DocumentKind::from_path(path).ok_or(UploadError::InvalidType)?;
    if size_bytes > MAX_DOCUMENT_BYTES {
        return Err(UploadError::TooLarge);
    }
    Ok(kind)
}

/// A document that passed validation and was read into memory.
/// Ownership moves from the upload screen to the analysis screen.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: String,
    pub kind: DocumentKind,
    pub size_bytes: u64,
    pub data: Vec<u8>,
}

impl UploadedDocument {
    pub async fn read(path: &Path, kind: DocumentKind) -> Result<Self> {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("could not read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            kind,
            size_bytes: data.len() as u64,
            data,
        })
    }
}

/// Human-readable size, two decimals with trailing zeros dropped.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut exp = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && exp < UNITS.len() - 1 {
        value /= 1024.0;
        exp += 1;
    }
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", text, UNITS[exp])
}

#[derive(Debug, Clone)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub size_bytes: u64,
}

/// Directory listing backing the upload screen. Hidden entries are skipped,
/// directories sort before files, and ".." leads when a parent exists.
pub struct FileBrowser {
    pub dir: PathBuf,
    pub entries: Vec<FileEntry>,
}

impl FileBrowser {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let mut browser = Self {
            dir: dir.into(),
            entries: Vec::new(),
        };
        browser.refresh()?;
        Ok(browser)
    }

    pub fn refresh(&mut self) -> Result<()> {
        let mut dirs: Vec<FileEntry> = Vec::new();
        let mut files: Vec<FileEntry> = Vec::new();

        let read = fs::read_dir(&self.dir)
            .with_context(|| format!("could not read directory {}", self.dir.display()))?;
        for entry in read.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let Ok(meta) = entry.metadata() else { continue };
            let item = FileEntry {
                name,
                path: entry.path(),
                is_dir: meta.is_dir(),
                size_bytes: meta.len(),
            };
            if item.is_dir {
                dirs.push(item);
            } else {
                files.push(item);
            }
        }

        dirs.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        files.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        self.entries.clear();
        if let Some(parent) = self.dir.parent() {
            self.entries.push(FileEntry {
                name: "..".to_string(),
                path: parent.to_path_buf(),
                is_dir: true,
                size_bytes: 0,
            });
        }
        self.entries.extend(dirs);
        self.entries.extend(files);
        Ok(())
    }

    pub fn entry(&self, idx: usize) -> Option<&FileEntry> {
        self.entries.get(idx)
    }

    /// Descend into the directory at `idx`. Returns false for file entries.
    pub fn descend(&mut self, idx: usize) -> Result<bool> {
        let Some(entry) = self.entries.get(idx) else {
            return Ok(false);
        };
        if !entry.is_dir {
            return Ok(false);
        }
        self.dir = entry.path.clone();
        self.refresh()?;
        Ok(true)
    }

    pub fn ascend(&mut self) -> Result<bool> {
        let Some(parent) = self.dir.parent() else {
            return Ok(false);
        };
        self.dir = parent.to_path_buf();
        self.refresh()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn validate_accepts_supported_types() {
        assert_eq!(validate(Path::new("lease.pdf"), 1024), Ok(DocumentKind::Pdf));
        assert_eq!(validate(Path::new("scan.JPG"), 1024), Ok(DocumentKind::Jpeg));
        assert_eq!(validate(Path::new("page.jpeg"), 1024), Ok(DocumentKind::Jpeg));
        assert_eq!(validate(Path::new("photo.png"), 1024), Ok(DocumentKind::Png));
    }

    #[test]
    fn validate_rejects_unsupported_types() {
        assert_eq!(
            validate(Path::new("contract.docx"), 1024),
            Err(UploadError::InvalidType)
        );
        assert_eq!(validate(Path::new("noext"), 1024), Err(UploadError::InvalidType));
        assert_eq!(validate(Path::new("notes.txt"), 10), Err(UploadError::InvalidType));
    }

    #[test]
    fn validate_enforces_size_cap() {
        // Exactly at the cap is fine, one byte over is not
        assert!(validate(Path::new("big.pdf"), MAX_DOCUMENT_BYTES).is_ok());
        assert_eq!(
            validate(Path::new("big.pdf"), MAX_DOCUMENT_BYTES + 1),
            Err(UploadError::TooLarge)
        );
        // A 25 MB scan is over the limit
        assert_eq!(
            validate(Path::new("scan.pdf"), 25 * 1024 * 1024),
            Err(UploadError::TooLarge)
        );
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(0), "0 Bytes");
        assert_eq!(format_size(512), "512 Bytes");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(2 * 1024 * 1024), "2 MB");
        assert_eq!(format_size(20 * 1024 * 1024), "20 MB");
        assert_eq!(format_size(1319413953), "1.23 GB");
    }

    #[test]
    fn browser_lists_parent_then_dirs_then_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("contracts")).unwrap();
        std::fs::create_dir(tmp.path().join(".git")).unwrap();
        File::create(tmp.path().join("lease.pdf"))
            .unwrap()
            .write_all(b"pdf")
            .unwrap();
        File::create(tmp.path().join(".hidden")).unwrap();

        let browser = FileBrowser::open(tmp.path()).unwrap();
        let names: Vec<&str> = browser.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["..", "contracts", "lease.pdf"]);
        assert!(browser.entries[1].is_dir);
        assert!(!browser.entries[2].is_dir);
    }

    #[test]
    fn browser_descends_and_ascends() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("inner")).unwrap();
        File::create(tmp.path().join("inner").join("doc.png")).unwrap();

        let mut browser = FileBrowser::open(tmp.path()).unwrap();
        let inner_idx = browser
            .entries
            .iter()
            .position(|e| e.name == "inner")
            .unwrap();
        assert!(browser.descend(inner_idx).unwrap());
        assert!(browser.entries.iter().any(|e| e.name == "doc.png"));

        // Files do not descend
        let file_idx = browser
            .entries
            .iter()
            .position(|e| e.name == "doc.png")
            .unwrap();
        assert!(!browser.descend(file_idx).unwrap());

        assert!(browser.ascend().unwrap());
        assert!(browser.entries.iter().any(|e| e.name == "inner"));
    }
}
