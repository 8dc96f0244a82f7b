use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::debug;

use crate::util::{ensure_directory, utc_compact_string};

/// Folder created for mode A under the output root.
pub const ROOT_FOLDER_NAME: &str = "Generate ใบรับสินค้า";
/// Folder holding the generated receipt tree, both modes.
pub const MAIN_FOLDER_NAME: &str = "ใบรับสินค้าที่สร้าง_pdf";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderId(pub PathBuf);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId(pub PathBuf);

/// Hierarchical file host: folder find-or-create, name lookup, soft delete,
/// and PDF storage. Folder resolution is idempotent; an empty folder name is
/// a fatal configuration fault.
pub trait Drive {
    fn resolve_folder(&mut self, name: &str, parent: Option<&FolderId>) -> Result<FolderId>;
    fn find_files_by_name(&self, name: &str, folder: &FolderId) -> Result<Vec<FileId>>;
    fn soft_delete(&mut self, file: &FileId) -> Result<()>;
    fn store_pdf(&mut self, bytes: &[u8], name: &str, folder: &FolderId) -> Result<FileId>;
}

/// Local-filesystem drive rooted at the output directory. Soft-deleted files
/// move into `.trash/` with a timestamped prefix so repeated replacements of
/// one name never collide.
pub struct LocalDrive {
    root: PathBuf,
    trash: PathBuf,
}

impl LocalDrive {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            trash: root.join(".trash"),
        }
    }
}

impl Drive for LocalDrive {
    fn resolve_folder(&mut self, name: &str, parent: Option<&FolderId>) -> Result<FolderId> {
        if name.trim().is_empty() {
            bail!("folder name cannot be empty");
        }

        let path = match parent {
            Some(parent) => parent.0.join(name),
            None => self.root.join(name),
        };

        if path.exists() {
            if !path.is_dir() {
                bail!("folder name is taken by a file: {}", path.display());
            }
            return Ok(FolderId(path));
        }

        ensure_directory(&path)?;
        debug!(folder = %path.display(), "created folder");
        Ok(FolderId(path))
    }

    fn find_files_by_name(&self, name: &str, folder: &FolderId) -> Result<Vec<FileId>> {
        let path = folder.0.join(name);
        if path.is_file() {
            Ok(vec![FileId(path)])
        } else {
            Ok(Vec::new())
        }
    }

    fn soft_delete(&mut self, file: &FileId) -> Result<()> {
        ensure_directory(&self.trash)?;

        let original = file
            .0
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("file");
        let trashed = self
            .trash
            .join(format!("{}_{original}", utc_compact_string(Utc::now())));

        fs::rename(&file.0, &trashed).with_context(|| {
            format!(
                "failed to move {} to trash at {}",
                file.0.display(),
                trashed.display()
            )
        })?;
        debug!(file = %file.0.display(), "soft-deleted file");
        Ok(())
    }

    fn store_pdf(&mut self, bytes: &[u8], name: &str, folder: &FolderId) -> Result<FileId> {
        let path = folder.0.join(name);
        fs::write(&path, bytes)
            .with_context(|| format!("failed to store pdf: {}", path.display()))?;
        Ok(FileId(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_folder_is_find_or_create() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut drive = LocalDrive::new(tmp.path());

        let first = drive.resolve_folder("The Grand", None).expect("create");
        let second = drive.resolve_folder("The Grand", None).expect("reuse");
        assert_eq!(first, second);
        assert!(first.0.is_dir());
    }

    #[test]
    fn resolve_folder_nests_under_parent() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut drive = LocalDrive::new(tmp.path());

        let parent = drive.resolve_folder("The Grand", None).expect("parent");
        let child = drive
            .resolve_folder("A101", Some(&parent))
            .expect("child");
        assert_eq!(child.0, parent.0.join("A101"));
    }

    #[test]
    fn empty_folder_name_is_fatal() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut drive = LocalDrive::new(tmp.path());

        assert!(drive.resolve_folder("", None).is_err());
        assert!(drive.resolve_folder("   ", None).is_err());
    }

    #[test]
    fn folder_name_taken_by_file_is_an_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(tmp.path().join("The Grand"), b"not a folder").expect("file");

        let mut drive = LocalDrive::new(tmp.path());
        assert!(drive.resolve_folder("The Grand", None).is_err());
    }

    #[test]
    fn soft_delete_moves_file_into_trash() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut drive = LocalDrive::new(tmp.path());

        let folder = drive.resolve_folder("unit", None).expect("folder");
        let file = drive
            .store_pdf(b"%PDF-1.3", "receipt.pdf", &folder)
            .expect("store");

        assert_eq!(
            drive.find_files_by_name("receipt.pdf", &folder).expect("find").len(),
            1
        );

        drive.soft_delete(&file).expect("soft delete");
        assert!(drive
            .find_files_by_name("receipt.pdf", &folder)
            .expect("find")
            .is_empty());

        let trashed: Vec<_> = std::fs::read_dir(tmp.path().join(".trash"))
            .expect("trash dir")
            .collect();
        assert_eq!(trashed.len(), 1);
    }
}
