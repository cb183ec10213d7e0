use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::error::{RagError, Result};

/// List the files directly inside `folder` whose extension is in `extensions`.
///
/// Scanning is non-recursive and follows symbolic links. The extension
/// comparison ignores case and a leading dot. Entries that cannot be read are
/// logged and left out. Results are sorted by path.
pub fn discover_documents(folder: impl AsRef<Path>, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let folder = folder.as_ref();
    if !folder.exists() {
        return Err(RagError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("document folder '{}' does not exist", folder.display()),
        )));
    }
    if !folder.is_dir() {
        return Err(RagError::InvalidConfiguration(format!(
            "document source '{}' is not a directory",
            folder.display()
        )));
    }

    let mut files = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                warn!(path = %path, error = %e, "skipping unreadable folder entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry.path().extension().and_then(|ext| ext.to_str()).is_some_and(|ext| {
                extensions.iter().any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
        })
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn discovers_only_matching_top_level_files() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("nested")).unwrap();

        fs::write(root.join("b.pdf"), "x").unwrap();
        fs::write(root.join("a.PDF"), "x").unwrap();
        fs::write(root.join("notes.txt"), "x").unwrap();
        fs::write(root.join("nested/c.pdf"), "x").unwrap();

        let files = discover_documents(root, &["pdf".to_string()]).unwrap();
        let names: Vec<_> =
            files.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_entries_are_left_out() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::write(root.join("real.pdf"), "x").unwrap();
        std::os::unix::fs::symlink(root.join("real.pdf"), root.join("alias.pdf")).unwrap();
        std::os::unix::fs::symlink(root.join("gone.pdf"), root.join("dangling.pdf")).unwrap();

        let files = discover_documents(root, &["pdf".to_string()]).unwrap();
        let names: Vec<_> =
            files.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect();
        assert_eq!(names, vec!["alias.pdf", "real.pdf"]);
    }

    #[test]
    fn missing_folder_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let result = discover_documents(temp.path().join("nope"), &["pdf".to_string()]);
        assert!(matches!(result, Err(RagError::Io(_))));
    }

    #[test]
    fn file_instead_of_folder_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("doc.pdf");
        fs::write(&file, "x").unwrap();
        let result = discover_documents(&file, &["pdf".to_string()]);
        assert!(matches!(result, Err(RagError::InvalidConfiguration(_))));
    }
}
