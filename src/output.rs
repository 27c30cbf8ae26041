use std::io;
use std::path::{Path, PathBuf};

use crate::jobs::job_details::JOB_DATA_FILE_NAME;

pub const PENDING_DIR: &str = "pendingExtraction";
pub const COMPLETED_DIR: &str = "completed";
pub const ERROR_DIR: &str = "error";

/// The output root and its three working folders.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        OutputLayout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn folder(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn pending(&self) -> PathBuf {
        self.folder(PENDING_DIR)
    }

    pub fn completed(&self) -> PathBuf {
        self.folder(COMPLETED_DIR)
    }

    pub fn error(&self) -> PathBuf {
        self.folder(ERROR_DIR)
    }

    /// Creates the root and the working folders. Failures are logged, not returned.
    pub fn ensure_dirs(&self) {
        for dir in [self.root.clone(), self.pending(), self.completed(), self.error()] {
            match std::fs::create_dir_all(&dir) {
                Ok(()) => tracing::info!("Directory created or already exists: {}", dir.display()),
                Err(e) => tracing::error!("Failed to create directory {}: {}", dir.display(), e),
            }
        }
    }

    /// Id files waiting in `folder`, sorted by name. The extractor's own
    /// `job_data.csv` output is never treated as input.
    pub fn candidate_files(&self, folder: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(folder)? {
            let path = entry?.path();
            let is_csv = path.extension().map(|ext| ext == "csv").unwrap_or(false);
            let is_output = path
                .file_name()
                .map(|name| name == JOB_DATA_FILE_NAME)
                .unwrap_or(false);
            if path.is_file() && is_csv && !is_output {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn move_to_completed(&self, file: &Path) -> io::Result<PathBuf> {
        move_into(file, &self.completed())
    }

    pub fn move_to_error(&self, file: &Path) -> io::Result<PathBuf> {
        move_into(file, &self.error())
    }
}

fn move_into(file: &Path, dir: &Path) -> io::Result<PathBuf> {
    let name = file.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("not a file path: {}", file.display()),
        )
    })?;
    std::fs::create_dir_all(dir)?;
    let target = dir.join(name);
    std::fs::rename(file, &target)?;
    Ok(target)
}
