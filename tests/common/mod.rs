#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

use qc_report::{
    catalog::Catalogs,
    dataset::{Column, Dataset},
};

/// Scratch project layout (`data/`, `documents/`, `output/`) that cleans up
/// on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.path().join("data")
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.path().join("documents")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path().join("output")
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.json")
    }

    /// Writes `contents` to `relative` (parent directories included).
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, contents).expect("write temp file contents");
        path
    }

    pub fn write_dataset(&self, file_name: &str, contents: &str) -> PathBuf {
        self.write(&format!("data/{file_name}"), contents)
    }

    /// Catalog documents carry a title banner above the header row.
    pub fn write_document(&self, file_name: &str, header: &str, rows: &[&str]) -> PathBuf {
        let mut contents = String::from("banner\n");
        contents.push_str(header);
        contents.push('\n');
        for row in rows {
            contents.push_str(row);
            contents.push('\n');
        }
        self.write(&format!("documents/{file_name}"), &contents)
    }

    pub fn output_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(self.output_dir()) else {
            return Vec::new();
        };
        let mut files = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect::<Vec<_>>();
        files.sort();
        files
    }
}

pub fn text_dataset(name: &str, columns: &[(&str, &[&str])]) -> Dataset {
    Dataset::new(
        name,
        columns
            .iter()
            .map(|(column, values)| Column::from_text(*column, *values, false))
            .collect(),
    )
    .expect("equal column lengths")
}

pub fn no_catalogs() -> Catalogs {
    Catalogs::default()
}
