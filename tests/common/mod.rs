#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const SAMPLE_HEADER: &str = "Order Date,Sales Region,Product Name,Qty,Unit Price,Notes";

/// Six data rows: one duplicate, one negative quantity, one missing product.
pub const SAMPLE_ROWS: &[&str] = &[
    "2024-01-05,East,Widget,3,10.0,first",
    "2024-01-05,East,Widget,3,10.0,duplicate",
    "2024-01-20,West,Gadget,1,25.5,",
    "2024-02-01,West,Gadget,2,5.0,",
    "2024-02-03,North,Bolt,-1,2.0,negative",
    "2024-02-10,East,,4,1.0,missing product",
];

/// Scratch directory helper that cleans up files automatically on drop.
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

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes the sample sales extract using `delimiter` between fields.
    pub fn write_sample(&self, name: &str, delimiter: char) -> PathBuf {
        let mut contents = String::new();
        for line in std::iter::once(SAMPLE_HEADER).chain(SAMPLE_ROWS.iter().copied()) {
            contents.push_str(&line.replace(',', &delimiter.to_string()));
            contents.push('\n');
        }
        self.write(name, &contents)
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}
