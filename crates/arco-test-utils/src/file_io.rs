//! In-memory file IO with operation tracing.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use arco_metahook::error::{HookError, HookResult};
use arco_metahook::{FileIo, FileStatus};

/// Record of a file-IO operation for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoOp {
    /// Existence check.
    Exists {
        /// Path that was checked.
        path: String,
    },
    /// Full read.
    Read {
        /// Path that was read.
        path: String,
    },
    /// Prefix listing.
    List {
        /// Prefix that was listed.
        prefix: String,
    },
    /// Delete.
    Delete {
        /// Path that was deleted.
        path: String,
    },
    /// Write made by test setup or a fake catalog.
    Put {
        /// Path that was written.
        path: String,
        /// Size of data written.
        size: usize,
    },
}

/// In-memory [`FileIo`] recording every operation.
///
/// Clones share state, so a test can keep one handle while the code under
/// test holds another.
#[derive(Debug, Clone, Default)]
pub struct TracingFileIo {
    files: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    operations: Arc<Mutex<Vec<IoOp>>>,
    fail_paths: Arc<Mutex<Vec<String>>>,
}

impl TracingFileIo {
    /// Creates an empty file system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a file.
    pub fn put(&self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        let path = path.into();
        let data = data.into();
        self.record(IoOp::Put {
            path: path.clone(),
            size: data.len(),
        });
        self.files.lock().expect("lock").insert(path, data);
    }

    /// Writes a zero-filled file of `size` bytes.
    pub fn put_sized(&self, path: impl Into<String>, size: usize) {
        self.put(path, vec![0_u8; size]);
    }

    /// Returns true if the file is present (not recorded).
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.files.lock().expect("lock").contains_key(path)
    }

    /// Returns all stored paths, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.files.lock().expect("lock").keys().cloned().collect()
    }

    /// Returns all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<IoOp> {
        self.operations.lock().expect("lock").clone()
    }

    /// Returns deleted paths in deletion order.
    #[must_use]
    pub fn deleted(&self) -> Vec<String> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                IoOp::Delete { path } => Some(path),
                _ => None,
            })
            .collect()
    }

    /// Clears recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().expect("lock").clear();
    }

    /// Injects a failure for every operation on paths with the given prefix.
    pub fn inject_failure(&self, path: impl Into<String>) {
        self.fail_paths.lock().expect("lock").push(path.into());
    }

    /// Clears all injected failures.
    pub fn clear_failures(&self) {
        self.fail_paths.lock().expect("lock").clear();
    }

    fn record(&self, op: IoOp) {
        self.operations.lock().expect("lock").push(op);
    }

    fn check_failure(&self, path: &str) -> HookResult<()> {
        let fail_paths = self.fail_paths.lock().expect("lock");
        if fail_paths.iter().any(|p| path.starts_with(p.as_str())) {
            return Err(HookError::io(path, "injected failure"));
        }
        Ok(())
    }
}

impl FileIo for TracingFileIo {
    fn exists(&self, path: &str) -> HookResult<bool> {
        self.check_failure(path)?;
        self.record(IoOp::Exists {
            path: path.to_string(),
        });
        Ok(self.contains(path))
    }

    fn read(&self, path: &str) -> HookResult<Vec<u8>> {
        self.check_failure(path)?;
        self.record(IoOp::Read {
            path: path.to_string(),
        });
        self.files
            .lock()
            .expect("lock")
            .get(path)
            .cloned()
            .ok_or_else(|| HookError::io(path, "file not found"))
    }

    fn list(&self, prefix: &str) -> HookResult<Vec<FileStatus>> {
        self.check_failure(prefix)?;
        self.record(IoOp::List {
            prefix: prefix.to_string(),
        });
        Ok(self
            .files
            .lock()
            .expect("lock")
            .iter()
            .filter(|(path, _)| path.starts_with(prefix))
            .map(|(path, data)| FileStatus {
                path: path.clone(),
                size: data.len() as u64,
            })
            .collect())
    }

    fn delete(&self, path: &str) -> HookResult<()> {
        self.check_failure(path)?;
        self.record(IoOp::Delete {
            path: path.to_string(),
        });
        self.files.lock().expect("lock").remove(path);
        Ok(())
    }
}
