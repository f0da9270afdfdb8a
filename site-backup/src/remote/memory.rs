//! In-memory remote tree for tests.

use super::{Connect, RemoteStore};
use crate::utils::errors::{BackupError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct TreeState {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    broken: BTreeSet<String>,
    connections: usize,
    retrieved: Vec<String>,
}

/// Shared remote tree; every `connect` returns a session over the same state.
#[derive(Clone)]
pub struct MemoryTree {
    state: Arc<Mutex<TreeState>>,
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn parent_of(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn not_found(path: &str) -> BackupError {
    BackupError::Io(io::Error::new(io::ErrorKind::NotFound, format!("550 {}", path)))
}

impl MemoryTree {
    pub fn new() -> Self {
        let mut state = TreeState::default();
        state.dirs.insert("/".to_string());
        Self { state: Arc::new(Mutex::new(state)) }
    }

    pub fn with_dir(self, path: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let mut dir = normalize(path);
            while dir != "/" {
                state.dirs.insert(dir.clone());
                dir = parent_of(&dir);
            }
        }
        self
    }

    pub fn with_file(self, path: &str, content: &[u8]) -> Self {
        let path = normalize(path);
        let tree = self.with_dir(&parent_of(&path));
        tree.state.lock().unwrap().files.insert(path, content.to_vec());
        tree
    }

    /// A file that is listed but fails on retrieval.
    pub fn with_broken_file(self, path: &str) -> Self {
        let tree = self.with_file(path, b"");
        tree.state.lock().unwrap().broken.insert(normalize(path));
        tree
    }

    pub fn connections(&self) -> usize {
        self.state.lock().unwrap().connections
    }

    pub fn retrieved(&self) -> Vec<String> {
        self.state.lock().unwrap().retrieved.clone()
    }

    pub fn exists(&self, path: &str) -> bool {
        let state = self.state.lock().unwrap();
        let path = normalize(path);
        state.files.contains_key(&path) || state.dirs.contains(&path)
    }
}

impl Connect for MemoryTree {
    type Store = MemorySession;

    fn connect(&self) -> Result<MemorySession> {
        self.state.lock().unwrap().connections += 1;
        Ok(MemorySession { tree: self.clone() })
    }
}

pub struct MemorySession {
    tree: MemoryTree,
}

impl RemoteStore for MemorySession {
    fn list_directory(&mut self, path: &str) -> Result<Vec<String>> {
        let dir = normalize(path);
        let state = self.tree.state.lock().unwrap();
        if !state.dirs.contains(&dir) {
            return Err(not_found(&dir));
        }

        let mut lines = vec![
            "drwxr-xr-x 2 site site 4096 Jan 01 00:00 .".to_string(),
            "drwxr-xr-x 2 site site 4096 Jan 01 00:00 ..".to_string(),
        ];
        for sub in state.dirs.iter().filter(|d| *d != "/" && parent_of(d) == dir) {
            lines.push(format!("drwxr-xr-x 2 site site 4096 Jan 01 00:00 {}", name_of(sub)));
        }
        for (file, content) in state.files.iter().filter(|(f, _)| parent_of(f) == dir) {
            lines.push(format!(
                "-rw-r--r-- 1 site site {} Jan 01 00:00 {}",
                content.len(),
                name_of(file)
            ));
        }
        Ok(lines)
    }

    fn retrieve_file(&mut self, path: &str, dest: &mut dyn Write) -> Result<u64> {
        let path = normalize(path);
        let content = {
            let mut state = self.tree.state.lock().unwrap();
            if state.broken.contains(&path) {
                return Err(BackupError::Io(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    format!("426 transfer aborted: {}", path),
                )));
            }
            let content = state.files.get(&path).cloned().ok_or_else(|| not_found(&path))?;
            state.retrieved.push(path);
            content
        };
        dest.write_all(&content)?;
        Ok(content.len() as u64)
    }

    fn change_directory(&mut self, path: &str) -> Result<()> {
        let dir = normalize(path);
        if self.tree.state.lock().unwrap().dirs.contains(&dir) {
            Ok(())
        } else {
            Err(not_found(&dir))
        }
    }

    fn delete_file(&mut self, path: &str) -> Result<()> {
        let path = normalize(path);
        match self.tree.state.lock().unwrap().files.remove(&path) {
            Some(_) => Ok(()),
            None => Err(not_found(&path)),
        }
    }

    fn remove_directory(&mut self, path: &str) -> Result<()> {
        let dir = normalize(path);
        let mut state = self.tree.state.lock().unwrap();
        let occupied = state.files.keys().any(|f| parent_of(f) == dir)
            || state.dirs.iter().any(|d| d != "/" && parent_of(d) == dir);
        if occupied {
            return Err(BackupError::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("550 directory not empty: {}", dir),
            )));
        }
        if state.dirs.remove(&dir) {
            Ok(())
        } else {
            Err(not_found(&dir))
        }
    }

    fn quit(&mut self) -> Result<()> {
        Ok(())
    }
}
