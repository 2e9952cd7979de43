//! # Archive Exporter
//!
//! Reconstructs a nested folder hierarchy from the flat URL-keyed entry
//! set of one cache and bundles it into a single zip blob. The folder
//! cache is keyed by the full accumulated path: folders sharing a name
//! at different depths stay distinct.

use std::collections::HashMap;
use std::io::{Cursor, Write};

use bytes::Bytes;
use tracing::debug;
use url::Url;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::error::EngineError;
use crate::store::CacheStore;

/// Deterministic download name for a cache's archive
pub fn archive_file_name(cache_id: &str) -> String {
    format!("{cache_id}.zip")
}

/// One file entry of the transient export tree
struct ArchiveFile {
    name: String,
    body: Bytes,
}

/// One folder of the transient export tree
struct ArchiveNode {
    /// Full accumulated path of this folder ("" for the root)
    path: String,
    children: Vec<usize>,
    files: Vec<ArchiveFile>,
}

/// Transient tree built during export and discarded afterwards
struct ArchiveTree {
    nodes: Vec<ArchiveNode>,
    /// Folder lookup keyed by full accumulated path. Keying by the bare
    /// folder name would collide same-named folders at different depths.
    index: HashMap<String, usize>,
}

impl ArchiveTree {
    fn new() -> Self {
        let root = ArchiveNode {
            path: String::new(),
            children: Vec::new(),
            files: Vec::new(),
        };
        Self {
            nodes: vec![root],
            index: HashMap::from([(String::new(), 0)]),
        }
    }

    /// Insert one file, creating or reusing folders along its path
    fn insert(&mut self, segments: &[&str], file_name: &str, body: Bytes) {
        let mut node = 0usize;
        let mut path = String::new();

        for segment in segments {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(segment);

            node = match self.index.get(&path) {
                Some(&existing) => existing,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(ArchiveNode {
                        path: path.clone(),
                        children: Vec::new(),
                        files: Vec::new(),
                    });
                    self.nodes[node].children.push(child);
                    self.index.insert(path.clone(), child);
                    child
                }
            };
        }

        self.nodes[node].files.push(ArchiveFile {
            name: file_name.to_string(),
            body,
        });
    }

    /// Serialize the tree into one compressed archive blob
    fn into_zip(mut self) -> Result<Bytes, EngineError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // Deterministic archives regardless of enumeration order.
        for node in &mut self.nodes {
            node.files.sort_by(|a, b| a.name.cmp(&b.name));
        }

        let mut stack = vec![0usize];
        while let Some(current) = stack.pop() {
            let prefix = if self.nodes[current].path.is_empty() {
                String::new()
            } else {
                format!("{}/", self.nodes[current].path)
            };

            if current != 0 {
                writer
                    .add_directory(self.nodes[current].path.clone(), options)
                    .map_err(|e| EngineError::ExportFailure(e.to_string()))?;
            }

            for file in &self.nodes[current].files {
                writer
                    .start_file(format!("{prefix}{}", file.name), options)
                    .map_err(|e| EngineError::ExportFailure(e.to_string()))?;
                writer
                    .write_all(&file.body)
                    .map_err(|e| EngineError::ExportFailure(e.to_string()))?;
            }

            let mut children = self.nodes[current].children.clone();
            children.sort_by(|a, b| self.nodes[*b].path.cmp(&self.nodes[*a].path));
            stack.extend(children);
        }

        let cursor = writer
            .finish()
            .map_err(|e| EngineError::ExportFailure(e.to_string()))?;
        Ok(Bytes::from(cursor.into_inner()))
    }
}

/// Path component of a stored key. Absolute URLs contribute their path;
/// bare paths are used as-is, minus any query or fragment.
fn key_path(key: &str) -> String {
    match Url::parse(key) {
        Ok(url) => url.path().to_string(),
        Err(_) => key
            .split(['?', '#'])
            .next()
            .unwrap_or(key)
            .to_string(),
    }
}

/// Export every entry of one cache as a directory-structured zip blob.
///
/// Any entry that fails to materialize aborts the whole export; partial
/// archives are never produced.
pub async fn export(store: &CacheStore, cache_id: &str) -> Result<Bytes, EngineError> {
    let entries = store
        .entries(cache_id)
        .await
        .map_err(|e| EngineError::ExportFailure(e.to_string()))?;

    let mut tree = ArchiveTree::new();

    for (key, entry) in entries {
        let path = key_path(&key);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let (folders, file_name) = match segments.split_last() {
            Some((file_name, folders)) => (folders, *file_name),
            // A key without any path segment still has to be bundled.
            None => (&[] as &[&str], "asset"),
        };

        tree.insert(folders, file_name, entry.body);
    }

    let blob = tree.into_zip()?;
    debug!(cache_id, bytes = blob.len(), "Cache exported");
    Ok(blob)
}
