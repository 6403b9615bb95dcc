//! Loading documents into the private index

use crate::error::{AskRouteError, Result};
use crate::index::{DocumentRef, SemanticIndexClient};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Documents per upsert call
pub const BATCH_SIZE: usize = 32;

/// Directories never descended into
const EXCLUDE_DIRS: &[&str] = &["node_modules", ".git", "target", "__pycache__", ".venv"];

const TEXT_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Hash content using SHA-256
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Stable id derived from title and content
pub fn document_id(title: &str, content: &str) -> String {
    let hash = hash_content(&format!("{}\n{}", title, content));
    format!("doc_{}", &hash[..16])
}

/// One record in a JSON or YAML document list
#[derive(Debug, Clone, Deserialize)]
struct DocumentRecord {
    #[serde(default)]
    id: Option<String>,
    title: String,
    content: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl DocumentRecord {
    fn into_document(self) -> DocumentRef {
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => document_id(&self.title, &self.content),
        };
        DocumentRef {
            id,
            title: self.title,
            content: self.content,
            source: self.source.unwrap_or_else(|| "knowledge_base".to_string()),
            category: self.category.unwrap_or_else(|| "general".to_string()),
            tags: self.tags,
        }
    }
}

/// Load documents from a JSON/YAML list or a directory of text files
pub fn load_documents(path: &Path) -> Result<Vec<DocumentRef>> {
    if path.is_dir() {
        return load_directory(path);
    }

    let text = std::fs::read_to_string(path)?;
    let records: Vec<DocumentRecord> = match extension(path).as_deref() {
        Some("json") => serde_json::from_str(&text)?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&text)?,
        _ => {
            return Err(AskRouteError::InvalidRequest(format!(
                "unsupported document file {} (expected .json, .yaml or a directory)",
                path.display()
            )))
        }
    };

    Ok(records
        .into_iter()
        .filter(|r| !r.content.trim().is_empty())
        .map(DocumentRecord::into_document)
        .collect())
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

fn should_skip(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    if entry.depth() > 0 && name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir() && EXCLUDE_DIRS.iter().any(|d| name == *d)
}

fn load_directory(root: &Path) -> Result<Vec<DocumentRef>> {
    let mut documents = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !should_skip(e));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_text = extension(path)
            .map(|e| TEXT_EXTENSIONS.contains(&e.as_str()))
            .unwrap_or(false);
        if !is_text {
            continue;
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            tracing::debug!("Skipping empty file {}", path.display());
            continue;
        }

        let relative = path
            .strip_prefix(root)
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| path.to_string_lossy().to_string());
        let title = extract_title(&content).unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| relative.clone())
        });

        documents.push(DocumentRef {
            id: document_id(&title, &content),
            title,
            content,
            source: relative,
            category: "general".to_string(),
            tags: Vec::new(),
        });
    }
    Ok(documents)
}

/// First level-1 Markdown heading
pub fn extract_title(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub loaded: usize,
    pub written: usize,
    pub batches: usize,
}

/// Embed and upsert documents in batches
pub async fn ingest(
    index: &dyn SemanticIndexClient,
    documents: &[DocumentRef],
) -> Result<IngestReport> {
    let mut report = IngestReport {
        loaded: documents.len(),
        ..IngestReport::default()
    };
    for batch in documents.chunks(BATCH_SIZE) {
        report.written += index.upsert(batch).await?;
        report.batches += 1;
        tracing::info!(
            "Upserted batch {} ({}/{} documents)",
            report.batches,
            report.written,
            report.loaded
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_document_id_is_stable() {
        let a = document_id("Python", "content");
        assert_eq!(a, document_id("Python", "content"));
        assert_ne!(a, document_id("Python", "other"));
        assert!(a.starts_with("doc_"));
        assert_eq!(a.len(), 20);
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(
            extract_title("intro\n# Docker Basics\n## Images"),
            Some("Docker Basics".to_string())
        );
        assert_eq!(extract_title("## Only h2"), None);
        assert_eq!(extract_title("#   "), None);
    }

    #[test]
    fn test_load_json_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docs.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "doc_001", "title": "Python Best Practices", "content": "Use venv.",
                 "category": "programming", "tags": ["python"]},
                {"title": "Git Workflow", "content": "Branch per feature."},
                {"title": "Empty", "content": "   "}
            ]"#,
        )
        .unwrap();

        let docs = load_documents(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "doc_001");
        assert_eq!(docs[0].category, "programming");
        assert_eq!(docs[1].id, document_id("Git Workflow", "Branch per feature."));
        assert_eq!(docs[1].source, "knowledge_base");
    }

    #[test]
    fn test_load_yaml_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docs.yml");
        std::fs::write(
            &path,
            "- title: Docker\n  content: Containers package apps.\n  tags: [docker]\n",
        )
        .unwrap();
        let docs = load_documents(&path).unwrap();
        assert_eq!(docs[0].tags, vec!["docker"]);
    }

    #[test]
    fn test_load_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("guides")).unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join("guides/api.md"), "# API Design\nUse nouns.").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "plain notes").unwrap();
        std::fs::write(dir.path().join("image.png"), "binary").unwrap();
        std::fs::write(dir.path().join(".git/HEAD.md"), "# hidden").unwrap();

        let docs = load_documents(dir.path()).unwrap();
        let titles: Vec<&str> = docs.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["API Design", "notes"]);
        assert!(docs[0].source.ends_with("api.md"));
    }

    #[test]
    fn test_unsupported_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docs.csv");
        std::fs::write(&path, "a,b").unwrap();
        let err = load_documents(&path).unwrap_err();
        assert!(matches!(err, AskRouteError::InvalidRequest(_)));
    }
}
