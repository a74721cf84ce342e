//! Document corpus loading.
//!
//! Reads the configured directory (non-recursive) into [`Document`] records
//! at startup. One file is one logical document; the filename is the
//! document id and is carried as provenance metadata on every chunk and
//! answer derived from it.
//!
//! A single unreadable file aborts the whole load: a silently incomplete
//! index gives confidently wrong answers. Files that match the include
//! patterns but are empty carry nothing to index and are skipped with a
//! warning.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeMap;
use walkdir::WalkDir;

use crate::config::CorpusConfig;

/// A loaded corpus document. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Filename, unique within the corpus directory.
    pub id: String,
    pub text: String,
    /// Provenance metadata; always includes the `source` filename.
    pub metadata: BTreeMap<String, String>,
}

/// Load every matching file in the corpus directory, in deterministic
/// filename order.
pub fn load_corpus(config: &CorpusConfig) -> Result<Vec<Document>> {
    let dir = &config.dir;
    if !dir.is_dir() {
        bail!("corpus directory does not exist: {}", dir.display());
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut documents = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if !include_set.is_match(&name) {
            continue;
        }

        let text = std::fs::read_to_string(entry.path())
            .with_context(|| format!("failed to read corpus file: {}", entry.path().display()))?;

        if text.trim().is_empty() {
            tracing::warn!(file = %name, "skipping empty corpus file");
            continue;
        }

        let mut metadata = BTreeMap::new();
        metadata.insert("source".to_string(), name.clone());

        documents.push(Document {
            id: name,
            text,
            metadata,
        });
    }

    documents.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(documents)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn corpus_config(dir: PathBuf) -> CorpusConfig {
        CorpusConfig {
            dir,
            include_globs: vec!["*.md".to_string(), "*.txt".to_string()],
        }
    }

    #[test]
    fn loads_matching_files_in_filename_order() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("zeta.md"), "zeta body").unwrap();
        fs::write(tmp.path().join("alpha.txt"), "alpha body").unwrap();
        fs::write(tmp.path().join("ignored.pdf"), "binary-ish").unwrap();

        let docs = load_corpus(&corpus_config(tmp.path().to_path_buf())).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha.txt", "zeta.md"]);
        assert_eq!(docs[0].text, "alpha body");
        assert_eq!(docs[0].metadata.get("source").unwrap(), "alpha.txt");
    }

    #[test]
    fn does_not_recurse_into_subdirectories() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("top.md"), "top").unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("nested").join("deep.md"), "deep").unwrap();

        let docs = load_corpus(&corpus_config(tmp.path().to_path_buf())).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "top.md");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = load_corpus(&corpus_config(PathBuf::from("/nonexistent/corpus"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn empty_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("real.md"), "content").unwrap();
        fs::write(tmp.path().join("blank.md"), "  \n").unwrap();

        let docs = load_corpus(&corpus_config(tmp.path().to_path_buf())).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "real.md");
    }

    #[test]
    fn empty_directory_yields_empty_corpus() {
        let tmp = TempDir::new().unwrap();
        let docs = load_corpus(&corpus_config(tmp.path().to_path_buf())).unwrap();
        assert!(docs.is_empty());
    }
}
