use anyhow::{bail, Context, Result};
use elidx_core::persist::IndexPaths;
use elidx_core::DocId;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: DocId,
    #[serde(default)]
    text: serde_json::Value,
}

/// `*.json` and `*.jsonl` files under `input` (or `input` itself), sorted by path.
/// Directories holding a saved index are not descended into.
pub fn collect_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        let walker = WalkDir::new(input)
            .into_iter()
            .filter_entry(|e| !(e.file_type().is_dir() && IndexPaths::new(e.path()).index().exists()));
        for entry in walker.filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files.sort();
    files
}

/// Loads `(id, text)` pairs. Records whose text is not a string are skipped.
pub fn load_corpus(input: &Path) -> Result<Vec<(DocId, String)>> {
    let files = collect_files(input);
    if files.is_empty() {
        bail!("no .json/.jsonl corpus files in {}", input.display());
    }

    let mut docs = Vec::new();
    let mut skipped = 0usize;
    for file in &files {
        let records = if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(file)?
        } else {
            read_json(file)?
        };
        for rec in records {
            match rec.text {
                serde_json::Value::String(text) => docs.push((rec.id, text)),
                _ => skipped += 1,
            }
        }
    }
    tracing::info!(files = files.len(), docs = docs.len(), skipped, "loaded corpus");
    Ok(docs)
}

fn read_jsonl(file: &Path) -> Result<Vec<InputDoc>> {
    let reader = BufReader::new(File::open(file)?);
    let mut out = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
        out.push(doc);
    }
    Ok(out)
}

fn read_json(file: &Path) -> Result<Vec<InputDoc>> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("parsing {}", file.display()))?;
    let docs = match json {
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<InputDoc>, _>>()?,
        serde_json::Value::Object(_) => vec![serde_json::from_value(json)?],
        _ => Vec::new(),
    };
    Ok(docs)
}
