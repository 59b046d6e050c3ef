//! Hygiene — enforces coding standards at test time
//!
//! Scans the library source tree for antipatterns. Each pattern has a budget
//! (ideally zero). If you must add one, fix an existing one first. The budget
//! never grows.

use std::fs;
use std::path::Path;

/// `(pattern, budget, why)`
const BUDGETS: &[(&str, usize, &str)] = &[
    // Panics.
    (".unwrap()", 0, "propagate with ? instead"),
    (".expect(", 0, "propagate with ? instead"),
    ("panic!(", 0, "return an error instead"),
    ("unreachable!(", 0, "make the state unrepresentable"),
    ("todo!(", 0, "finish the stub"),
    ("unimplemented!(", 0, "finish the stub"),
    // Silent loss.
    ("let _ =", 0, "log or propagate the error"),
    // Parse fallbacks in config, cursor timestamps and error codes.
    (".ok()", 5, "log or propagate the error"),
    // Structure.
    ("#[allow(dead_code)]", 0, "delete the dead code"),
];

struct SourceFile {
    path: String,
    content: String,
}

/// Production `.rs` files under `src/`, excluding tests and test fakes.
fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
            continue;
        }
        let path_str = path.to_string_lossy().to_string();
        let is_test = path_str.ends_with("_test.rs") || path_str.ends_with("testing.rs");
        if is_test || path.extension().is_none_or(|e| e != "rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path: path_str, content });
        }
    }
}

fn hits(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|file| {
            let count = file.content.lines().filter(|line| line.contains(pattern)).count();
            (count > 0).then(|| (file.path.clone(), count))
        })
        .collect()
}

#[test]
fn source_tree_is_found() {
    let files = source_files();
    assert!(files.iter().any(|f| f.path.ends_with("lib.rs")), "run from the crate root");
}

#[test]
fn antipattern_budgets() {
    let files = source_files();
    let mut failures = Vec::new();

    for (pattern, budget, why) in BUDGETS {
        let hits = hits(&files, pattern);
        let count: usize = hits.iter().map(|(_, c)| c).sum();
        if count > *budget {
            let detail: Vec<_> = hits.iter().map(|(path, c)| format!("  {path}: {c}")).collect();
            failures.push(format!("{pattern} budget exceeded: found {count}, max {budget} ({why})\n{}", detail.join("\n")));
        }
    }

    assert!(failures.is_empty(), "{}", failures.join("\n"));
}
