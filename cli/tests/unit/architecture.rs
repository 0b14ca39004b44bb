//! Structural tests for architectural boundary enforcement.
//!
//! These tests scan source files to verify that the layer boundaries
//! (domain → application → infra/output → commands) are maintained.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Read a file and strip comment lines to avoid false positives.
fn read_non_comment_lines(path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .filter(|l| {
            let trimmed = l.trim();
            !trimmed.starts_with("//") && !trimmed.starts_with("/*") && !trimmed.starts_with('*')
        })
        .map(String::from)
        .collect()
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    /// Process a line and return `true` if it's inside a `#[cfg(test)]` block.
    fn process_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.contains("#[cfg(test)]") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

fn src_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src")
}

fn relative(file: &Path) -> String {
    file.strip_prefix(env!("CARGO_MANIFEST_DIR"))
        .unwrap_or(file)
        .display()
        .to_string()
        .replace('\\', "/")
}

/// Report every non-comment line in `dir` that contains a forbidden needle.
fn scan_for(dir: &Path, forbidden: &[&str], skip: impl Fn(&str) -> bool) -> Vec<String> {
    let mut violations = Vec::new();
    for file in collect_rs_files(dir) {
        let rel = relative(&file);
        if skip(&rel) {
            continue;
        }
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            for needle in forbidden {
                if line.contains(needle) {
                    violations.push(format!("{rel}:{}: `{needle}`: {line}", i + 1));
                }
            }
        }
    }
    violations
}

// ── Domain purity ─────────────────────────────────────────────────────────────

#[test]
fn domain_has_no_io_or_outer_layer_imports() {
    let violations = scan_for(
        &src_dir().join("domain"),
        &[
            "crate::infra",
            "crate::application",
            "crate::commands",
            "crate::output",
            "tokio::",
            "std::fs",
            "std::process",
            "std::net",
        ],
        |_| false,
    );
    assert!(
        violations.is_empty(),
        "Found I/O or outer-layer imports in domain/:\n{}",
        violations.join("\n")
    );
}

// ── Services depend on ports only ─────────────────────────────────────────────

#[test]
fn services_do_not_reach_into_adapters() {
    let violations = scan_for(
        &src_dir().join("application"),
        &["crate::infra", "crate::commands", "crate::output", "crate::app::"],
        |_| false,
    );
    assert!(
        violations.is_empty(),
        "Found adapter imports in application/ — depend on ports instead:\n{}",
        violations.join("\n")
    );
}

#[test]
fn no_concrete_adapters_in_service_signatures() {
    let concrete = ["AwsCli<", "TokioCommandRunner", "ZipArchiveBuilder", "YamlConfigStore"];
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir().join("application").join("services")) {
        let rel = relative(&file);
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            if !line.contains("fn ") {
                continue;
            }
            for ty in concrete {
                if line.contains(ty) {
                    violations.push(format!("{rel}:{}: concrete `{ty}`: {line}", i + 1));
                }
            }
        }
    }
    assert!(
        violations.is_empty(),
        "Found concrete adapter types in service signatures — use trait bounds instead:\n{}",
        violations.join("\n")
    );
}

// ── Process spawning stays in infra ───────────────────────────────────────────

#[test]
fn processes_are_only_spawned_from_infra() {
    let violations = scan_for(
        &src_dir(),
        &["TokioCommandRunner::new", "tokio::process::Command", "std::process::Command"],
        |rel| rel.contains("/infra/"),
    );
    assert!(
        violations.is_empty(),
        "Found process spawning outside infra/:\n{}",
        violations.join("\n")
    );
}

// ── Commands render through the Renderer ──────────────────────────────────────

#[test]
fn no_inline_json_branching_in_commands() {
    let violations = scan_for(
        &src_dir().join("commands"),
        &["json: bool", "if json", "if !json", "is_json()", "serde_json::"],
        |_| false,
    );
    assert!(
        violations.is_empty(),
        "Found inline JSON handling in commands/ — use app.renderer() instead:\n{}",
        violations.join("\n")
    );
}

// ── No panicking shortcuts in production code ─────────────────────────────────

#[test]
fn no_unwrap_or_expect_outside_tests() {
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir()) {
        let rel = relative(&file);
        if rel.ends_with("test_support.rs") || rel.ends_with("output/tests.rs") {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        let mut tracker = CfgTestTracker::new();
        for (i, line) in content.lines().enumerate() {
            let in_test = tracker.process_line(line);
            let trimmed = line.trim();
            if in_test || trimmed.starts_with("//") {
                continue;
            }
            if line.contains(".unwrap()") || line.contains(".expect(") {
                violations.push(format!("{rel}:{}: {trimmed}", i + 1));
            }
        }
    }
    assert!(
        violations.is_empty(),
        "Found unwrap()/expect() in non-test code — propagate with `?` instead:\n{}",
        violations.join("\n")
    );
}
