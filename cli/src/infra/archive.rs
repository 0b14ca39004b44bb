//! Infrastructure implementation of the `ArchiveBuilder` port.
//!
//! Walks the source tree with `walkdir`, writes a deflated ZIP with `zip`,
//! and digests the result with `sha2`.

use std::fs::File;
use std::io::{self, BufWriter, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::application::ports::{ArchiveBuilder, ArchiveRequest, ArchiveSummary, ProgressReporter};
use crate::domain::archive::archive_name;
use crate::domain::version::hex_encode;

/// Production archive builder writing ZIP files on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipArchiveBuilder;

impl ArchiveBuilder for ZipArchiveBuilder {
    fn build(
        &self,
        request: &ArchiveRequest<'_>,
        reporter: &dyn ProgressReporter,
    ) -> Result<ArchiveSummary> {
        let result = write_archive(request, reporter);
        if result.is_err() {
            let _ = std::fs::remove_file(request.output);
        }
        result
    }
}

fn write_archive(
    request: &ArchiveRequest<'_>,
    reporter: &dyn ProgressReporter,
) -> Result<ArchiveSummary> {
    let root = request.root;
    anyhow::ensure!(
        root.is_dir(),
        "archive source {} is not a directory",
        root.display()
    );

    let file = File::create(request.output)
        .with_context(|| format!("cannot create {}", request.output.display()))?;
    let output = request
        .output
        .canonicalize()
        .with_context(|| format!("cannot resolve {}", request.output.display()))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let mut entries = 0usize;

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            match archive_name(root, e.path()) {
                Some(name) if request.rules.excludes(e.path(), &name) => {
                    reporter.step(&format!("skipped {name}"));
                    false
                }
                _ => true,
            }
        });

    for entry in walker {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if same_file(path, &output) {
            continue;
        }
        let Some(name) = archive_name(root, path) else {
            continue;
        };
        zip.start_file(name.as_str(), options)
            .with_context(|| format!("adding {name}"))?;
        let mut source =
            File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        io::copy(&mut source, &mut zip).with_context(|| format!("writing {name}"))?;
        reporter.step(&format!("added {name}"));
        entries += 1;
    }

    for synthetic in request.entries {
        let body = synthetic.render()?;
        zip.start_file(synthetic.name.as_str(), options)
            .with_context(|| format!("adding {}", synthetic.name))?;
        io::Write::write_all(&mut zip, body.as_bytes())
            .with_context(|| format!("writing {}", synthetic.name))?;
        reporter.step(&format!("added {} (generated)", synthetic.name));
        entries += 1;
    }

    let writer = zip.finish().context("finishing archive")?;
    writer
        .into_inner()
        .map_err(io::IntoInnerError::into_error)
        .context("flushing archive")?;

    let size = std::fs::metadata(request.output)
        .with_context(|| format!("cannot stat {}", request.output.display()))?
        .len();
    let sha256 = sha256_file(request.output)?;
    tracing::info!(path = %request.output.display(), entries, size, %sha256, "archive written");
    Ok(ArchiveSummary {
        path: PathBuf::from(request.output),
        entries,
        size,
        sha256,
    })
}

fn same_file(path: &Path, output: &Path) -> bool {
    path.canonicalize().is_ok_and(|p| p == output)
}

/// Compute the SHA256 hex digest of a file.
///
/// Reads the file in 64 KB chunks to avoid loading large files into memory.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    loop {
        let n = file.read(&mut buf).context("reading file")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}
