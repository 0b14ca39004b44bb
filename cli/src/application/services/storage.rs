//! Bucket preparation and archive upload.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

use crate::application::ports::{ArchiveSummary, ObjectStore, ObjectUpload, ProgressReporter};
use crate::domain::{AwsCredentials, DeployError};

/// Make sure the configured bucket exists in the configured region.
///
/// A missing bucket is created. A bucket living in another region is never
/// reused.
///
/// # Errors
///
/// Returns [`DeployError::BucketRegionMismatch`] on a region mismatch, or the
/// storage error if the lookup or creation fails.
pub async fn ensure_bucket(
    store: &impl ObjectStore,
    reporter: &impl ProgressReporter,
    credentials: &AwsCredentials,
) -> Result<()> {
    let bucket = credentials.bucket();
    let requested = credentials.region();
    match store
        .bucket_region(bucket)
        .await
        .with_context(|| format!("looking up bucket {bucket}"))?
    {
        None => {
            reporter.step(&format!("creating bucket {bucket} in {requested}..."));
            store
                .create_bucket(bucket, requested)
                .await
                .with_context(|| format!("creating bucket {bucket}"))?;
            reporter.success(&format!("created bucket {bucket}"));
            Ok(())
        }
        Some(actual) if actual == requested => {
            tracing::debug!(bucket, region = %actual, "bucket already exists");
            Ok(())
        }
        Some(actual) => Err(DeployError::BucketRegionMismatch {
            bucket: bucket.to_string(),
            actual,
            requested: requested.to_string(),
        }
        .into()),
    }
}

/// Upload a built archive under `bucket_path + key` and return the full key.
///
/// The object carries the upload time and the archive digest as metadata.
///
/// # Errors
///
/// Returns the storage error unchanged; there is no retry.
pub async fn upload_archive(
    store: &impl ObjectStore,
    reporter: &impl ProgressReporter,
    credentials: &AwsCredentials,
    archive: &ArchiveSummary,
    key: &str,
) -> Result<String> {
    let object_key = credentials.object_key(key);
    let metadata = vec![
        ("time".to_string(), upload_timestamp()),
        ("sha256".to_string(), archive.sha256.clone()),
    ];
    reporter.step(&format!(
        "uploading {} to s3://{}/{object_key}...",
        archive.path.display(),
        credentials.bucket()
    ));
    let upload = ObjectUpload {
        bucket: credentials.bucket(),
        key: &object_key,
        path: &archive.path,
        metadata: &metadata,
    };
    store
        .put_object(&upload, &|sent, total| reporter.transfer(sent, total))
        .await
        .with_context(|| format!("uploading {object_key}"))?;
    reporter.success(&format!("uploaded s3://{}/{object_key}", credentials.bucket()));
    Ok(object_key)
}

fn upload_timestamp() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    format!("{secs:.6}")
}
