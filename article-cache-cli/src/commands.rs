use std::path::Path;

use article_cache::image_key::{image_item_key, image_variant};
use article_cache::{CacheConfig, CacheFileWriter, KeyDeriver, WriteOutcome};
use tracing::{info, warn};
use url::Url;

use crate::error::AppError;

/// Download every key under one group; Ctrl-C cancels the group
pub async fn add(writer: &CacheFileWriter, group: &str, keys: &[String]) -> Result<(), AppError> {
    let adds = futures::future::join_all(keys.iter().map(|key| writer.add(group, key)));
    tokio::pin!(adds);

    let results = tokio::select! {
        results = &mut adds => results,
        _ = tokio::signal::ctrl_c() => {
            warn!(group, "Interrupted, cancelling downloads");
            writer.cancel(group);
            adds.await
        }
    };

    let mut failed = 0;
    for (key, result) in keys.iter().zip(results) {
        match result {
            Ok(outcome) => {
                let state = match outcome.write {
                    WriteOutcome::Created => "cached",
                    WriteOutcome::AlreadyExists => "already cached",
                };
                info!(key = %key, etag = ?outcome.etag, "{state}");
                println!("{state}\t{key}");
            }
            Err(e) => {
                failed += 1;
                warn!(key = %key, error = %e, "Failed to cache item");
                println!("failed\t{key}\t{e}");
            }
        }
    }

    if failed > 0 {
        return Err(AppError::PartialFailure {
            failed,
            total: keys.len(),
        });
    }
    Ok(())
}

pub async fn migrate(
    writer: &CacheFileWriter,
    url: &str,
    content_path: &Path,
    mime_type: &str,
    keys: Vec<String>,
) -> Result<(), AppError> {
    let desktop_url =
        Url::parse(url).map_err(|e| AppError::InvalidInput(format!("{url}: {e}")))?;
    let content = tokio::fs::read_to_string(content_path).await?;
    let total = keys.len();

    let succeeded = writer.migrate(&desktop_url, content, keys, mime_type).await?;

    for key in &succeeded {
        println!("migrated\t{key}");
    }
    info!(succeeded = succeeded.len(), total, "Migration finished");
    Ok(())
}

/// Print where each key is stored; with `image`, keys are image URLs and are
/// looked up under the item key shared by all their renditions
pub fn inspect(
    writer: &CacheFileWriter,
    config: &CacheConfig,
    keys: &[String],
    image: bool,
) -> Result<(), AppError> {
    let deriver = KeyDeriver::new(config.hash_file_names);
    for arg in keys {
        let key = if image {
            let url =
                Url::parse(arg).map_err(|e| AppError::InvalidInput(format!("{arg}: {e}")))?;
            let item_key = image_item_key(&url);
            println!(
                "{arg}\n  item key: {item_key}\n  variant: {}",
                image_variant(&url).as_deref().unwrap_or("original"),
            );
            item_key
        } else {
            arg.clone()
        };

        let file_name = deriver.derive_file_name(&key);
        match writer.lookup(&key) {
            Some(entry) => println!(
                "{key}\n  file: {}\n  mime: {}\n  etag: {}",
                entry.path.display(),
                entry.mime_type.as_deref().unwrap_or("unknown"),
                entry.etag.as_deref().unwrap_or("-"),
            ),
            None => println!("{key}\n  file: {file_name} (not cached)"),
        }
    }
    Ok(())
}
