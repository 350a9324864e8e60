//! Download one object from the source bucket.

use crate::config::Config;
use crate::error::{ErrorKind, Result};
use arxcat_fetch::{MANIFEST_KEY, SourceBucket};
use arxcat_naming::BulkArchiveName;
use exn::ResultExt;
use std::path::PathBuf;

pub async fn run(config: &Config, name: &str, output: Option<PathBuf>) -> Result<()> {
    let (key_id, key_secret) = config.credentials()?;
    let bucket = SourceBucket::with_bucket(&config.bucket, &config.region, key_id, key_secret);

    // The name is corroborated locally before paying for the request.
    let key = match name {
        "manifest" => MANIFEST_KEY.to_string(),
        name => {
            let parsed = BulkArchiveName::parse(name).map_err(|err| err.raise(ErrorKind::Name(name.to_string())))?;
            parsed.key()
        },
    };
    let bytes = if key == MANIFEST_KEY {
        bucket.fetch_manifest().await
    } else {
        bucket.fetch_archive(&key).await
    }
    .map_err(|err| err.raise(ErrorKind::Fetch(key.clone())))?;

    let path = output.unwrap_or_else(|| default_output(&key));
    tokio::fs::write(&path, &bytes).await.or_raise(|| ErrorKind::Io(path.clone()))?;
    println!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn default_output(key: &str) -> PathBuf {
    match key.rsplit_once('/') {
        Some((_, basename)) => PathBuf::from(basename),
        None => PathBuf::from(key),
    }
}
