//! On-disk memoization of expensive results.
//!
//! ```rust,ignore
//! let rows = load_or_fetch("cache/orders.json", async {
//!     warehouse.run_query("select * from orders", None).await
//! })
//! .await?;
//! ```

use std::future::Future;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::{GivemedataError, GivemedataResult};

/// Return the value cached at `path`, or compute it with `fetch` and cache it.
///
/// The cache is plain JSON. A file that exists but cannot be decoded is an
/// error rather than a miss, so a stale format is never silently replaced.
pub async fn load_or_fetch<T, F>(path: impl AsRef<Path>, fetch: F) -> GivemedataResult<T>
where
    T: Serialize + DeserializeOwned,
    F: Future<Output = GivemedataResult<T>>,
{
    let path = path.as_ref();
    let cache_err = |source: Box<dyn std::error::Error + Send + Sync>| GivemedataError::Cache {
        path: path.to_path_buf(),
        source,
    };

    match tokio::fs::read(path).await {
        Ok(data) => {
            info!(path = %path.display(), "Using persistent result file");
            return serde_json::from_slice(&data).map_err(|e| cache_err(e.into()));
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(cache_err(e.into())),
    }

    let value = fetch.await?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| cache_err(e.into()))?;
    }
    let data = serde_json::to_vec(&value).map_err(|e| cache_err(e.into()))?;
    tokio::fs::write(path, data)
        .await
        .map_err(|e| cache_err(e.into()))?;
    info!(path = %path.display(), "Saved persistent result file");

    Ok(value)
}
