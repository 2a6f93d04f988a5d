use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

/// URL prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/arquivos";

/// Directory-backed object store. Files live in `<root>/<bucket>/<name>` and
/// are served read-only under [`PUBLIC_PREFIX`].
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub async fn init(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores `bytes` under a fresh unique name and returns its public URL.
    pub async fn put(&self, bucket: &str, original_name: &str, bytes: &[u8]) -> io::Result<String> {
        let dir = self.root.join(bucket);
        tokio::fs::create_dir_all(&dir).await?;

        let name = format!(
            "{}-{}",
            uuid::Uuid::new_v4().simple(),
            sanitize_file_name(original_name)
        );
        tokio::fs::write(dir.join(&name), bytes).await?;

        info!("Stored {} bytes as {}/{}", bytes.len(), bucket, name);
        Ok(format!("{PUBLIC_PREFIX}/{bucket}/{name}"))
    }

    /// Removes a file previously returned by [`FileStorage::put`]. URLs that
    /// point elsewhere are ignored.
    pub async fn delete_url(&self, url: &str) -> io::Result<()> {
        let Some(path) = self.local_path(url) else {
            debug!("Not a stored file, skipping delete: {}", url);
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn local_path(&self, url: &str) -> Option<PathBuf> {
        let relative = Path::new(url.strip_prefix(PUBLIC_PREFIX)?.trim_start_matches('/'));
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        (safe && relative.components().count() > 0).then(|| self.root.join(relative))
    }
}

/// Keeps a readable, path-free version of an uploaded file name.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(['.', '_']);
    if cleaned.is_empty() {
        "arquivo".to_string()
    } else {
        cleaned.chars().take(80).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_paths_and_odd_characters() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\Relatório Final.PDF"), "relat_rio_final.pdf");
        assert_eq!(sanitize_file_name("..."), "arquivo");
    }

    #[tokio::test]
    async fn put_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::init(dir.path()).await.unwrap();

        let url = storage.put("reports", "ata.pdf", b"%PDF").await.unwrap();
        assert!(url.starts_with("/arquivos/reports/"));
        assert!(url.ends_with("-ata.pdf"));

        let path = storage.local_path(&url).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF");

        storage.delete_url(&url).await.unwrap();
        assert!(!path.exists());
        // Deleting twice is fine.
        storage.delete_url(&url).await.unwrap();
    }

    #[tokio::test]
    async fn foreign_and_traversal_urls_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::init(dir.path()).await.unwrap();
        assert!(storage.local_path("https://example.org/doc.pdf").is_none());
        assert!(storage.local_path("/arquivos/../secret").is_none());
        storage.delete_url("https://example.org/doc.pdf").await.unwrap();
    }
}
