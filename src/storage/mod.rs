use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to traverse the cache directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Failed to remove {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Local cache layout: extracted pages plus the flat index file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    root: PathBuf,
    pages_dir: PathBuf,
    index_path: PathBuf,
}

impl CacheLayout {
    pub fn new(root: PathBuf, language: &str, index_filename: &str) -> Self {
        Self {
            pages_dir: root.join(language),
            index_path: root.join(index_filename),
            root,
        }
    }

    /// Cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding `<platform>/<command>.md`
    pub fn pages_dir(&self) -> &Path {
        &self.pages_dir
    }

    /// Flat index file
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Path of a page listed in the index as `<platform>/<filename>`
    pub fn page_path(&self, platform: &str, filename: &str) -> PathBuf {
        self.pages_dir.join(platform).join(filename)
    }
}

/// 删除结果
#[derive(Debug, PartialEq, Eq)]
pub enum Deleted {
    /// 缓存目录不存在
    Nothing,
    /// 删除的条目数量（包括目录）
    Entries(usize),
}

/// 递归删除缓存目录
///
/// 深度优先：先删除文件，再删除已清空的目录，最后删除根目录。
/// 不跟随符号链接，链接本身被删除。遇到第一个错误即返回。
pub fn delete_cache(root: &Path) -> Result<Deleted, StorageError> {
    let Ok(metadata) = std::fs::symlink_metadata(root) else {
        return Ok(Deleted::Nothing);
    };

    // 根目录本身是链接时只删除链接，不进入目标目录
    if metadata.file_type().is_symlink() {
        std::fs::remove_file(root).map_err(|source| StorageError::Remove {
            path: root.to_path_buf(),
            source,
        })?;
        tracing::info!("Removed symlinked cache root {:?}", root);
        return Ok(Deleted::Entries(1));
    }

    let mut removed = 0;
    for entry in WalkDir::new(root).follow_links(false).contents_first(true) {
        let entry = entry?;
        let path = entry.path();

        let result = if entry.file_type().is_dir() {
            std::fs::remove_dir(path)
        } else {
            std::fs::remove_file(path)
        };

        result.map_err(|source| StorageError::Remove {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Removed {:?}", path);
        removed += 1;
    }

    tracing::info!("Deleted {} entries under {:?}", removed, root);
    Ok(Deleted::Entries(removed))
}
