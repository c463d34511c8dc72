mod extract;
mod fetch;

use std::path::PathBuf;

use thiserror::Error;

pub use extract::extract_pages;
pub use fetch::{fetch_archive, http_client};

#[derive(Error, Debug)]
pub enum UpdateError {
  #[error("Failed to create a temporary file {}: {source}", path.display())]
  Scratch {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Failed to fetch pages: {0}")]
  Http(#[from] reqwest::Error),
  #[error("Failed to fetch pages; server responded with {0}")]
  Status(reqwest::StatusCode),
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
  #[error("Failed to open the archive {}: {source}", path.display())]
  OpenArchive {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Failed to read the archive: {0}")]
  Zip(#[from] zip::result::ZipError),
  #[error("No '{0}' directory found in the archive")]
  LanguageNotFound(String),
  #[error("Refusing to extract '{0}' outside the cache directory")]
  UnsafePath(String),
  #[error("Failed to extract '{name}': {source}")]
  Extract {
    name: String,
    #[source]
    source: std::io::Error,
  },
}
