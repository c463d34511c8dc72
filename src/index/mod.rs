use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum IndexError {
  #[error("Failed to read the index file {}; run `tldr --update` first", path.display())]
  Missing { path: PathBuf },
  #[error("Failed to traverse the pages directory: {0}")]
  Walk(#[from] walkdir::Error),
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
  #[error("Invalid page name '{0}'")]
  InvalidQuery(String),
  #[error("The page '{0}' has not been found")]
  NotFound(String),
}

/// 页面查询：`tar` 或 `linux/tar`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
  platform: Option<String>,
  filename: String,
}

impl Query {
  pub fn parse(raw: &str) -> Result<Self, IndexError> {
    let raw = raw.trim();
    let invalid = || IndexError::InvalidQuery(raw.to_string());

    let (platform, command) = match raw.split_once('/') {
      Some((platform, command)) => (Some(platform), command),
      None => (None, raw),
    };

    if command.is_empty() || command.contains('/') || platform.is_some_and(str::is_empty) {
      return Err(invalid());
    }

    Ok(Self {
      platform: platform.map(str::to_string),
      filename: format!("{}.md", command),
    })
  }

  /// `-p <platform> <page>` 形式
  pub fn with_platform(platform: &str, page: &str) -> Result<Self, IndexError> {
    if page.contains('/') {
      return Err(IndexError::InvalidQuery(format!("{}/{}", platform, page)));
    }
    Self::parse(&format!("{}/{}", platform.trim(), page.trim()))
  }

  /// 匹配一条索引记录
  /// - 带平台：完整记录相等
  /// - 不带平台：`/` 之后的文件名相等
  fn matches(&self, record: &str) -> bool {
    let Some((platform, filename)) = record.split_once('/') else {
      return false;
    };
    match &self.platform {
      Some(wanted) => wanted == platform && self.filename == filename,
      None => self.filename == filename,
    }
  }
}

impl fmt::Display for Query {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let command = self.filename.trim_end_matches(".md");
    match &self.platform {
      Some(platform) => write!(f, "{}/{}", platform, command),
      None => write!(f, "{}", command),
    }
  }
}

/// 索引中的一条记录 `<platform>/<filename>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
  pub platform: String,
  pub filename: String,
}

impl fmt::Display for PageRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.platform, self.filename)
  }
}

/// 重建索引文件（截断后整体重写）
///
/// 每个页面文件一行：`<父目录名>/<文件名>`。不跟随符号链接，
/// 行的顺序就是目录遍历顺序，不保证稳定。
pub fn build_index(pages_root: &Path, index_path: &Path) -> Result<usize, IndexError> {
  let mut writer = BufWriter::new(File::create(index_path)?);
  let mut count = 0;

  // 深度 1 的文件没有平台目录，跳过
  for entry in WalkDir::new(pages_root).follow_links(false).min_depth(2) {
    let entry = entry?;
    if !entry.file_type().is_file() {
      continue;
    }

    let Some(platform) = entry.path().parent().and_then(Path::file_name) else {
      continue;
    };

    writeln!(
      writer,
      "{}/{}",
      platform.to_string_lossy(),
      entry.file_name().to_string_lossy()
    )?;
    count += 1;
  }

  writer.flush()?;
  tracing::info!("Indexed {} pages into {:?}", count, index_path);
  Ok(count)
}

fn open_index(index_path: &Path) -> Result<BufReader<File>, IndexError> {
  match File::open(index_path) {
    Ok(file) => Ok(BufReader::new(file)),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(IndexError::Missing {
      path: index_path.to_path_buf(),
    }),
    Err(e) => Err(e.into()),
  }
}

/// 线性扫描索引，返回第一条匹配的记录
///
/// 不带平台的查询在多个平台都存在时，返回索引中最先出现的那条。
pub fn find_page(index_path: &Path, query: &Query) -> Result<PageRecord, IndexError> {
  let reader = open_index(index_path)?;

  for line in reader.lines() {
    let line = line?;
    let record = line.trim_end_matches('\r');
    if !query.matches(record) {
      continue;
    }

    if let Some((platform, filename)) = record.split_once('/') {
      tracing::debug!("Query '{}' matched '{}'", query, record);
      return Ok(PageRecord {
        platform: platform.to_string(),
        filename: filename.to_string(),
      });
    }
  }

  Err(IndexError::NotFound(query.to_string()))
}

/// 按原样输出所有索引记录
pub fn list_pages<W: Write>(index_path: &Path, out: &mut W) -> Result<usize, IndexError> {
  let reader = open_index(index_path)?;
  let mut count = 0;

  for line in reader.lines() {
    let line = line?;
    if line.is_empty() {
      continue;
    }
    writeln!(out, "{}", line)?;
    count += 1;
  }

  Ok(count)
}
