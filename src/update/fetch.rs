use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::UpdateError;

/// 创建 HTTP 客户端（没有超时）
pub fn http_client(user_agent: &str) -> Result<reqwest::Client, UpdateError> {
  Ok(reqwest::Client::builder().user_agent(user_agent).build()?)
}

/// 下载 tldr-pages 压缩包到本地文件
///
/// 目标文件先被创建（截断），然后按块写入响应体。非 2xx 状态视为失败，不重试。
pub async fn fetch_archive(
  client: &reqwest::Client,
  url: &str,
  dest: &Path,
) -> Result<u64, UpdateError> {
  let file = File::create(dest).map_err(|source| UpdateError::Scratch {
    path: dest.to_path_buf(),
    source,
  })?;
  let mut writer = BufWriter::new(file);

  tracing::info!("Downloading {}", url);
  let mut response = client.get(url).send().await?;

  let status = response.status();
  if !status.is_success() {
    return Err(UpdateError::Status(status));
  }

  let mut total = 0u64;
  while let Some(chunk) = response.chunk().await? {
    writer.write_all(&chunk)?;
    total += chunk.len() as u64;
  }
  writer.flush()?;

  tracing::info!("Download complete, size: {} bytes", total);
  Ok(total)
}
