//! 配置管理模块
//!
//! 提供应用配置的加载、解析和默认值管理。
//! 配置文件采用 TOML 格式，支持从文件加载或使用内置默认值。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::storage::CacheLayout;

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 存储配置
    pub storage: StorageConfig,
    /// 更新配置
    pub update: UpdateConfig,
    /// 样式配置
    pub style: StyleConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 缓存目录（空表示使用 $HOME/.config/tldr）
    pub cache_dir: Option<PathBuf>,
    /// 索引文件名
    pub index_filename: String,
    /// 页面语言目录（pages, pages.de, pages.zh ...）
    pub language: String,
}

/// 更新配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// tldr-pages 压缩包下载地址
    pub archive_url: String,
    /// 压缩包顶层目录名（空表示自动识别）
    pub archive_root: Option<String>,
    /// 临时目录中保存压缩包的文件名
    pub scratch_filename: String,
    /// HTTP 请求 User-Agent
    pub user_agent: String,
}

/// 终端样式（ANSI 转义序列）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// 标题 `#`
    pub heading: String,
    /// 描述 `>`
    pub subheading: String,
    /// 示例说明 `-`
    pub description: String,
    /// 命令模板 `` ` ``
    pub command: String,
    /// 重置
    pub reset: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 默认日志级别
    pub level: String,
    /// --verbose 时的日志级别
    pub debug_level: String,
}

// 默认值实现

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            index_filename: "index".to_string(),
            language: "pages".to_string(),
        }
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            archive_url: "https://codeload.github.com/tldr-pages/tldr/zip/main".to_string(),
            archive_root: None,
            scratch_filename: "tldr-main.zip".to_string(),
            user_agent: concat!("tldr-lite/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            heading: "\x1b[31m".to_string(),
            subheading: "\x1b[4m".to_string(),
            description: "\x1b[32m".to_string(),
            command: "\x1b[1m".to_string(),
            reset: "\x1b[0m".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            debug_level: "debug".to_string(),
        }
    }
}

impl AppConfig {
    /// 从 TOML 文件加载配置
    /// 如果文件不存在，返回默认配置
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config file: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config file: {}", e);
                }
            }
        }
        Self::default()
    }

    /// 从默认位置加载配置
    /// 优先级：
    /// 1. 当前目录下的 tldr.toml
    /// 2. 配置目录下的 tldr.toml
    /// 3. 内置默认值
    pub fn load_default() -> Self {
        let current_config = PathBuf::from("tldr.toml");
        if current_config.exists() {
            return Self::load(&current_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tldr.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        Self::default()
    }

    /// 获取缓存根目录
    /// 优先级：配置文件 > TLDR_CACHE_DIR > $HOME/.config/tldr
    pub fn cache_dir(&self) -> PathBuf {
        self.storage
            .cache_dir
            .clone()
            .or_else(|| std::env::var_os("TLDR_CACHE_DIR").map(PathBuf::from))
            .unwrap_or_else(default_cache_dir)
    }

    /// 缓存目录布局（页面目录、索引文件）
    pub fn layout(&self) -> CacheLayout {
        CacheLayout::new(
            self.cache_dir(),
            &self.storage.language,
            &self.storage.index_filename,
        )
    }

    /// 压缩包下载地址，TLDR_ARCHIVE_URL 优先
    pub fn archive_url(&self) -> String {
        std::env::var("TLDR_ARCHIVE_URL").unwrap_or_else(|_| self.update.archive_url.clone())
    }

    /// 下载压缩包的临时路径
    pub fn scratch_path(&self) -> PathBuf {
        scratch_dir().join(&self.update.scratch_filename)
    }

    /// 生成默认配置文件内容
    #[cfg(test)]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

/// 获取默认缓存目录
fn default_cache_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("tldr")
}

/// 临时目录：TMPDIR > TMP > /tmp
fn scratch_dir() -> PathBuf {
    ["TMPDIR", "TMP"]
        .into_iter()
        .filter_map(std::env::var_os)
        .find(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}
