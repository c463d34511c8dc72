//! 页面渲染
//!
//! 逐行读取页面，根据行首字符决定样式，写出 ANSI 转义序列。

pub mod console;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

use crate::config::StyleConfig;
use crate::index::{self, Query};
use crate::storage::CacheLayout;

use console::ConsoleGuard;

/// 行类型，由行首字符决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// 空行，不输出
    Blank,
    /// `#` 标题
    Heading,
    /// `>` 描述
    Subheading,
    /// `-` 示例说明
    Description,
    /// `` ` `` 命令模板
    Command,
    /// 其他，原样输出
    Plain,
}

impl LineKind {
    /// 按字节判断，页面不要求是合法 UTF-8
    pub fn classify(line: &[u8]) -> Self {
        match line {
            b"" | b"\n" | b"\r\n" => Self::Blank,
            [b'#', ..] => Self::Heading,
            [b'>', ..] => Self::Subheading,
            [b'-', ..] => Self::Description,
            [b'`', ..] => Self::Command,
            _ => Self::Plain,
        }
    }

    fn style(self, styles: &StyleConfig) -> Option<&str> {
        match self {
            Self::Heading => Some(styles.heading.as_str()),
            Self::Subheading => Some(styles.subheading.as_str()),
            Self::Description => Some(styles.description.as_str()),
            Self::Command => Some(styles.command.as_str()),
            Self::Blank | Self::Plain => None,
        }
    }
}

/// 单遍渲染：一次只持有一行，行内容按原始字节写出
pub fn render_page<R: BufRead, W: Write>(
    mut reader: R,
    out: &mut W,
    styles: &StyleConfig,
) -> io::Result<usize> {
    let mut line = Vec::new();
    let mut written = 0;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }

        let kind = LineKind::classify(&line);
        if kind == LineKind::Blank {
            continue;
        }

        match kind.style(styles) {
            Some(style) => {
                out.write_all(style.as_bytes())?;
                out.write_all(&line)?;
                out.write_all(styles.reset.as_bytes())?;
            }
            None => out.write_all(&line)?,
        }
        written += 1;
    }

    out.flush()?;
    Ok(written)
}

/// 查找页面并渲染到标准输出
pub fn display_page(
    layout: &CacheLayout,
    query: &Query,
    styles: &StyleConfig,
) -> anyhow::Result<()> {
    let record = index::find_page(layout.index_path(), query)?;
    let path = layout.page_path(&record.platform, &record.filename);
    tracing::debug!("Rendering {:?}", path);

    let file = File::open(&path)
        .map_err(|e| anyhow::anyhow!("Failed to open the page {}: {}", path.display(), e))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let _console = ConsoleGuard::acquire(console::platform_console());
    render_page(BufReader::new(file), &mut out, styles)?;

    Ok(())
}
