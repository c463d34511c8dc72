mod cli;
mod config;
mod index;
mod render;
mod storage;
mod update;

use std::io::Write;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Action, Cli};
use config::AppConfig;
use index::Query;
use storage::Deleted;

/// 初始化终端日志（输出到 stderr，不干扰页面输出）
fn init_console_logging(config: &AppConfig, verbose: bool) {
  let level = if verbose {
    &config.logging.debug_level
  } else {
    &config.logging.level
  };

  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .with(tracing_subscriber::EnvFilter::new(
      std::env::var("RUST_LOG").unwrap_or_else(|_| level.clone()),
    ))
    .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    Err(e) => {
      // --help / --version 输出到 stdout，其余都是用法错误
      let code = if e.use_stderr() { 1 } else { 0 };
      let _ = e.print();
      std::process::exit(code);
    }
  };

  // 加载配置
  let config = AppConfig::load_default();
  init_console_logging(&config, cli.verbose);

  let Some(action) = cli.action() else {
    let _ = Cli::command().print_help();
    std::process::exit(1);
  };

  if let Err(e) = run(action, &config).await {
    tracing::debug!("{:?}", e);
    eprintln!("{:#}. Abort.", e);
    std::process::exit(1);
  }
}

async fn run(action: Action, config: &AppConfig) -> anyhow::Result<()> {
  match action {
    Action::List => run_list(config),
    Action::Update => run_update(config).await,
    Action::Delete => run_delete(config),
    Action::Display { platform, page } => run_display(platform.as_deref(), &page, config),
  }
}

/// 打印进度提示（不换行）
fn progress(message: &str) -> anyhow::Result<()> {
  print!("{}", message);
  std::io::stdout().flush()?;
  Ok(())
}

/// 运行更新命令：下载、解压、重建索引
async fn run_update(config: &AppConfig) -> anyhow::Result<()> {
  let layout = config.layout();
  std::fs::create_dir_all(layout.root())
    .with_context(|| format!("Failed to create the cache directory {}", layout.root().display()))?;

  // 下载
  let scratch = config.scratch_path();
  progress("Downloading the archive with pages... ")?;
  let client = update::http_client(&config.update.user_agent)?;
  update::fetch_archive(&client, &config.archive_url(), &scratch).await?;
  println!("Done.");

  // 解压
  progress("Extracting the pages... ")?;
  let extracted = update::extract_pages(
    &scratch,
    &config.storage.language,
    config.update.archive_root.as_deref(),
    &layout,
  )?;
  println!("Done.");

  // 重建索引
  progress("Creating the index file... ")?;
  let indexed = index::build_index(layout.pages_dir(), layout.index_path())?;
  println!("Done.");

  println!(
    "Update complete! {} pages extracted, {} pages indexed.",
    extracted, indexed
  );
  Ok(())
}

/// 列出所有页面
fn run_list(config: &AppConfig) -> anyhow::Result<()> {
  let layout = config.layout();
  let stdout = std::io::stdout();
  let count = index::list_pages(layout.index_path(), &mut stdout.lock())?;
  tracing::debug!("Listed {} pages", count);
  Ok(())
}

/// 删除本地缓存
fn run_delete(config: &AppConfig) -> anyhow::Result<()> {
  let layout = config.layout();
  match storage::delete_cache(layout.root())? {
    Deleted::Nothing => {
      println!("No cache found at {}. Nothing to delete.", layout.root().display());
    }
    Deleted::Entries(count) => {
      println!("Deleted {} ({} entries).", layout.root().display(), count);
    }
  }
  Ok(())
}

/// 查找并显示页面
fn run_display(platform: Option<&str>, page: &str, config: &AppConfig) -> anyhow::Result<()> {
  let query = match platform {
    Some(platform) => Query::with_platform(platform, page)?,
    None => Query::parse(page)?,
  };
  render::display_page(&config.layout(), &query, &config.style)
}
