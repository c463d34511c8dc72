use clap::{ArgGroup, Parser};

#[derive(Parser, Debug)]
#[command(name = "tldr")]
#[command(author, version, about = "Simplified, community-driven man pages")]
#[command(group(ArgGroup::new("action").args(["list", "update", "delete", "page"])))]
pub struct Cli {
  /// Show all available pages
  #[arg(short, long)]
  pub list: bool,

  /// Fetch the latest copies of the pages and rebuild the index
  #[arg(short, long)]
  pub update: bool,

  /// Delete the local page cache
  #[arg(short, long)]
  pub delete: bool,

  /// Display a platform specific page (e.g., tldr -p linux tar)
  #[arg(short, long, value_name = "PLATFORM", requires = "page")]
  pub platform: Option<String>,

  /// Enable debug logging on stderr
  #[arg(short, long)]
  pub verbose: bool,

  /// Page to display: `command` or `platform/command`
  #[arg(value_name = "PAGE")]
  pub page: Option<String>,
}

/// 解析后的动作
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
  List,
  Update,
  Delete,
  Display {
    platform: Option<String>,
    page: String,
  },
}

impl Cli {
  /// 没有指定任何动作时返回 None
  pub fn action(&self) -> Option<Action> {
    if self.list {
      Some(Action::List)
    } else if self.update {
      Some(Action::Update)
    } else if self.delete {
      Some(Action::Delete)
    } else {
      self.page.clone().map(|page| Action::Display {
        platform: self.platform.clone(),
        page,
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(std::iter::once("tldr").chain(args.iter().copied()))
  }

  #[test]
  fn test_flags() {
    assert_eq!(parse(&["-l"]).unwrap().action(), Some(Action::List));
    assert_eq!(parse(&["--update"]).unwrap().action(), Some(Action::Update));
    assert_eq!(parse(&["-d"]).unwrap().action(), Some(Action::Delete));
    assert_eq!(parse(&[]).unwrap().action(), None);
  }

  #[test]
  fn test_page() {
    assert_eq!(
      parse(&["linux/tar"]).unwrap().action(),
      Some(Action::Display { platform: None, page: "linux/tar".to_string() })
    );
    assert_eq!(
      parse(&["-p", "osx", "tar"]).unwrap().action(),
      Some(Action::Display { platform: Some("osx".to_string()), page: "tar".to_string() })
    );
  }

  #[test]
  fn test_invalid() {
    // 动作互斥
    assert!(parse(&["-l", "-u"]).is_err());
    assert!(parse(&["-l", "tar"]).is_err());
    // -p 需要页面
    assert!(parse(&["-p", "linux"]).is_err());
    assert!(parse(&["-x"]).is_err());
    assert!(parse(&["tar", "extra"]).is_err());
  }

  #[test]
  fn test_help_and_version() {
    let err = parse(&["-h"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    let err = parse(&["--version"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
  }

  #[test]
  fn test_cli_definition() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
  }
}
