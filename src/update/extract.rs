use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use zip::ZipArchive;

use super::UpdateError;
use crate::storage::CacheLayout;

/// 从压缩包中解压指定语言的页面目录
///
/// 压缩包结构：`<root>/<language>/<platform>/<command>.md`。
/// 条目按前缀筛选，与条目在压缩包中的顺序无关。`archive_root` 为空时，
/// 取第一个以 `<language>` 为第二级目录的条目的顶层目录名。
/// 解压前不清理旧文件；任一条目失败即中止。
pub fn extract_pages(
  archive_path: &Path,
  language: &str,
  archive_root: Option<&str>,
  layout: &CacheLayout,
) -> Result<usize, UpdateError> {
  let file = File::open(archive_path).map_err(|source| UpdateError::OpenArchive {
    path: archive_path.to_path_buf(),
    source,
  })?;
  let mut archive = ZipArchive::new(BufReader::new(file))?;

  let mut root = archive_root.map(str::to_string);
  let mut selected = false;
  let mut extracted = 0;

  for i in 0..archive.len() {
    let mut entry = archive.by_index(i)?;
    let name = entry.name().to_string();

    let Some(remainder) = select_entry(&name, language, &mut root) else {
      continue;
    };
    selected = true;

    let relative = sanitize(remainder).ok_or_else(|| UpdateError::UnsafePath(name.clone()))?;
    let dest = layout.pages_dir().join(relative);
    let to_error = |source| UpdateError::Extract {
      name: name.clone(),
      source,
    };

    if entry.is_dir() {
      std::fs::create_dir_all(&dest).map_err(to_error)?;
      continue;
    }

    if let Some(parent) = dest.parent() {
      std::fs::create_dir_all(parent).map_err(to_error)?;
    }
    let mut out = File::create(&dest).map_err(to_error)?;
    std::io::copy(&mut entry, &mut out).map_err(to_error)?;

    tracing::debug!("Extracted {} -> {:?}", name, dest);
    extracted += 1;
  }

  if !selected {
    return Err(UpdateError::LanguageNotFound(language.to_string()));
  }

  tracing::info!("Extracted {} pages into {:?}", extracted, layout.pages_dir());
  Ok(extracted)
}

/// 判断条目是否位于 `<root>/<language>/` 之下，返回剩余路径
fn select_entry<'a>(name: &'a str, language: &str, root: &mut Option<String>) -> Option<&'a str> {
  let (top, rest) = name.split_once('/')?;

  let remainder = match rest.strip_prefix(language)? {
    "" => "",
    tail => tail.strip_prefix('/')?,
  };

  if let Some(expected) = root.as_deref() {
    if expected != top {
      return None;
    }
  } else {
    tracing::debug!("Detected archive root '{}'", top);
    *root = Some(top.to_string());
  }

  Some(remainder)
}

/// 只允许普通路径分量，防止写出缓存目录
fn sanitize(remainder: &str) -> Option<PathBuf> {
  let mut path = PathBuf::new();
  for component in Path::new(remainder).components() {
    match component {
      Component::Normal(part) => path.push(part),
      Component::CurDir => {}
      _ => return None,
    }
  }
  Some(path)
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use zip::write::SimpleFileOptions;
  use zip::ZipWriter;

  use super::*;

  enum Item<'a> {
    Dir(&'a str),
    File(&'a str, &'a str),
  }

  fn create_archive(path: &Path, items: &[Item]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    for item in items {
      match item {
        Item::Dir(name) => zip.add_directory(*name, options).unwrap(),
        Item::File(name, content) => {
          zip.start_file(*name, options).unwrap();
          zip.write_all(content.as_bytes()).unwrap();
        }
      }
    }
    zip.finish().unwrap();
  }

  fn layout(dir: &Path) -> CacheLayout {
    CacheLayout::new(dir.join("cache"), "pages", "index")
  }

  #[test]
  fn test_select_entry() {
    let mut root = None;
    assert_eq!(select_entry("tldr-main/README.md", "pages", &mut root), None);
    assert_eq!(root, None);
    assert_eq!(select_entry("tldr-main/pages/", "pages", &mut root), Some(""));
    assert_eq!(root.as_deref(), Some("tldr-main"));
    assert_eq!(
      select_entry("tldr-main/pages/linux/tar.md", "pages", &mut root),
      Some("linux/tar.md")
    );
    // 其他语言目录不会被选中
    assert_eq!(select_entry("tldr-main/pages.de/linux/tar.md", "pages", &mut root), None);
    // 顶层目录不一致
    assert_eq!(select_entry("other/pages/linux/tar.md", "pages", &mut root), None);
  }

  #[test]
  fn test_sanitize() {
    assert_eq!(sanitize("linux/tar.md"), Some(PathBuf::from("linux/tar.md")));
    assert_eq!(sanitize(""), Some(PathBuf::new()));
    assert_eq!(sanitize("../../etc/passwd"), None);
    assert_eq!(sanitize("/etc/passwd"), None);
  }

  #[test]
  fn test_extract_language_subtree() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("tldr.zip");
    create_archive(
      &archive,
      &[
        Item::Dir("root/"),
        Item::File("root/README.md", "readme"),
        Item::Dir("root/pages/"),
        Item::Dir("root/pages/linux/"),
        Item::File("root/pages/linux/tar.md", "# tar\n"),
        Item::Dir("root/pages/common/"),
        Item::File("root/pages/common/ls.md", "# ls\n"),
        Item::Dir("root/pages.de/"),
        Item::File("root/pages.de/common/ls.md", "# ls (de)\n"),
      ],
    );

    let layout = layout(dir.path());
    let count = extract_pages(&archive, "pages", None, &layout).unwrap();
    assert_eq!(count, 2);

    let pages = layout.pages_dir();
    assert_eq!(std::fs::read_to_string(pages.join("linux/tar.md")).unwrap(), "# tar\n");
    assert_eq!(std::fs::read_to_string(pages.join("common/ls.md")).unwrap(), "# ls\n");
    assert!(!layout.root().join("pages.de").exists());
    assert!(!layout.root().join("README.md").exists());
  }

  #[test]
  fn test_extract_ignores_entry_order() {
    // 同一目录的条目不连续时也能全部解压
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("tldr.zip");
    create_archive(
      &archive,
      &[
        Item::File("tldr-main/pages/linux/tar.md", "# tar\n"),
        Item::File("tldr-main/CONTRIBUTING.md", "contrib"),
        Item::File("tldr-main/pages/common/ls.md", "# ls\n"),
      ],
    );

    let layout = layout(dir.path());
    let count = extract_pages(&archive, "pages", None, &layout).unwrap();
    assert_eq!(count, 2);
    assert!(layout.pages_dir().join("common/ls.md").exists());
  }

  #[test]
  fn test_extract_with_configured_root() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("tldr.zip");
    create_archive(&archive, &[Item::File("tldr-master/pages/linux/tar.md", "# tar\n")]);

    let layout = layout(dir.path());
    let result = extract_pages(&archive, "pages", Some("tldr-main"), &layout);
    assert!(matches!(result, Err(UpdateError::LanguageNotFound(_))));

    let count = extract_pages(&archive, "pages", Some("tldr-master"), &layout).unwrap();
    assert_eq!(count, 1);
  }

  #[test]
  fn test_extract_overwrites_and_keeps_stale_files() {
    let dir = tempfile::tempdir().unwrap();
    let layout = layout(dir.path());
    let stale = layout.pages_dir().join("linux/old.md");
    std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
    std::fs::write(&stale, "old").unwrap();
    std::fs::write(layout.pages_dir().join("linux/tar.md"), "outdated").unwrap();

    let archive = dir.path().join("tldr.zip");
    create_archive(&archive, &[Item::File("root/pages/linux/tar.md", "# tar\n")]);
    extract_pages(&archive, "pages", None, &layout).unwrap();

    assert_eq!(
      std::fs::read_to_string(layout.pages_dir().join("linux/tar.md")).unwrap(),
      "# tar\n"
    );
    assert!(stale.exists());
  }

  #[test]
  fn test_extract_missing_language() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("tldr.zip");
    create_archive(&archive, &[Item::File("root/pages.de/linux/tar.md", "# tar\n")]);

    let result = extract_pages(&archive, "pages", None, &layout(dir.path()));
    assert!(matches!(result, Err(UpdateError::LanguageNotFound(lang)) if lang == "pages"));
  }

  #[test]
  fn test_extract_aborts_on_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    let layout = layout(dir.path());
    // 目标位置已经是目录，文件无法写入
    std::fs::create_dir_all(layout.pages_dir().join("linux/tar.md")).unwrap();

    let archive = dir.path().join("tldr.zip");
    create_archive(
      &archive,
      &[
        Item::File("root/pages/linux/tar.md", "# tar\n"),
        Item::File("root/pages/common/ls.md", "# ls\n"),
      ],
    );

    let result = extract_pages(&archive, "pages", None, &layout);
    assert!(
      matches!(result, Err(UpdateError::Extract { ref name, .. }) if name == "root/pages/linux/tar.md")
    );
    // 后续条目不再解压
    assert!(!layout.pages_dir().join("common/ls.md").exists());
  }

  #[test]
  fn test_extract_rejects_escaping_entry() {
    let dir = tempfile::tempdir().unwrap();
    let layout = layout(dir.path());

    let archive = dir.path().join("tldr.zip");
    create_archive(
      &archive,
      &[
        Item::File("root/pages/linux/tar.md", "# tar\n"),
        Item::File("root/pages/../../evil.md", "evil"),
      ],
    );

    let result = extract_pages(&archive, "pages", None, &layout);
    assert!(matches!(result, Err(UpdateError::UnsafePath(name)) if name == "root/pages/../../evil.md"));
    assert!(!dir.path().join("evil.md").exists());
    assert!(!layout.root().join("evil.md").exists());
  }

  #[test]
  fn test_extract_rejects_bad_archives() {
    let dir = tempfile::tempdir().unwrap();
    let layout = layout(dir.path());

    let missing = extract_pages(&dir.path().join("absent.zip"), "pages", None, &layout);
    assert!(matches!(missing, Err(UpdateError::OpenArchive { .. })));

    let garbage = dir.path().join("garbage.zip");
    std::fs::write(&garbage, b"this is not a zip file").unwrap();
    let result = extract_pages(&garbage, "pages", None, &layout);
    assert!(matches!(result, Err(UpdateError::Zip(_))));
  }
}
