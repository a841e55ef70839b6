use std::fs;
use std::io::{
  self,
  Read,
  Write
};
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  Result,
  bail
};
use tracing::{
  debug,
  info,
  warn
};
use walkdir::WalkDir;

use crate::args::{
  Command,
  ConfigAction
};
use crate::cleaner::{
  CleaningConfig,
  TextCleaner
};
use crate::config::{
  Config,
  SourcesConfig
};
use crate::rules::Rule;

/// Where cleaned files land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
  Stdout,
  InPlace,
  Directory(PathBuf)
}

pub fn run(
  command: Command,
  mut config: Config,
  config_path: &Path
) -> Result<()> {
  match command {
    | Command::Clean {
      path,
      disable,
      only,
      in_place,
      output
    } => {
      let rules = effective_rules(
        config.rules,
        &disable,
        &only
      );
      let destination =
        match (in_place, output) {
          | (true, _) => {
            Destination::InPlace
          }
          | (false, Some(dir)) => {
            Destination::Directory(dir)
          }
          | (false, None) => {
            Destination::Stdout
          }
        };
      match path {
        | Some(path)
          if path.as_os_str() != "-" =>
        {
          clean_path(
            &path,
            &destination,
            &rules,
            &config.sources
          )?;
        }
        | _ => {
          clean_stdin(
            &destination,
            &rules
          )?;
        }
      }
    }
    | Command::Rules => {
      print_rules(&config.rules);
    }
    | Command::Config {
      action
    } => match action {
      | ConfigAction::Show => {
        print!("{}", config.to_toml()?);
      }
      | ConfigAction::Set {
        rule,
        state
      } => {
        config
          .rules
          .set(rule, state.enabled());
        config.save(config_path)?;
        println!(
          "{} {} (saved to {:?})",
          rule,
          if state.enabled() {
            "enabled"
          } else {
            "disabled"
          },
          config_path
        );
      }
      | ConfigAction::Reset => {
        Config::default()
          .save(config_path)?;
        println!(
          "Wrote default config to \
           {:?}",
          config_path
        );
      }
    }
  }
  Ok(())
}

/// Applies per-run overrides on top of
/// the saved toggles. `only` replaces
/// the saved set outright.
pub fn effective_rules(
  saved: CleaningConfig,
  disable: &[Rule],
  only: &[Rule]
) -> CleaningConfig {
  if !only.is_empty() {
    return CleaningConfig::only(only);
  }
  let mut rules = saved;
  for rule in disable {
    rules.set(*rule, false);
  }
  rules
}

fn clean_stdin(
  destination: &Destination,
  rules: &CleaningConfig
) -> Result<()> {
  if *destination != Destination::Stdout
  {
    bail!(
      "--in-place and --output need \
       a file or directory path"
    );
  }
  clean_reader(
    io::stdin().lock(),
    &mut io::stdout().lock(),
    &mut io::stderr().lock(),
    rules
  )
}

/// Cleans everything `reader` yields.
/// A failed read counts as empty input.
pub fn clean_reader<R, W, E>(
  mut reader: R,
  out: &mut W,
  notices: &mut E,
  rules: &CleaningConfig
) -> Result<()>
where
  R: Read,
  W: Write,
  E: Write
{
  let mut raw = String::new();
  if let Err(err) =
    reader.read_to_string(&mut raw)
  {
    warn!(
      error = %err,
      "could not read input; \
       cleaning empty input"
    );
    raw.clear();
  }
  let cleaned =
    TextCleaner::new().clean(&raw, rules);
  emit_cleaned(&cleaned, out, notices)
}

/// Prints cleaned text, or a notice on
/// `notices` when nothing is left.
fn emit_cleaned<W, E>(
  cleaned: &str,
  out: &mut W,
  notices: &mut E
) -> Result<()>
where
  W: Write,
  E: Write
{
  if cleaned.is_empty() {
    writeln!(notices, "Output is empty.")
      .context("write notice")?;
  } else {
    writeln!(out, "{}", cleaned)
      .context("write cleaned text")?;
  }
  Ok(())
}

fn clean_path(
  path: &Path,
  destination: &Destination,
  rules: &CleaningConfig,
  sources: &SourcesConfig
) -> Result<()> {
  if path.is_file() {
    let cleaned =
      clean_file(path, rules)?;
    match destination {
      | Destination::Stdout => {
        emit_cleaned(
          &cleaned,
          &mut io::stdout().lock(),
          &mut io::stderr().lock()
        )?;
      }
      | _ => {
        let target = target_path(
          path,
          path.parent().unwrap_or(
            Path::new("")
          ),
          destination
        )?;
        write_output(&target, &cleaned)?;
      }
    }
    return Ok(());
  }
  if !path.is_dir() {
    bail!(
      "no such file or directory {:?}",
      path
    );
  }
  if *destination == Destination::Stdout
  {
    bail!(
      "cleaning a directory needs \
       --in-place or --output <dir>"
    );
  }
  let source_files =
    collect_sources(path, sources);
  if source_files.is_empty() {
    println!(
      "No files with extensions [{}] \
       found at {:?}",
      sources.extensions.join(", "),
      path
    );
    return Ok(());
  }
  // Every file is read before any is
  // written, so a bad file leaves the
  // tree untouched.
  let cleaned = source_files
    .iter()
    .map(|file| {
      clean_file(file, rules)
        .map(|text| (file, text))
    })
    .collect::<Result<Vec<_>>>()?;
  for (file, text) in &cleaned {
    let target = target_path(
      file,
      path,
      destination
    )?;
    write_output(&target, text)?;
  }
  info!(
    files = source_files.len(),
    root = %path.display(),
    "cleaned directory"
  );
  println!(
    "Cleaned {} files.",
    source_files.len()
  );
  Ok(())
}

fn clean_file(
  file: &Path,
  rules: &CleaningConfig
) -> Result<String> {
  let content =
    fs::read_to_string(file)
      .with_context(|| {
        format!("read file {:?}", file)
      })?;
  debug!(
    path = %file.display(),
    bytes = content.len(),
    "cleaning file"
  );
  Ok(
    TextCleaner::new()
      .clean(&content, rules)
  )
}

/// Recursively gathers files whose
/// extension the config accepts,
/// sorted for stable output. Entries
/// that cannot be walked are logged
/// and skipped.
pub fn collect_sources(
  path: &Path,
  sources: &SourcesConfig
) -> Vec<PathBuf> {
  let mut files: Vec<PathBuf> =
    WalkDir::new(path)
      .into_iter()
      .filter_map(|entry| match entry {
        | Ok(entry) => Some(entry),
        | Err(err) => {
          warn!(
            error = %err,
            path = ?err.path(),
            "skipping unreadable entry"
          );
          None
        }
      })
      .filter(|entry| {
        entry.file_type().is_file()
          && sources.accepts(entry.path())
      })
      .map(|entry| entry.into_path())
      .collect();
  files.sort();
  files
}

/// Maps a source file to its output
/// location, keeping its path relative
/// to `root` under an output directory.
pub fn target_path(
  file: &Path,
  root: &Path,
  destination: &Destination
) -> Result<PathBuf> {
  match destination {
    | Destination::Directory(dir) => {
      let relative = file
        .strip_prefix(root)
        .ok()
        .filter(|rel| {
          !rel.as_os_str().is_empty()
        })
        .or_else(|| {
          file
            .file_name()
            .map(Path::new)
        })
        .with_context(|| {
          format!(
            "no file name in {:?}",
            file
          )
        })?;
      Ok(dir.join(relative))
    }
    | _ => Ok(file.to_path_buf())
  }
}

fn write_output(
  target: &Path,
  cleaned: &str
) -> Result<()> {
  if let Some(parent) = target.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent)
      .with_context(|| {
        format!(
          "create output directory \
           {:?}",
          parent
        )
      })?;
  }
  fs::write(target, cleaned)
    .with_context(|| {
      format!(
        "write cleaned text to {:?}",
        target
      )
    })?;
  debug!(
    path = %target.display(),
    "wrote cleaned file"
  );
  Ok(())
}

fn print_rules(rules: &CleaningConfig) {
  for (position, rule) in
    Rule::ORDER.into_iter().enumerate()
  {
    println!(
      "{}. {:<16} [{}] {}",
      position + 1,
      rule.name(),
      if rules.is_enabled(rule) {
        "on"
      } else {
        "off"
      },
      rule.description()
    );
  }
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  #[test]
  fn disable_turns_off_only_named_rules()
  {
    let rules = effective_rules(
      CleaningConfig::default(),
      &[Rule::ExtraSpaces],
      &[]
    );
    assert!(
      !rules.is_enabled(Rule::ExtraSpaces)
    );
    assert!(
      rules.is_enabled(Rule::Newlines)
    );
  }

  #[test]
  fn only_replaces_saved_toggles() {
    let rules = effective_rules(
      CleaningConfig::all_disabled(),
      &[],
      &[Rule::FullWidth]
    );
    assert_eq!(
      rules.enabled_rules(),
      vec![Rule::FullWidth]
    );
  }

  #[test]
  fn collect_sources_filters_by_extension()
  {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("sub");
    fs::create_dir_all(&nested).unwrap();
    fs::write(
      dir.path().join("a.txt"),
      "a"
    )
    .unwrap();
    fs::write(nested.join("b.md"), "b")
      .unwrap();
    fs::write(
      dir.path().join("c.rs"),
      "c"
    )
    .unwrap();
    let files = collect_sources(
      dir.path(),
      &SourcesConfig::default()
    );
    assert_eq!(
      files,
      vec![
        dir.path().join("a.txt"),
        nested.join("b.md"),
      ]
    );
  }

  #[test]
  fn target_path_mirrors_layout() {
    let root = Path::new("in");
    let out = Destination::Directory(
      PathBuf::from("out")
    );
    assert_eq!(
      target_path(
        Path::new("in/sub/x.md"),
        root,
        &out
      )
      .unwrap(),
      PathBuf::from("out/sub/x.md")
    );
    assert_eq!(
      target_path(
        Path::new("in/sub/x.md"),
        root,
        &Destination::InPlace
      )
      .unwrap(),
      PathBuf::from("in/sub/x.md")
    );
  }

  #[test]
  fn directory_clean_writes_output_tree()
  {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("src");
    let output = dir.path().join("out");
    fs::create_dir_all(source.join("ch"))
      .unwrap();
    fs::write(
      source.join("ch").join("one.txt"),
      "Ｆｏｏ [1] bar\n"
    )
    .unwrap();
    clean_path(
      &source,
      &Destination::Directory(
        output.clone()
      ),
      &CleaningConfig::default(),
      &SourcesConfig::default()
    )
    .unwrap();
    let cleaned = fs::read_to_string(
      output.join("ch").join("one.txt")
    )
    .unwrap();
    assert_eq!(cleaned, "Foobar");
  }

  #[test]
  fn in_place_clean_rewrites_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("note.md");
    fs::write(&file, " a (2, 3) b ")
      .unwrap();
    clean_path(
      &file,
      &Destination::InPlace,
      &CleaningConfig::only(&[
        Rule::ReferenceMarks
      ]),
      &SourcesConfig::default()
    )
    .unwrap();
    assert_eq!(
      fs::read_to_string(&file).unwrap(),
      "a  b"
    );
  }

  #[test]
  fn directory_to_stdout_is_rejected() {
    let dir = TempDir::new().unwrap();
    assert!(
      clean_path(
        dir.path(),
        &Destination::Stdout,
        &CleaningConfig::default(),
        &SourcesConfig::default()
      )
      .is_err()
    );
  }

  #[test]
  fn config_set_persists_toggle() {
    let dir = TempDir::new().unwrap();
    let path =
      dir.path().join("cleantext.toml");
    run(
      Command::Config {
        action: ConfigAction::Set {
          rule:  Rule::Newlines,
          state: crate::args::Toggle::Off
        }
      },
      Config::default(),
      &path
    )
    .unwrap();
    let saved =
      Config::load(&path).unwrap();
    assert!(
      !saved
        .rules
        .is_enabled(Rule::Newlines)
    );
    assert!(
      saved
        .rules
        .is_enabled(Rule::FullWidth)
    );
  }

  struct BrokenReader;

  impl Read for BrokenReader {
    fn read(
      &mut self,
      _buf: &mut [u8]
    ) -> io::Result<usize> {
      Err(io::Error::other("closed"))
    }
  }

  #[test]
  fn reader_output_goes_to_stdout() {
    let mut out = Vec::new();
    let mut notices = Vec::new();
    clean_reader(
      "  Ａ [7] b\n".as_bytes(),
      &mut out,
      &mut notices,
      &CleaningConfig::default()
    )
    .unwrap();
    assert_eq!(
      String::from_utf8(out).unwrap(),
      "Ab\n"
    );
    assert!(notices.is_empty());
  }

  #[test]
  fn empty_result_prints_notice_only() {
    let mut out = Vec::new();
    let mut notices = Vec::new();
    clean_reader(
      " [1, 2] \r\n".as_bytes(),
      &mut out,
      &mut notices,
      &CleaningConfig::default()
    )
    .unwrap();
    assert!(out.is_empty());
    assert_eq!(
      String::from_utf8(notices).unwrap(),
      "Output is empty.\n"
    );
  }

  #[test]
  fn failed_read_counts_as_empty_input() {
    let mut out = Vec::new();
    let mut notices = Vec::new();
    clean_reader(
      BrokenReader,
      &mut out,
      &mut notices,
      &CleaningConfig::default()
    )
    .unwrap();
    assert!(out.is_empty());
    assert_eq!(
      String::from_utf8(notices).unwrap(),
      "Output is empty.\n"
    );
  }

  #[test]
  fn bad_file_leaves_directory_untouched()
  {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("a.txt");
    fs::write(&good, "x [1] y").unwrap();
    fs::write(
      dir.path().join("b.txt"),
      [0xFF, 0xFE]
    )
    .unwrap();
    let result = clean_path(
      dir.path(),
      &Destination::InPlace,
      &CleaningConfig::default(),
      &SourcesConfig::default()
    );
    assert!(result.is_err());
    assert_eq!(
      fs::read_to_string(&good).unwrap(),
      "x [1] y"
    );
  }

  #[test]
  fn missing_root_yields_no_sources() {
    let dir = TempDir::new().unwrap();
    let files = collect_sources(
      &dir.path().join("gone"),
      &SourcesConfig::default()
    );
    assert!(files.is_empty());
  }
}
