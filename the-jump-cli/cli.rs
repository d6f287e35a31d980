use std::{
  ops::Range,
  path::PathBuf,
};

use anyhow::{
  Result,
  bail,
};
use clap::{
  ArgAction,
  Parser,
};

/// Replays a jump session against a file without a terminal.
#[derive(Clone, Debug)]
pub struct CliOptions {
  pub file:        PathBuf,
  pub keys:        String,
  pub view:        Option<Range<usize>>,
  pub scroll:      Option<Range<usize>>,
  pub regex:       bool,
  pub target:      bool,
  pub extend:      bool,
  pub verbosity:   u8,
  pub log_file:    Option<PathBuf>,
  pub config_file: Option<PathBuf>,
}

impl CliOptions {
  pub fn parse() -> Result<Self> {
    let raw = RawCli::parse();
    raw.try_into()
  }
}

#[derive(Parser, Debug)]
#[command(name = "the-jump", about, long_about = None, version)]
struct RawCli {
  /// Keys to type, one event per character. `<` deletes the last one.
  #[arg(short = 'k', long = "keys", value_name = "KEYS", default_value = "")]
  keys: String,

  /// Visible lines as `first..last` (1-based, inclusive)
  #[arg(long = "view", value_name = "LINES")]
  view: Option<String>,

  /// Lines to scroll to after the keys are typed
  #[arg(long = "scroll", value_name = "LINES")]
  scroll: Option<String>,

  /// Treat the query as a regular expression
  #[arg(short = 'r', long = "regex")]
  regex: bool,

  /// Select the word under the target after jumping
  #[arg(short = 't', long = "target")]
  target: bool,

  /// Extend the selection from the caret to the target instead of moving
  #[arg(short = 'e', long = "extend")]
  extend: bool,

  /// Increase logging verbosity (repeat for more detail)
  #[arg(short = 'v', action = ArgAction::Count)]
  verbosity: u8,

  /// Save logs to a specific file
  #[arg(long = "log-file", value_name = "FILE")]
  log_file: Option<PathBuf>,

  /// Load configuration from a specific file
  #[arg(short = 'c', long = "config", value_name = "FILE")]
  config_file: Option<PathBuf>,

  /// File to jump around in
  #[arg(value_name = "FILE")]
  file: PathBuf,
}

impl TryFrom<RawCli> for CliOptions {
  type Error = anyhow::Error;

  fn try_from(raw: RawCli) -> Result<Self> {
    Ok(Self {
      file:        raw.file,
      keys:        raw.keys,
      view:        raw.view.as_deref().map(parse_lines).transpose()?,
      scroll:      raw.scroll.as_deref().map(parse_lines).transpose()?,
      regex:       raw.regex,
      target:      raw.target,
      extend:      raw.extend,
      verbosity:   raw.verbosity,
      log_file:    raw.log_file,
      config_file: raw.config_file,
    })
  }
}

/// Parses `first..last` into a zero-based, half-open line range.
fn parse_lines(value: &str) -> Result<Range<usize>> {
  let Some((first, last)) = value.split_once("..") else {
    bail!("expected `first..last`, got {value:?}");
  };
  let first: usize = first.trim().parse()?;
  let last: usize = last.trim().parse()?;
  if first == 0 || last < first {
    bail!("line range {value:?} must be 1-based and ascending");
  }
  Ok(first - 1..last)
}
