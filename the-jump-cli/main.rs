mod cli;
mod host;

use std::{
  fs::File,
  io::{
    self,
    BufReader,
  },
  path::Path,
};

use anyhow::{
  Context,
  Result,
};
use ropey::Rope;
use the_jump::{
  config::JumpConfig,
  session::{
    JumpSession,
    Step,
    Viewport,
  },
};

use crate::{
  cli::CliOptions,
  host::HeadlessHost,
};

/// Key that deletes the last query character instead of typing.
const BACKSPACE: char = '<';

fn main() -> Result<()> {
  let options = CliOptions::parse()?;
  setup_logging(options.verbosity, options.log_file.as_deref())?;
  run(options)
}

fn setup_logging(verbosity: u8, log_file: Option<&Path>) -> Result<()> {
  let level = match verbosity {
    0 => log::LevelFilter::Warn,
    1 => log::LevelFilter::Info,
    2 => log::LevelFilter::Debug,
    _ => log::LevelFilter::Trace,
  };

  let mut dispatch = fern::Dispatch::new()
    .format(|out, message, record| {
      out.finish(format_args!(
        "[{}] {}: {}",
        record.level(),
        record.target(),
        message
      ))
    })
    .level(level);

  dispatch = match log_file {
    Some(path) => dispatch.chain(fern::log_file(path).context("failed to open log file")?),
    None => dispatch.chain(io::stderr()),
  };
  dispatch.apply().context("failed to install logger")?;
  Ok(())
}

fn run(options: CliOptions) -> Result<()> {
  let mut config = match &options.config_file {
    Some(path) => {
      JumpConfig::load(path).with_context(|| format!("loading {}", path.display()))?
    },
    None => JumpConfig::default(),
  };
  config.search.regex |= options.regex;
  config.target_mode |= options.target;

  let file = File::open(&options.file)
    .with_context(|| format!("failed to open {}", options.file.display()))?;
  let text = Rope::from_reader(BufReader::new(file))?;
  log::info!(
    "loaded {} ({} lines)",
    options.file.display(),
    text.len_lines()
  );

  let mut host = HeadlessHost::new(text, config.search, io::stdout().lock());
  if let Some(lines) = options.view.clone() {
    host.show_lines(lines);
  }

  let mut session = JumpSession::new(config)?;
  session.start();

  for key in options.keys.chars() {
    let before = host.view_bounds();
    let step = if key == BACKSPACE {
      session.pop_char(&mut host)
    } else if options.extend {
      session.push_char_extending(&mut host, key)
    } else {
      session.push_char(&mut host, key)
    };
    if let Step::Jumped(offset) = step {
      log::info!("jumped to offset {offset}");
      host.finish()?;
      return Ok(());
    }

    // Relocation moved the view; let the session catch up.
    let after = host.view_bounds();
    if after != before {
      session.on_view_change(&mut host, before, after);
    }
  }

  if let Some(lines) = options.scroll {
    let before = host.view_bounds();
    host.show_lines(lines);
    let after = host.view_bounds();
    session.on_view_change(&mut host, before, after);
  }

  host.finish()?;
  Ok(())
}
