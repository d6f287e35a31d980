//! The search side of tagging: the collaborator trait and a rope-backed
//! reference implementation.
//!
//! The session never scans text itself. It asks a [`Search`] for the sites
//! matching the current query and, when checking a typed tag, whether the
//! text before that tag spells the rest of the query.

use std::{
  borrow::Cow,
  collections::BTreeSet,
};

use regex::{
  Regex,
  RegexBuilder,
};
use ropey::Rope;
use serde::{
  Deserialize,
  Serialize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchMode {
  #[default]
  Literal,
  Regex,
}

/// Search flags. Case sensitivity and whole-word matching stay off unless a
/// host opts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct SearchConfig {
  pub regex:          bool,
  pub case_sensitive: bool,
  pub whole_word:     bool,
}

impl SearchConfig {
  pub const fn mode(&self) -> SearchMode {
    if self.regex {
      SearchMode::Regex
    } else {
      SearchMode::Literal
    }
  }
}

pub trait Search {
  /// Char offsets of every match of `query`, ascending. An empty set is a
  /// normal answer.
  fn search(&mut self, query: &str, mode: SearchMode) -> BTreeSet<usize>;

  /// Whether the buffer holds `text` starting at `offset`.
  fn region_equals(&self, offset: usize, text: &str, case_insensitive: bool) -> bool;
}

/// Builds the matcher for `query`. Literal queries are escaped first.
pub fn build_regex(
  query: &str,
  mode: SearchMode,
  config: &SearchConfig,
) -> Result<Regex, regex::Error> {
  let pattern: Cow<str> = match mode {
    SearchMode::Literal => Cow::Owned(regex::escape(query)),
    SearchMode::Regex => Cow::Borrowed(query),
  };
  let pattern = if config.whole_word {
    Cow::Owned(format!(r"\b(?:{pattern})\b"))
  } else {
    pattern
  };

  RegexBuilder::new(&pattern)
    .case_insensitive(!config.case_sensitive)
    .multi_line(true)
    .build()
}

/// Searches a rope snapshot with the `regex` crate.
#[derive(Debug, Clone)]
pub struct RopeSearcher {
  text:   Rope,
  config: SearchConfig,
}

impl RopeSearcher {
  pub fn new(text: Rope, config: SearchConfig) -> Self {
    Self { text, config }
  }

  pub fn text(&self) -> &Rope {
    &self.text
  }

  pub fn config(&self) -> &SearchConfig {
    &self.config
  }
}

impl Search for RopeSearcher {
  fn search(&mut self, query: &str, mode: SearchMode) -> BTreeSet<usize> {
    if query.is_empty() {
      return BTreeSet::new();
    }

    let regex = match build_regex(query, mode, &self.config) {
      Ok(regex) => regex,
      Err(err) => {
        // Half-typed patterns such as `(` are expected while the user types.
        tracing::debug!(%err, query, "query does not compile");
        return BTreeSet::new();
      },
    };

    let haystack: Cow<str> = self.text.slice(..).into();
    let len = self.text.len_chars();
    regex
      .find_iter(&haystack)
      .map(|found| self.text.byte_to_char(found.start()))
      .filter(|&offset| offset < len)
      .collect()
  }

  fn region_equals(&self, offset: usize, text: &str, case_insensitive: bool) -> bool {
    let wanted = text.chars().count();
    if offset + wanted > self.text.len_chars() {
      return false;
    }

    self
      .text
      .chars_at(offset)
      .zip(text.chars())
      .all(|(have, want)| {
        if case_insensitive {
          have.to_lowercase().eq(want.to_lowercase())
        } else {
          have == want
        }
      })
  }
}
