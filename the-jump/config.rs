//! Tagging configuration, read from TOML.
//!
//! ```toml
//! alphabet = "asdfjkl"
//! target-mode = true
//!
//! [search]
//! regex = false
//! ```

use std::{
  fs,
  io::Error as IOError,
  path::Path,
};

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

use crate::{
  pool::{
    DEFAULT_ALPHABET,
    TagPool,
  },
  search::SearchConfig,
};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config: {0}")]
  Io(#[from] IOError),
  #[error("bad config: {0}")]
  Toml(#[from] toml::de::Error),
  #[error("tag alphabet {alphabet:?} {reason}")]
  Alphabet {
    alphabet: String,
    reason:   &'static str,
  },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct JumpConfig {
  /// Characters tags are built from, most preferred first.
  pub alphabet:    String,
  /// Select the word around the target after jumping.
  pub target_mode: bool,
  pub search:      SearchConfig,
}

impl Default for JumpConfig {
  fn default() -> Self {
    Self {
      alphabet:    DEFAULT_ALPHABET.to_string(),
      target_mode: false,
      search:      SearchConfig::default(),
    }
  }
}

impl JumpConfig {
  pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(source)?;
    config.validate()?;
    Ok(config)
  }

  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let source = fs::read_to_string(path)?;
    Self::from_toml(&source)
  }

  /// Tags are typed, so the alphabet has to be typeable and must leave room
  /// for more than one tag per first character.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let invalid = |reason| {
      Err(ConfigError::Alphabet {
        alphabet: self.alphabet.clone(),
        reason,
      })
    };

    if let Some(bad) = self
      .alphabet
      .chars()
      .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit()))
    {
      tracing::debug!(?bad, "rejecting tag alphabet");
      return invalid("may only contain lower-case ASCII letters and digits");
    }
    if TagPool::new(&self.alphabet).alphabet().len() < 2 {
      return invalid("needs at least two distinct characters");
    }
    Ok(())
  }

  pub fn tag_pool(&self) -> TagPool {
    TagPool::new(&self.alphabet)
  }
}
