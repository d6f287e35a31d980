//! Ordered supply of candidate tags.
//!
//! The pool holds every two-character combination over the configured
//! alphabet. Ordering walks the second character slowest, so the first
//! `alphabet.len()` tags all start with different characters and the
//! compactor can shorten each of them to a single keystroke.

use crate::Tag;

/// Home row first, then the top and bottom rows.
pub const DEFAULT_ALPHABET: &str = "asdfjklghqwertyuiopzxcvbnm";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPool {
  alphabet: Vec<char>,
}

impl Default for TagPool {
  fn default() -> Self {
    Self::new(DEFAULT_ALPHABET)
  }
}

impl TagPool {
  /// Builds a pool over the distinct characters of `alphabet`, in order of
  /// first appearance, lower-cased.
  pub fn new(alphabet: &str) -> Self {
    let mut chars = Vec::with_capacity(alphabet.len());
    for ch in alphabet.chars().flat_map(char::to_lowercase) {
      if !chars.contains(&ch) {
        chars.push(ch);
      }
    }
    Self { alphabet: chars }
  }

  pub fn alphabet(&self) -> &[char] {
    &self.alphabet
  }

  /// Number of distinct tags the pool can hand out.
  pub fn capacity(&self) -> usize {
    self.alphabet.len() * self.alphabet.len()
  }

  /// All tags ranked for `query`.
  ///
  /// Tags starting with the query's last character come last: the compactor
  /// never shortens them, so they cost two keystrokes.
  pub fn ranked(&self, query: &str) -> Vec<Tag> {
    let last = query.chars().next_back().map(|ch| ch.to_ascii_lowercase());
    let mut preferred = Vec::with_capacity(self.capacity());
    let mut deferred = Vec::new();

    for &second in &self.alphabet {
      for &first in &self.alphabet {
        let mut tag = Tag::new();
        tag.push(first);
        tag.push(second);
        if Some(first) == last {
          deferred.push(tag);
        } else {
          preferred.push(tag);
        }
      }
    }

    preferred.extend(deferred);
    preferred
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn strs(tags: &[Tag]) -> Vec<&str> {
    tags.iter().map(Tag::as_str).collect()
  }

  #[test]
  fn first_round_has_distinct_first_chars() {
    let pool = TagPool::new("asdf");
    let ranked = pool.ranked("");
    assert_eq!(ranked.len(), 16);
    assert_eq!(strs(&ranked[..4]), ["aa", "sa", "da", "fa"]);
    assert_eq!(strs(&ranked[4..8]), ["as", "ss", "ds", "fs"]);
  }

  #[test]
  fn query_last_char_is_deferred() {
    let pool = TagPool::new("asd");
    let ranked = pool.ranked("xs");
    assert_eq!(strs(&ranked), [
      "aa", "da", "as", "ds", "ad", "dd", "sa", "ss", "sd"
    ]);
  }

  #[test]
  fn duplicate_and_upper_case_alphabet() {
    let pool = TagPool::new("aAbBa");
    assert_eq!(pool.alphabet(), &['a', 'b']);
    assert_eq!(pool.capacity(), 4);
  }

  #[test]
  fn ranking_is_deterministic() {
    let pool = TagPool::default();
    assert_eq!(pool.ranked("foo"), pool.ranked("foo"));
    assert_eq!(pool.ranked("foo").len(), pool.capacity());
  }
}
