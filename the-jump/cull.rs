//! Rejects match sites a short tag cannot point at unambiguously.
//!
//! A label drawn next to the middle of `aaaa` could belong to any of its
//! neighbours, so sites inside runs of identical characters are culled. Edges
//! between dissimilar runs always stand alone.

use std::collections::BTreeSet;

use ropey::RopeSlice;

use crate::chars::{
  char_at,
  char_is_line_ending,
  classify,
};

/// Whether a tag placed at `pos` would be unambiguous.
///
/// Rules are checked in order; the first that applies decides.
pub fn stands_alone(text: RopeSlice, pos: usize) -> bool {
  let len = text.len_chars();
  if pos == 0 || pos + 1 >= len {
    return true;
  }

  let prev = text.char(pos - 1);
  let cur = text.char(pos);
  let next = text.char(pos + 1);

  if classify(cur) != classify(prev) || classify(cur) != classify(next) {
    return true;
  }
  if cur != prev || cur != next {
    return true;
  }
  if char_is_line_ending(next) {
    return true;
  }
  if prev == cur && cur == next {
    return false;
  }

  let after_next = char_at(text, (pos + 2).min(len - 1)).unwrap_or(next);
  next.is_whitespace() && after_next.is_whitespace()
}

/// The subset of `sites` that can be tagged.
pub fn cull(text: RopeSlice, sites: &BTreeSet<usize>) -> BTreeSet<usize> {
  sites
    .iter()
    .copied()
    .filter(|&pos| stands_alone(text, pos))
    .collect()
}
