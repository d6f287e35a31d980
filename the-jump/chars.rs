//! Character classes used when deciding where a tag can stand.

use std::ops::Range;

use ropey::RopeSlice;

/// Coarse class of a character for run-boundary detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
  AlphaNumeric,
  Whitespace,
  Other,
}

pub fn classify(ch: char) -> CharClass {
  match ch {
    c if c.is_alphanumeric() => CharClass::AlphaNumeric,
    c if c.is_whitespace() => CharClass::Whitespace,
    _ => CharClass::Other,
  }
}

#[inline]
pub fn char_is_line_ending(ch: char) -> bool {
  matches!(
    ch,
    '\u{000A}' // LineFeed
      | '\u{000B}' // VerticalTab
      | '\u{000C}' // FormFeed
      | '\u{000D}' // CarriageReturn
      | '\u{0085}' // NextLine
      | '\u{2028}' // Line Separator
      | '\u{2029}' // ParagraphSeparator
  )
}

#[inline]
pub fn char_is_word(ch: char) -> bool {
  ch.is_alphanumeric() || ch == '_'
}

/// Char at `idx`, or `None` past the end of `text`.
#[inline]
pub fn char_at(text: RopeSlice, idx: usize) -> Option<char> {
  (idx < text.len_chars()).then(|| text.char(idx))
}

/// Bounds of the word around `pos`, expanding left and right over word
/// characters. Returns an empty range at `pos` when it does not touch a word.
pub fn word_bounds(text: RopeSlice, pos: usize) -> Range<usize> {
  let len = text.len_chars();
  let pos = pos.min(len);

  let mut start = pos;
  while start > 0 && char_is_word(text.char(start - 1)) {
    start -= 1;
  }

  let mut end = pos;
  while end < len && char_is_word(text.char(end)) {
    end += 1;
  }

  start..end
}
