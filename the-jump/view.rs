//! Visible offset range and the scroll check that decides on retagging.

/// Half-open range of char offsets currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ViewBounds {
  pub start: usize,
  pub end:   usize,
}

impl ViewBounds {
  pub const fn new(start: usize, end: usize) -> Self {
    Self { start, end }
  }

  /// Everything up to `len`, for hosts that never scroll.
  pub const fn whole(len: usize) -> Self {
    Self::new(0, len)
  }

  #[inline]
  pub const fn contains(&self, offset: usize) -> bool {
    self.start <= offset && offset < self.end
  }
}

/// Whether scrolling from `old` to `new` may have exposed a match that was
/// off screen, in which case the current tags need recomputing.
///
/// `matches` must be ascending. Only the nearest match on each side of `old`
/// is inspected: the closest one above must now start at or after
/// `new.start`, or the closest one below must now lie before `new.end`.
pub fn needs_retag(old: ViewBounds, new: ViewBounds, matches: &[usize]) -> bool {
  debug_assert!(matches.is_sorted(), "match sites must be ascending");

  let above = matches.partition_point(|&offset| offset < old.start);
  let entered_from_above = above
    .checked_sub(1)
    .is_some_and(|idx| matches[idx] >= new.start);

  let below = matches.partition_point(|&offset| offset < old.end);
  let entered_from_below = matches.get(below).is_some_and(|&offset| offset < new.end);

  entered_from_above || entered_from_below
}
