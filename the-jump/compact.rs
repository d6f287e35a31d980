//! Shortens two-character tags to one character when that stays unambiguous.

use crate::{
  Tag,
  tag::TagMap,
};

/// Rewrites every tag whose first character no other tag shares to that
/// single character, unless `query` already ends with the character or the
/// full tag. Offsets are never touched.
pub fn compact(tags: &mut TagMap, query: &str) {
  let renames: Vec<(Tag, Tag)> = tags
    .tags()
    .filter_map(|tag| {
      let first = tag.chars().next()?;
      if tag.chars().count() == 1 {
        return None;
      }
      let unique = tags.tags().filter(|other| other.starts_with(first)).count() == 1;
      let clashes = query.ends_with(first) || query.ends_with(tag.as_str());
      if !unique || clashes {
        return None;
      }
      let mut short = Tag::new();
      short.push(first);
      Some((tag.clone(), short))
    })
    .collect();

  for (from, to) in renames {
    if let Err(err) = tags.rename(&from, to) {
      tracing::warn!(%err, "failed to shorten tag");
    }
  }
}
