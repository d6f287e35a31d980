//! Two-way unique mapping between tags and buffer offsets.
//!
//! [`TagMap`] is the single owner of both directions; every mutation goes
//! through methods that keep `tag -> offset` and `offset -> tag` in lockstep,
//! so neither side can hold an entry the other lacks.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::Tag;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagMapError {
  #[error("tag `{tag}` is already bound to offset {offset}")]
  TagTaken { tag: Tag, offset: usize },
  #[error("offset {offset} is already tagged `{tag}`")]
  OffsetTaken { offset: usize, tag: Tag },
  #[error("no entry for tag `{0}`")]
  UnknownTag(Tag),
}

pub type Result<T> = std::result::Result<T, TagMapError>;

/// Bijection between tags and offsets. Iteration is ordered by tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap {
  by_tag:    BTreeMap<Tag, usize>,
  by_offset: BTreeMap<usize, Tag>,
}

impl TagMap {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.by_tag.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_tag.is_empty()
  }

  pub fn offset(&self, tag: &str) -> Option<usize> {
    self.by_tag.get(tag).copied()
  }

  pub fn tag_at(&self, offset: usize) -> Option<&Tag> {
    self.by_offset.get(&offset)
  }

  pub fn contains_tag(&self, tag: &str) -> bool {
    self.by_tag.contains_key(tag)
  }

  pub fn contains_offset(&self, offset: usize) -> bool {
    self.by_offset.contains_key(&offset)
  }

  /// Entries ordered by tag.
  pub fn iter(&self) -> impl Iterator<Item = (&Tag, usize)> {
    self.by_tag.iter().map(|(tag, offset)| (tag, *offset))
  }

  pub fn tags(&self) -> impl Iterator<Item = &Tag> {
    self.by_tag.keys()
  }

  /// Tagged offsets in ascending order.
  pub fn offsets(&self) -> impl Iterator<Item = usize> + '_ {
    self.by_offset.keys().copied()
  }

  /// Binds `tag` to `offset`. Fails without modifying the map if either side
  /// is already bound.
  pub fn insert(&mut self, tag: impl Into<Tag>, offset: usize) -> Result<()> {
    let tag = tag.into();
    if let Some(&bound) = self.by_tag.get(&tag) {
      return Err(TagMapError::TagTaken { tag, offset: bound });
    }
    if let Some(bound) = self.by_offset.get(&offset) {
      return Err(TagMapError::OffsetTaken {
        offset,
        tag: bound.clone(),
      });
    }
    self.by_offset.insert(offset, tag.clone());
    self.by_tag.insert(tag, offset);
    Ok(())
  }

  pub fn remove_tag(&mut self, tag: &str) -> Option<usize> {
    let offset = self.by_tag.remove(tag)?;
    self.by_offset.remove(&offset);
    Some(offset)
  }

  pub fn remove_offset(&mut self, offset: usize) -> Option<Tag> {
    let tag = self.by_offset.remove(&offset)?;
    self.by_tag.remove(&tag);
    Some(tag)
  }

  /// Rebinds the offset of `from` to the key `to`.
  pub fn rename(&mut self, from: &str, to: impl Into<Tag>) -> Result<()> {
    let to = to.into();
    if from == to.as_str() {
      return if self.contains_tag(from) {
        Ok(())
      } else {
        Err(TagMapError::UnknownTag(from.into()))
      };
    }
    if let Some(&bound) = self.by_tag.get(&to) {
      return Err(TagMapError::TagTaken { tag: to, offset: bound });
    }
    let offset = self
      .remove_tag(from)
      .ok_or_else(|| TagMapError::UnknownTag(from.into()))?;
    self.by_offset.insert(offset, to.clone());
    self.by_tag.insert(to, offset);
    Ok(())
  }

  /// Keeps only the entries for which `keep` returns true.
  pub fn retain(&mut self, mut keep: impl FnMut(&Tag, usize) -> bool) {
    self.by_tag.retain(|tag, offset| keep(tag, *offset));
    let by_tag = &self.by_tag;
    self.by_offset.retain(|_, tag| by_tag.contains_key(tag));
  }

  pub fn clear(&mut self) {
    self.by_tag.clear();
    self.by_offset.clear();
  }
}
