//! Assigns tags to untagged match sites.
//!
//! Both strategies share the same contract: sites are visited in a fixed
//! order (in view first, then the rest, each ascending), a site closer than
//! [`MIN_TAG_GAP`] + 1 to any tagged offset is skipped, and every tag is used
//! at most once. Given the same request they always return the same entries.
//!
//! - [`AllocationStrategy::Pool`] hands out tags in pool order.
//! - [`AllocationStrategy::Digraph`] first offers each site the two characters
//!   starting at it, when those form a pool tag no other vacant site shares,
//!   and falls back to pool order for the rest.

use std::collections::{
  BTreeMap,
  BTreeSet,
  HashSet,
};

use ropey::RopeSlice;

use crate::{
  Tag,
  search::SearchMode,
  tag::TagMap,
  view::ViewBounds,
};

/// Tagged offsets must be strictly further apart than this.
pub const MIN_TAG_GAP: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationStrategy {
  #[default]
  Digraph,
  Pool,
}

impl AllocationStrategy {
  /// Regex matches rarely share meaningful text after the site, so they only
  /// draw from the pool.
  pub const fn for_mode(mode: SearchMode) -> Self {
    match mode {
      SearchMode::Literal => Self::Digraph,
      SearchMode::Regex => Self::Pool,
    }
  }

  pub fn allocate(self, request: &AllocationRequest<'_>) -> Allocation {
    let sites = request.ordered_sites();
    let mut pass = Pass::new(request);

    if self == Self::Digraph {
      pass.assign_unique_digraphs(&sites);
    }
    pass.fill_from_pool(&sites);

    tracing::debug!(
      strategy = ?self,
      sites = sites.len(),
      assigned = pass.entries.len(),
      full = pass.full,
      "allocated tags"
    );

    Allocation {
      entries: pass.entries,
      full:    pass.full,
    }
  }
}

/// Input to one allocation pass.
#[derive(Debug, Clone, Copy)]
pub struct AllocationRequest<'a> {
  /// Text snapshot the sites refer to.
  pub text:   RopeSlice<'a>,
  /// Sites that still need a tag.
  pub sites:  &'a BTreeSet<usize>,
  /// Candidate tags in preference order.
  pub pool:   &'a [Tag],
  /// Entries that already exist; their tags and offsets are off limits.
  pub tagged: &'a TagMap,
  pub view:   ViewBounds,
}

impl AllocationRequest<'_> {
  fn ordered_sites(&self) -> Vec<usize> {
    let (mut sites, outside): (Vec<usize>, Vec<usize>) = self
      .sites
      .iter()
      .copied()
      .partition(|&offset| self.view.contains(offset));
    sites.extend(outside);
    sites
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allocation {
  /// New `(tag, offset)` pairs, in assignment order.
  pub entries: Vec<(Tag, usize)>,
  /// False when the pool ran out before every eligible site had a tag.
  pub full:    bool,
}

struct Pass<'a> {
  request:  &'a AllocationRequest<'a>,
  occupied: BTreeSet<usize>,
  used:     HashSet<Tag>,
  entries:  Vec<(Tag, usize)>,
  full:     bool,
}

impl<'a> Pass<'a> {
  fn new(request: &'a AllocationRequest<'a>) -> Self {
    Self {
      request,
      occupied: request.tagged.offsets().collect(),
      used: request.tagged.tags().cloned().collect(),
      entries: Vec::new(),
      full: true,
    }
  }

  fn too_close(&self, offset: usize) -> bool {
    let low = offset.saturating_sub(MIN_TAG_GAP);
    let high = offset.saturating_add(MIN_TAG_GAP);
    self.occupied.range(low..=high).next().is_some()
  }

  fn assign(&mut self, tag: Tag, offset: usize) {
    tracing::trace!(%tag, offset, "assign tag");
    self.occupied.insert(offset);
    self.used.insert(tag.clone());
    self.entries.push((tag, offset));
  }

  fn assign_unique_digraphs(&mut self, sites: &[usize]) {
    let mut by_digraph: BTreeMap<Tag, Vec<usize>> = BTreeMap::new();
    for &site in sites {
      if let Some(digraph) = digraph_at(self.request.text, site) {
        by_digraph.entry(digraph).or_default().push(site);
      }
    }

    let pool: HashSet<&str> = self.request.pool.iter().map(Tag::as_str).collect();
    for &site in sites {
      let Some(digraph) = digraph_at(self.request.text, site) else {
        continue;
      };
      let unique = by_digraph.get(&digraph).is_some_and(|sites| sites.len() == 1);
      if unique
        && pool.contains(digraph.as_str())
        && !self.used.contains(&digraph)
        && !self.too_close(site)
      {
        self.assign(digraph, site);
      }
    }
  }

  fn fill_from_pool(&mut self, sites: &[usize]) {
    let mut next = 0;
    for &site in sites {
      if self.occupied.contains(&site) || self.too_close(site) {
        continue;
      }

      let pool = self.request.pool;
      while next < pool.len() && self.used.contains(&pool[next]) {
        next += 1;
      }
      let Some(tag) = pool.get(next) else {
        self.full = false;
        break;
      };
      next += 1;
      self.assign(tag.clone(), site);
    }
  }
}

/// The two characters starting at `offset`, lower-cased, when both are
/// alphanumeric.
pub fn digraph_at(text: RopeSlice, offset: usize) -> Option<Tag> {
  if offset + 1 >= text.len_chars() {
    return None;
  }
  let first = text.char(offset);
  let second = text.char(offset + 1);
  if !(first.is_alphanumeric() && second.is_alphanumeric()) {
    return None;
  }

  let mut tag = Tag::new();
  tag.push(first.to_ascii_lowercase());
  tag.push(second.to_ascii_lowercase());
  Some(tag)
}

#[cfg(test)]
mod test {
  use ropey::Rope;

  use super::*;
  use crate::pool::TagPool;

  fn request<'a>(
    text: &'a Rope,
    sites: &'a BTreeSet<usize>,
    pool: &'a [Tag],
    tagged: &'a TagMap,
    view: ViewBounds,
  ) -> AllocationRequest<'a> {
    AllocationRequest {
      text: text.slice(..),
      sites,
      pool,
      tagged,
      view,
    }
  }

  fn spaced_sites(count: usize) -> BTreeSet<usize> {
    (0..count).map(|idx| idx * 10).collect()
  }

  #[test]
  fn short_pool_leaves_sites_untagged() {
    let text = Rope::from(" ".repeat(100));
    let sites = spaced_sites(8);
    let pool: Vec<Tag> = ["aa", "sa", "da", "fa", "ja"].map(Tag::from).to_vec();
    let tagged = TagMap::new();

    for strategy in [AllocationStrategy::Pool, AllocationStrategy::Digraph] {
      let allocation =
        strategy.allocate(&request(&text, &sites, &pool, &tagged, ViewBounds::whole(100)));
      assert!(!allocation.full);
      assert_eq!(allocation.entries.len(), 5);
      let tagged: BTreeSet<usize> = allocation.entries.iter().map(|(_, at)| *at).collect();
      assert_eq!(sites.difference(&tagged).count(), 3);
    }
  }

  #[test]
  fn enough_tags_is_full() {
    let text = Rope::from(" ".repeat(100));
    let sites = spaced_sites(3);
    let pool = TagPool::default().ranked("");
    let tagged = TagMap::new();

    let allocation = AllocationStrategy::Pool.allocate(&request(
      &text,
      &sites,
      &pool,
      &tagged,
      ViewBounds::whole(100),
    ));
    assert!(allocation.full);
    assert_eq!(allocation.entries, vec![
      (Tag::from("aa"), 0),
      (Tag::from("sa"), 10),
      (Tag::from("da"), 20),
    ]);
  }

  #[test]
  fn off_screen_sites_are_dropped_first() {
    let text = Rope::from(" ".repeat(100));
    let sites: BTreeSet<usize> = [5, 50, 60, 90].into();
    let pool: Vec<Tag> = ["aa", "sa"].map(Tag::from).to_vec();
    let tagged = TagMap::new();

    let allocation = AllocationStrategy::Pool.allocate(&request(
      &text,
      &sites,
      &pool,
      &tagged,
      ViewBounds::new(40, 70),
    ));
    assert!(!allocation.full);
    let offsets: Vec<usize> = allocation.entries.iter().map(|(_, at)| *at).collect();
    assert_eq!(offsets, vec![50, 60]);
  }

  #[test]
  fn nearby_sites_are_skipped() {
    let text = Rope::from(" ".repeat(40));
    let sites: BTreeSet<usize> = [10, 11, 12, 13, 30].into();
    let pool = TagPool::default().ranked("");
    let mut tagged = TagMap::new();
    tagged.insert("zz", 28).unwrap();

    let allocation = AllocationStrategy::Pool.allocate(&request(
      &text,
      &sites,
      &pool,
      &tagged,
      ViewBounds::whole(40),
    ));
    let offsets: Vec<usize> = allocation.entries.iter().map(|(_, at)| *at).collect();
    // 11 and 12 are within reach of 10; 30 is within reach of the existing 28.
    assert_eq!(offsets, vec![10, 13]);
    // Skipped sites do not count as a shortfall.
    assert!(allocation.full);
  }

  #[test]
  fn existing_tags_are_not_reused() {
    let text = Rope::from(" ".repeat(40));
    let sites: BTreeSet<usize> = [20].into();
    let pool: Vec<Tag> = ["aa", "sa"].map(Tag::from).to_vec();
    let mut tagged = TagMap::new();
    tagged.insert("aa", 0).unwrap();

    let allocation = AllocationStrategy::Pool.allocate(&request(
      &text,
      &sites,
      &pool,
      &tagged,
      ViewBounds::whole(40),
    ));
    assert_eq!(allocation.entries, vec![(Tag::from("sa"), 20)]);
  }

  #[test]
  fn unique_digraphs_are_preferred() {
    let text = Rope::from("foo bar baz Jk");
    let sites: BTreeSet<usize> = [0, 4, 8, 12].into();
    let pool = TagPool::new("abfjkorsz").ranked("");
    let tagged = TagMap::new();

    let allocation = AllocationStrategy::Digraph.allocate(&request(
      &text,
      &sites,
      &pool,
      &tagged,
      ViewBounds::whole(14),
    ));
    let map: BTreeMap<usize, &str> = allocation
      .entries
      .iter()
      .map(|(tag, at)| (*at, tag.as_str()))
      .collect();
    assert_eq!(map[&0], "fo");
    assert_eq!(map[&12], "jk");
    // "ba" starts two sites, so both fall back to pool order.
    assert_eq!(map[&4], "aa");
    assert_eq!(map[&8], "ba");
  }

  #[test]
  fn digraph_outside_pool_is_ignored() {
    let text = Rope::from("xy");
    let sites: BTreeSet<usize> = [0].into();
    let pool = TagPool::new("as").ranked("");
    let tagged = TagMap::new();

    let allocation = AllocationStrategy::Digraph.allocate(&request(
      &text,
      &sites,
      &pool,
      &tagged,
      ViewBounds::whole(2),
    ));
    assert_eq!(allocation.entries, vec![(Tag::from("aa"), 0)]);
  }

  #[test]
  fn digraph_needs_two_alphanumerics() {
    let text = Rope::from("a- Bc");
    assert_eq!(digraph_at(text.slice(..), 0), None);
    assert_eq!(digraph_at(text.slice(..), 3), Some(Tag::from("bc")));
    assert_eq!(digraph_at(text.slice(..), 4), None);
  }

  quickcheck::quickcheck! {
      fn allocation_is_deterministic_and_spaced(raw: Vec<u8>, view_start: u8, digraph: bool) -> bool {
          let text = Rope::from("the quick brown fox jumps over the lazy dog ".repeat(6));
          let len = text.len_chars();
          let sites: BTreeSet<usize> = raw.iter().map(|b| usize::from(*b) % len).collect();
          let pool = TagPool::new("asdf").ranked("");
          let tagged = TagMap::new();
          let start = usize::from(view_start) % len;
          let view = ViewBounds::new(start, (start + 60).min(len));
          let strategy = if digraph { AllocationStrategy::Digraph } else { AllocationStrategy::Pool };

          let req = request(&text, &sites, &pool, &tagged, view);
          let first = strategy.allocate(&req);
          let second = strategy.allocate(&req);

          let mut offsets: Vec<usize> = first.entries.iter().map(|(_, at)| *at).collect();
          offsets.sort_unstable();
          let spaced = offsets.windows(2).all(|pair| pair[1] - pair[0] > MIN_TAG_GAP);
          let tags: HashSet<&Tag> = first.entries.iter().map(|(tag, _)| tag).collect();

          first == second && spaced && tags.len() == first.entries.len()
      }
  }
}
