//! Per-keystroke tagging session.
//!
//! A [`JumpSession`] is owned by the host's event path and driven one event
//! at a time: every query edit runs a full pass (search, cull, jump checks,
//! retag, publish) before returning, and a scroll runs the view check. The
//! host reaches back in only through [`JumpContext`].
//!
//! # Lifecycle
//!
//! ```text
//!  start ──► Idle ──(query edit)──► Tagging ──(tag typed / one tag left)──► Jumped
//!             ▲                        │                                       │
//!             └──── reset / empty ─────┘◄──────────────── reset ◄──────────────┘
//! ```
//!
//! A jump calls the executor once and resets the session in the same call, so
//! callers observe `Jumped` only through the returned [`Step`].
//!
//! # Retention
//!
//! Tags are never rebuilt from scratch while the query grows. An entry
//! survives a keystroke when the query [`overlaps`] its tag (the user may be
//! half way through typing it) or when its offset still matches; vacant sites
//! then get fresh tags.

use std::{
  collections::BTreeSet,
  ops::Range,
};

use ropey::Rope;

use crate::{
  Tag,
  allocate::{
    AllocationRequest,
    AllocationStrategy,
  },
  chars::{
    char_at,
    word_bounds,
  },
  compact::compact,
  config::{
    ConfigError,
    JumpConfig,
  },
  cull::cull,
  pool::TagPool,
  search::{
    Search,
    SearchMode,
  },
  tag::TagMap,
  view::{
    ViewBounds,
    needs_retag,
  },
};

/// Read-only access to the visible range.
pub trait Viewport {
  fn view_bounds(&self) -> ViewBounds;
}

/// How the cursor travels to a jump target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Motion {
  /// Collapse the selection onto the target.
  #[default]
  Move,
  /// Keep the anchor at the caret and extend the selection to the target.
  Extend,
}

/// Moves the cursor. Called exactly once per jump.
pub trait JumpExecutor {
  fn jump_to(&mut self, offset: usize, motion: Motion);

  /// Selects `range` after a jump in target mode.
  fn select(&mut self, range: Range<usize>) {
    let _ = range;
  }
}

/// Scrolls towards off-screen matches when nothing on screen can be tagged.
pub trait ViewRelocation {
  fn relocate_towards(&mut self, query: &str);
}

/// Receives every tag assignment the session settles on.
pub trait MarkerSink {
  /// Must finish drawing before returning; the session assumes the screen
  /// shows exactly `tags` once this call is done.
  fn publish(&mut self, tags: &TagMap);
}

/// Everything a session needs from its host.
pub trait JumpContext: Search + Viewport + JumpExecutor + ViewRelocation + MarkerSink {
  /// Current buffer text. Taken once per pass.
  fn text(&self) -> Rope;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JumpState {
  #[default]
  Idle,
  Tagging,
  Jumped,
}

/// Result of feeding one event to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
  /// Nothing to tag; the query is empty.
  Idle,
  /// Tags were (re)published.
  Tagging,
  /// The executor moved to this offset and the session was reset.
  Jumped(usize),
}

/// Whether `query` overlaps `tag`: it ends with the tag's first character or
/// with the whole tag.
///
/// Not symmetric; the query is always the left-hand side.
pub fn overlaps(query: &str, tag: &str) -> bool {
  tag.chars().next().is_some_and(|first| query.ends_with(first)) || query.ends_with(tag)
}

/// The entries of `tags` that stay valid for `query`: those the query
/// overlaps and those whose offset is still in `sites`.
pub fn retain_compatible(tags: &TagMap, query: &str, sites: &BTreeSet<usize>) -> TagMap {
  let mut retained = tags.clone();
  retained.retain(|tag, offset| overlaps(query, tag) || sites.contains(&offset));
  retained
}

/// What triggered a tagging pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retag {
  Typed,
  Scrolled,
}

#[derive(Debug, Clone)]
pub struct JumpSession {
  config:       JumpConfig,
  pool:         TagPool,
  state:        JumpState,
  mode:         SearchMode,
  target_mode:  bool,
  query:        String,
  text:         Rope,
  text_matches: BTreeSet<usize>,
  sites:        BTreeSet<usize>,
  tags:         TagMap,
  full:         bool,
}

impl Default for JumpSession {
  fn default() -> Self {
    Self::with_valid_config(JumpConfig::default())
  }
}

impl JumpSession {
  pub fn new(config: JumpConfig) -> Result<Self, ConfigError> {
    config.validate()?;
    Ok(Self::with_valid_config(config))
  }

  fn with_valid_config(config: JumpConfig) -> Self {
    Self {
      pool: config.tag_pool(),
      mode: config.search.mode(),
      target_mode: config.target_mode,
      config,
      state: JumpState::Idle,
      query: String::new(),
      text: Rope::new(),
      text_matches: BTreeSet::new(),
      sites: BTreeSet::new(),
      tags: TagMap::new(),
      full: false,
    }
  }

  pub fn config(&self) -> &JumpConfig {
    &self.config
  }

  pub fn state(&self) -> JumpState {
    self.state
  }

  pub fn mode(&self) -> SearchMode {
    self.mode
  }

  pub fn query(&self) -> &str {
    &self.query
  }

  pub fn tags(&self) -> &TagMap {
    &self.tags
  }

  /// Whether the last allocation pass found a tag for every eligible site.
  pub fn is_full(&self) -> bool {
    self.full
  }

  /// Every site the search reported for the current query.
  pub fn text_matches(&self) -> &BTreeSet<usize> {
    &self.text_matches
  }

  /// The taggable subset of [`Self::text_matches`].
  pub fn sites(&self) -> &BTreeSet<usize> {
    &self.sites
  }

  pub fn target_mode(&self) -> bool {
    self.target_mode
  }

  pub fn toggle_target_mode(&mut self) -> bool {
    self.target_mode = !self.target_mode;
    self.target_mode
  }

  /// Begins a session with the configured search mode.
  pub fn start(&mut self) {
    self.start_with_mode(self.config.search.mode());
  }

  pub fn start_with_mode(&mut self, mode: SearchMode) {
    self.reset();
    self.mode = mode;
    tracing::debug!(?mode, "jump session started");
  }

  /// Drops the query, tags, matches and mode flags. Target mode is a user
  /// toggle and survives.
  pub fn reset(&mut self) {
    if self.state != JumpState::Idle || !self.query.is_empty() {
      tracing::info!(query = %self.query, "jump session reset");
    }
    self.state = JumpState::Idle;
    self.mode = SearchMode::Literal;
    self.query.clear();
    self.text = Rope::new();
    self.text_matches.clear();
    self.sites.clear();
    self.tags.clear();
    self.full = false;
  }

  pub fn push_char<C: JumpContext + ?Sized>(&mut self, ctx: &mut C, ch: char) -> Step {
    self.push(ctx, ch, Motion::Move)
  }

  /// Like [`Self::push_char`], but a jump on this key extends the selection
  /// from the caret instead of moving it.
  pub fn push_char_extending<C: JumpContext + ?Sized>(&mut self, ctx: &mut C, ch: char) -> Step {
    self.push(ctx, ch, Motion::Extend)
  }

  pub fn pop_char<C: JumpContext + ?Sized>(&mut self, ctx: &mut C) -> Step {
    self.query.pop();
    self.update(ctx, Motion::Move)
  }

  pub fn set_query<C: JumpContext + ?Sized>(&mut self, ctx: &mut C, query: &str) -> Step {
    self.query = query.chars().map(|ch| self.fold_case(ch)).collect();
    self.update(ctx, Motion::Move)
  }

  fn push<C: JumpContext + ?Sized>(&mut self, ctx: &mut C, ch: char, motion: Motion) -> Step {
    let ch = self.fold_case(ch);
    self.query.push(ch);
    self.update(ctx, motion)
  }

  fn case_insensitive(&self) -> bool {
    !self.config.search.case_sensitive
  }

  /// Lower-cases literal, case-insensitive input. One key stays one char so
  /// a backspace removes exactly what it typed.
  fn fold_case(&self, ch: char) -> char {
    if self.mode == SearchMode::Regex || !self.case_insensitive() {
      return ch;
    }
    let mut lower = ch.to_lowercase();
    match (lower.next(), lower.next()) {
      (Some(lower), None) => lower,
      _ => ch,
    }
  }

  /// Handles a scroll from `old` to `new`. Returns whether tags were
  /// recomputed; otherwise the current tags stay as published.
  pub fn on_view_change<C: JumpContext + ?Sized>(
    &mut self,
    ctx: &mut C,
    old: ViewBounds,
    new: ViewBounds,
  ) -> bool {
    if self.state != JumpState::Tagging {
      return false;
    }

    let sites: Vec<usize> = self.sites.iter().copied().collect();
    if !needs_retag(old, new, &sites) {
      return false;
    }

    tracing::debug!(?old, ?new, "matches scrolled into view");
    // Off-screen entries give their tags back so the new view can use them.
    self.tags.retain(|_, offset| new.contains(offset));
    self.retag(new, Retag::Scrolled);
    self.publish(ctx, new);
    true
  }

  fn update<C: JumpContext + ?Sized>(&mut self, ctx: &mut C, motion: Motion) -> Step {
    self.text = ctx.text();

    if self.query.is_empty() {
      self.state = JumpState::Idle;
      self.text_matches.clear();
      self.sites.clear();
      self.tags.clear();
      self.full = false;
      ctx.publish(&self.tags);
      return Step::Idle;
    }

    self.state = JumpState::Tagging;
    tracing::debug!(query = %self.query, mode = ?self.mode, "received query");

    let matches = ctx.search(&self.query, self.mode);
    self.sites = cull(self.text.slice(..), &matches);
    tracing::debug!(
      matches = matches.len(),
      culled = matches.len() - self.sites.len(),
      "culled sites for tagging"
    );
    self.text_matches = matches;

    if let Some(offset) = self.selected_tag(ctx) {
      return self.jump(ctx, offset, motion);
    }

    let view = ctx.view_bounds();
    self.retag(view, Retag::Typed);

    let sole = (self.tags.len() == 1)
      .then(|| self.tags.offsets().next())
      .flatten();
    if let Some(offset) = sole {
      return self.jump(ctx, offset, motion);
    }

    self.publish(ctx, view);
    Step::Tagging
  }

  /// The offset of a tag the query ends with. Longer tags win. In literal
  /// mode the rest of the query must also be the text at the tag's offset.
  fn selected_tag<C: JumpContext + ?Sized>(&self, ctx: &C) -> Option<usize> {
    let mut candidates: Vec<(&Tag, usize)> = self
      .tags
      .iter()
      .filter(|(tag, _)| self.query.ends_with(tag.as_str()))
      .collect();
    candidates.sort_by_key(|(tag, _)| std::cmp::Reverse(tag.len()));

    candidates.into_iter().find_map(|(tag, offset)| {
      if self.mode == SearchMode::Regex {
        return Some(offset);
      }
      let prefix = &self.query[..self.query.len() - tag.len()];
      ctx
        .region_equals(offset, prefix, self.case_insensitive())
        .then_some(offset)
    })
  }

  /// Characters that continue the query at some match. A tag starting with
  /// one of them would turn a refining keystroke into a jump.
  fn followers(&self) -> Vec<char> {
    if self.mode == SearchMode::Regex {
      return Vec::new();
    }
    let text = self.text.slice(..);
    let len = self.query.chars().count();
    let mut followers: Vec<char> = self
      .text_matches
      .iter()
      .filter_map(|&offset| char_at(text, offset + len))
      .flat_map(char::to_lowercase)
      .collect();
    followers.sort_unstable();
    followers.dedup();
    followers
  }

  fn retag(&mut self, view: ViewBounds, cause: Retag) {
    let mut tags = retain_compatible(&self.tags, &self.query, &self.sites);
    tracing::debug!(
      retained = tags.len(),
      dropped = self.tags.len() - tags.len(),
      "carried tags over"
    );

    let typing_tag = tags
      .iter()
      .any(|(tag, offset)| overlaps(&self.query, tag) && view.contains(offset));
    let settled = self.mode == SearchMode::Regex
      && !tags.is_empty()
      && tags.offsets().all(|offset| view.contains(offset));

    if cause == Retag::Typed && (typing_tag || settled) {
      tracing::debug!(typing_tag, settled, "keeping current tags");
    } else {
      let vacant: BTreeSet<usize> = self
        .sites
        .iter()
        .copied()
        .filter(|&offset| !tags.contains_offset(offset))
        .collect();
      let followers = self.followers();
      let shadowing: Vec<char> = tags
        .tags()
        .filter(|tag| tag.len() == 1)
        .filter_map(|tag| tag.chars().next())
        .collect();
      let pool: Vec<Tag> = self
        .pool
        .ranked(&self.query)
        .into_iter()
        .filter(|tag| !self.tags.contains_tag(tag))
        .filter(|tag| {
          !tag
            .chars()
            .next()
            .is_some_and(|first| shadowing.contains(&first) || followers.contains(&first))
        })
        .collect();
      tracing::debug!(vacant = vacant.len(), available = pool.len(), "assigning tags");

      let allocation = AllocationStrategy::for_mode(self.mode).allocate(&AllocationRequest {
        text: self.text.slice(..),
        sites: &vacant,
        pool: &pool,
        tagged: &tags,
        view,
      });
      self.full = allocation.full;
      for (tag, offset) in allocation.entries {
        if let Err(err) = tags.insert(tag, offset) {
          tracing::warn!(%err, "dropping conflicting tag");
        }
      }
    }

    compact(&mut tags, &self.query);
    self.tags = tags;
  }

  fn publish<C: JumpContext + ?Sized>(&self, ctx: &mut C, view: ViewBounds) {
    ctx.publish(&self.tags);
    let visible = self.tags.offsets().any(|offset| view.contains(offset));
    if !visible && self.query.chars().count() > 1 {
      tracing::debug!(query = %self.query, "no taggable site in view");
      ctx.relocate_towards(&self.query);
    }
  }

  fn jump<C: JumpContext + ?Sized>(&mut self, ctx: &mut C, offset: usize, motion: Motion) -> Step {
    self.state = JumpState::Jumped;
    tracing::info!(offset, ?motion, query = %self.query, "jumping to tag");

    ctx.jump_to(offset, motion);
    if self.target_mode {
      let word = word_bounds(self.text.slice(..), offset);
      if !word.is_empty() {
        ctx.select(word);
      }
    }

    self.reset();
    Step::Jumped(offset)
  }
}
