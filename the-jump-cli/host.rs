//! A host without a screen: markers and jumps are written out as text.

use std::{
  collections::BTreeSet,
  io::{
    self,
    Write,
  },
  ops::Range,
};

use ropey::Rope;
use the_jump::{
  search::{
    RopeSearcher,
    Search,
    SearchConfig,
    SearchMode,
  },
  session::{
    JumpContext,
    JumpExecutor,
    MarkerSink,
    Motion,
    ViewRelocation,
    Viewport,
  },
  tag::TagMap,
  view::ViewBounds,
};

pub struct HeadlessHost<W> {
  search: RopeSearcher,
  view:   ViewBounds,
  out:    W,
  /// First write failure; trait callbacks cannot return it.
  error:  Option<io::Error>,
}

impl<W: Write> HeadlessHost<W> {
  pub fn new(text: Rope, config: SearchConfig, out: W) -> Self {
    Self {
      view: ViewBounds::whole(text.len_chars()),
      search: RopeSearcher::new(text, config),
      out,
      error: None,
    }
  }

  fn text_ref(&self) -> &Rope {
    self.search.text()
  }

  /// Shows the zero-based, half-open line range `lines`.
  pub fn show_lines(&mut self, lines: Range<usize>) {
    let text = self.text_ref();
    let last = text.len_lines();
    let start = text.line_to_char(lines.start.min(last));
    let end = text.line_to_char(lines.end.min(last));
    self.view = ViewBounds::new(start, end);
    log::debug!("showing lines {lines:?} as {:?}", self.view);
  }

  fn visible_lines(&self) -> Range<usize> {
    let text = self.text_ref();
    let first = text.char_to_line(self.view.start.min(text.len_chars()));
    let last = text.char_to_line(self.view.end.min(text.len_chars()));
    first..last.max(first + 1)
  }

  /// 1-based `line:column` of a char offset.
  fn position(&self, offset: usize) -> String {
    let text = self.text_ref();
    let offset = offset.min(text.len_chars());
    let line = text.char_to_line(offset);
    let column = offset - text.line_to_char(line);
    format!("{}:{}", line + 1, column + 1)
  }

  fn emit(&mut self, line: String) {
    if self.error.is_some() {
      return;
    }
    if let Err(err) = writeln!(self.out, "{line}") {
      log::error!("failed to write output: {err}");
      self.error = Some(err);
    }
  }

  /// Flushes the output and reports the first write error, if any.
  pub fn finish(mut self) -> io::Result<W> {
    if let Some(err) = self.error.take() {
      return Err(err);
    }
    self.out.flush()?;
    Ok(self.out)
  }
}

impl<W: Write> Search for HeadlessHost<W> {
  fn search(&mut self, query: &str, mode: SearchMode) -> BTreeSet<usize> {
    self.search.search(query, mode)
  }

  fn region_equals(&self, offset: usize, text: &str, case_insensitive: bool) -> bool {
    self.search.region_equals(offset, text, case_insensitive)
  }
}

impl<W: Write> Viewport for HeadlessHost<W> {
  fn view_bounds(&self) -> ViewBounds {
    self.view
  }
}

impl<W: Write> JumpExecutor for HeadlessHost<W> {
  fn jump_to(&mut self, offset: usize, motion: Motion) {
    let verb = match motion {
      Motion::Move => "jump",
      Motion::Extend => "extend",
    };
    let line = format!("{verb} {}", self.position(offset));
    self.emit(line);
  }

  fn select(&mut self, range: Range<usize>) {
    let line = format!(
      "select {}..{}",
      self.position(range.start),
      self.position(range.end)
    );
    self.emit(line);
  }
}

impl<W: Write> ViewRelocation for HeadlessHost<W> {
  /// Centres the view on the closest match after the view, or failing that
  /// the last one before it.
  fn relocate_towards(&mut self, query: &str) {
    let mode = self.search.config().mode();
    let matches = self.search.search(query, mode);
    let target = matches
      .range(self.view.end..)
      .next()
      .or_else(|| matches.range(..self.view.start).next_back())
      .copied();
    let Some(target) = target else {
      self.emit(format!("no match for {query:?}"));
      return;
    };

    let height = self.visible_lines().len();
    let line = self.text_ref().char_to_line(target);
    let start = line.saturating_sub(height / 2);
    self.show_lines(start..start + height);

    let visible = self.visible_lines();
    self.emit(format!("scroll {}..{}", visible.start + 1, visible.end));
  }
}

impl<W: Write> MarkerSink for HeadlessHost<W> {
  fn publish(&mut self, tags: &TagMap) {
    if tags.is_empty() {
      self.emit("tags -".to_string());
      return;
    }
    let listed: Vec<String> = tags
      .iter()
      .map(|(tag, offset)| format!("{tag}={}", self.position(offset)))
      .collect();
    self.emit(format!("tags {}", listed.join(" ")));
  }
}

impl<W: Write> JumpContext for HeadlessHost<W> {
  fn text(&self) -> Rope {
    self.text_ref().clone()
  }
}

#[cfg(test)]
mod test {
  use the_jump::session::{
    JumpSession,
    Step,
  };

  use super::*;

  fn host(text: &str) -> HeadlessHost<Vec<u8>> {
    HeadlessHost::new(Rope::from(text), SearchConfig::default(), Vec::new())
  }

  fn output(host: HeadlessHost<Vec<u8>>) -> String {
    String::from_utf8(host.finish().unwrap()).unwrap()
  }

  #[test]
  fn publishes_and_jumps_by_line_and_column() {
    let mut host = host("one\ntwo x\nthree x\n");
    let mut session = JumpSession::default();

    assert_eq!(session.push_char(&mut host, 'x'), Step::Tagging);
    assert_eq!(session.set_query(&mut host, "s"), Step::Jumped(16));

    assert_eq!(output(host), "tags a=2:5 s=3:7\njump 3:7\n");
  }

  #[test]
  fn extending_jump_is_reported() {
    let mut host = host("one\ntwo x\nthree x\n");
    let mut session = JumpSession::default();

    session.push_char(&mut host, 'x');
    assert_eq!(session.push_char_extending(&mut host, 'a'), Step::Jumped(8));

    assert_eq!(output(host), "tags a=2:5 s=3:7\nextend 2:5\n");
  }

  #[test]
  fn view_follows_line_ranges() {
    let mut host = host("a\nb\nc\nd\n");
    host.show_lines(1..3);
    assert_eq!(host.view_bounds(), ViewBounds::new(2, 6));
    assert_eq!(host.visible_lines(), 1..3);

    host.show_lines(3..40);
    assert_eq!(host.view_bounds(), ViewBounds::new(6, 8));
  }

  #[test]
  fn relocation_centres_next_match() {
    let text: String = (0..20).map(|line| format!("line {line}\n")).collect();
    let mut host = host(&text);
    host.show_lines(0..4);

    host.relocate_towards("line 15");
    assert_eq!(host.visible_lines(), 13..17);
    host.relocate_towards("nothing");

    assert_eq!(output(host), "scroll 14..17\nno match for \"nothing\"\n");
  }
}
