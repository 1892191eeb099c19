//! Assigns scanned comments to the nodes they describe.
//!
//! Comments arrive with their positions; nodes arrive as positioned events.
//! A trailing comment belongs to the last token on its line. Standalone
//! comment lines are grouped into blocks, and each block becomes the head
//! comment of the node right below it, the foot comment of an entry above
//! it, or a head/foot comment of the document.

use memchr::memchr_iter;

use crate::decode::scanner::{Comment, Event, EventKind, Mark};

/// Which source lines hold nothing but whitespace.
#[derive(Debug, Clone, Default)]
pub(crate) struct BlankLines {
    blank: Vec<bool>,
}

impl BlankLines {
    pub fn new(src: &str) -> Self {
        let mut blank = Vec::new();
        let mut start = 0;
        for end in memchr_iter(b'\n', src.as_bytes()).chain(std::iter::once(src.len())) {
            blank.push(src[start..end].trim_matches([' ', '\t']).is_empty());
            start = end + 1;
        }
        Self { blank }
    }

    /// Lines are 1-based; lines outside the text are not blank.
    pub fn is_blank(&self, line: usize) -> bool {
        line > 0 && self.blank.get(line - 1).copied().unwrap_or(false)
    }

    fn any_blank(&self, from: usize, to: usize) -> bool {
        (from..=to).any(|line| self.is_blank(line))
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Slots {
    pub head: String,
    pub line: String,
    pub foot: String,
    foot_end: usize,
}

impl Slots {
    fn add_head(&mut self, text: &str) {
        join(&mut self.head, text, "\n");
    }

    fn add_line(&mut self, text: &str) {
        join(&mut self.line, text, "\n");
    }

    fn add_foot(&mut self, block: &Block, lines: &BlankLines) {
        let separated = !self.foot.is_empty()
            && self.foot_end + 1 < block.first_line
            && lines.any_blank(self.foot_end + 1, block.first_line - 1);
        join(&mut self.foot, &block.text(), if separated { "\n\n" } else { "\n" });
        self.foot_end = block.last_line;
    }
}

fn join(target: &mut String, text: &str, separator: &str) {
    if !target.is_empty() {
        target.push_str(separator);
    }
    target.push_str(text);
}

/// Comment text per event index, plus the document's own comments.
#[derive(Debug, Clone, Default)]
pub(crate) struct Attachments {
    pub nodes: Vec<Slots>,
    pub document: Slots,
}

#[derive(Debug, Clone)]
struct Block {
    first_line: usize,
    last_line: usize,
    column: usize,
    lines: Vec<String>,
    /// Starts with a comment trailing a bare `- `.
    dash: bool,
    /// Column of the standalone lines merged into a dash block.
    merged_column: Option<usize>,
}

impl Block {
    fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn accepts(&self, comment: &Comment) -> bool {
        if comment.trailing || comment.line != self.last_line + 1 {
            return false;
        }
        match (self.dash, self.merged_column) {
            (true, None) => true,
            (true, Some(column)) => column == comment.column,
            (false, _) => comment.column == self.column,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct NodeInfo {
    parent: Option<usize>,
    /// The event carrying the entry this node belongs to: the key for
    /// mapping entries, the node itself otherwise.
    entry: usize,
    entry_column: usize,
}

struct Layout {
    info: Vec<Option<NodeInfo>>,
    /// For a collection start, the index of its end event; for an end, the
    /// index of its start.
    partner: Vec<usize>,
}

impl Layout {
    fn build(events: &[Event]) -> Self {
        struct Frame {
            start: usize,
            mapping: bool,
            children: usize,
            last_key: usize,
        }
        let mut info = vec![None; events.len()];
        let mut partner: Vec<usize> = (0..events.len()).collect();
        let mut stack: Vec<Frame> = Vec::new();
        for (idx, event) in events.iter().enumerate() {
            if !event.is_start() {
                if let Some(frame) = stack.pop() {
                    partner[frame.start] = idx;
                    partner[idx] = frame.start;
                }
                continue;
            }
            let own_column = event.first_mark().column;
            let node = match stack.last_mut() {
                None => NodeInfo {
                    parent: None,
                    entry: idx,
                    entry_column: own_column,
                },
                Some(frame) => {
                    let parent = Some(frame.start);
                    let (entry, entry_column) = if frame.mapping && frame.children % 2 == 1 {
                        let key = frame.last_key;
                        (key, events[key].mark.column)
                    } else {
                        if frame.mapping {
                            frame.last_key = idx;
                        }
                        (idx, own_column)
                    };
                    frame.children += 1;
                    NodeInfo {
                        parent,
                        entry,
                        entry_column,
                    }
                }
            };
            info[idx] = Some(node);
            if event.is_collection_start() {
                stack.push(Frame {
                    start: idx,
                    mapping: matches!(event.kind, EventKind::MappingStart { .. }),
                    children: 0,
                    last_key: idx,
                });
            }
        }
        Self { info, partner }
    }
}

fn before(a: Mark, line: usize, column: usize) -> bool {
    (a.line, a.column) < (line, column)
}

pub(crate) fn attach(events: &[Event], comments: &[Comment], lines: &BlankLines) -> Attachments {
    let mut out = Attachments {
        nodes: vec![Slots::default(); events.len()],
        document: Slots::default(),
    };
    let layout = Layout::build(events);

    let mut blocks: Vec<Block> = Vec::new();
    for comment in comments {
        if comment.trailing && !comment.after_dash {
            match line_target(events, &layout, comment.line) {
                Some(idx) => out.nodes[idx].add_line(&comment.text),
                None => out.document.add_head(&comment.text),
            }
            continue;
        }
        if let Some(last) = blocks.last_mut() {
            if last.accepts(comment) {
                if last.dash && last.merged_column.is_none() {
                    last.merged_column = Some(comment.column);
                }
                last.lines.push(comment.text.clone());
                last.last_line = comment.line;
                continue;
            }
        }
        blocks.push(Block {
            first_line: comment.line,
            last_line: comment.line,
            column: comment.column,
            lines: vec![comment.text.clone()],
            dash: comment.trailing,
            merged_column: None,
        });
    }

    let heads = head_targets(events, &blocks, lines);
    let mut spaced_heads: Vec<(usize, &Block)> = Vec::new();
    let mut document_foot = false;
    for (block, head) in blocks.iter().zip(heads) {
        if block.dash {
            match dash_target(events, &layout, block) {
                Some(idx) => out.nodes[idx].add_head(&block.text()),
                None => out.document.add_head(&block.text()),
            }
            continue;
        }
        if let Some(next) = head {
            let idx = descend(events, &layout, next, false);
            out.nodes[idx].add_head(&block.text());
            spaced_heads.push((idx, block));
            continue;
        }
        if let Some(flow) = enclosing_flow(events, &layout, block) {
            let idx = flow_foot_target(events, &layout, flow, block);
            out.nodes[idx].add_foot(block, lines);
            continue;
        }
        let has_next = next_token(events, block.last_line).is_some();
        if !has_next && (document_foot || lines.is_blank(block.first_line.saturating_sub(1))) {
            document_foot = true;
            out.document.add_foot(block, lines);
            continue;
        }
        match foot_target(events, &layout, block) {
            Some(idx) => out.nodes[idx].add_foot(block, lines),
            None => {
                if out.document.head.is_empty() {
                    out.document.head = block.text();
                } else {
                    let separated = lines.is_blank(block.first_line.saturating_sub(1));
                    join(
                        &mut out.document.head,
                        &block.text(),
                        if separated { "\n\n" } else { "\n" },
                    );
                }
            }
        }
    }
    // Feet are all placed now, so the blank line above a head can be told
    // apart from the one written after a foot.
    for (idx, block) in spaced_heads {
        let head = &out.nodes[idx].head;
        if !head.starts_with('\n') && blank_before_head(&layout, &out.nodes, idx, block, lines) {
            out.nodes[idx].head.insert(0, '\n');
        }
    }
    tracing::trace!(
        comments = comments.len(),
        blocks = blocks.len(),
        "attached comments"
    );
    out
}

/// The last token on `line`; a closing bracket stands for its collection.
fn line_target(events: &[Event], layout: &Layout, line: usize) -> Option<usize> {
    let idx = events
        .iter()
        .rposition(|event| event.token_line == Some(line))?;
    Some(if events[idx].is_start() {
        idx
    } else {
        layout.partner[idx]
    })
}

/// First event that starts on a line after `line`, skipping block ends,
/// which have no token.
fn next_token(events: &[Event], line: usize) -> Option<usize> {
    events.iter().position(|event| {
        let position = if event.is_start() {
            event.first_mark()
        } else if event.is_flow() {
            event.mark
        } else {
            return false;
        };
        position.line > line
    })
}

/// For each block, the event it is a head comment of. A block qualifies
/// when it sits at the column of the next token, on the line right above
/// it. A dedented block closes the deeper level and is left for a foot.
fn head_targets(events: &[Event], blocks: &[Block], lines: &BlankLines) -> Vec<Option<usize>> {
    blocks
        .iter()
        .map(|block| {
            if block.dash || lines.is_blank(block.last_line + 1) {
                return None;
            }
            let next = next_token(events, block.last_line)?;
            let event = &events[next];
            if !event.is_start() {
                return None;
            }
            let position = event.first_mark();
            (block.column == position.column && position.line == block.last_line + 1)
                .then_some(next)
        })
        .collect()
}

/// Whether a head comment on the entry `idx` keeps the blank line above
/// it: the source had one, and the previous sibling entry carries no foot
/// comment, after which a blank line is written anyway.
fn blank_before_head(
    layout: &Layout,
    nodes: &[Slots],
    idx: usize,
    block: &Block,
    lines: &BlankLines,
) -> bool {
    if !lines.is_blank(block.first_line.saturating_sub(1)) {
        return false;
    }
    let Some(info) = layout.info[idx] else {
        return false;
    };
    let Some(parent) = info.parent.filter(|_| info.entry == idx) else {
        return false;
    };
    let sibling = |e: usize| layout.info[e].is_some_and(|i| i.parent == Some(parent));
    let previous = (parent + 1..idx)
        .rev()
        .find(|&e| sibling(e) && layout.info[e].is_some_and(|i| i.entry == e));
    match previous {
        Some(previous) => (previous..idx)
            .filter(|&e| sibling(e))
            .all(|e| nodes[e].foot.is_empty()),
        None => false,
    }
}

/// Moves from a block collection start to its first entry, so a comment
/// above `key:` lands on the key rather than on the mapping.
fn descend(events: &[Event], layout: &Layout, mut idx: usize, mut force: bool) -> usize {
    loop {
        let event = &events[idx];
        let block_start = event.is_collection_start() && !event.is_flow();
        let non_empty = layout.partner[idx] > idx + 1;
        if !(block_start && non_empty && (force || event.indicator.is_none())) {
            return idx;
        }
        force = false;
        idx += 1;
    }
}

fn dash_target(events: &[Event], layout: &Layout, block: &Block) -> Option<usize> {
    let idx = events
        .iter()
        .position(|event| event.is_start() && event.mark.line > block.first_line)?;
    Some(descend(events, layout, idx, true))
}

/// Innermost flow collection still open at the block.
fn enclosing_flow(events: &[Event], layout: &Layout, block: &Block) -> Option<usize> {
    let mut found = None;
    for (idx, event) in events.iter().enumerate() {
        if !(event.is_collection_start() && event.is_flow()) {
            continue;
        }
        if !before(event.mark, block.first_line, block.column) {
            break;
        }
        let end = &events[layout.partner[idx]];
        if (end.mark.line, end.mark.column) > (block.last_line, block.column) {
            found = Some(idx);
        }
    }
    found
}

fn flow_foot_target(events: &[Event], layout: &Layout, flow: usize, block: &Block) -> usize {
    let last_child = (flow + 1..layout.partner[flow])
        .filter(|&idx| {
            layout.info[idx].is_some_and(|info| info.parent == Some(flow))
                && before(events[idx].mark, block.first_line, block.column)
        })
        .last();
    match last_child.and_then(|idx| layout.info[idx]) {
        Some(info) => info.entry,
        None => flow,
    }
}

/// The deepest entry above the block that is indented no further than the
/// block, falling back to the outermost one.
fn foot_target(events: &[Event], layout: &Layout, block: &Block) -> Option<usize> {
    let prev = events
        .iter()
        .rposition(|event| event.is_start() && before(event.first_mark(), block.first_line, block.column))?;
    let mut current = layout.info[prev]?;
    loop {
        if current.entry_column <= block.column {
            return Some(current.entry);
        }
        match current.parent.and_then(|parent| layout.info[parent]) {
            Some(parent) => current = parent,
            None => return Some(current.entry),
        }
    }
}
