//! Node trees to YAML text.
//!
//! The encoder walks the arena depth first. Every node is written for the
//! slot it sits in (document root, mapping value or sequence item), which
//! decides what precedes it on its first line and how deep its content is
//! indented. Comments are written where the decoder will find them again:
//! heads above the node, line comments after its last token, feet below
//! its entry.

mod writer;

use std::borrow::Cow;

use base64::Engine as _;

use crate::arena::{Arena, NodeId, Tree};
use crate::constants::{
    is_core_tag, short_tag, BINARY_TAG, MAP_TAG, MAX_DEPTH, NULL_TAG, SEQ_TAG, STR_TAG,
};
use crate::node::{binary_value_bytes, Node, NodeKind, Style};
use crate::options::EncodeOptions;
use crate::text::resolve::{requires_binary, resolve_plain, ScalarStyle};
use crate::text::string::{literal_allowed, plain_allowed, single_quoted_allowed, QuotingContext};
use crate::{Error, Result};

use writer::Writer;

/// Encodes a tree with the default options.
///
/// ```
/// use yaml_bridge::{decode, encode};
///
/// let tree = decode::parse("# greeting\nhello: world # inline\n")?;
/// assert_eq!(encode::encode(&tree)?, "# greeting\nhello: world # inline\n");
/// # Ok::<(), yaml_bridge::Error>(())
/// ```
pub fn encode(tree: &Tree) -> Result<String> {
    encode_with_options(tree, &EncodeOptions::default())
}

pub fn encode_with_options(tree: &Tree, options: &EncodeOptions) -> Result<String> {
    encode_node(&tree.arena, tree.root, options)
}

/// Encodes the node `id` of `arena`. A document node is written with its
/// document comments; any other node is written as a document's content.
pub fn encode_node(arena: &Arena, id: NodeId, options: &EncodeOptions) -> Result<String> {
    let mut encoder = Encoder {
        arena,
        writer: Writer::new(options),
    };
    encoder.write_top(id)?;
    let out = encoder.writer.finish();
    tracing::trace!(bytes = out.len(), "encoded node tree");
    Ok(out)
}

/// Encodes a stream, separating documents with `---`.
pub fn encode_all(trees: &[Tree], options: &EncodeOptions) -> Result<String> {
    let mut out = String::new();
    for (index, tree) in trees.iter().enumerate() {
        if index > 0 {
            out.push_str("---\n");
        }
        let text = encode_with_options(tree, options).map_err(|err| err.in_document(index))?;
        out.push_str(&text);
    }
    Ok(out)
}

/// What precedes a node on its first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Start of a line at depth zero.
    Root,
    /// Right after `key:`.
    Value,
    /// Right after the `-` of a sequence item.
    Item,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

/// How one scalar is written: an optional tag and its text in a form.
#[derive(Debug)]
struct Scalar<'n> {
    tag: Option<Cow<'n, str>>,
    text: Cow<'n, str>,
    form: Form,
}

impl<'n> Scalar<'n> {
    fn plain(text: &'n str) -> Self {
        Self {
            tag: None,
            text: Cow::Borrowed(text),
            form: Form::Plain,
        }
    }

    fn is_block(&self) -> bool {
        matches!(self.form, Form::Literal | Form::Folded)
    }
}

struct Encoder<'a> {
    arena: &'a Arena,
    writer: Writer,
}

impl<'a> Encoder<'a> {
    fn node(&self, id: NodeId) -> Result<&'a Node> {
        let arena = self.arena;
        let node = arena
            .get(id)
            .ok_or_else(|| Error::invalid_node("node refers to a missing node"))?;
        if node.kind() == NodeKind::Unknown {
            return Err(Error::unknown_node_kind());
        }
        Ok(node)
    }

    fn write_top(&mut self, id: NodeId) -> Result<()> {
        let node = self.node(id)?;
        if node.is_document() {
            self.write_document(node)
        } else {
            self.write_root(id)
        }
    }

    fn write_document(&mut self, document: &'a Node) -> Result<()> {
        if document.content.len() > 1 {
            return Err(Error::invalid_node(format!(
                "document holds at most one root node, got {}",
                document.content.len()
            )));
        }
        let content = document.content.first().copied();
        let head = join_comments(&document.head_comment, &document.line_comment);
        if !head.is_empty() {
            self.writer.write_comment_block(&head, 0);
            if content.is_some() {
                self.writer.write_newline();
            }
        }
        match content {
            Some(root) => self.write_root(root)?,
            None if head.is_empty() && document.foot_comment.is_empty() => {
                self.writer.write_str("null\n")
            }
            None => {}
        }
        if !document.foot_comment.is_empty() {
            self.writer.write_newline();
            self.writer.write_comment_block(&document.foot_comment, 0);
        }
        Ok(())
    }

    fn write_root(&mut self, id: NodeId) -> Result<()> {
        let node = self.node(id)?;
        if !node.head_comment.is_empty() {
            self.writer.write_comment_block(&node.head_comment, 0);
        }
        self.write_node(id, 0, Slot::Root, "", 0)?;
        if !node.foot_comment.is_empty() {
            self.writer.write_comment_block(&node.foot_comment, 0);
        }
        Ok(())
    }

    /// Writes a node through the end of its last line. `depth` is the
    /// depth of the owning key or dash; `carried` is a line comment of the
    /// owning key that belongs on the node's first line.
    fn write_node(
        &mut self,
        id: NodeId,
        depth: usize,
        slot: Slot,
        carried: &str,
        level: usize,
    ) -> Result<()> {
        if level > MAX_DEPTH {
            return Err(Error::invalid_node("exceeded max depth"));
        }
        let node = self.node(id)?;
        match node.kind() {
            NodeKind::Document => Err(Error::invalid_node(
                "a document cannot be nested inside another node",
            )),
            NodeKind::Mapping | NodeKind::Sequence if !node.is_flow() && !node.content.is_empty() => {
                self.write_block_collection(node, depth, slot, carried, level)
            }
            NodeKind::Mapping | NodeKind::Sequence => {
                let base = self.open_inline(node, depth, slot, carried);
                self.write_flow(node, base, level)?;
                self.writer.write_line_comment(&node.line_comment);
                self.writer.write_newline();
                Ok(())
            }
            NodeKind::Alias => {
                self.open_inline(node, depth, slot, carried);
                self.write_alias(node)?;
                self.writer.write_line_comment(&node.line_comment);
                self.writer.write_newline();
                Ok(())
            }
            NodeKind::Scalar => {
                self.write_scalar_node(node, depth, slot, carried);
                Ok(())
            }
            NodeKind::Unknown => Err(Error::unknown_node_kind()),
        }
    }

    fn write_scalar_node(&mut self, node: &Node, depth: usize, slot: Slot, carried: &str) {
        if is_empty_null(node) {
            match slot {
                Slot::Value if node.head_comment.is_empty() => {
                    self.writer
                        .write_line_comment(first_non_empty(carried, &node.line_comment));
                    self.writer.write_newline();
                    return;
                }
                Slot::Item => {
                    self.writer.write_line_comment(&node.line_comment);
                    self.writer.write_newline();
                    return;
                }
                _ => {}
            }
        }
        let scalar = represent(node, QuotingContext::Block, true);
        if scalar.is_block() {
            // The header line has room for one comment; the value's own wins.
            let comment = first_non_empty(&node.line_comment, carried);
            self.open_inline(node, depth, slot, "");
            let content_depth = match slot {
                Slot::Root => 1,
                Slot::Value | Slot::Item => depth + 1,
            };
            self.write_block_scalar(node, &scalar, content_depth, comment);
        } else {
            self.open_inline(node, depth, slot, carried);
            let continuation = match slot {
                Slot::Root => 1,
                Slot::Value | Slot::Item => depth + 1,
            };
            self.write_inline_scalar(node, &scalar, continuation);
            self.writer.write_line_comment(&node.line_comment);
            self.writer.write_newline();
        }
    }

    /// Moves the cursor to where an inline node starts and returns the
    /// depth of the line it starts on. A mapping value with a carried
    /// comment or a head comment moves to its own, deeper line.
    fn open_inline(&mut self, node: &Node, depth: usize, slot: Slot, carried: &str) -> usize {
        match slot {
            Slot::Root => 0,
            Slot::Item => {
                self.write_pad();
                depth + 1
            }
            Slot::Value if carried.is_empty() && node.head_comment.is_empty() => {
                self.writer.write_char(' ');
                depth
            }
            Slot::Value => {
                self.writer.write_line_comment(carried);
                self.writer.write_newline();
                if !node.head_comment.is_empty() {
                    self.writer.write_comment_block(&node.head_comment, depth + 1);
                }
                self.writer.write_indent(depth + 1);
                depth + 1
            }
        }
    }

    /// Spaces after a dash up to the item content column.
    fn write_pad(&mut self) {
        for _ in 1..self.writer.indent_width() {
            self.writer.write_char(' ');
        }
    }

    fn write_block_collection(
        &mut self,
        node: &'a Node,
        depth: usize,
        slot: Slot,
        carried: &str,
        level: usize,
    ) -> Result<()> {
        let tag = collection_tag(node);
        let has_props = !node.anchor.is_empty() || tag.is_some();
        let comment = first_non_empty(carried, &node.line_comment);
        match slot {
            Slot::Root => {
                if has_props {
                    self.write_properties(&node.anchor, tag.as_deref());
                    self.writer.write_line_comment(comment);
                    self.writer.write_newline();
                }
                self.write_entries(node, 0, false, false, level)
            }
            Slot::Value => {
                if has_props {
                    self.writer.write_char(' ');
                    self.write_properties(&node.anchor, tag.as_deref());
                }
                self.writer.write_line_comment(comment);
                self.writer.write_newline();
                if !node.head_comment.is_empty() {
                    self.writer.write_comment_block(&node.head_comment, depth + 1);
                }
                self.write_entries(node, depth + 1, false, false, level)
            }
            Slot::Item if has_props => {
                self.write_pad();
                self.write_properties(&node.anchor, tag.as_deref());
                self.writer.write_line_comment(comment);
                self.writer.write_newline();
                self.write_entries(node, depth + 1, false, false, level)
            }
            Slot::Item => {
                let first_head = self.first_entry_head(node)?;
                self.write_pad();
                if first_head.is_empty() {
                    return self.write_entries(node, depth + 1, true, false, level);
                }
                // `- # head`: the first head line follows the dash.
                let (first, rest) = first_head.split_once('\n').unwrap_or((first_head, ""));
                self.writer.write_comment_text(first);
                self.writer.write_newline();
                if !rest.is_empty() {
                    self.writer.write_comment_block(rest, depth + 1);
                }
                self.write_entries(node, depth + 1, false, true, level)
            }
        }
    }

    fn first_entry_head(&self, node: &Node) -> Result<&'a str> {
        match node.content.first() {
            Some(&first) => Ok(self.node(first)?.head_comment.as_str()),
            None => Ok(""),
        }
    }

    fn write_entries(
        &mut self,
        node: &'a Node,
        depth: usize,
        first_inline: bool,
        skip_first_head: bool,
        level: usize,
    ) -> Result<()> {
        if node.is_mapping() {
            self.write_mapping_entries(node, depth, first_inline, skip_first_head, level)
        } else {
            self.write_sequence_items(node, depth, first_inline, skip_first_head, level)
        }
    }

    fn write_mapping_entries(
        &mut self,
        node: &'a Node,
        depth: usize,
        first_inline: bool,
        skip_first_head: bool,
        level: usize,
    ) -> Result<()> {
        check_pairs(node)?;
        let count = node.content.len() / 2;
        for (index, pair) in node.content.chunks_exact(2).enumerate() {
            let key = self.node(pair[0])?;
            let value = self.node(pair[1])?;
            let first = index == 0;
            if !(first && skip_first_head) && !key.head_comment.is_empty() {
                self.writer.write_comment_block(&key.head_comment, depth);
            }
            if !(first && first_inline) {
                self.writer.write_indent(depth);
            }
            self.write_key(key)?;
            self.writer.write_char(':');
            self.write_node(pair[1], depth, Slot::Value, &key.line_comment, level + 1)?;
            let feet = [value.foot_comment.as_str(), key.foot_comment.as_str()];
            let footed = self.write_feet(&feet, depth);
            if footed && index + 1 < count {
                self.writer.write_newline();
            }
        }
        Ok(())
    }

    fn write_sequence_items(
        &mut self,
        node: &'a Node,
        depth: usize,
        first_inline: bool,
        skip_first_head: bool,
        level: usize,
    ) -> Result<()> {
        let count = node.content.len();
        for (index, &id) in node.content.iter().enumerate() {
            let item = self.node(id)?;
            let first = index == 0;
            if !(first && skip_first_head) && !item.head_comment.is_empty() {
                self.writer.write_comment_block(&item.head_comment, depth);
            }
            if !(first && first_inline) {
                self.writer.write_indent(depth);
            }
            self.writer.write_char('-');
            self.write_node(id, depth, Slot::Item, "", level + 1)?;
            // With no head below it, the foot goes under the item's own
            // content, where it cannot read back as the next item's head.
            let next_head = match node.content.get(index + 1) {
                Some(&next) => Some(self.node(next)?.head_comment.as_str()),
                None => None,
            };
            let tucked = next_head == Some("") && !is_block_collection(item);
            let foot_depth = if tucked { depth + 1 } else { depth };
            let footed = self.write_feet(&[item.foot_comment.as_str()], foot_depth);
            if footed && !tucked && index + 1 < count {
                self.writer.write_newline();
            }
        }
        Ok(())
    }

    fn write_feet(&mut self, feet: &[&str], depth: usize) -> bool {
        let mut wrote = false;
        for foot in feet.iter().filter(|foot| !foot.is_empty()) {
            self.writer.write_comment_block(foot, depth);
            wrote = true;
        }
        wrote
    }

    fn write_key(&mut self, key: &Node) -> Result<()> {
        if !key.is_scalar() {
            return Err(Error::invalid_node(format!(
                "{} nodes cannot be written as mapping keys",
                key.kind()
            )));
        }
        let scalar = represent(key, QuotingContext::Key, false);
        self.write_inline_scalar(key, &scalar, 0);
        Ok(())
    }

    fn write_alias(&mut self, node: &Node) -> Result<()> {
        let target = node
            .alias
            .ok_or_else(|| Error::invalid_node("alias node has no target"))?;
        let target = self.node(target)?;
        if target.anchor.is_empty() {
            return Err(Error::invalid_node("alias target has no anchor"));
        }
        self.writer.write_char('*');
        self.writer.write_str(&target.anchor);
        Ok(())
    }

    /// Writes `&anchor !tag`; returns whether anything was written.
    fn write_properties(&mut self, anchor: &str, tag: Option<&str>) -> bool {
        let mut wrote = false;
        if !anchor.is_empty() {
            self.writer.write_char('&');
            self.writer.write_str(anchor);
            wrote = true;
        }
        if let Some(tag) = tag {
            if wrote {
                self.writer.write_char(' ');
            }
            self.writer.write_str(tag);
            wrote = true;
        }
        wrote
    }

    /// Writes a scalar that starts at the cursor. A multi-line quoted one
    /// continues at `depth`.
    fn write_inline_scalar(&mut self, node: &Node, scalar: &Scalar<'_>, depth: usize) {
        let has_props = self.write_properties(&node.anchor, scalar.tag.as_deref());
        if scalar.form == Form::Plain && scalar.text.is_empty() {
            return;
        }
        if has_props {
            self.writer.write_char(' ');
        }
        match scalar.form {
            Form::Plain => self.writer.write_str(&scalar.text),
            Form::SingleQuoted => self.writer.write_single_quoted(&scalar.text, depth),
            // block forms are only chosen where a block scalar fits
            Form::DoubleQuoted | Form::Literal | Form::Folded => {
                self.writer.write_double_quoted(&scalar.text)
            }
        }
    }

    fn write_block_scalar(
        &mut self,
        node: &Node,
        scalar: &Scalar<'_>,
        content_depth: usize,
        comment: &str,
    ) {
        if self.write_properties(&node.anchor, scalar.tag.as_deref()) {
            self.writer.write_char(' ');
        }
        let value: &str = &scalar.text;
        let folded = scalar.form == Form::Folded;
        if value.is_empty() {
            // an empty body reads back as "" under any chomping
            self.writer.write_char(if folded { '>' } else { '|' });
            self.writer.write_line_comment(comment);
            self.writer.write_newline();
            return;
        }
        let body = value.trim_end_matches('\n');
        let trailing = value.len() - body.len();
        self.writer.write_char(if folded { '>' } else { '|' });
        let leading_space = body
            .split('\n')
            .find(|line| !line.is_empty())
            .is_some_and(|line| line.starts_with(' '));
        if leading_space {
            let width = self.writer.indent_width();
            self.writer.write_str(&width.to_string());
        }
        match trailing {
            0 => self.writer.write_char('-'),
            1 => {}
            _ => self.writer.write_char('+'),
        }
        self.writer.write_line_comment(comment);
        self.writer.write_newline();

        let mut lines: Vec<&str> = Vec::new();
        if folded {
            // A single break folds into a space, so every break in the
            // value needs one empty line.
            for (index, piece) in body.split('\n').enumerate() {
                if index > 0 {
                    lines.push("");
                }
                if !piece.is_empty() {
                    lines.push(piece);
                }
            }
        } else {
            lines.extend(body.split('\n'));
        }
        for line in lines {
            if !line.is_empty() {
                self.writer.write_indent(content_depth);
                self.writer.write_str(line);
            }
            self.writer.write_newline();
        }
        for _ in 1..trailing {
            self.writer.write_newline();
        }
    }

    /// Writes a flow collection starting at the cursor. `base` is the depth
    /// of the line it starts on; the closing bracket of a multi-line
    /// collection returns to it.
    fn write_flow(&mut self, node: &'a Node, base: usize, level: usize) -> Result<()> {
        if level > MAX_DEPTH {
            return Err(Error::invalid_node("exceeded max depth"));
        }
        let mapping = node.is_mapping();
        if mapping {
            check_pairs(node)?;
        }
        let tag = collection_tag(node);
        if self.write_properties(&node.anchor, tag.as_deref()) {
            self.writer.write_char(' ');
        }
        let (open, close) = if mapping { ('{', '}') } else { ('[', ']') };
        self.writer.write_char(open);
        if node.content.is_empty() {
            self.writer.write_char(close);
            return Ok(());
        }
        if !self.has_comment_below(node, level)? {
            if mapping {
                for (index, pair) in node.content.chunks_exact(2).enumerate() {
                    if index > 0 {
                        self.writer.write_str(", ");
                    }
                    let key = self.node(pair[0])?;
                    self.write_key(key)?;
                    self.writer.write_str(": ");
                    self.write_flow_value(pair[1], base, level + 1)?;
                }
            } else {
                for (index, &id) in node.content.iter().enumerate() {
                    if index > 0 {
                        self.writer.write_str(", ");
                    }
                    self.write_flow_value(id, base, level + 1)?;
                }
            }
            self.writer.write_char(close);
            return Ok(());
        }

        let inner = base + 1;
        self.writer.write_newline();
        if mapping {
            let count = node.content.len() / 2;
            for (index, pair) in node.content.chunks_exact(2).enumerate() {
                let key = self.node(pair[0])?;
                let value = self.node(pair[1])?;
                let head = join_comments(&key.head_comment, &value.head_comment);
                if !head.is_empty() {
                    self.writer.write_comment_block(&head, inner);
                }
                self.writer.write_indent(inner);
                self.write_key(key)?;
                self.writer.write_char(':');
                let value_base = if key.line_comment.is_empty() {
                    self.writer.write_char(' ');
                    inner
                } else {
                    self.writer.write_line_comment(&key.line_comment);
                    self.writer.write_newline();
                    self.writer.write_indent(inner + 1);
                    inner + 1
                };
                self.write_flow_value(pair[1], value_base, level + 1)?;
                self.writer.write_char(',');
                self.writer.write_line_comment(&value.line_comment);
                self.writer.write_newline();
                let feet = [value.foot_comment.as_str(), key.foot_comment.as_str()];
                if self.write_feet(&feet, inner) && index + 1 < count {
                    self.writer.write_newline();
                }
            }
        } else {
            let count = node.content.len();
            for (index, &id) in node.content.iter().enumerate() {
                let item = self.node(id)?;
                if !item.head_comment.is_empty() {
                    self.writer.write_comment_block(&item.head_comment, inner);
                }
                self.writer.write_indent(inner);
                self.write_flow_value(id, inner, level + 1)?;
                self.writer.write_char(',');
                self.writer.write_line_comment(&item.line_comment);
                self.writer.write_newline();
                if self.write_feet(&[item.foot_comment.as_str()], inner) && index + 1 < count {
                    self.writer.write_newline();
                }
            }
        }
        self.writer.write_indent(base);
        self.writer.write_char(close);
        Ok(())
    }

    /// A node inside a flow collection; collections nest as flow.
    fn write_flow_value(&mut self, id: NodeId, base: usize, level: usize) -> Result<()> {
        let node = self.node(id)?;
        match node.kind() {
            NodeKind::Scalar => {
                let scalar = represent(node, QuotingContext::Flow, false);
                self.write_inline_scalar(node, &scalar, base + 1);
                Ok(())
            }
            NodeKind::Alias => self.write_alias(node),
            NodeKind::Mapping | NodeKind::Sequence => self.write_flow(node, base, level),
            NodeKind::Document => Err(Error::invalid_node(
                "a document cannot be nested inside another node",
            )),
            NodeKind::Unknown => Err(Error::unknown_node_kind()),
        }
    }

    fn has_comment_below(&self, node: &Node, level: usize) -> Result<bool> {
        if level > MAX_DEPTH {
            return Err(Error::invalid_node("exceeded max depth"));
        }
        for &id in &node.content {
            let child = self.node(id)?;
            if child.has_comments() || self.has_comment_below(child, level + 1)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn check_pairs(node: &Node) -> Result<()> {
    if node.content.len() % 2 == 0 {
        Ok(())
    } else {
        Err(Error::invalid_node(format!(
            "mapping content must hold key/value pairs, got {} nodes",
            node.content.len()
        )))
    }
}

fn first_non_empty<'s>(preferred: &'s str, fallback: &'s str) -> &'s str {
    if preferred.is_empty() {
        fallback
    } else {
        preferred
    }
}

fn join_comments<'s>(first: &'s str, second: &'s str) -> Cow<'s, str> {
    match (first.is_empty(), second.is_empty()) {
        (_, true) => Cow::Borrowed(first),
        (true, false) => Cow::Borrowed(second),
        (false, false) => Cow::Owned(format!("{first}\n{second}")),
    }
}

/// A null with no text, written as nothing after `key:` or `-`.
fn is_block_collection(node: &Node) -> bool {
    (node.is_mapping() || node.is_sequence()) && !node.is_flow() && !node.content.is_empty()
}

fn is_empty_null(node: &Node) -> bool {
    node.tag == NULL_TAG
        && node.value.is_empty()
        && node.anchor.is_empty()
        && !node.style.contains(Style::TAGGED)
}

fn tag_text(tag: &str) -> Cow<'_, str> {
    let short = short_tag(tag);
    if short.starts_with('!') {
        if short == tag {
            Cow::Borrowed(tag)
        } else {
            Cow::Owned(short)
        }
    } else {
        Cow::Owned(format!("!<{short}>"))
    }
}

fn collection_tag(node: &Node) -> Option<Cow<'_, str>> {
    let implicit = if node.is_mapping() { MAP_TAG } else { SEQ_TAG };
    let explicit = node.style.contains(Style::TAGGED)
        || !(node.tag.is_empty() || node.tag == implicit);
    explicit.then(|| tag_text(&node.tag))
}

/// Picks the tag and form a scalar is written with, so that decoding the
/// output yields the same tag and text.
fn represent(node: &Node, context: QuotingContext, block_ok: bool) -> Scalar<'_> {
    let value = node.value.as_str();
    let tag = node.tag.as_str();
    let tagged = node.style.contains(Style::TAGGED);

    if tag == BINARY_TAG || (tag.is_empty() && requires_binary(value)) {
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(binary_value_bytes(value));
        let form = if encoded.is_empty() {
            Form::DoubleQuoted
        } else {
            Form::Plain
        };
        return Scalar {
            tag: Some(Cow::Borrowed(BINARY_TAG)),
            text: Cow::Owned(encoded),
            form,
        };
    }
    if tag == NULL_TAG && value.is_empty() && !tagged {
        return Scalar::plain("null");
    }
    if tag.is_empty() && plain_allowed(value, context) {
        return Scalar::plain(value);
    }

    let requested = requested_form(node.style.scalar_style(), value, context, block_ok);
    let explicit = tagged || !(tag.is_empty() || is_core_tag(tag));
    if explicit {
        let form = requested.unwrap_or_else(|| {
            if value.is_empty() && context == QuotingContext::Block {
                Form::Plain
            } else if plain_allowed(value, context) {
                Form::Plain
            } else {
                quoted_form(value, block_ok)
            }
        });
        return Scalar {
            tag: Some(tag_text(tag)),
            text: Cow::Borrowed(value),
            form,
        };
    }
    if tag.is_empty() || tag == STR_TAG {
        let form = requested.unwrap_or_else(|| string_form(value, context, block_ok));
        return Scalar {
            tag: None,
            text: Cow::Borrowed(value),
            form,
        };
    }

    // a core tag other than !!str
    if requested.is_none() && resolve_plain(value) == tag && plain_allowed(value, context) {
        return Scalar::plain(value);
    }
    let form = requested.unwrap_or_else(|| {
        if plain_allowed(value, context) {
            Form::Plain
        } else {
            quoted_form(value, block_ok)
        }
    });
    Scalar {
        tag: Some(tag_text(tag)),
        text: Cow::Borrowed(value),
        form,
    }
}

fn requested_form(
    style: ScalarStyle,
    value: &str,
    context: QuotingContext,
    block_ok: bool,
) -> Option<Form> {
    match style {
        ScalarStyle::Plain => None,
        ScalarStyle::DoubleQuoted => Some(Form::DoubleQuoted),
        // implicit keys stay on one line
        ScalarStyle::SingleQuoted => (single_quoted_allowed(value)
            && !(context == QuotingContext::Key && value.contains('\n')))
        .then_some(Form::SingleQuoted),
        ScalarStyle::Literal => (block_ok && block_allowed(value)).then_some(Form::Literal),
        ScalarStyle::Folded => (block_ok && folded_allowed(value)).then_some(Form::Folded),
    }
}

/// Untagged strings: plain when the text reads back as a string, quoted
/// when it would read as another type.
fn string_form(value: &str, context: QuotingContext, block_ok: bool) -> Form {
    if resolve_plain(value) != STR_TAG {
        return Form::DoubleQuoted;
    }
    if plain_allowed(value, context) {
        return Form::Plain;
    }
    quoted_form(value, block_ok)
}

fn quoted_form(value: &str, block_ok: bool) -> Form {
    if block_ok && value.contains('\n') && literal_allowed(value) {
        Form::Literal
    } else if !value.contains('\n') && single_quoted_allowed(value) {
        Form::SingleQuoted
    } else {
        Form::DoubleQuoted
    }
}

fn block_allowed(value: &str) -> bool {
    if value.is_empty() {
        true
    } else if value.contains('\n') {
        literal_allowed(value)
    } else {
        literal_allowed(&format!("{value}\n"))
    }
}

fn folded_allowed(value: &str) -> bool {
    block_allowed(value)
        && !value.starts_with('\n')
        && value
            .split('\n')
            .all(|line| !line.starts_with([' ', '\t']))
}
