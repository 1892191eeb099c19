//! YAML text to node trees.
//!
//! Decoding runs in three steps per document: the scanner turns text into
//! positioned events and comments, the comment pass decides which node each
//! comment belongs to, and the builder below assembles the arena, resolving
//! tags and aliases as it goes.

mod anchors;
mod comments;
mod scanner;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::arena::{Arena, NodeId, Tree};
use crate::constants::{BINARY_TAG, MAP_TAG, MAX_DEPTH, NULL_TAG, SEQ_TAG};
use crate::node::{Node, NodeKind, Style};
use crate::text::resolve::resolve;
use crate::{Error, Result};

use anchors::AnchorTable;
use comments::{attach, BlankLines, Slots};
use scanner::{Event, EventKind, RawDocument, Scanner};

/// Decodes the first document of `input`. Empty input yields a document
/// with no content.
pub fn parse(input: &str) -> Result<Tree> {
    let mut documents = Documents::new(input);
    documents
        .next_tree()
        .unwrap_or_else(|| Ok(Tree::empty_document()))
}

/// Decodes every document of a stream. The first failure stops decoding
/// and carries the index of the failing document.
pub fn parse_all(input: &str) -> Result<Vec<Tree>> {
    Documents::new(input).collect()
}

/// Decodes independent inputs, one tree per input, on the rayon pool.
#[cfg(feature = "parallel")]
pub fn parse_many(inputs: &[&str]) -> Vec<Result<Tree>> {
    inputs.par_iter().map(|input| parse(input)).collect()
}

/// Decodes independent inputs, one tree per input.
#[cfg(not(feature = "parallel"))]
pub fn parse_many(inputs: &[&str]) -> Vec<Result<Tree>> {
    inputs.iter().map(|input| parse(input)).collect()
}

/// Iterator over the documents of a YAML stream. Errors are tagged with the
/// index of the document they occurred in, and iteration ends after one.
pub struct Documents<'a> {
    scanner: Scanner<'a>,
    blank: BlankLines,
    index: usize,
}

impl<'a> Documents<'a> {
    pub fn new(input: &'a str) -> Self {
        let scanner = Scanner::new(input);
        let blank = BlankLines::new(scanner.source());
        Self {
            scanner,
            blank,
            index: 0,
        }
    }

    fn next_tree(&mut self) -> Option<Result<Tree>> {
        let raw = match self.scanner.next_document()? {
            Ok(raw) => raw,
            Err(err) => return Some(Err(err)),
        };
        let tree = Builder::new(&raw, &self.blank).build(raw);
        if let Ok(tree) = &tree {
            tracing::debug!(
                document = self.index,
                nodes = tree.arena.len(),
                "decoded document"
            );
        }
        self.index += 1;
        Some(tree)
    }
}

impl Iterator for Documents<'_> {
    type Item = Result<Tree>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.index;
        self.next_tree()
            .map(|result| result.map_err(|err| err.in_document(index)))
    }
}

struct Builder {
    arena: Arena,
    anchors: AnchorTable,
    slots: Vec<Slots>,
    document: Slots,
}

impl Builder {
    fn new(raw: &RawDocument, blank: &BlankLines) -> Self {
        let attachments = attach(&raw.events, &raw.comments, blank);
        Self {
            arena: Arena::with_capacity(raw.events.len() + 1),
            anchors: AnchorTable::new(),
            slots: attachments.nodes,
            document: attachments.document,
        }
    }

    fn build(mut self, raw: RawDocument) -> Result<Tree> {
        let mut document = Node::document();
        document.head_comment = std::mem::take(&mut self.document.head);
        document.line_comment = std::mem::take(&mut self.document.line);
        document.foot_comment = std::mem::take(&mut self.document.foot);
        let (line, column) = raw
            .events
            .first()
            .map_or((1, 1), |event| (event.mark.line, event.mark.column));
        document.line = line;
        document.column = column;
        let root = self.arena.alloc(document);

        let mut stack: SmallVec<[NodeId; 16]> = SmallVec::new();
        stack.push(root);
        for (idx, event) in raw.events.into_iter().enumerate() {
            if matches!(event.kind, EventKind::End { .. }) {
                stack.pop();
                continue;
            }
            let collection = event.is_collection_start();
            let (line, column) = (event.mark.line, event.mark.column);
            let mut node = self.node_for(event)?;
            let slots = std::mem::take(&mut self.slots[idx]);
            node.head_comment = slots.head;
            node.line_comment = slots.line;
            node.foot_comment = slots.foot;
            let anchor = (!node.anchor.is_empty()).then(|| node.anchor.clone());

            let id = self.arena.alloc(node);
            if let Some(name) = anchor {
                self.anchors.define(&name, id);
            }
            let parent = *stack
                .last()
                .ok_or_else(|| Error::syntax("unbalanced collection end", line, column))?;
            self.arena[parent].content.push(id);
            if collection {
                if stack.len() > MAX_DEPTH {
                    return Err(Error::syntax("exceeded max depth", line, column));
                }
                stack.push(id);
            }
        }
        Ok(Tree::new(self.arena, root))
    }

    fn node_for(&mut self, event: Event) -> Result<Node> {
        let Event {
            kind,
            anchor,
            tag,
            mark,
            ..
        } = event;
        let mut node = match kind {
            EventKind::MappingStart { flow } => {
                let mut node = Node::mapping();
                if flow {
                    node.style = Style::FLOW;
                }
                if let Some(tag) = tag {
                    node.style |= Style::TAGGED;
                    node.tag = tag;
                } else {
                    node.tag = MAP_TAG.to_string();
                }
                node
            }
            EventKind::SequenceStart { flow } => {
                let mut node = Node::sequence();
                if flow {
                    node.style = Style::FLOW;
                }
                if let Some(tag) = tag {
                    node.style |= Style::TAGGED;
                    node.tag = tag;
                } else {
                    node.tag = SEQ_TAG.to_string();
                }
                node
            }
            EventKind::Scalar {
                value,
                style,
                implicit,
            } => {
                let mut node = Node::new(NodeKind::Scalar);
                node.style = Style::from_scalar_style(style);
                match tag {
                    Some(tag) => {
                        node.style |= Style::TAGGED;
                        node.value = if tag == BINARY_TAG {
                            Node::decode_base64(&value).map_err(|err| {
                                Error::syntax(err.message, mark.line, mark.column)
                            })?
                        } else {
                            value
                        };
                        node.tag = tag;
                    }
                    None if implicit => {
                        node.tag = NULL_TAG.to_string();
                    }
                    None => {
                        node.tag = resolve(&value, style).to_string();
                        node.value = value;
                    }
                }
                node
            }
            EventKind::Alias { name } => {
                let target = self
                    .anchors
                    .resolve(&name)
                    .map_err(|err| err.at(mark.line, mark.column))?;
                let mut node = Node::alias_of(target);
                node.value = name;
                node
            }
            EventKind::End { .. } => {
                return Err(Error::syntax("unexpected collection end", mark.line, mark.column))
            }
        };
        if let Some(anchor) = anchor {
            node.anchor = anchor;
        }
        node.line = mark.line;
        node.column = mark.column;
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{INT_TAG, STR_TAG};
    use crate::error::ErrorKind;

    #[rstest::rstest]
    fn scalar_document_positions() {
        let tree = parse("a: &x 1\nb:\n").unwrap();
        let map = tree.content_root().unwrap();
        let value = tree.get_key(map, "a").unwrap();
        assert_eq!((tree[value].line, tree[value].column), (1, 4));
        assert_eq!(tree[value].anchor, "x");
        assert_eq!(tree[value].tag, INT_TAG);
        let empty = tree.get_key(map, "b").unwrap();
        assert_eq!(tree[empty].tag, NULL_TAG);
        assert_eq!(tree[empty].value, "");
        assert_eq!((tree[empty].line, tree[empty].column), (2, 3));
    }

    #[rstest::rstest]
    fn explicit_tags_are_marked() {
        let tree = parse("!!str 123").unwrap();
        let value = tree.content_root().unwrap();
        assert_eq!(tree[value].tag, STR_TAG);
        assert_eq!(tree[value].style, Style::TAGGED);
        assert_eq!(tree[value].value, "123");
    }

    #[rstest::rstest]
    fn aliases_share_their_target() {
        let tree = parse("a: &x [1, 2]\nb: *x\n").unwrap();
        let map = tree.content_root().unwrap();
        let target = tree.get_key(map, "a").unwrap();
        let alias = tree.get_key(map, "b").unwrap();
        assert!(tree[alias].is_alias());
        assert_eq!(tree[alias].value, "x");
        assert_eq!(tree[alias].alias, Some(target));
        assert!(tree[target].is_flow());
    }

    #[rstest::rstest]
    fn redefined_anchor_applies_to_later_aliases() {
        let tree = parse("- &x 1\n- *x\n- &x 2\n- *x\n").unwrap();
        let seq = tree.content_root().unwrap();
        let items = &tree[seq].content;
        assert_eq!(tree[items[1]].alias, Some(items[0]));
        assert_eq!(tree[items[3]].alias, Some(items[2]));
    }

    #[rstest::rstest]
    fn undefined_alias_reports_position() {
        let err = parse("a: 1\nb: *nope\n").unwrap_err();
        assert!(err.is(ErrorKind::UndefinedAnchor));
        let location = err.location.unwrap();
        assert_eq!((location.line, location.column), (2, 4));
    }

    #[rstest::rstest]
    fn binary_scalars_hold_bytes() {
        let tree = parse("!!binary gIGC").unwrap();
        let value = tree.content_root().unwrap();
        assert_eq!(tree[value].value, "\u{80}\u{81}\u{82}");
        assert_eq!(tree[value].binary_bytes(), Some(vec![0x80, 0x81, 0x82]));
    }

    #[rstest::rstest]
    fn empty_input_is_an_empty_document() {
        let tree = parse("").unwrap();
        assert!(tree.root_node().is_document());
        assert!(tree.root_node().content.is_empty());
        assert_eq!((tree.root_node().line, tree.root_node().column), (1, 1));
    }

    #[rstest::rstest]
    fn documents_are_decoded_in_order() {
        let trees = parse_all("a: 1\n---\nb: 2\n").unwrap();
        assert_eq!(trees.len(), 2);
        let second = trees[1].content_root().unwrap();
        assert!(trees[1].get_key(second, "b").is_some());
    }

    #[rstest::rstest]
    fn errors_carry_document_index() {
        let err = parse_all("a: 1\n---\nb: *missing\n").unwrap_err();
        assert_eq!(err.document, Some(1));
    }

    #[rstest::rstest]
    fn parse_many_keeps_input_order() {
        let results = parse_many(&["a", "[1", "b"]);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[rstest::rstest]
    fn crlf_input_is_normalized() {
        let tree = parse("a: 1\r\nb: two\r\n").unwrap();
        let map = tree.content_root().unwrap();
        let value = tree.get_key(map, "b").unwrap();
        assert_eq!(tree[value].value, "two");
    }

    #[rstest::rstest]
    fn self_referencing_anchor_builds_a_cycle() {
        let tree = parse("&a [*a]").unwrap();
        let seq = tree.content_root().unwrap();
        let alias = tree[seq].content[0];
        assert_eq!(tree[alias].alias, Some(seq));
    }
}
