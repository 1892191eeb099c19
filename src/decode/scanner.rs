//! YAML scanner producing positioned events and comments.
//!
//! The scanner walks one document at a time and records, next to the usual
//! collection/scalar/alias events, every comment with its position and
//! whether it trails a token on its line. Comment placement is decided later
//! from those positions.

use std::borrow::Cow;

use memchr::memchr;

use crate::constants::{is_flow_indicator, short_tag, EMPTY_COMMENT_LINE};
use crate::text::resolve::ScalarStyle;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub(crate) struct Mark {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EventKind {
    MappingStart { flow: bool },
    SequenceStart { flow: bool },
    End { flow: bool },
    Scalar {
        value: String,
        style: ScalarStyle,
        implicit: bool,
    },
    Alias { name: String },
}

#[derive(Debug, Clone)]
pub(crate) struct Event {
    pub kind: EventKind,
    pub anchor: Option<String>,
    pub tag: Option<String>,
    pub mark: Mark,
    /// Line holding the token a trailing comment would belong to.
    pub token_line: Option<usize>,
    /// The `-` that introduced this node as a block sequence item.
    pub indicator: Option<Mark>,
}

impl Event {
    pub fn is_start(&self) -> bool {
        !matches!(self.kind, EventKind::End { .. })
    }

    pub fn is_collection_start(&self) -> bool {
        matches!(
            self.kind,
            EventKind::MappingStart { .. } | EventKind::SequenceStart { .. }
        )
    }

    pub fn is_flow(&self) -> bool {
        matches!(
            self.kind,
            EventKind::MappingStart { flow: true }
                | EventKind::SequenceStart { flow: true }
                | EventKind::End { flow: true }
        )
    }

    /// Where the node begins in the text, counting its `-` indicator.
    pub fn first_mark(&self) -> Mark {
        self.indicator.unwrap_or(self.mark)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Comment {
    pub line: usize,
    pub column: usize,
    pub text: String,
    pub trailing: bool,
    /// Trails a bare `- ` indicator.
    pub after_dash: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RawDocument {
    pub events: Vec<Event>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default)]
struct Properties {
    anchor: Option<String>,
    tag: Option<String>,
    mark: Option<Mark>,
    own_line: bool,
}

impl Properties {
    fn is_empty(&self) -> bool {
        self.anchor.is_none() && self.tag.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockContext {
    Root,
    MappingValue,
    SequenceItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentMarker {
    Start,
    End,
}

/// A scalar read before knowing whether it is a mapping key.
struct PendingScalar {
    value: String,
    style: ScalarStyle,
    props: Properties,
    mark: Mark,
    end_line: usize,
}

pub(crate) struct Scanner<'a> {
    src: Cow<'a, str>,
    pos: usize,
    line: usize,
    column: usize,
    events: Vec<Event>,
    comments: Vec<Comment>,
    line_has_token: bool,
    after_dash: bool,
    flow_depth: usize,
    documents: usize,
    finished: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        let src = src.strip_prefix('\u{FEFF}').unwrap_or(src);
        let src = if src.contains('\r') {
            Cow::Owned(src.replace("\r\n", "\n"))
        } else {
            Cow::Borrowed(src)
        };
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
            events: Vec::new(),
            comments: Vec::new(),
            line_has_token: false,
            after_dash: false,
            flow_depth: 0,
            documents: 0,
            finished: false,
        }
    }

    pub fn source(&self) -> &str {
        &self.src
    }

    pub fn next_document(&mut self) -> Option<Result<RawDocument>> {
        if self.finished {
            return None;
        }
        match self.scan_document() {
            Ok(Some(doc)) => Some(Ok(doc)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }

    fn scan_document(&mut self) -> Result<Option<RawDocument>> {
        self.events.clear();
        self.comments.clear();
        loop {
            self.skip_to_content()?;
            if self.column == 1 && self.peek() == Some('%') {
                self.skip_line();
                continue;
            }
            if self.documents > 0 && self.at_document_marker() == Some(DocumentMarker::End) {
                self.consume_marker();
                continue;
            }
            break;
        }

        let mut explicit = false;
        match self.at_document_marker() {
            Some(DocumentMarker::Start) => {
                self.consume_marker();
                explicit = true;
            }
            Some(DocumentMarker::End) => {
                self.consume_marker();
                self.documents += 1;
                return Ok(Some(self.take_document()));
            }
            None => {}
        }

        if !explicit && self.peek().is_none() {
            if self.documents > 0 {
                return Ok(None);
            }
            self.documents += 1;
            return Ok(Some(self.take_document()));
        }

        self.parse_block_node(-1, false, None, BlockContext::Root)?;

        self.skip_to_content()?;
        match self.at_document_marker() {
            Some(DocumentMarker::End) => {
                self.consume_marker();
                self.skip_to_content()?;
            }
            Some(DocumentMarker::Start) => {}
            None => {
                if self.peek().is_some() {
                    return Err(self.error("did not find expected <document start>"));
                }
            }
        }
        self.documents += 1;
        Ok(Some(self.take_document()))
    }

    fn take_document(&mut self) -> RawDocument {
        RawDocument {
            events: std::mem::take(&mut self.events),
            comments: std::mem::take(&mut self.comments),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
            self.line_has_token = false;
            self.after_dash = false;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn mark(&self) -> Mark {
        Mark {
            line: self.line,
            column: self.column,
        }
    }

    fn error(&self, message: &str) -> Error {
        Error::syntax(message, self.line, self.column)
    }

    fn error_at(&self, message: &str, mark: Mark) -> Error {
        Error::syntax(message, mark.line, mark.column)
    }

    fn token(&mut self) {
        self.line_has_token = true;
        self.after_dash = false;
    }

    fn skip_spaces(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.bump();
        }
    }

    fn skip_line(&mut self) {
        while !matches!(self.peek(), None | Some('\n')) {
            self.bump();
        }
    }

    fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some('\n') | Some('#'))
    }

    fn at_document_marker(&self) -> Option<DocumentMarker> {
        if self.column != 1 || self.flow_depth > 0 {
            return None;
        }
        let rest = &self.src[self.pos..];
        let marker = if rest.starts_with("---") {
            DocumentMarker::Start
        } else if rest.starts_with("...") {
            DocumentMarker::End
        } else {
            return None;
        };
        match rest[3..].chars().next() {
            None | Some(' ' | '\t' | '\n') => Some(marker),
            _ => None,
        }
    }

    fn consume_marker(&mut self) {
        for _ in 0..3 {
            self.bump();
        }
        self.line_has_token = true;
        self.after_dash = false;
    }

    fn at_block_dash(&self) -> bool {
        self.peek() == Some('-') && matches!(self.peek_nth(1), None | Some(' ' | '\t' | '\n'))
    }

    /// Skips whitespace, line breaks and comments, recording the comments.
    fn skip_to_content(&mut self) -> Result<()> {
        loop {
            let line_start = self.column == 1;
            let mut saw_tab = false;
            while let Some(ch) = self.peek() {
                match ch {
                    ' ' => {
                        self.bump();
                    }
                    '\t' => {
                        saw_tab = true;
                        self.bump();
                    }
                    _ => break,
                }
            }
            match self.peek() {
                Some('#') => self.scan_comment(),
                Some('\n') => {
                    self.bump();
                }
                Some(_) if line_start && saw_tab && self.flow_depth == 0 => {
                    return Err(
                        self.error("found a tab character where an indentation space is expected")
                    );
                }
                _ => return Ok(()),
            }
        }
    }

    fn scan_comment(&mut self) {
        let mark = self.mark();
        let end = memchr(b'\n', &self.src.as_bytes()[self.pos..])
            .map_or(self.src.len(), |idx| self.pos + idx);
        let raw = &self.src[self.pos + 1..end];
        let text = match raw.strip_prefix(' ').unwrap_or(raw).trim_end() {
            "" => EMPTY_COMMENT_LINE.to_string(),
            text => text.to_string(),
        };
        self.comments.push(Comment {
            line: mark.line,
            column: mark.column,
            text,
            trailing: self.line_has_token,
            after_dash: self.line_has_token && self.after_dash,
        });
        while self.pos < end {
            self.bump();
        }
    }

    fn push_event(
        &mut self,
        kind: EventKind,
        props: Properties,
        mark: Mark,
        token_line: Option<usize>,
        indicator: Option<Mark>,
    ) {
        self.events.push(Event {
            kind,
            anchor: props.anchor,
            tag: props.tag,
            mark,
            token_line,
            indicator,
        });
    }

    fn push_null(&mut self, props: Properties, mark: Mark, indicator: Option<Mark>) {
        let mark = props.mark.unwrap_or(mark);
        self.push_event(
            EventKind::Scalar {
                value: String::new(),
                style: ScalarStyle::Plain,
                implicit: true,
            },
            props,
            mark,
            None,
            indicator,
        );
    }

    /// True when the upcoming content cannot belong to a node nested under
    /// `parent_indent`.
    fn at_block_end(&self, new_line: bool, parent_indent: isize, indentless: bool) -> bool {
        if self.peek().is_none() || self.at_document_marker().is_some() {
            return true;
        }
        if !new_line {
            return false;
        }
        let indent = self.column as isize - 1;
        if indent > parent_indent {
            return false;
        }
        !(indentless && indent == parent_indent && self.at_block_dash())
    }

    fn parse_block_node(
        &mut self,
        parent_indent: isize,
        indentless: bool,
        indicator: Option<Mark>,
        context: BlockContext,
    ) -> Result<()> {
        let fallback = self.mark();
        let start_line = self.line;
        self.skip_to_content()?;
        let new_line = self.line != start_line;
        if self.at_block_end(new_line, parent_indent, indentless) {
            self.push_null(Properties::default(), fallback, indicator);
            return Ok(());
        }

        let mut props = Properties::default();
        if matches!(self.peek(), Some('&' | '!')) {
            props = self.scan_properties()?;
            if self.at_line_end() {
                let props_line = self.line;
                self.skip_to_content()?;
                let moved = self.line != props_line;
                if self.at_block_end(moved || new_line, parent_indent, indentless) {
                    self.push_null(props, fallback, indicator);
                    return Ok(());
                }
                props.own_line = moved;
            }
        }
        let same_line = !new_line && !props.own_line;
        self.parse_node_content(parent_indent, indicator, props, context, same_line)
    }

    fn parse_node_content(
        &mut self,
        parent_indent: isize,
        indicator: Option<Mark>,
        props: Properties,
        context: BlockContext,
        same_line: bool,
    ) -> Result<()> {
        let nested_block_allowed = !(same_line && context == BlockContext::MappingValue);
        let Some(ch) = self.peek() else {
            self.push_null(props, self.mark(), indicator);
            return Ok(());
        };
        match ch {
            '-' if self.at_block_dash() => {
                if !nested_block_allowed {
                    return Err(self.error("block sequence entries are not allowed in this context"));
                }
                let mark = if props.own_line { props.mark } else { None };
                let mark = mark.unwrap_or_else(|| self.mark());
                self.parse_block_sequence(props, mark, indicator)
            }
            '[' | '{' => {
                self.parse_flow_node(props, indicator)?;
                self.skip_spaces();
                if self.peek() == Some(':') {
                    return Err(self.error("flow collections cannot be used as mapping keys"));
                }
                if !self.at_line_end() {
                    return Err(self.error("did not find expected comment or line break"));
                }
                Ok(())
            }
            '|' | '>' => self.parse_block_scalar(parent_indent, props, indicator),
            '*' => {
                if !props.is_empty() {
                    return Err(self.error("an alias node cannot carry properties"));
                }
                let mark = self.mark();
                let name = self.scan_alias_name()?;
                self.skip_spaces();
                if self.peek() == Some(':') {
                    return Err(self.error("aliases cannot be used as mapping keys"));
                }
                self.push_event(
                    EventKind::Alias { name },
                    Properties::default(),
                    mark,
                    Some(mark.line),
                    indicator,
                );
                Ok(())
            }
            '?' if matches!(self.peek_nth(1), None | Some(' ' | '\t' | '\n')) => {
                Err(self.error("explicit mapping keys are not supported"))
            }
            _ => {
                let (key_props, node_props) = if props.own_line {
                    (Properties::default(), props)
                } else {
                    (props, Properties::default())
                };
                let pending = self.scan_block_scalar_token(key_props, false)?;
                self.skip_spaces();
                if self.at_mapping_indicator() {
                    if !nested_block_allowed {
                        return Err(self.error("mapping values are not allowed in this context"));
                    }
                    if pending.end_line != pending.mark.line {
                        return Err(self.error("implicit keys must be on a single line"));
                    }
                    let map_mark = node_props.mark.unwrap_or(pending.mark);
                    return self.parse_block_mapping(pending, node_props, map_mark, indicator);
                }
                // Not a key: the properties belong to the scalar itself.
                let mut pending = pending;
                if !node_props.is_empty() {
                    pending.props = node_props;
                    pending.mark = pending.props.mark.unwrap_or(pending.mark);
                }
                if pending.style == ScalarStyle::Plain {
                    pending.end_line = self.continue_plain(&mut pending.value, parent_indent)?;
                } else if !self.at_line_end() {
                    return Err(self.error("did not find expected comment or line break"));
                }
                let token_line = Some(pending.end_line);
                self.push_event(
                    EventKind::Scalar {
                        value: pending.value,
                        style: pending.style,
                        implicit: false,
                    },
                    pending.props,
                    pending.mark,
                    token_line,
                    indicator,
                );
                Ok(())
            }
        }
    }

    fn at_mapping_indicator(&self) -> bool {
        self.peek() == Some(':') && matches!(self.peek_nth(1), None | Some(' ' | '\t' | '\n'))
    }

    /// Reads a quoted scalar or the first line of a plain one.
    fn scan_block_scalar_token(&mut self, props: Properties, flow: bool) -> Result<PendingScalar> {
        let mark = props.mark.unwrap_or_else(|| self.mark());
        let (value, style) = match self.peek() {
            Some('"') => (self.scan_double_quoted()?, ScalarStyle::DoubleQuoted),
            Some('\'') => (self.scan_single_quoted()?, ScalarStyle::SingleQuoted),
            _ => (self.scan_plain_line(flow, true)?, ScalarStyle::Plain),
        };
        Ok(PendingScalar {
            value,
            style,
            props,
            mark,
            end_line: self.line,
        })
    }

    fn parse_block_mapping(
        &mut self,
        first_key: PendingScalar,
        props: Properties,
        mark: Mark,
        indicator: Option<Mark>,
    ) -> Result<()> {
        let column = mark.column;
        let indent = column as isize - 1;
        self.push_event(
            EventKind::MappingStart { flow: false },
            props,
            mark,
            None,
            indicator,
        );
        let mut key = first_key;
        loop {
            let token_line = Some(key.end_line);
            self.push_event(
                EventKind::Scalar {
                    value: key.value,
                    style: key.style,
                    implicit: false,
                },
                key.props,
                key.mark,
                token_line,
                None,
            );
            // ':'
            self.bump();
            self.token();
            self.parse_block_node(indent, true, None, BlockContext::MappingValue)?;

            self.skip_to_content()?;
            if self.peek().is_none() || self.at_document_marker().is_some() {
                break;
            }
            if self.column < column {
                break;
            }
            if self.column > column {
                return Err(self.error("mapping values are not allowed in this context"));
            }
            if self.at_block_dash() {
                return Err(self.error("did not find expected key"));
            }
            key = self.scan_block_key()?;
        }
        let end = self.mark();
        self.push_event(
            EventKind::End { flow: false },
            Properties::default(),
            end,
            None,
            None,
        );
        Ok(())
    }

    fn scan_block_key(&mut self) -> Result<PendingScalar> {
        let mut props = Properties::default();
        if matches!(self.peek(), Some('&' | '!')) {
            props = self.scan_properties()?;
        }
        match self.peek() {
            Some('*') => return Err(self.error("aliases cannot be used as mapping keys")),
            Some('[' | '{') => {
                return Err(self.error("flow collections cannot be used as mapping keys"))
            }
            Some('|' | '>') => return Err(self.error("block scalars cannot be used as mapping keys")),
            Some('?') if matches!(self.peek_nth(1), None | Some(' ' | '\t' | '\n')) => {
                return Err(self.error("explicit mapping keys are not supported"))
            }
            _ => {}
        }
        let key = self.scan_block_scalar_token(props, false)?;
        self.skip_spaces();
        if !self.at_mapping_indicator() || key.end_line != key.mark.line {
            return Err(self.error("could not find expected ':'"));
        }
        Ok(key)
    }

    fn parse_block_sequence(
        &mut self,
        props: Properties,
        mark: Mark,
        indicator: Option<Mark>,
    ) -> Result<()> {
        let column = self.column;
        self.push_event(
            EventKind::SequenceStart { flow: false },
            props,
            mark,
            None,
            indicator,
        );
        loop {
            let dash = self.mark();
            self.bump();
            self.line_has_token = true;
            self.after_dash = true;
            self.parse_block_node(
                column as isize - 1,
                false,
                Some(dash),
                BlockContext::SequenceItem,
            )?;

            self.skip_to_content()?;
            if self.peek().is_none() || self.at_document_marker().is_some() {
                break;
            }
            if self.column == column && self.at_block_dash() {
                continue;
            }
            if self.column <= column {
                // A shallower line, or the next key of an enclosing mapping
                // that holds this sequence without indenting it.
                break;
            }
            return Err(self.error("bad indentation of a sequence entry"));
        }
        let end = self.mark();
        self.push_event(
            EventKind::End { flow: false },
            Properties::default(),
            end,
            None,
            None,
        );
        Ok(())
    }

    fn scan_properties(&mut self) -> Result<Properties> {
        let mut props = Properties {
            mark: Some(self.mark()),
            ..Properties::default()
        };
        loop {
            match self.peek() {
                Some('&') => {
                    if props.anchor.is_some() {
                        return Err(self.error("found duplicate anchor property"));
                    }
                    self.bump();
                    let name = self.scan_name();
                    if name.is_empty() {
                        return Err(self.error("did not find expected anchor name"));
                    }
                    props.anchor = Some(name);
                }
                Some('!') => {
                    if props.tag.is_some() {
                        return Err(self.error("found duplicate tag property"));
                    }
                    props.tag = Some(self.scan_tag()?);
                }
                _ => break,
            }
            self.token();
            self.skip_spaces();
        }
        Ok(props)
    }

    fn scan_name(&mut self) -> String {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || is_flow_indicator(ch) {
                break;
            }
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    fn scan_alias_name(&mut self) -> Result<String> {
        self.bump();
        let name = self.scan_name();
        if name.is_empty() {
            return Err(self.error("did not find expected alias name"));
        }
        self.token();
        Ok(name)
    }

    fn scan_tag(&mut self) -> Result<String> {
        let mark = self.mark();
        self.bump();
        if self.peek() == Some('<') {
            self.bump();
            let start = self.pos;
            while !matches!(self.peek(), None | Some('>' | '\n')) {
                self.bump();
            }
            if self.peek() != Some('>') {
                return Err(self.error_at("did not find the expected '>'", mark));
            }
            let verbatim = self.src[start..self.pos].to_string();
            self.bump();
            return Ok(short_tag(&verbatim));
        }
        let rest = self.scan_name();
        Ok(short_tag(&format!("!{rest}")))
    }

    /// Reads one line of a plain scalar. `leading` is set for its first
    /// line, where no flow indicator may start it, even in block context.
    fn scan_plain_line(&mut self, flow: bool, leading: bool) -> Result<String> {
        let start_mark = self.mark();
        if let Some(first) = self.peek() {
            let cannot_start = matches!(first, '%' | '@' | '`' | '|' | '>' | '\'' | '"' | '#')
                || ((flow || leading) && is_flow_indicator(first));
            if cannot_start {
                return Err(self.error_at("found character that cannot start any token", start_mark));
            }
        }
        let start = self.pos;
        let mut end = self.pos;
        while let Some(ch) = self.peek() {
            match ch {
                '\n' => break,
                ' ' | '\t' => {
                    let after = self.src[self.pos..].trim_start_matches([' ', '\t']);
                    if matches!(after.chars().next(), None | Some('\n' | '#')) {
                        break;
                    }
                    self.bump();
                    continue;
                }
                ':' => {
                    let next = self.peek_nth(1);
                    if matches!(next, None | Some(' ' | '\t' | '\n')) {
                        break;
                    }
                    if flow && next.is_some_and(is_flow_indicator) {
                        break;
                    }
                }
                c if flow && is_flow_indicator(c) => break,
                _ => {}
            }
            self.bump();
            end = self.pos;
        }
        if end == start {
            return Err(self.error_at("found character that cannot start any token", start_mark));
        }
        self.token();
        Ok(self.src[start..end].to_string())
    }

    /// Folds the continuation lines of a multi-line plain scalar into
    /// `text`. Returns the line the scalar ends on.
    fn continue_plain(&mut self, text: &mut String, min_indent: isize) -> Result<usize> {
        let mut end_line = self.line;
        loop {
            self.skip_spaces();
            if self.peek() != Some('\n') {
                break;
            }
            let Some((offset, indent, empties)) = self.lookahead_line() else {
                break;
            };
            if indent as isize <= min_indent {
                break;
            }
            let rest = &self.src[offset..];
            if rest.starts_with('#') {
                break;
            }
            if indent == 0
                && (rest.starts_with("---") || rest.starts_with("..."))
                && matches!(rest[3..].chars().next(), None | Some(' ' | '\t' | '\n'))
            {
                break;
            }
            while self.pos < offset {
                self.bump();
            }
            if empties == 0 {
                text.push(' ');
            } else {
                text.push_str(&"\n".repeat(empties));
            }
            let piece = self.scan_plain_line(false, false)?;
            if self.at_mapping_indicator() {
                return Err(self.error("mapping values are not allowed in this context"));
            }
            text.push_str(&piece);
            end_line = self.line;
        }
        Ok(end_line)
    }

    /// From a line break, finds the next line with content: its offset,
    /// its indentation in spaces and the number of blank lines skipped.
    fn lookahead_line(&self) -> Option<(usize, usize, usize)> {
        let bytes = self.src.as_bytes();
        let mut idx = self.pos;
        let mut empties = 0;
        while idx < bytes.len() && bytes[idx] == b'\n' {
            idx += 1;
            let line_start = idx;
            while idx < bytes.len() && bytes[idx] == b' ' {
                idx += 1;
            }
            let indent = idx - line_start;
            while idx < bytes.len() && bytes[idx] == b'\t' {
                idx += 1;
            }
            if idx >= bytes.len() {
                return None;
            }
            if bytes[idx] != b'\n' {
                return Some((idx, indent, empties));
            }
            empties += 1;
        }
        None
    }

    fn scan_double_quoted(&mut self) -> Result<String> {
        let start = self.mark();
        self.bump();
        let mut out = String::new();
        loop {
            let Some(ch) = self.peek() else {
                return Err(self.error_at(
                    "found unexpected end of stream while scanning a quoted scalar",
                    start,
                ));
            };
            match ch {
                '"' => {
                    self.bump();
                    break;
                }
                '\\' => {
                    self.bump();
                    let escape_mark = self.mark();
                    let Some(esc) = self.bump() else {
                        return Err(self.error_at(
                            "found unexpected end of stream while scanning a quoted scalar",
                            start,
                        ));
                    };
                    match esc {
                        '0' => out.push('\0'),
                        'a' => out.push('\u{7}'),
                        'b' => out.push('\u{8}'),
                        't' | '\t' => out.push('\t'),
                        'n' => out.push('\n'),
                        'v' => out.push('\u{b}'),
                        'f' => out.push('\u{c}'),
                        'r' => out.push('\r'),
                        'e' => out.push('\u{1b}'),
                        ' ' => out.push(' '),
                        '"' => out.push('"'),
                        '/' => out.push('/'),
                        '\\' => out.push('\\'),
                        'N' => out.push('\u{85}'),
                        '_' => out.push('\u{a0}'),
                        'L' => out.push('\u{2028}'),
                        'P' => out.push('\u{2029}'),
                        'x' => out.push(self.scan_hex_escape(2, escape_mark)?),
                        'u' => out.push(self.scan_hex_escape(4, escape_mark)?),
                        'U' => out.push(self.scan_hex_escape(8, escape_mark)?),
                        '\n' => {
                            self.skip_spaces();
                            while self.peek() == Some('\n') {
                                self.bump();
                                out.push('\n');
                                self.skip_spaces();
                            }
                        }
                        _ => {
                            return Err(self.error_at(
                                "found unknown escape character while parsing a quoted scalar",
                                escape_mark,
                            ))
                        }
                    }
                }
                ' ' | '\t' | '\n' => self.fold_quoted_whitespace(&mut out),
                _ => {
                    out.push(ch);
                    self.bump();
                }
            }
        }
        self.token();
        Ok(out)
    }

    fn scan_single_quoted(&mut self) -> Result<String> {
        let start = self.mark();
        self.bump();
        let mut out = String::new();
        loop {
            let Some(ch) = self.peek() else {
                return Err(self.error_at(
                    "found unexpected end of stream while scanning a quoted scalar",
                    start,
                ));
            };
            match ch {
                '\'' if self.peek_nth(1) == Some('\'') => {
                    self.bump();
                    self.bump();
                    out.push('\'');
                }
                '\'' => {
                    self.bump();
                    break;
                }
                ' ' | '\t' | '\n' => self.fold_quoted_whitespace(&mut out),
                _ => {
                    out.push(ch);
                    self.bump();
                }
            }
        }
        self.token();
        Ok(out)
    }

    /// A line break inside quotes folds to a space, each further break to a
    /// newline; whitespace around the breaks is dropped.
    fn fold_quoted_whitespace(&mut self, out: &mut String) {
        let mut spaces = String::new();
        let mut breaks = 0usize;
        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '\t' => {
                    if breaks == 0 {
                        spaces.push(ch);
                    }
                    self.bump();
                }
                '\n' => {
                    breaks += 1;
                    self.bump();
                }
                _ => break,
            }
        }
        match breaks {
            0 => out.push_str(&spaces),
            1 => out.push(' '),
            n => out.push_str(&"\n".repeat(n - 1)),
        }
    }

    fn scan_hex_escape(&mut self, digits: usize, mark: Mark) -> Result<char> {
        let mut code = 0u32;
        for _ in 0..digits {
            let digit = self
                .peek()
                .and_then(|ch| ch.to_digit(16))
                .ok_or_else(|| self.error_at("did not find expected hexdecimal number", mark))?;
            code = code * 16 + digit;
            self.bump();
        }
        char::from_u32(code)
            .ok_or_else(|| self.error_at("found invalid Unicode character escape code", mark))
    }

    fn parse_block_scalar(
        &mut self,
        parent_indent: isize,
        props: Properties,
        indicator: Option<Mark>,
    ) -> Result<()> {
        let mark = props.mark.unwrap_or_else(|| self.mark());
        let header_line = self.line;
        let literal = self.bump() == Some('|');
        let mut chomping: Option<char> = None;
        let mut explicit: Option<usize> = None;
        for _ in 0..2 {
            match self.peek() {
                Some(c @ ('+' | '-')) if chomping.is_none() => {
                    chomping = Some(c);
                    self.bump();
                }
                Some(c @ '1'..='9') if explicit.is_none() => {
                    explicit = c.to_digit(10).map(|d| d as usize);
                    self.bump();
                }
                _ => break,
            }
        }
        self.token();
        self.skip_spaces();
        if self.peek() == Some('#') {
            self.scan_comment();
        }
        match self.peek() {
            None => {}
            Some('\n') => {
                self.bump();
            }
            Some(_) => return Err(self.error("did not find expected comment or line break")),
        }

        let base = parent_indent.max(0) as usize;
        let mut indent = explicit.map(|d| base + d);
        let mut lines: Vec<String> = Vec::new();
        let mut leading_empties = 0usize;
        let mut trailing_empties = 0usize;
        let mut last_broken = false;
        while self.pos < self.src.len() {
            if self.at_document_marker().is_some() {
                break;
            }
            let bytes = self.src.as_bytes();
            let line_start = self.pos;
            let mut spaces = 0;
            while line_start + spaces < bytes.len() && bytes[line_start + spaces] == b' ' {
                spaces += 1;
            }
            let after = line_start + spaces;
            let blank = after >= bytes.len() || bytes[after] == b'\n';
            let detected = match indent {
                Some(value) => value,
                None if blank => {
                    leading_empties += 1;
                    self.consume_through_line();
                    continue;
                }
                None => {
                    if spaces as isize <= parent_indent {
                        break;
                    }
                    let value = spaces.max(1);
                    indent = Some(value);
                    value
                }
            };
            if blank && spaces <= detected {
                trailing_empties += 1;
                self.consume_through_line();
                continue;
            }
            if spaces < detected {
                break;
            }
            // a content line; earlier empty lines are interior
            if lines.is_empty() {
                lines.resize(leading_empties, String::new());
                leading_empties = 0;
            }
            lines.resize(lines.len() + trailing_empties, String::new());
            trailing_empties = 0;
            let content_start = line_start + detected;
            let end = memchr(b'\n', &bytes[content_start..])
                .map_or(bytes.len(), |idx| content_start + idx);
            last_broken = end < bytes.len();
            lines.push(self.src[content_start..end].to_string());
            self.consume_through_line();
        }
        trailing_empties += leading_empties;

        let body = if literal {
            lines.join("\n")
        } else {
            fold_lines(&lines)
        };
        let has_content = !lines.is_empty();
        let mut value = body;
        match chomping {
            Some('-') => {}
            Some(_) => {
                if has_content && last_broken {
                    value.push('\n');
                }
                value.push_str(&"\n".repeat(trailing_empties));
            }
            None => {
                if has_content && last_broken {
                    value.push('\n');
                }
            }
        }
        self.push_event(
            EventKind::Scalar {
                value,
                style: if literal {
                    ScalarStyle::Literal
                } else {
                    ScalarStyle::Folded
                },
                implicit: false,
            },
            props,
            mark,
            Some(header_line),
            indicator,
        );
        Ok(())
    }

    fn consume_through_line(&mut self) {
        self.skip_line();
        self.bump();
    }

    fn skip_flow_whitespace(&mut self) -> Result<()> {
        self.skip_to_content()?;
        if self.peek().is_none() {
            return Err(self.error("did not find expected ',' or closing bracket"));
        }
        Ok(())
    }

    fn parse_flow_node(&mut self, props: Properties, indicator: Option<Mark>) -> Result<()> {
        let mut props = props;
        if matches!(self.peek(), Some('&' | '!')) {
            props = self.scan_properties()?;
            self.skip_flow_whitespace()?;
        }
        let here = self.mark();
        match self.peek() {
            Some('[') => self.parse_flow_sequence(props, indicator),
            Some('{') => self.parse_flow_mapping(props, indicator),
            Some('*') => {
                if !props.is_empty() {
                    return Err(self.error("an alias node cannot carry properties"));
                }
                let name = self.scan_alias_name()?;
                self.push_event(
                    EventKind::Alias { name },
                    Properties::default(),
                    here,
                    Some(here.line),
                    indicator,
                );
                Ok(())
            }
            Some(',' | ']' | '}') if !props.is_empty() => {
                self.push_null(props, here, indicator);
                Ok(())
            }
            _ => {
                let scalar = self.scan_block_scalar_token(props, true)?;
                let token_line = Some(scalar.end_line);
                self.push_event(
                    EventKind::Scalar {
                        value: scalar.value,
                        style: scalar.style,
                        implicit: false,
                    },
                    scalar.props,
                    scalar.mark,
                    token_line,
                    indicator,
                );
                Ok(())
            }
        }
    }

    fn parse_flow_sequence(&mut self, props: Properties, indicator: Option<Mark>) -> Result<()> {
        let mark = props.mark.unwrap_or_else(|| self.mark());
        let open_line = self.line;
        self.bump();
        self.token();
        self.flow_depth += 1;
        self.push_event(
            EventKind::SequenceStart { flow: true },
            props,
            mark,
            Some(open_line),
            indicator,
        );
        loop {
            self.skip_flow_whitespace()?;
            if self.peek() == Some(']') {
                break;
            }
            self.parse_flow_node(Properties::default(), None)?;
            self.skip_flow_whitespace()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                    self.token();
                }
                Some(']') => {}
                Some(':') => {
                    return Err(self.error("single-pair mappings inside flow sequences are not supported"))
                }
                _ => return Err(self.error("did not find expected ',' or ']'")),
            }
        }
        let close = self.mark();
        self.bump();
        self.token();
        self.flow_depth -= 1;
        self.push_event(
            EventKind::End { flow: true },
            Properties::default(),
            close,
            Some(close.line),
            None,
        );
        Ok(())
    }

    fn parse_flow_mapping(&mut self, props: Properties, indicator: Option<Mark>) -> Result<()> {
        let mark = props.mark.unwrap_or_else(|| self.mark());
        let open_line = self.line;
        self.bump();
        self.token();
        self.flow_depth += 1;
        self.push_event(
            EventKind::MappingStart { flow: true },
            props,
            mark,
            Some(open_line),
            indicator,
        );
        loop {
            self.skip_flow_whitespace()?;
            if self.peek() == Some('}') {
                break;
            }
            if self.peek() == Some('?') && matches!(self.peek_nth(1), Some(' ' | '\t' | '\n')) {
                return Err(self.error("explicit mapping keys are not supported"));
            }
            self.parse_flow_node(Properties::default(), None)?;
            self.skip_flow_whitespace()?;
            if self.peek() == Some(':') {
                self.bump();
                self.token();
                self.skip_flow_whitespace()?;
                if matches!(self.peek(), Some(',' | '}')) {
                    let here = self.mark();
                    self.push_null(Properties::default(), here, None);
                } else {
                    self.parse_flow_node(Properties::default(), None)?;
                }
                self.skip_flow_whitespace()?;
            } else {
                let here = self.mark();
                self.push_null(Properties::default(), here, None);
            }
            match self.peek() {
                Some(',') => {
                    self.bump();
                    self.token();
                }
                Some('}') => {}
                _ => return Err(self.error("did not find expected ',' or '}'")),
            }
        }
        let close = self.mark();
        self.bump();
        self.token();
        self.flow_depth -= 1;
        self.push_event(
            EventKind::End { flow: true },
            Properties::default(),
            close,
            Some(close.line),
            None,
        );
        Ok(())
    }
}

/// Folded block scalar line joining: breaks between two normal lines
/// become spaces, breaks next to more-indented lines are kept, and each
/// empty line contributes one newline.
fn fold_lines(lines: &[String]) -> String {
    let mut out = String::new();
    let mut empties = 0usize;
    let mut started = false;
    let mut prev_more_indented = false;
    for line in lines {
        if line.is_empty() {
            empties += 1;
            continue;
        }
        let more_indented = line.starts_with([' ', '\t']);
        if started {
            let folding = !more_indented && !prev_more_indented;
            if empties == 0 {
                out.push(if folding { ' ' } else { '\n' });
            } else {
                let count = if folding { empties } else { empties + 1 };
                out.push_str(&"\n".repeat(count));
            }
        } else {
            out.push_str(&"\n".repeat(empties));
        }
        out.push_str(line);
        started = true;
        prev_more_indented = more_indented;
        empties = 0;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(input: &str) -> Vec<EventKind> {
        let mut scanner = Scanner::new(input);
        let doc = scanner.next_document().unwrap().unwrap();
        doc.events.into_iter().map(|event| event.kind).collect()
    }

    fn scalar(value: &str, style: ScalarStyle) -> EventKind {
        EventKind::Scalar {
            value: value.to_string(),
            style,
            implicit: false,
        }
    }

    fn plain(value: &str) -> EventKind {
        scalar(value, ScalarStyle::Plain)
    }

    fn null() -> EventKind {
        EventKind::Scalar {
            value: String::new(),
            style: ScalarStyle::Plain,
            implicit: true,
        }
    }

    const BLOCK_MAP: EventKind = EventKind::MappingStart { flow: false };
    const BLOCK_SEQ: EventKind = EventKind::SequenceStart { flow: false };
    const FLOW_MAP: EventKind = EventKind::MappingStart { flow: true };
    const FLOW_SEQ: EventKind = EventKind::SequenceStart { flow: true };
    const BLOCK_END: EventKind = EventKind::End { flow: false };
    const FLOW_END: EventKind = EventKind::End { flow: true };

    #[rstest::rstest]
    fn nested_block_mapping() {
        assert_eq!(
            events("a:\n  b: c\n  d: e\n"),
            vec![
                BLOCK_MAP,
                plain("a"),
                BLOCK_MAP,
                plain("b"),
                plain("c"),
                plain("d"),
                plain("e"),
                BLOCK_END,
                BLOCK_END,
            ]
        );
    }

    #[rstest::rstest]
    fn indentless_sequence_under_key() {
        assert_eq!(
            events("a:\n- b\n- c\nd: e\n"),
            vec![
                BLOCK_MAP,
                plain("a"),
                BLOCK_SEQ,
                plain("b"),
                plain("c"),
                BLOCK_END,
                plain("d"),
                plain("e"),
                BLOCK_END,
            ]
        );
    }

    #[rstest::rstest]
    fn compact_sequence_forms() {
        assert_eq!(
            events("- a\n- - b\n  - c\n- d: e\n  f: g\n"),
            vec![
                BLOCK_SEQ,
                plain("a"),
                BLOCK_SEQ,
                plain("b"),
                plain("c"),
                BLOCK_END,
                BLOCK_MAP,
                plain("d"),
                plain("e"),
                plain("f"),
                plain("g"),
                BLOCK_END,
                BLOCK_END,
            ]
        );
    }

    #[rstest::rstest]
    fn empty_values_are_implicit_nulls() {
        assert_eq!(
            events("a:\nb:\n  c:\n"),
            vec![
                BLOCK_MAP,
                plain("a"),
                null(),
                plain("b"),
                BLOCK_MAP,
                plain("c"),
                null(),
                BLOCK_END,
                BLOCK_END,
            ]
        );
    }

    #[rstest::rstest]
    fn flow_collections_with_trailing_comma() {
        assert_eq!(
            events("{a: [1, 2,], b, c: }\n"),
            vec![
                FLOW_MAP,
                plain("a"),
                FLOW_SEQ,
                plain("1"),
                plain("2"),
                FLOW_END,
                plain("b"),
                null(),
                plain("c"),
                null(),
                FLOW_END,
            ]
        );
    }

    #[rstest::rstest]
    fn json_is_accepted() {
        assert_eq!(
            events("{\"a\":1,\"b\":[true,null]}"),
            vec![
                FLOW_MAP,
                scalar("a", ScalarStyle::DoubleQuoted),
                plain("1"),
                scalar("b", ScalarStyle::DoubleQuoted),
                FLOW_SEQ,
                plain("true"),
                plain("null"),
                FLOW_END,
                FLOW_END,
            ]
        );
    }

    #[rstest::rstest]
    #[case("\"a\\tb\\u00e9\\x41\"", "a\tbéA")]
    #[case("\"one\n  two\n\n  three\"", "one two\nthree")]
    #[case("\"trail \\\n  next\"", "trail next")]
    #[case("'it''s'", "it's")]
    #[case("'a\n  b'", "a b")]
    fn quoted_scalars(#[case] input: &str, #[case] expected: &str) {
        let kinds = events(input);
        match &kinds[0] {
            EventKind::Scalar { value, .. } => assert_eq!(value, expected),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[rstest::rstest]
    #[case("|\n  foo\n  bar\n", "foo\nbar\n")]
    #[case("|-\n  foo\n", "foo")]
    #[case("|+\n  foo\n\n", "foo\n\n")]
    #[case(">\n  folded\n  text\n\n  next\n", "folded text\nnext\n")]
    #[case(">-\n  str\n", "str")]
    #[case("|2\n   lead\n", " lead\n")]
    #[case("|\n\n  after blank\n", "\nafter blank\n")]
    fn block_scalars(#[case] input: &str, #[case] expected: &str) {
        match &events(input)[0] {
            EventKind::Scalar { value, .. } => assert_eq!(value, expected),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[rstest::rstest]
    fn block_scalar_ends_at_dedent() {
        assert_eq!(
            events("a: |\n  str\nb: >-\n  x\n  y\n"),
            vec![
                BLOCK_MAP,
                plain("a"),
                scalar("str\n", ScalarStyle::Literal),
                plain("b"),
                scalar("x y", ScalarStyle::Folded),
                BLOCK_END,
            ]
        );
    }

    #[rstest::rstest]
    fn multi_line_plain_scalar() {
        assert_eq!(
            events("a: one\n  two\n\n  three\nb: x\n"),
            vec![
                BLOCK_MAP,
                plain("a"),
                plain("one two\nthree"),
                plain("b"),
                plain("x"),
                BLOCK_END,
            ]
        );
    }

    #[rstest::rstest]
    fn properties_and_aliases() {
        let mut scanner = Scanner::new("a: &x !!str 1\nb: *x\n");
        let doc = scanner.next_document().unwrap().unwrap();
        let value = &doc.events[2];
        assert_eq!(value.anchor.as_deref(), Some("x"));
        assert_eq!(value.tag.as_deref(), Some("!!str"));
        assert_eq!((value.mark.line, value.mark.column), (1, 4));
        assert_eq!(doc.events[4].kind, EventKind::Alias { name: "x".to_string() });
    }

    #[rstest::rstest]
    fn verbatim_tags_are_shortened() {
        let mut scanner = Scanner::new("!<tag:yaml.org,2002:str> 1\n");
        let doc = scanner.next_document().unwrap().unwrap();
        assert_eq!(doc.events[0].tag.as_deref(), Some("!!str"));
    }

    #[rstest::rstest]
    fn comments_record_position_and_trailing_state() {
        let mut scanner = Scanner::new("# head\na: b # line\nc:\n  - # dash\n    d: e\n");
        let doc = scanner.next_document().unwrap().unwrap();
        let summary: Vec<(usize, usize, &str, bool, bool)> = doc
            .comments
            .iter()
            .map(|c| (c.line, c.column, c.text.as_str(), c.trailing, c.after_dash))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, 1, "head", false, false),
                (2, 6, "line", true, false),
                (4, 5, "dash", true, true),
            ]
        );
    }

    #[rstest::rstest]
    fn bare_hash_comments_keep_a_marker() {
        let mut scanner = Scanner::new("# a\n#\n#   \nk: v #\n");
        let doc = scanner.next_document().unwrap().unwrap();
        let texts: Vec<&str> = doc.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["a", EMPTY_COMMENT_LINE, EMPTY_COMMENT_LINE, EMPTY_COMMENT_LINE]);
    }

    #[rstest::rstest]
    #[case("a: b]c\n", "b]c")]
    #[case("a: b\n  ,c\n", "b ,c")]
    #[case("a: x,y\n", "x,y")]
    fn flow_indicators_inside_block_plain_scalars(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(events(input)[2], plain(expected));
    }

    #[rstest::rstest]
    fn multiple_documents() {
        let mut scanner = Scanner::new("a\n---\nb\n...\n--- c\n");
        let mut values = Vec::new();
        while let Some(doc) = scanner.next_document() {
            let doc = doc.unwrap();
            values.push(doc.events.len());
        }
        assert_eq!(values, vec![1, 1, 1]);
    }

    #[rstest::rstest]
    fn empty_stream_is_one_empty_document() {
        let mut scanner = Scanner::new("");
        let doc = scanner.next_document().unwrap().unwrap();
        assert!(doc.events.is_empty());
        assert!(scanner.next_document().is_none());
    }

    #[rstest::rstest]
    #[case("a: b: c\n")]
    #[case("a: - b\n")]
    #[case("a:\n  b: c\n d: e\n")]
    #[case("[a, b\n")]
    #[case("\"open\n")]
    #[case("a:\n\tb: c\n")]
    #[case("? a\n: b\n")]
    #[case("a: \"x\" y\n")]
    #[case("a: ]\n")]
    #[case("a: }x\n")]
    #[case("  \n,")]
    #[case("- ,a\n")]
    fn syntax_errors(#[case] input: &str) {
        let mut scanner = Scanner::new(input);
        let result = scanner.next_document().unwrap();
        assert!(result.is_err(), "expected error for {input:?}");
    }
}
