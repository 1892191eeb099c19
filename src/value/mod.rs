//! Generic decoded YAML values.
//!
//! [`Value`] is what a node tree means once styles, comments and aliases are
//! gone: any scalar may be a mapping key and mappings keep their order. The
//! JSON view narrows it further, see [`Value::to_json`].

mod budget;

use std::collections::HashMap;
use std::fmt;

use base64::Engine;
use serde_json::{Map, Value as JsonValue};

use crate::arena::{Arena, NodeId, Tree};
use crate::constants::{
    BINARY_TAG, BOOL_TAG, FLOAT_TAG, INT_TAG, MAX_DEPTH, MERGE_TAG, NULL_TAG,
};
use crate::node::{binary_value_bytes, Node, NodeKind};
use crate::num::number::{
    format_f64, format_i64, format_u64, is_int_literal, parse_float, parse_int, whole_f64,
    ParsedInt,
};
use crate::text::resolve::parse_bool;
use crate::{Error, Result};

pub(crate) use budget::AliasBudget;

/// Ordered key/value pairs of a mapping.
pub type Mapping = Vec<(Value, Value)>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    PosInt(u64),
    NegInt(i64),
    Float(f64),
}

impl Number {
    pub fn is_i64(&self) -> bool {
        match self {
            Number::NegInt(_) => true,
            Number::PosInt(u) => *u <= i64::MAX as u64,
            Number::Float(_) => false,
        }
    }

    pub fn is_f64(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::PosInt(u) => i64::try_from(*u).ok(),
            Number::NegInt(i) => Some(*i),
            Number::Float(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Number::PosInt(u) => Some(*u),
            Number::NegInt(_) | Number::Float(_) => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Number::PosInt(u) => *u as f64,
            Number::NegInt(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }

    fn from_json(number: &serde_json::Number) -> Self {
        if let Some(u) = number.as_u64() {
            Number::PosInt(u)
        } else if let Some(i) = number.as_i64() {
            Number::from(i)
        } else {
            Number::Float(number.as_f64().unwrap_or(f64::NAN))
        }
    }

    fn to_json(self) -> Result<serde_json::Number> {
        match self {
            Number::PosInt(u) => Ok(serde_json::Number::from(u)),
            Number::NegInt(i) => Ok(serde_json::Number::from(i)),
            Number::Float(f) => serde_json::Number::from_f64(f).ok_or_else(|| {
                Error::json(format!("{} cannot be represented in JSON", format_f64(f)))
            }),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::PosInt(u) => f.write_str(&format_u64(*u)),
            Number::NegInt(i) => f.write_str(&format_i64(*i)),
            Number::Float(fl) => f.write_str(&format_f64(*fl)),
        }
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        if n >= 0 {
            Number::PosInt(n as u64)
        } else {
            Number::NegInt(n)
        }
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::from(n as i64)
    }
}

impl From<u64> for Number {
    fn from(n: u64) -> Self {
        Number::PosInt(n)
    }
}

impl From<u32> for Number {
    fn from(n: u32) -> Self {
        Number::PosInt(n as u64)
    }
}

impl From<f64> for Number {
    fn from(n: f64) -> Self {
        Number::Float(n)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Binary(Vec<u8>),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl Value {
    /// Converts the content of a decoded document. A document without
    /// content is [`Value::Null`].
    pub fn from_tree(tree: &Tree, strict: bool) -> Result<Value> {
        match tree.content_root() {
            Some(root) => Value::from_node(&tree.arena, root, strict),
            None => Ok(Value::Null),
        }
    }

    /// Converts the subtree under `id`, following aliases and merge keys.
    /// With `strict`, a key repeated in one mapping is an error; otherwise
    /// its last value wins.
    pub fn from_node(arena: &Arena, id: NodeId, strict: bool) -> Result<Value> {
        let converter = Converter {
            arena,
            strict,
            budget: AliasBudget::new(),
        };
        converter.convert(id, 0, false)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Looks up a string key of a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    /// The JSON view of this value. Mapping keys are stringified from their
    /// scalar form (`1` becomes `"1"`, `true` becomes `"true"`), byte
    /// strings become base64 and non-finite floats are rejected. Keys that
    /// stringify alike keep the first position and the last value.
    pub fn to_json(&self) -> Result<JsonValue> {
        self.json(false)
    }

    /// Like [`Value::to_json`], but keys that stringify alike, such as `1`
    /// and `"1"`, are a [`DuplicateKey`](crate::error::ErrorKind::DuplicateKey)
    /// error.
    pub fn to_json_strict(&self) -> Result<JsonValue> {
        self.json(true)
    }

    fn json(&self, strict: bool) -> Result<JsonValue> {
        Ok(match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => JsonValue::Number(n.to_json()?),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Binary(bytes) => JsonValue::String(encode_base64(bytes)),
            Value::Sequence(items) => JsonValue::Array(
                items
                    .iter()
                    .map(|item| item.json(strict))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Mapping(pairs) => {
                let mut map = Map::with_capacity(pairs.len());
                for (key, value) in pairs {
                    let key = key.key_string()?;
                    let value = value.json(strict)?;
                    if strict && map.contains_key(&key) {
                        return Err(Error::duplicate_key(&key));
                    }
                    map.insert(key, value);
                }
                JsonValue::Object(map)
            }
        })
    }

    /// Builds a document with canonical styles for this value.
    pub fn to_tree(&self) -> Tree {
        let mut arena = Arena::new();
        let root = arena.alloc(Node::document());
        let content = self.to_node(&mut arena);
        arena[root].content.push(content);
        Tree::new(arena, root)
    }

    /// Adds the nodes for this value to `arena` and returns the top one.
    pub fn to_node(&self, arena: &mut Arena) -> NodeId {
        let node = match self {
            Value::Null => Node::null(),
            Value::Bool(b) => Node::scalar(BOOL_TAG, if *b { "true" } else { "false" }),
            Value::Number(Number::Float(f)) => Node::scalar(FLOAT_TAG, format_f64(*f)),
            Value::Number(n) => Node::scalar(INT_TAG, n.to_string()),
            Value::String(s) => Node::serialized_string(s.as_str()),
            Value::Binary(bytes) => Node::from_bytes(bytes),
            Value::Sequence(items) => {
                let id = arena.alloc(Node::sequence());
                for item in items {
                    let child = item.to_node(arena);
                    arena[id].content.push(child);
                }
                return id;
            }
            Value::Mapping(pairs) => {
                let id = arena.alloc(Node::mapping());
                for (key, value) in pairs {
                    let key = key.to_node(arena);
                    let value = value.to_node(arena);
                    arena[id].content.extend([key, value]);
                }
                return id;
            }
        };
        arena.alloc(node)
    }

    fn key_string(&self) -> Result<String> {
        match self {
            Value::Null => Ok("null".to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Number(n) => Ok(n.to_string()),
            Value::String(s) => Ok(s.clone()),
            Value::Binary(bytes) => Ok(encode_base64(bytes)),
            Value::Sequence(_) | Value::Mapping(_) => Err(Error::json(format!(
                "a {} cannot be used as a JSON object key",
                self.type_name()
            ))),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => Value::Number(Number::from_json(&n)),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::Sequence(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (Value::String(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(Number::Float(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Converts a JSON object into an ordered YAML mapping. Floats holding a
/// whole number become integers again, at every depth.
pub fn json_object_to_yaml_object(object: &Map<String, JsonValue>) -> Value {
    Value::Mapping(
        object
            .iter()
            .map(|(k, v)| (Value::String(k.clone()), json_to_yaml_value(v)))
            .collect(),
    )
}

fn json_to_yaml_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) => match whole_f64(f) {
                Some(whole) => Value::from(whole),
                None => Value::Number(Number::Float(f)),
            },
            None => Value::Null,
        },
        JsonValue::Array(items) => Value::Sequence(items.iter().map(json_to_yaml_value).collect()),
        JsonValue::Object(map) => json_object_to_yaml_object(map),
        other => Value::from(other.clone()),
    }
}

fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// One effective entry of a mapping once merge keys are expanded.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Entry {
    pub key: NodeId,
    pub value: NodeId,
    /// Pulled in through `<<`; loses against any explicit key.
    pub merged: bool,
}

pub(crate) fn is_merge_key(node: &Node) -> bool {
    node.is_scalar() && node.tag == MERGE_TAG
}

/// The entries of a mapping: explicit pairs first, in order, then the pairs
/// brought in by merge keys. Earlier merge sources come before later ones.
pub(crate) fn mapping_entries(arena: &Arena, mapping: NodeId) -> Result<Vec<Entry>> {
    entries_at(arena, mapping, 0)
}

fn entries_at(arena: &Arena, mapping: NodeId, depth: usize) -> Result<Vec<Entry>> {
    let mut explicit = Vec::with_capacity(arena[mapping].content.len() / 2);
    let mut merged = Vec::new();
    for (key, value) in arena.pairs(mapping) {
        if is_merge_key(&arena[key]) {
            merge_source(arena, value, &mut merged, depth + 1)?;
        } else {
            explicit.push(Entry {
                key,
                value,
                merged: false,
            });
        }
    }
    explicit.append(&mut merged);
    Ok(explicit)
}

fn merge_source(arena: &Arena, id: NodeId, out: &mut Vec<Entry>, depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::deserialize("merge keys nest too deeply"));
    }
    let target = resolve_target(arena, id)?;
    let node = &arena[target];
    match node.kind() {
        NodeKind::Mapping => {
            for entry in entries_at(arena, target, depth)? {
                out.push(Entry {
                    merged: true,
                    ..entry
                });
            }
            Ok(())
        }
        NodeKind::Sequence => {
            for &item in &node.content {
                let item = resolve_target(arena, item)?;
                if !arena[item].is_mapping() {
                    return Err(merge_error(&arena[item]));
                }
                merge_source(arena, item, out, depth + 1)?;
            }
            Ok(())
        }
        _ => Err(merge_error(node)),
    }
}

fn merge_error(node: &Node) -> Error {
    Error::type_mismatch("a merge key needs a mapping or a sequence of mappings")
        .at(node.line, node.column)
}

pub(crate) fn resolve_target(arena: &Arena, id: NodeId) -> Result<NodeId> {
    arena.resolve_alias(id).ok_or_else(|| {
        let node = &arena[id];
        Error::invalid_node(format!("alias *{} has no target", node.value)).at(node.line, node.column)
    })
}

/// Resolved value of a scalar node, per its tag.
pub(crate) fn scalar_value(node: &Node) -> Result<Value> {
    let text = node.value.as_str();
    let mismatch = || {
        Error::type_mismatch(format!("cannot read {text:?} as {}", node.tag)).at(node.line, node.column)
    };
    Ok(match node.tag.as_str() {
        NULL_TAG => Value::Null,
        BOOL_TAG => Value::Bool(parse_bool(text).ok_or_else(mismatch)?),
        INT_TAG => Value::Number(int_number(text).ok_or_else(mismatch)?),
        FLOAT_TAG => Value::Number(Number::Float(
            parse_float(text)
                .or_else(|| int_number(text).map(|n| n.as_f64()))
                .ok_or_else(mismatch)?,
        )),
        BINARY_TAG => Value::Binary(binary_value_bytes(text)),
        _ => Value::String(node.value.clone()),
    })
}

/// Integers wider than 64 bits fall back to a float.
pub(crate) fn int_number(text: &str) -> Option<Number> {
    match parse_int(text) {
        Some(ParsedInt::Signed(i)) => Some(Number::from(i)),
        Some(ParsedInt::Unsigned(u)) => Some(Number::PosInt(u)),
        None if is_int_literal(text) => text.parse::<f64>().ok().map(Number::Float),
        None => None,
    }
}

struct Converter<'a> {
    arena: &'a Arena,
    strict: bool,
    budget: AliasBudget,
}

impl Converter<'_> {
    /// `aliased` marks nodes reached through an alias or a merge key.
    fn convert(&self, id: NodeId, depth: usize, aliased: bool) -> Result<Value> {
        let source = &self.arena[id];
        if depth > MAX_DEPTH {
            return Err(Error::deserialize("exceeded max depth, aliases may form a cycle")
                .at(source.line, source.column));
        }
        let aliased = aliased || source.is_alias();
        self.budget
            .visit(aliased)
            .map_err(|err| err.at(source.line, source.column))?;
        let target = resolve_target(self.arena, id)?;
        let node = &self.arena[target];
        match node.kind() {
            NodeKind::Scalar => scalar_value(node),
            NodeKind::Sequence => node
                .content
                .iter()
                .map(|&item| self.convert(item, depth + 1, aliased))
                .collect::<Result<Vec<_>>>()
                .map(Value::Sequence),
            NodeKind::Mapping => self.mapping(target, depth, aliased),
            NodeKind::Document => match node.content.first() {
                Some(&content) => self.convert(content, depth + 1, aliased),
                None => Ok(Value::Null),
            },
            NodeKind::Alias => Err(Error::invalid_node("alias without a target")),
            NodeKind::Unknown => Err(Error::unknown_node_kind().at(node.line, node.column)),
        }
    }

    fn mapping(&self, id: NodeId, depth: usize, aliased: bool) -> Result<Value> {
        let entries = mapping_entries(self.arena, id)?;
        let mut pairs: Mapping = Vec::with_capacity(entries.len());
        let mut index: HashMap<KeyForm, usize> = HashMap::with_capacity(entries.len());
        for entry in entries {
            let copied = aliased || entry.merged;
            let key = self.convert(entry.key, depth + 1, copied)?;
            let form = KeyForm::of(&key);
            let position = match &form {
                Some(form) => index.get(form).copied(),
                None => pairs.iter().position(|(k, _)| *k == key),
            };
            match position {
                Some(_) if entry.merged => {}
                Some(_) if self.strict => {
                    let node = &self.arena[entry.key];
                    return Err(Error::duplicate_key(&key_label(&key)).at(node.line, node.column));
                }
                Some(at) => pairs[at].1 = self.convert(entry.value, depth + 1, copied)?,
                None => {
                    let value = self.convert(entry.value, depth + 1, copied)?;
                    if let Some(form) = form {
                        index.insert(form, pairs.len());
                    }
                    pairs.push((key, value));
                }
            }
        }
        Ok(Value::Mapping(pairs))
    }
}

/// Hashable identity of a scalar key. Collection keys have none and are
/// compared one by one.
#[derive(Debug, PartialEq, Eq, Hash)]
enum KeyForm {
    Null,
    Bool(bool),
    PosInt(u64),
    NegInt(i64),
    Float(u64),
    String(String),
    Binary(Vec<u8>),
}

impl KeyForm {
    fn of(key: &Value) -> Option<Self> {
        Some(match key {
            Value::Null => KeyForm::Null,
            Value::Bool(b) => KeyForm::Bool(*b),
            Value::Number(Number::PosInt(u)) => KeyForm::PosInt(*u),
            Value::Number(Number::NegInt(i)) => KeyForm::NegInt(*i),
            // -0.0 == 0.0
            Value::Number(Number::Float(f)) => KeyForm::Float((f + 0.0).to_bits()),
            Value::String(s) => KeyForm::String(s.clone()),
            Value::Binary(bytes) => KeyForm::Binary(bytes.clone()),
            Value::Sequence(_) | Value::Mapping(_) => return None,
        })
    }
}

fn key_label(key: &Value) -> String {
    key.key_string().unwrap_or_else(|_| key.type_name().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::parse;
    use crate::error::ErrorKind;

    fn value_of(input: &str) -> Value {
        Value::from_tree(&parse(input).unwrap(), false).unwrap()
    }

    #[rstest::rstest]
    #[case("1", Value::from(1i64))]
    #[case("-3", Value::Number(Number::NegInt(-3)))]
    #[case("0x1F", Value::from(31i64))]
    #[case("18446744073709551615", Value::Number(Number::PosInt(u64::MAX)))]
    #[case("1.5", Value::from(1.5))]
    #[case("!!float 2", Value::from(2.0))]
    #[case("true", Value::Bool(true))]
    #[case("~", Value::Null)]
    #[case("'1'", Value::from("1"))]
    #[case("2001-12-14", Value::from("2001-12-14"))]
    #[case("", Value::Null)]
    fn scalars_resolve_by_tag(#[case] input: &str, #[case] expected: Value) {
        assert_eq!(value_of(input), expected);
    }

    #[rstest::rstest]
    fn huge_integers_fall_back_to_float() {
        let value = value_of("123456789012345678901234567890");
        assert!(matches!(value, Value::Number(Number::Float(_))));
    }

    #[rstest::rstest]
    fn wrongly_tagged_scalar_is_a_type_mismatch() {
        let err = Value::from_tree(&parse("a: !!int abc\n").unwrap(), false).unwrap_err();
        assert!(err.is(ErrorKind::TypeMismatch));
        assert!(err.location.is_some());
    }

    #[rstest::rstest]
    fn duplicate_keys_follow_the_policy() {
        let tree = parse("{a: 1, a: 2}").unwrap();
        let loose = Value::from_tree(&tree, false).unwrap();
        assert_eq!(loose.get("a"), Some(&Value::from(2i64)));
        assert_eq!(loose.as_mapping().unwrap().len(), 1);
        let err = Value::from_tree(&tree, true).unwrap_err();
        assert!(err.is(ErrorKind::DuplicateKey));
    }

    #[rstest::rstest]
    fn large_mappings_keep_first_position_and_last_value() {
        let mut input: String = (0..2000).map(|i| format!("k{i}: {i}\n")).collect();
        input.push_str("k0: last\n");
        let value = value_of(&input);
        let pairs = value.as_mapping().unwrap();
        assert_eq!(pairs.len(), 2000);
        assert_eq!(pairs[0], (Value::from("k0"), Value::from("last")));
        assert_eq!(pairs[1999].0, Value::from("k1999"));
    }

    #[rstest::rstest]
    fn typed_keys_stay_distinct_until_stringified() {
        let value = value_of("1: int\n'1': str\n1.0: float\n");
        assert_eq!(value.as_mapping().unwrap().len(), 3);
        let json = value.to_json().unwrap();
        assert_eq!(json, serde_json::json!({"1": "str", "1.0": "float"}));
        let err = value.to_json_strict().unwrap_err();
        assert!(err.is(ErrorKind::DuplicateKey));
    }

    #[rstest::rstest]
    fn aliases_expand_to_copies() {
        let value = value_of("a: &x [1, 2]\nb: *x\n");
        assert_eq!(value.get("a"), value.get("b"));
    }

    #[rstest::rstest]
    fn merge_keys_fill_missing_entries() {
        let value = value_of(
            "base: &base {a: 1, b: 2}\nother: &other {c: 3}\nchild:\n  <<: [*base, *other]\n  b: 9\n",
        );
        let child = value.get("child").unwrap();
        assert_eq!(child.get("a"), Some(&Value::from(1i64)));
        assert_eq!(child.get("b"), Some(&Value::from(9i64)));
        assert_eq!(child.get("c"), Some(&Value::from(3i64)));
    }

    #[rstest::rstest]
    fn merge_of_a_scalar_is_rejected() {
        let err = Value::from_tree(&parse("a:\n  <<: 1\n").unwrap(), false).unwrap_err();
        assert!(err.is(ErrorKind::TypeMismatch));
    }

    #[rstest::rstest]
    fn cyclic_alias_is_an_error() {
        let err = Value::from_tree(&parse("&a [*a]").unwrap(), false).unwrap_err();
        assert!(err.is(ErrorKind::Deserialize));
    }

    #[rstest::rstest]
    fn json_view_stringifies_keys() {
        let value = value_of("1: one\ntrue: yes\n~: nothing\n1.5: f\n");
        let json = value.to_json().unwrap();
        assert_eq!(
            json,
            serde_json::json!({"1": "one", "true": "yes", "null": "nothing", "1.5": "f"})
        );
    }

    #[rstest::rstest]
    fn json_view_rejects_collection_keys_and_nan() {
        let key = Value::Mapping(vec![(Value::Sequence(vec![]), Value::Null)]);
        assert!(key.to_json().unwrap_err().is(ErrorKind::Json));
        assert!(value_of(".nan").to_json().unwrap_err().is(ErrorKind::Json));
    }

    #[rstest::rstest]
    fn binary_becomes_base64_in_json() {
        let json = value_of("!!binary gIGC").to_json().unwrap();
        assert_eq!(json, serde_json::json!("gIGC"));
    }

    #[rstest::rstest]
    fn whole_floats_fold_back_to_integers() {
        let object = serde_json::json!({"b": 1.0, "a": [2.5, -3.0], "c": {"d": 4.0}});
        let value = json_object_to_yaml_object(object.as_object().unwrap());
        let keys: Vec<_> = value
            .as_mapping()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str().unwrap())
            .collect();
        assert_eq!(keys, ["b", "a", "c"]);
        assert_eq!(value.get("b"), Some(&Value::from(1i64)));
        assert_eq!(
            value.get("a"),
            Some(&Value::Sequence(vec![Value::from(2.5), Value::from(-3i64)]))
        );
        assert_eq!(value.get("c").unwrap().get("d"), Some(&Value::from(4i64)));
    }

    #[rstest::rstest]
    fn value_tree_encodes_canonically() {
        let value = Value::from(serde_json::json!({"name": "x", "n": 1, "tags": ["a", "123"]}));
        let out = crate::encode::encode(&value.to_tree()).unwrap();
        assert_eq!(out, "name: x\nn: 1\ntags:\n  - a\n  - \"123\"\n");
    }
}
