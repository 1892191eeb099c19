use std::collections::HashMap;
use std::rc::Rc;

use ::serde::de::value::BorrowedStrDeserializer;
use ::serde::de::{self, DeserializeSeed, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};
use ::serde::forward_to_deserialize_any;
use base64::Engine;

use crate::arena::{Arena, NodeId};
use crate::constants::{BINARY_TAG, MAX_DEPTH, NULL_TAG};
use crate::node::{binary_value_bytes, Node, NodeKind};
use crate::value::{
    mapping_entries, resolve_target, scalar_value, AliasBudget, Entry, Number, Value,
};
use crate::{Error, Result};

/// Reads a typed value out of the subtree under one node. Aliases are
/// followed; a chain deeper than [`MAX_DEPTH`] is reported instead of
/// recursing forever through a cycle, and the nodes copied through aliases
/// are counted against a budget shared by the whole read.
#[derive(Clone)]
pub(crate) struct NodeDeserializer<'de> {
    arena: &'de Arena,
    id: NodeId,
    strict: bool,
    depth: usize,
    /// Reached through an alias or a merge key.
    aliased: bool,
    budget: Rc<AliasBudget>,
}

impl<'de> NodeDeserializer<'de> {
    pub fn new(arena: &'de Arena, id: NodeId, strict: bool) -> Self {
        Self {
            arena,
            id,
            strict,
            depth: 0,
            aliased: arena[id].is_alias(),
            budget: Rc::new(AliasBudget::new()),
        }
    }

    fn child(&self, id: NodeId) -> Self {
        self.entry_child(id, false)
    }

    fn entry_child(&self, id: NodeId, merged: bool) -> Self {
        Self {
            id,
            depth: self.depth + 1,
            aliased: self.aliased || merged || self.arena[id].is_alias(),
            budget: Rc::clone(&self.budget),
            ..*self
        }
    }

    fn resolve(&self) -> Result<(NodeId, &'de Node)> {
        let source = &self.arena[self.id];
        if self.depth > MAX_DEPTH {
            return Err(Error::deserialize("exceeded max depth, aliases may form a cycle")
                .at(source.line, source.column));
        }
        self.budget
            .visit(self.aliased)
            .map_err(|err| err.at(source.line, source.column))?;
        let mut target = resolve_target(self.arena, self.id)?;
        // A document reads as its content.
        let node = &self.arena[target];
        if let (true, Some(&content)) = (node.is_document(), node.content.first()) {
            target = resolve_target(self.arena, content)?;
        }
        Ok((target, &self.arena[target]))
    }

    fn visit_scalar<V>(node: &'de Node, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match scalar_value(node)? {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(Number::PosInt(u)) => visitor.visit_u64(u),
            Value::Number(Number::NegInt(i)) => visitor.visit_i64(i),
            Value::Number(Number::Float(f)) => visitor.visit_f64(f),
            Value::Binary(bytes) => {
                visitor.visit_string(base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            _ => visitor.visit_borrowed_str(&node.value),
        }
    }

    fn visit_mapping<V>(
        &self,
        id: NodeId,
        fields: Option<&'static [&'static str]>,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let map = MapDeserializer::new(self.clone(), id, fields)?;
        visitor.visit_map(map)
    }

    fn is_null(&self) -> Result<bool> {
        let (_, node) = self.resolve()?;
        Ok(match node.kind() {
            NodeKind::Scalar => node.tag == NULL_TAG,
            NodeKind::Document => node.content.is_empty(),
            _ => false,
        })
    }
}

/// Positions an error at `node` unless a deeper node already did.
fn locate(err: Error, node: &Node) -> Error {
    if err.location.is_some() {
        err
    } else {
        err.at(node.line, node.column)
    }
}

impl<'de> de::Deserializer<'de> for NodeDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let (id, node) = self.resolve()?;
        let result = match node.kind() {
            NodeKind::Scalar => Self::visit_scalar(node, visitor),
            NodeKind::Sequence => visitor.visit_seq(SeqDeserializer::new(self, &node.content)),
            NodeKind::Mapping => self.visit_mapping(id, None, visitor),
            NodeKind::Document => visitor.visit_unit(),
            NodeKind::Alias => Err(Error::invalid_node("alias without a target")),
            NodeKind::Unknown => Err(Error::unknown_node_kind()),
        };
        result.map_err(|err| locate(err, node))
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.is_null()? {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let (_, node) = self.resolve()?;
        if node.is_scalar() && node.tag == BINARY_TAG {
            return visitor
                .visit_byte_buf(binary_value_bytes(&node.value))
                .map_err(|err| locate(err, node));
        }
        self.deserialize_any(visitor)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let (id, node) = self.resolve()?;
        match node.kind() {
            NodeKind::Mapping => self
                .visit_mapping(id, Some(fields), visitor)
                .map_err(|err| locate(err, node)),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let (id, node) = self.resolve()?;
        let result = match node.kind() {
            NodeKind::Scalar => visitor.visit_enum(EnumDeserializer {
                variant: &node.value,
                value: None,
            }),
            NodeKind::Mapping => {
                let entries = mapping_entries(self.arena, id)?;
                match entries.as_slice() {
                    [entry] => {
                        let key = &self.arena[resolve_target(self.arena, entry.key)?];
                        if !key.is_scalar() {
                            return Err(Error::type_mismatch("enum variant must be a scalar")
                                .at(key.line, key.column));
                        }
                        visitor.visit_enum(EnumDeserializer {
                            variant: &key.value,
                            value: Some(self.entry_child(entry.value, entry.merged)),
                        })
                    }
                    _ => Err(Error::type_mismatch(
                        "expected a mapping with a single key naming the variant",
                    )),
                }
            }
            NodeKind::Document => {
                Err(Error::type_mismatch("expected an enum, found an empty document"))
            }
            _ => Err(Error::type_mismatch(format!(
                "expected an enum, found a {}",
                node.kind()
            ))),
        };
        result.map_err(|err| locate(err, node))
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let (_, node) = self.resolve()?;
        if node.is_scalar() {
            return visitor.visit_borrowed_str(&node.value);
        }
        self.deserialize_any(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        unit unit_struct seq tuple tuple_struct map
    }
}

struct SeqDeserializer<'de> {
    parent: NodeDeserializer<'de>,
    items: std::slice::Iter<'de, NodeId>,
}

impl<'de> SeqDeserializer<'de> {
    fn new(parent: NodeDeserializer<'de>, items: &'de [NodeId]) -> Self {
        Self {
            parent,
            items: items.iter(),
        }
    }
}

impl<'de> SeqAccess<'de> for SeqDeserializer<'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        match self.items.next() {
            Some(&item) => seed.deserialize(self.parent.child(item)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

/// Text a scalar key is known by: its value, with nulls spelled `null`.
fn key_text<'de>(arena: &'de Arena, id: NodeId) -> Option<&'de str> {
    let node = &arena[arena.resolve_alias(id)?];
    if !node.is_scalar() {
        return None;
    }
    if node.tag == NULL_TAG {
        return Some("null");
    }
    Some(node.value.as_str())
}

struct MapDeserializer<'de> {
    parent: NodeDeserializer<'de>,
    entries: std::vec::IntoIter<Entry>,
    fields: Option<&'static [&'static str]>,
    value: Option<Entry>,
}

impl<'de> MapDeserializer<'de> {
    /// Applies the duplicate key policy up front: strict mode rejects a
    /// repeated key, loose mode keeps the first position and the last value.
    fn new(
        parent: NodeDeserializer<'de>,
        mapping: NodeId,
        fields: Option<&'static [&'static str]>,
    ) -> Result<Self> {
        let arena = parent.arena;
        let mut kept: Vec<Entry> = Vec::new();
        let mut positions: HashMap<&'de str, usize> = HashMap::new();
        for entry in mapping_entries(arena, mapping)? {
            let Some(text) = key_text(arena, entry.key) else {
                kept.push(entry);
                continue;
            };
            match positions.get(text) {
                Some(_) if entry.merged => {}
                Some(&index) => {
                    if parent.strict {
                        let key = &arena[entry.key];
                        return Err(Error::duplicate_key(text).at(key.line, key.column));
                    }
                    kept[index].value = entry.value;
                }
                None => {
                    positions.insert(text, kept.len());
                    kept.push(entry);
                }
            }
        }
        Ok(Self {
            parent,
            entries: kept.into_iter(),
            fields,
            value: None,
        })
    }
}

impl<'de> MapAccess<'de> for MapDeserializer<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        let Some(entry) = self.entries.next() else {
            return Ok(None);
        };
        if let (true, Some(fields), Some(text)) = (
            self.parent.strict,
            self.fields,
            key_text(self.parent.arena, entry.key),
        ) {
            if !fields.iter().any(|field| *field == text) {
                let key = &self.parent.arena[entry.key];
                return Err(Error::unknown_field(text).at(key.line, key.column));
            }
        }
        self.value = Some(entry);
        seed.deserialize(KeyDeserializer(
            self.parent.entry_child(entry.key, entry.merged),
        ))
        .map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(entry) => seed.deserialize(self.parent.entry_child(entry.value, entry.merged)),
            None => Err(Error::deserialize("value requested before its key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

/// Mapping keys read as strings take their scalar text, so `1: x` fills a
/// `HashMap<String, _>` the way a JSON object would.
struct KeyDeserializer<'de>(NodeDeserializer<'de>);

impl<'de> KeyDeserializer<'de> {
    fn visit_text<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match key_text(self.0.arena, self.0.id) {
            Some(text) => visitor.visit_borrowed_str(text),
            None => {
                let node = &self.0.arena[self.0.id];
                Err(Error::type_mismatch(format!(
                    "a {} key cannot be read as a string",
                    node.kind()
                ))
                .at(node.line, node.column))
            }
        }
    }
}

impl<'de> de::Deserializer<'de> for KeyDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.0.deserialize_any(visitor)
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.visit_text(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.visit_text(visitor)
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.visit_text(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.0.deserialize_option(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.0.deserialize_enum(name, variants, visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct ignored_any
    }
}

struct EnumDeserializer<'de> {
    variant: &'de str,
    value: Option<NodeDeserializer<'de>>,
}

impl<'de> EnumAccess<'de> for EnumDeserializer<'de> {
    type Error = Error;
    type Variant = VariantDeserializer<'de>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: DeserializeSeed<'de>,
    {
        let name: BorrowedStrDeserializer<'de, Error> = BorrowedStrDeserializer::new(self.variant);
        let variant = seed.deserialize(name)?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer<'de> {
    value: Option<NodeDeserializer<'de>>,
}

impl<'de> VariantAccess<'de> for VariantDeserializer<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            None => Ok(()),
            Some(value) => {
                if value.is_null()? {
                    Ok(())
                } else {
                    Err(Error::type_mismatch("expected a unit variant"))
                }
            }
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(value),
            None => Err(Error::type_mismatch("expected a newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(value) => de::Deserializer::deserialize_seq(value, visitor),
            None => Err(Error::type_mismatch("expected a tuple variant")),
        }
    }

    fn struct_variant<V>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(value) => de::Deserializer::deserialize_struct(value, "", fields, visitor),
            None => Err(Error::type_mismatch("expected a struct variant")),
        }
    }
}
