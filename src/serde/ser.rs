use ::serde::ser::{self, Serialize};

use crate::arena::{Arena, NodeId};
use crate::constants::{BOOL_TAG, FLOAT_TAG, INT_TAG};
use crate::node::Node;
use crate::num::number::{format_f64, format_i64, format_u64};
use crate::{Error, Result};

/// Builds nodes for a serialized value inside an arena. Every node gets the
/// canonical style the encoder would pick for it.
pub(crate) struct NodeSerializer<'a> {
    arena: &'a mut Arena,
}

impl<'a> NodeSerializer<'a> {
    pub fn new(arena: &'a mut Arena) -> Self {
        Self { arena }
    }

    fn alloc(self, node: Node) -> Result<NodeId> {
        Ok(self.arena.alloc(node))
    }
}

impl<'a> ser::Serializer for NodeSerializer<'a> {
    type Ok = NodeId;
    type Error = Error;

    type SerializeSeq = SerializeSequence<'a>;
    type SerializeTuple = SerializeSequence<'a>;
    type SerializeTupleStruct = SerializeSequence<'a>;
    type SerializeTupleVariant = SerializeSequence<'a>;
    type SerializeMap = SerializeMapping<'a>;
    type SerializeStruct = SerializeMapping<'a>;
    type SerializeStructVariant = SerializeMapping<'a>;

    fn serialize_bool(self, v: bool) -> Result<NodeId> {
        self.alloc(Node::scalar(BOOL_TAG, if v { "true" } else { "false" }))
    }

    fn serialize_i8(self, v: i8) -> Result<NodeId> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i16(self, v: i16) -> Result<NodeId> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i32(self, v: i32) -> Result<NodeId> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i64(self, v: i64) -> Result<NodeId> {
        self.alloc(Node::scalar(INT_TAG, format_i64(v)))
    }

    fn serialize_i128(self, v: i128) -> Result<NodeId> {
        if let Ok(v) = i64::try_from(v) {
            self.serialize_i64(v)
        } else if let Ok(v) = u64::try_from(v) {
            self.serialize_u64(v)
        } else {
            Err(Error::serialize("i128 value out of range"))
        }
    }

    fn serialize_u8(self, v: u8) -> Result<NodeId> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u16(self, v: u16) -> Result<NodeId> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u32(self, v: u32) -> Result<NodeId> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u64(self, v: u64) -> Result<NodeId> {
        self.alloc(Node::scalar(INT_TAG, format_u64(v)))
    }

    fn serialize_u128(self, v: u128) -> Result<NodeId> {
        match u64::try_from(v) {
            Ok(v) => self.serialize_u64(v),
            Err(_) => Err(Error::serialize("u128 value out of range")),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<NodeId> {
        self.serialize_f64(v as f64)
    }

    fn serialize_f64(self, v: f64) -> Result<NodeId> {
        self.alloc(Node::scalar(FLOAT_TAG, format_f64(v)))
    }

    fn serialize_char(self, v: char) -> Result<NodeId> {
        self.alloc(Node::serialized_string(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<NodeId> {
        self.alloc(Node::serialized_string(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<NodeId> {
        self.alloc(Node::from_bytes(v))
    }

    fn serialize_none(self) -> Result<NodeId> {
        self.alloc(Node::null())
    }

    fn serialize_some<T>(self, value: &T) -> Result<NodeId>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<NodeId> {
        self.alloc(Node::null())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<NodeId> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<NodeId> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<NodeId>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<NodeId>
    where
        T: ?Sized + Serialize,
    {
        let inner = value.serialize(NodeSerializer::new(self.arena))?;
        Ok(wrap_variant(self.arena, variant, inner))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(SerializeSequence::new(self.arena, len, None))
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Ok(SerializeSequence::new(self.arena, Some(len), Some(variant)))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(SerializeMapping::new(self.arena, len, None))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Ok(SerializeMapping::new(self.arena, Some(len), Some(variant)))
    }
}

/// `{variant: inner}`, the externally tagged enum form.
fn wrap_variant(arena: &mut Arena, variant: &str, inner: NodeId) -> NodeId {
    let key = arena.alloc(Node::serialized_string(variant));
    let mut mapping = Node::mapping();
    mapping.content = vec![key, inner];
    arena.alloc(mapping)
}

pub(crate) struct SerializeSequence<'a> {
    arena: &'a mut Arena,
    items: Vec<NodeId>,
    variant: Option<&'static str>,
}

impl<'a> SerializeSequence<'a> {
    fn new(arena: &'a mut Arena, len: Option<usize>, variant: Option<&'static str>) -> Self {
        Self {
            arena,
            items: Vec::with_capacity(len.unwrap_or(0)),
            variant,
        }
    }

    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let item = value.serialize(NodeSerializer::new(self.arena))?;
        self.items.push(item);
        Ok(())
    }

    fn finish(self) -> Result<NodeId> {
        let mut sequence = Node::sequence();
        sequence.content = self.items;
        let id = self.arena.alloc(sequence);
        Ok(match self.variant {
            Some(variant) => wrap_variant(self.arena, variant, id),
            None => id,
        })
    }
}

impl ser::SerializeSeq for SerializeSequence<'_> {
    type Ok = NodeId;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<NodeId> {
        self.finish()
    }
}

impl ser::SerializeTuple for SerializeSequence<'_> {
    type Ok = NodeId;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<NodeId> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for SerializeSequence<'_> {
    type Ok = NodeId;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<NodeId> {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for SerializeSequence<'_> {
    type Ok = NodeId;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<NodeId> {
        self.finish()
    }
}

pub(crate) struct SerializeMapping<'a> {
    arena: &'a mut Arena,
    content: Vec<NodeId>,
    pending_key: Option<NodeId>,
    variant: Option<&'static str>,
}

impl<'a> SerializeMapping<'a> {
    fn new(arena: &'a mut Arena, len: Option<usize>, variant: Option<&'static str>) -> Self {
        Self {
            arena,
            content: Vec::with_capacity(len.unwrap_or(0) * 2),
            pending_key: None,
            variant,
        }
    }

    fn field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self.arena.alloc(Node::serialized_string(key));
        let value = value.serialize(NodeSerializer::new(self.arena))?;
        self.content.extend([key, value]);
        Ok(())
    }

    fn finish(self) -> Result<NodeId> {
        if self.pending_key.is_some() {
            return Err(Error::serialize("mapping key without a value"));
        }
        let mut mapping = Node::mapping();
        mapping.content = self.content;
        let id = self.arena.alloc(mapping);
        Ok(match self.variant {
            Some(variant) => wrap_variant(self.arena, variant, id),
            None => id,
        })
    }
}

impl ser::SerializeMap for SerializeMapping<'_> {
    type Ok = NodeId;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = key.serialize(NodeSerializer::new(self.arena))?;
        if !self.arena[key].is_scalar() {
            return Err(Error::serialize("mapping keys must be scalars"));
        }
        self.pending_key = Some(key);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| Error::serialize("mapping value without a key"))?;
        let value = value.serialize(NodeSerializer::new(self.arena))?;
        self.content.extend([key, value]);
        Ok(())
    }

    fn end(self) -> Result<NodeId> {
        self.finish()
    }
}

impl ser::SerializeStruct for SerializeMapping<'_> {
    type Ok = NodeId;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<NodeId> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for SerializeMapping<'_> {
    type Ok = NodeId;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<NodeId> {
        self.finish()
    }
}
