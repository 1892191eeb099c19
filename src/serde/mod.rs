//! Typed values in and out of node trees.

mod de;
mod ser;

use std::fmt;

use ::serde::de::{Deserialize, DeserializeOwned};
use ::serde::Serialize;

use crate::arena::{Arena, NodeId, Tree};
use crate::node::Node;
use crate::{Error, Result};

pub(crate) use de::NodeDeserializer;
pub(crate) use ser::NodeSerializer;

impl ::serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::deserialize(msg.to_string())
    }

    fn invalid_type(unexp: ::serde::de::Unexpected<'_>, exp: &dyn ::serde::de::Expected) -> Self {
        Error::type_mismatch(format!("invalid type: {unexp}, expected {exp}"))
    }

    fn unknown_field(field: &str, _expected: &'static [&'static str]) -> Self {
        Error::unknown_field(field)
    }
}

impl ::serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::serialize(msg.to_string())
    }
}

impl Tree {
    /// Builds a document holding `value`.
    pub fn from_serialize<T>(value: &T) -> Result<Tree>
    where
        T: ?Sized + Serialize,
    {
        let mut arena = Arena::new();
        let root = arena.alloc(Node::document());
        let content = value.serialize(NodeSerializer::new(&mut arena))?;
        arena[root].content.push(content);
        Ok(Tree::new(arena, root))
    }

    /// Adds the nodes for `value` to this tree and returns the top one, ready
    /// to be linked under an existing collection.
    pub fn encode_value<T>(&mut self, value: &T) -> Result<NodeId>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(NodeSerializer::new(&mut self.arena))
    }

    /// Reads the whole document as `T`. Duplicate keys resolve to their last
    /// value and unknown struct fields are ignored.
    pub fn decode_into<T: DeserializeOwned>(&self) -> Result<T> {
        self.decode_node(self.root, false)
    }

    /// Reads the subtree under `id` as `T`. With `strict`, duplicate mapping
    /// keys and mapping keys that name no field of a target struct are
    /// errors.
    pub fn decode_node<'de, T: Deserialize<'de>>(&'de self, id: NodeId, strict: bool) -> Result<T> {
        if self.arena.get(id).is_none() {
            return Err(Error::invalid_node("node is not part of this tree"));
        }
        T::deserialize(NodeDeserializer::new(&self.arena, id, strict))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use ::serde::{Deserialize, Serialize};

    use crate::arena::Tree;
    use crate::decode::parse;
    use crate::encode::encode;
    use crate::error::ErrorKind;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Config {
        name: String,
        replicas: u32,
        #[serde(default)]
        labels: BTreeMap<String, String>,
        ratio: Option<f64>,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Shape {
        Point,
        Circle { radius: f64 },
        Pair(i32, i32),
    }

    #[rstest::rstest]
    fn decodes_a_struct() {
        let tree = parse("name: web\nreplicas: 3\nlabels:\n  app: web\n  1: one\nratio: ~\n").unwrap();
        let config: Config = tree.decode_into().unwrap();
        assert_eq!(config.name, "web");
        assert_eq!(config.replicas, 3);
        assert_eq!(config.labels.get("1").map(String::as_str), Some("one"));
        assert_eq!(config.ratio, None);
    }

    #[rstest::rstest]
    fn string_into_number_is_a_type_mismatch() {
        let tree = parse("name: web\nreplicas: '3'\n").unwrap();
        let err = tree.decode_into::<Config>().unwrap_err();
        assert!(err.is(ErrorKind::TypeMismatch));
        let location = err.location.unwrap();
        assert_eq!((location.line, location.column), (2, 11));
    }

    #[rstest::rstest]
    fn strict_decoding_rejects_unknown_fields() {
        let tree = parse("name: web\nreplicas: 1\nextra: true\n").unwrap();
        assert!(tree.decode_into::<Config>().is_ok());
        let root = tree.root;
        let err = tree.decode_node::<Config>(root, true).unwrap_err();
        assert!(err.is(ErrorKind::UnknownField));
    }

    #[rstest::rstest]
    fn duplicate_keys_follow_the_policy() {
        let tree = parse("name: a\nname: b\nreplicas: 1\n").unwrap();
        let config: Config = tree.decode_into().unwrap();
        assert_eq!(config.name, "b");
        let err = tree.decode_node::<Config>(tree.root, true).unwrap_err();
        assert!(err.is(ErrorKind::DuplicateKey));
    }

    #[rstest::rstest]
    fn aliases_and_merges_are_followed() {
        let tree = parse("base: &b {name: x, replicas: 2}\nitem:\n  <<: *b\n  name: y\n").unwrap();
        let map = tree.content_root().unwrap();
        let item = tree.get_key(map, "item").unwrap();
        let config: Config = tree.decode_node(item, true).unwrap();
        assert_eq!(config.name, "y");
        assert_eq!(config.replicas, 2);
    }

    #[rstest::rstest]
    fn cyclic_aliases_stop_at_max_depth() {
        let tree = parse("&a [*a]").unwrap();
        let err = tree.decode_into::<serde_json::Value>().unwrap_err();
        assert!(err.is(ErrorKind::Deserialize));
    }

    #[rstest::rstest]
    fn nested_alias_expansion_is_refused() {
        let mut input = String::from("a0: &a0 [x, x, x, x, x, x, x, x, x, x]\n");
        for level in 1..9 {
            let items = vec![format!("*a{}", level - 1); 10].join(", ");
            input.push_str(&format!("a{level}: &a{level} [{items}]\n"));
        }
        let tree = parse(&input).unwrap();
        let err = tree.decode_into::<serde_json::Value>().unwrap_err();
        assert!(err.is(ErrorKind::ExcessiveAliasing));
        let err = tree
            .decode_into::<BTreeMap<String, Vec<serde_json::Value>>>()
            .unwrap_err();
        assert!(err.is(ErrorKind::ExcessiveAliasing));
    }

    #[rstest::rstest]
    #[case("point", Shape::Point)]
    #[case("circle: {radius: 1.5}", Shape::Circle { radius: 1.5 })]
    #[case("pair: [1, -2]", Shape::Pair(1, -2))]
    fn decodes_enums(#[case] input: &str, #[case] expected: Shape) {
        let shape: Shape = parse(input).unwrap().decode_into().unwrap();
        assert_eq!(shape, expected);
    }

    struct Bytes(Vec<u8>);

    impl<'de> Deserialize<'de> for Bytes {
        fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            struct BytesVisitor;

            impl ::serde::de::Visitor<'_> for BytesVisitor {
                type Value = Vec<u8>;

                fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str("bytes")
                }

                fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Vec<u8>, E> {
                    Ok(v)
                }
            }

            d.deserialize_byte_buf(BytesVisitor).map(Bytes)
        }
    }

    #[rstest::rstest]
    fn binary_scalars_decode_as_bytes_or_base64() {
        let tree = parse("!!binary gIGC").unwrap();
        let bytes: Bytes = tree.decode_into().unwrap();
        assert_eq!(bytes.0, vec![0x80, 0x81, 0x82]);
        let text: String = tree.decode_into().unwrap();
        assert_eq!(text, "gIGC");
    }

    #[rstest::rstest]
    fn encodes_typed_values() {
        let config = Config {
            name: "web".to_string(),
            replicas: 2,
            labels: BTreeMap::from([("tier".to_string(), "123".to_string())]),
            ratio: Some(0.5),
        };
        let tree = Tree::from_serialize(&config).unwrap();
        assert_eq!(
            encode(&tree).unwrap(),
            "name: web\nreplicas: 2\nlabels:\n  tier: \"123\"\nratio: 0.5\n"
        );
        let back: Config = tree.decode_into().unwrap();
        assert_eq!(back, config);
    }

    #[rstest::rstest]
    fn encodes_enum_variants() {
        let tree = Tree::from_serialize(&vec![
            Shape::Point,
            Shape::Circle { radius: 2.0 },
            Shape::Pair(1, 2),
        ])
        .unwrap();
        assert_eq!(
            encode(&tree).unwrap(),
            "- point\n- circle:\n    radius: 2.0\n- pair:\n    - 1\n    - 2\n"
        );
    }

    #[rstest::rstest]
    fn encode_value_adds_a_subtree() {
        let mut tree = parse("a: 1\n").unwrap();
        let map = tree.content_root().unwrap();
        let key = tree.encode_value("b").unwrap();
        let value = tree.encode_value(&[1, 2]).unwrap();
        tree.arena.push_pair(map, key, value).unwrap();
        assert_eq!(encode(&tree).unwrap(), "a: 1\nb:\n  - 1\n  - 2\n");
    }

    #[rstest::rstest]
    fn non_scalar_map_keys_cannot_be_serialized() {
        let mut map = BTreeMap::new();
        map.insert(vec![1], 2);
        let err = Tree::from_serialize(&map).unwrap_err();
        assert!(err.is(ErrorKind::Serialize));
    }
}
