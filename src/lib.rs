pub mod arena;
pub mod bridge;
pub mod constants;
pub mod decode;
pub mod encode;
pub mod error;
pub mod node;
pub mod num;
pub mod options;
pub mod serde;
pub mod text;
pub mod value;

use std::io::{Read, Write};

use ::serde::de::DeserializeOwned;
use ::serde::Serialize;

pub use crate::arena::{Arena, NodeId, Tree};
pub use crate::bridge::{
    json_object_to_yaml_object, json_to_yaml, json_to_yaml_with_options, yaml_to_json,
    yaml_to_json_strict, yaml_to_json_value, yaml_to_json_with_options,
};
pub use crate::decode::{parse, parse_all, parse_many, Documents};
pub use crate::encode::{encode, encode_all, encode_with_options};
pub use crate::error::{Error, ErrorKind, Location};
pub use crate::node::{Node, NodeKind, Style};
pub use crate::options::{DecodeOptions, EncodeOptions, Indent};
pub use crate::value::{Mapping, Number, Value};

pub type Result<T> = std::result::Result<T, Error>;

pub fn to_string<T: Serialize>(value: &T) -> Result<String> {
    to_string_with_options(value, &EncodeOptions::default())
}

pub fn to_string_with_options<T: Serialize>(value: &T, options: &EncodeOptions) -> Result<String> {
    let tree = Tree::from_serialize(value)?;
    encode_with_options(&tree, options)
}

pub fn to_vec<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    to_vec_with_options(value, &EncodeOptions::default())
}

pub fn to_vec_with_options<T: Serialize>(value: &T, options: &EncodeOptions) -> Result<Vec<u8>> {
    to_string_with_options(value, options).map(String::into_bytes)
}

pub fn to_writer<T: Serialize, W: Write>(writer: W, value: &T) -> Result<()> {
    to_writer_with_options(writer, value, &EncodeOptions::default())
}

pub fn to_writer_with_options<T: Serialize, W: Write>(
    mut writer: W,
    value: &T,
    options: &EncodeOptions,
) -> Result<()> {
    let out = to_string_with_options(value, options)?;
    writer.write_all(out.as_bytes())?;
    Ok(())
}

/// Decodes the first document of `input` into `T`. Duplicate keys resolve
/// to their last value and unknown struct fields are ignored.
pub fn from_str<T: DeserializeOwned>(input: &str) -> Result<T> {
    from_str_with_options(input, &DecodeOptions::default())
}

/// Like [`from_str`], but duplicate keys and unknown struct fields are
/// errors.
pub fn from_str_strict<T: DeserializeOwned>(input: &str) -> Result<T> {
    from_str_with_options(input, &DecodeOptions::strict())
}

pub fn from_str_with_options<T: DeserializeOwned>(
    input: &str,
    options: &DecodeOptions,
) -> Result<T> {
    let tree = parse(input)?;
    tree.decode_node(tree.root, options.strict)
}

pub fn from_slice<T: DeserializeOwned>(input: &[u8]) -> Result<T> {
    from_slice_with_options(input, &DecodeOptions::default())
}

pub fn from_slice_with_options<T: DeserializeOwned>(
    input: &[u8],
    options: &DecodeOptions,
) -> Result<T> {
    let text = std::str::from_utf8(input)
        .map_err(|err| Error::deserialize(format!("input is not valid UTF-8: {err}")))?;
    from_str_with_options(text, options)
}

pub fn from_reader<T: DeserializeOwned, R: Read>(reader: R) -> Result<T> {
    from_reader_with_options(reader, &DecodeOptions::default())
}

pub fn from_reader_with_options<T: DeserializeOwned, R: Read>(
    mut reader: R,
    options: &DecodeOptions,
) -> Result<T> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    from_str_with_options(&input, options)
}
