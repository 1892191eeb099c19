use rstest::rstest;
use yaml_bridge::{
    encode, encode_all, encode_with_options, parse, parse_all, EncodeOptions, ErrorKind, Indent,
    Node, NodeKind, Style, Tree,
};

#[rstest]
#[case("a: 1\nb: two\n")]
#[case("a:\n  b:\n    c: [1, 2]\n  d: {e: f}\n")]
#[case("- a\n- - b\n  - c\n- d: e\n  f: g\n")]
#[case("a: 'single'\nb: \"double\"\nc: plain text\n")]
#[case("a: |\n  literal\n  text\nb: >\n  folded\n")]
#[case("v: !!str 123\nw: !!int 7\n")]
#[case("x: !!binary gIGC\n")]
#[case("a: &x\n  b: 1\nc: *x\n")]
#[case("seq: []\nmap: {}\nnull:\n")]
fn decode_then_encode_is_identity(#[case] input: &str) {
    let tree = parse(input).unwrap();
    assert_eq!(encode(&tree).unwrap(), input);
}

#[rstest]
#[case("a: 1\nb: two\n")]
#[case("- x\n- {a: b}\n")]
#[case("# head\nk: v # line\n# foot\n")]
fn reencoding_is_idempotent_and_stable(#[case] input: &str) {
    let tree = parse(input).unwrap();
    let once = encode(&tree).unwrap();
    let again = parse(&once).unwrap();
    assert!(tree.structurally_eq(&again));
    assert_eq!(encode(&again).unwrap(), once);
}

#[rstest]
fn indentless_sequence_is_reindented() {
    let tree = parse("key:\n- a\n- b\n").unwrap();
    let seq = tree.get_key(tree.content_root().unwrap(), "key").unwrap();
    assert!(tree[seq].is_sequence());
    assert_eq!(tree[seq].content.len(), 2);
}

#[rstest]
#[case("123", "\"123\"\n")]
#[case("null", "\"null\"\n")]
#[case("\u{80}\u{81}\u{82}", "!!binary gIGC\n")]
#[case("line one\nline two\n", "|\n  line one\n  line two\n")]
fn node_string_picks_tag_and_style(#[case] text: &str, #[case] expected: &str) {
    let tree = Tree::document_with(Node::string(text)).unwrap();
    assert_eq!(encode(&tree).unwrap(), expected);
}

#[rstest]
fn binary_decodes_to_bytes() {
    let tree = parse("!!binary gIGC\n").unwrap();
    let node = &tree[tree.content_root().unwrap()];
    assert_eq!(node.tag, "!!binary");
    assert_eq!(node.value, "\u{80}\u{81}\u{82}");
    assert_eq!(node.binary_base64().as_deref(), Some("gIGC"));
}

#[rstest]
fn set_string_on_a_mapping_is_rejected() {
    let mut node = Node::mapping();
    let err = node.set_string("x").unwrap_err();
    assert!(err.is(ErrorKind::InvalidNode));
}

#[rstest]
fn empty_document_round_trip() {
    let tree = parse("").unwrap();
    assert_eq!(tree.root_node().kind(), NodeKind::Document);
    assert!(tree.root_node().content.is_empty());
    assert_eq!(encode(&tree).unwrap(), "null\n");
}

#[rstest]
fn node_without_kind_cannot_be_encoded() {
    let tree = Tree::document_with(Node::default()).unwrap();
    let err = encode(&tree).unwrap_err();
    assert!(err.is(ErrorKind::UnknownNodeKind));
}

#[rstest]
fn built_tree_encodes_with_custom_indent() {
    let mut tree = Tree::empty_document();
    let map = tree.arena.add(Node::mapping()).unwrap();
    tree.arena.push(tree.root, map).unwrap();
    let key = tree.arena.add(Node::string("items")).unwrap();
    let seq = tree.arena.add(Node::sequence()).unwrap();
    tree.arena.push_pair(map, key, seq).unwrap();
    for text in ["a", "b"] {
        let item = tree.arena.add(Node::string(text)).unwrap();
        tree.arena.push(seq, item).unwrap();
    }
    let mut flow = Node::sequence();
    flow.style = Style::FLOW;
    let flow_key = tree.arena.add(Node::string("flow")).unwrap();
    let flow = tree.arena.add(flow).unwrap();
    tree.arena.push_pair(map, flow_key, flow).unwrap();

    let options = EncodeOptions::new().with_indent(Indent::spaces(4));
    assert_eq!(
        encode_with_options(&tree, &options).unwrap(),
        "items:\n    -   a\n    -   b\nflow: []\n"
    );
}

#[rstest]
fn deep_copy_is_independent() {
    let tree = parse("a: &x [1]\nb: *x\n").unwrap();
    let mut copy = tree.deep_copy();
    assert!(tree.structurally_eq(&copy));
    let map = copy.content_root().unwrap();
    let value = copy.get_key(map, "a").unwrap();
    let first = copy[value].content[0];
    copy[first].value = "2".to_string();
    assert!(!tree.structurally_eq(&copy));
    assert_eq!(encode(&tree).unwrap(), "a: &x [1]\nb: *x\n");
}

#[rstest]
fn multi_document_streams() {
    let trees = parse_all("a: 1\n---\n- b\n---\nc\n").unwrap();
    assert_eq!(trees.len(), 3);
    let out = encode_all(&trees, &EncodeOptions::default()).unwrap();
    assert_eq!(out, "a: 1\n---\n- b\n---\nc\n");
}

#[rstest]
#[case("a: [1, 2\n")]
#[case("a: 'open\n")]
#[case("? complex\n: key\n")]
#[case("a:\n\t- tab\n")]
fn malformed_input_is_a_syntax_error(#[case] input: &str) {
    let err = parse(input).unwrap_err();
    assert!(err.is(ErrorKind::Syntax), "{err}");
    assert!(err.location.is_some());
}
