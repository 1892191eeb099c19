use rstest::rstest;
use yaml_bridge::{encode, parse, parse_all, parse_many, ErrorKind};

#[rstest]
fn alias_points_at_the_anchored_node() {
    let tree = parse("a: &x 1\nc: *x\n").unwrap();
    let map = tree.content_root().unwrap();
    let target = tree.get_key(map, "a").unwrap();
    let alias = tree.get_key(map, "c").unwrap();
    assert!(tree[alias].is_alias());
    assert_eq!(tree[alias].alias, Some(target));
    assert_eq!(tree.arena.resolve_alias(alias), Some(target));
}

#[rstest]
fn later_anchor_definition_wins() {
    let tree = parse("- &x 1\n- &x 2\n- *x\n").unwrap();
    let seq = tree.content_root().unwrap();
    let items = &tree[seq].content;
    assert_eq!(tree[items[2]].alias, Some(items[1]));
    assert_eq!(encode(&tree).unwrap(), "- &x 1\n- &x 2\n- *x\n");
}

#[rstest]
fn undefined_alias_fails_the_document() {
    let err = parse("a: *missing\n").unwrap_err();
    assert!(err.is(ErrorKind::UndefinedAnchor));
}

#[rstest]
fn anchors_do_not_leak_between_inputs() {
    let results = parse_many(&["a: &x 1\n", "b: *x\n"]);
    assert!(results[0].is_ok());
    let err = results[1].as_ref().unwrap_err();
    assert!(err.is(ErrorKind::UndefinedAnchor));
}

#[rstest]
fn anchors_do_not_leak_between_documents() {
    let err = parse_all("a: &x 1\n---\nb: *x\n").unwrap_err();
    assert!(err.is(ErrorKind::UndefinedAnchor));
    assert_eq!(err.document, Some(1));
    let trees = parse_all("a: &x 1\n---\nb: &x 2\nc: *x\n").unwrap();
    let map = trees[1].content_root().unwrap();
    let alias = trees[1].get_key(map, "c").unwrap();
    let target = trees[1].get_key(map, "b").unwrap();
    assert_eq!(trees[1][alias].alias, Some(target));
}

#[rstest]
fn cyclic_graphs_copy_and_compare() {
    let tree = parse("&a [*a, 1]").unwrap();
    let copy = tree.deep_copy();
    assert!(tree.structurally_eq(&copy));
    let seq = copy.content_root().unwrap();
    let alias = copy[seq].content[0];
    assert_eq!(copy[alias].alias, Some(seq));
    assert_eq!(encode(&copy).unwrap(), "&a [*a, 1]\n");
}

#[rstest]
fn copied_subtree_keeps_internal_sharing() {
    let mut tree = parse("a: [&x 1, *x]\n").unwrap();
    let map = tree.content_root().unwrap();
    let seq = tree.get_key(map, "a").unwrap();
    let copy = tree.arena.copy_subtree(seq);
    let items = tree[copy].content.clone();
    assert_ne!(copy, seq);
    assert_eq!(tree[items[1]].alias, Some(items[0]));
}
