//! Byte-exact round trips: decoding then encoding these documents with the
//! default two-space indent reproduces them unchanged.

use rstest::rstest;
use yaml_bridge::{encode, parse};

fn reencode(input: &str) -> String {
    let tree = parse(input).unwrap_or_else(|err| panic!("{input:?}: {err}"));
    encode(&tree).unwrap_or_else(|err| panic!("{input:?}: {err}"))
}

#[rstest]
#[case("null\n")]
#[case("foo\n")]
#[case("\"foo\"\n")]
#[case("'foo'\n")]
#[case("!!str 123\n")]
#[case("!tag:something 123\n")]
#[case("!tag:something {}\n")]
#[case("!tag:something []\n")]
#[case("''\n")]
#[case("|\n  foo\n  bar\n")]
#[case("true\n")]
#[case("-10\n")]
#[case("4294967296\n")]
#[case("0.1000\n")]
#[case("-.inf\n")]
#[case(".nan\n")]
#[case("{}\n")]
#[case("a: b c\n")]
#[case("a:\n  b: c\n  d: e\n")]
#[case("a:\n  - b: c\n    d: e\n")]
#[case("a: # AI\n  - b\nc:\n  - d\n")]
#[case("a: | # IA\n  str\nb: >- # IB\n  str\nc: # IC\n  - str\nd: # ID\n  str:\n")]
#[case("- a\n- b\n")]
#[case("- a\n- - b\n  - c\n")]
#[case("[a, b]\n")]
#[case("- a\n- [b, c]\n")]
#[case("a: &x 1\nb: &y 2\nc: *x\nd: *y\n")]
#[case("# DH1\n\n# DH2\n\n# H1\n# H2\ntrue # I\n# F1\n# F2\n\n# DF1\n\n# DF2\n")]
#[case("# DH1\n\n# DH2\n\n# HA1\n# HA2\nka: va # IA\n# FA1\n# FA2\n\n# HB1\n# HB2\nkb: vb # IB\n# FB1\n# FB2\n\n# DF1\n\n# DF2\n")]
#[case("# DH1\n\n# DH2\n\n# HA1\n# HA2\n- la # IA\n# FA1\n# FA2\n\n# HB1\n# HB2\n- lb # IB\n# FB1\n# FB2\n\n# DF1\n\n# DF2\n")]
#[case("# DH1\n\n- la # IA\n# HB1\n- lb\n")]
#[case("- la # IA\n- lb # IB\n- lc # IC\n")]
#[case("# DH1\n\n# HL1\n- - la\n  # HB1\n  - lb\n")]
#[case("# DH1\n\n# HL1\n- # HA1\n  - la\n  # HB1\n  - lb\n")]
#[case("# DH1\n\n# HA1\nka:\n  # HB1\n  kb:\n    # HC1\n    # HC2\n    - lc # IC\n    # FC1\n    # FC2\n\n    # HD1\n    - ld # ID\n    # FD1\n\n# DF1\n")]
#[case("# DH1\n\n# HA1\nka:\n  # HB1\n  kb:\n    # HC1\n    # HC2\n    - lc # IC\n    # FC1\n    # FC2\n\n    # HD1\n    - ld # ID\n    # FD1\nke: ve\n\n# DF1\n")]
#[case("# DH1\n\n# DH2\n\n# HA1\n# HA2\nka:\n  # HB1\n  # HB2\n  kb:\n    # HC1\n    # HC2\n    kc:\n      # HD1\n      # HD2\n      kd: vd\n      # FD1\n      # FD2\n    # FC1\n    # FC2\n  # FB1\n  # FB2\n# FA1\n# FA2\n\n# HE1\n# HE2\nke: ve\n# FE1\n# FE2\n\n# DF1\n\n# DF2\n")]
#[case("# DH1\n\n# DH2\n\n# HA1\n# HA2\nka:\n  # HB1\n  # HB2\n  kb:\n    # HC1\n    # HC2\n    kc:\n      # HD1\n      # HD2\n      kd: vd\n      # FD1\n      # FD2\n    # FC1\n    # FC2\n  # FB1\n  # FB2\n\n  # HE1\n  # HE2\n  ke: ve\n  # FE1\n  # FE2\n# FA1\n# FA2\n\n# DF1\n\n# DF2\n")]
#[case("# HA1\nka:\n  # HB1\n  kb: vb\n  # FB1\n# FA1\n")]
#[case("# HA1\nka:\n  # HB1\n  kb: vb\n# FA1\n")]
#[case("ka:\n  kb: vb\n# FA1\n\nkc: vc\n")]
#[case("ka:\n  kb: vb\n# HC1\nkc: vc\n")]
#[case("ka: # IA\n  kb: # IB\n")]
#[case("# HA1\nka:\n  # HB1\n  kb: vb\n  # FB1\n# HC1\n# HC2\nkc: vc\n# FC1\n# FC2\n")]
#[case("# H1\n[la, lb] # I\n# F1\n")]
#[case("# DH1\n\n# SH1\n[\n  # HA1\n  la, # IA\n  # FA1\n\n  # HB1\n  lb, # IB\n  # FB1\n]\n# SF1\n\n# DF1\n")]
#[case("# DH1\n\n# SH1\n[\n  # HA1\n  la,\n  # FA1\n\n  # HB1\n  lb,\n  # FB1\n]\n# SF1\n\n# DF1\n")]
#[case("ka:\n  kb: [\n    # HA1\n    la,\n    # FA1\n\n    # HB1\n    lb,\n    # FB1\n  ]\n")]
#[case("# DH1\n\n# MH1\n{\n  # HA1\n  ka: va, # IA\n  # FA1\n\n  # HB1\n  kb: vb, # IB\n  # FB1\n}\n# MF1\n\n# DF1\n")]
#[case("# DH1\n\n# MH1\n{\n  # HA1\n  ka: va,\n  # FA1\n\n  # HB1\n  kb: vb,\n  # FB1\n}\n# MF1\n\n# DF1\n")]
#[case("# DH1\n\n# DH2\n\n# HA1\n# HA2\n- &x la # IA\n# FA1\n# FA2\n\n# HB1\n# HB2\n- *x # IB\n# FB1\n# FB2\n\n# DF1\n\n# DF2\n")]
fn documents_round_trip(#[case] input: &str) {
    assert_eq!(reencode(input), input);
}

#[rstest]
#[case("- a\n  # under a\n- b\n")]
#[case("- a\n  # under a\n\n  # more\n- b\n")]
#[case("- a\n# FA\n\n# HB\n- b\n")]
#[case("- a\n- b\n# FB\n")]
fn sequence_item_feet_keep_their_place(#[case] input: &str) {
    assert_eq!(reencode(input), input);
}

#[rstest]
fn outdented_item_foot_moves_under_the_item() {
    let input = "- a\n# FA\n\n- b\n";
    let out = reencode(input);
    assert_eq!(out, "- a\n  # FA\n- b\n");
    assert_eq!(reencode(&out), out);
    let (before, after) = (parse(input).unwrap(), parse(&out).unwrap());
    let (first, again) = (before.content_root().unwrap(), after.content_root().unwrap());
    assert_eq!(before[before[first].content[0]].foot_comment, "FA");
    assert_eq!(after[after[again].content[0]].foot_comment, "FA");
}
