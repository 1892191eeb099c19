use std::collections::HashMap;

use smol_str::SmolStr;

use crate::arena::NodeId;
use crate::{Error, Result};

/// Anchor names seen so far in one document. A later definition of the same
/// name replaces the earlier one for every alias that follows it.
#[derive(Debug, Default)]
pub(crate) struct AnchorTable {
    anchors: HashMap<SmolStr, NodeId>,
}

impl AnchorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, id: NodeId) {
        if let Some(previous) = self.anchors.insert(SmolStr::new(name), id) {
            tracing::debug!(
                anchor = name,
                previous = previous.index(),
                current = id.index(),
                "anchor redefined"
            );
        }
    }

    pub fn resolve(&self, name: &str) -> Result<NodeId> {
        self.anchors
            .get(name)
            .copied()
            .ok_or_else(|| Error::undefined_anchor(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::error::ErrorKind;
    use crate::node::Node;

    #[rstest::rstest]
    fn latest_definition_wins() {
        let mut arena = Arena::new();
        let first = arena.alloc(Node::string("1"));
        let second = arena.alloc(Node::string("2"));
        let mut table = AnchorTable::new();
        table.define("x", first);
        assert_eq!(table.resolve("x").unwrap(), first);
        table.define("x", second);
        assert_eq!(table.resolve("x").unwrap(), second);
    }

    #[rstest::rstest]
    fn unknown_anchor_is_an_error() {
        let table = AnchorTable::new();
        let err = table.resolve("missing").unwrap_err();
        assert!(err.is(ErrorKind::UndefinedAnchor));
        assert!(err.message.contains("missing"));
    }
}
