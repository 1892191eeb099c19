use std::cell::Cell;

use crate::{Error, Result};

/// Below this many produced nodes, up to 99% of them may come from aliases.
const RATIO_RANGE_LOW: usize = 400_000;
/// Above this many, at most 10% may.
const RATIO_RANGE_HIGH: usize = 4_000_000;

/// Counts the nodes a conversion produces and how many of them are copies
/// made by following an alias or a merge key. A small document whose
/// aliases nest into each other can otherwise expand exponentially.
#[derive(Debug, Default)]
pub(crate) struct AliasBudget {
    nodes: Cell<usize>,
    aliased: Cell<usize>,
}

impl AliasBudget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one produced node; `aliased` when it is reached through an
    /// alias or a merge key.
    pub fn visit(&self, aliased: bool) -> Result<()> {
        let nodes = self.nodes.get() + 1;
        self.nodes.set(nodes);
        if !aliased {
            return Ok(());
        }
        let copies = self.aliased.get() + 1;
        self.aliased.set(copies);
        if copies > 100 && nodes > 1000 && copies as f64 / nodes as f64 > allowed_ratio(nodes) {
            tracing::debug!(nodes, aliased = copies, "alias expansion refused");
            return Err(Error::excessive_aliasing());
        }
        Ok(())
    }
}

fn allowed_ratio(nodes: usize) -> f64 {
    if nodes <= RATIO_RANGE_LOW {
        0.99
    } else if nodes >= RATIO_RANGE_HIGH {
        0.10
    } else {
        let span = (RATIO_RANGE_HIGH - RATIO_RANGE_LOW) as f64;
        0.99 - 0.89 * ((nodes - RATIO_RANGE_LOW) as f64 / span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[rstest::rstest]
    #[case(10, 0.99)]
    #[case(RATIO_RANGE_LOW, 0.99)]
    #[case(RATIO_RANGE_HIGH, 0.10)]
    #[case(usize::MAX, 0.10)]
    fn ratio_shrinks_with_size(#[case] nodes: usize, #[case] expected: f64) {
        assert!((allowed_ratio(nodes) - expected).abs() < 1e-9);
    }

    #[rstest::rstest]
    fn plain_nodes_never_trip() {
        let budget = AliasBudget::new();
        for _ in 0..10_000 {
            budget.visit(false).unwrap();
        }
    }

    #[rstest::rstest]
    fn mostly_aliased_output_trips() {
        let budget = AliasBudget::new();
        budget.visit(false).unwrap();
        let err = (0..2000)
            .map(|_| budget.visit(true))
            .find_map(Result::err)
            .unwrap();
        assert!(err.is(ErrorKind::ExcessiveAliasing));
    }

    #[rstest::rstest]
    fn moderate_reuse_is_allowed() {
        let budget = AliasBudget::new();
        for index in 0..5000 {
            budget.visit(index % 2 == 0).unwrap();
        }
    }
}
