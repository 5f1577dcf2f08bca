use std::collections::HashMap;

use common::models::Direction;

/// Last direction announced per symbol. Lives as long as the process.
#[derive(Debug, Default)]
pub struct DirectionMemo {
    last: HashMap<String, Direction>,
}

impl DirectionMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `direction` for `symbol` and reports whether it differs from
    /// what was recorded before. A symbol never seen counts as changed.
    pub fn update(&mut self, symbol: &str, direction: Direction) -> bool {
        match self.last.insert(symbol.to_string(), direction) {
            Some(previous) => previous != direction,
            None => true,
        }
    }
}
