use common::models::{Direction, PositionSide, Readouts};

/// Minimum number of votes the winning side needs.
pub const MIN_VOTES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteTally {
    pub buy: usize,
    pub sell: usize,
    pub total: usize,
}

impl VoteTally {
    pub fn from_sides(sides: &[PositionSide]) -> Self {
        sides.iter().fold(
            Self {
                total: sides.len(),
                ..Self::default()
            },
            |mut tally, side| {
                match side {
                    PositionSide::Buy => tally.buy += 1,
                    PositionSide::Sell => tally.sell += 1,
                }
                tally
            },
        )
    }

    /// A side wins with at least [`MIN_VOTES`] votes and a strict majority over the other.
    pub fn direction(&self) -> Option<Direction> {
        if self.buy >= MIN_VOTES && self.buy > self.sell {
            Some(Direction::Long)
        } else if self.sell >= MIN_VOTES && self.sell > self.buy {
            Some(Direction::Short)
        } else {
            None
        }
    }

    pub fn readouts(&self) -> Readouts {
        Readouts::Leaderboard {
            buy_votes: self.buy,
            sell_votes: self.sell,
            total: self.total,
        }
    }
}
