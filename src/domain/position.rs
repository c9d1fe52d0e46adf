//! Position state machine and closed-trade records.
//!
//! A simulation carries one [`SimState`] through the bar loop. Transitions are
//! `Flat -> Long|Short -> Flat`; opening while a position is held, or closing
//! while flat, leaves the state untouched.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Long,
    Short,
}

impl PositionState {
    /// +1 for long, -1 for short, 0 when flat.
    pub fn sign(self) -> f64 {
        match self {
            PositionState::Flat => 0.0,
            PositionState::Long => 1.0,
            PositionState::Short => -1.0,
        }
    }

    pub fn is_flat(self) -> bool {
        self == PositionState::Flat
    }

    /// Integer code used in exported columns: 0 flat, 1 long, -1 short.
    pub fn as_i8(self) -> i8 {
        match self {
            PositionState::Flat => 0,
            PositionState::Long => 1,
            PositionState::Short => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub side: PositionState,
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_price: f64,
    pub exit_price: f64,
    pub realized_return: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimState {
    pub position: PositionState,
    pub entry_price: f64,
    pub entry_index: usize,
    pub realized_total: f64,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `side` at `price` on bar `index`. Only valid from `Flat`.
    pub fn open(self, side: PositionState, price: f64, index: usize) -> Self {
        if !self.position.is_flat() || side.is_flat() {
            return self;
        }
        SimState {
            position: side,
            entry_price: price,
            entry_index: index,
            realized_total: self.realized_total,
        }
    }

    /// Close the open position at `price` on bar `index`.
    ///
    /// Returns the flat state and the trade it produced. Closing while flat, or
    /// on the entry bar itself, is a no-op.
    pub fn close(self, price: f64, index: usize) -> (Self, Option<TradeRecord>) {
        if self.position.is_flat() || index <= self.entry_index {
            return (self, None);
        }

        let realized_return = self.position.sign() * (price - self.entry_price);
        let trade = TradeRecord {
            side: self.position,
            entry_index: self.entry_index,
            exit_index: index,
            entry_price: self.entry_price,
            exit_price: price,
            realized_return,
        };
        let next = SimState {
            realized_total: self.realized_total + realized_return,
            ..SimState::default()
        };
        (next, Some(trade))
    }

    /// Mark-to-market PnL of the open position; 0 when flat.
    pub fn unrealized_pnl(&self, mark: f64) -> f64 {
        self.position.sign() * (mark - self.entry_price)
    }

    pub fn equity(&self, mark: f64) -> f64 {
        self.realized_total + self.unrealized_pnl(mark)
    }
}
