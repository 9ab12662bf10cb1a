use log::debug;
use serde::Serialize;
use sigma_core::{InstrumentCode, Order, OrderId, OrderState, Side, Trade, TradeId};
use sigma_ports::{BookError, BookResult, MatchingRule};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::ExactMatchRule;

/// Matched or withdrawn orders whose state a book remembers by default
pub const DEFAULT_TERMINAL_RETENTION: usize = 10_000;

/// Why an order leaves the book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Settled against a counter-order
    Matched,
    /// Withdrawn by its owner
    Withdrawn,
}

impl From<RemovalReason> for OrderState {
    fn from(reason: RemovalReason) -> Self {
        match reason {
            RemovalReason::Matched => OrderState::Matched,
            RemovalReason::Withdrawn => OrderState::Withdrawn,
        }
    }
}

/// A lifecycle state stamped with the book-local sequence number it was set at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tracked {
    state: OrderState,
    seq: u64,
}

/// Order states a recorded trade overwrote, handed back to
/// [`OrderBook::retract_trade`] to put them back
#[derive(Debug, Clone, Default)]
pub struct PriorStates(Vec<(OrderId, Option<Tracked>)>);

/// Order book for a single instrument
///
/// Each side is kept in submission order; the first exact match in that
/// order wins. Depth is expected to be small, so discovery is a linear scan.
#[derive(Clone)]
pub struct OrderBook {
    instrument_code: InstrumentCode,
    /// Live buy orders, oldest first
    bids: Vec<Order>,
    /// Live sell orders, oldest first
    asks: Vec<Order>,
    /// Settled trades, append-only
    tape: Vec<Trade>,
    /// Lifecycle state of live orders and of recently finished ones
    states: HashMap<OrderId, Tracked>,
    /// Terminal state entries, oldest first. An entry is stale once its id
    /// has been given a newer state.
    terminal: VecDeque<(OrderId, u64)>,
    terminal_retention: usize,
    next_seq: u64,
    rule: Arc<dyn MatchingRule>,
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("instrument_code", &self.instrument_code)
            .field("bids_count", &self.bids.len())
            .field("asks_count", &self.asks.len())
            .field("tape_len", &self.tape.len())
            .field("rule", &self.rule.name())
            .finish()
    }
}

impl OrderBook {
    /// Create a new order book with exact price-quantity matching
    pub fn new(instrument_code: impl Into<InstrumentCode>) -> Self {
        Self::with_rule(instrument_code, Arc::new(ExactMatchRule::new()))
    }

    /// Create a new order book with a specific matching rule
    pub fn with_rule(instrument_code: impl Into<InstrumentCode>, rule: Arc<dyn MatchingRule>) -> Self {
        Self {
            instrument_code: instrument_code.into(),
            bids: Vec::new(),
            asks: Vec::new(),
            tape: Vec::new(),
            states: HashMap::new(),
            terminal: VecDeque::new(),
            terminal_retention: DEFAULT_TERMINAL_RETENTION,
            next_seq: 0,
            rule,
        }
    }

    /// Remember at most `limit` matched or withdrawn orders; older ones
    /// are forgotten and `order_state` returns `None` for them
    pub fn with_terminal_retention(mut self, limit: usize) -> Self {
        self.terminal_retention = limit;
        self.evict_terminal();
        self
    }

    pub fn instrument_code(&self) -> &InstrumentCode {
        &self.instrument_code
    }

    pub fn rule_name(&self) -> &str {
        self.rule.name()
    }

    fn side(&self, side: Side) -> &Vec<Order> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut Vec<Order> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Rest an order on its side of the book
    pub fn submit(&mut self, order: Order) -> BookResult<()> {
        if self.contains(&order.id) {
            return Err(BookError::DuplicateOrder(order.id));
        }

        debug!(
            "Resting {} order {} on {}: {} @ {}",
            order.side, order.id, self.instrument_code, order.quantity, order.unit_price
        );
        self.set_state(order.id.clone(), OrderState::Resting);
        self.side_mut(order.side).push(order);
        Ok(())
    }

    /// Earliest resting order on the opposite side that matches `incoming`.
    ///
    /// Read-only: the book is untouched until settlement removes the pair.
    pub fn find_exact_match(&self, incoming: &Order) -> Option<&Order> {
        self.side(incoming.side.opposite())
            .iter()
            .find(|resting| self.rule.is_match(incoming, resting))
    }

    /// Remove exactly the order with `order_id`, keeping the others in order
    pub fn remove(&mut self, order_id: &OrderId, reason: RemovalReason) -> BookResult<Order> {
        let (side, index) = self
            .locate(order_id)
            .ok_or_else(|| BookError::OrderNotFound(order_id.clone()))?;

        let order = self.side_mut(side).remove(index);
        self.set_state(order.id.clone(), reason.into());
        Ok(order)
    }

    /// Position of a live order within its side
    pub fn index_of(&self, order_id: &OrderId) -> Option<usize> {
        self.locate(order_id).map(|(_, index)| index)
    }

    fn locate(&self, order_id: &OrderId) -> Option<(Side, usize)> {
        [Side::Buy, Side::Sell].into_iter().find_map(|side| {
            self.side(side)
                .iter()
                .position(|o| &o.id == order_id)
                .map(|index| (side, index))
        })
    }

    /// Put a removed order back at its former position (settlement rollback)
    pub fn reinstate(&mut self, order: Order, index: usize) -> BookResult<()> {
        if self.contains(&order.id) {
            return Err(BookError::DuplicateOrder(order.id));
        }

        self.set_state(order.id.clone(), OrderState::Resting);
        let side = self.side_mut(order.side);
        let index = index.min(side.len());
        side.insert(index, order);
        Ok(())
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.locate(order_id).is_some()
    }

    pub fn order_state(&self, order_id: &OrderId) -> Option<OrderState> {
        self.states.get(order_id).map(|tracked| tracked.state)
    }

    fn set_state(&mut self, order_id: OrderId, state: OrderState) -> Option<Tracked> {
        let seq = self.next_seq;
        self.next_seq += 1;
        if state.is_terminal() {
            self.terminal.push_back((order_id.clone(), seq));
        }
        let previous = self.states.insert(order_id, Tracked { state, seq });
        self.evict_terminal();
        previous
    }

    fn restore_state(&mut self, order_id: OrderId, previous: Option<Tracked>) {
        match previous {
            Some(tracked) => {
                if tracked.state.is_terminal() {
                    self.terminal.push_back((order_id.clone(), tracked.seq));
                }
                self.states.insert(order_id, tracked);
                self.evict_terminal();
            }
            None => {
                self.states.remove(&order_id);
            }
        }
    }

    fn evict_terminal(&mut self) {
        while self.terminal.len() > self.terminal_retention {
            let Some((order_id, seq)) = self.terminal.pop_front() else {
                break;
            };
            if self.states.get(&order_id).map(|t| t.seq) == Some(seq) {
                self.states.remove(&order_id);
            }
        }
    }

    /// Live buy orders in submission order
    pub fn bids(&self) -> &[Order] {
        &self.bids
    }

    /// Live sell orders in submission order
    pub fn asks(&self) -> &[Order] {
        &self.asks
    }

    /// Number of orders in the book
    pub fn order_count(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    /// Check if book is empty
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    // ========== Trade Tape ==========

    /// Append a settled trade; both of its orders are now `Matched`.
    ///
    /// Returns the states this replaced, for `retract_trade`.
    pub fn record_trade(&mut self, trade: Trade) -> PriorStates {
        let mut prior = Vec::with_capacity(2);
        for id in [&trade.buy_order_id, &trade.sell_order_id] {
            let previous = self.set_state(id.clone(), OrderState::Matched);
            prior.push((id.clone(), previous));
        }
        self.tape.push(trade);
        PriorStates(prior)
    }

    /// Drop the last trade if it is `trade_id` and put back the order states
    /// it replaced (settlement rollback)
    pub fn retract_trade(&mut self, trade_id: &TradeId, prior: PriorStates) -> Option<Trade> {
        match self.tape.last() {
            Some(last) if &last.id == trade_id => {}
            _ => return None,
        }

        let trade = self.tape.pop()?;
        for (order_id, previous) in prior.0.into_iter().rev() {
            self.restore_state(order_id, previous);
        }
        Some(trade)
    }

    pub fn tape(&self) -> &[Trade] {
        &self.tape
    }

    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot {
            instrument_code: self.instrument_code.clone(),
            bids: self.bids.clone(),
            asks: self.asks.clone(),
            tape: self.tape.clone(),
        }
    }
}

/// Immutable snapshot of order book state
#[derive(Debug, Clone, Serialize)]
pub struct BookSnapshot {
    pub instrument_code: InstrumentCode,
    pub bids: Vec<Order>,
    pub asks: Vec<Order>,
    pub tape: Vec<Trade>,
}
