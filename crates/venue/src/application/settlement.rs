//! All-or-nothing settlement of a matched order pair.
//!
//! Settlement runs in two phases. Validation reads both accounts and fails
//! with a business error before anything is touched. Application then
//! mutates the accounts and the book one step at a time, recording every
//! step in a [`SettlementJournal`]. If a step fails after validation passed,
//! the journal is unwound in reverse and the caller gets
//! [`VenueError::SettlementFailure`] with all state back where it started.

use log::{error, info};
use sigma_core::{
    AccountError, Amount, Holding, InstrumentCode, Order, OrderValidationError,
    ParticipantAccount, ParticipantId, Side, Timestamp, Trade, TradeId,
};
use sigma_matching::{OrderBook, PriorStates, RemovalReason};

use crate::error::{Result, VenueError};

/// Mutable access to the two sides of a settlement.
///
/// A participant may trade with themselves, in which case there is only one
/// account to lock and borrow.
#[derive(Debug)]
pub enum SettlementParties<'a> {
    Distinct {
        buyer: &'a mut ParticipantAccount,
        seller: &'a mut ParticipantAccount,
    },
    Same(&'a mut ParticipantAccount),
}

impl SettlementParties<'_> {
    fn buyer(&mut self) -> &mut ParticipantAccount {
        match self {
            SettlementParties::Distinct { buyer, .. } => buyer,
            SettlementParties::Same(account) => account,
        }
    }

    fn seller(&mut self) -> &mut ParticipantAccount {
        match self {
            SettlementParties::Distinct { seller, .. } => seller,
            SettlementParties::Same(account) => account,
        }
    }

    fn is_self_trade(&self) -> bool {
        matches!(self, SettlementParties::Same(_))
    }
}

/// One applied settlement step, with what is needed to undo it
#[derive(Debug, Clone)]
enum Effect {
    BuyerDebited(Amount),
    SellerHoldingRemoved {
        code: InstrumentCode,
        previous: Option<Holding>,
    },
    BuyerHoldingAdded {
        code: InstrumentCode,
        previous: Option<Holding>,
    },
    SellerCredited(Amount),
    RestingRemoved {
        order: Order,
        index: usize,
    },
    TradeRecorded {
        trade_id: TradeId,
        prior: PriorStates,
    },
    BuyerHistoryAppended(TradeId),
    SellerHistoryAppended(TradeId),
}

/// Ordered record of the effects applied during one settlement
#[derive(Debug, Default)]
pub struct SettlementJournal {
    effects: Vec<Effect>,
}

impl SettlementJournal {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Undo every recorded effect, newest first
    fn unwind(self, book: &mut OrderBook, parties: &mut SettlementParties<'_>) {
        for effect in self.effects.into_iter().rev() {
            let outcome = match effect {
                Effect::SellerHistoryAppended(trade_id) => {
                    parties.seller().retract_trade(&trade_id);
                    Ok(())
                }
                Effect::BuyerHistoryAppended(trade_id) => {
                    parties.buyer().retract_trade(&trade_id);
                    Ok(())
                }
                Effect::TradeRecorded { trade_id, prior } => {
                    book.retract_trade(&trade_id, prior);
                    Ok(())
                }
                Effect::RestingRemoved { order, index } => book
                    .reinstate(order, index)
                    .map_err(|e| e.to_string()),
                Effect::SellerCredited(amount) => {
                    parties.seller().debit(amount).map_err(|e| e.to_string())
                }
                Effect::BuyerHoldingAdded { code, previous } => {
                    parties.buyer().restore_holding(code, previous);
                    Ok(())
                }
                Effect::SellerHoldingRemoved { code, previous } => {
                    parties.seller().restore_holding(code, previous);
                    Ok(())
                }
                Effect::BuyerDebited(amount) => {
                    parties.buyer().credit(amount).map_err(|e| e.to_string())
                }
            };

            if let Err(e) = outcome {
                error!("Rollback step failed: {}", e);
            }
        }
    }
}

/// Validates and applies the transfer for a matched pair
#[derive(Debug, Default, Clone, Copy)]
pub struct SettlementEngine;

impl SettlementEngine {
    pub fn new() -> Self {
        Self
    }

    /// Settle `incoming` against the `resting` order found in `book`.
    ///
    /// The incoming order is never placed in the book. On success the
    /// resting order is gone, the trade is on the book's tape and in both
    /// histories. On any error the book and both accounts are unchanged.
    pub fn settle(
        &self,
        book: &mut OrderBook,
        mut parties: SettlementParties<'_>,
        resting: &Order,
        incoming: &Order,
        now: Timestamp,
    ) -> Result<Trade> {
        let (buy, sell) = orient(resting, incoming)?;
        let total = self.validate(book.instrument_code(), &mut parties, buy, sell)?;

        let trade = Trade::new_with_time(
            book.instrument_code().clone(),
            buy.participant_id.clone(),
            sell.participant_id.clone(),
            buy.id.clone(),
            sell.id.clone(),
            buy.unit_price,
            buy.quantity,
            now,
        );

        let mut journal = SettlementJournal::new();
        match self.apply(&mut journal, book, &mut parties, resting, &trade, total) {
            Ok(()) => {
                info!(
                    "Settled trade {} on {}: {} buys {} from {} @ {} (total {})",
                    trade.id,
                    trade.instrument_code,
                    trade.buyer_id,
                    trade.quantity,
                    trade.seller_id,
                    trade.unit_price,
                    total
                );
                Ok(trade)
            }
            Err(reason) => {
                error!(
                    "Settlement of {} against {} failed after validation, rolling back {} step(s): {}",
                    incoming.id,
                    resting.id,
                    journal.len(),
                    reason
                );
                journal.unwind(book, &mut parties);
                Err(VenueError::SettlementFailure(reason))
            }
        }
    }

    /// Business-rule checks; nothing is mutated here. Returns the amount
    /// the buyer pays.
    fn validate(
        &self,
        code: &InstrumentCode,
        parties: &mut SettlementParties<'_>,
        buy: &Order,
        sell: &Order,
    ) -> Result<Amount> {
        let buyer = parties.buyer();
        if buyer.id != buy.participant_id {
            return Err(VenueError::SettlementFailure(format!(
                "buyer account {} does not own order {}",
                buyer.id, buy.id
            )));
        }
        let required = buy.notional().ok_or(OrderValidationError::ValueOverflow {
            price: buy.unit_price,
            quantity: buy.quantity,
        })?;
        if buyer.balance() < required {
            return Err(VenueError::InsufficientFunds {
                participant: buyer.id.clone(),
                required,
                available: buyer.balance(),
            });
        }

        let seller = parties.seller();
        if seller.id != sell.participant_id {
            return Err(VenueError::SettlementFailure(format!(
                "seller account {} does not own order {}",
                seller.id, sell.id
            )));
        }
        let held = seller.quantity_held(code);
        if held < sell.quantity {
            return Err(VenueError::InsufficientHoldings {
                participant: seller.id.clone(),
                instrument: code.clone(),
                required: sell.quantity,
                held,
            });
        }

        // a self-trade gives back what it takes, so only distinct parties
        // can run out of room
        if !parties.is_self_trade() {
            parties
                .buyer()
                .holding_after_add(code, buy.quantity, buy.unit_price)
                .map_err(|e| overflow(&buy.participant_id, e))?;
            parties
                .seller()
                .credited(required)
                .map_err(|e| overflow(&sell.participant_id, e))?;
        }

        Ok(required)
    }

    fn apply(
        &self,
        journal: &mut SettlementJournal,
        book: &mut OrderBook,
        parties: &mut SettlementParties<'_>,
        resting: &Order,
        trade: &Trade,
        total: Amount,
    ) -> std::result::Result<(), String> {
        let code = trade.instrument_code.clone();

        parties.buyer().debit(total).map_err(|e| e.to_string())?;
        journal.record(Effect::BuyerDebited(total));

        let seller = parties.seller();
        let previous = seller.holding(&code).copied();
        seller
            .remove_holding(&code, trade.quantity)
            .map_err(|e| e.to_string())?;
        journal.record(Effect::SellerHoldingRemoved {
            code: code.clone(),
            previous,
        });

        let buyer = parties.buyer();
        let previous = buyer.holding(&code).copied();
        buyer
            .add_holding(code.clone(), trade.quantity, trade.unit_price)
            .map_err(|e| e.to_string())?;
        journal.record(Effect::BuyerHoldingAdded { code, previous });

        parties.seller().credit(total).map_err(|e| e.to_string())?;
        journal.record(Effect::SellerCredited(total));

        let index = book
            .index_of(&resting.id)
            .ok_or_else(|| format!("resting order {} is no longer in the book", resting.id))?;
        let order = book
            .remove(&resting.id, RemovalReason::Matched)
            .map_err(|e| e.to_string())?;
        journal.record(Effect::RestingRemoved { order, index });

        let prior = book.record_trade(trade.clone());
        journal.record(Effect::TradeRecorded {
            trade_id: trade.id,
            prior,
        });

        parties.buyer().append_trade(trade.clone());
        journal.record(Effect::BuyerHistoryAppended(trade.id));

        if !parties.is_self_trade() {
            parties.seller().append_trade(trade.clone());
            journal.record(Effect::SellerHistoryAppended(trade.id));
        }

        Ok(())
    }
}

fn overflow(participant: &ParticipantId, err: AccountError) -> VenueError {
    VenueError::AccountOverflow {
        participant: participant.clone(),
        reason: err.to_string(),
    }
}

/// Split a matched pair into (buy, sell)
fn orient<'a>(resting: &'a Order, incoming: &'a Order) -> Result<(&'a Order, &'a Order)> {
    if resting.side == incoming.side
        || resting.unit_price != incoming.unit_price
        || resting.quantity != incoming.quantity
    {
        return Err(VenueError::SettlementFailure(format!(
            "orders {} and {} are not an exact match",
            resting.id, incoming.id
        )));
    }

    Ok(match incoming.side {
        Side::Buy => (incoming, resting),
        Side::Sell => (resting, incoming),
    })
}
