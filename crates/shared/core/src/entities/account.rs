//! Participant account: cash balance, instrument holdings and trade blotter.
//!
//! Every mutation here is local to one account. Moving value between two
//! accounts atomically is the settlement engine's job.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use super::{Holding, Trade};
use crate::values::{Amount, InstrumentCode, ParticipantId, Price, Quantity, TradeId};

/// Errors from single-account mutations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Amount, available: Amount },

    #[error("No holding in instrument {0}")]
    UnknownInstrument(InstrumentCode),

    #[error("Insufficient holdings in {instrument}: required {required}, held {held}")]
    InsufficientHoldings {
        instrument: InstrumentCode,
        required: Quantity,
        held: Quantity,
    },

    #[error("Amount must not be negative, got {0}")]
    NegativeAmount(Amount),

    #[error("Balance {balance} cannot absorb a credit of {amount}")]
    BalanceOverflow { balance: Amount, amount: Amount },

    #[error("Holding in {instrument} cannot absorb {added} more units (held {held})")]
    HoldingOverflow {
        instrument: InstrumentCode,
        held: Quantity,
        added: Quantity,
    },
}

/// Balance and holdings of one trader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantAccount {
    pub id: ParticipantId,

    /// Cash available for buying (never negative)
    balance: Amount,

    /// Holdings indexed by instrument
    holdings: HashMap<InstrumentCode, Holding>,

    /// Every trade this participant was party to, oldest first
    trade_history: Vec<Trade>,
}

impl ParticipantAccount {
    /// Create an account with zero balance and no holdings
    pub fn new(id: impl Into<ParticipantId>) -> Self {
        Self {
            id: id.into(),
            balance: Decimal::ZERO,
            holdings: HashMap::new(),
            trade_history: Vec::new(),
        }
    }

    /// Create an account with an opening balance
    pub fn funded(id: impl Into<ParticipantId>, balance: Amount) -> Result<Self, AccountError> {
        let mut account = Self::new(id);
        account.credit(balance)?;
        Ok(account)
    }

    /// Seed a holding (builder style, for account opening)
    pub fn with_holding(
        mut self,
        code: impl Into<InstrumentCode>,
        quantity: Quantity,
        unit_cost: Price,
    ) -> Result<Self, AccountError> {
        self.add_holding(code.into(), quantity, unit_cost)?;
        Ok(self)
    }

    // ========== Balance Operations ==========

    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Add funds
    pub fn credit(&mut self, amount: Amount) -> Result<(), AccountError> {
        self.balance = self.credited(amount)?;
        Ok(())
    }

    /// The balance `credit(amount)` would leave, without applying it
    pub fn credited(&self, amount: Amount) -> Result<Amount, AccountError> {
        if amount < Decimal::ZERO {
            return Err(AccountError::NegativeAmount(amount));
        }
        self.balance
            .checked_add(amount)
            .ok_or(AccountError::BalanceOverflow {
                balance: self.balance,
                amount,
            })
    }

    /// Remove funds; the balance never goes below zero
    pub fn debit(&mut self, amount: Amount) -> Result<(), AccountError> {
        if amount < Decimal::ZERO {
            return Err(AccountError::NegativeAmount(amount));
        }
        if self.balance < amount {
            return Err(AccountError::InsufficientFunds {
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    // ========== Holding Operations ==========

    pub fn holding(&self, code: &InstrumentCode) -> Option<&Holding> {
        self.holdings.get(code)
    }

    /// Units held in `code`, zero when there is no holding record
    pub fn quantity_held(&self, code: &InstrumentCode) -> Quantity {
        self.holdings.get(code).map(|h| h.quantity).unwrap_or(0)
    }

    pub fn holdings(&self) -> impl Iterator<Item = (&InstrumentCode, &Holding)> {
        self.holdings.iter()
    }

    /// Add units at `unit_cost`, creating the holding if needed.
    /// The holding is left untouched on error.
    pub fn add_holding(
        &mut self,
        code: InstrumentCode,
        quantity: Quantity,
        unit_cost: Price,
    ) -> Result<(), AccountError> {
        let next = self.holding_after_add(&code, quantity, unit_cost)?;
        self.holdings.insert(code, next);
        Ok(())
    }

    /// The holding `add_holding` would leave, without applying it
    pub fn holding_after_add(
        &self,
        code: &InstrumentCode,
        quantity: Quantity,
        unit_cost: Price,
    ) -> Result<Holding, AccountError> {
        match self.holdings.get(code) {
            None => Ok(Holding::new(quantity, unit_cost)),
            Some(holding) => holding.checked_increase(quantity, unit_cost).ok_or_else(|| {
                AccountError::HoldingOverflow {
                    instrument: code.clone(),
                    held: holding.quantity,
                    added: quantity,
                }
            }),
        }
    }

    /// Remove units. The holding record stays (at zero) once emptied.
    pub fn remove_holding(
        &mut self,
        code: &InstrumentCode,
        quantity: Quantity,
    ) -> Result<(), AccountError> {
        let holding = self
            .holdings
            .get_mut(code)
            .ok_or_else(|| AccountError::UnknownInstrument(code.clone()))?;

        if holding.quantity < quantity {
            return Err(AccountError::InsufficientHoldings {
                instrument: code.clone(),
                required: quantity,
                held: holding.quantity,
            });
        }

        holding.quantity -= quantity;
        Ok(())
    }

    /// Put back a holding exactly as it was (`None` removes the record).
    ///
    /// Only meant for undoing a settlement step; it bypasses cost re-weighting.
    pub fn restore_holding(&mut self, code: InstrumentCode, previous: Option<Holding>) {
        match previous {
            Some(holding) => {
                self.holdings.insert(code, holding);
            }
            None => {
                self.holdings.remove(&code);
            }
        }
    }

    // ========== Trade History ==========

    pub fn append_trade(&mut self, trade: Trade) {
        self.trade_history.push(trade);
    }

    pub fn trade_history(&self) -> &[Trade] {
        &self.trade_history
    }

    /// Drop the most recent trade if it is `trade_id` (settlement rollback)
    pub fn retract_trade(&mut self, trade_id: &TradeId) -> Option<Trade> {
        match self.trade_history.last() {
            Some(last) if &last.id == trade_id => self.trade_history.pop(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn goog() -> InstrumentCode {
        InstrumentCode::from("GOOG")
    }

    #[test]
    fn test_credit_and_debit() {
        let mut account = ParticipantAccount::funded("a", dec!(100)).unwrap();

        account.credit(dec!(50)).unwrap();
        assert_eq!(account.balance(), dec!(150));

        account.debit(dec!(150)).unwrap();
        assert_eq!(account.balance(), dec!(0));
    }

    #[test]
    fn test_debit_never_goes_negative() {
        let mut account = ParticipantAccount::funded("a", dec!(50)).unwrap();

        let err = account.debit(dec!(50.01)).unwrap_err();
        assert_eq!(
            err,
            AccountError::InsufficientFunds {
                required: dec!(50.01),
                available: dec!(50)
            }
        );
        assert_eq!(account.balance(), dec!(50));
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let mut account = ParticipantAccount::new("a");

        assert_eq!(
            account.credit(dec!(-1)),
            Err(AccountError::NegativeAmount(dec!(-1)))
        );
        assert_eq!(
            account.debit(dec!(-1)),
            Err(AccountError::NegativeAmount(dec!(-1)))
        );
        assert!(ParticipantAccount::funded("b", dec!(-10)).is_err());
        assert_eq!(account.balance(), dec!(0));
    }

    #[test]
    fn test_add_holding_creates_then_reweights() {
        let mut account = ParticipantAccount::new("a");

        account.add_holding(goog(), 10, dec!(100)).unwrap();
        assert_eq!(account.holding(&goog()), Some(&Holding::new(10, dec!(100))));

        account.add_holding(goog(), 30, dec!(120)).unwrap();
        let holding = account.holding(&goog()).unwrap();
        assert_eq!(holding.quantity, 40);
        assert_eq!(holding.average_cost, dec!(115));
    }

    #[test]
    fn test_remove_holding_errors() {
        let mut account = ParticipantAccount::new("a")
            .with_holding("GOOG", 10, dec!(100))
            .unwrap();

        assert_eq!(
            account.remove_holding(&InstrumentCode::from("MSFT"), 1),
            Err(AccountError::UnknownInstrument(InstrumentCode::from("MSFT")))
        );
        assert_eq!(
            account.remove_holding(&goog(), 11),
            Err(AccountError::InsufficientHoldings {
                instrument: goog(),
                required: 11,
                held: 10
            })
        );
        assert_eq!(account.quantity_held(&goog()), 10);
    }

    #[test]
    fn test_remove_holding_keeps_empty_record() {
        let mut account = ParticipantAccount::new("a")
            .with_holding("GOOG", 10, dec!(100))
            .unwrap();

        account.remove_holding(&goog(), 10).unwrap();

        let holding = account.holding(&goog()).unwrap();
        assert!(holding.is_empty());
        assert_eq!(holding.average_cost, dec!(100));
    }

    #[test]
    fn test_restore_holding() {
        let mut account = ParticipantAccount::new("a")
            .with_holding("GOOG", 10, dec!(100))
            .unwrap();
        let before = account.holding(&goog()).copied();

        account.add_holding(goog(), 5, dec!(200)).unwrap();
        account.restore_holding(goog(), before);
        assert_eq!(account.holding(&goog()), Some(&Holding::new(10, dec!(100))));

        account.restore_holding(goog(), None);
        assert!(account.holding(&goog()).is_none());
    }

    #[test]
    fn test_credit_past_decimal_range_is_refused() {
        let mut account = ParticipantAccount::funded("a", Decimal::MAX).unwrap();

        assert_eq!(
            account.credit(dec!(1)),
            Err(AccountError::BalanceOverflow {
                balance: Decimal::MAX,
                amount: dec!(1)
            })
        );
        assert_eq!(account.balance(), Decimal::MAX);
    }

    #[test]
    fn test_add_holding_past_unit_limit_leaves_holding() {
        let mut account = ParticipantAccount::new("a")
            .with_holding("GOOG", u64::MAX - 1, dec!(1))
            .unwrap();

        assert_eq!(
            account.add_holding(goog(), 5, dec!(1)),
            Err(AccountError::HoldingOverflow {
                instrument: goog(),
                held: u64::MAX - 1,
                added: 5
            })
        );
        assert_eq!(account.holding(&goog()), Some(&Holding::new(u64::MAX - 1, dec!(1))));
        assert!(ParticipantAccount::new("b")
            .with_holding("GOOG", u64::MAX, dec!(1))
            .unwrap()
            .with_holding("GOOG", 1, dec!(1))
            .is_err());
    }
}
