use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::{debug, info, warn};
use parking_lot::Mutex;
use sigma_clock::SystemClock;
use sigma_matching::{OrderBook, RemovalReason};
use sigma_ports::{Clock, IdAllocator};
use std::sync::Arc;

use super::settlement::{SettlementEngine, SettlementParties};
use crate::error::{RegistryKind, Result, VenueError};
use crate::infrastructure::UuidAllocator;
use crate::model::{
    Amount, BookSnapshot, Instrument, InstrumentCode, Order, OrderId, OrderState,
    ParticipantAccount, ParticipantId, SubmitOutcome, Timestamp, Trade, VenueSnapshot,
};

type SharedBook = Arc<Mutex<OrderBook>>;
type SharedAccount = Arc<Mutex<ParticipantAccount>>;

/// The trading venue: registries of instruments, books and accounts.
///
/// Each book sits behind its own lock, held for the whole of a submission
/// (match discovery and settlement). Accounts have their own locks, taken
/// while a book lock is held and always in ascending participant id order.
/// Submissions on different instruments therefore run in parallel, and two
/// settlements touching the same pair of participants cannot deadlock.
pub struct Venue {
    name: String,
    clock: Arc<dyn Clock>,
    allocator: Arc<dyn IdAllocator>,
    settlement: SettlementEngine,
    instruments: DashMap<InstrumentCode, Instrument>,
    books: DashMap<InstrumentCode, SharedBook>,
    accounts: DashMap<ParticipantId, SharedAccount>,
    /// Every trade settled on any book, in settlement order
    trades: Mutex<Vec<Trade>>,
}

impl std::fmt::Debug for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Venue")
            .field("name", &self.name)
            .field("clock", &self.clock.name())
            .field("instruments", &self.instruments.len())
            .field("accounts", &self.accounts.len())
            .finish()
    }
}

impl Venue {
    /// Create an empty venue on system time with uuid participant ids
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clock: Arc::new(SystemClock::new()),
            allocator: Arc::new(UuidAllocator::new()),
            settlement: SettlementEngine::new(),
            instruments: DashMap::new(),
            books: DashMap::new(),
            accounts: DashMap::new(),
            trades: Mutex::new(Vec::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_allocator(mut self, allocator: Arc<dyn IdAllocator>) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current time on the venue clock
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ========== Registration ==========

    /// List an instrument and open its (empty) order book
    pub fn register_instrument(&self, instrument: Instrument) -> Result<()> {
        let code = instrument.code.clone();
        match self.instruments.entry(code.clone()) {
            Entry::Occupied(_) => {
                warn!("Rejected duplicate instrument {}", code);
                Err(VenueError::DuplicateId {
                    kind: RegistryKind::Instrument,
                    id: code.to_string(),
                })
            }
            Entry::Vacant(slot) => {
                let book = OrderBook::new(code.clone());
                info!(
                    "Registered instrument {} ({} matching)",
                    instrument,
                    book.rule_name()
                );
                self.books.insert(code, Arc::new(Mutex::new(book)));
                slot.insert(instrument);
                Ok(())
            }
        }
    }

    /// Add an account. An empty id is replaced by one from the allocator.
    pub fn register_participant(&self, mut account: ParticipantAccount) -> Result<ParticipantId> {
        if account.id.is_empty() {
            account.id = self.allocator.allocate();
        }

        let id = account.id.clone();
        match self.accounts.entry(id.clone()) {
            Entry::Occupied(_) => {
                warn!("Rejected duplicate participant {}", id);
                Err(VenueError::DuplicateId {
                    kind: RegistryKind::Participant,
                    id: id.to_string(),
                })
            }
            Entry::Vacant(slot) => {
                info!(
                    "Registered participant {} with balance {}",
                    id,
                    account.balance()
                );
                slot.insert(Arc::new(Mutex::new(account)));
                Ok(id)
            }
        }
    }

    /// Open a fresh account with an allocated id and an opening balance
    pub fn open_account(&self, balance: Amount) -> Result<ParticipantId> {
        let account = ParticipantAccount::funded(self.allocator.allocate(), balance)
            .map_err(|_| VenueError::InvalidAmount(balance))?;
        self.register_participant(account)
    }

    // ========== Order Entry ==========

    /// Submit an order to the book for `code`.
    ///
    /// Rests the order when there is no exact counter-order, otherwise
    /// settles it against the earliest one. When settlement is refused on a
    /// business rule the incoming order is rested too, so both sides stay
    /// live, and the refusal is returned.
    pub fn submit_order(&self, code: &InstrumentCode, order: Order) -> Result<SubmitOutcome> {
        if let Err(e) = order.validate() {
            warn!("Rejected order {} on {}: {}", order.id, code, e);
            return Err(e.into());
        }
        let book = self.book(code)?;
        if !self.accounts.contains_key(&order.participant_id) {
            warn!(
                "Rejected order {} on {}: unknown participant {}",
                order.id, code, order.participant_id
            );
            return Err(VenueError::UnknownParticipant(order.participant_id));
        }

        let mut book = book.lock();
        if book.contains(&order.id) {
            warn!("Rejected order {} on {}: duplicate id", order.id, code);
            return Err(VenueError::DuplicateOrder(order.id));
        }

        let Some(resting) = book.find_exact_match(&order).cloned() else {
            let id = order.id.clone();
            book.submit(order)?;
            return Ok(SubmitOutcome::Resting(id));
        };

        match self.settle(&mut book, &resting, &order) {
            Ok(trade) => {
                self.trades.lock().push(trade.clone());
                Ok(SubmitOutcome::Settled(trade))
            }
            Err(e) if e.is_system_fault() => Err(e),
            Err(e) => {
                warn!(
                    "Settlement of {} against {} on {} refused: {}",
                    order.id, resting.id, code, e
                );
                book.submit(order)?;
                Err(e)
            }
        }
    }

    /// Lock the owners of a matched pair and hand them to the engine
    fn settle(&self, book: &mut OrderBook, resting: &Order, incoming: &Order) -> Result<Trade> {
        let now = self.now();
        let resting_owner = self.account_handle(&resting.participant_id)?;

        if resting.participant_id == incoming.participant_id {
            let mut account = resting_owner.lock();
            return self.settlement.settle(
                book,
                SettlementParties::Same(&mut *account),
                resting,
                incoming,
                now,
            );
        }

        let incoming_owner = self.account_handle(&incoming.participant_id)?;
        let (low, high) = if resting.participant_id < incoming.participant_id {
            (&resting_owner, &incoming_owner)
        } else {
            (&incoming_owner, &resting_owner)
        };
        let mut low = low.lock();
        let mut high = high.lock();

        let buyer_id = if incoming.is_buy() {
            &incoming.participant_id
        } else {
            &resting.participant_id
        };
        let parties = if &low.id == buyer_id {
            SettlementParties::Distinct {
                buyer: &mut *low,
                seller: &mut *high,
            }
        } else {
            SettlementParties::Distinct {
                buyer: &mut *high,
                seller: &mut *low,
            }
        };

        self.settlement
            .settle(book, parties, resting, incoming, now)
    }

    /// Take a resting order off its book
    pub fn withdraw_order(&self, code: &InstrumentCode, order_id: &OrderId) -> Result<Order> {
        let book = self.book(code)?;
        let order = book
            .lock()
            .remove(order_id, RemovalReason::Withdrawn)?;
        debug!("Withdrew order {} from {}", order.id, code);
        Ok(order)
    }

    // ========== Queries ==========

    pub fn instrument(&self, code: &InstrumentCode) -> Result<Instrument> {
        self.instruments
            .get(code)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| VenueError::UnknownInstrument(code.clone()))
    }

    /// Copy of an account as it is now
    pub fn account(&self, id: &ParticipantId) -> Result<ParticipantAccount> {
        let account = self.account_handle(id)?;
        let snapshot = account.lock().clone();
        Ok(snapshot)
    }

    pub fn book_snapshot(&self, code: &InstrumentCode) -> Result<BookSnapshot> {
        let book = self.book(code)?;
        let snapshot = book.lock().snapshot();
        Ok(snapshot)
    }

    pub fn order_state(&self, code: &InstrumentCode, order_id: &OrderId) -> Result<OrderState> {
        let book = self.book(code)?;
        let state = book.lock().order_state(order_id);
        state.ok_or_else(|| VenueError::OrderNotFound(order_id.clone()))
    }

    /// Venue-wide trade history, oldest first
    pub fn trades(&self) -> Vec<Trade> {
        self.trades.lock().clone()
    }

    pub fn snapshot(&self) -> VenueSnapshot {
        let mut instruments: Vec<Instrument> = self
            .instruments
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        instruments.sort_by(|a, b| a.code.cmp(&b.code));

        let mut books: Vec<BookSnapshot> = self
            .shared_books()
            .iter()
            .map(|book| book.lock().snapshot())
            .collect();
        books.sort_by(|a, b| a.instrument_code.cmp(&b.instrument_code));

        let handles: Vec<SharedAccount> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut accounts: Vec<ParticipantAccount> =
            handles.iter().map(|account| account.lock().clone()).collect();
        accounts.sort_by(|a, b| a.id.cmp(&b.id));

        VenueSnapshot {
            name: self.name.clone(),
            instruments,
            accounts,
            books,
            trades: self.trades(),
        }
    }

    // ========== Registry lookups ==========

    // Handles are cloned out of the maps so no shard guard is held while
    // the inner lock is taken.

    fn book(&self, code: &InstrumentCode) -> Result<SharedBook> {
        self.books
            .get(code)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| VenueError::UnknownInstrument(code.clone()))
    }

    fn shared_books(&self) -> Vec<SharedBook> {
        self.books
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    fn account_handle(&self, id: &ParticipantId) -> Result<SharedAccount> {
        self.accounts
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| VenueError::UnknownParticipant(id.clone()))
    }
}
