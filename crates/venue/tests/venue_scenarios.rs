//! End-to-end order entry scenarios against a single venue

use chrono::{Duration, TimeZone, Utc};
use rust_decimal_macros::dec;
use sigma_clock::ManualClock;
use sigma_venue::model::{
    Holding, Instrument, InstrumentCode, Order, OrderId, OrderState, ParticipantAccount,
    ParticipantId, Trade,
};
use sigma_venue::{ErrorKind, OrderResponse, SubmitOutcome, Venue, VenueError, VenueService};
use std::sync::Arc;

fn init_logger() {
    let _ = env_logger::try_init();
}

fn goog() -> InstrumentCode {
    InstrumentCode::from("GOOG")
}

fn pid(id: &str) -> ParticipantId {
    ParticipantId::from(id)
}

/// GOOG listed; A holds cash, B holds 10 GOOG
fn goog_venue(a_balance: rust_decimal::Decimal) -> Venue {
    init_logger();
    let venue = Venue::new("scenario");
    venue
        .register_instrument(Instrument::new("GOOG", "Google Plc.", dec!(100)))
        .unwrap();
    venue
        .register_participant(ParticipantAccount::funded("A", a_balance).unwrap())
        .unwrap();
    venue
        .register_participant(ParticipantAccount::new("B").with_holding("GOOG", 10, dec!(90)).unwrap())
        .unwrap();
    venue
}

fn settled(outcome: SubmitOutcome) -> Trade {
    match outcome {
        SubmitOutcome::Settled(trade) => trade,
        other => panic!("expected a settlement, got {:?}", other),
    }
}

fn bid_ids(venue: &Venue) -> Vec<String> {
    let book = venue.book_snapshot(&goog()).unwrap();
    book.bids.iter().map(|o| o.id.to_string()).collect()
}

#[test]
fn test_goog_buy_then_sell_settles() {
    let venue = goog_venue(dec!(1000000));

    let outcome = venue
        .submit_order(&goog(), Order::buy("A1", "A", dec!(101), 5))
        .unwrap();
    assert_eq!(outcome, SubmitOutcome::Resting(OrderId::from("A1")));
    assert!(venue.trades().is_empty());

    let trade = settled(
        venue
            .submit_order(&goog(), Order::sell("B1", "B", dec!(101), 5))
            .unwrap(),
    );

    assert_eq!(trade.total_value(), Some(dec!(505)));
    assert_eq!(trade.buyer_id, pid("A"));
    assert_eq!(trade.seller_id, pid("B"));

    let a = venue.account(&pid("A")).unwrap();
    assert_eq!(a.balance(), dec!(999495));
    assert_eq!(a.holding(&goog()), Some(&Holding::new(5, dec!(101))));

    let b = venue.account(&pid("B")).unwrap();
    assert_eq!(b.balance(), dec!(505));
    assert_eq!(b.quantity_held(&goog()), 5);

    let book = venue.book_snapshot(&goog()).unwrap();
    assert!(book.bids.is_empty() && book.asks.is_empty());
    assert_eq!(book.tape, vec![trade.clone()]);
    assert_eq!(venue.trades(), vec![trade.clone()]);
    assert_eq!(a.trade_history(), &[trade.clone()]);
    assert_eq!(b.trade_history(), &[trade]);
    assert_eq!(
        venue.order_state(&goog(), &OrderId::from("A1")).unwrap(),
        OrderState::Matched
    );
    assert_eq!(
        venue.order_state(&goog(), &OrderId::from("B1")).unwrap(),
        OrderState::Matched
    );
}

#[test]
fn test_insufficient_funds_leaves_both_orders_resting() {
    let venue = goog_venue(dec!(50));
    venue
        .submit_order(&goog(), Order::buy("A1", "A", dec!(101), 5))
        .unwrap();

    let err = venue
        .submit_order(&goog(), Order::sell("B1", "B", dec!(101), 5))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    assert!(!err.is_system_fault());

    let book = venue.book_snapshot(&goog()).unwrap();
    assert_eq!(book.bids.len(), 1);
    assert_eq!(book.asks.len(), 1);
    assert!(book.tape.is_empty());

    let a = venue.account(&pid("A")).unwrap();
    let b = venue.account(&pid("B")).unwrap();
    assert_eq!(a.balance(), dec!(50));
    assert_eq!(a.quantity_held(&goog()), 0);
    assert_eq!(b.balance(), dec!(0));
    assert_eq!(b.quantity_held(&goog()), 10);
    assert!(venue.trades().is_empty());
}

#[test]
fn test_insufficient_holdings_rejected() {
    let venue = goog_venue(dec!(1000000));
    venue
        .submit_order(&goog(), Order::buy("A1", "A", dec!(100), 11))
        .unwrap();

    let err = venue
        .submit_order(&goog(), Order::sell("B1", "B", dec!(100), 11))
        .unwrap_err();

    assert_eq!(
        err,
        VenueError::InsufficientHoldings {
            participant: pid("B"),
            instrument: goog(),
            required: 11,
            held: 10,
        }
    );
    assert_eq!(venue.account(&pid("A")).unwrap().balance(), dec!(1000000));
}

#[test]
fn test_only_exact_price_and_quantity_match() {
    let venue = goog_venue(dec!(1000000));
    venue
        .submit_order(&goog(), Order::buy("A1", "A", dec!(101), 5))
        .unwrap();

    let wrong_qty = venue
        .submit_order(&goog(), Order::sell("B1", "B", dec!(101), 4))
        .unwrap();
    let wrong_price = venue
        .submit_order(&goog(), Order::sell("B2", "B", dec!(100), 5))
        .unwrap();
    assert!(wrong_qty.is_resting());
    assert!(wrong_price.is_resting());

    let trade = settled(
        venue
            .submit_order(&goog(), Order::sell("B3", "B", dec!(101), 5))
            .unwrap(),
    );
    assert_eq!(trade.buy_order_id, OrderId::from("A1"));
    assert_eq!(trade.sell_order_id, OrderId::from("B3"));

    let book = venue.book_snapshot(&goog()).unwrap();
    let asks: Vec<&str> = book.asks.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(asks, vec!["B1", "B2"]);
}

#[test]
fn test_first_submitted_match_settles_and_others_keep_order() {
    let venue = goog_venue(dec!(1000000));
    for (id, price) in [("A1", dec!(99)), ("A2", dec!(101)), ("A3", dec!(101)), ("A4", dec!(98))] {
        venue
            .submit_order(&goog(), Order::buy(id, "A", price, 5))
            .unwrap();
    }

    let trade = settled(
        venue
            .submit_order(&goog(), Order::sell("B1", "B", dec!(101), 5))
            .unwrap(),
    );

    assert_eq!(trade.buy_order_id, OrderId::from("A2"));
    assert_eq!(bid_ids(&venue), vec!["A1", "A3", "A4"]);
    assert_eq!(
        venue.order_state(&goog(), &OrderId::from("A3")).unwrap(),
        OrderState::Resting
    );
}

#[test]
fn test_incoming_buy_settles_against_resting_sell() {
    let venue = goog_venue(dec!(1000));
    venue
        .submit_order(&goog(), Order::sell("B1", "B", dec!(20), 10))
        .unwrap();

    let trade = settled(
        venue
            .submit_order(&goog(), Order::buy("A1", "A", dec!(20), 10))
            .unwrap(),
    );

    assert_eq!(trade.sell_order_id, OrderId::from("B1"));
    assert_eq!(venue.account(&pid("A")).unwrap().balance(), dec!(800));
    assert_eq!(venue.account(&pid("B")).unwrap().balance(), dec!(200));
    assert_eq!(venue.account(&pid("B")).unwrap().quantity_held(&goog()), 0);
}

#[test]
fn test_unregistered_lookups_fail_the_same_way_every_time() {
    let venue = goog_venue(dec!(1));
    let msft = InstrumentCode::from("MSFT");

    for _ in 0..3 {
        assert_eq!(
            venue.instrument(&msft).unwrap_err().kind(),
            ErrorKind::UnknownInstrument
        );
        assert_eq!(
            venue.book_snapshot(&msft).unwrap_err().kind(),
            ErrorKind::UnknownInstrument
        );
        assert_eq!(
            venue
                .submit_order(&msft, Order::buy("x", "A", dec!(1), 1))
                .unwrap_err()
                .kind(),
            ErrorKind::UnknownInstrument
        );
        assert_eq!(
            venue.account(&pid("Z")).unwrap_err().kind(),
            ErrorKind::UnknownParticipant
        );
    }

    let snapshot = venue.snapshot();
    assert_eq!(snapshot.instruments.len(), 1);
    assert_eq!(snapshot.books.len(), 1);
    assert_eq!(snapshot.accounts.len(), 2);
}

#[test]
fn test_withdrawn_order_no_longer_matches() {
    let venue = goog_venue(dec!(1000000));
    venue
        .submit_order(&goog(), Order::buy("A1", "A", dec!(101), 5))
        .unwrap();

    venue.withdraw_order(&goog(), &OrderId::from("A1")).unwrap();
    let outcome = venue
        .submit_order(&goog(), Order::sell("B1", "B", dec!(101), 5))
        .unwrap();

    assert!(outcome.is_resting());
    assert_eq!(
        venue.order_state(&goog(), &OrderId::from("A1")).unwrap(),
        OrderState::Withdrawn
    );
}

#[test]
fn test_trades_are_stamped_by_venue_clock() {
    init_logger();
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let venue = Venue::new("clocked").with_clock(clock.clone());
    venue
        .register_instrument(Instrument::new("GOOG", "Google Plc.", dec!(100)))
        .unwrap();
    venue
        .register_participant(ParticipantAccount::funded("A", dec!(1000)).unwrap())
        .unwrap();
    venue
        .register_participant(ParticipantAccount::new("B").with_holding("GOOG", 1, dec!(1)).unwrap())
        .unwrap();

    venue
        .submit_order(&goog(), Order::buy("A1", "A", dec!(10), 1))
        .unwrap();
    clock.advance(Duration::seconds(5));
    let trade = settled(
        venue
            .submit_order(&goog(), Order::sell("B1", "B", dec!(10), 1))
            .unwrap(),
    );

    assert_eq!(trade.timestamp, start + Duration::seconds(5));
}

#[test]
fn test_order_response_shape() {
    let venue = goog_venue(dec!(1000000));

    let resting = OrderResponse::from(venue.submit_order(&goog(), Order::buy("A1", "A", dec!(101), 5)));
    let filled = OrderResponse::from(venue.submit_order(&goog(), Order::sell("B1", "B", dec!(101), 5)));
    let rejected = OrderResponse::from(venue.submit_order(&goog(), Order::sell("B2", "nobody", dec!(1), 1)));

    assert!(resting.is_ok() && resting.trade.is_none());
    assert!(filled.is_ok() && filled.trade.is_some());
    assert!(!rejected.is_ok());
    assert_eq!(rejected.errors.len(), 1);
}

#[test]
fn test_parallel_books_share_accounts_without_lost_updates() {
    let venue = Arc::new(Venue::new("parallel"));
    let codes: Vec<String> = (0..4).map(|i| format!("SYM{}", i)).collect();
    for code in &codes {
        venue
            .register_instrument(Instrument::new(code.as_str(), "", dec!(1)))
            .unwrap();
    }
    let mut seller = ParticipantAccount::new("S");
    for code in &codes {
        seller = seller.with_holding(code.as_str(), 100, dec!(1)).unwrap();
    }
    venue.register_participant(seller).unwrap();
    venue
        .register_participant(ParticipantAccount::funded("B", dec!(10000)).unwrap())
        .unwrap();

    let handles: Vec<_> = codes
        .iter()
        .cloned()
        .map(|code| {
            let venue = Arc::clone(&venue);
            std::thread::spawn(move || {
                let code = InstrumentCode::from(code.as_str());
                for i in 0..25 {
                    venue
                        .submit_order(&code, Order::sell(format!("s{}", i), "S", dec!(2), 1))
                        .unwrap();
                    venue
                        .submit_order(&code, Order::buy(format!("b{}", i), "B", dec!(2), 1))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // 4 books x 25 trades x 2.00
    assert_eq!(venue.trades().len(), 100);
    assert_eq!(venue.account(&pid("B")).unwrap().balance(), dec!(9800));
    assert_eq!(venue.account(&pid("S")).unwrap().balance(), dec!(200));
    for code in &codes {
        let code = InstrumentCode::from(code.as_str());
        assert_eq!(venue.account(&pid("S")).unwrap().quantity_held(&code), 75);
        assert_eq!(venue.account(&pid("B")).unwrap().quantity_held(&code), 25);
    }
}

#[test]
fn test_unrepresentable_order_value_is_rejected_at_entry() {
    let venue = goog_venue(dec!(1000000));
    let price = rust_decimal::Decimal::from(1_000_000_000_000_000u64);

    let err = venue
        .submit_order(&goog(), Order::buy("A1", "A", price, 100_000_000_000_000))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidOrder);
    assert!(!err.is_system_fault());
    let book = venue.book_snapshot(&goog()).unwrap();
    assert!(book.bids.is_empty() && book.asks.is_empty());
    assert_eq!(venue.account(&pid("A")).unwrap().balance(), dec!(1000000));
}

#[test]
fn test_buyer_at_unit_limit_refused_without_losing_value() {
    init_logger();
    let venue = Venue::new("limits");
    venue
        .register_instrument(Instrument::new("GOOG", "Google Plc.", dec!(1)))
        .unwrap();
    venue
        .register_participant(
            ParticipantAccount::funded("A", dec!(100))
                .unwrap()
                .with_holding("GOOG", u64::MAX - 1, dec!(1))
                .unwrap(),
        )
        .unwrap();
    venue
        .register_participant(ParticipantAccount::new("B").with_holding("GOOG", 5, dec!(1)).unwrap())
        .unwrap();

    venue
        .submit_order(&goog(), Order::buy("A1", "A", dec!(1), 5))
        .unwrap();
    let err = venue
        .submit_order(&goog(), Order::sell("B1", "B", dec!(1), 5))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AccountOverflow);
    let a = venue.account(&pid("A")).unwrap();
    let b = venue.account(&pid("B")).unwrap();
    assert_eq!((a.balance(), a.quantity_held(&goog())), (dec!(100), u64::MAX - 1));
    assert_eq!((b.balance(), b.quantity_held(&goog())), (dec!(0), 5));
    assert!(venue.trades().is_empty());
    // both orders stay live, as with any business-rule refusal
    assert_eq!(bid_ids(&venue), vec!["A1"]);
    assert_eq!(
        venue.order_state(&goog(), &OrderId::from("B1")).unwrap(),
        OrderState::Resting
    );
}

#[tokio::test]
async fn test_service_survives_unrepresentable_order() {
    init_logger();
    let handle = VenueService::spawn(Arc::new(goog_venue(dec!(1000))), 8);
    let price = rust_decimal::Decimal::MAX;

    let err = handle
        .submit_order(goog(), Order::sell("B1", "B", price, 2))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOrder);

    let outcome = handle
        .submit_order(goog(), Order::buy("A1", "A", dec!(1), 1))
        .await
        .unwrap();
    assert!(outcome.is_resting());
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_service_handle_runs_scenario() {
    init_logger();
    let handle = VenueService::spawn(Arc::new(Venue::new("async")), 32);

    handle
        .register_instrument(Instrument::new("GOOG", "Google Plc.", dec!(100)))
        .await
        .unwrap();
    handle
        .register_participant(ParticipantAccount::funded("A", dec!(1000000)).unwrap())
        .await
        .unwrap();
    handle
        .register_participant(ParticipantAccount::new("B").with_holding("GOOG", 10, dec!(90)).unwrap())
        .await
        .unwrap();

    let first = handle
        .submit_order(goog(), Order::buy("A1", "A", dec!(101), 5))
        .await
        .unwrap();
    assert!(first.is_resting());

    let second = handle
        .submit_order(goog(), Order::sell("B1", "B", dec!(101), 5))
        .await
        .unwrap();
    assert_eq!(second.trade().and_then(|t| t.total_value()), Some(dec!(505)));

    let a = handle.account(pid("A")).await.unwrap();
    assert_eq!(a.balance(), dec!(999495));

    let err = handle
        .withdraw_order(goog(), OrderId::from("A1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OrderNotFound);

    handle.shutdown().await.unwrap();
    assert_eq!(
        handle.account(pid("A")).await.unwrap_err(),
        VenueError::ServiceUnavailable
    );
}
