//! Property-based tests for settlement invariants
//!
//! These tests use proptest to verify:
//! - Conservation: settlement never creates or destroys value
//! - Monotonic revenue: stream revenue never decreases
//! - Monotonic checkpoints and paid totals per payment stream
//! - Atomicity: a rejected settlement leaves every balance and record untouched
//! - Idempotency: settling twice at one height transfers nothing the second time

use data_loop::{Amount, Ledger, PaymentStreamId, Principal, StreamDraft, StreamId};
use proptest::prelude::*;

const SUBSCRIBERS: [&str; 3] = ["alice", "bob", "carol"];

#[derive(Debug, Clone)]
enum Op {
    Advance(u64),
    Fund(usize, u128),
    Open(usize, u128),
    Settle(usize),
    Close(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let who = 0..SUBSCRIBERS.len();
    prop_oneof![
        (0u64..6).prop_map(Op::Advance),
        (who.clone(), 0u128..500).prop_map(|(w, a)| Op::Fund(w, a)),
        (who.clone(), 0u128..40).prop_map(|(w, r)| Op::Open(w, r)),
        who.clone().prop_map(Op::Settle),
        who.prop_map(Op::Close),
    ]
}

fn provider() -> Principal {
    Principal::from("provider")
}

fn market(min_rate: Option<u128>) -> (Ledger, StreamId) {
    let mut ledger = Ledger::new();
    ledger.register_provider(&provider(), "Provider", 0).unwrap();
    let stream = ledger
        .create_stream(
            &provider(),
            StreamDraft {
                title: "Feed".to_string(),
                base_price: Amount::new(100),
                min_rate: min_rate.map(Amount::new),
                ..Default::default()
            },
            0,
        )
        .unwrap();
    (ledger, stream)
}

/// Balances of every participant plus every payment stream record.
fn snapshot(ledger: &Ledger, stream: StreamId) -> (Vec<Amount>, Vec<Option<(u64, Amount, bool)>>) {
    let mut balances: Vec<Amount> = SUBSCRIBERS
        .iter()
        .map(|s| ledger.balance(&Principal::from(*s)))
        .collect();
    balances.push(ledger.balance(&provider()));

    let records = SUBSCRIBERS
        .iter()
        .map(|s| {
            ledger
                .get_payment_stream(&PaymentStreamId::new(stream, *s))
                .ok()
                .map(|r| (r.checkpoint, r.total_paid, r.is_active()))
        })
        .collect();
    (balances, records)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: invariants hold across arbitrary operation sequences
    #[test]
    fn prop_ledger_invariants(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let (mut ledger, stream) = market(None);
        let mut height = 0u64;
        let mut funded = Amount::ZERO;
        let mut last_revenue = Amount::ZERO;

        for op in ops {
            let before = snapshot(&ledger, stream);

            match op {
                Op::Advance(blocks) => height += blocks,
                Op::Fund(w, amount) => {
                    ledger.fund(&Principal::from(SUBSCRIBERS[w]), Amount::new(amount)).unwrap();
                    funded = funded.checked_add(Amount::new(amount)).unwrap();
                }
                Op::Open(w, rate) => {
                    let result = ledger.start_payment_stream(
                        &Principal::from(SUBSCRIBERS[w]),
                        stream,
                        Amount::new(rate),
                        height,
                    );
                    if rate == 0 {
                        prop_assert!(result.is_err());
                    }
                    if result.is_err() {
                        prop_assert_eq!(&snapshot(&ledger, stream), &before);
                    }
                }
                Op::Settle(w) => {
                    let who = Principal::from(SUBSCRIBERS[w]);
                    let id = PaymentStreamId::new(stream, SUBSCRIBERS[w]);
                    match ledger.process_payment(&who, &id, height) {
                        Ok(amount) => {
                            let after = snapshot(&ledger, stream);
                            prop_assert_eq!(after.0[w], before.0[w].checked_sub(amount).unwrap());
                            prop_assert_eq!(after.0[3], before.0[3].checked_add(amount).unwrap());

                            // Settling again at the same height is a no-op
                            prop_assert_eq!(ledger.process_payment(&who, &id, height), Ok(Amount::ZERO));
                            prop_assert_eq!(snapshot(&ledger, stream), after);
                        }
                        Err(_) => prop_assert_eq!(&snapshot(&ledger, stream), &before),
                    }
                }
                Op::Close(w) => {
                    let who = Principal::from(SUBSCRIBERS[w]);
                    let id = PaymentStreamId::new(stream, SUBSCRIBERS[w]);
                    if ledger.close_payment_stream(&who, &id, height).is_err() {
                        prop_assert_eq!(&snapshot(&ledger, stream), &before);
                    }
                }
            }

            let after = snapshot(&ledger, stream);

            // Conservation: only funding changes the total
            prop_assert_eq!(ledger.total_balance(), Some(funded));

            // The provider only ever receives settlements
            let revenue = ledger.revenue(stream);
            prop_assert_eq!(ledger.balance(&provider()), revenue);
            prop_assert!(revenue >= last_revenue);
            last_revenue = revenue;

            // Checkpoints and paid totals never move backward, across closes and reopens
            for (prev, next) in before.1.iter().zip(after.1.iter()) {
                if let (Some((c0, paid0, _)), Some((c1, paid1, _))) = (prev, next) {
                    prop_assert!(c1 >= c0);
                    prop_assert!(paid1 >= paid0);
                }
            }
        }
    }

    /// Property: settled amount is exactly rate * elapsed
    #[test]
    fn prop_settlement_is_rate_times_elapsed(
        rate in 1u128..1_000,
        start in 0u64..1_000,
        elapsed in 0u64..1_000,
    ) {
        let (mut ledger, stream) = market(None);
        let sub = Principal::from("alice");
        ledger.fund(&sub, Amount::new(rate * u128::from(elapsed))).unwrap();
        let id = ledger.start_payment_stream(&sub, stream, Amount::new(rate), start).unwrap();

        let amount = ledger.process_payment(&sub, &id, start + elapsed).unwrap();

        prop_assert_eq!(amount, Amount::new(rate * u128::from(elapsed)));
        prop_assert_eq!(ledger.balance(&sub), Amount::ZERO);
        prop_assert_eq!(ledger.revenue(stream), amount);
    }

    /// Property: rates below a configured floor are always rejected
    #[test]
    fn prop_rate_floor(min in 1u128..1_000, rate in 0u128..2_000) {
        let (mut ledger, stream) = market(Some(min));
        let result = ledger.start_payment_stream(&Principal::from("alice"), stream, Amount::new(rate), 0);
        prop_assert_eq!(result.is_ok(), rate >= min);
    }
}
