//! Races and model-based properties for the seat registry.

use std::sync::{Arc, Barrier};
use std::thread;

use chrono::Duration;
use fake::faker::internet::en::Username;
use fake::Fake;
use proptest::prelude::*;

use seat_lock::error::{ConfirmError, LockError};
use seat_lock::models::SeatStatus;
use seat_lock::services::{ManualClock, SeatRegistry};

const LOCK_MS: i64 = 1_000;

fn registry(total: u32) -> (Arc<SeatRegistry>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at(0));
    let registry = SeatRegistry::with_clock(total, Duration::milliseconds(LOCK_MS), clock.clone());
    (Arc::new(registry), clock)
}

#[test]
fn only_one_thread_wins_a_lock_race() {
    let (registry, _) = registry(1);
    let contenders = 32;
    let barrier = Arc::new(Barrier::new(contenders));

    let handles: Vec<_> = (0..contenders)
        .map(|i| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            let claimant = format!("{}-{}", Username().fake::<String>(), i);
            thread::spawn(move || {
                barrier.wait();
                registry.lock(1, &claimant).map(|_| claimant)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();

    assert_eq!(winners.len(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| *e == LockError::AlreadyLocked(1)));

    let seat = registry.get(1).unwrap();
    assert_eq!(seat.locked_by.as_ref(), Some(winners[0]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn no_seat_is_booked_twice_under_parallel_load() {
    let (registry, _) = registry(10);

    let tasks: Vec<_> = (0..200u32)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move {
                let seat_id = i % 10 + 1;
                let claimant = format!("user-{}", i);
                match registry.lock(seat_id, &claimant) {
                    Ok(_) => registry.confirm(seat_id, &claimant).ok(),
                    Err(_) => None,
                }
            })
        })
        .collect();

    let booked: Vec<_> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .filter_map(|r| r.unwrap())
        .collect();

    // каждый id подтверждён ровно один раз
    let mut ids: Vec<_> = booked.iter().map(|s| s.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=10).collect::<Vec<_>>());

    assert!(registry
        .list_all()
        .iter()
        .all(|s| s.status == SeatStatus::Booked));
}

#[test]
fn different_seats_do_not_interfere() {
    let (registry, _) = registry(8);
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (1..=8u32)
        .map(|seat_id| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let claimant = format!("owner-{}", seat_id);
                let locked = registry.lock(seat_id, &claimant).is_ok();
                let booked = registry.confirm(seat_id, &claimant).is_ok();
                locked && booked
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

// Последовательная модель одного места для сравнения с реестром
#[derive(Debug, Clone, Copy, PartialEq)]
enum Model {
    Available,
    Locked { by: u8, expires_at: i64 },
    Booked,
}

#[derive(Debug, Clone)]
enum Op {
    Lock(u8),
    Confirm(u8),
    Advance(i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..3).prop_map(Op::Lock),
        (0u8..3).prop_map(Op::Confirm),
        (0i64..=(LOCK_MS + 1)).prop_map(Op::Advance),
    ]
}

proptest! {
    #[test]
    fn registry_matches_sequential_model(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let (registry, clock) = registry(1);
        let mut model = Model::Available;
        let mut confirmations = 0;

        for op in ops {
            let now = clock.millis();
            match op {
                Op::Advance(ms) => clock.advance(Duration::milliseconds(ms)),
                Op::Lock(who) => {
                    let result = registry.lock(1, &format!("c{who}"));
                    let current = model;
                    let expected = match current {
                        Model::Booked => Err(LockError::AlreadyBooked(1)),
                        Model::Locked { expires_at, .. } if now <= expires_at => {
                            Err(LockError::AlreadyLocked(1))
                        }
                        _ => {
                            model = Model::Locked { by: who, expires_at: now + LOCK_MS };
                            Ok(())
                        }
                    };
                    prop_assert_eq!(result.map(|_| ()), expected);
                }
                Op::Confirm(who) => {
                    let result = registry.confirm(1, &format!("c{who}"));
                    let current = model;
                    let expected = match current {
                        Model::Available | Model::Booked => Err(ConfirmError::NotLocked(1)),
                        Model::Locked { by, .. } if by != who => {
                            Err(ConfirmError::ForbiddenClaimant(1))
                        }
                        Model::Locked { expires_at, .. } if now > expires_at => {
                            model = Model::Available;
                            Err(ConfirmError::LockExpired(1))
                        }
                        Model::Locked { .. } => {
                            model = Model::Booked;
                            confirmations += 1;
                            Ok(())
                        }
                    };
                    prop_assert_eq!(result.map(|_| ()), expected);
                }
            }

            let seat = registry.get(1).unwrap();
            match &model {
                Model::Available => {
                    prop_assert_eq!(seat.status, SeatStatus::Available);
                    prop_assert!(seat.locked_by.is_none() && seat.lock_expires_at.is_none());
                }
                Model::Locked { by, expires_at } => {
                    prop_assert_eq!(seat.status, SeatStatus::Locked);
                    prop_assert_eq!(seat.locked_by, Some(format!("c{by}")));
                    prop_assert_eq!(seat.lock_expires_at.map(|t| t.timestamp_millis()), Some(*expires_at));
                }
                Model::Booked => {
                    prop_assert_eq!(seat.status, SeatStatus::Booked);
                    prop_assert!(seat.locked_by.is_none() && seat.lock_expires_at.is_none());
                }
            }
        }

        prop_assert!(confirmations <= 1);
    }
}
