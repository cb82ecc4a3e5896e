//! End-to-end scenarios against a ledger wired to in-memory collaborators.
//!
//! Covers: the reference one-week claim, piecewise accrual across top-ups and
//! extensions, size-factor ordering, the recovery ceiling, reentrant custody,
//! boost cohort exhaustion, migration and notify drift.

use std::sync::{Arc, Mutex, OnceLock, Weak};

use tidelock_core::constants::{SECONDS_PER_DAY, SECONDS_PER_MONTH};
use tidelock_core::error::{AccessError, CustodyError, LedgerError};
use tidelock_core::events::LedgerEvent;
use tidelock_core::params::ParameterSnapshot;
use tidelock_core::traits::TokenCustody;
use tidelock_core::types::{Address, PositionId};
use tidelock_curves::{AprWindow, linear_reward, points_accrued, position_apr};
use tidelock_ledger::{EventLog, ManualClock, MemoryCustody, StakingLedger, StaticParams};
use tidelock_tests::helpers::*;

const WEEK: u64 = 7 * SECONDS_PER_DAY;

// ---------------------------------------------------------------------------
// Reference claim
// ---------------------------------------------------------------------------

#[test]
fn one_million_locked_twelve_months_claims_one_week() {
    let fx = Fixture::new(standard_params(), 1, 1_000_000);
    let alice = addr(1);
    let id = fx.ledger.open(&alice, 1_000_000, 12).unwrap();
    fx.clock.advance(WEEK);

    let params = standard_params();
    let apr = position_apr(&params, AprWindow::standard(&params), 12, 1_000_000).unwrap();
    let expected_reward = linear_reward(1_000_000, apr, WEEK).unwrap();
    let expected_points =
        points_accrued(expected_reward, 1, params.points_max, params.points_decay).unwrap();

    assert_eq!(fx.ledger.current_apr(&alice, id).unwrap(), apr);
    let reward = fx.ledger.claim(&alice, id).unwrap();
    assert_eq!(reward, expected_reward);
    assert!((6_200..6_300).contains(&reward), "reward = {reward}");

    let position = fx.ledger.position(&alice, id).unwrap();
    assert_eq!(position.points, expected_points);
    assert_eq!(position.accrued_rewards, 0);
    assert_eq!(fx.custody.balance_of(&alice), USER_BALANCE - 1_000_000 + reward);
    assert_eq!(
        fx.log.last(),
        Some(LedgerEvent::RewardsClaimed {
            owner: alice,
            id,
            reward,
            points_added: expected_points,
            total_points: expected_points,
        })
    );
}

// ---------------------------------------------------------------------------
// Piecewise accrual
// ---------------------------------------------------------------------------

fn apr_at(params: &ParameterSnapshot, lock_months: u32, size: u128) -> u128 {
    position_apr(params, AprWindow::standard(params), lock_months, size).unwrap()
}

#[test]
fn top_up_splits_accrual_at_the_new_principal() {
    let params = standard_params();
    let fx = Fixture::new(params.clone(), 1, 1_000_000);
    let alice = addr(1);
    let id = fx.ledger.open(&alice, 100_000, 12).unwrap();

    fx.clock.advance(3 * SECONDS_PER_DAY);
    fx.ledger.top_up(&alice, id, 50_000).unwrap();
    fx.clock.advance(4 * SECONDS_PER_DAY);
    let reward = fx.ledger.claim(&alice, id).unwrap();

    let before = linear_reward(100_000, apr_at(&params, 12, 100_000), 3 * SECONDS_PER_DAY).unwrap();
    let after = linear_reward(150_000, apr_at(&params, 12, 150_000), 4 * SECONDS_PER_DAY).unwrap();
    assert_eq!(reward, before + after);
}

#[test]
fn extend_lock_splits_accrual_at_the_new_rate() {
    let params = standard_params();
    let fx = Fixture::new(params.clone(), 1, 1_000_000);
    let alice = addr(1);
    let id = fx.ledger.open(&alice, 100_000, 6).unwrap();

    fx.clock.advance(3 * SECONDS_PER_DAY);
    fx.ledger.extend_lock(&alice, id, 12).unwrap();
    fx.clock.advance(4 * SECONDS_PER_DAY);
    let reward = fx.ledger.claim(&alice, id).unwrap();

    let short = apr_at(&params, 6, 100_000);
    let long = apr_at(&params, 12, 100_000);
    assert!(long > short);
    let before = linear_reward(100_000, short, 3 * SECONDS_PER_DAY).unwrap();
    let after = linear_reward(100_000, long, 4 * SECONDS_PER_DAY).unwrap();
    assert_eq!(reward, before + after);
}

// ---------------------------------------------------------------------------
// Size factor ordering
// ---------------------------------------------------------------------------

#[test]
fn larger_stakes_earn_higher_apr_until_saturation() {
    let fx = Fixture::new(standard_params(), 4, 10_000_000);
    let sizes = [50_000u128, 200_000, 1_000_000, 5_000_000];
    let ids: Vec<PositionId> = sizes
        .iter()
        .enumerate()
        .map(|(i, &size)| fx.ledger.open(&addr(i as u8 + 1), size, 12).unwrap())
        .collect();

    let aprs: Vec<u128> = ids
        .iter()
        .enumerate()
        .map(|(i, &id)| fx.ledger.current_apr(&addr(i as u8 + 1), id).unwrap())
        .collect();

    assert!(aprs[0] < aprs[1], "{aprs:?}");
    assert!(aprs[1] < aprs[2], "{aprs:?}");
    // Both beyond S/S0 = 20: size factor pinned.
    assert_eq!(aprs[2], aprs[3]);
}

// ---------------------------------------------------------------------------
// Recovery ceiling
// ---------------------------------------------------------------------------

#[test]
fn recovery_cannot_touch_staked_principal() {
    let fx = Fixture::new(standard_params(), 2, 500_000);
    fx.ledger.open(&addr(1), 3_000_000, 1).unwrap();
    let bob_id = fx.ledger.open(&addr(2), 2_000_000, 1).unwrap();
    assert_eq!(fx.ledger.rewards_available(), 500_000);

    assert_eq!(
        fx.ledger.recover(&treasury(), 500_001, &treasury()),
        Err(LedgerError::InsufficientSurplus { requested: 500_001, available: 500_000 })
    );
    fx.ledger.recover(&treasury(), 500_000, &treasury()).unwrap();
    assert_eq!(fx.ledger.rewards_available(), 0);
    assert!(fx.is_solvent());

    // Rewards can no longer be paid, but principal still comes back.
    fx.clock.advance(SECONDS_PER_MONTH);
    assert!(matches!(
        fx.ledger.close(&addr(2), bob_id),
        Err(LedgerError::InsufficientSurplus { .. })
    ));
    fx.custody.mint(&custody_account(), 1_000_000);
    let (principal, _) = fx.ledger.close(&addr(2), bob_id).unwrap();
    assert_eq!(principal, 2_000_000);
    assert!(fx.is_solvent());
    fx.ledger.check_invariants().unwrap();
}

#[test]
fn recovery_ignores_funding_already_paid_out() {
    let fx = Fixture::new(standard_params(), 1, 1_000_000);
    let alice = addr(1);
    let id = fx.ledger.open(&alice, 1_000_000, 12).unwrap();
    fx.clock.advance(WEEK);
    let reward = fx.ledger.claim(&alice, id).unwrap();

    let stats = fx.ledger.reward_stats();
    assert_eq!(stats.added, 1_000_000);
    assert_eq!(stats.available, stats.added - reward);
    assert!(stats.added > stats.available);
    assert_eq!(
        fx.ledger.recover(&treasury(), stats.added, &treasury()),
        Err(LedgerError::InsufficientSurplus {
            requested: stats.added,
            available: stats.available,
        })
    );
    assert_eq!(fx.ledger.reward_stats().recovered, 0);
    fx.ledger.recover(&treasury(), stats.available, &treasury()).unwrap();
    assert_eq!(fx.ledger.total_staked(), 1_000_000);
    assert!(fx.is_solvent());
}

#[test]
fn outsiders_cannot_recover() {
    let fx = Fixture::new(standard_params(), 1, 500_000);
    assert_eq!(
        fx.ledger.recover(&addr(1), 1, &addr(1)),
        Err(LedgerError::Access(AccessError::Unauthorized {
            caller: addr(1),
            action: "recover"
        }))
    );
}

// ---------------------------------------------------------------------------
// Reentrancy
// ---------------------------------------------------------------------------

/// Custody that calls back into the ledger during every payout.
struct ReentrantCustody {
    inner: MemoryCustody,
    ledger: OnceLock<Weak<StakingLedger>>,
    target: Mutex<Option<(Address, PositionId)>>,
    seen: Mutex<Vec<(Result<u128, LedgerError>, u128)>>,
}

impl TokenCustody for ReentrantCustody {
    fn transfer_in(&self, from: &Address, amount: u128) -> Result<(), CustodyError> {
        self.inner.transfer_in(from, amount)
    }

    fn transfer_out(&self, to: &Address, amount: u128) -> Result<(), CustodyError> {
        let target = *self.target.lock().unwrap();
        if let (Some(ledger), Some((owner, id))) =
            (self.ledger.get().and_then(Weak::upgrade), target)
        {
            let again = ledger.claim(&owner, id);
            let pending = ledger.pending_reward(&owner, id).unwrap_or(u128::MAX);
            self.seen.lock().unwrap().push((again, pending));
        }
        self.inner.transfer_out(to, amount)
    }

    fn balance_of(&self, holder: &Address) -> u128 {
        self.inner.balance_of(holder)
    }

    fn custody_account(&self) -> Address {
        self.inner.custody_account()
    }
}

#[test]
fn reentrant_claim_is_rejected_and_sees_settled_state() {
    let custody = Arc::new(ReentrantCustody {
        inner: MemoryCustody::new(custody_account()),
        ledger: OnceLock::new(),
        target: Mutex::new(None),
        seen: Mutex::new(Vec::new()),
    });
    let alice = addr(1);
    custody.inner.mint(&alice, USER_BALANCE);
    custody.inner.mint(&treasury(), 1_000_000);

    let clock = Arc::new(ManualClock::new(START));
    let ledger = Arc::new(
        StakingLedger::new(custody.clone(), Arc::new(StaticParams(standard_params())), clock.clone())
            .with_events(Arc::new(EventLog::new())),
    );
    custody.ledger.set(Arc::downgrade(&ledger)).unwrap();
    ledger.fund(&treasury(), 1_000_000).unwrap();

    let id = ledger.open(&alice, 1_000_000, 12).unwrap();
    *custody.target.lock().unwrap() = Some((alice, id));
    clock.advance(WEEK);

    let reward = ledger.claim(&alice, id).unwrap();
    assert!(reward > 0);

    let seen = custody.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, Err(LedgerError::Reentrancy));
    assert_eq!(seen[0].1, 0, "callback must observe cleared rewards");
    drop(seen);

    // Exactly one payout happened and the guard was released.
    assert_eq!(ledger.reward_stats().distributed, reward);
    assert_eq!(custody.balance_of(&alice), USER_BALANCE - 1_000_000 + reward);
    *custody.target.lock().unwrap() = None;
    clock.advance(WEEK);
    assert!(ledger.claim(&alice, id).is_ok());
}

// ---------------------------------------------------------------------------
// Boost cohort
// ---------------------------------------------------------------------------

#[test]
fn boost_slots_run_out_and_stay_taken() {
    let params = ParameterSnapshot { max_boost_stakers: 2, ..ParameterSnapshot::default() };
    let fx = Fixture::new(params, 4, 5_000_000);

    let small = fx.ledger.open(&addr(1), 5_000, 1).unwrap();
    assert!(!fx.ledger.position(&addr(1), small).unwrap().is_boosted);

    // Topping up past the minimum admits the position.
    fx.ledger.top_up(&addr(1), small, 5_000).unwrap();
    assert!(fx.ledger.position(&addr(1), small).unwrap().is_boosted);

    let b = fx.ledger.open(&addr(2), 10_000, 1).unwrap();
    let c = fx.ledger.open(&addr(3), 10_000, 1).unwrap();
    assert!(fx.ledger.position(&addr(2), b).unwrap().is_boosted);
    assert!(!fx.ledger.position(&addr(3), c).unwrap().is_boosted);
    assert_eq!(fx.ledger.boost_status().boosted_owners, 2);

    // Closing does not free the slot.
    fx.clock.advance(SECONDS_PER_MONTH);
    fx.ledger.close(&addr(1), small).unwrap();
    assert_eq!(fx.ledger.boost_status().boosted_owners, 2);
    let d = fx.ledger.open(&addr(4), 10_000, 1).unwrap();
    assert!(!fx.ledger.position(&addr(4), d).unwrap().is_boosted);
    fx.ledger.check_invariants().unwrap();
}

#[test]
fn boost_admission_closes_with_window() {
    let fx = Fixture::new(ParameterSnapshot::default(), 1, 1_000_000);
    fx.clock.advance(90 * SECONDS_PER_DAY);
    let id = fx.ledger.open(&addr(1), 50_000, 6).unwrap();
    assert!(!fx.ledger.position(&addr(1), id).unwrap().is_boosted);
    assert!(!fx.ledger.boost_status().window_open);
}

// ---------------------------------------------------------------------------
// Migration
// ---------------------------------------------------------------------------

#[test]
fn migration_hands_value_to_successor_once() {
    let fx = Fixture::new(standard_params(), 1, 1_000_000);
    let alice = addr(1);
    let successor = addr(0x55);
    let id = fx.ledger.open(&alice, 400_000, 3).unwrap();

    fx.clock.advance(SECONDS_PER_MONTH);
    fx.ledger.set_successor(&treasury(), successor).unwrap();
    assert!(matches!(
        fx.ledger.migrate(&alice, id, &successor),
        Err(LedgerError::StillLocked { .. })
    ));

    fx.clock.advance(2 * SECONDS_PER_MONTH);
    let pending = fx.ledger.pending_reward(&alice, id).unwrap();
    let projected = fx.ledger.projected_points(&alice, id).unwrap();
    let moved = fx.ledger.migrate(&alice, id, &successor).unwrap();

    assert_eq!(moved, 400_000 + pending);
    assert_eq!(fx.custody.balance_of(&successor), moved);
    assert_eq!(fx.ledger.total_staked(), 0);
    assert_eq!(fx.ledger.reward_stats().distributed, pending);
    assert_eq!(
        fx.log.last(),
        Some(LedgerEvent::PositionMigrated {
            owner: alice,
            id,
            target: successor,
            principal: 400_000,
            reward: pending,
            final_points: projected,
        })
    );
    assert!(fx.ledger.migrate(&alice, id, &successor).is_err());
}

// ---------------------------------------------------------------------------
// Treasury accounting
// ---------------------------------------------------------------------------

#[test]
fn notify_drift_leaves_available_authoritative() {
    let fx = Fixture::new(standard_params(), 1, 0);
    fx.custody.mint(&custody_account(), 200_000);
    fx.ledger.notify(&treasury(), 200_000).unwrap();
    assert_eq!(fx.ledger.rewards_remaining_accounted(), 200_000);

    // A second notify for the same tokens is refused.
    assert!(matches!(
        fx.ledger.notify(&treasury(), 1),
        Err(LedgerError::NotifyExceedsCustody { .. })
    ));

    fx.ledger.recover(&treasury(), 150_000, &treasury()).unwrap();
    let stats = fx.ledger.reward_stats();
    assert_eq!(stats.available, 50_000);
    assert_eq!(stats.remaining_accounted, 50_000);
}

#[test]
fn paused_ledger_refuses_everything_until_resumed() {
    let fx = Fixture::new(standard_params(), 1, 1_000_000);
    let id = fx.ledger.open(&addr(1), 100_000, 1).unwrap();
    fx.gate.pause();
    fx.clock.advance(WEEK);
    assert_eq!(fx.ledger.claim(&addr(1), id), Err(LedgerError::Access(AccessError::Paused)));
    // Queries are not gated.
    assert!(fx.ledger.pending_reward(&addr(1), id).unwrap() > 0);
    fx.gate.unpause();
    assert!(fx.ledger.claim(&addr(1), id).is_ok());
}

#[test]
fn events_serialize_with_kebab_tags() {
    let fx = Fixture::new(standard_params(), 1, 1_000_000);
    fx.ledger.open(&addr(1), 100_000, 2).unwrap();
    let events = fx.log.events();
    let json = serde_json::to_value(&events[0]).unwrap();
    assert_eq!(json["event"], "position-opened");
    assert_eq!(json["owner"], addr(1).to_string());
}
