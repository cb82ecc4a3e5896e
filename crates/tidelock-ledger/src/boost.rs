//! Boost cohort admission.

use tidelock_core::params::ParameterSnapshot;
use tidelock_core::types::{PositionId, Timestamp};
use tidelock_curves::boost_window_open;

use crate::position::OwnerAccount;
use crate::state::GlobalTotals;

/// Admit position `id` into the boost cohort if the window is open, a slot is
/// free and its principal meets the minimum.
///
/// Sticky and idempotent: an already boosted position is left alone, and the
/// slot counter moves only on the owner's first boosted position. Returns
/// whether the position was newly admitted.
pub fn try_enroll(
    account: &mut OwnerAccount,
    id: PositionId,
    totals: &mut GlobalTotals,
    params: &ParameterSnapshot,
    program_start: Timestamp,
    now: Timestamp,
) -> bool {
    let owner_has_slot = account.has_boosted;
    let Some(position) = account.get_mut(id) else {
        return false;
    };
    if position.is_boosted
        || !boost_window_open(now, program_start, params.boost_duration)
        || totals.boosted_owners >= params.max_boost_stakers
        || position.principal < params.min_boost_stake
    {
        return false;
    }

    position.is_boosted = true;
    if !owner_has_slot {
        account.has_boosted = true;
        totals.boosted_owners += 1;
    }
    true
}
