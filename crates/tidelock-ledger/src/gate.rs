//! Access gates.

use std::sync::atomic::{AtomicBool, Ordering};

use tidelock_core::error::AccessError;
use tidelock_core::traits::{AccessGate, Action};
use tidelock_core::types::Address;
use tracing::warn;

/// Permits every caller and action.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenGate;

impl AccessGate for OpenGate {
    fn check(&self, _caller: &Address, _action: Action) -> Result<(), AccessError> {
        Ok(())
    }
}

/// Restricts privileged actions to one treasury account and supports a
/// global pause of every mutating action.
#[derive(Debug)]
pub struct TreasuryGate {
    treasury: Address,
    paused: AtomicBool,
}

impl TreasuryGate {
    pub fn new(treasury: Address) -> Self {
        Self { treasury, paused: AtomicBool::new(false) }
    }

    pub fn treasury(&self) -> Address {
        self.treasury
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn unpause(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

impl AccessGate for TreasuryGate {
    fn check(&self, caller: &Address, action: Action) -> Result<(), AccessError> {
        if self.is_paused() {
            return Err(AccessError::Paused);
        }
        if action.is_privileged() && *caller != self.treasury {
            warn!(%caller, action = action.name(), "privileged call rejected");
            return Err(AccessError::Unauthorized { caller: *caller, action: action.name() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_gate_allows_everything() {
        assert!(OpenGate.check(&Address::from_seed(3), Action::Recover).is_ok());
    }

    #[test]
    fn treasury_gate_checks_privileged_caller() {
        let treasury = Address::from_seed(0xee);
        let gate = TreasuryGate::new(treasury);
        let user = Address::from_seed(1);

        assert!(gate.check(&user, Action::Open).is_ok());
        assert!(gate.check(&treasury, Action::Fund).is_ok());
        assert_eq!(
            gate.check(&user, Action::Fund),
            Err(AccessError::Unauthorized { caller: user, action: "fund" })
        );
    }

    #[test]
    fn pause_blocks_all_actions() {
        let treasury = Address::from_seed(0xee);
        let gate = TreasuryGate::new(treasury);
        gate.pause();
        assert_eq!(gate.check(&Address::from_seed(1), Action::Claim), Err(AccessError::Paused));
        assert_eq!(gate.check(&treasury, Action::Recover), Err(AccessError::Paused));
        gate.unpause();
        assert!(gate.check(&treasury, Action::Recover).is_ok());
    }
}
