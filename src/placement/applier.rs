//! Event application - commits validated events to the ledger

use crate::core::error::InvariantViolation;
use crate::forces::{ForceLedger, LedgerDelta};
use crate::placement::validator::ValidatedEvent;

/// Applies validated events to a ledger
pub struct EventApplier;

impl EventApplier {
    /// Commit a validated event, returning the before/after delta
    ///
    /// Any failure here means validation and application disagree, which is
    /// an engine bug: the ledger is left untouched and the caller must stop
    /// trusting the session.
    pub fn apply(ledger: &mut ForceLedger, validated: &ValidatedEvent) -> Result<LedgerDelta, InvariantViolation> {
        if validated.ledger_version() != ledger.version() {
            return Err(InvariantViolation::StaleValidation {
                validated: validated.ledger_version(),
                current: ledger.version(),
            });
        }

        let delta = ledger
            .apply_delta(validated.changes())
            .map_err(|e| InvariantViolation::LedgerRefused(e.to_string()))?;

        tracing::info!(
            "Applied {} by {}: {} entries touched, ledger now at version {}",
            validated.event().kind(),
            validated.faction(),
            delta.entries.len(),
            delta.version
        );
        Ok(delta)
    }
}
