//! Named failures of the hunting protocol.
//!
//! Everything else travels as `anyhow::Error`; these variants exist so callers
//! can tell protocol faults apart with `downcast_ref`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HuntError {
    /// The classification call returned a token outside the two allowed values.
    #[error("backend returned unrecognized hunt conclusion '{token}'")]
    UnrecognizedConclusion { token: String },

    /// The classification call did not return the expected JSON object.
    #[error("backend returned malformed hunt conclusion: {reason}")]
    MalformedConclusion { reason: String },

    /// A phase that works on the latest cycle ran with an empty ledger.
    #[error("iteration has no hunting cycle to update")]
    NoHuntingCycle,
}
