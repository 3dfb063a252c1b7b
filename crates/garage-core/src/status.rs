//! # Job Status State Machine
//!
//! The job lifecycle as an explicit tagged enum with an enforced transition
//! table. The original system stored status as a free-form string that any
//! page could overwrite; here every status change goes through
//! [`validate_transition`] and illegal edges are rejected with a typed error.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Job Lifecycle                                   │
//! │                                                                         │
//! │   Open ───────────► AwaitingQuotationApproval                           │
//! │    │    (quotation       │           │                                  │
//! │    │     submitted)      │ (approved)│ (rejected)                       │
//! │    │                     ▼           ▼                                  │
//! │    │                AwaitingParts   Open                                │
//! │    │                     │      │                                       │
//! │    │     (subcontract    │      │ (manual)                              │
//! │    │      created)       ▼      ▼                                       │
//! │    │              WithSubcontractor ──────► InProgress                  │
//! │    │                                (returned │   ▲                     │
//! │    └────────────────────────────────────────►│───┘                     │
//! │                                              ▼                          │
//! │   [any active state] ──────────────────► Completed ────► Invoiced       │
//! │                     (completion checker,            (final invoice)     │
//! │                      all billables invoiced)                            │
//! │                                                                         │
//! │   Completed and Invoiced are TERMINAL for the generic update path.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

// =============================================================================
// Job Status
// =============================================================================

/// The status of a repair job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job opened, no procurement underway.
    Open,
    /// A quotation has been submitted and awaits director approval.
    AwaitingQuotationApproval,
    /// Quotation approved; parts on order.
    AwaitingParts,
    /// Work underway in the shop.
    InProgress,
    /// Vehicle or component is with a subcontractor.
    WithSubcontractor,
    /// All billable items invoiced; set only by the completion checker.
    Completed,
    /// Final invoice issued; set only by the invoice writer.
    Invoiced,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::AwaitingQuotationApproval => "awaiting_quotation_approval",
            JobStatus::AwaitingParts => "awaiting_parts",
            JobStatus::InProgress => "in_progress",
            JobStatus::WithSubcontractor => "with_subcontractor",
            JobStatus::Completed => "completed",
            JobStatus::Invoiced => "invoiced",
        }
    }

    /// Whether the job has been closed out (no further status edits).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Invoiced)
    }
}

impl Default for JobStatus {
    fn default() -> Self {
        JobStatus::Open
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Transition Table
// =============================================================================

/// Validates a status transition against the lifecycle table.
///
/// ## Rules
/// - Self-transitions are rejected (no-op updates are not status changes)
/// - `Completed` is reachable from any active state, but only the
///   completion checker calls that edge after the eligibility audit
/// - `Invoiced` is reachable only from `Completed` (final invoice)
/// - Terminal states have no outgoing edges: a completed or invoiced job
///   cannot be reopened through the generic update path
///
/// ## Errors
/// [`CoreError::InvalidStatusTransition`] for any edge not in the table.
pub fn validate_transition(from: JobStatus, to: JobStatus) -> Result<(), CoreError> {
    use JobStatus::*;

    let allowed = match (from, to) {
        // Quotation workflow
        (Open, AwaitingQuotationApproval) => true,
        (AwaitingQuotationApproval, AwaitingParts) => true,
        (AwaitingQuotationApproval, Open) => true, // quotation rejected

        // Parts received / work starts
        (Open, InProgress) => true,
        (AwaitingParts, InProgress) => true,

        // Subcontracting
        (AwaitingParts, WithSubcontractor) => true,
        (InProgress, WithSubcontractor) => true,
        (WithSubcontractor, InProgress) => true, // returned from subcontractor

        // Completion (checker-gated) from any active state
        (Open, Completed)
        | (AwaitingQuotationApproval, Completed)
        | (AwaitingParts, Completed)
        | (InProgress, Completed)
        | (WithSubcontractor, Completed) => true,

        // Final invoice closes the job
        (Completed, Invoiced) => true,

        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(CoreError::InvalidStatusTransition { from, to })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotation_workflow_edges() {
        use JobStatus::*;
        assert!(validate_transition(Open, AwaitingQuotationApproval).is_ok());
        assert!(validate_transition(AwaitingQuotationApproval, AwaitingParts).is_ok());
        assert!(validate_transition(AwaitingQuotationApproval, Open).is_ok());
    }

    #[test]
    fn test_subcontractor_round_trip() {
        use JobStatus::*;
        assert!(validate_transition(AwaitingParts, WithSubcontractor).is_ok());
        assert!(validate_transition(WithSubcontractor, InProgress).is_ok());
        assert!(validate_transition(InProgress, WithSubcontractor).is_ok());
    }

    #[test]
    fn test_completion_and_invoicing() {
        use JobStatus::*;
        assert!(validate_transition(InProgress, Completed).is_ok());
        assert!(validate_transition(WithSubcontractor, Completed).is_ok());
        assert!(validate_transition(Completed, Invoiced).is_ok());
    }

    #[test]
    fn test_terminal_states_cannot_reopen() {
        use JobStatus::*;
        for to in [Open, InProgress, AwaitingParts, WithSubcontractor] {
            assert!(validate_transition(Completed, to).is_err());
            assert!(validate_transition(Invoiced, to).is_err());
        }
        // Invoiced cannot go back to Completed either
        assert!(validate_transition(Invoiced, Completed).is_err());
    }

    #[test]
    fn test_forbidden_shortcuts() {
        use JobStatus::*;
        // Cannot skip the quotation approval step
        assert!(validate_transition(Open, AwaitingParts).is_err());
        // Cannot invoice an uncompleted job
        assert!(validate_transition(InProgress, Invoiced).is_err());
        // Self-transition is not a status change
        assert!(validate_transition(Open, Open).is_err());
    }

    #[test]
    fn test_error_carries_both_states() {
        use JobStatus::*;
        let err = validate_transition(Completed, Open).unwrap_err();
        match err {
            CoreError::InvalidStatusTransition { from, to } => {
                assert_eq!(from, Completed);
                assert_eq!(to, Open);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(JobStatus::Open.as_str(), "open");
        assert_eq!(
            JobStatus::AwaitingQuotationApproval.as_str(),
            "awaiting_quotation_approval"
        );
        assert_eq!(JobStatus::WithSubcontractor.as_str(), "with_subcontractor");
    }
}
