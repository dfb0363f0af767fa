//! Administrative surface
//!
//! Staff commands bypass normal timing but go through the same transition
//! handlers, so the store and scheduler stay consistent for recovery. Every
//! command answers with an [`AdminReply`] carrying a human-readable status
//! line; infrastructure failures are logged and reported as `Failed`.

use serde::{Deserialize, Serialize};
use tracing::error;

use super::error::LifecycleError;
use super::handlers::Legislature;
use crate::proposal::{Law, ProposalId, ProposalStatus};

/// Outcome category of an administrative command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminStatus {
    Success,
    NotFound,
    /// The bill's current status does not allow the command.
    Rejected,
    Failed,
}

/// Response for administrative commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminReply {
    pub status: AdminStatus,
    pub message: String,
}

impl AdminReply {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: AdminStatus::Success,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AdminStatus::Success
    }

    fn from_error(bill_id: ProposalId, action: &str, err: LifecycleError) -> Self {
        let status = match &err {
            LifecycleError::NotFound(_) => AdminStatus::NotFound,
            LifecycleError::InvalidTransition { .. } | LifecycleError::InvalidSubmission(_) => {
                AdminStatus::Rejected
            }
            LifecycleError::Storage(_) => {
                error!(bill_id, action, error = %err, "Administrative command failed");
                AdminStatus::Failed
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Open debate for a bill left in `awaiting`, stamping its vote window.
pub async fn open_debate(legislature: &Legislature, bill_id: ProposalId) -> AdminReply {
    match legislature.open_debate(bill_id).await {
        Ok(proposal) => {
            let opens = proposal
                .vote_start
                .map(|start| start.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            AdminReply::success(format!(
                "Debate opened for Bill #{}. Voting starts {}",
                bill_id, opens
            ))
        }
        Err(e) => AdminReply::from_error(bill_id, "open debate", e),
    }
}

/// Start voting now with a fresh window.
pub async fn force_open_voting(legislature: &Legislature, bill_id: ProposalId) -> AdminReply {
    match legislature.force_open_voting(bill_id).await {
        Ok(proposal) => {
            let closes = proposal
                .vote_end
                .map(|end| end.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            AdminReply::success(format!(
                "Voting started for Bill #{}. Voting closes {}",
                bill_id, closes
            ))
        }
        Err(e) => AdminReply::from_error(bill_id, "start voting", e),
    }
}

/// End voting now and apply the tally.
pub async fn force_close_voting(legislature: &Legislature, bill_id: ProposalId) -> AdminReply {
    match legislature.force_close_voting(bill_id).await {
        Ok(closed) => {
            let outcome = match closed.status {
                ProposalStatus::Passed => "PASSED",
                _ => "FAILED",
            };
            AdminReply::success(format!(
                "Voting ended for Bill #{} | {} | Status: {}",
                bill_id, closed.counts, outcome
            ))
        }
        Err(e) => AdminReply::from_error(bill_id, "end voting", e),
    }
}

pub async fn veto(
    legislature: &Legislature,
    bill_id: ProposalId,
    reason: Option<String>,
) -> AdminReply {
    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    match legislature.veto(bill_id, reason.clone()).await {
        Ok(_) => match reason {
            Some(reason) => AdminReply::success(format!("Bill #{} vetoed: {}", bill_id, reason)),
            None => AdminReply::success(format!("Bill #{} vetoed", bill_id)),
        },
        Err(e) => AdminReply::from_error(bill_id, "veto", e),
    }
}

pub async fn archive(legislature: &Legislature, bill_id: ProposalId) -> AdminReply {
    match legislature.archive(bill_id).await {
        Ok(_) => AdminReply::success(format!("Bill #{} archived", bill_id)),
        Err(e) => AdminReply::from_error(bill_id, "archive", e),
    }
}

/// Irreversibly delete a bill and its ballots.
pub async fn remove(legislature: &Legislature, bill_id: ProposalId) -> AdminReply {
    match legislature.remove(bill_id).await {
        Ok(()) => AdminReply::success(format!("Bill #{} removed", bill_id)),
        Err(e) => AdminReply::from_error(bill_id, "remove", e),
    }
}

pub fn show(legislature: &Legislature, bill_id: ProposalId) -> AdminReply {
    match legislature.show(bill_id) {
        Ok(proposal) => AdminReply::success(proposal.status_line()),
        Err(e) => AdminReply::from_error(bill_id, "show", e),
    }
}

/// Enacted laws, newest first
pub fn list_approved_laws(legislature: &Legislature) -> Result<Vec<Law>, LifecycleError> {
    legislature.list_approved_laws()
}

/// One line per law for display.
pub fn format_laws(laws: &[Law]) -> String {
    if laws.is_empty() {
        return "No laws have been enacted yet.".to_string();
    }
    laws.iter()
        .map(|law| {
            format!(
                "Act #{} (Bill #{}): {} | enacted {}",
                law.id,
                law.proposal_id,
                law.title,
                law.enacted_at.format("%Y-%m-%d")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
