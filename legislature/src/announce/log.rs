//! Announcer that writes announcements to the tracing log.
//!
//! Used by the daemon when no chat transport is attached; every post gets a
//! fresh opaque reference so message-ref bookkeeping still runs end to end.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::info;

use super::{Announcement, Announcer, Channel, RenderError};
use crate::proposal::MessageRef;

/// Logs announcements instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogAnnouncer {
    /// Channel label to print per channel; unset channels use the default name.
    channels: HashMap<Channel, String>,
}

impl LogAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use configured channel identifiers in log lines.
    pub fn with_channels(channels: HashMap<Channel, String>) -> Self {
        Self { channels }
    }

    fn channel_label(&self, channel: Channel) -> String {
        self.channels
            .get(&channel)
            .cloned()
            .unwrap_or_else(|| channel.to_string())
    }

    /// One-line rendering of an announcement.
    pub fn render(announcement: &Announcement) -> String {
        match announcement {
            Announcement::ProposalSubmitted {
                bill_id,
                title,
                proposer,
                ..
            } => format!(
                "Bill #{}: {} (proposed by {}) | Status: Awaiting debate schedule",
                bill_id, title, proposer
            ),
            Announcement::DebateOpened {
                bill_id,
                title,
                vote_start,
                vote_end,
                ..
            } => format!(
                "Bill #{}: {} | Voting starts {} | Voting ends {}",
                bill_id,
                title,
                vote_start.to_rfc3339(),
                vote_end.to_rfc3339()
            ),
            Announcement::VotingOpened {
                bill_id,
                title,
                vote_end,
                ..
            } => format!(
                "Voting - Bill #{}: {} | Voting closes {}",
                bill_id,
                title,
                vote_end.to_rfc3339()
            ),
            Announcement::VotingClosed {
                bill_id,
                title,
                status,
                counts,
                ..
            } => format!(
                "Bill #{}: {} | {} | Status: {}",
                bill_id,
                title,
                counts,
                status.as_str().to_uppercase()
            ),
            Announcement::Vetoed {
                bill_id,
                title,
                reason,
                ..
            } => match reason {
                Some(reason) => format!(
                    "Bill #{}: {} | Status: VETOED | Reason: {}",
                    bill_id, title, reason
                ),
                None => format!("Bill #{}: {} | Status: VETOED", bill_id, title),
            },
        }
    }
}

#[async_trait]
impl Announcer for LogAnnouncer {
    async fn post(&self, announcement: &Announcement) -> Result<MessageRef, RenderError> {
        let message = MessageRef::new(uuid::Uuid::new_v4().to_string());
        info!(
            channel = %self.channel_label(announcement.channel()),
            kind = announcement.kind(),
            message = %message,
            "{}",
            Self::render(announcement)
        );
        Ok(message)
    }

    async fn create_thread(
        &self,
        message: &MessageRef,
        name: &str,
    ) -> Result<MessageRef, RenderError> {
        let thread = MessageRef::new(uuid::Uuid::new_v4().to_string());
        info!(parent = %message, thread = %thread, "Thread opened: {}", name);
        Ok(thread)
    }
}
