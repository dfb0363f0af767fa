//! Vote ledger: one ballot per member per bill, with running tallies.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use tracing::debug;

use super::store::{decode_ts, encode_ts, SharedProposalStore, StoreError, StoreResult};
use crate::proposal::{MemberId, ProposalId, ProposalStatus, Vote, VoteChoice};

/// What happened to a ballot handed to [`VoteLedger::cast_while_open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallotOutcome {
    /// Inserted and counted.
    Recorded,
    /// The member had already voted; nothing changed.
    Duplicate,
    /// The bill was not accepting ballots when the transaction ran.
    WindowClosed,
}

/// Records ballots against the proposal store.
#[derive(Clone)]
pub struct VoteLedger {
    store: SharedProposalStore,
}

impl VoteLedger {
    pub fn new(store: SharedProposalStore) -> Self {
        Self { store }
    }

    /// Record a ballot without looking at the bill's status.
    ///
    /// Returns `false` if the member already voted on this bill; the earlier
    /// ballot is kept and the counters are untouched. The ballot insert and the
    /// counter increment commit in the same transaction.
    pub fn cast(
        &self,
        voter: MemberId,
        proposal_id: ProposalId,
        choice: VoteChoice,
    ) -> StoreResult<bool> {
        let outcome = self.record(voter, proposal_id, choice, None)?;
        Ok(outcome == BallotOutcome::Recorded)
    }

    /// Record a ballot only if the bill is `voting` and `now < vote_end`.
    ///
    /// The window check runs inside the same immediate transaction as the
    /// insert, so a ballot can never be counted after a close or veto commits.
    pub fn cast_while_open(
        &self,
        voter: MemberId,
        proposal_id: ProposalId,
        choice: VoteChoice,
        now: DateTime<Utc>,
    ) -> StoreResult<BallotOutcome> {
        self.record(voter, proposal_id, choice, Some(now))
    }

    fn record(
        &self,
        voter: MemberId,
        proposal_id: ProposalId,
        choice: VoteChoice,
        open_at: Option<DateTime<Utc>>,
    ) -> StoreResult<BallotOutcome> {
        let cast_at = encode_ts(Utc::now());
        self.store.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let row: Option<(String, Option<String>)> = tx
                .query_row(
                    "SELECT status, vote_end FROM proposals WHERE bill_id = ?1",
                    [proposal_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((status, vote_end)) = row else {
                return Err(StoreError::NotFound(proposal_id));
            };

            if let Some(now) = open_at {
                let status: ProposalStatus = status.parse().map_err(StoreError::Decode)?;
                let vote_end = vote_end.as_deref().map(decode_ts).transpose()?;
                let open =
                    status == ProposalStatus::Voting && vote_end.map_or(false, |end| now < end);
                if !open {
                    debug!(
                        bill_id = proposal_id,
                        voter,
                        status = %status,
                        "Ballot outside vote window"
                    );
                    return Ok(BallotOutcome::WindowClosed);
                }
            }

            let inserted = tx.execute(
                "INSERT OR IGNORE INTO votes (user_id, bill_id, vote_type, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![voter, proposal_id, choice.as_str(), cast_at],
            )?;
            if inserted == 0 {
                debug!(bill_id = proposal_id, voter, "Duplicate ballot rejected");
                return Ok(BallotOutcome::Duplicate);
            }

            let column = choice.counter_column();
            tx.execute(
                &format!(
                    "UPDATE proposals SET {col} = {col} + 1 WHERE bill_id = ?1",
                    col = column
                ),
                [proposal_id],
            )?;
            tx.commit()?;

            debug!(bill_id = proposal_id, voter, choice = %choice, "Ballot recorded");
            Ok(BallotOutcome::Recorded)
        })
    }

    /// A member's recorded choice on a bill, if any
    pub fn get_vote(&self, voter: MemberId, proposal_id: ProposalId) -> StoreResult<Option<VoteChoice>> {
        self.store.with_conn(|conn| {
            let choice: Option<String> = conn
                .query_row(
                    "SELECT vote_type FROM votes WHERE user_id = ?1 AND bill_id = ?2",
                    params![voter, proposal_id],
                    |row| row.get(0),
                )
                .optional()?;
            choice
                .map(|c| c.parse::<VoteChoice>().map_err(StoreError::Decode))
                .transpose()
        })
    }

    /// Every ballot on a bill, oldest first
    pub fn votes_for(&self, proposal_id: ProposalId) -> StoreResult<Vec<Vote>> {
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, vote_type, created_at FROM votes \
                 WHERE bill_id = ?1 ORDER BY vote_id",
            )?;
            let rows = stmt
                .query_map([proposal_id], |row| {
                    Ok((
                        row.get::<_, MemberId>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter()
                .map(|(voter, choice, cast_at)| {
                    Ok(Vote {
                        voter,
                        proposal_id,
                        choice: choice.parse().map_err(StoreError::Decode)?,
                        cast_at: decode_ts(&cast_at)?,
                    })
                })
                .collect()
        })
    }
}
