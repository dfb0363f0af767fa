//! SQLite-backed proposal store
//!
//! The store is the system of record for lifecycle state. It performs no
//! state-machine validation of its own; callers decide which transitions are
//! legal and use [`ProposalStore::compare_and_set_status`] where two writers
//! may race.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info};

use super::schema::{self, LAW_COLUMNS, PROPOSAL_COLUMNS};
use crate::proposal::{
    Law, MemberId, MessageKind, MessageRef, Proposal, ProposalId, ProposalStatus, VoteCounts,
};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Bill #{0} not found")]
    NotFound(ProposalId),

    #[error("Corrupt row: {0}")]
    Decode(String),

    #[error("Lock poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Shared reference to ProposalStore
pub type SharedProposalStore = Arc<ProposalStore>;

/// Outcome of closing a vote, committed atomically with the law insert.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedVote {
    pub status: ProposalStatus,
    pub counts: VoteCounts,
    pub law: Option<Law>,
}

/// Durable record of proposals, votes and laws
pub struct ProposalStore {
    conn: Mutex<Connection>,
}

impl ProposalStore {
    /// Open or create the store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        info!(path = %path.display(), "Opening proposal store");

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::with_connection(conn)
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        debug!("Opening in-memory proposal store");
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a shared reference to this store
    pub fn shared(self) -> SharedProposalStore {
        Arc::new(self)
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&conn)
    }

    pub(crate) fn with_conn_mut<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T>,
    {
        let mut conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&mut conn)
    }

    // =========================================================================
    // Proposals
    // =========================================================================

    /// Insert a new proposal in `awaiting` status, created now.
    pub fn create(&self, title: &str, body: &str, proposer: MemberId) -> StoreResult<ProposalId> {
        let created_at = encode_ts(Utc::now());
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO proposals (title, text, proposer_id, created_at, status) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    title,
                    body,
                    proposer,
                    created_at,
                    ProposalStatus::Awaiting.as_str()
                ],
            )?;
            let id = conn.last_insert_rowid();
            debug!(bill_id = id, "Proposal created");
            Ok(id)
        })
    }

    /// Get a proposal by id
    pub fn get(&self, id: ProposalId) -> StoreResult<Option<Proposal>> {
        self.with_conn(|conn| fetch_proposal(conn, id))
    }

    /// Get a proposal by id, failing with `NotFound` if absent
    pub fn require(&self, id: ProposalId) -> StoreResult<Proposal> {
        self.get(id)?.ok_or(StoreError::NotFound(id))
    }

    /// Overwrite the status unconditionally
    pub fn set_status(&self, id: ProposalId, status: ProposalStatus) -> StoreResult<()> {
        self.update_one(
            id,
            "UPDATE proposals SET status = ?1 WHERE bill_id = ?2",
            params![status.as_str(), id],
        )
    }

    /// Set `to` only if the current status is one of `from`.
    ///
    /// Returns `false` when the row exists but its status did not match, so
    /// exactly one of several racing writers observes `true`.
    pub fn compare_and_set_status(
        &self,
        id: ProposalId,
        from: &[ProposalStatus],
        to: ProposalStatus,
    ) -> StoreResult<bool> {
        self.with_conn(|conn| {
            let current = fetch_status(conn, id)?.ok_or(StoreError::NotFound(id))?;
            if !from.contains(&current) {
                return Ok(false);
            }
            let changed = conn.execute(
                "UPDATE proposals SET status = ?1 WHERE bill_id = ?2 AND status = ?3",
                params![to.as_str(), id, current.as_str()],
            )?;
            Ok(changed == 1)
        })
    }

    /// Compare-and-set the status and stamp the vote window in one write.
    pub fn transition_with_window(
        &self,
        id: ProposalId,
        from: &[ProposalStatus],
        to: ProposalStatus,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.with_conn(|conn| {
            let current = fetch_status(conn, id)?.ok_or(StoreError::NotFound(id))?;
            if !from.contains(&current) {
                return Ok(false);
            }
            let changed = conn.execute(
                "UPDATE proposals SET status = ?1, vote_start = ?2, vote_end = ?3 \
                 WHERE bill_id = ?4 AND status = ?5",
                params![
                    to.as_str(),
                    encode_ts(start),
                    encode_ts(end),
                    id,
                    current.as_str()
                ],
            )?;
            Ok(changed == 1)
        })
    }

    /// Stamp the vote window
    pub fn set_vote_window(
        &self,
        id: ProposalId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.update_one(
            id,
            "UPDATE proposals SET vote_start = ?1, vote_end = ?2 WHERE bill_id = ?3",
            params![encode_ts(start), encode_ts(end), id],
        )
    }

    /// Record the reference of a rendered announcement
    pub fn set_message_ref(
        &self,
        id: ProposalId,
        kind: MessageKind,
        message: &MessageRef,
    ) -> StoreResult<()> {
        let sql = format!(
            "UPDATE proposals SET {} = ?1 WHERE bill_id = ?2",
            kind.column()
        );
        self.update_one(id, &sql, params![message.as_str(), id])
    }

    /// Proposals in `debating` or `voting` with at least one vote timestamp.
    ///
    /// Used by the scheduler's recovery scan.
    pub fn list_pending(&self) -> StoreResult<Vec<Proposal>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM proposals \
                 WHERE status IN ('debating', 'voting') \
                 AND (vote_start IS NOT NULL OR vote_end IS NOT NULL) \
                 ORDER BY bill_id",
                PROPOSAL_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let raws = stmt
                .query_map([], RawProposal::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            raws.into_iter().map(RawProposal::decode).collect()
        })
    }

    /// Irreversibly delete a proposal and its votes
    pub fn remove(&self, id: ProposalId) -> StoreResult<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM votes WHERE bill_id = ?1", [id])?;
            let removed = tx.execute("DELETE FROM proposals WHERE bill_id = ?1", [id])?;
            if removed == 0 {
                return Err(StoreError::NotFound(id));
            }
            tx.commit()?;
            info!(bill_id = id, "Proposal removed");
            Ok(())
        })
    }

    /// Cached counters of a proposal
    pub fn vote_counts(&self, id: ProposalId) -> StoreResult<VoteCounts> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT yes_count, no_count, abstain_count FROM proposals WHERE bill_id = ?1",
                [id],
                |row| {
                    Ok(VoteCounts {
                        yes: row.get(0)?,
                        no: row.get(1)?,
                        abstain: row.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))
        })
    }

    /// Number of ballot rows referencing a proposal
    pub fn ballot_count(&self, id: ProposalId) -> StoreResult<u32> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM votes WHERE bill_id = ?1",
                [id],
                |row| row.get(0),
            )?)
        })
    }

    /// Close voting in one transaction.
    ///
    /// If the proposal is still `voting`, `decide` picks the final status from
    /// the counters; the status write and (for `passed`) the law insert commit
    /// together. Returns `None` when the proposal is no longer `voting`.
    pub fn close_voting<F>(&self, id: ProposalId, decide: F) -> StoreResult<Option<ClosedVote>>
    where
        F: FnOnce(&VoteCounts) -> ProposalStatus,
    {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let proposal = fetch_proposal(&tx, id)?.ok_or(StoreError::NotFound(id))?;
            if proposal.status != ProposalStatus::Voting {
                return Ok(None);
            }

            let status = decide(&proposal.counts);
            tx.execute(
                "UPDATE proposals SET status = ?1 WHERE bill_id = ?2 AND status = 'voting'",
                params![status.as_str(), id],
            )?;

            let law = if status == ProposalStatus::Passed {
                let enacted_at = Utc::now();
                tx.execute(
                    "INSERT INTO laws (bill_id, title, text, enacted_at) VALUES (?1, ?2, ?3, ?4)",
                    params![id, proposal.title, proposal.body, encode_ts(enacted_at)],
                )?;
                Some(Law {
                    id: tx.last_insert_rowid(),
                    proposal_id: id,
                    title: proposal.title.clone(),
                    text: proposal.body.clone(),
                    enacted_at,
                })
            } else {
                None
            };

            tx.commit()?;
            Ok(Some(ClosedVote {
                status,
                counts: proposal.counts,
                law,
            }))
        })
    }

    // =========================================================================
    // Laws
    // =========================================================================

    /// Enacted laws, newest first
    pub fn list_laws(&self) -> StoreResult<Vec<Law>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM laws ORDER BY enacted_at DESC, law_id DESC",
                LAW_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let raws = stmt
                .query_map([], RawLaw::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            raws.into_iter().map(RawLaw::decode).collect()
        })
    }

    /// The law enacted from a proposal, if any
    pub fn law_for(&self, id: ProposalId) -> StoreResult<Option<Law>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM laws WHERE bill_id = ?1", LAW_COLUMNS);
            conn.query_row(&sql, [id], RawLaw::from_row)
                .optional()?
                .map(RawLaw::decode)
                .transpose()
        })
    }

    fn update_one(&self, id: ProposalId, sql: &str, params: impl rusqlite::Params) -> StoreResult<()> {
        self.with_conn(|conn| {
            if conn.execute(sql, params)? == 0 {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        })
    }
}

// =============================================================================
// Row decoding
// =============================================================================

pub(crate) fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_ts(value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Decode(format!("bad timestamp '{}': {}", value, e)))
}

fn decode_opt_ts(value: Option<String>) -> StoreResult<Option<DateTime<Utc>>> {
    value.as_deref().map(decode_ts).transpose()
}

fn fetch_proposal(conn: &Connection, id: ProposalId) -> StoreResult<Option<Proposal>> {
    let sql = format!(
        "SELECT {} FROM proposals WHERE bill_id = ?1",
        PROPOSAL_COLUMNS
    );
    conn.query_row(&sql, [id], RawProposal::from_row)
        .optional()?
        .map(RawProposal::decode)
        .transpose()
}

fn fetch_status(conn: &Connection, id: ProposalId) -> StoreResult<Option<ProposalStatus>> {
    let status: Option<String> = conn
        .query_row(
            "SELECT status FROM proposals WHERE bill_id = ?1",
            [id],
            |row| row.get(0),
        )
        .optional()?;
    status
        .map(|s| s.parse::<ProposalStatus>().map_err(StoreError::Decode))
        .transpose()
}

/// Untyped proposal row, decoded into [`Proposal`] once at the boundary.
struct RawProposal {
    id: ProposalId,
    title: String,
    body: String,
    proposer: MemberId,
    created_at: String,
    status: String,
    vote_start: Option<String>,
    vote_end: Option<String>,
    proposal_message: Option<String>,
    debate_message: Option<String>,
    vote_message: Option<String>,
    yes: u32,
    no: u32,
    abstain: u32,
}

impl RawProposal {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            body: row.get(2)?,
            proposer: row.get(3)?,
            created_at: row.get(4)?,
            status: row.get(5)?,
            vote_start: row.get(6)?,
            vote_end: row.get(7)?,
            proposal_message: row.get(8)?,
            debate_message: row.get(9)?,
            vote_message: row.get(10)?,
            yes: row.get(11)?,
            no: row.get(12)?,
            abstain: row.get(13)?,
        })
    }

    fn decode(self) -> StoreResult<Proposal> {
        Ok(Proposal {
            id: self.id,
            title: self.title,
            body: self.body,
            proposer: self.proposer,
            created_at: decode_ts(&self.created_at)?,
            status: self.status.parse().map_err(StoreError::Decode)?,
            vote_start: decode_opt_ts(self.vote_start)?,
            vote_end: decode_opt_ts(self.vote_end)?,
            proposal_message: self.proposal_message.map(MessageRef),
            debate_message: self.debate_message.map(MessageRef),
            vote_message: self.vote_message.map(MessageRef),
            counts: VoteCounts {
                yes: self.yes,
                no: self.no,
                abstain: self.abstain,
            },
        })
    }
}

struct RawLaw {
    id: i64,
    proposal_id: ProposalId,
    title: String,
    text: String,
    enacted_at: String,
}

impl RawLaw {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            proposal_id: row.get(1)?,
            title: row.get(2)?,
            text: row.get(3)?,
            enacted_at: row.get(4)?,
        })
    }

    fn decode(self) -> StoreResult<Law> {
        Ok(Law {
            id: self.id,
            proposal_id: self.proposal_id,
            title: self.title,
            text: self.text,
            enacted_at: decode_ts(&self.enacted_at)?,
        })
    }
}
