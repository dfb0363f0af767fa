//! Table definitions for the SQLite proposal store
//!
//! Three tables: one row per bill, one row per cast ballot (unique on
//! voter + bill), and the append-only law archive.

use rusqlite::Connection;

/// One row per bill
pub const TABLE_PROPOSALS: &str = "proposals";

/// One row per cast ballot
pub const TABLE_VOTES: &str = "votes";

/// Append-only enacted laws
pub const TABLE_LAWS: &str = "laws";

/// All table names
pub const ALL_TABLES: &[&str] = &[TABLE_PROPOSALS, TABLE_VOTES, TABLE_LAWS];

/// Column list used by every proposal SELECT, in decode order.
pub const PROPOSAL_COLUMNS: &str = "bill_id, title, text, proposer_id, created_at, status, \
     vote_start, vote_end, proposal_message_id, debate_message_id, vote_message_id, \
     yes_count, no_count, abstain_count";

/// Column list used by every law SELECT, in decode order.
pub const LAW_COLUMNS: &str = "law_id, bill_id, title, text, enacted_at";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS proposals (
    bill_id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    text TEXT NOT NULL,
    proposer_id INTEGER NOT NULL,
    proposal_message_id TEXT,
    debate_message_id TEXT,
    vote_message_id TEXT,
    status TEXT NOT NULL DEFAULT 'awaiting',
    created_at TEXT NOT NULL,
    vote_start TEXT,
    vote_end TEXT,
    yes_count INTEGER NOT NULL DEFAULT 0 CHECK (yes_count >= 0),
    no_count INTEGER NOT NULL DEFAULT 0 CHECK (no_count >= 0),
    abstain_count INTEGER NOT NULL DEFAULT 0 CHECK (abstain_count >= 0)
);

CREATE INDEX IF NOT EXISTS idx_proposals_status ON proposals(status);

CREATE TABLE IF NOT EXISTS votes (
    vote_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    bill_id INTEGER NOT NULL,
    vote_type TEXT NOT NULL CHECK (vote_type IN ('yes', 'no', 'abstain')),
    created_at TEXT NOT NULL,
    UNIQUE(user_id, bill_id),
    FOREIGN KEY(bill_id) REFERENCES proposals(bill_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS laws (
    law_id INTEGER PRIMARY KEY AUTOINCREMENT,
    bill_id INTEGER NOT NULL UNIQUE,
    title TEXT NOT NULL,
    text TEXT NOT NULL,
    enacted_at TEXT NOT NULL
);
"#;

/// Create tables and indexes if they do not exist.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)
}
