#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx_unit_of_work::{Handle, Store, TxHandle};

/// A store call as observed by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Begin(usize),
    /// Statement on the ambient handle (`None`) or on transaction `Some(id)`.
    Exec(Option<usize>, String),
    Commit(usize),
    Rollback(usize),
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    committed: HashMap<String, Vec<String>>,
    next_tx: usize,
    fail_begin: Option<String>,
    fail_exec_prefix: Option<(String, String)>,
    fail_commit: Option<String>,
    fail_rollback: Option<String>,
    stall_commit: bool,
}

/// In-memory store recording every call.
///
/// Understands `insert into <table> values <row>`; rows inserted through a
/// transaction only become visible to the ambient handle on commit.
#[derive(Clone, Default)]
pub struct FakeStore {
    state: Arc<Mutex<State>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_begin(&self, message: &str) {
        self.state.lock().fail_begin = Some(message.to_owned());
    }

    /// Fails any statement starting with `prefix` on a transactional handle.
    pub fn fail_exec_starting_with(&self, prefix: &str, message: &str) {
        self.state.lock().fail_exec_prefix = Some((prefix.to_owned(), message.to_owned()));
    }

    pub fn fail_commit(&self, message: &str) {
        self.state.lock().fail_commit = Some(message.to_owned());
    }

    /// Commits never complete.
    pub fn stall_commit(&self) {
        self.state.lock().stall_commit = true;
    }

    pub fn fail_rollback(&self, message: &str) {
        self.state.lock().fail_rollback = Some(message.to_owned());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Statements executed on any transactional handle, in order.
    pub fn tx_statements(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Exec(Some(_), statement) => Some(statement),
                _ => None,
            })
            .collect()
    }

    /// Rows visible through the ambient handle.
    pub fn rows(&self, table: &str) -> Vec<String> {
        self.state
            .lock()
            .committed
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call);
    }
}

fn parse_insert(statement: &str) -> Option<(String, String)> {
    let rest = statement.strip_prefix("insert into ")?;
    let (table, row) = rest.split_once(" values ")?;
    Some((table.trim().to_owned(), row.trim().to_owned()))
}

#[async_trait]
impl Handle for FakeStore {
    async fn exec(&mut self, statement: &str) -> Result<u64, sqlx::Error> {
        self.record(Call::Exec(None, statement.to_owned()));
        match parse_insert(statement) {
            Some((table, row)) => {
                self.state.lock().committed.entry(table).or_default().push(row);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl Store for FakeStore {
    type Tx = FakeTx;

    async fn begin(&self) -> Result<FakeTx, sqlx::Error> {
        let id = {
            let mut state = self.state.lock();
            if let Some(message) = state.fail_begin.clone() {
                return Err(sqlx::Error::Protocol(message));
            }
            state.next_tx += 1;
            state.next_tx
        };
        self.record(Call::Begin(id));
        Ok(FakeTx {
            id,
            store: self.clone(),
            pending: Vec::new(),
        })
    }
}

/// Transactional handle buffering inserts until commit.
pub struct FakeTx {
    pub id: usize,
    store: FakeStore,
    pending: Vec<(String, String)>,
}

impl FakeTx {
    /// Rows visible inside this transaction.
    pub fn rows(&self, table: &str) -> Vec<String> {
        let mut rows = self.store.rows(table);
        rows.extend(
            self.pending
                .iter()
                .filter(|(t, _)| t == table)
                .map(|(_, row)| row.clone()),
        );
        rows
    }
}

#[async_trait]
impl Handle for FakeTx {
    async fn exec(&mut self, statement: &str) -> Result<u64, sqlx::Error> {
        self.store.record(Call::Exec(Some(self.id), statement.to_owned()));
        let failure = self.store.state.lock().fail_exec_prefix.clone();
        if let Some((prefix, message)) = failure {
            if statement.starts_with(&prefix) {
                return Err(sqlx::Error::Protocol(message));
            }
        }
        match parse_insert(statement) {
            Some(insert) => {
                self.pending.push(insert);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl TxHandle for FakeTx {
    async fn commit(self) -> Result<(), sqlx::Error> {
        self.store.record(Call::Commit(self.id));
        let stalled = self.store.state.lock().stall_commit;
        if stalled {
            std::future::pending::<()>().await;
        }
        let mut state = self.store.state.lock();
        if let Some(message) = state.fail_commit.clone() {
            return Err(sqlx::Error::Protocol(message));
        }
        for (table, row) in self.pending {
            state.committed.entry(table).or_default().push(row);
        }
        Ok(())
    }

    async fn rollback(self) -> Result<(), sqlx::Error> {
        self.store.record(Call::Rollback(self.id));
        match self.store.state.lock().fail_rollback.clone() {
            Some(message) => Err(sqlx::Error::Protocol(message)),
            None => Ok(()),
        }
    }
}
