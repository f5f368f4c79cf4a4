//! InMemoryEngine - 開発用の名前解決エンジン
//!
//! # 学習ポイント
//! - UnixStream pair による pollable descriptor（pending がある間だけ 1 byte 残す）
//! - ロックを外してからコールバックする（process 中の再入を許す）
//! - Drop による結果リソースの解放カウント
//!
//! # 使用例
//! ```ignore
//! let engine = InMemoryEngine::new()?;
//! engine.add_a("mycomputer.local", Ipv4Addr::new(192, 0, 2, 51));
//! let ctx = Context::new(engine);
//! ```

use std::collections::{HashMap, VecDeque};
use std::io::{ErrorKind, Read, Write};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::domain::{Answer, EngineStatus, RCODE_NXDOMAIN, RecordClass, RecordType, Token};
use crate::ports::{CompletionHandler, Engine, EngineResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ZoneKey {
    name: String,
    rrtype: RecordType,
    rrclass: RecordClass,
}

impl ZoneKey {
    fn new(name: &str, rrtype: RecordType, rrclass: RecordClass) -> Self {
        Self {
            name: normalize(name),
            rrtype,
            rrclass,
        }
    }
}

/// Names match case-insensitively, with or without the trailing dot.
fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

#[derive(Debug, Clone)]
struct ZoneRecord {
    rdata: Vec<u8>,
    ttl: u32,
}

struct Pending {
    seq: u64,
    token: Token,
    name: String,
    rrtype: RecordType,
    rrclass: RecordClass,
    callback: CompletionHandler,
}

#[derive(Default)]
struct EngineState {
    zone: HashMap<ZoneKey, Vec<ZoneRecord>>,

    /// Names whose lookups complete with an error status.
    failures: HashMap<String, EngineStatus>,

    pending: VecDeque<Pending>,
    next_seq: u64,

    submissions: usize,
    cancel_requests: usize,
    deleted: bool,
}

struct EngineInner {
    state: Mutex<EngineState>,
    notify_tx: UnixStream,
    notify_rx: UnixStream,
    released: Arc<AtomicUsize>,
}

/// Deterministic engine answering from a static zone.
///
/// Every submitted query is ready immediately; completions are delivered by
/// `process()` in submission order. Cloning yields another handle to the same
/// engine.
#[derive(Clone)]
pub struct InMemoryEngine {
    inner: Arc<EngineInner>,
}

impl InMemoryEngine {
    pub fn new() -> std::io::Result<Self> {
        let (notify_tx, notify_rx) = UnixStream::pair()?;
        notify_tx.set_nonblocking(true)?;
        notify_rx.set_nonblocking(true)?;
        Ok(Self {
            inner: Arc::new(EngineInner {
                state: Mutex::new(EngineState::default()),
                notify_tx,
                notify_rx,
                released: Arc::new(AtomicUsize::new(0)),
            }),
        })
    }

    pub fn add_record(
        &self,
        name: &str,
        rrtype: RecordType,
        rrclass: RecordClass,
        rdata: Vec<u8>,
        ttl: u32,
    ) {
        let mut state = self.inner.state.lock();
        state
            .zone
            .entry(ZoneKey::new(name, rrtype, rrclass))
            .or_default()
            .push(ZoneRecord { rdata, ttl });
    }

    pub fn add_a(&self, name: &str, addr: Ipv4Addr) {
        self.add_record(
            name,
            RecordType::A,
            RecordClass::IN,
            addr.octets().to_vec(),
            3600,
        );
    }

    pub fn add_aaaa(&self, name: &str, addr: Ipv6Addr) {
        self.add_record(
            name,
            RecordType::AAAA,
            RecordClass::IN,
            addr.octets().to_vec(),
            3600,
        );
    }

    /// Makes every lookup of `name` complete with `status`.
    pub fn fail_with(&self, name: &str, status: EngineStatus) {
        self.inner
            .state
            .lock()
            .failures
            .insert(normalize(name), status);
    }

    pub fn submissions(&self) -> usize {
        self.inner.state.lock().submissions
    }

    pub fn cancel_requests(&self) -> usize {
        self.inner.state.lock().cancel_requests
    }

    pub fn pending(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Number of results handed out and released again.
    pub fn released_results(&self) -> usize {
        self.inner.released.load(Ordering::SeqCst)
    }

    pub fn is_deleted(&self) -> bool {
        self.inner.state.lock().deleted
    }

    fn lookup(
        &self,
        name: &str,
        rrtype: RecordType,
        rrclass: RecordClass,
    ) -> Result<MemoryResult, EngineStatus> {
        let state = self.inner.state.lock();
        if let Some(status) = state.failures.get(&normalize(name)) {
            return Err(*status);
        }

        let mut answer = Answer::empty(name, rrtype, rrclass);
        match state.zone.get(&ZoneKey::new(name, rrtype, rrclass)) {
            Some(records) if !records.is_empty() => {
                answer.havedata = true;
                answer.data = records.iter().map(|r| r.rdata.clone()).collect();
                answer.ttl = records.iter().map(|r| r.ttl).min().unwrap_or_default();
            }
            _ => {
                let exists = state.zone.keys().any(|key| key.name == normalize(name));
                if !exists {
                    answer.rcode = RCODE_NXDOMAIN;
                }
            }
        }
        Ok(MemoryResult {
            answer,
            released: Arc::clone(&self.inner.released),
        })
    }

    fn notify(&self) {
        if let Err(e) = (&self.inner.notify_tx).write(&[1]) {
            if e.kind() != ErrorKind::WouldBlock {
                warn!("in-memory engine notify failed: {e}");
            }
        }
    }

    fn drain_notifications(&self) {
        let mut buf = [0u8; 64];
        loop {
            match (&self.inner.notify_rx).read(&mut buf) {
                Ok(0) => return,
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => return,
            }
        }
    }

    /// Leaves exactly one byte in the socket while anything is pending, and
    /// none otherwise. Call with the state lock held.
    fn sync_readiness(&self, state: &EngineState) {
        self.drain_notifications();
        if !state.pending.is_empty() {
            self.notify();
        }
    }
}

impl Engine for InMemoryEngine {
    fn resolve_async(
        &self,
        name: &str,
        rrtype: RecordType,
        rrclass: RecordClass,
        token: Token,
        callback: CompletionHandler,
    ) -> EngineStatus {
        if name.trim_end_matches('.').is_empty() {
            return EngineStatus::Syntax;
        }
        {
            let mut state = self.inner.state.lock();
            if state.deleted {
                return EngineStatus::InitFail;
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            state.submissions += 1;
            state.pending.push_back(Pending {
                seq,
                token,
                name: name.to_string(),
                rrtype,
                rrclass,
                callback,
            });
            self.sync_readiness(&state);
        }
        trace!(%token, name, "queued lookup");
        EngineStatus::NoError
    }

    fn cancel(&self, token: Token) -> EngineStatus {
        let mut state = self.inner.state.lock();
        state.cancel_requests += 1;
        let position = state.pending.iter().position(|p| p.token == token);
        match position.and_then(|i| state.pending.remove(i)) {
            Some(_) => {
                self.sync_readiness(&state);
                EngineStatus::NoError
            }
            None => EngineStatus::NoId,
        }
    }

    fn process(&self) -> EngineStatus {
        let horizon = self.inner.state.lock().next_seq;
        loop {
            // pop one at a time: a callback may cancel the next entry
            let next = {
                let mut state = self.inner.state.lock();
                let next = match state.pending.front() {
                    Some(p) if p.seq < horizon => state.pending.pop_front(),
                    _ => None,
                };
                self.sync_readiness(&state);
                next
            };
            let Some(pending) = next else {
                return EngineStatus::NoError;
            };
            match self.lookup(&pending.name, pending.rrtype, pending.rrclass) {
                Ok(result) => (pending.callback)(
                    pending.token,
                    EngineStatus::NoError,
                    Some(Box::new(result)),
                ),
                Err(status) => (pending.callback)(pending.token, status, None),
            }
        }
    }

    fn wait(&self) -> EngineStatus {
        while self.pending() > 0 {
            let status = self.process();
            if !status.is_ok() {
                return status;
            }
        }
        EngineStatus::NoError
    }

    fn resolve(
        &self,
        name: &str,
        rrtype: RecordType,
        rrclass: RecordClass,
    ) -> Result<Box<dyn EngineResult>, EngineStatus> {
        if name.trim_end_matches('.').is_empty() {
            return Err(EngineStatus::Syntax);
        }
        let result = self.lookup(name, rrtype, rrclass)?;
        Ok(Box::new(result))
    }

    fn fd(&self) -> RawFd {
        self.inner.notify_rx.as_raw_fd()
    }

    fn delete(&self) {
        let dropped = {
            let mut state = self.inner.state.lock();
            state.deleted = true;
            let dropped = std::mem::take(&mut state.pending);
            self.sync_readiness(&state);
            dropped
        };
        trace!(pending = dropped.len(), "in-memory engine deleted");
    }
}

/// Result handed to completion handlers; counts its own release.
struct MemoryResult {
    answer: Answer,
    released: Arc<AtomicUsize>,
}

impl EngineResult for MemoryResult {
    fn to_answer(&self) -> Answer {
        self.answer.clone()
    }
}

impl Drop for MemoryResult {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
