//! CorrelationStore - 進行中クエリの追跡
//!
//! エンジンに渡した token から Query を引き戻すためのテーブルです。
//!
//! # 実装詳細
//! - slot の配列 + free list（generational arena）
//! - token = slot index + generation。slot を空けるたびに generation を進めるので、
//!   古い token は再利用後の slot に一致しない
//! - QueryId -> Token の逆引きで、同じ Query の再登録は冪等、削除はスキャン不要

use std::collections::HashMap;

use super::Query;
use crate::domain::{QueryId, Token};

#[derive(Debug)]
enum Slot {
    Vacant { generation: u32 },
    Occupied { generation: u32, query: Query },
}

/// Tracks in-flight queries for the resolver.
#[derive(Debug, Default)]
pub struct CorrelationStore {
    slots: Vec<Slot>,

    /// Indices of vacant slots, reused LIFO.
    free: Vec<u32>,

    by_query: HashMap<QueryId, Token>,
}

impl CorrelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `query` and returns the token to hand to the engine.
    ///
    /// Storing a query that is already present returns its existing token.
    pub fn store(&mut self, query: &Query) -> Token {
        if let Some(token) = self.by_query.get(&query.id()) {
            return *token;
        }

        let token = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                let generation = match slot {
                    Slot::Vacant { generation } => *generation,
                    Slot::Occupied { .. } => unreachable!("free list points at occupied slot"),
                };
                *slot = Slot::Occupied {
                    generation,
                    query: query.clone(),
                };
                Token::new(index, generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot::Occupied {
                    generation: 0,
                    query: query.clone(),
                });
                Token::new(index, 0)
            }
        };
        self.by_query.insert(query.id(), token);
        token
    }

    /// Retrieves the query bound to `token`, if the token is still live.
    pub fn lookup(&self, token: Token) -> Option<Query> {
        match self.slots.get(token.index() as usize) {
            Some(Slot::Occupied { generation, query }) if *generation == token.generation() => {
                Some(query.clone())
            }
            _ => None,
        }
    }

    pub fn contains(&self, query: &Query) -> bool {
        self.by_query.contains_key(&query.id())
    }

    /// Removes `query`, returning it if it was present.
    pub fn remove(&mut self, query: &Query) -> Option<Query> {
        let token = self.by_query.remove(&query.id())?;
        self.vacate(token.index())
    }

    /// Enumerates every stored query.
    pub fn each(&self, mut f: impl FnMut(&Query)) {
        for slot in &self.slots {
            if let Slot::Occupied { query, .. } = slot {
                f(query);
            }
        }
    }

    /// Snapshot of the stored queries, safe to iterate while the store changes.
    pub fn queries(&self) -> Vec<Query> {
        let mut queries = Vec::with_capacity(self.len());
        self.each(|query| queries.push(query.clone()));
        queries
    }

    pub fn len(&self) -> usize {
        self.by_query.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_query.is_empty()
    }

    /// Empties the store. Query states are left untouched.
    pub fn clear(&mut self) {
        for index in 0..self.slots.len() {
            self.vacate(index as u32);
        }
        self.by_query.clear();
    }

    fn vacate(&mut self, index: u32) -> Option<Query> {
        let slot = self.slots.get_mut(index as usize)?;
        let generation = match slot {
            Slot::Occupied { generation, .. } => *generation,
            Slot::Vacant { .. } => return None,
        };
        let previous = std::mem::replace(
            slot,
            Slot::Vacant {
                generation: generation.wrapping_add(1),
            },
        );
        self.free.push(index);
        match previous {
            Slot::Occupied { query, .. } => Some(query),
            Slot::Vacant { .. } => None,
        }
    }
}
