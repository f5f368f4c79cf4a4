//! Typed callback payloads, one per category.

use std::sync::Arc;

use super::Query;
use crate::domain::{Answer, EngineStatus};

#[derive(Debug, Clone)]
pub struct StartEvent {
    pub query: Query,
}

#[derive(Debug, Clone)]
pub struct AnswerEvent {
    pub query: Query,
    pub answer: Arc<Answer>,
}

#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub query: Query,
    pub status: EngineStatus,
}

#[derive(Debug, Clone)]
pub struct CancelEvent {
    pub query: Query,
}

#[derive(Debug, Clone)]
pub struct FinishEvent {
    pub query: Query,
}
