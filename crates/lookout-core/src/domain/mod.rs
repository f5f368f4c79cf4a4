//! Domain model (ids, tokens, record types, status codes, answers, states).

pub mod answer;
pub mod ids;
pub mod record;
pub mod state;
pub mod status;
pub mod token;

pub use self::answer::{Answer, RCODE_NXDOMAIN};
pub use self::ids::QueryId;
pub use self::record::{RecordClass, RecordType};
pub use self::state::{Outcome, QueryState};
pub use self::status::EngineStatus;
pub use self::token::Token;
