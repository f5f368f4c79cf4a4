//! Engine status codes.

use serde::{Deserialize, Serialize};
use std::fmt;


/// Status code reported by the resolution engine.
///
/// Returned synchronously from boundary calls and delivered asynchronously as
/// the payload of a query's `error` transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    NoError,
    Socket,
    NoMem,
    Syntax,
    ServFail,
    ForkFail,
    AfterFinal,
    InitFail,
    Pipe,
    ReadFile,
    NoId,
    Unknown(i32),
}

impl EngineStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::NoError,
            -1 => Self::Socket,
            -2 => Self::NoMem,
            -3 => Self::Syntax,
            -4 => Self::ServFail,
            -5 => Self::ForkFail,
            -6 => Self::AfterFinal,
            -7 => Self::InitFail,
            -8 => Self::Pipe,
            -9 => Self::ReadFile,
            -10 => Self::NoId,
            other => Self::Unknown(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::NoError => 0,
            Self::Socket => -1,
            Self::NoMem => -2,
            Self::Syntax => -3,
            Self::ServFail => -4,
            Self::ForkFail => -5,
            Self::AfterFinal => -6,
            Self::InitFail => -7,
            Self::Pipe => -8,
            Self::ReadFile => -9,
            Self::NoId => -10,
            Self::Unknown(code) => code,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::NoError
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::NoError => "no error",
            Self::Socket => "socket io error",
            Self::NoMem => "out of memory",
            Self::Syntax => "syntax error",
            Self::ServFail => "server failure",
            Self::ForkFail => "could not fork",
            Self::AfterFinal => "setting change after finalize",
            Self::InitFail => "initialization failure",
            Self::Pipe => "error in pipe communication with async bg worker",
            Self::ReadFile => "error reading from file",
            Self::NoId => "error async_id does not exist",
            Self::Unknown(_) => "unknown error",
        }
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, EngineStatus::NoError)]
    #[case(-1, EngineStatus::Socket)]
    #[case(-4, EngineStatus::ServFail)]
    #[case(-6, EngineStatus::AfterFinal)]
    #[case(-10, EngineStatus::NoId)]
    #[case(-99, EngineStatus::Unknown(-99))]
    fn code_mapping_is_symmetric(#[case] code: i32, #[case] status: EngineStatus) {
        assert_eq!(EngineStatus::from_code(code), status);
        assert_eq!(status.code(), code);
    }

    #[test]
    fn only_no_error_is_ok() {
        assert!(EngineStatus::NoError.is_ok());
        assert!(!EngineStatus::NoId.is_ok());
        assert!(!EngineStatus::Unknown(-99).is_ok());
    }

    #[test]
    fn display_includes_code() {
        assert_eq!(EngineStatus::ServFail.to_string(), "server failure (-4)");
    }
}
