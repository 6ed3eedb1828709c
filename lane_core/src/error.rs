use lane_schema::Milliseconds;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    Structure,
    Range,
    Order,
    Timing,
    Config,
}

impl LoadErrorKind {
    pub(crate) fn from_code(code: &'static str) -> Self {
        match code {
            // Structure
            "E1001" | "E1002" => Self::Structure,

            // Range
            "E2001" | "E2002" | "E2003" | "E2004" => Self::Range,

            // Order
            "E3001" | "E3002" | "E3003" | "E3004" => Self::Order,

            // Timing
            "E4001" | "E4002" | "E4003" => Self::Timing,

            // Config
            "E5001" | "E5002" | "E5003" | "E5004" | "E5005" => Self::Config,

            _ => Self::Structure,
        }
    }
}

/// Rejection of a chart or window table at load time.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct LoadError {
    pub code: &'static str,
    pub kind: LoadErrorKind,
    pub message: String,

    pub index: Option<usize>,
    pub lane: Option<u8>,
    pub time: Option<Milliseconds>,
    pub context: Option<String>,
}

impl LoadError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            kind: LoadErrorKind::from_code(code),
            message: message.into(),

            index: None,
            lane: None,
            time: None,
            context: None,
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_lane(mut self, lane: u8) -> Self {
        self.lane = Some(lane);
        self
    }

    pub fn with_time(mut self, time: Milliseconds) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}
