//! Native messaging wire types

use super::framing::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Query mode, echoed back in the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Read,
    Write,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// A query exactly as the extension sends it.
///
/// `{"profile": "...", "mode": "read" | "write", "text": "..." | null}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub profile: String,
    pub mode: Mode,
    #[serde(default)]
    pub text: Option<String>,
}

/// A validated query. The profile is still raw; normalization happens at
/// dispatch so a bad profile can be answered instead of ending the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Read { profile: String },
    Write { profile: String, text: String },
}

impl Request {
    pub fn mode(&self) -> Mode {
        match self {
            Self::Read { .. } => Mode::Read,
            Self::Write { .. } => Mode::Write,
        }
    }

    pub fn profile(&self) -> &str {
        match self {
            Self::Read { profile } | Self::Write { profile, .. } => profile,
        }
    }
}

impl TryFrom<Query> for Request {
    type Error = ProtocolError;

    fn try_from(query: Query) -> Result<Self, Self::Error> {
        match query.mode {
            // text on a read is ignored
            Mode::Read => Ok(Self::Read {
                profile: query.profile,
            }),
            Mode::Write => {
                let text = query.text.ok_or(ProtocolError::MissingText)?;
                Ok(Self::Write {
                    profile: query.profile,
                    text,
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadPayload {
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritePayload {
    pub success: bool,
}

/// Reply to one query.
///
/// Serializes as `{"mode": "read", "payload": {"text": ...}}` or
/// `{"mode": "write", "payload": {"success": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "payload", rename_all = "lowercase")]
pub enum Response {
    Read(ReadPayload),
    Write(WritePayload),
}

impl Response {
    pub fn read(text: Option<String>) -> Self {
        Self::Read(ReadPayload { text })
    }

    pub fn write(success: bool) -> Self {
        Self::Write(WritePayload { success })
    }

    pub fn mode(&self) -> Mode {
        match self {
            Self::Read(_) => Mode::Read,
            Self::Write(_) => Mode::Write,
        }
    }
}
