//! Configuration errors that prevent an interaction session from starting.
use std::fmt;

use super::channel::ChannelId;

/// Fatal wiring problems detected when a session is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    MissingChannel(ChannelId),
    DuplicateChannel(ChannelId),
    StoreUnavailable,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingChannel(channel) => {
                write!(f, "Channel controller for {} was never wired", channel)
            }
            Self::DuplicateChannel(channel) => {
                write!(f, "Channel controller for {} was wired twice", channel)
            }
            Self::StoreUnavailable => write!(f, "Relationship stats store is not available"),
        }
    }
}

impl std::error::Error for SessionError {}
