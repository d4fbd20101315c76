use std::fmt;

use super::timer::{TimerPair, TimerToken};

/// Where a sender currently is in the dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingPrimaryKey,
    AwaitingVerificationKey,
    MenuOptions,
    MenuPostDelivery,
    AwaitingRequestText,
    AwaitingRequestName,
    Ended,
}

impl ConversationState {
    /// `Idle` and `Ended` only accept the trigger phrase; every other state
    /// consumes any inbound text and keeps idle timers armed.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Idle | Self::Ended)
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingPrimaryKey => "awaiting_primary_key",
            Self::AwaitingVerificationKey => "awaiting_verification_key",
            Self::MenuOptions => "menu_options",
            Self::MenuPostDelivery => "menu_post_delivery",
            Self::AwaitingRequestText => "awaiting_request_text",
            Self::AwaitingRequestName => "awaiting_request_name",
            Self::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// Fields collected from a sender during one conversation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub primary_key: Option<String>,
    pub verification_key: Option<String>,
    pub display_name: Option<String>,
    pub request_text: Option<String>,
    pub requester_name: Option<String>,
}

/// Everything the engine owns for one sender. Guarded by the sender's slot lock.
#[derive(Debug, Default)]
pub(crate) struct Conversation {
    pub(crate) state: ConversationState,
    pub(crate) session: SessionData,
    pub(crate) timers: TimerPair,
    /// Bumped on every cancel; timer tasks carry the value they were armed with.
    pub(crate) generation: u64,
}

impl Conversation {
    /// Abort both timers and invalidate any callback already past its sleep.
    pub(crate) fn cancel_timers(&mut self) {
        self.timers.abort();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Forget timer handles without aborting them. Used from inside a timer
    /// task, which must not abort itself.
    pub(crate) fn release_timers(&mut self) {
        self.timers = TimerPair::default();
        self.generation = self.generation.wrapping_add(1);
    }

    pub(crate) const fn token(&self) -> TimerToken {
        TimerToken {
            armed_state: self.state,
            generation: self.generation,
        }
    }

    /// A timer acts only if nothing moved since it was armed.
    pub(crate) fn is_current(&self, token: TimerToken) -> bool {
        self.generation == token.generation && self.state == token.armed_state
    }
}
