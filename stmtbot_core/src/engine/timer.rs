//! Two-stage idle timers.
//!
//! Every non-terminal state entry arms a warn timer; when it fires it probes
//! the sender and arms the terminate timer. Both callbacks take the sender's
//! slot lock and compare their `TimerToken` against the conversation before
//! doing anything, so a fire that lost the race with a new message is a no-op.

use std::sync::Arc;

use tokio::task::AbortHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::state::{Conversation, ConversationState};
use super::{ConversationEvent, Shared, Slot};
use crate::replies;

/// Snapshot of the conversation taken when a timer was armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimerToken {
    pub(crate) armed_state: ConversationState,
    pub(crate) generation: u64,
}

#[derive(Debug, Default)]
pub(crate) struct TimerPair {
    pub(crate) warn: Option<AbortHandle>,
    pub(crate) terminate: Option<AbortHandle>,
}

impl TimerPair {
    pub(crate) fn abort(&mut self) {
        if let Some(handle) = self.warn.take() {
            handle.abort();
        }
        if let Some(handle) = self.terminate.take() {
            handle.abort();
        }
    }

    pub(crate) const fn is_armed(&self) -> bool {
        self.warn.is_some() || self.terminate.is_some()
    }
}

/// Arm a fresh warn timer for the conversation's current state.
///
/// The caller must have cancelled the previous pair under the same lock.
pub(crate) fn arm(shared: &Arc<Shared>, sender: &str, slot: &Slot, conversation: &mut Conversation) {
    debug_assert!(!conversation.timers.is_armed());

    let token = conversation.token();
    let task = tokio::spawn(fire_warn(
        Arc::clone(shared),
        sender.to_string(),
        Arc::clone(slot),
        token,
    ));
    conversation.timers.warn = Some(task.abort_handle());

    debug!(
        sender = %sender,
        state = %token.armed_state,
        generation = token.generation,
        "Armed idle timer"
    );
}

async fn fire_warn(shared: Arc<Shared>, sender: String, slot: Slot, token: TimerToken) {
    sleep(shared.config.warn_after()).await;

    let mut conversation = slot.lock().await;
    if !conversation.is_current(token) {
        debug!(sender = %sender, "Stale warn timer ignored");
        return;
    }

    if let Err(e) = shared.messenger.send_text(&sender, replies::STILL_THERE).await {
        warn!(sender = %sender, "Failed to send idle probe: {e}");
    }

    let task = tokio::spawn(fire_terminate(
        Arc::clone(&shared),
        sender.clone(),
        Arc::clone(&slot),
        token,
    ));
    conversation.timers.terminate = Some(task.abort_handle());
}

async fn fire_terminate(shared: Arc<Shared>, sender: String, slot: Slot, token: TimerToken) {
    sleep(shared.config.terminate_after()).await;

    {
        let mut conversation = slot.lock().await;
        if !conversation.is_current(token) {
            debug!(sender = %sender, "Stale terminate timer ignored");
            return;
        }

        let notice = replies::timed_out(&shared.config.trigger_phrase);
        if let Err(e) = shared.messenger.send_text(&sender, &notice).await {
            warn!(sender = %sender, "Failed to send timeout notice: {e}");
        }

        conversation.state = ConversationState::Ended;
        conversation.release_timers();
    }

    info!(sender = %sender, state = %token.armed_state, "Conversation timed out");
    shared.publish(ConversationEvent::TimedOut { sender });
}
