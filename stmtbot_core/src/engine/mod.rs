//! Conversation state machine.
//!
//! Each sender owns a slot guarded by an async mutex. A transition holds the
//! slot for its whole duration, including awaited lookups and exports, so a
//! second message from the same sender queues behind it. Timer callbacks take
//! the same lock before touching the conversation.

mod state;
mod timer;

pub use state::{ConversationState, SessionData};

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tracing::{debug, error, info, warn};

use crate::{
    ConversationConfig, DocumentExporter, EngineError, LookupService, Messenger, OperatorRouter,
    replies,
};
use state::Conversation;

pub(crate) type Slot = Arc<Mutex<Conversation>>;

/// Notifications for whoever supervises the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationEvent {
    /// The sender went silent through both idle stages and the chat was closed.
    TimedOut { sender: String },
}

pub(crate) struct Shared {
    pub(crate) config: ConversationConfig,
    pub(crate) messenger: Arc<dyn Messenger>,
    lookup: Arc<dyn LookupService>,
    exporter: Arc<dyn DocumentExporter>,
    router: OperatorRouter,
    slots: Mutex<HashMap<String, Slot>>,
    events: broadcast::Sender<ConversationEvent>,
}

impl Shared {
    pub(crate) fn publish(&self, event: ConversationEvent) {
        // No subscriber is fine; the event is informational.
        let _ = self.events.send(event);
    }
}

/// Drives every sender's dialogue. Cheap to clone.
#[derive(Clone)]
pub struct ConversationEngine {
    shared: Arc<Shared>,
}

impl ConversationEngine {
    #[must_use]
    pub fn new(
        config: ConversationConfig,
        messenger: Arc<dyn Messenger>,
        lookup: Arc<dyn LookupService>,
        exporter: Arc<dyn DocumentExporter>,
    ) -> Self {
        let router = OperatorRouter::new(config.operators.clone());
        let (events, _) = broadcast::channel(64);

        info!(
            operators = router.len(),
            trigger = %config.trigger_phrase,
            "Creating conversation engine"
        );

        Self {
            shared: Arc::new(Shared {
                config,
                messenger,
                lookup,
                exporter,
                router,
                slots: Mutex::new(HashMap::new()),
                events,
            }),
        }
    }

    /// Receive engine events such as idle timeouts.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.shared.events.subscribe()
    }

    #[must_use]
    pub fn config(&self) -> &ConversationConfig {
        &self.shared.config
    }

    #[must_use]
    pub fn router(&self) -> &OperatorRouter {
        &self.shared.router
    }

    /// Current state for a sender; unknown senders are `Idle`.
    pub async fn state_of(&self, sender: &str) -> ConversationState {
        match self.existing_slot(sender).await {
            Some(slot) => slot.lock().await.state,
            None => ConversationState::Idle,
        }
    }

    pub async fn session_of(&self, sender: &str) -> Option<SessionData> {
        let slot = self.existing_slot(sender).await?;
        let conversation = slot.lock().await;
        Some(conversation.session.clone())
    }

    /// Whether an idle timer is armed for the sender.
    pub async fn active_timers(&self, sender: &str) -> bool {
        match self.existing_slot(sender).await {
            Some(slot) => slot.lock().await.timers.is_armed(),
            None => false,
        }
    }

    /// Process one inbound message.
    ///
    /// Failures never escape: they are logged, the sender gets a generic
    /// notice and the conversation ends.
    pub async fn handle(&self, sender: &str, text: &str) {
        let body = text.trim();
        let is_trigger = self.shared.config.is_trigger(body);

        // A sweep may drop the slot between lookup and lock; retry on a fresh one.
        let (slot, mut conversation) = loop {
            let slot = if is_trigger {
                self.slot(sender).await
            } else {
                match self.existing_slot(sender).await {
                    Some(slot) => slot,
                    None => return,
                }
            };
            let conversation = Arc::clone(&slot).lock_owned().await;
            if self.is_registered(sender, &slot).await {
                break (slot, conversation);
            }
        };

        if !conversation.state.is_active() && !is_trigger {
            return;
        }

        conversation.cancel_timers();
        let from = conversation.state;

        if let Err(e) = self.transition(sender, &mut conversation, body).await {
            error!(sender = %sender, state = %from, "Conversation failed: {e}");
            if let Err(e) = self
                .shared
                .messenger
                .send_text(sender, replies::UNEXPECTED_FAILURE)
                .await
            {
                warn!(sender = %sender, "Failed to notify sender of failure: {e}");
            }
            conversation.state = ConversationState::Ended;
        }

        if conversation.state != from {
            info!(sender = %sender, from = %from, to = %conversation.state, "State transition");
        }

        if conversation.state.is_active() {
            timer::arm(&self.shared, sender, &slot, &mut conversation);
        }
    }

    /// Number of senders with a slot in memory.
    pub async fn tracked_senders(&self) -> usize {
        self.shared.slots.lock().await.len()
    }

    /// Forget every sender whose conversation is over and not in use.
    ///
    /// `Idle` and `Ended` behave the same as an absent sender, so dropping
    /// them only frees memory. Slots locked by a transition or a timer are
    /// kept for the next sweep. Returns how many were removed.
    pub async fn prune_ended(&self) -> usize {
        let (removed, remaining) = {
            let mut slots = self.shared.slots.lock().await;
            let before = slots.len();
            slots.retain(|_, slot| {
                slot.try_lock()
                    .map_or(true, |conversation| conversation.state.is_active())
            });
            (before - slots.len(), slots.len())
        };
        if removed > 0 {
            debug!(removed, remaining, "Pruned finished conversations");
        }
        removed
    }

    async fn is_registered(&self, sender: &str, slot: &Slot) -> bool {
        let slots = self.shared.slots.lock().await;
        slots.get(sender).is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    async fn existing_slot(&self, sender: &str) -> Option<Slot> {
        let slots = self.shared.slots.lock().await;
        slots.get(sender).cloned()
    }

    async fn slot(&self, sender: &str) -> Slot {
        let mut slots = self.shared.slots.lock().await;
        Arc::clone(slots.entry(sender.to_string()).or_default())
    }

    async fn transition(
        &self,
        sender: &str,
        conversation: &mut Conversation,
        body: &str,
    ) -> Result<(), EngineError> {
        match conversation.state {
            ConversationState::Idle | ConversationState::Ended => {
                self.start(sender, conversation).await
            }
            ConversationState::AwaitingPrimaryKey => {
                self.on_primary_key(sender, conversation, body).await
            }
            ConversationState::AwaitingVerificationKey => {
                self.on_verification_key(sender, conversation, body).await
            }
            ConversationState::MenuOptions => self.on_main_menu(sender, conversation, body).await,
            ConversationState::MenuPostDelivery => {
                self.on_post_delivery_menu(sender, conversation, body).await
            }
            ConversationState::AwaitingRequestText => {
                conversation.session.request_text = Some(body.to_string());
                self.say(sender, replies::REQUESTER_NAME_PROMPT).await?;
                conversation.state = ConversationState::AwaitingRequestName;
                Ok(())
            }
            ConversationState::AwaitingRequestName => {
                self.on_requester_name(sender, conversation, body).await
            }
        }
    }

    async fn start(&self, sender: &str, conversation: &mut Conversation) -> Result<(), EngineError> {
        conversation.session = SessionData::default();
        self.say(sender, &replies::greeting(&self.shared.config.bot_name))
            .await?;
        conversation.state = ConversationState::AwaitingPrimaryKey;
        Ok(())
    }

    async fn on_primary_key(
        &self,
        sender: &str,
        conversation: &mut Conversation,
        primary_key: &str,
    ) -> Result<(), EngineError> {
        match self.shared.lookup.find_by_key(primary_key).await {
            Ok(Some(identity)) => {
                conversation.session.primary_key = Some(primary_key.to_string());
                self.say(sender, &replies::verification_prompt(&identity.display_name))
                    .await?;
                conversation.session.display_name = Some(identity.display_name);
                conversation.state = ConversationState::AwaitingVerificationKey;
            }
            Ok(None) => {
                info!(sender = %sender, "Primary key not found");
                conversation.state = ConversationState::Ended;
                self.say(
                    sender,
                    &replies::primary_key_rejected(&self.shared.config.trigger_phrase),
                )
                .await?;
            }
            Err(e) => {
                warn!(sender = %sender, "Primary key lookup failed: {e}");
                conversation.state = ConversationState::Ended;
                self.say(sender, replies::LOOKUP_FAILED).await?;
            }
        }
        Ok(())
    }

    async fn on_verification_key(
        &self,
        sender: &str,
        conversation: &mut Conversation,
        verification_key: &str,
    ) -> Result<(), EngineError> {
        let primary_key =
            Self::required(sender, conversation.session.primary_key.as_ref(), "primary key")?;

        match self.shared.lookup.verify(&primary_key, verification_key).await {
            Ok(Some(identity)) => {
                conversation.session.verification_key = Some(verification_key.to_string());
                conversation
                    .session
                    .display_name
                    .get_or_insert(identity.display_name);
                self.say(sender, replies::MAIN_MENU).await?;
                conversation.state = ConversationState::MenuOptions;
            }
            Ok(None) => {
                info!(sender = %sender, "Verification key rejected");
                conversation.state = ConversationState::Ended;
                self.say(
                    sender,
                    &replies::verification_rejected(&self.shared.config.trigger_phrase),
                )
                .await?;
            }
            Err(e) => {
                warn!(sender = %sender, "Verification lookup failed: {e}");
                conversation.state = ConversationState::Ended;
                self.say(sender, replies::LOOKUP_FAILED).await?;
            }
        }
        Ok(())
    }

    async fn on_main_menu(
        &self,
        sender: &str,
        conversation: &mut Conversation,
        choice: &str,
    ) -> Result<(), EngineError> {
        match choice {
            "1" => {
                self.deliver_statement(sender, conversation).await?;
                self.say(sender, replies::POST_DELIVERY_MENU).await?;
                conversation.state = ConversationState::MenuPostDelivery;
            }
            "2" => {
                self.say(sender, replies::REQUEST_PROMPT).await?;
                conversation.state = ConversationState::AwaitingRequestText;
            }
            _ => self.say(sender, replies::INVALID_MAIN_OPTION).await?,
        }
        Ok(())
    }

    async fn on_post_delivery_menu(
        &self,
        sender: &str,
        conversation: &mut Conversation,
        choice: &str,
    ) -> Result<(), EngineError> {
        match choice {
            "1" => {
                self.say(sender, replies::REQUEST_PROMPT).await?;
                conversation.state = ConversationState::AwaitingRequestText;
            }
            "2" => {
                conversation.state = ConversationState::Ended;
                self.say(sender, &replies::farewell(&self.shared.config.trigger_phrase))
                    .await?;
            }
            _ => self.say(sender, replies::INVALID_POST_DELIVERY_OPTION).await?,
        }
        Ok(())
    }

    /// Export and send the statement. Empty or failed exports are reported
    /// to the sender and do not abort the conversation.
    async fn deliver_statement(
        &self,
        sender: &str,
        conversation: &Conversation,
    ) -> Result<(), EngineError> {
        let session = &conversation.session;
        let primary_key = Self::required(sender, session.primary_key.as_ref(), "primary key")?;
        let verification_key =
            Self::required(sender, session.verification_key.as_ref(), "verification key")?;

        match self.shared.exporter.export(&primary_key, &verification_key).await {
            Ok(Some(artifact)) => {
                if let Err(e) = self
                    .shared
                    .messenger
                    .send_file(sender, &artifact, replies::STATEMENT_CAPTION)
                    .await
                {
                    warn!(
                        sender = %sender,
                        file = %artifact.file_name,
                        "Failed to send statement: {e}"
                    );
                    self.say(sender, replies::EXPORT_FAILED).await?;
                } else {
                    info!(sender = %sender, file = %artifact.file_name, "Statement delivered");
                }
            }
            Ok(None) => {
                info!(sender = %sender, "No statement rows for key pair");
                self.say(sender, replies::NO_DATA).await?;
            }
            Err(e) => {
                warn!(sender = %sender, "Statement export failed: {e}");
                self.say(sender, replies::EXPORT_FAILED).await?;
            }
        }
        Ok(())
    }

    async fn on_requester_name(
        &self,
        sender: &str,
        conversation: &mut Conversation,
        requester: &str,
    ) -> Result<(), EngineError> {
        conversation.session.requester_name = Some(requester.to_string());
        conversation.state = ConversationState::Ended;

        let request =
            Self::required(sender, conversation.session.request_text.as_ref(), "request text")?;
        self.say(sender, &replies::request_confirmation(&request))
            .await?;

        match self.shared.router.next_operator() {
            Some(operator) => {
                let notice = replies::operator_notice(requester, sender, &request);
                self.say(operator, &notice).await?;
                info!(sender = %sender, operator = %operator, "Request handed off");
            }
            None => warn!(sender = %sender, "No operators configured, request not handed off"),
        }

        self.say(sender, &replies::restart_hint(&self.shared.config.trigger_phrase))
            .await
    }

    async fn say(&self, target: &str, text: &str) -> Result<(), EngineError> {
        self.shared
            .messenger
            .send_text(target, text)
            .await
            .map_err(|source| EngineError::Delivery {
                target: target.to_string(),
                source,
            })
    }

    fn required(
        sender: &str,
        value: Option<&String>,
        field: &'static str,
    ) -> Result<String, EngineError> {
        value.cloned().ok_or_else(|| EngineError::MissingField {
            sender: sender.to_string(),
            field,
        })
    }
}
