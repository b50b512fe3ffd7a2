use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::blocks::MessageTemplate;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    DialogSubmission(DialogSubmissionEvent),
    BlockAction(BlockActionEvent),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::DialogSubmission(_) => SlackEventType::DialogSubmission,
            Self::BlockAction(_) => SlackEventType::BlockAction,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    DialogSubmission,
    BlockAction,
    Unsupported,
}

/// A submitted dialog. `callback_id` names the dialog, `state` carries what
/// the opener attached to it (the reviewer id for schedule dialogs).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DialogSubmissionEvent {
    pub callback_id: String,
    pub team_id: String,
    pub channel_id: String,
    pub user_id: String,
    pub state: Option<String>,
    pub submission: BTreeMap<String, String>,
}

impl DialogSubmissionEvent {
    /// Trimmed value of a submitted field; blank values count as missing.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.submission.get(name).map(|value| value.trim()).filter(|value| !value.is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockActionEvent {
    pub team_id: String,
    pub channel_id: String,
    pub user_id: String,
    pub action_id: String,
    pub value: Option<String>,
    pub response_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_string() }
    }
}

/// What the transport should send back to Slack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatResponse {
    PostMessage { channel_id: String, message: MessageTemplate },
    ReplaceOriginal { response_url: String, message: MessageTemplate },
}

impl ChatResponse {
    pub fn message(&self) -> &MessageTemplate {
        match self {
            Self::PostMessage { message, .. } | Self::ReplaceOriginal { message, .. } => message,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(Vec<ChatResponse>),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error("dialog submission `{callback_id}` is invalid: {reason}")]
    InvalidSubmission { callback_id: String, reason: String },
    #[error("block action `{action_id}` is invalid: {reason}")]
    InvalidAction { action_id: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;
    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Dispatcher with dialog submissions and block actions both routed to
/// `service`.
pub fn interaction_dispatcher<S>(service: S) -> EventDispatcher
where
    S: DialogSubmissionService + BlockActionService + Clone + 'static,
{
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(DialogSubmissionHandler::new(service.clone()));
    dispatcher.register(BlockActionHandler::new(service));
    dispatcher
}

#[async_trait]
pub trait DialogSubmissionService: Send + Sync {
    async fn handle_dialog_submission(
        &self,
        event: &DialogSubmissionEvent,
        ctx: &EventContext,
    ) -> Result<Vec<ChatResponse>, EventHandlerError>;
}

pub struct DialogSubmissionHandler<S> {
    service: S,
}

impl<S> DialogSubmissionHandler<S>
where
    S: DialogSubmissionService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for DialogSubmissionHandler<S>
where
    S: DialogSubmissionService + 'static,
{
    fn event_type(&self) -> SlackEventType {
        SlackEventType::DialogSubmission
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::DialogSubmission(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let responses = self.service.handle_dialog_submission(event, ctx).await?;
        Ok(responded_or_processed(responses))
    }
}

#[async_trait]
pub trait BlockActionService: Send + Sync {
    async fn handle_block_action(
        &self,
        event: &BlockActionEvent,
        ctx: &EventContext,
    ) -> Result<Vec<ChatResponse>, EventHandlerError>;
}

pub struct BlockActionHandler<S> {
    service: S,
}

impl<S> BlockActionHandler<S>
where
    S: BlockActionService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for BlockActionHandler<S>
where
    S: BlockActionService + 'static,
{
    fn event_type(&self) -> SlackEventType {
        SlackEventType::BlockAction
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::BlockAction(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let responses = self.service.handle_block_action(event, ctx).await?;
        Ok(responded_or_processed(responses))
    }
}

fn responded_or_processed(responses: Vec<ChatResponse>) -> HandlerResult {
    if responses.is_empty() {
        HandlerResult::Processed
    } else {
        HandlerResult::Responded(responses)
    }
}
