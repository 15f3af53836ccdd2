//! Per-direction relay engine.
//!
//! Each inbound event passes, in order: loop guard, bind command, readiness
//! guard, scope guard, name and alias resolution, reply-target resolution,
//! send, correlation record. Failures drop the one event; nothing is retried.

use std::sync::Arc;

use {
    chatbridge_channels::{ChannelOutbound, EventReceiver, MessageEvent},
    chatbridge_config::{AliasPlacement, BindingConfig, BindingState, BindingStore, RelayConfig},
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{
    command,
    correlation::{CorrelationTable, Correlations, SourceKey},
    error::{RelayError, Result},
    format::{self, Relayed},
    names,
    side::Side,
};

/// Relay behaviour shared by both directions.
#[derive(Debug, Clone)]
pub struct RelayOptions {
    pub alias_placement: AliasPlacement,
    pub scope_markers: bool,
    pub reply_threading: bool,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            alias_placement: AliasPlacement::default(),
            scope_markers: true,
            reply_threading: true,
        }
    }
}

impl From<&RelayConfig> for RelayOptions {
    fn from(cfg: &RelayConfig) -> Self {
        Self {
            alias_placement: cfg.alias_placement,
            scope_markers: cfg.scope_markers,
            reply_threading: cfg.reply_threading,
        }
    }
}

/// What happened to one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Posted by a bot; never relayed.
    SelfAuthored,
    /// Nothing to relay after trimming.
    Empty,
    /// Bind command handled; binding is now in this state.
    Bound(BindingState),
    /// Bind command could not be completed; an error reply was sent.
    BindFailed,
    /// Binding is not fully established.
    NotReady,
    /// Posted outside the bound channel and its threads.
    OutOfScope,
    /// Relayed as `message_id` in `channel_id`, replying to `reply_to` when set.
    Relayed {
        channel_id: String,
        message_id: String,
        reply_to: Option<String>,
    },
    /// Send or metadata lookup failed; the event was dropped.
    Dropped,
}

/// Where an in-scope event was posted.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope {
    /// The bound channel itself.
    Bound,
    /// A thread or other child conversation of the bound channel.
    Child { name: String },
}

impl Scope {
    fn marker(&self) -> Option<&str> {
        match self {
            Self::Bound => None,
            Self::Child { name } => Some(name),
        }
    }
}

/// Where a relayed message goes and what it replies to.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Delivery {
    channel_id: String,
    reply_to: Option<String>,
}

/// Relay logic for one direction.
pub struct RelayEngine {
    side: Side,
    bind_command: String,
    /// Platform the events come from: acknowledgements, metadata lookups.
    origin: Arc<dyn ChannelOutbound>,
    /// Platform the events are relayed to.
    target: Arc<dyn ChannelOutbound>,
    bindings: Arc<BindingStore>,
    correlations: Arc<Correlations>,
    options: RelayOptions,
}

impl RelayEngine {
    pub fn new(
        side: Side,
        origin: Arc<dyn ChannelOutbound>,
        target: Arc<dyn ChannelOutbound>,
        bindings: Arc<BindingStore>,
        correlations: Arc<Correlations>,
    ) -> Self {
        Self {
            side,
            bind_command: side.default_bind_command().to_string(),
            origin,
            target,
            bindings,
            correlations,
            options: RelayOptions::default(),
        }
    }

    #[must_use]
    pub fn with_bind_command(mut self, bind_command: impl Into<String>) -> Self {
        self.bind_command = bind_command.into();
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: RelayOptions) -> Self {
        self.options = options;
        self
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn bind_command(&self) -> &str {
        &self.bind_command
    }

    /// Drain `events` one at a time until the queue closes or `cancel` fires.
    pub async fn run(self: Arc<Self>, mut events: EventReceiver, cancel: CancellationToken) {
        info!(
            direction = %self.side,
            from = %self.origin.platform(),
            to = %self.target.platform(),
            bind_command = %self.bind_command,
            "relay direction started"
        );
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                next = events.recv() => match next {
                    Some(event) => {
                        self.handle(event).await;
                    },
                    None => break,
                },
            }
        }
        info!(direction = %self.side, "relay direction stopped");
    }

    /// Process a single inbound event. Never fails; errors are logged and
    /// reported as [`Disposition::Dropped`] or [`Disposition::NotReady`].
    pub async fn handle(&self, event: MessageEvent) -> Disposition {
        match self.process(&event).await {
            Ok(disposition) => disposition,
            Err(RelayError::BindingNotReady) => {
                debug!(
                    direction = %self.side,
                    channel_id = %event.channel_id,
                    state = %self.bindings.state(),
                    "binding not ready, ignoring message"
                );
                Disposition::NotReady
            },
            Err(e) => {
                warn!(
                    direction = %self.side,
                    channel_id = %event.channel_id,
                    message_id = %event.message_id,
                    error = %e,
                    "dropping message"
                );
                Disposition::Dropped
            },
        }
    }

    async fn process(&self, event: &MessageEvent) -> Result<Disposition> {
        if event.is_self {
            return Ok(Disposition::SelfAuthored);
        }

        if command::is_bind_command(&event.text, &self.bind_command) {
            return Ok(self.bind(event).await);
        }

        let text = event.text.trim();
        if text.is_empty() {
            return Ok(Disposition::Empty);
        }

        let binding = self.bindings.snapshot();
        if !binding.is_ready() {
            return Err(RelayError::BindingNotReady);
        }

        let Some(scope) = self.resolve_scope(event, &binding).await? else {
            debug!(
                direction = %self.side,
                channel_id = %event.channel_id,
                thread_id = ?event.thread_id,
                "message outside bound channel"
            );
            return Ok(Disposition::OutOfScope);
        };

        let author = names::display_name(event);
        let body = format::compose(
            &Relayed {
                author: &author,
                alias: binding.alias_for(&author),
                scope: scope.marker().filter(|_| self.options.scope_markers),
                text,
                placement: self.options.alias_placement,
            },
            self.target.platform(),
        );

        let delivery = self.resolve_delivery(event, &binding).await;
        let message_id = self
            .target
            .send_text(&delivery.channel_id, &body, delivery.reply_to.as_deref())
            .await
            .map_err(RelayError::TransportSend)?;

        let key = SourceKey::new(&event.channel_id, &event.message_id);
        let copy = SourceKey::new(&delivery.channel_id, &message_id);
        if !self.outgoing().record(key, copy) {
            debug!(
                direction = %self.side,
                message_id = %event.message_id,
                "correlation already recorded, keeping the first"
            );
        }

        info!(
            direction = %self.side,
            from_channel = %event.channel_id,
            to_channel = %delivery.channel_id,
            message_id = %event.message_id,
            relayed_id = %message_id,
            reply_to = ?delivery.reply_to,
            "message relayed"
        );

        Ok(Disposition::Relayed {
            channel_id: delivery.channel_id,
            message_id,
            reply_to: delivery.reply_to,
        })
    }

    async fn bind(&self, event: &MessageEvent) -> Disposition {
        let result = match self.side {
            Side::Source => self
                .bindings
                .register_source(&event.channel_id)
                .map_err(RelayError::ConfigIo),
            Side::Destination => match event.channel_id.parse::<i64>() {
                Ok(chat_id) if chat_id != 0 => self
                    .bindings
                    .register_dest(chat_id)
                    .map_err(RelayError::ConfigIo),
                _ => Err(RelayError::InvalidChatId {
                    id: event.channel_id.clone(),
                }),
            },
        };

        let reply = match &result {
            Ok(state) => {
                info!(
                    direction = %self.side,
                    channel_id = %event.channel_id,
                    state = %state,
                    "binding registered"
                );
                format::bind_ack(self.origin.platform(), &event.channel_id, *state)
            },
            Err(e) => {
                warn!(
                    direction = %self.side,
                    channel_id = %event.channel_id,
                    error = %e,
                    "bind command failed"
                );
                format::bind_failure(e)
            },
        };

        if let Err(e) = self
            .origin
            .send_text(&event.channel_id, &reply, Some(&event.message_id))
            .await
        {
            warn!(
                direction = %self.side,
                channel_id = %event.channel_id,
                error = %e,
                "failed to send bind acknowledgement"
            );
        }

        match result {
            Ok(state) => Disposition::Bound(state),
            Err(_) => Disposition::BindFailed,
        }
    }

    /// `None` when the event was posted outside the bound channel and its
    /// child conversations.
    async fn resolve_scope(
        &self,
        event: &MessageEvent,
        binding: &BindingConfig,
    ) -> Result<Option<Scope>> {
        let bound_id = self.side.bound_id(binding);
        if event.channel_id == bound_id {
            // Named forum topics share the chat id of the bound chat.
            return Ok(Some(match &event.thread_name {
                Some(name) => Scope::Child { name: name.clone() },
                None => Scope::Bound,
            }));
        }

        let meta = self
            .origin
            .lookup_metadata(&event.channel_id)
            .await
            .map_err(RelayError::MetadataLookup)?;
        if meta.parent_id.as_deref() == Some(bound_id.as_str()) {
            Ok(Some(Scope::Child { name: meta.name }))
        } else {
            Ok(None)
        }
    }

    /// Pick the reply target for `event`.
    ///
    /// A reply to a message that originated on this side threads against its
    /// relayed copy, in the channel the copy was delivered to. A reply to a
    /// relayed copy threads against the original. Either may live in a child
    /// conversation of the target channel. Anything unresolved goes out as a
    /// plain message to the bound target.
    async fn resolve_delivery(&self, event: &MessageEvent, binding: &BindingConfig) -> Delivery {
        let target_id = self.side.target_id(binding);
        let plain = Delivery {
            channel_id: target_id.clone(),
            reply_to: None,
        };

        if !self.options.reply_threading {
            return plain;
        }
        let Some(reply_to) = event.reply_to_message_id.as_deref() else {
            return plain;
        };

        let key = SourceKey::new(&event.channel_id, reply_to);
        let found = self
            .outgoing()
            .resolve_forward(&key)
            .or_else(|| self.incoming().resolve_backward(reply_to));
        if let Some(found) = found {
            if self.target_in_scope(&found.channel_id, &target_id).await {
                return Delivery {
                    channel_id: found.channel_id,
                    reply_to: Some(found.message_id),
                };
            }
            debug!(
                direction = %self.side,
                reply_channel = %found.channel_id,
                "reply target no longer in bound scope"
            );
            return plain;
        }

        debug!(
            direction = %self.side,
            reply_to,
            "no correlation for reply target, sending as new message"
        );
        plain
    }

    async fn target_in_scope(&self, channel_id: &str, target_id: &str) -> bool {
        if channel_id == target_id {
            return true;
        }
        match self.target.lookup_metadata(channel_id).await {
            Ok(meta) => meta.parent_id.as_deref() == Some(target_id),
            Err(e) => {
                warn!(
                    direction = %self.side,
                    channel_id,
                    error = %e,
                    "metadata lookup for reply target failed"
                );
                false
            },
        }
    }

    fn outgoing(&self) -> &CorrelationTable {
        self.correlations.outgoing(self.side)
    }

    fn incoming(&self) -> &CorrelationTable {
        self.correlations.incoming(self.side)
    }
}
