use std::sync::Arc;

use {
    chatbridge_channels::{ChannelOutbound, EventReceiver},
    chatbridge_config::{BindingStore, RelayConfig},
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
};

use crate::{
    correlation::Correlations,
    engine::{RelayEngine, RelayOptions},
    side::Side,
};

/// One end of the bridge: how to talk to it and how its users bind it.
pub struct Endpoint {
    pub outbound: Arc<dyn ChannelOutbound>,
    pub bind_command: String,
}

impl Endpoint {
    pub fn new(outbound: Arc<dyn ChannelOutbound>, bind_command: impl Into<String>) -> Self {
        Self {
            outbound,
            bind_command: bind_command.into(),
        }
    }
}

/// Both relay directions wired to the same binding and correlation state.
pub struct Bridge {
    bindings: Arc<BindingStore>,
    correlations: Arc<Correlations>,
    source: Arc<RelayEngine>,
    destination: Arc<RelayEngine>,
}

impl Bridge {
    pub fn new(
        bindings: Arc<BindingStore>,
        config: &RelayConfig,
        source: Endpoint,
        destination: Endpoint,
    ) -> Self {
        let correlations = Arc::new(Correlations::new(config.correlation_capacity));
        let options = RelayOptions::from(config);

        let build = |side: Side, origin: &Endpoint, target: &Endpoint| {
            Arc::new(
                RelayEngine::new(
                    side,
                    Arc::clone(&origin.outbound),
                    Arc::clone(&target.outbound),
                    Arc::clone(&bindings),
                    Arc::clone(&correlations),
                )
                .with_bind_command(origin.bind_command.clone())
                .with_options(options.clone()),
            )
        };
        let source_engine = build(Side::Source, &source, &destination);
        let destination_engine = build(Side::Destination, &destination, &source);

        Self {
            bindings,
            correlations,
            source: source_engine,
            destination: destination_engine,
        }
    }

    pub fn engine(&self, side: Side) -> &Arc<RelayEngine> {
        match side {
            Side::Source => &self.source,
            Side::Destination => &self.destination,
        }
    }

    pub fn bindings(&self) -> &Arc<BindingStore> {
        &self.bindings
    }

    pub fn correlations(&self) -> &Arc<Correlations> {
        &self.correlations
    }

    /// Run both directions as independent tasks.
    pub fn spawn(
        &self,
        source_events: EventReceiver,
        destination_events: EventReceiver,
        cancel: CancellationToken,
    ) -> (JoinHandle<()>, JoinHandle<()>) {
        let source = tokio::spawn(Arc::clone(&self.source).run(source_events, cancel.clone()));
        let destination =
            tokio::spawn(Arc::clone(&self.destination).run(destination_events, cancel));
        (source, destination)
    }
}
