use crate::buffer::{BatchFactory, QueueMetrics};
use crate::config::{Config, ConfigError, DeliveryMode};
use crate::dispatch::{
    BlockingFlushHandler, DispatchError, FlushHandler, OutcomeRouter, QueuedFlushHandler,
};
use crate::model::{Action, Options, Properties, Traits, ValidationError};
use crate::notify::{EventNotifier, EventSubscriber, SubscriptionId};
use crate::sender::{BatchSender, HttpSender};
use crate::stats::{Statistics, StatisticsSnapshot};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Buffered telemetry client. Owns the write key, the flush strategy and
/// the pipeline statistics.
///
/// Generic over the [`BatchSender`] seam; production code uses the default
/// [`HttpSender`], tests substitute scripted senders.
pub struct Client<S: BatchSender = HttpSender> {
    write_key: String,
    config: Config,
    handler: FlushHandler<S>,
    notifier: Arc<EventNotifier>,
    stats: Arc<Statistics>,
}

impl Client<HttpSender> {
    /// Create a client delivering to the configured HTTP endpoint. In
    /// batched mode this spawns the background worker, so it must be called
    /// within a Tokio runtime.
    pub fn new(write_key: impl Into<String>, config: Config) -> Result<Self, ClientError> {
        let sender = HttpSender::new(&config)?;
        Self::with_sender(write_key, config, sender)
    }
}

impl<S: BatchSender + 'static> Client<S> {
    /// Create a client with a caller-supplied sender implementation.
    pub fn with_sender(
        write_key: impl Into<String>,
        config: Config,
        sender: S,
    ) -> Result<Self, ClientError> {
        let write_key = write_key.into();
        if write_key.is_empty() {
            return Err(ValidationError::EmptyWriteKey.into());
        }
        config.validate()?;

        let notifier = Arc::new(EventNotifier::new());
        let stats = Arc::new(Statistics::new());
        let router = OutcomeRouter::new(Arc::clone(&notifier), Arc::clone(&stats));
        let factory = BatchFactory::new(write_key.clone());

        let handler = match config.delivery {
            DeliveryMode::Immediate => {
                FlushHandler::Immediate(BlockingFlushHandler::new(factory, sender, router))
            }
            DeliveryMode::Batched => FlushHandler::Batched(QueuedFlushHandler::spawn(
                factory,
                sender,
                router,
                config.max_queue_size,
                config.max_batch_size,
                config.flush_interval,
                config.shutdown_grace,
            )),
        };

        info!(delivery = ?config.delivery, "telemetry client created");

        Ok(Self {
            write_key,
            config,
            handler,
            notifier,
            stats,
        })
    }

    /// Tie a visitor's actions to an identity and record traits to segment
    /// by.
    pub async fn identify(
        &self,
        user_id: impl Into<String>,
        traits: Traits,
    ) -> Result<(), ClientError> {
        self.identify_with(user_id, traits, None, None).await
    }

    pub async fn identify_with(
        &self,
        user_id: impl Into<String>,
        traits: Traits,
        options: Option<Options>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<(), ClientError> {
        self.enqueue(Action::identify(user_id, traits, options, timestamp)?)
            .await
    }

    /// Record one named event a user triggered.
    pub async fn track(
        &self,
        user_id: impl Into<String>,
        event: impl Into<String>,
        properties: Properties,
    ) -> Result<(), ClientError> {
        self.track_with(user_id, event, properties, None, None).await
    }

    pub async fn track_with(
        &self,
        user_id: impl Into<String>,
        event: impl Into<String>,
        properties: Properties,
        options: Option<Options>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<(), ClientError> {
        self.enqueue(Action::track(user_id, event, properties, options, timestamp)?)
            .await
    }

    /// Merge an anonymous user's id into an identified user's id.
    pub async fn alias(
        &self,
        previous_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<(), ClientError> {
        self.alias_with(previous_id, user_id, None, None).await
    }

    pub async fn alias_with(
        &self,
        previous_id: impl Into<String>,
        user_id: impl Into<String>,
        options: Option<Options>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<(), ClientError> {
        self.enqueue(Action::alias(previous_id, user_id, options, timestamp)?)
            .await
    }

    /// Hand a pre-built action to the pipeline. Submitted is counted once
    /// the pipeline accepts the action, including actions dropped by
    /// backpressure; a call rejected after shutdown is not counted.
    pub async fn enqueue(&self, action: Action) -> Result<(), ClientError> {
        self.handler.process(action).await?;
        self.stats.record_submitted();
        Ok(())
    }

    /// Block until every action submitted before this call has been sent or
    /// reported failed.
    pub async fn flush(&self) -> Result<(), ClientError> {
        self.handler.flush().await?;
        Ok(())
    }

    /// Dispose of the pipeline. Does not flush first; buffered actions are
    /// dropped, and subsequent calls fail fast.
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        self.handler.shutdown().await?;
        Ok(())
    }

    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) -> SubscriptionId {
        self.notifier.subscribe(subscriber)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    pub fn statistics(&self) -> StatisticsSnapshot {
        self.stats.snapshot()
    }

    /// Queue counters; `None` in immediate mode.
    pub fn queue_metrics(&self) -> Option<QueueMetrics> {
        self.handler.queue_metrics()
    }

    pub fn write_key(&self) -> &str {
        &self.write_key
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
