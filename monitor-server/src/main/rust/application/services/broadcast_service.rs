use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use monitor_shared::{StatusReport, StreamMessage};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::snapshot_aggregator::SnapshotAggregator;
use crate::domain::entities::ObserverRegistration;
use crate::domain::ports::{DeliveryError, MetricsReporter, ObserverSink};
use crate::domain::value_objects::{BroadcastConfig, ObserverId};

const SNAPSHOT_FAILURE: &str = "Failed to retrieve metrics";

struct ObserverSlot {
    registration: ObserverRegistration,
    timer: JoinHandle<()>,
}

type Registry = Arc<RwLock<HashMap<ObserverId, ObserverSlot>>>;

/// Pushes a combined snapshot to every registered observer on a fixed cadence
pub struct BroadcastService {
    aggregator: Arc<SnapshotAggregator>,
    config: BroadcastConfig,
    metrics: Arc<dyn MetricsReporter>,
    observers: Registry,
}

impl BroadcastService {
    pub fn new(
        aggregator: Arc<SnapshotAggregator>,
        config: BroadcastConfig,
        metrics: Arc<dyn MetricsReporter>,
    ) -> Self {
        Self {
            aggregator,
            config,
            metrics,
            observers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn aggregator(&self) -> &Arc<SnapshotAggregator> {
        &self.aggregator
    }

    /// Register an observer: greet it with `connection_status` and start its timer.
    ///
    /// Fails only if the transport is already closed.
    pub async fn register(&self, sink: Arc<dyn ObserverSink>) -> Result<ObserverId, DeliveryError> {
        let registration = ObserverRegistration::new();
        let id = registration.id();

        match StreamMessage::connection_status(StatusReport::Connected).encode() {
            Ok(greeting) => match sink.send(greeting).await {
                Ok(()) => {}
                Err(DeliveryError::Closed) => {
                    tracing::info!(observer_id = %id, "Observer closed before registration");
                    return Err(DeliveryError::Closed);
                }
                Err(DeliveryError::Failed(reason)) => {
                    tracing::warn!(observer_id = %id, "Failed to greet observer: {}", reason);
                }
            },
            Err(e) => tracing::error!(observer_id = %id, "Failed to encode greeting: {}", e),
        }

        let mut observers = self.observers.write().await;
        let timer = tokio::spawn(run_observer(
            id,
            sink,
            self.aggregator.clone(),
            self.observers.clone(),
            self.metrics.clone(),
            self.config.tick_interval(),
        ));
        observers.insert(
            id,
            ObserverSlot {
                registration,
                timer,
            },
        );
        self.metrics.report_observer_connected();

        tracing::info!(
            observer_id = %id,
            observers = observers.len(),
            "Observer registered"
        );

        Ok(id)
    }

    /// Cancel an observer's timer and drop its registration.
    ///
    /// Returns false if the observer was already gone.
    pub async fn remove(&self, id: ObserverId) -> bool {
        let slot = self.observers.write().await.remove(&id);
        match slot {
            Some(slot) => {
                teardown(id, slot, self.metrics.as_ref(), true);
                true
            }
            None => {
                tracing::debug!(observer_id = %id, "Observer already removed");
                false
            }
        }
    }

    pub async fn observer_count(&self) -> usize {
        self.observers.read().await.len()
    }

    pub async fn is_registered(&self, id: ObserverId) -> bool {
        self.observers.read().await.contains_key(&id)
    }

    pub async fn registration(&self, id: ObserverId) -> Option<ObserverRegistration> {
        self.observers
            .read()
            .await
            .get(&id)
            .map(|slot| slot.registration.clone())
    }

    /// Remove every observer
    pub async fn shutdown(&self) {
        let drained: Vec<(ObserverId, ObserverSlot)> =
            self.observers.write().await.drain().collect();
        let count = drained.len();
        for (id, slot) in drained {
            teardown(id, slot, self.metrics.as_ref(), true);
        }
        tracing::info!("Broadcast stopped, {} observer(s) removed", count);
    }
}

fn teardown(id: ObserverId, mut slot: ObserverSlot, metrics: &dyn MetricsReporter, abort: bool) {
    if abort {
        slot.timer.abort();
    }
    slot.registration.close();
    metrics.report_observer_disconnected();
    tracing::info!(
        observer_id = %id,
        ticks = slot.registration.ticks_delivered(),
        failed_sends = slot.registration.failed_sends(),
        uptime = ?slot.registration.uptime(),
        "Observer removed"
    );
}

/// Per-observer timer task. Sampling and delivery for one observer are serialized here;
/// missed ticks are skipped rather than queued.
async fn run_observer(
    id: ObserverId,
    sink: Arc<dyn ObserverSink>,
    aggregator: Arc<SnapshotAggregator>,
    observers: Registry,
    metrics: Arc<dyn MetricsReporter>,
    tick: Duration,
) {
    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let report = aggregator.sample().await;
        if report.is_partial() {
            tracing::debug!(
                observer_id = %id,
                absent = ?report.snapshot.absent_fields(),
                "Broadcasting partial snapshot"
            );
        }

        let outcome = match StreamMessage::metrics_update(report.snapshot).encode() {
            Ok(text) => sink.send(text).await,
            Err(e) => {
                tracing::error!(observer_id = %id, "Failed to encode snapshot: {}", e);
                match StreamMessage::error(SNAPSHOT_FAILURE).encode() {
                    Ok(text) => sink.send(text).await,
                    Err(e) => Err(DeliveryError::Failed(e.to_string())),
                }
            }
        };

        match outcome {
            Ok(()) => {
                metrics.report_broadcast();
                if let Some(slot) = observers.write().await.get_mut(&id) {
                    slot.registration.record_delivery();
                }
            }
            Err(DeliveryError::Closed) => {
                tracing::info!(observer_id = %id, "Observer transport closed");
                let slot = observers.write().await.remove(&id);
                if let Some(slot) = slot {
                    // This task is the timer; it ends by returning
                    teardown(id, slot, metrics.as_ref(), false);
                }
                return;
            }
            Err(DeliveryError::Failed(reason)) => {
                tracing::warn!(observer_id = %id, "Failed to deliver snapshot: {}", reason);
                metrics.report_delivery_failure();
                if let Some(slot) = observers.write().await.get_mut(&id) {
                    slot.registration.record_failure();
                }
            }
        }
    }
}
