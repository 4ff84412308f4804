//! # Communication Bus
//!
//! Priority-queued message router. `send` validates and enqueues on the
//! caller's thread; a periodic processing task dequeues in priority order and
//! delivers through the event channel.

use crate::config::{BusConfig, MAX_BATCH_SIZE};
use crate::error::SendError;
use crate::events::{BusEvent, ModuleInbox};
use crate::message::{Message, MessagePriority, Route};
use crate::metrics::{BusCounters, BusMetrics, ThroughputState};
use crate::queue::PriorityQueues;
use crate::subscriptions::SubscriptionTable;
use parking_lot::{Mutex, RwLock};
use shared_types::{abort_all, spawn_periodic, CoreServices, Payload, Timestamp};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Predicate run against every message during `send`.
pub type MessageFilter = Arc<dyn Fn(&Message) -> bool + Send + Sync>;

/// Subscription pattern matching every event.
pub const SUBSCRIBE_ALL: &str = "*";

#[derive(Default)]
struct BusTimers {
    runtime: Option<Handle>,
    processing: Option<JoinHandle<()>>,
    cleanup: Option<JoinHandle<()>>,
    metrics: Option<JoinHandle<()>>,
}

impl BusTimers {
    fn take_all(&mut self) -> Vec<JoinHandle<()>> {
        [
            self.processing.take(),
            self.cleanup.take(),
            self.metrics.take(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

struct BusInner {
    config: RwLock<BusConfig>,
    queues: Mutex<PriorityQueues>,
    subscriptions: RwLock<SubscriptionTable>,
    filters: Mutex<Vec<(String, MessageFilter)>>,
    counters: BusCounters,
    throughput: Mutex<ThroughputState>,
    events: broadcast::Sender<BusEvent>,
    running: AtomicBool,
    paused: AtomicBool,
    timers: Mutex<BusTimers>,
    services: CoreServices,
}

/// Cheaply cloneable handle to one bus.
#[derive(Clone)]
pub struct CommunicationBus {
    inner: Arc<BusInner>,
}

impl CommunicationBus {
    #[must_use]
    pub fn new(config: BusConfig) -> Self {
        Self::with_services(config, CoreServices::default())
    }

    #[must_use]
    pub fn with_services(config: BusConfig, services: CoreServices) -> Self {
        let config = config.normalized();
        let (events, _) = broadcast::channel(config.event_channel_capacity);
        let now = services.clock.now_ms();

        Self {
            inner: Arc::new(BusInner {
                throughput: Mutex::new(ThroughputState::new(config.latency_window, now)),
                config: RwLock::new(config),
                queues: Mutex::new(PriorityQueues::new()),
                subscriptions: RwLock::new(SubscriptionTable::new()),
                filters: Mutex::new(Vec::new()),
                counters: BusCounters::default(),
                events,
                running: AtomicBool::new(false),
                paused: AtomicBool::new(false),
                timers: Mutex::new(BusTimers::default()),
                services,
            }),
        }
    }

    // =========================================================================
    // SENDING
    // =========================================================================

    /// Validate and enqueue a message. Returns false if it was rejected.
    pub fn send(&self, message: Message) -> bool {
        self.try_send(message).is_ok()
    }

    /// Validate and enqueue a message, returning its id or the rejection.
    pub fn try_send(&self, mut message: Message) -> Result<String, SendError> {
        if message.message_type.requires_receiver() && message.receiver.is_empty() {
            return Err(SendError::MissingReceiver {
                message_type: message.message_type,
            });
        }

        let (max_payload, ttl, max_queue) = {
            let config = self.inner.config.read();
            (
                config.max_payload_bytes,
                config.message_ttl_ms,
                config.max_queue_size,
            )
        };

        let size = self.inner.services.size_estimator.estimate(&message.payload);
        if size > max_payload {
            return Err(SendError::PayloadTooLarge {
                size,
                max: max_payload,
            });
        }

        let now = self.inner.services.clock.now_ms();
        if message.id.is_empty() {
            message.id = uuid::Uuid::new_v4().to_string();
        }
        if message.timestamp_ms == 0 {
            message.timestamp_ms = now;
        }
        if message.expire_time_ms == 0 && ttl > 0 {
            message.expire_time_ms = message.timestamp_ms.saturating_add(ttl);
        }

        let filters: Vec<(String, MessageFilter)> = self.inner.filters.lock().clone();
        for (filter_id, filter) in &filters {
            if !filter(&message) {
                debug!(message_id = %message.id, filter = %filter_id, "Message rejected by filter");
                return Err(SendError::RejectedByFilter {
                    filter_id: filter_id.clone(),
                });
            }
        }

        let id = message.id.clone();
        let priority = message.priority;
        let (evicted, queue_size) = {
            let mut queues = self.inner.queues.lock();
            let evicted = queues.push(message, max_queue);
            (evicted, queues.len())
        };

        self.inner.counters.total.fetch_add(1, Ordering::Relaxed);
        self.inner.counters.add_dropped(evicted.len() as u64);
        for dropped in &evicted {
            warn!(
                message_id = %dropped.id,
                priority = ?dropped.priority,
                "Queue full, dropped oldest low-priority message"
            );
        }

        debug!(message_id = %id, priority = ?priority, queue_size, "Message enqueued");
        self.emit(BusEvent::QueueSizeChanged(queue_size));
        Ok(id)
    }

    /// Send on the worker pool. Must be called within a tokio runtime.
    pub fn send_async(&self, message: Message) -> JoinHandle<bool> {
        let bus = self.clone();
        self.inner
            .services
            .worker_pool
            .spawn(async move { bus.send(message) })
    }

    /// Send every message. True only if all were accepted.
    pub fn send_batch(&self, messages: Vec<Message>) -> bool {
        messages
            .into_iter()
            .fold(true, |all_ok, message| self.send(message) && all_ok)
    }

    /// `send_batch` on the worker pool.
    pub fn send_batch_async(&self, messages: Vec<Message>) -> JoinHandle<bool> {
        let bus = self.clone();
        self.inner
            .services
            .worker_pool
            .spawn(async move { bus.send_batch(messages) })
    }

    pub fn send_command(&self, sender: &str, receiver: &str, command: &str, data: Payload) -> bool {
        self.send(Message::command(sender, receiver, command, data))
    }

    pub fn send_event(&self, sender: &str, event: &str, data: Payload) -> bool {
        self.send(Message::event(sender, event, data))
    }

    /// Send a request. Returns its correlation id when accepted.
    pub fn send_request(
        &self,
        sender: &str,
        receiver: &str,
        request: &str,
        data: Payload,
    ) -> Option<String> {
        let message = Message::request(sender, receiver, request, data);
        let correlation_id = message.correlation_id.clone();
        self.send(message).then_some(correlation_id)
    }

    /// Answer `request`, routing back to its sender.
    pub fn send_response(&self, sender: &str, request: &Message, data: Payload) -> bool {
        self.send(Message::response_to(request, sender, data))
    }

    pub fn broadcast(&self, sender: &str, event: &str, data: Payload) -> bool {
        self.send(Message::broadcast(sender, event, data))
    }

    // =========================================================================
    // SUBSCRIPTIONS AND FILTERS
    // =========================================================================

    /// Returns false if `pattern` was already registered for `module`.
    pub fn subscribe(&self, module: &str, pattern: &str) -> bool {
        if module.is_empty() || pattern.is_empty() {
            return false;
        }
        let added = self.inner.subscriptions.write().subscribe(module, pattern);
        if added {
            debug!(module = module, pattern = pattern, "Subscription added");
        }
        added
    }

    pub fn unsubscribe(&self, module: &str, pattern: &str) -> bool {
        self.inner.subscriptions.write().unsubscribe(module, pattern)
    }

    pub fn subscribe_to_all(&self, module: &str) -> bool {
        self.subscribe(module, SUBSCRIBE_ALL)
    }

    pub fn unsubscribe_from_all(&self, module: &str) -> bool {
        self.inner.subscriptions.write().unsubscribe_all(module)
    }

    /// Patterns `module` is subscribed to.
    #[must_use]
    pub fn subscriptions(&self, module: &str) -> Vec<String> {
        self.inner.subscriptions.read().patterns(module)
    }

    /// Register or replace a filter.
    pub fn add_message_filter<F>(&self, filter_id: &str, filter: F)
    where
        F: Fn(&Message) -> bool + Send + Sync + 'static,
    {
        let filter: MessageFilter = Arc::new(filter);
        let mut filters = self.inner.filters.lock();
        match filters.iter_mut().find(|(id, _)| id == filter_id) {
            Some(slot) => slot.1 = filter,
            None => filters.push((filter_id.to_string(), filter)),
        }
    }

    pub fn remove_message_filter(&self, filter_id: &str) -> bool {
        let mut filters = self.inner.filters.lock();
        let before = filters.len();
        filters.retain(|(id, _)| id != filter_id);
        filters.len() != before
    }

    /// Listen to every outbound bus event.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<BusEvent> {
        self.inner.events.subscribe()
    }

    /// Listen to the messages delivered to `module`.
    #[must_use]
    pub fn inbox(&self, module: &str) -> ModuleInbox {
        ModuleInbox::new(self.inner.events.subscribe(), module.to_string())
    }

    // =========================================================================
    // PROCESSING
    // =========================================================================

    /// Run one processing tick. Returns the number of messages delivered.
    ///
    /// Does nothing while paused.
    pub fn process_queue(&self) -> usize {
        if self.inner.paused.load(Ordering::SeqCst) {
            return 0;
        }
        self.process_batch()
    }

    fn process_batch(&self) -> usize {
        let batch_size = self.inner.config.read().batch_size;
        let now = self.inner.services.clock.now_ms();

        let (batch, queue_size) = {
            let mut queues = self.inner.queues.lock();
            let batch = queues.pop_batch(batch_size, now);
            (batch, queues.len())
        };

        if batch.expired > 0 {
            self.inner.counters.add_dropped(batch.expired);
            debug!(expired = batch.expired, "Dropped expired messages");
        }

        let delivered = batch.messages.len();
        for message in batch.messages {
            self.deliver(message, now);
        }

        if delivered > 0 || batch.expired > 0 {
            self.emit(BusEvent::QueueSizeChanged(queue_size));
        }
        delivered
    }

    fn deliver(&self, message: Message, now: Timestamp) {
        let latency = now.saturating_sub(message.timestamp_ms);
        let message = Arc::new(message);

        let (targets, routed) = match message.route() {
            Route::Direct(receiver) => (vec![receiver.to_string()], true),
            Route::FanOut(Some(event)) => {
                (self.inner.subscriptions.read().subscribers_for(event), true)
            }
            Route::FanOut(None) => {
                debug!(message_id = %message.id, "Fan-out message has no event name");
                (Vec::new(), true)
            }
            Route::Unroutable => {
                debug!(message_id = %message.id, "Message has no receiver");
                (Vec::new(), false)
            }
        };

        for module in targets {
            self.emit(BusEvent::MessageReceived {
                module,
                message: Arc::clone(&message),
            });
        }

        self.inner.counters.processed.fetch_add(1, Ordering::Relaxed);
        self.inner.throughput.lock().latency.record(latency);
        self.emit(BusEvent::MessageProcessed {
            message_id: message.id.clone(),
            success: routed,
        });
    }

    /// Deliver everything queued, ignoring pause and batch boundaries.
    pub fn flush(&self) -> usize {
        let mut delivered = 0;
        loop {
            let before = self.queue_size();
            if before == 0 {
                break;
            }
            delivered += self.process_batch();
            if self.queue_size() >= before {
                break;
            }
        }
        delivered
    }

    /// Discard every queued message without counting them as dropped.
    pub fn clear(&self) -> usize {
        let cleared = self.inner.queues.lock().clear();
        if cleared > 0 {
            info!(cleared, "Message queue cleared");
        }
        self.emit(BusEvent::QueueSizeChanged(0));
        cleared
    }

    /// Sweep expired messages out of every level.
    pub fn cleanup_expired(&self) -> u64 {
        let now = self.inner.services.clock.now_ms();
        let removed = self.inner.queues.lock().remove_expired(now);
        if removed > 0 {
            self.inner.counters.add_dropped(removed);
            debug!(removed, "Cleaned up expired messages");
            self.emit(BusEvent::QueueSizeChanged(self.queue_size()));
        }
        removed
    }

    /// Recompute throughput and raise threshold alerts.
    pub fn refresh_metrics(&self) {
        let now = self.inner.services.clock.now_ms();
        let processed = self.inner.counters.processed.load(Ordering::Relaxed);
        let average_latency = {
            let mut state = self.inner.throughput.lock();
            state.refresh(processed, now);
            state.latency.average()
        };
        self.check_alerts(average_latency);
    }

    fn check_alerts(&self, average_latency: f64) {
        let (max_queue, queue_ratio, latency_limit, drop_limit) = {
            let config = self.inner.config.read();
            (
                config.max_queue_size,
                config.queue_alert_ratio,
                config.latency_alert_ms,
                config.drop_rate_alert,
            )
        };

        let queue_size = self.queue_size();
        if queue_size as f64 > max_queue as f64 * queue_ratio {
            self.alert(format!("Message queue is {queue_size}/{max_queue} full"));
        }

        if average_latency > latency_limit {
            self.alert(format!("Average message latency is {average_latency:.1} ms"));
        }

        let total = self.inner.counters.total.load(Ordering::Relaxed);
        let dropped = self.inner.counters.dropped.load(Ordering::Relaxed);
        if total > 0 {
            let drop_rate = dropped as f64 / total as f64;
            if drop_rate > drop_limit {
                self.alert(format!("Message drop rate is {:.1}%", drop_rate * 100.0));
            }
        }
    }

    fn alert(&self, message: String) {
        warn!(alert = %message, "Bus performance alert");
        self.emit(BusEvent::PerformanceAlert(message));
    }

    fn emit(&self, event: BusEvent) {
        // No listeners is not an error for the bus.
        let _ = self.inner.events.send(event);
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Start the processing, cleanup and metrics timers.
    pub fn start(&self) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("No tokio runtime, bus not started");
            return;
        };
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.paused.store(false, Ordering::SeqCst);

        let (processing, cleanup, metrics) = {
            let config = self.inner.config.read();
            (
                config.processing_interval_ms,
                config.cleanup_interval_ms,
                config.metrics_interval_ms,
            )
        };

        let weak = Arc::downgrade(&self.inner);
        let mut timers = self.inner.timers.lock();
        timers.processing = Some(spawn_periodic(&runtime, weak.clone(), processing, |inner| {
            CommunicationBus { inner }.process_queue();
        }));
        timers.cleanup = Some(spawn_periodic(&runtime, weak.clone(), cleanup, |inner| {
            CommunicationBus { inner }.cleanup_expired();
        }));
        timers.metrics = Some(spawn_periodic(&runtime, weak, metrics, |inner| {
            CommunicationBus { inner }.refresh_metrics();
        }));
        timers.runtime = Some(runtime);

        info!(
            processing_interval_ms = processing,
            "Communication bus started"
        );
    }

    /// Cancel the timers, then deliver whatever is still queued.
    pub fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let handles = self.inner.timers.lock().take_all();
        abort_all(handles);
        let flushed = self.flush();
        info!(flushed, "Communication bus stopped");
    }

    pub fn pause(&self) {
        self.inner.paused.store(true, Ordering::SeqCst);
        debug!("Communication bus paused");
    }

    pub fn resume(&self) {
        self.inner.paused.store(false, Ordering::SeqCst);
        debug!("Communication bus resumed");
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::SeqCst)
    }

    // =========================================================================
    // TUNING
    // =========================================================================

    #[must_use]
    pub fn config(&self) -> BusConfig {
        self.inner.config.read().clone()
    }

    pub fn set_max_queue_size(&self, size: usize) {
        self.inner.config.write().max_queue_size = size.max(1);
    }

    pub fn set_batch_size(&self, size: usize) {
        self.inner.config.write().batch_size = size.clamp(1, MAX_BATCH_SIZE);
    }

    /// Change the tick period, restarting the processing timer if running.
    pub fn set_processing_interval(&self, interval_ms: u64) {
        let interval_ms = interval_ms.max(1);
        self.inner.config.write().processing_interval_ms = interval_ms;

        if !self.is_running() {
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        let mut timers = self.inner.timers.lock();
        if let Some(old) = timers.processing.take() {
            old.abort();
        }
        if let Some(runtime) = timers.runtime.clone() {
            timers.processing = Some(spawn_periodic(&runtime, weak, interval_ms, |inner| {
                CommunicationBus { inner }.process_queue();
            }));
        }
        debug!(interval_ms, "Processing interval changed");
    }

    pub fn set_message_ttl(&self, ttl_ms: u64) {
        self.inner.config.write().message_ttl_ms = ttl_ms;
    }

    // =========================================================================
    // OBSERVABILITY
    // =========================================================================

    #[must_use]
    pub fn performance_metrics(&self) -> BusMetrics {
        let (average_latency_ms, peak_latency_ms, throughput, last_update_ms) = {
            let state = self.inner.throughput.lock();
            (
                state.latency.average(),
                state.latency.peak(),
                state.throughput,
                state.last_update_ms,
            )
        };

        BusMetrics {
            total_messages: self.inner.counters.total.load(Ordering::Relaxed),
            processed_messages: self.inner.counters.processed.load(Ordering::Relaxed),
            dropped_messages: self.inner.counters.dropped.load(Ordering::Relaxed),
            average_latency_ms,
            peak_latency_ms,
            throughput,
            queue_size: self.queue_size(),
            last_update_ms,
        }
    }

    /// Zero the counters and latency window.
    pub fn reset_metrics(&self) {
        self.inner.counters.reset();
        let now = self.inner.services.clock.now_ms();
        let mut state = self.inner.throughput.lock();
        state.latency.clear();
        state.throughput = 0.0;
        state.last_update_ms = now;
        state.processed_at_last_update = 0;
    }

    #[must_use]
    pub fn queue_size(&self) -> usize {
        self.inner.queues.lock().len()
    }

    /// Queue length per priority level.
    #[must_use]
    pub fn queue_size_by_priority(&self) -> Vec<(MessagePriority, usize)> {
        let lens = self.inner.queues.lock().len_by_priority();
        MessagePriority::ALL.into_iter().zip(lens).collect()
    }

    /// Number of modules with at least one subscription.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscriptions.read().module_count()
    }

    /// Modules with at least one subscription, sorted.
    #[must_use]
    pub fn active_modules(&self) -> Vec<String> {
        self.inner.subscriptions.read().modules()
    }
}

impl Default for CommunicationBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

impl std::fmt::Debug for CommunicationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommunicationBus")
            .field("running", &self.is_running())
            .field("paused", &self.is_paused())
            .field("queue_size", &self.queue_size())
            .finish()
    }
}
