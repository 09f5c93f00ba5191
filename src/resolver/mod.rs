//! The resolver event loop.
//!
//! A single task owns the record cache, the browse set, and the derived
//! resolved-instance view. Every input reaches it through a channel, so
//! no state is ever shared: answer batches from the wire pipeline, browse
//! and read commands from the facade, the shutdown signal, and the
//! periodic refresh tick.

#[cfg(test)]
mod resolver_test;

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, MissedTickBehavior};

use crate::cache::{Cache, ServiceInstanceId};
use crate::config::REFRESH_INTERVAL;
use crate::net::NetClient;
use crate::pipeline::AnswerSet;
use crate::question::{Question, QuestionKind};
use crate::ServiceInstance;

/// A request from the facade, serialized through one channel so that a
/// read issued after a browse always observes the browse's effect.
pub(crate) enum Command {
    /// Add a service name to the browse set.
    Browse(String),
    /// Reply with a snapshot of the resolved instances.
    Read(oneshot::Sender<Vec<ServiceInstance>>),
}

/// The resolver's single-owner event loop.
pub(crate) struct ResolverLoop {
    cache: Cache,

    // Every service name the application has asked to browse for. Grows
    // monotonically for the resolver's lifetime.
    browse_set: HashSet<String>,

    // The derived view, recomputed whenever the cache changes.
    resolved_instances: HashMap<ServiceInstanceId, ServiceInstance>,

    // The instant record ages were last computed against.
    last_tick: Instant,

    net: NetClient,
    answer_rx: mpsc::Receiver<AnswerSet>,
    command_rx: mpsc::Receiver<Command>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl ResolverLoop {
    pub(crate) fn new(
        net: NetClient,
        answer_rx: mpsc::Receiver<AnswerSet>,
        command_rx: mpsc::Receiver<Command>,
        shutdown_rx: mpsc::Receiver<()>,
    ) -> Self {
        ResolverLoop {
            cache: Cache::new(),
            browse_set: HashSet::new(),
            resolved_instances: HashMap::new(),
            last_tick: Instant::now(),
            net,
            answer_rx,
            command_rx,
            shutdown_rx,
        }
    }

    /// Runs until shutdown, then closes the network client. Each input is
    /// processed to completion before the next is taken.
    pub(crate) async fn run(mut self) {
        let mut refresh = time::interval_at(
            (Instant::now() + REFRESH_INTERVAL).into(),
            REFRESH_INTERVAL,
        );
        // Late ticks fire once and reschedule from now; ticks never burst
        // to catch up.
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // A closed shutdown channel (the facade was dropped)
                // terminates the loop just like an explicit shutdown.
                _ = self.shutdown_rx.recv() => break,

                Some(batch) = self.answer_rx.recv() => {
                    self.on_answers_received(batch);
                }

                Some(command) = self.command_rx.recv() => match command {
                    Command::Browse(service_name) => self.on_service_added(service_name).await,
                    Command::Read(reply_tx) => self.on_read_requested(reply_tx),
                },

                _ = refresh.tick() => self.on_refresh_tick().await,
            }
        }

        self.net.close().await;
    }

    // on_answers_received applies one datagram's records to the cache as a
    // unit, so the derived view reflects either all of the batch or none.
    fn on_answers_received(&mut self, batch: AnswerSet) {
        let mut cache_updated = self.apply_elapsed_time();

        for record in batch.addresses {
            cache_updated |= self.cache.on_address_record_received(record);
        }
        for record in batch.pointers {
            cache_updated |= self.cache.on_pointer_record_received(record);
        }
        for record in batch.services {
            cache_updated |= self.cache.on_service_record_received(record);
        }
        for record in batch.texts {
            cache_updated |= self.cache.on_text_record_received(record);
        }

        if cache_updated {
            self.on_cache_updated();
        }
    }

    // on_service_added handles adding a new service to browse for. The
    // pointer question for a service is asked exactly once, here; new
    // advertisers announce themselves unsolicited (RFC 6762 Section 8.3).
    async fn on_service_added(&mut self, service_name: String) {
        if !self.browse_set.insert(service_name.clone()) {
            // We were already browsing for this service.
            return;
        }

        let mut questions = HashSet::new();
        questions.insert(Question::new(service_name, QuestionKind::Ptr));
        if let Err(err) = self.net.send_questions(&questions).await {
            log::warn!("failed sending pointer question: {err}");
        }
    }

    // on_read_requested hands the caller a copy of the derived view. The
    // oneshot reply makes the read synchronous with the loop's own notion
    // of now.
    fn on_read_requested(&self, reply_tx: oneshot::Sender<Vec<ServiceInstance>>) {
        let mut instances: Vec<ServiceInstance> = self.resolved_instances.values().cloned().collect();
        instances.sort_by(|a, b| {
            (&a.instance_name, a.address).cmp(&(&b.instance_name, b.address))
        });
        let _ = reply_tx.send(instances);
    }

    // on_refresh_tick ages the cache, then asks the planner for every
    // question the browsed services still need and sends them in a single
    // query.
    async fn on_refresh_tick(&mut self) {
        if self.apply_elapsed_time() {
            self.on_cache_updated();
        }

        let mut questions = HashSet::new();
        self.cache
            .questions_for_missing_records(&self.browse_set, &mut questions);
        self.cache
            .questions_for_expiring_records(&self.browse_set, &mut questions);

        if questions.is_empty() {
            return;
        }
        if let Err(err) = self.net.send_questions(&questions).await {
            log::warn!("failed sending questions: {err}");
        }
    }

    // apply_elapsed_time ages the cache by the time elapsed since the last
    // call. Performed before any mutation or read that depends on TTL
    // freshness. Returns true if any record was evicted.
    fn apply_elapsed_time(&mut self) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick);
        self.last_tick = now;
        self.cache.on_time_elapsed(elapsed)
    }

    fn on_cache_updated(&mut self) {
        self.resolved_instances = self.cache.to_resolved_instances();
    }
}
