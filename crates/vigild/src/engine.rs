//! Engine wiring.
//!
//! Builds the component graph over a chosen set of collaborators. The
//! in-memory constructor backs the daemon binary and the integration
//! suites; a deployment against real collaborators swaps the adapters
//! without touching the components.

use std::sync::Arc;

use vigil_common::{EngineConfig, EscalationPolicy};

use crate::broadcast::{Broadcaster, ChannelBroadcaster};
use crate::dispatch::DispatchMatcher;
use crate::enrichment::{CategoryLookup, StaticLookup};
use crate::ephemeral::MemoryEphemeral;
use crate::executor::Executor;
use crate::intake::ComplaintService;
use crate::notify::Notifier;
use crate::queue::MemoryQueue;
use crate::rejection::RejectionTracker;
use crate::scheduler::Scheduler;
use crate::store::MemoryStore;

pub struct Engine {
    pub store: Arc<MemoryStore>,
    pub queue: Arc<MemoryQueue>,
    pub ephemeral: Arc<MemoryEphemeral>,
    pub broadcaster: Arc<ChannelBroadcaster>,
    pub scheduler: Arc<Scheduler>,
    pub executor: Arc<Executor>,
    pub dispatch: DispatchMatcher,
    pub rejections: RejectionTracker,
    pub complaints: ComplaintService,
    pub notifier: Arc<Notifier>,
}

impl Engine {
    /// Wire everything over in-memory collaborators.
    pub fn in_memory(config: EngineConfig, policy: EscalationPolicy) -> Self {
        Self::in_memory_with_lookup(config, policy, Arc::new(StaticLookup::new()))
    }

    /// Same, with a caller-supplied enrichment collaborator.
    pub fn in_memory_with_lookup(
        config: EngineConfig,
        policy: EscalationPolicy,
        lookup: Arc<dyn CategoryLookup>,
    ) -> Self {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(MemoryQueue::new());
        let ephemeral = Arc::new(MemoryEphemeral::new());
        let broadcaster = Arc::new(ChannelBroadcaster::new(256));
        let policy = Arc::new(policy);

        let bus: Arc<dyn Broadcaster> = broadcaster.clone();
        let notifier = Arc::new(Notifier::new(ephemeral.clone(), config.notify.clone()));
        let scheduler = Arc::new(Scheduler::new(
            store.clone(),
            store.clone(),
            queue.clone(),
            policy.clone(),
        ));
        let executor = Arc::new(Executor::new(
            store.clone(),
            store.clone(),
            policy.clone(),
            scheduler.clone(),
            notifier.clone(),
            bus.clone(),
            lookup.clone(),
        ));
        let dispatch = DispatchMatcher::new(
            store.clone(),
            ephemeral.clone(),
            lookup.clone(),
            config.dispatch.clone(),
        );
        let rejections = RejectionTracker::new(
            store.clone(),
            store.clone(),
            queue.clone(),
            ephemeral.clone(),
            notifier.clone(),
            bus.clone(),
            lookup.clone(),
            config.rejection.clone(),
        );
        let complaints = ComplaintService::new(
            store.clone(),
            store.clone(),
            queue.clone(),
            scheduler.clone(),
            notifier.clone(),
            bus,
            lookup,
        );

        Self {
            store,
            queue,
            ephemeral,
            broadcaster,
            scheduler,
            executor,
            dispatch,
            rejections,
            complaints,
            notifier,
        }
    }
}
