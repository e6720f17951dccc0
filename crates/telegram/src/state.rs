use std::sync::Arc;

use {
    courier_channels::{AdminDirectory, ChatOutbound},
    courier_config::CourierConfig,
    courier_pairing::{LinkManager, MemorySessions, PairingCoordinator},
    courier_routing::{RequestRelay, TagMarker},
    courier_store::ConfigStore,
};

/// Everything an update handler needs, shared across spawned tasks.
pub struct BotContext {
    pub bot_username: Option<String>,
    pub coordinator: PairingCoordinator,
    pub relay: RequestRelay,
    pub admins: Arc<dyn AdminDirectory>,
    pub outbound: Arc<dyn ChatOutbound>,
    /// Channel-post prefix that triggers auto-claim.
    pub auto_claim_prefix: String,
}

impl BotContext {
    pub fn new(
        bot_username: Option<String>,
        config: &CourierConfig,
        store: Arc<ConfigStore>,
        outbound: Arc<dyn ChatOutbound>,
        admins: Arc<dyn AdminDirectory>,
    ) -> Self {
        let sessions = Arc::new(MemorySessions::new(config.pairing.ttl()));
        let links = Arc::new(LinkManager::new(Arc::clone(&store), Arc::clone(&outbound)));
        Self {
            bot_username,
            coordinator: PairingCoordinator::new(sessions, links),
            relay: RequestRelay::new(
                store,
                Arc::clone(&outbound),
                TagMarker::new(config.relay.tag.clone()),
            ),
            admins,
            outbound,
            auto_claim_prefix: config.telegram.auto_claim_prefix.clone(),
        }
    }
}
