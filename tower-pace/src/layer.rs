use std::sync::Arc;

use pace_limit::Cooldown;
use pace_limit::MonotonicClock;
use tower::Layer;

use crate::service::ThrottleService;

/// Applies a throttle to requests.
///
/// Every service built from one layer shares the same cooldown.
#[derive(Debug)]
pub struct ThrottleLayer<C = MonotonicClock> {
    cooldown: Arc<Cooldown<C>>,
}

impl<C> Clone for ThrottleLayer<C> {
    fn clone(&self) -> Self {
        Self {
            cooldown: Arc::clone(&self.cooldown),
        }
    }
}

impl<C> ThrottleLayer<C> {
    /// Create a ThrottleLayer
    pub fn new(cooldown: Arc<Cooldown<C>>) -> Self {
        ThrottleLayer { cooldown }
    }
}

impl<S, C> Layer<S> for ThrottleLayer<C> {
    type Service = ThrottleService<S, C>;

    fn layer(&self, service: S) -> Self::Service {
        ThrottleService::new(service, Arc::clone(&self.cooldown))
    }
}
