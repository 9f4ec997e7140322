use std::sync::Arc;

use pace_limit::Cooldown;
use tower::ServiceBuilder;
use tower::layer::util::Stack;

use crate::ThrottleLayer;

/// Service Builder Extension with additional useful functions for tower::ServiceBuilder.
pub trait ServiceBuilderExt<L> {
    /// Add a throttle layer sharing `cooldown`
    fn throttle<C>(self, cooldown: Arc<Cooldown<C>>) -> ServiceBuilder<Stack<ThrottleLayer<C>, L>>;
}

impl<L> ServiceBuilderExt<L> for ServiceBuilder<L> {
    fn throttle<C>(self, cooldown: Arc<Cooldown<C>>) -> ServiceBuilder<Stack<ThrottleLayer<C>, L>> {
        self.layer(ThrottleLayer::new(cooldown))
    }
}
