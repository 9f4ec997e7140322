use std::future::Future;
use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;

use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::metrics::Counter;
use pin_project_lite::pin_project;
use tower::BoxError;
use tower::Service;
use tracing::trace;

use pace_limit::Clock;
use pace_limit::Cooldown;
use pace_limit::MonotonicClock;
use pace_limit::Reason;

use crate::error::PaceError;

#[derive(Clone, Debug)]
struct ThrottleServiceMetrics {
    throttled: Counter<u64>,
}

/// Forwards one request per cooldown window and rejects the rest.
///
/// Rejected requests never reach the inner service and are not queued.
#[derive(Debug)]
pub struct ThrottleService<S, C = MonotonicClock> {
    inner: S,
    cooldown: Arc<Cooldown<C>>,
    instruments: ThrottleServiceMetrics,
}

pin_project! {
    /// Either the inner service's future or an immediate rejection.
    #[project = ResponseFutureProj]
    pub enum ResponseFuture<F> {
        Passed {
            #[pin]
            inner: F,
        },
        Throttled {
            error: PaceError,
        },
    }
}

impl<F, T, E> Future for ResponseFuture<F>
where
    F: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    type Output = Result<T, BoxError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            ResponseFutureProj::Passed { inner } => inner.poll(cx).map_err(Into::into),
            ResponseFutureProj::Throttled { error } => {
                Poll::Ready(Err(BoxError::from(error.clone())))
            }
        }
    }
}

// Manually implement Clone so that C need not be Clone
impl<S, C> Clone for ThrottleService<S, C>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            cooldown: Arc::clone(&self.cooldown),
            instruments: self.instruments.clone(),
        }
    }
}

impl<S, C, Req> Service<Req> for ThrottleService<S, C>
where
    S: Service<Req>,
    S::Error: Into<BoxError>,
    C: Clock,
{
    type Response = S::Response;
    type Error = BoxError;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // The cooldown is checked in `call`, never here.
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        match self.cooldown.try_acquire() {
            ControlFlow::Continue(()) => ResponseFuture::Passed {
                inner: self.inner.call(req),
            },
            ControlFlow::Break(Reason::Cooling { retry_after }) => {
                trace!(?retry_after, "request throttled");
                let delay_ms =
                    i64::try_from(self.cooldown.delay().as_millis()).unwrap_or(i64::MAX);
                self.instruments
                    .throttled
                    .add(1, &[KeyValue::new("delay_ms", delay_ms)]);
                ResponseFuture::Throttled {
                    error: PaceError::Throttled { retry_after },
                }
            }
        }
    }
}

impl<S, C> ThrottleService<S, C> {
    pub fn new(inner: S, cooldown: Arc<Cooldown<C>>) -> Self {
        let meter = global::meter("throttle_service");
        let instruments = ThrottleServiceMetrics {
            throttled: meter.u64_counter("throttled").build(),
        };

        Self {
            inner,
            cooldown,
            instruments,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}
