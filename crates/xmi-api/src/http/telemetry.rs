//! Per-route request accounting and request-id scoping.
//!
//! Attached with `route_layer`, so every request seen here has a
//! [`MatchedPath`]. Unrouted requests (404) never reach it and are not counted.
use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use axum::extract::MatchedPath;
use axum::http::Request;
use axum::response::Response;
use tower::{Layer, Service};
use xmi_telemetry::{Metrics, with_request_context};

use crate::http::constants::HEADER_REQUEST_ID;

/// Counts responses per matched route and status code.
#[derive(Clone)]
pub(crate) struct RouteMetricsLayer {
    telemetry: Metrics,
}

impl RouteMetricsLayer {
    pub(crate) const fn new(telemetry: Metrics) -> Self {
        Self { telemetry }
    }
}

impl<S> Layer<S> for RouteMetricsLayer {
    type Service = RouteMetrics<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RouteMetrics {
            inner,
            telemetry: self.telemetry.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct RouteMetrics<S> {
    inner: S,
    telemetry: Metrics,
}

fn request_id_of<B>(req: &Request<B>) -> String {
    req.headers()
        .get(HEADER_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_default()
}

impl<S, B> Service<Request<B>> for RouteMetrics<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let route = req
            .extensions()
            .get::<MatchedPath>()
            .map(|matched| matched.as_str().to_string());
        let request_id = request_id_of(&req);
        let telemetry = self.telemetry.clone();
        let pending = self.inner.call(req);

        Box::pin(with_request_context(request_id, async move {
            let response = pending.await?;
            if let Some(route) = route {
                telemetry.inc_http_request(&route, response.status().as_u16());
            }
            Ok(response)
        }))
    }
}
