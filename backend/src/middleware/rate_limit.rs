//! Per-client request rate limiting.
//!
//! A keyed GCRA limiter (`governor`) tracks each peer IP separately. Wrap
//! only the resources that need throttling; a rejected request is answered
//! with `429 Too Many Requests`, a `Retry-After` header and a fixed JSON
//! body without reaching the handler.
//!
//! Each throttled endpoint gets its own [`RateLimit`] through
//! [`EndpointLimits`], so exhausting one route never locks a client out of
//! another. Idle client entries are dropped by [`RateLimit::retain_recent`].

use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroU32;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{Error, HttpResponse};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use governor::clock::Clock as _;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use serde_json::json;
use tracing::warn;

/// Body returned with every throttled response.
pub const RATE_LIMIT_MESSAGE: &str = "rate limit exceeded. Try again later";

/// Shared keyed limiter; clones share the same buckets.
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
}

impl RateLimit {
    /// Allow `requests` per minute per client address.
    #[must_use]
    pub fn per_minute(requests: NonZeroU32) -> Self {
        Self::with_quota(Quota::per_minute(requests))
    }

    /// Limit with an arbitrary `quota`.
    #[must_use]
    pub fn with_quota(quota: Quota) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
        }
    }

    /// Forget clients whose bucket has fully replenished.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Number of client addresses currently tracked.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

/// Independent limiters for every throttled endpoint.
#[derive(Clone)]
pub struct EndpointLimits {
    pub signup: RateLimit,
    pub current_contact: RateLimit,
    pub login: RateLimit,
}

impl EndpointLimits {
    /// Give each endpoint its own `requests` per minute per client.
    #[must_use]
    pub fn per_minute(requests: NonZeroU32) -> Self {
        Self {
            signup: RateLimit::per_minute(requests),
            current_contact: RateLimit::per_minute(requests),
            login: RateLimit::per_minute(requests),
        }
    }

    /// Sweep idle clients from every limiter.
    pub fn retain_recent(&self) {
        self.signup.retain_recent();
        self.current_contact.retain_recent();
        self.login.retain_recent();
    }
}

fn client_ip(req: &ServiceRequest) -> IpAddr {
    req.peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limiter: Arc::clone(&self.limiter),
        }))
    }
}

/// Service wrapper produced by [`RateLimit`].
pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let ip = client_ip(&req);
        if let Err(not_until) = self.limiter.check_key(&ip) {
            let wait = not_until.wait_time_from(self.limiter.clock().now());
            warn!(client = %ip, path = req.path(), "rate limit exceeded");
            let response = HttpResponse::TooManyRequests()
                .insert_header((header::RETRY_AFTER, wait.as_secs().max(1).to_string()))
                .json(json!({ "error": RATE_LIMIT_MESSAGE }));
            return Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) });
        }

        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}
