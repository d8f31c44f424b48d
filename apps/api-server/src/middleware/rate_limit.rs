//! Rate limiting middleware.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use palisade_shared::ErrorResponse;
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use palisade_infra::rate_limit::RateLimitService;

/// Rate limiting middleware factory.
pub struct RateLimitMiddleware {
    limiter: Arc<RateLimitService>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<RateLimitService>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Arc<RateLimitService>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let limiter = self.limiter.clone();

        // Get client identifier (IP address)
        let key = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        Box::pin(async move {
            match limiter.check(&key).await {
                Ok(decision) if !decision.allowed => {
                    tracing::warn!(key = %key, "Rate limit exceeded");

                    let now_ms = chrono::Utc::now().timestamp_millis();
                    let retry_after_secs =
                        (decision.reset_at_ms.saturating_sub(now_ms)).max(0) as u64 / 1000 + 1;

                    let error = ErrorResponse::too_many_requests(retry_after_secs);

                    let response = HttpResponse::TooManyRequests()
                        .insert_header(("X-RateLimit-Limit", decision.limit.to_string()))
                        .insert_header(("X-RateLimit-Remaining", "0"))
                        .insert_header(("X-RateLimit-Reset", decision.reset_at_ms.to_string()))
                        .insert_header(("Retry-After", retry_after_secs.to_string()))
                        .json(error);

                    let (http_req, _payload) = req.into_parts();
                    let srv_response = ServiceResponse::new(http_req, response);
                    Ok(srv_response.map_into_right_body())
                }
                other => {
                    // Allowed, or a backend error - fail open and proceed.
                    if let Err(e) = &other {
                        tracing::error!(key = %key, error = %e, "Rate limiter error, failing open");
                    }

                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
            }
        })
    }
}
