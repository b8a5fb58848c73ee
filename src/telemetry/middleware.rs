use std::future::{Ready, ready};

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::{Error, HttpMessage};
use futures_util::future::LocalBoxFuture;

use super::b3::TraceContext;
use super::zipkin::{PendingSpan, SpanKind, ZipkinReporter};

/// Joins inbound requests to the caller's trace and reports a server span
///
/// The request's own [`TraceContext`] is stored in the request extensions,
/// where handlers pick it up to parent their outbound calls. Without a
/// reporter the middleware passes requests through untouched.
pub struct TraceMiddleware {
    reporter: Option<ZipkinReporter>,
}

impl TraceMiddleware {
    pub fn new(reporter: Option<ZipkinReporter>) -> Self {
        Self { reporter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TraceMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddlewareService {
            service,
            reporter: self.reporter.clone(),
        }))
    }
}

pub struct TraceMiddlewareService<S> {
    service: S,
    reporter: Option<ZipkinReporter>,
}

impl<S, B> Service<ServiceRequest> for TraceMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(reporter) = self.reporter.clone() else {
            return Box::pin(self.service.call(req));
        };

        let context = match TraceContext::from_headers(req.headers()) {
            Some(inbound) => inbound.child(),
            None => TraceContext::root(),
        };
        req.extensions_mut().insert(context.clone());

        let method = req.method().to_string();
        let mut span = PendingSpan::start(context, method.to_lowercase(), SpanKind::Server);
        span.tag("http.method", &method);
        span.tag("http.path", req.path());

        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;

            let status = match &result {
                Ok(res) => res.status(),
                Err(e) => e.as_response_error().status_code(),
            };
            span.tag("http.status_code", status.as_u16());
            if status.is_server_error() {
                span.tag("error", status.as_u16());
            }
            reporter.report(span);

            result
        })
    }
}
