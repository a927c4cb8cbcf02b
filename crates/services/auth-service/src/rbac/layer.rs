//! Tower middleware applying [`RbacInterceptor`] in front of the router.

use std::collections::HashSet;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use http::{Request, Response};
use tonic::body::BoxBody;
use tonic::Status;
use tower::{Layer, Service};

use super::interceptor::RbacInterceptor;

/// Last path segment of a gRPC route: `/auth.AuthService/LoginUser` → `LoginUser`.
pub fn operation_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Layer installing [`RbacService`].
#[derive(Clone)]
pub struct RbacLayer {
    interceptor: Arc<RbacInterceptor>,
    public: Arc<HashSet<String>>,
}

impl RbacLayer {
    pub fn new(interceptor: RbacInterceptor) -> Self {
        Self {
            interceptor: Arc::new(interceptor),
            public: Arc::new(HashSet::new()),
        }
    }

    /// Operations forwarded without any token check.
    pub fn allow_public<I, S>(mut self, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut public = (*self.public).clone();
        public.extend(operations.into_iter().map(Into::into));
        self.public = Arc::new(public);
        self
    }
}

impl<S> Layer<S> for RbacLayer {
    type Service = RbacService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RbacService {
            inner,
            interceptor: Arc::clone(&self.interceptor),
            public: Arc::clone(&self.public),
        }
    }
}

/// Forwards authorized calls to `S`; answers everything else with a gRPC
/// error status without touching `S`.
#[derive(Clone)]
pub struct RbacService<S> {
    inner: S,
    interceptor: Arc<RbacInterceptor>,
    public: Arc<HashSet<String>>,
}

impl<S, ReqBody> Service<Request<ReqBody>> for RbacService<S>
where
    S: Service<Request<ReqBody>, Response = Response<BoxBody>> + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = Response<BoxBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let operation = operation_name(request.uri().path());

        if !self.public.contains(operation) {
            if let Err(err) = self.interceptor.authorize(request.headers(), operation) {
                let response = Status::from(err).into_http();
                return Box::pin(async move { Ok(response) });
            }
        }

        Box::pin(self.inner.call(request))
    }
}
