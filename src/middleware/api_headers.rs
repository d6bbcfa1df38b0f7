use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderValue, CACHE_CONTROL, X_CONTENT_TYPE_OPTIONS},
    Error,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

/// Adds `nosniff` to every response and `no-store` to JSON API responses,
/// which carry per-user data that must not be cached.
pub struct ApiHeaders;

impl<S, B> Transform<S, ServiceRequest> for ApiHeaders
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiHeadersMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiHeadersMiddleware { service }))
    }
}

pub struct ApiHeadersMiddleware<S> {
    service: S,
}

fn is_api_path(path: &str) -> bool {
    ["/api", "/ai"]
        .iter()
        .any(|prefix| path == *prefix || path.starts_with(&format!("{}/", prefix)))
}

impl<S, B> Service<ServiceRequest> for ApiHeadersMiddleware<S>
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
        let no_store = is_api_path(req.path());
        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;

            let headers = res.headers_mut();
            headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
            if no_store {
                headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
            }

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_app;
    use actix_web::test::{call_service, TestRequest};

    #[test]
    fn test_api_paths() {
        assert!(is_api_path("/api/Members"));
        assert!(is_api_path("/ai/challenge"));
        assert!(!is_api_path("/tree"));
        assert!(!is_api_path("/apiary"));
    }

    #[actix_web::test]
    async fn test_headers_applied() {
        let app = test_app().await;

        let resp = call_service(&app, TestRequest::get().uri("/api/Notes").to_request()).await;
        assert_eq!(resp.headers().get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(resp.headers().get("cache-control").unwrap(), "no-store");

        let resp = call_service(&app, TestRequest::get().uri("/tree").to_request()).await;
        assert_eq!(resp.headers().get("x-content-type-options").unwrap(), "nosniff");
        assert!(resp.headers().get("cache-control").is_none());
    }
}
