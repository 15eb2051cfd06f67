//! CORS policy for browsers calling the service through gRPC-Web.
//!
//! gRPC-Web carries the call status in response headers. Browsers hide
//! response headers from scripts unless they are listed in
//! `Access-Control-Expose-Headers`, so those are exposed explicitly.

use tonic::codegen::http::HeaderName;
use tower_http::cors::{Any, CorsLayer};

/// Response headers a gRPC-Web client reads to learn how a call ended.
pub const GRPC_WEB_EXPOSED_HEADERS: [&str; 3] =
    ["grpc-status", "grpc-message", "grpc-status-details-bin"];

/// Allows any origin, method and request header, and exposes the gRPC status
/// headers.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(GRPC_WEB_EXPOSED_HEADERS.map(HeaderName::from_static))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use tonic::codegen::http::{Request, Response, header};
    use tower::{ServiceBuilder, ServiceExt};

    #[tokio::test]
    async fn exposes_grpc_status_headers() {
        let svc = ServiceBuilder::new()
            .layer(cors_layer())
            .service_fn(|_req: Request<String>| async {
                Ok::<_, Infallible>(Response::new(String::new()))
            });

        let req = Request::builder()
            .method("POST")
            .uri("/staffstream.SimpleDataService/StreamLargeData")
            .header(header::ORIGIN, "http://localhost:8080")
            .body(String::new())
            .unwrap();
        let resp = svc.oneshot(req).await.unwrap();

        let exposed = resp
            .headers()
            .get(header::ACCESS_CONTROL_EXPOSE_HEADERS)
            .expect("expose-headers missing")
            .to_str()
            .unwrap();
        for name in GRPC_WEB_EXPOSED_HEADERS {
            assert!(exposed.contains(name), "{name} not in {exposed}");
        }
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }
}
