use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use cohort_core::token::CallMetadata;

/// Per-call metadata lifted from request headers.
///
/// Extraction never fails; a missing or unusable `authorization` header is
/// judged by the identity service, which owns the error semantics.
#[derive(Debug, Clone, Default)]
pub struct Metadata(pub CallMetadata);

impl<S> FromRequestParts<S> for Metadata
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let metadata = match parts.headers.get(header::AUTHORIZATION) {
            Some(value) => {
                CallMetadata::with_authorization(String::from_utf8_lossy(value.as_bytes()))
            }
            None => CallMetadata::new(),
        };
        Ok(Metadata(metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> CallMetadata {
        let (mut parts, _) = request.into_parts();
        let Metadata(metadata) = Metadata::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        metadata
    }

    #[tokio::test]
    async fn authorization_header_is_carried_verbatim() {
        let request = Request::builder()
            .header("Authorization", "Bearer abc.def.ghi")
            .body(())
            .unwrap();
        let metadata = extract(request).await;
        assert_eq!(metadata.authorization(), Some("Bearer abc.def.ghi"));
        assert_eq!(metadata.bearer_token(), Some("abc.def.ghi"));
    }

    #[tokio::test]
    async fn missing_header_yields_empty_metadata() {
        let metadata = extract(Request::builder().body(()).unwrap()).await;
        assert_eq!(metadata.authorization(), None);
    }
}
