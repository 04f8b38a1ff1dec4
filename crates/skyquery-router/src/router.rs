//! Primary/fallback resolution.
//!
//! The router tries its primary resolver and hands the request to the
//! fallback when the primary errors or comes back empty. Primary failure is
//! logged and absorbed; the caller always receives an envelope.

use std::sync::Arc;

use tracing::{error, info, warn};

use skyquery_core::defaults::MSG_RESOLVE_FAILED;
use skyquery_core::{RecordRepository, ResponseEnvelope, Resolver, StoredRequest};
use skyquery_db::PayloadStore;

use crate::resolvers::{CloudResolver, SatelliteResolver};

/// Routes a stored request to a primary resolver, then a fallback.
#[derive(Clone)]
pub struct ResolutionRouter {
    primary: Arc<dyn Resolver>,
    fallback: Arc<dyn Resolver>,
}

impl ResolutionRouter {
    pub fn new(primary: Arc<dyn Resolver>, fallback: Arc<dyn Resolver>) -> Self {
        Self { primary, fallback }
    }

    /// Cloud lookup against `records`, satellite stub as fallback.
    pub fn cloud_with_satellite_fallback(
        records: Arc<dyn RecordRepository>,
        payloads: Arc<PayloadStore>,
    ) -> Self {
        Self::new(
            Arc::new(CloudResolver::new(records, payloads)),
            Arc::new(SatelliteResolver),
        )
    }

    /// Resolve `request`. Never returns an error; a failing fallback yields
    /// an error envelope.
    pub async fn route(&self, request: &StoredRequest) -> ResponseEnvelope {
        match self.primary.resolve(request).await {
            Ok(results) if !results.is_empty() => {
                info!(
                    subsystem = "router",
                    op = "route",
                    request_id = %request.id,
                    source = %self.primary.source(),
                    result_count = results.len(),
                    "Request resolved"
                );
                return ResponseEnvelope::success(self.primary.source(), results);
            }
            Ok(_) => warn!(
                subsystem = "router",
                op = "route",
                request_id = %request.id,
                source = %self.primary.source(),
                "Primary resolver returned no results, falling back"
            ),
            Err(e) => warn!(
                subsystem = "router",
                op = "route",
                request_id = %request.id,
                source = %self.primary.source(),
                error = %e,
                "Primary resolver failed, falling back"
            ),
        }

        match self.fallback.resolve(request).await {
            Ok(results) => {
                info!(
                    subsystem = "router",
                    op = "route",
                    request_id = %request.id,
                    source = %self.fallback.source(),
                    result_count = results.len(),
                    "Request resolved by fallback"
                );
                ResponseEnvelope::success(self.fallback.source(), results)
            }
            Err(e) => {
                error!(
                    subsystem = "router",
                    op = "route",
                    request_id = %request.id,
                    source = %self.fallback.source(),
                    error = %e,
                    "Fallback resolver failed"
                );
                ResponseEnvelope::error(e, MSG_RESOLVE_FAILED)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use skyquery_core::{Error, RequestId, Result, ResultItem, Source};

    struct Fixed(Source, Result<Vec<ResultItem>>);

    #[async_trait]
    impl Resolver for Fixed {
        fn source(&self) -> Source {
            self.0
        }

        async fn resolve(&self, _request: &StoredRequest) -> Result<Vec<ResultItem>> {
            match &self.1 {
                Ok(items) => Ok(items.clone()),
                Err(e) => Err(Error::Internal(e.to_string())),
            }
        }
    }

    fn item() -> ResultItem {
        ResultItem {
            capture_timestamp: "2024-01-01T00:00:00Z".into(),
            data_url: "u1".into(),
            location: Some("NYC".into()),
        }
    }

    fn request() -> StoredRequest {
        StoredRequest {
            id: RequestId::new("r"),
            path: "r.json".into(),
        }
    }

    fn router(primary: Fixed, fallback: Fixed) -> ResolutionRouter {
        ResolutionRouter::new(Arc::new(primary), Arc::new(fallback))
    }

    #[tokio::test]
    async fn test_primary_success_is_returned() {
        let r = router(
            Fixed(Source::Cloud, Ok(vec![item()])),
            Fixed(Source::Satellite, Ok(vec![])),
        );
        let env = r.route(&request()).await;
        assert_eq!(env.source(), Some(Source::Cloud));
        assert_eq!(env.results(), &[item()]);
    }

    #[tokio::test]
    async fn test_primary_error_falls_back() {
        let r = router(
            Fixed(Source::Cloud, Err(Error::Internal("db locked".into()))),
            Fixed(Source::Satellite, Ok(vec![])),
        );
        let env = r.route(&request()).await;
        assert!(env.is_success());
        assert_eq!(env.source(), Some(Source::Satellite));
        assert!(env.results().is_empty());
    }

    #[tokio::test]
    async fn test_primary_empty_falls_back() {
        let r = router(
            Fixed(Source::Cloud, Ok(vec![])),
            Fixed(Source::Satellite, Ok(vec![])),
        );
        assert_eq!(r.route(&request()).await.source(), Some(Source::Satellite));
    }

    #[tokio::test]
    async fn test_failing_fallback_yields_error_envelope() {
        let r = router(
            Fixed(Source::Cloud, Err(Error::Internal("a".into()))),
            Fixed(Source::Satellite, Err(Error::Internal("b".into()))),
        );
        match r.route(&request()).await {
            ResponseEnvelope::Error { message, .. } => assert_eq!(message, MSG_RESOLVE_FAILED),
            other => panic!("expected error envelope, got {other:?}"),
        }
    }
}
