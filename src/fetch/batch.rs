//! Batched fetching
//!
//! URLs are split into fixed-size batches. Requests inside a batch run
//! concurrently on the current task; batches run one after another, which caps
//! the number of open requests at the batch size.

use crate::fetch::{FetchError, Fetched, Fetcher, ResourceKind};
use futures::future::join_all;
use std::time::Duration;

/// Result for one URL of a batch, in input order
pub type BatchOutcome = (String, Result<Fetched, FetchError>);

/// Fetches `urls` in batches of `batch_size`
///
/// The returned vector has one entry per input URL in input order, whatever
/// order the responses arrived in.
pub async fn fetch_batched(
    fetcher: &Fetcher,
    urls: &[String],
    kind: ResourceKind,
    timeout: Duration,
    batch_size: usize,
) -> Vec<BatchOutcome> {
    let batch_size = batch_size.max(1);
    let mut outcomes = Vec::with_capacity(urls.len());

    for (index, batch) in urls.chunks(batch_size).enumerate() {
        tracing::debug!(
            "Fetching batch {} ({} {:?} resources)",
            index + 1,
            batch.len(),
            kind
        );

        let results = join_all(batch.iter().map(|url| fetcher.fetch(url, kind, timeout))).await;
        outcomes.extend(batch.iter().cloned().zip(results));
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use crate::policy::DomainPolicy;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slow.css"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("a{}")
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fast.css"))
            .respond_with(ResponseTemplate::new(200).set_body_string("b{}"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.css"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&FetchConfig::default(), Arc::new(DomainPolicy::default()))
            .unwrap();
        let urls = vec![
            format!("{}/slow.css", server.uri()),
            format!("{}/fast.css", server.uri()),
            format!("{}/missing.css", server.uri()),
        ];

        let outcomes = fetch_batched(
            &fetcher,
            &urls,
            ResourceKind::Css,
            Duration::from_secs(5),
            2,
        )
        .await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].0, urls[0]);
        assert_eq!(outcomes[0].1.as_ref().unwrap().text(), "a{}");
        assert_eq!(outcomes[1].1.as_ref().unwrap().text(), "b{}");
        assert!(matches!(
            outcomes[2].1,
            Err(FetchError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_timeout_is_soft_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hang.css"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("a{}")
                    .set_delay(Duration::from_millis(1500)),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&FetchConfig::default(), Arc::new(DomainPolicy::default()))
            .unwrap();
        let urls = vec![format!("{}/hang.css", server.uri())];

        let outcomes = fetch_batched(
            &fetcher,
            &urls,
            ResourceKind::Css,
            Duration::from_millis(300),
            5,
        )
        .await;

        assert!(matches!(
            outcomes[0].1,
            Err(FetchError::Timeout { timeout_ms: 300, .. })
        ));
    }

    #[tokio::test]
    async fn test_html_where_css_expected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login.css"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<!DOCTYPE html><html><body>Sign in</body></html>"),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&FetchConfig::default(), Arc::new(DomainPolicy::default()))
            .unwrap();
        let urls = vec![format!("{}/login.css", server.uri())];

        let outcomes = fetch_batched(
            &fetcher,
            &urls,
            ResourceKind::Css,
            Duration::from_secs(5),
            5,
        )
        .await;

        assert!(matches!(
            outcomes[0].1,
            Err(FetchError::ContentTypeMismatch { .. })
        ));
    }
}
