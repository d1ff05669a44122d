//! TestRail API v2 client.

use std::time::Duration;

use reqwest::header::{HeaderMap, ACCEPT, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{require_parents, Transport};
use crate::config::ClientConfig;
use crate::error::{TransportError, TransportResult};
use crate::models::{Entity, EntityId, EntityKind, Fields, Scope};
use crate::util::compact_text;

const API_PATH: &str = "index.php?/api/v2";
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;
const LINK_PREFIX: &str = "/api/v2/";

/// Authenticated HTTP transport against a TestRail instance
#[derive(Debug, Clone)]
pub struct HttpTransport {
    api_base: String,
    config: ClientConfig,
    client: Client,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> TransportResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            api_base: format!("{}/{API_PATH}", config.url),
            config,
            client,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.api_base)
    }

    async fn get(&self, endpoint: &str) -> TransportResult<String> {
        let url = self.url(endpoint);
        tracing::debug!(%url, "GET");
        self.execute(|| self.client.get(&url)).await
    }

    async fn post(&self, endpoint: &str, body: &Value) -> TransportResult<String> {
        let url = self.url(endpoint);
        tracing::debug!(%url, "POST");
        self.execute(|| self.client.post(&url).json(body)).await
    }

    /// Send a request, retrying on HTTP 429 as advised by `Retry-After`
    async fn execute(&self, build: impl Fn() -> RequestBuilder) -> TransportResult<String> {
        let mut attempt = 0;
        loop {
            let response = build()
                .basic_auth(&self.config.username, Some(&self.config.password))
                .header(ACCEPT, "application/json")
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS && attempt < self.config.max_retries {
                attempt += 1;
                let delay = retry_after(response.headers());
                tracing::warn!(
                    attempt,
                    delay_secs = delay.as_secs(),
                    "TestRail rate limit reached; retrying"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            let body = response.text().await?;
            if !status.is_success() {
                return Err(TransportError::Api {
                    status: status.as_u16(),
                    message: parse_api_error(&body),
                });
            }
            return Ok(body);
        }
    }
}

impl Transport for HttpTransport {
    async fn fetch<T: Entity>(&self, scope: &Scope) -> TransportResult<Vec<T>> {
        let mut endpoint = Some(list_endpoint(T::KIND, scope)?);
        let mut records = Vec::new();
        while let Some(current) = endpoint.take() {
            let body = self.get(&current).await?;
            let page = parse_page(T::KIND, &body)?;
            records.extend(page.items);
            endpoint = page.next;
        }
        Ok(serde_json::from_value(Value::Array(records))?)
    }

    async fn create<T: Entity>(&self, scope: &Scope, mut fields: Fields) -> TransportResult<T> {
        let endpoint = create_endpoint(T::KIND, scope)?;
        if let (EntityKind::Section, Some(suite)) = (T::KIND, scope.suite) {
            fields.entry("suite_id").or_insert_with(|| suite.into());
        }
        let body = self.post(&endpoint, &Value::Object(fields)).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn delete(&self, kind: EntityKind, id: EntityId) -> TransportResult<()> {
        let endpoint = format!("delete_{kind}/{id}");
        self.post(&endpoint, &Value::Object(Fields::new())).await?;
        Ok(())
    }
}

fn list_endpoint(kind: EntityKind, scope: &Scope) -> TransportResult<String> {
    require_parents(kind, scope)?;
    let project = scope.project;
    let endpoint = match (kind, scope.suite, scope.section) {
        (EntityKind::Section, Some(suite), _) => {
            format!("get_sections/{project}&suite_id={suite}")
        }
        (EntityKind::Case, Some(suite), Some(section)) => {
            format!("get_cases/{project}&suite_id={suite}&section_id={section}")
        }
        _ => format!("get_{}/{project}", kind.plural()),
    };
    Ok(endpoint)
}

fn create_endpoint(kind: EntityKind, scope: &Scope) -> TransportResult<String> {
    require_parents(kind, scope)?;
    let endpoint = match (kind, scope.section) {
        (EntityKind::Case, Some(section)) => format!("add_case/{section}"),
        _ => format!("add_{kind}/{}", scope.project),
    };
    Ok(endpoint)
}

#[derive(Debug, PartialEq)]
struct Page {
    items: Vec<Value>,
    next: Option<String>,
}

/// Accept both bare arrays and the paginated `{ <plural>, _links }` envelope
fn parse_page(kind: EntityKind, body: &str) -> TransportResult<Page> {
    match serde_json::from_str::<Value>(body)? {
        Value::Array(items) => Ok(Page { items, next: None }),
        Value::Object(mut envelope) => {
            let items = match envelope.remove(kind.plural()) {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(TransportError::InvalidPayload(format!(
                        "response did not include a '{}' list",
                        kind.plural()
                    )))
                }
            };
            let next = envelope
                .get("_links")
                .and_then(|links| links.get("next"))
                .and_then(Value::as_str)
                .map(next_endpoint);
            Ok(Page { items, next })
        }
        other => Err(TransportError::InvalidPayload(format!(
            "expected a list of {}, got {}",
            kind.plural(),
            compact_text(&other.to_string())
        ))),
    }
}

/// `_links.next` is an absolute API path such as `/api/v2/get_cases/1&offset=250`
fn next_endpoint(link: &str) -> String {
    link.trim_start_matches(LINK_PREFIX).to_string()
}

fn retry_after(headers: &HeaderMap) -> Duration {
    let secs = headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    Duration::from_secs(secs)
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
}

fn parse_api_error(body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.error {
            return message.trim().to_string();
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use reqwest::header::HeaderValue;

    use super::*;

    fn scope() -> Scope {
        Scope::project(EntityId(1))
    }

    #[test]
    fn list_endpoints_follow_testrail_layout() {
        assert_eq!(
            list_endpoint(EntityKind::Milestone, &scope()).unwrap(),
            "get_milestones/1"
        );
        assert_eq!(
            list_endpoint(EntityKind::Suite, &scope()).unwrap(),
            "get_suites/1"
        );
        assert_eq!(
            list_endpoint(EntityKind::Section, &scope().suite(EntityId(4))).unwrap(),
            "get_sections/1&suite_id=4"
        );
        assert_eq!(
            list_endpoint(
                EntityKind::Case,
                &scope().suite(EntityId(4)).section(EntityId(9))
            )
            .unwrap(),
            "get_cases/1&suite_id=4&section_id=9"
        );
    }

    #[test]
    fn list_endpoint_rejects_incomplete_scope() {
        let error = list_endpoint(EntityKind::Case, &scope().suite(EntityId(4))).unwrap_err();
        assert!(matches!(error, TransportError::IncompleteScope { .. }));
    }

    #[test]
    fn create_endpoints_address_the_parent() {
        assert_eq!(
            create_endpoint(EntityKind::Suite, &scope()).unwrap(),
            "add_suite/1"
        );
        assert_eq!(
            create_endpoint(EntityKind::Section, &scope().suite(EntityId(4))).unwrap(),
            "add_section/1"
        );
        assert_eq!(
            create_endpoint(
                EntityKind::Case,
                &scope().suite(EntityId(4)).section(EntityId(9))
            )
            .unwrap(),
            "add_case/9"
        );
    }

    #[test]
    fn parse_page_accepts_bare_arrays() {
        let page = parse_page(EntityKind::Suite, r#"[{"id": 1, "name": "A"}]"#).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next, None);
    }

    #[test]
    fn parse_page_follows_pagination_links() {
        let body = r#"{
            "offset": 0,
            "limit": 250,
            "size": 250,
            "_links": {"next": "/api/v2/get_cases/1&suite_id=4&offset=250", "prev": null},
            "cases": [{"id": 1, "title": "A"}]
        }"#;
        let page = parse_page(EntityKind::Case, body).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(
            page.next.as_deref(),
            Some("get_cases/1&suite_id=4&offset=250")
        );
    }

    #[test]
    fn parse_page_stops_on_last_page() {
        let body = r#"{"_links": {"next": null}, "sections": []}"#;
        let page = parse_page(EntityKind::Section, body).unwrap();
        assert_eq!(page, Page { items: Vec::new(), next: None });
    }

    #[test]
    fn parse_page_rejects_missing_collection() {
        let error = parse_page(EntityKind::Milestone, r#"{"cases": []}"#).unwrap_err();
        assert!(error.to_string().contains("milestones"));
    }

    #[test]
    fn parse_api_error_prefers_error_field() {
        assert_eq!(
            parse_api_error(r#"{"error": "Field :project_id is not a valid project."}"#),
            "Field :project_id is not a valid project."
        );
        assert_eq!(parse_api_error("  "), "empty response body");
        assert_eq!(parse_api_error("Bad gateway"), "Bad gateway");
    }

    #[test]
    fn retry_after_defaults_when_header_missing() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), Duration::from_secs(1));
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Duration::from_secs(7));
    }

    #[test]
    fn api_base_points_at_v2_endpoints() {
        let config = ClientConfig::new("https://acme.testrail.io/", "qa", "key").unwrap();
        let transport = HttpTransport::new(config).unwrap();
        assert_eq!(
            transport.url("get_suites/1"),
            "https://acme.testrail.io/index.php?/api/v2/get_suites/1"
        );
    }
}
