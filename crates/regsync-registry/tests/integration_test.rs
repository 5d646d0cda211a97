//! Integration tests for repository listing.
//!
//! ECR sources run against an in-memory backend; catalog sources against a
//! local HTTP server speaking the distribution API.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;

use regsync_core::MappingConfig;
use regsync_registry::{
    BackendError, DescribeRepositoriesRequest, EcrApi, EcrConnector, RegistryAuth,
    RegistryConfig, RegistryError, RepositoryPage, SourceFactory,
};

const ECR_HOST: &str = "123456789012.dkr.ecr.eu-central-1.amazonaws.com";

// =============================================================================
// Fake ECR backend
// =============================================================================

struct FakeEcr {
    repositories: Vec<String>,
    calls: AtomicUsize,
}

#[async_trait]
impl EcrApi for FakeEcr {
    async fn describe_repositories(
        &self,
        request: DescribeRepositoriesRequest,
    ) -> Result<RepositoryPage, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(request.registry_id, "123456789012");

        let start: usize = match request.next_token {
            Some(token) => token.parse()?,
            None => 0,
        };
        let end = (start + request.max_results as usize).min(self.repositories.len());
        Ok(RepositoryPage {
            repository_names: self.repositories[start..end].to_vec(),
            next_token: (end < self.repositories.len()).then(|| end.to_string()),
        })
    }

    async fn describe_registry(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

struct FakeConnector {
    api: Arc<FakeEcr>,
}

impl FakeConnector {
    fn with_repositories(repositories: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            api: Arc::new(FakeEcr {
                repositories,
                calls: AtomicUsize::new(0),
            }),
        })
    }
}

#[async_trait]
impl EcrConnector for FakeConnector {
    async fn connect(&self, region: &str) -> Result<Arc<dyn EcrApi>, BackendError> {
        if region != "eu-central-1" {
            return Err(format!("unexpected region {region}").into());
        }
        Ok(self.api.clone() as Arc<dyn EcrApi>)
    }
}

// =============================================================================
// Fake distribution registry
// =============================================================================

struct FakeRegistry {
    repositories: Vec<String>,
    tags: BTreeMap<String, Vec<String>>,
    token: Option<String>,
    fail_on_request: Option<usize>,
    malformed_catalog: bool,
    next_page: Option<String>,
    catalog_requests: AtomicUsize,
    authorized_requests: AtomicUsize,
}

impl FakeRegistry {
    fn new(repositories: &[&str]) -> Self {
        Self {
            repositories: repositories.iter().map(ToString::to_string).collect(),
            tags: BTreeMap::new(),
            token: None,
            fail_on_request: None,
            malformed_catalog: false,
            next_page: None,
            catalog_requests: AtomicUsize::new(0),
            authorized_requests: AtomicUsize::new(0),
        }
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        self.token.as_ref().is_none_or(|token| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == format!("Bearer {token}"))
        })
    }

    fn catalog(&self, query: &str) -> Response {
        let request = self.catalog_requests.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_request == Some(request) {
            return (StatusCode::INTERNAL_SERVER_ERROR, "backend down").into_response();
        }
        if self.malformed_catalog {
            return ([(header::CONTENT_TYPE, "application/json")], "{\"repositories\": [").into_response();
        }

        let params: BTreeMap<&str, &str> = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .collect();
        let n: usize = params.get("n").and_then(|n| n.parse().ok()).unwrap_or(100);
        let start = params
            .get("last")
            .and_then(|last| self.repositories.iter().position(|r| r == last))
            .map_or(0, |i| i + 1);
        let end = (start + n).min(self.repositories.len());
        let page = &self.repositories[start..end];

        let mut response = Json(json!({ "repositories": page })).into_response();
        let link = if end < self.repositories.len() {
            Some(format!("</v2/_catalog?last={}&n={n}>; rel=\"next\"", page[page.len() - 1]))
        } else {
            self.next_page.as_ref().map(|next| format!("<{next}>; rel=\"next\""))
        };
        if let Some(link) = link {
            response
                .headers_mut()
                .insert(header::LINK, link.parse().unwrap());
        }
        response
    }
}

async fn handle(State(registry): State<Arc<FakeRegistry>>, uri: Uri, headers: HeaderMap) -> Response {
    if headers.contains_key(header::AUTHORIZATION) {
        registry.authorized_requests.fetch_add(1, Ordering::SeqCst);
    }
    if !registry.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let path = uri.path();
    if path == "/v2/" {
        return Json(json!({})).into_response();
    }
    if path == "/v2/_catalog" {
        return registry.catalog(uri.query().unwrap_or_default());
    }
    if let Some(name) = path
        .strip_prefix("/v2/")
        .and_then(|rest| rest.strip_suffix("/tags/list"))
    {
        return match registry.tags.get(name) {
            Some(tags) => Json(json!({ "name": name, "tags": tags })).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        };
    }
    StatusCode::NOT_FOUND.into_response()
}

async fn spawn_registry(registry: FakeRegistry) -> (String, Arc<FakeRegistry>) {
    let registry = Arc::new(registry);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(handle).with_state(registry.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), registry)
}

fn names(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}{i:03}")).collect()
}

// =============================================================================
// Factory Tests
// =============================================================================

#[tokio::test]
async fn test_factory_requires_connector_for_ecr() {
    let result = SourceFactory::new().create(RegistryConfig::new(ECR_HOST));
    assert!(matches!(
        result,
        Err(RegistryError::UnsupportedRegistry { ref registry, .. }) if registry == ECR_HOST
    ));
}

#[tokio::test]
async fn test_factory_builds_ecr_source() {
    let connector = FakeConnector::with_repositories(names("svc-", 150));
    let source = SourceFactory::new()
        .with_ecr_connector(connector.clone())
        .create(RegistryConfig::new(format!("https://{ECR_HOST}")))
        .unwrap();

    source.ping().await.unwrap();
    let repos = source.retrieve(0).await.unwrap();
    assert_eq!(repos.len(), 150);
    assert_eq!(connector.api.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_factory_ecr_page_bound() {
    let connector = FakeConnector::with_repositories(names("svc-", 150));
    let source = SourceFactory::new()
        .with_ecr_connector(connector)
        .create(RegistryConfig::new(ECR_HOST))
        .unwrap();

    let repos = source.retrieve(50).await.unwrap();
    assert!(repos.len() >= 50, "got {}", repos.len());
    assert!(repos.len() <= 150, "got {}", repos.len());
}

#[tokio::test]
async fn test_factory_rejects_invalid_url() {
    assert!(matches!(
        SourceFactory::new().create(RegistryConfig::new("")),
        Err(RegistryError::InvalidUrl { .. })
    ));
}

// =============================================================================
// Catalog Source Tests
// =============================================================================

#[tokio::test]
async fn test_catalog_retrieve_follows_links() {
    let (url, registry) = spawn_registry(FakeRegistry::new(&["a", "b", "c", "d", "e"])).await;
    let source = SourceFactory::new()
        .create(RegistryConfig::new(url).with_page_size(2))
        .unwrap();

    let repos = source.retrieve(0).await.unwrap();
    assert_eq!(repos, vec!["a", "b", "c", "d", "e"]);
    assert_eq!(registry.catalog_requests.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_catalog_retrieve_bound_is_page_granular() {
    let (url, registry) = spawn_registry(FakeRegistry::new(&["a", "b", "c", "d", "e"])).await;
    let source = SourceFactory::new()
        .create(RegistryConfig::new(url).with_page_size(2))
        .unwrap();

    let repos = source.retrieve(3).await.unwrap();
    assert_eq!(repos, vec!["a", "b", "c", "d"]);
    assert_eq!(registry.catalog_requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_catalog_failure_discards_partial_results() {
    let mut fake = FakeRegistry::new(&["a", "b", "c"]);
    fake.fail_on_request = Some(1);
    let (url, _) = spawn_registry(fake).await;
    let source = SourceFactory::new()
        .create(RegistryConfig::new(url).with_page_size(2))
        .unwrap();

    let err = source.retrieve(0).await.unwrap_err();
    assert!(matches!(err, RegistryError::HttpError { status: 500, .. }));
}

#[tokio::test]
async fn test_catalog_malformed_body_is_http_error() {
    let mut fake = FakeRegistry::new(&["a"]);
    fake.malformed_catalog = true;
    let (url, _) = spawn_registry(fake).await;
    let source = SourceFactory::new().create(RegistryConfig::new(url)).unwrap();

    let err = source.retrieve(0).await.unwrap_err();
    assert!(
        matches!(err, RegistryError::HttpError { status: 0, ref message } if message.starts_with("malformed response")),
        "unexpected error {err:?}"
    );
}

#[tokio::test]
async fn test_catalog_next_link_to_other_origin_drops_credentials() {
    let (mirror_url, mirror) = spawn_registry(FakeRegistry::new(&["c"])).await;

    let mut primary = FakeRegistry::new(&["a", "b"]);
    primary.token = Some("s3cret".to_string());
    primary.next_page = Some(format!("{mirror_url}/v2/_catalog?n=2"));
    let (url, primary) = spawn_registry(primary).await;

    let source = SourceFactory::new()
        .create(
            RegistryConfig::new(url)
                .with_auth(RegistryAuth::bearer("s3cret"))
                .with_page_size(2),
        )
        .unwrap();

    let repos = source.retrieve(0).await.unwrap();
    assert_eq!(repos, vec!["a", "b", "c"]);
    assert_eq!(primary.authorized_requests.load(Ordering::SeqCst), 1);
    assert_eq!(mirror.catalog_requests.load(Ordering::SeqCst), 1);
    assert_eq!(mirror.authorized_requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_catalog_ping_with_credentials() {
    let mut fake = FakeRegistry::new(&[]);
    fake.token = Some("s3cret".to_string());
    let (url, _) = spawn_registry(fake).await;

    let anonymous = SourceFactory::new().create(RegistryConfig::new(url.clone())).unwrap();
    let err = anonymous.ping().await.unwrap_err();
    assert!(matches!(err, RegistryError::PingFailed { .. }));

    let authorized = SourceFactory::new()
        .create(RegistryConfig::new(url).with_auth(RegistryAuth::bearer("s3cret")))
        .unwrap();
    authorized.ping().await.unwrap();
    assert!(authorized.retrieve(0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_catalog_list_tags() {
    let mut fake = FakeRegistry::new(&["library/busybox"]);
    fake.tags.insert(
        "library/busybox".to_string(),
        vec!["1.36".to_string(), "latest".to_string()],
    );
    let (url, _) = spawn_registry(fake).await;
    let source = SourceFactory::new().create(RegistryConfig::new(url)).unwrap();

    let tags = source.list_tags("/library/busybox").await.unwrap();
    let tag_names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tag_names, vec!["1.36", "latest"]);
    assert_eq!(tags[0], regsync_registry::Tag::new("1.36"));

    assert!(source.list_tags("library/missing").await.unwrap().is_empty());
}

// =============================================================================
// End-to-end Tests
// =============================================================================

#[tokio::test]
async fn test_list_filter_and_map() {
    let mut repos = names("team-a/svc-", 60);
    repos.extend(names("team-b/svc-", 60));
    let connector = FakeConnector::with_repositories(repos);

    let source = SourceFactory::new()
        .with_ecr_connector(connector)
        .create(RegistryConfig::new(ECR_HOST))
        .unwrap();
    let listed = source.retrieve(0).await.unwrap();
    assert_eq!(listed.len(), 120);

    let mapping = MappingConfig::new("regex:team-a/.*")
        .with_to("regex:^/team-a/(.*)$,/mirror/$1")
        .with_tags(["latest"])
        .validate()
        .unwrap();

    let selected = mapping.filter_repos(listed);
    assert_eq!(selected.len(), 60);
    assert_eq!(selected[0], "/team-a/svc-000");

    let targets: Vec<String> = selected.iter().map(|r| mapping.map_path(r)).collect();
    assert_eq!(targets[0], "/mirror/svc-000");
    assert_eq!(targets[59], "/mirror/svc-059");
    assert!(mapping.tags().matches("latest"));
}

#[tokio::test]
async fn test_literal_mapping_over_catalog() {
    let (url, _) = spawn_registry(FakeRegistry::new(&["library/busybox", "library/nginx"])).await;
    let source = SourceFactory::new().create(RegistryConfig::new(url)).unwrap();

    let mapping = MappingConfig::new("library/busybox")
        .with_to("mirror/busybox")
        .validate()
        .unwrap();

    let listed = source.retrieve(0).await.unwrap();
    assert_eq!(mapping.filter_repos(listed.clone()), listed);
    assert_eq!(mapping.source_path(), Some("/library/busybox"));
    assert_eq!(mapping.map_path("/library/busybox"), "/mirror/busybox");
}
