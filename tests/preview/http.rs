//! The stock HTTP stack against an axum stand-in for the content API and
//! the schema endpoint.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use prismic_preview::resolver;
use prismic_preview::type_paths::STRUCTURED_TEXT_TYPE;
use prismic_preview::{
    ConfigRegistry, InMemoryRegistry, PluginOptions, PreviewDeps, PreviewFingerprint,
    PreviewOptions, PreviewSession, SchemaArtifact, SessionPhase, TypePaths,
};

const TOKEN: &str = "https://repo.prismic.io/previews/abc";
const MASTER_REF: &str = "master-ref";

/// One recorded document search: `(document id, ref, cookie header)`.
type Search = (String, String, Option<String>);

#[derive(Clone, Default)]
struct Server {
    searches: Arc<Mutex<Vec<Search>>>,
    schemas: Arc<HashMap<String, String>>,
    /// Hold the first metadata response back this long.
    first_metadata_delay: Option<Duration>,
    metadata_calls: Arc<AtomicUsize>,
}

async fn api_root(State(server): State<Server>) -> Json<Value> {
    let call = server.metadata_calls.fetch_add(1, Ordering::SeqCst);
    if let (0, Some(delay)) = (call, server.first_metadata_delay) {
        tokio::time::sleep(delay).await;
    }
    Json(json!({ "refs": [{ "ref": MASTER_REF, "isMasterRef": true }] }))
}

async fn search(
    State(server): State<Server>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let reference = params.get("ref").cloned().unwrap_or_default();
    let query = params.get("q").cloned().unwrap_or_default();
    let id = query
        .strip_prefix("[[at(document.id,\"")
        .and_then(|rest| rest.strip_suffix("\")]]"))
        .unwrap_or_default()
        .to_string();
    server
        .searches
        .lock()
        .unwrap()
        .push((id.clone(), reference.clone(), cookie));

    let uid = match id.as_str() {
        "X1" => "hello",
        "X2" => "world",
        _ => return Json(json!({ "results": [] })),
    };
    let title = if reference == MASTER_REF { "Published" } else { "Draft" };
    Json(json!({
        "results": [{
            "id": id,
            "uid": uid,
            "type": "blog_post",
            "lang": "en-us",
            "tags": [],
            "data": {
                "title": [{ "type": "heading1", "text": title, "spans": [] }]
            }
        }]
    }))
}

async fn schema(
    State(server): State<Server>,
    Path(file): Path<String>,
) -> Result<String, StatusCode> {
    server.schemas.get(&file).cloned().ok_or(StatusCode::NOT_FOUND)
}

/// Bind to port 0 and return the base address.
async fn start_server(server: Server) -> String {
    let app = Router::new()
        .route("/api/v2", get(api_root))
        .route("/api/v2/documents/search", get(search))
        .route("/schemas/:file", get(schema))
        .with_state(server);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn type_paths() -> TypePaths {
    TypePaths::default().with(["blog_post", "data", "title"], STRUCTURED_TEXT_TYPE)
}

/// Publish the schema artifact the way a build would and serve its body.
fn published() -> (InMemoryRegistry, Server) {
    let artifact = SchemaArtifact::new(&type_paths(), PluginOptions::new("repo")).unwrap();
    let registry = InMemoryRegistry::new();
    artifact.publish(&registry).unwrap();

    let mut schemas = HashMap::new();
    schemas.insert(artifact.filename().to_string(), artifact.body().to_string());
    let server = Server {
        schemas: Arc::new(schemas),
        ..Server::default()
    };
    (registry, server)
}

fn deps(base: &str) -> PreviewDeps {
    let mut deps = PreviewDeps::http(&format!("{base}/schemas")).unwrap();
    deps.connector = Arc::new(
        prismic_preview::fetch::HttpConnector::new().with_endpoint(format!("{base}/api/v2")),
    );
    deps
}

#[tokio::test]
async fn loads_a_draft_end_to_end() {
    let (registry, server) = published();
    let base = start_server(server).await;

    let session = PreviewSession::new(
        PreviewOptions::new("repo")
            .path_resolver(resolver::from_fn(|link| {
                link.uid.as_ref().map(|uid| format!("/blog/{}", uid))
            })),
        &registry,
        deps(&base),
    )
    .unwrap();

    let state = session
        .run(&PreviewFingerprint::new(TOKEN, "X1"))
        .await
        .unwrap();

    assert_eq!(state.phase(), SessionPhase::Loaded);
    assert_eq!(state.path(), Some("/blog/hello"));

    let root = state.preview_data().unwrap().get("prismicBlogPost").unwrap();
    assert_eq!(root.node_type(), "PrismicBlogPost");
    let data = root.get("data").unwrap();
    assert_eq!(data["title"]["text"], json!("Draft"));
    assert_eq!(data["title"]["html"], json!("<h1>Draft</h1>"));
}

#[tokio::test]
async fn search_uses_the_preview_ref_and_cookie() {
    let (registry, server) = published();
    let searches = server.searches.clone();
    let base = start_server(server).await;

    let session =
        PreviewSession::new(PreviewOptions::new("repo"), &registry, deps(&base)).unwrap();
    session
        .run(&PreviewFingerprint::new(TOKEN, "X1"))
        .await
        .unwrap();

    let searches = searches.lock().unwrap().clone();
    assert_eq!(searches.len(), 1);
    let (id, reference, cookie) = &searches[0];
    assert_eq!(id, "X1");
    assert_eq!(reference, TOKEN);
    assert_eq!(
        cookie.as_deref(),
        Some("io.prismic.preview=https%3A%2F%2Frepo.prismic.io%2Fpreviews%2Fabc")
    );
}

#[tokio::test]
async fn missing_schema_degrades_to_not_preview() {
    let (_, server) = published();
    let base = start_server(server).await;

    // The registry points at a digest the schema endpoint never served.
    let registry = InMemoryRegistry::new();
    registry
        .publish(prismic_preview::RegistryEntry::new(
            PluginOptions::new("repo"),
            "stale",
        ))
        .unwrap();

    let session =
        PreviewSession::new(PreviewOptions::new("repo"), &registry, deps(&base)).unwrap();
    let state = session
        .run(&PreviewFingerprint::new(TOKEN, "X1"))
        .await
        .unwrap();

    assert_eq!(state.is_preview(), Some(false));
    assert!(state.preview_data().is_none());
}

#[tokio::test]
async fn unknown_document_degrades_to_not_preview() {
    let (registry, server) = published();
    let base = start_server(server).await;

    let session =
        PreviewSession::new(PreviewOptions::new("repo"), &registry, deps(&base)).unwrap();
    let state = session
        .run(&PreviewFingerprint::new(TOKEN, "nope"))
        .await
        .unwrap();

    assert_eq!(state.phase(), SessionPhase::NotPreview);
}

#[tokio::test]
async fn concurrent_sessions_keep_their_own_preview_ref() {
    let (registry, mut server) = published();
    server.first_metadata_delay = Some(Duration::from_millis(300));
    let searches = server.searches.clone();
    let base = start_server(server).await;

    // Both sessions share one connector, as clones of the same deps do.
    let shared = deps(&base);
    let first =
        PreviewSession::new(PreviewOptions::new("repo"), &registry, shared.clone()).unwrap();
    let second = PreviewSession::new(PreviewOptions::new("repo"), &registry, shared).unwrap();

    let first_fingerprint = PreviewFingerprint::new("token-A", "X1");
    let second_fingerprint = PreviewFingerprint::new("token-B", "X2");
    let (first_state, second_state) = tokio::join!(
        first.run(&first_fingerprint),
        second.run(&second_fingerprint),
    );

    for (state, id) in [(first_state.unwrap(), "X1"), (second_state.unwrap(), "X2")] {
        assert_eq!(state.phase(), SessionPhase::Loaded);
        let root = state.preview_data().unwrap().get("prismicBlogPost").unwrap();
        assert_eq!(root.get("prismicId"), Some(&json!(id)));
        assert_eq!(root.get("data").unwrap()["title"]["text"], json!("Draft"));
    }

    let mut searches = searches.lock().unwrap().clone();
    searches.sort();
    assert_eq!(
        searches,
        vec![
            (
                "X1".to_string(),
                "token-A".to_string(),
                Some("io.prismic.preview=token-A".to_string())
            ),
            (
                "X2".to_string(),
                "token-B".to_string(),
                Some("io.prismic.preview=token-B".to_string())
            ),
        ]
    );
}
