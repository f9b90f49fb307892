//! Shared fixtures: an in-process management API and a scripted terraform
//! that behaves like the RHCS provider for the manifests under test.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rhcs_e2e::E2eContext;
use serde_json::{json, Value};
use tf_harness::fakes::ScriptedExecutor;
use tf_harness::{HarnessConfig, Invocation, ProcessOutput, Subcommand, Terraform};

pub const MANIFESTS: &str = "/manifests";
pub const CLUSTER_ID: &str = "2a8b4c1d";
pub const TOKEN: &str = "offline-token";

/// One request seen by the fake API.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
}

/// Management API data, shared between the HTTP server and the fake provider.
#[derive(Debug, Default)]
pub struct ApiState {
    pub clusters: Mutex<HashMap<String, Value>>,
    pub idps: Mutex<HashMap<(String, String), Value>>,
    pub htpasswd_users: Mutex<HashMap<(String, String), Vec<Value>>>,
    pub cloud_providers: Mutex<Vec<Value>>,
    pub requests: Mutex<Vec<RecordedRequest>>,
}

impl ApiState {
    fn record(&self, path: String, query: HashMap<String, String>, headers: &HeaderMap) {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push(RecordedRequest {
            path,
            query,
            authorization,
        });
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request recorded")
    }

    pub fn set_cloud_providers(&self, items: Value) {
        *self.cloud_providers.lock().unwrap() = items.as_array().cloned().unwrap_or_default();
    }
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"kind": "Error", "reason": format!("{} not found", what)})),
    )
        .into_response()
}

async fn get_cluster(
    State(state): State<Arc<ApiState>>,
    UrlPath(id): UrlPath<String>,
    headers: HeaderMap,
) -> Response {
    state.record(format!("clusters/{}", id), HashMap::new(), &headers);
    match state.clusters.lock().unwrap().get(&id) {
        Some(cluster) => Json(cluster.clone()).into_response(),
        None => not_found("cluster"),
    }
}

async fn get_idp(
    State(state): State<Arc<ApiState>>,
    UrlPath((cluster, idp)): UrlPath<(String, String)>,
    headers: HeaderMap,
) -> Response {
    state.record(
        format!("clusters/{}/identity_providers/{}", cluster, idp),
        HashMap::new(),
        &headers,
    );
    match state.idps.lock().unwrap().get(&(cluster, idp)) {
        Some(found) => Json(found.clone()).into_response(),
        None => not_found("identity provider"),
    }
}

async fn list_htpasswd_users(
    State(state): State<Arc<ApiState>>,
    UrlPath((cluster, idp)): UrlPath<(String, String)>,
    headers: HeaderMap,
) -> Response {
    state.record(
        format!("clusters/{}/identity_providers/{}/htpasswd_users", cluster, idp),
        HashMap::new(),
        &headers,
    );
    match state.htpasswd_users.lock().unwrap().get(&(cluster, idp)) {
        Some(users) => Json(page(users.clone())).into_response(),
        None => not_found("identity provider"),
    }
}

async fn list_cloud_providers(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.record("cloud_providers".to_string(), query, &headers);
    let items = state.cloud_providers.lock().unwrap().clone();
    Json(page(items)).into_response()
}

fn page(items: Vec<Value>) -> Value {
    json!({"page": 1, "size": items.len(), "total": items.len(), "items": items})
}

/// Clusters management API served on an ephemeral local port.
pub struct FakeApi {
    pub base_url: String,
    pub state: Arc<ApiState>,
}

impl FakeApi {
    pub async fn start() -> Self {
        let state = Arc::new(ApiState::default());
        let app = Router::new()
            .route("/api/clusters_mgmt/v1/clusters/{id}", get(get_cluster))
            .route(
                "/api/clusters_mgmt/v1/clusters/{id}/identity_providers/{idp}",
                get(get_idp),
            )
            .route(
                "/api/clusters_mgmt/v1/clusters/{id}/identity_providers/{idp}/htpasswd_users",
                get(list_htpasswd_users),
            )
            .route("/api/clusters_mgmt/v1/cloud_providers", get(list_cloud_providers))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake API");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake API server");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }
}

/// `-var name=value` pairs of an invocation.
pub fn vars_of(invocation: &Invocation) -> BTreeMap<String, String> {
    invocation
        .args
        .windows(2)
        .filter(|w| w[0] == "-var")
        .filter_map(|w| w[1].split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn missing_variable(name: &str) -> ProcessOutput {
    ProcessOutput::failed(
        Subcommand::Apply,
        1,
        format!(
            "Error: No value for required variable\n\n  on variables.tf line 1:\n   1: variable \"{name}\" {{\n\nThe root module input variable \"{name}\" is not set, and has no default value.\nUse a -var or -var-file command line argument to provide a value for this variable."
        ),
    )
}

fn provider_required(block: &str, attr: &str) -> ProcessOutput {
    ProcessOutput::failed(
        Subcommand::Apply,
        1,
        format!(
            "Error: Missing Configuration for Required Attribute\n\nMust set a configuration value for the {block}.{attr} attribute as the provider has marked it as required."
        ),
    )
}

fn invalid_htpasswd_users() -> ProcessOutput {
    ProcessOutput::failed(
        Subcommand::Apply,
        1,
        "Error: Invalid Attribute Value\n\nattributes \"password\" and \"username\" are required",
    )
}

/// Identity provider type served by a manifest directory.
fn idp_type_of(workspace: &Path) -> Option<String> {
    let parent = workspace.parent()?;
    if parent.file_name()? != "idps" {
        return None;
    }
    Some(workspace.file_name()?.to_string_lossy().into_owned())
}

/// Validate an IDP apply the way the manifests and the provider would.
fn validate_idp(idp_type: &str, vars: &BTreeMap<String, String>) -> Option<ProcessOutput> {
    let has = |k: &str| vars.contains_key(k);

    for required in ["token", "cluster_id", "name"] {
        if !has(required) {
            return Some(missing_variable(required));
        }
    }

    match idp_type {
        "htpasswd" => {
            let users: Vec<BTreeMap<String, String>> = vars
                .get("htpasswd_users")
                .and_then(|raw| serde_json::from_str(raw).ok())
                .unwrap_or_default();
            let complete = |u: &BTreeMap<String, String>| {
                ["username", "password"]
                    .iter()
                    .all(|k| u.get(*k).map(|v| !v.is_empty()).unwrap_or(false))
            };
            if users.is_empty() || !users.iter().all(complete) {
                return Some(invalid_htpasswd_users());
            }
        }
        "github" => {
            for required in ["client_id", "client_secret"] {
                if !has(required) {
                    return Some(missing_variable(required));
                }
            }
        }
        "gitlab" => {
            for required in ["client_id", "client_secret", "url"] {
                if !has(required) {
                    return Some(provider_required("gitlab", required));
                }
            }
        }
        "ldap" => {
            for required in ["url", "attributes"] {
                if !has(required) {
                    return Some(provider_required("ldap", required));
                }
            }
        }
        "google" | "openid" => {
            for required in ["client_id", "client_secret"] {
                if !has(required) {
                    return Some(provider_required(idp_type, required));
                }
            }
        }
        _ => {}
    }
    None
}

/// Apply a cloud provider catalog query the way the data source does.
fn query_catalog(catalog: &[Value], vars: &BTreeMap<String, String>) -> Value {
    let mut items: Vec<Value> = catalog.to_vec();

    if let Some(search) = vars.get("search") {
        // `<field> like '<prefix>%'`
        if let Some((field, pattern)) = search.split_once(" like ") {
            let prefix = pattern.trim_matches('\'').trim_end_matches('%').to_string();
            items.retain(|item| {
                item.get(field.trim())
                    .and_then(Value::as_str)
                    .map(|v| v.starts_with(&prefix))
                    .unwrap_or(false)
            });
        }
    }
    if let Some(order) = vars.get("order") {
        let field = order.split_whitespace().next().unwrap_or("id").to_string();
        items.sort_by(|a, b| {
            let key = |v: &Value| v.get(&field).and_then(Value::as_str).unwrap_or("").to_string();
            key(a).cmp(&key(b))
        });
        if order.ends_with(" desc") {
            items.reverse();
        }
    }

    let item = if items.len() == 1 {
        items[0].clone()
    } else {
        Value::Null
    };
    json!({
        "search": {"value": vars.get("search")},
        "order": {"value": vars.get("order")},
        "items": {"value": items},
        "item": {"value": item},
    })
}

/// A scripted terraform wired to a fake API: applies update the API state and
/// outputs reflect the last successful apply per workspace.
pub struct FakeRhcs {
    pub executor: Arc<ScriptedExecutor>,
    pub api: FakeApi,
    applied: Arc<Mutex<HashMap<PathBuf, Value>>>,
}

impl FakeRhcs {
    pub async fn start() -> Self {
        let api = FakeApi::start().await;
        let executor = Arc::new(ScriptedExecutor::new());
        let applied: Arc<Mutex<HashMap<PathBuf, Value>>> = Arc::default();

        {
            let state = api.state.clone();
            let applied = applied.clone();
            executor.respond_with(Subcommand::Apply, move |inv| {
                let vars = vars_of(inv);
                let outputs = if let Some(idp_type) = idp_type_of(&inv.workspace) {
                    if let Some(failure) = validate_idp(&idp_type, &vars) {
                        return failure;
                    }
                    let cluster = vars["cluster_id"].clone();
                    let id = format!("idp-{}", vars["name"]);
                    state.idps.lock().unwrap().insert(
                        (cluster.clone(), id.clone()),
                        json!({"id": id, "name": vars["name"], "type": idp_type}),
                    );
                    if let Some(raw) = vars.get("htpasswd_users") {
                        let users: Vec<Value> = serde_json::from_str::<Vec<Value>>(raw)
                            .unwrap_or_default()
                            .into_iter()
                            .enumerate()
                            .map(|(i, u)| json!({"id": i.to_string(), "username": u["username"]}))
                            .collect();
                        state
                            .htpasswd_users
                            .lock()
                            .unwrap()
                            .insert((cluster, id.clone()), users);
                    }
                    json!({"idp_id": {"value": id}})
                } else if inv.workspace.ends_with("cloud-providers") {
                    query_catalog(&state.cloud_providers.lock().unwrap(), &vars)
                } else {
                    let echoed: serde_json::Map<String, Value> = vars
                        .iter()
                        .map(|(k, v)| {
                            let value = serde_json::from_str(v).unwrap_or(json!(v));
                            (k.clone(), json!({"value": value}))
                        })
                        .collect();
                    Value::Object(echoed)
                };
                applied
                    .lock()
                    .unwrap()
                    .insert(inv.workspace.clone(), outputs);
                ProcessOutput::ok(Subcommand::Apply, "Apply complete!")
            });
        }

        {
            let applied = applied.clone();
            executor.respond_with(Subcommand::Output, move |inv| {
                let doc = applied
                    .lock()
                    .unwrap()
                    .get(&inv.workspace)
                    .cloned()
                    .unwrap_or_else(|| json!({}));
                ProcessOutput::ok(Subcommand::Output, doc.to_string())
            });
        }

        {
            let state = api.state.clone();
            let applied = applied.clone();
            executor.respond_with(Subcommand::Destroy, move |inv| {
                let vars = vars_of(inv);
                if idp_type_of(&inv.workspace).is_some() {
                    let cluster = vars.get("cluster_id");
                    if let (Some(cluster), Some(name)) = (cluster, vars.get("name")) {
                        let key = (cluster.clone(), format!("idp-{}", name));
                        state.idps.lock().unwrap().remove(&key);
                        state.htpasswd_users.lock().unwrap().remove(&key);
                    }
                }
                applied.lock().unwrap().remove(&inv.workspace);
                ProcessOutput::ok(Subcommand::Destroy, "Destroy complete!")
            });
        }

        Self {
            executor,
            api,
            applied,
        }
    }

    pub fn config(&self) -> HarnessConfig {
        HarnessConfig::default()
            .with_gateway_url(&self.api.base_url)
            .with_token(TOKEN)
            .with_manifests_dir(MANIFESTS)
            .with_cluster_id(CLUSTER_ID)
    }

    pub fn context(&self) -> E2eContext {
        E2eContext::new(self.config(), Terraform::new(self.executor.clone()))
    }
}
