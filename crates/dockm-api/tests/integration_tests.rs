//! # Integration Tests for dockm-api
//!
//! Drives the assembled router against wiremock engines: bouncer levels,
//! endpoint authorization, the four proxy disciplines, response rewriting,
//! proxy re-registration and the management routes.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dockm_api::auth::JwtService;
use dockm_api::state::{AppConfig, AppState, Services};
use dockm_core::{
    EndpointId, LabelPair, ManagedEndpoint, MembershipRole, MemoryStore, Principal,
    ResourceControl, ResourceControlId, ResourceType, Role, Seed, Settings, TeamId,
    TeamMembership, UserId,
};

const SECRET: &[u8] = b"integration-secret";

// -- Harness ------------------------------------------------------------------

struct Harness {
    app: axum::Router,
    jwt: JwtService,
    store: MemoryStore,
}

impl Harness {
    fn new(seed: Seed) -> Self {
        let store = MemoryStore::from_seed(seed).unwrap();
        let jwt = JwtService::new(SECRET);
        let services = Services::in_memory(&store, Some(Arc::new(JwtService::new(SECRET))));
        let config = AppConfig {
            authentication_enabled: true,
            ..AppConfig::default()
        };
        let app = dockm_api::app(AppState::new(config, services));
        Self { app, jwt, store }
    }

    fn token(&self, user: u32, role: Role) -> String {
        self.jwt
            .issue(&Principal {
                user_id: UserId(user),
                username: format!("user{user}"),
                role,
            })
            .unwrap()
    }

    fn admin(&self) -> String {
        self.token(1, Role::Administrator)
    }

    fn user(&self, id: u32) -> String {
        self.token(id, Role::Standard)
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> axum::http::Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn endpoint(id: u32, server: &MockServer, users: &[u32], teams: &[u32]) -> ManagedEndpoint {
    ManagedEndpoint {
        id: EndpointId(id),
        name: format!("engine-{id}"),
        url: format!("tcp://{}", server.address()),
        tls: None,
        authorized_users: users.iter().copied().map(UserId).collect(),
        authorized_teams: teams.iter().copied().map(TeamId).collect(),
    }
}

fn control(id: u32, resource: &str, kind: ResourceType, users: &[u32], teams: &[u32]) -> ResourceControl {
    ResourceControl {
        id: ResourceControlId(id),
        resource_id: resource.to_string(),
        resource_type: kind,
        administrators_only: false,
        user_accesses: users.iter().copied().map(UserId).collect(),
        team_accesses: teams.iter().copied().map(TeamId).collect(),
    }
}

fn membership(id: u32, user: u32, team: u32, role: MembershipRole) -> TeamMembership {
    TeamMembership {
        id,
        user_id: UserId(user),
        team_id: TeamId(team),
        role,
    }
}

fn ids(list: &Value) -> Vec<&str> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|c| c["Id"].as_str().unwrap())
        .collect()
}

// -- Health & Status ----------------------------------------------------------

#[tokio::test]
async fn test_health_probes() {
    let h = Harness::new(Seed::default());
    let live = h.call(Method::GET, "/health/liveness", None, None).await;
    assert_eq!(live.status(), StatusCode::OK);
    assert_eq!(body_string(live).await, "ok");

    let ready = h.call(Method::GET, "/health/readiness", None, None).await;
    assert_eq!(ready.status(), StatusCode::OK);
    assert_eq!(body_string(ready).await, "ready");
}

#[tokio::test]
async fn test_status_is_public_with_security_headers() {
    let h = Harness::new(Seed::default());
    let response = h.call(Method::GET, "/api/status", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    let body = body_json(response).await;
    assert_eq!(body["Authentication"], true);
}

#[tokio::test]
async fn test_settings_are_public() {
    let h = Harness::new(Seed {
        settings: Settings {
            templates_url: "https://templates.example/list.json".into(),
            black_listed_labels: vec![],
        },
        ..Seed::default()
    });
    let response = h.call(Method::GET, "/api/settings", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["TemplatesURL"], "https://templates.example/list.json");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let h = Harness::new(Seed::default());
    let response = h.call(Method::GET, "/api/nothing", Some(&h.admin()), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Authentication -----------------------------------------------------------

#[tokio::test]
async fn test_missing_token_never_reaches_engine() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let h = Harness::new(Seed {
        endpoints: vec![endpoint(1, &server, &[2], &[])],
        ..Seed::default()
    });

    let response = h
        .call(Method::GET, "/api/endpoints/1/docker/containers/json", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_invalid_and_expired_tokens_rejected() {
    let h = Harness::new(Seed::default());
    let forged = JwtService::new(b"other-secret")
        .issue(&Principal {
            user_id: UserId(1),
            username: "admin".into(),
            role: Role::Administrator,
        })
        .unwrap();
    let response = h.call(Method::GET, "/api/endpoints", Some(&forged), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let expired = h
        .jwt
        .issue_with_ttl(
            &Principal {
                user_id: UserId(1),
                username: "admin".into(),
                role: Role::Administrator,
            },
            chrono::Duration::seconds(-300),
        )
        .unwrap();
    let response = h.call(Method::GET, "/api/endpoints", Some(&expired), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_bearer_scheme_rejected() {
    let h = Harness::new(Seed::default());
    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/endpoints")
                .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_disabled_authentication_runs_as_administrator() {
    let store = MemoryStore::new();
    let app = dockm_api::app(AppState::new(
        AppConfig::default(),
        Services::in_memory(&store, None),
    ));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/teams/4/memberships")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Endpoint Authorization ---------------------------------------------------

#[tokio::test]
async fn test_unauthorized_endpoint_is_forbidden() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let h = Harness::new(Seed {
        endpoints: vec![endpoint(1, &server, &[2], &[])],
        ..Seed::default()
    });

    let response = h
        .call(Method::GET, "/api/endpoints/1/docker/info", Some(&h.user(5)), None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "Access denied to endpoint");
}

#[tokio::test]
async fn test_team_authorized_endpoint_passes_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Containers": 3})))
        .expect(1)
        .mount(&server)
        .await;
    let h = Harness::new(Seed {
        endpoints: vec![endpoint(1, &server, &[], &[7])],
        team_memberships: vec![membership(1, 3, 7, MembershipRole::Member)],
        ..Seed::default()
    });

    let response = h
        .call(Method::GET, "/api/endpoints/1/docker/info", Some(&h.user(3)), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["Containers"], 3);
}

#[tokio::test]
async fn test_unknown_endpoint_is_404() {
    let h = Harness::new(Seed::default());
    let response = h
        .call(Method::GET, "/api/endpoints/9/docker/info", Some(&h.admin()), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_numeric_endpoint_id_is_400() {
    let h = Harness::new(Seed::default());
    let response = h
        .call(Method::GET, "/api/endpoints/abc/docker/info", Some(&h.admin()), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// -- Proxy Disciplines --------------------------------------------------------

#[tokio::test]
async fn test_container_list_filtered_for_user_and_decorated_for_admin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/containers/json"))
        .and(query_param("all", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"Id": "a", "Labels": {}},
            {"Id": "b", "Labels": {}},
            {"Id": "c", "Labels": {"internal": "true"}},
            {"Id": "d", "Labels": {}},
        ])))
        .mount(&server)
        .await;
    let h = Harness::new(Seed {
        endpoints: vec![endpoint(1, &server, &[2], &[])],
        resource_controls: vec![
            control(1, "b", ResourceType::Container, &[9], &[]),
            control(2, "d", ResourceType::Container, &[2], &[]),
        ],
        settings: Settings {
            templates_url: String::new(),
            black_listed_labels: vec![LabelPair {
                name: "internal".into(),
                value: "true".into(),
            }],
        },
        ..Seed::default()
    });

    let response = h
        .call(
            Method::GET,
            "/api/endpoints/1/docker/containers/json?all=1",
            Some(&h.user(2)),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let list = body_json(response).await;
    assert_eq!(ids(&list), vec!["a", "d"]);
    assert_eq!(list[1]["DockM"]["ResourceControl"]["ResourceId"], "d");

    let response = h
        .call(
            Method::GET,
            "/api/endpoints/1/docker/containers/json?all=1",
            Some(&h.admin()),
            None,
        )
        .await;
    let list = body_json(response).await;
    assert_eq!(ids(&list), vec!["a", "b", "d"]);
    assert_eq!(list[1]["DockM"]["ResourceControl"]["ResourceId"], "b");
}

#[tokio::test]
async fn test_inspect_denied_after_forwarding() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/containers/abc/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Id": "abc",
            "Config": {"Labels": {}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    let h = Harness::new(Seed {
        endpoints: vec![endpoint(1, &server, &[2], &[])],
        resource_controls: vec![control(1, "abc", ResourceType::Container, &[3], &[])],
        ..Seed::default()
    });

    let response = h
        .call(
            Method::GET,
            "/api/endpoints/1/docker/containers/abc/json",
            Some(&h.user(2)),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "ACCESS_DENIED");
    assert_eq!(body["error"]["message"], "Access denied to resource");
}

#[tokio::test]
async fn test_inspect_follows_owning_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/containers/task1/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Id": "task1",
            "Config": {"Labels": {"com.docker.swarm.service.id": "svc"}}
        })))
        .mount(&server)
        .await;
    let h = Harness::new(Seed {
        endpoints: vec![endpoint(1, &server, &[2, 3], &[])],
        resource_controls: vec![control(1, "svc", ResourceType::Service, &[2], &[])],
        ..Seed::default()
    });

    let owner = h
        .call(
            Method::GET,
            "/api/endpoints/1/docker/containers/task1/json",
            Some(&h.user(2)),
            None,
        )
        .await;
    assert_eq!(owner.status(), StatusCode::OK);
    let body = body_json(owner).await;
    assert_eq!(body["DockM"]["ResourceControl"]["ResourceId"], "svc");

    let stranger = h
        .call(
            Method::GET,
            "/api/endpoints/1/docker/containers/task1/json",
            Some(&h.user(3)),
            None,
        )
        .await;
    assert_eq!(stranger.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_prune_denied_before_forwarding() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let h = Harness::new(Seed {
        endpoints: vec![endpoint(1, &server, &[2], &[])],
        ..Seed::default()
    });

    for uri in [
        "/api/endpoints/1/docker/containers/prune",
        "/api/endpoints/1/docker/containers/pr%75ne",
        "/api/endpoints/1/docker/v1.41/%73warm/init",
    ] {
        let response = h.call(Method::POST, uri, Some(&h.user(2)), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body_json(response).await["error"]["code"], "ACCESS_DENIED");
    }

    for uri in [
        "/api/endpoints/1/docker/containers/x/../prune",
        "/api/endpoints/1/docker/containers/x%2F..%2Fprune",
    ] {
        let response = h.call(Method::POST, uri, Some(&h.user(2)), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
    }
}

#[tokio::test]
async fn test_restricted_action_checked_before_forwarding() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/containers/mine/start"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/containers/theirs/start"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    let h = Harness::new(Seed {
        endpoints: vec![endpoint(1, &server, &[2], &[])],
        resource_controls: vec![
            control(1, "mine", ResourceType::Container, &[2], &[]),
            control(2, "theirs", ResourceType::Container, &[8], &[]),
        ],
        ..Seed::default()
    });

    let allowed = h
        .call(
            Method::POST,
            "/api/endpoints/1/docker/containers/mine/start",
            Some(&h.user(2)),
            None,
        )
        .await;
    assert_eq!(allowed.status(), StatusCode::NO_CONTENT);

    let denied = h
        .call(
            Method::POST,
            "/api/endpoints/1/docker/containers/theirs/start",
            Some(&h.user(2)),
            None,
        )
        .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_passthrough_preserves_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/containers/create"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"Id": "new"})))
        .expect(1)
        .mount(&server)
        .await;
    let h = Harness::new(Seed {
        endpoints: vec![endpoint(1, &server, &[2], &[])],
        ..Seed::default()
    });

    let response = h
        .call(
            Method::POST,
            "/api/endpoints/1/docker/containers/create",
            Some(&h.user(2)),
            Some(json!({"Image": "alpine"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["Id"], "new");

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("authorization").is_none());
    let sent: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(sent["Image"], "alpine");
}

#[tokio::test]
async fn test_engine_error_is_not_rewritten() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/containers/gone/json"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "No such container: gone"})),
        )
        .mount(&server)
        .await;
    let h = Harness::new(Seed {
        endpoints: vec![endpoint(1, &server, &[2], &[])],
        ..Seed::default()
    });

    let response = h
        .call(
            Method::GET,
            "/api/endpoints/1/docker/containers/gone/json",
            Some(&h.user(2)),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "No such container: gone");
}

#[tokio::test]
async fn test_unreachable_engine_is_bad_gateway() {
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = closed.local_addr().unwrap();
    drop(closed);
    let h = Harness::new(Seed {
        endpoints: vec![ManagedEndpoint {
            id: EndpointId(1),
            name: "gone".into(),
            url: format!("tcp://{address}"),
            tls: None,
            authorized_users: vec![],
            authorized_teams: vec![],
        }],
        ..Seed::default()
    });

    let response = h
        .call(Method::GET, "/api/endpoints/1/docker/info", Some(&h.admin()), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

// -- Endpoint Management ------------------------------------------------------

#[tokio::test]
async fn test_endpoint_list_filtered_by_authorization() {
    let server = MockServer::start().await;
    let h = Harness::new(Seed {
        endpoints: vec![
            endpoint(1, &server, &[2], &[]),
            endpoint(2, &server, &[], &[5]),
            endpoint(3, &server, &[], &[]),
        ],
        team_memberships: vec![membership(1, 2, 5, MembershipRole::Member)],
        ..Seed::default()
    });

    let user = body_json(h.call(Method::GET, "/api/endpoints", Some(&h.user(2)), None).await).await;
    let user_ids: Vec<u64> = user
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["Id"].as_u64().unwrap())
        .collect();
    assert_eq!(user_ids, vec![1, 2]);

    let admin = body_json(h.call(Method::GET, "/api/endpoints", Some(&h.admin()), None).await).await;
    assert_eq!(admin.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_endpoint_management_requires_administrator() {
    let server = MockServer::start().await;
    let h = Harness::new(Seed {
        endpoints: vec![endpoint(1, &server, &[2], &[])],
        ..Seed::default()
    });

    let response = h
        .call(Method::DELETE, "/api/endpoints/1", Some(&h.user(2)), None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = h
        .call(Method::DELETE, "/api/endpoints/1", Some(&h.admin()), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = h
        .call(Method::GET, "/api/endpoints/1/docker/info", Some(&h.admin()), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_endpoint_update_reregisters_proxy() {
    let old_engine = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Name": "old"})))
        .mount(&old_engine)
        .await;
    let new_engine = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Name": "new"})))
        .mount(&new_engine)
        .await;
    let h = Harness::new(Seed {
        endpoints: vec![endpoint(1, &old_engine, &[], &[])],
        ..Seed::default()
    });

    let before = h
        .call(Method::GET, "/api/endpoints/1/docker/info", Some(&h.admin()), None)
        .await;
    assert_eq!(body_json(before).await["Name"], "old");

    let response = h
        .call(
            Method::PUT,
            "/api/endpoints/1",
            Some(&h.admin()),
            Some(json!({
                "Name": "moved",
                "URL": format!("tcp://{}", new_engine.address()),
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["Name"], "moved");

    let after = h
        .call(Method::GET, "/api/endpoints/1/docker/info", Some(&h.admin()), None)
        .await;
    assert_eq!(body_json(after).await["Name"], "new");
}

#[tokio::test]
async fn test_endpoint_update_rejects_bad_url() {
    let server = MockServer::start().await;
    let h = Harness::new(Seed {
        endpoints: vec![endpoint(1, &server, &[], &[])],
        ..Seed::default()
    });

    let response = h
        .call(
            Method::PUT,
            "/api/endpoints/1",
            Some(&h.admin()),
            Some(json!({"URL": "ftp://engine"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Resource Controls --------------------------------------------------------

#[tokio::test]
async fn test_resource_control_lifecycle() {
    let h = Harness::new(Seed {
        team_memberships: vec![membership(1, 2, 4, MembershipRole::Member)],
        ..Seed::default()
    });

    let created = h
        .call(
            Method::POST,
            "/api/resource_controls",
            Some(&h.user(2)),
            Some(json!({"ResourceID": "vol1", "Type": "volume", "Users": [2]})),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = body_json(created).await;
    let id = created["Id"].as_u64().unwrap();

    let duplicate = h
        .call(
            Method::POST,
            "/api/resource_controls",
            Some(&h.admin()),
            Some(json!({"ResourceID": "vol1", "Type": "volume"})),
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let updated = h
        .call(
            Method::PUT,
            &format!("/api/resource_controls/{id}"),
            Some(&h.user(2)),
            Some(json!({"Teams": [4]})),
        )
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    assert_eq!(body_json(updated).await["TeamAccesses"], json!([4]));

    let deleted = h
        .call(
            Method::DELETE,
            &format!("/api/resource_controls/{id}"),
            Some(&h.user(2)),
            None,
        )
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_resource_control_creation_for_another_user_forbidden() {
    let h = Harness::new(Seed::default());
    let response = h
        .call(
            Method::POST,
            "/api/resource_controls",
            Some(&h.user(2)),
            Some(json!({"ResourceID": "c1", "Type": "container", "Users": [3]})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_resource_control_validation() {
    let h = Harness::new(Seed::default());
    let response = h
        .call(
            Method::POST,
            "/api/resource_controls",
            Some(&h.admin()),
            Some(json!({
                "ResourceID": "c1",
                "Type": "container",
                "AdministratorsOnly": true,
                "Users": [3]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_foreign_resource_control_deletion_forbidden() {
    let h = Harness::new(Seed {
        resource_controls: vec![control(1, "svc", ResourceType::Service, &[8], &[])],
        ..Seed::default()
    });
    let response = h
        .call(Method::DELETE, "/api/resource_controls/1", Some(&h.user(2)), None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    h.store.put_resource_control(control(1, "svc", ResourceType::Service, &[2], &[]));

    let response = h
        .call(Method::DELETE, "/api/resource_controls/1", Some(&h.user(2)), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

// -- Memberships --------------------------------------------------------------

#[tokio::test]
async fn test_team_memberships_require_leadership() {
    let h = Harness::new(Seed {
        team_memberships: vec![
            membership(1, 2, 4, MembershipRole::Leader),
            membership(2, 3, 4, MembershipRole::Member),
        ],
        ..Seed::default()
    });

    let leader = h
        .call(Method::GET, "/api/teams/4/memberships", Some(&h.user(2)), None)
        .await;
    assert_eq!(leader.status(), StatusCode::OK);
    assert_eq!(body_json(leader).await.as_array().unwrap().len(), 2);

    let member = h
        .call(Method::GET, "/api/teams/4/memberships", Some(&h.user(3)), None)
        .await;
    assert_eq!(member.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_memberships_self_only() {
    let h = Harness::new(Seed {
        team_memberships: vec![membership(1, 3, 4, MembershipRole::Member)],
        ..Seed::default()
    });

    let own = h
        .call(Method::GET, "/api/users/3/memberships", Some(&h.user(3)), None)
        .await;
    assert_eq!(own.status(), StatusCode::OK);

    let other = h
        .call(Method::GET, "/api/users/3/memberships", Some(&h.user(2)), None)
        .await;
    assert_eq!(other.status(), StatusCode::FORBIDDEN);
}
