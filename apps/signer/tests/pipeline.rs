//! End-to-end behavior of the signing pipeline: request in, token published
//! into the later stages, errors rendered as Problem Details.

#[macro_use]
mod support;

use std::sync::Arc;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use jwt_signer::config::SiteConfig;
use serde_json::{json, Value};
use signer_test_support::problem_details::assert_problem_details_from_service_response;
use signer_test_support::token;
use support::site;

const BEARER_SITE: &str = r#"
jwt_signer 15m s3cret {
    sub   {http.request.header.X-User}
    name  {http.request.uri.query.name}
    profile {
        team {http.request.header.X-Team}
        lang {http.request.header.Accept-Language}
    }
}
header Authorization "Bearer {http.jwt_signer.digest_str}"
respond "issued"
"#;

fn bearer(resp_headers: &header::HeaderMap) -> String {
    let value = resp_headers
        .get(header::AUTHORIZATION)
        .expect("Authorization header set")
        .to_str()
        .unwrap();
    value.strip_prefix("Bearer ").expect("bearer scheme").to_string()
}

#[actix_web::test]
async fn test_token_is_published_into_header_with_pruned_claims() {
    let site = site(BEARER_SITE);
    let app = init_signer_app!(site);

    let req = test::TestRequest::get()
        .uri("/login")
        .insert_header(("X-User", "alice"))
        .insert_header(("X-Team", "blue"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let jwt = bearer(resp.headers());
    assert_eq!(test::read_body(resp).await, "issued");

    assert_eq!(token::header(&jwt)["alg"], "HS256");
    let claims = token::payload(&jwt);
    assert_eq!(claims["sub"], "alice");
    assert_eq!(claims["profile"], json!({"team": "blue"}));
    assert!(claims.get("name").is_none());

    let iat = claims["iat"].as_i64().unwrap();
    let exp = claims["exp"].as_i64().unwrap();
    assert_eq!(exp - iat, 900);
}

#[actix_web::test]
async fn test_token_verifies_with_configured_secret() {
    let site = site(BEARER_SITE);
    let app = init_signer_app!(site);

    let req = test::TestRequest::get()
        .uri("/?name=Alice%20Liddell")
        .insert_header(("X-User", "alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let jwt = bearer(resp.headers());

    let data = decode::<Value>(
        &jwt,
        &DecodingKey::from_secret(b"s3cret"),
        &Validation::new(Algorithm::HS256),
    )
    .expect("token verifies");
    assert_eq!(data.claims["name"], "Alice Liddell");
    // Every nested leaf expanded to nothing, so the whole object is gone.
    assert!(data.claims.get("profile").is_none());

    let wrong = decode::<Value>(
        &jwt,
        &DecodingKey::from_secret(b"other"),
        &Validation::new(Algorithm::HS256),
    );
    assert!(wrong.is_err());
}

#[actix_web::test]
async fn test_each_request_gets_its_own_token() {
    let site = site(BEARER_SITE);
    let app = init_signer_app!(site);

    let mut subjects = Vec::new();
    for user in ["alice", "bob"] {
        let req = test::TestRequest::get()
            .uri("/")
            .insert_header(("X-User", user))
            .to_request();
        let resp = test::call_service(&app, req).await;
        subjects.push(token::payload(&bearer(resp.headers()))["sub"].clone());
    }

    assert_eq!(subjects, vec![json!("alice"), json!("bob")]);
}

#[actix_web::test]
async fn test_redirect_carries_token() {
    let site = site(
        r#"
        jwt_signer 1h s3cret {
            sub {http.request.uri.query.user}
            rid {http.request.uuid}
        }
        redir "https://app.example.com/cb?token={http.jwt_signer.digest_str}"
        "#,
    );
    let app = init_signer_app!(site);

    let req = test::TestRequest::get().uri("/start?user=carol").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    let request_id = resp.headers().get("x-request-id").unwrap().to_str().unwrap().to_string();
    let location = resp.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    let jwt = location
        .strip_prefix("https://app.example.com/cb?token=")
        .expect("token appended to target");

    let claims = token::payload(jwt);
    assert_eq!(claims["sub"], "carol");
    assert_eq!(claims["rid"], request_id);
}

#[actix_web::test]
async fn test_json_site_keeps_scalar_claims() {
    let site = Arc::new(
        SiteConfig::from_json_str(
            r#"{
                "jwt_signer": {
                    "duration": "90s",
                    "secret": "s3cret",
                    "claims": {
                        "sub": "{http.request.header.X-User}",
                        "admin": false,
                        "level": 3,
                        "meta": {"via": "{http.request.method}"}
                    }
                },
                "respond": {"body": "{http.jwt_signer.digest_str}", "status": 201}
            }"#,
        )
        .unwrap(),
    );
    let app = init_signer_app!(site);

    let req = test::TestRequest::post().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = test::read_body(resp).await;
    let claims = token::payload(std::str::from_utf8(&body).unwrap());

    assert!(claims.get("sub").is_none());
    assert_eq!(claims["admin"], false);
    assert_eq!(claims["level"], 3);
    assert_eq!(claims["meta"], json!({"via": "POST"}));
    assert_eq!(
        claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
        90
    );
}

#[actix_web::test]
async fn test_empty_secret_stops_the_pipeline() {
    let site = site(
        r#"
        jwt_signer 1h {http.request.header.X-Secret}
        header Authorization "Bearer {http.jwt_signer.digest_str}"
        respond "should not be reached"
        "#,
    );
    let app = init_signer_app!(site);

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.headers().get(header::AUTHORIZATION).is_none());
    let request_id = resp.headers().get("x-request-id").unwrap().to_str().unwrap().to_string();

    let problem = assert_problem_details_from_service_response(
        resp.map_into_boxed_body(),
        "PRECONDITION_FAILED",
        StatusCode::INTERNAL_SERVER_ERROR,
        Some("required parameter empty after replacements: secret"),
    )
    .await;
    assert_eq!(problem.trace_id, request_id);
}

#[actix_web::test]
async fn test_unparseable_duration_is_reported() {
    let site = site("jwt_signer {http.request.uri.query.ttl} s3cret\nrespond ok\n");
    let app = init_signer_app!(site);

    let req = test::TestRequest::get().uri("/?ttl=3d").to_request();
    let resp = test::call_service(&app, req).await;

    assert_problem_details_from_service_response(
        resp.map_into_boxed_body(),
        "INVALID_DURATION",
        StatusCode::INTERNAL_SERVER_ERROR,
        Some("3d"),
    )
    .await;
}

#[actix_web::test]
async fn test_empty_header_value_is_not_set() {
    let site = site(
        r#"
        jwt_signer 1h s3cret
        header X-Tenant {http.request.header.X-Tenant-In}
        header X-Token {http.jwt_signer.digest_str}
        "#,
    );
    let app = init_signer_app!(site);

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(resp.headers().get("x-tenant").is_none());
    assert!(resp.headers().get("x-token").is_some());
}

#[actix_web::test]
async fn test_health_does_not_issue() {
    let site = site(BEARER_SITE);
    let app = init_signer_app!(site);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::AUTHORIZATION).is_none());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["claims"], 3);
    assert_eq!(body["headers"], 1);
}
