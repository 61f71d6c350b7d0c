use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::rewards::repository::RuleRepository;
use crate::rewards::router::{RewardQueryRequest, USER_ID_HEADER, USER_ROLE_HEADER};
use crate::rewards::RewardsService;

fn json_request(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
}

fn send(builder: axum::http::request::Builder, body: &Value) -> Request<Body> {
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn best_card_ranks_the_callers_cards() {
    let fixture = fixture();
    let service = service(&fixture);
    service
        .attach_card(&member(), &fixture.millennia)
        .expect("attach");
    service
        .attach_card(&member(), &fixture.regalia)
        .expect("attach");
    let router = crate::rewards::rewards_router(Arc::new(service));

    let body = json!({
        "category_id": fixture.dining.as_str(),
        "sub_category_id": fixture.restaurants.as_str(),
        "amount": 2000.0
    });
    let response = router
        .oneshot(send(
            json_request("POST", "/api/v1/rewards/best-card")
                .header(USER_ID_HEADER, "user-alice"),
            &body,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert!(payload["calculated_at"].is_string());
    assert_eq!(payload["recommended"]["card_name"], "Regalia");
    assert_eq!(payload["recommended"]["reward_label"], "4000 points");

    let results = payload["results"].as_array().expect("results array");
    assert_eq!(results.len(), 2);
    assert_eq!(results[1]["card_id"], fixture.millennia.as_str());
    assert_eq!(results[1]["rate_label"], "5% cashback");
    assert_eq!(results[1]["reward_label"], "₹100.00");
}

#[tokio::test]
async fn best_card_requires_caller_identity() {
    let fixture = fixture();
    let body = json!({ "category_id": fixture.dining.as_str(), "amount": 100.0 });

    let response = router(&fixture)
        .oneshot(send(
            json_request("POST", "/api/v1/rewards/best-card"),
            &body,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rank_rejects_negative_amounts() {
    let fixture = fixture();
    let body = json!({ "category_id": fixture.dining.as_str(), "amount": -5.0 });

    let response = router(&fixture)
        .oneshot(send(json_request("POST", "/api/v1/rewards/rank"), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("non-negative"));
}

#[tokio::test]
async fn rank_rejects_rewards_beyond_decimal_range() {
    let fixture = fixture();
    let body = json!({ "category_id": fixture.dining.as_str(), "amount": 5e28 });

    let response = router(&fixture)
        .oneshot(send(json_request("POST", "/api/v1/rewards/rank"), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("representable range"));
}

#[tokio::test]
async fn rank_omits_recommendation_when_nothing_earns() {
    let fixture = fixture();
    let body = json!({
        "category_id": fixture.travel.as_str(),
        "transaction_type": "OFFLINE",
        "amount": 0.0
    });

    let response = router(&fixture)
        .oneshot(send(json_request("POST", "/api/v1/rewards/rank"), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert!(payload.get("recommended").is_none());
    assert_eq!(payload["results"], json!([]));
}

#[tokio::test]
async fn rank_unknown_category_is_not_found() {
    let fixture = fixture();
    let body = json!({ "category_id": "category-missing", "amount": 10.0 });

    let response = router(&fixture)
        .oneshot(send(json_request("POST", "/api/v1/rewards/rank"), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn compare_route_validates_card_count() {
    let fixture = fixture();
    let single = json!({ "card_ids": [fixture.ace.as_str()] });

    let response = router(&fixture)
        .oneshot(send(
            json_request("POST", "/api/v1/rewards/compare"),
            &single,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let pair = json!({ "card_ids": [fixture.millennia.as_str(), fixture.ace.as_str()] });
    let response = router(&fixture)
        .oneshot(send(
            json_request("POST", "/api/v1/rewards/compare"),
            &pair,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let payload = read_json_body(response).await;
    assert_eq!(payload["cards"].as_array().map(Vec::len), Some(2));
    assert_eq!(payload["rows"][1]["category_name"], "Travel");
    assert_eq!(payload["rows"][1]["cells"][0]["label"], "N/A");
}

#[tokio::test]
async fn card_rules_route_reports_missing_cards() {
    let fixture = fixture();

    let response = router(&fixture)
        .oneshot(
            Request::get(format!("/api/v1/cards/{}/rules", fixture.millennia))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["card_name"], "Millennia");
    assert_eq!(payload["rules"][1]["sub_category_name"], "Restaurants");

    let response = router(&fixture)
        .oneshot(
            Request::get("/api/v1/cards/card-missing/rules")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn categories_route_lists_sub_categories() {
    let fixture = fixture();

    let response = router(&fixture)
        .oneshot(Request::get("/api/v1/categories").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let dining = payload
        .as_array()
        .expect("category list")
        .iter()
        .find(|tree| tree["name"] == "Dining")
        .expect("dining present");
    assert_eq!(dining["sub_categories"][0]["name"], "Restaurants");
}

#[tokio::test]
async fn rule_creation_is_admin_only() {
    let fixture = fixture();
    let body = json!({
        "credit_card_id": fixture.ace.as_str(),
        "category_id": fixture.travel.as_str(),
        "sub_category_id": fixture.airlines.as_str(),
        "transaction_type": "ONLINE",
        "reward_type": "CASHBACK",
        "reward_value": 3.5
    });

    let response = router(&fixture)
        .oneshot(send(
            json_request("POST", "/api/v1/rules").header(USER_ID_HEADER, "user-alice"),
            &body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = router(&fixture)
        .oneshot(send(
            json_request("POST", "/api/v1/rules")
                .header(USER_ID_HEADER, "user-ops")
                .header(USER_ROLE_HEADER, "admin"),
            &body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["transaction_type"], "ONLINE");
    assert_eq!(payload["credit_card_id"], fixture.ace.as_str());
}

#[tokio::test]
async fn unknown_role_header_is_rejected() {
    let fixture = fixture();
    let body = json!({ "reward_value": 2.0 });

    let response = router(&fixture)
        .oneshot(send(
            json_request("PUT", "/api/v1/rules/rule-000001")
                .header(USER_ID_HEADER, "user-ops")
                .header(USER_ROLE_HEADER, "superuser"),
            &body,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rule_update_and_delete_routes() {
    let fixture = fixture();
    let rule_id = fixture
        .store
        .list_by_card(&fixture.ace)
        .expect("rules")
        .remove(0)
        .id;
    let body = json!({ "reward_value": 6.0 });

    let response = router(&fixture)
        .oneshot(send(
            json_request("PUT", &format!("/api/v1/rules/{rule_id}"))
                .header(USER_ID_HEADER, "user-ops")
                .header(USER_ROLE_HEADER, "ADMIN"),
            &body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router(&fixture)
        .oneshot(send(
            json_request("PUT", "/api/v1/rules/rule-missing")
                .header(USER_ID_HEADER, "user-ops")
                .header(USER_ROLE_HEADER, "ADMIN"),
            &body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router(&fixture)
        .oneshot(
            Request::delete(format!("/api/v1/rules/{rule_id}"))
                .header(USER_ID_HEADER, "user-ops")
                .header(USER_ROLE_HEADER, "ADMIN")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(fixture.store.find_rule(&rule_id).expect("lookup").is_none());
}

#[tokio::test]
async fn rule_referencing_foreign_sub_category_is_unprocessable() {
    let fixture = fixture();
    let body = json!({
        "credit_card_id": fixture.ace.as_str(),
        "category_id": fixture.dining.as_str(),
        "sub_category_id": fixture.airlines.as_str(),
        "reward_type": "POINTS",
        "reward_value": 1.0
    });

    let response = router(&fixture)
        .oneshot(send(
            json_request("POST", "/api/v1/rules")
                .header(USER_ID_HEADER, "user-ops")
                .header(USER_ROLE_HEADER, "ADMIN"),
            &body,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn profile_cards_attach_conflict_and_detach() {
    let fixture = fixture();
    let router = router(&fixture);
    let attach = || {
        Request::post(format!("/api/v1/me/cards/{}", fixture.ace))
            .header(USER_ID_HEADER, "user-alice")
            .body(Body::empty())
            .unwrap()
    };

    let response = router.clone().oneshot(attach()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router.clone().oneshot(attach()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = router
        .clone()
        .oneshot(
            Request::get("/api/v1/me/cards")
                .header(USER_ID_HEADER, "user-alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let payload = read_json_body(response).await;
    assert_eq!(payload[0]["card"]["name"], "Ace");

    let response = router
        .oneshot(
            Request::delete(format!("/api/v1/me/cards/{}", fixture.ace))
                .header(USER_ID_HEADER, "user-alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn rank_handler_maps_outage_to_internal_error() {
    let service = Arc::new(RewardsService::new(Arc::new(UnavailableRepository)));
    let request = RewardQueryRequest {
        category_id: crate::rewards::CategoryId::new("dining"),
        sub_category_id: None,
        transaction_type: Default::default(),
        amount: 10.0,
    };

    let response = crate::rewards::router::rank_handler::<UnavailableRepository>(
        State(service),
        axum::Json(request),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
