//! HTTP flow tests for the dev node, driven in-process through the router.
//!
//! Run with: cargo test -p rps-escrow-node --test api_flow

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use rps_escrow_core::{Address, Commitment, Move, Salt};
use rps_escrow_node::{create_router, AppState, NodeConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

const ESCROW: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";

fn alice() -> Address {
    Address::repeat_byte(0xa1)
}

fn bob() -> Address {
    Address::repeat_byte(0xb0)
}

fn app() -> Router {
    create_router(AppState::new(&NodeConfig::default()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

/// Mint and approve 1000 tokens for both players
async fn fund_players(app: &Router) {
    for player in [alice(), bob()] {
        let (status, _) = post(app, "/token/mint", json!({ "account": player, "amount": 1000 })).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = post(app, "/token/approve", json!({ "owner": player, "amount": 1000 })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["spender"], ESCROW);
    }
}

async fn balance(app: &Router, address: Address) -> u64 {
    let (status, body) = get(app, &format!("/token/balance/{address}")).await;
    assert_eq!(status, StatusCode::OK);
    body["balance"].as_u64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_full_round_pays_winner() {
    let app = app();
    fund_players(&app).await;

    let (status, body) = post(
        &app,
        "/rounds",
        json!({ "round_id": 1, "wager": 200, "creator": alice() }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["round"]["round"]["phase"], "created");
    assert_eq!(body["events"][0]["event"], "round_created");
    assert_eq!(body["events"][0]["wager"], 200);
    assert_eq!(body["events"][1]["event"], "player_joined");

    let (status, body) = post(&app, "/rounds/1/join", json!({ "player": bob() })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["round"]["round"]["pot"], 400);
    assert_eq!(body["events"], json!([{ "event": "player_joined", "round_id": 1, "player": bob() }]));

    let salt_a = Salt::random();
    let salt_b = Salt::random();
    for (player, mv, salt) in [(alice(), Move::Paper, &salt_a), (bob(), Move::Rock, &salt_b)] {
        let (status, _) = post(
            &app,
            "/rounds/1/commit",
            json!({ "player": player, "commitment": Commitment::new(mv, salt) }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = post(
        &app,
        "/rounds/1/reveal",
        json!({ "player": alice(), "move": "paper", "salt": salt_a }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("outcome").is_none());

    let (status, body) = post(
        &app,
        "/rounds/1/reveal",
        json!({ "player": bob(), "move": "rock", "salt": salt_b }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "player1_wins");
    assert_eq!(body["round"]["winner"], json!(alice()));
    assert_eq!(body["round"]["round"]["phase"], "resolved");

    assert_eq!(balance(&app, alice()).await, 1200);
    assert_eq!(balance(&app, bob()).await, 800);

    let (_, contract) = get(&app, "/contract").await;
    assert_eq!(contract["escrow_balance"], 0);
    assert_eq!(contract["escrowed_total"], 0);
    assert_eq!(contract["rounds"], 1);

    let (_, events) = get(&app, "/events?round_id=1").await;
    let kinds: Vec<&str> = events["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event"].as_str().unwrap())
        .collect();
    assert_eq!(kinds.last(), Some(&"payout"));
    assert!(kinds.contains(&"round_resolved"));

    let (status, _) = post(&app, "/rounds/1/join", json!({ "player": bob() })).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_error_statuses() {
    let app = app();
    fund_players(&app).await;

    let (status, body) = get(&app, "/rounds/9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Round 9 does not exist");

    let (status, _) = post(&app, "/rounds/9/join", json!({ "player": bob() })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let create = json!({ "round_id": 2, "wager": 100, "creator": alice() });
    assert_eq!(post(&app, "/rounds", create.clone()).await.0, StatusCode::CREATED);
    assert_eq!(post(&app, "/rounds", create).await.0, StatusCode::CONFLICT);

    let stranger = Address::repeat_byte(0x55);
    let salt = Salt::random();
    let (status, _) = post(
        &app,
        "/rounds/2/commit",
        json!({ "player": stranger, "commitment": Commitment::new(Move::Rock, &salt) }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Unfunded joiner cannot post the wager
    let (status, body) = post(&app, "/rounds/2/join", json!({ "player": stranger })).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(body["error"].as_str().unwrap().contains("failed"));

    let (status, _) = get(&app, "/token/balance/not-an-address").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mismatched_reveal_is_unprocessable() {
    let app = app();
    fund_players(&app).await;

    post(&app, "/rounds", json!({ "round_id": 3, "wager": 50, "creator": alice() })).await;
    post(&app, "/rounds/3/join", json!({ "player": bob() })).await;

    let salt = Salt::random();
    for player in [alice(), bob()] {
        post(
            &app,
            "/rounds/3/commit",
            json!({ "player": player, "commitment": Commitment::new(Move::Scissors, &salt) }),
        )
        .await;
    }

    let (status, _) = post(
        &app,
        "/rounds/3/reveal",
        json!({ "player": alice(), "move": "rock", "salt": salt }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, round) = get(&app, "/rounds/3").await;
    assert_eq!(round["round"]["phase"], "committed");
    assert_eq!(round["round"]["players"][0]["reveal"], Value::Null);
}

#[tokio::test]
async fn test_archive_after_tie() {
    let app = app();
    fund_players(&app).await;

    post(&app, "/rounds", json!({ "round_id": 4, "wager": 300, "creator": alice() })).await;
    assert_eq!(post(&app, "/rounds/4/archive", json!({})).await.0, StatusCode::CONFLICT);
    post(&app, "/rounds/4/join", json!({ "player": bob() })).await;

    let salts = [Salt::random(), Salt::random()];
    for (player, salt) in [alice(), bob()].into_iter().zip(&salts) {
        post(
            &app,
            "/rounds/4/commit",
            json!({ "player": player, "commitment": Commitment::new(Move::Paper, salt) }),
        )
        .await;
    }
    for (player, salt) in [alice(), bob()].into_iter().zip(&salts) {
        let (status, _) = post(
            &app,
            "/rounds/4/reveal",
            json!({ "player": player, "move": "paper", "salt": salt }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(balance(&app, alice()).await, 1000);
    assert_eq!(balance(&app, bob()).await, 1000);

    let (status, archived) = post(&app, "/rounds/4/archive", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(archived["round"]["outcome"], "tie");
    assert_eq!(archived["winner"], Value::Null);

    assert_eq!(get(&app, "/rounds/4").await.0, StatusCode::NOT_FOUND);
    let reuse = json!({ "round_id": 4, "wager": 1, "creator": bob() });
    assert_eq!(post(&app, "/rounds", reuse).await.0, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_escrow_account_cannot_take_a_seat() {
    let app = app();
    fund_players(&app).await;
    post(&app, "/token/mint", json!({ "account": ESCROW, "amount": 1000 })).await;
    post(
        &app,
        "/token/approve",
        json!({ "owner": ESCROW, "spender": ESCROW, "amount": 1000 }),
    )
    .await;

    let (status, body) = post(
        &app,
        "/rounds",
        json!({ "round_id": 5, "wager": 200, "creator": ESCROW }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("Escrow account"));

    post(&app, "/rounds", json!({ "round_id": 6, "wager": 200, "creator": alice() })).await;
    let (status, _) = post(&app, "/rounds/6/join", json!({ "player": ESCROW })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, contract) = get(&app, "/contract").await;
    assert_eq!(contract["escrowed_total"], 200);
    assert_eq!(contract["escrow_balance"], 1200);
}
