//! UC网盘扫码流程测试

mod common;

use common::setup;
use cookie_butler::models::{LoginError, LoginStatus, Platform};
use cookie_butler::services::relay::{HttpMethod, RelayResponse};
use serde_json::json;

const TOKEN_URL: &str = "https://api.open.uc.cn/cas/ajax/getTokenForQrcodeLogin";
const TICKET_URL: &str = "https://api.open.uc.cn/cas/ajax/getServiceTicketByQrcodeToken";
const ACCOUNT_INFO_URL: &str = "https://drive.uc.cn/account/info";

async fn started() -> (common::MockRelay, cookie_butler::services::LoginOrchestrator) {
    let (relay, _renderer, orchestrator) = setup();
    relay
        .respond(
            TOKEN_URL,
            json!({ "status": 2000000, "data": { "members": { "token": "uc-tk" } } }),
        )
        .await;
    orchestrator.start_scan(Platform::Uc).await.unwrap();
    (relay, orchestrator)
}

#[tokio::test]
async fn test_start_posts_form_with_timestamp() {
    let (relay, renderer, orchestrator) = setup();
    relay
        .respond(
            TOKEN_URL,
            json!({ "status": 2000000, "data": { "members": { "token": "uc-tk" } } }),
        )
        .await;

    orchestrator.start_scan(Platform::Uc).await.unwrap();

    let request = &relay.requests_to(TOKEN_URL).await[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert!(request.query["__t"].parse::<i64>().is_ok());
    let form = request.form.as_ref().unwrap();
    assert_eq!(form["client_id"], "381");
    assert_eq!(form["v"], "1.2");
    assert_eq!(form["request_id"].len(), 36);

    let rendered = renderer.rendered();
    assert!(rendered[0].starts_with("https://su.uc.cn/1_n0ZCv?token=uc-tk&client_id=381"));
}

#[tokio::test]
async fn test_confirmed_is_single_use() {
    let (relay, orchestrator) = started().await;
    relay
        .respond(
            TICKET_URL,
            json!({ "status": 2000000, "data": { "members": { "service_ticket": "st-uc" } } }),
        )
        .await;
    relay
        .respond_with(
            ACCOUNT_INFO_URL,
            RelayResponse::new(json!({ "success": true })).with_header(
                "set-cookie",
                vec![
                    "__pus=a; Expires=Thu, 01 Jan 2026 00:00:00 GMT; Path=/",
                    "__kps=b; Path=/; HttpOnly",
                ],
            ),
        )
        .await;

    let result = orchestrator.check_status(Platform::Uc).await.unwrap();

    assert_eq!(result.status, LoginStatus::Confirmed);
    assert_eq!(result.credential.as_deref(), Some("__pus=a;__kps=b"));
    assert!(!orchestrator.has_session(Platform::Uc).await);

    let ticket = &relay.requests_to(TICKET_URL).await[0];
    assert_eq!(ticket.form.as_ref().unwrap()["token"], "uc-tk");
    assert_eq!(relay.requests_to(ACCOUNT_INFO_URL).await[0].query["st"], "st-uc");

    // 会话已作废
    let again = orchestrator.check_status(Platform::Uc).await.unwrap();
    assert_eq!(again.status, LoginStatus::Expired);
}

#[tokio::test]
async fn test_pending_and_expired_codes() {
    let (relay, orchestrator) = started().await;
    relay.respond(TICKET_URL, json!({ "status": 50004001 })).await;
    relay.respond(TICKET_URL, json!({ "status": 50004002 })).await;

    let pending = orchestrator.check_status(Platform::Uc).await.unwrap();
    assert_eq!(pending.status, LoginStatus::New);
    assert!(orchestrator.has_session(Platform::Uc).await);

    let expired = orchestrator.check_status(Platform::Uc).await.unwrap();
    assert_eq!(expired.status, LoginStatus::Expired);
    assert!(!orchestrator.has_session(Platform::Uc).await);
}

#[tokio::test]
async fn test_missing_status_is_upstream_error() {
    let (relay, orchestrator) = started().await;
    relay.respond(TICKET_URL, json!({ "message": "bad gateway" })).await;

    let err = orchestrator.check_status(Platform::Uc).await.unwrap_err();

    assert!(matches!(err, LoginError::UpstreamApplication { platform: Platform::Uc, .. }));
    assert!(!orchestrator.has_session(Platform::Uc).await);
}
