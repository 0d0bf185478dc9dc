//! 编排器分派与会话槽位测试

mod common;

use std::sync::Arc;

use common::{setup, FailingRenderer, MockRelay};
use cookie_butler::models::{LoginError, LoginStatus, Platform};
use cookie_butler::services::{LoginOrchestrator, PlatformAdapter, QuarkLogin};
use serde_json::json;

const QUARK_TOKEN_URL: &str = "https://uop.quark.cn/cas/ajax/getTokenForQrcodeLogin";
const QUARK_TICKET_URL: &str = "https://uop.quark.cn/cas/ajax/getServiceTicketByQrcodeToken";
const ALI_GENERATE_URL: &str = "https://passport.aliyundrive.com/newlogin/qrcode/generate.do";
const ALI_QUERY_URL: &str = "https://passport.aliyundrive.com/newlogin/qrcode/query.do";
const UC_TOKEN_URL: &str = "https://api.open.uc.cn/cas/ajax/getTokenForQrcodeLogin";
const UC_TICKET_URL: &str = "https://api.open.uc.cn/cas/ajax/getServiceTicketByQrcodeToken";
const BILI_GENERATE_URL: &str = "https://passport.bilibili.com/x/passport-login/web/qrcode/generate";
const BILI_POLL_URL: &str = "https://passport.bilibili.com/x/passport-login/web/qrcode/poll";

/// 为每个平台预设一次成功的发起扫码响应
async fn script_start(relay: &MockRelay, platform: Platform) {
    match platform {
        Platform::Quark => {
            relay
                .respond(QUARK_TOKEN_URL, json!({ "data": { "members": { "token": "q" } } }))
                .await
        }
        Platform::Ali => {
            relay
                .respond(
                    ALI_GENERATE_URL,
                    json!({ "content": { "data": { "ck": "c", "t": "1", "codeContent": "ali-qr" } } }),
                )
                .await
        }
        Platform::Uc => {
            relay
                .respond(UC_TOKEN_URL, json!({ "data": { "members": { "token": "u" } } }))
                .await
        }
        Platform::Bili => {
            relay
                .respond(
                    BILI_GENERATE_URL,
                    json!({ "code": 0, "data": { "url": "bili-qr", "qrcode_key": "k" } }),
                )
                .await
        }
    }
}

fn poll_url(platform: Platform) -> &'static str {
    match platform {
        Platform::Quark => QUARK_TICKET_URL,
        Platform::Ali => ALI_QUERY_URL,
        Platform::Uc => UC_TICKET_URL,
        Platform::Bili => BILI_POLL_URL,
    }
}

#[tokio::test]
async fn test_check_status_before_start_is_expired() {
    let (relay, _renderer, orchestrator) = setup();

    for platform in Platform::ALL {
        let result = orchestrator.check_status(platform).await.unwrap();
        assert_eq!(result.status, LoginStatus::Expired, "platform {}", platform);
        assert_eq!(result.credential, None);
        assert_eq!(result.auth_token, None);
    }

    assert!(relay.requests().await.is_empty());
}

#[tokio::test]
async fn test_unknown_platform_key() {
    let (_relay, _renderer, orchestrator) = setup();

    let err = orchestrator.start_scan_by_key("baidu").await.unwrap_err();
    assert!(matches!(err, LoginError::UnsupportedPlatform(ref key) if key == "baidu"));

    let err = orchestrator.check_status_by_key("").await.unwrap_err();
    assert!(matches!(err, LoginError::UnsupportedPlatform(_)));

    let result = orchestrator.check_status_by_key("BILI").await.unwrap();
    assert_eq!(result.status, LoginStatus::Expired);
}

#[tokio::test]
async fn test_unregistered_platform_is_unsupported() {
    let relay = Arc::new(MockRelay::new());
    let quark: Arc<dyn PlatformAdapter> =
        Arc::new(QuarkLogin::new(relay, Arc::new(FailingRenderer)));
    let orchestrator = LoginOrchestrator::with_adapters([quark]);

    assert_eq!(orchestrator.platforms(), vec![Platform::Quark]);
    assert!(matches!(
        orchestrator.check_status(Platform::Ali).await,
        Err(LoginError::UnsupportedPlatform(ref key)) if key == "ali"
    ));
    assert!(!orchestrator.has_session(Platform::Ali).await);
}

#[tokio::test]
async fn test_transport_failure_during_poll_clears_slot() {
    for platform in Platform::ALL {
        let (relay, _renderer, orchestrator) = setup();
        script_start(&relay, platform).await;
        relay.fail(poll_url(platform), "connection reset").await;

        orchestrator.start_scan(platform).await.unwrap();
        assert!(orchestrator.has_session(platform).await);

        let err = orchestrator.check_status(platform).await.unwrap_err();
        assert!(matches!(err, LoginError::Transport(_)), "platform {}", platform);

        // 槽位已清空,再次轮询返回过期而非错误
        let after = orchestrator.check_status(platform).await.unwrap();
        assert_eq!(after.status, LoginStatus::Expired, "platform {}", platform);
        assert_eq!(relay.requests_to(poll_url(platform)).await.len(), 1);
    }
}

#[tokio::test]
async fn test_transport_failure_during_start() {
    let (relay, renderer, orchestrator) = setup();
    relay.fail(QUARK_TOKEN_URL, "timeout").await;

    let err = orchestrator.start_scan(Platform::Quark).await.unwrap_err();

    assert!(matches!(err, LoginError::Transport(_)));
    assert!(renderer.rendered().is_empty());
    assert!(!orchestrator.has_session(Platform::Quark).await);
}

#[tokio::test]
async fn test_render_failure_clears_slot() {
    let relay = MockRelay::new();
    script_start(&relay, Platform::Bili).await;
    let orchestrator = LoginOrchestrator::new(Arc::new(relay.clone()), Arc::new(FailingRenderer));

    let err = orchestrator.start_scan(Platform::Bili).await.unwrap_err();

    assert!(matches!(err, LoginError::Render(_)));
    assert!(!orchestrator.has_session(Platform::Bili).await);
}

#[tokio::test]
async fn test_last_start_wins() {
    let (relay, _renderer, orchestrator) = setup();
    relay
        .respond(QUARK_TOKEN_URL, json!({ "data": { "members": { "token": "first" } } }))
        .await;
    relay
        .respond(QUARK_TOKEN_URL, json!({ "data": { "members": { "token": "second" } } }))
        .await;
    relay.respond(QUARK_TICKET_URL, json!({ "status": 50004001 })).await;

    orchestrator.start_scan(Platform::Quark).await.unwrap();
    orchestrator.start_scan(Platform::Quark).await.unwrap();
    orchestrator.check_status(Platform::Quark).await.unwrap();

    let starts = relay.requests_to(QUARK_TOKEN_URL).await;
    let poll = &relay.requests_to(QUARK_TICKET_URL).await[0];
    assert_eq!(poll.query["token"], "second");
    assert_eq!(poll.query["request_id"], starts[1].query["request_id"]);
    assert_ne!(starts[0].query["request_id"], starts[1].query["request_id"]);
}

#[tokio::test]
async fn test_platform_slots_are_independent() {
    let (relay, _renderer, orchestrator) = setup();
    script_start(&relay, Platform::Ali).await;
    script_start(&relay, Platform::Bili).await;
    relay
        .respond(BILI_POLL_URL, json!({ "code": 0, "data": { "code": 86038 } }))
        .await;

    orchestrator.start_scan(Platform::Ali).await.unwrap();
    orchestrator.start_scan(Platform::Bili).await.unwrap();

    let bili = orchestrator.check_status(Platform::Bili).await.unwrap();
    assert_eq!(bili.status, LoginStatus::Expired);

    assert!(orchestrator.has_session(Platform::Ali).await);
    assert!(!orchestrator.has_session(Platform::Bili).await);
    assert!(!orchestrator.has_session(Platform::Quark).await);
}

#[tokio::test]
async fn test_concurrent_platforms() {
    let (relay, _renderer, orchestrator) = setup();
    for platform in Platform::ALL {
        script_start(&relay, platform).await;
    }

    let orchestrator = Arc::new(orchestrator);
    let handles: Vec<_> = Platform::ALL
        .into_iter()
        .map(|platform| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.start_scan(platform).await })
        })
        .collect();

    for handle in handles {
        let scan = handle.await.unwrap().unwrap();
        assert_eq!(scan.status, LoginStatus::New);
    }
    for platform in Platform::ALL {
        assert!(orchestrator.has_session(platform).await);
    }
    assert_eq!(relay.pending().await, 0);
}
