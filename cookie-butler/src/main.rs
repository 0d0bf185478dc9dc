use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use cookie_butler::config::ButlerConfig;
use cookie_butler::models::{LoginStatus, Platform, PollResult};
use cookie_butler::services::{HttpRelayClient, LoginOrchestrator, TextQrRenderer};
use cookie_butler::utils::logger;

/// 多平台扫码登录,输出可复用的 Cookie / 令牌
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 平台: quark / ali / uc / bili
    platform: Platform,

    /// 轮询间隔 (秒)
    #[arg(long, default_value_t = 2)]
    interval: u64,

    /// 最多轮询次数,超过后按过期处理
    #[arg(long)]
    max_polls: Option<u32>,

    /// 以JSON输出最终结果
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match ButlerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("配置错误: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // guard必须存活到进程退出
    let _guard = match logger::init(&config.log) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("日志系统初始化失败: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&args, &config).await {
        Ok(result) if result.status == LoginStatus::Confirmed => {
            print_result(&result, args.json);
            ExitCode::SUCCESS
        }
        Ok(result) => {
            print_result(&result, args.json);
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!(platform = %args.platform, error = %e, "Login failed");
            eprintln!("登录失败: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args, config: &ButlerConfig) -> Result<PollResult, Box<dyn std::error::Error>> {
    let relay = Arc::new(HttpRelayClient::new(&config.relay)?);
    let orchestrator = LoginOrchestrator::new(relay, Arc::new(TextQrRenderer));

    tracing::info!(
        platform = %args.platform,
        relay_url = %config.relay.relay_url,
        "Starting login"
    );

    let scan = orchestrator.start_scan(args.platform).await?;
    eprintln!("请使用 {} App 扫描以下二维码内容:", args.platform);
    println!("{}", scan.qr_image);

    let interval = Duration::from_secs(args.interval.max(1));
    let mut attempts: u32 = 0;
    let mut last_status = scan.status;

    loop {
        tokio::time::sleep(interval).await;
        attempts += 1;

        let result = orchestrator.check_status(args.platform).await?;
        if result.is_terminal() {
            return Ok(result);
        }
        if result.status == LoginStatus::Scaned && last_status != LoginStatus::Scaned {
            eprintln!("已扫码,请在手机上确认");
        }
        last_status = result.status;

        if args.max_polls.is_some_and(|max| attempts >= max) {
            tracing::warn!(platform = %args.platform, attempts, "Poll limit reached");
            return Ok(PollResult::expired());
        }
    }
}

fn print_result(result: &PollResult, json: bool) {
    if json {
        match serde_json::to_string_pretty(result) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("结果序列化失败: {}", e),
        }
        return;
    }

    match (&result.credential, &result.auth_token) {
        (Some(credential), _) => println!("{}", credential),
        (None, Some(token)) => println!("{}", token),
        (None, None) => eprintln!("登录未完成: {:?}", result.status),
    }
}
