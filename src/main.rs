use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::{env, fs};

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

mod api;
mod config;
mod flow;
mod lander;
mod monitoring;
mod notify;
mod transaction;
mod wallet;

use api::{QuoteRequest, SwapApi, SwapApiClient};
use config::{GlobalConfig, JunoConfig, load_config};
use flow::{FlowOutcome, SwapTester};
use lander::RpcLander;
use notify::{NotificationCallbacks, TracingNotifier};
use wallet::{KEYPAIR_WALLET_NAME, KeypairWalletAdapter, WalletConnectionProvider};

#[derive(Parser, Debug)]
#[command(name = "juno", version, about = "Jupiter swap 签名演示工具")]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径（默认查找 juno.toml 或 config/juno.toml）"
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 跑一轮演示 swap：取报价、取交易、签名、广播并等待确认
    Swap(SwapCmd),
    /// 请求 Jupiter API 报价并打印原始 JSON
    Quote(QuoteCmd),
    /// 列出已注册的钱包适配器与持久化连接状态
    Wallets,
    /// 初始化配置模版文件
    Init(InitCmd),
}

#[derive(Args, Debug)]
struct SwapCmd {
    #[arg(long, help = "请求 legacy 编码交易（默认 versioned）")]
    legacy: bool,
    #[arg(long, value_name = "NAME", help = "跳过自动连接，直接连接指定钱包")]
    wallet: Option<String>,
}

#[derive(Args, Debug)]
struct QuoteCmd {
    #[arg(long, help = "输入代币的 Mint 地址（缺省用配置里的演示参数）")]
    input: Option<String>,
    #[arg(long, help = "输出代币的 Mint 地址")]
    output: Option<String>,
    #[arg(long, help = "交易数量（原始单位，lamports/atoms）")]
    amount: Option<u64>,
    #[arg(long, help = "允许滑点（基点）")]
    slippage_bps: Option<u16>,
    #[arg(long, help = "仅限一跳直连路线")]
    direct_only: bool,
}

#[derive(Args, Debug)]
struct InitCmd {
    #[arg(long, value_name = "DIR", help = "可选输出目录（默认当前目录）")]
    output: Option<PathBuf>,
    #[arg(long, help = "若文件存在则覆盖")]
    force: bool,
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.clone())?;
    init_tracing(&config.global.logging)?;

    if config.prometheus.enable {
        monitoring::try_init_prometheus(&config.prometheus.listen)?;
    }

    match cli.command {
        Command::Swap(args) => run_swap(args, &config).await,
        Command::Quote(args) => run_quote(args, &config).await,
        Command::Wallets => show_wallets(&config),
        Command::Init(args) => init_configs(args),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

fn init_tracing(config: &config::LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json {
        fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .init();
    } else {
        fmt().with_env_filter(filter).init();
    }
    Ok(())
}

fn build_provider(config: &JunoConfig) -> Result<Arc<WalletConnectionProvider>> {
    let built_in = KeypairWalletAdapter::from_wallet_config(&config.global.wallet)
        .map_err(|err| anyhow!(err))?;
    Ok(Arc::new(WalletConnectionProvider::new(
        Arc::new(built_in),
        Vec::new(),
        &config.provider,
        NotificationCallbacks::default(),
    )))
}

fn build_api_client(config: &JunoConfig) -> Result<SwapApiClient> {
    let http_client = reqwest::Client::builder().build()?;
    Ok(SwapApiClient::new(
        http_client,
        config.swap.base_url.clone(),
        config.swap.request_timeout_ms,
    ))
}

async fn run_swap(args: SwapCmd, config: &JunoConfig) -> Result<()> {
    let provider = build_provider(config)?;

    match &args.wallet {
        Some(name) => {
            provider.connect(name).await.map_err(|err| anyhow!(err))?;
        }
        None => {
            if provider.auto_connect_once().await.is_none() {
                info!(
                    target: "juno",
                    wallet = KEYPAIR_WALLET_NAME,
                    "自动连接未触发，回落到内置签名钱包"
                );
                provider
                    .connect(KEYPAIR_WALLET_NAME)
                    .await
                    .map_err(|err| anyhow!(err))?;
            }
        }
    }

    let api_client = build_api_client(config)?;
    let rpc_client = resolve_rpc_client(&config.global)?;
    let lander = RpcLander::new(
        rpc_client,
        config.swap.skip_preflight,
        config.swap.max_retries,
    );

    let tester = SwapTester::new(
        api_client,
        lander,
        provider,
        Arc::new(TracingNotifier),
        config.swap.clone(),
    );

    let outcome = tokio::select! {
        outcome = tester.fetch_and_swap(!args.legacy) => outcome,
        _ = tokio::signal::ctrl_c() => {
            info!(target: "juno", "收到终止信号，停止运行");
            return Ok(());
        }
    };

    match outcome {
        FlowOutcome::Landed(receipt) => {
            println!("https://solscan.io/tx/{}", receipt.signature);
            Ok(())
        }
        FlowOutcome::Failed(err) => Err(anyhow!("swap 流程失败: {err}")),
        FlowOutcome::Busy => unreachable!("fresh tester cannot be busy"),
    }
}

async fn run_quote(args: QuoteCmd, config: &JunoConfig) -> Result<()> {
    let input = args.input.as_deref().unwrap_or(&config.swap.input_mint);
    let output = args.output.as_deref().unwrap_or(&config.swap.output_mint);
    let input = Pubkey::from_str(input)
        .map_err(|err| anyhow!("输入代币 Mint 无效 {input}: {err}"))?;
    let output = Pubkey::from_str(output)
        .map_err(|err| anyhow!("输出代币 Mint 无效 {output}: {err}"))?;

    let mut request = QuoteRequest::new(
        input,
        output,
        args.amount.unwrap_or(config.swap.amount),
        args.slippage_bps.unwrap_or(config.swap.slippage_bps),
    );
    if args.direct_only {
        request.only_direct_routes = Some(true);
    }
    request.max_accounts = Some(config.swap.max_accounts);

    let api_client = build_api_client(config)?;
    let quote = api_client.quote(&request).await?;
    println!("{}", serde_json::to_string_pretty(quote.raw())?);
    Ok(())
}

fn show_wallets(config: &JunoConfig) -> Result<()> {
    match KeypairWalletAdapter::from_wallet_config(&config.global.wallet) {
        Ok(built_in) => {
            let provider = WalletConnectionProvider::new(
                Arc::new(built_in),
                Vec::new(),
                &config.provider,
                NotificationCallbacks::default(),
            );
            println!(
                "cluster: {} (theme: {:?}, lang: {:?})",
                provider.env(),
                provider.theme(),
                provider.lang()
            );
            println!("storage: {}", provider.storage().path().display());
            for adapter in provider.adapters() {
                let indicator = if adapter.installed() { "✅" } else { "🚫" };
                let metadata = adapter.metadata();
                if metadata.url.is_empty() {
                    println!("{indicator} {}", adapter.name());
                } else {
                    println!("{indicator} {} ({})", adapter.name(), metadata.url);
                }
            }

            let state = provider.storage().load().map_err(|err| anyhow!(err))?;
            match &state.wallet_name {
                Some(name) => println!("last wallet: {name}"),
                None => println!("last wallet: （无记录）"),
            }
            if !state.previously_connected.is_empty() {
                println!("history: {}", state.previously_connected.join(", "));
            }
        }
        Err(err) => {
            warn!(target: "juno", error = %err, "内置签名钱包不可用，仅展示硬编码条目");
            for entry in &config.provider.hardcoded_wallets {
                println!("🚫 {} ({})", entry.name, entry.url);
            }
        }
    }
    Ok(())
}

fn resolve_rpc_client(global: &GlobalConfig) -> Result<Arc<RpcClient>> {
    let url = env::var("JUNO_RPC_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| {
            global
                .rpc_url
                .clone()
                .filter(|value| !value.trim().is_empty())
        })
        .unwrap_or_else(|| "https://api.mainnet-beta.solana.com".to_string());

    Ok(Arc::new(RpcClient::new(url)))
}

fn init_configs(args: InitCmd) -> Result<()> {
    let output_dir = match args.output {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    fs::create_dir_all(&output_dir)?;

    let template = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/juno.toml"));
    let target_path = output_dir.join("juno.toml");
    if target_path.exists() && !args.force {
        println!(
            "跳过 {}（文件已存在，如需覆盖请加 --force）",
            target_path.display()
        );
        return Ok(());
    }

    fs::write(&target_path, template)?;
    println!("已写入 {}", target_path.display());
    Ok(())
}
