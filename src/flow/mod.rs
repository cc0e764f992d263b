//! 演示 swap 流程：取报价、取交易、解码、签名、落地、确认。
//!
//! 每个实例同一时刻只允许一轮在途，靠忙碌标志抑制重复触发；失败不入队
//! 也不重试，只换来一条用户可见的错误通知。

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;
use tracing::{debug, info};

use crate::api::{
    ApiError, DynamicSlippageSettings, PriorityLevel, PrioritizationFeeLamports, QuoteRequest,
    SwapApi, SwapRequest,
};
use crate::config::SwapFlowConfig;
use crate::lander::{LanderError, LanderReceipt, TransactionLander};
use crate::notify::Notifier;
use crate::transaction::{DecodeTxError, decode_swap_transaction};
use crate::wallet::{WalletConnectionProvider, WalletError};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("配置缺失或非法: {0}")]
    InvalidConfig(String),
    #[error("钱包未连接")]
    Disconnected,
    #[error("Jupiter API 错误: {0}")]
    Api(#[from] ApiError),
    #[error("交易解码失败: {0}")]
    Decode(#[from] DecodeTxError),
    #[error("钱包操作失败: {0}")]
    Wallet(#[from] WalletError),
    #[error("交易落地失败: {0}")]
    Landing(#[from] LanderError),
}

/// 单轮流程的结果。`Busy` 表示被忙碌标志抑制，未执行任何步骤。
#[derive(Debug)]
pub enum FlowOutcome {
    Landed(LanderReceipt),
    Failed(FlowError),
    Busy,
}

impl FlowOutcome {
    pub fn is_landed(&self) -> bool {
        matches!(self, FlowOutcome::Landed(_))
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, FlowOutcome::Busy)
    }
}

pub struct SwapTester<A, L> {
    api: A,
    lander: L,
    provider: Arc<WalletConnectionProvider>,
    notifier: Arc<dyn Notifier>,
    config: SwapFlowConfig,
    busy: AtomicBool,
}

impl<A, L> SwapTester<A, L>
where
    A: SwapApi,
    L: TransactionLander,
{
    pub fn new(
        api: A,
        lander: L,
        provider: Arc<WalletConnectionProvider>,
        notifier: Arc<dyn Notifier>,
        config: SwapFlowConfig,
    ) -> Self {
        Self {
            api,
            lander,
            provider,
            notifier,
            config,
            busy: AtomicBool::new(false),
        }
    }

    /// 跑一轮演示 swap。`ver_tx` 为 true 走 versioned 交易，否则走 legacy。
    ///
    /// 结果恰好触发一次通知：落地成功一条 success，任何一步失败一条
    /// error；被忙碌标志抑制时静默返回。
    pub async fn fetch_and_swap(&self, ver_tx: bool) -> FlowOutcome {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(target: "flow", "上一轮 swap 仍在进行，忽略本次触发");
            return FlowOutcome::Busy;
        }

        let result = self.run(ver_tx).await;
        self.busy.store(false, Ordering::Release);

        match result {
            Ok(receipt) => {
                self.notifier
                    .success(&format!("Swap 成功 https://solscan.io/tx/{}", receipt.signature));
                FlowOutcome::Landed(receipt)
            }
            Err(err) => {
                self.notifier.error(&err.to_string());
                FlowOutcome::Failed(err)
            }
        }
    }

    async fn run(&self, ver_tx: bool) -> Result<LanderReceipt, FlowError> {
        let adapter = self.provider.current().ok_or(FlowError::Disconnected)?;
        let user = adapter.pubkey().ok_or(FlowError::Disconnected)?;

        let quote_request = self.build_quote_request(ver_tx)?;
        let quote = self.api.quote(&quote_request).await?;
        info!(
            target: "flow",
            in_amount = quote.summary().in_amount,
            out_amount = quote.summary().out_amount,
            price_impact_pct = %quote.summary().price_impact_pct,
            "报价已取得"
        );

        let swap_request = self.build_swap_request(quote.into_raw(), user, ver_tx);
        let swap = self.api.swap(&swap_request).await?;
        debug!(
            target: "flow",
            last_valid_block_height = ?swap.last_valid_block_height,
            prioritization_fee_lamports = ?swap.prioritization_fee_lamports,
            "swap 交易已取得"
        );

        let mut transaction = decode_swap_transaction(&swap.swap_transaction, !ver_tx)?;
        adapter.sign_transaction(&mut transaction).await?;

        let receipt = self.lander.land(&transaction).await?;
        info!(
            target: "flow",
            signature = %receipt.signature,
            lander = receipt.lander,
            endpoint = %receipt.endpoint,
            variant = transaction.variant_name(),
            "https://solscan.io/tx/{}",
            receipt.signature
        );

        Ok(receipt)
    }

    fn build_quote_request(&self, ver_tx: bool) -> Result<QuoteRequest, FlowError> {
        let input_mint = Pubkey::from_str(&self.config.input_mint)
            .map_err(|err| FlowError::InvalidConfig(format!("swap.input_mint 非法: {err}")))?;
        let output_mint = Pubkey::from_str(&self.config.output_mint)
            .map_err(|err| FlowError::InvalidConfig(format!("swap.output_mint 非法: {err}")))?;

        let mut request = QuoteRequest::new(
            input_mint,
            output_mint,
            self.config.amount,
            self.config.slippage_bps,
        );
        // legacy 路径收紧为单跳直连，和 asLegacyTransaction 一起翻转。
        request.only_direct_routes = Some(!ver_tx);
        request.as_legacy_transaction = Some(!ver_tx);
        request.max_accounts = Some(self.config.max_accounts);
        request.minimize_slippage = Some(false);
        Ok(request)
    }

    fn build_swap_request(
        &self,
        quote_response: serde_json::Value,
        user: Pubkey,
        ver_tx: bool,
    ) -> SwapRequest {
        let mut request = SwapRequest::new(quote_response, user);
        request.config.prioritization_fee_lamports =
            Some(PrioritizationFeeLamports::PriorityLevelWithMaxLamports {
                priority_level: PriorityLevel::High,
                max_lamports: self.config.priority_max_lamports,
                global: false,
            });
        request.config.as_legacy_transaction = !ver_tx;
        request.config.dynamic_compute_unit_limit = true;
        request.config.allow_optimized_wrapped_sol_token_account = false;
        request.config.dynamic_slippage = Some(DynamicSlippageSettings {
            min_bps: None,
            max_bps: Some(self.config.slippage_bps),
        });
        request
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use solana_sdk::instruction::Instruction;
    use solana_sdk::message::Message;
    use solana_sdk::signature::{Keypair, Signer};
    use solana_sdk::transaction::Transaction;
    use tokio::sync::Notify;

    use super::*;
    use crate::api::{QuoteResponse, SwapResponse};
    use crate::config::ProviderConfig;
    use crate::notify::NotificationCallbacks;
    use crate::transaction::{DecodedSwapTransaction, encode_swap_transaction};
    use crate::wallet::{KEYPAIR_WALLET_NAME, KeypairWalletAdapter};

    fn quote_value(input: Pubkey, output: Pubkey) -> serde_json::Value {
        serde_json::json!({
            "inputMint": input.to_string(),
            "outputMint": output.to_string(),
            "inAmount": "100000",
            "outAmount": "523187",
            "otherAmountThreshold": "507492",
            "swapMode": "ExactIn",
            "slippageBps": 300,
            "priceImpactPct": "0.0012",
        })
    }

    /// 返回固定报价和固定交易的桩后端，可选地在报价处挂起等放行。
    struct StubApi {
        swap_transaction: String,
        gate: Option<Arc<Notify>>,
        quote_calls: AtomicUsize,
    }

    impl StubApi {
        fn new(swap_transaction: String) -> Self {
            Self {
                swap_transaction,
                gate: None,
                quote_calls: AtomicUsize::new(0),
            }
        }

        fn gated(swap_transaction: String, gate: Arc<Notify>) -> Self {
            Self {
                swap_transaction,
                gate: Some(gate),
                quote_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SwapApi for StubApi {
        async fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, ApiError> {
            self.quote_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let value = quote_value(request.input_mint, request.output_mint);
            Ok(QuoteResponse::try_from_value(value).expect("stub quote"))
        }

        async fn swap(&self, _request: &SwapRequest) -> Result<SwapResponse, ApiError> {
            Ok(SwapResponse {
                raw: serde_json::json!({}),
                swap_transaction: self.swap_transaction.clone(),
                last_valid_block_height: Some(1),
                prioritization_fee_lamports: None,
            })
        }
    }

    struct StubLander;

    #[async_trait]
    impl TransactionLander for StubLander {
        async fn land(
            &self,
            tx: &DecodedSwapTransaction,
        ) -> Result<LanderReceipt, LanderError> {
            let signature = tx
                .signature()
                .ok_or_else(|| LanderError::fatal("unsigned transaction"))?;
            Ok(LanderReceipt {
                lander: "stub",
                endpoint: "stub://".to_string(),
                signature: signature.to_string(),
                blockhash: "stub".to_string(),
                last_valid_block_height: 1,
            })
        }
    }

    #[derive(Default)]
    struct CountingNotifier {
        successes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl Notifier for CountingNotifier {
        fn success(&self, _message: &str) {
            self.successes.fetch_add(1, Ordering::SeqCst);
        }

        fn error(&self, _message: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn legacy_swap_transaction(payer: &Keypair) -> String {
        let instruction = Instruction::new_with_bytes(Pubkey::new_unique(), &[7], vec![]);
        let tx = Transaction::new_unsigned(Message::new(&[instruction], Some(&payer.pubkey())));
        encode_swap_transaction(&DecodedSwapTransaction::Legacy(tx)).expect("encode")
    }

    async fn connected_provider(
        dir: &tempfile::TempDir,
        keypair: Arc<Keypair>,
    ) -> Arc<WalletConnectionProvider> {
        let config = ProviderConfig {
            auto_connect: false,
            storage_path: dir.path().join("wallet.json"),
            ..ProviderConfig::default()
        };
        let provider = Arc::new(WalletConnectionProvider::new(
            Arc::new(KeypairWalletAdapter::new(keypair)),
            Vec::new(),
            &config,
            NotificationCallbacks::default(),
        ));
        provider
            .connect(KEYPAIR_WALLET_NAME)
            .await
            .expect("connect");
        provider
    }

    #[tokio::test]
    async fn legacy_flow_lands_with_one_success_notification() {
        let dir = tempfile::tempdir().expect("tempdir");
        let keypair = Arc::new(Keypair::new());
        let provider = connected_provider(&dir, keypair.clone()).await;

        let notifier = Arc::new(CountingNotifier::default());
        let tester = SwapTester::new(
            StubApi::new(legacy_swap_transaction(&keypair)),
            StubLander,
            provider,
            notifier.clone(),
            SwapFlowConfig::default(),
        );

        let outcome = tester.fetch_and_swap(false).await;
        assert!(outcome.is_landed(), "outcome: {outcome:?}");
        assert_eq!(notifier.successes.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.errors.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn disconnected_wallet_yields_one_error_and_clears_busy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let keypair = Arc::new(Keypair::new());
        let config = ProviderConfig {
            auto_connect: false,
            storage_path: dir.path().join("wallet.json"),
            ..ProviderConfig::default()
        };
        // 未连接任何钱包。
        let provider = Arc::new(WalletConnectionProvider::new(
            Arc::new(KeypairWalletAdapter::new(keypair.clone())),
            Vec::new(),
            &config,
            NotificationCallbacks::default(),
        ));

        let notifier = Arc::new(CountingNotifier::default());
        let api = StubApi::new(legacy_swap_transaction(&keypair));
        let tester = SwapTester::new(
            api,
            StubLander,
            provider,
            notifier.clone(),
            SwapFlowConfig::default(),
        );

        let outcome = tester.fetch_and_swap(true).await;
        assert!(matches!(
            outcome,
            FlowOutcome::Failed(FlowError::Disconnected)
        ));
        assert_eq!(notifier.errors.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.successes.load(Ordering::SeqCst), 0);
        // 钱包没连上，API 一次都不应被触达。
        assert_eq!(tester.api.quote_calls.load(Ordering::SeqCst), 0);

        // 忙碌标志已清除，下一轮可以继续跑（仍然失败，但会再次通知）。
        let outcome = tester.fetch_and_swap(true).await;
        assert!(matches!(outcome, FlowOutcome::Failed(_)));
        assert_eq!(notifier.errors.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_invocation_is_suppressed_while_busy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let keypair = Arc::new(Keypair::new());
        let provider = connected_provider(&dir, keypair.clone()).await;

        let gate = Arc::new(Notify::new());
        let notifier = Arc::new(CountingNotifier::default());
        let tester = Arc::new(SwapTester::new(
            StubApi::gated(legacy_swap_transaction(&keypair), gate.clone()),
            StubLander,
            provider,
            notifier.clone(),
            SwapFlowConfig::default(),
        ));

        let first = tokio::spawn({
            let tester = tester.clone();
            async move { tester.fetch_and_swap(false).await }
        });

        // 等第一轮真正进入报价阶段再触发第二轮。
        while tester.api.quote_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        let second = tester.fetch_and_swap(false).await;
        assert!(second.is_busy());

        gate.notify_one();
        let first = first.await.expect("join");
        assert!(first.is_landed(), "outcome: {first:?}");

        // 被抑制的那一轮不产生任何通知。
        assert_eq!(notifier.successes.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.errors.load(Ordering::SeqCst), 0);
    }
}
