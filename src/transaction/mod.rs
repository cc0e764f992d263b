//! Swap 交易的解码与签名。
//!
//! Jupiter 返回的 `swapTransaction` 是 base64 编码的未签名交易，按调用方
//! 选择的版本开关走 legacy 或 versioned 两条解码路径，二者不可混用。

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use bincode::error::{DecodeError, EncodeError};
use bincode::serde::{decode_from_slice, encode_to_vec};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::{Transaction, VersionedTransaction};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeTxError {
    #[error("base64 解码失败: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("bincode 解码失败: {0}")]
    Bincode(#[from] DecodeError),
    #[error("交易字节未被完整消费（{consumed}/{total}），版本开关与编码不匹配")]
    TrailingBytes { consumed: usize, total: usize },
}

#[derive(Debug, Error)]
pub enum EncodeTxError {
    #[error("bincode 编码失败: {0}")]
    Bincode(#[from] EncodeError),
}

#[derive(Debug, Error)]
pub enum SignTxError {
    #[error("签名者 {0} 不在交易要求的签名列表中")]
    MissingSigner(Pubkey),
}

/// 按版本开关解码出的 swap 交易。
#[derive(Debug, Clone)]
pub enum DecodedSwapTransaction {
    Legacy(Transaction),
    Versioned(VersionedTransaction),
}

impl DecodedSwapTransaction {
    pub fn variant_name(&self) -> &'static str {
        match self {
            DecodedSwapTransaction::Legacy(_) => "legacy",
            DecodedSwapTransaction::Versioned(_) => "versioned",
        }
    }

    /// 首个签名位，广播后用它拼接浏览器链接。
    pub fn signature(&self) -> Option<Signature> {
        match self {
            DecodedSwapTransaction::Legacy(tx) => tx.signatures.first().copied(),
            DecodedSwapTransaction::Versioned(tx) => tx.signatures.first().copied(),
        }
    }

    /// 把 `signer` 的签名写入对应签名位。交易由 API 预构建，这里只补签名，
    /// 不重排账户也不改 blockhash。
    pub fn sign_in_place(&mut self, signer: &Keypair) -> Result<(), SignTxError> {
        match self {
            DecodedSwapTransaction::Legacy(tx) => {
                let num_required = tx.message.header.num_required_signatures as usize;
                let position = tx
                    .message
                    .account_keys
                    .iter()
                    .take(num_required)
                    .position(|key| *key == signer.pubkey())
                    .ok_or_else(|| SignTxError::MissingSigner(signer.pubkey()))?;
                if tx.signatures.len() != num_required {
                    tx.signatures = vec![Signature::default(); num_required];
                }
                tx.signatures[position] = signer.sign_message(&tx.message_data());
                Ok(())
            }
            DecodedSwapTransaction::Versioned(tx) => {
                let num_required = tx.message.header().num_required_signatures as usize;
                let position = tx
                    .message
                    .static_account_keys()
                    .iter()
                    .take(num_required)
                    .position(|key| *key == signer.pubkey())
                    .ok_or_else(|| SignTxError::MissingSigner(signer.pubkey()))?;
                if tx.signatures.len() != num_required {
                    tx.signatures = vec![Signature::default(); num_required];
                }
                tx.signatures[position] = signer.sign_message(&tx.message.serialize());
                Ok(())
            }
        }
    }
}

/// 解码 base64 编码的 swap 交易，`as_legacy` 决定走哪条反序列化路径。
pub fn decode_swap_transaction(
    encoded: &str,
    as_legacy: bool,
) -> Result<DecodedSwapTransaction, DecodeTxError> {
    let bytes = BASE64_STANDARD.decode(encoded.trim())?;
    if as_legacy {
        let (tx, consumed) = decode_from_slice::<Transaction, _>(&bytes, bincode_config())?;
        ensure_consumed(consumed, bytes.len())?;
        Ok(DecodedSwapTransaction::Legacy(tx))
    } else {
        let (tx, consumed) = decode_from_slice::<VersionedTransaction, _>(&bytes, bincode_config())?;
        ensure_consumed(consumed, bytes.len())?;
        Ok(DecodedSwapTransaction::Versioned(tx))
    }
}

/// 重新编码为 base64，便于对比或落盘。
pub fn encode_swap_transaction(tx: &DecodedSwapTransaction) -> Result<String, EncodeTxError> {
    let bytes = match tx {
        DecodedSwapTransaction::Legacy(tx) => encode_to_vec(tx, bincode_config())?,
        DecodedSwapTransaction::Versioned(tx) => encode_to_vec(tx, bincode_config())?,
    };
    Ok(BASE64_STANDARD.encode(bytes))
}

fn ensure_consumed(consumed: usize, total: usize) -> Result<(), DecodeTxError> {
    if consumed != total {
        return Err(DecodeTxError::TrailingBytes { consumed, total });
    }
    Ok(())
}

fn bincode_config() -> impl bincode::config::Config {
    bincode::config::standard()
        .with_fixed_int_encoding()
        .with_little_endian()
}
