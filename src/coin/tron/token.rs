use crate::bridge::Asset;
use crate::coin::tron::address;
use crate::coin::tron::client::TronApi;
use crate::coin::tron::codec::{self, DECIMALS_METHOD, SYMBOL_METHOD};
use crate::coin::tron::utils::MAX_DECIMALS;
use crate::types::AppError;
use log::info;

/// A TRC-20 contract the client ingests from and pays out of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistToken {
    /// base58
    pub contract: String,
    pub symbol: String,
    pub decimals: u32,
}

impl WhitelistToken {
    pub fn asset(&self) -> Asset {
        Asset::token(&self.symbol, &self.contract)
    }

    pub fn matches_contract(&self, contract: &str) -> bool {
        self.contract.eq_ignore_ascii_case(contract)
    }
}

pub fn find_by_contract<'a>(tokens: &'a [WhitelistToken], contract: &str) -> Option<&'a WhitelistToken> {
    tokens.iter().find(|t| t.matches_contract(contract))
}

pub fn find_by_asset<'a>(tokens: &'a [WhitelistToken], asset: &Asset) -> Option<&'a WhitelistToken> {
    tokens.iter().find(|t| t.asset() == *asset)
}

/// Reads `symbol()` and `decimals()` of every configured contract. Any failure aborts.
pub async fn load_whitelist(api: &dyn TronApi, contracts: &[String]) -> Result<Vec<WhitelistToken>, AppError> {
    let mut tokens = Vec::with_capacity(contracts.len());
    for contract in contracts {
        let contract = address::to_base58(contract)?;
        let evm = address::to_evm_hex(&contract)?;

        let symbol = codec::decode_string_result(&call(api, &evm, SYMBOL_METHOD).await?)?;
        let decimals = codec::decode_uint256_result(&call(api, &evm, DECIMALS_METHOD).await?)?;
        let decimals = u32::try_from(decimals)
            .ok()
            .filter(|d| *d <= MAX_DECIMALS)
            .ok_or_else(|| AppError::Decode(format!("{} reports {} decimals", contract, decimals)))?;

        info!("[TRON Client] whitelisted token {} ({}, {} decimals)", symbol, contract, decimals);
        tokens.push(WhitelistToken { contract, symbol, decimals });
    }
    Ok(tokens)
}

/// `eth_call` of a no-argument method; returns the raw `0x...` result.
pub async fn call(api: &dyn TronApi, contract_evm: &str, method: &str) -> Result<String, AppError> {
    let data = format!("0x{}", hex::encode(codec::selector(method)));
    call_data(api, contract_evm, &data).await
}

pub async fn call_data(api: &dyn TronApi, contract_evm: &str, data: &str) -> Result<String, AppError> {
    let resp = api.eth_call(contract_evm, data).await?;
    if let Some(err) = resp.error {
        return Err(AppError::Parameter(format!("eth_call {} failed: {} {}", contract_evm, err.code, err.message)));
    }
    resp.result
        .ok_or_else(|| AppError::Parameter(format!("eth_call {} returned no result", contract_evm)))
}
