use crate::calls::CallDescriptor;
use crate::config::BotConfig;
use crate::error::{BotError, Result};
use crate::state::GameState;
use async_trait::async_trait;
use log::{debug, info};
use starknet::accounts::{Account, ExecutionEncoding, SingleOwnerAccount};
use starknet::core::types::{
    BlockId, BlockTag, Call, Event, ExecutionResult, Felt, FunctionCall, StarknetError,
    TransactionReceipt,
};
use starknet::core::utils::get_selector_from_name;
use starknet::providers::jsonrpc::{HttpTransport, JsonRpcClient};
use starknet::providers::{Provider, ProviderError, Url};
use starknet::signers::{LocalWallet, SigningKey};

/// Result of an included transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    Succeeded,
    Reverted(String),
}

/// Everything the execution loop needs from the chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn fetch_state(&self, game_id: u64) -> Result<GameState>;

    /// Signs and broadcasts `calls` as one multicall, returning the transaction hash.
    async fn submit(&self, calls: &[CallDescriptor]) -> Result<Felt>;

    /// `None` while the transaction is not yet known to the node.
    async fn receipt(&self, tx_hash: Felt) -> Result<Option<TxOutcome>>;

    async fn randomness_ready(&self, salt: Felt) -> Result<bool>;

    /// Game token minted by a purchase transaction.
    async fn purchased_game_id(&self, tx_hash: Felt) -> Result<Option<u64>>;
}

pub fn felt_to_u64(value: Felt) -> Option<u64> {
    u64::try_from(value).ok()
}

pub fn parse_felt(field: &str, raw: &str) -> Result<Felt> {
    let trimmed = raw.trim();
    let parsed = if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        Felt::from_hex(trimmed)
    } else {
        Felt::from_dec_str(trimmed)
    };
    parsed.map_err(|e| {
        BotError::Config(format!("{} is not a field element ({}): {}", field, raw, e))
    })
}

fn selector(entrypoint: &str) -> Result<Felt> {
    get_selector_from_name(entrypoint)
        .map_err(|e| BotError::Submission(format!("Bad entrypoint {}: {}", entrypoint, e)))
}

fn to_call(descriptor: &CallDescriptor) -> Result<Call> {
    let calldata = descriptor
        .calldata
        .iter()
        .map(|word| {
            Felt::from_dec_str(word)
                .map_err(|e| BotError::Submission(format!("Bad calldata word {}: {}", word, e)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Call {
        to: descriptor.contract_address,
        selector: selector(descriptor.entrypoint)?,
        calldata,
    })
}

/// Token id of the first ERC-721 mint (`Transfer` from the zero address) in `events`.
pub fn minted_token_id(events: &[Event]) -> Option<u64> {
    let transfer = get_selector_from_name("Transfer").ok()?;
    events.iter().find_map(|event| match event.keys.as_slice() {
        [key, from, _to, token_low, ..] if *key == transfer && *from == Felt::ZERO => {
            felt_to_u64(*token_low)
        }
        _ => None,
    })
}

fn provider_error(context: &str, e: ProviderError) -> BotError {
    BotError::Provider(format!("{}: {}", context, e))
}

type RpcProvider = JsonRpcClient<HttpTransport>;

pub struct StarknetClient {
    provider: RpcProvider,
    /// Absent when connected without a signing key; reads still work.
    account: Option<SingleOwnerAccount<RpcProvider, LocalWallet>>,
    game: Felt,
    vrf_provider: Felt,
    state_selector: Felt,
    vrf_status_selector: Felt,
}

impl StarknetClient {
    pub async fn connect(config: &BotConfig, private_key: Option<&str>) -> Result<Self> {
        let url = Url::parse(&config.rpc_url)
            .map_err(|e| BotError::Config(format!("Invalid RPC URL {}: {}", config.rpc_url, e)))?;
        let provider = JsonRpcClient::new(HttpTransport::new(url.clone()));

        let account = match private_key {
            Some(key) => {
                let chain_id = provider
                    .chain_id()
                    .await
                    .map_err(|e| provider_error("chain id", e))?;
                let secret = parse_felt("private_key", key)?;
                let signer = LocalWallet::from(SigningKey::from_secret_scalar(secret));
                let address = parse_felt("account_address", &config.account_address)?;
                let signing_provider = JsonRpcClient::new(HttpTransport::new(url));
                info!("Connected to {} as {:#x}", config.rpc_url, address);
                Some(SingleOwnerAccount::new(
                    signing_provider,
                    signer,
                    address,
                    chain_id,
                    ExecutionEncoding::New,
                ))
            }
            None => {
                info!("Connected to {} (read only)", config.rpc_url);
                None
            }
        };

        let addresses = config.contracts.addresses()?;
        Ok(Self {
            provider,
            account,
            game: addresses.game,
            vrf_provider: addresses.vrf_provider,
            state_selector: selector(&config.state_entrypoint)?,
            vrf_status_selector: selector(&config.vrf_status_entrypoint)?,
        })
    }

    /// Address of the signing account, if any.
    pub fn address(&self) -> Option<Felt> {
        self.account.as_ref().map(|a| a.address())
    }

    async fn view(
        &self,
        contract: Felt,
        entry_point_selector: Felt,
        calldata: Vec<Felt>,
    ) -> Result<Vec<Felt>> {
        self.provider
            .call(
                FunctionCall {
                    contract_address: contract,
                    entry_point_selector,
                    calldata,
                },
                BlockId::Tag(BlockTag::Latest),
            )
            .await
            .map_err(|e| provider_error("view call", e))
    }

    async fn receipt_events(&self, tx_hash: Felt) -> Result<Vec<Event>> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| provider_error("receipt", e))?;
        Ok(match receipt.receipt {
            TransactionReceipt::Invoke(r) => r.events,
            _ => Vec::new(),
        })
    }
}

#[async_trait]
impl ChainClient for StarknetClient {
    async fn fetch_state(&self, game_id: u64) -> Result<GameState> {
        let words = self
            .view(self.game, self.state_selector, vec![Felt::from(game_id)])
            .await?;
        let hex: Vec<String> = words.iter().map(|w| format!("{:#x}", w)).collect();
        debug!("Game {} state: {} words", game_id, hex.len());
        Ok(GameState::decode(game_id, &hex)?)
    }

    async fn submit(&self, calls: &[CallDescriptor]) -> Result<Felt> {
        let account = self
            .account
            .as_ref()
            .ok_or_else(|| BotError::Config("No signing key configured".to_string()))?;
        let calls = calls.iter().map(to_call).collect::<Result<Vec<_>>>()?;
        let result = account
            .execute_v3(calls)
            .send()
            .await
            .map_err(|e| BotError::Submission(e.to_string()))?;
        Ok(result.transaction_hash)
    }

    async fn receipt(&self, tx_hash: Felt) -> Result<Option<TxOutcome>> {
        match self.provider.get_transaction_receipt(tx_hash).await {
            Ok(receipt) => Ok(Some(match receipt.receipt.execution_result() {
                ExecutionResult::Succeeded => TxOutcome::Succeeded,
                ExecutionResult::Reverted { reason } => TxOutcome::Reverted(reason.clone()),
            })),
            Err(ProviderError::StarknetError(StarknetError::TransactionHashNotFound)) => Ok(None),
            Err(e) => Err(provider_error("receipt", e)),
        }
    }

    async fn randomness_ready(&self, salt: Felt) -> Result<bool> {
        // Source::Salt(salt)
        let result = self
            .view(self.vrf_provider, self.vrf_status_selector, vec![Felt::ONE, salt])
            .await?;
        Ok(result.first().map(|v| *v != Felt::ZERO).unwrap_or(false))
    }

    async fn purchased_game_id(&self, tx_hash: Felt) -> Result<Option<u64>> {
        let events = self.receipt_events(tx_hash).await?;
        Ok(minted_token_id(&events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calls::fixtures::builder;
    use crate::calls::GameAction;

    #[test]
    fn test_felt_to_u64() {
        assert_eq!(felt_to_u64(Felt::from(42u64)), Some(42));
        assert_eq!(felt_to_u64(Felt::from(u64::MAX)), Some(u64::MAX));
        assert_eq!(felt_to_u64(Felt::from(u64::MAX) + Felt::ONE), None);
    }

    #[test]
    fn test_parse_felt_accepts_hex_and_decimal() {
        assert_eq!(parse_felt("x", "0x10").unwrap(), Felt::from(16u64));
        assert_eq!(parse_felt("x", " 16 ").unwrap(), Felt::from(16u64));
        assert!(matches!(parse_felt("x", "sixteen"), Err(BotError::Config(_))));
    }

    #[test]
    fn test_descriptor_to_call() {
        let descriptor = builder().build(&GameAction::Attack {
            game_id: 9,
            to_the_death: true,
        });
        let call = to_call(&descriptor).unwrap();
        assert_eq!(call.to, descriptor.contract_address);
        assert_eq!(call.selector, get_selector_from_name("attack").unwrap());
        assert_eq!(call.calldata, vec![Felt::from(9u64), Felt::ONE]);
    }

    #[test]
    fn test_minted_token_id_reads_mint_transfer() {
        let transfer = get_selector_from_name("Transfer").unwrap();
        let approval = get_selector_from_name("Approval").unwrap();
        let owner = Felt::from(0xabcu64);
        let events = vec![
            Event {
                from_address: Felt::from(1u64),
                keys: vec![approval, owner, owner, Felt::from(5u64), Felt::ZERO],
                data: vec![],
            },
            Event {
                from_address: Felt::from(1u64),
                keys: vec![transfer, Felt::ZERO, owner, Felt::from(314u64), Felt::ZERO],
                data: vec![],
            },
        ];
        assert_eq!(minted_token_id(&events), Some(314));

        let plain_transfer = vec![Event {
            from_address: Felt::from(1u64),
            keys: vec![transfer, owner, Felt::from(2u64), Felt::from(3u64), Felt::ZERO],
            data: vec![],
        }];
        assert_eq!(minted_token_id(&plain_transfer), None);
    }
}
