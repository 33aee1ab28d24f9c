//! ERC-20 helpers: `transfer` calldata encoding and metadata queries.

use anyhow::Result;
use ethers::abi::Abi;
use ethers::contract::Contract;
use ethers::providers::{Http, Provider};
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::keccak256;
use std::sync::Arc;

const TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";
const TRANSFER_EVENT_SIGNATURE: &str = "Transfer(address,address,uint256)";

const ERC20_ABI: &str = r#"[
    {"type":"function","name":"balanceOf","stateMutability":"view","inputs":[{"name":"owner","type":"address"}],"outputs":[{"name":"","type":"uint256"}]},
    {"type":"function","name":"symbol","stateMutability":"view","inputs":[],"outputs":[{"name":"","type":"string"}]},
    {"type":"function","name":"decimals","stateMutability":"view","inputs":[],"outputs":[{"name":"","type":"uint8"}]}
]"#;

/// Four-byte selector of `transfer(address,uint256)`.
pub fn transfer_selector() -> [u8; 4] {
    let hash = keccak256(TRANSFER_SIGNATURE.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash[..4]);
    selector
}

/// Topic 0 of the standard `Transfer` event.
pub fn transfer_event_topic() -> H256 {
    H256::from(keccak256(TRANSFER_EVENT_SIGNATURE.as_bytes()))
}

/// Calldata moving `amount` raw token units to `destination`: selector,
/// then the destination right-aligned in 32 bytes, then the amount as a
/// 32-byte big-endian integer.
pub fn transfer_calldata(destination: Address, amount: U256) -> Bytes {
    let mut data = Vec::with_capacity(68);
    data.extend_from_slice(&transfer_selector());
    data.extend_from_slice(H256::from(destination).as_bytes());
    let mut amount_be = [0u8; 32];
    amount.to_big_endian(&mut amount_be);
    data.extend_from_slice(&amount_be);
    Bytes::from(data)
}

/// Read-only view of one token contract.
pub struct Erc20 {
    contract: Contract<Provider<Http>>,
}

impl Erc20 {
    pub fn new(contract_address: Address, provider: Arc<Provider<Http>>) -> Result<Self> {
        let abi: Abi = serde_json::from_str(ERC20_ABI)?;
        Ok(Self {
            contract: Contract::new(contract_address, abi, provider),
        })
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        Ok(self
            .contract
            .method::<_, U256>("balanceOf", owner)?
            .call()
            .await?)
    }

    /// Token symbol, `"???"` when the contract does not answer.
    pub async fn symbol(&self) -> String {
        match self.contract.method::<_, String>("symbol", ()) {
            Ok(call) => call.call().await.unwrap_or_else(|_| "???".into()),
            Err(_) => "???".into(),
        }
    }

    /// Token decimals, 0 when the contract does not answer.
    pub async fn decimals(&self) -> u8 {
        match self.contract.method::<_, u8>("decimals", ()) {
            Ok(call) => call.call().await.unwrap_or(0),
            Err(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn selector_matches_known_value() {
        assert_eq!(transfer_selector(), [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn event_topic_matches_known_value() {
        assert_eq!(
            transfer_event_topic(),
            H256::from_str("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")
                .unwrap()
        );
    }

    #[test]
    fn calldata_layout_is_bit_exact() {
        let destination =
            Address::from_str("0x1111111111111111111111111111111111111111").unwrap();
        let data = transfer_calldata(destination, U256::from(0x0102u64));

        assert_eq!(data.len(), 68);
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        // Address right-aligned in a 32-byte field.
        assert_eq!(&data[4..16], &[0u8; 12]);
        assert_eq!(&data[16..36], destination.as_bytes());
        // Amount big-endian, right-aligned.
        assert_eq!(&data[36..66], &[0u8; 30]);
        assert_eq!(&data[66..], &[0x01, 0x02]);
    }

    #[test]
    fn calldata_max_amount_round_trips() {
        let destination = Address::zero();
        let data = transfer_calldata(destination, U256::MAX);
        assert_eq!(&data[36..], &[0xffu8; 32]);
    }
}
