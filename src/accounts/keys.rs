//! Account construction from seed phrases and raw private keys.

use crate::accounts::Account;
use crate::error::KeyError;
use ethers::signers::{coins_bip39::English, LocalWallet, MnemonicBuilder, Signer};
use ethers::types::Address;
use std::collections::BTreeMap;

/// Build the source account set from all configured key material.
///
/// Accounts are deduplicated by address (a raw key may belong to a derived
/// account, and phrases can overlap) and returned in ascending address
/// order so downstream planning is deterministic. Balances, nonces and gas
/// budgets start zeroed; the snapshot fills them in.
pub fn collect_accounts(
    mnemonics: &[String],
    private_keys: &[String],
    accounts_per_level: usize,
) -> Result<Vec<Account>, KeyError> {
    let mut by_address: BTreeMap<Address, LocalWallet> = BTreeMap::new();

    for mnemonic in mnemonics {
        for wallet in derive_from_mnemonic(mnemonic, accounts_per_level)? {
            by_address.insert(wallet.address(), wallet);
        }
    }

    for key in private_keys {
        let wallet = from_private_key(key)?;
        by_address.insert(wallet.address(), wallet);
    }

    Ok(by_address.into_values().map(Account::new).collect())
}

/// Derive candidate wallets from one seed phrase.
///
/// There is no single convention for which BIP-44 level varies between
/// accounts: MetaMask bumps the address index while several mobile wallets
/// bump the change level. Both levels are scanned, yielding
/// `accounts_per_level` squared candidates per phrase; candidates that were
/// never used on chain get dropped later when the snapshot finds neither
/// balance nor tokens.
fn derive_from_mnemonic(
    mnemonic: &str,
    accounts_per_level: usize,
) -> Result<Vec<LocalWallet>, KeyError> {
    if mnemonic.is_empty() {
        return Err(KeyError::InvalidMnemonic {
            reason: "empty phrase".into(),
        });
    }

    let mut wallets = Vec::with_capacity(accounts_per_level * accounts_per_level);
    for change in 0..accounts_per_level {
        for index in 0..accounts_per_level {
            let path = format!("m/44'/60'/0'/{change}/{index}");
            let wallet = MnemonicBuilder::<English>::default()
                .phrase(mnemonic)
                .derivation_path(&path)
                .map_err(|e| KeyError::Derivation {
                    path: path.clone(),
                    reason: e.to_string(),
                })?
                .build()
                .map_err(|e| KeyError::InvalidMnemonic {
                    reason: e.to_string(),
                })?;
            wallets.push(wallet);
        }
    }

    Ok(wallets)
}

fn from_private_key(key: &str) -> Result<LocalWallet, KeyError> {
    let key = key.strip_prefix("0x").unwrap_or(key);
    key.parse::<LocalWallet>()
        .map_err(|e| KeyError::InvalidPrivateKey {
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known development mnemonic (Anvil / Hardhat default).
    const TEST_MNEMONIC: &str =
        "test test test test test test test test test test test junk";
    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    // Address of both TEST_KEY and TEST_MNEMONIC at m/44'/60'/0'/0/0.
    const FIRST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn derives_known_vector() {
        let accounts = collect_accounts(&[TEST_MNEMONIC.into()], &[], 1).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(
            format!("{:?}", accounts[0].address).to_lowercase(),
            FIRST_ADDRESS
        );
    }

    #[test]
    fn scans_both_derivation_levels() {
        let accounts = collect_accounts(&[TEST_MNEMONIC.into()], &[], 2).unwrap();
        // 2 changes x 2 indexes, all distinct.
        assert_eq!(accounts.len(), 4);
    }

    #[test]
    fn dedupes_by_address() {
        // The raw key is the same account as the phrase's first derivation.
        let accounts = collect_accounts(
            &[TEST_MNEMONIC.into()],
            &[TEST_KEY.into(), format!("0x{TEST_KEY}")],
            1,
        )
        .unwrap();
        assert_eq!(accounts.len(), 1);
    }

    #[test]
    fn accounts_come_out_address_ordered() {
        let accounts = collect_accounts(&[TEST_MNEMONIC.into()], &[], 3).unwrap();
        let addresses: Vec<_> = accounts.iter().map(|a| a.address).collect();
        let mut sorted = addresses.clone();
        sorted.sort();
        assert_eq!(addresses, sorted);
    }

    #[test]
    fn rejects_invalid_mnemonic() {
        let result = collect_accounts(&["definitely not a seed phrase".into()], &[], 1);
        assert!(matches!(result, Err(KeyError::InvalidMnemonic { .. })));
    }

    #[test]
    fn rejects_invalid_private_key() {
        let result = collect_accounts(&[], &["0xnothex".into()], 1);
        assert!(matches!(result, Err(KeyError::InvalidPrivateKey { .. })));
    }
}
