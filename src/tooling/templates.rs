//! Built-in transaction templates.

use std::collections::BTreeMap;

use crate::blockchain::cadence::{CadenceValue, UFIX64_SCALE};
use crate::blockchain::types::{HashAlgorithm, SignatureAlgorithm};

/// Weight that lets a single key authorize on its own.
pub const FULL_KEY_WEIGHT: u64 = 1000;

/// Creates an account paid for by the signer, adds one key and deploys
/// the given contracts (name to hex-encoded code).
pub const CREATE_ACCOUNT: &str = r#"transaction(publicKey: String, signatureAlgorithm: UInt8, hashAlgorithm: UInt8, weight: UFix64, contracts: {String: String}) {
    prepare(signer: auth(BorrowValue) &Account) {
        let key = PublicKey(
            publicKey: publicKey.decodeHex(),
            signatureAlgorithm: SignatureAlgorithm(rawValue: signatureAlgorithm)!
        )
        let account = Account(payer: signer)
        account.keys.add(
            publicKey: key,
            hashAlgorithm: HashAlgorithm(rawValue: hashAlgorithm)!,
            weight: weight
        )
        for name in contracts.keys {
            account.contracts.add(name: name, code: contracts[name]!.decodeHex())
        }
    }
}
"#;

/// Arguments for [`CREATE_ACCOUNT`].
pub fn create_account_arguments(
    public_key_hex: &str,
    sig_algo: SignatureAlgorithm,
    hash_algo: HashAlgorithm,
    contracts: &BTreeMap<String, Vec<u8>>,
) -> Vec<CadenceValue> {
    let contracts = contracts
        .iter()
        .map(|(name, code)| (CadenceValue::String(name.clone()), CadenceValue::String(hex::encode(code))))
        .collect();

    vec![
        CadenceValue::String(public_key_hex.to_string()),
        CadenceValue::UInt8(sig_algo.cadence_raw_value()),
        CadenceValue::UInt8(hash_algo.cadence_raw_value()),
        CadenceValue::UFix64(FULL_KEY_WEIGHT * UFIX64_SCALE),
        CadenceValue::Dictionary(contracts),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_account_arguments() {
        let mut contracts = BTreeMap::new();
        contracts.insert("Hello".to_string(), b"hi".to_vec());

        let args = create_account_arguments("abcd", SignatureAlgorithm::EcdsaP256, HashAlgorithm::Sha3_256, &contracts);
        assert_eq!(args.len(), 5);
        assert_eq!(args[1], CadenceValue::UInt8(1));
        assert_eq!(args[2], CadenceValue::UInt8(3));
        assert_eq!(args[3].to_json()["value"], "1000.00000000");
        assert_eq!(
            args[4],
            CadenceValue::Dictionary(vec![(
                CadenceValue::String("Hello".to_string()),
                CadenceValue::String("6869".to_string())
            )])
        );
    }

    #[test]
    fn test_template_declares_every_argument() {
        for name in ["publicKey", "signatureAlgorithm", "hashAlgorithm", "weight", "contracts"] {
            assert!(CREATE_ACCOUNT.contains(&format!("{}:", name)));
        }
    }
}
