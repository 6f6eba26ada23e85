//! Oracle deployment, network and transaction configuration.
//!
//! The oracle may be redeployed at a different address per network, so every
//! on-chain name the SDK touches is carried by [`OracleConfig`] rather than
//! hard-coded at the call sites.

use std::time::Duration;

use crate::types::{AccountAddress, NetworkInfo};

/// Default deployment of the first oracle version,
/// `0x16e91756990842e0848b11cbbd5671a522af7f6af1fdc98fcee09082f50f300e`.
pub const ORACLE_V1_ADDRESS: AccountAddress = AccountAddress::new([
    0x16, 0xe9, 0x17, 0x56, 0x99, 0x08, 0x42, 0xe0, 0x84, 0x8b, 0x11, 0xcb, 0xbd, 0x56, 0x71, 0xa5,
    0x22, 0xaf, 0x7f, 0x6a, 0xf1, 0xfd, 0xc9, 0x8f, 0xce, 0xe0, 0x90, 0x82, 0xf5, 0x0f, 0x30, 0x0e,
]);
/// Default deployment of the second oracle version,
/// `0xab81318c79a3b65a1f23354494793fcc6c4fa44a69d0c0e656b7b1454ddd1bbf`.
pub const ORACLE_V2_ADDRESS: AccountAddress = AccountAddress::new([
    0xab, 0x81, 0x31, 0x8c, 0x79, 0xa3, 0xb6, 0x5a, 0x1f, 0x23, 0x35, 0x44, 0x94, 0x79, 0x3f, 0xcc,
    0x6c, 0x4f, 0xa4, 0x4a, 0x69, 0xd0, 0xc0, 0xe6, 0x56, 0xb7, 0xb1, 0x45, 0x4d, 0xdd, 0x1b, 0xbf,
]);

/// Oracle contract generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleVersion {
    /// Request-only module `vrf`.
    V1,
    /// Module `vrf_v2` with a per-user treasury and callback requests.
    V2,
}

impl OracleVersion {
    /// Module that exposes the entry functions.
    pub fn module(&self) -> &'static str {
        match self {
            OracleVersion::V1 => "vrf",
            OracleVersion::V2 => "vrf_v2",
        }
    }

    pub fn default_address(&self) -> AccountAddress {
        match self {
            OracleVersion::V1 => ORACLE_V1_ADDRESS,
            OracleVersion::V2 => ORACLE_V2_ADDRESS,
        }
    }

    /// Whether the treasury and callback entry functions exist.
    pub fn supports_treasury(&self) -> bool {
        matches!(self, OracleVersion::V2)
    }

    /// Parse `v1` / `v2` (case-insensitive, `v` optional).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().trim_start_matches(['v', 'V']) {
            "1" => Some(OracleVersion::V1),
            "2" => Some(OracleVersion::V2),
            _ => None,
        }
    }
}

/// Where the per-account randomness table lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    /// Resource type suffix, appended to the oracle address
    /// (`vrf::RandomnessStore` becomes `0x...::vrf::RandomnessStore`).
    pub resource: String,
    /// Path of JSON fields leading to the table handle inside the resource.
    pub handle_path: Vec<String>,
}

impl StoreLayout {
    pub fn new(resource: impl Into<String>, handle_path: &[&str]) -> Self {
        Self {
            resource: resource.into(),
            handle_path: handle_path.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn for_version(version: OracleVersion) -> Self {
        match version {
            OracleVersion::V1 => Self::new("vrf::RandomnessData", &["seeds", "handle"]),
            OracleVersion::V2 => Self::new("vrf::RandomnessStore", &["data", "handle"]),
        }
    }
}

/// One oracle deployment: address, version and on-chain names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleConfig {
    pub address: AccountAddress,
    pub version: OracleVersion,
    /// Module holding the entry functions.
    pub module: String,
    pub store: StoreLayout,
    /// Resource type suffix of the oracle's global state (fee, coin, treasury).
    pub state_resource: String,
}

impl OracleConfig {
    pub fn new(version: OracleVersion) -> Self {
        Self {
            address: version.default_address(),
            version,
            module: version.module().to_string(),
            store: StoreLayout::for_version(version),
            state_resource: "vrf::Vrf".to_string(),
        }
    }

    pub fn with_address(mut self, address: AccountAddress) -> Self {
        self.address = address;
        self
    }

    pub fn with_store(mut self, store: StoreLayout) -> Self {
        self.store = store;
        self
    }

    /// Fully-qualified entry function id, `0x...::module::function`.
    pub fn function_id(&self, function: &str) -> String {
        format!("{}::{}::{}", self.address, self.module, function)
    }

    /// Fully-qualified resource type for a suffix such as `vrf::Vrf`.
    pub fn resource_type(&self, suffix: &str) -> String {
        format!("{}::{}", self.address, suffix)
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self::new(OracleVersion::V2)
    }
}

/// Public ledger instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
    Local,
}

impl Network {
    /// Case-insensitive lookup. Unknown names map to [`Network::Local`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Network::Mainnet,
            "testnet" => Network::Testnet,
            "devnet" => Network::Devnet,
            _ => Network::Local,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "Mainnet",
            Network::Testnet => "Testnet",
            Network::Devnet => "Devnet",
            Network::Local => "Local",
        }
    }

    pub fn node_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://fullnode.mainnet.aptoslabs.com",
            Network::Testnet => "https://fullnode.testnet.aptoslabs.com",
            Network::Devnet => "https://fullnode.devnet.aptoslabs.com",
            Network::Local => "http://localhost:8080",
        }
    }

    /// Faucet endpoint, where the network has one.
    pub fn faucet_url(&self) -> Option<&'static str> {
        match self {
            Network::Mainnet => None,
            Network::Testnet => Some("https://faucet.testnet.aptoslabs.com"),
            Network::Devnet => Some("https://faucet.devnet.aptoslabs.com"),
            Network::Local => Some("http://localhost:8081"),
        }
    }

    /// Well-known chain id; devnet and local chains are reset and vary.
    pub fn chain_id(&self) -> Option<u8> {
        match self {
            Network::Mainnet => Some(1),
            Network::Testnet => Some(2),
            Network::Devnet | Network::Local => None,
        }
    }

    pub fn descriptor(&self) -> NetworkDescriptor {
        NetworkDescriptor {
            api: self.node_url().to_string(),
            chain_id: self.chain_id(),
            name: self.name().to_string(),
        }
    }
}

/// Which ledger instance a session talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDescriptor {
    /// REST endpoint of a full node.
    pub api: String,
    pub chain_id: Option<u8>,
    pub name: String,
}

impl From<NetworkInfo> for NetworkDescriptor {
    fn from(info: NetworkInfo) -> Self {
        Self {
            api: info.api,
            chain_id: info.chain_id.parse().ok(),
            name: info.name,
        }
    }
}

/// Gas and timing parameters for locally signed transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOptions {
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    /// Seconds from now after which the chain drops the transaction.
    pub expiration_secs: u64,
    /// How long to wait for inclusion after submission.
    pub confirmation_timeout: Duration,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            max_gas_amount: 5_000,
            gas_unit_price: 100,
            expiration_secs: 10,
            confirmation_timeout: Duration::from_secs(60),
        }
    }
}

/// Polling behaviour of the fulfillment waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub poll_interval: Duration,
    /// Overall bound on the wait; `None` waits until fulfilled or cancelled.
    pub timeout: Option<Duration>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_selects_module_and_layout() {
        let v1 = OracleConfig::new(OracleVersion::V1);
        assert_eq!(v1.module, "vrf");
        assert_eq!(v1.address, ORACLE_V1_ADDRESS);
        assert_eq!(v1.store.handle_path, vec!["seeds", "handle"]);

        let v2 = OracleConfig::default();
        assert_eq!(v2.version, OracleVersion::V2);
        assert_eq!(
            v2.function_id("request"),
            format!("{ORACLE_V2_ADDRESS}::vrf_v2::request")
        );
        assert_eq!(
            v2.resource_type(&v2.store.resource),
            format!("{ORACLE_V2_ADDRESS}::vrf::RandomnessStore")
        );
    }

    #[test]
    fn default_addresses_match_deployments() {
        assert_eq!(
            OracleVersion::V1.default_address(),
            AccountAddress::from_hex_literal(
                "0x16e91756990842e0848b11cbbd5671a522af7f6af1fdc98fcee09082f50f300e"
            )
            .unwrap()
        );
        assert_eq!(
            OracleVersion::V2.default_address(),
            AccountAddress::from_hex_literal(
                "0xab81318c79a3b65a1f23354494793fcc6c4fa44a69d0c0e656b7b1454ddd1bbf"
            )
            .unwrap()
        );
    }

    #[test]
    fn address_override_keeps_names() {
        let addr = AccountAddress::from_hex_literal("0xcafe").unwrap();
        let config = OracleConfig::new(OracleVersion::V2).with_address(addr);
        assert!(config.function_id("deposit").ends_with("::vrf_v2::deposit"));
        assert!(config.function_id("deposit").starts_with(&addr.to_hex_literal()));
    }

    #[test]
    fn version_names() {
        assert_eq!(OracleVersion::from_name("v1"), Some(OracleVersion::V1));
        assert_eq!(OracleVersion::from_name("V2"), Some(OracleVersion::V2));
        assert_eq!(OracleVersion::from_name("2"), Some(OracleVersion::V2));
        assert_eq!(OracleVersion::from_name("v3"), None);
    }

    #[test]
    fn unknown_network_names_fall_back_to_local() {
        assert_eq!(Network::from_name("Mainnet"), Network::Mainnet);
        assert_eq!(Network::from_name("testnet"), Network::Testnet);
        assert_eq!(Network::from_name("custom"), Network::Local);
        assert_eq!(Network::Local.node_url(), "http://localhost:8080");
        assert_eq!(Network::Mainnet.faucet_url(), None);
    }

    #[test]
    fn wallet_network_info_converts() {
        let descriptor = NetworkDescriptor::from(NetworkInfo {
            api: "https://fullnode.testnet.aptoslabs.com".into(),
            chain_id: "2".into(),
            name: "Testnet".into(),
        });
        assert_eq!(descriptor, Network::Testnet.descriptor());
    }

    #[test]
    fn defaults() {
        let tx = TransactionOptions::default();
        assert_eq!(tx.max_gas_amount, 5_000);
        assert_eq!(tx.gas_unit_price, 100);
        assert_eq!(WaitOptions::default().poll_interval, Duration::from_millis(1000));
        assert!(WaitOptions::default().timeout.is_none());
    }
}
