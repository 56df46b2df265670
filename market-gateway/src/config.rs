//! Gateway configuration

use order_engine::{StockRecord, StockStore};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HTTP bind address
    pub bind_addr: String,

    /// Hex-encoded Ed25519 public key of the payment gateway; an ephemeral
    /// key pair is generated when absent (local runs only)
    pub gateway_public_key: Option<String>,

    /// Ledger configuration
    pub ledger: ledger_core::Config,

    /// Products to seed into the stock store at startup
    #[serde(default)]
    pub seed_products: Vec<SeedProduct>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            gateway_public_key: None,
            ledger: ledger_core::Config::default(),
            seed_products: Vec::new(),
        }
    }
}

/// One product seeded at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedProduct {
    /// Product id
    pub product_id: Uuid,

    /// Product title
    pub title: String,

    /// Owning farmer
    pub farmer_id: Uuid,

    /// Initial quantity
    pub quantity: u32,

    /// Unit price
    pub price: Decimal,
}

impl GatewayConfig {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GatewayConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = GatewayConfig::default();

        if let Ok(addr) = std::env::var("BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Ok(key) = std::env::var("GATEWAY_PUBLIC_KEY") {
            config.gateway_public_key = Some(key);
        }

        config.ledger = ledger_core::Config::from_env()?;

        Ok(config)
    }

    /// Seed the stock store with configured products
    pub fn seed(&self, stock: &StockStore) {
        for product in &self.seed_products {
            stock.insert(StockRecord {
                product_id: product.product_id,
                title: product.title.clone(),
                farmer_id: product.farmer_id,
                quantity: product.quantity,
                price: product.price,
            });
        }

        if !self.seed_products.is_empty() {
            tracing::info!(count = self.seed_products.len(), "Stock store seeded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_products_parse() {
        let toml_text = r#"
            bind_addr = "127.0.0.1:9999"

            [ledger]
            data_dir = "/tmp/ledger-test"
            service_name = "ledger-core"
            service_version = "0.1.0"
            append_timeout_ms = 2000

            [ledger.rocksdb]
            write_buffer_size_mb = 64
            max_write_buffer_number = 4
            target_file_size_mb = 64
            max_background_jobs = 4

            [[seed_products]]
            product_id = "9b2f9d88-6b9a-4f82-9f2e-3c1f0a14d2a1"
            title = "Red onions"
            farmer_id = "7c0a1db0-52cf-4f3e-9d3a-2c7c3a2bd111"
            quantity = 40
            price = "1.25"
        "#;

        let config: GatewayConfig = toml::from_str(toml_text).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9999");
        assert_eq!(config.seed_products.len(), 1);
        assert_eq!(config.seed_products[0].quantity, 40);

        let stock = StockStore::new();
        config.seed(&stock);
        assert_eq!(stock.len(), 1);
    }
}
