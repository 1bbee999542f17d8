pub mod burrow_tvl;
pub mod num_accounts;
mod oracle;
pub mod oracle_prices;
pub mod ref_prices;
pub mod usn_treasury;

use chain::ChainError;
use chain::adapter::near::{self, NearRpc};
use data::chart::{LendingSide, MetricSelector};

use serde_json::Value;

/// The dashboards this app can sample. Each variant supplies its own metric
/// evaluator; the sampling core underneath is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Variant {
    /// Burrow lending market: per-token deposits and borrows
    BurrowTvl,
    /// USN stablecoin treasury composition
    UsnTreasury,
    /// REF Finance pool prices
    RefPrices,
    /// Raw price-oracle feed (testnet)
    OraclePrices,
    /// Burrow registered-account counter
    BurrowAccounts,
}

impl Variant {
    pub fn title(self) -> &'static str {
        match self {
            Variant::BurrowTvl => burrow_tvl::TITLE,
            Variant::UsnTreasury => usn_treasury::TITLE,
            Variant::RefPrices => ref_prices::TITLE,
            Variant::OraclePrices => oracle_prices::TITLE,
            Variant::BurrowAccounts => num_accounts::TITLE,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Variant::BurrowTvl => "burrow-tvl",
            Variant::UsnTreasury => "usn-treasury",
            Variant::RefPrices => "ref-prices",
            Variant::OraclePrices => "oracle-prices",
            Variant::BurrowAccounts => "burrow-accounts",
        }
    }

    /// The oracle-prices dashboard reads testnet contracts; everything else
    /// lives on mainnet.
    pub fn default_endpoint(self) -> &'static str {
        match self {
            Variant::OraclePrices => near::TESTNET_ARCHIVAL_DOMAIN,
            _ => near::MAINNET_ARCHIVAL_DOMAIN,
        }
    }

    pub fn selector(self, side: LendingSide, in_usd: bool) -> MetricSelector {
        match self {
            Variant::BurrowTvl => MetricSelector::Lending { side, in_usd },
            _ => MetricSelector::Scalar,
        }
    }

    pub async fn evaluate(self, rpc: &NearRpc, block_height: u64) -> Result<Value, ChainError> {
        match self {
            Variant::BurrowTvl => burrow_tvl::compute_value(rpc, block_height).await,
            Variant::UsnTreasury => usn_treasury::compute_value(rpc, block_height).await,
            Variant::RefPrices => ref_prices::compute_value(rpc, block_height).await,
            Variant::OraclePrices => oracle_prices::compute_value(rpc, block_height).await,
            Variant::BurrowAccounts => num_accounts::compute_value(rpc, block_height).await,
        }
    }
}
