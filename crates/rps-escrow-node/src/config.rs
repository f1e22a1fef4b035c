//! Node configuration from environment variables.

use rps_escrow_core::protocol::AddressError;
use rps_escrow_core::Address;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a port number, got {0:?}")]
    InvalidPort(String),

    #[error("{var} is not a valid address: {source}")]
    InvalidAddress {
        var: &'static str,
        #[source]
        source: AddressError,
    },
}

/// Settings for one dev node
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeConfig {
    pub port: u16,
    /// Token the contract wagers in
    pub token: Address,
    /// Account that holds stakes between join and payout
    pub escrow: Address,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            token: Address::repeat_byte(0x70),
            escrow: Address::repeat_byte(0xee),
        }
    }
}

impl NodeConfig {
    /// Read `PORT`, `RPS_TOKEN_ADDRESS` and `RPS_ESCROW_ADDRESS`, falling back
    /// to defaults for unset variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(value))?,
            None => defaults.port,
        };

        Ok(Self {
            port,
            token: address_var(&lookup, "RPS_TOKEN_ADDRESS")?.unwrap_or(defaults.token),
            escrow: address_var(&lookup, "RPS_ESCROW_ADDRESS")?.unwrap_or(defaults.escrow),
        })
    }
}

fn address_var(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<Address>, ConfigError> {
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidAddress { var, source })
        })
        .transpose()
}
