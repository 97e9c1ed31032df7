//! Process configuration: CLI flags via `argh`, overridable by environment
//! variables, optionally loaded from a local `.env` file.

use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use argh::FromArgs;

/// The mixing relayer server.
#[derive(FromArgs, Debug)]
pub struct Cli {
    /// address to bind the Control Surface HTTP listener on
    #[argh(option)]
    pub bind_addr: Option<SocketAddr>,

    /// path to a `.env` file to load before reading environment variables
    #[argh(option)]
    pub env_file: Option<String>,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub master_key_hex: String,
    pub database_url: String,
    pub solana_rpc_url: String,
    pub network: Network,
    pub treasury_secret_key_base58: Option<String>,
    pub fee_wallet_pubkey_base58: Option<String>,
    pub bind_addr: SocketAddr,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Network {
    MainnetBeta,
    Devnet,
    Testnet,
}

impl std::str::FromStr for Network {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mainnet-beta" => Ok(Self::MainnetBeta),
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            other => anyhow::bail!("unknown RELAYER_NETWORK: {other}"),
        }
    }
}

impl Network {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MainnetBeta => "mainnet-beta",
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

impl Config {
    /// Loads configuration from CLI flags layered over environment
    /// variables, after optionally loading a `.env` file named by
    /// `--env-file` (defaulting to `.env` in the working directory, ignored
    /// if absent).
    pub fn load(cli: &Cli) -> Result<Self> {
        match &cli.env_file {
            Some(path) => {
                dotenvy::from_filename(path)
                    .with_context(|| format!("failed to load {path}"))?;
            }
            None => {
                // Missing `.env` in the working directory is not an error.
                let _ = dotenvy::dotenv();
            }
        }

        let master_key_hex = require_env("RELAYER_MASTER_KEY_HEX")?;
        let database_url = require_env("DATABASE_URL")?;
        let solana_rpc_url = require_env("SOLANA_RPC_URL")?;
        let network: Network = require_env("RELAYER_NETWORK")?.parse()?;
        let treasury_secret_key_base58 = env::var("RELAYER_TREASURY_SECRET_KEY").ok();
        let fee_wallet_pubkey_base58 = env::var("RELAYER_FEE_WALLET_PUBKEY").ok();

        let bind_addr = match cli.bind_addr {
            Some(addr) => addr,
            None => env::var("RELAYER_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
                .parse()
                .context("invalid RELAYER_BIND_ADDR")?,
        };

        Ok(Self {
            master_key_hex,
            database_url,
            solana_rpc_url,
            network,
            treasury_secret_key_base58,
            fee_wallet_pubkey_base58,
            bind_addr,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("missing required env var {key}"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn network_parses_known_values() {
        assert_eq!("devnet".parse::<Network>().unwrap(), Network::Devnet);
        assert_eq!(
            "mainnet-beta".parse::<Network>().unwrap(),
            Network::MainnetBeta
        );
        assert!("not-a-network".parse::<Network>().is_err());
    }
}
