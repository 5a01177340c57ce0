//! Multisig Vault CLI Application
//!
//! A command-line interface for creating and operating a multisig vault.

use clap::{Parser, Subcommand};
use multisig_vault::cli::{self, AppState};
use multisig_vault::crypto::{Address, RecoverableSig};
use multisig_vault::vault::{ActionRequest, GovernanceCall, DEFAULT_CHAIN_ID};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vault")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "An M-of-N multisig vault in Rust", long_about = None)]
struct Cli {
    /// Data directory for vault storage
    #[arg(short, long, default_value = ".vault_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Fields of an action request
#[derive(clap::Args)]
struct ActionArgs {
    /// Destination address
    #[arg(long)]
    to: Address,

    /// Value to transfer
    #[arg(long, default_value = "0")]
    value: u128,

    /// Call payload (hex)
    #[arg(long, default_value = "")]
    payload: String,

    /// Sequence number (current sequence + 1)
    #[arg(long)]
    sequence: u64,
}

impl ActionArgs {
    fn request(&self) -> cli::CliResult<ActionRequest> {
        Ok(ActionRequest::new(
            self.to,
            self.value,
            cli::parse_payload(&self.payload)?,
            self.sequence,
        ))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new vault
    Init {
        /// Chain ID the vault's digests are bound to
        #[arg(long, default_value_t = DEFAULT_CHAIN_ID)]
        chain_id: u64,

        /// Deployer address (vault address is derived from it)
        #[arg(long)]
        deployer: Address,

        /// Deployment salt
        #[arg(long, default_value = "0")]
        salt: u64,

        /// Signer addresses (comma-separated)
        #[arg(long, value_delimiter = ',')]
        signers: Vec<Address>,

        /// Required number of signatures
        #[arg(short, long)]
        threshold: usize,
    },

    /// Show signers, threshold, sequence and balance
    Info,

    /// Generate a signer key
    Keygen,

    /// Credit the vault's balance
    Deposit {
        #[arg(short, long)]
        amount: u128,
    },

    /// Print the digest to sign for an action
    Digest {
        #[command(flatten)]
        action: ActionArgs,
    },

    /// Sign an action with a private key
    Sign {
        /// Private key (hex)
        #[arg(short, long)]
        key: String,

        #[command(flatten)]
        action: ActionArgs,
    },

    /// Execute an action with collected signatures
    Execute {
        #[command(flatten)]
        action: ActionArgs,

        /// Signature (hex); repeat for each signer
        #[arg(long = "sig")]
        signatures: Vec<RecoverableSig>,

        /// Submitting identity recorded in the execution event
        #[arg(long, default_value_t = Address::ZERO)]
        caller: Address,
    },

    /// Build a governance payload for a self-targeted action
    Encode {
        #[command(subcommand)]
        call: EncodeCommands,
    },

    /// Show the event log
    Events,

    /// Export the vault to a file
    Export {
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import a vault from a file
    Import {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Restore the vault from a rotating backup (0 is the newest)
    Restore {
        #[arg(short, long)]
        backup: usize,
    },
}

#[derive(Subcommand)]
enum EncodeCommands {
    /// Add a signer and set the threshold
    AddSigner {
        #[arg(long)]
        signer: Address,
        #[arg(short, long)]
        threshold: u64,
    },

    /// Remove a signer and set the threshold
    RemoveSigner {
        #[arg(long)]
        signer: Address,
        #[arg(short, long)]
        threshold: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Commands that don't need a saved vault
    match &cli.command {
        Commands::Init {
            chain_id,
            deployer,
            salt,
            signers,
            threshold,
        } => {
            return cli::cmd_init(&cli.data_dir, *chain_id, deployer, *salt, signers, *threshold);
        }
        Commands::Keygen => return cli::cmd_keygen(),
        Commands::Encode { call } => {
            let call = match call {
                EncodeCommands::AddSigner { signer, threshold } => GovernanceCall::AddSigner {
                    signer: *signer,
                    new_threshold: *threshold,
                },
                EncodeCommands::RemoveSigner { signer, threshold } => {
                    GovernanceCall::RemoveSigner {
                        signer: *signer,
                        new_threshold: *threshold,
                    }
                }
            };
            return cli::cmd_encode(&call);
        }
        Commands::Import { input } => return cli::cmd_import(&cli.data_dir, input),
        _ => {}
    }

    let mut state = AppState::new(cli.data_dir.clone())?;

    match cli.command {
        Commands::Init { .. }
        | Commands::Keygen
        | Commands::Encode { .. }
        | Commands::Import { .. } => unreachable!(),

        Commands::Info => cli::cmd_info(&state)?,

        Commands::Deposit { amount } => cli::cmd_deposit(&mut state, amount)?,

        Commands::Digest { action } => cli::cmd_digest(&state, &action.request()?)?,

        Commands::Sign { key, action } => cli::cmd_sign(&state, &key, &action.request()?)?,

        Commands::Execute {
            action,
            signatures,
            caller,
        } => cli::cmd_execute(&mut state, caller, &action.request()?, &signatures)?,

        Commands::Events => cli::cmd_events(&state)?,

        Commands::Export { output } => cli::cmd_export(&state, &output)?,

        Commands::Restore { backup } => cli::cmd_restore(&mut state, backup)?,
    }

    Ok(())
}
