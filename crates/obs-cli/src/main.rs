//! OBS CLI - bucket and object storage with stateless credentials.
//!
//! Every authenticated command takes the bucket's access key and secret key,
//! either as `--ak`/`--sk` or from `OBS_AK`/`OBS_SK`.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use obs_credentials::{PrivilegeLevel, TokenVerifier};
use obs_storage::SimpleBucket;

mod commands;
mod config_bridge;
mod theme;

use commands::{bucket, keys, object, token};

/// OBS - bucket storage with stateless capability credentials
#[derive(Parser)]
#[command(name = "obs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to an additional configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the master secret
    Keys {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// Create, inspect and delete buckets
    Bucket {
        #[command(subcommand)]
        command: BucketCommands,
    },

    /// Upload, download and delete objects
    Object {
        #[command(subcommand)]
        command: ObjectCommands,
    },

    /// Inspect credentials
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Show the active master secret's key id
    Show,
    /// Generate a new master secret
    Generate {
        /// Replace an existing secret without asking
        #[arg(short, long)]
        force: bool,
    },
}

/// Access key / secret key pair for a bucket.
#[derive(Args)]
struct CredentialArgs {
    /// Access key
    #[arg(long, env = "OBS_AK")]
    ak: String,

    /// Secret key
    #[arg(long, env = "OBS_SK", hide_env_values = true)]
    sk: String,
}

impl CredentialArgs {
    fn for_bucket(&self, bucket: &str) -> SimpleBucket {
        SimpleBucket {
            bucket_name: bucket.to_owned(),
            ak: self.ak.clone(),
            sk: self.sk.clone(),
        }
    }
}

#[derive(Subcommand)]
enum BucketCommands {
    /// Create a bucket and print its credential
    Create {
        /// Bucket name
        name: String,
        /// Action to grant (read, write, update, delete, admin); repeatable
        #[arg(short, long = "action", required = true)]
        actions: Vec<PrivilegeLevel>,
    },
    /// Show whether a bucket exists
    Head {
        /// Bucket name
        name: String,
    },
    /// Delete a bucket and all its objects
    Delete {
        /// Bucket name
        name: String,
        #[command(flatten)]
        creds: CredentialArgs,
    },
}

#[derive(Subcommand)]
enum ObjectCommands {
    /// Upload a file
    Put {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
        /// Local file to upload
        #[arg(short, long)]
        file: PathBuf,
        #[command(flatten)]
        creds: CredentialArgs,
    },
    /// Download an object
    Get {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        creds: CredentialArgs,
    },
    /// Print a signed path that downloads one object without credentials
    Sign {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
        #[command(flatten)]
        creds: CredentialArgs,
    },
    /// Download an object through a signed path
    Fetch {
        /// Bucket name
        bucket: String,
        /// Signed path, as printed by `object sign`
        path: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete an object
    Rm {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
        #[command(flatten)]
        creds: CredentialArgs,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Verify a credential and print the privileges it grants
    Verify {
        /// Bucket the credential is for
        bucket: String,
        #[command(flatten)]
        creds: CredentialArgs,
        /// Also require this level
        #[arg(long)]
        require: Option<PrivilegeLevel>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = obs_config::Config::load(cli.config.as_deref())?.config;

    // Set up logging from config, with --verbose override.
    let mut log_config = config_bridge::to_log_config(&cfg);
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = obs_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match cli.command {
        Commands::Keys { command } => match command {
            KeyCommands::Show => keys::show_key(&cfg),
            KeyCommands::Generate { force } => keys::generate_key(&cfg, force),
        },
        Commands::Bucket { command } => {
            let store = config_bridge::open_store(&cfg)?;
            match command {
                BucketCommands::Create { name, actions } => {
                    bucket::create(&store, &name, actions).await
                },
                BucketCommands::Head { name } => bucket::head(&store, &name).await,
                BucketCommands::Delete { name, creds } => {
                    bucket::delete(&store, &creds.for_bucket(&name)).await
                },
            }
        },
        Commands::Object { command } => {
            let store = config_bridge::open_store(&cfg)?;
            match command {
                ObjectCommands::Put {
                    bucket,
                    key,
                    file,
                    creds,
                } => object::put(&store, &creds.for_bucket(&bucket), &key, &file).await,
                ObjectCommands::Get {
                    bucket,
                    key,
                    output,
                    creds,
                } => {
                    object::get(&store, &creds.for_bucket(&bucket), &key, output.as_deref()).await
                },
                ObjectCommands::Sign { bucket, key, creds } => {
                    object::sign(&store, &creds.for_bucket(&bucket), &key).await
                },
                ObjectCommands::Fetch {
                    bucket,
                    path,
                    output,
                } => object::fetch(&store, &bucket, path, output.as_deref()).await,
                ObjectCommands::Rm { bucket, key, creds } => {
                    object::remove(&store, &creds.for_bucket(&bucket), &key).await
                },
            }
        },
        Commands::Token { command } => match command {
            TokenCommands::Verify {
                bucket,
                creds,
                require,
            } => {
                let secret = Arc::new(config_bridge::load_master_secret(&cfg)?);
                token::verify(
                    &TokenVerifier::new(secret),
                    &bucket,
                    &creds.ak,
                    &creds.sk,
                    require,
                )
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bucket_create_actions() {
        let cli = Cli::try_parse_from([
            "obs", "bucket", "create", "photos", "--action", "read", "-a", "DELETE",
        ])
        .unwrap();
        match cli.command {
            Commands::Bucket {
                command: BucketCommands::Create { name, actions },
            } => {
                assert_eq!(name, "photos");
                assert_eq!(actions, vec![PrivilegeLevel::Read, PrivilegeLevel::Delete]);
            },
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn test_unknown_action_rejected() {
        assert!(
            Cli::try_parse_from(["obs", "bucket", "create", "photos", "--action", "root"]).is_err()
        );
    }

    #[test]
    fn test_fetch_takes_no_credentials() {
        let cli = Cli::try_parse_from(["obs", "object", "fetch", "docs", "a.txt?sig=AAAA"]).unwrap();
        match cli.command {
            Commands::Object {
                command: ObjectCommands::Fetch { bucket, path, output },
            } => {
                assert_eq!(bucket, "docs");
                assert_eq!(path, "a.txt?sig=AAAA");
                assert!(output.is_none());
            },
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn test_parse_token_verify() {
        let cli = Cli::try_parse_from([
            "obs", "token", "verify", "photos", "--ak", "00", "--sk", "AA", "--require", "write",
        ])
        .unwrap();
        match cli.command {
            Commands::Token {
                command:
                    TokenCommands::Verify {
                        bucket, require, ..
                    },
            } => {
                assert_eq!(bucket, "photos");
                assert_eq!(require, Some(PrivilegeLevel::Write));
            },
            _ => panic!("unexpected command"),
        }
    }
}
