use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use coldsign::builder::SdkRpcBuilder;
use coldsign::config::AppConfig;
use coldsign::contract;
use coldsign::coordinator::OfflineSigningCoordinator;
use coldsign::errors::FlowError;
use coldsign::message::{expire_after, CallDescriptor, SubmissionOutcome, WorkflowKind};
use coldsign::store::SlotStore;
use coldsign::transport::jsonrpc::JsonRpc;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "coldsign",
    about = "Offline co-signing coordinator for a multisig wallet"
)]
struct Cli {
    /// Workflow configuration file
    #[arg(long, global = true, default_value = "coldsign.json")]
    config: PathBuf,
    /// Slot id override; defaults to one slot per workflow kind
    #[arg(long, global = true)]
    slot: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build an unsigned message, persist it, and print the bytes to sign
    Prepare {
        kind: FlowKind,
        /// Overwrite an already occupied slot
        #[arg(long)]
        force: bool,
    },
    /// Finalize a prepared message with an external signature and submit it
    Submit {
        kind: FlowKind,
        /// Hex-encoded signature produced by the out-of-process signer
        signature: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FlowKind {
    Deploy,
    Transfer,
}

impl FlowKind {
    fn workflow(self) -> WorkflowKind {
        match self {
            FlowKind::Deploy => WorkflowKind::Deploy,
            FlowKind::Transfer => WorkflowKind::Transfer,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = init_tracing() {
        eprintln!("warning: {err}");
    }
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        tracing::error!(error = %err, exit_code = err.exit_code(), "workflow failed");
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), FlowError> {
    match cli.command {
        Command::Prepare { kind, force } => prepare(&cli, kind, force).await,
        Command::Submit { kind, ref signature } => {
            // the usage check comes before any config or state access
            let signature = signature.as_ref().ok_or_else(|| {
                FlowError::Usage(
                    "usage: coldsign submit <deploy|transfer> <signature-hex>".into(),
                )
            })?;
            finalize_and_submit(&cli, kind, signature).await
        }
    }
}

async fn prepare(cli: &Cli, kind: FlowKind, force: bool) -> Result<(), FlowError> {
    let config = load_config(cli)?;
    let expire_at = expire_after(config.expire_window());

    let (descriptor, image) = match kind {
        FlowKind::Deploy => {
            let deploy = config.deploy_settings().map_err(builder_err)?;
            let image = deploy.image().await.map_err(builder_err)?;
            let owners = deploy
                .owners
                .clone()
                .unwrap_or_else(|| vec![contract::owner_from_public_key(&config.public_key)]);
            let args = contract::constructor_args(&owners, deploy.req_confirms.unwrap_or(1));
            let descriptor = CallDescriptor::deploy(contract::multisig_abi(), args, expire_at);
            (descriptor, Some(image))
        }
        FlowKind::Transfer => {
            let transfer = config.transfer_settings().map_err(builder_err)?;
            let args = contract::transfer_args(
                &transfer.dst_address,
                transfer.value,
                transfer.bounce.unwrap_or(false),
                transfer.flags.unwrap_or(0),
                transfer.payload.as_deref().unwrap_or(""),
            );
            let descriptor = CallDescriptor::call(
                &transfer.src_address,
                contract::multisig_abi(),
                contract::SEND_TRANSACTION,
                args,
                expire_at,
            );
            (descriptor, None)
        }
    };

    let coordinator = coordinator_for(&config, image)?;
    let slot = slot_id(cli, kind);
    let payload = coordinator.prepare(&slot, descriptor, force).await?;
    if let Some(address) = &payload.address {
        info!(address = %address, "wallet address computed at prepare time");
    }
    println!("Bytes to sign (hex): {}", payload.to_sign_hex());
    Ok(())
}

async fn finalize_and_submit(cli: &Cli, kind: FlowKind, signature: &str) -> Result<(), FlowError> {
    let config = load_config(cli)?;
    let coordinator = coordinator_for(&config, None)?;
    let slot = slot_id(cli, kind);

    let message = coordinator.finalize(&slot, signature).await?;
    match coordinator.submit(&message).await {
        SubmissionOutcome::Completed => println!("Transaction complete"),
        SubmissionOutcome::Aborted { reason } => {
            info!(reason = %reason, "transaction aborted on-chain");
            println!("Transaction aborted");
        }
        SubmissionOutcome::Deployed { address } => {
            println!("Transaction complete");
            println!("Deployed to {address}");
        }
        SubmissionOutcome::TransportError { detail } => {
            return Err(FlowError::Transport(detail));
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig, FlowError> {
    AppConfig::load(&cli.config).map_err(builder_err)
}

fn coordinator_for(
    config: &AppConfig,
    image: Option<String>,
) -> Result<OfflineSigningCoordinator<SdkRpcBuilder, JsonRpc>, FlowError> {
    let rpc = JsonRpc::new(config.network.clone(), config.request_timeout())?;
    let builder = SdkRpcBuilder::new(rpc.clone(), config.public_key.clone(), image);
    let store = SlotStore::new(config.state_dir());
    Ok(OfflineSigningCoordinator::new(builder, rpc, store))
}

fn slot_id(cli: &Cli, kind: FlowKind) -> String {
    cli.slot
        .clone()
        .unwrap_or_else(|| kind.workflow().default_slot().to_owned())
}

fn builder_err(err: anyhow::Error) -> FlowError {
    FlowError::Builder(format!("{err:#}"))
}

fn init_tracing() -> Result<()> {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("tracing subscriber init: {err}"))
}
