#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

use anyhow::Result;
use clap::{Parser, ValueEnum};
use fossil_client::grpc::GrpcStoreConfig;
use fossil_proto::v1::fossil_db_client::FossilDbClient;
use fossil_proto::v1::{BackupRequest, HealthRequest, RestoreFromBackupRequest};
use fossil_wire::Reply;
use tonic::transport::Channel;
use tracing::{info, info_span, warn, Instrument};

const DEFAULT_ADDRESS: &str = "localhost";
const DEFAULT_PORT: u16 = 8090;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Command {
    Backup,
    Restore,
    Health,
}

impl Command {
    fn rpc(self) -> &'static str {
        match self {
            Self::Backup => "Backup",
            Self::Restore => "RestoreFromBackup",
            Self::Health => "Health",
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "fossil-backup")]
#[command(about = "Trigger a FossilDB backup or restore")]
struct Args {
    /// [ADDRESS] [PORT] COMMAND; address defaults to localhost, port to 8090,
    /// command is one of backup, restore, health.
    #[arg(num_args = 1..=3, required = true, value_name = "ARGS")]
    positional: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
struct Target {
    address: String,
    port: u16,
    command: Command,
}

/// The command is always last; address and port fill in from the left.
fn resolve(positional: &[String]) -> Result<Target> {
    let Some((command, rest)) = positional.split_last() else {
        anyhow::bail!("missing command, expected one of backup, restore, health");
    };
    let command = Command::from_str(command, true).map_err(|_| {
        anyhow::anyhow!("unknown command '{command}', expected one of backup, restore, health")
    })?;
    anyhow::ensure!(rest.len() <= 2, "too many arguments");
    let address = rest
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
    let port = match rest.get(1) {
        Some(port) => port
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid port '{port}': {e}"))?,
        None => DEFAULT_PORT,
    };
    Ok(Target {
        address,
        port,
        command,
    })
}

async fn execute(client: &mut FossilDbClient, command: Command) -> Result<bool> {
    let success = match command {
        Command::Backup => {
            let reply = client.backup(BackupRequest {}).await?.into_inner();
            println!("{reply:#?}");
            reply.success()
        }
        Command::Restore => {
            let reply = client
                .restore_from_backup(RestoreFromBackupRequest {})
                .await?
                .into_inner();
            println!("{reply:#?}");
            reply.success()
        }
        Command::Health => {
            let reply = client.health(HealthRequest {}).await?.into_inner();
            println!("{reply:#?}");
            reply.success()
        }
    };
    Ok(success)
}

#[tokio::main]
async fn main() -> Result<()> {
    fossil_observe::logging::init_tracing();

    let args = Args::parse();
    let target = resolve(&args.positional)?;
    let cfg = GrpcStoreConfig::from_host_port(&target.address, target.port);
    let span = info_span!("fossil-backup", url = %cfg.url, rpc = target.command.rpc());

    let success = async {
        println!(
            "Requesting {} to FossilDB at {}:{}",
            target.command.rpc(),
            target.address,
            target.port
        );
        let channel = Channel::from_shared(cfg.url.clone())?.connect().await?;
        let mut client = FossilDbClient::new(channel)
            .max_decoding_message_size(cfg.max_message_bytes)
            .max_encoding_message_size(cfg.max_message_bytes);
        let success = execute(&mut client, target.command).await?;
        if success {
            info!("request succeeded");
        } else {
            warn!("server reported failure");
        }
        anyhow::Ok(success)
    }
    .instrument(span)
    .await?;

    if !success {
        std::process::exit(1);
    }
    Ok(())
}
