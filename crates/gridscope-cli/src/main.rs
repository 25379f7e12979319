use std::path::PathBuf;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::warn;

use gridscope_record::TracingSink;
use gridscope_run::{RunOutcome, deliver, run_apel, run_gocdb};
use gridscope_upstream::{
    ClientIdentity, DEFAULT_REGISTRY_URL, DEFAULT_STORE_URL, EsStore, RegistryClient, TlsVerify,
};

#[derive(Parser)]
#[command(
    name = "gridscope",
    about = "gridscope — grid-infrastructure metrics collector",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect the registry-derived GOCDB metrics family
    Gocdb {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Collect the accounting-derived APEL metrics family
    Apel {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

#[derive(Args)]
struct ConnectionArgs {
    /// Write the snapshot to the metrics store instead of printing it
    #[arg(short = 'w', long)]
    publish: bool,

    /// Server certificate verification: true, false, or the path to a
    /// trust-anchor bundle to validate against
    #[arg(short, long, default_value = "true")]
    verify: String,

    /// Client certificate for private registry queries
    #[arg(short, long, default_value = "/etc/grid-security/hostcert.pem")]
    certificate: PathBuf,

    /// Key corresponding to the client certificate
    #[arg(short, long, default_value = "/etc/grid-security/hostkey.pem")]
    key: PathBuf,

    /// Registry base URL
    #[arg(long, default_value = DEFAULT_REGISTRY_URL)]
    registry_url: String,

    /// Metrics store base URL
    #[arg(long, default_value = DEFAULT_STORE_URL)]
    store_url: String,
}

#[derive(Clone, Copy)]
enum Family {
    Gocdb,
    Apel,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gridscope=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Gocdb { connection } => run(Family::Gocdb, connection),
        Commands::Apel { connection } => run(Family::Apel, connection),
    }
}

fn run(family: Family, args: ConnectionArgs) -> anyhow::Result<()> {
    let verify = TlsVerify::parse(&args.verify);

    // Only the GOCDB family touches private registry endpoints; without
    // the identity those queries come back unauthorized rather than
    // failing the whole run.
    let identity = match family {
        Family::Gocdb if args.certificate.exists() && args.key.exists() => {
            Some(ClientIdentity::new(args.certificate, args.key))
        }
        Family::Gocdb => {
            warn!("client certificate not found, private registry queries will be unauthorized");
            None
        }
        Family::Apel => None,
    };

    let registry = RegistryClient::new(args.registry_url, &verify, identity.as_ref())?;
    let store = EsStore::new(args.store_url)?;
    let sink = TracingSink;
    let now = Utc::now();

    let outcome: RunOutcome = match family {
        Family::Gocdb => run_gocdb(&registry, &store, &sink, now),
        Family::Apel => run_apel(&registry, &store, &sink, now),
    };

    let published = deliver(&store, &outcome, args.publish, now);
    if !published {
        println!("{}", serde_json::to_string_pretty(&outcome.snapshot)?);
    }

    Ok(())
}
