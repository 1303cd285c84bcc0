use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ledger_core::constants::{DEFAULT_DIFFICULTY_HEX, DEMO_BLOCKS, GENESIS_PAYLOAD};
use ledger_core::{Block, CancelFlag, Chain, Difficulty, LedgerError, SealMode, Sealer};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "Build and seal a proof-of-work hash chain in memory")]
struct Cli {
    /// Hex prefix every sealed hash must start with
    #[arg(long, global = true, default_value = DEFAULT_DIFFICULTY_HEX)]
    difficulty: Difficulty,

    /// Search nonces on all worker threads
    #[arg(long, global = true)]
    parallel: bool,

    /// Worker threads used by --parallel (defaults to one per core)
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Print blocks as JSON, one per line
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seal a genesis block and N more, checking the chain after each
    Demo {
        /// Blocks to add after genesis
        #[arg(long, default_value_t = DEMO_BLOCKS)]
        blocks: usize,
        /// Genesis payload
        #[arg(long, default_value = GENESIS_PAYLOAD)]
        genesis: String,
    },
    /// Seal a single block
    Seal {
        /// Block payload
        payload: String,
        /// Give up after this many hashes
        #[arg(long)]
        max_attempts: Option<u64>,
        /// Cancel the search after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring worker threads")?;
    }
    let mode = if cli.parallel {
        SealMode::Parallel
    } else {
        SealMode::Sequential
    };
    let sealer = Sealer::new(mode);

    match cli.cmd {
        Command::Demo { blocks, genesis } => {
            run_demo(cli.difficulty, sealer, blocks, genesis, cli.json)
        }
        Command::Seal {
            payload,
            max_attempts,
            timeout_secs,
        } => run_seal(cli.difficulty, sealer, payload, max_attempts, timeout_secs, cli.json).await,
    }
}

fn run_demo(
    difficulty: Difficulty,
    sealer: Sealer,
    blocks: usize,
    genesis: String,
    json: bool,
) -> Result<()> {
    info!("building demo chain with difficulty {difficulty}");
    let mut chain = Chain::with_sealer(difficulty, Block::new(genesis), sealer)
        .context("sealing the genesis block")?;
    if !json {
        println!("Genesis block has been added!");
    }
    print_block(chain.get(0)?, json)?;

    for i in 1..=blocks {
        chain
            .add(Block::new(format!("Block {i}")))
            .with_context(|| format!("sealing block {i}"))?;
        if !json {
            println!("\nBlock {i} has been added!");
        }
        print_block(chain.get(i)?, json)?;

        if !chain.is_valid() {
            bail!("Blockchain is not valid!");
        }
    }

    if !json {
        println!("\nBlockchain is valid!");
    }
    Ok(())
}

async fn run_seal(
    difficulty: Difficulty,
    sealer: Sealer,
    payload: String,
    max_attempts: Option<u64>,
    timeout_secs: Option<u64>,
    json: bool,
) -> Result<()> {
    let sealer = match max_attempts {
        Some(max) => sealer.with_max_attempts(max)?,
        None => sealer,
    };
    let cancel = CancelFlag::new();
    let sealer = sealer.with_cancel(cancel.clone());

    let mut task = tokio::task::spawn_blocking(move || {
        let mut block = Block::new(payload);
        let report = sealer.seal(&mut block, &difficulty)?;
        Ok::<_, LedgerError>((block, report))
    });

    let joined = match timeout_secs {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(secs, "seal timed out, cancelling search");
                cancel.cancel();
                task.await
            }
        },
        None => task.await,
    };
    let (block, report) = joined
        .context("sealing task failed")?
        .context("sealing the block")?;

    print_block(&block, json)?;
    if !json {
        println!("attempts: {}", report.attempts);
    }
    Ok(())
}

fn print_block(block: &Block, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(block)?);
    } else {
        println!("{block}");
    }
    Ok(())
}
