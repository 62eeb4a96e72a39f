//! shardtab CLI: every process loads its shard of one CSV file, filters it
//! with a comparison predicate and prints the rows it kept.

use clap::Parser;
use shardtab_core::config::ContextConfig;
use shardtab_exec::{DistributedContext, DistributedTable};
use shardtab_io::{CsvReadOptions, CsvSource};
use shardtab_operators::ComparePredicate;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "shardtab")]
#[command(about = "Distributed table filter: one CSV shard per process", long_about = None)]
struct Cli {
    /// CSV file readable by every process in the group
    path: PathBuf,

    /// Row filter, `column OP literal`; `$N` names the N-th column
    #[arg(long = "where", default_value = "$0 == 4")]
    predicate: String,

    /// Number of processes in the group (overrides SHARDTAB_WORLD_SIZE)
    #[arg(long)]
    world_size: Option<usize>,

    /// Shared rendezvous directory (overrides SHARDTAB_RENDEZVOUS_DIR)
    #[arg(long)]
    rendezvous_dir: Option<String>,

    /// Join deadline in milliseconds (overrides SHARDTAB_JOIN_TIMEOUT_MS)
    #[arg(long)]
    join_timeout_ms: Option<u64>,

    /// Field delimiter (single ASCII character)
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// The first line is data, not a header
    #[arg(long)]
    no_header: bool,

    /// Print at most this many rows
    #[arg(long)]
    limit: Option<usize>,

    /// Also write the selected rows as CSV; `{rank}` is replaced by the rank
    #[arg(long)]
    output: Option<String>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ContextConfig::from_env();
    apply_cli_overrides(&mut config, cli);

    let predicate = ComparePredicate::parse(&cli.predicate)?;
    let source = CsvSource::with_options(&cli.path, read_options(cli)?);

    let mut ctx = DistributedContext::init(config)?;
    let outcome = run_query(&ctx, &source, &predicate, cli);
    let finalized = ctx.finalize();
    outcome?;
    finalized?;
    Ok(())
}

fn run_query(
    ctx: &DistributedContext,
    source: &CsvSource,
    predicate: &ComparePredicate,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = DistributedTable::from_source(ctx, source)?;
    let selected = table.select_with(predicate)?;

    let rank = ctx.rank().map(|r| r.get()).unwrap_or(0);
    tracing::info!(
        rank,
        predicate = %predicate,
        rows_in = table.num_rows(),
        rows_out = selected.num_rows(),
        "selection done"
    );

    match cli.limit {
        Some(limit) => selected.print_head_to(std::io::stdout().lock(), limit)?,
        None => selected.print()?,
    }

    if let Some(pattern) = &cli.output {
        let path = output_path(pattern, rank);
        let file = File::create(&path)?;
        selected.write_csv(BufWriter::new(file))?;
        tracing::info!(rank, path = %path, "wrote csv");
    }
    Ok(())
}

fn apply_cli_overrides(cfg: &mut ContextConfig, cli: &Cli) {
    if let Some(n) = cli.world_size {
        cfg.world_size = n;
    }
    if let Some(dir) = &cli.rendezvous_dir {
        cfg.rendezvous_dir = Some(dir.clone());
    }
    if let Some(ms) = cli.join_timeout_ms {
        cfg.join_timeout_ms = ms;
    }
}

fn read_options(cli: &Cli) -> Result<CsvReadOptions, String> {
    if !cli.delimiter.is_ascii() {
        return Err(format!("delimiter '{}' is not an ASCII character", cli.delimiter));
    }
    Ok(CsvReadOptions::default()
        .with_delimiter(cli.delimiter as u8)
        .with_header(!cli.no_header))
}

fn output_path(pattern: &str, rank: usize) -> String {
    pattern.replace("{rank}", &rank.to_string())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "shardtab=debug,shardtab_exec=debug,shardtab_comm=debug,shardtab_io=debug"
    } else {
        "shardtab=info,shardtab_exec=info,shardtab_comm=info,shardtab_io=info"
    };

    // stdout carries table output only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
