use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use lookout_core::app::{LoopExit, ResolverBuilder, drive};
use lookout_core::callback::EventHooks;
use lookout_core::config::LookoutConfig;
use lookout_core::context::Context;
use lookout_core::domain::{RecordClass, RecordType};
use lookout_core::query::Query;

/// Resolve names asynchronously against the configured engine.
#[derive(Debug, Parser)]
#[command(name = "lookout", version)]
struct Args {
    /// TOML configuration (zone, failures, loop settings)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Record type to ask for
    #[arg(short = 't', long = "type", default_value = "A")]
    rrtype: RecordType,

    /// Record class to ask for
    #[arg(long = "class", default_value = "IN")]
    rrclass: RecordClass,

    /// Idle timeout of the event loop; overrides the configuration
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print full answers as JSON
    #[arg(long)]
    json: bool,

    /// Raise log level to debug (RUST_LOG still wins)
    #[arg(short, long)]
    verbose: bool,

    /// Names to resolve
    #[arg(required = true)]
    names: Vec<String>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init()
        .ok();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // (A) 設定とエンジン
    let config = match &args.config {
        Some(path) => LookoutConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LookoutConfig::default(),
    };
    let engine = config.build_engine().context("building engine")?;
    let idle_timeout = args
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.event_loop.idle_timeout());

    // (B) Resolver とデフォルトコールバック
    let json = args.json;
    let resolver = ResolverBuilder::new(Context::with_options(engine, config.context.clone()))
        .on_answer(move |ev| {
            if json {
                let line = serde_json::to_string(ev.answer.as_ref())
                    .map_err(|e| lookout_core::error::ResolverError::callback(e.to_string()))?;
                println!("{line}");
            } else {
                println!(
                    "Got result for {} : rcode: {}! {:?}",
                    ev.query.name(),
                    ev.answer.rcode,
                    ev.answer.addresses()
                );
            }
            Ok(())
        })
        .on_cancel(|ev| {
            println!("Query canceled: {}!", ev.query.name());
            Ok(())
        })
        .on_error(|ev| {
            println!("Query had error: {} {}!", ev.query.name(), ev.status);
            Ok(())
        })
        .build()?;

    // (C) クエリ投入（クエリ単位のコールバック付き）
    for name in &args.names {
        let query = Query::new(name.as_str(), args.rrtype, args.rrclass);
        let label = name.clone();
        query.on_answer(move |_| {
            debug!(name = %label, "query-level callback for on_answer");
            Ok(())
        });
        resolver
            .send(&query)
            .with_context(|| format!("sending {name}"))?;
    }

    // (D) descriptor が静かになるか、全件終わるまで回す
    match drive(&resolver, idle_timeout).await? {
        LoopExit::Drained => info!("all queries finished"),
        LoopExit::IdleTimeout => info!(
            outstanding = resolver.outstanding_queries(),
            "giving up on outstanding queries"
        ),
    }

    resolver.close()?;
    println!("{}", serde_json::to_string_pretty(&resolver.status())?);
    println!("all done!");
    Ok(())
}
