//! catalog-refine: turns a raw storefront export into a canonical product catalog.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod refine;

use refine::RefineArgs;

fn print_usage() {
    println!("catalog-refine: product catalog refinement");
    println!();
    println!("Usage: catalog-refine <command>");
    println!();
    println!("Commands:");
    println!("  refine <input> <output> [--config <path>] [--vocabulary <path>]");
    println!("                           Refine a JSON array of raw products");
    println!("  help                     Show this help message");
    println!();
    println!("Diagnostics are written to <output>.diagnostics.json.");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("refine") => {
            let refine_args = match RefineArgs::parse(&args[2..]) {
                Ok(parsed) => parsed,
                Err(e) => {
                    eprintln!("{}", e);
                    eprintln!("Usage: catalog-refine refine <input> <output> [--config <path>] [--vocabulary <path>]");
                    std::process::exit(2);
                }
            };

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, finishing records in flight");
                    on_signal.cancel();
                }
            });

            let summary = refine::run(&refine_args, cancel).await?;
            refine::print_report(&summary);
            if !summary.succeeded() {
                std::process::exit(1);
            }
            info!("Done");
            Ok(())
        }
        Some("--help" | "-h" | "help") | None => {
            print_usage();
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown command: {}. Use 'catalog-refine help' for usage.", other);
            std::process::exit(2);
        }
    }
}
