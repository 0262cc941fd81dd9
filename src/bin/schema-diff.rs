//! CLI tool to diff the schemas of two platforms
//!
//! Usage:
//!   cargo run --bin schema-diff -- gcp neon
//!
//! Exits 0 when the schemas match, 2 when they differ, 1 on error.

use pgcompare::config::Config;
use pgcompare::latency::format_ms;
use pgcompare::platform::{PlatformId, PlatformRegistry};
use pgcompare::schema::{diff_schemas, format_report, summarize};
use std::env;
use std::process;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 3 {
        eprintln!("Usage: {} <left> <right>", args[0]);
        eprintln!("Platforms: gcp, local, neon, supabase");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  {} gcp supabase", args[0]);
        process::exit(1);
    }

    let left_id: PlatformId = args[1].parse()?;
    let right_id: PlatformId = args[2].parse()?;

    let _ = dotenvy::dotenv();
    let config = Config::from_env()?;
    let registry = PlatformRegistry::from_config(&config);

    let left = registry.lookup(left_id.as_str())?;
    let right = registry.lookup(right_id.as_str())?;
    left.ensure_configured()?;
    right.ensure_configured()?;

    let (left_schema, right_schema) = tokio::join!(left.get_schema(), right.get_schema());
    registry.disconnect_all().await;
    let (left_schema, right_schema) = (left_schema?, right_schema?);

    println!(
        "{}: {} tables ({}), {}: {} tables ({})",
        left.name(),
        left_schema.tables.len(),
        format_ms(left_schema.latency_ms),
        right.name(),
        right_schema.tables.len(),
        format_ms(right_schema.latency_ms)
    );
    println!();

    let diff = diff_schemas(&left_schema, &right_schema);
    print!("{}", format_report(left.name(), right.name(), &diff));

    if !summarize(&diff).is_identical() {
        process::exit(2);
    }

    Ok(())
}
