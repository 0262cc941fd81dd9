//! CLI tool to verify one platform after a load: version, tables, row counts
//!
//! Usage:
//!   cargo run --bin db-verify -- <gcp|local|neon|supabase>

use pgcompare::config::Config;
use pgcompare::latency::format_ms;
use pgcompare::platform::{Platform, PlatformId, PlatformRegistry};
use std::env;
use std::process;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <target>", args[0]);
        eprintln!("Targets: gcp, local, neon, supabase");
        process::exit(1);
    }

    let target: PlatformId = match args[1].parse() {
        Ok(id) => id,
        Err(_) => {
            eprintln!("Unknown target: {}", args[1]);
            process::exit(1);
        }
    };

    let _ = dotenvy::dotenv();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    let registry = PlatformRegistry::from_config(&config);
    let Some(platform) = registry.get(target) else {
        eprintln!("Unknown target: {}", target);
        process::exit(1);
    };

    if !platform.is_configured() {
        eprintln!("{} is not set. Add it to .env", platform.env_key());
        process::exit(1);
    }

    let passed = verify(&platform).await;
    platform.disconnect().await;

    if passed {
        println!("\n{} verification PASSED", target);
    } else {
        eprintln!("{} verification FAILED", target);
        process::exit(1);
    }
}

async fn verify(platform: &Platform) -> bool {
    println!("Verifying {}...", platform.name());

    let health = match platform.health_check().await {
        Ok(health) => health,
        Err(e) => {
            eprintln!("Error: {}", e);
            return false;
        }
    };

    match (&health.version, &health.error) {
        (Some(version), _) => println!("Version: {} ({})", version, format_ms(health.latency_ms)),
        (None, error) => {
            eprintln!("Health check failed: {}", error.as_deref().unwrap_or("unknown error"));
            return false;
        }
    }

    let schema = match platform.get_schema().await {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("Error: {}", e);
            return false;
        }
    };
    println!("Tables: {}", schema.tables.len());

    println!("\nTable list:");
    for table in &schema.tables {
        let sql = format!(
            "SELECT COUNT(*) AS count FROM {}.{}",
            quote_ident(&table.schema),
            quote_ident(&table.name)
        );

        match platform.run_query(&sql).await {
            Ok(result) if result.is_ok() => println!(
                "  {}: {} rows",
                table.key(),
                result.first_i64("count").unwrap_or(0)
            ),
            _ => println!("  {}: (count failed)", table.key()),
        }
    }

    true
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
