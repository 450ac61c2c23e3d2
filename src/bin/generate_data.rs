//! Rough test-file generator: writes an arbitrarily large well-formed
//! `city;timestamp;temperature` sample for manual load testing.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use chrono::{Duration, NaiveDate};
use clap::Parser;
use rand::Rng;

const CITIES: &[&str] = &[
    "Warszawa",
    "Wrocław",
    "Kraków",
    "Poznań",
    "Zielona Góra",
    "Opole",
    "Berlin",
];

const MIN_TEMP: f64 = -20.0;
const MAX_TEMP: f64 = 40.0;

/// Generate a sample temperature readings file
#[derive(Parser)]
#[command(name = "generate-data")]
struct Cli {
    /// Output file path
    #[arg(long, default_value = "data/large_file.csv")]
    output: PathBuf,

    /// Number of rows to generate
    #[arg(long, default_value_t = 1_000_000)]
    rows: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(parent) = cli.output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let file = File::create(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;
    let mut writer = BufWriter::new(file);

    let mut rng = rand::thread_rng();
    let mut timestamp = NaiveDate::from_ymd_opt(2018, 9, 19)
        .expect("valid date")
        .and_hms_milli_opt(0, 0, 0, 0)
        .expect("valid time");

    for i in 0..cli.rows {
        let city = CITIES[rng.gen_range(0..CITIES.len())];
        let temperature = rng.gen_range(MIN_TEMP..MAX_TEMP);
        writeln!(
            writer,
            "{};{};{:.2}",
            city,
            timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            temperature
        )?;
        timestamp += Duration::seconds(10);

        if i > 0 && i % 10_000_000 == 0 {
            println!("generated {} rows", i);
        }
    }

    writer.flush()?;
    println!("wrote {} rows to {}", cli.rows, cli.output.display());
    Ok(())
}
