// src/cli.rs
use std::env;
use std::error::Error;

use crate::core::net::WikiClient;
use crate::runner;

pub enum Command {
    ScrapeClasses,
    ScrapeItems,
    DownloadAssets,
    ValidateAssets,
    BuildDataset,
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let command = parse_cli()?;

    match command {
        Command::ScrapeClasses => {
            let payload = runner::scrape_classes(&WikiClient::new()?)?;
            print_json(&payload)
        }
        Command::ScrapeItems => {
            let payload = runner::scrape_items(&WikiClient::new()?)?;
            print_json(&payload)
        }
        Command::DownloadAssets => {
            let payload = runner::download_assets(&WikiClient::new()?)?;
            print_json(&payload)
        }
        Command::ValidateAssets => {
            let report = runner::validate_assets()?;
            print_json(&report)
        }
        Command::BuildDataset => {
            let dataset = runner::build_dataset()?;
            print_json(&dataset)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_cli() -> Result<Command, Box<dyn Error>> {
    let mut command = None;

    let mut args = env::args().skip(1);
    while let Some(a) = args.next() {
        match a.as_str() {
            "scrape-classes" => command = Some(Command::ScrapeClasses),
            "scrape-items" => command = Some(Command::ScrapeItems),
            "download-assets" => command = Some(Command::DownloadAssets),
            "validate-assets" => command = Some(Command::ValidateAssets),
            "build-dataset" => command = Some(Command::BuildDataset),
            "-h" | "--help" => {
                eprintln!(include_str!("cli_help.txt"));
                std::process::exit(0);
            }
            _ => return Err(format!("Unknown arg: {}", a).into()),
        }
    }

    command.ok_or_else(|| "Missing command, see --help".into())
}
