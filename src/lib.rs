extern crate clap;

pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod validation;

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches};
use std::path::Path;

use config::settings::EngineSettings;
use services::dispatch::{self, TracingDispatcher};
use services::NotificationUrlService;
use validation::Validation;

pub use error::{EngineError, EngineResult};

pub fn cli() -> clap::Command {
    clap::Command::new("uvlbot")
        .about("Validate notification URLs and generate examples for notification services")
        .subcommand_required(true)
        .arg(
            Arg::new("services")
                .short('s')
                .long("services")
                .value_name("SERVICES")
                .global(true)
                .help("Path to a YAML or JSON service catalog (defaults to the bundled one)"),
        )
        .arg(
            Arg::new("max_attempts")
                .short('m')
                .long("max-attempts")
                .value_name("MAX_ATTEMPTS")
                .global(true)
                .value_parser(clap::value_parser!(usize))
                .help("Attempts allowed when synthesizing an example URL"),
        )
        .subcommand(clap::Command::new("services").about("List every service that can be validated"))
        .subcommand(
            clap::Command::new("templates")
                .about("List the URL templates of a service")
                .arg(Arg::new("service").required(true)),
        )
        .subcommand(
            clap::Command::new("validate")
                .about("Check a URL against a service's templates")
                .arg(Arg::new("service").required(true))
                .arg(Arg::new("url").required(true)),
        )
        .subcommand(
            clap::Command::new("generate")
                .about("Generate example URLs that pass validation")
                .arg(Arg::new("service").required(true))
                .arg(
                    Arg::new("template")
                        .short('t')
                        .long("template")
                        .value_name("TEMPLATE")
                        .help("Template to fill instead of a random one"),
                )
                .arg(
                    Arg::new("count")
                        .short('n')
                        .long("count")
                        .value_name("COUNT")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                ),
        )
        .subcommand(
            clap::Command::new("guide")
                .about("Render the HTML guide for a service")
                .arg(Arg::new("service").required(true)),
        )
        .subcommand(
            clap::Command::new("send-test")
                .about("Send a test notification to each URL")
                .arg(Arg::new("urls").required(true).num_args(1..)),
        )
}

fn build_service(matches: &ArgMatches) -> Result<NotificationUrlService> {
    let catalog_path = matches.get_one::<String>("services").map(Path::new);
    let mut settings = EngineSettings::default();
    if let Some(&max_attempts) = matches.get_one::<usize>("max_attempts") {
        settings = settings.with_max_attempts(max_attempts);
    }

    NotificationUrlService::from_path(catalog_path, settings).context("Failed to load service catalog")
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> &'a str {
    matches.get_one::<String>(id).map(String::as_str).unwrap_or_default()
}

/// Execute the parsed command line; `Ok(false)` means the command ran but reported a failure
pub fn run(matches: &ArgMatches) -> Result<bool> {
    let service = build_service(matches)?;

    match matches.subcommand() {
        Some(("services", _)) => {
            for name in service.service_names() {
                println!("{}", name);
            }
        }
        Some(("templates", sub)) => {
            let name = required(sub, "service");
            if service.schema(name).is_none() {
                return Err(EngineError::UnknownService(name.to_string()).into());
            }
            for template in service.templates(name) {
                println!("{}", template);
            }
        }
        Some(("validate", sub)) => {
            let name = required(sub, "service");
            match service.validate(required(sub, "url"), name) {
                Validation::Accepted => println!("valid"),
                Validation::Rejected(reason) => {
                    println!("invalid: {}", reason);
                    return Ok(false);
                }
            }
        }
        Some(("generate", sub)) => {
            let name = required(sub, "service");
            let template = sub.get_one::<String>("template").map(String::as_str);
            let count = sub.get_one::<usize>("count").copied().unwrap_or(1);
            for _ in 0..count {
                println!("{}", service.generate(name, template)?);
            }
        }
        Some(("guide", sub)) => {
            println!("{}", service.render_guide(required(sub, "service"))?);
        }
        Some(("send-test", sub)) => {
            let urls: Vec<&String> = sub.get_many::<String>("urls").into_iter().flatten().collect();
            let report = dispatch::send_test_message(&TracingDispatcher, &urls);
            println!(
                "sent: {}, skipped: {}, failed: {}",
                report.sent,
                report.skipped,
                report.failed.len()
            );
            for (url, reason) in &report.failed {
                println!("  {}: {}", url, reason);
            }
            if !report.is_success() {
                return Ok(false);
            }
        }
        _ => unreachable!("subcommand_required is set"),
    }

    Ok(true)
}
