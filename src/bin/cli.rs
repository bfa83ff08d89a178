use clap::{Arg, ArgAction, ArgMatches, Command, crate_description, crate_name, crate_version, value_parser};
use json_component_validator::config::{Config, load_config};
use json_component_validator::load_registry;
use json_component_validator::observability::init_logs;
use json_component_validator::server::{AppState, ValidatorServer};
use json_component_validator::shutdown::install_signal_handler;
use std::error::Error;
use std::process;
use tracing::info;

fn build_cli() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .about(crate_description!())
        .arg(
            Arg::new("source")
                .value_name("FILE_OR_URL")
                .help("OpenAPI 3 or Swagger 2 document, YAML or JSON, as a path or http(s) URL")
                .required(true)
                .value_parser(value_parser!(String)),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .short('p')
                .help("Port to listen on [default: 7071]")
                .value_parser(value_parser!(u16)),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .help("Address to bind [default: 0.0.0.0]")
                .value_parser(value_parser!(String)),
        )
        .arg(
            Arg::new("workers")
                .long("workers")
                .help("Number of request worker threads [default: 4]")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("draft")
                .long("draft")
                .help("JSON Schema draft for every component: 4, 6, 7, 2019-09 or 2020-12")
                .value_parser(value_parser!(String)),
        )
        .arg(
            Arg::new("no-nullable")
                .long("no-nullable")
                .help("Do not treat `nullable: true` as allowing null")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-remote-refs")
                .long("no-remote-refs")
                .help("Refuse to fetch external $refs over http(s)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-body-bytes")
                .long("max-body-bytes")
                .help("Largest accepted request body [default: 10485760]")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("trace, debug, info, warn or error [default: info]")
                .value_parser(value_parser!(String)),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("DIR")
                .help("Write daily rolling log files to DIR instead of stderr")
                .value_parser(value_parser!(String)),
        )
        .arg(
            Arg::new("contact-email")
                .long("contact-email")
                .value_name("EMAIL")
                .help("Contact address published in /apispec_1.json")
                .value_parser(value_parser!(String)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("JSON config file; environment variables and flags override it")
                .value_parser(value_parser!(String)),
        )
        .arg(
            Arg::new("list-endpoints")
                .long("list-endpoints")
                .help("Print the validation routes and exit")
                .action(ArgAction::SetTrue),
        )
}

/// Flags are the last and strongest configuration layer.
fn apply_cli_overrides(config: &mut Config, matches: &ArgMatches) {
    if let Some(port) = matches.get_one::<u16>("port") {
        config.set_port(*port);
    }
    if let Some(host) = matches.get_one::<String>("host") {
        config.set_host(host.clone());
    }
    if let Some(workers) = matches.get_one::<usize>("workers") {
        config.set_workers(*workers);
    }
    if let Some(draft) = matches.get_one::<String>("draft") {
        config.set_draft(Some(draft.clone()));
    }
    if matches.get_flag("no-nullable") {
        config.set_nullable(false);
    }
    if matches.get_flag("no-remote-refs") {
        config.set_remote_refs(false);
    }
    if let Some(max) = matches.get_one::<usize>("max-body-bytes") {
        config.set_max_body_bytes(*max);
    }
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.set_log_level(level.clone());
    }
    if let Some(dir) = matches.get_one::<String>("log-file") {
        config.set_log_dir(Some(dir.clone()));
    }
    if let Some(email) = matches.get_one::<String>("contact-email") {
        config.set_contact_email(Some(email.clone()));
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let matches = build_cli().get_matches();

    let mut config = load_config(matches.get_one::<String>("config").map(String::as_str))?;
    apply_cli_overrides(&mut config, &matches);
    config.validate()?;

    let _log_guard = init_logs(&config.log_config())?;

    let source_arg = matches
        .get_one::<String>("source")
        .ok_or("missing source document")?;
    let (source, registry) = load_registry(source_arg, &config)?;

    if matches.get_flag("list-endpoints") {
        for component in registry.iter() {
            println!("{}", component.path());
        }
        return Ok(());
    }

    for component in registry.iter() {
        info!("POST {} validates '{}'", component.path(), component.name());
    }
    info!("serving {} components of {}", registry.len(), source);

    let state = AppState::from_config(registry, &config);
    let server = ValidatorServer::bind(&config.bind_address(), state, config.workers())?;
    install_signal_handler(server.shutdown_handle())?;
    server.run()?;
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
