use barrister::config::{ServerConfig, CONFIG_ENV_VAR};
use barrister::idl::{to_idl_text, Idl, IdlLoader, IdlValidator, ValidationError};
use barrister::{BarristerError, BarristerResult, Dispatcher, LoggingSystem, RpcHttpServer};
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse an IDL file (with its imports) and print a summary
    Parse {
        #[arg(required = true)]
        path: PathBuf,
    },
    /// Validate an IDL file and print every error found
    Validate {
        #[arg(required = true)]
        path: PathBuf,
    },
    /// Convert an IDL file to its JSON form
    ToJson {
        #[arg(required = true)]
        path: PathBuf,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the IDL text for a JSON document
    FromJson {
        #[arg(required = true)]
        path: PathBuf,
    },
    /// Serve the IDL over JSON-RPC (introspection only)
    Serve {
        /// Path to the TOML config file
        #[arg(short, long, env = CONFIG_ENV_VAR)]
        config: Option<PathBuf>,
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // serve configures logging from its config file
    if !matches!(cli.command, Commands::Serve { .. }) {
        if let Err(e) = LoggingSystem::init(&cli.log_level) {
            eprintln!("{} {}", "warning:".yellow().bold(), e);
        }
    }

    let outcome = match cli.command {
        Commands::Parse { path } => handle_parse(&path),
        Commands::Validate { path } => handle_validate(&path),
        Commands::ToJson { path, output } => handle_to_json(&path, output.as_deref()).await,
        Commands::FromJson { path } => handle_from_json(&path).await,
        Commands::Serve { config, port } => handle_serve(config, port).await,
    };

    if let Err(e) = outcome {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn load(path: &Path) -> BarristerResult<Idl> {
    info!("Loading IDL from {}", path.display());
    Ok(IdlLoader::new().load(path)?)
}

fn report(errors: &[ValidationError]) {
    for error in errors {
        eprintln!("{} {}", "invalid:".red().bold(), error);
    }
}

fn check(idl: &Idl) -> BarristerResult<()> {
    IdlValidator::default().check(idl)?;
    Ok(())
}

fn handle_parse(path: &Path) -> BarristerResult<()> {
    let idl = load(path)?;
    println!("{} {}", "parsed".green().bold(), path.display());
    if !idl.namespaces.is_empty() {
        println!("namespaces: {}", idl.namespaces.join(", "));
    }
    for interface in &idl.interfaces {
        println!(
            "interface {} ({} methods)",
            interface.qualified_name(),
            interface.methods.len()
        );
    }
    for s in &idl.structs {
        match &s.extends {
            Some(parent) => println!("struct {} extends {} ({} fields)", s.qualified_name(), parent, s.fields.len()),
            None => println!("struct {} ({} fields)", s.qualified_name(), s.fields.len()),
        }
    }
    for e in &idl.enums {
        println!("enum {} ({} values)", e.qualified_name(), e.values.len());
    }
    Ok(())
}

fn handle_validate(path: &Path) -> BarristerResult<()> {
    let idl = load(path)?;
    let errors = IdlValidator::default().validate(&idl);
    if errors.is_empty() {
        println!("{} {}", "valid".green().bold(), path.display());
        return Ok(());
    }
    report(&errors);
    Err(BarristerError::Validation(errors.into()))
}

async fn handle_to_json(path: &Path, output: Option<&Path>) -> BarristerResult<()> {
    let idl = load(path)?;
    check(&idl)?;
    let json = idl.to_json_pretty()?;
    match output {
        Some(out) => {
            tokio::fs::write(out, json).await?;
            println!("{} {}", "wrote".green().bold(), out.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

async fn handle_from_json(path: &Path) -> BarristerResult<()> {
    let text = tokio::fs::read_to_string(path).await?;
    let idl = Idl::from_json(&text)?;
    check(&idl)?;
    print!("{}", to_idl_text(&idl));
    Ok(())
}

async fn handle_serve(config_path: Option<PathBuf>, port: Option<u16>) -> BarristerResult<()> {
    let mut config = match config_path {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(port) = port {
        config = config.with_port(port);
    }
    LoggingSystem::init(&config.log_level)?;

    let idl = load(config.require_idl_path()?)?;
    let dispatcher = Dispatcher::with_options(idl, config.dispatcher_options())?;
    info!("Serving {} interfaces", dispatcher.idl().interfaces.len());

    let server = RpcHttpServer::new(Arc::new(dispatcher), &config.bind_address);
    server.run().await
}
