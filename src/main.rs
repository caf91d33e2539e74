//! gdrive-storage command-line entry point

use std::path::PathBuf;

use bytes::Bytes;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gdrive_storage::config::Config;
use gdrive_storage::storage::{GoogleDriveStorage, Storage};

/// Print usage information
fn print_usage() {
    eprintln!("Usage: gdrive-storage <config.yaml> <command> [args]");
    eprintln!();
    eprintln!("gdrive-storage - store files on Google Drive by virtual path");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  ls <path>                 List directories and files");
    eprintln!("  put <local-file> <name>   Upload a local file");
    eprintln!("  get <name> [output]       Download a file (stdout if no output)");
    eprintln!("  rm <name>                 Delete a file");
    eprintln!("  stat <name>               Show size, URL and timestamps");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  gdrive-storage /etc/gdrive-storage.yaml put report.csv /reports/q1.csv");
}

/// Parsed command
enum Command {
    List(String),
    Put { local: PathBuf, name: String },
    Get { name: String, output: Option<PathBuf> },
    Remove(String),
    Stat(String),
}

impl Command {
    fn parse(args: &[String]) -> Option<Self> {
        match args {
            [cmd, path] if cmd == "ls" => Some(Command::List(path.clone())),
            [cmd] if cmd == "ls" => Some(Command::List("/".to_string())),
            [cmd, local, name] if cmd == "put" => Some(Command::Put {
                local: PathBuf::from(local),
                name: name.clone(),
            }),
            [cmd, name] if cmd == "get" => Some(Command::Get {
                name: name.clone(),
                output: None,
            }),
            [cmd, name, output] if cmd == "get" => Some(Command::Get {
                name: name.clone(),
                output: Some(PathBuf::from(output)),
            }),
            [cmd, name] if cmd == "rm" => Some(Command::Remove(name.clone())),
            [cmd, name] if cmd == "stat" => Some(Command::Stat(name.clone())),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let command = match args.get(2..).and_then(Command::parse) {
        Some(c) => c,
        None => {
            print_usage();
            std::process::exit(1);
        }
    };

    let config_path = PathBuf::from(&args[1]);

    // Load configuration
    let config = match Config::from_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Loaded configuration from {:?}", config_path);

    let storage = GoogleDriveStorage::new(config.storage).await?;

    if let Err(e) = run(&storage, command).await {
        error!("{}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(storage: &impl Storage, command: Command) -> gdrive_storage::Result<()> {
    match command {
        Command::List(path) => {
            let listing = storage.listdir(&path).await?;
            for dir in listing.directories {
                println!("{}/", dir);
            }
            for file in listing.files {
                println!("{}", file);
            }
        }
        Command::Put { local, name } => {
            let content = tokio::fs::read(&local).await?;
            let stored = storage.save(&name, Bytes::from(content)).await?;
            println!("{}", stored);
        }
        Command::Get { name, output } => {
            let file = storage.open(&name).await?;
            match output {
                Some(path) => tokio::fs::write(&path, &file.content).await?,
                None => {
                    use std::io::Write;
                    std::io::stdout().write_all(&file.content)?;
                }
            }
        }
        Command::Remove(name) => storage.delete(&name).await?,
        Command::Stat(name) => {
            if !storage.exists(&name).await? {
                println!("{}: not found", name);
                return Ok(());
            }
            println!("size:     {}", storage.size(&name).await?);
            println!("url:      {}", storage.url(&name).await?.unwrap_or_default());
            if let Some(t) = storage.created_time(&name).await? {
                println!("created:  {}", t.to_rfc3339());
            }
            if let Some(t) = storage.modified_time(&name).await? {
                println!("modified: {}", t.to_rfc3339());
            }
        }
    }
    Ok(())
}
