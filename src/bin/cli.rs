//! ArborKV CLI Client
//!
//! Command-line interface for browsing and editing a running server.

use std::process::ExitCode;

use arborkv::listing::{EntryKind, PageRequest, PageToken};
use arborkv::network::Client;
use arborkv::{BucketPath, Result};
use clap::{Parser, Subcommand};

/// ArborKV CLI
#[derive(Parser, Debug)]
#[command(name = "arborkv-cli")]
#[command(about = "CLI for the ArborKV bucket-tree store")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, env = "ARBORKV_LISTEN", default_value = "127.0.0.1:8080")]
    server: String,

    /// Treat keys, values and prefixes as hex, and print them as hex
    #[arg(long, global = true)]
    hex: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server
    Ping,

    /// List the buckets and keys under a bucket
    #[command(alias = "ls")]
    Buckets {
        /// Bucket path, e.g. /users/active (defaults to the root)
        #[arg(default_value = "/")]
        path: String,

        /// Items per page (0 = all)
        #[arg(long, default_value = "0")]
        page_size: u32,

        /// Resume after this page token
        #[arg(long)]
        page_token: Option<String>,
    },

    /// Create a bucket and any missing parents
    CreateBucket { path: String },

    /// Set a key in an existing bucket
    Put {
        path: String,
        key: String,
        value: String,
    },

    /// Get the value of a key
    Get { path: String, key: String },

    /// Delete a key (absent keys are not an error)
    DeleteKey { path: String, key: String },

    /// Delete a bucket and everything under it
    DeleteBucket { path: String },

    /// List entries whose key starts with a prefix
    Scan {
        path: String,

        #[arg(default_value = "")]
        prefix: String,

        /// Maximum entries to return (server default when omitted)
        #[arg(long)]
        limit: Option<u32>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut client = Client::connect(args.server.as_str())?;
    let codec = Codec { hex: args.hex };

    match &args.command {
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
        }
        Commands::Buckets {
            path,
            page_size,
            page_token,
        } => {
            let request = PageRequest {
                page_token: page_token.as_deref().map(PageToken::from_hex).transpose()?,
                page_size: Some(*page_size as usize),
            };
            let page = client.list(&BucketPath::parse(path)?, &request)?;
            for item in &page.items {
                let marker = match item.kind {
                    EntryKind::Bucket => "/",
                    EntryKind::Key => "",
                };
                println!("{}{}", codec.show(&item.name), marker);
            }
            if let Some(token) = page.next_page_token {
                println!("-- more: --page-token {}", token);
            }
        }
        Commands::CreateBucket { path } => {
            client.create_bucket(&BucketPath::parse(path)?)?;
            println!("OK");
        }
        Commands::Put { path, key, value } => {
            client.put(&BucketPath::parse(path)?, &codec.read(key)?, &codec.read(value)?)?;
            println!("OK");
        }
        Commands::Get { path, key } => {
            let value = client.get(&BucketPath::parse(path)?, &codec.read(key)?)?;
            println!("{}", codec.show(&value));
        }
        Commands::DeleteKey { path, key } => {
            client.delete_key(&BucketPath::parse(path)?, &codec.read(key)?)?;
            println!("OK");
        }
        Commands::DeleteBucket { path } => {
            client.delete_bucket(&BucketPath::parse(path)?)?;
            println!("OK");
        }
        Commands::Scan {
            path,
            prefix,
            limit,
        } => {
            let entries =
                client.scan_prefix(&BucketPath::parse(path)?, &codec.read(prefix)?, *limit)?;
            for entry in &entries {
                println!("{}\t{}", codec.show(&entry.key), codec.show(&entry.value));
            }
        }
    }

    Ok(())
}

/// How byte strings are read from and written to the terminal
struct Codec {
    hex: bool,
}

impl Codec {
    fn read(&self, text: &str) -> Result<Vec<u8>> {
        if self.hex {
            hex::decode(text)
                .map_err(|e| arborkv::ArborError::InvalidKey(format!("bad hex '{}': {}", text, e)))
        } else {
            Ok(text.as_bytes().to_vec())
        }
    }

    fn show(&self, bytes: &[u8]) -> String {
        if self.hex {
            hex::encode(bytes)
        } else {
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}
