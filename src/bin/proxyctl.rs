use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "proxyctl")]
#[command(about = "Manage proxy configurations through the control plane API", long_about = None)]
struct Cli {
    #[arg(short, long, env = "CONTROL_PLANE_URL", default_value = "http://127.0.0.1:8080")]
    url: String,

    #[arg(short, long, env = "CONTROL_PLANE_TOKEN")]
    token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the control plane is reachable
    Ping,
    /// List configured proxy names
    List,
    /// Print one proxy configuration
    Get { name: String },
    /// Create or replace a proxy configuration from a file ("-" for stdin)
    Put { name: String, file: PathBuf },
    /// Delete a proxy configuration
    Delete { name: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.token))?,
    );

    let res = match cli.command {
        Commands::Ping => client.get(format!("{base}/")).send().await?,
        Commands::List => {
            client.get(format!("{base}/proxies"))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Get { name } => {
            client.get(format!("{base}/proxies/{name}"))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Put { name, file } => {
            let body = read_payload(&file)?;
            client.post(format!("{base}/proxies/{name}"))
                .headers(headers)
                .body(body)
                .send()
                .await?
        }
        Commands::Delete { name } => {
            client.delete(format!("{base}/proxies/{name}"))
                .headers(headers)
                .send()
                .await?
        }
    };

    print_response(res).await
}

fn read_payload(file: &Path) -> std::io::Result<Vec<u8>> {
    if file.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read(file)
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: control plane returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
