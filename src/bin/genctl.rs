use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::{Parser, Subcommand};
use imagegen_router::hairstyle::match_hairstyle;
use imagegen_router::{generate, AppError, BackendSettings, Config, EditOutput, GenerateRequest};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "genctl", about = "CLI for the image generation router", version)]
struct Cli {
    /// Override A1111_BASE_URL
    #[arg(global = true, long)]
    a1111_url: Option<String>,

    /// Override REPLICATE_API_URL
    #[arg(global = true, long)]
    replicate_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Edit an image with a text prompt on the selected backend
    Edit {
        /// Backend tag: replicate, a1111 or openai
        #[arg(long)]
        backend: String,
        /// Edit instruction
        #[arg(long, value_name = "TEXT")]
        prompt: String,
        /// Source image file
        #[arg(long, value_name = "PATH")]
        image: PathBuf,
        /// Where to write a returned base64 image (defaults to ./output.png)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Run the hairstyle matcher on an image
    Match {
        /// Image file to match
        #[arg(long, value_name = "PATH")]
        image: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load env and parse CLI
    Config::dotenv_load();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = BackendSettings::from_env();
    if let Some(url) = cli.a1111_url {
        settings.a1111_base_url = url;
    }
    if let Some(url) = cli.replicate_url {
        settings.replicate_api_url = url;
    }

    match cli.command {
        Commands::Edit { backend, prompt, image, out } => {
            let bytes = tokio::fs::read(&image).await?;
            let request = GenerateRequest::new(backend, prompt, STANDARD.encode(&bytes));
            let http = reqwest::Client::new();

            match generate(&request, &settings, &http).await {
                Ok(EditOutput::Url { image_url: Some(url) }) => {
                    match url.as_str() {
                        Some(s) => println!("{}", s),
                        None => println!("{}", url),
                    }
                    Ok(())
                }
                Ok(EditOutput::Base64 { image_base64: Some(data) }) => {
                    let decoded = STANDARD.decode(data.as_bytes())?;
                    let path = out.unwrap_or_else(|| PathBuf::from("output.png"));
                    tokio::fs::write(&path, &decoded).await?;
                    println!("Saved {} ({} bytes)", path.display(), decoded.len());
                    Ok(())
                }
                Ok(_) => {
                    eprintln!("Backend returned no image");
                    std::process::exit(1);
                }
                Err(AppError::GenerationFailed { details }) => {
                    eprintln!("Error: generation failed: {}", serde_json::to_string_pretty(&details)?);
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Match { image } => {
            let bytes = tokio::fs::read(&image).await?;
            let encoded = STANDARD.encode(&bytes);
            let result = match_hairstyle(Some(encoded.as_str()))?;
            println!("{}", result.result);
            Ok(())
        }
    }
}
