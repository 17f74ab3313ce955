//! Integration harness: mirrors real-world specs from apis.guru and runs
//! the generator across a local corpus, caching results per spec.

mod cache;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tokio::fs;
use tokio::time::sleep;

use cache::{CACHE_FILE, IntegrationCache, content_hash};

#[derive(Parser, Debug)]
#[command(name = "typegenitor-harness")]
#[command(about = "Mirrors OpenAPI specs and runs the generator over them", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download OpenAPI specs from apis.guru into a local corpus
    Mirror {
        /// Number of simultaneous downloads
        #[arg(short = 'c', long, default_value_t = 3)]
        concurrency: usize,

        /// Sleep duration between downloads in seconds
        #[arg(short = 's', long, default_value_t = 0.5)]
        sleep_duration: f64,

        /// Output directory
        #[arg(short = 'o', long, default_value = "data")]
        output_dir: PathBuf,
    },
    /// Run the generator over every spec in a local corpus
    Run {
        /// Corpus directory to walk for *.yaml / *.json specs
        #[arg(short = 'd', long, default_value = "data")]
        corpus_dir: PathBuf,

        /// Cache time-to-live in hours
        #[arg(long, default_value_t = 168)]
        ttl_hours: u64,

        /// Ignore the cache and test everything
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Debug, Deserialize)]
struct ApiSpec {
    versions: HashMap<String, VersionInfo>,
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "swaggerUrl")]
    swagger_url: Option<String>,
    #[serde(rename = "swaggerYamlUrl")]
    swagger_yaml_url: Option<String>,
    info: InfoMetadata,
}

#[derive(Debug, Deserialize)]
struct InfoMetadata {
    version: String,
}

type ApiList = HashMap<String, ApiSpec>;

#[derive(Debug, Clone)]
struct DownloadTask {
    provider: String,
    service: String,
    version: String,
    json_url: Option<String>,
    yaml_url: Option<String>,
}

async fn fetch_api_list() -> Result<ApiList> {
    let url = "https://api.apis.guru/v2/list.json";
    println!("Fetching API list from {}...", url);

    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .context("Failed to fetch API list")?;

    let api_list: ApiList = response
        .json()
        .await
        .context("Failed to parse API list JSON")?;

    println!("Found {} APIs", api_list.len());
    Ok(api_list)
}

fn parse_api_key(key: &str) -> (String, String) {
    // API keys are in format "provider.com:serviceName"
    if let Some(pos) = key.find(':') {
        let provider = key[..pos].to_string();
        let service = key[pos + 1..].to_string();
        (provider, service)
    } else {
        ("unknown".to_string(), key.to_string())
    }
}

fn create_download_tasks(api_list: &ApiList) -> Vec<DownloadTask> {
    let mut tasks = Vec::new();

    for (api_key, api_spec) in api_list {
        let (provider, service) = parse_api_key(api_key);

        for version_info in api_spec.versions.values() {
            tasks.push(DownloadTask {
                provider: provider.clone(),
                service: service.clone(),
                version: version_info.info.version.clone(),
                json_url: version_info.swagger_url.clone(),
                yaml_url: version_info.swagger_yaml_url.clone(),
            });
        }
    }

    tasks
}

async fn download_file(client: &reqwest::Client, url: &str, path: &PathBuf) -> Result<()> {
    if path.exists() {
        return Ok(());
    }

    let response = client
        .get(url)
        .send()
        .await
        .context(format!("Failed to download from {}", url))?;

    let content = response
        .bytes()
        .await
        .context("Failed to read response body")?;

    fs::write(path, content)
        .await
        .context(format!("Failed to write to {:?}", path))?;

    Ok(())
}

async fn process_download_task(
    client: &reqwest::Client,
    task: DownloadTask,
    output_dir: &PathBuf,
    sleep_duration: Duration,
) -> Result<()> {
    // directory structure: data/provider/service/version/
    let task_dir = output_dir
        .join(&task.provider)
        .join(&task.service)
        .join(&task.version);

    fs::create_dir_all(&task_dir)
        .await
        .context(format!("Failed to create directory {:?}", task_dir))?;

    let mut downloaded_count = 0;

    for (url, file_name) in [
        (task.json_url.as_ref(), "spec.json"),
        (task.yaml_url.as_ref(), "spec.yaml"),
    ] {
        let Some(url) = url else { continue };
        let path = task_dir.join(file_name);
        if path.exists() {
            println!(
                "Skipping (exists): {}/{}/{}/{}",
                task.provider, task.service, task.version, file_name
            );
            continue;
        }
        println!(
            "Downloading {}/{}/{}/{} from {}",
            task.provider, task.service, task.version, file_name, url
        );
        if let Err(e) = download_file(client, url, &path).await {
            eprintln!(
                "Failed to download {}/{}/{}: {}",
                task.provider, task.service, task.version, e
            );
        } else {
            downloaded_count += 1;
        }
    }

    if downloaded_count > 0 {
        sleep(sleep_duration).await;
    }

    Ok(())
}

async fn mirror(concurrency: usize, sleep_duration: f64, output_dir: PathBuf) -> Result<()> {
    let api_list = fetch_api_list().await?;
    let tasks = create_download_tasks(&api_list);
    println!("Prepared {} download tasks", tasks.len());

    let client = reqwest::Client::new();
    let sleep_duration = Duration::from_secs_f64(sleep_duration);

    stream::iter(tasks)
        .for_each_concurrent(concurrency, |task| {
            let client = &client;
            let output_dir = &output_dir;
            async move {
                if let Err(e) = process_download_task(client, task, output_dir, sleep_duration).await
                {
                    eprintln!("Task failed: {e}");
                }
            }
        })
        .await;

    Ok(())
}

fn collect_spec_paths(dir: &PathBuf) -> Result<Vec<PathBuf>> {
    let mut specs = Vec::new();
    let mut stack = vec![dir.clone()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current)
            .with_context(|| format!("cannot read directory {current:?}"))?
        {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else if matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml" | "yml" | "json")
            ) {
                specs.push(path);
            }
        }
    }
    specs.sort();
    Ok(specs)
}

/// Generate for every cached-stale spec in the corpus. A failure for one
/// spec never aborts the run.
fn run_corpus(corpus_dir: PathBuf, ttl_hours: u64, force: bool) -> Result<()> {
    let cache_path = corpus_dir.join(CACHE_FILE);
    let mut cache = IntegrationCache::load(&cache_path)?;
    let ttl = Duration::from_secs(ttl_hours * 3600);
    let config = typegenitor::Config::default();

    let specs = collect_spec_paths(&corpus_dir)?;
    println!("Found {} specs in {:?}", specs.len(), corpus_dir);

    let mut passed = 0usize;
    let mut failed = 0usize;
    let mut skipped = 0usize;

    for spec_path in specs {
        let key = spec_path.to_string_lossy().to_string();
        let bytes = match std::fs::read(&spec_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("cannot read {key}: {e}");
                failed += 1;
                continue;
            }
        };
        let hash = content_hash(&bytes);
        if !force && !cache.needs_test(&key, &hash, ttl) {
            skipped += 1;
            continue;
        }

        match typegenitor_core::generate(&bytes, &config) {
            Ok(_) => {
                cache.record(&key, &hash, true);
                passed += 1;
            }
            Err(e) => {
                eprintln!("{key}: {e}");
                cache.record(&key, &hash, false);
                failed += 1;
            }
        }
    }

    cache.save(&cache_path)?;
    println!("passed: {passed}, failed: {failed}, skipped: {skipped}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    match args.command {
        Command::Mirror {
            concurrency,
            sleep_duration,
            output_dir,
        } => mirror(concurrency, sleep_duration, output_dir).await,
        Command::Run {
            corpus_dir,
            ttl_hours,
            force,
        } => run_corpus(corpus_dir, ttl_hours, force),
    }
}
