//! CLI module - Command-line interface definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::fetch::DirFetcher;
use crate::manifest::{ResourceManifest, MANIFEST_ENTRY};
use crate::store::{BucketStore, DiskStore};
use crate::worker::{CacheWorker, Request, CONTENT_BUCKET, MANIFEST_BUCKET, TEMP_BUCKET};

/// appshell - a versioned offline asset cache driven by a resource manifest.
#[derive(Parser, Debug)]
#[command(name = "appshell")]
#[command(
    author,
    version,
    about,
    long_about = r#"appshell maintains a durable local cache of an application's static
assets, keyed by a content-hash resource manifest.

A deployment is a two-phase protocol: `install` stages the application
shell in a temporary bucket without touching the served cache, and
`activate` diffs the previous manifest against the new one so unchanged
assets survive the upgrade without re-downloading. After activation,
`get` serves requests cache-first (online-first for the root document).

Examples:
    appshell install --manifest resources.json --core index.html --core main.dart.js
    appshell activate --manifest resources.json
    appshell get http://localhost/main.dart.js --manifest resources.json
    appshell message downloadOffline --manifest resources.json
    appshell status
"#
)]
pub struct Cli {
    /// Directory holding the durable cache buckets.
    #[arg(
        long,
        global = true,
        default_value = ".appshell",
        value_name = "DIR",
        long_help = "Directory holding the durable cache buckets.\n\n\
The same directory must be used across install/activate invocations for\n\
the upgrade path to find the previous generation's manifest."
    )]
    pub cache_dir: PathBuf,

    /// Origin URL used to derive site-relative resource keys.
    #[arg(
        long,
        global = true,
        default_value = "http://localhost",
        value_name = "URL",
        long_help = "Origin URL used to derive site-relative resource keys from request\n\
URLs. Requests for other origins are never intercepted."
    )]
    pub origin: String,

    /// Directory standing in for the network origin.
    #[arg(
        long,
        global = true,
        default_value = ".",
        value_name = "DIR",
        long_help = "Directory the fetcher reads resources from, standing in for the\n\
network origin. The root document maps to index.html within it."
    )]
    pub origin_dir: PathBuf,

    /// Verbose mode (more diagnostics).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stage the application shell for a new build (install phase).
    #[command(
        long_about = "Fetch every core-set resource with cache-bypassing semantics and\n\
stage it in the temporary bucket. The served cache and the persisted\n\
manifest are not touched, so a failed install leaves the previous\n\
generation fully servable.\n\n\
Example:\n\
  appshell install --manifest resources.json --core index.html --core main.dart.js\n"
    )]
    Install {
        /// The new build's resource manifest (flat JSON path→fingerprint map).
        #[arg(long, value_name = "FILE")]
        manifest: PathBuf,

        /// Core-set resource path; repeat in bootstrap order.
        #[arg(long = "core", value_name = "PATH", required = true)]
        core: Vec<String>,
    },

    /// Promote the staged build to the served cache (activate phase).
    #[command(
        long_about = "Diff the previously persisted manifest against the new one: entries\n\
whose fingerprint is unchanged are kept, everything else is pruned, and\n\
the staged core set overwrites its cached copies. On the first ever\n\
activation the served cache is rebuilt from staging wholesale. Any\n\
failure wipes all cache buckets so the next install runs cold.\n"
    )]
    Activate {
        /// The new build's resource manifest.
        #[arg(long, value_name = "FILE")]
        manifest: PathBuf,
    },

    /// Resolve one request through the cache policies.
    #[command(
        long_about = "Intercept a single GET request the way the steady-state worker\n\
would: manifest-listed keys are served cache-first (online-first for the\n\
root document); anything else passes through untouched. Prints a one-line\n\
JSON result record; the body goes to --out when given.\n\n\
Examples:\n\
  appshell get http://localhost/main.dart.js --manifest resources.json\n\
  appshell get http://localhost --manifest resources.json --offline\n"
    )]
    Get {
        /// Absolute request URL.
        url: String,

        /// The active build's resource manifest.
        #[arg(long, value_name = "FILE")]
        manifest: PathBuf,

        /// Write the response body to this file.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Simulate a lost network (every fetch fails).
        #[arg(long)]
        offline: bool,
    },

    /// Deliver a control message to the worker.
    #[command(
        long_about = "Deliver an out-of-band control message. Payloads are exact string\n\
matches: 'skipWaiting' forces an immediate takeover, 'downloadOffline'\n\
best-effort fetches every manifest resource not yet cached. Unknown\n\
payloads are ignored.\n"
    )]
    Message {
        /// Message payload (skipWaiting | downloadOffline).
        payload: String,

        /// The active build's resource manifest.
        #[arg(long, value_name = "FILE")]
        manifest: PathBuf,
    },

    /// Dump bucket contents and the persisted manifest summary.
    #[command(
        long_about = "Print one JSON record per cached entry plus a summary of the\n\
persisted manifest. Intended for debugging and scripting.\n"
    )]
    Status,
}

/// Initialize tracing to stderr; `--verbose` raises the default filter.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "appshell=debug" } else { "appshell=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Install {
            ref manifest,
            ref core,
        } => {
            let mut worker = build_worker(&cli, manifest, core.clone(), false).await?;
            worker.install().await.context("install failed")?;
            println!(
                "{}",
                serde_json::json!({"phase": "install", "staged": core.len()})
            );
            Ok(())
        }

        Commands::Activate { ref manifest } => {
            let mut worker = build_worker(&cli, manifest, Vec::new(), false).await?;
            worker.activate().await.context("activation failed")?;
            println!(
                "{}",
                serde_json::json!({"phase": "activate", "resources": worker.manifest().len()})
            );
            Ok(())
        }

        Commands::Get {
            ref url,
            ref manifest,
            ref out,
            offline,
        } => {
            let worker = build_worker(&cli, manifest, Vec::new(), offline).await?;
            let request = Request::get(url.clone());

            match worker.handle_fetch(&request).await? {
                Some(hit) => {
                    println!(
                        "{}",
                        serde_json::json!({
                            "intercepted": true,
                            "key": hit.key,
                            "source": hit.source.as_str(),
                            "status": hit.response.status,
                            "bytes": hit.response.body.len(),
                        })
                    );
                    if let Some(path) = out {
                        std::fs::write(path, &hit.response.body)
                            .with_context(|| format!("failed to write {}", path.display()))?;
                    }
                }
                None => {
                    println!(
                        "{}",
                        serde_json::json!({"intercepted": false, "url": url})
                    );
                }
            }
            Ok(())
        }

        Commands::Message {
            ref payload,
            ref manifest,
        } => {
            let mut worker = build_worker(&cli, manifest, Vec::new(), false).await?;
            worker.handle_message(payload).await?;
            println!("{}", serde_json::json!({"message": payload}));
            Ok(())
        }

        Commands::Status => run_status(&cli).await,
    }
}

async fn build_worker(
    cli: &Cli,
    manifest_path: &PathBuf,
    core: Vec<String>,
    offline: bool,
) -> Result<CacheWorker<DiskStore, DirFetcher>> {
    let store = DiskStore::open_or_create(&cli.cache_dir)
        .await
        .context("failed to open cache store")?;
    let fetcher = DirFetcher::new(&cli.origin_dir).offline(offline);
    let manifest = ResourceManifest::load(manifest_path)
        .with_context(|| format!("failed to load manifest {}", manifest_path.display()))?;

    Ok(CacheWorker::new(
        store,
        fetcher,
        cli.origin.clone(),
        manifest,
        core,
    ))
}

async fn run_status(cli: &Cli) -> Result<()> {
    let store = DiskStore::open_or_create(&cli.cache_dir)
        .await
        .context("failed to open cache store")?;

    for bucket in [CONTENT_BUCKET, TEMP_BUCKET] {
        for key in store.keys(bucket).await? {
            let bytes = store
                .get(bucket, &key)
                .await?
                .map(|b| b.len())
                .unwrap_or(0);
            println!(
                "{}",
                serde_json::json!({"bucket": bucket, "key": key, "bytes": bytes})
            );
        }
    }

    match store.get(MANIFEST_BUCKET, MANIFEST_ENTRY).await? {
        Some(bytes) => {
            let manifest = ResourceManifest::from_bytes(&bytes)?;
            println!(
                "{}",
                serde_json::json!({
                    "bucket": MANIFEST_BUCKET,
                    "key": MANIFEST_ENTRY,
                    "resources": manifest.len(),
                })
            );
        }
        None => {
            println!(
                "{}",
                serde_json::json!({"bucket": MANIFEST_BUCKET, "key": null})
            );
        }
    }

    Ok(())
}
