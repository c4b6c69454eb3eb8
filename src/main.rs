//! Tenant Preview Proxy
//!
//! An edge proxy that serves many tenants from one deployed application.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────────┐
//!                         │                 PREVIEW PROXY                      │
//!                         │                                                    │
//!   Client Request        │  ┌────────┐   ┌─────────┐   ┌─────────────────┐   │
//!   acme---app.x.dev/dash─┼─▶│  http  │──▶│ routing │──▶│    rewrite      │   │
//!                         │  │ server │   │  scope  │   │ host → /acme/…  │   │
//!                         │  └────────┘   └─────────┘   └────────┬────────┘   │
//!                         │                                      │            │
//!                         │                                      ▼            │
//!   Client Response       │  ┌────────┐   ┌──────────────────────────────┐   │
//!   ◀─────────────────────┼──│response│◀──│ forward  GET /acme/dash      │◀──┼── Upstream
//!                         │  └────────┘   │ Host: acme---app.x.dev       │   │   App
//!                         │               └──────────────────────────────┘   │
//!                         │                                                    │
//!                         │  config · observability · lifecycle · admin        │
//!                         └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "tenant-preview-proxy")]
#[command(about = "Rewrites tenant preview hosts into tenant-prefixed paths", long_about = None)]
struct Args {
    /// Path to the TOML configuration file (watched for changes).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    tenant_preview_proxy::lifecycle::startup::run(args.config.as_deref()).await
}
