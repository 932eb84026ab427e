//!
//! rolodex server binary
//! ---------------------
//! Command-line entry point for the contacts API. Configuration comes from
//! the environment (ROLODEX_PORT, ROLODEX_SESSION_TTL_SECS, GOOGLE_CLIENT_ID,
//! GOOGLE_CLIENT_SECRET, ROLODEX_OAUTH_REDIRECT); a --port flag overrides
//! the environment.

use anyhow::Result;
use std::env;

use rolodex::config::Config;

fn parse_port_arg(args: &[String], flag: &str) -> Option<u16> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return args[i + 1].parse::<u16>().ok();
        }
        i += 1;
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!(
            "rolodex server\n\nUSAGE:\n  rolodex_server [--port N]\n\nOPTIONS:\n  --port N    HTTP port (env: ROLODEX_PORT, default 3000)\n\nENVIRONMENT:\n  ROLODEX_SESSION_TTL_SECS    session lifetime (default 3600)\n  GOOGLE_CLIENT_ID            enables Google OAuth when set\n  GOOGLE_CLIENT_SECRET        required alongside the client id\n  ROLODEX_OAUTH_REDIRECT      OAuth callback URL\n"
        );
        return Ok(());
    }

    let mut config = Config::from_env();
    if let Some(port) = parse_port_arg(&args, "--port") {
        config.port = port;
    }

    println!("rolodex starting on port {}", config.port);
    tracing::info!(
        "Using port={} session_ttl_secs={} oauth={}",
        config.port,
        config.session_ttl.as_secs(),
        config.google.is_some()
    );

    rolodex::server::run(config).await
}
