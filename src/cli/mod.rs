use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::UserRole;
use crate::events::{self, LogNotifier};
use crate::routes;
use crate::services::InvitationService;

#[derive(Parser)]
#[command(name = "tenantflow")]
#[command(about = "TenantFlow API - property management backend for owners and their tenants")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, help = "Port to bind (defaults to TENANTFLOW_PORT, PORT or 3001)")]
        port: Option<u16>,
    },

    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Mark lapsed invitations as EXPIRED")]
    ExpireInvitations,

    #[command(about = "Mint a development JWT")]
    Token {
        #[arg(long)]
        user_id: Uuid,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "OWNER")]
        role: String,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Serve { port } => serve(port).await,
        Commands::Migrate => migrate(output_format).await,
        Commands::ExpireInvitations => expire_invitations(output_format).await,
        Commands::Token { user_id, email, role } => token(user_id, email, &role, output_format),
    }
}

async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    let config = config::config();
    info!("Starting TenantFlow API in {:?} mode", config.environment);

    if config.database.run_migrations {
        if let Err(e) = DatabaseManager::migrate().await {
            warn!("Skipping startup migrations: {}", e);
        }
    }

    events::spawn_dispatcher(events::bus().subscribe(), Arc::new(LogNotifier));
    spawn_invitation_sweep(config.invitations.sweep_interval_secs);

    let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.api.port)));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "TenantFlow API listening");

    axum::serve(listener, routes::app())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    DatabaseManager::close().await;
    Ok(())
}

/// Periodically expire lapsed invitations; an interval of 0 disables the sweep
fn spawn_invitation_sweep(interval_secs: u64) {
    if interval_secs == 0 {
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            let pool = match DatabaseManager::pool().await {
                Ok(pool) => pool,
                Err(e) => {
                    debug!("Invitation sweep skipped: {}", e);
                    continue;
                }
            };
            if let Err(e) = InvitationService::new(pool).expire_stale().await {
                warn!("Invitation sweep failed: {}", e);
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn migrate(output_format: OutputFormat) -> anyhow::Result<()> {
    DatabaseManager::migrate().await.context("migration failed")?;
    match output_format {
        OutputFormat::Json => println!("{}", json!({ "success": true, "migrated": true })),
        OutputFormat::Text => println!("Migrations applied"),
    }
    Ok(())
}

async fn expire_invitations(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::pool().await?;
    let expired = InvitationService::new(pool).expire_stale().await?;
    match output_format {
        OutputFormat::Json => println!("{}", json!({ "success": true, "expired": expired })),
        OutputFormat::Text => println!("Expired {} invitation(s)", expired),
    }
    Ok(())
}

fn token(user_id: Uuid, email: String, role: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let role: UserRole = role.parse().map_err(anyhow::Error::msg)?;
    let claims = Claims::new(user_id, email, role);
    let token = generate_jwt(&claims)?;
    match output_format {
        OutputFormat::Json => println!("{}", json!({ "token": token, "expires_at": claims.exp })),
        OutputFormat::Text => println!("{}", token),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_with_port() {
        let cli = Cli::try_parse_from(["tenantflow", "serve", "--port", "8080"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { port: Some(8080) }));
    }

    #[test]
    fn serve_help_names_the_configured_default_port() {
        use clap::CommandFactory;

        let command = Cli::command();
        let serve = command.find_subcommand("serve").unwrap();
        let port = serve.get_arguments().find(|a| a.get_id() == "port").unwrap();
        let help = port.get_help().unwrap().to_string();
        assert!(help.contains(&config::DEFAULT_PORT.to_string()), "{}", help);
    }

    #[test]
    fn parses_token_with_default_role() {
        let id = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "tenantflow",
            "token",
            "--user-id",
            &id.to_string(),
            "--email",
            "owner@example.com",
        ])
        .unwrap();
        match cli.command {
            Commands::Token { user_id, role, .. } => {
                assert_eq!(user_id, id);
                assert_eq!(role, "OWNER");
            }
            _ => panic!("expected token command"),
        }
    }

    #[test]
    fn json_flag_is_global() {
        let cli = Cli::try_parse_from(["tenantflow", "expire-invitations", "--json"]).unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
    }

    #[test]
    fn rejects_invalid_user_id() {
        assert!(Cli::try_parse_from(["tenantflow", "token", "--user-id", "nope", "--email", "a@b.co"]).is_err());
    }
}
