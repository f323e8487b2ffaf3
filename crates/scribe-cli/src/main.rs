use clap::Parser;
use anyhow::Context;
use dialoguer::{Confirm, Input};
use dotenvy::dotenv;
use scribe_auth::UserRole;
use scribe_cache::{Cache, CacheConfig};
use scribe_cli::{Cli, Commands, create_user, issue_token, run_cache_command};
use scribe_config::JwtConfig;
use scribe_db::{DatabaseConfig, init_db_pool};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::CreateUser {
            username,
            email,
            role,
        } => handle_create_user(username, email, role).await,
        Commands::IssueToken {
            user_id,
            email,
            role,
        } => issue_token(user_id, &email, role, &JwtConfig::from_env()),
        Commands::Cache { command } => {
            if let Some(prompt) = command.confirmation() {
                let confirmed = Confirm::new()
                    .with_prompt(prompt)
                    .default(false)
                    .interact()
                    .unwrap_or(false);
                if !confirmed {
                    println!("Aborted");
                    return;
                }
            }

            match Cache::connect(&CacheConfig::from_env()).await {
                Ok(cache) => {
                    let result = run_cache_command(&cache, &command).await;
                    cache.shutdown().await;
                    result
                }
                Err(e) => Err(anyhow::anyhow!("Failed to connect to cache: {e}")),
            }
        }
    };

    match result {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("❌ {e:#}");
            std::process::exit(1);
        }
    }
}

async fn handle_create_user(
    username: Option<String>,
    email: Option<String>,
    role: UserRole,
) -> anyhow::Result<String> {
    let username = match username {
        Some(username) => username,
        None => Input::new()
            .with_prompt("Username")
            .interact_text()
            .context("Failed to read username")?,
    };

    let email = match email {
        Some(email) => email,
        None => Input::new()
            .with_prompt("Email address")
            .interact_text()
            .context("Failed to read email")?,
    };

    let config = DatabaseConfig::from_env().context("DATABASE_URL must be set")?;
    let pool = init_db_pool(&config)
        .await
        .context("Failed to connect to database")?;

    let id = create_user(&pool, &username, &email, role).await;
    pool.close().await;

    Ok(format!("✅ Created {} {} ({})", role.as_str(), username.trim(), id?))
}
