//! # Scribe CLI
//!
//! Operator tools for the Scribe API:
//!
//! - `create-user`: insert an account, since the API has no sign-up route
//! - `issue-token`: sign a bearer token for a user, for local testing and
//!   scripted maintenance
//! - `cache ...`: check the cache and run the same invalidation helpers the
//!   API uses after writes
//!
//! ```bash
//! scribe-cli create-user --username ada --email ada@example.com --role admin
//! scribe-cli issue-token --user-id 0b6f... --email ops@example.com --role admin
//! scribe-cli cache clear-blog my-first-post
//! scribe-cli cache clear-all-blogs --yes
//! ```

use anyhow::{Context, anyhow, ensure};
use clap::{Parser, Subcommand};
use scribe_auth::{UserRole, create_access_token};
use scribe_cache::{Cache, invalidate};
use scribe_config::JwtConfig;
use scribe_db::PgPool;
use uuid::Uuid;

const MAX_USERNAME_LENGTH: usize = 20;
const MAX_EMAIL_LENGTH: usize = 50;

#[derive(Debug, Parser)]
#[command(name = "scribe-cli")]
#[command(about = "Scribe CLI - Operator tools for the Scribe API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a user account
    CreateUser {
        /// Username (prompted if not provided)
        #[arg(short = 'u', long)]
        username: Option<String>,

        /// Email address (prompted if not provided)
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Role (admin or user)
        #[arg(short = 'r', long, default_value = "user", value_parser = parse_role)]
        role: UserRole,
    },
    /// Sign an access token with the configured JWT secret
    IssueToken {
        /// Subject of the token
        #[arg(short = 'u', long)]
        user_id: Uuid,

        /// Email claim
        #[arg(short = 'e', long)]
        email: String,

        /// Role claim (admin or user)
        #[arg(short = 'r', long, default_value = "user", value_parser = parse_role)]
        role: UserRole,
    },
    /// Inspect or invalidate the cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum CacheCommand {
    /// Check that the cache answers
    Ping,
    /// Drop the cached post for a slug
    ClearBlog { slug: String },
    /// Drop every cached page of the post list
    ClearBlogs {
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Drop every cached page of one author's posts
    ClearUserBlogs { user_id: Uuid },
    /// Drop every cached post listing
    ClearAllBlogs {
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Drop every cached page of the comment feed
    ClearComments {
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Drop the cached profile of a user
    ClearUser { user_id: Uuid },
    /// Drop the cache entry keyed by a user's email
    ClearUserEmail { email: String },
}

impl CacheCommand {
    /// Bulk commands that need confirmation, with their prompt.
    pub fn confirmation(&self) -> Option<&'static str> {
        match self {
            CacheCommand::ClearBlogs { yes: false } => Some("Clear every cached post list page?"),
            CacheCommand::ClearAllBlogs { yes: false } => {
                Some("Clear every cached post listing, including per-author pages?")
            }
            CacheCommand::ClearComments { yes: false } => {
                Some("Clear every cached comment feed page?")
            }
            _ => None,
        }
    }
}

fn parse_role(value: &str) -> Result<UserRole, String> {
    value.parse()
}

/// Inserts a user row and returns its id.
///
/// # Errors
///
/// Fails on an empty or oversized username or email, or when either is
/// already taken.
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    role: UserRole,
) -> anyhow::Result<Uuid> {
    let username = username.trim();
    let email = email.trim();

    ensure!(
        (1..=MAX_USERNAME_LENGTH).contains(&username.chars().count()),
        "Username must be 1-{MAX_USERNAME_LENGTH} characters"
    );
    ensure!(
        email.contains('@') && email.chars().count() <= MAX_EMAIL_LENGTH,
        "Email must be a valid address of at most {MAX_EMAIL_LENGTH} characters"
    );

    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (username, email, role) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(username)
    .bind(email)
    .bind(role.as_str())
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e
            && db_err.is_unique_violation()
        {
            return anyhow!("Username or email already exists");
        }
        anyhow::Error::from(e).context("Failed to create user")
    })
}

/// Signs a token for the given identity.
pub fn issue_token(
    user_id: Uuid,
    email: &str,
    role: UserRole,
    jwt_config: &JwtConfig,
) -> anyhow::Result<String> {
    create_access_token(user_id, email, role, jwt_config)
        .map_err(|e| e.error)
        .context("Failed to sign token")
}

/// Runs a cache command against `cache`. Confirmation is the caller's job.
pub async fn run_cache_command(cache: &Cache, command: &CacheCommand) -> anyhow::Result<String> {
    let cache_ref = Some(cache);

    let message = match command {
        CacheCommand::Ping => {
            cache
                .ping()
                .await
                .context("Cache did not answer")?;
            format!("{} cache is reachable", cache.backend_name())
        }
        CacheCommand::ClearBlog { slug } => {
            invalidate::clear_blog_by_slug(cache_ref, slug).await;
            format!("Cleared cached post {slug}")
        }
        CacheCommand::ClearBlogs { .. } => {
            invalidate::clear_blog_list_cache(cache_ref).await;
            "Cleared post list pages".to_string()
        }
        CacheCommand::ClearUserBlogs { user_id } => {
            invalidate::clear_blog_cache_for_user(cache_ref, *user_id).await;
            format!("Cleared post pages of user {user_id}")
        }
        CacheCommand::ClearAllBlogs { .. } => {
            invalidate::clear_all_blog_caches(cache_ref).await;
            "Cleared all post listings".to_string()
        }
        CacheCommand::ClearComments { .. } => {
            invalidate::clear_comments_cache(cache_ref).await;
            "Cleared comment feed pages".to_string()
        }
        CacheCommand::ClearUser { user_id } => {
            invalidate::clear_user_cache(cache_ref, *user_id).await;
            format!("Cleared cached profile of user {user_id}")
        }
        CacheCommand::ClearUserEmail { email } => {
            invalidate::clear_user_cache_by_email(cache_ref, email).await;
            format!("Cleared cache entry for {email}")
        }
    };

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_auth::verify_token;
    use scribe_cache::keys;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "cli-test-secret".to_string(),
            access_token_expiry: 60,
        }
    }

    #[test]
    fn test_parse_issue_token() {
        let id = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "scribe-cli",
            "issue-token",
            "--user-id",
            &id.to_string(),
            "--email",
            "ops@example.com",
            "--role",
            "ADMIN",
        ])
        .unwrap();

        match cli.command {
            Commands::IssueToken {
                user_id,
                email,
                role,
            } => {
                assert_eq!(user_id, id);
                assert_eq!(email, "ops@example.com");
                assert_eq!(role, UserRole::Admin);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_create_user() {
        let cli = Cli::try_parse_from([
            "scribe-cli",
            "create-user",
            "--username",
            "ada",
            "--email",
            "ada@example.com",
            "--role",
            "admin",
        ])
        .unwrap();

        match cli.command {
            Commands::CreateUser {
                username,
                email,
                role,
            } => {
                assert_eq!(username.as_deref(), Some("ada"));
                assert_eq!(email.as_deref(), Some("ada@example.com"));
                assert_eq!(role, UserRole::Admin);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_create_user_defaults() {
        let cli = Cli::try_parse_from(["scribe-cli", "create-user"]).unwrap();

        match cli.command {
            Commands::CreateUser {
                username,
                email,
                role,
            } => {
                assert!(username.is_none());
                assert!(email.is_none());
                assert_eq!(role, UserRole::User);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires PostgreSQL"]
    async fn test_create_user_inserts_row(pool: PgPool) {
        let id = create_user(&pool, " ada ", "ada@example.com", UserRole::Admin)
            .await
            .unwrap();

        let (username, role): (String, String) =
            sqlx::query_as("SELECT username, role FROM users WHERE id = $1")
                .bind(id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(username, "ada");
        assert_eq!(role, "admin");
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires PostgreSQL"]
    async fn test_create_user_rejects_duplicates(pool: PgPool) {
        create_user(&pool, "ada", "ada@example.com", UserRole::User)
            .await
            .unwrap();

        let err = create_user(&pool, "ada", "other@example.com", UserRole::User)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Username or email already exists");

        let err = create_user(&pool, "grace", "ada@example.com", UserRole::User)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Username or email already exists");
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires PostgreSQL"]
    async fn test_create_user_validates_input(pool: PgPool) {
        assert!(
            create_user(&pool, "", "ada@example.com", UserRole::User)
                .await
                .is_err()
        );
        assert!(
            create_user(&pool, "a_very_long_username_indeed", "ada@example.com", UserRole::User)
                .await
                .is_err()
        );
        assert!(
            create_user(&pool, "ada", "not-an-email", UserRole::User)
                .await
                .is_err()
        );

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_parse_rejects_unknown_role() {
        let result = Cli::try_parse_from([
            "scribe-cli",
            "issue-token",
            "--user-id",
            &Uuid::new_v4().to_string(),
            "--email",
            "ops@example.com",
            "--role",
            "owner",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_bulk_commands_need_confirmation() {
        let cli = Cli::try_parse_from(["scribe-cli", "cache", "clear-all-blogs"]).unwrap();
        let Commands::Cache { command } = cli.command else {
            panic!("expected cache command");
        };
        assert!(command.confirmation().is_some());

        let cli = Cli::try_parse_from(["scribe-cli", "cache", "clear-all-blogs", "--yes"]).unwrap();
        let Commands::Cache { command } = cli.command else {
            panic!("expected cache command");
        };
        assert!(command.confirmation().is_none());

        assert!(
            CacheCommand::ClearBlog {
                slug: "a".to_string()
            }
            .confirmation()
            .is_none()
        );
    }

    #[test]
    fn test_issued_token_verifies() {
        let config = jwt_config();
        let id = Uuid::new_v4();
        let token = issue_token(id, "ops@example.com", UserRole::Admin, &config).unwrap();

        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.user_id(), Some(id));
        assert_eq!(claims.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_clear_blog_removes_entry() {
        let cache = Cache::memory();
        let key = keys::blogs::by_slug("hello");
        cache.set(&key, "{}", None).await.unwrap();

        let message = run_cache_command(
            &cache,
            &CacheCommand::ClearBlog {
                slug: "hello".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(message, "Cleared cached post hello");
        assert_eq!(cache.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_comments_keeps_blog_entries() {
        let cache = Cache::memory();
        let page = keys::comments::list(0, 10);
        let blog = keys::blogs::by_slug("kept");
        cache.set(&page, "[]", None).await.unwrap();
        cache.set(&blog, "{}", None).await.unwrap();

        run_cache_command(&cache, &CacheCommand::ClearComments { yes: true })
            .await
            .unwrap();

        assert_eq!(cache.get(&page).await.unwrap(), None);
        assert!(cache.get(&blog).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_ping_reports_backend() {
        let cache = Cache::memory();
        let message = run_cache_command(&cache, &CacheCommand::Ping).await.unwrap();
        assert_eq!(message, "memory cache is reachable");
    }
}
