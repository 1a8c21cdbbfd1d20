use clap::{Parser, Subcommand};

use farmstead_api::auth::password;
use farmstead_api::database::manager::DatabaseManager;
use farmstead_api::database::migrations;
use farmstead_api::database::models::role::ROLE_ADMIN;

#[derive(Parser)]
#[command(name = "farmctl")]
#[command(about = "Farmstead admin CLI - migrations and account bootstrap")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run schema migrations against DATABASE_URL")]
    Migrate,

    #[command(about = "Create an administrator account")]
    CreateAdmin {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "Administrator")]
        name: String,

        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let pool = DatabaseManager::pool().await?;

    match cli.command {
        Commands::Migrate => {
            migrations::run(&pool).await?;
            println!("Migrations complete");
        }
        Commands::CreateAdmin {
            username,
            email,
            name,
            password,
        } => {
            // Tables and roles must exist before the insert can work
            migrations::run(&pool).await?;

            let taken: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM \"users\" WHERE username = $1)")
                    .bind(&username)
                    .fetch_one(&pool)
                    .await?;
            if taken {
                anyhow::bail!("username {:?} is already taken", username);
            }

            if password.len() < 8 {
                anyhow::bail!("password must be at least 8 characters");
            }

            let role_id: i64 = sqlx::query_scalar("SELECT id FROM \"roles\" WHERE name = $1")
                .bind(ROLE_ADMIN)
                .fetch_one(&pool)
                .await?;

            let salt = password::generate_salt(&username);
            let password_hash = password::hash(&password, &salt);

            let user_id: i64 = sqlx::query_scalar(
                "INSERT INTO \"users\" (\"username\", \"email\", \"name\", \"password_hash\", \"role_id\")
                 VALUES ($1, $2, $3, $4, $5) RETURNING id",
            )
            .bind(&username)
            .bind(&email)
            .bind(&name)
            .bind(&password_hash)
            .bind(role_id)
            .fetch_one(&pool)
            .await?;

            println!("Created admin account {} (id {})", username, user_id);
        }
    }

    Ok(())
}
