use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;

use tapak_cli::admin;
use tapak_core::{Action, Resource, Role};
use tapak_db::{DatabaseConfig, PgPool, init_db_pool};

#[derive(Parser)]
#[command(name = "tapak-cli")]
#[command(about = "Tapak CLI - Administrative tools for the Tapak API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator account
    CreateAdmin {
        /// Display name
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Grant a permission to a role
    Grant {
        role: Role,
        resource: Resource,
        action: Action,
    },
    /// Revoke a permission from a role
    Revoke {
        role: Role,
        resource: Resource,
        action: Action,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let pool = match connect().await {
        Ok(pool) => pool,
        Err(e) => fail(&e),
    };

    match cli.command {
        Commands::CreateAdmin {
            name,
            email,
            password,
        } => handle_create_admin(&pool, name, email, password).await,
        Commands::Grant {
            role,
            resource,
            action,
        } => match admin::grant(&pool, role, resource, action).await {
            Ok(true) => println!("✅ Granted {}:{} to {}", resource, action, role),
            Ok(false) => println!("ℹ️  {} already has {}:{}", role, resource, action),
            Err(e) => fail(&e),
        },
        Commands::Revoke {
            role,
            resource,
            action,
        } => match admin::revoke(&pool, role, resource, action).await {
            Ok(true) => println!("✅ Revoked {}:{} from {}", resource, action, role),
            Ok(false) => println!("ℹ️  {} did not have {}:{}", role, resource, action),
            Err(e) => fail(&e),
        },
    }
}

async fn connect() -> Result<PgPool, String> {
    let config = DatabaseConfig::from_env().map_err(|_| "DATABASE_URL must be set".to_string())?;
    init_db_pool(&config)
        .await
        .map_err(|e| format!("Failed to connect to database: {}", e))
}

fn fail(error: &dyn std::fmt::Display) -> ! {
    eprintln!("\n❌ Error: {}", error);
    std::process::exit(1);
}

fn prompt_text(value: Option<String>, prompt: &str) -> Result<String, dialoguer::Error> {
    match value {
        Some(v) => Ok(v),
        None => Input::new().with_prompt(prompt).interact_text(),
    }
}

fn prompt_password(value: Option<String>) -> Result<String, dialoguer::Error> {
    match value {
        Some(v) => Ok(v),
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact(),
    }
}

async fn handle_create_admin(
    pool: &PgPool,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) {
    let input = prompt_text(name, "Name").and_then(|name| {
        let email = prompt_text(email, "Email address")?;
        let password = prompt_password(password)?;
        Ok((name, email, password))
    });
    let (name, email, password) = match input {
        Ok(values) => values,
        Err(e) => fail(&e),
    };

    match admin::create_admin(pool, &name, &email, &password).await {
        Ok(id) => {
            println!("\n✅ Admin created successfully!");
            println!("   ID: {}", id);
            println!("   Email: {}", email);
            println!("   Name: {}", name);
        }
        Err(e) => fail(&e),
    }
}
