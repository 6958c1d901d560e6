// SPDX-License-Identifier: MIT

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use college_db::college::entity::Role;
use college_db::college::server;
use college_db::college::store::{users, Store};
use college_db::config::Settings;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file (defaults to college-db.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path, overriding the settings
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Create the database schema and exit
    InitDb,
    /// Grant the admin role to an existing user
    Promote {
        #[arg(short, long)]
        username: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    // Request spans from the HTTP trace layer
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("installing tracing subscriber")?;

    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(database) = args.database {
        settings.database.path = database;
    }

    match args.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            server::serve(&settings).await?;
        }
        Commands::InitDb => {
            let store = Store::open(&settings.database.path)?;
            println!(
                "Database {} ready (schema version {})",
                settings.database.path.display(),
                store.schema_version()?
            );
        }
        Commands::Promote { username } => {
            let store = Store::open(&settings.database.path)?;
            let user = store.with_conn(|conn| users::find_by_username(conn, &username))?;
            let Some(user) = user else {
                bail!("user '{}' does not exist", username);
            };
            store.with_conn(|conn| users::set_role(conn, user.user_id, Role::Admin))?;
            println!("{} (id {}) is now an admin", user.username, user.user_id);
        }
    }

    Ok(())
}
