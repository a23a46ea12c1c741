mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use la_avatar::{AvatarServices, AvatarStore, Role, UploadStorage};
use la_core::config::Config;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from --verbose.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "localavatars=trace,la_server=trace,la_avatar=trace,la_db=debug,la_core=debug,tower_http=debug".to_string()
        } else {
            "localavatars=info,la_server=info,la_avatar=info,la_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let mut config = Config::load_or_default(cli.config.as_deref());
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(la_server::start(config, cli.config))?;
            Ok(())
        }
        Commands::Validate { config } => validate(config.as_deref().or(cli.config.as_deref())),
        Commands::AddUser {
            login,
            email,
            display_name,
            role,
        } => add_user(
            cli.config.as_deref(),
            &login,
            &email,
            display_name.as_deref().unwrap_or(&login),
            &role,
        ),
        Commands::Sweep { yes } => sweep(cli.config.as_deref(), yes),
        Commands::Version => {
            println!("localavatars {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("reading {}", p.display()))?;
            Config::from_json(&contents)?
        }
        None => Config::default(),
    };

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("Configuration is valid");
    } else {
        for w in &warnings {
            println!("warning: {w}");
        }
    }
    Ok(())
}

fn open_db(config: &Config) -> Result<la_db::pool::DbPool> {
    if let Some(parent) = config.server.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(la_db::pool::init_pool(&config.server.db_path.to_string_lossy())?)
}

fn add_user(
    config_path: Option<&Path>,
    login: &str,
    email: &str,
    display_name: &str,
    role: &str,
) -> Result<()> {
    let role: Role = role.parse()?;
    if !email.contains('@') {
        bail!("'{email}' is not an email address");
    }

    let config = Config::load_or_default(config_path);
    let db = open_db(&config)?;
    let conn = la_db::pool::get_conn(&db)?;
    let user =
        la_db::queries::users::create_user(&conn, login, email, display_name, role.as_str())?;

    tracing::info!(user_id = %user.id, login, role = %role, "Created user");
    println!("id:    {}", user.id);
    println!("token: {}", user.api_token);
    Ok(())
}

fn sweep(config_path: Option<&Path>, yes: bool) -> Result<()> {
    if !yes {
        bail!("refusing to delete every avatar without --yes");
    }

    let config = Config::load_or_default(config_path);
    let db = open_db(&config)?;
    let storage = UploadStorage::new(
        &config.uploads.dir,
        &config.uploads.base_url,
        &config.server.public_url,
    );
    let store = AvatarStore::new(AvatarServices::with_defaults(db, storage));
    let removed = store.sweep()?;
    println!("Removed {removed} avatar(s)");
    Ok(())
}
