mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use api::auth::{AuthConfig, HR_ROLE, hash_password};
use api::{AppState, build_router};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter};
use tokio::net::TcpListener;
use tracing::{Level, info};

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "staffdesk", version, about = "StaffDesk HRMS server")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run HTTP server
    Serve {
        #[arg(long, help = "Listen address, overrides BIND")]
        bind: Option<String>,
    },
    /// Run migrations (up|down|reset)
    Migrate {
        #[arg(long, default_value = "up")]
        action: String,
    },
    /// Seed sample data
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load();
    let db = Arc::new(Database::connect(&config.database_url).await?);

    match cli.cmd {
        Cmd::Migrate { action } => {
            match action.as_str() {
                "up" => Migrator::up(db.as_ref(), None).await?,
                "down" => Migrator::down(db.as_ref(), None).await?,
                "reset" => Migrator::reset(db.as_ref()).await?,
                _ => eprintln!("Unknown action: {} (use up|down|reset)", action),
            }
            Ok(())
        }
        Cmd::Seed => {
            Migrator::up(db.as_ref(), None).await?;
            seed(db.as_ref()).await?;
            Ok(())
        }
        Cmd::Serve { bind } => {
            Migrator::up(db.as_ref(), None).await?;
            let state = AppState {
                db: db.clone(),
                auth: Arc::new(AuthConfig {
                    jwt_secret: config.jwt_secret.clone(),
                    token_ttl_minutes: config.token_ttl_minutes,
                }),
                templates_dir: config.templates_dir.clone(),
                static_dir: config.static_dir.clone(),
                cors_allowed_origins: config.cors_allowed_origins.clone(),
            };
            let app = build_router(state);

            let addr: SocketAddr = bind.unwrap_or(config.bind).parse()?;
            let listener = TcpListener::bind(addr).await?;
            info!("listening on http://{}", addr);
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            Ok(())
        }
    }
}

async fn seed(db: &DatabaseConnection) -> Result<()> {
    use chrono::Utc;
    use entity::{account, department, employee, performance_review, role};
    use sea_orm::{ActiveModelTrait, Set};

    let existing = account::Entity::find()
        .filter(account::Column::Username.eq("hr.admin"))
        .one(db)
        .await?;
    if existing.is_some() {
        info!("seed data already present; nothing to do");
        return Ok(());
    }

    account::ActiveModel {
        username: Set("hr.admin".into()),
        password_hash: Set(hash_password("changeme")?),
        role: Set(HR_ROLE.into()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    account::ActiveModel {
        username: Set("staff.demo".into()),
        password_hash: Set(hash_password("changeme")?),
        role: Set("employee".into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let engineering = department::ActiveModel {
        name: Set("Engineering".into()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    department::ActiveModel {
        name: Set("People Operations".into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let engineer = role::ActiveModel {
        name: Set("Software Engineer".into()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    role::ActiveModel {
        name: Set("HR Manager".into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let ada = employee::ActiveModel {
        first_name: Set("Ada".into()),
        last_name: Set("Lovelace".into()),
        email: Set("ada@staffdesk.test".into()),
        department_id: Set(Some(engineering.id)),
        role_id: Set(Some(engineer.id)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    performance_review::ActiveModel {
        employee_id: Set(ada.id),
        review_date: Set(Utc::now().date_naive()),
        comments: Set("Consistently strong delivery.".into()),
        rating: Set(5),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("seed data inserted");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler")
    };
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    tokio::select! { _ = ctrl_c => {}, _ = terminate => {}, }
}
