//! Standalone contact-book service. Shares the stack with the HRMS server
//! but nothing else: its own SQLite database, its own table, no auth.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use dotenvy::dotenv;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait, QueryOrder,
    Schema, Set,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{Level, error, info};

mod contact {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "contact")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
        pub contact: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Clone)]
struct BookState {
    db: Arc<DatabaseConnection>,
    templates_dir: PathBuf,
}

#[derive(Serialize)]
struct ContactOut {
    id: i32,
    name: String,
    contact: String,
}

#[derive(Deserialize)]
struct ContactIn {
    name: String,
    contact: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()),
        )
        .init();

    let db_url = std::env::var("CONTACTBOOK_DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://contactbook.sqlite?mode=rwc".into());
    let db = Arc::new(Database::connect(&db_url).await?);
    ensure_schema(db.as_ref()).await?;

    let templates_dir = PathBuf::from(
        std::env::var("CONTACTBOOK_TEMPLATES_DIR").unwrap_or_else(|_| "templates".into()),
    );
    let state = BookState { db, templates_dir };

    let app = Router::new()
        .route("/", get(home_page))
        .route("/hari", get(hari_page))
        .route("/contacts", get(list_contacts).post(create_contact))
        .with_state(state);

    let bind = std::env::var("CONTACTBOOK_BIND").unwrap_or_else(|_| "127.0.0.1:8090".into());
    let addr: SocketAddr = bind.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("contact book listening on http://{}", addr);
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

async fn ensure_schema(db: &DatabaseConnection) -> Result<()> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut statement = schema.create_table_from_entity(contact::Entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}

async fn home_page(State(state): State<BookState>) -> Result<Html<String>, StatusCode> {
    render_page(&state, "index.html").await
}

async fn hari_page(State(state): State<BookState>) -> Result<Html<String>, StatusCode> {
    render_page(&state, "hi.html").await
}

async fn render_page(state: &BookState, name: &str) -> Result<Html<String>, StatusCode> {
    match tokio::fs::read_to_string(state.templates_dir.join(name)).await {
        Ok(contents) => Ok(Html(contents)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(StatusCode::NOT_FOUND),
        Err(err) => {
            error!(error = %err, "failed to read page");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn list_contacts(State(state): State<BookState>) -> Result<Json<Vec<ContactOut>>, StatusCode> {
    let rows = contact::Entity::find()
        .order_by_asc(contact::Column::Id)
        .all(state.db.as_ref())
        .await
        .map_err(internal)?;
    Ok(Json(
        rows.into_iter()
            .map(|row| ContactOut {
                id: row.id,
                name: row.name,
                contact: row.contact,
            })
            .collect(),
    ))
}

async fn create_contact(
    State(state): State<BookState>,
    Json(payload): Json<ContactIn>,
) -> Result<(StatusCode, Json<ContactOut>), StatusCode> {
    let created = contact::ActiveModel {
        name: Set(payload.name),
        contact: Set(payload.contact),
        ..Default::default()
    }
    .insert(state.db.as_ref())
    .await
    .map_err(internal)?;
    Ok((
        StatusCode::CREATED,
        Json(ContactOut {
            id: created.id,
            name: created.name,
            contact: created.contact,
        }),
    ))
}

fn internal(err: sea_orm::DbErr) -> StatusCode {
    error!(error = %err, "database error");
    StatusCode::INTERNAL_SERVER_ERROR
}
