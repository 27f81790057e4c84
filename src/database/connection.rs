use mongodb::{
    bson::doc,
    options::IndexOptions,
    Client, Database, IndexModel,
};

use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::early_access::EarlyAccess;
use crate::models::team::Team;
use crate::models::user::User;

pub const USERS: &str = "cricketusers";
pub const MATCHES: &str = "matches";
pub const TEAMS: &str = "teams";
pub const CONTESTS: &str = "contests";
pub const EARLY_ACCESS: &str = "earlyaccesses";
pub const ACTIVITIES: &str = "CricketActivities";

pub async fn get_db_client(config: &AppConfig) -> Result<Database> {
    let client = Client::with_uri_str(&config.database_url).await?;
    let db = client.database(&config.database_name);

    match db.list_collection_names().await {
        Ok(collections) => {
            tracing::info!("Connected to database {} ({} collections)", config.database_name, collections.len());
        }
        Err(e) => {
            tracing::warn!("Database '{}' may be unreachable: {}", config.database_name, e);
        }
    }

    Ok(db)
}

/// Creates the unique indexes the handlers rely on to detect races.
pub async fn ensure_indexes(db: &Database) -> Result<()> {
    let unique = || IndexOptions::builder().unique(true).build();

    db.collection::<Team>(TEAMS)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "userId": 1, "matchId": 1, "teamName": 1 })
                .options(unique())
                .build(),
        )
        .await?;
    db.collection::<Team>(TEAMS)
        .create_index(IndexModel::builder().keys(doc! { "userId": 1, "matchId": 1 }).build())
        .await?;

    let users = db.collection::<User>(USERS);
    users
        .create_index(IndexModel::builder().keys(doc! { "userId": 1 }).options(unique()).build())
        .await?;
    users
        .create_index(IndexModel::builder().keys(doc! { "phoneNumber": 1 }).options(unique()).build())
        .await?;
    users
        .create_index(
            IndexModel::builder()
                .keys(doc! { "panCardNumber": 1 })
                .options(IndexOptions::builder().unique(true).sparse(true).build())
                .build(),
        )
        .await?;

    db.collection::<EarlyAccess>(EARLY_ACCESS)
        .create_index(IndexModel::builder().keys(doc! { "referralId": 1 }).options(unique()).build())
        .await?;

    tracing::info!("Indexes ensured");
    Ok(())
}
