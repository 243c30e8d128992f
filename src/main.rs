use std::sync::Arc;

use color_eyre::eyre::eyre;
use tokio::sync::RwLock;

use team_roster::{
    app_state::AppState,
    get_postgres_pool,
    services::{
        data_stores::{PostgresMemberStore, PostgresTeamStore},
        sample_data::seed_sample_members,
    },
    utils::{
        constants::{APP_ADDRESS, DATABASE_URL, SEED_SAMPLE_DATA},
        tracing::init_tracing,
    },
    Application,
};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_tracing()?;

    let pg_pool = get_postgres_pool(&DATABASE_URL).await?;
    sqlx::migrate!().run(&pg_pool).await?;

    let member_store =
        Arc::new(RwLock::new(PostgresMemberStore::new(pg_pool.clone())));
    let team_store = Arc::new(RwLock::new(PostgresTeamStore::new(pg_pool)));
    let app_state = AppState::new(member_store, team_store);

    if *SEED_SAMPLE_DATA {
        seed_sample_members(&app_state.member_store).await?;
    }

    let app = Application::build(app_state, &APP_ADDRESS)
        .await
        .map_err(|e| eyre!("Failed to build app: {e}"))?;

    app.run().await?;
    Ok(())
}
