use reqwest::Response;
use secrecy::ExposeSecret;
use serde_json::Value;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Connection, Executor, PgConnection, PgPool,
};
use std::{str::FromStr, sync::Arc};
use team_roster::{
    app_state::{AppState, MemberStoreType, TeamStoreType},
    services::{
        data_stores::{
            HashmapMemberStore, PostgresMemberStore, PostgresTeamStore,
        },
        sample_data::seed_sample_members,
    },
    utils::constants::{test, DATABASE_URL},
    Application,
};
use test_context::AsyncTestContext;
use tokio::sync::RwLock;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub http_client: reqwest::Client,
    pub member_store: MemberStoreType,
    pub team_store: TeamStoreType,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = Arc::new(RwLock::new(HashmapMemberStore::default()));
        let member_store: MemberStoreType = store.clone();
        let team_store: TeamStoreType = store;

        seed_sample_members(&member_store)
            .await
            .expect("Failed to seed sample members");

        Self::start(member_store, team_store).await
    }

    pub async fn start(
        member_store: MemberStoreType,
        team_store: TeamStoreType,
    ) -> Self {
        let app_state = AppState::new(member_store.clone(), team_store.clone());

        let app = Application::build(app_state, test::APP_ADDRESS)
            .await
            .expect("Failed to build app");
        let address = format!("http://{}", app.address.clone());

        #[allow(clippy::let_underscore_future)]
        let _ = tokio::spawn(app.run());

        let http_client = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");

        Self {
            address,
            http_client,
            member_store,
            team_store,
        }
    }

    pub async fn get_member(&self, id: &str) -> Response {
        self.http_client
            .get(format!("{}/members/{}", &self.address, id))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_member2(&self, id: &str) -> Response {
        self.http_client
            .get(format!("{}/members2/{}", &self.address, id))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_members(&self, query: &str) -> Response {
        self.http_client
            .get(format!("{}/members?{}", &self.address, query))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

impl AsyncTestContext for TestApp {
    async fn setup() -> TestApp {
        TestApp::new().await
    }
}

/// Same application, backed by a throwaway PostgreSQL database.
pub struct PostgresTestApp {
    pub app: TestApp,
    pub tmp_db_name: String,
}

impl AsyncTestContext for PostgresTestApp {
    async fn setup() -> PostgresTestApp {
        let tmp_db_name = Uuid::new_v4().to_string();
        let pg_pool = configure_postgresql(&tmp_db_name).await;

        let member_store: MemberStoreType =
            Arc::new(RwLock::new(PostgresMemberStore::new(pg_pool.clone())));
        let team_store: TeamStoreType =
            Arc::new(RwLock::new(PostgresTeamStore::new(pg_pool)));

        PostgresTestApp {
            app: TestApp::start(member_store, team_store).await,
            tmp_db_name,
        }
    }

    async fn teardown(self) {
        delete_database(&self.tmp_db_name).await;
    }
}

fn server_options() -> PgConnectOptions {
    PgConnectOptions::from_str(DATABASE_URL.expose_secret())
        .expect("Failed to parse PostgreSQL connection string")
}

async fn configure_postgresql(db_name: &str) -> PgPool {
    let mut connection = PgConnection::connect_with(&server_options())
        .await
        .expect("Failed to connect to Postgres");

    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, db_name).as_str())
        .await
        .expect("Failed to create database.");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(server_options().database(db_name))
        .await
        .expect("Failed to create Postgres connection pool.");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to migrate the database");

    pool
}

async fn delete_database(db_name: &str) {
    let mut connection = PgConnection::connect_with(&server_options())
        .await
        .expect("Failed to connect to Postgres");

    connection
        .execute(
            format!(
                r#"
                SELECT pg_terminate_backend(pg_stat_activity.pid)
                FROM pg_stat_activity
                WHERE pg_stat_activity.datname = '{}'
                  AND pid <> pg_backend_pid();
                "#,
                db_name
            )
            .as_str(),
        )
        .await
        .expect("Failed to drop the database.");

    connection
        .execute(format!(r#"DROP DATABASE "{}";"#, db_name).as_str())
        .await
        .expect("Failed to drop the database.");
}

pub async fn get_json_response_body(response: Response) -> Value {
    let body: Value = response
        .json()
        .await
        .expect("failed to parse response body JSON");
    body
}

pub fn user_names(page: &Value) -> Vec<String> {
    page["content"]
        .as_array()
        .expect("content should be an array")
        .iter()
        .map(|member| {
            member["userName"]
                .as_str()
                .expect("userName should be a string")
                .to_owned()
        })
        .collect()
}
