use chrono::{DateTime, Utc};
use color_eyre::eyre::eyre;
use sqlx::PgPool;

use crate::domain::{
    Audit, MemberId, NewTeam, Team, TeamId, TeamName, TeamStore,
    TeamStoreError,
};

const TEAM_SELECT: &str = r#"
    SELECT t.team_id, t.name, t.created_date, t.updated_date,
           ARRAY(
               SELECT m.member_id FROM member m
               WHERE m.team_id = t.team_id
               ORDER BY m.member_id
           ) AS members
    FROM team t
"#;

#[derive(sqlx::FromRow)]
struct TeamRow {
    team_id: i64,
    name: String,
    created_date: DateTime<Utc>,
    updated_date: DateTime<Utc>,
    members: Vec<i64>,
}

impl TryFrom<TeamRow> for Team {
    type Error = TeamStoreError;

    fn try_from(row: TeamRow) -> Result<Self, Self::Error> {
        Ok(Team::restore(
            TeamId::new(row.team_id),
            TeamName::parse(&row.name)
                .map_err(|e| TeamStoreError::UnexpectedError(eyre!(e)))?,
            row.members.into_iter().map(MemberId::new).collect(),
            Audit::restore(row.created_date, row.updated_date),
        ))
    }
}

fn unexpected(e: sqlx::Error) -> TeamStoreError {
    TeamStoreError::UnexpectedError(eyre!(e))
}

pub struct PostgresTeamStore {
    pool: PgPool,
}

impl PostgresTeamStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TeamStore for PostgresTeamStore {
    #[tracing::instrument(name = "Saving team to PostgreSQL", skip_all)]
    async fn save_team(&mut self, team: NewTeam) -> Result<Team, TeamStoreError> {
        let audit = Audit::on_persist();
        let row = sqlx::query_as::<_, TeamRow>(
            r#"
            INSERT INTO team (name, created_date, updated_date)
            VALUES ($1, $2, $3)
            RETURNING team_id, name, created_date, updated_date,
                      ARRAY[]::BIGINT[] AS members
            "#,
        )
        .bind(team.name.as_ref())
        .bind(audit.created_date())
        .bind(audit.updated_date())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Team::try_from(row)
    }

    #[tracing::instrument(name = "Deleting team from PostgreSQL", skip_all)]
    async fn delete_team(&mut self, id: &TeamId) -> Result<(), TeamStoreError> {
        let result = sqlx::query("DELETE FROM team WHERE team_id = $1")
            .bind(id.as_ref())
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db_err)
                    if db_err.is_foreign_key_violation() =>
                {
                    TeamStoreError::TeamHasMembers
                }
                e => unexpected(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(TeamStoreError::TeamIDNotFound);
        }
        Ok(())
    }

    #[tracing::instrument(name = "Getting all teams from PostgreSQL", skip_all)]
    async fn find_all_teams(&self) -> Result<Vec<Team>, TeamStoreError> {
        let sql = format!("{TEAM_SELECT} ORDER BY t.team_id");
        sqlx::query_as::<_, TeamRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?
            .into_iter()
            .map(Team::try_from)
            .collect()
    }

    #[tracing::instrument(name = "Getting team from PostgreSQL", skip_all)]
    async fn find_team_by_id(&self, id: &TeamId) -> Result<Team, TeamStoreError> {
        let sql = format!("{TEAM_SELECT} WHERE t.team_id = $1");
        let row = sqlx::query_as::<_, TeamRow>(&sql)
            .bind(id.as_ref())
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or(TeamStoreError::TeamIDNotFound)?;

        Team::try_from(row)
    }

    #[tracing::instrument(name = "Counting teams in PostgreSQL", skip_all)]
    async fn count_teams(&self) -> Result<u64, TeamStoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM team")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(count as u64)
    }
}
