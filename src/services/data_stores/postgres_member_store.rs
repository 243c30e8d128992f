use chrono::{DateTime, Utc};
use color_eyre::eyre::eyre;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{
    Audit, Direction, Member, MemberDto, MemberId, MemberProjection,
    MemberSortKey, MemberSpec, MemberStore, MemberStoreError, MemberWithTeam,
    NewMember, Page, PageRequest, Slice, Sort, Team, TeamId, TeamName,
    UserName,
};

const MEMBER_COLUMNS: &str = "m.member_id, m.user_name, m.age, m.team_id, \
     m.created_date, m.updated_date";

const JOINED_SELECT: &str = r#"
    SELECT m.member_id, m.user_name, m.age, m.team_id,
           m.created_date, m.updated_date,
           t.name AS team_name,
           t.created_date AS team_created_date,
           t.updated_date AS team_updated_date,
           ARRAY(
               SELECT mm.member_id FROM member mm
               WHERE mm.team_id = t.team_id
               ORDER BY mm.member_id
           ) AS team_members
    FROM member m
    LEFT JOIN team t ON m.team_id = t.team_id
"#;

#[derive(sqlx::FromRow)]
struct MemberRow {
    member_id: i64,
    user_name: String,
    age: i32,
    team_id: Option<i64>,
    created_date: DateTime<Utc>,
    updated_date: DateTime<Utc>,
}

impl TryFrom<MemberRow> for Member {
    type Error = MemberStoreError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        Ok(Member::restore(
            MemberId::new(row.member_id),
            UserName::parse(row.user_name)
                .map_err(|e| MemberStoreError::UnexpectedError(eyre!(e)))?,
            row.age,
            row.team_id.map(TeamId::new),
            Audit::restore(row.created_date, row.updated_date),
        ))
    }
}

#[derive(sqlx::FromRow)]
struct MemberTeamRow {
    #[sqlx(flatten)]
    member: MemberRow,
    team_name: Option<String>,
    team_created_date: Option<DateTime<Utc>>,
    team_updated_date: Option<DateTime<Utc>>,
    team_members: Vec<i64>,
}

impl TryFrom<MemberTeamRow> for MemberWithTeam {
    type Error = MemberStoreError;

    fn try_from(row: MemberTeamRow) -> Result<Self, Self::Error> {
        let team = match (
            row.member.team_id,
            row.team_name,
            row.team_created_date,
            row.team_updated_date,
        ) {
            (Some(id), Some(name), Some(created), Some(updated)) => {
                Some(Team::restore(
                    TeamId::new(id),
                    TeamName::parse(&name).map_err(|e| {
                        MemberStoreError::UnexpectedError(eyre!(e))
                    })?,
                    row.team_members.into_iter().map(MemberId::new).collect(),
                    Audit::restore(created, updated),
                ))
            }
            _ => None,
        };
        Ok(MemberWithTeam {
            member: Member::try_from(row.member)?,
            team,
        })
    }
}

fn unexpected(e: sqlx::Error) -> MemberStoreError {
    MemberStoreError::UnexpectedError(eyre!(e))
}

fn write_error(e: sqlx::Error) -> MemberStoreError {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            MemberStoreError::TeamIDNotFound
        }
        e => unexpected(e),
    }
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn to_members(rows: Vec<MemberRow>) -> Result<Vec<Member>, MemberStoreError> {
    rows.into_iter().map(Member::try_from).collect()
}

fn to_joined(
    rows: Vec<MemberTeamRow>,
) -> Result<Vec<MemberWithTeam>, MemberStoreError> {
    rows.into_iter().map(MemberWithTeam::try_from).collect()
}

fn single(members: Vec<Member>) -> Result<Option<Member>, MemberStoreError> {
    let mut members = members.into_iter();
    match (members.next(), members.next()) {
        (Some(_), Some(_)) => Err(MemberStoreError::NonUniqueResult),
        (member, _) => Ok(member),
    }
}

pub struct PostgresMemberStore {
    pool: PgPool,
}

impl PostgresMemberStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn select_members(
        &self,
        condition: &str,
        user_name: &UserName,
    ) -> Result<Vec<Member>, MemberStoreError> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM member m WHERE {condition} \
             ORDER BY m.member_id"
        );
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(user_name.as_ref())
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        to_members(rows)
    }
}

#[async_trait::async_trait]
impl MemberStore for PostgresMemberStore {
    #[tracing::instrument(name = "Saving member to PostgreSQL", skip_all)]
    async fn save(
        &mut self,
        member: NewMember,
    ) -> Result<Member, MemberStoreError> {
        let audit = Audit::on_persist();
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            INSERT INTO member (user_name, age, team_id, created_date, updated_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING member_id, user_name, age, team_id, created_date, updated_date
            "#,
        )
        .bind(member.user_name.as_ref())
        .bind(member.age)
        .bind(member.team_id.map(|id| *id.as_ref()))
        .bind(audit.created_date())
        .bind(audit.updated_date())
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;

        Member::try_from(row)
    }

    #[tracing::instrument(name = "Updating member in PostgreSQL", skip_all)]
    async fn update(
        &mut self,
        member: &Member,
    ) -> Result<Member, MemberStoreError> {
        let mut audit = member.audit;
        audit.on_update();
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            UPDATE member
            SET user_name = $2, age = $3, team_id = $4, updated_date = $5
            WHERE member_id = $1
            RETURNING member_id, user_name, age, team_id, created_date, updated_date
            "#,
        )
        .bind(member.id().as_ref())
        .bind(member.user_name.as_ref())
        .bind(member.age)
        .bind(member.team_id.map(|id| *id.as_ref()))
        .bind(audit.updated_date())
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error)?
        .ok_or(MemberStoreError::MemberIDNotFound)?;

        Member::try_from(row)
    }

    #[tracing::instrument(name = "Deleting member from PostgreSQL", skip_all)]
    async fn delete(&mut self, id: &MemberId) -> Result<(), MemberStoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM member WHERE member_id = $1
            "#,
        )
        .bind(id.as_ref())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(MemberStoreError::MemberIDNotFound);
        }
        Ok(())
    }

    #[tracing::instrument(name = "Getting member from PostgreSQL", skip_all)]
    async fn find_by_id(
        &self,
        id: &MemberId,
    ) -> Result<Member, MemberStoreError> {
        let sql =
            format!("SELECT {MEMBER_COLUMNS} FROM member m WHERE m.member_id = $1");
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(id.as_ref())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => MemberStoreError::MemberIDNotFound,
                e => unexpected(e),
            })
            .and_then(Member::try_from)
    }

    #[tracing::instrument(name = "Getting all members from PostgreSQL", skip_all)]
    async fn find_all(&self) -> Result<Vec<Member>, MemberStoreError> {
        let sql =
            format!("SELECT {MEMBER_COLUMNS} FROM member m ORDER BY m.member_id");
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        to_members(rows)
    }

    #[tracing::instrument(name = "Counting members in PostgreSQL", skip_all)]
    async fn count(&self) -> Result<u64, MemberStoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM member")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(count as u64)
    }

    #[tracing::instrument(
        name = "Getting members by name and minimum age from PostgreSQL",
        skip_all
    )]
    async fn find_by_user_name_and_age_greater_than(
        &self,
        user_name: &UserName,
        age: i32,
    ) -> Result<Vec<Member>, MemberStoreError> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM member m \
             WHERE m.user_name = $1 AND m.age > $2 ORDER BY m.member_id"
        );
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(user_name.as_ref())
            .bind(age)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        to_members(rows)
    }

    #[tracing::instrument(name = "Getting top members from PostgreSQL", skip_all)]
    async fn find_top(
        &self,
        limit: u64,
    ) -> Result<Vec<Member>, MemberStoreError> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM member m ORDER BY m.member_id LIMIT $1"
        );
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(to_i64(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        to_members(rows)
    }

    #[tracing::instrument(name = "Getting members by name from PostgreSQL", skip_all)]
    async fn find_by_user_name(
        &self,
        user_name: &UserName,
    ) -> Result<Vec<Member>, MemberStoreError> {
        self.select_members("m.user_name = $1", user_name).await
    }

    #[tracing::instrument(
        name = "Getting members by name and age from PostgreSQL",
        skip_all
    )]
    async fn find_user(
        &self,
        user_name: &UserName,
        age: i32,
    ) -> Result<Vec<Member>, MemberStoreError> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM member m \
             WHERE m.user_name = $1 AND m.age = $2 ORDER BY m.member_id"
        );
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(user_name.as_ref())
            .bind(age)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        to_members(rows)
    }

    #[tracing::instrument(name = "Getting member names from PostgreSQL", skip_all)]
    async fn find_user_name_list(
        &self,
    ) -> Result<Vec<UserName>, MemberStoreError> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT user_name FROM member ORDER BY member_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        names
            .into_iter()
            .map(|name| {
                UserName::parse(name)
                    .map_err(|e| MemberStoreError::UnexpectedError(eyre!(e)))
            })
            .collect()
    }

    #[tracing::instrument(name = "Getting member DTOs from PostgreSQL", skip_all)]
    async fn find_member_dto(&self) -> Result<Vec<MemberDto>, MemberStoreError> {
        let rows = sqlx::query_as::<_, MemberProjection>(
            r#"
            SELECT m.member_id AS id, m.user_name, t.name AS team_name
            FROM member m
            INNER JOIN team t ON m.team_id = t.team_id
            ORDER BY m.member_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(rows
            .into_iter()
            .map(|row| MemberDto {
                id: row.id,
                user_name: row.user_name,
                team_name: row.team_name,
            })
            .collect())
    }

    #[tracing::instrument(name = "Getting members by names from PostgreSQL", skip_all)]
    async fn find_by_names(
        &self,
        names: &[UserName],
    ) -> Result<Vec<Member>, MemberStoreError> {
        let names: Vec<String> =
            names.iter().map(|name| name.as_ref().to_owned()).collect();
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM member m \
             WHERE m.user_name = ANY($1) ORDER BY m.member_id"
        );
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(names)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        to_members(rows)
    }

    #[tracing::instrument(
        name = "Getting optional member by name from PostgreSQL",
        skip_all
    )]
    async fn find_optional_by_user_name(
        &self,
        user_name: &UserName,
    ) -> Result<Option<Member>, MemberStoreError> {
        single(self.find_by_user_name(user_name).await?)
    }

    #[tracing::instrument(
        name = "Getting single member by name from PostgreSQL",
        skip_all
    )]
    async fn find_member_by_user_name(
        &self,
        user_name: &UserName,
    ) -> Result<Member, MemberStoreError> {
        single(self.find_by_user_name(user_name).await?)?
            .ok_or(MemberStoreError::MemberNotFound)
    }

    #[tracing::instrument(name = "Getting member page from PostgreSQL", skip_all)]
    async fn find_page(
        &self,
        request: &PageRequest,
    ) -> Result<Page<Member>, MemberStoreError> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM member m ORDER BY {} LIMIT $1 OFFSET $2",
            request.sort().order_by_sql()
        );

        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(to_i64(request.size()))
            .bind(to_i64(request.offset()))
            .fetch_all(&mut *tx)
            .await
            .map_err(unexpected)?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM member")
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;

        Ok(Page::new(to_members(rows)?, request, total as u64))
    }

    #[tracing::instrument(
        name = "Getting member page by age from PostgreSQL",
        skip_all
    )]
    async fn find_paging_by_age(
        &self,
        age: i32,
        request: &PageRequest,
    ) -> Result<Page<Member>, MemberStoreError> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM member m \
             LEFT JOIN team t ON m.team_id = t.team_id \
             WHERE m.age = $1 ORDER BY {} LIMIT $2 OFFSET $3",
            request.sort().order_by_sql()
        );

        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(age)
            .bind(to_i64(request.size()))
            .bind(to_i64(request.offset()))
            .fetch_all(&mut *tx)
            .await
            .map_err(unexpected)?;
        // Count covers all members, not only this age.
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(m.user_name) FROM member m")
                .fetch_one(&mut *tx)
                .await
                .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;

        Ok(Page::new(to_members(rows)?, request, total as u64))
    }

    #[tracing::instrument(
        name = "Getting member slice by age from PostgreSQL",
        skip_all
    )]
    async fn find_slice_by_age(
        &self,
        age: i32,
        request: &PageRequest,
    ) -> Result<Slice<Member>, MemberStoreError> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM member m \
             WHERE m.age = $1 ORDER BY {} LIMIT $2 OFFSET $3",
            request.sort().order_by_sql()
        );
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(age)
            .bind(to_i64(request.size()).saturating_add(1))
            .bind(to_i64(request.offset()))
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(Slice::from_overfetch(to_members(rows)?, request))
    }

    #[tracing::instrument(
        name = "Getting members by age with offset from PostgreSQL",
        skip_all
    )]
    async fn find_by_page(
        &self,
        age: i32,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Member>, MemberStoreError> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM member m \
             WHERE m.age = $1 ORDER BY {} LIMIT $2 OFFSET $3",
            Sort::by(MemberSortKey::UserName, Direction::Desc).order_by_sql()
        );
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(age)
            .bind(to_i64(limit))
            .bind(to_i64(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        to_members(rows)
    }

    #[tracing::instrument(name = "Counting members by age in PostgreSQL", skip_all)]
    async fn total_count(&self, age: i32) -> Result<u64, MemberStoreError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM member WHERE age = $1")
                .bind(age)
                .fetch_one(&self.pool)
                .await
                .map_err(unexpected)?;
        Ok(count as u64)
    }

    #[tracing::instrument(name = "Bulk age increment in PostgreSQL", skip_all)]
    async fn bulk_age_plus(
        &mut self,
        age: i32,
    ) -> Result<u64, MemberStoreError> {
        let result = sqlx::query(
            r#"
            UPDATE member SET age = age + 1, updated_date = $2
            WHERE age >= $1
            "#,
        )
        .bind(age)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        tracing::debug!("bulk age update touched {} rows", result.rows_affected());
        Ok(result.rows_affected())
    }

    #[tracing::instrument(
        name = "Getting members with teams from PostgreSQL",
        skip_all
    )]
    async fn find_member_fetch_join(
        &self,
    ) -> Result<Vec<MemberWithTeam>, MemberStoreError> {
        let sql = format!("{JOINED_SELECT} ORDER BY m.member_id");
        let rows = sqlx::query_as::<_, MemberTeamRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        to_joined(rows)
    }

    #[tracing::instrument(
        name = "Getting members with teams by name from PostgreSQL",
        skip_all
    )]
    async fn find_entity_graph_by_user_name(
        &self,
        user_name: &UserName,
    ) -> Result<Vec<MemberWithTeam>, MemberStoreError> {
        let sql =
            format!("{JOINED_SELECT} WHERE m.user_name = $1 ORDER BY m.member_id");
        let rows = sqlx::query_as::<_, MemberTeamRow>(&sql)
            .bind(user_name.as_ref())
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        to_joined(rows)
    }

    #[tracing::instrument(
        name = "Getting member read-only from PostgreSQL",
        skip_all
    )]
    async fn find_read_only_by_user_name(
        &self,
        user_name: &UserName,
    ) -> Result<Member, MemberStoreError> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM member m \
             WHERE m.user_name = $1 ORDER BY m.member_id LIMIT 2"
        );

        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(user_name.as_ref())
            .fetch_all(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;

        single(to_members(rows)?)?.ok_or(MemberStoreError::MemberNotFound)
    }

    #[tracing::instrument(name = "Locking members in PostgreSQL", skip_all)]
    async fn find_lock_by_user_name(
        &mut self,
        user_name: &UserName,
    ) -> Result<Vec<Member>, MemberStoreError> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM member m \
             WHERE m.user_name = $1 ORDER BY m.member_id FOR UPDATE"
        );

        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(user_name.as_ref())
            .fetch_all(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;

        to_members(rows)
    }

    #[tracing::instrument(
        name = "Getting member projections from PostgreSQL",
        skip_all
    )]
    async fn find_projections_by_user_name(
        &self,
        user_name: &UserName,
    ) -> Result<Vec<MemberWithTeam>, MemberStoreError> {
        self.find_entity_graph_by_user_name(user_name).await
    }

    #[tracing::instrument(
        name = "Getting member projection page from PostgreSQL",
        skip_all
    )]
    async fn find_by_native_projection(
        &self,
        request: &PageRequest,
    ) -> Result<Page<MemberProjection>, MemberStoreError> {
        let sql = format!(
            "SELECT m.member_id AS id, m.user_name, t.name AS team_name \
             FROM member m LEFT JOIN team t ON m.team_id = t.team_id \
             ORDER BY {} LIMIT $1 OFFSET $2",
            request.sort().order_by_sql()
        );

        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let content = sqlx::query_as::<_, MemberProjection>(&sql)
            .bind(to_i64(request.size()))
            .bind(to_i64(request.offset()))
            .fetch_all(&mut *tx)
            .await
            .map_err(unexpected)?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM member")
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;

        Ok(Page::new(content, request, total as u64))
    }

    #[tracing::instrument(
        name = "Getting members by specification from PostgreSQL",
        skip_all
    )]
    async fn find_all_matching(
        &self,
        spec: &MemberSpec,
    ) -> Result<Vec<MemberWithTeam>, MemberStoreError> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("{JOINED_SELECT} WHERE "));
        spec.push_sql(&mut builder);
        builder.push(" ORDER BY m.member_id");

        let rows = builder
            .build_query_as::<MemberTeamRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        to_joined(rows)
    }
}
