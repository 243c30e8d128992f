use crate::helpers::{get_json_response_body, user_names, PostgresTestApp};

use team_roster::{
    domain::{
        Direction, MemberProbe, MemberSortKey, MemberSpec, MemberStoreError,
        NewMember, NewTeam, PageRequest, Sort, Team, TeamId, TeamName,
        TeamStoreError, UserName,
    },
    services::sample_data::seed_sample_members,
};
use test_context::test_context;

fn name(value: &str) -> UserName {
    UserName::parse(value.to_owned()).unwrap()
}

async fn save_team(ctx: &PostgresTestApp, value: &str) -> Team {
    ctx.app
        .team_store
        .write()
        .await
        .save_team(NewTeam::new(TeamName::parse(value).unwrap()))
        .await
        .unwrap()
}

async fn save_member(
    ctx: &PostgresTestApp,
    value: &str,
    age: i32,
    team: Option<&Team>,
) {
    let member = match team {
        Some(team) => NewMember::with_team(name(value), age, team),
        None => NewMember::new(name(value), age),
    };
    ctx.app
        .member_store
        .write()
        .await
        .save(member)
        .await
        .unwrap();
}

#[test_context(PostgresTestApp)]
#[tokio::test]
#[ignore = "needs a PostgreSQL server at DATABASE_URL"]
async fn should_page_members_with_count(ctx: &mut PostgresTestApp) {
    for i in 0..12 {
        save_member(ctx, &format!("user{i}"), i % 4, None).await;
    }
    let store = ctx.app.member_store.read().await;

    let request = PageRequest::sorted(
        1,
        5,
        Sort::by(MemberSortKey::Age, Direction::Desc),
    )
    .unwrap();
    let page = store.find_page(&request).await.unwrap();
    assert_eq!(page.total_elements(), 12);
    assert_eq!(page.total_pages(), 3);
    assert_eq!(
        page.content.iter().map(|m| m.age).collect::<Vec<_>>(),
        vec![2, 1, 1, 1, 0]
    );

    let request = PageRequest::of(0, 2).unwrap();
    let page = store.find_paging_by_age(3, &request).await.unwrap();
    assert_eq!(page.content.len(), 2);
    assert_eq!(page.total_elements(), 12);
    assert!(page.has_next());

    let request = PageRequest::of(0, 5).unwrap();
    let page = store.find_paging_by_age(3, &request).await.unwrap();
    assert_eq!(page.content.len(), 3);
    assert_eq!(page.total_elements(), 3);
    assert!(!page.has_next());

    let slice = store
        .find_slice_by_age(0, &PageRequest::of(0, 2).unwrap())
        .await
        .unwrap();
    assert_eq!(slice.content.len(), 2);
    assert!(slice.has_next());

    let members = store.find_by_page(0, 1, 2).await.unwrap();
    assert_eq!(
        members.iter().map(|m| m.user_name.clone()).collect::<Vec<_>>(),
        vec![name("user4"), name("user0")]
    );
    assert_eq!(store.total_count(0).await, Ok(3));
}

#[test_context(PostgresTestApp)]
#[tokio::test]
#[ignore = "needs a PostgreSQL server at DATABASE_URL"]
async fn should_load_members_with_their_team(ctx: &mut PostgresTestApp) {
    let team_a = save_team(ctx, "teamA").await;
    save_member(ctx, "member1", 10, Some(&team_a)).await;
    save_member(ctx, "member2", 20, Some(&team_a)).await;
    save_member(ctx, "loner", 30, None).await;
    let store = ctx.app.member_store.read().await;

    let rows = store.find_member_fetch_join().await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].team_name(), Some(&"teamA".to_owned()));
    let team = rows[0].team.as_ref().unwrap();
    assert_eq!(team.id(), team_a.id());
    assert_eq!(
        team.members,
        vec![rows[0].member.id(), rows[1].member.id()]
    );
    assert!(rows[2].team.is_none());

    let rows = store
        .find_entity_graph_by_user_name(&name("member2"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].team_name(), Some(&"teamA".to_owned()));

    let dtos = store.find_member_dto().await.unwrap();
    assert_eq!(dtos.len(), 2);
    assert_eq!(dtos[0].team_name, Some("teamA".to_owned()));

    let page = store
        .find_by_native_projection(&PageRequest::of(1, 2).unwrap())
        .await
        .unwrap();
    assert_eq!(page.total_elements(), 3);
    assert_eq!(page.content[0].user_name, "loner");
    assert_eq!(page.content[0].team_name, None);
}

#[test_context(PostgresTestApp)]
#[tokio::test]
#[ignore = "needs a PostgreSQL server at DATABASE_URL"]
async fn should_filter_by_specification(ctx: &mut PostgresTestApp) {
    let team_a = save_team(ctx, "teamA").await;
    save_member(ctx, "m1", 0, Some(&team_a)).await;
    save_member(ctx, "m2", 0, Some(&team_a)).await;
    save_member(ctx, "m1", 40, None).await;
    let store = ctx.app.member_store.read().await;

    let spec = MemberSpec::user_name("m1").and(MemberSpec::team_name("teamA"));
    let rows = store.find_all_matching(&spec).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].member.age, 0);

    let spec = MemberSpec::user_name("m2").or(MemberSpec::AgeGreaterThan(30));
    let rows = store.find_all_matching(&spec).await.unwrap();
    assert_eq!(
        rows.iter().map(|r| r.member.age).collect::<Vec<_>>(),
        vec![0, 40]
    );

    let probe = MemberProbe {
        user_name: Some("m1".to_owned()),
        age: Some(99),
        team_name: Some("teamA".to_owned()),
    }
    .ignoring_age();
    let rows = store.find_all_matching(&probe.into_spec()).await.unwrap();
    assert_eq!(rows.len(), 1);

    let rows = store.find_all_matching(&MemberSpec::All).await.unwrap();
    assert_eq!(rows.len(), 3);
}

#[test_context(PostgresTestApp)]
#[tokio::test]
#[ignore = "needs a PostgreSQL server at DATABASE_URL"]
async fn should_map_team_foreign_keys(ctx: &mut PostgresTestApp) {
    let team_a = save_team(ctx, "teamA").await;
    save_member(ctx, "member1", 10, Some(&team_a)).await;

    let ghost = Team::restore(
        TeamId::new(9999),
        TeamName::parse("ghost").unwrap(),
        Vec::new(),
        team_a.audit,
    );
    let result = ctx
        .app
        .member_store
        .write()
        .await
        .save(NewMember::with_team(name("member2"), 20, &ghost))
        .await;
    assert_eq!(result, Err(MemberStoreError::TeamIDNotFound));

    let mut teams = ctx.app.team_store.write().await;
    assert_eq!(
        teams.delete_team(&team_a.id()).await,
        Err(TeamStoreError::TeamHasMembers)
    );
    assert_eq!(
        teams.delete_team(&TeamId::new(9999)).await,
        Err(TeamStoreError::TeamIDNotFound)
    );

    let team_b = teams
        .save_team(NewTeam::new(TeamName::parse("teamB").unwrap()))
        .await
        .unwrap();
    assert_eq!(teams.count_teams().await, Ok(2));
    assert_eq!(teams.delete_team(&team_b.id()).await, Ok(()));

    let found = teams.find_team_by_id(&team_a.id()).await.unwrap();
    assert_eq!(found.members.len(), 1);
    assert_eq!(teams.find_all_teams().await.unwrap().len(), 1);
}

#[test_context(PostgresTestApp)]
#[tokio::test]
#[ignore = "needs a PostgreSQL server at DATABASE_URL"]
async fn should_bulk_update_ages(ctx: &mut PostgresTestApp) {
    for (member_name, age) in
        [("member1", 10), ("member2", 19), ("member3", 20), ("member4", 21)]
    {
        save_member(ctx, member_name, age, None).await;
    }
    let mut store = ctx.app.member_store.write().await;

    assert_eq!(store.bulk_age_plus(20).await, Ok(2));
    let member4 = store
        .find_member_by_user_name(&name("member4"))
        .await
        .unwrap();
    assert_eq!(member4.age, 22);

    store
        .save(NewMember::new(name("oldest"), i32::MAX))
        .await
        .unwrap();
    assert!(matches!(
        store.bulk_age_plus(0).await,
        Err(MemberStoreError::UnexpectedError(_))
    ));
    let member1 = store
        .find_member_by_user_name(&name("member1"))
        .await
        .unwrap();
    assert_eq!(member1.age, 10);
}

#[test_context(PostgresTestApp)]
#[tokio::test]
#[ignore = "needs a PostgreSQL server at DATABASE_URL"]
async fn should_read_in_read_only_and_locking_transactions(
    ctx: &mut PostgresTestApp,
) {
    save_member(ctx, "member1", 10, None).await;
    save_member(ctx, "twin", 1, None).await;
    save_member(ctx, "twin", 2, None).await;
    let mut store = ctx.app.member_store.write().await;

    let member = store
        .find_read_only_by_user_name(&name("member1"))
        .await
        .unwrap();
    assert_eq!(member.age, 10);
    assert_eq!(
        store.find_read_only_by_user_name(&name("twin")).await,
        Err(MemberStoreError::NonUniqueResult)
    );

    let locked = store.find_lock_by_user_name(&name("twin")).await.unwrap();
    assert_eq!(locked.len(), 2);

    assert_eq!(
        store.find_optional_by_user_name(&name("nobody")).await,
        Ok(None)
    );
    assert_eq!(
        store.find_member_by_user_name(&name("nobody")).await,
        Err(MemberStoreError::MemberNotFound)
    );
}

#[test_context(PostgresTestApp)]
#[tokio::test]
#[ignore = "needs a PostgreSQL server at DATABASE_URL"]
async fn should_serve_seeded_members_over_http(ctx: &mut PostgresTestApp) {
    assert_eq!(seed_sample_members(&ctx.app.member_store).await, Ok(100));

    let response = ctx.app.get_member("1").await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "user0");

    let response = ctx.app.get_members("page=1&size=3&sort=id,desc").await;
    assert_eq!(response.status().as_u16(), 200);
    let response_body = get_json_response_body(response).await;
    assert_eq!(response_body["totalElements"], 100);
    assert_eq!(user_names(&response_body), ["user96", "user95", "user94"]);
}
