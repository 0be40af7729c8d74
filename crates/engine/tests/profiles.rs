mod common;

use engine::{Actor, EngineError, NewProfileCmd, ProfileUpdateCmd, Role, Table};

use common::{actor, engine, profile};

#[tokio::test]
async fn search_matches_any_field_ignoring_case() {
    let engine = engine().await;
    let admin = Actor::system();
    let ali = engine
        .create_profile(
            &admin,
            NewProfileCmd::new("Ali Hassan", Role::Student).localized("علي حسن"),
        )
        .await
        .unwrap();
    engine
        .create_profile(
            &admin,
            NewProfileCmd::new("Mona Said", Role::Parent).email("mona.ALI@example.com"),
        )
        .await
        .unwrap();
    let omar = profile(&engine, "Omar", Role::Student).await;
    engine.assign_card(&admin, omar.id, "CARD-ALI-7").await.unwrap();
    profile(&engine, "Sara", Role::Teacher).await;

    let hits = engine.search_profiles(&admin, "ali", None).await.unwrap();
    let names: Vec<&str> = hits.iter().map(|p| p.full_name.as_str()).collect();
    assert_eq!(names, vec!["Ali Hassan", "Mona Said", "Omar"]);
    assert_eq!(hits[2].card_ids, vec!["CARD-ALI-7"]);

    let localized = engine.search_profiles(&admin, "علي", None).await.unwrap();
    assert_eq!(localized.len(), 1);
    assert_eq!(localized[0].id, ali.id);

    let all = engine.search_profiles(&admin, "   ", None).await.unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn search_is_capped() {
    let engine = engine().await;
    let admin = Actor::system();
    for n in 0..60 {
        profile(&engine, &format!("Student {n:02}"), Role::Student).await;
    }

    assert_eq!(
        engine.search_profiles(&admin, "student", None).await.unwrap().len(),
        50
    );
    assert_eq!(
        engine.search_profiles(&admin, "", Some(500)).await.unwrap().len(),
        50
    );
    assert_eq!(
        engine.search_profiles(&admin, "student", Some(3)).await.unwrap().len(),
        3
    );
}

#[tokio::test]
async fn emails_and_cards_are_unique() {
    let engine = engine().await;
    let admin = Actor::system();
    engine
        .create_profile(
            &admin,
            NewProfileCmd::new("Mona", Role::Parent).email("mona@example.com"),
        )
        .await
        .unwrap();
    assert!(matches!(
        engine
            .create_profile(
                &admin,
                NewProfileCmd::new("Mona 2", Role::Parent).email("MONA@example.com"),
            )
            .await,
        Err(EngineError::ExistingKey(_))
    ));

    let a = profile(&engine, "A", Role::Student).await;
    let b = profile(&engine, "B", Role::Student).await;
    engine.assign_card(&admin, a.id, "abc-1").await.unwrap();
    assert!(matches!(
        engine.assign_card(&admin, b.id, "ABC-1").await,
        Err(EngineError::ExistingKey(_))
    ));

    engine.remove_card(&admin, "abc-1").await.unwrap();
    assert!(matches!(
        engine.remove_card(&admin, "abc-1").await,
        Err(EngineError::KeyNotFound(_))
    ));
    let b = engine.assign_card(&admin, b.id, "ABC-1").await.unwrap();
    assert_eq!(b.card_ids, vec!["ABC-1"]);

    engine.remove_card(&admin, " abc-1 ").await.unwrap();
    let b = engine.profile(&admin, b.id).await.unwrap();
    assert!(b.card_ids.is_empty());
}

#[tokio::test]
async fn missing_cards_stay_missing() {
    let engine = engine().await;
    let student = profile(&engine, "No Card", Role::Student).await;
    let fetched = engine.profile(&Actor::system(), student.id).await.unwrap();
    assert!(fetched.card_ids.is_empty());
    assert_eq!(fetched.email, None);
}

#[tokio::test]
async fn users_edit_their_contact_fields_but_not_their_role() {
    let engine = engine().await;
    let student = actor(&engine, "student", Role::Student).await;
    let other = profile(&engine, "Other", Role::Student).await;
    let id = student.profile_id.unwrap();

    let updated = engine
        .update_profile(
            &student,
            id,
            ProfileUpdateCmd {
                phone: Some(" +968 9000 0000 ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.phone.as_deref(), Some("+968 9000 0000"));

    assert!(matches!(
        engine
            .update_profile(
                &student,
                id,
                ProfileUpdateCmd {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await,
        Err(EngineError::Forbidden(_))
    ));
    assert!(matches!(
        engine
            .update_profile(
                &student,
                other.id,
                ProfileUpdateCmd {
                    phone: Some("1".to_string()),
                    ..Default::default()
                },
            )
            .await,
        Err(EngineError::Forbidden(_))
    ));
    assert!(matches!(
        engine
            .update_profile(&student, id, ProfileUpdateCmd::default())
            .await,
        Err(EngineError::Validation(_))
    ));
    assert!(matches!(
        engine
            .create_profile(&student, NewProfileCmd::new("X", Role::Admin))
            .await,
        Err(EngineError::Forbidden(_))
    ));
    assert!(matches!(
        engine.search_profiles(&student, "", None).await,
        Err(EngineError::Forbidden(_))
    ));
}

#[tokio::test]
async fn users_authenticate_with_their_profile_role() {
    let engine = engine().await;
    let canteen = profile(&engine, "Canteen desk", Role::Canteen).await;
    engine
        .create_user(&Actor::system(), "desk", "pa55word", canteen.id)
        .await
        .unwrap();

    let actor = engine.authenticate("desk", "pa55word").await.unwrap().unwrap();
    assert_eq!(actor.role, Role::Canteen);
    assert_eq!(actor.profile_id, Some(canteen.id));
    assert_eq!(engine.authenticate("desk", "wrong").await.unwrap(), None);
    assert_eq!(engine.authenticate("nobody", "pa55word").await.unwrap(), None);

    assert!(matches!(
        engine
            .create_user(&Actor::system(), "desk", "again", canteen.id)
            .await,
        Err(EngineError::ExistingKey(_))
    ));
}

#[tokio::test]
async fn committed_writes_are_announced() {
    let engine = engine().await;
    let mut changes = engine.subscribe();

    let student = profile(&engine, "Ali", Role::Student).await;
    let event = changes.recv().await.unwrap();
    assert_eq!(event.table, Table::Profiles);

    engine
        .top_up_wallet(&Actor::system(), student.id, 100, None)
        .await
        .unwrap();
    let tables: Vec<Table> = vec![
        changes.recv().await.unwrap().table,
        changes.recv().await.unwrap().table,
    ];
    assert_eq!(tables, vec![Table::WalletBalances, Table::WalletTransactions]);

    // Rejected writes publish nothing.
    let _ = engine
        .debit_wallet(&Actor::system(), student.id, 1_000, None)
        .await;
    assert!(changes.try_recv().is_err());
}
