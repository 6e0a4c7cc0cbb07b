use chrono::Duration;
use quiz_core::Clock;
use quiz_core::model::{
    OPTION_COUNT, Question, QuestionId, QuizConfig, ResultRecord, TestOutcome, UserId,
    UserIdentity,
};
use quiz_core::session::{QuizMode, SessionState};
use quiz_core::time::{fixed_now, result_offset};
use storage::repository::{ResultSink, SessionStore};
use storage::sqlite::SqliteRepository;

fn build_question(id: u32) -> Question {
    let options: [String; OPTION_COUNT] = ["a", "b", "c", "d"].map(str::to_owned);
    Question::new(
        QuestionId::new(id),
        "general",
        format!("question {id}"),
        options,
        0,
        false,
        Some(format!("because {id}")),
    )
    .unwrap()
}

fn build_identity(user_id: i64) -> UserIdentity {
    UserIdentity {
        user_id: UserId::new(user_id),
        username: None,
        first_name: "Alex".to_owned(),
        last_name: Some("Stone".to_owned()),
        full_name: "Alex Stone".to_owned(),
    }
}

fn build_state(user_id: i64) -> SessionState {
    let config = QuizConfig::new(2, 1, 24.0, 30).unwrap();
    SessionState::new(
        build_identity(user_id),
        QuizMode::Testing,
        vec![build_question(1), build_question(2)],
        config,
        fixed_now(),
    )
    .unwrap()
}

fn build_record(user_id: i64, hours_ago: i64, outcome: TestOutcome) -> ResultRecord {
    let identity = build_identity(user_id);
    let completed = (fixed_now() - Duration::hours(hours_ago)).with_timezone(&result_offset());
    ResultRecord::new(
        &identity,
        completed,
        outcome,
        5,
        Some("errors exhausted at question #6".to_owned()),
    )
}

#[tokio::test]
async fn sqlite_round_trips_session_snapshots() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_sessions?mode=memory&cache=shared")
        .await
        .expect("connect")
        .with_clock(Clock::fixed(fixed_now()));
    repo.migrate().await.expect("migrate");

    let state = build_state(10);
    repo.save(&state, Duration::seconds(120)).await.unwrap();

    let loaded = repo.load(UserId::new(10)).await.unwrap().expect("snapshot");
    assert_eq!(loaded, state);
    assert!(repo.exists(UserId::new(10)).await.unwrap());

    repo.delete(UserId::new(10)).await.unwrap();
    assert!(repo.load(UserId::new(10)).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_save_replaces_previous_snapshot() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_replace?mode=memory&cache=shared")
        .await
        .expect("connect")
        .with_clock(Clock::fixed(fixed_now()));
    repo.migrate().await.expect("migrate");

    let mut state = build_state(11);
    repo.save(&state, Duration::seconds(120)).await.unwrap();

    state.apply_answer(0, 5).unwrap();
    repo.save(&state, Duration::seconds(90)).await.unwrap();

    let loaded = repo.load(UserId::new(11)).await.unwrap().expect("snapshot");
    assert_eq!(loaded.current_index(), 1);
    assert_eq!(loaded.correct_count(), 1);
}

#[tokio::test]
async fn sqlite_expired_snapshot_reads_as_absent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_ttl?mode=memory&cache=shared")
        .await
        .expect("connect")
        .with_clock(Clock::fixed(fixed_now()));
    repo.migrate().await.expect("migrate");

    repo.save(&build_state(12), Duration::seconds(60)).await.unwrap();

    let later = repo
        .clone()
        .with_clock(Clock::fixed(fixed_now() + Duration::seconds(61)));
    assert!(later.load(UserId::new(12)).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_results_serve_cooldown_lookups() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_results?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.append_result(&build_record(20, 30, TestOutcome::Failed))
        .await
        .unwrap();
    repo.append_result(&build_record(20, 2, TestOutcome::Passed))
        .await
        .unwrap();
    repo.append_result(&build_record(21, 1, TestOutcome::Passed))
        .await
        .unwrap();

    let last = repo.last_attempt_time(UserId::new(20)).await.unwrap();
    assert_eq!(last, Some(fixed_now() - Duration::hours(2)));

    assert_eq!(repo.last_attempt_time(UserId::new(99)).await.unwrap(), None);
}
