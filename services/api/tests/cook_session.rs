//! Drives `CookService` end to end against virtual time.

use std::sync::Arc;
use std::time::Duration;

use api_lib::adapters::InMemoryCatalog;
use api_lib::config::CookSettings;
use api_lib::cook::{CookAction, CookEvent, CookService, Subscription};
use dinner_core::domain::{SessionStatus, TimelineStep};
use dinner_core::ports::PortError;
use tokio::time::sleep;
use uuid::Uuid;

fn step(order: u32, timer_seconds: u32) -> TimelineStep {
    TimelineStep {
        order,
        instruction: format!("Do step {order}"),
        instruction_localized: None,
        estimated_minutes: 1,
        timer_seconds,
        method: "prep".to_string(),
        equipment: "pan".to_string(),
        concurrency_group: None,
        cleanup_hint: None,
        temperature: None,
        completion_cue: None,
        icons: Vec::new(),
    }
}

fn service_with(steps: Vec<TimelineStep>, settings: CookSettings) -> Arc<CookService> {
    let catalog = InMemoryCatalog::new().with_timeline("three-step", steps);
    Arc::new(CookService::new(Arc::new(catalog), settings))
}

fn three_step_service() -> Arc<CookService> {
    service_with(
        vec![step(1, 0), step(2, 30), step(3, 0)],
        CookSettings::default(),
    )
}

fn drain(subscription: &mut Subscription) -> Vec<CookEvent> {
    let mut events = Vec::new();
    while let Some(event) = subscription.try_recv() {
        events.push(event);
    }
    events
}

fn names(events: &[CookEvent]) -> Vec<&'static str> {
    events.iter().map(CookEvent::name).collect()
}

async fn start(service: &CookService) -> Uuid {
    service
        .start_session("three-step", "cook-1")
        .await
        .unwrap()
        .session_id()
}

#[tokio::test(start_paused = true)]
async fn pause_after_five_ticks_leaves_twenty_five_seconds() {
    let service = three_step_service();
    let id = start(&service).await;
    let mut listener = service.subscribe(id).await.unwrap();

    service.apply_action(id, CookAction::Start, None).await.unwrap();
    service.apply_action(id, CookAction::Next, None).await.unwrap();
    assert!(service.timer().is_running(id));

    sleep(Duration::from_millis(5_500)).await;
    let outcome = service.apply_action(id, CookAction::Pause, None).await.unwrap();

    assert_eq!(outcome.timer_remaining_seconds, 25);
    assert_eq!(outcome.status, SessionStatus::Paused);
    assert!(!service.timer().is_running(id));

    let events = drain(&mut listener);
    assert_eq!(
        names(&events)[..5],
        ["connected", "state_sync", "step_started", "step_completed", "step_started"]
    );
    assert!(matches!(
        events[3],
        CookEvent::StepCompleted { step_index: 0, .. }
    ));
    assert!(matches!(events[4], CookEvent::StepStarted { step_index: 1, .. }));

    let ticks: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            CookEvent::TimerTick {
                remaining_seconds, ..
            } => Some(*remaining_seconds),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, vec![29, 28, 27, 26, 25]);
    assert_eq!(events.last().map(CookEvent::name), Some("paused"));
}

#[tokio::test(start_paused = true)]
async fn next_advances_one_step_at_a_time_then_completes() {
    let service = three_step_service();
    let id = start(&service).await;

    let first = service.apply_action(id, CookAction::Next, None).await.unwrap();
    assert_eq!(first.current_step_index, 1);
    let second = service.apply_action(id, CookAction::Next, None).await.unwrap();
    assert_eq!(second.current_step_index, 2);

    let done = service.apply_action(id, CookAction::Next, None).await.unwrap();
    assert_eq!(done.current_step_index, 2);
    assert_eq!(done.status, SessionStatus::Completed);

    let again = service.apply_action(id, CookAction::Next, None).await.unwrap();
    assert_eq!(again.current_step_index, 2);
    assert_eq!(again.status, SessionStatus::Completed);
    assert_eq!(again.message, "Cooking is already complete");
}

#[tokio::test(start_paused = true)]
async fn last_step_next_announces_cook_complete_once() {
    let service = three_step_service();
    let id = start(&service).await;
    service.apply_action(id, CookAction::Next, None).await.unwrap();
    service.apply_action(id, CookAction::Next, None).await.unwrap();
    let mut listener = service.subscribe(id).await.unwrap();
    drain(&mut listener);

    service.apply_action(id, CookAction::Next, None).await.unwrap();
    let events = drain(&mut listener);
    assert!(matches!(
        events.as_slice(),
        [CookEvent::CookComplete { session_id }] if *session_id == id
    ));

    service.apply_action(id, CookAction::Next, None).await.unwrap();
    assert!(drain(&mut listener).is_empty());
}

#[tokio::test(start_paused = true)]
async fn resumed_event_carries_the_frozen_timer() {
    let service = service_with(vec![step(1, 30)], CookSettings::default());
    let id = start(&service).await;
    let mut listener = service.subscribe(id).await.unwrap();

    service.apply_action(id, CookAction::Start, None).await.unwrap();
    sleep(Duration::from_millis(4_500)).await;
    service.apply_action(id, CookAction::Pause, None).await.unwrap();
    drain(&mut listener);

    service.apply_action(id, CookAction::Resume, None).await.unwrap();
    let events = drain(&mut listener);
    assert_eq!(names(&events), ["resumed"]);
    assert!(matches!(
        events[0],
        CookEvent::Resumed {
            timer_remaining_seconds: 26,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn stopped_session_cannot_be_paused_or_resumed() {
    let service = three_step_service();
    let id = start(&service).await;
    service.apply_action(id, CookAction::Start, None).await.unwrap();
    service.stop_session(id).await.unwrap();
    let mut listener = service.subscribe(id).await.unwrap();
    drain(&mut listener);

    let paused = service.apply_action(id, CookAction::Pause, None).await.unwrap();
    assert_eq!(paused.status, SessionStatus::Completed);
    assert_eq!(paused.message, "Cooking is already complete");

    let resumed = service.apply_action(id, CookAction::Resume, None).await.unwrap();
    assert_eq!(resumed.status, SessionStatus::Completed);
    assert!(!service.timer().is_running(id));
    assert!(drain(&mut listener).is_empty());
}

#[tokio::test(start_paused = true)]
async fn timer_done_fires_exactly_once_and_does_not_advance() {
    let service = service_with(vec![step(1, 3), step(2, 0)], CookSettings::default());
    let id = start(&service).await;
    let mut listener = service.subscribe(id).await.unwrap();

    service.apply_action(id, CookAction::Start, None).await.unwrap();
    sleep(Duration::from_secs(10)).await;

    let events = drain(&mut listener);
    let done = events
        .iter()
        .filter(|e| matches!(e, CookEvent::TimerDone { .. }))
        .count();
    assert_eq!(done, 1);

    let session = service.snapshot(id).await.unwrap();
    assert_eq!(session.timer_remaining_seconds, 0);
    assert_eq!(session.current_step_index, 0);
    assert_eq!(session.status, SessionStatus::Cooking);
    assert!(!service.timer().is_running(id));
}

#[tokio::test(start_paused = true)]
async fn timer_set_to_zero_finishes_without_a_zero_tick() {
    let service = service_with(vec![step(1, 30)], CookSettings::default());
    let id = start(&service).await;
    let mut listener = service.subscribe(id).await.unwrap();

    service.apply_action(id, CookAction::Start, None).await.unwrap();
    sleep(Duration::from_millis(2_500)).await;
    service
        .apply_action(id, CookAction::SetTime, Some("0"))
        .await
        .unwrap();
    drain(&mut listener);

    sleep(Duration::from_secs(3)).await;
    let events = drain(&mut listener);
    assert_eq!(names(&events), ["timer_done"]);
    assert!(!events.iter().any(|e| matches!(
        e,
        CookEvent::TimerTick {
            remaining_seconds: 0,
            ..
        }
    )));
    assert!(!service.timer().is_running(id));
    assert_eq!(service.snapshot(id).await.unwrap().timer_remaining_seconds, 0);
}

#[tokio::test(start_paused = true)]
async fn repeated_pause_freezes_the_timer_and_resume_continues_from_it() {
    let service = service_with(vec![step(1, 30)], CookSettings::default());
    let id = start(&service).await;

    service.apply_action(id, CookAction::Start, None).await.unwrap();
    sleep(Duration::from_millis(3_500)).await;

    let first = service.apply_action(id, CookAction::Pause, None).await.unwrap();
    let second = service.apply_action(id, CookAction::Pause, None).await.unwrap();
    assert_eq!(first.timer_remaining_seconds, 27);
    assert_eq!(second.timer_remaining_seconds, 27);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(service.snapshot(id).await.unwrap().timer_remaining_seconds, 27);

    let resumed = service.apply_action(id, CookAction::Resume, None).await.unwrap();
    assert_eq!(resumed.status, SessionStatus::Cooking);
    assert_eq!(resumed.timer_remaining_seconds, 27);

    sleep(Duration::from_millis(2_500)).await;
    assert_eq!(service.snapshot(id).await.unwrap().timer_remaining_seconds, 25);
}

#[tokio::test(start_paused = true)]
async fn resume_without_pause_changes_nothing() {
    let service = three_step_service();
    let id = start(&service).await;
    let mut listener = service.subscribe(id).await.unwrap();
    drain(&mut listener);

    let outcome = service.apply_action(id, CookAction::Resume, None).await.unwrap();
    assert_eq!(outcome.status, SessionStatus::Idle);
    assert!(drain(&mut listener).is_empty());
}

#[tokio::test(start_paused = true)]
async fn unknown_session_is_not_found_and_leaves_others_alone() {
    let service = three_step_service();
    let id = start(&service).await;
    let before = service.snapshot(id).await.unwrap();

    let err = service
        .apply_action(Uuid::new_v4(), CookAction::Start, None)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));

    let after = service.snapshot(id).await.unwrap();
    assert_eq!(after.status, before.status);
    assert_eq!(after.current_step_index, before.current_step_index);
}

#[tokio::test(start_paused = true)]
async fn set_time_ignores_non_numeric_values() {
    let service = three_step_service();
    let id = start(&service).await;
    service.apply_action(id, CookAction::Next, None).await.unwrap();
    let mut listener = service.subscribe(id).await.unwrap();
    drain(&mut listener);

    let outcome = service
        .apply_action(id, CookAction::SetTime, Some("soon"))
        .await
        .unwrap();
    assert_eq!(outcome.timer_remaining_seconds, 30);
    assert_eq!(outcome.message, "Timer unchanged");
    assert!(drain(&mut listener).is_empty());

    let outcome = service
        .apply_action(id, CookAction::SetTime, Some(" 90 "))
        .await
        .unwrap();
    assert_eq!(outcome.timer_remaining_seconds, 90);
    assert_eq!(names(&drain(&mut listener)), ["timer_adjusted"]);
}

#[tokio::test(start_paused = true)]
async fn add_time_defaults_to_a_minute() {
    let service = three_step_service();
    let id = start(&service).await;

    let outcome = service.apply_action(id, CookAction::AddTime, None).await.unwrap();
    assert_eq!(outcome.timer_remaining_seconds, 60);

    let outcome = service
        .apply_action(id, CookAction::AddTime, Some("15"))
        .await
        .unwrap();
    assert_eq!(outcome.timer_remaining_seconds, 75);

    let outcome = service
        .apply_action(id, CookAction::AddTime, Some("-500"))
        .await
        .unwrap();
    assert_eq!(outcome.timer_remaining_seconds, 0);
}

#[tokio::test(start_paused = true)]
async fn prev_restores_full_timer_without_restarting_it() {
    let service = three_step_service();
    let id = start(&service).await;
    service.apply_action(id, CookAction::Start, None).await.unwrap();
    service.apply_action(id, CookAction::Next, None).await.unwrap();
    sleep(Duration::from_millis(5_500)).await;

    let back = service.apply_action(id, CookAction::Prev, None).await.unwrap();
    assert_eq!(back.current_step_index, 0);
    assert_eq!(back.timer_remaining_seconds, 0);
    assert!(!service.timer().is_running(id));

    let forward = service.apply_action(id, CookAction::Next, None).await.unwrap();
    assert_eq!(forward.current_step_index, 1);
    assert_eq!(forward.timer_remaining_seconds, 30);

    let first = service.apply_action(id, CookAction::Prev, None).await.unwrap();
    let stays = service.apply_action(id, CookAction::Prev, None).await.unwrap();
    assert_eq!(first.current_step_index, 0);
    assert_eq!(stays.current_step_index, 0);
    assert_eq!(stays.message, "Already on the first step");
}

#[tokio::test(start_paused = true)]
async fn repeat_republishes_the_current_step() {
    let service = three_step_service();
    let id = start(&service).await;
    let mut listener = service.subscribe(id).await.unwrap();
    drain(&mut listener);

    service.apply_action(id, CookAction::Repeat, None).await.unwrap();
    let events = drain(&mut listener);
    assert!(matches!(
        events.as_slice(),
        [CookEvent::InstructionRepeat { step_index: 0, .. }]
    ));
}

#[tokio::test(start_paused = true)]
async fn stopped_session_is_removed_after_the_grace_period() {
    let service = three_step_service();
    let id = start(&service).await;
    service.apply_action(id, CookAction::Next, None).await.unwrap();
    service.apply_action(id, CookAction::Start, None).await.unwrap();
    let mut listener = service.subscribe(id).await.unwrap();

    let outcome = service.stop_session(id).await.unwrap();
    assert_eq!(outcome.status, SessionStatus::Completed);
    assert!(!service.timer().is_running(id));

    sleep(Duration::from_secs(30)).await;
    let trailing = service.snapshot(id).await.unwrap();
    assert_eq!(trailing.status, SessionStatus::Completed);

    sleep(Duration::from_secs(31)).await;
    assert!(matches!(
        service.snapshot(id).await,
        Err(PortError::NotFound(_))
    ));

    let events = drain(&mut listener);
    assert_eq!(events.last().map(CookEvent::name), Some("cook_stopped"));
    assert!(listener.recv().await.is_none());
    assert!(!service.broadcaster().has_session(id));
}

#[tokio::test(start_paused = true)]
async fn every_new_listener_gets_connected_and_state_sync() {
    let service = three_step_service();
    let id = start(&service).await;
    service.apply_action(id, CookAction::Next, None).await.unwrap();

    let mut first = service.subscribe(id).await.unwrap();
    let mut second = service.subscribe(id).await.unwrap();
    for listener in [&mut first, &mut second] {
        let events = drain(listener);
        assert_eq!(names(&events), ["connected", "state_sync"]);
        match &events[1] {
            CookEvent::StateSync(snapshot) => {
                assert_eq!(snapshot.current_step_index, 1);
                assert_eq!(snapshot.timer_remaining_seconds, 30);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    drop(first);
    assert_eq!(service.broadcaster().listener_count(id), 1);
}

#[tokio::test(start_paused = true)]
async fn missing_timeline_falls_back_to_placeholder() {
    let service = three_step_service();
    let session = service
        .start_session("no-such-recipe", "")
        .await
        .unwrap();
    assert!(!session.steps().is_empty());
    assert_eq!(session.user_id(), "anonymous");
    assert_eq!(session.status, SessionStatus::Idle);

    let err = service.start_session("  ", "cook-1").await.unwrap_err();
    assert!(matches!(err, PortError::InvalidInput(_)));
}

#[tokio::test]
async fn idle_sessions_are_reaped() {
    let settings = CookSettings {
        idle_ttl: Duration::ZERO,
        ..CookSettings::default()
    };
    let service = service_with(vec![step(1, 0)], settings);
    let id = start(&service).await;
    std::thread::sleep(Duration::from_millis(5));

    assert_eq!(service.reap_idle().await, 1);
    assert!(matches!(
        service.snapshot(id).await,
        Err(PortError::NotFound(_))
    ));
}
