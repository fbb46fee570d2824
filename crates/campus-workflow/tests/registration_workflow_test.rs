//! Integration tests for capacity-limited registration.

mod common;

use std::sync::Arc;

use campus_core::error::CampusError;
use campus_core::models::role::Role;
use campus_workflow::WorkflowConfig;
use common::{RecordingNotifier, event_fields, setup, setup_with};
use futures::future::join_all;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn capacity_holds_under_concurrent_registration() {
    const CAPACITY: u32 = 10;
    const EXTRA: usize = 20;

    let campus = Arc::new(
        setup_with(RecordingNotifier::default(), WorkflowConfig::default()).await,
    );
    let admin = campus.admin().await;
    let staff = campus.account("staff@campus.edu", Role::Staff, true).await;

    let event = campus
        .events
        .create(staff, event_fields("Limited", 3, Some(CAPACITY)))
        .await
        .unwrap();
    campus.events.approve(admin, event.id).await.unwrap();

    let mut students = Vec::new();
    for i in 0..(CAPACITY as usize + EXTRA) {
        students.push(
            campus
                .account(&format!("student{i}@campus.edu"), Role::Student, true)
                .await,
        );
    }

    let handles = students.into_iter().map(|student| {
        let campus = Arc::clone(&campus);
        tokio::spawn(async move { campus.registrations.register(student, event.id).await })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let full = results
        .iter()
        .filter(|r| matches!(r, Err(CampusError::EventFull { .. })))
        .count();

    // The shipped retry budget absorbs every storage conflict.
    assert!(
        results.iter().all(|r| !matches!(r, Err(CampusError::Conflict(_)))),
        "{results:?}"
    );
    assert_eq!(successes, CAPACITY as usize);
    assert_eq!(full, EXTRA);
    assert_eq!(
        campus.registrations.count_for(event.id).await.unwrap(),
        u64::from(CAPACITY)
    );
}

#[tokio::test]
async fn double_registration_keeps_one_pair() {
    let (campus, _) = setup().await;
    let admin = campus.admin().await;
    let student = campus.account("stu@campus.edu", Role::Student, true).await;
    let event = campus
        .events
        .create(admin, event_fields("Once", 2, None))
        .await
        .unwrap();
    campus.events.approve(admin, event.id).await.unwrap();

    campus
        .registrations
        .register(student, event.id)
        .await
        .unwrap();
    let err = campus
        .registrations
        .register(student, event.id)
        .await
        .unwrap_err();

    assert!(matches!(err, CampusError::AlreadyRegistered { .. }));
    assert_eq!(campus.registrations.count_for(event.id).await.unwrap(), 1);
    assert!(
        campus
            .registrations
            .is_registered(student.account_id(), event.id)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn unregister_twice_never_errors() {
    let (campus, _) = setup().await;
    let admin = campus.admin().await;
    let student = campus.account("stu@campus.edu", Role::Student, true).await;
    let event = campus
        .events
        .create(admin, event_fields("Leave", 2, Some(1)))
        .await
        .unwrap();
    campus.events.approve(admin, event.id).await.unwrap();

    campus
        .registrations
        .register(student, event.id)
        .await
        .unwrap();
    campus
        .registrations
        .unregister(student, event.id)
        .await
        .unwrap();
    campus
        .registrations
        .unregister(student, event.id)
        .await
        .unwrap();

    assert!(
        !campus
            .registrations
            .is_registered(student.account_id(), event.id)
            .await
            .unwrap()
    );
    // The freed seat can be taken again.
    campus
        .registrations
        .register(student, event.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn only_approved_events_accept_registrations() {
    let (campus, _) = setup().await;
    let admin = campus.admin().await;
    let student = campus.account("stu@campus.edu", Role::Student, true).await;

    let pending = campus
        .events
        .create(admin, event_fields("Pending", 2, None))
        .await
        .unwrap();
    assert!(matches!(
        campus.registrations.register(student, pending.id).await,
        Err(CampusError::EventNotOpen { .. })
    ));

    campus.events.reject(admin, pending.id).await.unwrap();
    assert!(matches!(
        campus.registrations.register(student, pending.id).await,
        Err(CampusError::EventNotOpen { .. })
    ));

    assert!(matches!(
        campus
            .registrations
            .register(student, uuid::Uuid::new_v4())
            .await,
        Err(CampusError::EventNotOpen { .. })
    ));
}

#[tokio::test]
async fn only_approved_students_register() {
    let (campus, _) = setup().await;
    let admin = campus.admin().await;
    let staff = campus.account("staff@campus.edu", Role::Staff, true).await;
    let unapproved = campus.account("new@campus.edu", Role::Student, false).await;
    let event = campus
        .events
        .create(admin, event_fields("Students Only", 2, None))
        .await
        .unwrap();
    campus.events.approve(admin, event.id).await.unwrap();

    for actor in [staff, unapproved, admin] {
        assert!(matches!(
            campus.registrations.register(actor, event.id).await,
            Err(CampusError::Forbidden { .. })
        ));
    }
    assert_eq!(campus.registrations.count_for(event.id).await.unwrap(), 0);
}

#[tokio::test]
async fn lowering_capacity_keeps_existing_registrations() {
    let (campus, _) = setup().await;
    let admin = campus.admin().await;
    let first = campus.account("a@campus.edu", Role::Student, true).await;
    let second = campus.account("b@campus.edu", Role::Student, true).await;
    let third = campus.account("c@campus.edu", Role::Student, true).await;
    let event = campus
        .events
        .create(admin, event_fields("Shrinking", 2, Some(5)))
        .await
        .unwrap();
    campus.events.approve(admin, event.id).await.unwrap();

    campus.registrations.register(first, event.id).await.unwrap();
    campus.registrations.register(second, event.id).await.unwrap();
    campus
        .events
        .update(admin, event.id, event_fields("Shrinking", 2, Some(1)))
        .await
        .unwrap();

    assert_eq!(campus.registrations.count_for(event.id).await.unwrap(), 2);
    assert!(matches!(
        campus.registrations.register(third, event.id).await,
        Err(CampusError::EventFull { .. })
    ));
}

#[tokio::test]
async fn attendees_are_visible_to_organizer_and_admin_only() {
    let (campus, _) = setup().await;
    let admin = campus.admin().await;
    let organizer = campus.account("org@campus.edu", Role::Staff, true).await;
    let outsider = campus.account("out@campus.edu", Role::Staff, true).await;
    let student = campus.account("stu@campus.edu", Role::Student, true).await;

    let event = campus
        .events
        .create(organizer, event_fields("Meetup", 2, None))
        .await
        .unwrap();
    campus.events.approve(admin, event.id).await.unwrap();
    campus
        .registrations
        .register(student, event.id)
        .await
        .unwrap();

    for viewer in [organizer, admin] {
        let attendees = campus
            .registrations
            .attendees(viewer, event.id)
            .await
            .unwrap();
        assert_eq!(attendees.len(), 1);
        assert_eq!(attendees[0].id, student.account_id());
    }
    assert!(matches!(
        campus.registrations.attendees(outsider, event.id).await,
        Err(CampusError::Forbidden { .. })
    ));

    let mine = campus
        .registrations
        .registrations_for(student)
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].event_id, event.id);
}

#[tokio::test]
async fn deleting_an_event_drops_its_registrations() {
    let (campus, _) = setup().await;
    let admin = campus.admin().await;
    let student = campus.account("stu@campus.edu", Role::Student, true).await;
    let event = campus
        .events
        .create(admin, event_fields("Cancelled", 2, None))
        .await
        .unwrap();
    campus.events.approve(admin, event.id).await.unwrap();
    campus
        .registrations
        .register(student, event.id)
        .await
        .unwrap();

    campus.events.delete(admin, event.id).await.unwrap();

    assert!(
        campus
            .registrations
            .registrations_for(student)
            .await
            .unwrap()
            .is_empty()
    );
}
