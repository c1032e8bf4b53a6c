use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use appointment_cell::models::{AvailableSlotsQuery, BookAppointmentRequest, NewAppointment};
use appointment_cell::services::booking::AppointmentBookingService;
use appointment_cell::{
    AppointmentError, AppointmentStatus, AppointmentStore, InMemoryAppointmentStore, SlotConflict, TimeSlot,
};
use notification_cell::{Notification, NotificationDispatcher, NotificationError, NotificationTemplate, Notifier};
use shared_utils::test_utils::TestUser;

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn deliver(&self, _notification: &Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Rejected {
            status: 503,
            body: "relay down".to_string(),
        })
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()
}

fn request(provider: Uuid, date: &str, slot: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        psychologist_id: Some(provider.to_string()),
        date: Some(date.to_string()),
        time_slot: Some(slot.to_string()),
        reason: Some("Feeling anxious".to_string()),
    }
}

fn service_with(notifier: Arc<dyn Notifier>) -> (AppointmentBookingService, Arc<InMemoryAppointmentStore>) {
    let store = Arc::new(InMemoryAppointmentStore::new());
    let service = AppointmentBookingService::with_store(store.clone(), NotificationDispatcher::new(notifier));
    (service, store)
}

fn service() -> (AppointmentBookingService, Arc<InMemoryAppointmentStore>) {
    service_with(Arc::new(RecordingNotifier::default()))
}

#[tokio::test]
async fn test_second_booking_of_same_provider_slot_conflicts() {
    let (service, _) = service();
    let provider = Uuid::new_v4();
    let first = TestUser::user("first@example.com").to_context();
    let second = TestUser::user("second@example.com").to_context();

    let booked = service
        .book_on(&first, request(provider, "2025-12-15", "10:00"), today())
        .await
        .unwrap();
    assert_eq!(booked.status, AppointmentStatus::Booked);

    let result = service
        .book_on(&second, request(provider, "2025-12-15", "10:00"), today())
        .await;
    assert_matches!(result, Err(AppointmentError::Conflict(SlotConflict::ProviderSlotTaken)));
}

#[tokio::test]
async fn test_requester_cannot_double_book_across_providers() {
    let (service, _) = service();
    let client = TestUser::user("client@example.com").to_context();

    service
        .book_on(&client, request(Uuid::new_v4(), "2025-12-15", "11:00"), today())
        .await
        .unwrap();

    let result = service
        .book_on(&client, request(Uuid::new_v4(), "2025-12-15", "11:00"), today())
        .await;
    assert_matches!(result, Err(AppointmentError::Conflict(SlotConflict::RequesterAlreadyBooked)));
}

#[tokio::test]
async fn test_validation_happens_before_store_access() {
    let (service, store) = service();
    let client = TestUser::user("client@example.com").to_context();

    for (provider, date, slot) in [
        ("not-a-uuid".to_string(), "2025-12-15", "10:00"),
        (Uuid::new_v4().to_string(), "2025-11-30", "10:00"),
        (Uuid::new_v4().to_string(), "2025-13-01", "10:00"),
        (Uuid::new_v4().to_string(), "2025-12-15", "18:00"),
        (Uuid::new_v4().to_string(), "2025-12-15", "10:30"),
    ] {
        let result = service
            .book_on(
                &client,
                BookAppointmentRequest {
                    psychologist_id: Some(provider),
                    date: Some(date.to_string()),
                    time_slot: Some(slot.to_string()),
                    reason: None,
                },
                today(),
            )
            .await;
        assert_matches!(result, Err(AppointmentError::Validation(_)));
    }

    assert!(store.list_for_requester(client.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_or_blank_fields_are_rejected() {
    let (service, store) = service();
    let client = TestUser::user("client@example.com").to_context();
    let provider = Uuid::new_v4();

    let mut missing_date = request(provider, "2025-12-15", "10:00");
    missing_date.date = None;
    let mut blank_slot = request(provider, "2025-12-15", "10:00");
    blank_slot.time_slot = Some("   ".to_string());

    for incomplete in [missing_date, blank_slot, BookAppointmentRequest::default()] {
        let result = service.book_on(&client, incomplete, today()).await;
        assert_matches!(
            result,
            Err(AppointmentError::Validation(ref msg)) if msg == "Missing required fields"
        );
    }

    assert!(store.list_for_requester(client.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_twice_is_not_found_and_state_stays_cancelled() {
    let (service, store) = service();
    let client = TestUser::user("client@example.com").to_context();

    let appointment = service
        .book_on(&client, request(Uuid::new_v4(), "2025-12-16", "09:00"), today())
        .await
        .unwrap();

    let cancelled = service.cancel(&client, appointment.id).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    assert_matches!(
        service.cancel(&client, appointment.id).await,
        Err(AppointmentError::NotCancellable)
    );
    let stored = store.find_by_id(appointment.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn test_only_requester_can_cancel() {
    let (service, _) = service();
    let client = TestUser::user("client@example.com").to_context();
    let stranger = TestUser::user("stranger@example.com").to_context();

    let appointment = service
        .book_on(&client, request(Uuid::new_v4(), "2025-12-16", "12:00"), today())
        .await
        .unwrap();

    assert_matches!(
        service.cancel(&stranger, appointment.id).await,
        Err(AppointmentError::NotCancellable)
    );
}

#[tokio::test]
async fn test_book_rebook_cancel_rebook_scenario() {
    let (service, _) = service();
    let provider = Uuid::new_v4();
    let client = TestUser::user("client@example.com").to_context();

    let original = service
        .book_on(&client, request(provider, "2025-12-15", "10:00"), today())
        .await
        .unwrap();

    assert_matches!(
        service.book_on(&client, request(provider, "2025-12-15", "10:00"), today()).await,
        Err(AppointmentError::Conflict(_))
    );

    let cancelled = service.cancel(&client, original.id).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    let rebooked = service
        .book_on(&client, request(provider, "2025-12-15", "10:00"), today())
        .await
        .unwrap();
    assert_eq!(rebooked.status, AppointmentStatus::Booked);
    assert_ne!(rebooked.id, original.id);
}

#[tokio::test]
async fn test_complete_only_from_booked_by_provider() {
    let (service, _) = service();
    let provider = TestUser::psychologist("doc@example.com");
    let client = TestUser::user("client@example.com").to_context();

    let appointment = service
        .book_on(&client, request(provider.id, "2025-12-20", "15:00"), today())
        .await
        .unwrap();

    let other_provider = TestUser::psychologist("other@example.com").to_context();
    assert_matches!(
        service.complete(&other_provider, appointment.id).await,
        Err(AppointmentError::NotCompletable)
    );

    let completed = service.complete(&provider.to_context(), appointment.id).await.unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);

    assert_matches!(
        service.complete(&provider.to_context(), appointment.id).await,
        Err(AppointmentError::NotCompletable)
    );
    // Completed is terminal for the requester too.
    assert_matches!(
        service.cancel(&client, appointment.id).await,
        Err(AppointmentError::NotCancellable)
    );
}

#[tokio::test]
async fn test_available_slots_partition_the_day() {
    let (service, _) = service();
    let provider = Uuid::new_v4();
    let client = TestUser::user("client@example.com").to_context();
    let other = TestUser::user("other@example.com").to_context();

    service
        .book_on(&client, request(provider, "2025-12-15", "10:00"), today())
        .await
        .unwrap();
    let cancelled = service
        .book_on(&other, request(provider, "2025-12-15", "13:00"), today())
        .await
        .unwrap();
    service.cancel(&other, cancelled.id).await.unwrap();

    let slots = service
        .available_slots(AvailableSlotsQuery {
            psychologist_id: provider.to_string(),
            date: "2025-12-15".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(slots.booked_slots, vec!["10:00".parse::<TimeSlot>().unwrap()]);
    assert_eq!(slots.available_slots.len(), 8);
    assert!(!slots.available_slots.contains(&"10:00".parse().unwrap()));
    assert!(slots.available_slots.contains(&"13:00".parse().unwrap()));
}

#[tokio::test]
async fn test_get_one_hides_other_peoples_appointments() {
    let (service, _) = service();
    let provider = TestUser::psychologist("doc@example.com");
    let client = TestUser::user("client@example.com").to_context();

    let appointment = service
        .book_on(&client, request(provider.id, "2025-12-15", "16:00"), today())
        .await
        .unwrap();

    assert!(service.get_one(&client, appointment.id).await.is_ok());
    assert!(service.get_one(&provider.to_context(), appointment.id).await.is_ok());
    assert!(service.get_one(&TestUser::admin("admin@example.com").to_context(), appointment.id).await.is_ok());
    assert_matches!(
        service.get_one(&TestUser::user("nosy@example.com").to_context(), appointment.id).await,
        Err(AppointmentError::NotFound)
    );
}

#[tokio::test]
async fn test_lists_are_sorted_by_date_and_slot() {
    let (service, _) = service();
    let provider = TestUser::psychologist("doc@example.com");
    let client = TestUser::user("client@example.com").to_context();

    for (date, slot) in [("2025-12-17", "09:00"), ("2025-12-15", "14:00"), ("2025-12-15", "10:00")] {
        service
            .book_on(&client, request(provider.id, date, slot), today())
            .await
            .unwrap();
    }

    let mine: Vec<String> = service
        .list_mine(&client)
        .await
        .unwrap()
        .iter()
        .map(|a| format!("{} {}", a.date, a.time_slot))
        .collect();
    assert_eq!(mine, vec!["2025-12-15 10:00", "2025-12-15 14:00", "2025-12-17 09:00"]);

    let theirs = service.list_for_provider(&provider.to_context()).await.unwrap();
    assert_eq!(theirs.len(), 3);
}

#[tokio::test]
async fn test_notification_failure_does_not_undo_booking() {
    let (service, store) = service_with(Arc::new(FailingNotifier));
    let client = TestUser::user("client@example.com").to_context();

    let appointment = service
        .book_on(&client, request(Uuid::new_v4(), "2025-12-15", "10:00"), today())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    let stored = store.find_by_id(appointment.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Booked);
}

#[tokio::test]
async fn test_confirmation_and_cancellation_notices_are_sent() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (service, _) = service_with(notifier.clone());
    let client = TestUser::user("client@example.com").to_context();

    let appointment = service
        .book_on(&client, request(Uuid::new_v4(), "2025-12-15", "10:00"), today())
        .await
        .unwrap();
    service.cancel(&client, appointment.id).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    let sent = notifier.sent.lock().unwrap();
    let templates: Vec<NotificationTemplate> = sent.iter().map(|n| n.template).collect();
    assert!(templates.contains(&NotificationTemplate::AppointmentConfirmation));
    assert!(templates.contains(&NotificationTemplate::AppointmentCancellation));
    assert!(sent.iter().all(|n| n.recipient == "client@example.com"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_of_one_slot_have_one_winner() {
    let (service, _) = service();
    let service = Arc::new(service);
    let provider = Uuid::new_v4();

    let attempts = (0..8).map(|i| {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            let ctx = TestUser::user(&format!("client{}@example.com", i)).to_context();
            service
                .book_on(&ctx, request(provider, "2025-12-15", "10:00"), today())
                .await
        })
    });

    let results: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, AppointmentError::Conflict(SlotConflict::ProviderSlotTaken))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_store_rejects_racing_inserts_without_prechecks() {
    let store = Arc::new(InMemoryAppointmentStore::new());
    let provider = Uuid::new_v4();
    let date = NaiveDate::from_ymd_opt(2025, 12, 15).unwrap();
    let slot: TimeSlot = "10:00".parse().unwrap();

    let inserts = (0..8).map(|_| {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .insert(NewAppointment {
                    user_id: Uuid::new_v4(),
                    psychologist_id: provider,
                    date,
                    time_slot: slot,
                    reason: None,
                })
                .await
        })
    });

    let results: Vec<_> = futures::future::join_all(inserts).await;
    let winners = results
        .into_iter()
        .filter(|joined| matches!(joined, Ok(Ok(_))))
        .count();
    assert_eq!(winners, 1);
}
