use assert_matches::assert_matches;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use analytics_cell::models::{ActivityItem, MoodTrend};
use analytics_cell::services::aggregate::*;
use appointment_cell::{Appointment, AppointmentStatus, TimeSlot};
use chatbot_cell::ConversationExchange;
use mood_cell::MoodEntry;
use payment_cell::{PaymentProcessor, PaymentRecord, PaymentStatus};
use shared_models::sentiment::Sentiment;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
}

fn mood(sentiment: Sentiment, hours_ago: i64) -> MoodEntry {
    MoodEntry {
        id: Uuid::new_v4(),
        user_id: Uuid::nil(),
        sentiment,
        created_at: now() - Duration::hours(hours_ago),
    }
}

fn exchange(session: &str, sentiment: Sentiment, hours_ago: i64) -> ConversationExchange {
    ConversationExchange {
        id: Uuid::new_v4(),
        user_id: Uuid::nil(),
        session_id: session.to_string(),
        message: "m".to_string(),
        response: "r".to_string(),
        sentiment,
        created_at: now() - Duration::hours(hours_ago),
    }
}

fn appointment(date: NaiveDate, status: AppointmentStatus) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        user_id: Uuid::nil(),
        psychologist_id: Uuid::nil(),
        date,
        time_slot: TimeSlot::from_hour(10).unwrap(),
        reason: None,
        status,
        payment_id: None,
        created_at: now() - Duration::days(1),
    }
}

fn payment(amount: i64, status: PaymentStatus, hours_ago: i64) -> PaymentRecord {
    PaymentRecord {
        id: Uuid::new_v4(),
        user_id: Uuid::nil(),
        appointment_id: Uuid::new_v4(),
        amount,
        currency: "pkr".to_string(),
        processor: PaymentProcessor::Stripe,
        processor_reference: Some("pi_1".to_string()),
        status,
        created_at: now() - Duration::hours(hours_ago),
    }
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn seven_positive_three_negative() {
    let mut entries: Vec<MoodEntry> = (0..7).map(|i| mood(Sentiment::Positive, i)).collect();
    entries.extend((10..13).map(|i| mood(Sentiment::Negative, i)));

    let stats = mood_stats(&entries, now());
    assert_eq!(stats.status, "Positive");
    assert_eq!(stats.percentage, "70.00");
    assert_eq!(stats.history.len(), 10);
    assert_eq!(wellness_score(&mood_counts(&entries)), 70);
}

#[test]
fn empty_mood_history() {
    let stats = mood_stats(&[], now());
    assert_eq!(stats.status, "No Data");
    assert_eq!(stats.percentage, "0.00");
    assert!(stats.history.is_empty());
    assert_eq!(wellness_score(&mood_counts(&[])), 0);
}

#[test]
fn status_ties_prefer_positive_then_neutral() {
    let tie = vec![
        mood(Sentiment::Positive, 1),
        mood(Sentiment::Neutral, 2),
    ];
    assert_eq!(mood_status(&mood_counts(&tie)), "Positive");

    let neutral_tie = vec![
        mood(Sentiment::Neutral, 1),
        mood(Sentiment::Negative, 2),
    ];
    assert_eq!(mood_status(&mood_counts(&neutral_tie)), "Neutral");

    let negative = vec![mood(Sentiment::Negative, 1)];
    assert_eq!(mood_status(&mood_counts(&negative)), "Negative");
}

#[test]
fn mood_history_is_windowed_and_newest_first() {
    let entries = vec![
        mood(Sentiment::Negative, 24 * 40),
        mood(Sentiment::Neutral, 48),
        mood(Sentiment::Positive, 1),
    ];

    let stats = mood_stats(&entries, now());
    assert_eq!(stats.history.len(), 2);
    assert_eq!(stats.history[0].sentiment, Sentiment::Positive);
    assert_eq!(stats.history[1].date, ymd(2025, 3, 13));
}

#[test]
fn wellness_score_is_monotone_in_positive_entries() {
    let mut previous = 0;
    for positives in 0..12 {
        let mut entries: Vec<MoodEntry> = (0..5).map(|i| mood(Sentiment::Negative, i)).collect();
        entries.extend((0..positives).map(|i| mood(Sentiment::Positive, 10 + i)));

        let score = wellness_score(&mood_counts(&entries));
        assert!(score >= previous, "score dropped from {} to {}", previous, score);
        assert!(score <= 100);
        previous = score;
    }
}

#[test]
fn mood_trends_bucket_by_day() {
    let entries = vec![
        mood(Sentiment::Positive, 1),
        mood(Sentiment::Negative, 2),
        mood(Sentiment::Neutral, 30),
        mood(Sentiment::Positive, 24 * 9),
    ];

    let trends = mood_trends(&entries, now());
    assert_eq!(trends.len(), 2);
    let today = &trends["2025-03-15"];
    assert_eq!((today.positive, today.neutral, today.negative), (1, 0, 1));
    assert_eq!(trends["2025-03-14"].neutral, 1);
    assert_eq!(trends.keys().next().map(String::as_str), Some("2025-03-14"));
}

#[test]
fn session_analytics_groups_by_session() {
    let exchanges = vec![
        exchange("a", Sentiment::Positive, 50),
        exchange("a", Sentiment::Negative, 49),
        exchange("a", Sentiment::Positive, 48),
        exchange("b", Sentiment::Negative, 2),
        exchange("old", Sentiment::Positive, 24 * 45),
    ];

    let sessions = session_analytics(&exchanges, now());
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].session_id, "b");
    assert_eq!(sessions[0].average_sentiment, -1.0);
    assert_eq!(sessions[1].session_id, "a");
    assert_eq!(sessions[1].message_count, 3);
    assert_eq!(sessions[1].average_sentiment, 0.33);
    assert_eq!(sessions[1].last_activity, ymd(2025, 3, 13));
}

#[test]
fn session_analytics_keeps_ten_most_recent() {
    let exchanges: Vec<ConversationExchange> = (0..15)
        .map(|i| exchange(&format!("s{}", i), Sentiment::Neutral, i))
        .collect();

    let sessions = session_analytics(&exchanges, now());
    assert_eq!(sessions.len(), 10);
    assert_eq!(sessions[0].session_id, "s0");
}

#[test]
fn revenue_rollup_covers_four_months_across_year_boundary() {
    let appointments = vec![
        appointment(ymd(2024, 11, 20), AppointmentStatus::Completed),
        appointment(ymd(2025, 1, 5), AppointmentStatus::Completed),
        appointment(ymd(2025, 1, 28), AppointmentStatus::Completed),
        appointment(ymd(2025, 3, 2), AppointmentStatus::Completed),
        appointment(ymd(2025, 3, 10), AppointmentStatus::Booked),
        appointment(ymd(2025, 2, 10), AppointmentStatus::Cancelled),
    ];

    let revenue = revenue_rollup(&appointments, 2000, ymd(2025, 3, 15));
    let months: Vec<&str> = revenue.iter().map(|r| r.month.as_str()).collect();
    let amounts: Vec<i64> = revenue.iter().map(|r| r.revenue).collect();

    assert_eq!(months, vec!["Dec", "Jan", "Feb", "Mar"]);
    assert_eq!(amounts, vec![0, 4000, 0, 2000]);
}

#[test]
fn weekly_bookings_by_appointment_date() {
    let today = ymd(2025, 3, 15);
    let appointments = vec![
        appointment(ymd(2025, 3, 20), AppointmentStatus::Booked),
        appointment(ymd(2025, 3, 12), AppointmentStatus::Completed),
        appointment(ymd(2025, 3, 5), AppointmentStatus::Completed),
        appointment(ymd(2025, 2, 20), AppointmentStatus::Cancelled),
        appointment(ymd(2025, 1, 1), AppointmentStatus::Completed),
    ];

    let weeks = weekly_bookings(&appointments, today);
    let counts: Vec<usize> = weeks.iter().map(|w| w.bookings).collect();
    assert_eq!(weeks[0].week, "Week 1");
    assert_eq!(counts, vec![2, 1, 0, 1]);
}

#[test]
fn status_distribution_omits_empty_statuses() {
    let appointments = vec![
        appointment(ymd(2025, 3, 1), AppointmentStatus::Completed),
        appointment(ymd(2025, 3, 2), AppointmentStatus::Completed),
        appointment(ymd(2025, 3, 3), AppointmentStatus::Cancelled),
    ];

    let distribution = status_distribution(&appointments);
    assert_eq!(distribution.len(), 2);
    assert_eq!(distribution[0].status, AppointmentStatus::Completed);
    assert_eq!(distribution[0].value, 2);
    assert!(status_distribution(&[]).is_empty());
}

#[test]
fn recommendations_follow_thresholds() {
    assert_eq!(
        recommendations(30, 2, 0),
        vec![RECOMMEND_PROFESSIONAL, RECOMMEND_CHAT, RECOMMEND_FIRST_BOOKING]
    );
    assert!(recommendations(50, 5, 1).is_empty());
    assert_eq!(recommendations(80, 10, 0), vec![RECOMMEND_FIRST_BOOKING]);
}

#[test]
fn wellness_insights_snapshot() {
    let moods = vec![mood(Sentiment::Negative, 1), mood(Sentiment::Positive, 5)];
    let exchanges = vec![exchange("a", Sentiment::Neutral, 3)];

    let insights = wellness_insights(&moods, &exchanges, &[], now());
    assert_eq!(insights.wellness_score, 50);
    assert_eq!(insights.total_moods, 2);
    assert_eq!(insights.positive_moods, 1);
    assert_eq!(insights.recent_activity.last_mood, Some(Sentiment::Negative));
    assert_eq!(insights.recommendations, vec![RECOMMEND_CHAT, RECOMMEND_FIRST_BOOKING]);
}

#[test]
fn user_stats_counts_settled_payments() {
    let payments = vec![
        payment(250_000, PaymentStatus::Success, 5),
        payment(100_000, PaymentStatus::Pending, 4),
        payment(100_000, PaymentStatus::Failed, 3),
    ];
    let exchanges = vec![
        exchange("a", Sentiment::Neutral, 1),
        exchange("a", Sentiment::Neutral, 2),
        exchange("b", Sentiment::Neutral, 3),
    ];
    let appointments = vec![
        appointment(ymd(2025, 3, 20), AppointmentStatus::Booked),
        appointment(ymd(2025, 3, 1), AppointmentStatus::Cancelled),
    ];

    let stats = user_stats(&[mood(Sentiment::Positive, 1)], &exchanges, &appointments, &payments, now());
    assert_eq!(stats.sessions, 2);
    assert_eq!(stats.payments.total_amount, 250_000);
    assert_eq!(stats.payments.total_payments, 1);
    assert_eq!(stats.appointments.booked, 1);
    assert_eq!(stats.appointments.cancelled, 1);
    assert_eq!(stats.total_mood_entries, 1);
}

#[test]
fn user_report_sections() {
    let moods = vec![
        mood(Sentiment::Negative, 100),
        mood(Sentiment::Negative, 90),
        mood(Sentiment::Positive, 10),
        mood(Sentiment::Positive, 5),
    ];
    let exchanges = vec![
        exchange("a", Sentiment::Neutral, 1),
        exchange("a", Sentiment::Neutral, 2),
        exchange("b", Sentiment::Neutral, 3),
    ];
    let appointments = vec![
        appointment(ymd(2025, 3, 20), AppointmentStatus::Booked),
        appointment(ymd(2025, 3, 10), AppointmentStatus::Booked),
        appointment(ymd(2025, 3, 1), AppointmentStatus::Completed),
    ];
    let payments = vec![payment(250_000, PaymentStatus::Success, 1)];

    let report = user_report(&moods, &exchanges, &appointments, &payments, now());
    assert_eq!(report.period, "Last 30 Days");
    assert_eq!(report.summary.total_spent, 250_000);
    assert_eq!(report.mood_analysis.trend, MoodTrend::Improving);
    assert_eq!(report.session_analysis.unique_sessions, 2);
    assert_eq!(report.session_analysis.average_messages_per_session, 2);
    assert_eq!(report.appointment_analysis.upcoming, 1);
    assert_eq!(report.appointment_analysis.counts.booked, 2);
    assert_eq!(report.detailed_data.mood_entries[0].sentiment, Sentiment::Positive);
}

#[test]
fn mood_trend_edges() {
    assert_eq!(mood_trend(&[]), MoodTrend::NoData);
    assert_eq!(mood_trend(&[mood(Sentiment::Positive, 1)]), MoodTrend::Stable);
    assert_eq!(
        mood_trend(&[mood(Sentiment::Positive, 10), mood(Sentiment::Negative, 1)]),
        MoodTrend::Declining
    );
}

#[test]
fn recent_activity_skips_failed_payment() {
    let latest = exchange("a", Sentiment::Positive, 1);
    let booked = appointment(ymd(2025, 3, 20), AppointmentStatus::Booked);
    let failed = payment(100_000, PaymentStatus::Failed, 1);

    let activity = recent_activity(
        Some(&latest),
        Some((&booked, Some("Dr. Ayesha".to_string()))),
        Some(&failed),
    );

    assert_eq!(activity.len(), 2);
    assert_matches!(&activity[0], ActivityItem::Session { sentiment: Sentiment::Positive, .. });
    assert_matches!(
        &activity[1],
        ActivityItem::Appointment { time, psychologist }
            if psychologist == "Dr. Ayesha" && time.to_string() == "2025-03-20 10:00:00"
    );
}
