//! Read-side aggregation over already-fetched records. Every function is
//! pure: the trailing window is computed from the `now` passed in, and
//! records outside it are ignored.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use appointment_cell::{Appointment, AppointmentStatus};
use chatbot_cell::ConversationExchange;
use mood_cell::MoodEntry;
use payment_cell::{PaymentRecord, PaymentStatus};

use crate::models::{
    ActivityItem, AppointmentAnalysis, AppointmentCounts, MonthlyRevenue, MoodAnalysis,
    MoodCounts, MoodPoint, MoodStats, MoodTrend, MoodTrends, PaymentTotals, ProviderStats,
    RecentSnapshot, ReportDetails, ReportSummary, SessionAnalysis, SessionSummary, StatusCount,
    UserReport, UserStats, WeeklyBookings, WellnessInsights, BOOKING_WEEKS,
    MAX_SESSION_SUMMARIES, MONTHLY_WINDOW_DAYS, REVENUE_MONTHS, WEEKLY_WINDOW_DAYS,
};

pub const RECOMMEND_PROFESSIONAL: &str = "Consider scheduling a session with a professional";
pub const RECOMMEND_CHAT: &str = "Try chatting with our AI more regularly";
pub const RECOMMEND_FIRST_BOOKING: &str = "Book your first appointment with a psychologist";

const LOW_WELLNESS_SCORE: u32 = 50;
const FEW_EXCHANGES: usize = 5;
const TREND_THRESHOLD: f64 = 0.1;

pub fn window_start(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

fn within<'a, T>(
    records: &'a [T],
    since: DateTime<Utc>,
    at: impl Fn(&T) -> DateTime<Utc> + 'a,
) -> impl Iterator<Item = &'a T> + 'a {
    records.iter().filter(move |r| at(r) >= since)
}

fn newest_first<T: Clone>(mut records: Vec<T>, at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    records.sort_by_key(|r| std::cmp::Reverse(at(r)));
    records
}

// ---- mood -------------------------------------------------------------------

pub fn mood_counts<'a>(entries: impl IntoIterator<Item = &'a MoodEntry>) -> MoodCounts {
    let mut counts = MoodCounts::default();
    for entry in entries {
        counts.add(entry.sentiment);
    }
    counts
}

/// Dominant mood; ties favour positive over neutral over negative.
pub fn mood_status(counts: &MoodCounts) -> &'static str {
    if counts.total() == 0 {
        "No Data"
    } else if counts.positive >= counts.neutral && counts.positive >= counts.negative {
        "Positive"
    } else if counts.neutral >= counts.negative {
        "Neutral"
    } else {
        "Negative"
    }
}

/// Share of positive entries as a percentage with two decimals.
pub fn positive_percentage(counts: &MoodCounts) -> String {
    let total = counts.total();
    if total == 0 {
        return "0.00".to_string();
    }
    format!("{:.2}", counts.positive as f64 / total as f64 * 100.0)
}

/// Rounded positive share in 0..=100; 0 when there are no entries.
pub fn wellness_score(counts: &MoodCounts) -> u32 {
    let total = counts.total();
    if total == 0 {
        return 0;
    }
    (counts.positive as f64 / total as f64 * 100.0).round() as u32
}

pub fn mood_stats(entries: &[MoodEntry], now: DateTime<Utc>) -> MoodStats {
    let since = window_start(now, MONTHLY_WINDOW_DAYS);
    let recent = newest_first(
        within(entries, since, |e| e.created_at).cloned().collect(),
        |e| e.created_at,
    );
    let counts = mood_counts(&recent);

    MoodStats {
        status: mood_status(&counts).to_string(),
        percentage: positive_percentage(&counts),
        history: recent
            .iter()
            .map(|e| MoodPoint {
                date: e.created_at.date_naive(),
                sentiment: e.sentiment,
            })
            .collect(),
    }
}

pub fn mood_trends(entries: &[MoodEntry], now: DateTime<Utc>) -> MoodTrends {
    let since = window_start(now, WEEKLY_WINDOW_DAYS);
    let mut trends = MoodTrends::new();
    for entry in within(entries, since, |e| e.created_at) {
        trends
            .entry(entry.created_at.format("%Y-%m-%d").to_string())
            .or_default()
            .add(entry.sentiment);
    }
    trends
}

/// Compares the mean sentiment of the newer half of the entries with the
/// older half.
pub fn mood_trend(entries: &[MoodEntry]) -> MoodTrend {
    if entries.is_empty() {
        return MoodTrend::NoData;
    }
    if entries.len() < 2 {
        return MoodTrend::Stable;
    }

    let mut scores: Vec<(DateTime<Utc>, i32)> = entries
        .iter()
        .map(|e| (e.created_at, e.sentiment.score()))
        .collect();
    scores.sort_by_key(|(at, _)| *at);

    let mid = scores.len() / 2;
    let mean = |slice: &[(DateTime<Utc>, i32)]| {
        slice.iter().map(|(_, s)| *s as f64).sum::<f64>() / slice.len() as f64
    };
    let delta = mean(&scores[mid..]) - mean(&scores[..mid]);

    if delta > TREND_THRESHOLD {
        MoodTrend::Improving
    } else if delta < -TREND_THRESHOLD {
        MoodTrend::Declining
    } else {
        MoodTrend::Stable
    }
}

// ---- sessions -----------------------------------------------------------------

pub fn distinct_sessions<'a>(exchanges: impl IntoIterator<Item = &'a ConversationExchange>) -> usize {
    exchanges
        .into_iter()
        .map(|e| e.session_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One summary per session in the window, most recently active first.
pub fn session_analytics(exchanges: &[ConversationExchange], now: DateTime<Utc>) -> Vec<SessionSummary> {
    let since = window_start(now, MONTHLY_WINDOW_DAYS);

    let mut by_session: HashMap<&str, (usize, i32, DateTime<Utc>)> = HashMap::new();
    for exchange in within(exchanges, since, |e| e.created_at) {
        let slot = by_session
            .entry(exchange.session_id.as_str())
            .or_insert((0, 0, exchange.created_at));
        slot.0 += 1;
        slot.1 += exchange.sentiment.score();
        slot.2 = slot.2.max(exchange.created_at);
    }

    let mut sessions: Vec<(DateTime<Utc>, SessionSummary)> = by_session
        .into_iter()
        .map(|(session_id, (count, score, last))| {
            (
                last,
                SessionSummary {
                    session_id: session_id.to_string(),
                    message_count: count,
                    average_sentiment: round2(score as f64 / count as f64),
                    last_activity: last.date_naive(),
                },
            )
        })
        .collect();

    sessions.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.session_id.cmp(&b.1.session_id)));
    sessions
        .into_iter()
        .take(MAX_SESSION_SUMMARIES)
        .map(|(_, summary)| summary)
        .collect()
}

// ---- appointments and payments --------------------------------------------------

pub fn appointment_counts<'a>(appointments: impl IntoIterator<Item = &'a Appointment>) -> AppointmentCounts {
    let mut counts = AppointmentCounts::default();
    for appointment in appointments {
        counts.add(appointment.status);
    }
    counts
}

/// Totals over settled payments only.
pub fn payment_totals<'a>(payments: impl IntoIterator<Item = &'a PaymentRecord>) -> PaymentTotals {
    payments
        .into_iter()
        .filter(|p| p.status == PaymentStatus::Success)
        .fold(PaymentTotals::default(), |mut totals, p| {
            totals.total_amount += p.amount;
            totals.total_payments += 1;
            totals
        })
}

pub fn user_stats(
    moods: &[MoodEntry],
    exchanges: &[ConversationExchange],
    appointments: &[Appointment],
    payments: &[PaymentRecord],
    now: DateTime<Utc>,
) -> UserStats {
    let since = window_start(now, MONTHLY_WINDOW_DAYS);
    let mood = mood_counts(within(moods, since, |e| e.created_at));

    UserStats {
        mood,
        sessions: distinct_sessions(within(exchanges, since, |e| e.created_at)),
        appointments: appointment_counts(within(appointments, since, |a| a.created_at)),
        payments: payment_totals(within(payments, since, |p| p.created_at)),
        total_mood_entries: mood.total(),
    }
}

pub fn recommendations(score: u32, exchange_count: usize, appointment_count: usize) -> Vec<String> {
    let mut advice = Vec::new();
    if score < LOW_WELLNESS_SCORE {
        advice.push(RECOMMEND_PROFESSIONAL.to_string());
    }
    if exchange_count < FEW_EXCHANGES {
        advice.push(RECOMMEND_CHAT.to_string());
    }
    if appointment_count == 0 {
        advice.push(RECOMMEND_FIRST_BOOKING.to_string());
    }
    advice
}

pub fn wellness_insights(
    moods: &[MoodEntry],
    exchanges: &[ConversationExchange],
    appointments: &[Appointment],
    now: DateTime<Utc>,
) -> WellnessInsights {
    let since = window_start(now, MONTHLY_WINDOW_DAYS);
    let moods = newest_first(within(moods, since, |e| e.created_at).cloned().collect(), |e| e.created_at);
    let exchanges = newest_first(
        within(exchanges, since, |e| e.created_at).cloned().collect(),
        |e| e.created_at,
    );
    let appointments = newest_first(
        within(appointments, since, |a| a.created_at).cloned().collect(),
        |a| a.created_at,
    );

    let counts = mood_counts(&moods);
    let score = wellness_score(&counts);

    WellnessInsights {
        wellness_score: score,
        total_moods: counts.total(),
        positive_moods: counts.positive,
        total_exchanges: exchanges.len(),
        total_appointments: appointments.len(),
        recommendations: recommendations(score, exchanges.len(), appointments.len()),
        recent_activity: RecentSnapshot {
            last_mood: moods.first().map(|e| e.sentiment),
            last_session: exchanges.first().map(|e| e.created_at),
            last_appointment: appointments.first().cloned(),
        },
    }
}

pub fn user_report(
    moods: &[MoodEntry],
    exchanges: &[ConversationExchange],
    appointments: &[Appointment],
    payments: &[PaymentRecord],
    now: DateTime<Utc>,
) -> UserReport {
    let since = window_start(now, MONTHLY_WINDOW_DAYS);
    let today = now.date_naive();
    let moods = newest_first(within(moods, since, |e| e.created_at).cloned().collect(), |e| e.created_at);
    let exchanges: Vec<&ConversationExchange> = within(exchanges, since, |e| e.created_at).collect();
    let appointments = newest_first(
        within(appointments, since, |a| a.created_at).cloned().collect(),
        |a| a.created_at,
    );
    let payments = newest_first(
        within(payments, since, |p| p.created_at).cloned().collect(),
        |p| p.created_at,
    );

    let unique_sessions = distinct_sessions(exchanges.iter().copied());
    let average_messages_per_session = if unique_sessions == 0 {
        0
    } else {
        (exchanges.len() as f64 / unique_sessions as f64).round() as usize
    };
    let upcoming = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Booked && a.date > today)
        .count();
    let settled = payment_totals(&payments);

    UserReport {
        period: "Last 30 Days".to_string(),
        generated_at: now,
        summary: ReportSummary {
            total_mood_entries: moods.len(),
            total_exchanges: exchanges.len(),
            total_appointments: appointments.len(),
            total_payments: payments.len(),
            total_spent: settled.total_amount,
        },
        mood_analysis: MoodAnalysis {
            counts: mood_counts(&moods),
            trend: mood_trend(&moods),
        },
        session_analysis: SessionAnalysis {
            total_messages: exchanges.len(),
            average_messages_per_session,
            unique_sessions,
        },
        appointment_analysis: AppointmentAnalysis {
            counts: appointment_counts(&appointments),
            upcoming,
        },
        detailed_data: ReportDetails {
            mood_entries: moods.into_iter().take(10).collect(),
            recent_appointments: appointments.into_iter().take(5).collect(),
            recent_payments: payments.into_iter().take(5).collect(),
        },
    }
}

// ---- provider -------------------------------------------------------------------

fn months_back(today: NaiveDate, back: u32) -> Option<NaiveDate> {
    let index = today.year() * 12 + today.month0() as i32 - back as i32;
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
}

/// Completed appointments times the hourly rate for each of the trailing
/// calendar months, oldest first and the current month last.
pub fn revenue_rollup(appointments: &[Appointment], hourly_rate: i64, today: NaiveDate) -> Vec<MonthlyRevenue> {
    (0..REVENUE_MONTHS)
        .rev()
        .filter_map(|back| months_back(today, back))
        .map(|month_start| {
            let completed = appointments
                .iter()
                .filter(|a| a.status == AppointmentStatus::Completed)
                .filter(|a| a.date.year() == month_start.year() && a.date.month() == month_start.month())
                .count() as i64;
            MonthlyRevenue {
                month: month_start.format("%b").to_string(),
                revenue: completed * hourly_rate,
            }
        })
        .collect()
}

/// Bookings by appointment date over the last four weeks. "Week 1" is the
/// most recent and also counts anything scheduled ahead.
pub fn weekly_bookings(appointments: &[Appointment], today: NaiveDate) -> Vec<WeeklyBookings> {
    (1..=BOOKING_WEEKS)
        .map(|week| {
            let start = today - Duration::days(7 * week);
            let end = today - Duration::days(7 * (week - 1));
            let bookings = appointments
                .iter()
                .filter(|a| a.date >= start && (week == 1 || a.date < end))
                .count();
            WeeklyBookings {
                week: format!("Week {}", week),
                bookings,
            }
        })
        .collect()
}

pub fn status_distribution(appointments: &[Appointment]) -> Vec<StatusCount> {
    let counts = appointment_counts(appointments);
    [
        (AppointmentStatus::Booked, counts.booked),
        (AppointmentStatus::Completed, counts.completed),
        (AppointmentStatus::Cancelled, counts.cancelled),
    ]
    .into_iter()
    .filter(|(_, value)| *value > 0)
    .map(|(status, value)| StatusCount { status, value })
    .collect()
}

pub fn provider_stats(appointments: &[Appointment], hourly_rate: i64, today: NaiveDate) -> ProviderStats {
    ProviderStats {
        bookings: weekly_bookings(appointments, today),
        revenue: revenue_rollup(appointments, hourly_rate, today),
        status: status_distribution(appointments),
    }
}

// ---- activity -------------------------------------------------------------------

pub fn recent_activity(
    latest_exchange: Option<&ConversationExchange>,
    latest_appointment: Option<(&Appointment, Option<String>)>,
    latest_payment: Option<&PaymentRecord>,
) -> Vec<ActivityItem> {
    let mut activity = Vec::new();

    if let Some(exchange) = latest_exchange {
        activity.push(ActivityItem::Session {
            time: exchange.created_at,
            sentiment: exchange.sentiment,
        });
    }

    if let Some((appointment, psychologist)) = latest_appointment {
        activity.push(ActivityItem::Appointment {
            time: appointment.date.and_time(appointment.time_slot.start_time()),
            psychologist: psychologist.unwrap_or_else(|| "Unknown".to_string()),
        });
    }

    if let Some(payment) = latest_payment.filter(|p| p.status != PaymentStatus::Failed) {
        activity.push(ActivityItem::Payment {
            time: payment.created_at,
            amount: payment.amount,
            status: payment.status,
        });
    }

    activity
}
