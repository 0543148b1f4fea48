use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::links::repo::Link;

pub const VIEW: &str = "view";
pub const CLICK: &str = "click";
pub const CONTACT_SAVE: &str = "contact_save";

const WINDOW_DAYS: i32 = 30;

/// Append-only fact row; never updated.
pub struct AnalyticsEvent;

impl AnalyticsEvent {
    pub async fn record(
        db: &PgPool,
        profile_id: Uuid,
        event_type: &str,
        metadata: Option<serde_json::Value>,
    ) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO analytics_events (profile_id, event_type, metadata) VALUES ($1, $2, $3)",
        )
        .bind(profile_id)
        .bind(event_type)
        .bind(metadata)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Per-calendar-day event counts over the trailing window, computed at
    /// query time.
    pub async fn daily_counts(db: &PgPool, profile_id: Uuid) -> sqlx::Result<Vec<DailyCount>> {
        sqlx::query_as::<_, DailyCount>(
            "SELECT to_char(occurred_at, 'YYYY-MM-DD') AS day, event_type, COUNT(*) AS count
             FROM analytics_events
             WHERE profile_id = $1 AND occurred_at > now() - make_interval(days => $2)
             GROUP BY day, event_type
             ORDER BY day",
        )
        .bind(profile_id)
        .bind(WINDOW_DAYS)
        .fetch_all(db)
        .await
    }

    pub async fn total_link_clicks(db: &PgPool, profile_id: Uuid) -> sqlx::Result<i64> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(clicks), 0)::bigint FROM links WHERE profile_id = $1",
        )
        .bind(profile_id)
        .fetch_one(db)
        .await?;
        Ok(total)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DailyCount {
    pub day: String,
    pub event_type: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub total_views: i64,
    pub total_clicks: i64,
    pub total_contacts: i64,
    pub daily_views: BTreeMap<String, i64>,
    pub daily_clicks: BTreeMap<String, i64>,
    /// Per-link breakdown; each entry carries its own click counter.
    pub links: Vec<Link>,
}

/// Split the grouped rows into per-day view and click series. Event types
/// outside the two series (contact saves) only count toward totals elsewhere.
pub fn bucket_daily(rows: &[DailyCount]) -> (BTreeMap<String, i64>, BTreeMap<String, i64>) {
    let mut views = BTreeMap::new();
    let mut clicks = BTreeMap::new();
    for row in rows {
        match row.event_type.as_str() {
            VIEW => {
                *views.entry(row.day.clone()).or_insert(0) += row.count;
            }
            CLICK => {
                *clicks.entry(row.day.clone()).or_insert(0) += row.count;
            }
            _ => {}
        }
    }
    (views, clicks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(day: &str, event_type: &str, count: i64) -> DailyCount {
        DailyCount {
            day: day.into(),
            event_type: event_type.into(),
            count,
        }
    }

    #[test]
    fn buckets_views_and_clicks_separately() {
        let rows = vec![
            row("2026-08-01", VIEW, 5),
            row("2026-08-01", CLICK, 2),
            row("2026-08-02", VIEW, 3),
        ];
        let (views, clicks) = bucket_daily(&rows);
        assert_eq!(views.get("2026-08-01"), Some(&5));
        assert_eq!(views.get("2026-08-02"), Some(&3));
        assert_eq!(clicks.get("2026-08-01"), Some(&2));
        assert_eq!(clicks.get("2026-08-02"), None);
    }

    #[test]
    fn ignores_contact_save_events() {
        let (views, clicks) = bucket_daily(&[row("2026-08-01", CONTACT_SAVE, 4)]);
        assert!(views.is_empty());
        assert!(clicks.is_empty());
    }

    #[test]
    fn summary_exposes_per_link_clicks() {
        let summary = AnalyticsSummary {
            total_views: 10,
            total_clicks: 7,
            total_contacts: 1,
            daily_views: BTreeMap::new(),
            daily_clicks: BTreeMap::new(),
            links: vec![Link {
                id: Uuid::new_v4(),
                profile_id: Uuid::new_v4(),
                kind: "social".into(),
                platform: Some("linkedin".into()),
                url: "https://linkedin.com/in/jane".into(),
                title: "LinkedIn".into(),
                icon: None,
                position: 0,
                is_active: true,
                clicks: 7,
                created_at: time::OffsetDateTime::now_utc(),
            }],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["links"][0]["clicks"], 7);
        assert_eq!(json["links"][0]["title"], "LinkedIn");
    }

    #[test]
    fn days_come_out_sorted() {
        let rows = vec![
            row("2026-08-09", VIEW, 1),
            row("2026-08-02", VIEW, 1),
            row("2026-08-21", VIEW, 1),
        ];
        let (views, _) = bucket_daily(&rows);
        let days: Vec<_> = views.keys().cloned().collect();
        assert_eq!(days, vec!["2026-08-02", "2026-08-09", "2026-08-21"]);
    }
}
