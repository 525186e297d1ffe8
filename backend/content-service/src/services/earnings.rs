/// Creator earnings aggregation over UTC calendar windows
///
/// Pure functions over ledger rows; the dashboard service feeds them the
/// creator's purchases and the current time.
use crate::error::{AppError, Result};
use crate::models::{ContentSummary, ContentType, Purchase, PurchaseStatus};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::ops::Range;
use uuid::Uuid;

/// Half-open `[start, end)` windows anchored at one instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarningsWindows {
    pub today: Range<DateTime<Utc>>,
    pub yesterday: Range<DateTime<Utc>>,
    pub this_month: Range<DateTime<Utc>>,
    pub previous_month: Range<DateTime<Utc>>,
    pub this_year: Range<DateTime<Utc>>,
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::Internal(format!("date {}-{} out of range", year, month)))
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

impl EarningsWindows {
    pub fn at(now: DateTime<Utc>) -> Result<Self> {
        let date = now.date_naive();
        let (year, month) = (date.year(), date.month());

        let today_start = midnight(date);
        let day = Duration::days(1);

        let month_start = midnight(first_of_month(year, month)?);
        let (ny, nm) = next_month(year, month);
        let month_end = midnight(first_of_month(ny, nm)?);
        let (py, pm) = previous_month(year, month);
        let previous_start = midnight(first_of_month(py, pm)?);

        let year_start = midnight(first_of_month(year, 1)?);
        let year_end = midnight(first_of_month(year + 1, 1)?);

        Ok(Self {
            today: today_start..today_start + day,
            yesterday: today_start - day..today_start,
            this_month: month_start..month_end,
            previous_month: previous_start..month_start,
            this_year: year_start..year_end,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowTotal {
    pub amount: f64,
    pub sales: i64,
}

impl WindowTotal {
    fn add(&mut self, amount: f64) {
        self.amount += amount;
        self.sales += 1;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsSummary {
    pub today: WindowTotal,
    pub yesterday: WindowTotal,
    pub this_month: WindowTotal,
    pub previous_month: WindowTotal,
    pub this_year: WindowTotal,
    pub lifetime: WindowTotal,
    pub daily_change_pct: Option<f64>,
    pub monthly_change_pct: Option<f64>,
}

/// Per-content earnings row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEarnings {
    pub content_id: Uuid,
    pub title: String,
    #[serde(rename = "thumbnailURL")]
    pub thumbnail_url: Option<String>,
    pub content_type: ContentType,
    pub amount: f64,
    pub sales: i64,
}

/// `None` when there is nothing to compare against
pub fn percentage_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

fn completed(purchases: &[Purchase]) -> impl Iterator<Item = &Purchase> {
    purchases
        .iter()
        .filter(|p| p.status == PurchaseStatus::Completed)
}

pub fn summarize(purchases: &[Purchase], windows: &EarningsWindows) -> EarningsSummary {
    let mut summary = EarningsSummary::default();

    for purchase in completed(purchases) {
        let at = &purchase.purchase_date;
        summary.lifetime.add(purchase.amount);
        if windows.today.contains(at) {
            summary.today.add(purchase.amount);
        }
        if windows.yesterday.contains(at) {
            summary.yesterday.add(purchase.amount);
        }
        if windows.this_month.contains(at) {
            summary.this_month.add(purchase.amount);
        }
        if windows.previous_month.contains(at) {
            summary.previous_month.add(purchase.amount);
        }
        if windows.this_year.contains(at) {
            summary.this_year.add(purchase.amount);
        }
    }

    summary.daily_change_pct = percentage_change(summary.today.amount, summary.yesterday.amount);
    summary.monthly_change_pct =
        percentage_change(summary.this_month.amount, summary.previous_month.amount);
    summary
}

/// Group completed purchases by content. Rows whose content no longer
/// exists in `summaries` are dropped. Highest earners first.
pub fn breakdown(purchases: &[Purchase], summaries: &[ContentSummary]) -> Vec<ContentEarnings> {
    let mut totals: HashMap<Uuid, WindowTotal> = HashMap::new();
    for purchase in completed(purchases) {
        totals.entry(purchase.content_id).or_default().add(purchase.amount);
    }

    let mut rows: Vec<ContentEarnings> = summaries
        .iter()
        .filter_map(|content| {
            totals.get(&content.id).map(|total| ContentEarnings {
                content_id: content.id,
                title: content.title.clone(),
                thumbnail_url: content.thumbnail_url.clone(),
                content_type: content.content_type,
                amount: total.amount,
                sales: total.sales,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.title.cmp(&b.title))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn purchase(amount: f64, date: DateTime<Utc>, status: PurchaseStatus) -> Purchase {
        Purchase {
            id: Uuid::new_v4(),
            user_id: "buyer".to_string(),
            content_id: Uuid::new_v4(),
            creator_id: "creator".to_string(),
            transaction_hash: Uuid::new_v4().to_string(),
            amount,
            status,
            purchase_date: date,
        }
    }

    #[test]
    fn test_windows_cross_year_boundary() {
        let windows = EarningsWindows::at(at(2025, 1, 1, 9)).unwrap();
        assert_eq!(windows.yesterday.start, at(2024, 12, 31, 0));
        assert_eq!(windows.previous_month.start, at(2024, 12, 1, 0));
        assert_eq!(windows.previous_month.end, at(2025, 1, 1, 0));
        assert_eq!(windows.this_year.end, at(2026, 1, 1, 0));
    }

    #[test]
    fn test_windowed_sums_are_not_lifetime() {
        let now = at(2025, 3, 15, 12);
        let purchases = vec![
            purchase(5.0, at(2025, 3, 15, 8), PurchaseStatus::Completed),
            purchase(2.0, at(2025, 3, 14, 20), PurchaseStatus::Completed),
            purchase(10.0, at(2025, 2, 3, 10), PurchaseStatus::Completed),
            purchase(100.0, at(2024, 7, 1, 10), PurchaseStatus::Completed),
            purchase(50.0, at(2025, 3, 15, 9), PurchaseStatus::Failed),
        ];

        let summary = summarize(&purchases, &EarningsWindows::at(now).unwrap());

        assert_eq!(summary.today, WindowTotal { amount: 5.0, sales: 1 });
        assert_eq!(summary.yesterday, WindowTotal { amount: 2.0, sales: 1 });
        assert_eq!(summary.this_month.amount, 7.0);
        assert_eq!(summary.previous_month.amount, 10.0);
        assert_eq!(summary.this_year.amount, 17.0);
        assert_eq!(summary.lifetime, WindowTotal { amount: 117.0, sales: 4 });
        assert_eq!(summary.daily_change_pct, Some(150.0));
        assert_eq!(summary.monthly_change_pct, Some(-30.0));
    }

    #[test]
    fn test_change_is_none_without_baseline() {
        assert_eq!(percentage_change(4.0, 0.0), None);
        assert_eq!(percentage_change(0.0, 0.0), None);
        assert_eq!(percentage_change(3.0, 2.0), Some(50.0));
    }
}
