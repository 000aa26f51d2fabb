// Page views - filtering and summaries over the last fetched collections
//
// Nothing here touches a store.

use crate::entities::{ChurchEvent, EventType, FinanceRecord, FinanceType, Member};
use serde::Serialize;

/// Case-insensitive substring match on name, email or phone.
/// A blank query keeps every member.
pub fn search_members(members: &[Member], query: &str) -> Vec<Member> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return members.to_vec();
    }

    members
        .iter()
        .filter(|m| {
            m.name.to_lowercase().contains(&needle)
                || m.email.to_lowercase().contains(&needle)
                || m.phone.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// `None` keeps every event.
pub fn filter_events(events: &[ChurchEvent], event_type: Option<EventType>) -> Vec<ChurchEvent> {
    match event_type {
        None => events.to_vec(),
        Some(t) => events
            .iter()
            .filter(|e| e.event_type == t)
            .cloned()
            .collect(),
    }
}

/// `None` keeps every record.
pub fn filter_finance(records: &[FinanceRecord], kind: Option<FinanceType>) -> Vec<FinanceRecord> {
    match kind {
        None => records.to_vec(),
        Some(k) => records.iter().filter(|r| r.kind == k).cloned().collect(),
    }
}

/// Parse a filter value where `all` (or blank) means no filter.
pub fn parse_filter<T: std::str::FromStr<Err = String>>(raw: Option<&str>) -> Result<Option<T>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("all") => Ok(None),
        Some(v) => v.parse().map(Some),
    }
}

// ============================================================================
// SUMMARIES
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FinanceSummary {
    pub total_income: i64,
    pub total_expense: i64,
    pub balance: i64,
}

impl FinanceSummary {
    /// Totals saturate at the `i64` bounds rather than wrapping.
    pub fn from_records(records: &[FinanceRecord]) -> Self {
        let mut summary = FinanceSummary::default();

        for record in records {
            match record.kind {
                FinanceType::Income => {
                    summary.total_income = summary.total_income.saturating_add(record.amount)
                }
                FinanceType::Expense => {
                    summary.total_expense = summary.total_expense.saturating_add(record.amount)
                }
            }
        }

        summary.balance = summary.total_income.saturating_sub(summary.total_expense);
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_members: usize,
    pub active_members: usize,
    pub total_events: usize,
    pub upcoming_events: usize,
    pub total_income: i64,
    pub balance: i64,
    pub recent_members: Vec<Member>,
    pub next_events: Vec<ChurchEvent>,
}

const DASHBOARD_LIST_LEN: usize = 4;

impl DashboardSummary {
    pub fn build(members: &[Member], events: &[ChurchEvent], finance: &[FinanceRecord]) -> Self {
        let totals = FinanceSummary::from_records(finance);

        // Newest first; rows without a timestamp fall back to reverse insertion order.
        let mut recent_members: Vec<Member> = members.iter().rev().cloned().collect();
        recent_members.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent_members.truncate(DASHBOARD_LIST_LEN);

        let mut next_events: Vec<ChurchEvent> =
            events.iter().filter(|e| e.is_upcoming()).cloned().collect();
        next_events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.time.cmp(&b.time)));
        next_events.truncate(DASHBOARD_LIST_LEN);

        DashboardSummary {
            total_members: members.len(),
            active_members: members.iter().filter(|m| m.is_active()).count(),
            total_events: events.len(),
            upcoming_events: events.iter().filter(|e| e.is_upcoming()).count(),
            total_income: totals.total_income,
            balance: totals.balance,
            recent_members,
            next_events,
        }
    }
}

// ============================================================================
// FORMATTING
// ============================================================================

/// `1500000` → `Rp 1.500.000`, `-500000` → `-Rp 500.000`.
pub fn format_rupiah(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if amount < 0 {
        format!("-Rp {}", grouped)
    } else {
        format!("Rp {}", grouped)
    }
}

/// Compact millions for stat cards: `45_200_000` → `Rp 45.2 Jt`.
pub fn format_millions(amount: i64) -> String {
    format!("Rp {:.1} Jt", amount as f64 / 1_000_000.0)
}

/// Up to two initials: `Maria Susanti` → `MS`.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Entity, EventStatus, MemberStatus, NewFinanceRecord};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_search_by_name_substring_case_insensitive() {
        let members = Member::seed();
        let found = search_members(&members, "susan");

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Maria Susanti");

        let found = search_members(&members, "WIJAYA");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Sarah Wijaya");
    }

    #[test]
    fn test_search_matches_email_and_phone() {
        let members = Member::seed();

        let by_email = search_members(&members, "budi.hartono@");
        assert_eq!(by_email.len(), 1);

        let by_phone = search_members(&members, "567804");
        assert_eq!(by_phone.len(), 1);
        assert_eq!(by_phone[0].name, "Yohanes Pratama");
    }

    #[test]
    fn test_search_returns_exactly_matching_records() {
        let members = Member::seed();
        let found = search_members(&members, "a");
        let expected: Vec<&str> = members
            .iter()
            .filter(|m| {
                m.name.to_lowercase().contains('a')
                    || m.email.to_lowercase().contains('a')
                    || m.phone.contains('a')
            })
            .map(|m| m.id.as_str())
            .collect();

        let got: Vec<&str> = found.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_blank_search_keeps_all() {
        let members = Member::seed();
        assert_eq!(search_members(&members, "   ").len(), members.len());
        assert!(search_members(&members, "zzz-no-match").is_empty());
    }

    #[test]
    fn test_filter_events_by_type() {
        let events = ChurchEvent::seed();

        assert_eq!(filter_events(&events, None).len(), 4);
        let meetings = filter_events(&events, Some(EventType::Meeting));
        assert_eq!(meetings.len(), 1);
        assert_eq!(meetings[0].name, "Rapat Majelis");
    }

    #[test]
    fn test_filter_finance_by_type() {
        let records = FinanceRecord::seed();

        assert_eq!(filter_finance(&records, Some(FinanceType::Income)).len(), 2);
        assert_eq!(filter_finance(&records, Some(FinanceType::Expense)).len(), 2);
        assert_eq!(filter_finance(&records, None).len(), 4);
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(parse_filter::<EventType>(None), Ok(None));
        assert_eq!(parse_filter::<EventType>(Some("all")), Ok(None));
        assert_eq!(parse_filter::<EventType>(Some("Rapat")), Ok(Some(EventType::Meeting)));
        assert_eq!(
            parse_filter::<FinanceType>(Some("pengeluaran")),
            Ok(Some(FinanceType::Expense))
        );
        assert!(parse_filter::<FinanceType>(Some("bogus")).is_err());
    }

    #[test]
    fn test_finance_summary() {
        let summary = FinanceSummary::from_records(&FinanceRecord::seed());

        assert_eq!(summary.total_income, 21_250_000);
        assert_eq!(summary.total_expense, 6_800_000);
        assert_eq!(summary.balance, 14_450_000);
        assert_eq!(FinanceSummary::from_records(&[]), FinanceSummary::default());
    }

    #[test]
    fn test_finance_summary_does_not_overflow() {
        let huge = |kind| FinanceRecord::from_new(
            "f".to_string(),
            Utc::now(),
            NewFinanceRecord::new(kind, "Donasi", i64::MAX / 2 + 1),
        );
        let records = vec![
            huge(FinanceType::Income),
            huge(FinanceType::Income),
            huge(FinanceType::Expense),
            huge(FinanceType::Expense),
            huge(FinanceType::Expense),
        ];

        let summary = FinanceSummary::from_records(&records);
        assert_eq!(summary.total_income, i64::MAX);
        assert_eq!(summary.total_expense, i64::MAX);
        assert_eq!(summary.balance, 0);

        let dashboard = DashboardSummary::build(&[], &[], &records[..2]);
        assert_eq!(dashboard.total_income, i64::MAX);
    }

    #[test]
    fn test_dashboard_recent_members_fallback_order() {
        let members = Member::seed();
        let summary = DashboardSummary::build(&members, &[], &[]);

        let names: Vec<&str> = summary.recent_members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Yohanes Pratama", "Sarah Wijaya", "Budi Hartono", "Maria Susanti"]
        );
        assert_eq!(summary.active_members, 3);
        assert_eq!(summary.total_members, 4);
    }

    #[test]
    fn test_dashboard_recent_members_by_created_at() {
        let mut members = Member::seed();
        members[0].created_at = Some(Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap());
        members[3].created_at = Some(Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap());
        members.push(Member {
            id: "m-0005".to_string(),
            status: MemberStatus::Inactive,
            ..members[1].clone()
        });

        let summary = DashboardSummary::build(&members, &[], &[]);
        let ids: Vec<&str> = summary.recent_members.iter().map(|m| m.id.as_str()).collect();

        assert_eq!(ids, vec!["m-0001", "m-0004", "m-0005", "m-0003"]);
    }

    #[test]
    fn test_dashboard_next_events() {
        let mut events = ChurchEvent::seed();
        events[0].status = EventStatus::Finished;
        events.reverse();

        let summary = DashboardSummary::build(&[], &events, &[]);
        let names: Vec<&str> = summary.next_events.iter().map(|e| e.name.as_str()).collect();

        assert_eq!(summary.upcoming_events, 3);
        assert_eq!(names, vec!["Retreat Pemuda", "Bakti Sosial", "Rapat Majelis"]);
    }

    #[test]
    fn test_format_rupiah() {
        assert_eq!(format_rupiah(0), "Rp 0");
        assert_eq!(format_rupiah(999), "Rp 999");
        assert_eq!(format_rupiah(1_000), "Rp 1.000");
        assert_eq!(format_rupiah(1_500_000), "Rp 1.500.000");
        assert_eq!(format_rupiah(-500_000), "-Rp 500.000");
    }

    #[test]
    fn test_format_millions_and_initials() {
        assert_eq!(format_millions(45_200_000), "Rp 45.2 Jt");
        assert_eq!(format_millions(0), "Rp 0.0 Jt");
        assert_eq!(initials("Maria Susanti"), "MS");
        assert_eq!(initials("yohanes pratama putra"), "YP");
        assert_eq!(initials("Budi"), "B");
        assert_eq!(initials(""), "");
    }
}
