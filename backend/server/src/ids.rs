//! # Ids
//!
//! Human-readable, sortable ids. Every id costs one counter increment in its
//! own namespace.
//!
//! | Kind | Namespace | Format |
//! |---|---|---|
//! | Event | `EVENT_{YYYYMMDD}` | `EVT-{YYYYMMDD}-{seq:4}` |
//! | Participant | `PARTICIPANT` | `PRT-{seq:8}` |
//! | Tag | `TAG_{abbr}` | `TAG-{abbr}-{seq:3}` |
//! | User profile | `USER_{YYYYMM}` | `USR-{YYYYMM}-{seq:4}` |
//! | Club | `CLUB` | `CLB-{seq:4}` |
//! | Wiki page | `WIKI` | `WKI-{seq:6}` |
//!
//! Sequences are zero padded to their width and grow past it rather than
//! being cut, so `CLB-12345` follows `CLB-9999`. Date-scoped kinds start over
//! at 1 each day or month because the date is part of the namespace.
use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::counter::CounterStore;

const CATEGORY_ABBREVIATIONS: [(&str, &str); 9] = [
    ("IT・技術", "IT"),
    ("デザイン・クリエイティブ", "DS"),
    ("ビジネス・マーケティング", "BZ"),
    ("趣味・エンターテイメント", "EN"),
    ("スポーツ・健康", "SP"),
    ("学習・教育", "ED"),
    ("アート・クラフト", "AR"),
    ("音楽・演奏", "MU"),
    ("旅行・アウトドア", "TR"),
];

/// Catch-all for categories outside the table.
pub const OTHER_CATEGORY: &str = "OT";

pub fn category_abbreviation(category: &str) -> &'static str {
    CATEGORY_ABBREVIATIONS
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, abbr)| *abbr)
        .unwrap_or(OTHER_CATEGORY)
}

fn sequence(value: u64, width: usize) -> String {
    format!("{value:0width$}")
}

fn day_stamp(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

fn month_stamp(date: NaiveDate) -> String {
    date.format("%Y%m").to_string()
}

pub fn format_event_id(date: NaiveDate, seq: u64) -> String {
    format!("EVT-{}-{}", day_stamp(date), sequence(seq, 4))
}

pub fn format_participant_id(seq: u64) -> String {
    format!("PRT-{}", sequence(seq, 8))
}

pub fn format_tag_id(abbr: &str, seq: u64) -> String {
    format!("TAG-{abbr}-{}", sequence(seq, 3))
}

pub fn format_user_profile_id(date: NaiveDate, seq: u64) -> String {
    format!("USR-{}-{}", month_stamp(date), sequence(seq, 4))
}

pub fn format_club_id(seq: u64) -> String {
    format!("CLB-{}", sequence(seq, 4))
}

pub fn format_wiki_id(seq: u64) -> String {
    format!("WKI-{}", sequence(seq, 6))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub struct IdGenerator {
    counters: Arc<dyn CounterStore>,
}

impl IdGenerator {
    pub fn new(counters: Arc<dyn CounterStore>) -> Self {
        Self { counters }
    }

    pub async fn event_id(&self) -> String {
        self.event_id_on(today()).await
    }

    pub async fn event_id_on(&self, date: NaiveDate) -> String {
        let seq = self
            .counters
            .next_value(&format!("EVENT_{}", day_stamp(date)))
            .await;

        format_event_id(date, seq)
    }

    pub async fn participant_id(&self) -> String {
        format_participant_id(self.counters.next_value("PARTICIPANT").await)
    }

    pub async fn tag_id(&self, category: &str) -> String {
        let abbr = category_abbreviation(category);
        let seq = self.counters.next_value(&format!("TAG_{abbr}")).await;

        format_tag_id(abbr, seq)
    }

    pub async fn user_profile_id(&self) -> String {
        self.user_profile_id_on(today()).await
    }

    pub async fn user_profile_id_on(&self, date: NaiveDate) -> String {
        let seq = self
            .counters
            .next_value(&format!("USER_{}", month_stamp(date)))
            .await;

        format_user_profile_id(date, seq)
    }

    pub async fn club_id(&self) -> String {
        format_club_id(self.counters.next_value("CLUB").await)
    }

    pub async fn wiki_id(&self) -> String {
        format_wiki_id(self.counters.next_value("WIKI").await)
    }
}
