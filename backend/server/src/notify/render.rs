use chrono::{DateTime, FixedOffset};
use records::{ApplicationNotice, EventNotice, Notification};

const BRAND: &str = "【ZBBS部】";

/// Seconds east of UTC that event dates are shown in (JST).
const DISPLAY_OFFSET: i32 = 9 * 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub body: String,
}

pub fn render(notification: &Notification) -> Message {
    match notification {
        Notification::Application(notice) => application(notice),
        Notification::Cancellation(notice) => cancellation(notice),
        Notification::EventJoin(notice) => event_join(notice),
        Notification::EventLeave(notice) => event_leave(notice),
    }
}

/// Renders an ISO 8601 timestamp as `2025/6/15 10:00:00` in JST.
/// Anything unparseable is returned as is.
pub fn format_event_date(raw: &str) -> String {
    let Some(offset) = FixedOffset::east_opt(DISPLAY_OFFSET) else {
        return raw.to_string();
    };

    DateTime::parse_from_rfc3339(raw)
        .map(|date| {
            date.with_timezone(&offset)
                .format("%Y/%-m/%-d %-H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|_| raw.to_string())
}

fn application(n: &ApplicationNotice) -> Message {
    Message {
        subject: format!("{BRAND}{}への参加申請", n.club_name),
        body: format!(
            "【部活動参加申請通知】\n\n\
             部活動「{}」に新しい参加申請が届きました。\n\n\
             申請者情報：\n\
             ・名前: {}\n\
             ・所属: {} / {}\n\n\
             申請者一覧から詳細をご確認ください。",
            n.club_name, n.applicant_name, n.applicant_department, n.applicant_section
        ),
    }
}

fn cancellation(n: &ApplicationNotice) -> Message {
    Message {
        subject: format!("{BRAND}{}への参加申請取り消し", n.club_name),
        body: format!(
            "【部活動参加申請取り消し通知】\n\n\
             部活動「{}」への参加申請が取り消されました。\n\n\
             申請者情報：\n\
             ・名前: {}\n\
             ・所属: {} / {}\n\n\
             申請者一覧で確認できます。",
            n.club_name, n.applicant_name, n.applicant_department, n.applicant_section
        ),
    }
}

fn event_join(n: &EventNotice) -> Message {
    Message {
        subject: format!("{BRAND}{}への参加通知", n.event_title),
        body: format!(
            "【イベント参加通知】\n\n\
             イベント「{}」に新しい参加者が登録されました。\n\n\
             {}",
            n.event_title,
            participant_block(n)
        ),
    }
}

fn event_leave(n: &EventNotice) -> Message {
    Message {
        subject: format!("{BRAND}{}への参加キャンセル通知", n.event_title),
        body: format!(
            "【イベント参加キャンセル通知】\n\n\
             イベント「{}」への参加がキャンセルされました。\n\n\
             {}",
            n.event_title,
            participant_block(n)
        ),
    }
}

fn participant_block(n: &EventNotice) -> String {
    format!(
        "参加者情報：\n\
         ・名前: {}\n\
         ・所属: {} / {}\n\
         ・開催日時: {}\n\n\
         イベント詳細画面で参加者一覧をご確認ください。",
        n.participant_name,
        n.participant_department,
        n.participant_section,
        format_event_date(&n.event_date)
    )
}
