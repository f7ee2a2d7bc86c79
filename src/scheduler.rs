use crate::messenger::{Mention, Messenger};
use crate::store::{BirthdayRecord, BirthdayStore};
use crate::types::Error;
use crate::util::log_error_with_source;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WishReport {
    pub sent: usize,
    pub failed: usize,
    pub rearmed: usize,
}

pub fn wish_text(record: &BirthdayRecord) -> String {
    format!(
        "🎉 {} 𝗛𝗮𝗽𝗽𝘆 𝗕𝗶𝗿𝘁𝗵𝗱𝗮𝘆🎂🥳\n𝗠𝗮𝗻𝘆 𝗵𝗮𝗽𝗽𝘆 𝗿𝗲𝘁𝘂𝗿𝗻𝘀 𝗼𝗳 𝘁𝗵𝗲 𝗱𝗮𝘆🌸💫",
        subject_mention(record).render()
    )
}

fn subject_mention(record: &BirthdayRecord) -> Mention {
    Mention {
        tag: record.name.clone(),
        user_id: record.subject_id.filter(|id| *id > 0).map(|id| id as u64),
    }
}

/// Wishes every record whose birthday is `today` and that hasn't been wished yet.
///
/// Flags from earlier years are cleared first. A failed send leaves the record
/// unwished and moves on; a failed flag write after a successful send is logged
/// and will produce a second wish on the next run.
pub async fn run_wishes<S, M>(
    store: &S,
    messenger: &M,
    conversation: u64,
    today: NaiveDate,
) -> Result<WishReport, Error>
where
    S: BirthdayStore,
    M: Messenger,
{
    let mut report = WishReport::default();

    for mut record in store.find_all().await? {
        if record.needs_rearm(today) {
            record.rearm();
            store.save(&record).await?;
            report.rearmed += 1;
        }

        if !record.is_due(today) {
            continue;
        }

        let mention = subject_mention(&record);
        if let Err(err) = messenger
            .send_message(&wish_text(&record), conversation, &[mention])
            .await
        {
            log_error_with_source(
                &format!("Couldn't send birthday wish for {}", record.name),
                &err,
            );
            report.failed += 1;
            continue;
        }

        record.mark_wished(today);
        if let Err(err) = store.save(&record).await {
            log_error_with_source(
                &format!("Couldn't mark {} as wished", record.name),
                &err,
            );
        }
        report.sent += 1;
    }

    Ok(report)
}

/// Fires a callback once per day at a fixed local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTrigger {
    at: NaiveTime,
}

impl DailyTrigger {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    /// Time left until the next firing, measured in real time so DST shifts
    /// don't move the wish off its wall-clock slot.
    pub fn duration_until_next<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Duration {
        let zone = now.timezone();
        let mut day = now.date_naive();
        for _ in 0..3 {
            if let Some(next) = self.fire_time(&zone, day) {
                if next > *now {
                    return (next - now.clone()).to_std().unwrap_or_default();
                }
            }
            let Some(following) = day.succ_opt() else {
                break;
            };
            day = following;
        }
        Duration::from_secs(24 * 3600)
    }

    // A time skipped by a spring-forward jump fires an hour later instead.
    fn fire_time<Tz: TimeZone>(&self, zone: &Tz, day: NaiveDate) -> Option<DateTime<Tz>> {
        let local = day.and_time(self.at);
        zone.from_local_datetime(&local).earliest().or_else(|| {
            zone.from_local_datetime(&(local + chrono::Duration::hours(1)))
                .earliest()
        })
    }

    pub fn spawn<F, Fut>(self, mut task: F) -> JoinHandle<()>
    where
        F: FnMut(NaiveDate) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(async move {
            loop {
                let wait = self.duration_until_next(&Local::now());
                time::sleep(wait).await;
                task(Local::now().date_naive()).await;
            }
        })
    }
}

pub fn spawn_daily_wishes<S, M>(
    trigger: DailyTrigger,
    store: Arc<S>,
    messenger: Arc<M>,
    conversation: u64,
) -> JoinHandle<()>
where
    S: BirthdayStore + 'static,
    M: Messenger + 'static,
{
    trigger.spawn(move |today| {
        let store = Arc::clone(&store);
        let messenger = Arc::clone(&messenger);
        async move {
            match run_wishes(store.as_ref(), messenger.as_ref(), conversation, today).await {
                Ok(report) => tracing::info!(
                    sent = report.sent,
                    failed = report.failed,
                    rearmed = report.rearmed,
                    "Daily birthday run finished"
                ),
                Err(err) => log_error_with_source("Daily birthday run failed", &err),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, RecordingMessenger, birthday};
    use chrono::{FixedOffset, LocalResult, NaiveDateTime, Utc};

    const CHANNEL: u64 = 42;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[tokio::test]
    async fn wishes_once_per_day() {
        let today = ymd(2024, 6, 15);
        let store = MemoryStore::with_records(vec![
            birthday(1, "Alice", "15-06-1990"),
            birthday(2, "Bob", "16-06-1990"),
        ]);
        let messenger = RecordingMessenger::default();

        let first = run_wishes(&store, &messenger, CHANNEL, today).await.unwrap();
        assert_eq!(first.sent, 1);

        let sent = messenger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].conversation, CHANNEL);
        assert!(sent[0].text.starts_with("🎉 @Alice "));
        assert_eq!(sent[0].mentions[0].tag, "Alice");

        let alice = &store.snapshot()[0];
        assert!(alice.wished);
        assert_eq!(alice.wished_year, Some(2024));

        let second = run_wishes(&store, &messenger, CHANNEL, today).await.unwrap();
        assert_eq!(second, WishReport::default());
        assert_eq!(messenger.sent().len(), 1);
    }

    #[tokio::test]
    async fn failed_send_keeps_record_unwished_and_continues() {
        let today = ymd(2024, 6, 15);
        let store = MemoryStore::with_records(vec![
            birthday(1, "Alice", "15-06-1990"),
            birthday(2, "Carol", "15-06-1985"),
        ]);
        let messenger = RecordingMessenger::failing_on("@Alice");

        let report = run_wishes(&store, &messenger, CHANNEL, today).await.unwrap();
        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, 1);

        let records = store.snapshot();
        assert!(!records[0].wished);
        assert!(records[1].wished);
        assert!(messenger.sent()[0].text.contains("@Carol"));
    }

    #[tokio::test]
    async fn last_years_flag_is_rearmed() {
        let today = ymd(2025, 6, 15);
        let mut alice = birthday(1, "Alice", "15-06-1990");
        alice.wished = true;
        alice.wished_year = Some(2024);
        let mut bob = birthday(2, "Bob", "01-01-1990");
        bob.wished = true;
        bob.wished_year = Some(2024);
        let store = MemoryStore::with_records(vec![alice, bob]);
        let messenger = RecordingMessenger::default();

        let report = run_wishes(&store, &messenger, CHANNEL, today).await.unwrap();
        assert_eq!(report.rearmed, 2);
        assert_eq!(report.sent, 1);

        let records = store.snapshot();
        assert_eq!(records[0].wished_year, Some(2025));
        assert!(!records[1].wished);
    }

    #[tokio::test]
    async fn known_subject_is_pinged_by_id() {
        let today = ymd(2024, 6, 15);
        let mut dana = birthday(1, "<@123456>", "15-06-2000");
        dana.subject_id = Some(123456);
        let store = MemoryStore::with_records(vec![dana]);
        let messenger = RecordingMessenger::default();

        run_wishes(&store, &messenger, CHANNEL, today).await.unwrap();

        let sent = messenger.sent();
        assert!(sent[0].text.starts_with("🎉 <@123456> "));
        assert_eq!(sent[0].mentions[0].user_id, Some(123456));
    }

    #[tokio::test]
    async fn invalid_subject_id_falls_back_to_plain_tag() {
        let today = ymd(2024, 6, 15);
        let mut ghost = birthday(1, "Ghost", "15-06-2000");
        ghost.subject_id = Some(0);
        let store = MemoryStore::with_records(vec![ghost, birthday(2, "Eve", "15-06-1999")]);
        let messenger = RecordingMessenger::default();

        let report = run_wishes(&store, &messenger, CHANNEL, today).await.unwrap();
        assert_eq!(report.sent, 2);

        let sent = messenger.sent();
        assert!(sent[0].text.starts_with("🎉 @Ghost "));
        assert_eq!(sent[0].mentions[0].user_id, None);
    }

    #[test]
    fn trigger_waits_until_the_next_wall_clock_time() {
        let trigger = DailyTrigger::new(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        let at = |h, m| Utc.from_utc_datetime(&ymd(2024, 6, 15).and_hms_opt(h, m, 0).unwrap());

        assert_eq!(trigger.duration_until_next(&at(8, 30)), Duration::from_secs(30 * 60));
        assert_eq!(
            trigger.duration_until_next(&at(9, 30)),
            Duration::from_secs(23 * 3600 + 30 * 60)
        );
        assert_eq!(trigger.duration_until_next(&at(9, 0)), Duration::from_secs(24 * 3600));
    }

    /// UTC+1 that jumps to UTC+2 at 2024-03-31 01:00 UTC (02:00 local becomes 03:00).
    #[derive(Debug, Clone, Copy)]
    struct SpringForward;

    impl SpringForward {
        fn switch() -> NaiveDateTime {
            ymd(2024, 3, 31).and_hms_opt(1, 0, 0).unwrap()
        }

        fn hours(h: i32) -> FixedOffset {
            FixedOffset::east_opt(h * 3600).unwrap()
        }
    }

    impl TimeZone for SpringForward {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            SpringForward
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let valid: Vec<FixedOffset> = [Self::hours(1), Self::hours(2)]
                .into_iter()
                .filter(|offset| {
                    let utc = *local - chrono::Duration::seconds(offset.local_minus_utc() as i64);
                    self.offset_from_utc_datetime(&utc) == *offset
                })
                .collect();
            match valid[..] {
                [offset] => LocalResult::Single(offset),
                [first, second] => LocalResult::Ambiguous(first, second),
                _ => LocalResult::None,
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::switch() {
                Self::hours(1)
            } else {
                Self::hours(2)
            }
        }
    }

    #[test]
    fn trigger_keeps_wall_clock_time_across_dst() {
        let trigger = DailyTrigger::new(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        let evening = SpringForward
            .from_local_datetime(&ymd(2024, 3, 30).and_hms_opt(21, 0, 0).unwrap())
            .single()
            .unwrap();

        // One local hour disappears overnight.
        assert_eq!(trigger.duration_until_next(&evening), Duration::from_secs(11 * 3600));
    }

    #[test]
    fn skipped_local_time_fires_an_hour_later_the_same_day() {
        let trigger = DailyTrigger::new(NaiveTime::from_hms_opt(2, 30, 0).unwrap());
        let midnight = SpringForward
            .from_local_datetime(&ymd(2024, 3, 31).and_hms_opt(0, 0, 0).unwrap())
            .single()
            .unwrap();

        assert_eq!(
            trigger.duration_until_next(&midnight),
            Duration::from_secs(2 * 3600 + 30 * 60)
        );
    }
}
