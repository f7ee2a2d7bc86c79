use super::validate::validate_name;
use crate::dates::{format_date, parse_date};
use crate::messenger::Messenger;
use crate::scheduler::run_wishes;
use crate::store::{BirthdayRecord, BirthdayStore, NewBirthday};
use crate::types::Error;
use crate::util::to_bold;
use chrono::NaiveDate;

const ACTIONS: &str = "add, list, next, countdown, remove, edit, lb";
pub const MISSING_ACTION: &str =
    "❌ | Please provide an action: add, list, next, countdown, remove, edit, lb";
const ADD_USAGE: &str = "❌ | Usage: birthday add <DD-MM-YYYY> <name>";
const REMOVE_USAGE: &str = "❌ | Usage: birthday remove <name>";
const EDIT_USAGE: &str = "❌ | Usage: birthday edit <name> <DD-MM-YYYY>";
const INVALID_DATE: &str = "❌ | Invalid date format.";
const NO_BIRTHDAYS: &str = "📭 | No birthdays saved.";

const LEADERBOARD_SIZE: usize = 5;

/// Runs one `birthday` invocation and returns the reply text.
///
/// `args[0]` is the action token. Today's wishes are sent to `conversation`
/// before the action runs. User mistakes come back as `Ok` replies; only
/// store failures are errors.
pub async fn run<S, M>(
    store: &S,
    messenger: &M,
    conversation: u64,
    today: NaiveDate,
    args: &[&str],
) -> Result<String, Error>
where
    S: BirthdayStore,
    M: Messenger,
{
    run_wishes(store, messenger, conversation, today).await?;

    let Some((&action, rest)) = args.split_first() else {
        return Ok(MISSING_ACTION.to_string());
    };

    match action {
        "add" => add(store, rest).await,
        "list" => list(store, today).await,
        "next" => next(store, today).await,
        "countdown" => countdown(store, today).await,
        "remove" => remove(store, rest).await,
        "edit" => edit(store, rest).await,
        "lb" | "leaderboard" => leaderboard(store, today).await,
        other => Ok(format!("❌ | Unknown action \"{other}\". Try: {ACTIONS}")),
    }
}

async fn add<S: BirthdayStore>(store: &S, args: &[&str]) -> Result<String, Error> {
    let Some((&date_text, name_parts)) = args.split_first() else {
        return Ok(ADD_USAGE.to_string());
    };
    let name = name_parts.join(" ");
    if name.is_empty() {
        return Ok(ADD_USAGE.to_string());
    }

    let Some(date) = parse_date(date_text) else {
        return Ok(INVALID_DATE.to_string());
    };
    let subject_id = match validate_name(&name) {
        Ok(subject_id) => subject_id,
        Err(reason) => return Ok(format!("❌ | {reason}")),
    };

    let record = store
        .insert(NewBirthday {
            name,
            date,
            subject_id,
        })
        .await?;

    Ok(format!(
        "✅ | Birthday added for {} ({})",
        record.name,
        format_date(date)
    ))
}

async fn list<S: BirthdayStore>(store: &S, today: NaiveDate) -> Result<String, Error> {
    let records = store.find_all().await?;
    if records.is_empty() {
        return Ok(NO_BIRTHDAYS.to_string());
    }

    let mut reply = String::from("🎂 𝐇𝐚𝐩𝐩𝐲 𝐁𝐢𝐫𝐭𝐡𝐝𝐚𝐲 𝐋𝐢𝐬𝐭 🎂\n\n");
    for record in &records {
        reply.push_str(&render_entry(record, today));
        reply.push('\n');
    }
    Ok(reply)
}

async fn next<S: BirthdayStore>(store: &S, today: NaiveDate) -> Result<String, Error> {
    let records = sorted_by_days_left(store.find_all().await?, today);
    let Some(first) = records.first() else {
        return Ok(NO_BIRTHDAYS.to_string());
    };

    Ok(format!(
        "🎉 𝐍𝐞𝐱𝐭 𝐁𝐢𝐫𝐭𝐡𝐝𝐚𝐲 🎉\n\n{}",
        render_entry(first, today)
    ))
}

async fn countdown<S: BirthdayStore>(store: &S, today: NaiveDate) -> Result<String, Error> {
    let records = sorted_by_days_left(store.find_all().await?, today);
    if records.is_empty() {
        return Ok(NO_BIRTHDAYS.to_string());
    }

    let mut reply = String::from("⏳ 𝐁𝐢𝐫𝐭𝐡𝐝𝐚𝐲 𝐂𝐨𝐮𝐧𝐭𝐝𝐨𝐰𝐧 ⏳\n\n");
    for record in &records {
        reply.push_str(&render_entry(record, today));
        reply.push('\n');
    }
    Ok(reply)
}

async fn leaderboard<S: BirthdayStore>(store: &S, today: NaiveDate) -> Result<String, Error> {
    let records = sorted_by_days_left(store.find_all().await?, today);
    if records.is_empty() {
        return Ok(NO_BIRTHDAYS.to_string());
    }

    let mut reply = String::from("🏆 𝐓𝐨𝐩 5 𝐔𝐩𝐜𝐨𝐦𝐢𝐧𝐠 𝐁𝐢𝐫𝐭𝐡𝐝𝐚𝐲𝐬 🏆\n\n");
    for record in records.iter().take(LEADERBOARD_SIZE) {
        reply.push_str(&render_entry(record, today));
        reply.push_str("\n\n");
    }
    Ok(reply)
}

async fn remove<S: BirthdayStore>(store: &S, args: &[&str]) -> Result<String, Error> {
    let name = args.join(" ");
    if name.is_empty() {
        return Ok(REMOVE_USAGE.to_string());
    }

    let Some(record) = store.find_by_name(&name).await? else {
        return Ok(format!("❌ | No birthday found for {name}"));
    };
    store.delete(&record).await?;

    Ok(format!("✅ | Birthday removed for {name}"))
}

async fn edit<S: BirthdayStore>(store: &S, args: &[&str]) -> Result<String, Error> {
    let [name, date_text, ..] = args else {
        return Ok(EDIT_USAGE.to_string());
    };

    let Some(date) = parse_date(date_text) else {
        return Ok(INVALID_DATE.to_string());
    };
    let Some(mut record) = store.find_by_name(name).await? else {
        return Ok(format!("❌ | No birthday found for {name}"));
    };

    record.reschedule(date);
    store.save(&record).await?;

    Ok(format!(
        "✅ | Birthday updated for {name} → {}",
        format_date(date)
    ))
}

/// Stable sort, so records with the same distance keep storage order.
/// Records with an unreadable date sink to the end.
fn sorted_by_days_left(
    mut records: Vec<BirthdayRecord>,
    today: NaiveDate,
) -> Vec<BirthdayRecord> {
    records.sort_by_key(|record| record.days_left(today).unwrap_or(i64::MAX));
    records
}

fn render_entry(record: &BirthdayRecord, today: NaiveDate) -> String {
    // Bolding a mention's digits would break the ping.
    let name = if record.subject_id.is_some() {
        record.name.clone()
    } else {
        to_bold(&record.name)
    };
    let days = match record.days_left(today) {
        Some(days) => format!("{days} days left"),
        None => "date unreadable".to_string(),
    };

    format!("╭─‣ {name}: [{}]\n╰──‣ ({})", record.date, to_bold(&days))
}
