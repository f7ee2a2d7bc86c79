//! In-memory collaborators for exercising the birthday core without Postgres or Discord.

use crate::dates::format_date;
use crate::messenger::{Mention, Messenger};
use crate::store::{BirthdayRecord, BirthdayStore, NewBirthday};
use crate::types::Error;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<BirthdayRecord>>,
    next_id: Mutex<i64>,
}

impl MemoryStore {
    pub fn with_records(records: Vec<BirthdayRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0);
        Self {
            records: Mutex::new(records),
            next_id: Mutex::new(next_id),
        }
    }

    pub fn snapshot(&self) -> Vec<BirthdayRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl BirthdayStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<BirthdayRecord>, Error> {
        Ok(self.snapshot())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<BirthdayRecord>, Error> {
        let wanted = name.to_lowercase();
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|record| record.name.to_lowercase() == wanted)
            .cloned())
    }

    async fn insert(&self, birthday: NewBirthday) -> Result<BirthdayRecord, Error> {
        let id = {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            *next_id
        };
        let record = BirthdayRecord {
            id,
            name: birthday.name,
            date: format_date(birthday.date),
            wished: false,
            wished_year: None,
            subject_id: birthday.subject_id,
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn save(&self, record: &BirthdayRecord) -> Result<(), Error> {
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(format!("no birthday with id {}", record.id).into()),
        }
    }

    async fn delete(&self, record: &BirthdayRecord) -> Result<(), Error> {
        self.records
            .lock()
            .unwrap()
            .retain(|existing| existing.id != record.id);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub text: String,
    pub conversation: u64,
    pub mentions: Vec<Mention>,
}

/// Records every message; fails sends whose text contains `fail_on`.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<SentMessage>>,
    fail_on: Option<String>,
}

impl RecordingMessenger {
    pub fn failing_on(needle: &str) -> Self {
        Self {
            sent: Mutex::default(),
            fail_on: Some(needle.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl Messenger for RecordingMessenger {
    async fn send_message(
        &self,
        text: &str,
        conversation: u64,
        mentions: &[Mention],
    ) -> Result<(), Error> {
        if self.fail_on.as_deref().is_some_and(|needle| text.contains(needle)) {
            return Err("send failed".into());
        }
        self.sent.lock().unwrap().push(SentMessage {
            text: text.to_string(),
            conversation,
            mentions: mentions.to_vec(),
        });
        Ok(())
    }
}

pub fn birthday(id: i64, name: &str, date: &str) -> BirthdayRecord {
    BirthdayRecord {
        id,
        name: name.to_string(),
        date: date.to_string(),
        wished: false,
        wished_year: None,
        subject_id: None,
    }
}
