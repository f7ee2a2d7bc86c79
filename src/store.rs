use crate::dates::{days_until, format_date, is_birthday_today, parse_date};
use crate::types::Error;
use chrono::{Datelike, NaiveDate};
use sqlx::PgPool;
use std::future::Future;

/// One tracked birthday. `date` holds the persisted `DD-MM-YYYY` text.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BirthdayRecord {
    pub id: i64,
    pub name: String,
    pub date: String,
    pub wished: bool,
    pub wished_year: Option<i32>,
    pub subject_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBirthday {
    pub name: String,
    pub date: NaiveDate,
    pub subject_id: Option<i64>,
}

impl BirthdayRecord {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    pub fn days_left(&self, today: NaiveDate) -> Option<i64> {
        self.parsed_date().map(|date| days_until(date, today))
    }

    /// A wished flag left over from an earlier year.
    pub fn needs_rearm(&self, today: NaiveDate) -> bool {
        self.wished && self.wished_year != Some(today.year())
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        !self.wished
            && self
                .parsed_date()
                .is_some_and(|date| is_birthday_today(date, today))
    }

    pub fn rearm(&mut self) {
        self.wished = false;
        self.wished_year = None;
    }

    pub fn mark_wished(&mut self, today: NaiveDate) {
        self.wished = true;
        self.wished_year = Some(today.year());
    }

    /// Moves the record to a new date; the new occurrence has not been celebrated.
    pub fn reschedule(&mut self, date: NaiveDate) {
        self.date = format_date(date);
        self.rearm();
    }
}

/// Persistence for birthday records. Implementations only need per-statement
/// atomicity; callers re-read the full set on every invocation.
pub trait BirthdayStore: Send + Sync {
    /// Every record in storage order.
    fn find_all(&self) -> impl Future<Output = Result<Vec<BirthdayRecord>, Error>> + Send;

    /// First record (in storage order) whose name equals `name`, ignoring case.
    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<BirthdayRecord>, Error>> + Send;

    fn insert(
        &self,
        birthday: NewBirthday,
    ) -> impl Future<Output = Result<BirthdayRecord, Error>> + Send;

    fn save(&self, record: &BirthdayRecord) -> impl Future<Output = Result<(), Error>> + Send;

    fn delete(&self, record: &BirthdayRecord) -> impl Future<Output = Result<(), Error>> + Send;
}

#[derive(Debug, Clone)]
pub struct PgBirthdayStore {
    pool: PgPool,
}

impl PgBirthdayStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

impl BirthdayStore for PgBirthdayStore {
    async fn find_all(&self) -> Result<Vec<BirthdayRecord>, Error> {
        let records = sqlx::query_as::<_, BirthdayRecord>(
            "SELECT id, name, date, wished, wished_year, subject_id
             FROM birthdays
             ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<BirthdayRecord>, Error> {
        let record = sqlx::query_as::<_, BirthdayRecord>(
            "SELECT id, name, date, wished, wished_year, subject_id
             FROM birthdays
             WHERE LOWER(name) = LOWER($1)
             ORDER BY id
             LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn insert(&self, birthday: NewBirthday) -> Result<BirthdayRecord, Error> {
        let record = sqlx::query_as::<_, BirthdayRecord>(
            "INSERT INTO birthdays (name, date, wished, wished_year, subject_id)
             VALUES ($1, $2, FALSE, NULL, $3)
             RETURNING id, name, date, wished, wished_year, subject_id",
        )
        .bind(&birthday.name)
        .bind(format_date(birthday.date))
        .bind(birthday.subject_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn save(&self, record: &BirthdayRecord) -> Result<(), Error> {
        sqlx::query(
            "UPDATE birthdays
             SET name = $2, date = $3, wished = $4, wished_year = $5, subject_id = $6
             WHERE id = $1",
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.date)
        .bind(record.wished)
        .bind(record.wished_year)
        .bind(record.subject_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, record: &BirthdayRecord) -> Result<(), Error> {
        sqlx::query("DELETE FROM birthdays WHERE id = $1")
            .bind(record.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
