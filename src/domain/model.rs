use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::utils::error::{Result, StoryError};

/// 一天中的三個餐別，代碼對應 NEIS 的 `MMEAL_SC_CODE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealSlot {
    pub const ALL: [MealSlot; 3] = [MealSlot::Breakfast, MealSlot::Lunch, MealSlot::Dinner];

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "1" => Some(MealSlot::Breakfast),
            "2" => Some(MealSlot::Lunch),
            "3" => Some(MealSlot::Dinner),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "1",
            MealSlot::Lunch => "2",
            MealSlot::Dinner => "3",
        }
    }

    /// 顯示在圖片上的韓文名稱，也用作輸出檔名
    pub fn label(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "조식",
            MealSlot::Lunch => "중식",
            MealSlot::Dinner => "석식",
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MealEntry {
    Menu(String),
    NoMenu,
    Error,
}

impl MealEntry {
    pub const NONE_MARKER: &'static str = "none";
    pub const ERROR_MARKER: &'static str = "error";

    pub fn menu(&self) -> Option<&str> {
        match self {
            MealEntry::Menu(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for MealEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MealEntry::Menu(text) => f.write_str(text),
            MealEntry::NoMenu => f.write_str(Self::NONE_MARKER),
            MealEntry::Error => f.write_str(Self::ERROR_MARKER),
        }
    }
}

/// 一天的菜單，永遠剛好三個餐別
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealRecord {
    breakfast: MealEntry,
    lunch: MealEntry,
    dinner: MealEntry,
}

impl MealRecord {
    pub fn new(breakfast: MealEntry, lunch: MealEntry, dinner: MealEntry) -> Self {
        Self {
            breakfast,
            lunch,
            dinner,
        }
    }

    pub fn none() -> Self {
        Self::new(MealEntry::NoMenu, MealEntry::NoMenu, MealEntry::NoMenu)
    }

    pub fn error() -> Self {
        Self::new(MealEntry::Error, MealEntry::Error, MealEntry::Error)
    }

    pub fn get(&self, slot: MealSlot) -> &MealEntry {
        match slot {
            MealSlot::Breakfast => &self.breakfast,
            MealSlot::Lunch => &self.lunch,
            MealSlot::Dinner => &self.dinner,
        }
    }

    pub fn breakfast(&self) -> &MealEntry {
        &self.breakfast
    }

    pub fn lunch(&self) -> &MealEntry {
        &self.lunch
    }

    pub fn dinner(&self) -> &MealEntry {
        &self.dinner
    }
}

/// `YYYYMMDD` 格式的查詢日期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MealDate(NaiveDate);

impl MealDate {
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || StoryError::InvalidDate {
            value: value.to_string(),
        };
        if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        NaiveDate::parse_from_str(value, "%Y%m%d")
            .map(MealDate)
            .map_err(|_| invalid())
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        MealDate(date)
    }

    /// 以韓國時間 (UTC+9) 計算今天
    pub fn today_kst() -> Self {
        let now = Utc::now();
        let today = chrono::FixedOffset::east_opt(9 * 3600)
            .map(|kst| now.with_timezone(&kst).date_naive())
            .unwrap_or_else(|| now.date_naive());
        MealDate(today)
    }

    pub fn as_query(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    pub fn display(&self) -> String {
        let weekday = match self.0.weekday() {
            Weekday::Mon => "월",
            Weekday::Tue => "화",
            Weekday::Wed => "수",
            Weekday::Thu => "목",
            Weekday::Fri => "금",
            Weekday::Sat => "토",
            Weekday::Sun => "일",
        };
        format!("{} ({})", self.0.format("%Y년 %m월 %d일"), weekday)
    }
}

impl fmt::Display for MealDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_query())
    }
}

/// 登入後保存的 session，內容對本程式是不透明的
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCredential {
    pub username: String,
    pub payload: serde_json::Value,
    pub saved_at: DateTime<Utc>,
}

impl SessionCredential {
    pub fn new(username: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            username: username.into(),
            payload,
            saved_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.payload.get("sessionid").and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    Skipped { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    Published(PathBuf),
    Rendered(PathBuf),
    NoMenu,
    FetchFailed,
    RenderFailed { reason: String },
    UploadSkipped { reason: String },
    UploadFailed { reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub date: String,
    pub slots: Vec<(MealSlot, SlotOutcome)>,
}

impl RunSummary {
    pub fn published_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|(_, outcome)| matches!(outcome, SlotOutcome::Published(_)))
            .count()
    }

    pub fn outcome(&self, slot: MealSlot) -> Option<&SlotOutcome> {
        self.slots
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, outcome)| outcome)
    }
}
