use crate::config::AppConfig;
use crate::core::normalizer::normalize_dish_text;
use crate::domain::model::{MealDate, MealEntry, MealRecord, MealSlot};
use crate::domain::ports::MenuSource;
use crate::utils::error::{Result, StoryError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

const DATA_KEY: &str = "mealServiceDietInfo";
const MEAL_CODE_FIELD: &str = "MMEAL_SC_CODE";
const DISH_FIELD: &str = "DDISH_NM";

/// NEIS 급식식단정보 API
pub struct NeisMenuFetcher {
    client: Client,
    base_url: String,
    api_key: String,
    office_code: String,
    school_code: String,
}

impl NeisMenuFetcher {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self::with_client(Client::new(), config, config.api_key()?))
    }

    pub fn with_client(client: Client, config: &AppConfig, api_key: &str) -> Self {
        Self {
            client,
            base_url: config.api.base_url.clone(),
            api_key: api_key.to_string(),
            office_code: config.school.office_code.clone(),
            school_code: config.school.school_code.clone(),
        }
    }

    async fn request(&self, date: &MealDate) -> Result<Value> {
        let ymd = date.as_query();
        tracing::debug!("Requesting meal data for {} from {}", ymd, self.base_url);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("KEY", self.api_key.as_str()),
                ("Type", "json"),
                ("ATPT_OFCDC_SC_CODE", self.office_code.as_str()),
                ("SD_SCHUL_CODE", self.school_code.as_str()),
                ("MLSV_YMD", ymd.as_str()),
            ])
            .send()
            .await?;

        tracing::debug!("NEIS response status: {}", response.status());

        if !response.status().is_success() {
            return Err(StoryError::ApiError {
                message: format!("unexpected status {}", response.status()),
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl MenuSource for NeisMenuFetcher {
    async fn fetch(&self, date: &MealDate) -> MealRecord {
        match self.request(date).await {
            Ok(body) => parse_meal_response(&body),
            Err(e) => {
                tracing::error!("❌ Failed to fetch meal data for {}: {}", date, e);
                MealRecord::error()
            }
        }
    }
}

/// 把 API 回應整理成三個餐別
///
/// 沒有 `mealServiceDietInfo` 代表當天沒有菜單 (API 回傳 INFO-200)，
/// 有這個 key 但結構不對 (沒有 `row`、某列缺 `MMEAL_SC_CODE` 或 `DDISH_NM`) 則視為錯誤。
pub fn parse_meal_response(body: &Value) -> MealRecord {
    let Some(info) = body.get(DATA_KEY) else {
        let message = body
            .pointer("/RESULT/MESSAGE")
            .and_then(Value::as_str)
            .unwrap_or("no meal data");
        tracing::info!("No menu published: {}", message);
        return MealRecord::none();
    };

    let Some(rows) = info
        .get(1)
        .and_then(|section| section.get("row"))
        .and_then(Value::as_array)
    else {
        tracing::error!("❌ Malformed meal response: missing {}[1].row", DATA_KEY);
        return MealRecord::error();
    };

    let mut entries = [MealEntry::NoMenu, MealEntry::NoMenu, MealEntry::NoMenu];
    for row in rows {
        // 欄位缺漏代表回應格式壞了，整筆視為錯誤；代碼不是 1/2/3 才略過
        let Some(code) = row.get(MEAL_CODE_FIELD).and_then(code_as_str) else {
            tracing::error!("❌ Malformed meal row: missing {}", MEAL_CODE_FIELD);
            return MealRecord::error();
        };
        let Some(raw) = row.get(DISH_FIELD).and_then(Value::as_str) else {
            tracing::error!("❌ Malformed meal row {}: missing {}", code, DISH_FIELD);
            return MealRecord::error();
        };
        let Some(slot) = MealSlot::from_code(&code) else {
            tracing::debug!("Skipping row with unknown meal code: {}", code);
            continue;
        };

        let text = normalize_dish_text(raw);
        entries[slot_index(slot)] = if text.is_empty() {
            MealEntry::NoMenu
        } else {
            MealEntry::Menu(text)
        };
    }

    let [breakfast, lunch, dinner] = entries;
    MealRecord::new(breakfast, lunch, dinner)
}

fn code_as_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn slot_index(slot: MealSlot) -> usize {
    match slot {
        MealSlot::Breakfast => 0,
        MealSlot::Lunch => 1,
        MealSlot::Dinner => 2,
    }
}
