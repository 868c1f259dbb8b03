use crate::domain::model::{MealDate, MealSlot};
use crate::utils::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MealArg {
    Breakfast,
    Lunch,
    Dinner,
}

impl From<MealArg> for MealSlot {
    fn from(arg: MealArg) -> Self {
        match arg {
            MealArg::Breakfast => MealSlot::Breakfast,
            MealArg::Lunch => MealSlot::Lunch,
            MealArg::Dinner => MealSlot::Dinner,
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "meal-story")]
#[command(about = "Render today's school meal menu and post it as a story")]
pub struct CliArgs {
    #[arg(long, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Menu date as YYYYMMDD (default: today in KST)")]
    pub date: Option<String>,

    #[arg(long = "meal", value_enum, help = "Meal slot to publish (repeatable, default: all)")]
    pub meals: Vec<MealArg>,

    #[arg(long, help = "Render images without uploading")]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliArgs {
    pub fn meal_date(&self) -> Result<MealDate> {
        match &self.date {
            Some(value) => MealDate::parse(value),
            None => Ok(MealDate::today_kst()),
        }
    }

    /// 依早、午、晚順序回傳，重複的餐別只算一次
    pub fn slots(&self) -> Vec<MealSlot> {
        if self.meals.is_empty() {
            return MealSlot::ALL.to_vec();
        }
        MealSlot::ALL
            .into_iter()
            .filter(|slot| self.meals.iter().any(|m| MealSlot::from(*m) == *slot))
            .collect()
    }
}
