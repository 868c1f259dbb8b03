use crate::core::publisher::Publisher;
use crate::core::renderer::ImageRenderer;
use crate::domain::model::{
    MealDate, MealEntry, MealSlot, PublishOutcome, RunSummary, SlotOutcome,
};
use crate::domain::ports::{MenuSource, StoryUploader};

/// 一次執行：抓菜單 → 畫圖 → 上傳
pub struct MealStoryEngine<M: MenuSource, U: StoryUploader> {
    source: M,
    renderer: ImageRenderer,
    publisher: Option<Publisher<U>>,
}

impl<M: MenuSource, U: StoryUploader> MealStoryEngine<M, U> {
    pub fn new(source: M, renderer: ImageRenderer, publisher: Publisher<U>) -> Self {
        Self {
            source,
            renderer,
            publisher: Some(publisher),
        }
    }

    /// 只產生圖片，不上傳
    pub fn dry_run(source: M, renderer: ImageRenderer) -> Self {
        Self {
            source,
            renderer,
            publisher: None,
        }
    }

    pub async fn run(&self, date: &MealDate, slots: &[MealSlot]) -> RunSummary {
        tracing::info!("🍱 Fetching menu for {}", date);
        let record = self.source.fetch(date).await;
        let display_date = date.display();

        let mut summary = RunSummary {
            date: date.as_query(),
            slots: Vec::with_capacity(slots.len()),
        };

        for &slot in slots {
            let outcome = match record.get(slot) {
                MealEntry::Menu(text) => self.process_slot(slot, text, &display_date).await,
                MealEntry::NoMenu => {
                    tracing::info!("No {} menu for {}, skipping", slot, date);
                    SlotOutcome::NoMenu
                }
                MealEntry::Error => {
                    tracing::warn!("⚠️ {} menu unavailable due to fetch error", slot);
                    SlotOutcome::FetchFailed
                }
            };
            summary.slots.push((slot, outcome));
        }

        tracing::info!(
            "✅ Run finished for {}: {} of {} slot(s) published",
            summary.date,
            summary.published_count(),
            summary.slots.len()
        );
        summary
    }

    async fn process_slot(&self, slot: MealSlot, text: &str, display_date: &str) -> SlotOutcome {
        tracing::debug!("Rendering {} ({} line(s))", slot, text.lines().count());
        let path = match self.renderer.render(slot.label(), text, display_date) {
            Ok(path) => path,
            Err(e) => {
                tracing::error!("❌ Rendering {} failed: {}", slot, e);
                tracing::error!("💡 {}", e.recovery_suggestion());
                return SlotOutcome::RenderFailed {
                    reason: e.to_string(),
                };
            }
        };

        let Some(publisher) = &self.publisher else {
            tracing::info!("🖼️ Dry run, {} rendered to {}", slot, path.display());
            return SlotOutcome::Rendered(path);
        };

        let caption = format!("{} {}", display_date, slot.label());
        match publisher.publish(&path, &caption).await {
            PublishOutcome::Published => SlotOutcome::Published(path),
            PublishOutcome::Skipped { reason } => SlotOutcome::UploadSkipped { reason },
            PublishOutcome::Failed { reason } => SlotOutcome::UploadFailed { reason },
        }
    }
}
