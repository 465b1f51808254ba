//! Block composition for a workout.
//!
//! Each operation re-reads the latest configuration, edits it, and writes it
//! back whole. Read failures abort the edit instead of saving over a record
//! that could not be read.

use super::block::{Block, BlockSettings, DefaultCard};
use super::resolver::SettingsResolver;
use crate::error::CoreError;

#[derive(Clone)]
pub struct BlockComposer {
    resolver: SettingsResolver,
}

impl BlockComposer {
    pub fn new(resolver: SettingsResolver) -> Self {
        Self { resolver }
    }

    /// Current blocks, most recent first.
    pub async fn blocks(&self, workout_id: &str) -> Vec<Block> {
        self.resolver.resolve(workout_id).await.custom_blocks
    }

    /// Create a block with a fresh id at the front of the list.
    pub async fn add_block(
        &self,
        workout_id: &str,
        settings: BlockSettings,
        title: Option<String>,
    ) -> Result<Block, CoreError> {
        settings.validate()?;
        let block = self
            .resolver
            .modify(workout_id, move |config| {
                let block = Block::new(settings, title);
                config.custom_blocks.insert(0, block.clone());
                Ok(block)
            })
            .await?;
        tracing::info!(workout_id, block_id = %block.id, kind = %block.kind(), "added block");
        Ok(block)
    }

    /// Merge `settings` into the block and move it to the front.
    pub async fn update_block(
        &self,
        workout_id: &str,
        block_id: &str,
        settings: BlockSettings,
    ) -> Result<Block, CoreError> {
        settings.validate()?;
        let block = self
            .resolver
            .modify(workout_id, |config| {
                let mut block = config.block(block_id).cloned().ok_or_else(|| {
                    CoreError::BlockNotFound {
                        workout_id: workout_id.to_string(),
                        block_id: block_id.to_string(),
                    }
                })?;
                if !block.settings.merge(&settings) {
                    return Err(CoreError::BlockKindMismatch {
                        block_id: block_id.to_string(),
                        expected: settings.kind(),
                        found: block.kind(),
                    });
                }
                config.move_to_front(block.clone());
                Ok(block)
            })
            .await?;
        tracing::info!(workout_id, block_id, "updated block");
        Ok(block)
    }

    /// Change a block's title without touching its recency.
    pub async fn rename_block(
        &self,
        workout_id: &str,
        block_id: &str,
        title: Option<String>,
    ) -> Result<Block, CoreError> {
        self.resolver
            .modify(workout_id, |config| {
                let block = config
                    .custom_blocks
                    .iter_mut()
                    .find(|b| b.id == block_id)
                    .ok_or_else(|| CoreError::BlockNotFound {
                        workout_id: workout_id.to_string(),
                        block_id: block_id.to_string(),
                    })?;
                block.title = title;
                Ok(block.clone())
            })
            .await
    }

    /// Returns whether a block was removed. Saves either way.
    pub async fn remove_block(&self, workout_id: &str, block_id: &str) -> Result<bool, CoreError> {
        let removed = self
            .resolver
            .modify(workout_id, |config| {
                let before = config.custom_blocks.len();
                config.custom_blocks.retain(|b| b.id != block_id);
                Ok(config.custom_blocks.len() != before)
            })
            .await?;
        if removed {
            tracing::info!(workout_id, block_id, "removed block");
        }
        Ok(removed)
    }

    /// Returns `false` when the card was already hidden. Saves either way.
    pub async fn hide_default_block(
        &self,
        workout_id: &str,
        card: DefaultCard,
    ) -> Result<bool, CoreError> {
        let hidden = self
            .resolver
            .modify(workout_id, |config| Ok(config.hide(card)))
            .await?;
        tracing::info!(workout_id, card = %card, newly_hidden = hidden, "hid default card");
        Ok(hidden)
    }
}
