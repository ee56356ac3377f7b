//! Kanban moves: the view changes first, the store second, and a failed write
//! puts the card back where it was.

use tracing::warn;
use uuid::Uuid;

use super::DashboardView;
use crate::errors::AppError;
use crate::models::application::{ApplicationRecord, ApplicationStatus, FieldSource};
use crate::store::ApplicationStore;

/// A move applied to the view but not yet confirmed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
    pub id: Uuid,
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
    previous_source: FieldSource,
}

impl DashboardView {
    /// Moves the card in memory. `None` when the card is not in the view.
    pub fn apply_move(&mut self, id: Uuid, to: ApplicationStatus) -> Option<PendingMove> {
        let card = self.applications.iter_mut().find(|a| a.id == id)?;
        let pending = PendingMove {
            id,
            from: card.status,
            to,
            previous_source: card.status_source,
        };
        card.status = to;
        card.status_source = FieldSource::Manual;
        Some(pending)
    }

    /// Restores the card's status from before `pending` was applied.
    pub fn rollback(&mut self, pending: &PendingMove) {
        if let Some(card) = self.applications.iter_mut().find(|a| a.id == pending.id) {
            card.status = pending.from;
            card.status_source = pending.previous_source;
        }
    }

    /// Optimistic move persisted through `store`, rolled back on failure.
    pub async fn move_card(
        &mut self,
        store: &dyn ApplicationStore,
        owner: &str,
        id: Uuid,
        to: ApplicationStatus,
    ) -> Result<ApplicationRecord, AppError> {
        let Some(pending) = self.apply_move(id, to) else {
            // Another owner's card reads as Forbidden, not as missing.
            store.get(id, owner).await?;
            return Err(AppError::NotFound(format!(
                "Application {id} is not on the board"
            )));
        };

        match store.update_status(id, owner, to).await {
            Ok(saved) => {
                if let Some(card) = self.applications.iter_mut().find(|a| a.id == id) {
                    *card = saved.clone();
                }
                Ok(saved)
            }
            Err(e) => {
                warn!(
                    "Board move of {id} from {} to {} failed, rolling back: {e}",
                    pending.from, pending.to
                );
                self.rollback(&pending);
                Err(e.into())
            }
        }
    }
}
