use std::sync::Arc;

use crate::notify::{NoticeListing, Notifier, RunNotice};
use crate::pipeline::context::StageScope;
use crate::pipeline::stage::StageError;

/// Notifier: announces the finished document through the notification port.
pub struct NotifierStep {
    notifier: Arc<dyn Notifier>,
}

impl NotifierStep {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub async fn execute(&self, scope: &mut StageScope<'_>) -> Result<(), StageError> {
        let document = scope.generated_document()?;
        let notice = RunNotice {
            run_id: scope.run_id(),
            document_filename: document.filename.clone(),
            document_size_bytes: document.size_bytes,
            top_listings: scope
                .scored_listings()?
                .iter()
                .map(|s| NoticeListing {
                    rank: s.rank,
                    title: s.listing.title.clone(),
                    company: s.listing.company.clone(),
                    url: s.listing.url.clone(),
                })
                .collect(),
        };
        self.notifier.notify(&notice).await?;
        Ok(())
    }
}
