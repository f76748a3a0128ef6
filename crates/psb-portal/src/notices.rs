use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::schema::{NewNotice, Notice, NoticePatch};
use crate::storage::{NoticeStore, StoreError};
use crate::validation::FieldErrors;

#[derive(Debug, thiserror::Error)]
pub enum NoticeError {
    #[error("Validation failed")]
    Validation(FieldErrors),
    #[error("Notice not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<FieldErrors> for NoticeError {
    fn from(errors: FieldErrors) -> Self {
        NoticeError::Validation(errors)
    }
}

/// Public board notices and their admin editor.
pub struct NoticeService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for NoticeService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> NoticeService<S>
where
    S: NoticeStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn published(&self) -> Result<Vec<Notice>, NoticeError> {
        Ok(self.store.list_notices(true).await?)
    }

    pub async fn all(&self) -> Result<Vec<Notice>, NoticeError> {
        Ok(self.store.list_notices(false).await?)
    }

    pub async fn create(&self, notice: NewNotice, created_by: &str) -> Result<Notice, NoticeError> {
        self.create_at(notice, created_by, Utc::now()).await
    }

    pub async fn create_at(
        &self,
        notice: NewNotice,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Notice, NoticeError> {
        FieldErrors::check(&notice)?;
        let notice = self.store.create_notice(notice, created_by, now).await?;
        info!(
            notice_id = notice.id,
            published = notice.is_published,
            "notice created"
        );
        Ok(notice)
    }

    pub async fn update(&self, id: i32, patch: NoticePatch) -> Result<Notice, NoticeError> {
        self.update_at(id, patch, Utc::now()).await
    }

    pub async fn update_at(
        &self,
        id: i32,
        patch: NoticePatch,
        now: DateTime<Utc>,
    ) -> Result<Notice, NoticeError> {
        FieldErrors::check(&patch)?;
        let notice = self
            .store
            .update_notice(id, patch, now)
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) => NoticeError::NotFound,
                other => NoticeError::Store(other),
            })?;
        info!(
            notice_id = notice.id,
            published = notice.is_published,
            "notice updated"
        );
        Ok(notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::schema::NoticeType;
    use crate::storage::MemoryStorage;

    fn draft() -> NewNotice {
        NewNotice {
            title: "Shortlisted candidates: Clinical Officer II".to_string(),
            content: "Interviews will be held at the county headquarters.".to_string(),
            notice_type: NoticeType::Announcement,
            is_published: false,
        }
    }

    #[tokio::test]
    async fn publishing_stamps_first_publication_only() {
        let notices = NoticeService::new(Arc::new(MemoryStorage::new()));
        let created_at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let notice = notices
            .create_at(draft(), "admin-1", created_at)
            .await
            .expect("created");
        assert!(notice.published_at.is_none());
        assert!(notices.published().await.expect("public").is_empty());

        let first = created_at + Duration::hours(2);
        let publish = NoticePatch {
            is_published: Some(true),
            ..NoticePatch::default()
        };
        let published = notices
            .update_at(notice.id, publish.clone(), first)
            .await
            .expect("published");
        assert_eq!(published.published_at, Some(first));

        let later = first + Duration::days(1);
        let again = notices
            .update_at(notice.id, publish, later)
            .await
            .expect("republished");
        assert_eq!(again.published_at, Some(first));
        assert_eq!(notices.published().await.expect("public").len(), 1);
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let notices = NoticeService::new(Arc::new(MemoryStorage::new()));
        let err = notices
            .create(
                NewNotice {
                    title: String::new(),
                    ..draft()
                },
                "admin-1",
            )
            .await
            .expect_err("blank title");
        assert!(matches!(err, NoticeError::Validation(ref errors) if errors.get("title").is_some()));
    }

    #[tokio::test]
    async fn missing_notice_is_not_found() {
        let notices = NoticeService::new(Arc::new(MemoryStorage::new()));
        assert!(matches!(
            notices.update(12, NoticePatch::default()).await,
            Err(NoticeError::NotFound)
        ));
    }
}
