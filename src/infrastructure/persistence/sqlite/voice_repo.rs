//! SQLite Metadata Store - 关系型音色元数据

use async_trait::async_trait;
use sqlx::FromRow;

use super::{format_timestamp, parse_timestamp, DbPool};
use crate::application::ports::{MetadataStorePort, RepositoryError};
use crate::domain::voice::{OwnerId, VoiceId, VoiceRecord};

/// SQLite 元数据存储
pub struct SqliteMetadataStore {
    pool: DbPool,
}

impl SqliteMetadataStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct VoiceRow {
    voice_id: String,
    name: String,
    consent_scope: String,
    created_at: String,
    owner_id: Option<String>,
    faction: Option<String>,
}

impl TryFrom<VoiceRow> for VoiceRecord {
    type Error = RepositoryError;

    fn try_from(row: VoiceRow) -> Result<Self, Self::Error> {
        Ok(VoiceRecord {
            voice_id: VoiceId::parse(&row.voice_id).ok_or_else(|| {
                RepositoryError::SerializationError(format!("invalid voice_id {}", row.voice_id))
            })?,
            name: row.name,
            consent_scope: row.consent_scope,
            created_at: parse_timestamp(&row.created_at)?,
            owner_id: row.owner_id.map(OwnerId::new),
            faction: row.faction.filter(|f| !f.is_empty()),
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT voice_id, name, consent_scope, created_at, owner_id, faction FROM voices";

#[async_trait]
impl MetadataStorePort for SqliteMetadataStore {
    async fn insert(&self, record: &VoiceRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO voices (voice_id, name, consent_scope, created_at, owner_id, faction)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(voice_id) DO UPDATE SET
                name = excluded.name,
                consent_scope = excluded.consent_scope,
                owner_id = excluded.owner_id,
                faction = excluded.faction
            "#,
        )
        .bind(record.voice_id.to_string())
        .bind(&record.name)
        .bind(&record.consent_scope)
        .bind(format_timestamp(&record.created_at))
        .bind(record.owner_id.as_ref().map(|o| o.as_str().to_string()))
        .bind(&record.faction)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, id: &VoiceId) -> Result<Option<VoiceRecord>, RepositoryError> {
        let row: Option<VoiceRow> = sqlx::query_as(&format!("{} WHERE voice_id = ?", SELECT_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(VoiceRecord::try_from).transpose()
    }

    async fn list(&self, owner: Option<&OwnerId>) -> Result<Vec<VoiceRecord>, RepositoryError> {
        // 无主记录对所有调用方可见
        let rows: Vec<VoiceRow> = sqlx::query_as(&format!(
            "{} WHERE (?1 IS NULL OR owner_id IS NULL OR owner_id = ?1) \
             ORDER BY created_at DESC, voice_id ASC",
            SELECT_COLUMNS
        ))
        .bind(owner.map(|o| o.as_str().to_string()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(VoiceRecord::try_from).collect()
    }

    async fn rename(&self, id: &VoiceId, name: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE voices SET name = ? WHERE voice_id = ?")
            .bind(name.trim())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &VoiceId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM voices WHERE voice_id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};

    async fn store() -> SqliteMetadataStore {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteMetadataStore::new(pool)
    }

    #[tokio::test]
    async fn test_insert_find_roundtrip() {
        let store = store().await;
        let record = VoiceRecord::new(
            VoiceId::new(),
            "Herald",
            "tts",
            Some(OwnerId::new("alice")),
            Some("north".to_string()),
        );
        store.insert(&record).await.unwrap();

        assert_eq!(store.find(&record.voice_id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_list_filters_by_owner_but_keeps_unowned() {
        let store = store().await;
        let mine = VoiceRecord::new(VoiceId::new(), "Mine", "tts", Some(OwnerId::new("alice")), None);
        let theirs = VoiceRecord::new(VoiceId::new(), "Theirs", "tts", Some(OwnerId::new("bob")), None);
        let legacy = VoiceRecord::new(VoiceId::new(), "Legacy", "tts", None, None);
        for r in [&mine, &theirs, &legacy] {
            store.insert(r).await.unwrap();
        }

        let names: Vec<String> = store
            .list(Some(&OwnerId::new("alice")))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"Mine".to_string()));
        assert!(names.contains(&"Legacy".to_string()));

        assert_eq!(store.list(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_rename_and_delete_report_existence() {
        let store = store().await;
        let id = VoiceId::new();
        assert!(!store.rename(&id, "x").await.unwrap());
        assert!(!store.delete(&id).await.unwrap());

        store
            .insert(&VoiceRecord::new(id, "Before", "tts", None, None))
            .await
            .unwrap();
        assert!(store.rename(&id, " After ").await.unwrap());
        assert_eq!(store.find(&id).await.unwrap().unwrap().name, "After");
        assert!(store.delete(&id).await.unwrap());
        assert!(store.find(&id).await.unwrap().is_none());
    }
}
