// ==========================================
// 仓储资产导入引擎 - 持久化协作方适配器
// ==========================================
// 职责: 将 InventoryRepository 适配为导入引擎的 ImportSink
// 范围: 单个实体族 + 单个导入批次
// ==========================================

use crate::domain::import::FieldMap;
use crate::domain::schema::FieldSchema;
use crate::domain::types::EntityId;
use crate::importer::entity_resolver::composite_key_of;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_trait::ImportSink;
use crate::repository::error::RepositoryError;
use crate::repository::inventory_repo::InventoryRepository;
use async_trait::async_trait;

impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::Persistence(err.to_string())
    }
}

pub struct RepositorySink<'a, R: InventoryRepository + ?Sized> {
    repo: &'a R,
    schema: &'a FieldSchema,
    batch_id: String,
}

impl<'a, R: InventoryRepository + ?Sized> RepositorySink<'a, R> {
    pub fn new(repo: &'a R, schema: &'a FieldSchema, batch_id: impl Into<String>) -> Self {
        Self {
            repo,
            schema,
            batch_id: batch_id.into(),
        }
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }
}

#[async_trait]
impl<R: InventoryRepository + ?Sized> ImportSink for RepositorySink<'_, R> {
    async fn create_parent(&self, fields: &FieldMap) -> ImportResult<EntityId> {
        let key = composite_key_of(fields, self.schema);
        let id = self
            .repo
            .insert_parent(self.schema.family, &key, fields, Some(&self.batch_id))
            .await?;
        Ok(id)
    }

    async fn create_child(&self, parent_id: EntityId, fields: &FieldMap) -> ImportResult<EntityId> {
        let id = self
            .repo
            .insert_child(self.schema.family, parent_id, fields, Some(&self.batch_id))
            .await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::ParsedSheet;
    use crate::importer::import_trait::NoopObserver;
    use crate::importer::orchestrator::ImportOrchestrator;
    use crate::importer::schemas::pdas_schema;
    use crate::repository::inventory_repo_impl::InventoryRepositoryImpl;
    use rusqlite::Connection;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_orchestrator_writes_through_sink() {
        let repo = InventoryRepositoryImpl::from_connection(Arc::new(Mutex::new(
            Connection::open_in_memory().unwrap(),
        )))
        .unwrap();
        let schema = pdas_schema();
        let sink = RepositorySink::new(&repo, &schema, "batch-1");
        let sheet = ParsedSheet::from_strs(
            &["PDA", "IMEI", "AREA", "Responsable"],
            &[
                &["PDA-01", "111", "Bodega", "Eva"],
                &["PDA-02", "222", "", ""],
                &["PDA-03", "333", "Caja", "Eva"],
            ],
        );

        let outcome = ImportOrchestrator::new()
            .run(&sheet.headers, &sheet.rows, &schema, &sink, &mut NoopObserver)
            .await
            .unwrap();
        assert_eq!(outcome.succeeded, 3);

        let parents = repo.list_parents(schema.family).await.unwrap();
        let keys: Vec<_> = parents.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["bodega|eva", "caja|eva"]);
        assert_eq!(parents[0].batch_id.as_deref(), Some("batch-1"));

        let children = repo.list_children(parents[0].id).await.unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[1].fields.get("imei").map(String::as_str), Some("222"));
        // 区域/责任人只写入父实体
        assert!(!children[0].fields.contains_key("area"));
    }
}
