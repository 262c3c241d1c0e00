// ==========================================
// 仓储资产导入引擎 - 资产台账 Repository 实现
// ==========================================
// 职责: 实现父/子实体与导入批次的数据访问（使用 rusqlite）
// 存储: 字段表以 JSON 保存在 fields_json 列
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::domain::import::{ChildRecord, FieldMap, ImportBatch, ParentRecord};
use crate::domain::types::{EntityFamily, EntityId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::inventory_repo::InventoryRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

/// 解析实体族列（查询映射内使用）
fn family_column(row: &Row, idx: usize) -> rusqlite::Result<EntityFamily> {
    let raw: String = row.get(idx)?;
    raw.parse::<EntityFamily>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

/// 解析 JSON 字段列
fn fields_column(row: &Row, idx: usize) -> rusqlite::Result<FieldMap> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_batch(row: &Row) -> rusqlite::Result<ImportBatch> {
    Ok(ImportBatch {
        batch_id: row.get(0)?,
        family: family_column(row, 1)?,
        file_name: row.get(2)?,
        total_rows: row.get(3)?,
        success_rows: row.get(4)?,
        failed_rows: row.get(5)?,
        warning_rows: row.get(6)?,
        parents_created: row.get(7)?,
        cancelled: row.get::<_, i32>(8)? != 0,
        imported_at: row
            .get::<_, Option<String>>(9)?
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
        elapsed_ms: row.get(10)?,
        report_json: row.get(11)?,
    })
}

const BATCH_COLUMNS: &str = "batch_id, family, file_name, total_rows, success_rows, failed_rows, \
     warning_rows, parents_created, cancelled, imported_at, elapsed_ms, report_json";

// ==========================================
// InventoryRepositoryImpl
// ==========================================
pub struct InventoryRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryRepositoryImpl {
    /// 创建新的 Repository 实例（建表幂等）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 并建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

#[async_trait]
impl InventoryRepository for InventoryRepositoryImpl {
    async fn insert_parent(
        &self,
        family: EntityFamily,
        key: &str,
        fields: &FieldMap,
        batch_id: Option<&str>,
    ) -> RepositoryResult<EntityId> {
        let fields_json = serde_json::to_string(fields)?;
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO parent_entity (family, key, fields_json, batch_id) VALUES (?1, ?2, ?3, ?4)",
            params![family.as_str(), key, fields_json, batch_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    async fn insert_child(
        &self,
        family: EntityFamily,
        parent_id: EntityId,
        fields: &FieldMap,
        batch_id: Option<&str>,
    ) -> RepositoryResult<EntityId> {
        let fields_json = serde_json::to_string(fields)?;
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO child_entity (family, parent_id, fields_json, batch_id) VALUES (?1, ?2, ?3, ?4)",
            params![family.as_str(), parent_id, fields_json, batch_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            &format!(
                "INSERT INTO import_batch ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                BATCH_COLUMNS
            ),
            params![
                batch.batch_id,
                batch.family.as_str(),
                batch.file_name,
                batch.total_rows,
                batch.success_rows,
                batch.failed_rows,
                batch.warning_rows,
                batch.parents_created,
                batch.cancelled as i32,
                batch.imported_at.map(|dt| dt.to_rfc3339()),
                batch.elapsed_ms,
                batch.report_json,
            ],
        )?;
        Ok(())
    }

    async fn list_parents(&self, family: EntityFamily) -> RepositoryResult<Vec<ParentRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, family, key, fields_json, batch_id
            FROM parent_entity
            WHERE family = ?1
            ORDER BY id
            "#,
        )?;

        let parents = stmt
            .query_map(params![family.as_str()], |row| {
                Ok(ParentRecord {
                    id: row.get(0)?,
                    family: family_column(row, 1)?,
                    key: row.get(2)?,
                    fields: fields_column(row, 3)?,
                    batch_id: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parents)
    }

    async fn list_children(&self, parent_id: EntityId) -> RepositoryResult<Vec<ChildRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, family, parent_id, fields_json, batch_id
            FROM child_entity
            WHERE parent_id = ?1
            ORDER BY id
            "#,
        )?;

        let children = stmt
            .query_map(params![parent_id], |row| {
                Ok(ChildRecord {
                    id: row.get(0)?,
                    family: family_column(row, 1)?,
                    parent_id: row.get(2)?,
                    fields: fields_column(row, 3)?,
                    batch_id: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(children)
    }

    async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatch>> {
        let conn = self.get_conn()?;
        let batch = conn
            .query_row(
                &format!("SELECT {} FROM import_batch WHERE batch_id = ?1", BATCH_COLUMNS),
                params![batch_id],
                map_batch,
            )
            .optional()?;
        Ok(batch)
    }

    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM import_batch ORDER BY imported_at DESC, rowid DESC LIMIT ?1",
            BATCH_COLUMNS
        ))?;
        let batches = stmt
            .query_map(params![limit as i64], map_batch)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(batches)
    }

    async fn count_children(&self, family: EntityFamily) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM child_entity WHERE family = ?1",
            params![family.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> InventoryRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        InventoryRepositoryImpl::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    fn fields(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_parent_and_children_round_trip() {
        let repo = repo();
        let parent_id = repo
            .insert_parent(
                EntityFamily::Activos,
                "ti|ana",
                &fields(&[("unidad", "TI"), ("responsable", "Ana")]),
                Some("b1"),
            )
            .await
            .unwrap();
        repo.insert_child(EntityFamily::Activos, parent_id, &fields(&[("equipo", "Laptop")]), Some("b1"))
            .await
            .unwrap();
        repo.insert_child(EntityFamily::Activos, parent_id, &fields(&[("equipo", "Monitor")]), Some("b1"))
            .await
            .unwrap();

        let parents = repo.list_parents(EntityFamily::Activos).await.unwrap();
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].key, "ti|ana");
        assert_eq!(parents[0].fields.get("responsable").map(String::as_str), Some("Ana"));

        let children = repo.list_children(parent_id).await.unwrap();
        let names: Vec<_> = children.iter().map(|c| c.fields["equipo"].clone()).collect();
        assert_eq!(names, vec!["Laptop", "Monitor"]);
        assert!(repo.list_parents(EntityFamily::Pdas).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_child_with_unknown_parent_rejected() {
        let repo = repo();
        let result = repo
            .insert_child(EntityFamily::Pdas, 42, &fields(&[("pda", "PDA-01")]), None)
            .await;
        assert!(matches!(result, Err(RepositoryError::ForeignKeyViolation(_))));
    }

    #[tokio::test]
    async fn test_insert_and_read_batch() {
        let repo = repo();
        let batch = ImportBatch {
            batch_id: "b1".into(),
            family: EntityFamily::Tablets,
            file_name: Some("tablets.csv".into()),
            total_rows: 3,
            success_rows: 2,
            failed_rows: 1,
            warning_rows: 0,
            parents_created: 1,
            cancelled: false,
            imported_at: Some(Utc::now()),
            elapsed_ms: Some(15),
            report_json: None,
        };
        repo.insert_batch(&batch).await.unwrap();

        let loaded = repo.get_batch("b1").await.unwrap().unwrap();
        assert_eq!(loaded.family, EntityFamily::Tablets);
        assert_eq!(loaded.failed_rows, 1);
        assert!(loaded.imported_at.is_some());
        assert!(repo.get_batch("missing").await.unwrap().is_none());
        assert_eq!(repo.get_recent_batches(10).await.unwrap().len(), 1);
    }
}
