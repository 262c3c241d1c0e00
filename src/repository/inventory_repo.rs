// ==========================================
// 仓储资产导入引擎 - 资产台账 Repository Trait
// ==========================================
// 职责: 定义父/子实体与导入批次的数据访问接口（不包含业务逻辑）
// 红线: Repository 不做去重，只做数据 CRUD
// ==========================================

use crate::domain::import::{ChildRecord, FieldMap, ImportBatch, ParentRecord};
use crate::domain::types::{EntityFamily, EntityId};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// InventoryRepository Trait
// ==========================================
// 实现者: InventoryRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    // ===== 写入（每次调用都新建记录）=====

    /// 插入父实体
    ///
    /// # 参数
    /// - family: 实体族
    /// - key: 复合键（小写）
    /// - fields: 父实体字段
    /// - batch_id: 所属导入批次
    async fn insert_parent(
        &self,
        family: EntityFamily,
        key: &str,
        fields: &FieldMap,
        batch_id: Option<&str>,
    ) -> RepositoryResult<EntityId>;

    /// 插入子实体
    ///
    /// # 返回
    /// - Err(ForeignKeyViolation): 父实体不存在
    async fn insert_child(
        &self,
        family: EntityFamily,
        parent_id: EntityId,
        fields: &FieldMap,
        batch_id: Option<&str>,
    ) -> RepositoryResult<EntityId>;

    /// 记录导入批次
    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()>;

    // ===== 查询（按创建顺序）=====

    async fn list_parents(&self, family: EntityFamily) -> RepositoryResult<Vec<ParentRecord>>;

    async fn list_children(&self, parent_id: EntityId) -> RepositoryResult<Vec<ChildRecord>>;

    async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatch>>;

    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>>;

    async fn count_children(&self, family: EntityFamily) -> RepositoryResult<usize>;
}
