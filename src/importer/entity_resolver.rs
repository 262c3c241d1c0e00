// ==========================================
// 仓储资产导入引擎 - 父实体解析
// ==========================================
// 职责: 复合键去重，首次出现时创建父实体
// 复合键: 父实体键字段（模式声明顺序）小写去空白后以 "|" 连接，
//         缺失值贡献空段
// 约束: 缓存只在单次 run 内有效，不查询已有记录
// ==========================================

use crate::domain::import::{FieldMap, NormalizedRow};
use crate::domain::schema::FieldSchema;
use crate::domain::types::EntityId;
use crate::importer::error::ImportResult;
use crate::importer::import_trait::ImportSink;
use std::collections::HashMap;
use tracing::debug;

// ==========================================
// ParentEntityCache - 父实体缓存
// ==========================================
// 保持首次出现顺序
#[derive(Debug, Default, Clone)]
pub struct ParentEntityCache {
    index: HashMap<String, EntityId>,
    order: Vec<String>,
}

impl ParentEntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<EntityId> {
        self.index.get(key).copied()
    }

    pub fn insert(&mut self, key: String, id: EntityId) {
        if self.index.insert(key.clone(), id).is_none() {
            self.order.push(key);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 按首次出现顺序遍历 (键, ID)
    pub fn entries(&self) -> impl Iterator<Item = (&str, EntityId)> + '_ {
        self.order
            .iter()
            .filter_map(|k| self.index.get(k).map(|id| (k.as_str(), *id)))
    }
}

/// 计算复合键
pub fn composite_key(row: &NormalizedRow, schema: &FieldSchema) -> String {
    composite_key_of(row.values(), schema)
}

/// 由字段表计算复合键（持久化层记录键值时使用）
pub fn composite_key_of(fields: &FieldMap, schema: &FieldSchema) -> String {
    schema
        .parent_key_fields()
        .map(|spec| {
            fields
                .get(&spec.name)
                .map(|v| v.trim().to_lowercase())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// 父实体字段（复合键字段 + 父属性，保持原始大小写）
pub fn parent_fields(row: &NormalizedRow, schema: &FieldSchema) -> FieldMap {
    schema
        .parent_fields()
        .filter_map(|spec| {
            row.get(&spec.name)
                .map(|v| (spec.name.clone(), v.to_string()))
        })
        .collect()
}

/// 子实体字段（不属于父实体的全部规范字段）
pub fn child_fields(row: &NormalizedRow, schema: &FieldSchema) -> FieldMap {
    schema
        .child_fields()
        .filter_map(|spec| {
            row.get(&spec.name)
                .map(|v| (spec.name.clone(), v.to_string()))
        })
        .collect()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EntityResolver;

impl EntityResolver {
    /// 解析父实体 ID
    ///
    /// # 返回
    /// - Ok(id): 缓存命中时不调用 sink
    /// - Err: create_parent 失败（原样传播，不写缓存）
    pub async fn resolve<S>(
        &self,
        row: &NormalizedRow,
        schema: &FieldSchema,
        cache: &mut ParentEntityCache,
        sink: &S,
    ) -> ImportResult<EntityId>
    where
        S: ImportSink + ?Sized,
    {
        let key = composite_key(row, schema);
        if let Some(id) = cache.get(&key) {
            return Ok(id);
        }

        let id = sink.create_parent(&parent_fields(row, schema)).await?;
        debug!(row_number = row.row_number, key = %key, parent_id = id, "新建父实体");
        cache.insert(key, id);
        Ok(id)
    }
}
