// ==========================================
// 仓储资产导入引擎 - 上下文延续
// ==========================================
// 职责: 还原合并单元格式导出中省略的延续字段
// 规则: 有值 → 更新上下文；无值 → 从上下文补齐（上下文可能也为空）
// 约束: 行顺序决定结果，必须严格按文件顺序调用
// ==========================================

use crate::domain::import::{FieldMap, NormalizedRow};
use crate::domain::schema::FieldSchema;

// ==========================================
// ImportContext - 单次导入的延续上下文
// ==========================================
// 生命周期: 单次 run，不持久化、不跨导入共享
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportContext {
    last_values: FieldMap,
}

impl ImportContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.last_values.get(field).map(String::as_str)
    }

    /// 是否已记录过该字段
    pub fn has_value(&self, field: &str) -> bool {
        self.last_values.contains_key(field)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ContextCarryForward;

impl ContextCarryForward {
    /// 对单行执行延续（同一行重复调用结果不变）
    pub fn fill(&self, row: &mut NormalizedRow, context: &mut ImportContext, schema: &FieldSchema) {
        for spec in schema.carry_fields() {
            match row.get(&spec.name).map(str::to_string) {
                Some(value) => {
                    context.last_values.insert(spec.name.clone(), value);
                }
                None => {
                    let carried = context.get(&spec.name).map(str::to_string);
                    row.set(&spec.name, carried);
                }
            }
        }
    }
}
