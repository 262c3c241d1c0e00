// ==========================================
// 仓储资产导入引擎 - 列识别器
// ==========================================
// 职责: 原始表头 → 规范字段（同义词双向子串匹配）
// 规则: 按模式声明顺序，首个匹配字段胜出
// ==========================================

use crate::domain::import::{ColumnAssignment, ColumnMapping};
use crate::domain::schema::FieldSchema;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderClassifier;

impl HeaderClassifier {
    /// 识别表头，生成列映射
    ///
    /// 未匹配的表头保留为未映射项，供界面展示与人工覆写；不产生错误。
    pub fn classify(&self, headers: &[String], schema: &FieldSchema) -> ColumnMapping {
        let columns = headers
            .iter()
            .map(|header| ColumnAssignment {
                header: header.clone(),
                field: self.classify_header(header, schema).map(str::to_string),
            })
            .collect::<Vec<_>>();

        let mapping = ColumnMapping::new(columns);
        debug!(
            family = %schema.family,
            columns = mapping.len(),
            unmapped = mapping.unmapped_headers().len(),
            "列识别完成"
        );
        mapping
    }

    /// 识别单个表头
    pub fn classify_header<'s>(&self, header: &str, schema: &'s FieldSchema) -> Option<&'s str> {
        let header_lower = header.trim().to_lowercase();
        // 空表头是所有同义词的子串，直接视为未映射
        if header_lower.is_empty() {
            return None;
        }

        schema
            .fields
            .iter()
            .find(|spec| spec.matches_header(&header_lower))
            .map(|spec| spec.name.as_str())
    }
}
