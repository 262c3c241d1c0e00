// ==========================================
// 仓储资产导入引擎 - 导入领域对象
// ==========================================
// 职责: 表格行/列映射/规范化行/导入结果/批次记录
// 红线: 不含数据访问逻辑，不含导入流程逻辑
// ==========================================

use crate::domain::types::EntityFamily;
use crate::i18n::t_with_args;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 规范字段名 → 值（缺失字段不出现）
pub type FieldMap = BTreeMap<String, String>;

// ==========================================
// RawRow - 原始数据行
// ==========================================
// 单元格按列位置与表头对齐，缺失单元格视为空串
// source_row: 源文件中的行号（从 1 开始，表头为第 1 行）；内存构造的行为 None
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    cells: Vec<String>,
    #[serde(default)]
    source_row: Option<usize>,
}

impl RawRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self {
            cells,
            source_row: None,
        }
    }

    /// 带源文件行号构造（文件解析器使用）
    pub fn at_row(cells: Vec<String>, source_row: usize) -> Self {
        Self {
            cells,
            source_row: Some(source_row),
        }
    }

    pub fn source_row(&self) -> Option<usize> {
        self.source_row
    }

    pub fn from_strs(cells: &[&str]) -> Self {
        Self::new(cells.iter().map(|c| c.to_string()).collect())
    }

    pub fn cell(&self, column: usize) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

// ==========================================
// ParsedSheet - 已解码的表格
// ==========================================
// 用途: 文件解析器输出 / 导入引擎输入
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSheet {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl ParsedSheet {
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self { headers, rows }
    }

    /// 测试/调用方便捷构造
    pub fn from_strs(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter().map(|r| RawRow::from_strs(r)).collect(),
        )
    }

    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }
}

// ==========================================
// ColumnMapping - 列映射
// ==========================================
// 每个文件列一项（以列位置为身份，容忍重复表头），保持文件顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAssignment {
    pub header: String,        // 文件中的原始表头
    pub field: Option<String>, // 规范字段；None 表示未映射
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    columns: Vec<ColumnAssignment>,
}

impl ColumnMapping {
    pub fn new(columns: Vec<ColumnAssignment>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnAssignment] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn field_at(&self, column: usize) -> Option<&str> {
        self.columns.get(column).and_then(|c| c.field.as_deref())
    }

    /// 映射到指定字段的列位置（文件顺序）
    pub fn columns_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.columns
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.field.as_deref() == Some(field))
            .map(|(idx, _)| idx)
    }

    /// 人工覆写指定列（None 表示取消映射）
    ///
    /// # 返回
    /// - false: 列位置越界
    pub fn assign(&mut self, column: usize, field: Option<String>) -> bool {
        match self.columns.get_mut(column) {
            Some(c) => {
                c.field = field;
                true
            }
            None => false,
        }
    }

    /// 人工覆写指定表头（首个同名列）
    pub fn assign_header(&mut self, header: &str, field: Option<String>) -> bool {
        match self.columns.iter().position(|c| c.header == header) {
            Some(idx) => self.assign(idx, field),
            None => false,
        }
    }

    pub fn unmapped_headers(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.field.is_none())
            .map(|c| c.header.as_str())
            .collect()
    }
}

// ==========================================
// NormalizedRow - 规范化行
// ==========================================
// 生命周期: 单行处理期间
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub row_number: usize, // 原始行号（表头为第 1 行，首个数据行为第 2 行）
    values: FieldMap,
}

impl NormalizedRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            values: FieldMap::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn is_present(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// 写入字段值；空白值视为缺失
    pub fn set(&mut self, field: &str, value: Option<String>) {
        match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            Some(v) => {
                self.values.insert(field.to_string(), v);
            }
            None => {
                self.values.remove(field);
            }
        }
    }

    pub fn values(&self) -> &FieldMap {
        &self.values
    }
}

// ==========================================
// RowMessage - 行级消息（错误/警告）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMessage {
    pub row_number: usize,
    pub message: String,
}

// ==========================================
// ImportOutcome - 单次导入结果
// ==========================================
// 不变量: succeeded + failed == processed_rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub total_rows: usize,      // 文件数据行总数
    pub processed_rows: usize,  // 实际处理行数（取消时小于总数）
    pub succeeded: usize,       // 子实体创建成功数
    pub failed: usize,          // 失败数（含创建前跳过的行）
    pub parents_created: usize, // 本次新建父实体数
    pub cancelled: bool,        // 是否被调用方取消
    pub errors: Vec<RowMessage>,   // 失败明细（文件顺序）
    pub warnings: Vec<RowMessage>, // 校验提示（不阻断）
}

impl ImportOutcome {
    pub fn new(total_rows: usize) -> Self {
        Self {
            total_rows,
            ..Self::default()
        }
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
        self.processed_rows += 1;
    }

    pub fn record_failure(&mut self, row_number: usize, message: String) {
        self.failed += 1;
        self.processed_rows += 1;
        self.errors.push(RowMessage { row_number, message });
    }

    pub fn record_warning(&mut self, row_number: usize, message: String) {
        self.warnings.push(RowMessage { row_number, message });
    }

    /// 界面展示用的错误预览（引擎始终保留完整列表）
    pub fn error_preview(&self, limit: usize) -> &[RowMessage] {
        &self.errors[..self.errors.len().min(limit)]
    }

    /// 汇总文案（本地化）
    pub fn summary_message(&self) -> String {
        let succeeded = self.succeeded.to_string();
        let failed = self.failed.to_string();
        let mut msg = if self.failed > 0 {
            t_with_args(
                "import.summary_with_errors",
                &[("succeeded", &succeeded), ("failed", &failed)],
            )
        } else {
            t_with_args("import.summary", &[("succeeded", &succeeded)])
        };
        if self.cancelled {
            let processed = self.processed_rows.to_string();
            let total = self.total_rows.to_string();
            msg.push_str(&t_with_args(
                "import.summary_cancelled",
                &[("processed", &processed), ("total", &total)],
            ));
        }
        msg
    }
}

// ==========================================
// ImportBatch - 导入批次
// ==========================================
// 用途: 记录已提交导入的元信息
// 对齐: import_batch 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,                   // 批次 ID（UUID）
    pub family: EntityFamily,               // 实体族
    pub file_name: Option<String>,          // 源文件名
    pub total_rows: i32,                    // 总行数
    pub success_rows: i32,                  // 成功行数
    pub failed_rows: i32,                   // 失败行数
    pub warning_rows: i32,                  // 提示条数
    pub parents_created: i32,               // 新建父实体数
    pub cancelled: bool,                    // 是否取消
    pub imported_at: Option<DateTime<Utc>>, // 导入时间
    pub elapsed_ms: Option<i64>,            // 导入耗时（毫秒）
    pub report_json: Option<String>,        // 完整结果 JSON
}

impl ImportBatch {
    /// 由导入结果构造批次记录
    pub fn from_outcome(
        batch_id: String,
        family: EntityFamily,
        file_name: Option<String>,
        outcome: &ImportOutcome,
        elapsed_ms: i64,
    ) -> Self {
        Self {
            batch_id,
            family,
            file_name,
            total_rows: outcome.total_rows as i32,
            success_rows: outcome.succeeded as i32,
            failed_rows: outcome.failed as i32,
            warning_rows: outcome.warnings.len() as i32,
            parents_created: outcome.parents_created as i32,
            cancelled: outcome.cancelled,
            imported_at: Some(Utc::now()),
            elapsed_ms: Some(elapsed_ms),
            report_json: serde_json::to_string(outcome).ok(),
        }
    }
}

// ==========================================
// 持久化读取视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRecord {
    pub id: i64,
    pub family: EntityFamily,
    pub key: String,
    pub fields: FieldMap,
    pub batch_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRecord {
    pub id: i64,
    pub family: EntityFamily,
    pub parent_id: i64,
    pub fields: FieldMap,
    pub batch_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_row_missing_cell_is_empty() {
        let row = RawRow::from_strs(&["a"]);
        assert_eq!(row.cell(0), "a");
        assert_eq!(row.cell(5), "");
        assert!(RawRow::from_strs(&["", "  "]).is_blank());
        assert_eq!(row.source_row(), None);
        assert_eq!(RawRow::at_row(vec!["b".into()], 7).source_row(), Some(7));
    }

    #[test]
    fn test_normalized_row_blank_is_absent() {
        let mut row = NormalizedRow::new(2);
        row.set("equipo", Some("  Laptop ".to_string()));
        row.set("modelo", Some("   ".to_string()));
        assert_eq!(row.get("equipo"), Some("Laptop"));
        assert!(!row.is_present("modelo"));

        row.set("equipo", None);
        assert!(!row.is_present("equipo"));
    }

    #[test]
    fn test_mapping_override() {
        let mut mapping = ColumnMapping::new(vec![
            ColumnAssignment { header: "A".into(), field: None },
            ColumnAssignment { header: "B".into(), field: Some("modelo".into()) },
        ]);
        assert_eq!(mapping.unmapped_headers(), vec!["A"]);

        assert!(mapping.assign_header("A", Some("equipo".into())));
        assert!(!mapping.assign(9, None));
        assert_eq!(mapping.field_at(0), Some("equipo"));
        assert_eq!(mapping.columns_for("modelo").collect::<Vec<_>>(), vec![1]);
        assert!(mapping.unmapped_headers().is_empty());
    }

    #[test]
    fn test_outcome_counts_and_preview() {
        let mut outcome = ImportOutcome::new(3);
        outcome.record_success();
        outcome.record_failure(3, "x".into());
        outcome.record_failure(4, "y".into());

        assert_eq!(outcome.processed_rows, 3);
        assert_eq!(outcome.succeeded + outcome.failed, outcome.processed_rows);
        assert_eq!(outcome.error_preview(1).len(), 1);
        assert_eq!(outcome.error_preview(10).len(), 2);
    }

    #[test]
    fn test_batch_from_outcome() {
        let mut outcome = ImportOutcome::new(2);
        outcome.record_success();
        outcome.record_warning(2, "w".into());
        let batch = ImportBatch::from_outcome(
            "b1".into(),
            EntityFamily::Pdas,
            Some("pdas.xlsx".into()),
            &outcome,
            12,
        );
        assert_eq!(batch.success_rows, 1);
        assert_eq!(batch.warning_rows, 1);
        assert!(batch.report_json.unwrap().contains("\"succeeded\":1"));
    }
}
