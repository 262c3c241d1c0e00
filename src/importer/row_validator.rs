// ==========================================
// 仓储资产导入引擎 - 行校验
// ==========================================
// 职责: 检查必填字段（在上下文延续之后执行）
// 规则:
// - 标识字段（必填且不延续，如设备名）缺失 → 行失败
// - 必填延续字段缺失 → 校验提示，不阻断
//   首行: “首行缺少”；其后: “前面没有可延续的值”
// 约束: 从不中断导入
// ==========================================

use crate::domain::import::NormalizedRow;
use crate::domain::schema::FieldSchema;
use crate::i18n::t_with_args;
use serde::{Deserialize, Serialize};

/// 校验问题类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingIdentifier, // 行将被跳过
    MissingOnFirstRow, // 首行缺少延续字段
    MissingNoPrior,    // 延续字段从未出现过
}

impl IssueKind {
    pub fn is_blocking(&self) -> bool {
        matches!(self, IssueKind::MissingIdentifier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub kind: IssueKind,
    pub message: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RowValidator;

impl RowValidator {
    /// 校验单行，返回全部消息（文件顺序展示用）
    pub fn validate(
        &self,
        row: &NormalizedRow,
        schema: &FieldSchema,
        row_number: usize,
        is_first_row: bool,
    ) -> Vec<String> {
        self.inspect(row, schema, row_number, is_first_row)
            .into_iter()
            .map(|issue| issue.message)
            .collect()
    }

    /// 校验单行，返回带类别的问题列表
    pub fn inspect(
        &self,
        row: &NormalizedRow,
        schema: &FieldSchema,
        row_number: usize,
        is_first_row: bool,
    ) -> Vec<ValidationIssue> {
        let row_str = row_number.to_string();
        schema
            .fields
            .iter()
            .filter(|spec| spec.required && !row.is_present(&spec.name))
            .map(|spec| {
                let kind = if spec.is_identifying() {
                    IssueKind::MissingIdentifier
                } else if is_first_row {
                    IssueKind::MissingOnFirstRow
                } else {
                    IssueKind::MissingNoPrior
                };
                let key = match kind {
                    IssueKind::MissingIdentifier => "import.row.missing_identifier",
                    IssueKind::MissingOnFirstRow => "import.row.missing_first_row",
                    IssueKind::MissingNoPrior => "import.row.missing_no_prior",
                };
                ValidationIssue {
                    field: spec.name.clone(),
                    kind,
                    message: t_with_args(key, &[("row", &row_str), ("field", &spec.name)]),
                }
            })
            .collect()
    }
}
