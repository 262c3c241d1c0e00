// ==========================================
// 仓储资产导入引擎 - 导入编排器
// ==========================================
// 职责: 单遍、严格按文件顺序驱动整条导入流水线
// 流程: 列识别(一次) → 逐行: 规范化 → 上下文延续 → 校验
//       → 父实体解析 → 创建子实体 → 进度回报
// 红线: 行级失败只记录不中断；仅模式非法时整体失败
// ==========================================

use crate::domain::import::{ColumnMapping, ImportOutcome, RawRow, RowMessage};
use crate::domain::schema::FieldSchema;
use crate::i18n::t_with_args;
use crate::importer::carry_forward::{ContextCarryForward, ImportContext};
use crate::importer::entity_resolver::{child_fields, EntityResolver, ParentEntityCache};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::header_classifier::HeaderClassifier;
use crate::importer::import_trait::{ImportObserver, ImportSink};
use crate::importer::row_normalizer::RowNormalizer;
use crate::importer::row_validator::{RowValidator, ValidationIssue};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// 首个数据行的原始行号（表头占第 1 行）
pub const FIRST_DATA_ROW: usize = 2;

/// 行号：优先使用源文件行号，内存行按位置推算
fn row_number_of(raw: &RawRow, idx: usize) -> usize {
    raw.source_row().unwrap_or(idx + FIRST_DATA_ROW)
}

/// 运行前检查模式是否可用
///
/// # 返回
/// - Err(InvalidSchema): 无字段 / 字段重名 / 无父实体键 / 无标识字段
pub fn ensure_schema(schema: &FieldSchema) -> ImportResult<()> {
    let invalid = |message: &str| ImportError::InvalidSchema {
        family: schema.family.to_string(),
        message: message.to_string(),
    };

    if schema.fields.is_empty() {
        return Err(invalid("没有任何字段"));
    }

    let mut seen = HashSet::new();
    for spec in &schema.fields {
        if spec.name.is_empty() {
            return Err(invalid("字段名为空"));
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(invalid(&format!("字段重名: {}", spec.name)));
        }
    }

    if schema.parent_key_fields().next().is_none() {
        return Err(invalid("缺少父实体键字段"));
    }
    if schema.identifying_fields().next().is_none() {
        return Err(invalid("缺少标识字段（必填且不延续）"));
    }
    Ok(())
}

/// 检查列映射只引用模式中存在的字段
fn ensure_mapping(mapping: &ColumnMapping, schema: &FieldSchema) -> ImportResult<()> {
    match mapping
        .columns()
        .iter()
        .filter_map(|c| c.field.as_deref())
        .find(|field| !schema.contains(field))
    {
        Some(field) => Err(ImportError::InvalidMapping(format!(
            "字段 {} 不属于 {} 模式",
            field, schema.family
        ))),
        None => Ok(()),
    }
}

// ==========================================
// ImportOrchestrator - 导入编排器
// ==========================================
// 无状态：上下文与父实体缓存在每次 run 内新建，
// 并发导入互不共享
#[derive(Default)]
pub struct ImportOrchestrator {
    classifier: HeaderClassifier,
    normalizer: RowNormalizer,
    carry_forward: ContextCarryForward,
    validator: RowValidator,
    resolver: EntityResolver,
}

impl ImportOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 列识别（供界面在提交前展示/编辑映射）
    pub fn classify(&self, headers: &[String], schema: &FieldSchema) -> ColumnMapping {
        self.classifier.classify(headers, schema)
    }

    /// 执行导入（自动列识别）
    ///
    /// # 参数
    /// - headers: 表头（文件顺序）
    /// - rows: 数据行（文件顺序）
    /// - schema: 字段模式
    /// - sink: 持久化协作方
    /// - observer: 进度与取消
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 行级失败记录在结果中
    /// - Err: 仅模式非法
    pub async fn run<S, O>(
        &self,
        headers: &[String],
        rows: &[RawRow],
        schema: &FieldSchema,
        sink: &S,
        observer: &mut O,
    ) -> ImportResult<ImportOutcome>
    where
        S: ImportSink + ?Sized,
        O: ImportObserver + ?Sized,
    {
        ensure_schema(schema)?;
        let mapping = self.classify(headers, schema);
        self.run_with_mapping(&mapping, rows, schema, sink, observer)
            .await
    }

    /// 按指定列映射执行导入（人工覆写后提交）
    #[instrument(skip_all, fields(family = %schema.family, total_rows = rows.len()))]
    pub async fn run_with_mapping<S, O>(
        &self,
        mapping: &ColumnMapping,
        rows: &[RawRow],
        schema: &FieldSchema,
        sink: &S,
        observer: &mut O,
    ) -> ImportResult<ImportOutcome>
    where
        S: ImportSink + ?Sized,
        O: ImportObserver + ?Sized,
    {
        ensure_schema(schema)?;
        ensure_mapping(mapping, schema)?;

        let total = rows.len();
        info!(
            unmapped = mapping.unmapped_headers().len(),
            "开始导入"
        );

        let mut outcome = ImportOutcome::new(total);
        let mut context = ImportContext::new();
        let mut cache = ParentEntityCache::new();

        for (idx, raw) in rows.iter().enumerate() {
            if observer.is_cancelled() {
                outcome.cancelled = true;
                info!(processed = outcome.processed_rows, total, "导入已被取消");
                break;
            }

            let row_number = row_number_of(raw, idx);
            let mut row = self.normalizer.normalize(raw, mapping, schema, row_number);
            self.carry_forward.fill(&mut row, &mut context, schema);

            // === 校验：标识字段缺失 → 失败；其余 → 提示 ===
            let (blocking, advisory): (Vec<ValidationIssue>, Vec<ValidationIssue>) = self
                .validator
                .inspect(&row, schema, row_number, idx == 0)
                .into_iter()
                .partition(|issue| issue.kind.is_blocking());

            for issue in advisory {
                outcome.record_warning(row_number, issue.message);
            }

            if !blocking.is_empty() {
                let message = blocking
                    .into_iter()
                    .map(|issue| issue.message)
                    .collect::<Vec<_>>()
                    .join("; ");
                warn!(row_number, reason = %message, "行缺少标识字段，已跳过");
                outcome.record_failure(row_number, message);
                observer.on_progress(idx + 1, total);
                continue;
            }

            let row_str = row_number.to_string();

            // === 父实体解析 ===
            let parent_id = match self
                .resolver
                .resolve(&row, schema, &mut cache, sink)
                .await
            {
                Ok(id) => id,
                Err(e) => {
                    warn!(row_number, error = %e, "父实体创建失败");
                    outcome.record_failure(
                        row_number,
                        t_with_args(
                            "import.row.parent_failed",
                            &[
                                ("row", &row_str),
                                ("parent", &schema.parent_label),
                                ("error", &e.to_string()),
                            ],
                        ),
                    );
                    observer.on_progress(idx + 1, total);
                    continue;
                }
            };

            // === 子实体创建 ===
            let fields = child_fields(&row, schema);
            match sink.create_child(parent_id, &fields).await {
                Ok(child_id) => {
                    debug!(row_number, parent_id, child_id, "子实体创建成功");
                    outcome.record_success();
                }
                Err(e) => {
                    let value = schema
                        .primary_identifier()
                        .and_then(|spec| row.get(&spec.name))
                        .unwrap_or_default()
                        .to_string();
                    warn!(row_number, value = %value, error = %e, "子实体创建失败");
                    outcome.record_failure(
                        row_number,
                        t_with_args(
                            "import.row.child_failed",
                            &[
                                ("row", &row_str),
                                ("child", &schema.child_label),
                                ("value", &value),
                                ("error", &e.to_string()),
                            ],
                        ),
                    );
                }
            }

            observer.on_progress(idx + 1, total);
        }

        outcome.parents_created = cache.len();
        info!(
            processed = outcome.processed_rows,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            warnings = outcome.warnings.len(),
            parents_created = outcome.parents_created,
            cancelled = outcome.cancelled,
            "导入结束"
        );
        Ok(outcome)
    }

    /// 试运行：规范化 → 延续 → 校验，不做持久化
    ///
    /// # 返回
    /// 全部行级消息（文件顺序），用于提交前预览
    pub fn validate_rows(
        &self,
        mapping: &ColumnMapping,
        rows: &[RawRow],
        schema: &FieldSchema,
    ) -> Vec<RowMessage> {
        let mut context = ImportContext::new();
        let mut messages = Vec::new();

        for (idx, raw) in rows.iter().enumerate() {
            let row_number = row_number_of(raw, idx);
            let mut row = self.normalizer.normalize(raw, mapping, schema, row_number);
            self.carry_forward.fill(&mut row, &mut context, schema);
            messages.extend(
                self.validator
                    .validate(&row, schema, row_number, idx == 0)
                    .into_iter()
                    .map(|message| RowMessage { row_number, message }),
            );
        }
        messages
    }
}
