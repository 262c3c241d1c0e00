// ==========================================
// 仓储资产导入引擎 - 行规范化
// ==========================================
// 职责: 原始行 → 规范字段值（仅去空白，不做类型转换）
// 取值顺序:
// 1. 映射到该字段的列（首个非空值）
// 2. 二次扫描：按文件列顺序，表头包含任一同义词的首个非空值
//    （不看映射结果；仅在第 1 步无值时生效）
// ==========================================

use crate::domain::import::{ColumnMapping, NormalizedRow, RawRow};
use crate::domain::schema::{FieldSchema, FieldSpec};

#[derive(Debug, Default, Clone, Copy)]
pub struct RowNormalizer;

impl RowNormalizer {
    /// 规范化单行
    ///
    /// # 参数
    /// - raw_row: 原始行（单元格与表头按位置对齐）
    /// - mapping: 列映射
    /// - schema: 字段模式
    /// - row_number: 原始行号（表头为第 1 行）
    pub fn normalize(
        &self,
        raw_row: &RawRow,
        mapping: &ColumnMapping,
        schema: &FieldSchema,
        row_number: usize,
    ) -> NormalizedRow {
        let mut row = NormalizedRow::new(row_number);
        for spec in &schema.fields {
            let value = Self::mapped_value(raw_row, mapping, &spec.name)
                .or_else(|| Self::scanned_value(raw_row, mapping, spec));
            row.set(&spec.name, value.map(str::to_string));
        }
        row
    }

    fn mapped_value<'r>(raw_row: &'r RawRow, mapping: &ColumnMapping, field: &str) -> Option<&'r str> {
        mapping
            .columns_for(field)
            .map(|idx| raw_row.cell(idx).trim())
            .find(|v| !v.is_empty())
    }

    fn scanned_value<'r>(
        raw_row: &'r RawRow,
        mapping: &ColumnMapping,
        spec: &FieldSpec,
    ) -> Option<&'r str> {
        mapping
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| spec.header_contains_synonym(&c.header.trim().to_lowercase()))
            .map(|(idx, _)| raw_row.cell(idx).trim())
            .find(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::ColumnAssignment;
    use crate::importer::header_classifier::HeaderClassifier;
    use crate::importer::schemas::assets_schema;

    fn mapping_for(headers: &[&str], schema: &FieldSchema) -> ColumnMapping {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        HeaderClassifier.classify(&headers, schema)
    }

    #[test]
    fn test_mapped_values_trimmed() {
        let schema = assets_schema();
        let mapping = mapping_for(&["Unidad", "Responsable", "Equipo"], &schema);
        let row = RowNormalizer.normalize(
            &RawRow::from_strs(&["  Almacén ", "Ana", " Laptop"]),
            &mapping,
            &schema,
            2,
        );

        assert_eq!(row.row_number, 2);
        assert_eq!(row.get("unidad"), Some("Almacén"));
        assert_eq!(row.get("responsable"), Some("Ana"));
        assert_eq!(row.get("equipo"), Some("Laptop"));
        assert!(!row.is_present("modelo"));
    }

    #[test]
    fn test_blank_and_short_rows_are_absent() {
        let schema = assets_schema();
        let mapping = mapping_for(&["Unidad", "Responsable", "Equipo"], &schema);
        let row = RowNormalizer.normalize(&RawRow::from_strs(&["   "]), &mapping, &schema, 3);
        assert!(row.values().is_empty());
    }

    #[test]
    fn test_secondary_scan_ignores_mapping() {
        let schema = assets_schema();
        // 第 0 列被人工取消映射，二次扫描仍能按表头找回
        let mapping = ColumnMapping::new(vec![
            ColumnAssignment { header: "Número de Serie".into(), field: None },
            ColumnAssignment { header: "Equipo".into(), field: Some("equipo".into()) },
        ]);
        let row = RowNormalizer.normalize(
            &RawRow::from_strs(&["SN-001", "Laptop"]),
            &mapping,
            &schema,
            2,
        );
        assert_eq!(row.get("numero_serie"), Some("SN-001"));
    }

    #[test]
    fn test_secondary_scan_never_overrides_mapped_value() {
        let schema = assets_schema();
        let mapping = ColumnMapping::new(vec![
            ColumnAssignment { header: "Serie antigua".into(), field: None },
            ColumnAssignment { header: "SN".into(), field: Some("numero_serie".into()) },
        ]);
        let row = RowNormalizer.normalize(
            &RawRow::from_strs(&["OLD-1", "NEW-1"]),
            &mapping,
            &schema,
            2,
        );
        assert_eq!(row.get("numero_serie"), Some("NEW-1"));

        // 映射列为空时回退到二次扫描
        let row = RowNormalizer.normalize(&RawRow::from_strs(&["OLD-1", " "]), &mapping, &schema, 3);
        assert_eq!(row.get("numero_serie"), Some("OLD-1"));
    }

    #[test]
    fn test_first_non_empty_mapped_column_wins() {
        let schema = assets_schema();
        let mapping = ColumnMapping::new(vec![
            ColumnAssignment { header: "A".into(), field: Some("equipo".into()) },
            ColumnAssignment { header: "B".into(), field: Some("equipo".into()) },
        ]);
        let row = RowNormalizer.normalize(&RawRow::from_strs(&["", "Monitor"]), &mapping, &schema, 2);
        assert_eq!(row.get("equipo"), Some("Monitor"));
    }
}
