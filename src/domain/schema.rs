// ==========================================
// 仓储资产导入引擎 - 字段模式 (FieldSchema)
// ==========================================
// 职责: 规范字段定义（同义词/必填/上下文延续/父实体键）
// 约束: 每个实体族一套模式，导入过程中不可变
// ==========================================
// 编写约定: 字段按“先具体、后通用”的顺序声明。
// 列识别采用“首个匹配字段胜出”，例如 "modelo impresora"
// 必须排在 "modelo" 之前，否则通用同义词会抢走该列。
// ==========================================

use crate::domain::types::EntityFamily;
use serde::{Deserialize, Serialize};

// ==========================================
// FieldSpec - 单个规范字段
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,          // 规范字段名（如 responsable）
    pub synonyms: Vec<String>, // 同义词（小写，用于模糊匹配表头）
    #[serde(default)]
    pub required: bool, // 是否必填
    #[serde(default)]
    pub carries_forward: bool, // 是否参与上下文延续
    #[serde(default)]
    pub parent_key: bool, // 是否为父实体复合键组成部分
    #[serde(default)]
    pub parent_attribute: bool, // 写入父实体但不参与复合键
}

impl FieldSpec {
    /// 创建字段定义（同义词统一转小写并去空白）
    pub fn new(name: &str, synonyms: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            synonyms: synonyms.iter().map(|s| s.trim().to_lowercase()).collect(),
            required: false,
            carries_forward: false,
            parent_key: false,
            parent_attribute: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn carry(mut self) -> Self {
        self.carries_forward = true;
        self
    }

    pub fn parent_key(mut self) -> Self {
        self.parent_key = true;
        self
    }

    pub fn parent_attribute(mut self) -> Self {
        self.parent_attribute = true;
        self
    }

    /// 是否为标识字段（必填且不参与上下文延续，如设备名）
    pub fn is_identifying(&self) -> bool {
        self.required && !self.carries_forward
    }

    /// 是否写入父实体
    pub fn belongs_to_parent(&self) -> bool {
        self.parent_key || self.parent_attribute
    }

    /// 双向子串匹配（列识别使用）
    ///
    /// 表头包含同义词，或同义词包含表头，均视为匹配。
    /// `header_lower` 须已小写并去空白。
    pub fn matches_header(&self, header_lower: &str) -> bool {
        self.synonyms
            .iter()
            .filter(|s| !s.is_empty())
            .any(|s| header_lower.contains(s.as_str()) || s.contains(header_lower))
    }

    /// 单向匹配：表头包含任一同义词（二次扫描使用）
    pub fn header_contains_synonym(&self, header_lower: &str) -> bool {
        self.synonyms
            .iter()
            .any(|s| !s.is_empty() && header_lower.contains(s.as_str()))
    }
}

// ==========================================
// FieldSchema - 实体族字段模式
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub family: EntityFamily,
    pub parent_label: String, // 父实体显示名（如 "responsable"）
    pub child_label: String,  // 子实体显示名（如 "activo"）
    pub fields: Vec<FieldSpec>,
}

impl FieldSchema {
    pub fn new(family: EntityFamily, parent_label: &str, child_label: &str) -> Self {
        Self {
            family,
            parent_label: parent_label.to_string(),
            child_label: child_label.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// 规范化同义词（配置覆写反序列化后调用）
    pub fn normalized(mut self) -> Self {
        for spec in &mut self.fields {
            spec.name = spec.name.trim().to_string();
            spec.synonyms = spec
                .synonyms
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 复合键字段（按声明顺序）
    pub fn parent_key_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.parent_key)
    }

    /// 写入父实体的字段（复合键 + 父属性）
    pub fn parent_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.belongs_to_parent())
    }

    /// 写入子实体的字段
    pub fn child_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| !f.belongs_to_parent())
    }

    pub fn carry_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.carries_forward)
    }

    pub fn identifying_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_identifying())
    }

    /// 首个标识字段（用于错误信息中的诊断值）
    pub fn primary_identifier(&self) -> Option<&FieldSpec> {
        self.identifying_fields().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> FieldSchema {
        FieldSchema::new(EntityFamily::Activos, "responsable", "activo")
            .field(FieldSpec::new("unidad", &["Unidad", "unit"]).required().carry().parent_key())
            .field(FieldSpec::new("cargo_area", &["cargo"]).carry().parent_attribute())
            .field(FieldSpec::new("equipo", &["equipo"]).required())
            .field(FieldSpec::new("modelo", &["modelo"]))
    }

    #[test]
    fn test_synonyms_lowercased() {
        let schema = sample_schema();
        assert_eq!(schema.get("unidad").unwrap().synonyms, vec!["unidad", "unit"]);
    }

    #[test]
    fn test_field_partitions() {
        let schema = sample_schema();
        let parent: Vec<_> = schema.parent_fields().map(|f| f.name.as_str()).collect();
        let child: Vec<_> = schema.child_fields().map(|f| f.name.as_str()).collect();
        let key: Vec<_> = schema.parent_key_fields().map(|f| f.name.as_str()).collect();

        assert_eq!(parent, vec!["unidad", "cargo_area"]);
        assert_eq!(child, vec!["equipo", "modelo"]);
        assert_eq!(key, vec!["unidad"]);
        assert_eq!(schema.primary_identifier().unwrap().name, "equipo");
    }

    #[test]
    fn test_matches_header_bidirectional() {
        let spec = FieldSpec::new("numero_serie", &["serie"]);
        assert!(spec.matches_header("no. de serie"));
        assert!(spec.matches_header("ser"));
        assert!(!spec.matches_header("modelo"));
    }

    #[test]
    fn test_header_contains_synonym_one_way() {
        let spec = FieldSpec::new("numero_serie", &["serie"]);
        assert!(spec.header_contains_synonym("no. de serie"));
        assert!(!spec.header_contains_synonym("ser"));
    }

    #[test]
    fn test_normalized_after_deserialize() {
        let json = r#"{
            "family": "pdas",
            "parent_label": "area",
            "child_label": "pda",
            "fields": [
                {"name": " pda ", "synonyms": [" PDA ", ""], "required": true}
            ]
        }"#;
        let schema: FieldSchema = serde_json::from_str::<FieldSchema>(json).unwrap().normalized();
        let pda = schema.get("pda").unwrap();
        assert_eq!(pda.synonyms, vec!["pda"]);
        assert!(pda.required);
        assert!(!pda.carries_forward);
    }
}
