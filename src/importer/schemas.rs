// ==========================================
// 仓储资产导入引擎 - 内置字段模式
// ==========================================
// 职责: 电脑资产 / PDA / 平板 三套导入模式
// ==========================================
// 编写约定（列识别为双向子串匹配，首个匹配胜出）:
// 1. 具体字段排在通用字段之前（"modelo impresora" 先于 "modelo"）
// 2. 具体字段的同义词不得包含通用列的完整表头，
//    否则短表头会被反向匹配抢走（"impresora" ⊂ "modelo impresora"）。
//    因此 modelo_impresora 使用 "modelo imp" 这类截断写法。
// 3. 同理，modelo_pda 不使用含 "pda" 的同义词，避免吞掉 "PDA" 列。
// ==========================================

use crate::domain::schema::{FieldSchema, FieldSpec};
use crate::domain::types::EntityFamily;

/// 按实体族获取内置模式
pub fn builtin_schema(family: EntityFamily) -> FieldSchema {
    match family {
        EntityFamily::Activos => assets_schema(),
        EntityFamily::Pdas => pdas_schema(),
        EntityFamily::Tablets => tablets_schema(),
    }
}

/// 电脑资产：父实体为责任人（unidad + responsable），子实体为资产
pub fn assets_schema() -> FieldSchema {
    FieldSchema::new(EntityFamily::Activos, "responsable", "activo")
        .field(
            FieldSpec::new("unidad", &["unidad", "unit", "departamento", "depto"])
                .required()
                .carry()
                .parent_key(),
        )
        .field(
            FieldSpec::new("responsable", &["responsable", "nombre", "name", "persona"])
                .required()
                .carry()
                .parent_key(),
        )
        .field(
            FieldSpec::new(
                "cargo_area",
                &[
                    "cargo",
                    "área",
                    "area",
                    "cargo / área",
                    "cargo/área",
                    "cargo_area",
                    "puesto",
                    "position",
                ],
            )
            .carry()
            .parent_attribute(),
        )
        .field(FieldSpec::new(
            "numero_serie",
            &[
                "no. de serie",
                "numero de serie",
                "número de serie",
                "numero_serie",
                "número_serie",
                "serie",
                "serial",
                "serial number",
                "no serie",
                "no. serie",
            ],
        ))
        .field(
            FieldSpec::new(
                "equipo",
                &[
                    "equipo",
                    "tipo",
                    "tipo de equipo",
                    "tipo_equipo",
                    "tipo equipo",
                    "device",
                    "dispositivo",
                ],
            )
            .required(),
        )
        .field(FieldSpec::new(
            "modelo",
            &["modelo", "model", "marca_modelo", "marca modelo"],
        ))
}

/// PDA：父实体为区域 + 责任人，子实体为 PDA 设备
pub fn pdas_schema() -> FieldSchema {
    FieldSchema::new(EntityFamily::Pdas, "area", "pda")
        .field(FieldSpec::new(
            "modelo_impresora",
            &["modelo imp", "modelo_imp", "modelo comp", "model imp"],
        ))
        .field(FieldSpec::new("modelo_pda", &["modelo", "model"]))
        .field(FieldSpec::new("serie_pda", &["serie", "serial"]))
        .field(FieldSpec::new("imei", &["imei"]))
        .field(FieldSpec::new(
            "observaciones",
            &["observaciones", "observ", "notas", "comentarios"],
        ))
        .field(FieldSpec::new(
            "android",
            &["android", "versión android", "version android"],
        ))
        .field(FieldSpec::new("impresora", &["impresora", "complemento"]))
        .field(
            FieldSpec::new("pda", &["pda", "equipo", "equipo_pda", "dispositivo"]).required(),
        )
        .field(
            FieldSpec::new("area", &["area", "área", "unidad", "unit", "departamento"])
                .required()
                .carry()
                .parent_key(),
        )
        .field(
            FieldSpec::new("responsable", &["responsable", "nombre", "name", "persona"])
                .carry()
                .parent_key(),
        )
        .field(FieldSpec::new("encargado", &["encargado", "asignado a", "asignado"]).carry())
}

/// 平板：父实体为区域 + 责任人，子实体为平板设备
pub fn tablets_schema() -> FieldSchema {
    FieldSchema::new(EntityFamily::Tablets, "area", "tablet")
        .field(FieldSpec::new("modelo_tab", &["modelo", "model"]))
        .field(FieldSpec::new("imei", &["imei"]))
        .field(FieldSpec::new(
            "observaciones",
            &["observaciones", "observ", "notas", "comentarios"],
        ))
        .field(FieldSpec::new(
            "android",
            &["android", "versión android", "version android"],
        ))
        .field(FieldSpec::new("tab", &["tab", "tablet", "equipo", "dispositivo"]).required())
        .field(
            FieldSpec::new("area", &["area", "área", "unidad", "unit", "departamento"])
                .carry()
                .parent_key(),
        )
        .field(
            FieldSpec::new("responsable", &["responsable", "nombre", "name", "persona"])
                .carry()
                .parent_key(),
        )
        .field(FieldSpec::new("encargado", &["encargado", "asignado a", "asignado"]).carry())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::orchestrator::ensure_schema;

    #[test]
    fn test_builtin_schemas_are_well_formed() {
        for family in EntityFamily::ALL {
            let schema = builtin_schema(family);
            assert_eq!(schema.family, family);
            assert!(ensure_schema(&schema).is_ok(), "{} 模式无效", family);
        }
    }

    #[test]
    fn test_assets_parent_key() {
        let schema = assets_schema();
        let key: Vec<_> = schema.parent_key_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(key, vec!["unidad", "responsable"]);
        assert_eq!(schema.primary_identifier().unwrap().name, "equipo");
    }

    #[test]
    fn test_pda_identifier_and_carry_fields() {
        let schema = pdas_schema();
        let carry: Vec<_> = schema.carry_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(carry, vec!["area", "responsable", "encargado"]);
        assert_eq!(schema.primary_identifier().unwrap().name, "pda");
    }

    #[test]
    fn test_synonyms_are_lowercase() {
        for family in EntityFamily::ALL {
            for spec in builtin_schema(family).fields {
                for s in &spec.synonyms {
                    assert_eq!(s, &s.to_lowercase());
                }
            }
        }
    }
}
