// ==========================================
// 仓储资产导入引擎 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 输出: 表头（第 1 行）+ 数据行（文件顺序，跳过全空行，保留源文件行号）
// 空表头单元格替换为 "Columna N"（N 从 1 开始）
// ==========================================

use crate::domain::import::{ParsedSheet, RawRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_trait::FileParser;
use calamine::{open_workbook_auto, Reader};
use csv::{Position, ReaderBuilder};
use std::fs;
use std::path::Path;
use tracing::debug;

/// 组装表格：补齐空表头并跳过全空行
///
/// # 参数
/// - rows: (源文件行号, 单元格)，行号在过滤前确定
fn build_sheet<I>(header_cells: Vec<String>, rows: I) -> ParsedSheet
where
    I: IntoIterator<Item = (usize, Vec<String>)>,
{
    let headers = header_cells
        .into_iter()
        .enumerate()
        .map(|(idx, h)| {
            let h = h.trim().to_string();
            if h.is_empty() {
                format!("Columna {}", idx + 1)
            } else {
                h
            }
        })
        .collect();

    let rows = rows
        .into_iter()
        .map(|(row_number, cells)| RawRow::at_row(cells, row_number))
        .filter(|row| !row.is_blank())
        .collect();

    ParsedSheet::new(headers, rows)
}

/// 记录在 CSV 文件中的起始行号
///
/// csv 读取器会略过空行，记录位置停在被略过的空行之前，需补上这些换行
fn record_line(content: &[u8], pos: &Position) -> usize {
    let start = (pos.byte() as usize).min(content.len());
    let skipped = content[start..]
        .iter()
        .take_while(|b| matches!(b, b'\r' | b'\n'))
        .filter(|b| **b == b'\n')
        .count();
    pos.line() as usize + skipped
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ImportError::FileNotFound(path.display().to_string()))
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedSheet> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let content = fs::read(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(content.as_slice());

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() {
            return Err(ImportError::EmptySheet(file_path.display().to_string()));
        }

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let row_number = record
                .position()
                .map(|pos| record_line(&content, pos))
                .unwrap_or(idx + 2);
            rows.push((
                row_number,
                record.iter().map(|v| v.trim().to_string()).collect(),
            ));
        }

        let sheet = build_sheet(headers, rows);
        debug!(columns = sheet.headers.len(), rows = sheet.total_rows(), "CSV 解析完成");
        Ok(sheet)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
// 只读取第一个工作表
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedSheet> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;
        // range 从首个非空行开始，需加上起始偏移
        let header_row_number = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| ImportError::EmptySheet(file_path.display().to_string()))?;
        let headers: Vec<String> = header_row.iter().map(|cell| cell.to_string()).collect();

        let data_rows = rows.enumerate().map(|(idx, row)| {
            let cells = row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect::<Vec<_>>();
            (header_row_number + idx + 1, cells)
        });

        let sheet = build_sheet(headers, data_rows);
        debug!(
            sheet = %sheet_name,
            columns = sheet.headers.len(),
            rows = sheet.total_rows(),
            "Excel 解析完成"
        );
        Ok(sheet)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedSheet> {
        match extension_of(file_path).as_str() {
            "csv" => CsvParser.parse(file_path),
            "xlsx" | "xls" => ExcelParser.parse(file_path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}
