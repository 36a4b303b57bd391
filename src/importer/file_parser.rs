// ==========================================
// MCA 线索管理系统 - 文件解析器实现
// ==========================================
// 阶段 0: 文件字节 → 原始行（RawRow）
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 说明: 空白行原样保留，由归并引擎计入跳过数
// ==========================================

use crate::domain::sheet::RawRow;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::lead_importer_trait::FileParser;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{Duration, NaiveDate};
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;

// ==========================================
// SourceFormat - 源文件格式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
    Xls,
}

impl SourceFormat {
    /// 按扩展名识别格式（大小写不敏感）；其他扩展名在解析前拒绝
    pub fn from_path(path: &Path) -> ImportResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "xlsx" => Ok(SourceFormat::Xlsx),
            "xls" => Ok(SourceFormat::Xls),
            _ => Err(ImportError::UnsupportedFormat(if ext.is_empty() {
                path.display().to_string()
            } else {
                ext
            })),
        }
    }

    /// 对应的解析器
    pub fn parser(&self) -> Box<dyn FileParser> {
        match self {
            SourceFormat::Csv => Box::new(CsvParser),
            SourceFormat::Xlsx | SourceFormat::Xls => Box::new(ExcelParser),
        }
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
// 首行为表头；逗号分隔；引号由 csv 读取器剥离一层
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_rows(&self, bytes: &[u8]) -> ImportResult<Vec<RawRow>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        // 读取表头（去除 BOM 与首尾空白）
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row = RawRow::new();
            for (col_idx, header) in headers.iter().enumerate() {
                if header.is_empty() {
                    continue;
                }
                // 缺失的尾部单元格按空白处理
                let value = record.get(col_idx).unwrap_or("").trim();
                row.insert(header.as_str(), value);
            }
            rows.push(row);
        }

        Ok(rows)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
// 仅读取第一个工作表；表头为第一个非空行
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_raw_rows(&self, bytes: &[u8]) -> ImportResult<Vec<RawRow>> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or(ImportError::EmptyWorkbook)?;

        let range = workbook.worksheet_range(&sheet_name)?;

        let mut data_rows = range
            .rows()
            .skip_while(|cells| cells.iter().all(|c| cell_to_string(c).is_empty()));

        let headers: Vec<String> = match data_rows.next() {
            Some(header_row) => header_row.iter().map(cell_to_string).collect(),
            None => return Ok(Vec::new()),
        };

        let mut rows = Vec::new();
        for cells in data_rows {
            let mut row = RawRow::new();
            for (col_idx, header) in headers.iter().enumerate() {
                if header.is_empty() {
                    continue;
                }
                let value = cells.get(col_idx).map(cell_to_string).unwrap_or_default();
                row.insert(header.as_str(), value);
            }
            rows.push(row);
        }

        Ok(rows)
    }
}

/// 单元格 → 文本（日期单元格转 ISO 日期，错误单元格视为空白）
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => format!("{}", f),
        Data::Bool(b) => b.to_string(),
        Data::Error(_) => String::new(),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            excel_serial_to_iso(serial).unwrap_or_else(|| serial.to_string())
        }
        Data::DateTimeIso(s) => s.trim().to_string(),
        Data::DurationIso(s) => s.trim().to_string(),
    }
}

/// Excel 序列日期 → ISO 日期（1900 日期系统，基准 1899-12-30）
fn excel_serial_to_iso(serial: f64) -> Option<String> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    Duration::try_days(serial.floor() as i64)
        .and_then(|offset| base.checked_add_signed(offset))
        .map(|d| d.format("%Y-%m-%d").to_string())
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse(&self, file_name: &Path, bytes: &[u8]) -> ImportResult<Vec<RawRow>> {
        SourceFormat::from_path(file_name)?
            .parser()
            .parse_to_raw_rows(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_format_by_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("leads.CSV")).unwrap(),
            SourceFormat::Csv
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("leads.xlsx")).unwrap(),
            SourceFormat::Xlsx
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("legacy.xls")).unwrap(),
            SourceFormat::Xls
        );
        assert!(matches!(
            SourceFormat::from_path(Path::new("leads.pdf")),
            Err(ImportError::UnsupportedFormat(ext)) if ext == "pdf"
        ));
        assert!(matches!(
            SourceFormat::from_path(Path::new("leads")),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_csv_parser_basic() {
        let data = "CIN,Company Name,F Name\nC1,ABC Enterprises,Rajesh\n,,Sunita\n";
        let rows = CsvParser.parse_to_raw_rows(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("CIN"), Some("C1"));
        assert_eq!(rows[0].get("Company Name"), Some("ABC Enterprises"));
        assert_eq!(rows[1].get("CIN"), Some(""));
        assert_eq!(rows[1].get("F Name"), Some("Sunita"));
    }

    #[test]
    fn test_csv_parser_strips_quotes_and_keeps_commas() {
        let data = "\"Company Name\",\"Registered Address\"\n\"ABC\",\"Plot 123, Sector 18, Noida\"\n";
        let rows = CsvParser.parse_to_raw_rows(data.as_bytes()).unwrap();

        assert_eq!(rows[0].get("Company Name"), Some("ABC"));
        assert_eq!(
            rows[0].get("Registered Address"),
            Some("Plot 123, Sector 18, Noida")
        );
    }

    #[test]
    fn test_csv_parser_short_rows_and_blank_rows() {
        let data = "CIN,Company Name,Notes\nC1\n,,\n";
        let rows = CsvParser.parse_to_raw_rows(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Notes"), Some(""));
        assert!(rows[1].is_blank());
    }

    #[test]
    fn test_csv_parser_bom_and_whitespace_headers() {
        let data = "\u{feff} CIN , Company Name \nC1,ABC\n";
        let rows = CsvParser.parse_to_raw_rows(data.as_bytes()).unwrap();
        assert_eq!(rows[0].get("CIN"), Some("C1"));
        assert_eq!(rows[0].get("Company Name"), Some("ABC"));
    }

    #[test]
    fn test_csv_parser_empty_input() {
        let rows = CsvParser.parse_to_raw_rows(b"").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_excel_parser_rejects_garbage() {
        let result = ExcelParser.parse_to_raw_rows(b"definitely not a workbook");
        assert!(matches!(result, Err(ImportError::ExcelParseError(_))));
    }

    #[test]
    fn test_cell_to_string_variants() {
        assert_eq!(cell_to_string(&Data::Float(9876543210.0)), "9876543210");
        assert_eq!(cell_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&Data::Int(42)), "42");
        assert_eq!(cell_to_string(&Data::String("  x ".to_string())), "x");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn test_excel_serial_to_iso() {
        // 45427 = 2024-05-15
        assert_eq!(excel_serial_to_iso(45427.0), Some("2024-05-15".to_string()));
        assert_eq!(excel_serial_to_iso(45427.75), Some("2024-05-15".to_string()));
        assert_eq!(excel_serial_to_iso(0.5), None);
    }

    #[test]
    fn test_excel_serial_out_of_range_keeps_raw_value() {
        assert_eq!(excel_serial_to_iso(1.0e20), None);
        assert_eq!(excel_serial_to_iso(f64::MAX), None);
        assert_eq!(excel_serial_to_iso(1.0e9), None);
    }

    #[test]
    fn test_universal_parser_dispatch() {
        let rows = UniversalFileParser
            .parse(Path::new("upload.csv"), b"CIN\nC1\n")
            .unwrap();
        assert_eq!(rows.len(), 1);

        let result = UniversalFileParser.parse(Path::new("upload.txt"), b"CIN\nC1\n");
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }
}
