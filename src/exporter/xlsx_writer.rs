// ==========================================
// MCA 线索管理系统 - 工作簿写出
// ==========================================
// 格式: 单工作表 .xlsx（OOXML = zip + SpreadsheetML，内联字符串）
// 规则: 先在内存中生成完整字节，再一次性写入；写入失败不留残缺文件
// ==========================================

use crate::domain::sheet::ExportSheet;
use crate::exporter::error::{ExportError, ExportResult};
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::{error, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// 导出工作表名
pub const EXPORT_SHEET_NAME: &str = "MCA Leads";
/// 模板工作表名
pub const TEMPLATE_SHEET_NAME: &str = "MCA Leads Template";

// Excel 工作表名上限
const MAX_SHEET_NAME_LEN: usize = 31;

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELATIONSHIP_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

// ==========================================
// XlsxWriter - 单工作表工作簿写出器
// ==========================================
#[derive(Debug, Clone)]
pub struct XlsxWriter {
    sheet_name: String,
}

impl XlsxWriter {
    pub fn new(sheet_name: &str) -> Self {
        Self {
            sheet_name: sanitize_sheet_name(sheet_name),
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// 生成完整的 .xlsx 字节
    pub fn to_bytes(&self, sheet: &ExportSheet) -> ExportResult<Vec<u8>> {
        self.grid_to_bytes(&sheet.to_grid())
    }

    /// 由二维文本网格生成 .xlsx 字节（网格首行写在第 1 行）
    fn grid_to_bytes(&self, grid: &[Vec<String>]) -> ExportResult<Vec<u8>> {
        let worksheet = worksheet_xml(grid)?;
        let workbook = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{}" xmlns:r="{}"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
            SPREADSHEET_NS,
            RELATIONSHIP_NS,
            escape(self.sheet_name.as_str())
        );

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts: [(&str, &[u8]); 5] = [
            ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
            ("_rels/.rels", ROOT_RELS_XML.as_bytes()),
            ("xl/workbook.xml", workbook.as_bytes()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.as_bytes()),
            ("xl/worksheets/sheet1.xml", worksheet.as_slice()),
        ];
        for (name, content) in parts {
            zip.start_file(name, options)?;
            zip.write_all(content)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    /// 写出到文件
    ///
    /// # 返回
    /// - Ok(usize): 写入字节数
    /// - Err: 生成或写入失败（已删除可能残留的部分文件）
    pub async fn write_file(&self, sheet: &ExportSheet, path: &Path) -> ExportResult<usize> {
        let bytes = self.to_bytes(sheet)?;

        if let Err(e) = tokio::fs::write(path, &bytes).await {
            error!(path = %path.display(), error = %e, "工作簿写入失败");
            tokio::fs::remove_file(path).await.ok();
            return Err(e.into());
        }

        info!(
            path = %path.display(),
            sheet = %self.sheet_name,
            rows = sheet.rows.len(),
            size = bytes.len(),
            "工作簿已写出"
        );
        Ok(bytes.len())
    }
}

// 工作表名不能包含 []:*?/\，且不超过 31 个字符
fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { ' ' } else { c })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "Sheet1".to_string()
    } else {
        trimmed.to_string()
    }
}

/// 列序号（0 起）→ Excel 列名（A, B, ..., Z, AA, ...）
pub fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8_lossy(&name).to_string()
}

// 去除 XML 1.0 不允许的控制字符
fn xml_safe(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

// ==========================================
// SheetXml - 工作表 XML 事件写入
// ==========================================
struct SheetXml {
    writer: Writer<Vec<u8>>,
}

impl SheetXml {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn event(&mut self, event: Event<'_>) -> ExportResult<()> {
        self.writer
            .write_event(event)
            .map_err(|e| ExportError::XmlError(e.to_string()))
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> ExportResult<()> {
        let element = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.event(Event::Start(element))
    }

    fn end(&mut self, name: &str) -> ExportResult<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, value: &str) -> ExportResult<()> {
        self.event(Event::Text(BytesText::new(value)))
    }

    fn into_bytes(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

fn worksheet_xml(grid: &[Vec<String>]) -> ExportResult<Vec<u8>> {
    let mut xml = SheetXml::new();
    xml.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    xml.start(
        "worksheet",
        &[("xmlns", SPREADSHEET_NS), ("xmlns:r", RELATIONSHIP_NS)],
    )?;
    xml.start("sheetData", &[])?;

    for (row_idx, cells) in grid.iter().enumerate() {
        let row_ref = (row_idx + 1).to_string();
        xml.start("row", &[("r", row_ref.as_str())])?;
        for (col_idx, value) in cells.iter().enumerate() {
            // 空白单元格不写出
            if value.is_empty() {
                continue;
            }
            let cell_ref = format!("{}{}", column_name(col_idx), row_ref);
            xml.start("c", &[("r", cell_ref.as_str()), ("t", "inlineStr")])?;
            xml.start("is", &[])?;
            xml.start("t", &[("xml:space", "preserve")])?;
            xml.text(&xml_safe(value))?;
            xml.end("t")?;
            xml.end("is")?;
            xml.end("c")?;
        }
        xml.end("row")?;
    }

    xml.end("sheetData")?;
    xml.end("worksheet")?;
    Ok(xml.into_bytes())
}
