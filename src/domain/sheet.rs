// ==========================================
// MCA 线索管理系统 - 表格行模型
// ==========================================
// 职责: 导入/导出两侧共用的行结构（与文件格式无关）
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// RawRow - 原始行
// ==========================================
// 列名 → 文本值，保持源文件列顺序；空白单元格为空字符串
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入单元格；同名列覆盖旧值并保留原位置
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(c, _)| c.as_str())
    }

    /// 所有单元格均为空白
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

// ==========================================
// ExportSheet - 导出表
// ==========================================
// headers 决定列顺序；行内缺失列按空白输出
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSheet {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl ExportSheet {
    /// 按表头顺序展开为二维文本网格（首行为表头）
    pub fn to_grid(&self) -> Vec<Vec<String>> {
        let mut grid = Vec::with_capacity(self.rows.len() + 1);
        grid.push(self.headers.clone());
        for row in &self.rows {
            grid.push(
                self.headers
                    .iter()
                    .map(|h| row.get(h).unwrap_or("").to_string())
                    .collect(),
            );
        }
        grid
    }
}

// ==========================================
// ImportSummary - 导入汇总
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub total_rows: usize,         // 解析出的数据行数
    pub imported_leads: usize,     // 归并后的线索数
    pub imported_directors: usize, // 董事子记录总数（含占位）
    pub skipped_rows: usize,       // 空白行 + 无法确定公司的行
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_row_preserves_column_order_and_overwrites() {
        let mut row = RawRow::new();
        row.insert("CIN", "A");
        row.insert("Company Name", "X");
        row.insert("CIN", "B");

        let columns: Vec<&str> = row.columns().collect();
        assert_eq!(columns, vec!["CIN", "Company Name"]);
        assert_eq!(row.get("CIN"), Some("B"));
    }

    #[test]
    fn test_raw_row_blank_detection() {
        let row: RawRow = vec![("CIN", ""), ("Company Name", "  ")].into_iter().collect();
        assert!(row.is_blank());

        let row: RawRow = vec![("CIN", ""), ("Notes", "x")].into_iter().collect();
        assert!(!row.is_blank());
    }

    #[test]
    fn test_export_sheet_grid_fills_missing_cells() {
        let sheet = ExportSheet {
            headers: vec!["A".to_string(), "B".to_string()],
            rows: vec![vec![("B", "2")].into_iter().collect()],
        };
        assert_eq!(
            sheet.to_grid(),
            vec![
                vec!["A".to_string(), "B".to_string()],
                vec!["".to_string(), "2".to_string()],
            ]
        );
    }
}
