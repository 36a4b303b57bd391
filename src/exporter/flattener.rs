// ==========================================
// MCA 线索管理系统 - 实体展开器
// ==========================================
// 职责: 线索 → 表格行（每位董事一行，主体字段在各行重复）
// 列: 导出可见字段的 exportHeader（注册表顺序）+ Created Date
// ==========================================

use crate::domain::field::{FieldRegistry, ASSIGNED_TO_KEY, CREATED_DATE_HEADER};
use crate::domain::lead::{Director, Lead};
use crate::domain::sheet::{ExportSheet, RawRow};
use std::collections::HashMap;
use tracing::warn;

/// 负责人无法解析时的显示名
pub const UNASSIGNED_LABEL: &str = "Unassigned";

// ==========================================
// AssigneeNameLookup - 负责人显示名查询
// ==========================================
pub trait AssigneeNameLookup {
    /// 用户 ID → 显示名；None 表示用户不存在
    fn display_name(&self, user_id: &str) -> Option<String>;
}

impl AssigneeNameLookup for HashMap<String, String> {
    fn display_name(&self, user_id: &str) -> Option<String> {
        self.get(user_id).cloned()
    }
}

// ==========================================
// EntityFlattener - 实体展开器
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct EntityFlattener {
    include_created_date: bool,
}

impl Default for EntityFlattener {
    fn default() -> Self {
        Self {
            include_created_date: true,
        }
    }
}

impl EntityFlattener {
    pub fn new() -> Self {
        Self::default()
    }

    /// 不追加 Created Date 列（模板导出）
    pub fn without_created_date(mut self) -> Self {
        self.include_created_date = false;
        self
    }

    /// 导出表头（重复的 exportHeader 只保留首次出现的位置）
    pub fn headers(&self, registry: &FieldRegistry) -> Vec<String> {
        let mut headers: Vec<String> = Vec::new();
        let fixed = self
            .include_created_date
            .then_some(CREATED_DATE_HEADER);
        for header in registry
            .export_fields()
            .map(|f| f.export_header.as_str())
            .chain(fixed)
        {
            if !headers.iter().any(|h| h == header) {
                headers.push(header.to_string());
            }
        }
        headers
    }

    /// 展开全部线索
    pub fn flatten(
        &self,
        leads: &[Lead],
        registry: &FieldRegistry,
        lookup: &dyn AssigneeNameLookup,
    ) -> ExportSheet {
        let duplicates = registry.duplicate_export_headers();
        if !duplicates.is_empty() {
            warn!(?duplicates, "导出列名重复，后写入的字段覆盖先写入的字段");
        }

        let rows = leads
            .iter()
            .flat_map(|lead| self.flatten_lead(lead, registry, lookup))
            .collect();

        ExportSheet {
            headers: self.headers(registry),
            rows,
        }
    }

    /// 展开单条线索；无董事时输出一行，董事列为空
    pub fn flatten_lead(
        &self,
        lead: &Lead,
        registry: &FieldRegistry,
        lookup: &dyn AssigneeNameLookup,
    ) -> Vec<RawRow> {
        if lead.directors().is_empty() {
            return vec![self.build_row(lead, None, registry, lookup)];
        }

        lead.directors()
            .iter()
            .map(|director| self.build_row(lead, Some(director), registry, lookup))
            .collect()
    }

    fn build_row(
        &self,
        lead: &Lead,
        director: Option<&Director>,
        registry: &FieldRegistry,
        lookup: &dyn AssigneeNameLookup,
    ) -> RawRow {
        let mut row = RawRow::new();
        for field in registry.export_fields() {
            let value = match field.director_field() {
                Some(director_field) => director
                    .map(|d| d.get(director_field).to_string())
                    .unwrap_or_default(),
                None if field.key == ASSIGNED_TO_KEY => lookup
                    .display_name(&lead.assigned_to)
                    .unwrap_or_else(|| UNASSIGNED_LABEL.to_string()),
                None => lead.field_value(&field.key),
            };
            row.insert(field.export_header.as_str(), value);
        }

        if self.include_created_date {
            row.insert(
                CREATED_DATE_HEADER,
                lead.created_at.format("%Y-%m-%d").to_string(),
            );
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::field::FieldDescriptor;
    use crate::domain::types::{FieldDataType, LeadStatus};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_lead() -> Lead {
        let mut lead = Lead::new("lead-1".to_string(), date(2025, 9, 1), date(2025, 9, 8), "2".to_string());
        lead.set_core_value("cin", "C1");
        lead.set_core_value("companyName", "ABC Enterprises");
        lead.status = LeadStatus::Warm;
        for (first, last) in [("Rajesh", "Kumar"), ("Sunita", "Sharma")] {
            lead.add_director(Director {
                first_name: first.to_string(),
                last_name: last.to_string(),
                ..Director::default()
            });
        }
        lead
    }

    fn users() -> HashMap<String, String> {
        HashMap::from([("2".to_string(), "Sales Rep".to_string())])
    }

    #[test]
    fn test_one_row_per_director_with_core_fields_repeated() {
        let registry = FieldRegistry::default();
        let sheet = EntityFlattener::new().flatten(&[sample_lead()], &registry, &users());

        assert_eq!(sheet.rows.len(), 2);
        for row in &sheet.rows {
            assert_eq!(row.get("CIN"), Some("C1"));
            assert_eq!(row.get("Company Name"), Some("ABC Enterprises"));
            assert_eq!(row.get("Status"), Some("Warm"));
            assert_eq!(row.get("Follow-up Date"), Some("2025-09-08"));
            assert_eq!(row.get("Assigned To"), Some("Sales Rep"));
            assert_eq!(row.get("Created Date"), Some("2025-09-01"));
        }
        assert_eq!(sheet.rows[0].get("F Name"), Some("Rajesh"));
        assert_eq!(sheet.rows[1].get("L Name"), Some("Sharma"));
    }

    #[test]
    fn test_headers_follow_registry_and_append_created_date() {
        let registry = FieldRegistry::default();
        let headers = EntityFlattener::new().headers(&registry);
        assert_eq!(headers.len(), 17);
        assert_eq!(headers[0], "CIN");
        assert_eq!(headers[15], "Assigned To");
        assert_eq!(headers[16], "Created Date");

        let headers = EntityFlattener::new().without_created_date().headers(&registry);
        assert!(!headers.contains(&"Created Date".to_string()));
    }

    #[test]
    fn test_unknown_assignee_is_unassigned() {
        let registry = FieldRegistry::default();
        let nobody: HashMap<String, String> = HashMap::new();
        let sheet = EntityFlattener::new().flatten(&[sample_lead()], &registry, &nobody);
        assert_eq!(sheet.rows[0].get("Assigned To"), Some(UNASSIGNED_LABEL));
    }

    #[test]
    fn test_lead_without_directors_emits_single_row() {
        let registry = FieldRegistry::default();
        let mut lead = Lead::new("lead-2".to_string(), date(2025, 9, 1), date(2025, 9, 8), "2".to_string());
        lead.set_core_value("companyName", "No Directors Ltd");

        let rows = EntityFlattener::new().flatten_lead(&lead, &registry, &users());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Company Name"), Some("No Directors Ltd"));
        assert_eq!(rows[0].get("F Name"), Some(""));
        assert_eq!(rows[0].get("DIN"), Some(""));
    }

    #[test]
    fn test_hidden_fields_not_exported() {
        let fields = FieldRegistry::default()
            .fields()
            .iter()
            .cloned()
            .map(|f| if f.key == "notes" { f.hidden_in_export() } else { f })
            .collect();
        let registry = FieldRegistry::new(fields).unwrap();
        let sheet = EntityFlattener::new().flatten(&[sample_lead()], &registry, &users());
        assert!(!sheet.headers.contains(&"Notes".to_string()));
        assert_eq!(sheet.rows[0].get("Notes"), None);
    }

    #[test]
    fn test_duplicate_export_header_last_write_wins() {
        let mut fields = FieldRegistry::default().fields().to_vec();
        fields.push(
            FieldDescriptor::new("website", "Website", FieldDataType::Text)
                .with_export_header("CIN"),
        );
        let registry = FieldRegistry::new(fields).unwrap();
        let mut lead = sample_lead();
        lead.set_core_value("website", "abc.example");

        let sheet = EntityFlattener::new().flatten(&[lead], &registry, &users());
        assert_eq!(sheet.headers.iter().filter(|h| *h == "CIN").count(), 1);
        assert_eq!(sheet.rows[0].get("CIN"), Some("abc.example"));
    }
}
