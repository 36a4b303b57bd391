// ==========================================
// MCA 线索管理系统 - 行归并引擎
// ==========================================
// 职责: 原始行序列 → 线索列表（一家公司多行董事归并为一条线索）
// 公司键: CIN → 公司名 → 沿用上一条带公司信息的行
// 红线: 沿用规则是有状态的左折叠，不能改写成逐行独立的映射
// ==========================================

use crate::domain::field::{
    DirectorField, FieldDescriptor, FieldRegistry, ASSIGNED_TO_KEY, CIN_KEY, COMPANY_NAME_KEY,
    FOLLOW_UP_DATE_KEY, STATUS_KEY,
};
use crate::domain::lead::{Director, Lead};
use crate::domain::sheet::{ImportSummary, RawRow};
use crate::domain::types::{FieldDataType, LeadStatus};
use crate::importer::date_normalizer::DateNormalizer;
use crate::importer::header_resolver::HeaderResolver;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// 跟进日期缺失时的默认偏移天数
pub const DEFAULT_FOLLOW_UP_OFFSET_DAYS: i64 = 7;

// ==========================================
// GroupingOptions - 归并参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupingOptions {
    pub default_assignee: String, // 新线索负责人
    pub today: NaiveDate,         // 导入日期（createdAt / 默认跟进日期基准）
    pub follow_up_offset_days: i64,
}

impl GroupingOptions {
    pub fn new(default_assignee: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            default_assignee: default_assignee.into(),
            today,
            follow_up_offset_days: DEFAULT_FOLLOW_UP_OFFSET_DAYS,
        }
    }

    pub fn with_follow_up_offset_days(mut self, days: i64) -> Self {
        self.follow_up_offset_days = days;
        self
    }

    fn default_follow_up_date(&self) -> NaiveDate {
        Duration::try_days(self.follow_up_offset_days)
            .and_then(|offset| self.today.checked_add_signed(offset))
            .unwrap_or(self.today)
    }
}

// ==========================================
// GroupingOutcome - 归并结果
// ==========================================
#[derive(Debug, Clone)]
pub struct GroupingOutcome {
    pub leads: Vec<Lead>, // 按首次出现顺序
    pub total_rows: usize,
    pub skipped_rows: usize,
}

impl GroupingOutcome {
    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            total_rows: self.total_rows,
            imported_leads: self.leads.len(),
            imported_directors: self.leads.iter().map(|l| l.directors().len()).sum(),
            skipped_rows: self.skipped_rows,
        }
    }
}

// ==========================================
// GroupingAccumulator - 折叠累加器
// ==========================================
// index_by_key: 公司键 → leads 下标（leads 保持首次出现顺序）
// last_key: 最近一次由 CIN/公司名确立的公司键
#[derive(Debug, Default)]
pub struct GroupingAccumulator {
    index_by_key: HashMap<String, usize>,
    leads: Vec<Lead>,
    last_key: Option<String>,
    rows_seen: usize,
    skipped_rows: usize,
}

impl GroupingAccumulator {
    pub fn last_key(&self) -> Option<&str> {
        self.last_key.as_deref()
    }

    pub fn lead_count(&self) -> usize {
        self.leads.len()
    }

    fn skip(mut self) -> Self {
        self.skipped_rows += 1;
        self
    }
}

// 单个字段的预解析候选列名
struct ResolvedField<'r> {
    descriptor: &'r FieldDescriptor,
    candidates: Vec<String>,
}

// ==========================================
// RowGroupingEngine - 行归并引擎
// ==========================================
// 每次导入基于一份注册表快照构建，候选列名只计算一次
pub struct RowGroupingEngine<'r> {
    options: GroupingOptions,
    identifier_candidates: Vec<String>,
    company_name_candidates: Vec<String>,
    core_fields: Vec<ResolvedField<'r>>,
    director_fields: Vec<(DirectorField, Vec<String>)>,
}

impl<'r> RowGroupingEngine<'r> {
    pub fn new(registry: &'r FieldRegistry, options: GroupingOptions) -> Self {
        let resolver = HeaderResolver;
        let candidates_for = |key: &str| match registry.get(key) {
            Some(descriptor) => resolver.resolve(descriptor),
            // 注册表中被移除的字段仍按键名与同义列名识别
            None => resolver.resolve(&FieldDescriptor::new(key, key, FieldDataType::Text)),
        };

        let core_fields = registry
            .core_fields()
            .filter(|d| d.key != ASSIGNED_TO_KEY)
            .map(|descriptor| ResolvedField {
                descriptor,
                candidates: resolver.resolve(descriptor),
            })
            .collect();

        let director_fields = DirectorField::ALL
            .into_iter()
            .map(|field| (field, candidates_for(field.key())))
            .collect();

        Self {
            identifier_candidates: candidates_for(CIN_KEY),
            company_name_candidates: candidates_for(COMPANY_NAME_KEY),
            core_fields,
            director_fields,
            options,
        }
    }

    /// 归并全部行
    pub fn group(&self, rows: &[RawRow]) -> GroupingOutcome {
        let acc = rows
            .iter()
            .fold(GroupingAccumulator::default(), |acc, row| self.step(acc, row));
        self.finish(acc)
    }

    /// 折叠一步: 处理一行并返回新的累加器
    pub fn step(&self, mut acc: GroupingAccumulator, row: &RawRow) -> GroupingAccumulator {
        acc.rows_seen += 1;
        // 表头占第 1 行
        let row_number = acc.rows_seen + 1;

        if row.is_blank() {
            debug!(row_number, "空白行，跳过");
            return acc.skip();
        }

        let resolver = HeaderResolver;
        let identifier = resolver.match_value(row, &self.identifier_candidates);
        let company_name = resolver.match_value(row, &self.company_name_candidates);

        let explicit_key = if !identifier.is_empty() {
            Some(identifier)
        } else if !company_name.is_empty() {
            Some(company_name)
        } else {
            None
        };

        let key = match explicit_key {
            Some(key) => {
                acc.last_key = Some(key.clone());
                key
            }
            None => match acc.last_key.clone() {
                Some(carried) => carried,
                None => {
                    debug!(row_number, "无法确定公司（无 CIN/公司名且无可沿用的公司），跳过");
                    return acc.skip();
                }
            },
        };

        let pos = match acc.index_by_key.get(&key) {
            Some(&pos) => pos,
            None => {
                let lead = self.create_lead(row);
                acc.leads.push(lead);
                let pos = acc.leads.len() - 1;
                acc.index_by_key.insert(key, pos);
                pos
            }
        };

        if let Some(director) = self.extract_director(row) {
            acc.leads[pos].add_director(director);
        }

        acc
    }

    /// 收尾: 为无董事线索补占位董事
    pub fn finish(&self, acc: GroupingAccumulator) -> GroupingOutcome {
        let mut leads = acc.leads;
        for lead in leads.iter_mut() {
            lead.ensure_director();
        }

        GroupingOutcome {
            leads,
            total_rows: acc.rows_seen,
            skipped_rows: acc.skipped_rows,
        }
    }

    // 用公司首行创建线索主体
    fn create_lead(&self, row: &RawRow) -> Lead {
        let resolver = HeaderResolver;
        let normalizer = DateNormalizer;

        let mut lead = Lead::new(
            Uuid::new_v4().to_string(),
            self.options.today,
            self.options.default_follow_up_date(),
            self.options.default_assignee.clone(),
        );

        for field in &self.core_fields {
            let value = resolver.match_value(row, &field.candidates);
            match field.descriptor.key.as_str() {
                STATUS_KEY => lead.status = LeadStatus::parse_or_cold(&value),
                FOLLOW_UP_DATE_KEY => {
                    if let Some(date) = normalizer.parse(&value) {
                        lead.follow_up_date = date;
                    }
                }
                key => {
                    let value = match field.descriptor.data_type {
                        FieldDataType::Date => normalizer.normalize(&value),
                        _ => value,
                    };
                    lead.set_core_value(key, &value);
                }
            }
        }

        lead
    }

    // 提取董事信息；姓名与联系方式全空时不生成董事
    fn extract_director(&self, row: &RawRow) -> Option<Director> {
        let resolver = HeaderResolver;
        let mut director = Director::default();
        for (field, candidates) in &self.director_fields {
            director.set(*field, resolver.match_value(row, candidates));
        }
        director.has_contact().then_some(director)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
    }

    fn row(cells: &[(&str, &str)]) -> RawRow {
        cells.iter().copied().collect()
    }

    fn group(rows: &[RawRow]) -> GroupingOutcome {
        let registry = FieldRegistry::default();
        RowGroupingEngine::new(&registry, GroupingOptions::new("7", today())).group(rows)
    }

    #[test]
    fn test_carry_forward_attaches_to_previous_company() {
        let rows = vec![
            row(&[("cin", "A"), ("name", "X")]),
            row(&[("firstName", "Bob")]),
        ];
        let outcome = group(&rows);

        assert_eq!(outcome.leads.len(), 1);
        let lead = &outcome.leads[0];
        assert_eq!(lead.cin(), "A");
        assert_eq!(lead.company_name(), "X");
        // 第一行无董事信息，第二行沿用公司 A
        assert_eq!(lead.directors().len(), 1);
        assert_eq!(lead.directors()[0].first_name, "Bob");
        assert_eq!(lead.directors()[0].last_name, "");
    }

    #[test]
    fn test_carry_forward_with_director_on_first_row() {
        let rows = vec![
            row(&[("CIN", "A"), ("Company Name", "X"), ("F Name", "Alice")]),
            row(&[("F Name", "Bob")]),
        ];
        let outcome = group(&rows);

        assert_eq!(outcome.leads.len(), 1);
        let names: Vec<&str> = outcome.leads[0]
            .directors()
            .iter()
            .map(|d| d.first_name.as_str())
            .collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
        assert_eq!(outcome.skipped_rows, 0);
    }

    #[test]
    fn test_repeated_cin_merges_directors_in_order() {
        let rows = vec![
            row(&[("CIN", "C1"), ("Company Name", "ABC"), ("F Name", "Rajesh")]),
            row(&[("CIN", "C2"), ("Company Name", "XYZ"), ("F Name", "Priya")]),
            row(&[("CIN", "C1"), ("Company Name", "ABC"), ("F Name", "Sunita")]),
        ];
        let outcome = group(&rows);

        assert_eq!(outcome.leads.len(), 2);
        assert_eq!(outcome.leads[0].cin(), "C1");
        assert_eq!(outcome.leads[1].cin(), "C2");
        let names: Vec<&str> = outcome.leads[0]
            .directors()
            .iter()
            .map(|d| d.first_name.as_str())
            .collect();
        assert_eq!(names, vec!["Rajesh", "Sunita"]);

        let lead_id = &outcome.leads[0].id;
        assert_eq!(outcome.leads[0].directors()[1].id, format!("{}-dir-2", lead_id));
    }

    #[test]
    fn test_company_name_used_when_cin_missing() {
        let rows = vec![
            row(&[("Company Name", "No CIN Ltd"), ("F Name", "A")]),
            row(&[("Company Name", "No CIN Ltd"), ("F Name", "B")]),
        ];
        let outcome = group(&rows);
        assert_eq!(outcome.leads.len(), 1);
        assert_eq!(outcome.leads[0].directors().len(), 2);
    }

    #[test]
    fn test_blank_rows_skipped() {
        let rows = vec![
            row(&[("CIN", ""), ("Company Name", "")]),
            row(&[("CIN", "A"), ("Company Name", "X")]),
            row(&[("CIN", "  "), ("F Name", "")]),
        ];
        let outcome = group(&rows);
        assert_eq!(outcome.total_rows, 3);
        assert_eq!(outcome.skipped_rows, 2);
        assert_eq!(outcome.leads.len(), 1);
        // 空白行不产生董事，最终只有占位董事
        assert_eq!(outcome.leads[0].directors().len(), 1);
        assert!(!outcome.leads[0].directors()[0].has_contact());
    }

    #[test]
    fn test_leading_rows_without_key_skipped() {
        let rows = vec![
            row(&[("F Name", "Orphan")]),
            row(&[("CIN", "A"), ("F Name", "Owner")]),
        ];
        let outcome = group(&rows);
        assert_eq!(outcome.skipped_rows, 1);
        assert_eq!(outcome.leads.len(), 1);
        assert_eq!(outcome.leads[0].directors()[0].first_name, "Owner");
    }

    #[test]
    fn test_identifier_only_row_creates_lead_with_placeholder() {
        let outcome = group(&[row(&[("CIN", "ONLY")])]);
        assert_eq!(outcome.leads.len(), 1);
        let lead = &outcome.leads[0];
        assert_eq!(lead.directors().len(), 1);
        assert_eq!(lead.directors()[0].id, format!("{}-dir-1", lead.id));
    }

    #[test]
    fn test_din_alone_does_not_create_director() {
        let rows = vec![
            row(&[("CIN", "A"), ("DIN", "08765432")]),
            row(&[("DIN", "08765433"), ("Mobile", "+91 98765 43211")]),
        ];
        let outcome = group(&rows);
        let directors = outcome.leads[0].directors();
        assert_eq!(directors.len(), 1);
        assert_eq!(directors[0].external_id, "08765433");
        assert_eq!(directors[0].phone, "+91 98765 43211");
    }

    #[test]
    fn test_status_fallback_and_match() {
        let rows = vec![
            row(&[("CIN", "A"), ("Status", "unknown")]),
            row(&[("CIN", "B"), ("Status", "hOT")]),
            row(&[("CIN", "C")]),
        ];
        let outcome = group(&rows);
        assert_eq!(outcome.leads[0].status, LeadStatus::Cold);
        assert_eq!(outcome.leads[1].status, LeadStatus::Hot);
        assert_eq!(outcome.leads[2].status, LeadStatus::Cold);
    }

    #[test]
    fn test_follow_up_default_and_parsed() {
        let rows = vec![
            row(&[("CIN", "A")]),
            row(&[("CIN", "B"), ("Follow-up Date", "15/10/2025")]),
            row(&[("CIN", "C"), ("Follow-up Date", "2025/15/10")]),
        ];
        let outcome = group(&rows);
        let week_later = NaiveDate::from_ymd_opt(2025, 10, 8).unwrap();
        assert_eq!(outcome.leads[0].follow_up_date, week_later);
        assert_eq!(
            outcome.leads[1].follow_up_date,
            NaiveDate::from_ymd_opt(2025, 10, 15).unwrap()
        );
        // 非法日期视为缺失
        assert_eq!(outcome.leads[2].follow_up_date, week_later);
    }

    #[test]
    fn test_custom_follow_up_offset() {
        let registry = FieldRegistry::default();
        let options = GroupingOptions::new("1", today()).with_follow_up_offset_days(3);
        let outcome = RowGroupingEngine::new(&registry, options).group(&[row(&[("CIN", "A")])]);
        assert_eq!(
            outcome.leads[0].follow_up_date,
            NaiveDate::from_ymd_opt(2025, 10, 4).unwrap()
        );
    }

    #[test]
    fn test_unrepresentable_follow_up_offset_falls_back_to_today() {
        let registry = FieldRegistry::default();
        for days in [i64::MAX, i64::MIN, 1_000_000_000] {
            let options = GroupingOptions::new("1", today()).with_follow_up_offset_days(days);
            let outcome =
                RowGroupingEngine::new(&registry, options).group(&[row(&[("CIN", "A")])]);
            assert_eq!(outcome.leads[0].follow_up_date, today());
        }
    }

    #[test]
    fn test_date_fields_normalized() {
        let rows = vec![
            row(&[("CIN", "A"), ("Date of Incorporation", "15/05/2020")]),
            row(&[("CIN", "B"), ("DOI", "garbage")]),
        ];
        let outcome = group(&rows);
        assert_eq!(outcome.leads[0].core_value("dateOfIncorporation"), "2020-05-15");
        assert_eq!(outcome.leads[1].core_value("dateOfIncorporation"), "");
    }

    #[test]
    fn test_new_lead_defaults() {
        let outcome = group(&[row(&[("CIN", "A"), ("Assigned To", "Somebody")])]);
        let lead = &outcome.leads[0];
        assert_eq!(lead.created_at, today());
        // 负责人始终取导入参数，不读取表格中的显示名
        assert_eq!(lead.assigned_to, "7");
        assert!(lead.history.is_empty());
    }

    #[test]
    fn test_first_row_wins_for_core_fields() {
        let rows = vec![
            row(&[("CIN", "A"), ("Company Name", "First Name Ltd"), ("Notes", "n1")]),
            row(&[("CIN", "A"), ("Company Name", "Renamed Ltd"), ("Notes", "n2")]),
        ];
        let outcome = group(&rows);
        assert_eq!(outcome.leads.len(), 1);
        assert_eq!(outcome.leads[0].company_name(), "First Name Ltd");
        assert_eq!(outcome.leads[0].core_value("notes"), "n1");
    }

    #[test]
    fn test_new_company_resets_carry_forward() {
        let rows = vec![
            row(&[("CIN", "A"), ("F Name", "a1")]),
            row(&[("CIN", "B"), ("F Name", "b1")]),
            row(&[("F Name", "b2")]),
        ];
        let outcome = group(&rows);
        assert_eq!(outcome.leads[0].directors().len(), 1);
        assert_eq!(outcome.leads[1].directors().len(), 2);
    }

    #[test]
    fn test_accumulator_step_tracks_last_key() {
        let registry = FieldRegistry::default();
        let engine = RowGroupingEngine::new(&registry, GroupingOptions::new("1", today()));

        let acc = engine.step(GroupingAccumulator::default(), &row(&[("F Name", "x")]));
        assert_eq!(acc.last_key(), None);

        let acc = engine.step(acc, &row(&[("Company Name", "X")]));
        assert_eq!(acc.last_key(), Some("X"));

        let acc = engine.step(acc, &row(&[("F Name", "y")]));
        assert_eq!(acc.last_key(), Some("X"));
        assert_eq!(acc.lead_count(), 1);

        let outcome = engine.finish(acc);
        assert_eq!(outcome.skipped_rows, 1);
        assert_eq!(outcome.summary().imported_directors, 1);
    }

    #[test]
    fn test_empty_input() {
        let outcome = group(&[]);
        assert!(outcome.leads.is_empty());
        assert_eq!(outcome.summary(), ImportSummary::default());
    }
}
