// ==========================================
// MCA 线索管理系统 - 导入模板
// ==========================================
// 一家示例公司 + 两位董事，演示“一家公司多行”的导入约定
// ==========================================

use crate::domain::lead::{Director, Lead};
use crate::domain::types::LeadStatus;
use crate::exporter::flattener::AssigneeNameLookup;
use chrono::NaiveDate;

/// 模板文件名
pub const TEMPLATE_FILE_NAME: &str = "mca_leads_template.xlsx";

const SAMPLE_COMPANY: &[(&str, &str)] = &[
    ("cin", "U74999DL2020PTC123456"),
    ("companyName", "Sample Company Pvt Ltd"),
    ("authorisedCapital", "10,00,000"),
    ("paidUpCapital", "7,50,000"),
    ("dateOfIncorporation", "2020-05-15"),
    ("registeredAddress", "Plot 123, Sector 18, Noida, UP 201301"),
    ("companyEmail", "info@samplecompany.com"),
    ("notes", "Sample lead entry - Multiple directors for same CIN"),
];

// (DIN, 名, 姓, 手机, 邮箱)
const SAMPLE_DIRECTORS: &[(&str, &str, &str, &str, &str)] = &[
    ("08765432", "John", "Doe", "+91 98765 43210", "john@samplecompany.com"),
    ("08765433", "Jane", "Smith", "+91 98765 43211", "jane@samplecompany.com"),
];

/// 示例线索
pub fn template_lead(today: NaiveDate) -> Lead {
    let follow_up_date = NaiveDate::from_ymd_opt(2025, 10, 15).unwrap_or(today);
    let mut lead = Lead::new("template".to_string(), today, follow_up_date, String::new());
    lead.status = LeadStatus::Hot;

    for (key, value) in SAMPLE_COMPANY {
        lead.set_core_value(key, value);
    }
    for (din, first_name, last_name, mobile, email) in SAMPLE_DIRECTORS {
        lead.add_director(Director {
            external_id: din.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            phone: mobile.to_string(),
            email: email.to_string(),
            ..Director::default()
        });
    }
    lead
}

/// 模板中负责人列留空
pub struct BlankAssignee;

impl AssigneeNameLookup for BlankAssignee {
    fn display_name(&self, _user_id: &str) -> Option<String> {
        Some(String::new())
    }
}
