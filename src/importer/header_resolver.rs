// ==========================================
// MCA 线索管理系统 - 表头解析器
// ==========================================
// 职责: 字段描述符 → 候选列名列表；原始行 → 字段值
// 规则: 先精确匹配（候选顺序），再归一化匹配（小写 + 去除非字母数字）
// ==========================================

use crate::domain::field::FieldDescriptor;
use crate::domain::sheet::RawRow;

// ==========================================
// 同义列名表（静态数据）
// ==========================================
// 用途: 兼容不同来源表格的列命名
const HEADER_SYNONYMS: &[(&str, &[&str])] = &[
    ("cin", &["CIN", "cin", "C.I.N", "Company Identification Number"]),
    (
        "companyName",
        &["Company Name", "Company name", "companyName", "Name", "name", "COMPANY NAME"],
    ),
    (
        "authorisedCapital",
        &["Authorised Capital(₹)", "Authorised Capital", "authorisedCapital", "Authorized Capital"],
    ),
    (
        "paidUpCapital",
        &["Paid up Capital(₹)", "Paid up Capital", "paidUpCapital", "Paid-up Capital"],
    ),
    (
        "dateOfIncorporation",
        &["Date of Incorporation", "dateOfIncorporation", "Incorporation Date", "DOI"],
    ),
    (
        "registeredAddress",
        &["Registered Address", "registeredAddress", "Address", "Reg Address"],
    ),
    ("companyEmail", &["Company E-mail id", "Company Email", "companyEmail", "Email"]),
    ("din", &["DIN", "din", "D.I.N", "Director Identification Number"]),
    (
        "directorFirstName",
        &["F Name", "First Name", "directorFirstName", "FirstName", "Director First Name"],
    ),
    (
        "directorLastName",
        &["L Name", "Last Name", "directorLastName", "LastName", "Director Last Name"],
    ),
    (
        "mobile",
        &["Mobile", "mobile", "Phone", "Contact", "Mobile No", "Contact Number"],
    ),
    (
        "directorEmail",
        &["Director E-mail id", "Director Email", "directorEmail", "Dir Email"],
    ),
    ("status", &["Status", "status", "Lead Status"]),
    (
        "followUpDate",
        &["Follow-up Date", "Follow Up Date", "followUpDate", "Next Follow Up"],
    ),
    ("notes", &["Notes", "notes", "Remarks", "Comments"]),
    ("assignedTo", &["Assigned To", "assignedTo", "Owner"]),
];

/// 查询字段键的同义列名
pub fn synonyms_for(key: &str) -> &'static [&'static str] {
    HEADER_SYNONYMS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, names)| *names)
        .unwrap_or(&[])
}

/// 列名归一化: 小写 + 去除所有非字母数字字符
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

pub struct HeaderResolver;

impl HeaderResolver {
    /// 生成字段的候选列名（有序、去重）
    ///
    /// 顺序: exportHeader → label → key → 同义列名
    pub fn resolve(&self, descriptor: &FieldDescriptor) -> Vec<String> {
        let mut candidates: Vec<String> = Vec::new();
        let fixed = [
            descriptor.export_header.as_str(),
            descriptor.label.as_str(),
            descriptor.key.as_str(),
        ];
        for name in fixed.into_iter().chain(synonyms_for(&descriptor.key).iter().copied()) {
            if !name.is_empty() && !candidates.iter().any(|c| c == name) {
                candidates.push(name.to_string());
            }
        }
        candidates
    }

    /// 在原始行中查找第一个匹配候选列名的非空值
    ///
    /// # 返回
    /// - 去除首尾空白的值
    /// - "": 无匹配列或匹配列均为空
    pub fn match_value(&self, row: &RawRow, candidates: &[String]) -> String {
        // 第一轮: 精确列名
        for candidate in candidates {
            if let Some(value) = row.get(candidate) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }

        // 第二轮: 归一化列名
        let normalized_columns: Vec<(String, &str)> = row
            .iter()
            .map(|(column, value)| (normalize_header(column), value))
            .collect();
        for candidate in candidates {
            let wanted = normalize_header(candidate);
            if wanted.is_empty() {
                continue;
            }
            for (column, value) in &normalized_columns {
                if *column == wanted {
                    let trimmed = value.trim();
                    if !trimmed.is_empty() {
                        return trimmed.to_string();
                    }
                }
            }
        }

        String::new()
    }

    /// 便捷方法: resolve + match_value
    pub fn value_for(&self, row: &RawRow, descriptor: &FieldDescriptor) -> String {
        self.match_value(row, &self.resolve(descriptor))
    }
}
