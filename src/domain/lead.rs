// ==========================================
// MCA 线索管理系统 - 线索领域模型
// ==========================================
// 职责: 线索 (Lead) / 董事子记录 (Director) / 跟进记录 / 流失线索
// 红线: 每条线索至少保留一名董事；旧版董事字段只由 directors[0] 派生
// ==========================================

use crate::domain::field::{
    DirectorField, ASSIGNED_TO_KEY, CIN_KEY, COMPANY_NAME_KEY, FOLLOW_UP_DATE_KEY, STATUS_KEY,
};
use crate::domain::types::LeadStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

// ==========================================
// Director - 董事子记录
// ==========================================
// 归属: 仅属于一条线索，不共享
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Director {
    pub id: String,
    #[serde(rename = "din")]
    pub external_id: String, // 董事识别号 (DIN)
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "mobile")]
    pub phone: String,
    pub email: String,
}

impl Director {
    /// 空白占位董事
    pub fn placeholder(lead_id: &str) -> Self {
        Self {
            id: director_id(lead_id, 1),
            ..Self::default()
        }
    }

    pub fn get(&self, field: DirectorField) -> &str {
        match field {
            DirectorField::ExternalId => &self.external_id,
            DirectorField::FirstName => &self.first_name,
            DirectorField::LastName => &self.last_name,
            DirectorField::Phone => &self.phone,
            DirectorField::Email => &self.email,
        }
    }

    pub fn set(&mut self, field: DirectorField, value: String) {
        match field {
            DirectorField::ExternalId => self.external_id = value,
            DirectorField::FirstName => self.first_name = value,
            DirectorField::LastName => self.last_name = value,
            DirectorField::Phone => self.phone = value,
            DirectorField::Email => self.email = value,
        }
    }

    /// 是否携带姓名或联系方式（DIN 不计入）
    pub fn has_contact(&self) -> bool {
        [&self.first_name, &self.last_name, &self.phone, &self.email]
            .iter()
            .any(|v| !v.trim().is_empty())
    }
}

/// 董事子记录 ID: `{lead_id}-dir-{序号}`
pub fn director_id(lead_id: &str, ordinal: usize) -> String {
    format!("{}-dir-{}", lead_id, ordinal)
}

// ==========================================
// LegacyDirectorView - 旧版董事字段视图
// ==========================================
// 兼容旧接口的顶层董事字段，始终由 directors[0] 计算得出
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDirectorView {
    pub din: String,
    pub director_first_name: String,
    pub director_last_name: String,
    pub mobile: String,
    pub director_email: String,
}

impl From<&Director> for LegacyDirectorView {
    fn from(d: &Director) -> Self {
        Self {
            din: d.external_id.clone(),
            director_first_name: d.first_name.clone(),
            director_last_name: d.last_name.clone(),
            mobile: d.phone.clone(),
            director_email: d.email.clone(),
        }
    }
}

// ==========================================
// FollowUpEvent - 跟进记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpEvent {
    pub id: String,
    pub date: NaiveDate,           // 跟进日期
    pub remark: String,            // 跟进备注
    pub created_by: String,        // 操作人 ID
    pub created_at: DateTime<Utc>, // 记录时间
}

// ==========================================
// 线索级错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LeadError {
    #[error("董事不存在: {0}")]
    DirectorNotFound(String),

    #[error("至少需要保留一名董事")]
    LastDirector,
}

// ==========================================
// Lead - 线索（公司）
// ==========================================
// core_fields: 注册表中非董事级、非系统字段的文本值
// status / follow_up_date / assigned_to 以强类型单独保存
// 序列化时附带旧版董事字段（din / directorFirstName / ...），反序列化时忽略
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    #[serde(default)]
    pub core_fields: BTreeMap<String, String>,
    #[serde(default)]
    directors: Vec<Director>,
    pub status: LeadStatus,
    pub follow_up_date: NaiveDate,
    pub created_at: NaiveDate,
    pub assigned_to: String,
    #[serde(default)]
    pub history: Vec<FollowUpEvent>,
}

/// Lead 的序列化形态
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LeadWire<'a> {
    id: &'a str,
    core_fields: &'a BTreeMap<String, String>,
    directors: &'a [Director],
    status: &'a LeadStatus,
    follow_up_date: &'a NaiveDate,
    created_at: &'a NaiveDate,
    assigned_to: &'a str,
    history: &'a [FollowUpEvent],
    #[serde(flatten)]
    legacy: LegacyDirectorView,
}

impl Serialize for Lead {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        LeadWire {
            id: &self.id,
            core_fields: &self.core_fields,
            directors: &self.directors,
            status: &self.status,
            follow_up_date: &self.follow_up_date,
            created_at: &self.created_at,
            assigned_to: &self.assigned_to,
            history: &self.history,
            legacy: self.legacy_view(),
        }
        .serialize(serializer)
    }
}

impl Lead {
    /// 创建空线索（无董事；调用方负责补齐）
    pub fn new(
        id: String,
        created_at: NaiveDate,
        follow_up_date: NaiveDate,
        assigned_to: String,
    ) -> Self {
        Self {
            id,
            core_fields: BTreeMap::new(),
            directors: Vec::new(),
            status: LeadStatus::default(),
            follow_up_date,
            created_at,
            assigned_to,
            history: Vec::new(),
        }
    }

    pub fn company_name(&self) -> &str {
        self.core_value(COMPANY_NAME_KEY)
    }

    pub fn cin(&self) -> &str {
        self.core_value(CIN_KEY)
    }

    pub fn core_value(&self, key: &str) -> &str {
        self.core_fields.get(key).map(String::as_str).unwrap_or("")
    }

    /// 设置主体字段（空白值视为删除）
    pub fn set_core_value(&mut self, key: &str, value: &str) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.core_fields.remove(key);
        } else {
            self.core_fields.insert(key.to_string(), trimmed.to_string());
        }
    }

    /// 按字段键取文本值（董事级字段取自 directors[0]）
    ///
    /// assignedTo 返回原始用户 ID，显示名由调用方解析
    pub fn field_value(&self, key: &str) -> String {
        match key {
            STATUS_KEY => self.status.to_string(),
            FOLLOW_UP_DATE_KEY => self.follow_up_date.format("%Y-%m-%d").to_string(),
            ASSIGNED_TO_KEY => self.assigned_to.clone(),
            _ => match DirectorField::from_key(key) {
                Some(field) => self
                    .directors
                    .first()
                    .map(|d| d.get(field).to_string())
                    .unwrap_or_default(),
                None => self.core_value(key).to_string(),
            },
        }
    }

    pub fn directors(&self) -> &[Director] {
        &self.directors
    }

    pub fn director(&self, director_id: &str) -> Option<&Director> {
        self.directors.iter().find(|d| d.id == director_id)
    }

    /// 旧版董事字段视图（无董事时全部为空）
    pub fn legacy_view(&self) -> LegacyDirectorView {
        self.directors
            .first()
            .map(LegacyDirectorView::from)
            .unwrap_or_default()
    }

    /// 追加董事，ID 由线索分配
    pub fn add_director(&mut self, mut director: Director) -> &Director {
        let mut ordinal = self.directors.len() + 1;
        while self.director(&director_id(&self.id, ordinal)).is_some() {
            ordinal += 1;
        }
        director.id = director_id(&self.id, ordinal);
        self.directors.push(director);
        &self.directors[self.directors.len() - 1]
    }

    /// 更新董事信息（保留原 ID）
    pub fn update_director(
        &mut self,
        director_id: &str,
        mut updated: Director,
    ) -> Result<(), LeadError> {
        let slot = self
            .directors
            .iter_mut()
            .find(|d| d.id == director_id)
            .ok_or_else(|| LeadError::DirectorNotFound(director_id.to_string()))?;
        updated.id = slot.id.clone();
        *slot = updated;
        Ok(())
    }

    /// 删除董事；不允许删除最后一名
    pub fn remove_director(&mut self, director_id: &str) -> Result<Director, LeadError> {
        let pos = self
            .directors
            .iter()
            .position(|d| d.id == director_id)
            .ok_or_else(|| LeadError::DirectorNotFound(director_id.to_string()))?;
        if self.directors.len() == 1 {
            return Err(LeadError::LastDirector);
        }
        Ok(self.directors.remove(pos))
    }

    /// 无董事时补一个空白占位董事
    pub fn ensure_director(&mut self) {
        if self.directors.is_empty() {
            self.directors.push(Director::placeholder(&self.id));
        }
    }
}

// ==========================================
// LostLead - 流失线索
// ==========================================
// 线索从活跃列表移入流失池时包装；previous_status 用于恢复
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LostLead {
    pub lead: Lead,
    pub previous_status: LeadStatus,
    pub lost_by: String,
    pub lost_date: NaiveDate,
    pub lost_remark: String,
    pub is_permanent: bool,
}

impl LostLead {
    /// 恢复后的状态: 流失前状态（若流失前即为 Lost 则回退为 Cold）
    pub fn restored_status(&self) -> LeadStatus {
        match self.previous_status {
            LeadStatus::Lost => LeadStatus::Cold,
            status => status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_lead() -> Lead {
        let day = NaiveDate::from_ymd_opt(2025, 9, 20).unwrap();
        Lead::new("L1".to_string(), day, day, "1".to_string())
    }

    fn named(first: &str) -> Director {
        Director {
            first_name: first.to_string(),
            ..Director::default()
        }
    }

    #[test]
    fn test_add_director_assigns_sequential_ids() {
        let mut lead = test_lead();
        lead.add_director(named("Rajesh"));
        lead.add_director(named("Sunita"));
        let ids: Vec<&str> = lead.directors().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["L1-dir-1", "L1-dir-2"]);
    }

    #[test]
    fn test_add_director_after_removal_avoids_id_collision() {
        let mut lead = test_lead();
        lead.add_director(named("A"));
        lead.add_director(named("B"));
        lead.remove_director("L1-dir-1").unwrap();
        let added = lead.add_director(named("C")).id.clone();
        assert_eq!(added, "L1-dir-3");
    }

    #[test]
    fn test_remove_last_director_rejected() {
        let mut lead = test_lead();
        lead.add_director(named("Only"));
        assert_eq!(
            lead.remove_director("L1-dir-1").unwrap_err(),
            LeadError::LastDirector
        );
        assert_eq!(lead.directors().len(), 1);
    }

    #[test]
    fn test_legacy_view_tracks_first_director() {
        let mut lead = test_lead();
        assert_eq!(lead.legacy_view(), LegacyDirectorView::default());

        lead.add_director(named("Amit"));
        lead.add_director(named("Neha"));
        assert_eq!(lead.legacy_view().director_first_name, "Amit");

        lead.remove_director("L1-dir-1").unwrap();
        assert_eq!(lead.legacy_view().director_first_name, "Neha");
        assert_eq!(lead.field_value("directorFirstName"), "Neha");
    }

    #[test]
    fn test_serialized_lead_carries_legacy_director_keys() {
        let mut lead = test_lead();
        let json = serde_json::to_value(&lead).unwrap();
        assert_eq!(json["din"], "");
        assert_eq!(json["directorFirstName"], "");

        lead.add_director(Director {
            external_id: "00112233".to_string(),
            first_name: "Amit".to_string(),
            last_name: "Shah".to_string(),
            phone: "+91 90000 00001".to_string(),
            email: "amit@example.com".to_string(),
            ..Director::default()
        });
        lead.add_director(named("Neha"));

        let json = serde_json::to_value(&lead).unwrap();
        assert_eq!(json["din"], "00112233");
        assert_eq!(json["directorFirstName"], "Amit");
        assert_eq!(json["directorLastName"], "Shah");
        assert_eq!(json["mobile"], "+91 90000 00001");
        assert_eq!(json["directorEmail"], "amit@example.com");
        assert_eq!(json["directors"].as_array().unwrap().len(), 2);
        assert_eq!(json["followUpDate"], "2025-09-20");

        // 旧版字段只读：反序列化忽略，且不影响 directors
        let mut edited = json.clone();
        edited["directorFirstName"] = "Changed".into();
        let back: Lead = serde_json::from_value(edited).unwrap();
        assert_eq!(back, lead);
    }

    #[test]
    fn test_ensure_director_adds_placeholder_once() {
        let mut lead = test_lead();
        lead.ensure_director();
        lead.ensure_director();
        assert_eq!(lead.directors().len(), 1);
        assert_eq!(lead.directors()[0].id, "L1-dir-1");
        assert!(!lead.directors()[0].has_contact());
    }

    #[test]
    fn test_director_without_contact_only_din() {
        let d = Director {
            external_id: "08765432".to_string(),
            ..Director::default()
        };
        assert!(!d.has_contact());
    }

    #[test]
    fn test_field_value_typed_fields() {
        let mut lead = test_lead();
        lead.status = LeadStatus::Warm;
        lead.set_core_value("companyName", "  XYZ Corporation ");
        assert_eq!(lead.field_value("status"), "Warm");
        assert_eq!(lead.field_value("followUpDate"), "2025-09-20");
        assert_eq!(lead.company_name(), "XYZ Corporation");

        lead.set_core_value("companyName", "");
        assert!(!lead.core_fields.contains_key("companyName"));
    }

    #[test]
    fn test_restored_status() {
        let lost = LostLead {
            lead: test_lead(),
            previous_status: LeadStatus::Warm,
            lost_by: "1".to_string(),
            lost_date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            lost_remark: "budget".to_string(),
            is_permanent: false,
        };
        assert_eq!(lost.restored_status(), LeadStatus::Warm);

        let lost = LostLead {
            previous_status: LeadStatus::Lost,
            ..lost
        };
        assert_eq!(lost.restored_status(), LeadStatus::Cold);
    }
}
