// ==========================================
// MCA 线索管理系统 - 线索簿
// ==========================================
// 职责: 活跃线索集合 + 流失池的生命周期操作
// 生命周期: 导入/新增 → 编辑/跟进/改状态/分配/董事增删改 → 流失 → 恢复 | 永久删除
// 红线: 每条线索至少保留一名董事；导入合并全有或全无
// ==========================================

use crate::domain::field::FieldRegistry;
use crate::domain::lead::{Director, FollowUpEvent, Lead, LeadError, LostLead};
use crate::domain::types::LeadStatus;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

// ==========================================
// LeadBookError - 生命周期规则错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LeadBookError {
    #[error("线索不存在: {0}")]
    LeadNotFound(String),

    #[error("流失线索不存在: {0}")]
    LostLeadNotFound(String),

    #[error("线索 ID 重复: {0}")]
    DuplicateLeadId(String),

    #[error("必填字段缺失: {0}")]
    MissingRequiredField(String),

    #[error("备注不能为空")]
    EmptyRemark,

    #[error("线索已被永久标记为流失，不能恢复: {0}")]
    PermanentlyLost(String),

    #[error(transparent)]
    Director(#[from] LeadError),
}

pub type LeadBookResult<T> = Result<T, LeadBookError>;

// ==========================================
// LeadPatch - 线索编辑
// ==========================================
// core_fields 中的空白值表示清空该字段
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPatch {
    #[serde(default)]
    pub core_fields: BTreeMap<String, String>,
    pub follow_up_date: Option<NaiveDate>,
}

// ==========================================
// LeadFilter - 列表/导出筛选
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFilter {
    pub search: Option<String>,
    pub status: Option<LeadStatus>,
    pub assigned_to: Option<String>,
}

impl LeadFilter {
    /// 搜索词匹配公司名、CIN 与董事姓名/电话/邮箱（大小写不敏感）
    pub fn matches(&self, lead: &Lead) -> bool {
        if let Some(status) = self.status {
            if lead.status != status {
                return false;
            }
        }
        if let Some(assignee) = &self.assigned_to {
            if &lead.assigned_to != assignee {
                return false;
            }
        }

        let term = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => term.to_lowercase(),
            _ => return true,
        };
        let contains = |value: &str| value.to_lowercase().contains(&term);

        contains(lead.company_name())
            || contains(lead.cin())
            || lead.directors().iter().any(|d| {
                contains(&d.first_name)
                    || contains(&d.last_name)
                    || contains(&d.phone)
                    || contains(&d.email)
            })
    }
}

// ==========================================
// LeadBook - 线索簿
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadBook {
    #[serde(default)]
    leads: Vec<Lead>,
    #[serde(default)]
    lost_leads: Vec<LostLead>,
}

impl LeadBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn lost_leads(&self) -> &[LostLead] {
        &self.lost_leads
    }

    pub fn get(&self, lead_id: &str) -> Option<&Lead> {
        self.leads.iter().find(|l| l.id == lead_id)
    }

    pub fn get_lost(&self, lead_id: &str) -> Option<&LostLead> {
        self.lost_leads.iter().find(|l| l.lead.id == lead_id)
    }

    pub fn filter(&self, filter: &LeadFilter) -> Vec<&Lead> {
        self.leads.iter().filter(|l| filter.matches(l)).collect()
    }

    fn get_mut(&mut self, lead_id: &str) -> LeadBookResult<&mut Lead> {
        self.leads
            .iter_mut()
            .find(|l| l.id == lead_id)
            .ok_or_else(|| LeadBookError::LeadNotFound(lead_id.to_string()))
    }

    fn contains_id(&self, lead_id: &str) -> bool {
        self.get(lead_id).is_some() || self.get_lost(lead_id).is_some()
    }

    // ===== 新增 / 编辑 / 删除 =====

    /// 新增线索
    ///
    /// 校验必填字段；无董事时补占位董事
    pub fn add_lead(&mut self, mut lead: Lead, registry: &FieldRegistry) -> LeadBookResult<&Lead> {
        if self.contains_id(&lead.id) {
            return Err(LeadBookError::DuplicateLeadId(lead.id));
        }
        check_required(&lead, registry)?;
        lead.ensure_director();

        info!(lead_id = %lead.id, company = %lead.company_name(), "新增线索");
        self.leads.push(lead);
        Ok(&self.leads[self.leads.len() - 1])
    }

    /// 编辑线索主体字段与跟进日期
    ///
    /// 编辑后仍须满足必填规则，否则整体不生效
    pub fn update_lead(
        &mut self,
        lead_id: &str,
        patch: LeadPatch,
        registry: &FieldRegistry,
    ) -> LeadBookResult<&Lead> {
        let lead = self.get_mut(lead_id)?;
        let mut updated = lead.clone();
        for (key, value) in &patch.core_fields {
            updated.set_core_value(key, value);
        }
        if let Some(date) = patch.follow_up_date {
            updated.follow_up_date = date;
        }
        check_required(&updated, registry)?;

        *lead = updated;
        debug!(lead_id, "线索已更新");
        Ok(lead)
    }

    pub fn delete_lead(&mut self, lead_id: &str) -> LeadBookResult<Lead> {
        let pos = self
            .leads
            .iter()
            .position(|l| l.id == lead_id)
            .ok_or_else(|| LeadBookError::LeadNotFound(lead_id.to_string()))?;
        info!(lead_id, "删除线索");
        Ok(self.leads.remove(pos))
    }

    pub fn change_status(&mut self, lead_id: &str, status: LeadStatus) -> LeadBookResult<&Lead> {
        let lead = self.get_mut(lead_id)?;
        lead.status = status;
        debug!(lead_id, status = %status, "线索状态已变更");
        Ok(lead)
    }

    pub fn assign(&mut self, lead_id: &str, user_id: &str) -> LeadBookResult<&Lead> {
        let lead = self.get_mut(lead_id)?;
        lead.assigned_to = user_id.trim().to_string();
        debug!(lead_id, user_id, "线索已分配");
        Ok(lead)
    }

    // ===== 跟进 =====

    /// 追加跟进记录（备注不能为空）
    pub fn add_follow_up(
        &mut self,
        lead_id: &str,
        date: NaiveDate,
        remark: &str,
        created_by: &str,
    ) -> LeadBookResult<&FollowUpEvent> {
        let remark = remark.trim();
        if remark.is_empty() {
            return Err(LeadBookError::EmptyRemark);
        }

        let lead = self.get_mut(lead_id)?;
        lead.history.push(FollowUpEvent {
            id: Uuid::new_v4().to_string(),
            date,
            remark: remark.to_string(),
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        });
        Ok(&lead.history[lead.history.len() - 1])
    }

    // ===== 董事 =====

    pub fn add_director(&mut self, lead_id: &str, director: Director) -> LeadBookResult<&Director> {
        let lead = self.get_mut(lead_id)?;
        Ok(lead.add_director(director))
    }

    pub fn update_director(
        &mut self,
        lead_id: &str,
        director_id: &str,
        director: Director,
    ) -> LeadBookResult<()> {
        self.get_mut(lead_id)?.update_director(director_id, director)?;
        Ok(())
    }

    /// 删除董事；最后一名董事不可删除
    pub fn remove_director(&mut self, lead_id: &str, director_id: &str) -> LeadBookResult<Director> {
        Ok(self.get_mut(lead_id)?.remove_director(director_id)?)
    }

    // ===== 流失池 =====

    /// 标记流失: 移入流失池并记录流失前状态
    pub fn mark_as_lost(
        &mut self,
        lead_id: &str,
        remark: &str,
        lost_by: &str,
        lost_date: NaiveDate,
        is_permanent: bool,
    ) -> LeadBookResult<&LostLead> {
        let remark = remark.trim();
        if remark.is_empty() {
            return Err(LeadBookError::EmptyRemark);
        }

        let mut lead = self.delete_lead(lead_id)?;
        let previous_status = lead.status;
        lead.status = LeadStatus::Lost;

        info!(lead_id, previous_status = %previous_status, is_permanent, "线索标记为流失");
        self.lost_leads.push(LostLead {
            lead,
            previous_status,
            lost_by: lost_by.to_string(),
            lost_date,
            lost_remark: remark.to_string(),
            is_permanent,
        });
        Ok(&self.lost_leads[self.lost_leads.len() - 1])
    }

    /// 恢复流失线索（永久流失不可恢复）
    pub fn restore_lost_lead(&mut self, lead_id: &str) -> LeadBookResult<&Lead> {
        let pos = self
            .lost_leads
            .iter()
            .position(|l| l.lead.id == lead_id)
            .ok_or_else(|| LeadBookError::LostLeadNotFound(lead_id.to_string()))?;
        if self.lost_leads[pos].is_permanent {
            return Err(LeadBookError::PermanentlyLost(lead_id.to_string()));
        }

        let lost = self.lost_leads.remove(pos);
        let status = lost.restored_status();
        let mut lead = lost.lead;
        lead.status = status;

        info!(lead_id, status = %status, "流失线索已恢复");
        self.leads.push(lead);
        Ok(&self.leads[self.leads.len() - 1])
    }

    /// 从流失池永久删除
    pub fn permanently_delete_lost(&mut self, lead_id: &str) -> LeadBookResult<LostLead> {
        let pos = self
            .lost_leads
            .iter()
            .position(|l| l.lead.id == lead_id)
            .ok_or_else(|| LeadBookError::LostLeadNotFound(lead_id.to_string()))?;
        info!(lead_id, "流失线索已永久删除");
        Ok(self.lost_leads.remove(pos))
    }

    // ===== 日历 =====

    /// 指定日期需要跟进的线索
    pub fn leads_for_date(&self, date: NaiveDate) -> Vec<&Lead> {
        self.leads
            .iter()
            .filter(|l| l.follow_up_date == date)
            .collect()
    }

    /// 已逾期的线索（跟进日期早于今天，且未成交/未流失）
    pub fn overdue_leads(&self, today: NaiveDate) -> Vec<&Lead> {
        self.leads
            .iter()
            .filter(|l| l.follow_up_date < today && is_open(l.status))
            .collect()
    }

    /// 未来 days 天内（含今天）需要跟进的线索，按日期排序
    pub fn upcoming_leads(&self, today: NaiveDate, days: i64) -> Vec<&Lead> {
        let until = Duration::try_days(days)
            .and_then(|offset| today.checked_add_signed(offset))
            .unwrap_or(NaiveDate::MAX);
        let mut upcoming: Vec<&Lead> = self
            .leads
            .iter()
            .filter(|l| l.follow_up_date >= today && l.follow_up_date <= until)
            .collect();
        upcoming.sort_by_key(|l| l.follow_up_date);
        upcoming
    }

    // ===== 导入合并 =====

    /// 合并导入结果（全部追加或全部不追加）
    pub fn merge_imported(&mut self, imported: Vec<Lead>) -> LeadBookResult<usize> {
        let mut seen = HashSet::new();
        for lead in &imported {
            if self.contains_id(&lead.id) || !seen.insert(lead.id.as_str()) {
                return Err(LeadBookError::DuplicateLeadId(lead.id.clone()));
            }
        }

        let count = imported.len();
        self.leads.extend(imported.into_iter().map(|mut lead| {
            lead.ensure_director();
            lead
        }));
        info!(merged = count, total = self.leads.len(), "导入线索已合并");
        Ok(count)
    }
}

fn is_open(status: LeadStatus) -> bool {
    !matches!(status, LeadStatus::Converted | LeadStatus::Lost)
}

// 必填字段: 按注册表逐项检查（状态与跟进日期为强类型，始终存在）
fn check_required(lead: &Lead, registry: &FieldRegistry) -> LeadBookResult<()> {
    for field in registry.required_fields() {
        if lead.field_value(&field.key).trim().is_empty() {
            return Err(LeadBookError::MissingRequiredField(field.label.clone()));
        }
    }
    Ok(())
}
