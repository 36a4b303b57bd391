// ==========================================
// MCA 线索管理系统 - 线索 API
// ==========================================
// 职责: 线索生命周期操作（新增/编辑/跟进/流失/恢复/日历）
// 说明: 字段注册表与默认值每次调用时从配置读取
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ConfigSnapshot};
use crate::domain::lead::{Director, FollowUpEvent, Lead, LostLead};
use crate::domain::types::LeadStatus;
use crate::engine::{LeadBook, LeadFilter, LeadPatch};
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// 新增线索请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadRequest {
    /// 主体字段（字段键 → 值）
    #[serde(default)]
    pub core_fields: BTreeMap<String, String>,
    #[serde(default)]
    pub directors: Vec<Director>,
    pub status: Option<LeadStatus>,
    /// 缺省为 今天 + 默认跟进天数
    pub follow_up_date: Option<NaiveDate>,
    /// 缺省为配置的默认负责人
    pub assigned_to: Option<String>,
}

/// 日历视图
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpCalendar {
    pub date: NaiveDate,
    pub due: Vec<Lead>,
    pub overdue: Vec<Lead>,
    pub upcoming: Vec<Lead>,
}

/// 日历默认向前查看的天数
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

// ==========================================
// LeadApi - 线索 API
// ==========================================
pub struct LeadApi {
    config_manager: Arc<ConfigManager>,
    today: Option<NaiveDate>,
}

impl LeadApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self {
            config_manager,
            today: None,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn list_leads<'a>(&self, book: &'a LeadBook, filter: &LeadFilter) -> Vec<&'a Lead> {
        book.filter(filter)
    }

    pub fn get_lead<'a>(&self, book: &'a LeadBook, lead_id: &str) -> ApiResult<&'a Lead> {
        book.get(lead_id)
            .ok_or_else(|| ApiError::NotFound(format!("线索不存在: {}", lead_id)))
    }

    pub fn list_lost_leads<'a>(&self, book: &'a LeadBook) -> &'a [LostLead] {
        book.lost_leads()
    }

    /// 跟进日历（指定日期到期 + 已逾期 + 近期）
    pub fn calendar(&self, book: &LeadBook, date: Option<NaiveDate>) -> FollowUpCalendar {
        let date = date.unwrap_or_else(|| self.today());
        let owned = |leads: Vec<&Lead>| leads.into_iter().cloned().collect::<Vec<_>>();
        FollowUpCalendar {
            date,
            due: owned(book.leads_for_date(date)),
            overdue: owned(book.overdue_leads(date)),
            upcoming: owned(book.upcoming_leads(date, UPCOMING_WINDOW_DAYS)),
        }
    }

    // ==========================================
    // 新增 / 编辑 / 删除
    // ==========================================

    /// 新增线索
    ///
    /// # 校验
    /// - 注册表中的必填字段均有值
    /// - 未提供董事时补一名占位董事
    #[instrument(skip(self, book, request))]
    pub async fn create_lead(
        &self,
        book: &mut LeadBook,
        request: CreateLeadRequest,
    ) -> ApiResult<Lead> {
        let snapshot = ConfigSnapshot::load(self.config_manager.as_ref()).await?;
        let today = self.today();

        let follow_up_date = request.follow_up_date.unwrap_or_else(|| {
            Duration::try_days(snapshot.follow_up_default_days)
                .and_then(|offset| today.checked_add_signed(offset))
                .unwrap_or(today)
        });
        let assigned_to = request
            .assigned_to
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or(snapshot.default_assignee);

        let mut lead = Lead::new(
            Uuid::new_v4().to_string(),
            today,
            follow_up_date,
            assigned_to,
        );
        lead.status = request.status.unwrap_or_default();
        for (key, value) in &request.core_fields {
            lead.set_core_value(key, value);
        }
        for director in request.directors {
            lead.add_director(director);
        }

        Ok(book.add_lead(lead, &snapshot.registry)?.clone())
    }

    pub fn update_lead(
        &self,
        book: &mut LeadBook,
        lead_id: &str,
        patch: LeadPatch,
    ) -> ApiResult<Lead> {
        let registry = self.config_manager.load_field_registry()?;
        Ok(book.update_lead(lead_id, patch, &registry)?.clone())
    }

    pub fn delete_lead(&self, book: &mut LeadBook, lead_id: &str) -> ApiResult<Lead> {
        Ok(book.delete_lead(lead_id)?)
    }

    /// 修改状态（状态文本大小写不敏感）
    ///
    /// Lost 只能经由 mark_as_lost 进入流失池
    pub fn change_status(
        &self,
        book: &mut LeadBook,
        lead_id: &str,
        status: &str,
    ) -> ApiResult<Lead> {
        let status = LeadStatus::from_label(status)
            .ok_or_else(|| ApiError::InvalidInput(format!("未知线索状态: {}", status)))?;
        if status == LeadStatus::Lost {
            return Err(ApiError::BusinessRuleViolation(
                "请使用 mark_as_lost 标记流失线索".to_string(),
            ));
        }
        Ok(book.change_status(lead_id, status)?.clone())
    }

    pub fn assign(&self, book: &mut LeadBook, lead_id: &str, user_id: &str) -> ApiResult<Lead> {
        if user_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("负责人不能为空".to_string()));
        }
        Ok(book.assign(lead_id, user_id)?.clone())
    }

    /// 追加跟进记录；next_follow_up 非空时同时改期
    pub fn add_follow_up(
        &self,
        book: &mut LeadBook,
        lead_id: &str,
        remark: &str,
        created_by: &str,
        next_follow_up: Option<NaiveDate>,
    ) -> ApiResult<FollowUpEvent> {
        let event = book
            .add_follow_up(lead_id, self.today(), remark, created_by)?
            .clone();
        if let Some(date) = next_follow_up {
            let registry = self.config_manager.load_field_registry()?;
            let patch = LeadPatch {
                follow_up_date: Some(date),
                ..LeadPatch::default()
            };
            book.update_lead(lead_id, patch, &registry)?;
        }
        Ok(event)
    }

    // ==========================================
    // 董事
    // ==========================================

    pub fn add_director(
        &self,
        book: &mut LeadBook,
        lead_id: &str,
        director: Director,
    ) -> ApiResult<Director> {
        Ok(book.add_director(lead_id, director)?.clone())
    }

    pub fn update_director(
        &self,
        book: &mut LeadBook,
        lead_id: &str,
        director_id: &str,
        director: Director,
    ) -> ApiResult<()> {
        Ok(book.update_director(lead_id, director_id, director)?)
    }

    pub fn remove_director(
        &self,
        book: &mut LeadBook,
        lead_id: &str,
        director_id: &str,
    ) -> ApiResult<Director> {
        Ok(book.remove_director(lead_id, director_id)?)
    }

    // ==========================================
    // 流失池
    // ==========================================

    pub fn mark_as_lost(
        &self,
        book: &mut LeadBook,
        lead_id: &str,
        remark: &str,
        lost_by: &str,
        is_permanent: bool,
    ) -> ApiResult<LostLead> {
        Ok(book
            .mark_as_lost(lead_id, remark, lost_by, self.today(), is_permanent)?
            .clone())
    }

    pub fn restore_lost_lead(&self, book: &mut LeadBook, lead_id: &str) -> ApiResult<Lead> {
        Ok(book.restore_lost_lead(lead_id)?.clone())
    }

    pub fn permanently_delete_lost(
        &self,
        book: &mut LeadBook,
        lead_id: &str,
    ) -> ApiResult<LostLead> {
        Ok(book.permanently_delete_lost(lead_id)?)
    }
}
