// ==========================================
// 线索生命周期集成测试
// ==========================================
// 测试目标: 导入后的线索经历 跟进 → 流失 → 恢复，线索簿可持久化
// ==========================================


use mca_leads::api::{ApiError, ImportApi, LeadApi};
use mca_leads::domain::{Director, LeadStatus};
use mca_leads::engine::{LeadBook, LeadFilter};
use std::collections::HashMap;
use tempfile::TempDir;
use test_helpers::{create_test_config_manager, test_today, write_mca_sample};

#[tokio::test]
async fn test_imported_lead_lifecycle() {
    let (_db, config) = create_test_config_manager().unwrap();
    let dir = TempDir::new().unwrap();
    let file = write_mca_sample(&dir).unwrap();

    let import_api = ImportApi::new(config.clone()).with_today(test_today());
    let lead_api = LeadApi::new(config).with_today(test_today());
    let mut book = LeadBook::new();
    import_api.import_leads(&mut book, &file, None).await.unwrap();

    let filter = LeadFilter {
        search: Some("sunita".to_string()),
        ..LeadFilter::default()
    };
    let lead_id = lead_api.list_leads(&book, &filter)[0].id.clone();

    // 跟进并改期
    let next = chrono::NaiveDate::from_ymd_opt(2025, 9, 5).unwrap();
    lead_api
        .add_follow_up(&mut book, &lead_id, "Shared proposal", "1", Some(next))
        .unwrap();
    assert_eq!(lead_api.get_lead(&book, &lead_id).unwrap().follow_up_date, next);

    // 董事维护: 不能删除最后一名
    let added = lead_api
        .add_director(
            &mut book,
            &lead_id,
            Director {
                first_name: "Vikram".to_string(),
                ..Director::default()
            },
        )
        .unwrap();
    assert_eq!(lead_api.get_lead(&book, &lead_id).unwrap().directors().len(), 3);
    lead_api.remove_director(&mut book, &lead_id, &added.id).unwrap();

    // 流失 → 导出不含流失线索 → 恢复
    lead_api
        .mark_as_lost(&mut book, &lead_id, "Went with competitor", "1", false)
        .unwrap();
    assert_eq!(book.leads().len(), 1);
    assert_eq!(book.lost_leads().len(), 1);

    let users: HashMap<String, String> = HashMap::new();
    let export = import_api
        .export_leads(book.leads(), &users, dir.path())
        .await
        .unwrap();
    assert_eq!(export.exported_leads, 1);

    let restored = lead_api.restore_lost_lead(&mut book, &lead_id).unwrap();
    assert_eq!(restored.status, LeadStatus::Hot);
    assert_eq!(book.leads().len(), 2);
}

#[tokio::test]
async fn test_permanently_lost_lead_cannot_be_restored() {
    let (_db, config) = create_test_config_manager().unwrap();
    let dir = TempDir::new().unwrap();
    let file = write_mca_sample(&dir).unwrap();

    let import_api = ImportApi::new(config.clone()).with_today(test_today());
    let lead_api = LeadApi::new(config).with_today(test_today());
    let mut book = LeadBook::new();
    import_api.import_leads(&mut book, &file, None).await.unwrap();
    let lead_id = book.leads()[0].id.clone();

    let err = lead_api
        .mark_as_lost(&mut book, &lead_id, "   ", "1", true)
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));

    lead_api
        .mark_as_lost(&mut book, &lead_id, "Company struck off", "1", true)
        .unwrap();
    let err = lead_api.restore_lost_lead(&mut book, &lead_id).unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));

    lead_api.permanently_delete_lost(&mut book, &lead_id).unwrap();
    assert!(book.lost_leads().is_empty());
}

#[tokio::test]
async fn test_lead_book_json_roundtrip_after_import() {
    let (_db, config) = create_test_config_manager().unwrap();
    let dir = TempDir::new().unwrap();
    let file = write_mca_sample(&dir).unwrap();

    let import_api = ImportApi::new(config).with_today(test_today());
    let mut book = LeadBook::new();
    import_api.import_leads(&mut book, &file, None).await.unwrap();

    let json = serde_json::to_string(&book).unwrap();
    let restored: LeadBook = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, book);
}
