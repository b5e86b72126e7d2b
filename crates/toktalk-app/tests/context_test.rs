mod support;

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use support::{memory_store, RecordingClipboard};
use toktalk_app::{AppContext, AppError, LaunchContext, LaunchUrl, TeacherDashboard, View};
use toktalk_persist::{KeyValueStore, RequestStore, ACTIVE_CLASS_KEY};
use toktalk_types::{CounselingRequest, CounselorType, SessionSelection, ValidationError};

fn request(name: &str, class_name: &str, second: u32) -> CounselingRequest {
    let selection = SessionSelection::new(name, "고민", CounselorType::Chatbot).unwrap();
    let at = Utc.with_ymd_and_hms(2024, 5, 3, 9, 0, second).unwrap();
    CounselingRequest::new(&selection, "요약", class_name, at)
}

fn url(s: &str) -> LaunchUrl {
    LaunchUrl::parse(s).unwrap()
}

#[tokio::test]
async fn test_student_link_locks_context() {
    let (_, store) = memory_store();
    store.save_active_class("teacher's own class").await.unwrap();

    let mut ctx = AppContext::from_launch(&url("https://toktalk.app/?class=1%EB%B0%98"), store.clone())
        .await
        .unwrap();

    assert_eq!(ctx.launch(), &LaunchContext::StudentOnly { class_name: "1반".to_string() });
    assert_eq!(ctx.view(), View::Student);
    assert_eq!(ctx.active_class(), Some("1반"));
    assert!(matches!(ctx.switch_view(View::Teacher), Err(AppError::StudentOnly)));
    assert!(matches!(ctx.set_class("2반").await, Err(AppError::StudentOnly)));

    // The teacher's stored class is untouched
    assert_eq!(
        store.load_active_class().await.unwrap().as_deref(),
        Some("teacher's own class")
    );
}

#[tokio::test]
async fn test_teacher_context_restores_class() {
    let (_, store) = memory_store();
    store.save_active_class("3학년 2반").await.unwrap();

    let ctx = AppContext::from_launch(&url("https://toktalk.app/"), store).await.unwrap();

    assert_eq!(ctx.launch(), &LaunchContext::Teacher);
    assert_eq!(ctx.view(), View::Teacher);
    assert_eq!(ctx.active_class(), Some("3학년 2반"));
}

#[tokio::test]
async fn test_teacher_setup() {
    let (backend, store) = memory_store();
    let mut ctx = AppContext::from_launch(&url("https://toktalk.app/"), store).await.unwrap();

    assert!(ctx.active_class().is_none());
    assert!(matches!(ctx.switch_view(View::Student), Err(AppError::NoActiveClass)));

    let err = ctx.set_class("   ").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(ValidationError::MissingClassName)));
    assert_eq!(err.to_string(), "학급 이름을 입력해주세요.");

    ctx.set_class("  3학년 2반 ").await.unwrap();
    assert_eq!(ctx.active_class(), Some("3학년 2반"));
    assert_eq!(backend.get(ACTIVE_CLASS_KEY).await.unwrap().as_deref(), Some("3학년 2반"));

    ctx.switch_view(View::Student).unwrap();
    assert_eq!(ctx.view(), View::Student);
    ctx.switch_view(View::Teacher).unwrap();
}

#[tokio::test]
async fn test_requests_filtered_by_active_class() {
    let (_, store) = memory_store();
    store.save_active_class("1반").await.unwrap();
    store
        .save_requests(&[request("c", "1반", 3), request("b", "2반", 2), request("a", "1반", 1)])
        .await
        .unwrap();

    let ctx = AppContext::from_launch(&url("https://toktalk.app/"), store).await.unwrap();

    let names: Vec<String> = ctx
        .requests_for_active_class()
        .await
        .into_iter()
        .map(|r| r.student_name)
        .collect();
    assert_eq!(names, vec!["c", "a"]);
    assert_eq!(ctx.requests().await.len(), 3);
}

#[tokio::test]
async fn test_student_tab_write_reaches_teacher_tab() {
    let (backend, teacher_store) = memory_store();
    teacher_store.save_active_class("3학년 2반").await.unwrap();
    let student_store = RequestStore::new(Arc::new(backend.open_tab()));

    let teacher = AppContext::from_launch(&url("https://toktalk.app/"), teacher_store).await.unwrap();
    let student = AppContext::from_launch(
        &url("https://toktalk.app/?class=3%ED%95%99%EB%85%84%202%EB%B0%98"),
        student_store,
    )
    .await
    .unwrap();
    let mut changes = teacher.changes();

    student.record_request(request("민수", "3학년 2반", 1)).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), changes.changed())
        .await
        .unwrap()
        .unwrap();
    let visible = teacher.requests_for_active_class().await;
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].student_name, "민수");
}

#[tokio::test]
async fn test_stale_tab_overwrites_other_tabs_record() {
    let (backend, store_a) = memory_store();
    let store_b = RequestStore::new(Arc::new(backend.open_tab()));
    let link = url("https://toktalk.app/?class=1%EB%B0%98");

    let tab_a = AppContext::from_launch(&link, store_a.clone()).await.unwrap();
    let tab_b = AppContext::from_launch(&link, store_b).await.unwrap();

    // Tab B has not seen A's write yet when it records its own
    tab_a.record_request(request("가", "1반", 1)).await.unwrap();
    tab_b.record_request(request("나", "1반", 2)).await.unwrap();

    let stored = store_a.load_requests().await.unwrap();
    let names: Vec<&str> = stored.iter().map(|r| r.student_name.as_str()).collect();
    assert_eq!(names, vec!["나"]);
}

#[tokio::test]
async fn test_dashboard_link_and_copy() {
    let (_, store) = memory_store();
    store.save_active_class("3학년 2반").await.unwrap();
    let launch = url("https://toktalk.app/school?view=teacher");
    let ctx = AppContext::from_launch(&launch, store).await.unwrap();

    let dashboard = TeacherDashboard::load(&ctx, &launch).await.unwrap();
    assert_eq!(
        dashboard.student_link,
        "https://toktalk.app/school?class=3%ED%95%99%EB%85%84%202%EB%B0%98"
    );
    assert_eq!(
        url(&dashboard.student_link).class_param().as_deref(),
        Some("3학년 2반")
    );

    let clipboard = RecordingClipboard::default();
    assert!(dashboard.copy_link(&clipboard).await);
    assert_eq!(clipboard.copied.lock().unwrap().as_slice(), &[dashboard.student_link.clone()]);

    let broken = RecordingClipboard { fail: true, ..Default::default() };
    assert!(!dashboard.copy_link(&broken).await);
}
