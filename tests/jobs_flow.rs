mod common;

use std::time::Duration;

use common::{harness, sample_photo};
use photoglow::client::{JobState, OperationKind, ProcessorOutput};

#[tokio::test]
async fn auto_enhance_moves_idle_pending_success() {
    let rig = harness().await;
    assert!(matches!(rig.ctx.jobs.state(), JobState::Idle));

    let jobs = rig.ctx.jobs.clone();
    let task = tokio::spawn(async move {
        jobs.submit(OperationKind::AutoEnhance, common::sample_photo(), None)
            .await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rig.ctx.jobs.state().is_pending());

    task.await.unwrap();
    let state = rig.ctx.jobs.state();
    assert_eq!(state.result_ref(), Some("results/enhanced.png"));
}

#[tokio::test]
async fn a_new_submission_immediately_clears_the_previous_result() {
    let rig = harness().await;

    rig.ctx
        .jobs
        .submit(OperationKind::StyleTransfer, sample_photo(), None)
        .await;
    assert_eq!(rig.ctx.jobs.state().result_ref(), Some("results/vangogh.png"));

    let jobs = rig.ctx.jobs.clone();
    let task = tokio::spawn(async move {
        jobs.submit(OperationKind::AutoEnhance, common::sample_photo(), None)
            .await;
    });

    // While the second operation is in flight the first result is gone.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rig.ctx.jobs.state().is_pending());
    assert!(rig.ctx.jobs.state().result_ref().is_none());

    task.await.unwrap();
    assert_eq!(rig.ctx.jobs.state().result_ref(), Some("results/enhanced.png"));
}

#[tokio::test]
async fn a_stale_response_never_overwrites_a_newer_submission() {
    let rig = harness().await;

    // Slow operation first, fast one second. The slow response lands last
    // but belongs to a superseded submission.
    let jobs = rig.ctx.jobs.clone();
    let slow = tokio::spawn(async move {
        jobs.submit(OperationKind::AutoEnhance, common::sample_photo(), None)
            .await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let jobs = rig.ctx.jobs.clone();
    let fast = tokio::spawn(async move {
        jobs.submit(OperationKind::StyleTransfer, common::sample_photo(), None)
            .await;
    });

    fast.await.unwrap();
    slow.await.unwrap();
    assert_eq!(rig.ctx.jobs.state().result_ref(), Some("results/vangogh.png"));
}

#[tokio::test]
async fn aesthetic_analysis_yields_a_score_and_a_notice() {
    let rig = harness().await;

    rig.ctx
        .jobs
        .submit(OperationKind::AestheticAnalysis, sample_photo(), None)
        .await;

    let state = rig.ctx.jobs.state();
    assert!(state.result_ref().is_none());
    match state {
        JobState::Success(ProcessorOutput::Analysis(analysis)) => {
            assert!((analysis.score - 7.2).abs() < f64::EPSILON);
            assert!(analysis.composition.follows_rule_of_thirds);
        }
        other => panic!("expected analysis success, got {other:?}"),
    }

    let notice = rig.ctx.notices.last().unwrap();
    assert!(notice.message.contains("7.2"));
}

#[tokio::test]
async fn a_processor_failure_lands_in_the_failed_state() {
    let rig = harness().await;

    rig.ctx
        .jobs
        .submit(OperationKind::FaceEnhance, sample_photo(), None)
        .await;

    match rig.ctx.jobs.state() {
        JobState::Failed(detail) => assert!(detail.contains("face model unavailable")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(rig.ctx.notices.last().unwrap().message, "operation failed");
}

#[tokio::test]
async fn promoting_a_result_twice_stores_two_records() {
    let rig = harness().await;
    let user = rig
        .ctx
        .session
        .register("hana@example.com", "Secret123!")
        .await
        .unwrap();

    rig.ctx
        .jobs
        .submit(OperationKind::StyleTransfer, sample_photo(), None)
        .await;
    let url = rig.ctx.jobs.state().result_ref().unwrap().to_string();

    let first = rig.ctx.jobs.promote(user.id, &url).await.unwrap();
    let second = rig.ctx.jobs.promote(user.id, &url).await.unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(first.url, second.url);
    assert_eq!(rig.ctx.user_pictures.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn logout_resets_the_job_slot() {
    let rig = harness().await;
    rig.ctx
        .session
        .register("iris@example.com", "Secret123!")
        .await
        .unwrap();

    rig.ctx
        .jobs
        .submit(OperationKind::StyleTransfer, sample_photo(), None)
        .await;
    assert!(rig.ctx.jobs.state().result_ref().is_some());

    rig.ctx.logout().await;
    assert!(matches!(rig.ctx.jobs.state(), JobState::Idle));
    assert!(rig.ctx.user_pictures.lock().unwrap().is_empty());
}
