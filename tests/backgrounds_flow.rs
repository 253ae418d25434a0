mod common;

use std::sync::atomic::Ordering;

use common::{harness, sample_background, sample_photo};
use photoglow::client::{ClientError, ImageUpload};

#[tokio::test]
async fn the_selection_holds_at_most_one_background() {
    let rig = harness().await;
    rig.ctx.picker.open();

    rig.ctx
        .picker
        .add_background("Beach", &sample_background())
        .await
        .unwrap();
    rig.ctx
        .picker
        .add_background("Forest", &sample_background())
        .await
        .unwrap();
    rig.ctx.picker.refresh_catalog().await.unwrap();

    let ids = rig.ctx.picker.catalog_ids();
    assert_eq!(ids.len(), 2);

    rig.ctx.picker.select(ids[0]);
    assert_eq!(rig.ctx.picker.selected(), Some(ids[0]));

    rig.ctx.picker.select(ids[1]);
    assert_eq!(rig.ctx.picker.selected(), Some(ids[1]));
    assert_eq!(rig.ctx.picker.selection_len(), 1);

    // Re-selecting toggles off.
    rig.ctx.picker.select(ids[1]);
    assert_eq!(rig.ctx.picker.selected(), None);
}

#[tokio::test]
async fn adding_a_background_closes_the_add_form() {
    let rig = harness().await;
    rig.ctx.picker.open();
    rig.ctx.picker.open_add_form();
    assert!(rig.ctx.picker.is_add_form_open());

    rig.ctx
        .picker
        .add_background("Beach", &sample_background())
        .await
        .unwrap();
    assert!(!rig.ctx.picker.is_add_form_open());
    // The dialog itself stays open.
    assert!(rig.ctx.picker.is_open());
}

#[tokio::test]
async fn closing_the_dialog_drops_the_selection() {
    let rig = harness().await;
    rig.ctx.picker.open();
    rig.ctx
        .picker
        .add_background("Beach", &sample_background())
        .await
        .unwrap();
    rig.ctx.picker.refresh_catalog().await.unwrap();

    let ids = rig.ctx.picker.catalog_ids();
    rig.ctx.picker.select(ids[0]);
    assert!(rig.ctx.picker.is_open());

    rig.ctx.picker.close();
    assert!(!rig.ctx.picker.is_open());
    assert_eq!(rig.ctx.picker.selected(), None);
}

#[tokio::test]
async fn duplicate_background_names_are_rejected() {
    let rig = harness().await;

    rig.ctx
        .picker
        .add_background("Beach", &sample_background())
        .await
        .unwrap();
    let err = rig
        .ctx
        .picker
        .add_background("Beach", &sample_background())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Persistence(_)));
    assert_eq!(err.to_string(), "Background name already exists");
}

#[tokio::test]
async fn add_background_validates_name_and_file_locally() {
    let rig = harness().await;

    let err = rig
        .ctx
        .picker
        .add_background("   ", &sample_background())
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let not_an_image = ImageUpload::new("notes.txt", "text/plain", b"hello".to_vec());
    let err = rig
        .ctx
        .picker
        .add_background("Office", &not_an_image)
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn apply_replacement_without_a_selection_never_hits_the_network() {
    let rig = harness().await;
    rig.ctx.picker.open();

    let photo = sample_photo();
    let err = rig
        .ctx
        .picker
        .apply_replacement(Some(&photo))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = rig.ctx.picker.apply_replacement(None).await.unwrap_err();
    assert!(err.is_validation());

    assert_eq!(rig.replace_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn apply_replacement_runs_the_job_and_closes_the_dialog() {
    let rig = harness().await;
    rig.ctx.picker.open();
    rig.ctx
        .picker
        .add_background("Beach", &sample_background())
        .await
        .unwrap();
    rig.ctx.picker.refresh_catalog().await.unwrap();

    let ids = rig.ctx.picker.catalog_ids();
    rig.ctx.picker.select(ids[0]);

    let photo = sample_photo();
    rig.ctx.picker.apply_replacement(Some(&photo)).await.unwrap();

    assert_eq!(rig.replace_hits.load(Ordering::SeqCst), 1);
    assert_eq!(
        rig.ctx.jobs.state().result_ref(),
        Some("results/replaced.png")
    );
    assert!(!rig.ctx.picker.is_open());
    assert_eq!(rig.ctx.picker.selected(), None);
}
