mod common;

use common::{harness, sample_photo};
use photoglow::client::ImageUpload;

#[tokio::test]
async fn uploading_a_picture_adds_it_to_the_shared_collection() {
    let rig = harness().await;

    let uploaded = rig.ctx.upload_picture(&sample_photo()).await.unwrap();
    assert!(uploaded.url.starts_with("/uploads/"));
    assert!(uploaded.url.ends_with("photo.png"));
    assert_eq!(rig.ctx.pictures.lock().unwrap().len(), 1);

    // A refetch converges on the same single record.
    rig.ctx.refresh_pictures().await.unwrap();
    let pictures = rig.ctx.pictures.lock().unwrap();
    assert_eq!(pictures.len(), 1);
    assert!(pictures.contains(&uploaded.id));
}

#[tokio::test]
async fn non_image_uploads_are_rejected_locally() {
    let rig = harness().await;

    let not_an_image = ImageUpload::new("notes.txt", "text/plain", b"hello".to_vec());
    let err = rig.ctx.upload_picture(&not_an_image).await.unwrap_err();
    assert!(err.is_validation());
    assert!(rig.ctx.pictures.lock().unwrap().is_empty());
}

#[tokio::test]
async fn user_pictures_require_authentication() {
    let rig = harness().await;

    let err = rig.ctx.refresh_user_pictures().await.unwrap_err();
    assert!(err.is_auth());

    rig.ctx
        .session
        .register("jane@example.com", "Secret123!")
        .await
        .unwrap();
    rig.ctx.refresh_user_pictures().await.unwrap();
    assert!(rig.ctx.user_pictures.lock().unwrap().is_empty());
}
