mod helpers;

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use helpers::{encode, large_jpeg, noise_image, FailingStorage, TestStorage, BASE_URL};
use image::ImageFormat;
use seesy_core::{Config, ErrorMetadata};
use seesy_processing::{
    ImageDeleter, ImageFile, ImageUploadError, ImageUploader, MediaContext, ValidationError,
};
use seesy_storage::{object_key_from_url, Storage};

fn uploader_for(storage: Arc<dyn Storage>) -> ImageUploader {
    ImageUploader::new(storage, Default::default(), Default::default())
}

#[tokio::test]
async fn test_upload_reports_monotone_progress() {
    let test_storage = TestStorage::new(16 * 1024).await;
    let uploader = uploader_for(test_storage.dyn_storage());

    let data = large_jpeg();
    assert!(data.len() <= 5 * 1024 * 1024);

    let seen = Mutex::new(Vec::new());
    let on_progress = |p: f64| seen.lock().unwrap().push(p);
    let uploaded = uploader
        .upload(
            ImageFile::new("tarte aux pommes.jpg", "image/jpeg", data),
            "categories",
            Some(&on_progress),
        )
        .await
        .unwrap();

    let seen = seen.into_inner().unwrap();
    assert!(seen.len() > 1, "expected several progress events");
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert!(seen.iter().all(|p| (0.0..=100.0).contains(p)));
    assert_eq!(seen.last().copied(), Some(100.0));

    assert!(uploaded.object_key.starts_with("categories/"));
    assert!(uploaded.object_key.ends_with("_tarte_aux_pommes.jpg"));
    assert!(uploaded.download_url.contains("categories%2F"));
    assert_eq!((uploaded.width, uploaded.height), (800, 600));
    assert_eq!(uploaded.content_type, "image/jpeg");

    let stored = std::fs::read(test_storage.temp_dir.path().join(&uploaded.object_key)).unwrap();
    assert_eq!(stored.len() as u64, uploaded.size_bytes);
}

#[tokio::test]
async fn test_download_url_round_trips_to_object_key() {
    let test_storage = TestStorage::new(64 * 1024).await;
    let uploader = uploader_for(test_storage.dyn_storage());

    let data = encode(&noise_image(300, 200, 3), ImageFormat::Png);
    let uploaded = uploader
        .upload(ImageFile::new("logo (final).png", "image/png", data), "items", None)
        .await
        .unwrap();

    assert_eq!(
        object_key_from_url(&uploaded.download_url).unwrap(),
        uploaded.object_key
    );
    assert!(uploaded.download_url.starts_with(BASE_URL));
}

#[tokio::test]
async fn test_concurrent_uploads_get_distinct_keys() {
    let test_storage = TestStorage::new(64 * 1024).await;
    let uploader = uploader_for(test_storage.dyn_storage());
    let data = encode(&noise_image(200, 200, 11), ImageFormat::Jpeg);

    let uploads = (0..5).map(|_| {
        let uploader = uploader.clone();
        let file = ImageFile::new("same.jpg", "image/jpeg", data.clone());
        async move { uploader.upload(file, "items", None).await }
    });
    let results: Vec<_> = join_all(uploads).await;

    let mut keys = HashSet::new();
    let mut urls = HashSet::new();
    for result in results {
        let uploaded = result.unwrap();
        keys.insert(uploaded.object_key);
        urls.insert(uploaded.download_url);
    }
    assert_eq!(keys.len(), 5);
    assert_eq!(urls.len(), 5);
}

#[tokio::test]
async fn test_validation_runs_before_any_io() {
    let storage = Arc::new(FailingStorage::default());
    let uploader = uploader_for(storage.clone());

    let err = uploader
        .upload(ImageFile::new("anim.gif", "image/gif", vec![0u8; 10]), "items", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImageUploadError::Validation(ValidationError::UnsupportedType { .. })
    ));
    assert_eq!(
        err.client_message(),
        "Type de fichier non supporté. Utilisez JPG, PNG ou WebP."
    );

    let err = uploader
        .upload(
            ImageFile::new("huge.jpg", "image/jpeg", vec![0u8; 5 * 1024 * 1024 + 1]),
            "items",
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImageUploadError::Validation(ValidationError::FileTooLarge { .. })
    ));

    assert_eq!(storage.uploads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_undecodable_image_is_not_uploaded() {
    let storage = Arc::new(FailingStorage::default());
    let uploader = uploader_for(storage.clone());

    let err = uploader
        .upload(
            ImageFile::new("broken.jpg", "image/jpeg", b"not really a jpeg".to_vec()),
            "items",
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ImageUploadError::Decode(_)));
    assert_eq!(storage.uploads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_transport_failure_hides_cause() {
    let storage = Arc::new(FailingStorage {
        fail_upload: true,
        ..Default::default()
    });
    let uploader = uploader_for(storage.clone());

    let data = encode(&noise_image(100, 100, 5), ImageFormat::Jpeg);
    let err = uploader
        .upload(ImageFile::new("a.jpg", "image/jpeg", data), "items", None)
        .await
        .unwrap_err();

    assert!(matches!(err, ImageUploadError::Transport));
    assert!(!err.to_string().contains("connection reset"));
    assert_eq!(err.client_message(), "Échec du téléchargement de l'image");
}

#[tokio::test]
async fn test_url_resolution_failure_is_distinct() {
    let storage = Arc::new(FailingStorage {
        fail_download_url: true,
        ..Default::default()
    });
    let uploader = uploader_for(storage.clone());

    let data = encode(&noise_image(100, 100, 5), ImageFormat::Jpeg);
    let err = uploader
        .upload(ImageFile::new("a.jpg", "image/jpeg", data), "items", None)
        .await
        .unwrap_err();

    match err {
        ImageUploadError::UrlResolution { key } => assert!(key.starts_with("items/")),
        other => panic!("expected UrlResolution, got {:?}", other),
    }
    assert_eq!(storage.uploads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_delete_with_malformed_url() {
    let test_storage = TestStorage::new(64 * 1024).await;
    let deleter = ImageDeleter::new(test_storage.dyn_storage());

    for url in ["", "not a url", "https://i.imgur.com/abc.png", "http://localhost:9199/o/a.jpg"] {
        let result = deleter.delete(url).await;
        assert!(
            matches!(result, Err(ImageUploadError::InvalidUrl(_))),
            "expected InvalidUrl for {:?}",
            url
        );
    }
}

#[tokio::test]
async fn test_delete_rejects_url_from_another_host() {
    let test_storage = TestStorage::new(64 * 1024).await;
    let uploader = uploader_for(test_storage.dyn_storage());
    let deleter = ImageDeleter::new(test_storage.dyn_storage());

    let data = encode(&noise_image(120, 80, 13), ImageFormat::Png);
    let uploaded = uploader
        .upload(ImageFile::new("keep.png", "image/png", data), "items", None)
        .await
        .unwrap();

    let foreign = uploaded
        .download_url
        .replacen(BASE_URL, "https://evil.example", 1);
    assert_ne!(foreign, uploaded.download_url);
    assert_eq!(object_key_from_url(&foreign).unwrap(), uploaded.object_key);

    let result = deleter.delete(&foreign).await;
    assert!(matches!(result, Err(ImageUploadError::InvalidUrl(_))));
    assert!(test_storage.storage.exists(&uploaded.object_key).await.unwrap());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let test_storage = TestStorage::new(64 * 1024).await;
    let uploader = uploader_for(test_storage.dyn_storage());
    let deleter = ImageDeleter::new(test_storage.dyn_storage());

    let data = encode(&noise_image(120, 80, 9), ImageFormat::WebP);
    let uploaded = uploader
        .upload(ImageFile::new("pain.webp", "image/webp", data), "items", None)
        .await
        .unwrap();
    assert!(test_storage.storage.exists(&uploaded.object_key).await.unwrap());

    deleter.delete(&uploaded.download_url).await.unwrap();
    assert!(!test_storage.storage.exists(&uploaded.object_key).await.unwrap());

    deleter.delete(&uploaded.download_url).await.unwrap();
}

#[tokio::test]
async fn test_delete_swallows_backend_failures() {
    let storage = Arc::new(FailingStorage {
        fail_delete: true,
        ..Default::default()
    });
    let deleter = ImageDeleter::new(storage);

    let result = deleter
        .delete("http://localhost:9199/o/items%2F1_a.jpg?alt=media")
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_replace_only_deletes_owned_changed_urls() {
    let storage = Arc::new(FailingStorage::default());
    let deleter = ImageDeleter::new(storage.clone());
    let old_url = "http://localhost:9199/o/categories%2F1_old.jpg?alt=media";
    let new_url = "http://localhost:9199/o/categories%2F2_new.jpg?alt=media";

    assert!(!deleter.replace("", new_url).await);
    assert!(!deleter.replace(old_url, old_url).await);
    assert!(!deleter.replace("https://i.postimg.cc/x/old.jpg", new_url).await);
    assert!(storage.deleted.lock().unwrap().is_empty());

    assert!(deleter.replace(old_url, new_url).await);
    assert!(deleter.remove(new_url).await);
    assert!(!deleter.remove("").await);

    assert_eq!(
        *storage.deleted.lock().unwrap(),
        vec!["categories/1_old.jpg".to_string(), "categories/2_new.jpg".to_string()]
    );
}

#[tokio::test]
async fn test_media_context_from_local_config() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_string_lossy().to_string();
    let config = Config::from_lookup(|key| match key {
        "STORAGE_BACKEND" => Some("local".to_string()),
        "LOCAL_STORAGE_PATH" => Some(root.clone()),
        "LOCAL_STORAGE_BASE_URL" => Some(BASE_URL.to_string()),
        "IMAGE_MAX_WIDTH" => Some("200".to_string()),
        _ => None,
    })
    .unwrap();

    let context = MediaContext::from_config(config).await.unwrap();
    let data = encode(&noise_image(400, 100, 21), ImageFormat::Png);
    let uploaded = context
        .uploader
        .upload(ImageFile::new("banner.png", "image/png", data), "categories", None)
        .await
        .unwrap();

    assert_eq!((uploaded.width, uploaded.height), (200, 50));
    assert!(context.deleter.owns_url(&uploaded.download_url));
    assert!(context.deleter.remove(&uploaded.download_url).await);
    assert!(!context.storage.exists(&uploaded.object_key).await.unwrap());

    let json = serde_json::to_value(&uploaded).unwrap();
    assert_eq!(json["object_key"], uploaded.object_key.as_str());
}
