#[cfg(test)]
mod tests {

    mod payload_tests {
        use crate::models::{MediaPayload, PayloadError, ResourceType};

        #[test]
        fn test_parse_image_data_url() {
            let payload = MediaPayload::from_data_url("data:image/png;base64,aGVsbG8=").unwrap();
            assert_eq!(payload.media_type, "image/png");
            assert_eq!(payload.data, b"hello");
            assert_eq!(payload.format(), "png");
            assert_eq!(payload.resource_type(), ResourceType::Image);
        }

        #[test]
        fn test_parse_video_data_url() {
            let payload = MediaPayload::from_data_url("data:video/mp4;base64,aGVsbG8=").unwrap();
            assert_eq!(payload.resource_type(), ResourceType::Video);
            assert_eq!(payload.format(), "mp4");
        }

        #[test]
        fn test_media_type_is_normalized() {
            let payload = MediaPayload::from_data_url("data:Image/JPEG;base64,aGVsbG8=").unwrap();
            assert_eq!(payload.media_type, "image/jpeg");
            assert_eq!(payload.format(), "jpg");
        }

        #[test]
        fn test_extra_params_before_base64() {
            let payload =
                MediaPayload::from_data_url("data:image/svg+xml;charset=utf-8;base64,aGVsbG8=")
                    .unwrap();
            assert_eq!(payload.format(), "svg");
        }

        #[test]
        fn test_missing_media_type_defaults_to_octet_stream() {
            let payload = MediaPayload::from_data_url("data:;base64,aGVsbG8=").unwrap();
            assert_eq!(payload.media_type, "application/octet-stream");
            assert_eq!(payload.format(), "bin");
            assert_eq!(payload.resource_type(), ResourceType::Image);
        }

        #[test]
        fn test_rejects_non_data_url() {
            assert!(matches!(
                MediaPayload::from_data_url("https://example.com/a.png"),
                Err(PayloadError::NotDataUrl)
            ));
        }

        #[test]
        fn test_rejects_missing_comma() {
            assert!(matches!(
                MediaPayload::from_data_url("data:image/png;base64"),
                Err(PayloadError::Malformed)
            ));
        }

        #[test]
        fn test_rejects_percent_encoded_payload() {
            assert!(matches!(
                MediaPayload::from_data_url("data:text/plain,hello"),
                Err(PayloadError::UnsupportedEncoding)
            ));
        }

        #[test]
        fn test_rejects_bad_base64() {
            assert!(matches!(
                MediaPayload::from_data_url("data:image/png;base64,@@@"),
                Err(PayloadError::Base64(_))
            ));
        }

        #[test]
        fn test_rejects_empty_payload() {
            assert!(matches!(
                MediaPayload::from_data_url("data:image/png;base64,"),
                Err(PayloadError::Empty)
            ));
        }

        #[test]
        fn test_data_url_survives_reencoding() {
            let payload = MediaPayload::new("image/gif", vec![1, 2, 3]);
            let parsed = MediaPayload::from_data_url(&payload.to_data_url()).unwrap();
            assert_eq!(parsed, payload);
        }
    }

    mod resource_type_tests {
        use crate::models::ResourceType;
        use std::str::FromStr;

        #[test]
        fn test_video_prefix_is_video() {
            assert_eq!(ResourceType::from_media_type("video/mp4"), ResourceType::Video);
            assert_eq!(ResourceType::from_media_type("VIDEO/webm"), ResourceType::Video);
        }

        #[test]
        fn test_everything_else_is_image() {
            assert_eq!(ResourceType::from_media_type("image/png"), ResourceType::Image);
            assert_eq!(ResourceType::from_media_type("audio/mpeg"), ResourceType::Image);
            assert_eq!(ResourceType::from_media_type(""), ResourceType::Image);
        }

        #[test]
        fn test_from_str_and_display() {
            assert_eq!(ResourceType::from_str("Video"), Ok(ResourceType::Video));
            assert_eq!(ResourceType::from_str("image"), Ok(ResourceType::Image));
            assert!(ResourceType::from_str("raw").is_err());
            assert_eq!(ResourceType::Video.to_string(), "video");
        }

        #[test]
        fn test_default_is_image() {
            assert_eq!(ResourceType::default(), ResourceType::Image);
        }
    }

    mod asset_key_tests {
        use crate::models::{AssetKey, KeyError};

        #[test]
        fn test_full_id_joins_folder_and_public_id() {
            let key = AssetKey::new("movies/posters", "dune").unwrap();
            assert_eq!(key.full_id(), "movies/posters/dune");
            assert_eq!(key.to_string(), "movies/posters/dune");
        }

        #[test]
        fn test_empty_parts_rejected() {
            assert_eq!(AssetKey::new("", "dune"), Err(KeyError::EmptyFolder));
            assert_eq!(AssetKey::new("movies", ""), Err(KeyError::EmptyPublicId));
        }

        #[test]
        fn test_traversal_rejected() {
            assert!(matches!(
                AssetKey::new("movies/../secrets", "dune"),
                Err(KeyError::InvalidFolder(_))
            ));
            assert!(matches!(
                AssetKey::new("/movies", "dune"),
                Err(KeyError::InvalidFolder(_))
            ));
            assert!(matches!(
                AssetKey::new("movies", "a/b"),
                Err(KeyError::InvalidPublicId(_))
            ));
        }

        #[test]
        fn test_same_public_id_in_different_folders_differs() {
            let a = AssetKey::new("a", "x").unwrap();
            let b = AssetKey::new("b", "x").unwrap();
            assert_ne!(a, b);
        }
    }

    mod batch_result_tests {
        use crate::models::{BatchResult, ResourceType, SkipReason, UploadOutcome};

        #[test]
        fn test_outcomes_partition_into_lists() {
            let result: BatchResult = vec![
                UploadOutcome::Uploaded {
                    public_id: "a".to_string(),
                    url: "memory://x/image/upload/f/a.png".to_string(),
                    format: "png".to_string(),
                    resource_type: ResourceType::Image,
                },
                UploadOutcome::Skipped {
                    public_id: "b".to_string(),
                    reason: SkipReason::AlreadyExists,
                },
                UploadOutcome::failed("c", "boom"),
            ]
            .into_iter()
            .collect();

            assert_eq!(result.len(), 3);
            assert_eq!(result.uploaded[0].public_id, "a");
            assert_eq!(result.skipped, vec!["b".to_string()]);
            assert_eq!(result.failed[0].error, "boom");
        }

        #[test]
        fn test_serialized_shape() {
            let result: BatchResult = vec![
                UploadOutcome::Uploaded {
                    public_id: "a".to_string(),
                    url: "u".to_string(),
                    format: "mp4".to_string(),
                    resource_type: ResourceType::Video,
                },
                UploadOutcome::failed("c", "boom"),
            ]
            .into_iter()
            .collect();

            let json = serde_json::to_value(&result).unwrap();
            assert_eq!(json["uploaded"][0]["publicId"], "a");
            assert_eq!(json["uploaded"][0]["resourceType"], "video");
            assert_eq!(json["skipped"], serde_json::json!([]));
            assert_eq!(json["failed"][0]["publicId"], "c");
            assert_eq!(json["failed"][0]["error"], "boom");
        }

        #[test]
        fn test_skip_reason_label() {
            assert_eq!(SkipReason::AlreadyExists.as_str(), "already-exists");
        }
    }

    mod auth_tests {
        use crate::config::AuthConfig;
        use crate::services::auth::{
            authenticate, hash_password, validate_login, verify_password, INVALID_CREDENTIALS,
        };

        fn operator(password: &str) -> AuthConfig {
            AuthConfig {
                operator_id: "1".to_string(),
                email: "admin@example.com".to_string(),
                password_hash: hash_password(password).unwrap(),
                session_secret: "0123456789abcdef0123456789abcdef".to_string(),
                session_lifetime: "7d".to_string(),
                secure_cookie: false,
            }
        }

        #[test]
        fn test_hash_password_produces_argon2_hash() {
            let hash = hash_password("password123").unwrap();
            assert!(hash.starts_with("$argon2"));
        }

        #[test]
        fn test_hash_password_rejects_short() {
            assert!(hash_password("short").is_err());
        }

        #[test]
        fn test_verify_password() {
            let hash = hash_password("password123").unwrap();
            assert!(verify_password("password123", &hash));
            assert!(!verify_password("wrongpassword", &hash));
            assert!(!verify_password("password123", "invalid-hash"));
        }

        #[test]
        fn test_validate_login_accepts_well_formed() {
            assert!(validate_login("admin@example.com", "password123").is_ok());
        }

        #[test]
        fn test_validate_login_reports_each_field() {
            let errors = validate_login("not-an-email", "short").unwrap_err();
            assert_eq!(errors["email"], vec!["Invalid email address".to_string()]);
            assert_eq!(
                errors["password"],
                vec!["Password must be at least 8 characters long".to_string()]
            );
        }

        #[test]
        fn test_validate_login_rejects_bare_domain() {
            let errors = validate_login("admin@localhost", "password123").unwrap_err();
            assert!(errors.contains_key("email"));
            assert!(!errors.contains_key("password"));
        }

        #[test]
        fn test_authenticate_matches_operator() {
            let auth = operator("password123");
            assert_eq!(
                authenticate(&auth, "Admin@Example.com", "password123"),
                Some("1".to_string())
            );
        }

        #[test]
        fn test_authenticate_rejects_wrong_credentials() {
            let auth = operator("password123");
            assert_eq!(authenticate(&auth, "admin@example.com", "password124"), None);
            assert_eq!(authenticate(&auth, "other@example.com", "password123"), None);
        }

        #[test]
        fn test_invalid_credentials_message() {
            assert_eq!(INVALID_CREDENTIALS, "Invalid email or password");
        }
    }

    mod memory_store_tests {
        use crate::models::{AssetKey, DeleteOutcome, MediaPayload, ResourceType};
        use crate::store::{MediaStore, MemoryStore, StoreError, UploadOptions};

        fn png() -> MediaPayload {
            MediaPayload::new("image/png", b"png-bytes".to_vec())
        }

        #[tokio::test]
        async fn test_upload_then_resource() {
            let store = MemoryStore::new("memory://demo");
            let key = AssetKey::new("posters", "dune").unwrap();
            let record = store
                .upload(&key, &png(), ResourceType::Image, UploadOptions::create_only())
                .await
                .unwrap();

            assert_eq!(record.public_id, "posters/dune");
            assert_eq!(record.secure_url, "memory://demo/image/upload/posters/dune.png");
            assert_eq!(store.resource(&key).await.unwrap(), record);
            assert_eq!(store.contents(&key), Some(b"png-bytes".to_vec()));
        }

        #[tokio::test]
        async fn test_create_only_conflicts() {
            let store = MemoryStore::default();
            let key = AssetKey::new("posters", "dune").unwrap();
            store
                .upload(&key, &png(), ResourceType::Image, UploadOptions::create_only())
                .await
                .unwrap();

            let second = store
                .upload(&key, &png(), ResourceType::Image, UploadOptions::create_only())
                .await;
            assert!(matches!(second, Err(StoreError::Conflict(_))));
            assert_eq!(store.len(), 1);
        }

        #[tokio::test]
        async fn test_unique_filename_renames() {
            let store = MemoryStore::default();
            let key = AssetKey::new("posters", "dune").unwrap();
            let options = UploadOptions {
                overwrite: false,
                unique_filename: true,
            };
            store.upload(&key, &png(), ResourceType::Image, options).await.unwrap();
            let renamed = store.upload(&key, &png(), ResourceType::Image, options).await.unwrap();

            assert_ne!(renamed.public_id, "posters/dune");
            assert!(renamed.public_id.starts_with("posters/dune_"));
            assert_eq!(store.len(), 2);
        }

        #[tokio::test]
        async fn test_missing_resource_is_not_found() {
            let store = MemoryStore::default();
            let key = AssetKey::new("posters", "dune").unwrap();
            assert!(store.resource(&key).await.unwrap_err().is_not_found());
        }

        #[tokio::test]
        async fn test_destroy_requires_matching_resource_type() {
            let store = MemoryStore::default();
            let key = AssetKey::new("trailers", "dune").unwrap();
            let clip = MediaPayload::new("video/mp4", b"mp4".to_vec());
            store
                .upload(&key, &clip, ResourceType::Video, UploadOptions::create_only())
                .await
                .unwrap();

            assert_eq!(
                store.destroy(&key, ResourceType::Image).await.unwrap(),
                DeleteOutcome::NotFound
            );
            assert_eq!(
                store.destroy(&key, ResourceType::Video).await.unwrap(),
                DeleteOutcome::Deleted
            );
            assert!(store.is_empty());
        }

        #[tokio::test]
        async fn test_search_includes_subfolders_newest_first() {
            let store = MemoryStore::default();
            for (folder, id) in [("movies", "a"), ("movies/posters", "b"), ("moviesx", "c")] {
                let key = AssetKey::new(folder, id).unwrap();
                store
                    .upload(&key, &png(), ResourceType::Image, UploadOptions::create_only())
                    .await
                    .unwrap();
            }

            let found = store.search_folder("movies", 10).await.unwrap();
            let ids: Vec<&str> = found.iter().map(|r| r.public_id.as_str()).collect();
            assert_eq!(ids, vec!["movies/posters/b", "movies/a"]);

            let capped = store.search_folder("movies", 1).await.unwrap();
            assert_eq!(capped.len(), 1);
        }

        #[tokio::test]
        async fn test_folders_tree() {
            let store = MemoryStore::default();
            store.create_folder("movies/posters");
            store.create_folder("shows");

            let roots: Vec<String> = store
                .root_folders()
                .await
                .unwrap()
                .into_iter()
                .map(|f| f.name)
                .collect();
            assert_eq!(roots, vec!["movies".to_string(), "shows".to_string()]);

            let subs = store.sub_folders("movies").await.unwrap();
            assert_eq!(subs.len(), 1);
            assert_eq!(subs[0].name, "posters");
            assert_eq!(subs[0].path, "movies/posters");

            assert!(store.sub_folders("missing").await.is_err());
        }
    }

    mod orchestrator_tests {
        use crate::models::{AssetKey, MediaPayload, ResourceType, UploadRequest};
        use crate::services::upload::{UploadOrchestrator, UploadSettings};
        use crate::store::{MediaStore, MemoryStore, UploadOptions};
        use std::sync::Arc;

        const PNG: &str = "data:image/png;base64,aGVsbG8=";
        const MP4: &str = "data:video/mp4;base64,aGVsbG8=";

        fn orchestrator(store: Arc<MemoryStore>, settings: UploadSettings) -> UploadOrchestrator {
            UploadOrchestrator::new(store, settings)
        }

        #[tokio::test]
        async fn test_new_items_are_uploaded_in_order() {
            let store = Arc::new(MemoryStore::default());
            let uploads = orchestrator(store.clone(), UploadSettings::default());

            let batch = vec![
                UploadRequest::new("a", PNG),
                UploadRequest::new("b", MP4),
                UploadRequest::new("c", PNG),
            ];
            let result = uploads.submit(batch, "posters").await;

            let ids: Vec<&str> = result.uploaded.iter().map(|u| u.public_id.as_str()).collect();
            assert_eq!(ids, vec!["a", "b", "c"]);
            assert_eq!(result.uploaded[1].resource_type, ResourceType::Video);
            assert_eq!(result.uploaded[1].format, "mp4");
            assert!(result.skipped.is_empty());
            assert!(result.failed.is_empty());
            assert_eq!(store.len(), 3);
        }

        #[tokio::test]
        async fn test_existing_asset_is_skipped_and_untouched() {
            let store = Arc::new(MemoryStore::default());
            let key = AssetKey::new("posters", "a").unwrap();
            store
                .upload(
                    &key,
                    &MediaPayload::new("image/png", b"original".to_vec()),
                    ResourceType::Image,
                    UploadOptions::create_only(),
                )
                .await
                .unwrap();

            let uploads = orchestrator(store.clone(), UploadSettings::default());
            let result = uploads
                .submit(vec![UploadRequest::new("a", PNG)], "posters")
                .await;

            assert_eq!(result.skipped, vec!["a".to_string()]);
            assert!(result.uploaded.is_empty());
            assert_eq!(store.contents(&key), Some(b"original".to_vec()));
        }

        #[tokio::test]
        async fn test_duplicate_inside_batch_is_skipped() {
            let store = Arc::new(MemoryStore::default());
            let uploads = orchestrator(store.clone(), UploadSettings::default());

            let result = uploads
                .submit(
                    vec![UploadRequest::new("a", PNG), UploadRequest::new("a", PNG)],
                    "posters",
                )
                .await;

            assert_eq!(result.uploaded.len(), 1);
            assert_eq!(result.skipped, vec!["a".to_string()]);
            assert!(result.failed.is_empty());
            assert_eq!(store.len(), 1);
        }

        #[tokio::test]
        async fn test_same_public_id_in_other_folder_is_new() {
            let store = Arc::new(MemoryStore::default());
            let uploads = orchestrator(store.clone(), UploadSettings::default());

            uploads.submit(vec![UploadRequest::new("a", PNG)], "one").await;
            let result = uploads.submit(vec![UploadRequest::new("a", PNG)], "two").await;

            assert_eq!(result.uploaded.len(), 1);
            assert_eq!(store.len(), 2);
        }

        #[tokio::test]
        async fn test_malformed_items_are_dropped() {
            let store = Arc::new(MemoryStore::default());
            let uploads = orchestrator(store.clone(), UploadSettings::default());

            let result = uploads
                .submit(
                    vec![
                        UploadRequest::new("", PNG),
                        UploadRequest::new("b", ""),
                        UploadRequest::new("c", PNG),
                    ],
                    "posters",
                )
                .await;

            assert_eq!(result.len(), 1);
            assert_eq!(result.uploaded[0].public_id, "c");
        }

        #[tokio::test]
        async fn test_bad_items_fail_without_affecting_others() {
            let store = Arc::new(MemoryStore::default());
            let uploads = orchestrator(store.clone(), UploadSettings::default());

            let result = uploads
                .submit(
                    vec![
                        UploadRequest::new("a", PNG),
                        UploadRequest::new("b", "not a data url"),
                        UploadRequest::new("c/d", PNG),
                    ],
                    "posters",
                )
                .await;

            assert_eq!(result.uploaded.len(), 1);
            let failed: Vec<&str> = result.failed.iter().map(|f| f.public_id.as_str()).collect();
            assert_eq!(failed, vec!["b", "c/d"]);
            assert_eq!(result.failed[0].error, "Payload must be a data URL");
        }

        #[tokio::test]
        async fn test_oversized_item_fails() {
            let store = Arc::new(MemoryStore::default());
            let settings = UploadSettings {
                max_file_size: 4,
                ..UploadSettings::default()
            };
            let uploads = orchestrator(store.clone(), settings);

            let result = uploads
                .submit(vec![UploadRequest::new("a", PNG)], "posters")
                .await;

            assert_eq!(result.failed.len(), 1);
            assert!(result.failed[0].error.starts_with("File too large"));
            assert!(store.is_empty());
        }

        #[tokio::test]
        async fn test_single_permit_still_completes() {
            let store = Arc::new(MemoryStore::default());
            let settings = UploadSettings {
                concurrency: 1,
                ..UploadSettings::default()
            };
            let uploads = orchestrator(store.clone(), settings);

            let batch = (0..10)
                .map(|i| UploadRequest::new(format!("item-{}", i), PNG))
                .collect();
            let result = uploads.submit(batch, "posters").await;

            assert_eq!(result.uploaded.len(), 10);
            assert_eq!(result.uploaded[9].public_id, "item-9");
        }
    }

    mod config_tests {
        use crate::config::{parse_duration, parse_size, StoreBackend};
        use crate::Config;
        use std::path::Path;
        use std::time::Duration;

        const MEMORY_CONFIG: &str = r#"
[auth]
email = "admin@example.com"
password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNoaGFzaA"
session_secret = "0123456789abcdef0123456789abcdef"

[store]
backend = "memory"
"#;

        #[test]
        fn test_config_load_missing_file() {
            let result = Config::load(Path::new("/nonexistent/mediadesk.toml"));
            assert!(result.is_err());
        }

        #[test]
        fn test_config_defaults() {
            let config = Config::parse(MEMORY_CONFIG).unwrap();
            assert_eq!(config.server.port, 3000);
            assert_eq!(config.auth.operator_id, "1");
            assert_eq!(config.store.backend, StoreBackend::Memory);
            assert_eq!(config.upload.max_batch_size, 50);
            assert_eq!(config.upload.max_file_size_bytes().unwrap(), 10 * 1024 * 1024);
            assert_eq!(config.listing.default_folder, "netflix-clone");
            assert_eq!(config.listing.page_size, 100);
            assert_eq!(
                config.auth.session_ttl().unwrap(),
                Duration::from_secs(7 * 24 * 60 * 60)
            );
        }

        #[test]
        fn test_config_load_valid_toml() {
            use std::io::Write;
            let config_path = std::env::temp_dir().join("test_mediadesk_config.toml");

            let mut file = std::fs::File::create(&config_path).unwrap();
            file.write_all(MEMORY_CONFIG.as_bytes()).unwrap();
            file.write_all(b"\n[listing]\ndefault_folder = \"catalog/posters\"\n")
                .unwrap();

            let config = Config::load(&config_path).unwrap();
            assert_eq!(config.listing.default_folder, "catalog/posters");

            std::fs::remove_file(&config_path).ok();
        }

        #[test]
        fn test_short_secret_rejected() {
            let content = MEMORY_CONFIG.replace("0123456789abcdef0123456789abcdef", "too-short");
            assert!(Config::parse(&content).is_err());
        }

        #[test]
        fn test_cloudinary_requires_credentials() {
            let content = MEMORY_CONFIG.replace("backend = \"memory\"", "backend = \"cloudinary\"");
            let err = Config::parse(&content).unwrap_err();
            assert!(err.to_string().contains("cloud_name"));
        }

        #[test]
        fn test_page_size_bounds() {
            let zero = format!("{}\n[listing]\npage_size = 0\n", MEMORY_CONFIG);
            assert!(Config::parse(&zero).is_err());
            let huge = format!("{}\n[listing]\npage_size = 501\n", MEMORY_CONFIG);
            assert!(Config::parse(&huge).is_err());
        }

        #[test]
        fn test_session_lifetime_upper_bound() {
            let year = MEMORY_CONFIG.replace(
                "[store]",
                "session_lifetime = \"365d\"\n\n[store]",
            );
            assert!(Config::parse(&year).is_ok());

            let huge = MEMORY_CONFIG.replace(
                "[store]",
                "session_lifetime = \"9999999999999d\"\n\n[store]",
            );
            let err = Config::parse(&huge).unwrap_err();
            assert!(err.to_string().contains("session_lifetime"));
        }

        #[test]
        fn test_zero_concurrency_rejected() {
            let content = format!("{}\n[upload]\nconcurrency = 0\n", MEMORY_CONFIG);
            assert!(Config::parse(&content).is_err());
        }

        #[test]
        fn test_parse_duration() {
            assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
            assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(900));
            assert_eq!(parse_duration("12h").unwrap(), Duration::from_secs(43_200));
            assert!(parse_duration("0d").is_err());
            assert!(parse_duration("7w").is_err());
            assert!(parse_duration("soon").is_err());
        }

        #[test]
        fn test_parse_size() {
            assert_eq!(parse_size("512").unwrap(), 512);
            assert_eq!(parse_size("64KB").unwrap(), 64 * 1024);
            assert_eq!(parse_size("1gb").unwrap(), 1024 * 1024 * 1024);
            assert!(parse_size("10XB").is_err());
        }

        #[test]
        fn test_starter_config_parses() {
            let secret = crate::cli::init::generate_secret();
            assert!(secret.len() >= 32);

            let starter = crate::cli::init::starter_config(&secret);
            let config: Config = toml::from_str(&starter).unwrap();
            assert_eq!(config.auth.session_secret, secret);
            assert_eq!(config.store.backend, StoreBackend::Cloudinary);
        }
    }
}
