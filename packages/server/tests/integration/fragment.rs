use image::ImageFormat;

use crate::common::{TestApp, routes, sample_image};

mod auth {
    use super::*;

    #[tokio::test]
    async fn requests_without_token_are_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::FRAGMENTS).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["status"], "error");
        assert_eq!(res.body["error"]["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn create_without_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::FRAGMENTS, "text/plain", "hello")
            .await;

        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn malformed_or_forged_tokens_are_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_raw_auth(routes::FRAGMENTS, "Basic abc").await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["error"]["code"], "TOKEN_INVALID");

        let res = app.get_with_token(routes::FRAGMENTS, "not-a-jwt").await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["error"]["code"], "TOKEN_INVALID");
    }
}

mod create {
    use super::*;

    #[tokio::test]
    async fn plain_text_fragment_is_created() {
        let app = TestApp::spawn().await;
        let token = app.token_for("user1@email.com");

        let res = app
            .post_raw(routes::FRAGMENTS, "text/plain", "This is a fragment", &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], "ok");
        let fragment = &res.body["fragment"];
        let id = fragment["id"].as_str().unwrap();
        assert_eq!(fragment["type"], "text/plain");
        assert_eq!(fragment["size"], 18);
        assert_eq!(fragment["ownerId"].as_str().unwrap().len(), 64);
        assert_eq!(fragment["created"], fragment["updated"]);
        assert!(res.location().ends_with(&routes::fragment(id)));
    }

    #[tokio::test]
    async fn type_parameters_are_kept() {
        let app = TestApp::spawn().await;
        let token = app.token_for("user1@email.com");

        let res = app
            .post_raw(routes::FRAGMENTS, "text/plain; charset=utf-8", "0123456789abcdef", &token)
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["fragment"]["type"], "text/plain; charset=utf-8");
        assert_eq!(res.body["fragment"]["size"], 16);
    }

    #[tokio::test]
    async fn unsupported_type_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.token_for("user1@email.com");

        let res = app
            .post_raw(routes::FRAGMENTS, "audio/mpeg", vec![1u8, 2, 3], &token)
            .await;

        assert_eq!(res.status, 415);
        assert_eq!(res.body["error"]["code"], "UNSUPPORTED_MEDIA_TYPE");
    }

    #[tokio::test]
    async fn empty_body_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.token_for("user1@email.com");

        let res = app
            .post_raw(routes::FRAGMENTS, "text/plain", Vec::<u8>::new(), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = TestApp::spawn_with_limit(8).await;
        let token = app.token_for("user1@email.com");

        let res = app
            .post_raw(routes::FRAGMENTS, "text/plain", "more than eight bytes", &token)
            .await;

        assert_eq!(res.status, 413);
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn data_is_returned_with_stored_type() {
        let app = TestApp::spawn().await;
        let token = app.token_for("user1@email.com");
        let id = app
            .create_fragment("text/plain; charset=utf-8", "hello world", &token)
            .await;

        let res = app.get_with_token(&routes::fragment(&id), &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.content_type(), "text/plain; charset=utf-8");
        assert_eq!(res.text, "hello world");
    }

    #[tokio::test]
    async fn markdown_is_served_as_html() {
        let app = TestApp::spawn().await;
        let token = app.token_for("user1@email.com");
        let id = app.create_fragment("text/markdown", "# Hi", &token).await;

        let res = app.get_with_token(&routes::fragment_as(&id, "html"), &token).await;

        assert_eq!(res.status, 200);
        assert!(res.content_type().starts_with("text/html"));
        assert!(res.text.contains("<h1>Hi</h1>"));
    }

    #[tokio::test]
    async fn png_is_served_as_webp() {
        let app = TestApp::spawn().await;
        let token = app.token_for("user1@email.com");
        let id = app
            .create_fragment("image/png", sample_image(ImageFormat::Png), &token)
            .await;

        let res = app.get_with_token(&routes::fragment_as(&id, "webp"), &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.content_type(), "image/webp");
        assert_eq!(image::guess_format(&res.bytes).unwrap(), ImageFormat::WebP);
    }

    #[tokio::test]
    async fn disallowed_conversion_is_unsupported() {
        let app = TestApp::spawn().await;
        let token = app.token_for("user1@email.com");
        let id = app.create_fragment("text/plain", "hello", &token).await;

        let res = app.get_with_token(&routes::fragment_as(&id, "html"), &token).await;
        assert_eq!(res.status, 415);
        assert_eq!(res.body["error"]["code"], "UNSUPPORTED_MEDIA_TYPE");

        let res = app.get_with_token(&routes::fragment_as(&id, "docx"), &token).await;
        assert_eq!(res.status, 415);
    }

    #[tokio::test]
    async fn corrupt_image_conversion_fails() {
        let app = TestApp::spawn().await;
        let token = app.token_for("user1@email.com");
        let id = app.create_fragment("image/png", "not really a png", &token).await;

        let res = app.get_with_token(&routes::fragment_as(&id, "jpg"), &token).await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["error"]["code"], "CONVERSION_FAILED");
    }

    #[tokio::test]
    async fn info_returns_metadata() {
        let app = TestApp::spawn().await;
        let token = app.token_for("user1@email.com");
        let id = app.create_fragment("application/json", r#"{"a":1}"#, &token).await;

        let res = app.get_with_token(&routes::fragment_info(&id), &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["fragment"]["id"], id.as_str());
        assert_eq!(res.body["fragment"]["type"], "application/json");
        assert_eq!(res.body["fragment"]["size"], 7);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.token_for("user1@email.com");

        let res = app.get_with_token(&routes::fragment("missing"), &token).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["error"]["code"], "NOT_FOUND");

        let res = app.get_with_token(&routes::fragment_info("missing"), &token).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn other_owners_cannot_see_fragment() {
        let app = TestApp::spawn().await;
        let alice = app.token_for("alice@email.com");
        let bob = app.token_for("bob@email.com");
        let id = app.create_fragment("text/plain", "secret", &alice).await;

        let res = app.get_with_token(&routes::fragment(&id), &bob).await;
        assert_eq!(res.status, 404);

        let res = app.delete_with_token(&routes::fragment(&id), &bob).await;
        assert_eq!(res.status, 404);

        let res = app.get_with_token(routes::FRAGMENTS, &bob).await;
        assert_eq!(res.body["fragments"], serde_json::json!([]));

        let res = app.get_with_token(&routes::fragment(&id), &alice).await;
        assert_eq!(res.status, 200);
    }
}

mod list {
    use super::*;

    #[tokio::test]
    async fn lists_ids_in_creation_order() {
        let app = TestApp::spawn().await;
        let token = app.token_for("user1@email.com");
        let first = app.create_fragment("text/plain", "one", &token).await;
        let second = app.create_fragment("text/markdown", "two", &token).await;

        let res = app.get_with_token(routes::FRAGMENTS, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "ok");
        assert_eq!(res.body["fragments"], serde_json::json!([first, second]));
    }

    #[tokio::test]
    async fn expand_returns_metadata() {
        let app = TestApp::spawn().await;
        let token = app.token_for("user1@email.com");
        let id = app.create_fragment("text/plain", "one", &token).await;

        for flag in ["true", "1"] {
            let res = app
                .get_with_token(&format!("{}?expand={flag}", routes::FRAGMENTS), &token)
                .await;
            let fragments = res.body["fragments"].as_array().unwrap();
            assert_eq!(fragments.len(), 1);
            assert_eq!(fragments[0]["id"], id.as_str());
            assert_eq!(fragments[0]["size"], 3);
        }

        let res = app
            .get_with_token(&format!("{}?expand=no", routes::FRAGMENTS), &token)
            .await;
        assert_eq!(res.body["fragments"], serde_json::json!([id]));
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn data_is_replaced() {
        let app = TestApp::spawn().await;
        let token = app.token_for("user1@email.com");
        let id = app.create_fragment("text/plain", "before", &token).await;

        let res = app
            .put_raw(&routes::fragment(&id), "text/plain", "after the update", &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["fragment"]["size"], 16);
        assert_ne!(res.body["fragment"]["updated"], res.body["fragment"]["created"]);

        let res = app.get_with_token(&routes::fragment(&id), &token).await;
        assert_eq!(res.text, "after the update");
    }

    #[tokio::test]
    async fn changing_type_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.token_for("user1@email.com");
        let id = app.create_fragment("text/plain", "before", &token).await;

        let res = app
            .put_raw(&routes::fragment(&id), "text/html", "<p>after</p>", &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["error"]["code"], "TYPE_MISMATCH");

        let res = app.get_with_token(&routes::fragment(&id), &token).await;
        assert_eq!(res.text, "before");
    }

    #[tokio::test]
    async fn unsupported_replacement_type_is_a_mismatch() {
        let app = TestApp::spawn().await;
        let token = app.token_for("user1@email.com");
        let id = app.create_fragment("text/plain", "before", &token).await;

        let res = app
            .put_raw(&routes::fragment(&id), "application/pdf", "%PDF-1.7", &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["error"]["code"], "TYPE_MISMATCH");

        let res = app.get_with_token(&routes::fragment_info(&id), &token).await;
        assert_eq!(res.body["fragment"]["size"], 6);
    }

    #[tokio::test]
    async fn missing_fragment_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.token_for("user1@email.com");

        let res = app
            .put_raw(&routes::fragment("missing"), "text/plain", "x", &token)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn deleted_fragment_is_gone() {
        let app = TestApp::spawn().await;
        let token = app.token_for("user1@email.com");
        let id = app.create_fragment("text/plain", "bye", &token).await;

        let res = app.delete_with_token(&routes::fragment(&id), &token).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "ok");

        let res = app.get_with_token(&routes::fragment(&id), &token).await;
        assert_eq!(res.status, 404);

        let res = app.delete_with_token(&routes::fragment(&id), &token).await;
        assert_eq!(res.status, 404);
    }
}

mod filesystem {
    use super::*;

    #[tokio::test]
    async fn full_lifecycle_on_disk() {
        let app = TestApp::spawn_filesystem().await;
        let token = app.token_for("user1@email.com");
        let id = app.create_fragment("text/markdown", "# Disk", &token).await;

        let res = app.get_with_token(&routes::fragment_as(&id, "html"), &token).await;
        assert_eq!(res.status, 200);
        assert!(res.text.contains("<h1>Disk</h1>"));

        let res = app
            .put_raw(&routes::fragment(&id), "text/markdown", "## Updated", &token)
            .await;
        assert_eq!(res.status, 200);

        let res = app.get_with_token(&routes::fragment(&id), &token).await;
        assert_eq!(res.text, "## Updated");

        let res = app.delete_with_token(&routes::fragment(&id), &token).await;
        assert_eq!(res.status, 200);

        let res = app.get_with_token(routes::FRAGMENTS, &token).await;
        assert_eq!(res.body["fragments"], serde_json::json!([]));
    }
}
