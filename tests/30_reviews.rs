mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::TestServer;

#[tokio::test]
async fn one_review_per_user_and_spot() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = server.signup("owner@example.com").await?;
    let guest = server.signup("guest@example.com").await?;
    let spot_id = server.create_spot(&owner, "Cabin").await?;
    let path = format!("/spots/{spot_id}/reviews");

    let (status, review) = server.post(&path, Some(&guest), json!({ "review": "Great", "stars": 5 })).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(review["spotId"].as_i64(), Some(spot_id));
    assert_eq!(review["userId"].as_i64(), Some(guest.id));
    assert_eq!(review["stars"], 5);

    let (status, body) = server.post(&path, Some(&guest), json!({ "review": "Again", "stars": 4 })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "message": "User already has a review for this spot", "statusCode": 403 }));
    Ok(())
}

#[tokio::test]
async fn review_creation_checks_spot_then_body() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = server.signup("owner@example.com").await?;
    let guest = server.signup("guest@example.com").await?;
    let spot_id = server.create_spot(&owner, "Cabin").await?;

    let (status, _) = server.post("/spots/999/reviews", Some(&guest), json!({})).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = server
        .post("/spots/999/reviews", Some(&guest), json!({ "review": "Ok", "stars": "5" }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Spot couldn't be found");

    for stars in [json!(0), json!(6), json!(4.5), json!(null), json!("5")] {
        let (status, body) = server
            .post(&format!("/spots/{spot_id}/reviews"), Some(&guest), json!({ "review": "Ok", "stars": stars }))
            .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"]["stars"], "Stars must be an integer from 1 to 5");
    }

    let (status, body) = server
        .post(&format!("/spots/{spot_id}/reviews"), Some(&guest), json!({ "stars": 3 }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["review"], "Review text is required");
    Ok(())
}

#[tokio::test]
async fn spot_reviews_embed_user_and_images() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = server.signup("owner@example.com").await?;
    let guest = server.signup("guest@example.com").await?;
    let spot_id = server.create_spot(&owner, "Cabin").await?;
    let review_id = server.create_review(&guest, spot_id, 4).await?;

    let (status, image) = server
        .post(&format!("/reviews/{review_id}/images"), Some(&guest), json!({ "url": "r.jpg" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(image["imageableId"].as_i64(), Some(review_id));
    assert_eq!(image["url"], "r.jpg");

    let (status, body) = server.get(&format!("/spots/{spot_id}/reviews"), None).await?;
    assert_eq!(status, StatusCode::OK);
    let review = &body["Reviews"][0];
    assert_eq!(review["id"].as_i64(), Some(review_id));
    assert_eq!(review["User"]["id"].as_i64(), Some(guest.id));
    assert_eq!(review["User"]["firstName"], "Demo");
    assert_eq!(review["Images"][0]["url"], "r.jpg");
    assert!(review.get("Spot").is_none());
    Ok(())
}

#[tokio::test]
async fn current_reviews_include_spot_summary() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = server.signup("owner@example.com").await?;
    let guest = server.signup("guest@example.com").await?;
    let spot_id = server.create_spot(&owner, "Cabin").await?;
    server
        .post(&format!("/spots/{spot_id}/images"), Some(&owner), json!({ "url": "p.jpg", "previewImage": true }))
        .await?;
    server.create_review(&guest, spot_id, 5).await?;

    let (status, body) = server.get("/reviews/current", Some(&guest)).await?;
    assert_eq!(status, StatusCode::OK);
    let reviews = body["Reviews"].as_array().expect("Reviews array");
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["Spot"]["id"].as_i64(), Some(spot_id));
    assert_eq!(reviews[0]["Spot"]["ownerId"].as_i64(), Some(owner.id));
    assert_eq!(reviews[0]["Spot"]["previewImage"], "p.jpg");
    assert!(reviews[0]["Spot"].get("description").is_none());

    let (_, body) = server.get("/reviews/current", Some(&owner)).await?;
    assert_eq!(body["Reviews"], json!([]));
    Ok(())
}

#[tokio::test]
async fn review_images_are_capped_at_ten() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = server.signup("owner@example.com").await?;
    let guest = server.signup("guest@example.com").await?;
    let spot_id = server.create_spot(&owner, "Cabin").await?;
    let review_id = server.create_review(&guest, spot_id, 5).await?;
    let path = format!("/reviews/{review_id}/images");

    for n in 0..10 {
        let (status, _) = server.post(&path, Some(&guest), json!({ "url": format!("{n}.jpg") })).await?;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = server.post(&path, Some(&guest), json!({ "url": "eleven.jpg" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Maximum number of images for this resource was reached");
    Ok(())
}

#[tokio::test]
async fn parallel_review_uploads_never_pass_the_cap() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = server.signup("owner@example.com").await?;
    let guest = server.signup("guest@example.com").await?;
    let spot_id = server.create_spot(&owner, "Cabin").await?;
    let review_id = server.create_review(&guest, spot_id, 5).await?;
    let path = format!("/reviews/{review_id}/images");

    let uploads = (0..30).map(|n| server.post(&path, Some(&guest), json!({ "url": format!("{n}.jpg") })));
    let results = futures::future::join_all(uploads).await;

    let mut accepted = 0;
    for result in results {
        let (status, body) = result?;
        match status {
            StatusCode::OK => accepted += 1,
            StatusCode::FORBIDDEN => {
                assert_eq!(body["message"], "Maximum number of images for this resource was reached")
            }
            other => panic!("unexpected status {other}: {body}"),
        }
    }
    assert_eq!(accepted, 10);
    Ok(())
}

#[tokio::test]
async fn only_the_author_can_change_a_review() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = server.signup("owner@example.com").await?;
    let guest = server.signup("guest@example.com").await?;
    let spot_id = server.create_spot(&owner, "Cabin").await?;
    let review_id = server.create_review(&guest, spot_id, 3).await?;
    let path = format!("/reviews/{review_id}");

    let (status, body) = server.put(&path, Some(&owner), json!({ "review": "Mine now", "stars": 1 })).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Review couldn't be found");

    let (status, _) = server
        .post(&format!("{path}/images"), Some(&owner), json!({ "url": "x.jpg" }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server.delete(&path, Some(&owner)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = server.put(&path, Some(&guest), json!({ "review": "", "stars": 9 })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation error");
    assert_eq!(body["errors"]["review"], "Review text is required");
    assert_eq!(body["errors"]["stars"], "Stars must be an integer from 1 to 5");

    let (status, review) = server.put(&path, Some(&guest), json!({ "review": "Better", "stars": 4 })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(review["review"], "Better");
    assert_eq!(review["stars"], 4);
    Ok(())
}

#[tokio::test]
async fn deleted_reviews_stay_deleted() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = server.signup("owner@example.com").await?;
    let guest = server.signup("guest@example.com").await?;
    let spot_id = server.create_spot(&owner, "Cabin").await?;
    let review_id = server.create_review(&guest, spot_id, 2).await?;
    let path = format!("/reviews/{review_id}");

    let (status, body) = server.delete(&path, Some(&guest)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully deleted");

    let (status, _) = server.delete(&path, Some(&guest)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The author may review the spot again once the old review is gone
    server.create_review(&guest, spot_id, 5).await?;
    let (_, spot) = server.get(&format!("/spots/{spot_id}"), None).await?;
    assert_eq!(spot["numReviews"], 1);
    assert_eq!(spot["avgRating"].as_f64(), Some(5.0));
    Ok(())
}
