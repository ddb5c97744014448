//! EVS volume create/update/delete against a mock endpoint

mod common;

use common::*;
use httpmock::prelude::*;
use serde_json::{Value, json};
use skyform_core::{Error, Resource, ResourceData, ResourceTimeouts};
use skyform_provider::VolumeResource;
use std::time::{Duration, Instant};

fn volume(status: &str, size: i64) -> Value {
    json!({
        "volume": {
            "id": "vol-1",
            "name": "data",
            "status": status,
            "size": size,
            "availability_zone": "az-1",
            "volume_type": "SSD",
            "attachments": [],
        }
    })
}

fn resource_for(server: &MockServer) -> VolumeResource {
    VolumeResource::new(config_for(server, "evs"), reqwest::Client::new()).with_poll_timings(FAST)
}

fn planned() -> ResourceData {
    ResourceData::new(json!({
        "name": "data",
        "availability_zone": "az-1",
        "volume_type": "SSD",
        "size": 10,
        "tags": {"team": "storage"},
    }))
    .unwrap()
}

#[tokio::test]
async fn create_follows_the_job_to_the_volume() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v2.1/proj/cloudvolumes")
                .json_body(json!({"volume": {
                    "name": "data",
                    "availability_zone": "az-1",
                    "volume_type": "SSD",
                    "size": 10,
                    "tags": {"team": "storage"},
                }}));
            then.status(202).json_body(json!({"job_id": "job-1"}));
        })
        .await;
    let job = server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/proj/jobs/job-1");
            then.status(200).json_body(json!({
                "job_id": "job-1",
                "status": "SUCCESS",
                "entities": {"volume_id": "vol-1"},
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/proj/cloudvolumes/vol-1");
            then.status(200).json_body(volume("available", 10));
        })
        .await;

    let mut d = planned();
    resource_for(&server).create(&mut d).await.unwrap();

    create.assert_async().await;
    job.assert_async().await;
    assert_eq!(d.id(), Some("vol-1"));
    assert_eq!(d.get_str("status"), Some("available"));
    assert_eq!(d.get_i64("size"), Some(10));
}

#[tokio::test]
async fn create_uses_volume_id_from_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v2.1/proj/cloudvolumes");
            then.status(202)
                .json_body(json!({"job_id": "job-1", "volume_ids": ["vol-1"]}));
        })
        .await;
    let job = server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/proj/jobs/job-1");
            then.status(500);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/proj/cloudvolumes/vol-1");
            then.status(200).json_body(volume("available", 10));
        })
        .await;

    let mut d = planned();
    resource_for(&server).create(&mut d).await.unwrap();

    job.assert_hits_async(0).await;
    assert_eq!(d.id(), Some("vol-1"));
}

#[tokio::test]
async fn failed_job_reports_the_backend_reason() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v2.1/proj/cloudvolumes");
            then.status(202).json_body(json!({"job_id": "job-1"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/proj/jobs/job-1");
            then.status(200).json_body(json!({
                "job_id": "job-1",
                "status": "FAIL",
                "fail_reason": "insufficient capacity",
            }));
        })
        .await;

    let mut d = planned();
    let err = resource_for(&server).create(&mut d).await.unwrap_err();

    assert!(err.to_string().contains("insufficient capacity"), "{err}");
    assert!(d.id().is_none());
}

#[tokio::test]
async fn slow_job_and_volume_wait_share_the_create_deadline() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v2.1/proj/cloudvolumes");
            then.status(202).json_body(json!({"job_id": "job-1"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/proj/jobs/job-1");
            then.status(200)
                .delay(Duration::from_millis(900))
                .json_body(json!({
                    "job_id": "job-1",
                    "status": "SUCCESS",
                    "entities": {"volume_id": "vol-1"},
                }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/proj/cloudvolumes/vol-1");
            then.status(200).json_body(volume("creating", 10));
        })
        .await;

    let mut d = planned().with_timeouts(ResourceTimeouts {
        create_secs: 1,
        update_secs: 60,
        delete_secs: 60,
    });
    let start = Instant::now();
    let err = resource_for(&server).create(&mut d).await.unwrap_err();

    assert!(err.is_timeout(), "{err}");
    assert!(start.elapsed() < Duration::from_millis(1500), "{:?}", start.elapsed());
    assert_eq!(d.id(), Some("vol-1"));
}

#[tokio::test]
async fn growing_size_extends_the_volume() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/proj/cloudvolumes/vol-1");
            then.status(200).json_body(volume("in-use", 10));
        })
        .await;
    let extend = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v2.1/proj/cloudvolumes/vol-1/action")
                .json_body(json!({"os-extend": {"new_size": 20}}));
            then.status(202).json_body(json!({"job_id": "job-2"}));
        })
        .await;

    let mut d = ResourceData::from_state("vol-1", json!({"name": "data", "size": 10})).unwrap();
    d.plan(json!({"name": "data", "size": 20})).unwrap();

    resource_for(&server).update(&mut d).await.unwrap();

    extend.assert_async().await;
}

#[tokio::test]
async fn shrinking_size_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/proj/cloudvolumes/vol-1");
            then.status(200).json_body(volume("available", 10));
        })
        .await;
    let extend = server
        .mock_async(|when, then| {
            when.method(POST).path("/v2.1/proj/cloudvolumes/vol-1/action");
            then.status(202);
        })
        .await;

    let mut d = ResourceData::from_state("vol-1", json!({"size": 10})).unwrap();
    d.plan(json!({"size": 5})).unwrap();
    let err = resource_for(&server).update(&mut d).await.unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
    extend.assert_hits_async(0).await;
}

#[tokio::test]
async fn delete_repeats_request_until_volume_is_gone() {
    let server = MockServer::start_async().await;
    let mut present = server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/proj/cloudvolumes/vol-1");
            then.status(200).json_body(volume("available", 10));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/v2/proj/cloudvolumes/vol-1")
                .query_param("cascade", "true");
            then.status(202);
        })
        .await;

    let resource = resource_for(&server);
    let mut d = ResourceData::from_state("vol-1", json!({"cascade": true})).unwrap();

    let volume_goes_away = async {
        // The volume still reports available after the first request
        wait_for_hits(&delete, 2).await;
        present.delete_async().await;
    };
    let (result, ()) = tokio::join!(resource.delete(&mut d), volume_goes_away);

    result.unwrap();
    assert!(d.id().is_none());
    assert!(delete.hits_async().await >= 2);
}

#[tokio::test]
async fn delete_is_not_repeated_once_volume_is_deleting() {
    let server = MockServer::start_async().await;
    let mut deleting = server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/proj/cloudvolumes/vol-1");
            then.status(200).json_body(volume("deleting", 10));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/v2/proj/cloudvolumes/vol-1");
            then.status(202);
        })
        .await;

    let resource = resource_for(&server);
    let mut d = ResourceData::from_state("vol-1", json!({})).unwrap();

    let volume_goes_away = async {
        wait_for_hits(&deleting, 2).await;
        deleting.delete_async().await;
    };
    let (result, ()) = tokio::join!(resource.delete(&mut d), volume_goes_away);

    result.unwrap();
    delete.assert_hits_async(0).await;
}
