//! Black-box HTTP test driving the router directly with `tower::ServiceExt::oneshot`.

use std::collections::BTreeMap;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use binnacle_core::config::{
    CommandConfig, Config, EnvironmentConfig, MutatorsConfig, RunConfig, ServerConfig, WorkDirConfig, WorkersConfig,
};
use binnacle_core::metric::{MetricDefRaw, MetricsConfig};
use binnacle_core::{Archive, Individual, Lineage, Metrics, MutatorTag};
use binnacle_server::{app_router, AppState};
use serde_json::{json, Value};
use tower::util::ServiceExt;

fn test_config(work_dir: &std::path::Path) -> Config {
    let mut fitness = BTreeMap::new();
    fitness.insert(
        "banana".to_string(),
        MetricDefRaw {
            fixed_axis: true,
            range: [0.0, 400.0],
            partitions: 5,
            index: 0,
        },
    );
    fitness.insert(
        "sinc".to_string(),
        MetricDefRaw {
            fixed_axis: false,
            range: [-0.5, 0.5],
            partitions: 0,
            index: 1,
        },
    );

    Config {
        mutators: MutatorsConfig {
            scale: BTreeMap::new(),
            by_type: BTreeMap::new(),
        },
        fitness: MetricsConfig { fitness },
        run: RunConfig {
            optimization_strategy_maximize: false,
            individuals_per_bin: 2,
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        work_dir: WorkDirConfig {
            base_dir: work_dir.to_path_buf(),
        },
        command: CommandConfig {
            cmd: "true".to_string(),
            gene_arg: "--gene".to_string(),
            static_args: String::new(),
        },
        workers: WorkersConfig {
            max_workers: 1,
            max_run_time_secs: 1,
            over_fill_executor: 1,
        },
        gene_template: work_dir.join("schema.yml"),
        metrics_location: "metrics.csv".to_string(),
        history_log: None,
        log_level: None,
        environment: EnvironmentConfig::default(),
    }
}

fn test_archive(config: &Config) -> Archive {
    let metrics = Metrics::from_config(&config.fitness);
    Archive::new(metrics, config.run.optimization_strategy_maximize, config.run.individuals_per_bin)
}

fn sample_individual() -> Value {
    let individual = Individual::new(
        json!({"learning_rate": 0.5}),
        Lineage {
            mutator: MutatorTag::Random,
            parent1_uuid: None,
            parent2_uuid: None,
            generation_num: 0,
        },
    );
    let mut value = serde_json::to_value(&individual).unwrap();
    value["metrics"] = json!({"banana": 120.0, "sinc": 0.2});
    value["trials"] = json!(5);
    value
}

#[tokio::test]
async fn submit_then_get_state_round_trips_the_individual() {
    let tmp = std::env::temp_dir().join(format!("binnacle-server-test-{}", uuid::Uuid::new_v4()));
    let config = test_config(&tmp);
    let archive = test_archive(&config);
    let state = AppState::new(config, archive);
    let app = app_router(state);

    let submit_body = serde_json::to_vec(&sample_individual()).unwrap();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/submit")
                .header("content-type", "application/json")
                .body(Body::from(submit_body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let submit_response: Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(submit_response["status"], "successfully stored");

    let response = app
        .oneshot(Request::builder().method("GET").uri("/get_state").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let wire: Value = serde_json::from_slice(&body_bytes).unwrap();
    let bins = wire["bins"].as_object().unwrap();
    let has_individual = bins
        .values()
        .any(|individuals| individuals.as_array().unwrap().iter().any(|i| i["metrics"]["banana"] == 120.0));
    assert!(has_individual, "expected the posted individual to appear in a bin");
}

#[tokio::test]
async fn malformed_submission_is_rejected_without_touching_the_archive() {
    let tmp = std::env::temp_dir().join(format!("binnacle-server-test-{}", uuid::Uuid::new_v4()));
    let config = test_config(&tmp);
    let archive = test_archive(&config);
    let state = AppState::new(config, archive);
    let app = app_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/submit")
                .header("content-type", "application/json")
                .body(Body::from("{ not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
