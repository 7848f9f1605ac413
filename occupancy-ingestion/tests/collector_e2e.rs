use std::path::{Path, PathBuf};

use occupancy_ingestion::{collector::build_pipeline, config::AppConfig};
use serde_json::json;
use time::{macros::datetime, OffsetDateTime};
use wiremock::{
    matchers::{method, path, query_param, query_param_is_missing},
    Mock, MockServer, ResponseTemplate,
};

const SEARCH_PATH: &str = "/api/records/1.0/search/";
const HEADER: &str = "date,heure,type,sous_type,nom,occupe,capacite,taux_saturation";
const AT: OffsetDateTime = datetime!(2024-05-02 18:20:00 +02:00);

fn config(server: &MockServer, output: &Path) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.api.base_url = format!("{}{SEARCH_PATH}", server.uri());
    cfg.output.path = PathBuf::from(output);
    cfg
}

async fn mount_pool(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("dataset", "bor_frequentation_piscine_tr"))
        .and(query_param("q", "Judaïque"))
        .and(query_param("rows", "5"))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_parking(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("dataset", "st_park_p"))
        .and(query_param("rows", "100"))
        .and(query_param_is_missing("q"))
        .respond_with(response)
        .mount(server)
        .await;
}

fn pool_body() -> serde_json::Value {
    json!({
        "nhits": 2,
        "records": [
            {"fields": {"fmicourante": 20, "fmizonmax": 50, "fmizonlib": "Loisirs"}},
            {"fields": {"fmizonlib": "Fermé"}}
        ]
    })
}

fn parking_body() -> serde_json::Value {
    json!({
        "nhits": 4,
        "records": [
            {"fields": {"nom": "Parking Mériadeck", "total": 200, "libres": 50}},
            {"fields": {"nom": "Parking Inconnu Sud", "total": 100, "libres": 10}},
            {"fields": {"nom": "Parc-relais Buttinière", "total": 400, "libres": 100}},
            {"fields": {"nom": "Parking Tourny", "total": 0, "libres": 0}}
        ]
    })
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn writes_pool_and_parking_rows_to_new_file() {
    let server = MockServer::start().await;
    mount_pool(&server, ResponseTemplate::new(200).set_body_json(pool_body())).await;
    mount_parking(&server, ResponseTemplate::new(200).set_body_json(parking_body())).await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("data_bordeaux.csv");

    let summary = build_pipeline(&config(&server, &out))
        .unwrap()
        .run(AT)
        .await
        .unwrap();

    assert_eq!(summary.rows_written, 3);
    assert_eq!(
        read_lines(&out),
        vec![
            HEADER,
            "2024-05-02 18:20:00.000000,18,Piscine,Sport,Judaïque - Loisirs,20,50,40.0",
            "2024-05-02 18:20:00.000000,18,Mobilité,Parking Centre,Parking Mériadeck,150,200,75.0",
            "2024-05-02 18:20:00.000000,18,Mobilité,Parking P+R,Parc-relais Buttinière,300,400,75.0",
        ]
    );
}

#[tokio::test]
async fn pool_failure_does_not_prevent_parking_rows() {
    let server = MockServer::start().await;
    mount_pool(&server, ResponseTemplate::new(500)).await;
    mount_parking(&server, ResponseTemplate::new(200).set_body_json(parking_body())).await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("data_bordeaux.csv");

    let summary = build_pipeline(&config(&server, &out))
        .unwrap()
        .run(AT)
        .await
        .unwrap();

    assert_eq!(summary.failed_sources().collect::<Vec<_>>(), vec!["pool"]);
    assert_eq!(summary.rows_written, 2);
    let lines = read_lines(&out);
    assert_eq!(lines.len(), 3);
    assert!(lines[1..].iter().all(|l| l.contains(",Mobilité,")));
}

#[tokio::test]
async fn malformed_parking_body_keeps_pool_rows() {
    let server = MockServer::start().await;
    mount_pool(&server, ResponseTemplate::new(200).set_body_json(pool_body())).await;
    mount_parking(&server, ResponseTemplate::new(200).set_body_string("<html>maintenance</html>")).await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("data_bordeaux.csv");

    let summary = build_pipeline(&config(&server, &out))
        .unwrap()
        .run(AT)
        .await
        .unwrap();

    assert_eq!(summary.failed_sources().collect::<Vec<_>>(), vec!["parking"]);
    assert_eq!(summary.rows_written, 1);
}

#[tokio::test]
async fn second_run_appends_duplicate_rows_under_one_header() {
    let server = MockServer::start().await;
    mount_pool(&server, ResponseTemplate::new(200).set_body_json(pool_body())).await;
    mount_parking(&server, ResponseTemplate::new(200).set_body_json(parking_body())).await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("data_bordeaux.csv");
    let cfg = config(&server, &out);

    build_pipeline(&cfg).unwrap().run(AT).await.unwrap();
    build_pipeline(&cfg).unwrap().run(AT).await.unwrap();

    let lines = read_lines(&out);
    assert_eq!(lines.len(), 7);
    assert_eq!(lines.iter().filter(|l| *l == HEADER).count(), 1);
    assert_eq!(lines[1], lines[4]);
}

#[tokio::test]
async fn no_data_leaves_no_file() {
    let server = MockServer::start().await;
    mount_pool(&server, ResponseTemplate::new(200).set_body_json(json!({"nhits": 0, "records": []}))).await;
    mount_parking(&server, ResponseTemplate::new(503)).await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("data_bordeaux.csv");

    let summary = build_pipeline(&config(&server, &out))
        .unwrap()
        .run(AT)
        .await
        .unwrap();

    assert_eq!(summary.rows_written, 0);
    assert!(!out.exists());
}
