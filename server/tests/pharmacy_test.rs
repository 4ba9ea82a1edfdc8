//! Integration tests for the medicine inventory and its broadcasts.

mod common;

use common::{connect, next_of_type, start_test_server, TestServer};
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn add_medicine(client: &reqwest::Client, server: &TestServer, name: &str, quantity: i64) -> Value {
    let resp = client
        .post(server.url("/api/medicines"))
        .json(&json!({
            "name": name,
            "category": "analgesic",
            "quantity": quantity,
            "unitPrice": 0.25,
            "expiryDate": "2027-06-30"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn test_added_medicine_is_broadcast_to_all_clinical_sockets() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();
    let mut patient = connect(&server, "/ws?patientId=p1").await;
    let mut pharmacist = connect(&server, "/ws?pharmacistId=ph1").await;
    let mut biomedical = connect(&server, "/ws/biomedical?biomedicalUserId=b1").await;

    let created = add_medicine(&client, &server, "Paracetamol", 100).await;
    assert_eq!(created["quantity"], 100);

    for ws in [&mut patient, &mut pharmacist] {
        let event = next_of_type(ws, "medicine-added").await;
        assert_eq!(event["data"]["id"], created["id"]);
        assert_eq!(event["data"]["name"], "Paracetamol");
    }
    common::assert_silent(&mut biomedical).await;
}

#[tokio::test]
async fn test_update_is_partial() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();
    let created = add_medicine(&client, &server, "Ibuprofen", 40).await;
    let id = created["id"].as_str().unwrap();

    let mut pharmacist = connect(&server, "/ws?pharmacistId=ph1").await;

    let resp = client
        .put(server.url(&format!("/api/medicines/{}", id)))
        .json(&json!({"quantity": 55}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["quantity"], 55);
    assert_eq!(updated["name"], "Ibuprofen");
    assert_eq!(updated["category"], "analgesic");

    let event = next_of_type(&mut pharmacist, "medicine-updated").await;
    assert_eq!(event["data"]["quantity"], 55);

    let negative = client
        .put(server.url(&format!("/api/medicines/{}", id)))
        .json(&json!({"quantity": -1}))
        .send()
        .await
        .unwrap();
    assert_eq!(negative.status(), StatusCode::BAD_REQUEST);

    let missing = client
        .put(server.url("/api/medicines/nope"))
        .json(&json!({"quantity": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dispense_decrements_and_notifies_patient() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();
    let created = add_medicine(&client, &server, "Amoxicillin", 10).await;
    let id = created["id"].as_str().unwrap();

    let mut patient = connect(&server, "/ws?patientId=p1").await;

    let resp = client
        .post(server.url(&format!("/api/medicines/{}/dispense", id)))
        .json(&json!({"quantity": 4, "patientId": "p1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let medicine: Value = resp.json().await.unwrap();
    assert_eq!(medicine["quantity"], 6);

    let dispensed = next_of_type(&mut patient, "medicine-dispensed").await;
    assert_eq!(dispensed["data"]["quantity"], 4);
    assert_eq!(dispensed["data"]["patientId"], "p1");
    assert_eq!(dispensed["data"]["medicine"]["quantity"], 6);

    let note = next_of_type(&mut patient, "notification").await;
    assert!(note["data"]["message"].as_str().unwrap().contains("Amoxicillin"));
}

#[tokio::test]
async fn test_dispense_beyond_stock_conflicts() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();
    let created = add_medicine(&client, &server, "Insulin", 3).await;
    let id = created["id"].as_str().unwrap();

    let resp = client
        .post(server.url(&format!("/api/medicines/{}/dispense", id)))
        .json(&json!({"quantity": 5}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let inventory: Vec<Value> = client
        .get(server.url("/api/medicines"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0]["quantity"], 3);

    let zero = client
        .post(server.url(&format!("/api/medicines/{}/dispense", id)))
        .json(&json!({"quantity": 0}))
        .send()
        .await
        .unwrap();
    assert_eq!(zero.status(), StatusCode::BAD_REQUEST);

    let unknown = client
        .post(server.url("/api/medicines/unknown/dispense"))
        .json(&json!({"quantity": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_inventory_sorted_by_name() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();
    add_medicine(&client, &server, "zinc", 1).await;
    add_medicine(&client, &server, "Aspirin", 1).await;

    let inventory: Vec<Value> = client
        .get(server.url("/api/medicines"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = inventory.iter().map(|m| m["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Aspirin", "zinc"]);
}
