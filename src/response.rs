//! Standard response envelope helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
pub struct Created {
    pub success: bool,
    pub id: Value,
    pub data: Value,
}

#[derive(Serialize)]
pub struct SuccessOne {
    pub success: bool,
    pub data: Value,
}

#[derive(Serialize)]
pub struct SuccessMany {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Value>,
}

#[derive(Serialize)]
pub struct SuccessMessage {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct Deleted {
    pub success: bool,
    pub deleted: u64,
}

pub fn created(id: Value, data: Value) -> (StatusCode, Json<Created>) {
    (
        StatusCode::CREATED,
        Json(Created {
            success: true,
            id,
            data,
        }),
    )
}

pub fn success_one(data: Value) -> (StatusCode, Json<SuccessOne>) {
    (StatusCode::OK, Json(SuccessOne { success: true, data }))
}

pub fn success_many(data: Vec<Value>) -> (StatusCode, Json<SuccessMany>) {
    let count = data.len();
    (
        StatusCode::OK,
        Json(SuccessMany {
            success: true,
            count,
            data,
        }),
    )
}

pub fn success_message(message: String) -> (StatusCode, Json<SuccessMessage>) {
    (
        StatusCode::OK,
        Json(SuccessMessage {
            success: true,
            message,
        }),
    )
}

pub fn deleted(count: u64) -> (StatusCode, Json<Deleted>) {
    (
        StatusCode::OK,
        Json(Deleted {
            success: true,
            deleted: count,
        }),
    )
}
