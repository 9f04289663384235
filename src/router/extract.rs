//! Query and path extractors whose rejections render as [`ErrorServer`] JSON.

use axum::extract::FromRequestParts;

use crate::router::error::ErrorServer;

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ErrorServer))]
pub struct Query<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ErrorServer))]
pub struct Path<T>(pub T);
