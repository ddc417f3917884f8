//! Response-shape documentation attached to each route, as literal JSON.
//! These are metadata for API consumers; nothing validates them against the
//! functions' actual responses.

pub const GET_PRODUCT_LIST: &str = r#"{"responses": [{"code": 200, "responseBody": [{"id": "string", "name": "string", "price": "double"}]}, {"code": 400, "responseBody": {"message": "No record found"}}, {"code": 500, "responseBody": {"message": "Internal server error"}}]}"#;

pub const GET_PRODUCT_BY_ID: &str = r#"{"responses": [{"code": 200, "responseBody": {"id": "string", "name": "string", "price": "double"}}, {"code": 400, "responseBody": {"message": "No record found for the id or Invalid id format"}}, {"code": 500, "responseBody": {"message": "Internal server error"}}]}"#;

pub const ADD_PRODUCT: &str = r#"{"responses": [{"code": 200, "responseBody": {"id": "string", "name": "string", "price": "double"}}, {"code": 400, "responseBody": {"message": "Invalid request, name and price cannot be null or empty"}}, {"code": 500, "responseBody": {"message": "Internal server error"}}]}"#;

pub const UPDATE_PRODUCT: &str = r#"{"responses": [{"code": 200, "responseBody": {"id": "string", "name": "string", "price": "double"}}, {"code": 400, "responseBody": {"message": "No record found for id or Invalid UUID"}}, {"code": 500, "responseBody": {"message": "Internal server error"}}]}"#;

pub const DELETE_PRODUCT: &str = r#"{"responses": [{"code": 200, "responseBody": {"message": "Record deleted for id:<input id>"}}, {"code": 400, "responseBody": {"message": "No record found for id or Invalid UUID"}}, {"code": 500, "responseBody": {"message": "Internal server error"}}]}"#;
