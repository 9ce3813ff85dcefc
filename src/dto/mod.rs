//! Request and response bodies of the HTTP API.

pub mod log_sheet_dto;
pub mod trip_dto;
