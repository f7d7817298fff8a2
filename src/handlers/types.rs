//! # Common API Types
//!
//! Pagination envelope and request-parsing helpers shared by the list and
//! create endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, validation_error};
use crate::repositories::PageRequest;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Page selection accepted by every list endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    /// 1-based page number (default: 1)
    pub page: Option<i64>,
    /// Page size (default: 20, max: 100)
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn to_page_request(&self) -> Result<PageRequest, ApiError> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);

        if page < 1 {
            return Err(validation_error(
                "Invalid pagination",
                serde_json::json!({ "page": "must be at least 1" }),
            ));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(validation_error(
                "Invalid pagination",
                serde_json::json!({ "limit": format!("must be between 1 and {MAX_PAGE_SIZE}") }),
            ));
        }

        // SQL OFFSET is a signed 64-bit value.
        if (page - 1).checked_mul(limit).is_none() {
            return Err(validation_error(
                "Invalid pagination",
                serde_json::json!({ "page": "is too large" }),
            ));
        }

        Ok(PageRequest {
            page: page as u64,
            limit: limit as u64,
        })
    }
}

/// Pagination metadata returned with every list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 20)]
    pub limit: u64,
    /// Total number of matching rows
    #[schema(example = 42)]
    pub total: u64,
    /// `ceil(total / limit)`
    #[schema(example = 3)]
    pub pages: u64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: u64) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages: total.div_ceil(request.limit),
        }
    }
}

/// Trim a string, treating blank input as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an optional UUID parameter, naming the field in the error.
pub fn parse_uuid(field: &str, value: Option<&str>) -> Result<Option<Uuid>, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            Uuid::parse_str(v).map_err(|_| {
                validation_error(
                    &format!("{field} must be a valid UUID"),
                    serde_json::json!({ field: "Must be a valid UUID" }),
                )
            })
        })
        .transpose()
}

/// Parse an optional enum parameter through its `FromStr` impl.
pub fn parse_enum<T: std::str::FromStr>(field: &str, value: Option<&str>) -> Result<Option<T>, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<T>().map_err(|_| {
                validation_error(
                    &format!("Invalid {field}: {v}"),
                    serde_json::json!({ field: "Unknown value" }),
                )
            })
        })
        .transpose()
}

/// A date accepted either as RFC 3339 or as a bare `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateParam {
    Instant(DateTime<Utc>),
    Day(NaiveDate),
}

impl DateParam {
    pub fn parse(field: &str, value: &str) -> Result<Self, ApiError> {
        let value = value.trim();
        if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
            return Ok(Self::Instant(instant.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Self::Day)
            .map_err(|_| {
                validation_error(
                    &format!("Invalid {field}"),
                    serde_json::json!({ field: "Must be an RFC 3339 timestamp or YYYY-MM-DD" }),
                )
            })
    }

    /// The instant itself, or midnight UTC at the start of the day.
    pub fn start(&self) -> DateTime<Utc> {
        match self {
            Self::Instant(instant) => *instant,
            Self::Day(day) => day.and_time(chrono::NaiveTime::MIN).and_utc(),
        }
    }
}
