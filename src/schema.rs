//! Campground record schema and validation.
//!
//! Turns one raw search result item into a [`CampgroundRecord`], or a
//! [`ValidationError`] naming every field that failed. A search result item
//! has the JSON:API shape
//!
//! ```json
//! { "id": "123", "type": "location-search-results",
//!   "attributes": { "name": "...", "latitude": 45.0, ... },
//!   "links": { "self": "https://..." } }
//! ```
//!
//! Attribute keys are read in the API's kebab-case (`region-name`) with a
//! snake_case fallback (`region_name`). A JSON `null` counts as absent.

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde_json::{Map, Value};

use crate::model::{
    CampgroundRecord, FieldIssue, LATITUDE_RANGE, LONGITUDE_RANGE, ValidationError,
};

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Validates one search result item.
///
/// All issues are collected before returning, so a listing with several bad
/// fields is reported once with every field named.
pub fn validate_item(item: &Value) -> Result<CampgroundRecord, ValidationError> {
    let mut issues = Vec::new();

    let Some(obj) = item.as_object() else {
        return Err(ValidationError {
            id: None,
            issues: vec![issue("item", "expected a JSON object")],
        });
    };

    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::String(_)) => {
            issues.push(issue("id", "must not be empty"));
            None
        }
        None | Some(Value::Null) => {
            issues.push(issue("id", "missing"));
            None
        }
        Some(other) => {
            issues.push(issue("id", &format!("expected string, got {}", type_name(other))));
            None
        }
    };

    let kind = match obj.get("type") {
        Some(Value::String(s)) => Some(s.clone()),
        None | Some(Value::Null) => {
            issues.push(issue("type", "missing"));
            None
        }
        Some(other) => {
            issues.push(issue("type", &format!("expected string, got {}", type_name(other))));
            None
        }
    };

    let detail_url = detail_url_from_links(obj.get("links"), &mut issues);

    let empty = Map::new();
    let attrs = match obj.get("attributes") {
        Some(Value::Object(map)) => map,
        None | Some(Value::Null) => {
            issues.push(issue("attributes", "missing"));
            &empty
        }
        Some(other) => {
            issues.push(issue(
                "attributes",
                &format!("expected object, got {}", type_name(other)),
            ));
            &empty
        }
    };

    let mut fields = Attributes { attrs, issues };

    let name = fields.required_str("name");
    let latitude = fields.required_coordinate("latitude", &LATITUDE_RANGE);
    let longitude = fields.required_coordinate("longitude", &LONGITUDE_RANGE);
    let region_name = fields.required_str("region_name");
    let administrative_area = fields.optional_str("administrative_area");
    let nearest_city_name = fields.optional_str("nearest_city_name");
    let accommodation_type_names = fields.string_list("accommodation_type_names");
    let bookable = fields.flag("bookable");
    let camper_types = fields.string_list("camper_types");
    let operator = fields.optional_str("operator");
    let photo_url = fields.optional_url("photo_url");
    let photo_urls = fields.url_list("photo_urls");
    let photos_count = fields.count("photos_count");
    let rating = fields.optional_float("rating");
    let reviews_count = fields.count("reviews_count");
    let slug = fields.optional_str("slug");
    let price_low = fields.optional_float("price_low");
    let price_high = fields.optional_float("price_high");
    let availability_updated_at = fields.optional_timestamp("availability_updated_at");

    let issues = fields.issues;
    match (id, kind, name, latitude, longitude, region_name, detail_url) {
        (
            Some(id),
            Some(kind),
            Some(name),
            Some(latitude),
            Some(longitude),
            Some(region_name),
            Some(detail_url),
        ) if issues.is_empty() => Ok(CampgroundRecord {
            id,
            kind,
            name,
            latitude,
            longitude,
            region_name,
            administrative_area,
            nearest_city_name,
            accommodation_type_names,
            bookable,
            camper_types,
            operator,
            photo_url,
            photo_urls,
            photos_count,
            rating,
            reviews_count,
            slug,
            price_low,
            price_high,
            availability_updated_at,
            detail_url,
            address: None,
        }),
        (id, ..) => Err(ValidationError { id, issues }),
    }
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

fn detail_url_from_links(links: Option<&Value>, issues: &mut Vec<FieldIssue>) -> Option<String> {
    let self_link = match links {
        Some(Value::Object(map)) => map.get("self"),
        None | Some(Value::Null) => {
            issues.push(issue("detail_url", "item has no links"));
            return None;
        }
        Some(other) => {
            issues.push(issue(
                "detail_url",
                &format!("links: expected object, got {}", type_name(other)),
            ));
            return None;
        }
    };

    match self_link {
        Some(Value::String(s)) => match parse_http_url(s) {
            Ok(url) => Some(url),
            Err(problem) => {
                issues.push(issue("detail_url", &problem));
                None
            }
        },
        None | Some(Value::Null) => {
            issues.push(issue("detail_url", "links.self missing"));
            None
        }
        Some(other) => {
            issues.push(issue(
                "detail_url",
                &format!("links.self: expected string, got {}", type_name(other)),
            ));
            None
        }
    }
}

fn parse_http_url(raw: &str) -> Result<String, String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid URL '{}': {}", raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(format!("unsupported URL scheme '{}'", other)),
    }
}

// ---------------------------------------------------------------------------
// Attribute accessors
// ---------------------------------------------------------------------------

/// Typed reads over the `attributes` object, recording issues as they occur.
///
/// Field names passed in are canonical snake_case; the kebab-case spelling
/// used by the API is tried first.
struct Attributes<'a> {
    attrs: &'a Map<String, Value>,
    issues: Vec<FieldIssue>,
}

impl<'a> Attributes<'a> {
    fn get(&self, field: &str) -> Option<&'a Value> {
        let kebab = field.replace('_', "-");
        self.attrs
            .get(&kebab)
            .filter(|v| !v.is_null())
            .or_else(|| self.attrs.get(field).filter(|v| !v.is_null()))
    }

    fn wrong_type(&mut self, field: &str, expected: &str, got: &Value) {
        self.issues.push(issue(
            field,
            &format!("expected {}, got {}", expected, type_name(got)),
        ));
    }

    fn required_str(&mut self, field: &str) -> Option<String> {
        match self.get(field) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                self.wrong_type(field, "string", other);
                None
            }
            None => {
                self.issues.push(issue(field, "missing"));
                None
            }
        }
    }

    fn optional_str(&mut self, field: &str) -> Option<String> {
        match self.get(field) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                self.wrong_type(field, "string", other);
                None
            }
            None => None,
        }
    }

    fn required_coordinate(
        &mut self,
        field: &str,
        range: &std::ops::RangeInclusive<f64>,
    ) -> Option<f64> {
        let Some(value) = self.get(field) else {
            self.issues.push(issue(field, "missing"));
            return None;
        };
        let Some(v) = value.as_f64() else {
            self.wrong_type(field, "number", value);
            return None;
        };
        if !range.contains(&v) {
            self.issues.push(issue(
                field,
                &format!("{} outside [{}, {}]", v, range.start(), range.end()),
            ));
            return None;
        }
        Some(v)
    }

    fn optional_float(&mut self, field: &str) -> Option<f64> {
        let value = self.get(field)?;
        match value.as_f64() {
            Some(v) if v.is_finite() => Some(v),
            Some(v) => {
                self.issues.push(issue(field, &format!("{} is not finite", v)));
                None
            }
            None => {
                self.wrong_type(field, "number", value);
                None
            }
        }
    }

    fn flag(&mut self, field: &str) -> bool {
        match self.get(field) {
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                self.wrong_type(field, "boolean", other);
                false
            }
            None => false,
        }
    }

    /// A non-negative integer that fits the 32-bit column; absent means 0.
    fn count(&mut self, field: &str) -> i32 {
        let Some(value) = self.get(field) else {
            return 0;
        };
        match value.as_i64() {
            Some(n) if n < 0 => {
                self.issues.push(issue(field, &format!("{} is negative", n)));
                0
            }
            Some(n) => match i32::try_from(n) {
                Ok(n) => n,
                Err(_) => {
                    self.issues.push(issue(field, &format!("{} is too large", n)));
                    0
                }
            },
            None => {
                self.wrong_type(field, "integer", value);
                0
            }
        }
    }

    fn string_list(&mut self, field: &str) -> Vec<String> {
        let Some(value) = self.get(field) else {
            return Vec::new();
        };
        let Some(items) = value.as_array() else {
            self.wrong_type(field, "list of strings", value);
            return Vec::new();
        };
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(s) => out.push(s.to_string()),
                None => self.wrong_type(&format!("{}[{}]", field, i), "string", item),
            }
        }
        out
    }

    fn optional_url(&mut self, field: &str) -> Option<String> {
        let raw = self.optional_str(field)?;
        match parse_http_url(&raw) {
            Ok(url) => Some(url),
            Err(problem) => {
                self.issues.push(issue(field, &problem));
                None
            }
        }
    }

    fn url_list(&mut self, field: &str) -> Vec<String> {
        let raw = self.string_list(field);
        let mut out = Vec::with_capacity(raw.len());
        for (i, s) in raw.iter().enumerate() {
            match parse_http_url(s) {
                Ok(url) => out.push(url),
                Err(problem) => self.issues.push(issue(&format!("{}[{}]", field, i), &problem)),
            }
        }
        out
    }

    fn optional_timestamp(&mut self, field: &str) -> Option<DateTime<Utc>> {
        let raw = self.optional_str(field)?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(e) => {
                self.issues.push(issue(field, &format!("invalid timestamp '{}': {}", raw, e)));
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn issue(field: &str, problem: &str) -> FieldIssue {
    FieldIssue {
        field: field.to_string(),
        problem: problem.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn full_item() -> Value {
        json!({
            "id": "14501",
            "type": "location-search-results",
            "attributes": {
                "name": "Cape Lookout State Park",
                "latitude": 45.0,
                "longitude": -122.0,
                "region-name": "Oregon",
                "administrative-area": "Tillamook County",
                "nearest-city-name": "Netarts",
                "accommodation-type-names": ["Tent", "RV"],
                "bookable": true,
                "camper-types": ["tent", "rv"],
                "operator": "Oregon State Parks",
                "photo-url": "https://images.example.com/a.jpg",
                "photo-urls": ["https://images.example.com/a.jpg", "https://images.example.com/b.jpg"],
                "photos-count": 2,
                "rating": 4.5,
                "reviews-count": 120,
                "slug": "oregon-cape-lookout",
                "price-low": 22.0,
                "price-high": 45.5,
                "availability-updated-at": "2024-05-01T12:00:00Z"
            },
            "links": { "self": "https://thedyrt.com/api/v6/locations/14501" }
        })
    }

    fn minimal_item() -> Value {
        json!({
            "id": "7",
            "type": "location-search-results",
            "attributes": {
                "name": "Dispersed Site",
                "latitude": 38.5,
                "longitude": -109.5,
                "region-name": "Utah"
            },
            "links": { "self": "https://thedyrt.com/api/v6/locations/7" }
        })
    }

    #[test]
    fn test_full_item_maps_every_field() {
        let record = validate_item(&full_item()).expect("full item should validate");
        assert_eq!(record.id, "14501");
        assert_eq!(record.kind, "location-search-results");
        assert_eq!(record.region_name, "Oregon");
        assert_eq!(record.administrative_area.as_deref(), Some("Tillamook County"));
        assert_eq!(record.accommodation_type_names, vec!["Tent", "RV"]);
        assert!(record.bookable);
        assert_eq!(record.photo_urls.len(), 2);
        assert_eq!(record.photos_count, 2);
        assert_eq!(record.rating, Some(4.5));
        assert_eq!(record.reviews_count, 120);
        assert_eq!(record.price_high, Some(45.5));
        assert_eq!(
            record.availability_updated_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(record.detail_url, "https://thedyrt.com/api/v6/locations/14501");
        assert_eq!(record.address, None);
    }

    #[test]
    fn test_minimal_item_gets_defaults() {
        let record = validate_item(&minimal_item()).unwrap();
        assert!(!record.bookable);
        assert_eq!(record.photos_count, 0);
        assert_eq!(record.reviews_count, 0);
        assert!(record.camper_types.is_empty());
        assert!(record.photo_urls.is_empty());
        assert_eq!(record.rating, None);
        assert_eq!(record.operator, None);
    }

    #[test]
    fn test_snake_case_keys_are_accepted() {
        let mut item = minimal_item();
        let attrs = item["attributes"].as_object_mut().unwrap();
        let region = attrs.remove("region-name").unwrap();
        attrs.insert("region_name".into(), region);
        attrs.insert("reviews_count".into(), json!(9));
        let record = validate_item(&item).unwrap();
        assert_eq!(record.region_name, "Utah");
        assert_eq!(record.reviews_count, 9);
    }

    #[test]
    fn test_null_kebab_key_falls_back_to_snake_case() {
        let mut item = minimal_item();
        let attrs = item["attributes"].as_object_mut().unwrap();
        attrs.insert("region-name".into(), Value::Null);
        attrs.insert("region_name".into(), json!("Oregon"));
        attrs.insert("reviews-count".into(), Value::Null);
        attrs.insert("reviews_count".into(), json!(7));
        let record = validate_item(&item).unwrap();
        assert_eq!(record.region_name, "Oregon");
        assert_eq!(record.reviews_count, 7);
    }

    #[test]
    fn test_null_optional_fields_are_absent() {
        let mut item = minimal_item();
        item["attributes"]["rating"] = Value::Null;
        item["attributes"]["photo-urls"] = Value::Null;
        item["attributes"]["bookable"] = Value::Null;
        let record = validate_item(&item).unwrap();
        assert_eq!(record.rating, None);
        assert!(record.photo_urls.is_empty());
        assert!(!record.bookable);
    }

    #[test]
    fn test_latitude_out_of_range_is_rejected() {
        let mut item = minimal_item();
        item["attributes"]["latitude"] = json!(999);
        let err = validate_item(&item).unwrap_err();
        assert_eq!(err.id.as_deref(), Some("7"));
        assert_eq!(err.fields(), vec!["latitude"]);
    }

    #[test]
    fn test_longitude_boundaries_are_inclusive() {
        let mut item = minimal_item();
        item["attributes"]["longitude"] = json!(-180.0);
        item["attributes"]["latitude"] = json!(90);
        assert!(validate_item(&item).is_ok());
    }

    #[test]
    fn test_missing_required_fields_are_all_reported() {
        let mut item = minimal_item();
        let attrs = item["attributes"].as_object_mut().unwrap();
        attrs.remove("name");
        attrs.remove("region-name");
        let err = validate_item(&item).unwrap_err();
        assert_eq!(err.fields(), vec!["name", "region_name"]);
    }

    #[test]
    fn test_wrong_types_are_rejected() {
        let mut item = minimal_item();
        item["attributes"]["latitude"] = json!("45.0");
        item["attributes"]["bookable"] = json!("yes");
        item["attributes"]["camper-types"] = json!(["tent", 3]);
        let err = validate_item(&item).unwrap_err();
        assert_eq!(err.fields(), vec!["latitude", "bookable", "camper_types[1]"]);
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let mut item = minimal_item();
        item["attributes"]["reviews-count"] = json!(-1);
        let err = validate_item(&item).unwrap_err();
        assert_eq!(err.fields(), vec!["reviews_count"]);
    }

    #[test]
    fn test_fractional_count_is_rejected() {
        let mut item = minimal_item();
        item["attributes"]["photos-count"] = json!(2.5);
        assert!(validate_item(&item).is_err());
    }

    #[test]
    fn test_missing_self_link_is_rejected() {
        let mut item = minimal_item();
        item["links"] = json!({});
        let err = validate_item(&item).unwrap_err();
        assert_eq!(err.fields(), vec!["detail_url"]);

        item.as_object_mut().unwrap().remove("links");
        assert_eq!(validate_item(&item).unwrap_err().fields(), vec!["detail_url"]);
    }

    #[test]
    fn test_relative_self_link_is_rejected() {
        let mut item = minimal_item();
        item["links"]["self"] = json!("/api/v6/locations/7");
        assert!(validate_item(&item).is_err());
    }

    #[test]
    fn test_bad_photo_url_is_rejected() {
        let mut item = minimal_item();
        item["attributes"]["photo-urls"] = json!(["https://ok.example.com/x.jpg", "not a url"]);
        let err = validate_item(&item).unwrap_err();
        assert_eq!(err.fields(), vec!["photo_urls[1]"]);
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let mut item = minimal_item();
        item["attributes"]["availability-updated-at"] = json!("yesterday");
        let err = validate_item(&item).unwrap_err();
        assert_eq!(err.fields(), vec!["availability_updated_at"]);
    }

    #[test]
    fn test_empty_or_missing_id_is_rejected() {
        let mut item = minimal_item();
        item["id"] = json!("");
        let err = validate_item(&item).unwrap_err();
        assert_eq!(err.id, None);
        assert_eq!(err.fields(), vec!["id"]);

        item["id"] = json!(7);
        assert_eq!(validate_item(&item).unwrap_err().fields(), vec!["id"]);
    }

    #[test]
    fn test_non_object_item_is_rejected() {
        let err = validate_item(&json!(["not", "an", "item"])).unwrap_err();
        assert_eq!(err.fields(), vec!["item"]);
    }

    #[test]
    fn test_missing_attributes_reports_required_fields() {
        let mut item = minimal_item();
        item.as_object_mut().unwrap().remove("attributes");
        let err = validate_item(&item).unwrap_err();
        assert_eq!(
            err.fields(),
            vec!["attributes", "name", "latitude", "longitude", "region_name"]
        );
    }
}
