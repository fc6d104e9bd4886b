use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FieldErrors;
use crate::store::{Document, FieldValue, Fields, StoreError};

pub const COLLECTION: &str = "hospitality";

pub const NAME_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HospitalityType {
    Attraction,
    Hotel,
    Restaurant,
}

impl HospitalityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HospitalityType::Attraction => "attraction",
            HospitalityType::Hotel => "hotel",
            HospitalityType::Restaurant => "restaurant",
        }
    }
}

impl fmt::Display for HospitalityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HospitalityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "attraction" => Ok(HospitalityType::Attraction),
            "hotel" => Ok(HospitalityType::Hotel),
            "restaurant" => Ok(HospitalityType::Restaurant),
            other => Err(format!(
                "'{}' is not one of attraction, hotel, restaurant",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn to_field_value(self) -> FieldValue {
        let mut map = Fields::new();
        map.insert("lat".to_string(), self.lat.into());
        map.insert("lng".to_string(), self.lng.into());
        FieldValue::Map(map)
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        let map = value.as_map()?;
        Some(Self {
            lat: map.get("lat")?.as_f64()?,
            lng: map.get("lng")?.as_f64()?,
        })
    }
}

/// Metadata kept for each uploaded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub url: String,
    pub path: String,
    pub original: Option<String>,
    pub content_type: Option<String>,
}

impl ImageRecord {
    pub fn to_field_value(&self) -> FieldValue {
        let mut map = Fields::new();
        map.insert("url".to_string(), self.url.as_str().into());
        map.insert("path".to_string(), self.path.as_str().into());
        map.insert("original".to_string(), self.original.clone().into());
        map.insert("contentType".to_string(), self.content_type.clone().into());
        FieldValue::Map(map)
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        let map = value.as_map()?;
        let text = |key: &str| map.get(key).and_then(FieldValue::as_str).map(str::to_string);
        Some(Self {
            url: text("url")?,
            path: text("path")?,
            original: text("original"),
            content_type: text("contentType"),
        })
    }
}

pub fn images_field(images: &[ImageRecord]) -> FieldValue {
    FieldValue::Array(images.iter().map(ImageRecord::to_field_value).collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: HospitalityType,
    pub name: String,
    pub description: String,
    pub location: Option<Location>,
    #[serde(default)]
    pub images: Vec<ImageRecord>,
    pub created_on: Option<DateTime<Utc>>,
}

impl Listing {
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let kind = doc
            .require_str("type")?
            .parse()
            .map_err(|_| doc.malformed("type"))?;

        let images = doc
            .get("images")
            .and_then(FieldValue::as_array)
            .map(|values| values.iter().filter_map(ImageRecord::from_field_value).collect())
            .unwrap_or_default();

        Ok(Self {
            id: doc.id.clone(),
            kind,
            name: doc.require_str("name")?,
            description: doc.require_str("description")?,
            location: doc.get("location").and_then(Location::from_field_value),
            images,
            created_on: doc.optional_timestamp("createdOn"),
        })
    }
}

/// A file part from a listing form. Empty parts are dropped while parsing.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Raw text fields and files of a create/update listing form, before validation.
#[derive(Debug, Default)]
pub struct ListingForm {
    pub kind: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub replace_images: Option<String>,
    pub images: Vec<ImageUpload>,
}

impl ListingForm {
    /// Record a text field; unknown names are ignored.
    pub fn set_text(&mut self, name: &str, value: String) {
        let slot = match name {
            "type" => &mut self.kind,
            "name" => &mut self.name,
            "description" => &mut self.description,
            "latitude" => &mut self.latitude,
            "longitude" => &mut self.longitude,
            "replace_images" => &mut self.replace_images,
            _ => return,
        };
        *slot = Some(value);
    }

    pub fn add_image(&mut self, upload: ImageUpload) {
        if !upload.data.is_empty() {
            self.images.push(upload);
        }
    }
}

#[derive(Debug)]
pub struct CreateListingInput {
    pub kind: HospitalityType,
    pub name: String,
    pub description: String,
    pub location: Location,
    pub images: Vec<ImageUpload>,
}

impl TryFrom<ListingForm> for CreateListingInput {
    type Error = FieldErrors;

    fn try_from(form: ListingForm) -> Result<Self, Self::Error> {
        let mut errors = FieldErrors::new();

        let kind = required(&mut errors, "type", form.kind).and_then(|v| parse_kind(&mut errors, &v));
        let name = required(&mut errors, "name", form.name)
            .and_then(|v| bounded_text(&mut errors, "name", v, NAME_MAX_CHARS));
        // A missing description is stored as empty; a provided one must be non-empty.
        let description = match form.description {
            Some(v) => bounded_text(&mut errors, "description", v, DESCRIPTION_MAX_CHARS),
            None => Some(String::new()),
        };
        let lat = required(&mut errors, "latitude", form.latitude)
            .and_then(|v| coordinate(&mut errors, "latitude", &v, 90.0));
        let lng = required(&mut errors, "longitude", form.longitude)
            .and_then(|v| coordinate(&mut errors, "longitude", &v, 180.0));

        match (kind, name, description, lat, lng) {
            (Some(kind), Some(name), Some(description), Some(lat), Some(lng)) if errors.is_empty() => Ok(Self {
                kind,
                name,
                description,
                location: Location { lat, lng },
                images: form.images,
            }),
            _ => Err(errors),
        }
    }
}

/// Partial update: `None` leaves the stored value unchanged.
#[derive(Debug, Default)]
pub struct UpdateListingInput {
    pub kind: Option<HospitalityType>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub replace_images: bool,
    pub images: Vec<ImageUpload>,
}

impl TryFrom<ListingForm> for UpdateListingInput {
    type Error = FieldErrors;

    fn try_from(form: ListingForm) -> Result<Self, Self::Error> {
        let mut errors = FieldErrors::new();

        let input = Self {
            kind: form.kind.and_then(|v| parse_kind(&mut errors, &v)),
            name: form
                .name
                .and_then(|v| bounded_text(&mut errors, "name", v, NAME_MAX_CHARS)),
            description: form
                .description
                .and_then(|v| bounded_text(&mut errors, "description", v, DESCRIPTION_MAX_CHARS)),
            latitude: form
                .latitude
                .and_then(|v| coordinate(&mut errors, "latitude", &v, 90.0)),
            longitude: form
                .longitude
                .and_then(|v| coordinate(&mut errors, "longitude", &v, 180.0)),
            replace_images: match form.replace_images.as_deref().map(parse_flag) {
                None => false,
                Some(Some(flag)) => flag,
                Some(None) => {
                    errors.insert("replace_images".to_string(), "must be true or false".to_string());
                    false
                }
            },
            images: form.images,
        };

        if errors.is_empty() {
            Ok(input)
        } else {
            Err(errors)
        }
    }
}

fn required(errors: &mut FieldErrors, field: &str, value: Option<String>) -> Option<String> {
    if value.is_none() {
        errors.insert(field.to_string(), "field required".to_string());
    }
    value
}

fn parse_kind(errors: &mut FieldErrors, value: &str) -> Option<HospitalityType> {
    value
        .parse()
        .map_err(|msg| errors.insert("type".to_string(), msg))
        .ok()
}

fn bounded_text(errors: &mut FieldErrors, field: &str, value: String, max: usize) -> Option<String> {
    let value = value.trim().to_string();
    let len = value.chars().count();
    if len == 0 {
        errors.insert(field.to_string(), "must not be empty".to_string());
        None
    } else if len > max {
        errors.insert(field.to_string(), format!("must be at most {} characters", max));
        None
    } else {
        Some(value)
    }
}

fn coordinate(errors: &mut FieldErrors, field: &str, value: &str, limit: f64) -> Option<f64> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v.abs() <= limit => Some(v),
        Ok(_) => {
            errors.insert(field.to_string(), format!("must be between -{} and {}", limit, limit));
            None
        }
        Err(_) => {
            errors.insert(field.to_string(), "must be a number".to_string());
            None
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
