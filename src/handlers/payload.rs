// handlers/payload.rs - Request bodies and their validation
//
// Every field is optional at the serde level so that a missing field becomes a
// per-field message in the 400 envelope instead of a bare deserialization error.
// Fields read through `lenient` also treat a value of the wrong JSON type as
// missing, so `"lat": "north"` is reported as an invalid latitude.

use chrono::NaiveDate;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::database::models::{DateRange, ReviewFields, SpotFields};
use crate::error::{ApiError, FieldErrors};

const SPOT_NAME_MAX_CHARS: usize = 50;
const NAME_TOO_LONG: &str = "Name must be less than 50 characters";
const PASSWORD_MIN_CHARS: usize = 6;

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn required_text(value: Option<String>, field: &str, message: &str, errors: &mut FieldErrors) -> String {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(v) => v,
        None => {
            errors.insert(field.to_string(), message.to_string());
            String::new()
        }
    }
}

fn finish<T>(message: &str, errors: FieldErrors, value: T) -> Result<T, ApiError> {
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(ApiError::validation_error(message, errors))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct SpotPayload {
    #[serde(deserialize_with = "lenient")]
    pub address: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub city: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub state: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub country: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub lat: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub lng: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub price: Option<f64>,
}

impl SpotPayload {
    pub fn validate(self) -> Result<SpotFields, ApiError> {
        let mut errors = FieldErrors::new();

        let address = required_text(self.address, "address", "Street address is required", &mut errors);
        let city = required_text(self.city, "city", "City is required", &mut errors);
        let state = required_text(self.state, "state", "State is required", &mut errors);
        let country = required_text(self.country, "country", "Country is required", &mut errors);
        let description = required_text(self.description, "description", "Description is required", &mut errors);
        let name = required_text(self.name, "name", NAME_TOO_LONG, &mut errors);
        if name.chars().count() >= SPOT_NAME_MAX_CHARS {
            errors.insert("name".to_string(), NAME_TOO_LONG.to_string());
        }

        let lat = self.lat.filter(|v| (-90.0..=90.0).contains(v));
        if lat.is_none() {
            errors.insert("lat".to_string(), "Latitude is not valid".to_string());
        }

        let lng = self.lng.filter(|v| (-180.0..=180.0).contains(v));
        if lng.is_none() {
            errors.insert("lng".to_string(), "Longitude is not valid".to_string());
        }

        let price = self.price.filter(|v| v.is_finite() && *v >= 0.0);
        if price.is_none() {
            errors.insert("price".to_string(), "Price per day is required".to_string());
        }

        finish(
            "Validation Error",
            errors,
            SpotFields {
                address,
                city,
                state,
                country,
                lat: lat.unwrap_or_default(),
                lng: lng.unwrap_or_default(),
                name,
                description,
                price: price.unwrap_or_default(),
            },
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReviewPayload {
    #[serde(deserialize_with = "lenient")]
    pub review: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub stars: Option<f64>,
}

impl ReviewPayload {
    pub fn validate(self) -> Result<ReviewFields, ApiError> {
        let mut errors = FieldErrors::new();

        let review = required_text(self.review, "review", "Review text is required", &mut errors);

        let stars = self
            .stars
            .filter(|s| s.fract() == 0.0 && (1.0..=5.0).contains(s))
            .map(|s| s as i32);
        if stars.is_none() {
            errors.insert("stars".to_string(), "Stars must be an integer from 1 to 5".to_string());
        }

        finish(
            "Validation error",
            errors,
            ReviewFields {
                review,
                stars: stars.unwrap_or_default(),
            },
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct BookingPayload {
    #[serde(deserialize_with = "lenient")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub end_date: Option<String>,
}

impl BookingPayload {
    pub fn validate(self) -> Result<DateRange, ApiError> {
        let mut errors = FieldErrors::new();

        let start = parse_date(self.start_date.as_deref(), "startDate", &mut errors);
        let end = parse_date(self.end_date.as_deref(), "endDate", &mut errors);

        let (Some(start), Some(end)) = (start, end) else {
            return Err(ApiError::validation_error("Validation error", errors));
        };

        DateRange::new(start, end).ok_or_else(|| {
            let mut errors = FieldErrors::new();
            errors.insert("endDate".to_string(), "endDate cannot be on or before startDate".to_string());
            ApiError::validation_error("Validation error", errors)
        })
    }
}

/// Accepts `YYYY-MM-DD`, or a timestamp whose date part is `YYYY-MM-DD`
fn parse_date(raw: Option<&str>, field: &str, errors: &mut FieldErrors) -> Option<NaiveDate> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        errors.insert(field.to_string(), format!("{field} is required"));
        return None;
    };

    let date_part = raw.split('T').next().unwrap_or(raw);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.insert(field.to_string(), format!("{field} must be a date formatted YYYY-MM-DD"));
            None
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct ImagePayload {
    #[serde(deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub preview_image: Option<bool>,
}

pub struct ValidImage {
    pub url: String,
    pub preview_image: bool,
}

impl ImagePayload {
    pub fn validate(self) -> Result<ValidImage, ApiError> {
        let mut errors = FieldErrors::new();
        let url = required_text(self.url, "url", "Image url is required", &mut errors);
        finish(
            "Validation error",
            errors,
            ValidImage {
                url,
                preview_image: self.preview_image.unwrap_or(false),
            },
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct SignupPayload {
    #[serde(deserialize_with = "lenient")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub password: Option<String>,
}

#[cfg_attr(test, derive(Debug))]
pub struct ValidSignup {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl SignupPayload {
    pub fn validate(self) -> Result<ValidSignup, ApiError> {
        let mut errors = FieldErrors::new();

        let first_name = required_text(self.first_name, "firstName", "First Name is required", &mut errors);
        let last_name = required_text(self.last_name, "lastName", "Last Name is required", &mut errors);
        let email = required_text(self.email, "email", "Invalid email", &mut errors);
        if !email.is_empty() && !is_plausible_email(&email) {
            errors.insert("email".to_string(), "Invalid email".to_string());
        }

        let password = self.password.unwrap_or_default();
        if password.chars().count() < PASSWORD_MIN_CHARS {
            errors.insert("password".to_string(), "Password must be 6 characters or more".to_string());
        }

        finish(
            "Validation error",
            errors,
            ValidSignup {
                first_name,
                last_name,
                email,
                password,
            },
        )
    }
}

fn is_plausible_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        _ => false,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginPayload {
    #[serde(alias = "email", deserialize_with = "lenient")]
    pub credential: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub password: Option<String>,
}

impl LoginPayload {
    pub fn validate(self) -> Result<(String, String), ApiError> {
        let mut errors = FieldErrors::new();
        let credential = required_text(self.credential, "credential", "Email is required", &mut errors);
        let password = match self.password.filter(|p| !p.is_empty()) {
            Some(p) => p,
            None => {
                errors.insert("password".to_string(), "Password is required".to_string());
                String::new()
            }
        };
        finish("Validation error", errors, (credential, password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cabin() -> SpotPayload {
        SpotPayload {
            address: Some("1 Main St".to_string()),
            city: Some("X".to_string()),
            state: Some("Y".to_string()),
            country: Some("Z".to_string()),
            lat: Some(0.0),
            lng: Some(0.0),
            name: Some("Cabin".to_string()),
            description: Some("Nice".to_string()),
            price: Some(100.0),
        }
    }

    fn field_errors(err: ApiError) -> FieldErrors {
        assert_eq!(err.status_code(), 400);
        err.field_errors().cloned().unwrap_or_default()
    }

    #[test]
    fn complete_spot_is_valid() {
        let fields = cabin().validate().unwrap();
        assert_eq!(fields.name, "Cabin");
        assert_eq!(fields.price, 100.0);
    }

    #[test]
    fn empty_spot_reports_every_field() {
        let errors = field_errors(SpotPayload::default().validate().unwrap_err());
        for field in ["address", "city", "state", "country", "lat", "lng", "name", "description", "price"] {
            assert!(errors.contains_key(field), "missing error for {field}");
        }
    }

    #[test]
    fn spot_bounds_are_checked() {
        let mut payload = cabin();
        payload.lat = Some(91.0);
        payload.name = Some("x".repeat(50));
        let errors = field_errors(payload.validate().unwrap_err());
        assert_eq!(errors.get("lat").map(String::as_str), Some("Latitude is not valid"));
        assert_eq!(errors.get("name").map(String::as_str), Some("Name must be less than 50 characters"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn missing_name_reports_the_length_rule() {
        let mut payload = cabin();
        payload.name = None;
        let errors = field_errors(payload.validate().unwrap_err());
        assert_eq!(errors.get("name").map(String::as_str), Some("Name must be less than 50 characters"));
    }

    #[test]
    fn wrongly_typed_numbers_become_field_errors() {
        let payload: SpotPayload = serde_json::from_value(serde_json::json!({
            "address": "1 Main St",
            "city": "X",
            "state": "Y",
            "country": "Z",
            "lat": "40.7",
            "lng": [1],
            "name": "Cabin",
            "description": "Nice",
            "price": 100,
        }))
        .unwrap();
        let errors = field_errors(payload.validate().unwrap_err());
        assert_eq!(errors.get("lat").map(String::as_str), Some("Latitude is not valid"));
        assert_eq!(errors.get("lng").map(String::as_str), Some("Longitude is not valid"));
        assert_eq!(errors.len(), 2);

        let review: ReviewPayload = serde_json::from_value(serde_json::json!({ "review": 7, "stars": "5" })).unwrap();
        let errors = field_errors(review.validate().unwrap_err());
        assert!(errors.contains_key("review"));
        assert_eq!(errors.get("stars").map(String::as_str), Some("Stars must be an integer from 1 to 5"));
    }

    #[test]
    fn stars_must_be_whole_and_in_range() {
        for stars in [0.0, 6.0, 4.5] {
            let payload = ReviewPayload { review: Some("ok".to_string()), stars: Some(stars) };
            assert!(field_errors(payload.validate().unwrap_err()).contains_key("stars"));
        }
        let ok = ReviewPayload { review: Some("ok".to_string()), stars: Some(5.0) }.validate().unwrap();
        assert_eq!(ok.stars, 5);
    }

    #[test]
    fn booking_end_must_follow_start() {
        let payload = BookingPayload {
            start_date: Some("2030-01-05".to_string()),
            end_date: Some("2030-01-05".to_string()),
        };
        let errors = field_errors(payload.validate().unwrap_err());
        assert_eq!(
            errors.get("endDate").map(String::as_str),
            Some("endDate cannot be on or before startDate")
        );
    }

    #[test]
    fn booking_accepts_timestamps_and_rejects_garbage() {
        let ok = BookingPayload {
            start_date: Some("2030-01-05T00:00:00.000Z".to_string()),
            end_date: Some("2030-01-07".to_string()),
        };
        assert!(ok.validate().is_ok());

        let bad = BookingPayload { start_date: Some("soon".to_string()), end_date: None };
        let errors = field_errors(bad.validate().unwrap_err());
        assert!(errors.contains_key("startDate"));
        assert!(errors.contains_key("endDate"));
    }

    #[test]
    fn signup_checks_email_and_password() {
        let payload = SignupPayload {
            first_name: Some("Demo".to_string()),
            last_name: Some("User".to_string()),
            email: Some("not-an-email".to_string()),
            password: Some("123".to_string()),
        };
        let errors = field_errors(payload.validate().unwrap_err());
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("password"));
    }
}
