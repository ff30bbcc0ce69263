//! Common validation utilities.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

use crate::pagination::decode_page_cursor;

lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9]{4,16}$").unwrap();
}

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates a username: 4 to 16 ASCII letters or digits.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("Username is required".into());
        return Err(err);
    }

    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        let mut err = ValidationError::new("username_format");
        err.message = Some("Username must be 4 to 16 letters or digits".into());
        Err(err)
    }
}

/// Validates that a search radius (meters) is a non-negative number.
pub fn validate_radius(radius: f64) -> Result<(), ValidationError> {
    if radius >= 0.0 && radius.is_finite() {
        Ok(())
    } else {
        let mut err = ValidationError::new("radius_range");
        err.message = Some("Radius must be a non-negative number of meters".into());
        Err(err)
    }
}

/// Validates that a page cursor decodes to a token and a positive page size.
pub fn validate_page_cursor(cursor: &str) -> Result<(), ValidationError> {
    match decode_page_cursor(cursor) {
        Ok((_, page_size)) if page_size > 0 => Ok(()),
        Ok(_) => {
            let mut err = ValidationError::new("page_size_range");
            err.message = Some("Page size encoded in cursor must be positive".into());
            Err(err)
        }
        Err(e) => {
            let mut err = ValidationError::new("page_cursor");
            err.message = Some(format!("Invalid page cursor: {}", e).into());
            Err(err)
        }
    }
}

/// Validates that a page size is positive.
pub fn validate_page_size(page_size: i64) -> Result<(), ValidationError> {
    if page_size > 0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("page_size_range");
        err.message = Some("Page size must be positive".into());
        Err(err)
    }
}

/// Validates a remote user id.
pub fn validate_user_id(user_id: i64) -> Result<(), ValidationError> {
    if user_id > 0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("user_id_range");
        err.message = Some("User id must be positive".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::encode_page_cursor;

    #[test]
    fn test_validate_latitude() {
        assert!(validate_latitude(0.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(45.123456).is_ok());
    }

    #[test]
    fn test_validate_latitude_out_of_range() {
        assert!(validate_latitude(90.000001).is_err());
        assert!(validate_latitude(-90.000001).is_err());
        assert!(validate_latitude(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_longitude() {
        assert!(validate_longitude(0.0).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(-180.0).is_ok());
    }

    #[test]
    fn test_validate_longitude_out_of_range() {
        let err = validate_longitude(180.5).unwrap_err();
        assert_eq!(err.code, "longitude_range");
        assert!(validate_longitude(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("user").is_ok());
        assert!(validate_username("User1234").is_ok());
        assert!(validate_username("abcdefghijklmnop").is_ok());
    }

    #[test]
    fn test_validate_username_rejects() {
        assert_eq!(validate_username("").unwrap_err().code, "required");
        assert_eq!(validate_username("abc").unwrap_err().code, "username_format");
        assert!(validate_username("abcdefghijklmnopq").is_err());
        assert!(validate_username("user_name").is_err());
        assert!(validate_username("üser").is_err());
    }

    #[test]
    fn test_validate_radius() {
        assert!(validate_radius(0.0).is_ok());
        assert!(validate_radius(1500.5).is_ok());
        assert!(validate_radius(-0.1).is_err());
        assert!(validate_radius(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_page_cursor() {
        assert!(validate_page_cursor(&encode_page_cursor(10, 5)).is_ok());
        assert_eq!(
            validate_page_cursor(&encode_page_cursor(10, 0)).unwrap_err().code,
            "page_size_range"
        );
        assert_eq!(
            validate_page_cursor("!!!").unwrap_err().code,
            "page_cursor"
        );
    }

    #[test]
    fn test_validate_page_size_and_user_id() {
        assert!(validate_page_size(1).is_ok());
        assert!(validate_page_size(0).is_err());
        assert!(validate_user_id(7).is_ok());
        assert!(validate_user_id(0).is_err());
    }
}
