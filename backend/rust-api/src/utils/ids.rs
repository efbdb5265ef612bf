use mongodb::bson::oid::ObjectId;

use crate::error::AppError;

/// New document id: a fresh ObjectId rendered as 24 hex characters.
pub fn new_id() -> String {
    ObjectId::new().to_hex()
}

/// Rejects path ids that are not ObjectId hex strings.
pub fn parse_id<'a>(value: &'a str, what: &str) -> Result<&'a str, AppError> {
    if ObjectId::parse_str(value).is_ok() {
        Ok(value)
    } else {
        Err(AppError::validation(format!("Invalid {} ID format", what)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_ordered() {
        let first = new_id();
        let second = new_id();
        assert_eq!(first.len(), 24);
        assert!(second > first);
    }

    #[test]
    fn test_parse_id() {
        let id = new_id();
        assert_eq!(parse_id(&id, "assignment").unwrap(), id);
        let err = parse_id("not-an-id", "assignment").unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Invalid assignment ID format"));
    }
}
