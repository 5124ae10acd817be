use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Database(#[from] mongodb::error::Error),
    #[error("malformed id: {0}")]
    MalformedId(#[from] mongodb::bson::oid::Error),
    #[error("{0}")]
    Encode(#[from] mongodb::bson::ser::Error),
    #[error("listing not found")]
    NotFound,
}

impl StoreError {
    /// Whether the error describes a record that does not exist (including a
    /// path id that can never name one), as opposed to a storage failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound | StoreError::MalformedId(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn test_malformed_id_is_not_found() {
        let err = StoreError::from(ObjectId::parse_str("not-a-hex-id").unwrap_err());
        assert!(err.is_not_found());
        assert!(StoreError::NotFound.is_not_found());
    }
}
