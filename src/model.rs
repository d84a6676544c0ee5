use serde::Deserialize;

/// Class lookup entry, keyed by class id in the map returned from
/// [`crate::client::StoreClient::list_classes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub name: String,
    pub section: String,
}

/// Raw row shape of the class lookup table.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassRow {
    pub id: String,
    pub name: Option<String>,
    pub section: Option<String>,
}

impl ClassRow {
    /// Null columns degrade the same way the upstream store does: a missing
    /// name becomes "Unknown", a missing section becomes empty.
    pub fn into_info(self) -> (String, ClassInfo) {
        let info = ClassInfo {
            name: self.name.unwrap_or_else(|| "Unknown".to_string()),
            section: self.section.unwrap_or_default(),
        };
        (self.id, info)
    }
}

/// One identity-card entry as fetched from the store. Every text column is
/// nullable upstream, so everything here is optional; the report builder
/// decides the fallbacks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdCardRecord {
    #[serde(default)]
    pub id: String,
    pub student_name: Option<String>,
    pub class_id: Option<String>,
    pub date_of_birth: Option<String>,
    pub student_photo_url: Option<String>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub father_photo_url: Option<String>,
    pub mother_photo_url: Option<String>,
    pub father_mobile: Option<String>,
    pub mother_mobile: Option<String>,
    pub address: Option<String>,
    pub created_at: Option<String>,
    // Present in the fetched payload; not used by the export itself.
    pub download_count: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_row_null_columns_degrade() {
        let row = ClassRow {
            id: "c1".to_string(),
            name: None,
            section: None,
        };
        let (id, info) = row.into_info();
        assert_eq!(id, "c1");
        assert_eq!(info.name, "Unknown");
        assert_eq!(info.section, "");
    }

    #[test]
    fn test_record_deserializes_with_null_fields() {
        let json = r#"{
            "id": "abc-123",
            "student_name": "Asha Rao",
            "class_id": null,
            "date_of_birth": "2015-06-01T00:00:00Z",
            "student_photo_url": null,
            "father_name": null,
            "mother_name": "Priya Rao",
            "father_photo_url": null,
            "mother_photo_url": null,
            "father_mobile": null,
            "mother_mobile": "9876543210",
            "address": "12 Lake Road",
            "created_at": "2024-01-15T09:30:00Z",
            "download_count": 3
        }"#;
        let record: IdCardRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.student_name.as_deref(), Some("Asha Rao"));
        assert!(record.class_id.is_none());
        assert!(record.father_name.is_none());
        assert_eq!(record.download_count, Some(3));
    }
}
