use std::collections::HashMap;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::model::{ClassInfo, ClassRow, IdCardRecord};

pub const SCHEMA: &str = "school";
pub const CLASS_TABLE: &str = "Class";
pub const ID_CARD_TABLE: &str = "IDCard";

const CLASS_COLUMNS: &str = "id,name,section";
const ID_CARD_COLUMNS: &str = "id,student_name,class_id,date_of_birth,\
    student_photo_url,father_name,mother_name,father_photo_url,\
    mother_photo_url,father_mobile,mother_mobile,address,created_at,\
    download_count";

/// Read operations the export pipeline needs from the store. Seam between
/// the engine and the network, mirroring [`crate::download::ImageSource`].
pub trait RecordStore {
    fn list_classes(&self) -> HashMap<String, ClassInfo>;
    fn list_id_cards(&self, class_id: Option<&str>, search: Option<&str>) -> Vec<IdCardRecord>;
}

/// Authenticated read-only client for the hosted store's REST interface.
/// Queries are scoped to the school schema via the `Accept-Profile` header.
pub struct StoreClient {
    http: Client,
    endpoint: String,
}

impl StoreClient {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| Error::Config("API key contains invalid characters".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| Error::Config("API key contains invalid characters".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert("Accept-Profile", HeaderValue::from_static(SCHEMA));

        let http = Client::builder()
            .user_agent("idcard-export")
            .default_headers(headers)
            .build()?;

        Ok(StoreClient {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn fetch<T: DeserializeOwned>(&self, table: &str, query: &[(String, String)]) -> Result<Vec<T>> {
        let url = format!("{}/rest/v1/{}", self.endpoint, table);
        debug!("GET {url}");
        let response = self.http.get(&url).query(query).send()?.error_for_status()?;
        Ok(response.json()?)
    }
}

impl RecordStore for StoreClient {
    /// Fetch the full class lookup table. A failed query degrades to an
    /// empty mapping; every record then resolves its class as "Unknown".
    fn list_classes(&self) -> HashMap<String, ClassInfo> {
        let query = vec![("select".to_string(), CLASS_COLUMNS.to_string())];
        match self.fetch::<ClassRow>(CLASS_TABLE, &query) {
            Ok(rows) => rows.into_iter().map(ClassRow::into_info).collect(),
            Err(err) => {
                error!("Error fetching classes: {err}");
                HashMap::new()
            }
        }
    }

    /// Fetch id-card rows, optionally restricted to one class and/or a
    /// case-insensitive substring match over the four text fields. A failed
    /// query degrades to an empty result set. No pagination; row order is
    /// whatever the store returns.
    fn list_id_cards(
        &self,
        class_id: Option<&str>,
        search: Option<&str>,
    ) -> Vec<IdCardRecord> {
        let query = id_card_query(class_id, search);
        match self.fetch(ID_CARD_TABLE, &query) {
            Ok(rows) => rows,
            Err(err) => {
                error!("Error fetching ID cards: {err}");
                Vec::new()
            }
        }
    }
}

/// Build the query string for the id-card fetch. The search term expands to
/// an OR of `ilike` predicates over student name, father name, mother name
/// and address; combining it with a class filter conjoins the two.
pub(crate) fn id_card_query(
    class_id: Option<&str>,
    search: Option<&str>,
) -> Vec<(String, String)> {
    let mut query = vec![("select".to_string(), ID_CARD_COLUMNS.to_string())];

    if let Some(class_id) = class_id {
        query.push(("class_id".to_string(), format!("eq.{class_id}")));
    }

    if let Some(term) = search {
        let clauses: Vec<String> = ["student_name", "father_name", "mother_name", "address"]
            .iter()
            .map(|field| format!("{field}.ilike.*{term}*"))
            .collect();
        query.push(("or".to_string(), format!("({})", clauses.join(","))));
    }

    query
}
