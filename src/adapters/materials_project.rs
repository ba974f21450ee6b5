use crate::adapters::http::{build_client, join_url, send_json};
use crate::config::HttpSettings;
use crate::domain::model::MaterialSummary;
use crate::domain::ports::MaterialsDatabase;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const SERVICE: &str = "Materials Project";

pub const SUMMARY_FIELDS: &str =
    "material_id,formula_pretty,formation_energy_per_atom,band_gap,density,structure";

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    data: Vec<MaterialSummary>,
}

/// Client for the Materials Project summary endpoint.
pub struct MaterialsProjectClient {
    client: Client,
    endpoint: String,
    http: HttpSettings,
    api_key: String,
}

impl MaterialsProjectClient {
    pub fn new(endpoint: String, http: HttpSettings, api_key: String) -> Result<Self> {
        Ok(Self {
            client: build_client(&http)?,
            endpoint,
            http,
            api_key,
        })
    }
}

#[async_trait]
impl MaterialsDatabase for MaterialsProjectClient {
    async fn search_stable(&self, formula: &str) -> Result<Vec<MaterialSummary>> {
        let url = join_url(&self.endpoint, "materials/summary/");
        tracing::debug!("GET {} formula={}", url, formula);

        let response: SummaryResponse = send_json(SERVICE, &self.http, || {
            self.client
                .get(&url)
                .header("X-API-KEY", &self.api_key)
                .query(&[
                    ("formula", formula),
                    ("is_stable", "true"),
                    ("_fields", SUMMARY_FIELDS),
                ])
        })
        .await?;

        tracing::debug!("{} stable entries for {}", response.data.len(), formula);
        Ok(response.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::PredictionError;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> MaterialsProjectClient {
        MaterialsProjectClient::new(
            server.base_url(),
            HttpSettings {
                timeout_seconds: 5,
                retry_attempts: 1,
                retry_delay_seconds: 0,
            },
            "mp-key".to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_search_parses_summary_documents() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/materials/summary/")
                .header("x-api-key", "mp-key")
                .query_param("formula", "MgO")
                .query_param("is_stable", "true")
                .query_param("_fields", SUMMARY_FIELDS);
            then.status(200).json_body(json!({
                "data": [{
                    "material_id": "mp-1265",
                    "formula_pretty": "MgO",
                    "formation_energy_per_atom": -3.0,
                    "band_gap": 4.45,
                    "density": 3.5,
                    "structure": {
                        "@module": "pymatgen.core.structure",
                        "lattice": {
                            "matrix": [[0.0, 2.1, 2.1], [2.1, 0.0, 2.1], [2.1, 2.1, 0.0]],
                            "pbc": [true, true, true],
                            "a": 2.97
                        },
                        "sites": [
                            {"species": [{"element": "Mg", "occu": 1}], "abc": [0.0, 0.0, 0.0],
                             "xyz": [0.0, 0.0, 0.0], "label": "Mg", "properties": {}},
                            {"species": [{"element": "O", "occu": 1}], "abc": [0.5, 0.5, 0.5],
                             "xyz": [2.1, 2.1, 2.1], "label": "O", "properties": {}}
                        ]
                    }
                }],
                "meta": {"total_doc": 1}
            }));
        });

        let entries = client(&server).search_stable("MgO").await.unwrap();

        mock.assert();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.material_id, "mp-1265");
        assert_eq!(entry.band_gap, Some(4.45));
        let structure = entry.structure.as_ref().unwrap();
        assert_eq!(structure.sites.len(), 2);
        assert_eq!(structure.sites[1].species[0].element, "O");
        assert_eq!(structure.lattice.matrix[2], [2.1, 2.1, 0.0]);
    }

    #[tokio::test]
    async fn test_null_properties_are_none() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/materials/summary/");
            then.status(200).json_body(json!({
                "data": [{"material_id": "mp-9", "formula_pretty": "X",
                          "formation_energy_per_atom": null, "band_gap": null}]
            }));
        });

        let entries = client(&server).search_stable("X").await.unwrap();
        assert_eq!(entries[0].formation_energy_per_atom, None);
        assert!(entries[0].structure.is_none());
    }

    #[tokio::test]
    async fn test_no_matches_is_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/materials/summary/");
            then.status(200).json_body(json!({"data": [], "meta": {"total_doc": 0}}));
        });

        assert!(client(&server).search_stable("Xx9").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_forbidden_is_status_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/materials/summary/");
            then.status(403).json_body(json!({"detail": "invalid api key"}));
        });

        let err = client(&server).search_stable("MgO").await.unwrap_err();
        assert!(matches!(
            err,
            PredictionError::ApiStatusError { status: 403, .. }
        ));
    }
}
