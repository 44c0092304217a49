use std::collections::HashSet;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use tracing::info;

use crate::error::KiraError;

pub const KEGG_MODULE_LIST_URL: &str = "https://rest.kegg.jp/list/module";

const MODULE_PREFIX: &str = "module:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleReference {
    #[serde(rename = "KEGG_Module")]
    pub kegg_module: String,
    #[serde(rename = "Module_name")]
    pub module_name: String,
    #[serde(rename = "Module_description")]
    pub module_description: String,
}

/// KEGG module vocabulary, unique by module id in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: Vec<ModuleReference>,
    ids: HashSet<String>,
}

impl ReferenceTable {
    pub fn from_entries(entries: impl IntoIterator<Item = ModuleReference>) -> Self {
        let mut table = Self::default();
        for entry in entries {
            if table.ids.insert(entry.kegg_module.clone()) {
                table.entries.push(entry);
            }
        }
        table
    }

    pub fn entries(&self) -> &[ModuleReference] {
        &self.entries
    }

    pub fn contains(&self, module: &str) -> bool {
        self.ids.contains(module)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub trait KeggClient: Send + Sync {
    fn fetch_module_list(&self) -> Result<String, KiraError>;
}

#[derive(Clone)]
pub struct KeggHttpClient {
    client: Client,
    url: String,
}

impl KeggHttpClient {
    pub fn new() -> Result<Self, KiraError> {
        Self::with_url(KEGG_MODULE_LIST_URL)
    }

    pub fn with_url(url: &str) -> Result<Self, KiraError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-mm/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| KiraError::KeggHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| KiraError::KeggHttp(err.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl KeggClient for KeggHttpClient {
    fn fetch_module_list(&self) -> Result<String, KiraError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|err| KiraError::KeggHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "KEGG request failed".to_string());
            return Err(KiraError::KeggStatus { status, message });
        }
        response
            .text()
            .map_err(|err| KiraError::KeggHttp(err.to_string()))
    }
}

/// Download and parse the KEGG module list. No retries.
pub fn fetch_kegg_reference(client: &dyn KeggClient) -> Result<ReferenceTable, KiraError> {
    let body = client.fetch_module_list()?;
    let table = parse_module_list(&body)?;
    info!(modules = table.len(), "fetched KEGG module reference");
    Ok(table)
}

/// Parse `module:M00001\tGlycolysis, core module ...` lines.
pub fn parse_module_list(body: &str) -> Result<ReferenceTable, KiraError> {
    let mut entries = Vec::new();
    for (line_no, line) in body.trim().lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (id, description) = line.split_once('\t').ok_or_else(|| {
            KiraError::KeggParse(format!("line {}: expected two tab-separated columns", line_no + 1))
        })?;
        let id = id.trim();
        let kegg_module = id.strip_prefix(MODULE_PREFIX).unwrap_or(id).trim().to_string();
        let description = description.trim_end_matches('\r');
        let module_name = description
            .split_once(',')
            .map(|(name, _)| name)
            .unwrap_or(description)
            .to_string();
        entries.push(ModuleReference {
            kegg_module,
            module_name,
            module_description: description.to_string(),
        });
    }
    Ok(ReferenceTable::from_entries(entries))
}
