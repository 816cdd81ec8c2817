//! Host content API access.
//!
//! [`ContentApi`] is the seam the engine is generic over; [`DatoClient`] talks
//! to the real CMA REST endpoints, tests use an in-memory fake.

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::future::Future;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::model::{Field, Model, Record, Site};

pub trait ContentApi: Send + Sync {
    fn site(&self) -> impl Future<Output = Result<Site>> + Send;

    fn list_models(&self) -> impl Future<Output = Result<Vec<Model>>> + Send;

    fn list_fields(&self, model_id: &str) -> impl Future<Output = Result<Vec<Field>>> + Send;

    /// Every record of a model with nested blocks expanded, one page at a time.
    fn records<'a>(&'a self, model_id: &'a str) -> BoxStream<'a, Result<Record>>;

    fn get_record(&self, record_id: &str) -> impl Future<Output = Result<Record>> + Send;

    fn update_record(
        &self,
        record_id: &str,
        attributes: &Map<String, Value>,
    ) -> impl Future<Output = Result<Record>> + Send;
}

pub struct DatoClient {
    http: Client,
    base_url: String,
    token: String,
    environment: Option<String>,
    page_size: u32,
}

#[derive(Deserialize)]
struct Document<T> {
    data: T,
    #[serde(default)]
    meta: Option<PageMeta>,
}

#[derive(Deserialize)]
struct PageMeta {
    total_count: Option<u64>,
}

#[derive(Deserialize)]
struct Resource<A> {
    id: String,
    attributes: A,
    #[serde(default)]
    relationships: Option<Relationships>,
}

#[derive(Deserialize)]
struct Relationships {
    item_type: Option<Relation>,
}

#[derive(Deserialize)]
struct Relation {
    data: Option<ResourceRef>,
}

#[derive(Deserialize)]
struct ResourceRef {
    id: String,
}

#[derive(Deserialize)]
struct SiteAttributes {
    name: String,
    #[serde(default)]
    locales: Vec<String>,
}

#[derive(Deserialize)]
struct ItemTypeAttributes {
    name: String,
    api_key: String,
    #[serde(default)]
    modular_block: bool,
}

#[derive(Deserialize)]
struct FieldAttributes {
    label: String,
    api_key: String,
    field_type: String,
    #[serde(default)]
    localized: bool,
}

impl From<Resource<SiteAttributes>> for Site {
    fn from(r: Resource<SiteAttributes>) -> Self {
        Site {
            name: r.attributes.name,
            locales: r.attributes.locales,
        }
    }
}

impl From<Resource<ItemTypeAttributes>> for Model {
    fn from(r: Resource<ItemTypeAttributes>) -> Self {
        Model {
            id: r.id,
            name: r.attributes.name,
            api_key: r.attributes.api_key,
            modular_block: r.attributes.modular_block,
        }
    }
}

impl From<Resource<FieldAttributes>> for Field {
    fn from(r: Resource<FieldAttributes>) -> Self {
        Field {
            id: r.id,
            api_key: r.attributes.api_key,
            label: r.attributes.label,
            field_type: r.attributes.field_type,
            localized: r.attributes.localized,
        }
    }
}

impl From<Resource<Map<String, Value>>> for Record {
    fn from(r: Resource<Map<String, Value>>) -> Self {
        let model_id = r
            .relationships
            .and_then(|rel| rel.item_type)
            .and_then(|rel| rel.data)
            .map(|data| data.id)
            .unwrap_or_default();
        Record {
            id: r.id,
            model_id,
            attributes: r.attributes,
        }
    }
}

/// Largest `page[limit]` the records endpoint serves.
pub const MAX_PAGE_SIZE: u32 = 500;

/// One page of records plus the offset of the next page, if any.
type Page = Option<(Vec<Record>, Option<u64>)>;

/// Offset of the page after one that returned `fetched` records.
///
/// `total_count` decides when it is known; a server may serve fewer records
/// than asked for without being done. Without it, a short page is the end.
/// An empty page always ends the stream.
fn next_offset(offset: u64, fetched: u64, page_size: u32, total: Option<u64>) -> Option<u64> {
    if fetched == 0 {
        return None;
    }
    let next = offset + fetched;
    let more = match total {
        Some(total) => next < total,
        None => fetched >= u64::from(page_size),
    };
    more.then_some(next)
}

fn error_for_status(status: StatusCode, body: String) -> Error {
    if status == StatusCode::TOO_MANY_REQUESTS {
        Error::RateLimited
    } else {
        Error::Api {
            status: status.as_u16(),
            body,
        }
    }
}

impl DatoClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let token = config.require_token()?.to_string();
        let http = Client::builder()
            .user_agent(concat!("locale-duper/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            environment: config.environment.clone(),
            page_size: config.page_size.clamp(1, MAX_PAGE_SIZE),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .header("X-Api-Version", "3");
        if let Some(environment) = &self.environment {
            builder = builder.header("X-Environment", environment);
        }
        builder
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Document<T>> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!("Content API rate limit hit");
            }
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, body));
        }

        Ok(response.json::<Document<T>>().await?)
    }

    async fn next_page(&self, model_id: &str, offset: Option<u64>) -> Result<Page> {
        let Some(offset) = offset else {
            return Ok(None);
        };

        let query = [
            ("filter[type]", model_id.to_string()),
            ("nested", "true".to_string()),
            ("page[offset]", offset.to_string()),
            ("page[limit]", self.page_size.to_string()),
        ];
        let document: Document<Vec<Resource<Map<String, Value>>>> =
            self.send(self.request(Method::GET, "/items").query(&query)).await?;

        let records: Vec<Record> = document.data.into_iter().map(Record::from).collect();
        let fetched = records.len() as u64;
        let total = document.meta.and_then(|m| m.total_count);
        debug!(
            "Fetched {} records of model {} at offset {} (total {:?})",
            fetched, model_id, offset, total
        );

        let next = next_offset(offset, fetched, self.page_size, total);
        Ok(Some((records, next)))
    }
}

impl ContentApi for DatoClient {
    async fn site(&self) -> Result<Site> {
        let document: Document<Resource<SiteAttributes>> =
            self.send(self.request(Method::GET, "/site")).await?;
        Ok(document.data.into())
    }

    async fn list_models(&self) -> Result<Vec<Model>> {
        let document: Document<Vec<Resource<ItemTypeAttributes>>> =
            self.send(self.request(Method::GET, "/item-types")).await?;
        Ok(document.data.into_iter().map(Model::from).collect())
    }

    async fn list_fields(&self, model_id: &str) -> Result<Vec<Field>> {
        let path = format!("/item-types/{model_id}/fields");
        let document: Document<Vec<Resource<FieldAttributes>>> =
            self.send(self.request(Method::GET, &path)).await?;
        Ok(document.data.into_iter().map(Field::from).collect())
    }

    fn records<'a>(&'a self, model_id: &'a str) -> BoxStream<'a, Result<Record>> {
        stream::try_unfold(Some(0), move |offset| self.next_page(model_id, offset))
            .map_ok(|records| stream::iter(records.into_iter().map(Ok::<Record, Error>)))
            .try_flatten()
            .boxed()
    }

    async fn get_record(&self, record_id: &str) -> Result<Record> {
        let path = format!("/items/{record_id}");
        let document: Document<Resource<Map<String, Value>>> = self
            .send(self.request(Method::GET, &path).query(&[("nested", "true")]))
            .await?;
        Ok(document.data.into())
    }

    async fn update_record(&self, record_id: &str, attributes: &Map<String, Value>) -> Result<Record> {
        let path = format!("/items/{record_id}");
        let body = json!({
            "data": {
                "type": "item",
                "id": record_id,
                "attributes": attributes,
            }
        });
        let document: Document<Resource<Map<String, Value>>> = self
            .send(self.request(Method::PUT, &path).json(&body))
            .await?;
        Ok(document.data.into())
    }
}
