use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::DirectoryError;
use crate::fetch::HttpClient;
use crate::model::{RegionStations, StationDetail, StationList};
use crate::services::{StationDirectory, StationLookup};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FilterRequest<'a> {
    region_codes: &'a [String],
    ps_numbers: &'a [u32],
}

/// JSON-over-HTTP client for the polling-station directory service.
pub struct StationsApiClient<C> {
    base_url: Url,
    http: C,
}

impl<C: HttpClient> StationsApiClient<C> {
    pub fn new(base_url: &str, http: C) -> Result<Self, DirectoryError> {
        // trailing slash so that `join` appends instead of replacing the last segment
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| DirectoryError::InvalidUrl(format!("{base_url}: {e}")))?;

        Ok(Self { base_url, http })
    }

    fn endpoint(&self, path: &str) -> Result<Url, DirectoryError> {
        self.base_url
            .join(path)
            .map_err(|e| DirectoryError::InvalidUrl(format!("{path}: {e}")))
    }

    /// URL of the detail endpoint for `lookup`.
    pub(crate) fn detail_url(
        &self,
        lookup: &StationLookup,
        date: Option<NaiveDate>,
    ) -> Result<Url, DirectoryError> {
        let mut url = match lookup {
            StationLookup::ById(id) => self.endpoint(&format!("stations/{id}/info"))?,
            StationLookup::ByRegionAndNumber {
                region_code,
                ps_number,
            } => {
                let mut url = self.endpoint("stations/info")?;
                url.query_pairs_mut()
                    .append_pair("regionCode", region_code)
                    .append_pair("psNumber", &ps_number.to_string());
                url
            }
            StationLookup::ByAddress(_) => self.endpoint("stations/info/by-address")?,
        };

        if let Some(date) = date {
            url.query_pairs_mut()
                .append_pair("date", &date.format("%Y-%m-%d").to_string());
        }

        Ok(url)
    }

    fn get(url: Url) -> Request {
        let mut req = Request::new(Method::GET, url);
        req.headers_mut()
            .insert(ACCEPT, HeaderValue::from_static("application/json"));
        req
    }

    fn post_json<T: Serialize>(url: Url, body: &T) -> Result<Request, DirectoryError> {
        let mut req = Self::get(url);
        *req.method_mut() = Method::POST;
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *req.body_mut() = Some(serde_json::to_vec(body)?.into());
        Ok(req)
    }

    async fn send<T: DeserializeOwned>(&self, req: Request) -> Result<T, DirectoryError> {
        debug!(method = %req.method(), url = %req.url(), "Sending directory request");

        let response = self.http.execute(req).await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl<C: HttpClient> StationDirectory for StationsApiClient<C> {
    #[tracing::instrument(skip(self))]
    async fn list_stations(&self) -> Result<Vec<RegionStations>, DirectoryError> {
        let list: StationList = self.send(Self::get(self.endpoint("stations")?)).await?;
        Ok(list.regions)
    }

    #[tracing::instrument(skip(self))]
    async fn list_stations_filtered(
        &self,
        region_codes: &[String],
        station_numbers: &[u32],
    ) -> Result<Vec<RegionStations>, DirectoryError> {
        let body = FilterRequest {
            region_codes,
            ps_numbers: station_numbers,
        };
        let req = Self::post_json(self.endpoint("stations/filter")?, &body)?;
        let list: StationList = self.send(req).await?;
        Ok(list.regions)
    }

    #[tracing::instrument(skip(self, lookup), fields(lookup = %lookup.describe()))]
    async fn get_station_detail(
        &self,
        lookup: &StationLookup,
        date: Option<NaiveDate>,
    ) -> Result<StationDetail, DirectoryError> {
        let url = self.detail_url(lookup, date)?;
        let req = match lookup {
            StationLookup::ByAddress(address) => Self::post_json(url, address)?,
            _ => Self::get(url),
        };
        self.send(req).await
    }
}
