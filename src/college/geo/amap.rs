// SPDX-License-Identifier: MIT

//! AMap (Gaode) REST client - geocoding and public-transit routing

use crate::config::AmapSettings;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const PROVIDER: &str = "amap";

/// Geocoding result for one address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geocode {
    /// `"lng,lat"`
    pub location: String,
    pub adcode: String,
    pub citycode: String,
}

/// Geographic lookups used by registration, analysis and the assistant
#[async_trait]
pub trait GeoService: Send + Sync {
    async fn geocode(&self, address: &str, city: Option<&str>) -> Result<Geocode, AppError>;

    /// Plan a public-transit route between two `"lng,lat"` points.
    /// `city` is the origin city, `cityd` the destination city for cross-city trips.
    async fn transit_route(
        &self,
        origin: &str,
        destination: &str,
        city: &str,
        cityd: Option<&str>,
    ) -> Result<Value, AppError>;
}

pub struct AmapClient {
    client: Client,
    api_key: String,
    geocode_url: String,
    transit_url: String,
}

impl AmapClient {
    pub fn new(settings: &AmapSettings) -> Result<Self, AppError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::config("AMAP_API_KEY must be set"))?;

        Ok(Self {
            client: Client::new(),
            api_key,
            geocode_url: settings.geocode_url.clone(),
            transit_url: settings.transit_url.clone(),
        })
    }

    async fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<Value, AppError> {
        let query = non_empty(params);
        let resp = self.client.get(url).query(&query).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await?;
            let message = format!("{}: {}", status, text);
            return Err(AppError::upstream(PROVIDER, message));
        }

        let body: Value = resp.json().await?;
        check_status(&body)?;
        Ok(body)
    }
}

#[async_trait]
impl GeoService for AmapClient {
    async fn geocode(&self, address: &str, city: Option<&str>) -> Result<Geocode, AppError> {
        log::debug!("Geocoding '{}' (city: {:?})", address, city);
        let body = self
            .get(
                &self.geocode_url,
                &[
                    ("key", self.api_key.as_str()),
                    ("address", address),
                    ("city", city.unwrap_or_default()),
                    ("output", "JSON"),
                ],
            )
            .await?;
        parse_geocode(&body)
    }

    async fn transit_route(
        &self,
        origin: &str,
        destination: &str,
        city: &str,
        cityd: Option<&str>,
    ) -> Result<Value, AppError> {
        log::debug!("Planning transit {} -> {}", origin, destination);
        self.get(
            &self.transit_url,
            &[
                ("key", self.api_key.as_str()),
                ("origin", origin),
                ("destination", destination),
                ("city", city),
                ("cityd", cityd.unwrap_or_default()),
                ("nightflag", "1"),
                ("output", "JSON"),
            ],
        )
        .await
    }
}

/// Drop parameters with empty values
fn non_empty<'a>(params: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
    params
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .copied()
        .collect()
}

/// AMap reports success with `"status": "1"` and puts the reason in `info`
fn check_status(body: &Value) -> Result<(), AppError> {
    if body["status"].as_str() == Some("1") {
        return Ok(());
    }
    let info = body["info"].as_str().unwrap_or("unknown error");
    let code = body["infocode"].as_str().unwrap_or("-");
    Err(AppError::upstream(PROVIDER, format!("{} ({})", info, code)))
}

/// Empty fields come back as `[]` instead of strings
fn text_field(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

fn parse_geocode(body: &Value) -> Result<Geocode, AppError> {
    let first = body["geocodes"]
        .as_array()
        .and_then(|g| g.first())
        .ok_or_else(|| AppError::upstream(PROVIDER, "no geocode result for address"))?;

    let location = text_field(&first["location"]);
    if location.is_empty() {
        return Err(AppError::upstream(
            PROVIDER,
            "geocode result has no location",
        ));
    }

    Ok(Geocode {
        location,
        adcode: text_field(&first["adcode"]),
        citycode: text_field(&first["citycode"]),
    })
}

/// Remove the per-transit `segments` detail from a route response, leaving
/// distance, duration and cost summaries.
pub fn strip_segments(route: &mut Value) {
    if let Some(transits) = route
        .get_mut("route")
        .and_then(|r| r.get_mut("transits"))
        .and_then(Value::as_array_mut)
    {
        for transit in transits {
            if let Some(obj) = transit.as_object_mut() {
                obj.remove("segments");
            }
        }
    }
}
