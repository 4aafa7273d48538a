// Travelpayouts-style price API client.
use crate::model::{FetchError, FlightOffer};
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Source of raw offers for a route. The engine never talks to the network
/// itself; the orchestration layer pulls from an `OfferSource` and feeds the
/// results through the engine.
#[async_trait::async_trait]
pub trait OfferSource: Send + Sync {
    async fn search_prices(
        &self,
        origin: &str,
        destination: &str,
        departure_at: Option<NaiveDate>,
        one_way: bool,
    ) -> Result<Vec<FlightOffer>, FetchError>;
}

pub struct TravelApiFetcher {
    client: Client,
    token: String,
    marker: String,
    currency: String,
    base_url: String,
    domain: String,
}

const DEFAULT_BASE_URL: &str = "https://api.travelpayouts.com/aviasales/v3";
const DEFAULT_DOMAIN: &str = "https://www.aviasales.com";
const RESULT_LIMIT: u32 = 100;
const MAX_AGE_H: u32 = 12;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    success: bool,
    #[serde(default)]
    data: Vec<ApiOffer>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiOffer {
    origin: String,
    destination: String,
    price: Decimal,
    #[serde(default)]
    airline: String,
    #[serde(default)]
    number_of_changes: u32,
    departure_at: Option<String>,
    return_at: Option<String>,
    link: Option<String>,
}

impl TravelApiFetcher {
    pub fn new(token: String, marker: String, currency: String) -> Self {
        let client = Client::builder()
            .user_agent("FareSniperBot/0.1")
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("❗ Failed to create HTTP client");
        Self {
            client,
            token,
            marker,
            currency,
            base_url: DEFAULT_BASE_URL.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
        }
    }

    fn build_url(
        &self,
        origin: &str,
        destination: &str,
        departure_at: Option<NaiveDate>,
        one_way: bool,
    ) -> String {
        let mut url = format!(
            "{}/prices_for_dates?origin={}&destination={}&currency={}&token={}",
            self.base_url, origin, destination, self.currency, self.token
        );
        if let Some(date) = departure_at {
            url.push_str(&format!("&departure_at={}", date));
        }
        url.push_str(&format!(
            "&limit={}&one_way={}&max_age={}",
            RESULT_LIMIT, one_way, MAX_AGE_H
        ));
        if !self.marker.is_empty() {
            url.push_str(&format!("&marker={}", self.marker));
        }
        url
    }

    /// Maps one API record into a `FlightOffer`; records without a booking
    /// link or with unparseable dates are dropped.
    fn to_offer(&self, item: ApiOffer) -> Option<FlightOffer> {
        let link = item.link?;

        let depart_raw = item.departure_at?;
        let depart_date = NaiveDate::parse_from_str(depart_raw.get(..10)?, "%Y-%m-%d").ok()?;
        let return_date = match item.return_at {
            Some(raw) => Some(NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()?),
            None => None,
        };

        Some(FlightOffer {
            deep_link: format!("{}{}", self.domain, link),
            origin: item.origin,
            destination: item.destination,
            depart_date,
            return_date,
            price: item.price,
            airline: item.airline,
            stops: item.number_of_changes,
            total_flight_time_h: None,
            max_layover_h: None,
            fetched_at: Utc::now(),
            alert_sent: false,
        })
    }
}

#[async_trait::async_trait]
impl OfferSource for TravelApiFetcher {
    async fn search_prices(
        &self,
        origin: &str,
        destination: &str,
        departure_at: Option<NaiveDate>,
        one_way: bool,
    ) -> Result<Vec<FlightOffer>, FetchError> {
        let url = self.build_url(origin, destination, departure_at, one_way);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Api(format!("HTTP {}", response.status())));
        }

        let payload: ApiResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Payload(e.to_string()))?;
        if !payload.success {
            return Err(FetchError::Api(
                payload.error.unwrap_or_else(|| "unknown".into()),
            ));
        }

        Ok(payload
            .data
            .into_iter()
            .filter_map(|item| self.to_offer(item))
            .collect())
    }
}
