//! HTTP implementation of [`SeatInventory`]

use crate::{
    error::InventoryError,
    inventory::{InventoryFuture, SeatInventory},
    types::{
        BookReceipt, BookingRecord, Credentials, HoldReceipt, SeatKey, Show, ShowId, Snapshot,
        Ticket,
    },
};
use chrono::NaiveDate;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Seat-inventory client speaking JSON over HTTP
///
/// Keeps a cookie store, so a successful [`SeatInventory::login`] carries
/// over to every later call made through this client (or its clones).
#[derive(Clone, Debug)]
pub struct HttpSeatInventory {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    show_id: ShowId,
    seats: &'a [SeatKey],
}

#[derive(Deserialize)]
struct ShowsEnvelope {
    shows: Vec<Show>,
}

#[derive(Deserialize)]
struct BookingsEnvelope {
    bookings: Vec<BookingRecord>,
}

#[derive(Deserialize)]
struct TicketEnvelope {
    ticket: Ticket,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpSeatInventory {
    /// Create a client for the service rooted at `base_url`
    /// (for example `http://127.0.0.1:8000/api/seats`).
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::InvalidBaseUrl` if the URL does not parse or
    /// the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, InventoryError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| InventoryError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| InventoryError::InvalidBaseUrl(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// The base URL requests are made against, without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    #[tracing::instrument(level = "debug", skip(self, query), err)]
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, InventoryError> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| InventoryError::RequestFailed(e.to_string()))?;
        read_json(response).await
    }

    #[tracing::instrument(level = "debug", skip(self, body), err)]
    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, InventoryError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| InventoryError::RequestFailed(e.to_string()))?;
        read_json(response).await
    }
}

/// Map a service response onto the error model, or decode its body.
///
/// 401 and 404 keep their own variants; any other failure status is
/// `Rejected`, carrying the `{error}` message when the service sent one.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, InventoryError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| InventoryError::RequestFailed(e.to_string()))?;

    let error_message = || {
        serde_json::from_str::<ErrorBody>(&body)
            .map(|payload| payload.error)
            .unwrap_or_else(|_| body.trim().to_string())
    };

    match status {
        StatusCode::UNAUTHORIZED => Err(InventoryError::Unauthorized),
        StatusCode::NOT_FOUND => Err(InventoryError::NotFound(error_message())),
        status if !status.is_success() => Err(InventoryError::Rejected {
            status: status.as_u16(),
            message: error_message(),
        }),
        status => {
            // A 2xx carrying an `{error}` payload is still a rejection
            if let Ok(payload) = serde_json::from_str::<ErrorBody>(&body) {
                return Err(InventoryError::Rejected {
                    status: status.as_u16(),
                    message: payload.error,
                });
            }
            serde_json::from_str(&body)
                .map_err(|e| InventoryError::ResponseParseFailed(e.to_string()))
        },
    }
}

impl SeatInventory for HttpSeatInventory {
    fn list_shows(&self, date: Option<NaiveDate>) -> InventoryFuture<'_, Vec<Show>> {
        Box::pin(async move {
            let query: Vec<(&str, String)> = date
                .map(|d| ("date", d.format("%Y-%m-%d").to_string()))
                .into_iter()
                .collect();
            let envelope: ShowsEnvelope = self.get("shows/", &query).await?;
            tracing::debug!(count = envelope.shows.len(), "Fetched show catalog");
            Ok(envelope.shows)
        })
    }

    fn fetch_snapshot(&self, show_id: ShowId) -> InventoryFuture<'_, Snapshot> {
        Box::pin(async move {
            self.get("", &[("show_id", show_id.to_string())]).await
        })
    }

    fn login<'a>(&'a self, credentials: &'a Credentials) -> InventoryFuture<'a, ()> {
        Box::pin(async move {
            let _: serde_json::Value = self.post("login/", credentials).await?;
            tracing::debug!(username = %credentials.username, "Logged in");
            Ok(())
        })
    }

    fn register<'a>(&'a self, credentials: &'a Credentials) -> InventoryFuture<'a, ()> {
        Box::pin(async move {
            let _: serde_json::Value = self.post("register/", credentials).await?;
            tracing::debug!(username = %credentials.username, "Registered account");
            Ok(())
        })
    }

    fn logout(&self) -> InventoryFuture<'_, ()> {
        Box::pin(async move {
            let _: serde_json::Value = self.post("logout/", &serde_json::json!({})).await?;
            Ok(())
        })
    }

    fn hold_batch<'a>(
        &'a self,
        show_id: ShowId,
        seats: &'a [SeatKey],
    ) -> InventoryFuture<'a, HoldReceipt> {
        Box::pin(async move {
            self.post("hold-batch/", &BatchRequest { show_id, seats })
                .await
        })
    }

    fn book_batch<'a>(
        &'a self,
        show_id: ShowId,
        seats: &'a [SeatKey],
    ) -> InventoryFuture<'a, BookReceipt> {
        Box::pin(async move {
            self.post("book-batch/", &BatchRequest { show_id, seats })
                .await
        })
    }

    fn release_batch<'a>(
        &'a self,
        show_id: ShowId,
        seats: &'a [SeatKey],
    ) -> InventoryFuture<'a, ()> {
        Box::pin(async move {
            let _: serde_json::Value = self
                .post("release-hold-batch/", &BatchRequest { show_id, seats })
                .await?;
            Ok(())
        })
    }

    fn my_bookings(&self) -> InventoryFuture<'_, Vec<BookingRecord>> {
        Box::pin(async move {
            let envelope: BookingsEnvelope = self.get("my-bookings/", &[]).await?;
            Ok(envelope.bookings)
        })
    }

    fn ticket(&self, booking_id: i64) -> InventoryFuture<'_, Ticket> {
        Box::pin(async move {
            let envelope: TicketEnvelope =
                self.get(&format!("booking/{booking_id}/ticket/"), &[]).await?;
            Ok(envelope.ticket)
        })
    }
}
