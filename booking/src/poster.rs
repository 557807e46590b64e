//! Poster fallback: use the show's poster if it can be fetched, otherwise a
//! generated placeholder labelled with the movie title.

use crate::error::BookingError;
use reqwest::{Client, Url};
use showtime_client::Show;
use std::time::Duration;

/// Image path served by the service when a show has no poster of its own
const DEFAULT_POSTER_PATH: &str = "/static/poster.png";

/// The image a rendering layer should show for a show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poster {
    /// A reachable image
    Remote(String),
    /// Generated stand-in
    Placeholder {
        /// Text drawn on the placeholder (the movie title)
        label: String,
        /// Placeholder image URL with the label embedded
        url: String,
    },
}

impl Poster {
    /// URL to load
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Remote(url) | Self::Placeholder { url, .. } => url,
        }
    }
}

/// Resolves and probes poster URLs.
#[derive(Debug, Clone)]
pub struct PosterResolver {
    client: Client,
    origin: Url,
    placeholder_base: String,
}

impl PosterResolver {
    /// Resolver for a service whose API lives at `api_base`.
    ///
    /// Relative poster paths are resolved against the origin of `api_base`.
    ///
    /// # Errors
    ///
    /// `Network` if `api_base` is not a URL or the HTTP client cannot be built.
    pub fn new(
        api_base: &str,
        placeholder_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BookingError> {
        let mut origin = Url::parse(api_base)
            .map_err(|e| BookingError::Network(format!("{api_base}: {e}")))?;
        origin.set_path("/");
        origin.set_query(None);

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BookingError::Network(e.to_string()))?;

        Ok(Self {
            client,
            origin,
            placeholder_base: placeholder_base.into(),
        })
    }

    /// Where the poster for `show` should be, before probing
    #[must_use]
    pub fn candidate(&self, show: &Show) -> Option<Url> {
        let path = show
            .poster_url
            .as_deref()
            .filter(|path| !path.trim().is_empty())
            .unwrap_or(DEFAULT_POSTER_PATH);
        Url::parse(path).or_else(|_| self.origin.join(path)).ok()
    }

    /// Placeholder for `movie`
    #[must_use]
    pub fn placeholder(&self, movie: &str) -> Poster {
        let url = Url::parse_with_params(&self.placeholder_base, &[("text", movie)])
            .map_or_else(|_| self.placeholder_base.clone(), String::from);
        Poster::Placeholder {
            label: movie.to_string(),
            url,
        }
    }

    /// Probe the candidate URL; fall back to the placeholder if it is
    /// missing or unreachable.
    #[tracing::instrument(skip_all, fields(show_id = %show.id))]
    pub async fn resolve(&self, show: &Show) -> Poster {
        let Some(url) = self.candidate(show) else {
            return self.placeholder(&show.movie);
        };

        match self.client.head(url.clone()).send().await {
            Ok(response) if response.status().is_success() => Poster::Remote(url.into()),
            Ok(response) => {
                tracing::debug!(status = %response.status(), %url, "Poster missing, using placeholder");
                self.placeholder(&show.movie)
            },
            Err(error) => {
                tracing::debug!(%error, %url, "Poster unreachable, using placeholder");
                self.placeholder(&show.movie)
            },
        }
    }
}
