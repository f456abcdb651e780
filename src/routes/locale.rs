//! Request locale extraction.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Query},
    http::{header, request::Parts},
};
use serde::Deserialize;

use crate::format::Locale;

#[derive(Deserialize)]
struct LangParams {
    lang: Option<String>,
}

/// Locale requested by the client: `?lang=` wins over `Accept-Language`.
///
/// `None` when neither names a supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLocale(pub Option<Locale>);

impl<S> FromRequestParts<S> for RequestLocale
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_query = Query::<LangParams>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(params)| params.lang)
            .and_then(|tag| Locale::from_tag(&tag));

        let locale = from_query.or_else(|| {
            parts
                .headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|h| h.to_str().ok())
                .and_then(Locale::from_accept_language)
        });

        Ok(RequestLocale(locale))
    }
}
