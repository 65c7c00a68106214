//! Client for the EVE Swagger Interface (ESI)
//!
//! `EsiClient::request` is the single request primitive; the universe and
//! market methods are thin wrappers that template a path and parameters
//! into it and deserialize the JSON body into the models in `models`.
//!
//! The client does not obtain tokens. Pass an access token from
//! `esi-auth` (or anywhere else) with `EsiClient::with_token`.

pub mod client;
pub mod error;
pub mod markets;
pub mod models;
pub mod universe;

pub use client::{
    Body, ClientOptions, DEFAULT_BASE_URL, DEFAULT_DATASOURCE, DEFAULT_LANGUAGE, DEFAULT_VERSION,
    EsiClient, JSON_CONTENT_TYPE, Params, Response,
};
pub use error::{Error, Result};
pub use markets::OrderQuery;
pub use models::{
    MarketHistory, MarketOrder, OrderType, Position, Region, Structure, StructureFilter, TypeInfo,
};
