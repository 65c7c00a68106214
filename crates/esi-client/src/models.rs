//! Typed ESI response models
//!
//! Only the fields this client reads are modelled; unknown fields are
//! ignored so additions to the API do not break deserialization.

use serde::{Deserialize, Serialize};

/// `GET /universe/types/{type_id}/`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TypeInfo {
    pub type_id: i32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub group_id: i32,
    #[serde(default)]
    pub market_group_id: Option<i32>,
    pub published: bool,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub packaged_volume: Option<f64>,
    #[serde(default)]
    pub portion_size: Option<i32>,
}

/// `GET /universe/regions/{region_id}/`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Region {
    pub region_id: i32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub constellations: Vec<i32>,
}

/// Position in space, metres.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// `GET /universe/structures/{structure_id}` (requires a token)
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Structure {
    pub name: String,
    pub owner_id: i32,
    pub solar_system_id: i32,
    #[serde(default)]
    pub type_id: Option<i32>,
    #[serde(default)]
    pub position: Option<Position>,
}

/// A market order, from a region or a structure market.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MarketOrder {
    pub order_id: i64,
    pub type_id: i32,
    pub location_id: i64,
    /// Absent on structure market orders
    #[serde(default)]
    pub system_id: Option<i32>,
    pub is_buy_order: bool,
    pub price: f64,
    pub volume_remain: i64,
    pub volume_total: i64,
    pub min_volume: i64,
    pub duration: i32,
    /// ISO 8601 timestamp
    pub issued: String,
    pub range: String,
}

/// One day of `GET /markets/{region_id}/history/`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MarketHistory {
    /// `YYYY-MM-DD`
    pub date: String,
    pub average: f64,
    pub highest: f64,
    pub lowest: f64,
    pub order_count: i64,
    pub volume: i64,
}

/// Side filter for region market orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderType {
    Buy,
    Sell,
    #[default]
    All,
}

impl OrderType {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderType::Buy => "buy",
            OrderType::Sell => "sell",
            OrderType::All => "all",
        }
    }
}

impl std::str::FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(OrderType::Buy),
            "sell" => Ok(OrderType::Sell),
            "all" => Ok(OrderType::All),
            other => Err(format!("unknown order type {other:?}, expected buy, sell, or all")),
        }
    }
}

/// Service filter for `GET /universe/structures/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureFilter {
    Market,
    ManufacturingBasic,
}

impl StructureFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StructureFilter::Market => "market",
            StructureFilter::ManufacturingBasic => "manufacturing_basic",
        }
    }
}

impl std::str::FromStr for StructureFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "market" => Ok(StructureFilter::Market),
            "manufacturing_basic" => Ok(StructureFilter::ManufacturingBasic),
            other => Err(format!(
                "unknown structure filter {other:?}, expected market or manufacturing_basic"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_order_deserializes_region_payload() {
        let json = r#"{
            "duration": 90, "is_buy_order": false, "issued": "2024-05-01T10:00:00Z",
            "location_id": 60003760, "min_volume": 1, "order_id": 6712345678,
            "price": 5.12, "range": "region", "system_id": 30000142,
            "type_id": 34, "volume_remain": 1000000, "volume_total": 2000000
        }"#;
        let order: MarketOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.type_id, 34);
        assert_eq!(order.system_id, Some(30000142));
        assert!(!order.is_buy_order);
    }

    #[test]
    fn structure_order_has_no_system_id() {
        let json = r#"{
            "duration": 30, "is_buy_order": true, "issued": "2024-05-01T10:00:00Z",
            "location_id": 1035466617946, "min_volume": 1, "order_id": 1,
            "price": 4.0, "range": "station", "type_id": 35,
            "volume_remain": 10, "volume_total": 10
        }"#;
        let order: MarketOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.system_id, None);
    }

    #[test]
    fn type_info_ignores_unknown_fields() {
        let json = r#"{"type_id":34,"name":"Tritanium","description":"","group_id":18,
            "published":true,"volume":0.01,"dogma_attributes":[{"attribute_id":161,"value":0.01}]}"#;
        let info: TypeInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.name, "Tritanium");
        assert_eq!(info.market_group_id, None);
    }

    #[test]
    fn order_type_parses() {
        assert_eq!("buy".parse::<OrderType>().unwrap(), OrderType::Buy);
        assert_eq!(OrderType::default().as_str(), "all");
        assert!("both".parse::<OrderType>().is_err());
    }

    #[test]
    fn structure_filter_parses() {
        assert_eq!(
            "manufacturing_basic".parse::<StructureFilter>().unwrap(),
            StructureFilter::ManufacturingBasic
        );
        assert!("refinery".parse::<StructureFilter>().is_err());
    }
}
