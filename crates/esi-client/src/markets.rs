//! `/markets` resources

use tracing::debug;

use crate::client::{EsiClient, page_param};
use crate::error::Result;
use crate::models::{MarketHistory, MarketOrder, OrderType};

/// Filters for region market orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderQuery {
    pub order_type: OrderType,
    pub type_id: Option<i32>,
    pub page: Option<u32>,
}

impl EsiClient {
    /// Type ids with active orders in a region.
    pub async fn market_types(&self, region_id: i32, page: Option<u32>) -> Result<Vec<i32>> {
        self.get_json(
            &format!("/markets/{region_id}/types/"),
            &[("page", page_param(page))],
        )
        .await
    }

    /// One page of a region's orders.
    pub async fn market_orders(&self, region_id: i32, query: OrderQuery) -> Result<Vec<MarketOrder>> {
        Ok(self.market_orders_page(region_id, query).await?.0)
    }

    async fn market_orders_page(
        &self,
        region_id: i32,
        query: OrderQuery,
    ) -> Result<(Vec<MarketOrder>, Option<u32>)> {
        self.get_page(
            &format!("/markets/{region_id}/orders/"),
            &[
                ("order_type", Some(query.order_type.as_str().to_string())),
                ("type_id", query.type_id.map(|id| id.to_string())),
                ("page", page_param(query.page)),
            ],
        )
        .await
    }

    /// Every page of a region's orders, following `x-pages`.
    ///
    /// `query.page` is ignored.
    pub async fn market_orders_all(
        &self,
        region_id: i32,
        query: OrderQuery,
    ) -> Result<Vec<MarketOrder>> {
        let first = OrderQuery {
            page: Some(1),
            ..query
        };
        let (mut orders, pages) = self.market_orders_page(region_id, first).await?;
        let pages = pages.unwrap_or(1);

        for page in 2..=pages {
            debug!(region_id, page, pages, "fetching market orders page");
            let next = OrderQuery {
                page: Some(page),
                ..query
            };
            orders.extend(self.market_orders_page(region_id, next).await?.0);
        }
        Ok(orders)
    }

    /// Daily price history for one type in a region.
    pub async fn market_history(&self, region_id: i32, type_id: i32) -> Result<Vec<MarketHistory>> {
        self.get_json(
            &format!("/markets/{region_id}/history/"),
            &[("type_id", Some(type_id.to_string()))],
        )
        .await
    }

    /// Orders in a player structure's market; requires
    /// `esi-markets.structure_markets.v1`.
    pub async fn structure_orders(
        &self,
        structure_id: i64,
        page: Option<u32>,
    ) -> Result<Vec<MarketOrder>> {
        self.get_json(
            &format!("/markets/structures/{structure_id}/"),
            &[("page", page_param(page))],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::JSON_CONTENT_TYPE;
    use crate::client::tests::start_api;
    use axum::http::StatusCode;

    const ORDER: &str = r#"[{"duration":90,"is_buy_order":true,"issued":"2024-05-01T10:00:00Z",
        "location_id":60003760,"min_volume":1,"order_id":1,"price":5.0,"range":"region",
        "system_id":30000142,"type_id":34,"volume_remain":10,"volume_total":10}]"#;

    #[tokio::test]
    async fn market_orders_sends_filters() {
        let (client, seen) = start_api(StatusCode::OK, JSON_CONTENT_TYPE, ORDER, vec![]).await;
        let orders = client
            .market_orders(
                10000002,
                OrderQuery {
                    order_type: OrderType::Buy,
                    type_id: Some(34),
                    page: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].path, "/latest/markets/10000002/orders/");
        assert_eq!(
            seen[0].query,
            "datasource=tranquility&order_type=buy&type_id=34"
        );
    }

    #[tokio::test]
    async fn market_orders_all_walks_every_page() {
        let (client, seen) =
            start_api(StatusCode::OK, JSON_CONTENT_TYPE, ORDER, vec![("x-pages", "3")]).await;
        let orders = client
            .market_orders_all(10000002, OrderQuery::default())
            .await
            .unwrap();
        assert_eq!(orders.len(), 3);

        let queries: Vec<String> = seen.lock().unwrap().iter().map(|s| s.query.clone()).collect();
        assert_eq!(
            queries,
            vec![
                "datasource=tranquility&order_type=all&page=1",
                "datasource=tranquility&order_type=all&page=2",
                "datasource=tranquility&order_type=all&page=3",
            ]
        );
    }

    #[tokio::test]
    async fn market_orders_all_without_pages_header_is_one_page() {
        let (client, seen) = start_api(StatusCode::OK, JSON_CONTENT_TYPE, ORDER, vec![]).await;
        let orders = client
            .market_orders_all(10000002, OrderQuery::default())
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn market_history_requires_type_id() {
        let (client, seen) = start_api(
            StatusCode::OK,
            JSON_CONTENT_TYPE,
            r#"[{"date":"2024-05-01","average":5.1,"highest":5.3,"lowest":4.9,"order_count":1200,"volume":90000000}]"#,
            vec![],
        )
        .await;
        let history = client.market_history(10000002, 34).await.unwrap();
        assert_eq!(history[0].date, "2024-05-01");

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].path, "/latest/markets/10000002/history/");
        assert_eq!(seen[0].query, "datasource=tranquility&type_id=34");
    }

    #[tokio::test]
    async fn market_types_and_structure_orders_paths() {
        let (client, seen) = start_api(StatusCode::OK, JSON_CONTENT_TYPE, "[]", vec![]).await;
        client.market_types(10000002, Some(0)).await.unwrap();
        client.structure_orders(1035466617946, Some(4)).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].path, "/latest/markets/10000002/types/");
        assert_eq!(seen[0].query, "datasource=tranquility");
        assert_eq!(seen[1].path, "/latest/markets/structures/1035466617946/");
        assert_eq!(seen[1].query, "datasource=tranquility&page=4");
    }
}
