//! `/universe` resources

use crate::client::{EsiClient, page_param};
use crate::error::Result;
use crate::models::{Region, Structure, StructureFilter, TypeInfo};

impl EsiClient {
    /// Published type ids, one page at a time.
    pub async fn types(&self, page: Option<u32>) -> Result<Vec<i32>> {
        self.get_json("/universe/types/", &[("page", page_param(page))])
            .await
    }

    pub async fn type_info(&self, type_id: i32) -> Result<TypeInfo> {
        self.get_json(&format!("/universe/types/{type_id}/"), &[])
            .await
    }

    pub async fn regions(&self) -> Result<Vec<i32>> {
        self.get_json("/universe/regions/", &[]).await
    }

    pub async fn region(&self, region_id: i32) -> Result<Region> {
        self.get_json(&format!("/universe/regions/{region_id}/"), &[])
            .await
    }

    /// Public structure ids, optionally limited to those offering a service.
    pub async fn structures(&self, filter: Option<StructureFilter>) -> Result<Vec<i64>> {
        self.get_json(
            "/universe/structures/",
            &[("filter", filter.map(|f| f.as_str().to_string()))],
        )
        .await
    }

    /// Structure details; requires `esi-universe.read_structures.v1`.
    pub async fn structure(&self, structure_id: i64) -> Result<Structure> {
        self.get_json(&format!("/universe/structures/{structure_id}"), &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::client::JSON_CONTENT_TYPE;
    use crate::client::tests::start_api;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn types_requests_page() {
        let (client, seen) = start_api(StatusCode::OK, JSON_CONTENT_TYPE, "[18,19,20]", vec![]).await;
        assert_eq!(client.types(Some(2)).await.unwrap(), vec![18, 19, 20]);

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].path, "/latest/universe/types/");
        assert_eq!(seen[0].query, "datasource=tranquility&page=2");
    }

    #[tokio::test]
    async fn type_info_uses_id_path() {
        let (client, seen) = start_api(
            StatusCode::OK,
            JSON_CONTENT_TYPE,
            r#"{"type_id":34,"name":"Tritanium","description":"","group_id":18,"published":true}"#,
            vec![],
        )
        .await;
        let info = client.type_info(34).await.unwrap();
        assert_eq!(info.name, "Tritanium");
        assert_eq!(seen.lock().unwrap()[0].path, "/latest/universe/types/34/");
    }

    #[tokio::test]
    async fn region_lookup() {
        let (client, seen) = start_api(
            StatusCode::OK,
            JSON_CONTENT_TYPE,
            r#"{"region_id":10000002,"name":"The Forge","constellations":[20000020]}"#,
            vec![],
        )
        .await;
        let region = client.region(10000002).await.unwrap();
        assert_eq!(region.name, "The Forge");
        assert_eq!(region.constellations, vec![20000020]);
        assert_eq!(seen.lock().unwrap()[0].path, "/latest/universe/regions/10000002/");
    }

    #[tokio::test]
    async fn structures_sends_filter_only_when_set() {
        let (client, seen) = start_api(StatusCode::OK, JSON_CONTENT_TYPE, "[1035466617946]", vec![]).await;
        client.structures(None).await.unwrap();
        client
            .structures(Some(crate::StructureFilter::Market))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].query, "datasource=tranquility");
        assert_eq!(seen[1].query, "datasource=tranquility&filter=market");
    }

    #[tokio::test]
    async fn structure_without_access_is_api_error() {
        let (client, seen) = start_api(
            StatusCode::FORBIDDEN,
            JSON_CONTENT_TYPE,
            r#"{"error":"Forbidden"}"#,
            vec![],
        )
        .await;
        let err = client.structure(1035466617946).await.unwrap_err();
        assert_eq!(err.to_string(), "Forbidden");
        assert_eq!(
            seen.lock().unwrap()[0].path,
            "/latest/universe/structures/1035466617946"
        );
    }
}
