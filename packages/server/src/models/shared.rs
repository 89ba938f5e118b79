use serde::Serialize;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ListMeta {
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Number of items requested per page.
    #[schema(example = 10)]
    pub limit: u64,
    /// Offset of the first returned item.
    #[schema(example = 0)]
    pub offset: u64,
}
