use crate::api::recipes::RecipeResponse;
use crate::api::ErrorResponse;
use crate::store;
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 8;
pub const MAX_LIMIT: i64 = 50;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListRecipesParams {
    /// Free-text search, matched case-insensitively as a literal substring
    /// against the title, every ingredient, and the instructions
    pub search: Option<String>,
    /// Alias for `search`; used when `search` is absent or blank
    pub q: Option<String>,
    /// 1-based page number (default: 1)
    pub page: Option<String>,
    /// Page size (default: 8, max: 50)
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListRecipesResponse {
    pub items: Vec<RecipeResponse>,
    pub page: i64,
    pub limit: i64,
    /// Count of all records matching the filter, ignoring pagination
    pub total: i64,
    pub pages: i64,
    /// Same value as `pages`, kept for client compatibility
    pub total_pages: i64,
}

/// Lenient parse: missing or unparsable input falls back to the default
/// rather than failing the request.
pub(crate) fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map(|page| page.max(1))
        .unwrap_or(DEFAULT_PAGE)
}

pub(crate) fn parse_limit(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map(|limit| limit.clamp(1, MAX_LIMIT))
        .unwrap_or(DEFAULT_LIMIT)
}

/// Escape LIKE metacharacters so user text only ever matches as a literal
/// substring. Mandatory sanitization boundary for anything that ends up in a
/// pattern-matching filter.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Build the LIKE pattern from `search`, falling back to the `q` alias when
/// `search` is absent or blank. Blank input means no filter at all.
pub(crate) fn search_pattern(search: Option<&str>, q: Option<&str>) -> Option<String> {
    let text = [search, q]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())?;
    Some(format!("%{}%", escape_like(text)))
}

pub(crate) fn page_count(total: i64, limit: i64) -> i64 {
    ((total + limit - 1) / limit).max(1)
}

#[utoipa::path(
    get,
    path = "/recipes",
    tag = "recipes",
    params(ListRecipesParams),
    responses(
        (status = 200, description = "Paginated recipe list", body = ListRecipesResponse),
        (status = 500, description = "Store fault", body = ErrorResponse)
    )
)]
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(params): Query<ListRecipesParams>,
) -> impl IntoResponse {
    let page = parse_page(params.page.as_deref());
    let limit = parse_limit(params.limit.as_deref());
    let offset = (page - 1).saturating_mul(limit);
    let pattern = search_pattern(params.search.as_deref(), params.q.as_deref());

    // The page fetch and the count run concurrently on separate pooled
    // connections. Both always reflect the same filter; under concurrent
    // writes the count may not match the page instant-for-instant (a record
    // can appear in the count but not the current page, or vice versa).
    // Accepted, not corrected.
    let find_pool = state.pool.clone();
    let count_pool = state.pool.clone();
    let find_pattern = pattern.clone();
    let find_task =
        tokio::task::spawn_blocking(move || store::find(&find_pool, find_pattern, limit, offset));
    let count_task = tokio::task::spawn_blocking(move || store::count(&count_pool, pattern));
    let (find_result, count_result) = tokio::join!(find_task, count_task);

    let items = match find_result.map_err(anyhow::Error::from).and_then(|r| r) {
        Ok(items) => items,
        Err(e) => {
            tracing::error!("Failed to fetch recipes: {:#}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal Server Error".to_string(),
                }),
            )
                .into_response();
        }
    };

    let total = match count_result.map_err(anyhow::Error::from).and_then(|r| r) {
        Ok(total) => total,
        Err(e) => {
            tracing::error!("Failed to count recipes: {:#}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal Server Error".to_string(),
                }),
            )
                .into_response();
        }
    };

    let pages = page_count(total, limit);

    (
        StatusCode::OK,
        Json(ListRecipesResponse {
            items: items.into_iter().map(RecipeResponse::from).collect(),
            page,
            limit,
            total,
            pages,
            total_pages: pages,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_and_clamps() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("")), 1);
        assert_eq!(parse_page(Some("abc")), 1);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("-3")), 1);
        assert_eq!(parse_page(Some("7")), 7);
        assert_eq!(parse_page(Some(" 2 ")), 2);
    }

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(parse_limit(None), 8);
        assert_eq!(parse_limit(Some("abc")), 8);
        assert_eq!(parse_limit(Some("0")), 1);
        assert_eq!(parse_limit(Some("-1")), 1);
        assert_eq!(parse_limit(Some("50")), 50);
        assert_eq!(parse_limit(Some("51")), 50);
        assert_eq!(parse_limit(Some("8")), 8);
    }

    #[test]
    fn test_escape_like_literalizes_metacharacters() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        // '.' is not a LIKE metacharacter, so "a.b" stays a literal "a.b"
        assert_eq!(escape_like("a.b"), "a.b");
    }

    #[test]
    fn test_search_pattern_blank_means_no_filter() {
        assert_eq!(search_pattern(None, None), None);
        assert_eq!(search_pattern(Some(""), None), None);
        assert_eq!(search_pattern(Some("   "), Some("  ")), None);
    }

    #[test]
    fn test_search_pattern_prefers_search_over_alias() {
        assert_eq!(
            search_pattern(Some("tiramis"), Some("carbonara")),
            Some("%tiramis%".to_string())
        );
        assert_eq!(
            search_pattern(Some("  "), Some("carbonara")),
            Some("%carbonara%".to_string())
        );
        assert_eq!(search_pattern(None, Some("egg")), Some("%egg%".to_string()));
    }

    #[test]
    fn test_search_pattern_trims_and_escapes() {
        assert_eq!(
            search_pattern(Some("  50%_off  "), None),
            Some("%50\\%\\_off%".to_string())
        );
    }

    #[test]
    fn test_page_count_invariant() {
        assert_eq!(page_count(0, 8), 1);
        assert_eq!(page_count(1, 8), 1);
        assert_eq!(page_count(8, 8), 1);
        assert_eq!(page_count(9, 8), 2);
        assert_eq!(page_count(16, 8), 2);
        assert_eq!(page_count(17, 8), 3);
        assert_eq!(page_count(100, 50), 2);

        // pages == max(1, ceil(total/limit)) across a grid
        for total in 0i64..200 {
            for limit in 1i64..=50 {
                let expected = std::cmp::max(1, (total + limit - 1) / limit);
                assert_eq!(page_count(total, limit), expected);
            }
        }
    }
}
