//! Catalog browsing, reviews and the catalog cache.

use std::sync::Arc;

use vitrine_client::{
    ApiClient, ApiError, CatalogFilter, Credentials, MemoryTokenStore, ReviewDraft, SessionManager,
};
use vitrine_core::{CategoryId, ProductId, Rating, SortKey};
use vitrine_integration_tests::MockBackend;

fn titles(products: &[vitrine_client::Product]) -> Vec<&str> {
    products.iter().map(|p| p.title.as_str()).collect()
}

async fn signed_in(backend: &MockBackend) -> ApiClient {
    backend.add_user("Ana", "ana@x.com", "secret1");
    let session = SessionManager::new(backend.client_with_store(Arc::new(MemoryTokenStore::new())));
    let credentials = Credentials::login("ana@x.com", "secret1").expect("valid form");
    session.sign_in(&credentials).await.expect("login");
    session.client().clone()
}

#[tokio::test]
async fn test_search_and_sort_query() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let products = client
        .list_products(Some("  m "), Some(SortKey::PriceDesc))
        .await
        .expect("listing");

    assert_eq!(titles(&products), vec!["Moletom", "Camiseta"]);
    let request = backend.requests().pop().expect("one request");
    assert_eq!(request.path, "/products");
    assert_eq!(request.query.as_deref(), Some("search=m&sort=price_desc"));
}

#[tokio::test]
async fn test_blank_search_is_omitted() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let products = client.list_products(Some("   "), None).await.expect("listing");

    assert_eq!(products.len(), 3);
    let request = backend.requests().pop().expect("one request");
    assert_eq!(request.query, None);
}

#[tokio::test]
async fn test_browse_by_category() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let filter = CatalogFilter::Category {
        id: CategoryId::new("c1"),
        sort: Some(SortKey::TitleAsc),
    };

    let products = client.browse(&filter).await.expect("category listing");

    assert_eq!(titles(&products), vec!["Camiseta", "Moletom"]);
    assert!(
        products
            .iter()
            .all(|p| p.category.as_ref().map(|c| c.id().as_str()) == Some("c1"))
    );
    let request = backend.requests().pop().expect("one request");
    assert_eq!(request.path, "/products/category/c1");
    assert_eq!(request.query.as_deref(), Some("sort=title_asc"));
}

#[tokio::test]
async fn test_list_categories() {
    let backend = MockBackend::start().await;

    let categories = backend.client().list_categories().await.expect("categories");

    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Roupas", "Casa"]);
}

#[tokio::test]
async fn test_product_detail_fetches_both() {
    let backend = MockBackend::start().await;
    let client = signed_in(&backend).await;
    let p1 = ProductId::new("p1");
    let draft = ReviewDraft::new(Rating::new(5).expect("in range"), Some("Ótima".to_owned()));
    client.submit_review(&p1, &draft).await.expect("review");

    let detail = client.product_detail(&p1).await.expect("detail");

    assert_eq!(detail.product.title, "Camiseta");
    assert_eq!(detail.reviews.len(), 1);
    assert_eq!(detail.reviews[0].author_name(), "Ana");
    assert_eq!(detail.reviews[0].comment.as_deref(), Some("Ótima"));
    assert_eq!(backend.count("GET", "/products/p1"), 1);
    assert_eq!(backend.count("GET", "/reviews/p1"), 1);
}

#[tokio::test]
async fn test_out_of_range_rating_never_sent() {
    let backend = MockBackend::start().await;
    let _client = signed_in(&backend).await;
    backend.reset_requests();

    let err: ApiError = Rating::new(6).map_err(ApiError::from).expect_err("out of range");

    assert!(matches!(err, ApiError::InvalidInput(_)));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_submit_review_updates_aggregate() {
    let backend = MockBackend::start().await;
    let client = signed_in(&backend).await;
    let p2 = ProductId::new("p2");

    let draft = ReviewDraft::new(Rating::new(4).expect("in range"), None);
    let product = client.submit_review(&p2, &draft).await.expect("review");
    assert_eq!(product.rating.total, 1);
    assert!((product.rating.avg - 4.0).abs() < f64::EPSILON);

    // Reviewing again replaces the user's review.
    let draft = ReviewDraft::new(Rating::new(2).expect("in range"), Some("  ".to_owned()));
    let product = client.submit_review(&p2, &draft).await.expect("second review");
    assert_eq!(product.rating.total, 1);
    assert!((product.rating.avg - 2.0).abs() < f64::EPSILON);

    client.delete_review(&p2).await.expect("delete");
    assert!(client.list_reviews(&p2).await.expect("reviews").is_empty());
}

#[tokio::test]
async fn test_review_requires_login() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let draft = ReviewDraft::new(Rating::new(3).expect("in range"), None);
    let err = client
        .submit_review(&ProductId::new("p1"), &draft)
        .await
        .expect_err("anonymous review");

    assert!(matches!(err, ApiError::Unauthorized(_)));
}

#[tokio::test]
async fn test_cache_serves_repeat_reads_until_review() {
    let backend = MockBackend::start().await;
    backend.add_user("Ana", "ana@x.com", "secret1");
    let client = ApiClient::with_store(
        &vitrine_client::ClientConfig::new(&backend.url()).expect("valid url"),
        Arc::new(MemoryTokenStore::with_session(
            backend.issue_tokens("ana@x.com"),
            None,
        )),
    )
    .expect("client builds");
    let p1 = ProductId::new("p1");

    client.get_product(&p1).await.expect("first read");
    client.get_product(&p1).await.expect("cached read");
    client.list_categories().await.expect("first read");
    client.list_categories().await.expect("cached read");
    assert_eq!(backend.count("GET", "/products/p1"), 1);
    assert_eq!(backend.count("GET", "/categories"), 1);

    let draft = ReviewDraft::new(Rating::new(5).expect("in range"), None);
    client.submit_review(&p1, &draft).await.expect("review");
    let product = client.get_product(&p1).await.expect("fresh read");

    assert_eq!(backend.count("GET", "/products/p1"), 2);
    assert_eq!(product.rating.total, 1);

    client.invalidate_catalog().await;
    client.list_categories().await.expect("after invalidation");
    assert_eq!(backend.count("GET", "/categories"), 2);
}
