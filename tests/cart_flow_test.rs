mod common;

use axum::http::{Method, StatusCode};
use common::{assert_redirect, read_json, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use shop_api::entities::{order, Customer, Order, OrderProduct};
use shop_api::services::CartAction;

const LOGIN_REDIRECT: &str = "/login/?flash=Please+sign+in+or+register+to+make+purchases";

#[tokio::test]
async fn anonymous_purchase_routes_redirect_to_login() {
    let app = TestApp::spawn().await;

    let response = app
        .request(Method::POST, "/to_cart/1/add", None, None)
        .await;
    assert_redirect(&response, LOGIN_REDIRECT);

    let response = app.request(Method::GET, "/cart/", None, None).await;
    assert_redirect(&response, LOGIN_REDIRECT);

    let response = app.request(Method::GET, "/checkout/", None, None).await;
    assert_redirect(&response, LOGIN_REDIRECT);
}

#[tokio::test]
async fn adding_a_product_creates_then_merges_the_line() {
    let app = TestApp::spawn().await;
    let cat = app.seed_category("Shoes", "shoes").await;
    let product = app.seed_product("Sneaker", "sneaker", dec!(25.00), cat).await;

    let uri = format!("/to_cart/{}/add", product);
    let response = app.request(Method::POST, &uri, Some(1), None).await;
    assert_redirect(&response, "/cart/");
    app.request(Method::POST, &uri, Some(1), None).await;

    let response = app.request(Method::GET, "/cart/", Some(1), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let cart = &body["data"];

    assert_eq!(cart["lines"].as_array().unwrap().len(), 1);
    assert_eq!(cart["lines"][0]["line"]["quantity"], 2);
    assert_eq!(cart["total_quantity"], 2);
    let total: f64 = cart["total_price"].as_str().unwrap().parse().unwrap();
    assert_eq!(total, 50.0);

    // Merged, not duplicated.
    let line_count = OrderProduct::find().count(app.db.as_ref()).await.unwrap();
    assert_eq!(line_count, 1);
}

#[tokio::test]
async fn reduce_at_one_and_delete_remove_the_line() {
    let app = TestApp::spawn().await;
    let cat = app.seed_category("Shoes", "shoes").await;
    let product = app.seed_product("Boot", "boot", dec!(80.00), cat).await;

    app.request(Method::POST, &format!("/to_cart/{}/add", product), Some(1), None)
        .await;
    app.request(
        Method::POST,
        &format!("/to_cart/{}/reduce", product),
        Some(1),
        None,
    )
    .await;

    let body = read_json(app.request(Method::GET, "/cart/", Some(1), None).await).await;
    assert!(body["data"]["lines"].as_array().unwrap().is_empty());

    // Delete removes the whole line regardless of quantity.
    for _ in 0..3 {
        app.request(Method::POST, &format!("/to_cart/{}/add", product), Some(1), None)
            .await;
    }
    app.request(
        Method::POST,
        &format!("/to_cart/{}/delete", product),
        Some(1),
        None,
    )
    .await;

    let body = read_json(app.request(Method::GET, "/cart/", Some(1), None).await).await;
    assert!(body["data"]["lines"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["total_quantity"], 0);
}

#[tokio::test]
async fn reducing_a_missing_line_is_a_noop() {
    let app = TestApp::spawn().await;
    let cat = app.seed_category("Shoes", "shoes").await;
    let product = app.seed_product("Loafer", "loafer", dec!(60.00), cat).await;

    let response = app
        .request(
            Method::POST,
            &format!("/to_cart/{}/reduce", product),
            Some(1),
            None,
        )
        .await;
    assert_redirect(&response, "/cart/");

    let line_count = OrderProduct::find().count(app.db.as_ref()).await.unwrap();
    assert_eq!(line_count, 0);
}

#[tokio::test]
async fn unknown_product_returns_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .request(Method::POST, "/to_cart/999/add", Some(1), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_first_touch_yields_a_single_open_order() {
    let app = TestApp::spawn().await;

    let (a, b) = tokio::join!(app.services.cart.resolve(7), app.services.cart.resolve(7));
    let (customer_a, order_a) = a.unwrap();
    let (customer_b, order_b) = b.unwrap();

    assert_eq!(customer_a.id, customer_b.id);
    assert_eq!(order_a.id, order_b.id);

    let customers = Customer::find().count(app.db.as_ref()).await.unwrap();
    let orders = Order::find().count(app.db.as_ref()).await.unwrap();
    assert_eq!(customers, 1);
    assert_eq!(orders, 1);
}

#[tokio::test]
async fn concurrent_adds_on_one_line_both_count() {
    let app = TestApp::spawn().await;
    let cat = app.seed_category("Shoes", "shoes").await;
    let product = app.seed_product("Clog", "clog", dec!(15.00), cat).await;

    app.services
        .cart
        .apply(1, product, CartAction::Add)
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        app.services.cart.apply(1, product, CartAction::Add),
        app.services.cart.apply(1, product, CartAction::Add)
    );
    a.unwrap();
    b.unwrap();

    let body = read_json(app.request(Method::GET, "/cart/", Some(1), None).await).await;
    assert_eq!(body["data"]["lines"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["lines"][0]["line"]["quantity"], 3);
}

#[tokio::test]
async fn concurrent_first_adds_merge_into_one_line() {
    let app = TestApp::spawn().await;
    let cat = app.seed_category("Shoes", "shoes").await;
    let product = app.seed_product("Slide", "slide", dec!(12.00), cat).await;

    let (a, b) = tokio::join!(
        app.services.cart.apply(2, product, CartAction::Add),
        app.services.cart.apply(2, product, CartAction::Add)
    );
    a.unwrap();
    b.unwrap();

    let line_count = OrderProduct::find().count(app.db.as_ref()).await.unwrap();
    assert_eq!(line_count, 1);

    let body = read_json(app.request(Method::GET, "/cart/", Some(2), None).await).await;
    assert_eq!(body["data"]["total_quantity"], 2);
}

#[tokio::test]
async fn viewing_the_cart_creates_nothing() {
    let app = TestApp::spawn().await;

    let response = app.request(Method::GET, "/cart/", Some(3), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(body["data"]["order"].is_null());
    assert!(body["data"]["lines"].as_array().unwrap().is_empty());

    assert_eq!(Customer::find().count(app.db.as_ref()).await.unwrap(), 0);
    assert_eq!(Order::find().count(app.db.as_ref()).await.unwrap(), 0);
}

#[tokio::test]
async fn clearing_the_open_order_completes_it_and_is_idempotent() {
    let app = TestApp::spawn().await;
    let cat = app.seed_category("Shoes", "shoes").await;
    let product = app.seed_product("Heel", "heel", dec!(45.00), cat).await;

    app.request(Method::POST, &format!("/to_cart/{}/add", product), Some(1), None)
        .await;
    let (_, open) = app.services.cart.resolve(1).await.unwrap();

    app.services.cart.clear_open_order(1).await.unwrap();
    app.services.cart.clear_open_order(1).await.unwrap();

    let completed = Order::find_by_id(open.id)
        .one(app.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert!(completed.is_completed);
    assert_eq!(
        OrderProduct::find().count(app.db.as_ref()).await.unwrap(),
        0
    );

    // A second clear while completed must not reopen or duplicate.
    let open_orders = Order::find()
        .filter(order::Column::IsCompleted.eq(false))
        .count(app.db.as_ref())
        .await
        .unwrap();
    assert_eq!(open_orders, 0);
}

#[tokio::test]
async fn next_cart_touch_after_completion_opens_a_fresh_order() {
    let app = TestApp::spawn().await;
    let cat = app.seed_category("Shoes", "shoes").await;
    let product = app.seed_product("Flat", "flat", dec!(30.00), cat).await;

    app.request(Method::POST, &format!("/to_cart/{}/add", product), Some(1), None)
        .await;
    let (_, first) = app.services.cart.resolve(1).await.unwrap();
    app.services.cart.clear_open_order(1).await.unwrap();

    let (_, second) = app.services.cart.resolve(1).await.unwrap();
    assert_ne!(first.id, second.id);
    assert!(!second.is_completed);

    let body = read_json(app.request(Method::GET, "/cart/", Some(1), None).await).await;
    assert!(body["data"]["lines"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn carts_are_isolated_per_user() {
    let app = TestApp::spawn().await;
    let cat = app.seed_category("Shoes", "shoes").await;
    let product = app.seed_product("Mule", "mule", dec!(20.00), cat).await;

    app.request(Method::POST, &format!("/to_cart/{}/add", product), Some(1), None)
        .await;
    app.request(Method::POST, &format!("/to_cart/{}/add", product), Some(2), None)
        .await;
    app.request(Method::POST, &format!("/to_cart/{}/add", product), Some(2), None)
        .await;

    let body = read_json(app.request(Method::GET, "/cart/", Some(1), None).await).await;
    assert_eq!(body["data"]["total_quantity"], 1);

    let body = read_json(app.request(Method::GET, "/cart/", Some(2), None).await).await;
    assert_eq!(body["data"]["total_quantity"], 2);
}
