pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod favorites;
pub mod gateway;
pub mod reviews;
pub mod subscriptions;

pub use cart::{CartAction, CartLine, CartService, CartView};
pub use catalog::CatalogService;
pub use checkout::{CheckoutService, CustomerForm, ShippingForm};
pub use favorites::FavoritesService;
pub use gateway::{CheckoutSession, StripeGateway};
pub use reviews::ReviewsService;
pub use subscriptions::SubscriptionsService;
