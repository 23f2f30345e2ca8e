pub mod category;
pub mod customer;
pub mod favorite;
pub mod order;
pub mod order_product;
pub mod product;
pub mod product_image;
pub mod review;
pub mod shipping_address;
pub mod subscriber;

pub use category::{Entity as Category, Model as CategoryModel};
pub use customer::{Entity as Customer, Model as CustomerModel};
pub use favorite::{Entity as Favorite, Model as FavoriteModel};
pub use order::{Entity as Order, Model as OrderModel};
pub use order_product::{Entity as OrderProduct, Model as OrderProductModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_image::{Entity as ProductImage, Model as ProductImageModel};
pub use review::{Entity as Review, Model as ReviewModel};
pub use shipping_address::{Entity as ShippingAddress, Model as ShippingAddressModel};
pub use subscriber::{Entity as Subscriber, Model as SubscriberModel};
