use crate::entities::{
    category, product, Category, CategoryModel, Product, ProductImage, ProductImageModel,
    ProductModel, Review, ReviewModel,
};
use crate::errors::ServiceError;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;

/// A category with the products listed under it and its direct
/// subcategories (for top-level categories).
#[derive(Debug, Clone, serde::Serialize)]
pub struct CategoryPage {
    pub category: CategoryModel,
    pub subcategories: Vec<CategoryModel>,
    pub products: Vec<ProductModel>,
}

/// A product detail page: the product plus its gallery and reviews.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProductPage {
    pub product: ProductModel,
    pub images: Vec<ProductImageModel>,
    pub reviews: Vec<ReviewModel>,
}

#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Top-level categories for the storefront navigation.
    #[instrument(skip(self))]
    pub async fn list_root_categories(&self) -> Result<Vec<CategoryModel>, ServiceError> {
        Ok(Category::find()
            .filter(category::Column::ParentId.is_null())
            .order_by_asc(category::Column::Title)
            .all(self.db.as_ref())
            .await?)
    }

    /// A category page. Products under a top-level category are those
    /// of all its subcategories; a subcategory lists its own. The
    /// optional sort key is one of `price`, `color`, `size`, each with
    /// a `-` prefix for descending order; anything else falls back to
    /// newest-first.
    #[instrument(skip(self))]
    pub async fn category_page(
        &self,
        slug: &str,
        sort: Option<&str>,
    ) -> Result<CategoryPage, ServiceError> {
        let cat = Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category '{}' not found", slug)))?;

        let subcategories = Category::find()
            .filter(category::Column::ParentId.eq(cat.id))
            .order_by_asc(category::Column::Title)
            .all(self.db.as_ref())
            .await?;

        let category_ids: Vec<i64> = if subcategories.is_empty() {
            vec![cat.id]
        } else {
            subcategories.iter().map(|c| c.id).collect()
        };

        let mut query = Product::find().filter(product::Column::CategoryId.is_in(category_ids));
        query = match sort {
            Some("price") => query.order_by_asc(product::Column::Price),
            Some("-price") => query.order_by_desc(product::Column::Price),
            Some("color") => query.order_by_asc(product::Column::Color),
            Some("-color") => query.order_by_desc(product::Column::Color),
            Some("size") => query.order_by_asc(product::Column::Size),
            Some("-size") => query.order_by_desc(product::Column::Size),
            _ => query.order_by_desc(product::Column::CreatedAt),
        };
        let products = query.all(self.db.as_ref()).await?;

        Ok(CategoryPage {
            category: cat,
            subcategories,
            products,
        })
    }

    /// A product detail page. Each view bumps the product's watch
    /// counter.
    #[instrument(skip(self))]
    pub async fn product_page(&self, slug: &str) -> Result<ProductPage, ServiceError> {
        let found = Product::find()
            .filter(product::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product '{}' not found", slug)))?;

        let watched = found.watched + 1;
        let mut active: product::ActiveModel = found.into();
        active.watched = Set(watched);
        let product = active.update(self.db.as_ref()).await?;

        let images = product
            .find_related(ProductImage)
            .all(self.db.as_ref())
            .await?;

        let reviews = product
            .find_related(Review)
            .order_by_desc(crate::entities::review::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        Ok(ProductPage {
            product,
            images,
            reviews,
        })
    }
}
