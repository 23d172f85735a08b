//! Database entities for the POS domain.

pub mod legacy_stock;
pub mod product;
pub mod product_flavor;
pub mod sale;
pub mod sale_item;
pub mod setting;

pub use legacy_stock::Entity as LegacyStock;
pub use product::Entity as Product;
pub use product_flavor::Entity as ProductFlavor;
pub use sale::Entity as Sale;
pub use sale_item::Entity as SaleItem;
pub use setting::Entity as Setting;
