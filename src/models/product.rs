use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalogue product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub group: String,
}

/// Image file registered against a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: Option<u64>,
    pub product_id: u64,
    pub path: String,
}

/// HAL style representation of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductResource {
    pub id: Option<u64>,
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub group: String,
    #[serde(rename = "_links")]
    pub links: ResourceLinks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLinks {
    #[serde(rename = "self")]
    pub self_link: Link,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

impl Product {
    /// Copy the editable fields from an update payload.
    ///
    /// `group` is left untouched.
    pub fn apply_update(&mut self, update: Product) {
        self.name = update.name;
        self.price = update.price;
        self.description = update.description;
    }

    /// Shape the product as a resource carrying a `self` link
    pub fn to_resource(&self, base_url: &str) -> ProductResource {
        let id = self
            .id
            .map(|id| id.to_string())
            .unwrap_or_default();

        ProductResource {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
            description: self.description.clone(),
            group: self.group.clone(),
            links: ResourceLinks {
                self_link: Link {
                    href: format!("{}/product/{}", base_url.trim_end_matches('/'), id),
                },
            },
        }
    }
}

impl ProductImage {
    pub fn new(product_id: u64, path: String) -> Self {
        Self {
            id: None,
            product_id,
            path,
        }
    }

    /// Directory holding a product's images, relative to the storage root
    pub fn directory(product_id: u64) -> String {
        format!("product-images/{}", product_id)
    }

    /// Location of this image relative to the storage root
    pub fn storage_path(&self) -> String {
        format!("{}/{}", Self::directory(self.product_id), self.path)
    }
}
