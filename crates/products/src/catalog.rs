use std::collections::HashMap;

use controltower_core::Entity;

use crate::product::{Product, ProductId};

/// Id-keyed index of known products.
#[derive(Debug, Default)]
pub struct Catalog {
    products: Vec<Product>,
    ix: HashMap<ProductId, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, product: Product) -> ProductId {
        let id = product.id();
        self.ix.insert(id, self.products.len());
        self.products.push(product);
        id
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.ix.get(&id).map(|&i| &self.products[i])
    }
}
