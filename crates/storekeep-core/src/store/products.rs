use std::collections::BTreeMap;

use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::model::{NewProduct, PageRequest, Product, ProductPage, ProductUpdate};

#[derive(Debug, Default)]
struct ProductTable {
    next_id: i64,
    rows: BTreeMap<i64, Product>,
}

/// Products keyed by id. Ids only grow, so id order is creation order.
#[derive(Debug, Default)]
pub struct ProductStore {
    table: RwLock<ProductTable>,
}

impl ProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, new: NewProduct) -> CoreResult<Product> {
        new.validate()?;

        let mut table = self.table.write();
        table.next_id += 1;
        let now = Utc::now();
        let product = Product {
            id: table.next_id,
            name: new.name,
            description: new.description,
            price: new.price,
            stock: new.stock,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(product.id, product.clone());
        Ok(product)
    }

    pub fn get(&self, id: i64) -> CoreResult<Product> {
        self.table
            .read()
            .rows
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound("product"))
    }

    /// Newest first.
    pub fn list(&self, page: PageRequest) -> ProductPage {
        let table = self.table.read();
        let products = table
            .rows
            .values()
            .rev()
            .skip(page.offset())
            .take(page.limit())
            .cloned()
            .collect();

        ProductPage {
            products,
            total: table.rows.len(),
            page: page.page(),
            limit: page.limit(),
        }
    }

    /// Applies the present fields of `update` and bumps `updated_at`. An
    /// empty update returns the product untouched.
    pub fn update(&self, id: i64, update: &ProductUpdate) -> CoreResult<Product> {
        update.validate()?;

        let mut table = self.table.write();
        let product = table
            .rows
            .get_mut(&id)
            .ok_or(CoreError::NotFound("product"))?;
        if update.apply_to(product) {
            product.updated_at = Utc::now();
        }
        Ok(product.clone())
    }

    pub fn delete(&self, id: i64) -> CoreResult<()> {
        self.table
            .write()
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(CoreError::NotFound("product"))
    }

    pub fn len(&self) -> usize {
        self.table.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
