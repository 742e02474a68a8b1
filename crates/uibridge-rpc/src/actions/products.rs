//! Pure-response product actions — validation and confirmation only, no
//! command is emitted. The actual record mutation lives in the external CRUD
//! layer; these handlers confirm the operation for the protocol caller.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::actions::args::{optional_object, require_f64, require_i64, require_str};
use crate::catalog::UiAction;
use crate::errors::DispatchError;

/// `add_product` — register a new product.
pub struct AddProductAction;

#[async_trait]
impl UiAction for AddProductAction {
    fn name(&self) -> &str {
        "add_product"
    }

    fn description(&self) -> &str {
        "Add a new product to the system"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Product name"},
                "price": {"type": "number", "description": "Product price in USD"},
                "quantity": {"type": "integer", "description": "Product quantity in stock"}
            },
            "required": ["name", "price", "quantity"]
        })
    }

    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String, DispatchError> {
        let name = require_str(arguments, "name")?;
        let price = require_f64(arguments, "price")?;
        let quantity = require_i64(arguments, "quantity")?;

        info!(name, price, quantity, "adding product");
        Ok(format!(
            "Product '{name}' added successfully with price ${price} and quantity {quantity}"
        ))
    }
}

/// `remove_product` — remove a product by identifier.
pub struct RemoveProductAction;

#[async_trait]
impl UiAction for RemoveProductAction {
    fn name(&self) -> &str {
        "remove_product"
    }

    fn description(&self) -> &str {
        "Remove a product from the system"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "product_id": {"type": "string", "description": "Unique identifier of the product to remove"}
            },
            "required": ["product_id"]
        })
    }

    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String, DispatchError> {
        let product_id = require_str(arguments, "product_id")?;

        info!(product_id, "removing product");
        Ok(format!("Product {product_id} removed successfully"))
    }
}

/// `search_product` — run a search with optional filters.
pub struct SearchProductAction;

#[async_trait]
impl UiAction for SearchProductAction {
    fn name(&self) -> &str {
        "search_product"
    }

    fn description(&self) -> &str {
        "Search for products with optional filters"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query string"},
                "filters": {"type": "object", "description": "Optional dictionary of search filters"}
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String, DispatchError> {
        let query = require_str(arguments, "query")?;
        let filters = optional_object(arguments, "filters")?
            .cloned()
            .unwrap_or_default();

        info!(query, ?filters, "searching products");
        let filters_json = serde_json::to_string(&filters).unwrap_or_else(|_| "{}".to_owned());
        Ok(format!(
            "Search executed successfully for query '{query}' with filters: {filters_json}"
        ))
    }
}
