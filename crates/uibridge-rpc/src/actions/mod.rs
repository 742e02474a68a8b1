//! The nine built-in UI actions.
//!
//! Three groups:
//! - `products` — pure-response catalog-record operations
//! - `interaction` — element clicks, form filling, tab swipes
//! - `display` — UI updates, notifications, navigation
//!
//! Command-emitting actions (`click_element`, `update_ui`,
//! `show_notification`, `navigate_to`) hand their command to the
//! [`CommandSink`]; the rest return a confirmation string only.

pub mod args;
pub mod display;
pub mod interaction;
pub mod products;

use std::sync::Arc;

use crate::catalog::{ActionCatalog, CommandSink};

/// Register all built-in actions in their advertised order.
pub fn register_all(catalog: &mut ActionCatalog, sink: Arc<dyn CommandSink>) {
    catalog.register(Arc::new(products::AddProductAction));
    catalog.register(Arc::new(products::RemoveProductAction));
    catalog.register(Arc::new(products::SearchProductAction));
    catalog.register(Arc::new(interaction::ClickElementAction::new(sink.clone())));
    catalog.register(Arc::new(interaction::FillFormAction));
    catalog.register(Arc::new(interaction::SwipeTabAction));
    catalog.register(Arc::new(display::UpdateUiAction::new(sink.clone())));
    catalog.register(Arc::new(display::ShowNotificationAction::new(sink.clone())));
    catalog.register(Arc::new(display::NavigateToAction::new(sink)));
}
