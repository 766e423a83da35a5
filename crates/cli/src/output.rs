//! Terminal rendering and the terminal-side host collaborators.

use hotmeal_client::api::{Category, DiningArea, Dish, Order};
use hotmeal_client::{CartModel, DraftOrder, Navigator, Notice, NoticeLevel, Notifier};

/// Prints notices to stderr.
#[derive(Debug, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    #[allow(clippy::print_stderr)]
    fn notify(&self, notice: Notice) {
        let tag = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{tag}] {}", notice.message);
    }
}

/// A terminal cannot change pages; redirects become hints.
#[derive(Debug, Clone, Copy)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    #[allow(clippy::print_stderr)]
    fn navigate(&self, path: &str) {
        tracing::debug!(path, "Redirect requested");
        eprintln!("Session ended. Run `hotmeal login` to continue.");
    }
}

#[allow(clippy::print_stdout)]
pub fn dishes(dishes: &[Dish]) {
    if dishes.is_empty() {
        println!("No dishes.");
        return;
    }
    for dish in dishes {
        let availability = if dish.is_orderable() { "" } else { "  (sold out)" };
        println!(
            "{:>5}  {:<30} {:>8}  stock {:<4}{availability}",
            dish.dish_id.as_i32(),
            dish.name,
            dish.price.to_string(),
            dish.stock
        );
    }
}

#[allow(clippy::print_stdout)]
pub fn categories(categories: &[Category]) {
    for category in categories {
        println!("{:>5}  {}", category.category_id.as_i32(), category.name);
    }
}

#[allow(clippy::print_stdout)]
pub fn areas(areas: &[DiningArea]) {
    for area in areas {
        println!(
            "{:>5}  {:<20} {:<8} {}",
            area.area_id.as_i32(),
            area.area_name,
            area.area_type.as_str(),
            area.state
        );
    }
}

#[allow(clippy::print_stdout)]
pub fn cart(cart: &CartModel) {
    if cart.is_empty() {
        println!("Cart is empty.");
        return;
    }
    for line in cart.lines() {
        println!(
            "{:>5}  {:<30} {:>3} x {:>8} = {:>9}",
            line.item_id.as_i32(),
            line.name,
            line.quantity,
            line.unit_price.to_string(),
            line.subtotal().to_string()
        );
    }
    println!("{} item(s), total {}", cart.total_count(), cart.display_total());
}

#[allow(clippy::print_stdout)]
pub fn draft(draft: &DraftOrder) {
    if draft.is_empty() {
        println!("No draft order.");
        return;
    }
    for line in &draft.dish_list {
        println!("dish {:>5}  x {}", line.dish_id.as_i32(), line.quantity);
    }
    match draft.area_id {
        Some(area) => println!("area {area}"),
        None => println!("no area selected"),
    }
}

#[allow(clippy::print_stdout)]
pub fn orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders.");
        return;
    }
    for order in orders {
        let placed = order
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "#{:<6} {:<10} {:>9}  {placed}",
            order.order_id.as_i32(),
            order.state.to_string(),
            order.price.to_string()
        );
    }
}

#[allow(clippy::print_stdout)]
pub fn order(order: &Order) {
    println!("Order #{} ({})", order.order_id, order.state);
    match (order.area_id, order.area_name.as_deref()) {
        (Some(area), Some(name)) => println!("  area {area} ({name})"),
        (Some(area), None) => println!("  area {area}"),
        (None, _) => {}
    }
    for item in &order.order_items {
        println!(
            "  {:<30} {:>3} x {:>8} = {:>9}",
            item.dish_name,
            item.quantity,
            item.unit_price.to_string(),
            item.total.to_string()
        );
    }
    println!("  total {}", order.price);
    if let Some(method) = order.payment_method {
        println!("  paid by {method}");
    }
}

#[allow(clippy::print_stdout)]
pub fn line(message: &str) {
    println!("{message}");
}
