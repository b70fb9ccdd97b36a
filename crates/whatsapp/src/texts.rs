//! Every user-facing message string, rendered from dialog replies and
//! broker outcomes. Keeping the copy in one module means the state machine
//! stays pure and the wording can change without touching any flow logic.

use rust_decimal::Decimal;

use dhobi_core::catalog::CatalogEntry;
use dhobi_core::dialog::DialogReply;
use dhobi_core::domain::order::{CustomerInfo, LineItem, Order};

pub fn render_reply(reply: &DialogReply) -> String {
    match reply {
        DialogReply::CatalogMenu { entries } => catalog_menu(entries),
        DialogReply::ItemAdded { name, quantity } => format!("✅ Added: {name} x {quantity}"),
        DialogReply::AddMoreHint => "🛒 Add more or type \"done\"".to_string(),
        DialogReply::EmptyCart => "🛒 Cart is empty!".to_string(),
        DialogReply::FormatHint => "⚠ Format: \"Shirt x 2\"".to_string(),
        DialogReply::AskName => "👤 Enter your full name:".to_string(),
        DialogReply::AskAddress => "📍 Enter delivery address:".to_string(),
        DialogReply::AskPayment => "💳 Payment method: Cash / UPI / Card".to_string(),
        DialogReply::OrderSummary { items, customer, total } => {
            order_summary(items, customer, *total)
        }
        DialogReply::ConfirmHint => "❓ Type \"Place Order\" to confirm.".to_string(),
    }
}

pub fn catalog_menu(entries: &[CatalogEntry]) -> String {
    let lines = entries
        .iter()
        .map(|entry| format!("• {} – ₹{}", entry.name, entry.unit_price))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "🧺 Laundry Menu:\n\n{lines}\n\nReply like: \"Shirt x 2\"\nType \"done\" when finished."
    )
}

pub fn order_summary(items: &[LineItem], customer: &CustomerInfo, total: Decimal) -> String {
    let lines = items
        .iter()
        .map(|item| format!("• {} x {} = ₹{}", item.name, item.quantity, item.line_total()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "🧾 Order Summary:\n{lines}\n————————————\n👤 Name: {}\n🏠 Address: {}\n💳 Payment: {}\n💰 Total: ₹{total}\n\n✅ Type \"Place Order\" to confirm.",
        customer.name, customer.address, customer.payment_method
    )
}

pub fn order_placed(order_id: &str) -> String {
    format!("🎉 Order {order_id} placed! Finding vendor...")
}

pub fn order_already_placed() -> String {
    "✅ Order already placed. Please wait.".to_string()
}

pub fn access_restricted() -> String {
    "⚠ Access restricted to verified users.".to_string()
}

pub fn vendor_broadcast(order: &Order) -> String {
    let items = order
        .line_items
        .iter()
        .map(|item| format!("- {} x {} = ₹{}", item.name, item.quantity, item.line_total()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "📢 New Order\n🆔 Order ID: {}\n📞 Customer: {}\n👤 Name: {}\n🏠 Address: {}\n💳 Payment: {}\n\n🧺 Items:\n{items}\n💰 Total: ₹{}\n\nReply: ACCEPT {}",
        order.order_id,
        order.customer_id,
        order.customer.name,
        order.customer.address,
        order.customer.payment_method,
        order.total(),
        order.order_id
    )
}

pub fn claim_accepted(order_id: &str) -> String {
    format!("✅ You accepted order {order_id}. Proceed with pickup.")
}

pub fn claim_already_assigned() -> String {
    "🚫 This order is already assigned.".to_string()
}

pub fn claim_not_found(code: &str) -> String {
    format!("❌ No order found matching \"{code}\".")
}

pub fn customer_assigned(order_id: &str, vendor_id: &str) -> String {
    format!("📦 Order {order_id} is now being handled by 📞 {vendor_id}.")
}
