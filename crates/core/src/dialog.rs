use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::catalog::{parse_line_item, Catalog, CatalogEntry};
use crate::domain::order::{CustomerInfo, LineItem};
use crate::domain::session::{DialogStep, Session};

/// What the state machine wants said back to the user. Rendering to wire
/// text happens in the transport crate; the machine itself stays pure.
#[derive(Clone, Debug, PartialEq)]
pub enum DialogReply {
    CatalogMenu { entries: Vec<CatalogEntry> },
    ItemAdded { name: String, quantity: u32 },
    AddMoreHint,
    EmptyCart,
    FormatHint,
    AskName,
    AskAddress,
    AskPayment,
    OrderSummary { items: Vec<LineItem>, customer: CustomerInfo, total: Decimal },
    ConfirmHint,
}

/// A side effect the surrounding service must carry out. Only one exists:
/// the CONFIRM step completing into a durable order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogEffect {
    PlaceOrder,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DialogTurn {
    pub replies: Vec<DialogReply>,
    pub effect: Option<DialogEffect>,
}

impl DialogTurn {
    fn reply(reply: DialogReply) -> Self {
        Self { replies: vec![reply], effect: None }
    }

    fn replies(replies: Vec<DialogReply>) -> Self {
        Self { replies, effect: None }
    }

    fn effect(effect: DialogEffect) -> Self {
        Self { replies: Vec::new(), effect: Some(effect) }
    }
}

/// Advances one session by one inbound message. Every message produces at
/// most one step transition; steps only ever move forward.
#[derive(Clone, Debug)]
pub struct DialogEngine {
    catalog: Catalog,
}

impl DialogEngine {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn advance(&self, session: &mut Session, text: &str, now: DateTime<Utc>) -> DialogTurn {
        session.last_activity = now;
        let text = text.trim();

        match session.step {
            DialogStep::Catalog => {
                // The opening message only triggers the menu; it is never
                // parsed as an item.
                session.step = DialogStep::Ordering;
                DialogTurn::reply(DialogReply::CatalogMenu {
                    entries: self.catalog.entries().to_vec(),
                })
            }
            DialogStep::Ordering => {
                if text.eq_ignore_ascii_case("done") {
                    if session.cart.is_empty() {
                        return DialogTurn::reply(DialogReply::EmptyCart);
                    }
                    session.step = DialogStep::GetName;
                    return DialogTurn::reply(DialogReply::AskName);
                }

                match parse_line_item(text, &self.catalog) {
                    Ok(item) => {
                        let added = DialogReply::ItemAdded {
                            name: item.name.clone(),
                            quantity: item.quantity,
                        };
                        session.cart.push(item);
                        DialogTurn::replies(vec![added, DialogReply::AddMoreHint])
                    }
                    Err(_) => DialogTurn::reply(DialogReply::FormatHint),
                }
            }
            DialogStep::GetName => {
                session.customer.name = text.to_owned();
                session.step = DialogStep::GetAddress;
                DialogTurn::reply(DialogReply::AskAddress)
            }
            DialogStep::GetAddress => {
                session.customer.address = text.to_owned();
                session.step = DialogStep::GetPayment;
                DialogTurn::reply(DialogReply::AskPayment)
            }
            DialogStep::GetPayment => {
                session.customer.payment_method = text.to_owned();
                session.step = DialogStep::Confirm;
                DialogTurn::reply(DialogReply::OrderSummary {
                    items: session.cart.clone(),
                    customer: session.customer.clone(),
                    total: cart_total(&session.cart),
                })
            }
            DialogStep::Confirm => {
                if text.eq_ignore_ascii_case("place order") {
                    DialogTurn::effect(DialogEffect::PlaceOrder)
                } else {
                    DialogTurn::reply(DialogReply::ConfirmHint)
                }
            }
        }
    }
}

fn cart_total(cart: &[LineItem]) -> Decimal {
    cart.iter().map(LineItem::line_total).sum()
}
