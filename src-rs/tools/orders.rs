use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::{InputSchema, ParamKind, ParamSpec};
use super::types::{ToolDescriptor, ToolHandler};
use crate::error::ToolError;

pub const GET_ORDERS_TOOL: &str = "get_orders";

const GET_ORDERS_DESCRIPTION: &str = "\
Returns orders from the database.

Args:
- payment_status: The payment status of the orders. Can be \"paid\", \"pending\", or \"failed\". \
If not provided, all orders are returned.

Returns:
- A list of orders with the following fields:
    - name: The name of the order
    - price: The price of the order
    - currency: The currency code of the price
    - quantity: The quantity of the order
    - payment_status: The payment status of the order";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Failed,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [PaymentStatus::Paid, PaymentStatus::Pending, PaymentStatus::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ToolError;

    /// Case is ignored; surrounding whitespace is not stripped.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw))
            .ok_or_else(|| {
                ToolError::InvalidArgument(format!(
                    "unknown payment_status '{}', expected one of paid, pending, failed",
                    raw
                ))
            })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub name: String,
    /// Whole currency units.
    pub price: u64,
    pub currency: String,
    pub quantity: u32,
    pub payment_status: PaymentStatus,
}

impl Order {
    fn new(name: &str, price: u64, currency: &str, quantity: u32, payment_status: PaymentStatus) -> Self {
        Self {
            name: name.to_string(),
            price,
            currency: currency.to_string(),
            quantity,
            payment_status,
        }
    }
}

pub fn seed_orders() -> Vec<Order> {
    vec![
        Order::new("Item 1", 100, "Ksh", 1, PaymentStatus::Paid),
        Order::new("Item 2", 200, "Ksh", 2, PaymentStatus::Pending),
    ]
}

/// Filters `orders` by status, keeping their original order.
pub fn filter_orders(orders: &[Order], status: Option<PaymentStatus>) -> Vec<Order> {
    orders
        .iter()
        .filter(|order| status.map_or(true, |wanted| order.payment_status == wanted))
        .cloned()
        .collect()
}

/// Looks up the seed orders. `payment_status` is matched case-insensitively.
pub fn get_orders(payment_status: Option<&str>) -> Result<Vec<Order>, ToolError> {
    let status = payment_status.map(PaymentStatus::from_str).transpose()?;
    Ok(filter_orders(&seed_orders(), status))
}

pub fn get_orders_tool() -> ToolDescriptor {
    let statuses: Vec<&str> = PaymentStatus::ALL.iter().map(|s| s.as_str()).collect();
    let schema = InputSchema::new().param(
        ParamSpec::new(
            "payment_status",
            ParamKind::String,
            "Only return orders with this payment status.",
        )
        .one_of(&statuses, true),
    );

    ToolDescriptor::new(
        GET_ORDERS_TOOL,
        GET_ORDERS_DESCRIPTION,
        schema,
        ToolHandler::local(handle_get_orders),
    )
}

fn handle_get_orders(args: Value) -> Result<Value, ToolError> {
    let filter = match args.get("payment_status") {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => Some(raw.as_str()),
        Some(other) => {
            return Err(ToolError::InvalidArgument(format!(
                "payment_status must be a string, got {}",
                other
            )))
        }
    };
    let orders = get_orders(filter)?;
    serde_json::to_value(orders).map_err(|err| ToolError::ExecutionFailed(err.to_string()))
}
