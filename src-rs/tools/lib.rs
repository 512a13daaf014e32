pub mod orders;
pub mod paylink;
pub mod registry;
pub mod schema;
pub mod types;

pub use orders::{get_orders, get_orders_tool, seed_orders, Order, PaymentStatus, GET_ORDERS_TOOL};
pub use paylink::{PayLinkClient, PayLinkConfig, PayLinkProvider};
pub use registry::{ToolRegistry, ToolRegistryBuilder};
pub use schema::{InputSchema, ParamKind, ParamSpec};
pub use types::{
    LocalHandler, RemoteInvoker, ToolDescriptor, ToolHandler, ToolProvider, ToolResult, ToolSchema,
};
