use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use paylink_agent_rs::tools::{
    get_orders_tool, InputSchema, ParamKind, ParamSpec, RemoteInvoker, ToolDescriptor, ToolHandler,
    ToolProvider, ToolRegistry,
};
use paylink_agent_rs::{RegistryError, ToolError};

/// Stands in for a payment provider: lists fixed tools and counts remote calls.
struct FakePayments {
    calls: Arc<AtomicUsize>,
}

impl RemoteInvoker for FakePayments {
    fn call_tool(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match name {
            "stk_push" => Ok(json!({"status": "sent", "amount": args["amount"]})),
            other => Err(ToolError::ExecutionFailed(format!("{} is down", other))),
        }
    }
}

struct FakeProvider {
    invoker: Arc<FakePayments>,
    names: Vec<&'static str>,
}

impl ToolProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake-payments"
    }

    fn list_tools(&self) -> Result<Vec<ToolDescriptor>, RegistryError> {
        let invoker: Arc<dyn RemoteInvoker> = self.invoker.clone();
        Ok(self
            .names
            .iter()
            .map(|name| {
                ToolDescriptor::new(
                    name,
                    "payment operation",
                    InputSchema::new()
                        .param(ParamSpec::new("amount", ParamKind::Number, "amount").required()),
                    ToolHandler::Remote {
                        invoker: invoker.clone(),
                        remote_name: name.to_string(),
                    },
                )
            })
            .collect())
    }
}

struct Offline;

impl ToolProvider for Offline {
    fn name(&self) -> &str {
        "offline"
    }

    fn list_tools(&self) -> Result<Vec<ToolDescriptor>, RegistryError> {
        Err(RegistryError::unavailable("offline", "missing credentials"))
    }
}

fn assembled(calls: Arc<AtomicUsize>) -> ToolRegistry {
    ToolRegistry::builder()
        .tool(get_orders_tool())
        .provider(Arc::new(FakeProvider {
            invoker: Arc::new(FakePayments { calls }),
            names: vec!["stk_push", "check_status"],
        }))
        .build()
        .expect("registry assembles")
}

#[test]
fn registry_concatenates_local_and_provider_tools() {
    let registry = assembled(Arc::new(AtomicUsize::new(0)));
    assert_eq!(registry.names(), vec!["get_orders", "stk_push", "check_status"]);

    let unique: HashSet<&str> = registry.names().into_iter().collect();
    assert_eq!(unique.len(), registry.count());
}

#[test]
fn order_lookup_scenario() {
    let registry = assembled(Arc::new(AtomicUsize::new(0)));

    let paid = registry
        .invoke("get_orders", json!({"payment_status": "PAID"}))
        .unwrap();
    assert_eq!(paid.as_array().map(|a| a.len()), Some(1));
    assert_eq!(paid[0]["name"], json!("Item 1"));

    let failed = registry
        .invoke("get_orders", json!({"payment_status": "failed"}))
        .unwrap();
    assert_eq!(failed, json!([]));

    let err = registry
        .invoke("get_orders", json!({"payment_status": "refunded"}))
        .unwrap_err();
    assert!(matches!(err, ToolError::InvalidArgument(_)));
}

#[test]
fn remote_tools_dispatch_through_provider() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = assembled(calls.clone());

    let out = registry.invoke("stk_push", json!({"amount": 250})).unwrap();
    assert_eq!(out, json!({"status": "sent", "amount": 250}));

    let err = registry.invoke("check_status", json!({"amount": 1})).unwrap_err();
    assert!(matches!(err, ToolError::ExecutionFailed(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn invalid_arguments_never_reach_remote_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = assembled(calls.clone());

    let err = registry.invoke("stk_push", json!({"amount": "lots"})).unwrap_err();
    assert!(matches!(err, ToolError::InvalidArgument(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unknown_tool_is_not_found() {
    let registry = assembled(Arc::new(AtomicUsize::new(0)));
    assert_eq!(
        registry.invoke("refund", json!({})).unwrap_err(),
        ToolError::ToolNotFound("refund".to_string())
    );
}

#[test]
fn provider_failure_leaves_no_registry() {
    let result = ToolRegistry::builder()
        .tool(get_orders_tool())
        .provider(Arc::new(Offline))
        .build();
    assert_eq!(
        result.unwrap_err(),
        RegistryError::ProviderUnavailable {
            provider: "offline".to_string(),
            reason: "missing credentials".to_string(),
        }
    );
}

#[test]
fn provider_name_clash_with_local_tool_fails() {
    let result = ToolRegistry::builder()
        .tool(get_orders_tool())
        .provider(Arc::new(FakeProvider {
            invoker: Arc::new(FakePayments {
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            names: vec!["get_orders"],
        }))
        .build();
    assert_eq!(
        result.unwrap_err(),
        RegistryError::DuplicateTool("get_orders".to_string())
    );
}
