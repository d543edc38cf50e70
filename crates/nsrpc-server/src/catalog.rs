//! Handler catalog
//!
//! Maps handler type names to factories. The namespace map in
//! [`crate::ServerConfig`] refers to these names; a namespace whose type name
//! is missing here violates the handler contract at call time.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::handler::{
    Args, HandlerContext, HandlerError, HandlerResult, HandlerType, MethodFn, MethodSignature,
    NamespaceHandler,
};

/// Creates handler instances of one concrete type
pub trait HandlerFactory: Send + Sync {
    fn type_name(&self) -> &str;

    fn signatures(&self) -> Vec<MethodSignature>;

    fn create(&self, context: HandlerContext) -> Box<dyn NamespaceHandler>;
}

struct TypedFactory<H: HandlerType> {
    type_name: String,
    signatures: Vec<MethodSignature>,
    table: Arc<HashMap<String, MethodFn<H>>>,
}

impl<H: HandlerType> TypedFactory<H> {
    fn new(type_name: String) -> Self {
        let mut signatures = Vec::new();
        let mut table = HashMap::new();
        for method in H::methods() {
            let (signature, call) = method.into_parts();
            table.insert(signature.name.clone(), call);
            signatures.push(signature);
        }
        Self {
            type_name,
            signatures,
            table: Arc::new(table),
        }
    }
}

impl<H: HandlerType> HandlerFactory for TypedFactory<H> {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn signatures(&self) -> Vec<MethodSignature> {
        self.signatures.clone()
    }

    fn create(&self, context: HandlerContext) -> Box<dyn NamespaceHandler> {
        Box::new(Instance {
            handler: H::create(context),
            table: Arc::clone(&self.table),
        })
    }
}

/// A live handler together with its method table
struct Instance<H: HandlerType> {
    handler: H,
    table: Arc<HashMap<String, MethodFn<H>>>,
}

#[async_trait]
impl<H: HandlerType> NamespaceHandler for Instance<H> {
    fn namespace(&self) -> &str {
        self.handler.context().namespace()
    }

    fn has_method(&self, method: &str) -> bool {
        self.table.contains_key(method)
    }

    fn cache_ttl(&self) -> u32 {
        self.handler.context().cache_ttl()
    }

    async fn invoke(&mut self, method: &str, args: Args) -> HandlerResult<Value> {
        let call = *self
            .table
            .get(method)
            .ok_or_else(|| HandlerError::MethodNotFound(method.to_string()))?;
        call(&mut self.handler, args).await
    }
}

/// Registered handler types by name
#[derive(Default, Clone)]
pub struct HandlerCatalog {
    factories: HashMap<String, Arc<dyn HandlerFactory>>,
}

impl HandlerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `H` under `type_name`, replacing any earlier registration.
    /// Returns `true` when the name was already taken.
    pub fn register<H: HandlerType>(&mut self, type_name: impl Into<String>) -> bool {
        let type_name = type_name.into();
        let factory: Arc<dyn HandlerFactory> = Arc::new(TypedFactory::<H>::new(type_name.clone()));
        self.factories.insert(type_name, factory).is_some()
    }

    pub fn get(&self, type_name: &str) -> Option<&Arc<dyn HandlerFactory>> {
        self.factories.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for HandlerCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("HandlerCatalog").field("types", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Method, MethodFuture};
    use crate::registry::SchemaRegistry;
    use crate::schema::ParamType;
    use serde_json::json;

    struct Counter {
        context: HandlerContext,
        calls: u32,
    }

    impl Counter {
        fn bump(&mut self, args: Args) -> MethodFuture<'_> {
            Box::pin(async move {
                let step: i64 = args.get(0)?;
                self.calls += 1;
                self.context.enable_cache(30);
                Ok(json!({"step": step, "calls": self.calls}))
            })
        }
    }

    impl HandlerType for Counter {
        fn create(context: HandlerContext) -> Self {
            Self { context, calls: 0 }
        }

        fn context(&self) -> &HandlerContext {
            &self.context
        }

        fn methods() -> Vec<Method<Self>> {
            vec![Method::new("bump", Self::bump).param("step", ParamType::Integer)]
        }
    }

    fn context() -> HandlerContext {
        HandlerContext::new("counter", Arc::new(SchemaRegistry::new("http://localhost/")))
    }

    #[tokio::test]
    async fn test_factory_creates_working_instances() {
        let mut catalog = HandlerCatalog::new();
        assert!(!catalog.register::<Counter>("counter"));

        let factory = catalog.get("counter").unwrap();
        assert_eq!(factory.type_name(), "counter");
        assert_eq!(factory.signatures().len(), 1);
        assert_eq!(factory.signatures()[0].name, "bump");

        let mut handler = factory.create(context());
        assert!(handler.has_method("bump"));
        assert!(!handler.has_method("reset"));
        assert_eq!(handler.cache_ttl(), 0);

        let result = handler.invoke("bump", Args::new(vec![json!(3)])).await.unwrap();
        assert_eq!(result, json!({"step": 3, "calls": 1}));
        assert_eq!(handler.cache_ttl(), 30);
        assert_eq!(handler.namespace(), "counter");
    }

    #[tokio::test]
    async fn test_instances_do_not_share_state() {
        let mut catalog = HandlerCatalog::new();
        catalog.register::<Counter>("counter");
        let factory = catalog.get("counter").unwrap();

        let mut first = factory.create(context());
        first.invoke("bump", Args::new(vec![json!(1)])).await.unwrap();

        let mut second = factory.create(context());
        let result = second.invoke("bump", Args::new(vec![json!(1)])).await.unwrap();
        assert_eq!(result["calls"], json!(1));
        assert_eq!(second.cache_ttl(), 30);
    }

    #[tokio::test]
    async fn test_unknown_method_on_instance() {
        let mut catalog = HandlerCatalog::new();
        catalog.register::<Counter>("counter");
        let mut handler = catalog.get("counter").unwrap().create(context());

        let err = handler.invoke("reset", Args::default()).await.unwrap_err();
        assert_eq!(err, HandlerError::MethodNotFound("reset".into()));
    }

    #[test]
    fn test_duplicate_registration_is_reported() {
        let mut catalog = HandlerCatalog::new();
        assert!(!catalog.register::<Counter>("counter"));
        assert!(catalog.register::<Counter>("counter"));
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("counter"));
    }
}
