//! Test Helpers Module for Integration Tests
//!
//! Handler types and pipeline constructors shared across the integration
//! test binaries.

#![allow(dead_code)]

use std::time::Duration;

use nsrpc_server::prelude::*;
use serde_json::{Value, json};

/// Handler exercising every outcome the pipeline must map
pub struct TestHandler {
    context: HandlerContext,
}

impl TestHandler {
    fn subtract(&mut self, args: Args) -> MethodFuture<'_> {
        Box::pin(async move {
            let (minuend, subtrahend): (i64, i64) = args.into_tuple()?;
            Ok(json!(minuend - subtrahend))
        })
    }

    fn sum(&mut self, args: Args) -> MethodFuture<'_> {
        Box::pin(async move {
            let (a, b, c): (i64, i64, i64) = args.into_tuple()?;
            Ok(json!(a + b + c))
        })
    }

    fn update(&mut self, _args: Args) -> MethodFuture<'_> {
        Box::pin(async move { Ok(Value::Null) })
    }

    fn notify_hello(&mut self, args: Args) -> MethodFuture<'_> {
        Box::pin(async move {
            let value: i64 = args.get(0)?;
            Ok(json!(value))
        })
    }

    fn get_data(&mut self, _args: Args) -> MethodFuture<'_> {
        Box::pin(async move { to_result(&("hello", 5)) })
    }

    fn invalid_utf(&mut self, _args: Args) -> MethodFuture<'_> {
        Box::pin(async move {
            Err(HandlerError::Encoding(
                "Malformed UTF-8 characters, possibly incorrectly encoded".into(),
            ))
        })
    }

    fn cached(&mut self, args: Args) -> MethodFuture<'_> {
        Box::pin(async move {
            let ttl: u32 = args.get(0)?;
            self.context.enable_cache(ttl);
            Ok(json!(ttl))
        })
    }

    fn uncached(&mut self, _args: Args) -> MethodFuture<'_> {
        Box::pin(async move {
            self.context.enable_default_cache();
            self.context.disable_cache();
            Ok(Value::Null)
        })
    }

    fn delayed(&mut self, args: Args) -> MethodFuture<'_> {
        Box::pin(async move {
            let (millis, tag): (u64, String) = args.into_tuple()?;
            tokio::time::sleep(Duration::from_millis(millis)).await;
            Ok(json!(tag))
        })
    }

    fn fail(&mut self, args: Args) -> MethodFuture<'_> {
        Box::pin(async move {
            let code: i64 = args.get(0)?;
            Err(HandlerError::server(code, "requested failure"))
        })
    }

    fn explode(&mut self, args: Args) -> MethodFuture<'_> {
        Box::pin(async move {
            if args.is_empty() {
                panic!("handler exploded");
            }
            Ok(Value::Null)
        })
    }

    fn namespace(&mut self, _args: Args) -> MethodFuture<'_> {
        Box::pin(async move { Ok(json!(self.context.namespace())) })
    }
}

impl HandlerType for TestHandler {
    fn create(context: HandlerContext) -> Self {
        Self { context }
    }

    fn context(&self) -> &HandlerContext {
        &self.context
    }

    fn methods() -> Vec<Method<Self>> {
        vec![
            Method::new("subtract", Self::subtract)
                .param("minuend", ParamType::Integer)
                .param("subtrahend", ParamType::Integer),
            Method::new("sum", Self::sum)
                .param("numberA", ParamType::Integer)
                .param("numberB", ParamType::Integer)
                .param("numberC", ParamType::Integer),
            Method::new("update", Self::update)
                .param("a", ParamType::Integer)
                .param("b", ParamType::Integer)
                .param("c", ParamType::Integer)
                .param("d", ParamType::Integer)
                .param("e", ParamType::Integer),
            Method::new("notify_hello", Self::notify_hello).param("value", ParamType::Integer),
            Method::new("getData", Self::get_data),
            Method::new("invalidUTF", Self::invalid_utf),
            Method::new("cached", Self::cached).param("ttl", ParamType::Integer),
            Method::new("uncached", Self::uncached),
            Method::new("delayed", Self::delayed)
                .param("millis", ParamType::Integer)
                .param("tag", ParamType::String),
            Method::new("fail", Self::fail).param("code", ParamType::Integer),
            Method::new("explode", Self::explode),
            Method::new("namespace", Self::namespace),
        ]
    }
}

/// Math namespace with named and optional parameters
pub struct MathHandler {
    context: HandlerContext,
}

impl MathHandler {
    fn sum(&mut self, args: Args) -> MethodFuture<'_> {
        Box::pin(async move {
            let (number_a, number_b): (i64, i64) = args.into_tuple()?;
            self.context.enable_default_cache();
            Ok(json!({"sum": number_a + number_b, "message": "Here you are!"}))
        })
    }

    fn repeat(&mut self, args: Args) -> MethodFuture<'_> {
        Box::pin(async move {
            let text: String = args.get(0)?;
            let times: Option<usize> = args.get_opt(1)?;
            Ok(json!(text.repeat(times.unwrap_or(1))))
        })
    }

    fn scale(&mut self, args: Args) -> MethodFuture<'_> {
        Box::pin(async move {
            let (value, factor): (f64, f64) = args.into_tuple()?;
            Ok(json!(value * factor))
        })
    }
}

impl HandlerType for MathHandler {
    fn create(context: HandlerContext) -> Self {
        Self { context }
    }

    fn context(&self) -> &HandlerContext {
        &self.context
    }

    fn methods() -> Vec<Method<Self>> {
        vec![
            Method::new("sum", Self::sum)
                .param("numberA", ParamType::Integer)
                .param("numberB", ParamType::Integer),
            Method::new("repeat", Self::repeat)
                .param("text", ParamType::String)
                .optional_param("times", ParamType::Integer),
            Method::new("scale", Self::scale)
                .param("value", ParamType::Number)
                .param("factor", ParamType::Number),
        ]
    }
}

/// `TestHandler` bound to `system`, as the default namespace
pub fn test_pipeline() -> Pipeline {
    ServerBuilder::new()
        .server_url("https://rpc.example.com/")
        .handler_type::<TestHandler>("TestHandler")
        .namespace("system", "TestHandler")
        .handler::<MathHandler>("math")
        .build()
        .expect("test pipeline should build")
}

/// Run a body against the default namespace and decode the reply
pub async fn call(pipeline: &Pipeline, body: &str) -> Option<Value> {
    pipeline.handle(None, body.as_bytes()).await.json()
}

/// Run a body against a namespace path and decode the reply
pub async fn call_at(pipeline: &Pipeline, path: &str, body: &str) -> Option<Value> {
    pipeline.handle(Some(path), body.as_bytes()).await.json()
}
