//! Shared test catalog.

use crate::catalog::{Callable, Catalog, ClassInfo, GHOST, LIMINAL, MethodInfo, Parameter, QUALIFIER, Visibility};
use crate::error::BoxError;
use crate::types::TypeDescriptor;
use crate::value::Value;

fn text(value: Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

pub fn catalog() -> Catalog {
    Catalog::new()
        // Loggers
        .with_class(ClassInfo::interface("Logger"))
        .with_class(
            ClassInfo::class("FileLogger")
                .implements("Logger")
                .property("path")
                .constructor(
                    [Parameter::new("path", "string").default_value("/var/log/app.log")],
                    |this, args| {
                        this.set("path", args.value("path"))?;
                        Ok(())
                    },
                )
                .method(
                    MethodInfo::new("log", |this, args| {
                        let this = this.ok_or_else(|| BoxError::from("log needs a receiver"))?;
                        let path = text(this.get("path")?);
                        Ok(format!("{path}: {}", text(args.value("message"))).into())
                    })
                    .parameter(Parameter::new("message", "string")),
                ),
        )
        .with_class(ClassInfo::class("RotatingLogger").extends("FileLogger"))
        // Caches
        .with_class(ClassInfo::interface("Cache"))
        .with_class(
            ClassInfo::class("RedisCache")
                .implements("Cache")
                .property("dsn")
                .constructor(
                    [Parameter::new("dsn", "string").default_value("redis://localhost")],
                    |this, args| {
                        this.set("dsn", args.value("dsn"))?;
                        Ok(())
                    },
                ),
        )
        .with_class(ClassInfo::class("MemoryCache").implements("Cache"))
        .with_class(ClassInfo::class("Primary").implements(QUALIFIER))
        // Services
        .with_class(ClassInfo::interface("ServiceInterface"))
        .with_class(
            ClassInfo::class("ConcreteService")
                .implements("ServiceInterface")
                .property("logger")
                .constructor([Parameter::new("logger", "Logger")], |this, args| {
                    this.set("logger", args.value("logger"))?;
                    Ok(())
                }),
        )
        .with_class(
            ClassInfo::class("Mailer")
                .property("logger")
                .property("from")
                .constructor(
                    [
                        Parameter::new("logger", "Logger"),
                        Parameter::new("from", "string").default_value("noreply@example.com"),
                    ],
                    |this, args| {
                        this.set("logger", args.value("logger"))?;
                        this.set("from", args.value("from"))?;
                        Ok(())
                    },
                )
                .method(
                    MethodInfo::new("send", |this, args| {
                        let this = this.ok_or_else(|| BoxError::from("send needs a receiver"))?;
                        let from = text(this.get("from")?);
                        Ok(format!("{from} -> {}", text(args.value("to"))).into())
                    })
                    .parameter(Parameter::new("to", "string")),
                )
                .method(MethodInfo::new("version", |_, _| Ok("1.0".into())).static_method())
                .method(
                    MethodInfo::new("secret", |_, _| Ok(Value::Null))
                        .visibility(Visibility::Private),
                ),
        )
        .with_class(
            ClassInfo::class("Report")
                .property("mailer")
                .constructor([Parameter::new("mailer", "Mailer").marker(GHOST)], |this, args| {
                    this.set("mailer", args.value("mailer"))?;
                    Ok(())
                }),
        )
        .with_class(ClassInfo::class("RequestContext").attribute(LIMINAL).property("id"))
        .with_class(
            ClassInfo::class("Failing")
                .property("state")
                .constructor(Vec::<Parameter>::new(), |_, _| Err("boom".into())),
        )
        .with_class(ClassInfo::abstract_class("AbstractRepo"))
        // Intersections
        .with_class(ClassInfo::interface("Countable"))
        .with_class(ClassInfo::interface("Traversable"))
        .with_class(
            ClassInfo::class("Collection")
                .implements("Countable")
                .implements("Traversable")
                .property("items")
                .constructor([Parameter::untyped("items").variadic()], |this, args| {
                    this.set("items", args.value("items"))?;
                    Ok(())
                }),
        )
        .with_class(ClassInfo::class("Counter").implements("Countable"))
        // Cycles
        .with_class(
            ClassInfo::class("CycleA")
                .property("b")
                .constructor([Parameter::new("b", "CycleB")], |this, args| {
                    this.set("b", args.value("b"))?;
                    Ok(())
                }),
        )
        .with_class(
            ClassInfo::class("CycleB")
                .property("a")
                .constructor([Parameter::new("a", "CycleA")], |this, args| {
                    this.set("a", args.value("a"))?;
                    Ok(())
                }),
        )
        .with_class(
            ClassInfo::class("Nullable")
                .property("cache")
                .constructor([Parameter::new("cache", TypeDescriptor::nullable("Missing"))], |this, args| {
                    this.set("cache", args.value("cache"))?;
                    Ok(())
                }),
        )
        .with_function(
            Callable::new("greet", |args| Ok(format!("Hello, {}!", text(args.value("name"))).into()))
                .parameter(Parameter::new("name", "string").default_value("world")),
        )
}
