//! Basic example of the Ghostwire container.
//!
//! Run with `RUST_LOG=ghostwire=debug` to watch the container work.

use ghostwire::catalog::MethodInfo;
use ghostwire::error::BoxError;
use ghostwire::prelude::*;
use tracing_subscriber::EnvFilter;

// === Describe the application ===

fn catalog() -> Catalog {
    Catalog::new()
        .with_class(ClassInfo::interface("Logger"))
        .with_class(
            ClassInfo::class("ConsoleLogger")
                .implements("Logger")
                .method(
                    MethodInfo::new("log", |_, args| {
                        println!("[LOG] {}", args.value("message").as_str().unwrap_or_default());
                        Ok(Value::Null)
                    })
                    .parameter(Parameter::new("message", "string")),
                ),
        )
        .with_class(
            ClassInfo::class("Database")
                .property("url")
                .property("logger")
                .constructor(
                    [
                        Parameter::new("url", "string").default_value("sqlite::memory:"),
                        Parameter::new("logger", "Logger"),
                    ],
                    |this, args| {
                        this.set("url", args.value("url"))?;
                        this.set("logger", args.value("logger"))?;
                        Ok(())
                    },
                ),
        )
        .with_class(
            ClassInfo::class("UserRepository")
                .property("db")
                .constructor([Parameter::new("db", "Database").marker("Ghost")], |this, args| {
                    this.set("db", args.value("db"))?;
                    Ok(())
                })
                .method(
                    MethodInfo::new("find_user", |this, args| {
                        let this = this.ok_or_else(|| BoxError::from("find_user needs an instance"))?;
                        let db = this.get("db")?.into_object().ok_or("db is not set")?;
                        let url = db.get("url")?;
                        Ok(format!(
                            "user #{} from {}",
                            args.value("id").as_int().unwrap_or_default(),
                            url.as_str().unwrap_or_default()
                        )
                        .into())
                    })
                    .parameter(Parameter::new("id", "int")),
                ),
        )
}

// === Bind it ===

struct AppProvider;

impl Provider for AppProvider {
    fn register(&self, bindings: &mut BindingCollector) {
        bindings.bind("Logger").to("ConsoleLogger");
        bindings.bind("Database").using(
            Callable::new("connect", |args| {
                let db = Object::new("Database");
                db.set("url", "postgres://localhost/myapp")?;
                db.set("logger", args.value("logger"))?;
                Ok(db.into())
            })
            .parameter(Parameter::new("logger", "Logger")),
        );
        bindings.bind("UserRepository").transient();
    }

    fn scope(&self) -> &str {
        "app"
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ghostwire=info")))
        .init();

    let container = Container::builder()
        .bindings(BindingRegistry::builder().provider(&AppProvider).build()?)
        .catalog(catalog())
        .with_standard_resolvers()
        .build()?;

    println!("✅ Container built successfully!");
    println!("{container:?}");

    // The repository's database is a ghost until first use.
    let repo = container.resolve("UserRepository")?;
    let db = repo.get("db")?;
    println!("🗄  Database before use: {db:?}");

    let user = container.invoke(&repo, "find_user", Arguments::new().with("id", 42))?;
    println!("👤 {}", user.as_str().unwrap_or_default());
    println!("🗄  Database after use: {db:?}");

    container.invoke("Logger", "log", Arguments::new().with("message", "hello from the container"))?;

    // A lazy proxy resolves the database only when touched.
    let lazy = container.lazy("Database")?;
    println!("💤 Lazy proxy: {lazy:?}");
    println!("🔗 url = {:?}", lazy.get("url")?);

    println!("\n🎉 Everything works!");
    Ok(())
}
