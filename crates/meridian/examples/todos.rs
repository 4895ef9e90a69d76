//! A small todo service.
//!
//! ```text
//! cargo run -p meridian --example todos
//! curl -X POST localhost:8080/api/todos -d '{"title":"ship it"}'
//! curl localhost:8080/api/todos/1
//! ```
//!
//! Settings come from `meridian.toml` (optional), `.env` and
//! `MERIDIAN__SERVER__HTTP_ADDR`-style environment variables.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use http::header::{HeaderName, HeaderValue};
use meridian::prelude::*;
use meridian::server::ServerConfig;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Todo {
    #[serde(default)]
    id: u64,
    title: String,
    #[serde(default)]
    done: bool,
}

#[derive(Default)]
struct Store {
    next_id: AtomicU64,
    todos: RwLock<BTreeMap<u64, Todo>>,
}

fn id_param() -> impl Validator {
    FnValidator::new(|params: &Value| {
        match params["id"].as_str().and_then(|s| s.parse::<u64>().ok()) {
            Some(id) if id > 0 => Ok(json!({ "id": id })),
            _ => Err(vec![Issue::new("must be a positive integer").at("id")]),
        }
    })
}

fn todo_routes(store: Arc<Store>) -> Router {
    let list = Arc::clone(&store);
    let create = Arc::clone(&store);
    let fetch = store;

    Router::with_prefix("/todos")
        .route(
            RouteDefinition::get(
                "/",
                handler_fn(move |_ctx: RequestContext| {
                    let store = Arc::clone(&list);
                    async move {
                        let todos: Vec<Todo> = store.todos.read().values().cloned().collect();
                        Ok::<_, HandlerError>(todos)
                    }
                }),
            )
            .name("listTodos"),
        )
        .route(
            RouteDefinition::post(
                "/",
                handler_fn(move |ctx: RequestContext| {
                    let store = Arc::clone(&create);
                    async move {
                        let mut todo: Todo = ctx.body_as()?;
                        todo.id = store.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                        store.todos.write().insert(todo.id, todo.clone());
                        Ok::<_, HandlerError>(todo)
                    }
                }),
            )
            .name("createTodo")
            .schema(Schema::new().body(SerdeValidator::<Todo>::new())),
        )
        .route(
            RouteDefinition::get(
                "/:id",
                handler_fn(move |ctx: RequestContext| {
                    let store = Arc::clone(&fetch);
                    async move {
                        let id = ctx.params()["id"].as_u64().unwrap_or_default();
                        store
                            .todos
                            .read()
                            .get(&id)
                            .cloned()
                            .ok_or_else(|| HandlerError::not_found(format!("todo {id} not found")))
                    }
                }),
            )
            .name("getTodo")
            .schema(Schema::new().params(id_param())),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .with_development()
        .with_optional_file("meridian.toml")?
        .with_dotenv()?
        .with_env_prefix("MERIDIAN")
        .load()?;
    init_logging(&LogConfig::from(&config.logging))?;

    let powered_by = sync_middleware("powered-by", |_ctx, sink| {
        sink.set_header(
            HeaderName::from_static("x-powered-by"),
            HeaderValue::from_static("meridian"),
        );
        Ok(None)
    });

    let dispatcher = Router::new()
        .middleware(powered_by)
        .route(RouteDefinition::get(
            "/",
            handler_fn(|_ctx: RequestContext| async move {
                Ok::<_, HandlerError>(json!({ "message": "Hello World" }))
            }),
        ))
        .mount("/api", todo_routes(Arc::new(Store::default())))
        .compile()?;

    for route in dispatcher.manifest() {
        tracing::info!(method = %route.method, path = %route.path, name = ?route.name, "route");
    }

    Server::new(ServerConfig::from(&config.server), dispatcher)
        .run()
        .await?;
    Ok(())
}
