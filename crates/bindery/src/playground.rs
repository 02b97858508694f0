//! A small sample application exercising every binding path.
//!
//! | Endpoint | Binding |
//! |----------|---------|
//! | `GET /items?id=` | `Model<i32>` from the query string |
//! | `GET /todos` | `Service<TodoStore>` |
//! | `GET /todos/{id}` | `Model<u32>` from the route |
//! | `POST /todos` | `Model<Json<NewTodo>>`, answers JSON |
//! | `POST /todos/xml` | `Model<Json<NewTodo>>`, answers XML |
//! | `GET /widget` | `Custom<Widget>` through [`FixedWidgetBinder`] |
//! | `GET /html` | none, answers HTML |
//! | `GET /problem` | none, answers a problem document |
//! | `GET /throw` | none, always fails |

use std::sync::Arc;

use async_trait::async_trait;
use bindery_binding::{Custom, Json, Model, Outcome, ParameterBinder, ParameterDescriptor, Service};
use bindery_core::{InvocationContext, RequestError, StartupError};
use bindery_host::{Application, ApplicationBuilder, Environment};
use bindery_results::{
    problem, CreatedWithContentType, HtmlResult, IntoResponse, JsonResult, ProblemResult,
    Response, APPLICATION_JSON, APPLICATION_XML,
};
use indexmap::IndexMap;
use parking_lot::{Once, RwLock};
use serde::{Deserialize, Serialize};

const SAMPLE_TODOS: [&str; 3] = ["Wash the dishes", "Water the plants", "Book flights"];

/// A todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Store-assigned id.
    pub id: u32,
    /// What to do.
    pub title: String,
    /// Whether it is done.
    pub is_complete: bool,
}

/// Body of `POST /todos`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    /// What to do.
    pub title: String,
    /// Whether it is already done.
    #[serde(default)]
    pub is_complete: bool,
}

/// In-memory todo list, filled with sample items on first use.
#[derive(Debug)]
pub struct TodoStore {
    seeded: Once,
    todos: RwLock<IndexMap<u32, Todo>>,
}

impl Default for TodoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoStore {
    /// Creates an empty, not yet seeded store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seeded: Once::new(),
            todos: RwLock::new(IndexMap::new()),
        }
    }

    fn ensure_seeded(&self) {
        self.seeded.call_once(|| {
            let mut todos = self.todos.write();
            for title in SAMPLE_TODOS {
                let id = next_id(&todos);
                todos.insert(
                    id,
                    Todo {
                        id,
                        title: title.to_string(),
                        is_complete: false,
                    },
                );
            }
            tracing::debug!(count = todos.len(), "seeded todo store");
        });
    }

    /// All todos in insertion order.
    pub fn list(&self) -> Vec<Todo> {
        self.ensure_seeded();
        self.todos.read().values().cloned().collect()
    }

    /// The todo with `id`.
    pub fn get(&self, id: u32) -> Option<Todo> {
        self.ensure_seeded();
        self.todos.read().get(&id).cloned()
    }

    /// Stores a new todo and returns it with its id.
    pub fn add(&self, new: NewTodo) -> Todo {
        self.ensure_seeded();
        let mut todos = self.todos.write();
        let todo = Todo {
            id: next_id(&todos),
            title: new.title,
            is_complete: new.is_complete,
        };
        todos.insert(todo.id, todo.clone());
        todo
    }
}

fn next_id(todos: &IndexMap<u32, Todo>) -> u32 {
    todos.keys().max().map_or(1, |max| max + 1)
}

/// A value with no default convention; only [`FixedWidgetBinder`] produces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widget {
    /// Display name.
    pub name: String,
    /// Size in arbitrary units.
    pub size: u32,
}

/// Binds every [`Widget`] parameter to the same instance, ignoring the
/// request.
#[derive(Debug, Clone)]
pub struct FixedWidgetBinder(pub Widget);

impl Default for FixedWidgetBinder {
    fn default() -> Self {
        Self(Widget {
            name: "My Widget".to_string(),
            size: 12,
        })
    }
}

#[async_trait]
impl ParameterBinder<Widget> for FixedWidgetBinder {
    async fn bind(&self, _ctx: &InvocationContext, parameter: &ParameterDescriptor) -> Outcome<Widget> {
        tracing::debug!(parameter = parameter.name(), widget = %self.0.name, "binding fixed widget");
        Outcome::Success(self.0.clone())
    }
}

/// Answer of `GET /todos/{id}`.
#[derive(Debug)]
pub enum TodoLookup {
    /// The todo exists.
    Found(Todo),
    /// No todo has this id.
    Missing(u32),
}

impl IntoResponse for TodoLookup {
    fn into_response(self, ctx: &InvocationContext) -> Response {
        match self {
            Self::Found(todo) => JsonResult::new(todo).into_response(ctx),
            Self::Missing(id) => problem(
                Some(&format!("Todo {id} does not exist")),
                Some(&format!("/todos/{id}")),
                Some(404),
                None,
                None,
                None,
            )
            .into_response(ctx),
        }
    }
}

async fn get_item(id: Model<i32>) -> String {
    format!("item {}", *id)
}

async fn list_todos(store: Service<TodoStore>) -> JsonResult<Vec<Todo>> {
    JsonResult::new(store.list())
}

async fn get_todo(id: Model<u32>, store: Service<TodoStore>) -> TodoLookup {
    store
        .get(*id)
        .map_or(TodoLookup::Missing(*id), TodoLookup::Found)
}

async fn create_todo(
    todo: Model<Json<NewTodo>>,
    store: Service<TodoStore>,
) -> CreatedWithContentType<Todo> {
    let todo = store.add(todo.into_inner().into_inner());
    let location = format!("/todos/{}", todo.id);
    CreatedWithContentType::new(todo, APPLICATION_JSON).with_location(location)
}

async fn create_todo_xml(
    todo: Model<Json<NewTodo>>,
    store: Service<TodoStore>,
) -> CreatedWithContentType<Todo> {
    let todo = store.add(todo.into_inner().into_inner());
    let location = format!("/todos/{}", todo.id);
    CreatedWithContentType::new(todo, APPLICATION_XML).with_location(location)
}

async fn get_widget(widget: Custom<Widget>) -> JsonResult<Widget> {
    JsonResult::new(widget.into_inner())
}

async fn hello_html() -> HtmlResult {
    HtmlResult::new(
        "<!doctype html><html><head><title>Bindery</title></head>\
         <body><h1>Hello from Bindery</h1></body></html>",
    )
}

async fn sample_problem() -> ProblemResult {
    let extensions = IndexMap::from([("hint".to_string(), "try /todos".to_string())]);
    problem(
        Some("This is a sample problem"),
        Some("/problem"),
        Some(409),
        None,
        None,
        Some(extensions),
    )
}

async fn throw() -> Result<&'static str, RequestError> {
    Err(RequestError::from_anyhow(anyhow::anyhow!(
        "this endpoint always fails"
    )))
}

/// Registers the playground's services, binder and endpoints.
pub fn configure(builder: &mut ApplicationBuilder) -> &mut ApplicationBuilder {
    builder
        .add_service(Arc::new(TodoStore::new()))
        .add_parameter_binder::<Widget, _>(FixedWidgetBinder::default());

    builder
        .map_get("/items", get_item)
        .parameter(ParameterDescriptor::query("id"));
    builder
        .map_get("/todos", list_todos)
        .parameter(ParameterDescriptor::named("store"));
    builder
        .map_get("/todos/{id}", get_todo)
        .parameter(ParameterDescriptor::route("id"))
        .parameter(ParameterDescriptor::named("store"));
    builder
        .map_post("/todos", create_todo)
        .parameter(ParameterDescriptor::body("todo"))
        .parameter(ParameterDescriptor::named("store"));
    builder
        .map_post("/todos/xml", create_todo_xml)
        .parameter(ParameterDescriptor::body("todo"))
        .parameter(ParameterDescriptor::named("store"))
        .with_display_name("Create todo (XML)");
    builder
        .map_get("/widget", get_widget)
        .parameter(ParameterDescriptor::query("widget"));
    builder.map_get("/html", hello_html);
    builder.map_get("/problem", sample_problem);
    builder.map_get("/throw", throw);

    builder
}

/// Builds the playground for `environment` with the problem-details filter.
///
/// # Errors
///
/// Returns the [`StartupError`] raised by [`ApplicationBuilder::build`].
pub fn playground_app(environment: Environment) -> Result<Application, StartupError> {
    let mut builder = Application::builder();
    builder
        .environment(environment)
        .add_problem_details_exception_filter();
    configure(&mut builder);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_seeds_once() {
        let store = TodoStore::new();
        assert_eq!(store.list().len(), SAMPLE_TODOS.len());
        assert_eq!(store.list().len(), SAMPLE_TODOS.len());
        assert_eq!(store.get(1).map(|t| t.title), Some("Wash the dishes".to_string()));
    }

    #[test]
    fn test_add_assigns_next_id() {
        let store = TodoStore::new();
        let todo = store.add(NewTodo {
            title: "Walk the dog".to_string(),
            is_complete: true,
        });

        assert_eq!(todo.id, 4);
        assert_eq!(store.list().last(), Some(&todo));
    }

    #[test]
    fn test_playground_builds() {
        let app = playground_app(Environment::Development).unwrap();
        assert!(app.services().contains::<TodoStore>());
    }
}
