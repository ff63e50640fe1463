use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, FromRequest, FromRequestParts, Path, Query, Request,
        rejection::JsonRejection,
    },
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};

use crate::{
    domain::{Book, BookDraft, BookPatch, Todo, TodoDraft, TodoPatch},
    service::{BookService, CatalogError, Catalogs, ListQuery, TodoService},
};


#[derive(Clone)]
pub struct AppState {
    pub books: Arc<BookService>,
    pub todos: Arc<TodoService>,
}

#[derive(Debug)]
pub struct ApiError {
    code: &'static str,
    message: String,
    status: StatusCode,
    details: Map<String, Value>,
}

impl ApiError {
    fn new(code: &'static str, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status,
            details: Map::new(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new("invalid_request", StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", StatusCode::NOT_FOUND, message)
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(
            "validation_failed",
            StatusCode::UNPROCESSABLE_ENTITY,
            message,
        )
    }

    fn with_detail(mut self, key: &str, value: Value) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }
}

impl From<CatalogError> for ApiError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::NotFound { .. } => ApiError::not_found(value.to_string()),
            CatalogError::Validation(ref violations) => {
                let violations = json!(violations);
                ApiError::validation_failed(value.to_string()).with_detail("violations", violations)
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    details: Map<String, Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code.to_string(),
                message: self.message,
                details: self.details,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// JSON body extractor whose rejections use the API error shape. Bodies that
/// parse but do not fit the payload type are validation failures (422);
/// anything else is a bad request.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(JsonRejection::JsonDataError(e)) => {
                Err(ApiError::validation_failed(e.body_text()))
            }
            Err(e) => Err(ApiError::invalid_request(e.body_text())),
        }
    }
}

/// Path extractor that reports unparsable segments in the API error shape.
pub struct ApiPath<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(e) => Err(ApiError::invalid_request(e.body_text())),
        }
    }
}

pub struct ApiQuery<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(e) => Err(ApiError::invalid_request(e.body_text())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BookListQuery {
    category: Option<String>,
    search: Option<String>,
    limit: Option<usize>,
}

impl From<BookListQuery> for ListQuery {
    fn from(value: BookListQuery) -> Self {
        Self {
            category: value.category,
            search: value.search,
            limit: value.limit,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TodoListQuery {
    priority: Option<String>,
    search: Option<String>,
    limit: Option<usize>,
}

impl From<TodoListQuery> for ListQuery {
    fn from(value: TodoListQuery) -> Self {
        Self {
            category: value.priority,
            search: value.search,
            limit: value.limit,
        }
    }
}

pub fn build_router(catalogs: Catalogs) -> Router {
    let app_state = AppState {
        books: catalogs.books,
        todos: catalogs.todos,
    };

    // A book path segment is a title for GET and an id for PUT/DELETE.
    let books = Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/:book",
            get(get_book_by_title).put(update_book).delete(delete_book),
        )
        .route("/:book/details", get(get_book));

    let todos = Router::new()
        .route("/", get(list_todos).post(create_todo))
        .route("/by-name/:name", get(get_todo_by_name))
        .route(
            "/:todo_id",
            get(get_todo).put(update_todo).delete(delete_todo),
        );

    let api = Router::new()
        .route("/health", get(health))
        .nest("/books", books)
        .nest("/todos", todos)
        .fallback(fallback_not_found);

    Router::new()
        .nest("/api", api)
        .fallback(fallback_not_found)
        .layer(Extension(app_state))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": crate::version::VERSION,
    }))
}

async fn list_books(
    Extension(state): Extension<AppState>,
    ApiQuery(query): ApiQuery<BookListQuery>,
) -> Json<Vec<Book>> {
    Json(state.books.list(&query.into()))
}

async fn create_book(
    Extension(state): Extension<AppState>,
    ApiJson(req): ApiJson<BookDraft>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let book = state.books.create(req)?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn get_book(
    Extension(state): Extension<AppState>,
    ApiPath(book_id): ApiPath<u64>,
) -> Result<Json<Book>, ApiError> {
    Ok(Json(state.books.get(book_id)?))
}

async fn get_book_by_title(
    Extension(state): Extension<AppState>,
    ApiPath(title): ApiPath<String>,
) -> Result<Json<Book>, ApiError> {
    Ok(Json(state.books.get_by_title(&title)?))
}

async fn update_book(
    Extension(state): Extension<AppState>,
    ApiPath(book_id): ApiPath<u64>,
    ApiJson(req): ApiJson<BookPatch>,
) -> Result<Json<Book>, ApiError> {
    Ok(Json(state.books.update(book_id, req)?))
}

async fn delete_book(
    Extension(state): Extension<AppState>,
    ApiPath(book_id): ApiPath<u64>,
) -> Result<StatusCode, ApiError> {
    state.books.delete(book_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_todos(
    Extension(state): Extension<AppState>,
    ApiQuery(query): ApiQuery<TodoListQuery>,
) -> Json<Vec<Todo>> {
    Json(state.todos.list(&query.into()))
}

async fn create_todo(
    Extension(state): Extension<AppState>,
    ApiJson(req): ApiJson<TodoDraft>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let todo = state.todos.create(req)?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(
    Extension(state): Extension<AppState>,
    ApiPath(todo_id): ApiPath<u64>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.todos.get(todo_id)?))
}

async fn get_todo_by_name(
    Extension(state): Extension<AppState>,
    ApiPath(name): ApiPath<String>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.todos.get_by_title(&name)?))
}

async fn update_todo(
    Extension(state): Extension<AppState>,
    ApiPath(todo_id): ApiPath<u64>,
    ApiJson(req): ApiJson<TodoPatch>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.todos.update(todo_id, req)?))
}

async fn delete_todo(
    Extension(state): Extension<AppState>,
    ApiPath(todo_id): ApiPath<u64>,
) -> Result<StatusCode, ApiError> {
    state.todos.delete(todo_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn fallback_not_found() -> ApiError {
    ApiError::not_found("not found")
}
